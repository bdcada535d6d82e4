//! Поведения каста: Click / Hold / Toggle / Charge
//!
//! Никаких таймер-колбэков: каждая фаза — явное состояние, продвигаемое
//! тиком (elapsed += dt; elapsed >= threshold → переход). Длительности
//! делятся на attack_speed кастера.

use bevy::prelude::*;

/// Вариант поведения каста
#[derive(Debug, Clone, Copy, PartialEq, Reflect, serde::Serialize, serde::Deserialize)]
pub enum CastBehavior {
    /// Нажал → cast_time → эффект → recovery_time → завершение
    Click { cast_time: f32, recovery_time: f32 },
    /// Держишь → эффект каждые effect_interval, отпустил → recovery
    Hold {
        cast_time: f32,
        effect_interval: f32,
        recovery_time: f32,
    },
    /// Мгновенный флип внутреннего флага, без фаз
    Toggle,
    /// Копим заряд (эффекты с charge_percent), отпустил → финальный эффект
    Charge {
        max_charge_time: f32,
        effect_interval: f32,
        recovery_time: f32,
    },
}

impl CastBehavior {
    /// Может ли этот каст прервать чужой активный каст
    pub fn can_interrupt_others(&self) -> bool {
        matches!(self, CastBehavior::Toggle)
    }

    /// Разрешено ли движение во время каста
    pub fn can_move_while_casting(&self) -> bool {
        matches!(self, CastBehavior::Toggle)
    }

    /// Разрешён ли другой скилл во время этого каста
    pub fn can_use_other_while_casting(&self) -> bool {
        matches!(self, CastBehavior::Toggle)
    }
}

/// Фаза активного каста
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum CastPhase {
    /// До первого эффекта (cast_time)
    Windup,
    /// Hold/Charge: эффекты идут, ждём release
    Channel,
    /// После эффекта до CastComplete (recovery_time)
    Recovery,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_is_permissive() {
        let toggle = CastBehavior::Toggle;
        assert!(toggle.can_move_while_casting());
        assert!(toggle.can_use_other_while_casting());
        assert!(toggle.can_interrupt_others());
    }

    #[test]
    fn test_timed_casts_lock_movement() {
        let click = CastBehavior::Click {
            cast_time: 0.5,
            recovery_time: 0.3,
        };
        assert!(!click.can_move_while_casting());
        assert!(!click.can_use_other_while_casting());
    }
}
