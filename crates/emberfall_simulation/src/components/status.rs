//! Статус-эффекты комбатанта
//!
//! Типизированные инстансы вместо свободного key/value мешка: фильтры поиска
//! и AdditionalEffect атак работают по тегам из фиксированного множества.

use bevy::prelude::*;

/// Тег статус-эффекта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, serde::Serialize, serde::Deserialize)]
pub enum StatusTag {
    Stun,
    Slow,
    Root,
    Silence,
    Burn,
    Poison,
    Weakness,
    Shield,
}

/// Один активный эффект
#[derive(Debug, Clone, Reflect, serde::Serialize, serde::Deserialize)]
pub struct StatusInstance {
    pub tag: StatusTag,
    /// Сила эффекта (интерпретация зависит от тега: % замедления, урон/сек...)
    pub value: f32,
    /// Оставшееся время (секунды, тикается симуляцией)
    pub remaining: f32,
}

/// Активные эффекты + резисты комбатанта
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct StatusEffects {
    pub active: Vec<StatusInstance>,
    /// Теги, к которым комбатант невосприимчив (apply игнорируется)
    pub resistances: Vec<StatusTag>,
}

impl StatusEffects {
    pub fn has(&self, tag: StatusTag) -> bool {
        self.active.iter().any(|s| s.tag == tag)
    }

    pub fn resists(&self, tag: StatusTag) -> bool {
        self.resistances.contains(&tag)
    }

    /// Повторное наложение обновляет value и берёт больший остаток времени
    pub fn apply(&mut self, instance: StatusInstance) -> bool {
        if self.resists(instance.tag) {
            return false;
        }
        if let Some(existing) = self.active.iter_mut().find(|s| s.tag == instance.tag) {
            existing.value = instance.value;
            existing.remaining = existing.remaining.max(instance.remaining);
        } else {
            self.active.push(instance);
        }
        true
    }

    pub fn tick(&mut self, delta: f32) {
        for s in self.active.iter_mut() {
            s.remaining -= delta;
        }
        self.active.retain(|s| s.remaining > 0.0);
    }

    /// Суммарный множитель скорости от Slow/Root (1.0 = без замедления)
    pub fn move_speed_multiplier(&self) -> f32 {
        if self.has(StatusTag::Root) || self.has(StatusTag::Stun) {
            return 0.0;
        }
        let slow = self
            .active
            .iter()
            .filter(|s| s.tag == StatusTag::Slow)
            .map(|s| s.value)
            .fold(0.0_f32, f32::max);
        (1.0 - slow / 100.0).clamp(0.0, 1.0)
    }
}

/// Система: тик статус-эффектов
pub fn tick_status_effects(mut query: Query<&mut StatusEffects>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    for mut status in query.iter_mut() {
        if !status.active.is_empty() {
            status.tick(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burn(duration: f32) -> StatusInstance {
        StatusInstance {
            tag: StatusTag::Burn,
            value: 5.0,
            remaining: duration,
        }
    }

    #[test]
    fn test_apply_and_expire() {
        let mut status = StatusEffects::default();
        assert!(status.apply(burn(1.0)));
        assert!(status.has(StatusTag::Burn));

        status.tick(0.5);
        assert!(status.has(StatusTag::Burn));

        status.tick(0.6);
        assert!(!status.has(StatusTag::Burn));
    }

    #[test]
    fn test_reapply_keeps_longer_remaining() {
        let mut status = StatusEffects::default();
        status.apply(burn(3.0));
        status.apply(burn(1.0));
        assert_eq!(status.active.len(), 1);
        assert_eq!(status.active[0].remaining, 3.0);
    }

    #[test]
    fn test_resistance_blocks_apply() {
        let mut status = StatusEffects::default();
        status.resistances.push(StatusTag::Stun);
        let applied = status.apply(StatusInstance {
            tag: StatusTag::Stun,
            value: 0.0,
            remaining: 2.0,
        });
        assert!(!applied);
        assert!(!status.has(StatusTag::Stun));
    }

    #[test]
    fn test_move_speed_multiplier() {
        let mut status = StatusEffects::default();
        assert_eq!(status.move_speed_multiplier(), 1.0);

        status.apply(StatusInstance {
            tag: StatusTag::Slow,
            value: 40.0,
            remaining: 1.0,
        });
        assert!((status.move_speed_multiplier() - 0.6).abs() < 1e-6);

        status.apply(StatusInstance {
            tag: StatusTag::Root,
            value: 0.0,
            remaining: 1.0,
        });
        assert_eq!(status.move_speed_multiplier(), 0.0);
    }
}
