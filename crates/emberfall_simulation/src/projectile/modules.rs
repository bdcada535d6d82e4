//! Модули поведения снаряда
//!
//! Упорядоченный список модулей; каждый получает хуки on_update / on_hit /
//! on_destroy и выражает игровые последствия списком ModuleAction —
//! исполняет их система (у модуля нет доступа к миру).

use bevy::prelude::*;

use crate::combat::AttackDefinition;
use crate::components::StatusInstance;
use crate::targeting::SearchArea;

/// Отложенное последствие работы модуля
#[derive(Debug, Clone)]
pub enum ModuleAction {
    /// Урон конкретной цели (по snapshot'у stats владельца)
    DealDamage {
        target: Entity,
        attack: AttackDefinition,
    },
    /// Наложить статус на цель
    ApplyStatus {
        target: Entity,
        status: StatusInstance,
    },
    /// Урон по области вокруг текущей позиции снаряда
    DamageArea {
        area: SearchArea,
        attack: AttackDefinition,
        max_targets: usize,
    },
}

/// Модуль поведения снаряда
#[derive(Debug, Clone)]
pub enum ProjectileModule {
    /// Основной урон при попадании
    Damage { attack: AttackDefinition },
    /// Дополнительный статус при попадании (шансы — в AttackDefinition.effects)
    StatusOnHit { status: StatusInstance },
    /// Периодический AoE-импульс вокруг снаряда
    Pulse {
        interval: f32,
        elapsed: f32,
        area: SearchArea,
        attack: AttackDefinition,
        max_targets: usize,
    },
    /// Взрыв в момент уничтожения
    ExplodeOnDestroy {
        area: SearchArea,
        attack: AttackDefinition,
        max_targets: usize,
    },
}

impl ProjectileModule {
    pub fn on_update(&mut self, delta: f32, out: &mut Vec<ModuleAction>) {
        if let Self::Pulse {
            interval,
            elapsed,
            area,
            attack,
            max_targets,
        } = self
        {
            let interval = interval.max(0.05);
            *elapsed += delta;
            while *elapsed >= interval {
                *elapsed -= interval;
                out.push(ModuleAction::DamageArea {
                    area: area.clone(),
                    attack: attack.clone(),
                    max_targets: *max_targets,
                });
            }
        }
    }

    pub fn on_hit(&mut self, target: Entity, out: &mut Vec<ModuleAction>) {
        match self {
            Self::Damage { attack } => out.push(ModuleAction::DealDamage {
                target,
                attack: attack.clone(),
            }),
            Self::StatusOnHit { status } => out.push(ModuleAction::ApplyStatus {
                target,
                status: status.clone(),
            }),
            Self::Pulse { .. } | Self::ExplodeOnDestroy { .. } => {}
        }
    }

    pub fn on_destroy(&mut self, out: &mut Vec<ModuleAction>) {
        if let Self::ExplodeOnDestroy {
            area,
            attack,
            max_targets,
        } = self
        {
            out.push(ModuleAction::DamageArea {
                area: area.clone(),
                attack: attack.clone(),
                max_targets: *max_targets,
            });
        }
    }
}
