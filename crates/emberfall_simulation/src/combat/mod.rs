//! Боевой модуль: расчёт урона и маршрутизация боевых событий
//!
//! Ответственность:
//! - attack: определение атаки (тип, множитель, доп. эффекты)
//! - damage: чистый resolver (hit/crit/разброс/митигация)
//! - events: DamageIntent → DamageDealt → CombatantDied
//! - router: владелец обработки интентов + публикация на ActionEventBus
//!
//! Коллизии и анимации — снаружи: сюда прилетают только интенты с уже
//! авторитетно выбранными целями (targeting engine).

use bevy::prelude::*;

pub mod attack;
pub mod damage;
pub mod events;
pub mod router;

// Re-export основных типов
pub use attack::{AdditionalEffect, AttackDefinition, DamageType};
pub use damage::{apply, resolve, DamageResult};
pub use events::{ApplyStatusIntent, CombatantDied, DamageDealt, DamageIntent, SkillRef};
pub use router::{apply_status_intents, handle_combatant_death, resolve_damage_intents, Dead};

use crate::components::{regenerate_energy, tick_status_effects};

/// Combat Plugin
///
/// Порядок выполнения (FixedUpdate, chain):
/// 1. resolve_damage_intents — очередь урона за тик
/// 2. handle_combatant_death — оформление смертей
/// 3. regenerate_energy, tick_status_effects — ресурсы и статусы
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageIntent>()
            .add_event::<DamageDealt>()
            .add_event::<CombatantDied>()
            .add_event::<ApplyStatusIntent>();

        app.add_systems(
            FixedUpdate,
            (
                resolve_damage_intents,
                apply_status_intents,
                handle_combatant_death,
                regenerate_energy,
                tick_status_effects,
            )
                .chain()
                .in_set(crate::SimSet::Combat),
        );
    }
}
