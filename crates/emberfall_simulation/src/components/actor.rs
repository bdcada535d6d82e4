//! Базовые компоненты комбатантов: Combatant + capability-маркеры
//!
//! Вместо duck-typing ("а есть ли у entity позиция?") каждая способность —
//! отдельный компонент, назначаемый один раз при спавне:
//! - Transform            → has_position
//! - BodyExtents          → bounding box
//! - CombatantStats       → has_stats
//! - CombatTarget         → is_combat_target (можно выбирать целью)

use bevy::prelude::*;

use crate::components::{BodyExtents, CombatantStats, StatusEffects};

/// Stable id фракции/команды
pub type TeamId = u64;

/// Shared id типа комбатанта (ключ статичных данных в каталоге)
pub type CombatantTypeId = u32;

/// Комбатант (игрок, NPC, суммон) — базовый компонент живых существ
///
/// Required Components добавляют stats, статусы и bounding box автоматически.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(CombatantStats, StatusEffects, BodyExtents)]
pub struct Combatant {
    /// Shared type id (статичные данные), НЕ instance id — instance id это Entity
    pub type_id: CombatantTypeId,
    /// Команда (friendly fire определяется по ней)
    pub team: TeamId,
    /// Разновидность entity для фильтров поиска
    pub kind: CombatantKind,
}

impl Default for Combatant {
    fn default() -> Self {
        Self {
            type_id: 0,
            team: 0,
            kind: CombatantKind::Npc,
        }
    }
}

/// Разновидность комбатанта (entity_type в фильтрах)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, serde::Serialize, serde::Deserialize)]
pub enum CombatantKind {
    Player,
    Npc,
    Summon,
}

/// Маркер: entity можно выбирать целью атак
///
/// Снимается (или не вешается) для неуязвимых/декоративных сущностей.
#[derive(Component, Debug, Default, Clone, Reflect)]
#[reflect(Component)]
pub struct CombatTarget;

/// Маркер: комбатант под управлением игрока (AI его не тикает)
#[derive(Component, Debug, Default, Clone, Reflect)]
#[reflect(Component)]
pub struct PlayerControlled;
