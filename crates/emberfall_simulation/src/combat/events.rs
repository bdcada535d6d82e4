//! Внутренние боевые события (Bevy Events)
//!
//! Поток: источник урона (снаряд, area strike) кладёт DamageIntent со
//! snapshot'ом stats атакующего → router резолвит и применяет → DamageDealt /
//! CombatantDied. Наружу (рендер/UI/звук) те же факты уходят через
//! ActionEventBus.

use bevy::prelude::*;

use crate::combat::AttackDefinition;
use crate::components::CombatantStats;
use crate::skills::SkillId;

/// Ссылка на скилл (id + уровень), сопровождает события жизненного цикла
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, serde::Serialize, serde::Deserialize)]
pub struct SkillRef {
    pub id: SkillId,
    pub level: u32,
}

/// Запрос на нанесение урона (ещё не рассчитанного)
///
/// stats атакующего — deep copy на момент атаки: если атакующий умрёт или
/// сменит состояние до обработки, расчёт не поедет.
#[derive(Event, Debug, Clone)]
pub struct DamageIntent {
    pub attacker: Entity,
    pub attacker_stats: CombatantStats,
    pub target: Entity,
    pub attack: AttackDefinition,
    pub skill: Option<SkillRef>,
}

/// Урон нанесён (после расчёта и применения)
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub is_critical: bool,
    pub is_miss: bool,
    pub target_died: bool,
    pub skill: Option<SkillRef>,
}

/// Комбатант умер (hp == 0)
#[derive(Event, Debug, Clone)]
pub struct CombatantDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Запрос наложения статуса (модули снарядов, ауры)
#[derive(Event, Debug, Clone)]
pub struct ApplyStatusIntent {
    pub target: Entity,
    pub status: crate::components::StatusInstance,
}
