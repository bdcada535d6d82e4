//! AI-слой: мозг NPC (FSM) + восприятие + стратегии движения + skill pool
//!
//! Мозг — карта state-объектов (machine), состояния (states) делегируют
//! движение MovementStrategy и выбор атак взвешенному SkillPool.
//! Игроком AI не управляет (PlayerControlled исключён из драйвера).

use bevy::prelude::*;

pub mod avoidance;
pub mod machine;
pub mod movement;
pub mod perception;
pub mod skill_pool;
pub mod states;
pub mod systems;

pub use machine::{Brain, BrainCtx, BrainState, BrainStateTag};
pub use movement::{build_strategy, MovementStrategy, MovementStrategyConfig, StrategyCtx};
pub use perception::{update_perception, Perception};
pub use skill_pool::{SkillPool, SkillPoolEntry};
pub use states::{
    standard_npc_brain, AlertState, AttackingState, ChargingState, ChaseState, DeadState,
    HurtState, IdleState, SummoningState, WanderingState,
};
pub use systems::{
    react_to_damage, react_to_death, tick_brains, tick_skill_cooldowns, SummonRequested,
};

use crate::SimSet;

/// Параметры AI одного NPC
#[derive(Component, Debug, Clone, Reflect, serde::Serialize, serde::Deserialize)]
#[reflect(Component)]
pub struct AiConfig {
    /// Радиус обнаружения цели (метры)
    pub detection_range: f32,
    /// Alert: повторная проверка видимости не раньше этого времени
    pub alert_min_duration: f32,
    /// Alert: максимум удержания позиции
    pub alert_max_duration: f32,
    /// Chase: дистанция отказа от преследования
    pub give_up_distance: f32,
    /// Chase: интервал give-up проверки (не каждый тик)
    pub give_up_check_interval: f32,
    /// Chase: ближе этой дистанции не подходим
    pub chase_stop_distance: f32,
    /// Wandering: радиус блуждания вокруг спавна
    pub wander_radius: f32,
    /// Hurt: авто-выход через N секунд; None = владелец решает сам
    pub hurt_recovery: Option<f32>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            detection_range: 10.0,
            alert_min_duration: 0.8,
            alert_max_duration: 2.5,
            give_up_distance: 18.0,
            give_up_check_interval: 0.5,
            chase_stop_distance: 1.5,
            wander_radius: 6.0,
            hurt_recovery: None,
        }
    }
}

/// AI Plugin
///
/// Порядок (FixedUpdate, chain):
/// 1. update_perception — обнаружение/LOS
/// 2. react_to_damage / react_to_death — форс-переходы
/// 3. tick_skill_cooldowns — кулдауны пулов
/// 4. tick_brains — тик FSM, выходы в Velocity/события
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SummonRequested>();

        app.add_systems(
            FixedUpdate,
            (
                update_perception,
                react_to_damage,
                react_to_death,
                tick_skill_cooldowns,
                tick_brains,
            )
                .chain()
                .in_set(SimSet::Ai),
        );
    }
}
