//! ECS Components для боевых entity
//!
//! Организация по доменам:
//! - actor: кто участвует в бою (Combatant, capability-маркеры)
//! - stats: числовые атрибуты (CombatantStats)
//! - status: статус-эффекты и резисты (StatusEffects)
//! - movement: скорость и интеграция позиции (Velocity)
//! - world: статичная геометрия (StaticObstacle, BodyExtents)

pub mod actor;
pub mod movement;
pub mod stats;
pub mod status;
pub mod world;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
pub use stats::*;
pub use status::*;
pub use world::*;
