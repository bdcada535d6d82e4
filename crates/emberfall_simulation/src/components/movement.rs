//! Движение: desired velocity от AI/каста → интеграция позиции
//!
//! AI-слой пишет Velocity (намерение), integrate_velocity применяет его к
//! Transform с учётом статус-эффектов. Физики/коллизий здесь нет — только
//! прямолинейное steering-движение, обход препятствий даёт AI.

use bevy::prelude::*;

use crate::components::{CombatantStats, StatusEffects};

/// Желаемая скорость (м/с, XY-плоскость)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Velocity(pub Vec2);

/// Система: интеграция позиции из Velocity
///
/// Slow/Root/Stun ослабляют или зануляют фактическое перемещение,
/// не трогая желаемый вектор.
pub fn integrate_velocity(
    mut movers: Query<(&mut Transform, &Velocity, Option<&StatusEffects>, Option<&CombatantStats>)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    for (mut transform, velocity, status, stats) in movers.iter_mut() {
        if let Some(stats) = stats {
            if !stats.is_alive() {
                continue;
            }
        }

        let mut v = velocity.0;
        if let Some(status) = status {
            v *= status.move_speed_multiplier();
        }

        if v.length_squared() > 1e-10 {
            transform.translation.x += v.x * delta;
            transform.translation.y += v.y * delta;
        }
    }
}
