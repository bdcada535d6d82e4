//! Обход препятствий: короткие probe-лучи против статичной геометрии
//!
//! Три щупа (вперёд и ±35°). Если передний упирается в AABB — подмешиваем
//! перпендикулярный вектор в сторону свободного щупа. Это steering, не
//! pathfinding: лабиринты вне scope, углы и колонны огибаются.

use bevy::prelude::*;

use crate::components::StaticObstacle;

const PROBE_ANGLE_DEG: f32 = 35.0;
const AVOID_WEIGHT: f32 = 0.9;

/// Подмешивает avoidance-вектор в желаемое направление
///
/// `desired` — ненормированная желаемая скорость; возвращается скорость той
/// же длины с поправкой направления.
pub fn steer_around(pos: Vec2, desired: Vec2, probe_len: f32, obstacles: &[StaticObstacle]) -> Vec2 {
    let speed = desired.length();
    if speed < 1e-6 || obstacles.is_empty() {
        return desired;
    }
    let forward = desired / speed;

    if !probe_hits(pos, forward, probe_len, obstacles) {
        return desired;
    }

    let left = Vec2::from_angle(PROBE_ANGLE_DEG.to_radians()).rotate(forward);
    let right = Vec2::from_angle(-PROBE_ANGLE_DEG.to_radians()).rotate(forward);
    let left_clear = !probe_hits(pos, left, probe_len, obstacles);
    let right_clear = !probe_hits(pos, right, probe_len, obstacles);

    let side = match (left_clear, right_clear) {
        (true, false) => forward.perp(),
        (false, true) => -forward.perp(),
        (true, true) => forward.perp(), // обе стороны свободны — идём влево
        (false, false) => {
            // Тупик: пробуем перпендикуляры подлиннее
            let perp = forward.perp();
            if !probe_hits(pos, perp, probe_len * 2.0, obstacles) {
                perp
            } else if !probe_hits(pos, -perp, probe_len * 2.0, obstacles) {
                -perp
            } else {
                return Vec2::ZERO; // зажаты со всех сторон
            }
        }
    };

    let blended = (forward + side * AVOID_WEIGHT).normalize_or_zero();
    blended * speed
}

fn probe_hits(pos: Vec2, dir: Vec2, len: f32, obstacles: &[StaticObstacle]) -> bool {
    let end = pos + dir * len;
    obstacles.iter().any(|o| o.segment_hits(pos, end))
}
