//! Геометрия мира: bounding box комбатанта и статичные препятствия
//!
//! Мир 2D: позиция — Transform.translation.xy(), вся геометрия на Vec2.

use bevy::prelude::*;

/// Половинные размеры bounding box комбатанта (метры)
///
/// Используется поисковым движком: circle search ловит крупную цель даже если
/// её центр вне круга, но бокс достаёт.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct BodyExtents {
    pub half: Vec2,
}

impl Default for BodyExtents {
    fn default() -> Self {
        Self {
            half: Vec2::splat(0.5),
        }
    }
}

impl BodyExtents {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half: Vec2::new(half_width, half_height),
        }
    }
}

/// Статичное препятствие (AABB) — стены, колонны
///
/// Ядро не читает геометрию из рендера: мост регистрирует препятствия этими
/// компонентами, по ним работают line-of-sight и obstacle avoidance.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct StaticObstacle {
    pub min: Vec2,
    pub max: Vec2,
}

impl StaticObstacle {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Пересекает ли отрезок a→b этот AABB (slab test)
    pub fn segment_hits(&self, a: Vec2, b: Vec2) -> bool {
        let d = b - a;
        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;

        for axis in 0..2 {
            let (origin, dir, lo, hi) = if axis == 0 {
                (a.x, d.x, self.min.x, self.max.x)
            } else {
                (a.y, d.y, self.min.y, self.max.y)
            };

            if dir.abs() < 1e-8 {
                // Отрезок параллелен оси — вне slab'а значит мимо
                if origin < lo || origin > hi {
                    return false;
                }
            } else {
                let inv = 1.0 / dir;
                let (t1, t2) = ((lo - origin) * inv, (hi - origin) * inv);
                let (t1, t2) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return false;
                }
            }
        }

        true
    }
}
