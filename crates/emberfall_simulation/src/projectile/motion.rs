//! Стратегии движения снарядов
//!
//! Static/Linear/Orbital/Arc — чистые функции от elapsed time;
//! Tracking/Bouncing держат минимум состояния (текущее направление /
//! скорость после отражения). Живую позицию цели стратегия получает
//! через accessor, не через прямой доступ к ECS.

use bevy::prelude::*;

/// Конфигурация движения (в каталоге скиллов)
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum MotionSpec {
    Static,
    Linear {
        speed: f32,
    },
    Tracking {
        speed: f32,
        /// Максимальный доворот (градусы/сек)
        turn_rate: f32,
    },
    Bouncing {
        speed: f32,
        /// Полуразмер зоны отражения вокруг точки выстрела
        half_extent: f32,
    },
    Orbital {
        radius: f32,
        /// Градусы/сек, знак задаёт направление
        angular_velocity: f32,
    },
    Arc {
        /// Видимая высота дуги (для слоя рендера, на траекторию XY не влияет)
        apex_height: f32,
        duration: f32,
        range: f32,
    },
}

/// Рантайм-состояние движения снаряда
#[derive(Debug, Clone)]
pub enum ProjectileMotion {
    Static,
    Linear {
        velocity: Vec2,
    },
    Tracking {
        target: Option<Entity>,
        speed: f32,
        turn_rate: f32,
        current_dir: Vec2,
    },
    Bouncing {
        velocity: Vec2,
        min: Vec2,
        max: Vec2,
    },
    Orbital {
        center: Vec2,
        radius: f32,
        angular_velocity: f32,
        start_angle: f32,
    },
    Arc {
        start: Vec2,
        target_point: Vec2,
        apex_height: f32,
        duration: f32,
    },
}

impl ProjectileMotion {
    /// Собрать рантайм-состояние из конфига в момент выстрела
    pub fn from_spec(spec: &MotionSpec, origin: Vec2, direction: Vec2, target: Option<Entity>) -> Self {
        let dir = if direction.length_squared() > 0.0 {
            direction.normalize()
        } else {
            Vec2::X
        };

        match *spec {
            MotionSpec::Static => Self::Static,
            MotionSpec::Linear { speed } => Self::Linear {
                velocity: dir * speed,
            },
            MotionSpec::Tracking { speed, turn_rate } => Self::Tracking {
                target,
                speed,
                turn_rate,
                current_dir: dir,
            },
            MotionSpec::Bouncing { speed, half_extent } => Self::Bouncing {
                velocity: dir * speed,
                min: origin - Vec2::splat(half_extent),
                max: origin + Vec2::splat(half_extent),
            },
            MotionSpec::Orbital {
                radius,
                angular_velocity,
            } => Self::Orbital {
                center: origin,
                radius,
                angular_velocity,
                start_angle: dir.to_angle().to_degrees(),
            },
            MotionSpec::Arc {
                apex_height,
                duration,
                range,
            } => Self::Arc {
                start: origin,
                target_point: origin + dir * range,
                apex_height,
                duration: duration.max(0.05),
            },
        }
    }

    /// Новая позиция снаряда
    ///
    /// `target_pos` — живой accessor позиции цели (Tracking).
    pub fn step(
        &mut self,
        current: Vec2,
        life_time: f32,
        delta: f32,
        target_pos: impl Fn(Entity) -> Option<Vec2>,
    ) -> Vec2 {
        match self {
            Self::Static => current,

            Self::Linear { velocity } => current + *velocity * delta,

            Self::Tracking {
                target,
                speed,
                turn_rate,
                current_dir,
            } => {
                if let Some(desired) = target
                    .and_then(&target_pos)
                    .map(|p| p - current)
                    .filter(|d| d.length_squared() > 1e-8)
                {
                    // Доворачиваем не быстрее turn_rate
                    let desired_dir = desired.normalize();
                    let max_turn = (turn_rate.to_radians() * delta).abs();
                    let angle_diff = current_dir.angle_to(desired_dir);
                    let turn = angle_diff.clamp(-max_turn, max_turn);
                    *current_dir = Vec2::from_angle(turn).rotate(*current_dir);
                } else {
                    // Цель исчезла — летим прямо
                    *target = None;
                }
                current + *current_dir * *speed * delta
            }

            Self::Bouncing { velocity, min, max } => {
                let mut next = current + *velocity * delta;
                if next.x < min.x || next.x > max.x {
                    velocity.x = -velocity.x;
                    next.x = next.x.clamp(min.x, max.x);
                }
                if next.y < min.y || next.y > max.y {
                    velocity.y = -velocity.y;
                    next.y = next.y.clamp(min.y, max.y);
                }
                next
            }

            Self::Orbital {
                center,
                radius,
                angular_velocity,
                start_angle,
            } => {
                let angle = (*start_angle + *angular_velocity * life_time).to_radians();
                *center + Vec2::from_angle(angle) * *radius
            }

            Self::Arc {
                start,
                target_point,
                duration,
                ..
            } => {
                let t = (life_time / *duration).min(1.0);
                start.lerp(*target_point, t)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_target(_: Entity) -> Option<Vec2> {
        None
    }

    #[test]
    fn test_static_never_moves() {
        let mut motion = ProjectileMotion::Static;
        let pos = Vec2::new(3.0, 4.0);
        assert_eq!(motion.step(pos, 1.0, 0.016, no_target), pos);
    }

    #[test]
    fn test_linear_advances_by_velocity() {
        let mut motion =
            ProjectileMotion::from_spec(&MotionSpec::Linear { speed: 10.0 }, Vec2::ZERO, Vec2::X, None);
        let next = motion.step(Vec2::ZERO, 0.0, 0.5, no_target);
        assert!((next - Vec2::new(5.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_tracking_turns_towards_target() {
        let target = Entity::from_raw(9);
        let mut motion = ProjectileMotion::from_spec(
            &MotionSpec::Tracking {
                speed: 5.0,
                turn_rate: 360.0,
            },
            Vec2::ZERO,
            Vec2::X,
            Some(target),
        );

        // Цель сверху: за несколько шагов направление должно повернуть к +Y
        let mut pos = Vec2::ZERO;
        for i in 0..30 {
            pos = motion.step(pos, i as f32 * 0.05, 0.05, |_| Some(Vec2::new(0.0, 50.0)));
        }
        assert!(pos.y > 0.0, "снаряд должен уйти вверх, pos = {:?}", pos);
    }

    #[test]
    fn test_tracking_falls_back_to_straight_flight() {
        let target = Entity::from_raw(9);
        let mut motion = ProjectileMotion::from_spec(
            &MotionSpec::Tracking {
                speed: 10.0,
                turn_rate: 180.0,
            },
            Vec2::ZERO,
            Vec2::X,
            Some(target),
        );

        // Цель мертва (accessor даёт None) → летим по прямой
        let next = motion.step(Vec2::ZERO, 0.0, 0.1, no_target);
        assert!((next - Vec2::new(1.0, 0.0)).length() < 1e-5);
        if let ProjectileMotion::Tracking { target, .. } = &motion {
            assert!(target.is_none(), "потерянная цель забывается");
        }
    }

    #[test]
    fn test_bouncing_reflects_at_bounds() {
        let mut motion = ProjectileMotion::from_spec(
            &MotionSpec::Bouncing {
                speed: 10.0,
                half_extent: 5.0,
            },
            Vec2::ZERO,
            Vec2::X,
            None,
        );

        let mut pos = Vec2::ZERO;
        for i in 0..8 {
            pos = motion.step(pos, i as f32 * 0.1, 0.1, no_target);
        }
        // 0.8 сек × 10 м/с = 8 м пути при границе 5 → был отскок, позиция в зоне
        assert!(pos.x <= 5.0 && pos.x >= -5.0);
        if let ProjectileMotion::Bouncing { velocity, .. } = &motion {
            assert!(velocity.x < 0.0, "скорость по X отразилась");
        }
    }

    #[test]
    fn test_orbital_keeps_radius() {
        let center = Vec2::new(10.0, 10.0);
        let mut motion = ProjectileMotion::from_spec(
            &MotionSpec::Orbital {
                radius: 3.0,
                angular_velocity: 90.0,
            },
            center,
            Vec2::X,
            None,
        );

        for i in 0..40 {
            let pos = motion.step(center, i as f32 * 0.1, 0.1, no_target);
            assert!(((pos - center).length() - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_arc_reaches_target_point() {
        let mut motion = ProjectileMotion::from_spec(
            &MotionSpec::Arc {
                apex_height: 2.0,
                duration: 1.0,
                range: 10.0,
            },
            Vec2::ZERO,
            Vec2::X,
            None,
        );

        let mid = motion.step(Vec2::ZERO, 0.5, 0.016, no_target);
        assert!((mid.x - 5.0).abs() < 1e-4);

        let end = motion.step(Vec2::ZERO, 1.0, 0.016, no_target);
        assert!((end - Vec2::new(10.0, 0.0)).length() < 1e-4);

        // За пределами duration прилипает к точке приземления
        let after = motion.step(Vec2::ZERO, 5.0, 0.016, no_target);
        assert_eq!(after, Vec2::new(10.0, 0.0));
    }
}
