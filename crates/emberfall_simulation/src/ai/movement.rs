//! Стратегии перемещения NPC
//!
//! Независимые, сменяемые объекты; конфиг — отдельная запись, рантайм-состояние
//! собирает фабрика build_strategy (исчерпывающий match, без строковых тегов
//! и default-фоллбэка).

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::ai::avoidance::steer_around;
use crate::components::StaticObstacle;

/// Конфигурация стратегии (данные каталога)
#[derive(Debug, Clone)]
pub enum MovementStrategyConfig {
    Stationary,
    RandomWander {
        /// Радиус блуждания вокруг точки спавна
        radius: f32,
        /// Доля move_speed при блуждании
        speed_factor: f32,
        pause_min: f32,
        pause_max: f32,
    },
    PathPatrol {
        points: Vec<Vec2>,
        looped: bool,
    },
    ChaseTarget {
        /// Ближе этой дистанции не подходим
        stop_distance: f32,
    },
    MaintainDistance {
        preferred: f32,
        tolerance: f32,
    },
}

/// Вход одного шага стратегии
pub struct StrategyCtx<'a> {
    pub pos: Vec2,
    /// Точка привязки (спавн)
    pub anchor: Vec2,
    /// Позиция цели, если стратегии она нужна
    pub target_pos: Option<Vec2>,
    pub move_speed: f32,
    pub dt: f32,
    pub obstacles: &'a [StaticObstacle],
}

/// Рантайм-состояние стратегии
#[derive(Debug, Clone)]
pub enum MovementStrategy {
    Stationary,
    RandomWander {
        radius: f32,
        speed_factor: f32,
        pause_min: f32,
        pause_max: f32,
        /// Текущая точка блуждания
        waypoint: Option<Vec2>,
        /// Остаток паузы между отрезками
        pause_left: f32,
    },
    PathPatrol {
        points: Vec<Vec2>,
        looped: bool,
        next: usize,
        forward: bool,
    },
    ChaseTarget {
        stop_distance: f32,
    },
    MaintainDistance {
        preferred: f32,
        tolerance: f32,
    },
}

/// Фабрика: конфиг → состояние
pub fn build_strategy(config: &MovementStrategyConfig) -> MovementStrategy {
    match config {
        MovementStrategyConfig::Stationary => MovementStrategy::Stationary,
        MovementStrategyConfig::RandomWander {
            radius,
            speed_factor,
            pause_min,
            pause_max,
        } => MovementStrategy::RandomWander {
            radius: *radius,
            speed_factor: *speed_factor,
            pause_min: *pause_min,
            pause_max: *pause_max,
            waypoint: None,
            pause_left: 0.0,
        },
        MovementStrategyConfig::PathPatrol { points, looped } => MovementStrategy::PathPatrol {
            points: points.clone(),
            looped: *looped,
            next: 0,
            forward: true,
        },
        MovementStrategyConfig::ChaseTarget { stop_distance } => MovementStrategy::ChaseTarget {
            stop_distance: *stop_distance,
        },
        MovementStrategyConfig::MaintainDistance {
            preferred,
            tolerance,
        } => MovementStrategy::MaintainDistance {
            preferred: *preferred,
            tolerance: *tolerance,
        },
    }
}

impl MovementStrategy {
    /// Желаемая скорость на этот тик
    pub fn desired_velocity(&mut self, ctx: &StrategyCtx, rng: &mut ChaCha8Rng) -> Vec2 {
        match self {
            Self::Stationary => Vec2::ZERO,

            Self::RandomWander {
                radius,
                speed_factor,
                pause_min,
                pause_max,
                waypoint,
                pause_left,
            } => {
                if *pause_left > 0.0 {
                    *pause_left -= ctx.dt;
                    return Vec2::ZERO;
                }

                let goal = match *waypoint {
                    Some(goal) => goal,
                    None => {
                        // Новая точка в круге вокруг anchor
                        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                        let dist = rng.gen_range(0.0..radius.max(0.1));
                        let goal = ctx.anchor + Vec2::from_angle(angle) * dist;
                        *waypoint = Some(goal);
                        goal
                    }
                };

                let to_goal = goal - ctx.pos;
                if to_goal.length() < 0.3 {
                    // Дошли: пауза, потом новая точка
                    *waypoint = None;
                    *pause_left = rng.gen_range(*pause_min..=*pause_max);
                    return Vec2::ZERO;
                }

                let desired = to_goal.normalize() * ctx.move_speed * *speed_factor;
                steer_around(ctx.pos, desired, 1.5, ctx.obstacles)
            }

            Self::PathPatrol {
                points,
                looped,
                next,
                forward,
            } => {
                if points.is_empty() {
                    return Vec2::ZERO;
                }
                let goal = points[(*next).min(points.len() - 1)];
                let to_goal = goal - ctx.pos;
                if to_goal.length() < 0.3 {
                    // Следующая точка маршрута (loop или ping-pong)
                    if *looped {
                        *next = (*next + 1) % points.len();
                    } else {
                        if *forward {
                            if *next + 1 >= points.len() {
                                *forward = false;
                            } else {
                                *next += 1;
                            }
                        }
                        if !*forward {
                            if *next == 0 {
                                *forward = true;
                            } else {
                                *next -= 1;
                            }
                        }
                    }
                    return Vec2::ZERO;
                }
                let desired = to_goal.normalize() * ctx.move_speed;
                steer_around(ctx.pos, desired, 1.5, ctx.obstacles)
            }

            Self::ChaseTarget { stop_distance } => {
                let Some(target) = ctx.target_pos else {
                    return Vec2::ZERO;
                };
                let to_target = target - ctx.pos;
                if to_target.length() <= *stop_distance {
                    return Vec2::ZERO;
                }
                let desired = to_target.normalize() * ctx.move_speed;
                steer_around(ctx.pos, desired, 2.0, ctx.obstacles)
            }

            Self::MaintainDistance {
                preferred,
                tolerance,
            } => {
                let Some(target) = ctx.target_pos else {
                    return Vec2::ZERO;
                };
                let to_target = target - ctx.pos;
                let distance = to_target.length();
                if distance < 1e-4 {
                    return Vec2::X * ctx.move_speed; // стоим в цели — отходим
                }

                let desired = if distance > *preferred + *tolerance {
                    to_target.normalize() * ctx.move_speed
                } else if distance < *preferred - *tolerance {
                    // Кайтим: пятимся от цели
                    -to_target.normalize() * ctx.move_speed
                } else {
                    return Vec2::ZERO; // в коридоре — стоим
                };
                steer_around(ctx.pos, desired, 2.0, ctx.obstacles)
            }
        }
    }
}
