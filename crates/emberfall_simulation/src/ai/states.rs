//! Состояния мозга NPC
//!
//! Wandering → Alert → Chase — основной цикл агро; Hurt/Dead — реактивные;
//! Idle/Attacking/Charging/Summoning — для стационарных и босс-архетипов.
//! Движение каждое состояние делегирует своей MovementStrategy.

use bevy::prelude::*;

use crate::ai::machine::{BrainCtx, BrainState, BrainStateTag};
use crate::ai::movement::{build_strategy, MovementStrategy, MovementStrategyConfig, StrategyCtx};
use crate::ai::{avoidance, AiConfig, Brain};
use rand::Rng;

fn strategy_ctx(
    pos: Vec2,
    anchor: Vec2,
    target: Option<Vec2>,
    move_speed: f32,
    dt: f32,
    obstacles: &[crate::components::StaticObstacle],
) -> StrategyCtx<'_> {
    StrategyCtx {
        pos,
        anchor,
        target_pos: target,
        move_speed,
        dt,
        obstacles,
    }
}

/// Idle: стоим, ждём обнаружения
pub struct IdleState;

impl BrainState for IdleState {
    fn update(&mut self, ctx: &mut BrainCtx) -> Option<BrainStateTag> {
        ctx.velocity = Vec2::ZERO;
        ctx.perception.detected.then_some(BrainStateTag::Alert)
    }
}

/// Wandering: ограниченное случайное блуждание с паузами
pub struct WanderingState {
    anchor: Vec2,
    strategy: MovementStrategy,
}

impl WanderingState {
    pub fn new(anchor: Vec2, config: &MovementStrategyConfig) -> Self {
        Self {
            anchor,
            strategy: build_strategy(config),
        }
    }
}

impl BrainState for WanderingState {
    fn update(&mut self, ctx: &mut BrainCtx) -> Option<BrainStateTag> {
        let sctx = strategy_ctx(
            ctx.pos,
            self.anchor,
            None,
            ctx.stats.move_speed,
            ctx.dt,
            ctx.obstacles,
        );
        ctx.velocity = self.strategy.desired_velocity(&sctx, ctx.rng);

        ctx.perception.detected.then_some(BrainStateTag::Alert)
    }
}

/// Alert: держим позицию [min, max] секунд
///
/// Повторная проверка видимости — ТОЛЬКО после min_duration (защита от
/// мгновенного дребезга Alert↔Chase). Урон переводит в Chase немедленно
/// (см. react_to_damage), таймеры это не блокируют.
#[derive(Default)]
pub struct AlertState {
    hold: f32,
    elapsed: f32,
}

impl BrainState for AlertState {
    fn enter(&mut self, ctx: &mut BrainCtx) {
        self.elapsed = 0.0;
        self.hold = ctx
            .rng
            .gen_range(ctx.config.alert_min_duration..=ctx.config.alert_max_duration);
        ctx.velocity = Vec2::ZERO;
    }

    fn update(&mut self, ctx: &mut BrainCtx) -> Option<BrainStateTag> {
        ctx.velocity = Vec2::ZERO;
        self.elapsed += ctx.dt;

        if self.elapsed >= ctx.config.alert_min_duration && ctx.perception.detected {
            return Some(BrainStateTag::Chase);
        }
        if self.elapsed >= self.hold {
            return Some(BrainStateTag::Wandering);
        }
        None
    }
}

/// Chase: преследование + skill pool
///
/// Give-up проверяется на фиксированном интервале, не каждый тик.
pub struct ChaseState {
    strategy: MovementStrategy,
    check_elapsed: f32,
}

impl ChaseState {
    pub fn new(stop_distance: f32) -> Self {
        Self {
            strategy: build_strategy(&MovementStrategyConfig::ChaseTarget { stop_distance }),
            check_elapsed: 0.0,
        }
    }
}

impl BrainState for ChaseState {
    fn enter(&mut self, _ctx: &mut BrainCtx) {
        self.check_elapsed = 0.0;
    }

    fn update(&mut self, ctx: &mut BrainCtx) -> Option<BrainStateTag> {
        let Some(_) = ctx.perception.target else {
            return Some(BrainStateTag::Wandering); // цель исчезла/умерла
        };
        let target_pos = ctx.perception.target_pos;
        let distance = ctx.perception.target_distance;

        let sctx = strategy_ctx(
            ctx.pos,
            ctx.pos,
            Some(target_pos),
            ctx.stats.move_speed,
            ctx.dt,
            ctx.obstacles,
        );
        ctx.velocity = self.strategy.desired_velocity(&sctx, ctx.rng);

        // Скиллы: пул сам решает, что и когда
        let can_cast = !ctx.is_casting;
        if let Some(skill) = ctx.pool.try_pick(ctx.dt, can_cast, distance, ctx.rng) {
            ctx.request_cast(skill);
        }

        // Интервальная give-up проверка
        self.check_elapsed += ctx.dt;
        if self.check_elapsed >= ctx.config.give_up_check_interval {
            self.check_elapsed = 0.0;
            if distance > ctx.config.give_up_distance {
                return Some(BrainStateTag::Wandering);
            }
        }
        None
    }
}

/// Hurt: прерывает текущее поведение
///
/// Авто-выхода в базовой конфигурации нет (hurt_recovery = None);
/// владелец состояния решает через конфиг.
#[derive(Default)]
pub struct HurtState {
    elapsed: f32,
}

impl BrainState for HurtState {
    fn enter(&mut self, ctx: &mut BrainCtx) {
        self.elapsed = 0.0;
        ctx.velocity = Vec2::ZERO;
        ctx.interrupt_cast = true;
    }

    fn update(&mut self, ctx: &mut BrainCtx) -> Option<BrainStateTag> {
        ctx.velocity = Vec2::ZERO;
        let recover_after = ctx.config.hurt_recovery?;

        self.elapsed += ctx.dt;
        if self.elapsed < recover_after {
            return None;
        }
        if ctx.perception.target.is_some() {
            Some(BrainStateTag::Chase)
        } else {
            Some(BrainStateTag::Alert)
        }
    }
}

/// Dead: терминальное состояние, тики — no-op
pub struct DeadState;

impl BrainState for DeadState {
    fn enter(&mut self, ctx: &mut BrainCtx) {
        ctx.velocity = Vec2::ZERO;
        ctx.interrupt_cast = true;
    }

    fn update(&mut self, ctx: &mut BrainCtx) -> Option<BrainStateTag> {
        ctx.velocity = Vec2::ZERO;
        None
    }
}

/// Attacking: стоим в упоре и работаем пулом скиллов
pub struct AttackingState {
    /// Дальше этого — возвращаемся в Chase
    pub resume_chase_distance: f32,
}

impl BrainState for AttackingState {
    fn update(&mut self, ctx: &mut BrainCtx) -> Option<BrainStateTag> {
        ctx.velocity = Vec2::ZERO;

        if ctx.perception.target.is_none() {
            return Some(BrainStateTag::Wandering);
        }
        if ctx.perception.target_distance > self.resume_chase_distance {
            return Some(BrainStateTag::Chase);
        }

        let can_cast = !ctx.is_casting;
        let distance = ctx.perception.target_distance;
        if let Some(skill) = ctx.pool.try_pick(ctx.dt, can_cast, distance, ctx.rng) {
            ctx.request_cast(skill);
        }
        None
    }
}

/// Charging: рывок к зафиксированной точке
pub struct ChargingState {
    pub speed_multiplier: f32,
    pub max_duration: f32,
    dest: Vec2,
    elapsed: f32,
}

impl ChargingState {
    pub fn new(speed_multiplier: f32, max_duration: f32) -> Self {
        Self {
            speed_multiplier,
            max_duration,
            dest: Vec2::ZERO,
            elapsed: 0.0,
        }
    }
}

impl BrainState for ChargingState {
    fn enter(&mut self, ctx: &mut BrainCtx) {
        // Точка фиксируется на входе: рывок не доворачивает за целью
        self.dest = ctx
            .perception
            .last_known_pos
            .unwrap_or(ctx.perception.target_pos);
        self.elapsed = 0.0;
    }

    fn update(&mut self, ctx: &mut BrainCtx) -> Option<BrainStateTag> {
        self.elapsed += ctx.dt;
        let to_dest = self.dest - ctx.pos;

        if to_dest.length() < 0.5 || self.elapsed >= self.max_duration {
            return Some(BrainStateTag::Chase);
        }

        let desired = to_dest.normalize() * ctx.stats.move_speed * self.speed_multiplier;
        ctx.velocity = avoidance::steer_around(ctx.pos, desired, 2.5, ctx.obstacles);
        None
    }
}

/// Summoning: канал призыва, по завершении — запрос суммона наружу
pub struct SummoningState {
    pub channel_duration: f32,
    elapsed: f32,
}

impl SummoningState {
    pub fn new(channel_duration: f32) -> Self {
        Self {
            channel_duration,
            elapsed: 0.0,
        }
    }
}

impl BrainState for SummoningState {
    fn enter(&mut self, ctx: &mut BrainCtx) {
        self.elapsed = 0.0;
        ctx.velocity = Vec2::ZERO;
    }

    fn update(&mut self, ctx: &mut BrainCtx) -> Option<BrainStateTag> {
        ctx.velocity = Vec2::ZERO;
        self.elapsed += ctx.dt;
        if self.elapsed >= self.channel_duration {
            ctx.summon_requested = true;
            return Some(BrainStateTag::Chase);
        }
        None
    }
}

/// Стандартный мозг бродящего NPC: пять базовых состояний
pub fn standard_npc_brain(anchor: Vec2, config: &AiConfig) -> Brain {
    let wander = MovementStrategyConfig::RandomWander {
        radius: config.wander_radius,
        speed_factor: 0.5,
        pause_min: 0.8,
        pause_max: 2.5,
    };

    Brain::new(BrainStateTag::Wandering)
        .with_state(BrainStateTag::Wandering, WanderingState::new(anchor, &wander))
        .with_state(BrainStateTag::Alert, AlertState::default())
        .with_state(BrainStateTag::Chase, ChaseState::new(config.chase_stop_distance))
        .with_state(BrainStateTag::Hurt, HurtState::default())
        .with_state(BrainStateTag::Dead, DeadState)
}
