//! Драйвер мозгов и реакции на боевые события

use bevy::prelude::*;

use crate::ai::machine::{Brain, BrainCtx, BrainStateTag};
use crate::ai::{AiConfig, Perception, SkillPool};
use crate::combat::{CombatantDied, DamageDealt};
use crate::components::{CombatantStats, PlayerControlled, StaticObstacle, Velocity};
use crate::lifecycle::{CastRequest, CasterState, InterruptCast};
use crate::DeterministicRng;

/// Запрос призыва миньонов (исполняет внешний слой/каталог)
#[derive(Event, Debug, Clone)]
pub struct SummonRequested {
    pub summoner: Entity,
    pub position: Vec2,
}

/// Система: тик кулдаунов skill pool'ов (всегда, даже вне боя)
pub fn tick_skill_cooldowns(mut pools: Query<&mut SkillPool>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    for mut pool in pools.iter_mut() {
        pool.tick_cooldowns(delta);
    }
}

/// Система: один тик каждого мозга
///
/// Выходы контекста переводятся в компоненты/события: желаемая скорость →
/// Velocity, запросы скиллов → CastRequest, прерывания → InterruptCast.
pub fn tick_brains(
    mut brains: Query<
        (
            Entity,
            &mut Brain,
            &mut SkillPool,
            &mut Velocity,
            &Transform,
            &CombatantStats,
            &Perception,
            &AiConfig,
            Option<&CasterState>,
        ),
        Without<PlayerControlled>,
    >,
    obstacles: Query<&StaticObstacle>,
    mut rng: ResMut<DeterministicRng>,
    mut cast_events: EventWriter<CastRequest>,
    mut interrupt_events: EventWriter<InterruptCast>,
    mut summon_events: EventWriter<SummonRequested>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    let walls: Vec<StaticObstacle> = obstacles.iter().copied().collect();

    for (entity, mut brain, mut pool, mut velocity, transform, stats, perception, config, caster) in
        brains.iter_mut()
    {
        // Страховка: мёртвый комбатант с живым мозгом → Dead
        if !stats.is_alive() && brain.current() != BrainStateTag::Dead {
            brain.pending = Some(BrainStateTag::Dead);
        }

        let mut ctx = BrainCtx {
            entity,
            pos: transform.translation.truncate(),
            dt: delta,
            stats,
            perception,
            config,
            pool: &mut pool,
            obstacles: &walls,
            rng: &mut rng.rng,
            is_casting: caster.map(|c| c.is_casting).unwrap_or(false),
            velocity: Vec2::ZERO,
            cast_requests: Vec::new(),
            interrupt_cast: false,
            summon_requested: false,
        };

        brain.tick(&mut ctx);

        let out_velocity = ctx.velocity;
        let requests = std::mem::take(&mut ctx.cast_requests);
        let interrupt = ctx.interrupt_cast;
        let summon = ctx.summon_requested;
        let pos = ctx.pos;
        drop(ctx);

        velocity.0 = out_velocity;
        for skill in requests {
            cast_events.write(CastRequest {
                caster: entity,
                skill,
            });
        }
        if interrupt {
            interrupt_events.write(InterruptCast { caster: entity });
        }
        if summon {
            summon_events.write(SummonRequested {
                summoner: entity,
                position: pos,
            });
        }
    }
}

/// Система: реакция мозга на полученный урон
///
/// Alert при уроне уходит в Chase немедленно (таймеры не защищают);
/// остальные состояния прерываются в Hurt. Смерть оформит react_to_death.
pub fn react_to_damage(
    mut damage_events: EventReader<DamageDealt>,
    mut victims: Query<(&mut Brain, &mut Perception)>,
) {
    for event in damage_events.read() {
        if event.is_miss {
            continue; // промах — не инстанс урона
        }
        let Ok((mut brain, mut perception)) = victims.get_mut(event.target) else {
            continue; // не NPC (игрок, объект)
        };

        perception.last_attacker = Some(event.attacker);

        if event.target_died {
            continue;
        }

        match brain.current() {
            BrainStateTag::Alert => brain.pending = Some(BrainStateTag::Chase),
            BrainStateTag::Dead | BrainStateTag::Hurt => {}
            _ => brain.pending = Some(BrainStateTag::Hurt),
        }
    }
}

/// Система: смерть → терминальное Dead-состояние мозга
pub fn react_to_death(
    mut death_events: EventReader<CombatantDied>,
    mut brains: Query<&mut Brain>,
) {
    for event in death_events.read() {
        if let Ok(mut brain) = brains.get_mut(event.entity) {
            brain.pending = Some(BrainStateTag::Dead);
            crate::logger::log(&format!("Brain {:?} → Dead (killed)", event.entity));
        }
    }
}
