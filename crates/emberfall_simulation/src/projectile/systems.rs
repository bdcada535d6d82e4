//! Системы снарядов: движение, модули, уничтожение, оверлапы
//!
//! Внешний движок коллизий — только триггер: на ProjectileOverlap снаряд
//! переспрашивает поисковый движок своим фильтром из своей позиции и сам
//! решает, кого задел (0..N целей, AOE). Сырой паре не верим.

use bevy::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::combat::{ApplyStatusIntent, DamageIntent};
use crate::components::StaticObstacle;
use crate::lifecycle::CastRelease;
use crate::projectile::{
    DestructionView, ModuleAction, Projectile, ProjectileOverlap,
};
use crate::targeting::{ResultSelector, SearchFilter, SortMethod, TargetQuery};
use crate::DeterministicRng;

/// Система: per-frame обновление снарядов
///
/// Порядок на снаряд: life_time → движение → модули → условие уничтожения
/// (плюс жёсткий потолок времени жизни).
pub fn update_projectiles(
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform)>,
    obstacles: Query<&StaticObstacle>,
    targets: TargetQuery,
    mut rng: ResMut<DeterministicRng>,
    mut damage_events: EventWriter<DamageIntent>,
    mut status_events: EventWriter<ApplyStatusIntent>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    let candidates = targets.collect_candidates();

    for (entity, mut projectile, mut transform) in projectiles.iter_mut() {
        if projectile.destroyed {
            // Поздний тик после уничтожения — no-op
            continue;
        }

        projectile.life_time += delta;

        // Движение
        let prev = transform.translation.truncate();
        let life_time = projectile.life_time;
        let next = projectile.motion.step(prev, life_time, delta, |target| {
            candidates
                .iter()
                .find(|c| c.entity == target)
                .map(|c| c.pos)
        });
        transform.translation.x = next.x;
        transform.translation.y = next.y;

        // Пробитые препятствия (вход в AABB из внешней точки)
        if next != prev {
            for obstacle in obstacles.iter() {
                if !obstacle.contains(prev) && obstacle.segment_hits(prev, next) {
                    projectile.obstacles_passed += 1;
                }
            }
        }

        // Модули
        let mut actions = Vec::new();
        for module in projectile.modules.iter_mut() {
            module.on_update(delta, &mut actions);
        }
        if !actions.is_empty() {
            execute_actions(
                actions,
                &projectile,
                next,
                &targets,
                &mut rng.rng,
                &mut damage_events,
                &mut status_events,
            );
        }

        // Уничтожение: жёсткий потолок + условие
        let view = destruction_view(&projectile, next);
        if projectile.life_time >= projectile.max_life_time
            || projectile.destruction.should_destroy(&view)
        {
            destroy_projectile(
                &mut commands,
                entity,
                &mut projectile,
                next,
                &targets,
                &mut rng.rng,
                &mut damage_events,
                &mut status_events,
            );
        }
    }
}

/// Система: авторитетное разрешение оверлапов
///
/// Каждая цель получает урон от снаряда не больше одного раза (hit set);
/// суммарно — не больше max_targets, ближние в приоритете.
pub fn handle_projectile_overlaps(
    mut commands: Commands,
    mut overlaps: EventReader<ProjectileOverlap>,
    mut projectiles: Query<(&mut Projectile, &Transform)>,
    targets: TargetQuery,
    mut rng: ResMut<DeterministicRng>,
    mut damage_events: EventWriter<DamageIntent>,
    mut status_events: EventWriter<ApplyStatusIntent>,
) {
    for overlap in overlaps.read() {
        let Ok((mut projectile, transform)) = projectiles.get_mut(overlap.projectile) else {
            continue; // снаряд уже исчез — устаревший оверлап
        };
        if projectile.destroyed {
            continue;
        }

        let remaining = projectile
            .max_targets
            .saturating_sub(projectile.hit_targets.len());
        if remaining == 0 {
            continue;
        }

        let pos = transform.translation.truncate();

        // Переспрашиваем движок: свой фильтр, своя позиция, уже-побитые вне
        let mut filter = projectile.filter.clone();
        filter.exclude.extend(projectile.hit_targets.iter().copied());
        let selector = ResultSelector {
            sort: SortMethod::Nearest,
            limit: Some(remaining),
            random_count: None,
        };
        let hits = targets.run(pos, &filter, &selector, &mut rng.rng);

        if hits.is_empty() {
            continue;
        }

        let mut actions = Vec::new();
        for target in hits {
            projectile.hit_targets.insert(target);
            for module in projectile.modules.iter_mut() {
                module.on_hit(target, &mut actions);
            }
        }
        execute_actions(
            actions,
            &projectile,
            pos,
            &targets,
            &mut rng.rng,
            &mut damage_events,
            &mut status_events,
        );

        // HitTargetCount мог сработать прямо сейчас
        let view = destruction_view(&projectile, pos);
        if projectile.destruction.should_destroy(&view) {
            destroy_projectile(
                &mut commands,
                overlap.projectile,
                &mut projectile,
                pos,
                &targets,
                &mut rng.rng,
                &mut damage_events,
                &mut status_events,
            );
        }
    }
}

/// Система: отпускание кнопки владельца (ButtonRelease-условия)
pub fn flag_released_projectiles(
    mut releases: EventReader<CastRelease>,
    mut projectiles: Query<&mut Projectile>,
) {
    for release in releases.read() {
        for mut projectile in projectiles.iter_mut() {
            if projectile.source == release.caster {
                projectile.released = true;
            }
        }
    }
}

fn destruction_view(projectile: &Projectile, pos: Vec2) -> DestructionView {
    DestructionView {
        life_time: projectile.life_time,
        hit_count: projectile.hit_targets.len() as u32,
        obstacles_passed: projectile.obstacles_passed,
        released: projectile.released,
        distance_from_origin: pos.distance(projectile.origin),
    }
}

/// Уничтожение снаряда: каждый модуль нотифицируется ровно один раз
#[allow(clippy::too_many_arguments)]
fn destroy_projectile(
    commands: &mut Commands,
    entity: Entity,
    projectile: &mut Projectile,
    pos: Vec2,
    targets: &TargetQuery,
    rng: &mut ChaCha8Rng,
    damage_events: &mut EventWriter<DamageIntent>,
    status_events: &mut EventWriter<ApplyStatusIntent>,
) {
    if projectile.destroyed {
        return; // идемпотентность: повторный вызов — no-op
    }
    projectile.destroyed = true;

    let mut actions = Vec::new();
    for module in projectile.modules.iter_mut() {
        module.on_destroy(&mut actions);
    }
    if !actions.is_empty() {
        execute_actions(
            actions,
            projectile,
            pos,
            targets,
            rng,
            damage_events,
            status_events,
        );
    }

    if let Ok(mut entity_commands) = commands.get_entity(entity) {
        entity_commands.despawn();
    }
}

/// Исполнение отложенных последствий модулей
#[allow(clippy::too_many_arguments)]
fn execute_actions(
    actions: Vec<ModuleAction>,
    projectile: &Projectile,
    pos: Vec2,
    targets: &TargetQuery,
    rng: &mut ChaCha8Rng,
    damage_events: &mut EventWriter<DamageIntent>,
    status_events: &mut EventWriter<ApplyStatusIntent>,
) {
    for action in actions {
        match action {
            ModuleAction::DealDamage { target, attack } => {
                damage_events.write(DamageIntent {
                    attacker: projectile.source,
                    attacker_stats: projectile.source_stats.clone(),
                    target,
                    attack,
                    skill: Some(projectile.skill),
                });
            }

            ModuleAction::ApplyStatus { target, status } => {
                status_events.write(ApplyStatusIntent { target, status });
            }

            ModuleAction::DamageArea {
                area,
                attack,
                max_targets,
            } => {
                let filter = SearchFilter::hostiles(projectile.source_team, projectile.source)
                    .with_area(area);
                let selector = ResultSelector {
                    sort: SortMethod::Nearest,
                    limit: (max_targets > 0).then_some(max_targets),
                    random_count: None,
                };
                for target in targets.run(pos, &filter, &selector, rng) {
                    damage_events.write(DamageIntent {
                        attacker: projectile.source,
                        attacker_stats: projectile.source_stats.clone(),
                        target,
                        attack: attack.clone(),
                        skill: Some(projectile.skill),
                    });
                }
            }
        }
    }
}
