//! Снаряды — транзиентные пространственные эффекты
//!
//! Снаряд живёт в ECS: позиция, стратегия движения, упорядоченные модули
//! поведения, условие уничтожения, набор уже поражённых целей. Коллизии
//! детектит внешний движок, но авторитетный список целей снаряд всегда
//! выводит сам через targeting engine.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::combat::{AttackDefinition, SkillRef};
use crate::components::{CombatantStats, TeamId};
use crate::targeting::{SearchArea, SearchFilter, TeamConstraint};
use crate::SimSet;

pub mod destruction;
pub mod modules;
pub mod motion;
pub mod systems;

pub use destruction::{DestructionCondition, DestructionView};
pub use modules::{ModuleAction, ProjectileModule};
pub use motion::{MotionSpec, ProjectileMotion};
pub use systems::{flag_released_projectiles, handle_projectile_overlaps, update_projectiles};

/// Сырой оверлап от внешнего движка (мост рендера/физики)
///
/// `other` — только повод пересчитать цели, в выдачу он не верится.
#[derive(Event, Debug, Clone)]
pub struct ProjectileOverlap {
    pub projectile: Entity,
    pub other: Entity,
}

/// Конфигурация снаряда в каталоге скиллов
#[derive(Debug, Clone)]
pub struct ProjectileSpec {
    pub attack: AttackDefinition,
    /// Форма коллизии (круг или прямоугольник)
    pub collision: SearchArea,
    pub motion: MotionSpec,
    pub destruction: DestructionCondition,
    /// Максимум различных целей за жизнь снаряда
    pub max_targets: usize,
    /// Жёсткий потолок времени жизни (секунды)
    pub max_life_time: f32,
    /// Дополнительные модули (помимо основного Damage)
    pub extra_modules: Vec<ProjectileModule>,
}

impl ProjectileSpec {
    /// Прямолинейная "стрела": один хит, уничтожение по дальности
    pub fn bolt(attack: AttackDefinition, speed: f32, max_distance: f32) -> Self {
        Self {
            attack,
            collision: SearchArea::Circle { radius: 0.5 },
            motion: MotionSpec::Linear { speed },
            destruction: DestructionCondition::AnyOf(vec![
                DestructionCondition::HitTargetCount { count: 1 },
                DestructionCondition::Range { max_distance },
            ]),
            max_targets: 1,
            max_life_time: 10.0,
            extra_modules: Vec::new(),
        }
    }
}

/// Компонент снаряда
#[derive(Component, Debug)]
pub struct Projectile {
    pub skill: SkillRef,
    pub source: Entity,
    pub source_team: TeamId,
    /// Snapshot stats владельца в момент выстрела
    pub source_stats: CombatantStats,
    /// Фильтр целей (внутри — форма коллизии)
    pub filter: SearchFilter,
    pub max_targets: usize,
    pub modules: Vec<ProjectileModule>,
    pub motion: ProjectileMotion,
    pub destruction: DestructionCondition,
    /// Точка выстрела (для Range-условия)
    pub origin: Vec2,
    /// Цели, уже получившие урон (один хит на цель)
    pub hit_targets: HashSet<Entity>,
    pub life_time: f32,
    pub max_life_time: f32,
    pub obstacles_passed: u32,
    pub released: bool,
    /// Идемпотентный флаг уничтожения
    pub destroyed: bool,
}

/// Спавн снаряда из конфигурации (вызывается исполнением скилла)
#[allow(clippy::too_many_arguments)]
pub fn spawn_from_spec(
    commands: &mut Commands,
    spec: &ProjectileSpec,
    source: Entity,
    source_team: TeamId,
    source_stats: CombatantStats,
    skill: SkillRef,
    origin: Vec2,
    direction: Vec2,
    target: Option<Entity>,
    scale: f32,
) -> Entity {
    let mut modules = vec![ProjectileModule::Damage {
        attack: spec.attack.scaled(scale),
    }];
    modules.extend(spec.extra_modules.iter().cloned());

    let filter = SearchFilter {
        team: TeamConstraint::HostilesOf(source_team),
        exclude: vec![source],
        area: Some(spec.collision.clone()),
        ..Default::default()
    };

    commands
        .spawn((
            Projectile {
                skill,
                source,
                source_team,
                source_stats,
                filter,
                max_targets: spec.max_targets.max(1),
                modules,
                motion: ProjectileMotion::from_spec(&spec.motion, origin, direction, target),
                destruction: spec.destruction.clone(),
                origin,
                hit_targets: HashSet::new(),
                life_time: 0.0,
                max_life_time: spec.max_life_time,
                obstacles_passed: 0,
                released: false,
                destroyed: false,
            },
            Transform::from_translation(origin.extend(0.0)),
            GlobalTransform::default(),
        ))
        .id()
}

/// Projectile Plugin
///
/// Порядок (FixedUpdate, chain):
/// 1. flag_released_projectiles — отпускание кнопки владельца
/// 2. update_projectiles — движение/модули/уничтожение
/// 3. handle_projectile_overlaps — авторитетное разрешение оверлапов
pub struct ProjectilePlugin;

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ProjectileOverlap>();

        app.add_systems(
            FixedUpdate,
            (
                flag_released_projectiles,
                update_projectiles,
                handle_projectile_overlaps,
            )
                .chain()
                .in_set(SimSet::Projectiles),
        );
    }
}
