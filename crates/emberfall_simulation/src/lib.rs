//! EMBERFALL Simulation Core
//!
//! Headless ECS-симуляция боя action-RPG (strategic layer):
//! - targeting: shape-запросы целей (круг/прямоугольник/сектор/линия)
//! - combat: расчёт урона (hit/crit/разброс/митигация) + маршрутизация
//! - lifecycle: касты Click/Hold/Toggle/Charge на тиковых state machines
//! - projectile: снаряды с модулями и условиями уничтожения
//! - ai: FSM мозгов NPC + стратегии движения + weighted skill pool
//! - bus: синхронный pub/sub для рендера/UI/звука
//!
//! Рендер, физика коллизий, загрузка данных — внешние коллабораторы: они
//! гонят `App::update()` и обмениваются с ядром узкими событиями
//! (ProjectileOverlap внутрь, ActionEventBus наружу).

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod bus;
pub mod combat;
pub mod components;
pub mod lifecycle;
pub mod logger;
pub mod projectile;
pub mod registry;
pub mod skills;
pub mod targeting;

// Re-export базовых типов для удобства
pub use ai::{
    build_strategy, standard_npc_brain, AIPlugin, AiConfig, AlertState, AttackingState, Brain,
    BrainCtx, BrainState, BrainStateTag, ChargingState, ChaseState, DeadState, HurtState,
    IdleState, MovementStrategy, MovementStrategyConfig, Perception, SkillPool, SkillPoolEntry,
    SummonRequested, SummoningState, WanderingState,
};
pub use bus::{ActionEvent, ActionEventBus, ActionEventData, ActionEventKind, SubscriptionId};
pub use combat::{
    apply, resolve, AdditionalEffect, AttackDefinition, CombatPlugin, CombatantDied, DamageDealt,
    DamageIntent, DamageResult, DamageType, Dead, SkillRef,
};
pub use components::*;
pub use lifecycle::{
    ActiveCast, CastBehavior, CastRelease, CastRequest, CasterState, InterruptCast,
    LifecyclePlugin, ToggledSkills,
};
pub use projectile::{
    DestructionCondition, DestructionView, MotionSpec, Projectile, ProjectileModule,
    ProjectileMotion, ProjectileOverlap, ProjectilePlugin, ProjectileSpec,
};
pub use registry::CombatantRegistry;
pub use skills::{SkillAction, SkillCatalog, SkillEffect, SkillId, Skills, StaticSkillCatalog};
pub use targeting::{
    ResultSelector, SearchArea, SearchFilter, SortMethod, TargetQuery, TeamConstraint,
};

/// Фиксированный порядок подсистем внутри тика (см. DESIGN.md)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Восприятие + мозги NPC
    Ai,
    /// Касты и исполнение скиллов
    Lifecycle,
    /// Снаряды
    Projectiles,
    /// Расчёт и применение урона
    Combat,
    /// Интеграция позиций
    Movement,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Fixed timestep 60Hz для simulation tick
        app.insert_resource(Time::<Fixed>::from_hz(60.0));

        // Сервисы мира — явные ресурсы, никаких глобалов
        app.init_resource::<CombatantRegistry>()
            .init_resource::<ActionEventBus>()
            .init_resource::<Skills>();

        // Детерминистичный RNG (seed по умолчанию, create_headless_app ставит свой)
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.configure_sets(
            FixedUpdate,
            (
                SimSet::Ai,
                SimSet::Lifecycle,
                SimSet::Projectiles,
                SimSet::Combat,
                SimSet::Movement,
            )
                .chain(),
        );

        app.add_plugins((AIPlugin, LifecyclePlugin, ProjectilePlugin, CombatPlugin));

        app.add_systems(
            FixedUpdate,
            components::integrate_velocity.in_set(SimSet::Movement),
        );
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0));

    app
}

/// Один тик симуляции по виртуальным часам
///
/// Вместо ожидания wall-clock аккумулятора продвигаем Time<Fixed> на ровно
/// один timestep и гоняем FixedUpdate — тесты и headless-прогоны полностью
/// детерминированы.
pub fn advance_tick(app: &mut App) {
    let timestep = app.world().resource::<Time<Fixed>>().timestep();
    app.world_mut()
        .resource_mut::<Time<Fixed>>()
        .advance_by(timestep);
    app.world_mut().run_schedule(FixedUpdate);
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
