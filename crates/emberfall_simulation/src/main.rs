//! Headless симуляция EMBERFALL
//!
//! Два отряда NPC дерутся без рендера: дымовая проверка детерминизма и
//! боевого цикла (восприятие → преследование → скиллы → урон → смерть).

use std::sync::Arc;

use bevy::prelude::*;
use emberfall_simulation::*;

fn demo_catalog() -> Skills {
    let strike = SkillAction {
        cast: CastBehavior::Click {
            cast_time: 0.25,
            recovery_time: 0.3,
        },
        energy_cost: 10.0,
        effect: SkillEffect::AreaStrike {
            area: SearchArea::Circle { radius: 2.0 },
            attack: AttackDefinition::physical(1.0),
            max_targets: 1,
        },
    };
    let bolt = SkillAction {
        cast: CastBehavior::Click {
            cast_time: 0.4,
            recovery_time: 0.4,
        },
        energy_cost: 15.0,
        effect: SkillEffect::SpawnProjectile(ProjectileSpec::bolt(
            AttackDefinition::magical(1.2),
            12.0,
            25.0,
        )),
    };

    let catalog = StaticSkillCatalog::default()
        .with(1, 1, strike)
        .with(2, 1, bolt);
    Skills::new(Arc::new(catalog))
}

fn spawn_fighter(world: &mut World, position: Vec2, team: u64) -> Entity {
    let config = AiConfig {
        hurt_recovery: Some(0.4),
        ..Default::default()
    };
    let brain = standard_npc_brain(position, &config);
    let pool = SkillPool::new(
        vec![
            SkillPoolEntry::new(SkillRef { id: 1, level: 1 }, 3.0, 1.0, 2.5),
            SkillPoolEntry::new(SkillRef { id: 2, level: 1 }, 1.0, 2.0, 20.0),
        ],
        0.8,
    );

    let entity = world
        .spawn((
            Combatant {
                type_id: 100,
                team,
                kind: CombatantKind::Npc,
            },
            CombatTarget,
            Transform::from_translation(position.extend(0.0)),
            Velocity::default(),
            CasterState::default(),
            Perception::default(),
            config,
            brain,
            pool,
        ))
        .id();

    world.resource_mut::<CombatantRegistry>().register(entity);
    entity
}

fn main() {
    let seed = 42;
    println!("Starting EMBERFALL headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(demo_catalog());

    // Два отряда 2×2 на дистанции обнаружения
    spawn_fighter(app.world_mut(), Vec2::new(-4.0, 1.0), 1);
    spawn_fighter(app.world_mut(), Vec2::new(-4.0, -1.0), 1);
    spawn_fighter(app.world_mut(), Vec2::new(4.0, 1.0), 2);
    spawn_fighter(app.world_mut(), Vec2::new(4.0, -1.0), 2);

    // Прогоняем 1000 тиков (~16.7 сек при 60Hz)
    for tick in 0..1000 {
        advance_tick(&mut app);

        if tick % 100 == 0 {
            let alive = app.world().resource::<CombatantRegistry>().len();
            println!("Tick {}: {} combatants alive", tick, alive);
        }
    }

    println!("Simulation complete!");
}
