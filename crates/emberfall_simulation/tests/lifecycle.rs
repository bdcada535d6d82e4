//! Интеграционные тесты жизненного цикла каста
//!
//! Фазы двигаются виртуальными тиками (60Hz): cast_time 0.5 → эффект на
//! ~30-м тике. Наружные события собираем подпиской на ActionEventBus.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use emberfall_simulation::*;

type EventLog = Arc<Mutex<Vec<(ActionEventKind, Option<f32>)>>>;

fn catalog() -> Skills {
    let click = SkillAction {
        cast: CastBehavior::Click {
            cast_time: 0.5,
            recovery_time: 0.5,
        },
        energy_cost: 10.0,
        effect: SkillEffect::AreaStrike {
            area: SearchArea::Circle { radius: 5.0 },
            attack: AttackDefinition::physical(1.0),
            max_targets: 1,
        },
    };
    let hold = SkillAction {
        cast: CastBehavior::Hold {
            cast_time: 0.2,
            effect_interval: 0.25,
            recovery_time: 0.2,
        },
        energy_cost: 5.0,
        effect: SkillEffect::AreaStrike {
            area: SearchArea::Circle { radius: 5.0 },
            attack: AttackDefinition::magical(0.4),
            max_targets: 1,
        },
    };
    let toggle = SkillAction {
        cast: CastBehavior::Toggle,
        energy_cost: 0.0,
        effect: SkillEffect::SelfHeal { amount: 1 },
    };
    let charge = SkillAction {
        cast: CastBehavior::Charge {
            max_charge_time: 1.0,
            effect_interval: 0.2,
            recovery_time: 0.2,
        },
        energy_cost: 10.0,
        effect: SkillEffect::AreaStrike {
            area: SearchArea::Circle { radius: 5.0 },
            attack: AttackDefinition::physical(2.0),
            max_targets: 1,
        },
    };

    let catalog = StaticSkillCatalog::default()
        .with(1, 1, click)
        .with(2, 1, hold)
        .with(3, 1, toggle)
        .with(4, 1, charge);
    Skills::new(Arc::new(catalog))
}

fn create_app() -> App {
    let mut app = create_headless_app(42);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(catalog());
    app
}

/// Кастер без мозга: командуем событиями напрямую
fn spawn_caster(world: &mut World, pos: Vec2, stats: CombatantStats) -> Entity {
    let entity = world
        .spawn((
            Combatant {
                type_id: 1,
                team: 1,
                kind: CombatantKind::Npc,
            },
            CombatTarget,
            stats,
            Transform::from_translation(pos.extend(0.0)),
            Velocity::default(),
            CasterState::default(),
        ))
        .id();
    world.resource_mut::<CombatantRegistry>().register(entity);
    entity
}

fn spawn_dummy_enemy(world: &mut World, pos: Vec2) -> Entity {
    let entity = world
        .spawn((
            Combatant {
                type_id: 2,
                team: 2,
                kind: CombatantKind::Npc,
            },
            CombatTarget,
            Transform::from_translation(pos.extend(0.0)),
        ))
        .id();
    world.resource_mut::<CombatantRegistry>().register(entity);
    entity
}

/// Подписка на все cast-события; лог хранит (kind, charge_percent)
fn subscribe_cast_events(app: &App) -> EventLog {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let bus = app.world().resource::<ActionEventBus>();

    for kind in [
        ActionEventKind::CastStart,
        ActionEventKind::CastEffect,
        ActionEventKind::CastComplete,
        ActionEventKind::CastInterrupt,
    ] {
        let log = log.clone();
        bus.subscribe(kind, move |event| {
            let charge = match event.data {
                ActionEventData::Charge { percent } => Some(percent),
                _ => None,
            };
            log.lock().unwrap().push((event.kind, charge));
        });
    }
    log
}

fn kinds(log: &EventLog) -> Vec<ActionEventKind> {
    log.lock().unwrap().iter().map(|(k, _)| *k).collect()
}

fn request(app: &mut App, caster: Entity, skill_id: SkillId) {
    app.world_mut().send_event(CastRequest {
        caster,
        skill: SkillRef {
            id: skill_id,
            level: 1,
        },
    });
}

#[test]
fn test_click_cast_timeline() {
    let mut app = create_app();
    let caster = spawn_caster(app.world_mut(), Vec2::ZERO, CombatantStats::default());
    spawn_dummy_enemy(app.world_mut(), Vec2::new(2.0, 0.0));
    let log = subscribe_cast_events(&app);

    request(&mut app, caster, 1);

    // Тик 1: только CastStart
    advance_tick(&mut app);
    assert_eq!(kinds(&log), vec![ActionEventKind::CastStart]);
    assert!(app.world().get::<CasterState>(caster).unwrap().is_casting);

    // До 29-го тика эффекта нет (cast_time 0.5 = 30 тиков)
    for _ in 0..28 {
        advance_tick(&mut app);
    }
    assert_eq!(kinds(&log).len(), 1, "эффект раньше времени");

    // 30-й тик: CastEffect
    advance_tick(&mut app);
    assert_eq!(
        kinds(&log),
        vec![ActionEventKind::CastStart, ActionEventKind::CastEffect]
    );

    // Ещё 30 тиков recovery → CastComplete, состояние чистое
    for _ in 0..30 {
        advance_tick(&mut app);
    }
    assert_eq!(
        kinds(&log),
        vec![
            ActionEventKind::CastStart,
            ActionEventKind::CastEffect,
            ActionEventKind::CastComplete
        ]
    );
    let state = app.world().get::<CasterState>(caster).unwrap();
    assert!(!state.is_casting);
    assert!(state.current_skill.is_none());

    // Эффект дошёл до цели
    assert!(!app.world().resource::<Events<DamageDealt>>().is_empty());
}

#[test]
fn test_attack_speed_halves_phases() {
    let mut app = create_app();
    let fast_stats = CombatantStats {
        attack_speed: 2.0,
        ..Default::default()
    };
    let caster = spawn_caster(app.world_mut(), Vec2::ZERO, fast_stats);
    spawn_dummy_enemy(app.world_mut(), Vec2::new(2.0, 0.0));
    let log = subscribe_cast_events(&app);

    request(&mut app, caster, 1);

    // cast_time 0.5 / 2.0 = 0.25 → эффект на ~15-м тике
    for _ in 0..16 {
        advance_tick(&mut app);
    }
    assert!(
        kinds(&log).contains(&ActionEventKind::CastEffect),
        "attack_speed 2.0 должен вдвое ускорить каст"
    );
}

#[test]
fn test_hold_repeats_effect_until_release() {
    let mut app = create_app();
    let caster = spawn_caster(app.world_mut(), Vec2::ZERO, CombatantStats::default());
    spawn_dummy_enemy(app.world_mut(), Vec2::new(2.0, 0.0));
    let log = subscribe_cast_events(&app);

    request(&mut app, caster, 2);

    // 1 сек удержания: эффект на 0.2 + каждые 0.25 в канале
    for _ in 0..60 {
        advance_tick(&mut app);
    }
    let effects_held = kinds(&log)
        .iter()
        .filter(|k| **k == ActionEventKind::CastEffect)
        .count();
    assert!(
        effects_held >= 3,
        "канал должен повторять эффект: {}",
        effects_held
    );
    assert!(!kinds(&log).contains(&ActionEventKind::CastComplete));

    // Отпускаем → recovery → complete, эффекты больше не идут
    app.world_mut().send_event(CastRelease { caster });
    for _ in 0..30 {
        advance_tick(&mut app);
    }
    let after = kinds(&log);
    assert!(after.contains(&ActionEventKind::CastComplete));
    let effects_after = after
        .iter()
        .filter(|k| **k == ActionEventKind::CastEffect)
        .count();
    assert_eq!(effects_after, effects_held, "после release эффектов нет");
}

#[test]
fn test_toggle_is_instant_and_flips() {
    let mut app = create_app();
    let caster = spawn_caster(app.world_mut(), Vec2::ZERO, CombatantStats::default());
    let log = subscribe_cast_events(&app);

    request(&mut app, caster, 3);
    advance_tick(&mut app);

    // Эффект + завершение в тот же тик, CastStart не публикуется
    assert_eq!(
        kinds(&log),
        vec![ActionEventKind::CastEffect, ActionEventKind::CastComplete]
    );
    assert!(!app.world().get::<CasterState>(caster).unwrap().is_casting);
    let toggled = app.world().get::<ToggledSkills>(caster).unwrap();
    assert!(toggled.on.contains(&3));

    // Повторный запрос — выключение
    request(&mut app, caster, 3);
    advance_tick(&mut app);
    let toggled = app.world().get::<ToggledSkills>(caster).unwrap();
    assert!(!toggled.on.contains(&3), "toggle выключился");
}

#[test]
fn test_charge_reports_percent_and_fires_on_release() {
    let mut app = create_app();
    let caster = spawn_caster(app.world_mut(), Vec2::ZERO, CombatantStats::default());
    spawn_dummy_enemy(app.world_mut(), Vec2::new(2.0, 0.0));
    let log = subscribe_cast_events(&app);

    request(&mut app, caster, 4);

    // Полсекунды заряда (max 1.0) → периодические эффекты с percent < 1
    for _ in 0..30 {
        advance_tick(&mut app);
    }
    {
        let entries = log.lock().unwrap();
        let charges: Vec<f32> = entries.iter().filter_map(|(_, c)| *c).collect();
        assert!(!charges.is_empty(), "нет уведомлений о заряде");
        assert!(charges.iter().all(|&c| c > 0.0 && c <= 1.0));
    }

    // Отпускаем на ~0.5: терминальный эффект с percent ≈ 0.5
    app.world_mut().send_event(CastRelease { caster });
    advance_tick(&mut app);
    let terminal = {
        let entries = log.lock().unwrap();
        entries.iter().rev().find_map(|(k, c)| {
            (*k == ActionEventKind::CastEffect).then_some(*c).flatten()
        })
    };
    let percent = terminal.expect("терминальный эффект несёт charge percent");
    assert!((percent - 0.5).abs() < 0.1, "percent = {}", percent);

    // Recovery → complete
    for _ in 0..20 {
        advance_tick(&mut app);
    }
    assert!(kinds(&log).contains(&ActionEventKind::CastComplete));
}

#[test]
fn test_interrupt_cancels_cast_without_effect() {
    let mut app = create_app();
    let caster = spawn_caster(app.world_mut(), Vec2::ZERO, CombatantStats::default());
    spawn_dummy_enemy(app.world_mut(), Vec2::new(2.0, 0.0));
    let log = subscribe_cast_events(&app);

    request(&mut app, caster, 1);
    for _ in 0..10 {
        advance_tick(&mut app);
    }

    app.world_mut().send_event(InterruptCast { caster });
    for _ in 0..60 {
        advance_tick(&mut app);
    }

    let seen = kinds(&log);
    assert!(seen.contains(&ActionEventKind::CastInterrupt));
    assert!(!seen.contains(&ActionEventKind::CastEffect), "эффект отменён");
    assert!(!seen.contains(&ActionEventKind::CastComplete));
    assert!(!app.world().get::<CasterState>(caster).unwrap().is_casting);
    assert!(app.world().get::<ActiveCast>(caster).is_none());
}

#[test]
fn test_energy_commitment_at_effect_moment() {
    let mut app = create_app();

    // Энергии не хватает: каст стартует, но в момент эффекта прерывается
    let poor_stats = CombatantStats {
        energy: 3.0,
        energy_regen: 0.0,
        ..Default::default()
    };
    let caster = spawn_caster(app.world_mut(), Vec2::ZERO, poor_stats);
    spawn_dummy_enemy(app.world_mut(), Vec2::new(2.0, 0.0));
    let log = subscribe_cast_events(&app);

    request(&mut app, caster, 1);
    for _ in 0..40 {
        advance_tick(&mut app);
    }

    let seen = kinds(&log);
    assert!(seen.contains(&ActionEventKind::CastStart));
    assert!(seen.contains(&ActionEventKind::CastInterrupt), "нет энергии → прерывание");
    assert!(!seen.contains(&ActionEventKind::CastEffect));

    // Энергия не списана (commitment не состоялся)
    let stats = app.world().get::<CombatantStats>(caster).unwrap();
    assert_eq!(stats.energy, 3.0);
}

#[test]
fn test_caster_invariant_self_heals() {
    let mut app = create_app();
    let caster = spawn_caster(app.world_mut(), Vec2::ZERO, CombatantStats::default());

    // Ломаем инвариант руками: is_casting без скилла
    app.world_mut().get_mut::<CasterState>(caster).unwrap().is_casting = true;

    advance_tick(&mut app);

    let state = app.world().get::<CasterState>(caster).unwrap();
    assert!(!state.is_casting, "инвариант само-восстановился");
}
