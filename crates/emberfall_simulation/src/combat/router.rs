//! Combat router — владелец обработки DamageIntent
//!
//! 1. Читает DamageIntent события
//! 2. Резолвит урон (damage::resolve) по snapshot'у stats атакующего
//! 3. Применяет к цели, катает шансы AdditionalEffect
//! 4. Публикует DamageDealt/CombatantDied внутрь и
//!    DamageDealt/DamageReceived/CriticalHit/Death/PlayerKill на шину

use bevy::prelude::*;
use rand::Rng;

use crate::bus::{ActionEvent, ActionEventBus, ActionEventData, ActionEventKind};
use crate::combat::events::{CombatantDied, DamageDealt, DamageIntent};
use crate::combat::{apply, resolve};
use crate::components::{CombatantStats, StatusEffects, Velocity};
use crate::registry::CombatantRegistry;
use crate::DeterministicRng;

/// Маркер: комбатант мёртв (hp == 0)
///
/// Деспавн не автоматический — труп остаётся для слоя рендера.
#[derive(Component, Debug, Default)]
pub struct Dead;

/// Система: расчёт и применение очереди урона
pub fn resolve_damage_intents(
    mut intents: EventReader<DamageIntent>,
    mut targets: Query<(&mut CombatantStats, &mut StatusEffects)>,
    transforms: Query<&Transform>,
    mut rng: ResMut<DeterministicRng>,
    mut dealt_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<CombatantDied>,
    bus: Res<ActionEventBus>,
    registry: Res<CombatantRegistry>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs_f64();

    for intent in intents.read() {
        // Lookup failure: цель уже исчезла — лог, ничего не мутируем
        let Ok((mut target_stats, mut target_status)) = targets.get_mut(intent.target) else {
            crate::logger::log_warning(&format!(
                "DamageIntent: target {:?} has no combat stats, skipped",
                intent.target
            ));
            continue;
        };

        if target_stats.hp == 0 {
            // Добивать труп нечего — интент устарел
            continue;
        }

        let result = resolve(
            &intent.attacker_stats,
            &target_stats,
            &intent.attack,
            &mut rng.rng,
        );

        let was_alive = target_stats.is_alive();
        let died = apply(&mut target_stats, &result);
        let target_died = was_alive && died;

        // Дополнительные эффекты — только при попадании
        if !result.is_miss {
            for effect in &intent.attack.effects {
                if rng.rng.gen_bool(effect.chance.clamp(0.0, 1.0) as f64) {
                    target_status.apply(effect.to_instance());
                }
            }
        }

        dealt_events.write(DamageDealt {
            attacker: intent.attacker,
            target: intent.target,
            damage: result.total_damage,
            is_critical: result.is_critical,
            is_miss: result.is_miss,
            target_died,
            skill: intent.skill,
        });

        // Наружу: позиция цели, если ещё есть
        let target_pos = transforms
            .get(intent.target)
            .ok()
            .map(|t| t.translation.truncate());

        let mut outbound = ActionEvent::new(ActionEventKind::DamageDealt, intent.attacker, now)
            .with_target(intent.target)
            .with_data(ActionEventData::from_result(&result));
        if let Some(skill) = intent.skill {
            outbound = outbound.with_skill(skill);
        }
        if let Some(pos) = target_pos {
            outbound = outbound.with_position(pos);
        }
        bus.publish(&outbound);

        let mut received = outbound.clone();
        received.kind = ActionEventKind::DamageReceived;
        bus.publish(&received);

        if result.is_critical {
            let mut crit = outbound.clone();
            crit.kind = ActionEventKind::CriticalHit;
            bus.publish(&crit);
        }

        if target_died {
            died_events.write(CombatantDied {
                entity: intent.target,
                killer: Some(intent.attacker),
            });

            let mut death = outbound.clone();
            death.kind = ActionEventKind::Death;
            bus.publish(&death);

            if registry.player() == Some(intent.attacker) {
                let mut kill = outbound.clone();
                kill.kind = ActionEventKind::PlayerKill;
                bus.publish(&kill);
            }

            crate::logger::log_info(&format!(
                "Combatant {:?} killed by {:?} ({} dmg{})",
                intent.target,
                intent.attacker,
                result.total_damage,
                if result.is_critical { ", crit" } else { "" }
            ));
        }
    }
}

/// Система: наложение статусов вне конвейера урона (модули снарядов)
pub fn apply_status_intents(
    mut intents: EventReader<crate::combat::ApplyStatusIntent>,
    mut targets: Query<&mut StatusEffects>,
) {
    for intent in intents.read() {
        let Ok(mut status) = targets.get_mut(intent.target) else {
            continue;
        };
        status.apply(intent.status.clone());
    }
}

/// Система: оформление смерти
///
/// Зануляем скорость, снимаем с учёта в реестре, вешаем маркер Dead.
/// Переключение AI-мозга в Dead-состояние делает слой AI по этому же событию.
pub fn handle_combatant_death(
    mut commands: Commands,
    mut died_events: EventReader<CombatantDied>,
    mut velocities: Query<&mut Velocity>,
    mut registry: ResMut<CombatantRegistry>,
) {
    for event in died_events.read() {
        if let Ok(mut velocity) = velocities.get_mut(event.entity) {
            velocity.0 = Vec2::ZERO;
        }

        registry.unregister(event.entity);

        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.insert(Dead);
        }
    }
}
