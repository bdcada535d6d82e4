//! Системы жизненного цикла каста
//!
//! Каждый тик: interrupts → новые касты → releases → продвижение фаз.
//! Энергия списывается в момент CastEffect (там происходит commitment
//! игровой логики). Фазовая машина пишет исходящие эффекты в буферы
//! контекста; в мир (события, спавн снарядов, мутации stats) они уходят
//! после обработки кастера — так нет конфликтов с read-only snapshot'ами
//! поискового движка.

use bevy::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::bus::{ActionEvent, ActionEventBus, ActionEventData, ActionEventKind};
use crate::combat::{DamageIntent, SkillRef};
use crate::components::{Combatant, CombatantStats, TeamId, Velocity};
use crate::lifecycle::{CastBehavior, CastPhase, CasterState};
use crate::projectile::ProjectileSpec;
use crate::skills::{SkillEffect, SkillId, Skills};
use crate::targeting::{ResultSelector, SearchFilter, SortMethod, TargetQuery};
use crate::DeterministicRng;

/// Активный каст (один на кастера)
#[derive(Component, Debug)]
pub struct ActiveCast {
    pub skill: SkillRef,
    pub behavior: CastBehavior,
    pub effect: SkillEffect,
    pub energy_cost: f32,
    pub phase: CastPhase,
    pub phase_elapsed: f32,
    /// Hold/Charge: кнопка ещё удерживается
    pub held: bool,
    /// Hold/Charge: таймер периодических эффектов
    pub interval_elapsed: f32,
    /// Charge: накопленное время заряда
    pub charge_elapsed: f32,
    /// Энергия уже списана (первый эффект)
    pub committed: bool,
}

impl ActiveCast {
    fn new(skill: SkillRef, behavior: CastBehavior, effect: SkillEffect, energy_cost: f32) -> Self {
        Self {
            skill,
            behavior,
            effect,
            energy_cost,
            phase: CastPhase::Windup,
            phase_elapsed: 0.0,
            held: true,
            interval_elapsed: 0.0,
            charge_elapsed: 0.0,
            committed: false,
        }
    }
}

/// Переключённые toggle-скиллы кастера
#[derive(Component, Debug, Default, Clone)]
pub struct ToggledSkills {
    pub on: Vec<SkillId>,
}

impl ToggledSkills {
    /// Возвращает новое состояние флага
    pub fn flip(&mut self, id: SkillId) -> bool {
        if let Some(pos) = self.on.iter().position(|&s| s == id) {
            self.on.remove(pos);
            false
        } else {
            self.on.push(id);
            true
        }
    }
}

// --- События ---

/// Запрос каста (AI skill pool или ввод игрока через мост)
#[derive(Event, Debug, Clone)]
pub struct CastRequest {
    pub caster: Entity,
    pub skill: SkillRef,
}

/// Кнопка отпущена (Hold/Charge)
#[derive(Event, Debug, Clone)]
pub struct CastRelease {
    pub caster: Entity,
}

/// Запрос прерывания каста (удар, стан)
#[derive(Event, Debug, Clone)]
pub struct InterruptCast {
    pub caster: Entity,
}

/// Списание энергии в момент эффекта (применяется apply_resource_changes)
#[derive(Event, Debug, Clone)]
pub struct EnergySpent {
    pub caster: Entity,
    pub cost: f32,
}

/// Самолечение из SkillEffect::SelfHeal
#[derive(Event, Debug, Clone)]
pub struct SelfHealed {
    pub caster: Entity,
    pub amount: u32,
}

// --- Системы ---

/// Система: прерывания активных кастов
pub fn process_interrupts(
    mut commands: Commands,
    mut interrupts: EventReader<InterruptCast>,
    mut casters: Query<(&mut CasterState, &ActiveCast)>,
    bus: Res<ActionEventBus>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs_f64();
    for interrupt in interrupts.read() {
        let Ok((mut state, cast)) = casters.get_mut(interrupt.caster) else {
            continue; // нечего прерывать
        };

        bus.publish(
            &ActionEvent::new(ActionEventKind::CastInterrupt, interrupt.caster, now)
                .with_skill(cast.skill),
        );

        state.finish();
        if let Ok(mut entity_commands) = commands.get_entity(interrupt.caster) {
            entity_commands.remove::<ActiveCast>();
        }
    }
}

/// Система: старт запрошенных кастов
///
/// Занятый кастер отклоняет запрос, если его текущий каст не разрешает
/// параллельные скиллы, а новый не умеет прерывать чужие.
pub fn start_requested_casts(
    mut commands: Commands,
    mut requests: EventReader<CastRequest>,
    skills: Res<Skills>,
    mut casters: Query<(&mut CasterState, &CombatantStats, Option<&ActiveCast>)>,
    bus: Res<ActionEventBus>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs_f64();

    for request in requests.read() {
        let Ok((mut state, stats, active)) = casters.get_mut(request.caster) else {
            crate::logger::log_warning(&format!(
                "CastRequest: caster {:?} not found, skipped",
                request.caster
            ));
            continue;
        };

        if !stats.is_alive() {
            continue;
        }

        let Some(action) = skills.resolve(request.skill.id, request.skill.level) else {
            continue; // уже залогировано каталогом
        };

        if let Some(active) = active {
            let blocked = !active.behavior.can_use_other_while_casting()
                && !action.cast.can_interrupt_others();
            if blocked {
                continue;
            }
            if action.cast.can_interrupt_others() {
                bus.publish(
                    &ActionEvent::new(ActionEventKind::CastInterrupt, request.caster, now)
                        .with_skill(active.skill),
                );
            }
        }

        // Toggle не публикует CastStart: эффект и завершение мгновенны
        if !matches!(action.cast, CastBehavior::Toggle) {
            bus.publish(
                &ActionEvent::new(ActionEventKind::CastStart, request.caster, now)
                    .with_skill(request.skill),
            );
        }

        state.begin(request.skill);
        if let Ok(mut entity_commands) = commands.get_entity(request.caster) {
            entity_commands.insert(ActiveCast::new(
                request.skill,
                action.cast,
                action.effect,
                action.energy_cost,
            ));
        }
    }
}

/// Система: отпускание кнопки для Hold/Charge
pub fn process_releases(
    mut releases: EventReader<CastRelease>,
    mut casts: Query<&mut ActiveCast>,
) {
    for release in releases.read() {
        if let Ok(mut cast) = casts.get_mut(release.caster) {
            cast.held = false;
        }
    }
}

/// Отложенный запуск снаряда (спавнится после прохода фазовой машины)
struct ProjectileLaunch {
    spec: ProjectileSpec,
    direction: Vec2,
    target: Option<Entity>,
    scale: f32,
}

/// Контекст одного тика каста: шина + буферы исходящих эффектов
///
/// Никаких прямых ссылок на Commands/EventWriter — всё копится как данные
/// и уходит в мир одним флашем после match по фазам.
struct CastCtx<'a> {
    rng: &'a mut ChaCha8Rng,
    bus: &'a ActionEventBus,
    stats: &'a CombatantStats,
    caster: Entity,
    team: TeamId,
    pos: Vec2,
    now: f64,

    damage_out: Vec<DamageIntent>,
    energy_out: Vec<EnergySpent>,
    heal_out: Vec<SelfHealed>,
    launch_out: Vec<ProjectileLaunch>,
    remove_cast: bool,
}

/// Система: продвижение фаз активных кастов
pub fn update_active_casts(
    mut commands: Commands,
    mut casts: Query<(
        Entity,
        &mut ActiveCast,
        &mut CasterState,
        Option<&mut ToggledSkills>,
        &CombatantStats,
        &Transform,
        &Combatant,
    )>,
    targets: TargetQuery,
    mut rng: ResMut<DeterministicRng>,
    mut damage_events: EventWriter<DamageIntent>,
    mut energy_events: EventWriter<EnergySpent>,
    mut heal_events: EventWriter<SelfHealed>,
    bus: Res<ActionEventBus>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    let now = time.elapsed_secs_f64();

    for (entity, mut cast, mut state, toggled, stats, transform, combatant) in casts.iter_mut() {
        let speed = stats.attack_speed.max(0.1);
        let mut ctx = CastCtx {
            rng: &mut rng.rng,
            bus: &bus,
            stats,
            caster: entity,
            team: combatant.team,
            pos: transform.translation.truncate(),
            now,
            damage_out: Vec::new(),
            energy_out: Vec::new(),
            heal_out: Vec::new(),
            launch_out: Vec::new(),
            remove_cast: false,
        };

        match cast.behavior {
            CastBehavior::Click {
                cast_time,
                recovery_time,
            } => match cast.phase {
                CastPhase::Windup => {
                    cast.phase_elapsed += delta;
                    if cast.phase_elapsed >= cast_time / speed {
                        if ctx.try_commit(&mut cast, &mut state) {
                            ctx.fire(&targets, &cast, 1.0, ActionEventData::None);
                            cast.phase = CastPhase::Recovery;
                            cast.phase_elapsed = 0.0;
                        }
                    }
                }
                CastPhase::Channel => {
                    // Click не имеет channel-фазы: чиним к recovery
                    crate::logger::log_warning("Click cast reached channel phase, corrected");
                    cast.phase = CastPhase::Recovery;
                    cast.phase_elapsed = 0.0;
                }
                CastPhase::Recovery => {
                    cast.phase_elapsed += delta;
                    if cast.phase_elapsed >= recovery_time / speed {
                        ctx.complete(&cast, &mut state);
                    }
                }
            },

            CastBehavior::Hold {
                cast_time,
                effect_interval,
                recovery_time,
            } => match cast.phase {
                CastPhase::Windup => {
                    cast.phase_elapsed += delta;
                    if cast.phase_elapsed >= cast_time / speed {
                        if ctx.try_commit(&mut cast, &mut state) {
                            ctx.fire(&targets, &cast, 1.0, ActionEventData::None);
                            cast.phase = CastPhase::Channel;
                            cast.phase_elapsed = 0.0;
                            cast.interval_elapsed = 0.0;
                        }
                    }
                }
                CastPhase::Channel => {
                    if cast.held {
                        let interval = effect_interval.max(0.05);
                        cast.interval_elapsed += delta;
                        while cast.interval_elapsed >= interval {
                            cast.interval_elapsed -= interval;
                            ctx.fire(&targets, &cast, 1.0, ActionEventData::None);
                        }
                    } else {
                        cast.phase = CastPhase::Recovery;
                        cast.phase_elapsed = 0.0;
                    }
                }
                CastPhase::Recovery => {
                    cast.phase_elapsed += delta;
                    if cast.phase_elapsed >= recovery_time / speed {
                        ctx.complete(&cast, &mut state);
                    }
                }
            },

            CastBehavior::Toggle => {
                let turned_on = match toggled {
                    Some(mut flags) => flags.flip(cast.skill.id),
                    None => {
                        // Кастер без ToggledSkills — вешаем компонент сразу включённым
                        if let Ok(mut entity_commands) = commands.get_entity(entity) {
                            entity_commands.insert(ToggledSkills {
                                on: vec![cast.skill.id],
                            });
                        }
                        true
                    }
                };

                if turned_on {
                    if ctx.try_commit(&mut cast, &mut state) {
                        ctx.fire(&targets, &cast, 1.0, ActionEventData::None);
                        ctx.complete(&cast, &mut state);
                    }
                } else {
                    // Выключение: только уведомление, без игрового эффекта
                    ctx.bus.publish(
                        &ActionEvent::new(ActionEventKind::CastEffect, entity, now)
                            .with_skill(cast.skill)
                            .with_position(ctx.pos),
                    );
                    ctx.complete(&cast, &mut state);
                }
            }

            CastBehavior::Charge {
                max_charge_time,
                effect_interval,
                recovery_time,
            } => match cast.phase {
                CastPhase::Windup | CastPhase::Channel => {
                    cast.phase = CastPhase::Channel;
                    cast.charge_elapsed += delta;
                    let percent = (cast.charge_elapsed / max_charge_time.max(0.05)).min(1.0);

                    if cast.held {
                        // Периодические уведомления о заряде (без исполнения эффекта)
                        let interval = effect_interval.max(0.05);
                        cast.interval_elapsed += delta;
                        if cast.interval_elapsed >= interval {
                            cast.interval_elapsed -= interval;
                            ctx.bus.publish(
                                &ActionEvent::new(ActionEventKind::CastEffect, entity, now)
                                    .with_skill(cast.skill)
                                    .with_position(ctx.pos)
                                    .with_data(ActionEventData::Charge { percent }),
                            );
                        }
                    } else if ctx.try_commit(&mut cast, &mut state) {
                        // Терминальный эффект с накопленным зарядом
                        ctx.fire(
                            &targets,
                            &cast,
                            percent.max(0.1),
                            ActionEventData::Charge { percent },
                        );
                        cast.phase = CastPhase::Recovery;
                        cast.phase_elapsed = 0.0;
                    }
                }
                CastPhase::Recovery => {
                    cast.phase_elapsed += delta;
                    if cast.phase_elapsed >= recovery_time / speed {
                        ctx.complete(&cast, &mut state);
                    }
                }
            },
        }

        // Флаш буферов контекста в мир
        let CastCtx {
            damage_out,
            energy_out,
            heal_out,
            launch_out,
            remove_cast,
            ..
        } = ctx;

        for intent in damage_out {
            damage_events.write(intent);
        }
        for spent in energy_out {
            energy_events.write(spent);
        }
        for healed in heal_out {
            heal_events.write(healed);
        }
        for launch in launch_out {
            crate::projectile::spawn_from_spec(
                &mut commands,
                &launch.spec,
                entity,
                combatant.team,
                stats.clone(),
                cast.skill,
                transform.translation.truncate(),
                launch.direction,
                launch.target,
                launch.scale,
            );
        }
        if remove_cast {
            if let Ok(mut entity_commands) = commands.get_entity(entity) {
                entity_commands.remove::<ActiveCast>();
            }
        }
    }
}

impl CastCtx<'_> {
    /// Списание энергии при первом эффекте; нехватка → прерывание каста
    fn try_commit(&mut self, cast: &mut ActiveCast, state: &mut CasterState) -> bool {
        if cast.committed {
            return true;
        }
        if !self.stats.can_afford(cast.energy_cost) {
            crate::logger::log(&format!(
                "Cast {:?} by {:?}: not enough energy ({:.1} needed), interrupted",
                cast.skill, self.caster, cast.energy_cost
            ));
            self.bus.publish(
                &ActionEvent::new(ActionEventKind::CastInterrupt, self.caster, self.now)
                    .with_skill(cast.skill),
            );
            state.finish();
            self.remove_cast = true;
            return false;
        }

        self.energy_out.push(EnergySpent {
            caster: self.caster,
            cost: cast.energy_cost,
        });
        cast.committed = true;
        true
    }

    /// Завершение каста: CastComplete + очистка состояния
    fn complete(&mut self, cast: &ActiveCast, state: &mut CasterState) {
        self.bus.publish(
            &ActionEvent::new(ActionEventKind::CastComplete, self.caster, self.now)
                .with_skill(cast.skill),
        );
        state.finish();
        self.remove_cast = true;
    }

    /// Публикует CastEffect и исполняет игровой эффект (scale — заряд)
    fn fire(
        &mut self,
        targets: &TargetQuery,
        cast: &ActiveCast,
        scale: f32,
        data: ActionEventData,
    ) {
        self.bus.publish(
            &ActionEvent::new(ActionEventKind::CastEffect, self.caster, self.now)
                .with_skill(cast.skill)
                .with_position(self.pos)
                .with_data(data),
        );

        match &cast.effect {
            SkillEffect::AreaStrike {
                area,
                attack,
                max_targets,
            } => {
                let filter =
                    SearchFilter::hostiles(self.team, self.caster).with_area(area.clone());
                let selector = ResultSelector {
                    sort: SortMethod::Nearest,
                    limit: (*max_targets > 0).then_some(*max_targets),
                    random_count: None,
                };
                let hits = targets.run(self.pos, &filter, &selector, self.rng);

                for target in hits {
                    self.damage_out.push(DamageIntent {
                        attacker: self.caster,
                        attacker_stats: self.stats.clone(),
                        target,
                        attack: attack.scaled(scale),
                        skill: Some(cast.skill),
                    });
                }
            }

            SkillEffect::SpawnProjectile(spec) => {
                // Направление — к ближайшему врагу; без врагов стреляем вправо
                let filter = SearchFilter::hostiles(self.team, self.caster);
                let selector = ResultSelector::nearest(1);
                let nearest = targets.run(self.pos, &filter, &selector, self.rng);

                let (direction, target) = match nearest.first() {
                    Some(&target) => {
                        let dir = targets
                            .collect_candidates()
                            .iter()
                            .find(|c| c.entity == target)
                            .map(|c| (c.pos - self.pos).normalize_or_zero())
                            .filter(|d| d.length_squared() > 0.0)
                            .unwrap_or(Vec2::X);
                        (dir, Some(target))
                    }
                    None => (Vec2::X, None),
                };

                self.launch_out.push(ProjectileLaunch {
                    spec: spec.clone(),
                    direction,
                    target,
                    scale,
                });
            }

            SkillEffect::SelfHeal { amount } => {
                let healed = (*amount as f32 * scale).round() as u32;
                self.heal_out.push(SelfHealed {
                    caster: self.caster,
                    amount: healed.max(1),
                });
            }
        }
    }
}

/// Система: применение отложенных мутаций stats (энергия, лечение)
pub fn apply_resource_changes(
    mut energy_events: EventReader<EnergySpent>,
    mut heal_events: EventReader<SelfHealed>,
    mut stats: Query<&mut CombatantStats>,
) {
    for event in energy_events.read() {
        if let Ok(mut s) = stats.get_mut(event.caster) {
            if !s.use_energy(event.cost) {
                // Affordability проверялась в этом же тике — сюда попадать не должны
                crate::logger::log_warning(&format!(
                    "EnergySpent: {:?} could not afford {:.1} at apply time",
                    event.caster, event.cost
                ));
            }
        }
    }

    for event in heal_events.read() {
        if let Ok(mut s) = stats.get_mut(event.caster) {
            s.heal(event.amount);
        }
    }
}

/// Система: запрет движения во время каста
///
/// Выполняется после AI-движения: желание двигаться затирается нулём,
/// если текущее поведение каста не разрешает перемещение.
pub fn lock_casting_movement(mut casters: Query<(&ActiveCast, &mut Velocity)>) {
    for (cast, mut velocity) in casters.iter_mut() {
        if !cast.behavior.can_move_while_casting() && velocity.0 != Vec2::ZERO {
            velocity.0 = Vec2::ZERO;
        }
    }
}
