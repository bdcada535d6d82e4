//! Конечный автомат мозга NPC
//!
//! Карта state-tag → state object + единственное текущее состояние.
//! Инварианты:
//! - активно ровно одно состояние;
//! - enter()/exit() вызываются ровно один раз на переход;
//! - переход в текущий же tag — no-op (enter повторно НЕ зовётся);
//! - повторная регистрация tag'а — invariant violation: warning + skip.

use std::collections::HashMap;

use bevy::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::ai::{AiConfig, Perception, SkillPool};
use crate::combat::SkillRef;
use crate::components::{CombatantStats, StaticObstacle};

/// Теги состояний мозга
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, serde::Serialize, serde::Deserialize)]
pub enum BrainStateTag {
    Idle,
    Wandering,
    Alert,
    Chase,
    Attacking,
    Charging,
    Summoning,
    Hurt,
    Dead,
}

/// Контекст одного тика мозга
///
/// Входы — восприятие и конфиг; выходы — желаемая скорость и запросы
/// действий, которые драйвер переводит в события.
pub struct BrainCtx<'a> {
    pub entity: Entity,
    pub pos: Vec2,
    pub dt: f32,
    pub stats: &'a CombatantStats,
    pub perception: &'a Perception,
    pub config: &'a AiConfig,
    pub pool: &'a mut SkillPool,
    pub obstacles: &'a [StaticObstacle],
    pub rng: &'a mut ChaCha8Rng,
    pub is_casting: bool,

    // Выходы
    pub velocity: Vec2,
    pub cast_requests: Vec<SkillRef>,
    pub interrupt_cast: bool,
    pub summon_requested: bool,
}

impl BrainCtx<'_> {
    pub fn request_cast(&mut self, skill: SkillRef) {
        self.cast_requests.push(skill);
    }
}

/// Объект-состояние мозга
pub trait BrainState: Send + Sync {
    fn enter(&mut self, _ctx: &mut BrainCtx) {}
    /// Возвращает tag следующего состояния (None = остаёмся)
    fn update(&mut self, ctx: &mut BrainCtx) -> Option<BrainStateTag>;
    fn exit(&mut self, _ctx: &mut BrainCtx) {}
}

/// Мозг: карта состояний + текущее
#[derive(Component)]
pub struct Brain {
    states: HashMap<BrainStateTag, Box<dyn BrainState>>,
    current: BrainStateTag,
    /// Форс-переход от реакций (урон, смерть); применяется до update
    pub pending: Option<BrainStateTag>,
    entered: bool,
}

impl Brain {
    pub fn new(initial: BrainStateTag) -> Self {
        Self {
            states: HashMap::new(),
            current: initial,
            pending: None,
            entered: false,
        }
    }

    /// Регистрация состояния; дубликат — warning + skip
    pub fn with_state(mut self, tag: BrainStateTag, state: impl BrainState + 'static) -> Self {
        self.register(tag, state);
        self
    }

    pub fn register(&mut self, tag: BrainStateTag, state: impl BrainState + 'static) {
        if self.states.contains_key(&tag) {
            crate::logger::log_warning(&format!(
                "Brain: duplicate state registration for {:?}, skipped",
                tag
            ));
            return;
        }
        self.states.insert(tag, Box::new(state));
    }

    pub fn current(&self) -> BrainStateTag {
        self.current
    }

    /// Переход: exit текущего → enter нового, self-transition — no-op
    pub fn transition(&mut self, tag: BrainStateTag, ctx: &mut BrainCtx) {
        if tag == self.current {
            return;
        }
        if !self.states.contains_key(&tag) {
            crate::logger::log_warning(&format!(
                "Brain {:?}: transition to unregistered state {:?}, skipped",
                ctx.entity, tag
            ));
            return;
        }

        if let Some(state) = self.states.get_mut(&self.current) {
            state.exit(ctx);
        }
        self.current = tag;
        self.entered = false;
    }

    /// Один тик мозга: pending → enter (если нужен) → update → переход
    pub fn tick(&mut self, ctx: &mut BrainCtx) {
        if let Some(tag) = self.pending.take() {
            self.transition(tag, ctx);
        }

        // enter отложен до первого тика в состоянии: ровно один раз
        if !self.entered {
            if let Some(state) = self.states.get_mut(&self.current) {
                state.enter(ctx);
            }
            self.entered = true;
        }

        let next = match self.states.get_mut(&self.current) {
            Some(state) => state.update(ctx),
            None => {
                crate::logger::log_warning(&format!(
                    "Brain {:?}: current state {:?} not registered, brain stalled",
                    ctx.entity, self.current
                ));
                None
            }
        };

        if let Some(tag) = next {
            self.transition(tag, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct Counting {
        enters: Arc<AtomicU32>,
        exits: Arc<AtomicU32>,
        next: Option<BrainStateTag>,
    }

    impl BrainState for Counting {
        fn enter(&mut self, _ctx: &mut BrainCtx) {
            self.enters.fetch_add(1, Ordering::SeqCst);
        }
        fn update(&mut self, _ctx: &mut BrainCtx) -> Option<BrainStateTag> {
            self.next
        }
        fn exit(&mut self, _ctx: &mut BrainCtx) {
            self.exits.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ctx_parts() -> (
        CombatantStats,
        Perception,
        AiConfig,
        SkillPool,
        ChaCha8Rng,
    ) {
        (
            CombatantStats::default(),
            Perception::default(),
            AiConfig::default(),
            SkillPool::default(),
            ChaCha8Rng::seed_from_u64(1),
        )
    }

    macro_rules! make_ctx {
        ($stats:expr, $perc:expr, $cfg:expr, $pool:expr, $rng:expr) => {
            BrainCtx {
                entity: Entity::from_raw(1),
                pos: Vec2::ZERO,
                dt: 1.0 / 60.0,
                stats: &$stats,
                perception: &$perc,
                config: &$cfg,
                pool: &mut $pool,
                obstacles: &[],
                rng: &mut $rng,
                is_casting: false,
                velocity: Vec2::ZERO,
                cast_requests: Vec::new(),
                interrupt_cast: false,
                summon_requested: false,
            }
        };
    }

    #[test]
    fn test_enter_exactly_once_per_transition() {
        let enters = Arc::new(AtomicU32::new(0));
        let exits = Arc::new(AtomicU32::new(0));
        let chase_enters = Arc::new(AtomicU32::new(0));

        let mut brain = Brain::new(BrainStateTag::Wandering)
            .with_state(
                BrainStateTag::Wandering,
                Counting {
                    enters: enters.clone(),
                    exits: exits.clone(),
                    next: None,
                },
            )
            .with_state(
                BrainStateTag::Chase,
                Counting {
                    enters: chase_enters.clone(),
                    exits: Arc::new(AtomicU32::new(0)),
                    next: None,
                },
            );

        let (stats, perc, cfg, mut pool, mut rng) = ctx_parts();
        let mut ctx = make_ctx!(stats, perc, cfg, pool, rng);

        // Несколько тиков в Wandering: enter один раз
        for _ in 0..5 {
            brain.tick(&mut ctx);
        }
        assert_eq!(enters.load(Ordering::SeqCst), 1);
        assert_eq!(exits.load(Ordering::SeqCst), 0);

        // Переход в Chase
        brain.transition(BrainStateTag::Chase, &mut ctx);
        brain.tick(&mut ctx);
        assert_eq!(exits.load(Ordering::SeqCst), 1);
        assert_eq!(chase_enters.load(Ordering::SeqCst), 1);
        assert_eq!(brain.current(), BrainStateTag::Chase);
    }

    #[test]
    fn test_self_transition_is_noop() {
        let enters = Arc::new(AtomicU32::new(0));
        let exits = Arc::new(AtomicU32::new(0));

        let mut brain = Brain::new(BrainStateTag::Idle).with_state(
            BrainStateTag::Idle,
            Counting {
                enters: enters.clone(),
                exits: exits.clone(),
                next: Some(BrainStateTag::Idle), // каждый update просит Idle
            },
        );

        let (stats, perc, cfg, mut pool, mut rng) = ctx_parts();
        let mut ctx = make_ctx!(stats, perc, cfg, pool, rng);

        for _ in 0..10 {
            brain.tick(&mut ctx);
        }
        assert_eq!(enters.load(Ordering::SeqCst), 1, "self-transition не перевходит");
        assert_eq!(exits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_duplicate_registration_skipped() {
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));

        let mut brain = Brain::new(BrainStateTag::Idle)
            .with_state(
                BrainStateTag::Idle,
                Counting {
                    enters: first.clone(),
                    exits: Arc::new(AtomicU32::new(0)),
                    next: None,
                },
            )
            .with_state(
                BrainStateTag::Idle,
                Counting {
                    enters: second.clone(),
                    exits: Arc::new(AtomicU32::new(0)),
                    next: None,
                },
            );

        let (stats, perc, cfg, mut pool, mut rng) = ctx_parts();
        let mut ctx = make_ctx!(stats, perc, cfg, pool, rng);
        brain.tick(&mut ctx);

        assert_eq!(first.load(Ordering::SeqCst), 1, "первая регистрация живёт");
        assert_eq!(second.load(Ordering::SeqCst), 0, "дубликат проигнорирован");
    }

    #[test]
    fn test_transition_to_unregistered_state_skipped() {
        let mut brain = Brain::new(BrainStateTag::Idle).with_state(
            BrainStateTag::Idle,
            Counting {
                enters: Arc::new(AtomicU32::new(0)),
                exits: Arc::new(AtomicU32::new(0)),
                next: None,
            },
        );

        let (stats, perc, cfg, mut pool, mut rng) = ctx_parts();
        let mut ctx = make_ctx!(stats, perc, cfg, pool, rng);

        brain.transition(BrainStateTag::Summoning, &mut ctx);
        assert_eq!(brain.current(), BrainStateTag::Idle, "остаёмся в текущем");
    }
}
