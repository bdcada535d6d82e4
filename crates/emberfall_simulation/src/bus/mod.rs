//! ActionEventBus — синхронный pub/sub для внешних слоёв
//!
//! Рендер/UI/звук подписываются на события жизненного цикла боя, не зная про
//! ECS. Доставка синхронная, в порядке регистрации подписчиков; список
//! снапшотится перед диспатчем, поэтому publish из обработчика разрешён.
//! Паника обработчика ловится per-handler: один сломанный подписчик не
//! лишает доставки остальных.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::combat::{DamageResult, SkillRef};

/// Разновидность события жизненного цикла
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionEventKind {
    CastStart,
    CastEffect,
    CastComplete,
    CastInterrupt,
    DamageDealt,
    DamageReceived,
    CriticalHit,
    Death,
    PlayerKill,
}

/// Типизированная нагрузка события (вместо свободного key/value мешка)
#[derive(Debug, Clone, Default)]
pub enum ActionEventData {
    #[default]
    None,
    /// Текущий заряд charge-скилла (0..1)
    Charge { percent: f32 },
    /// Итог расчёта урона
    Damage {
        amount: u32,
        is_critical: bool,
        is_miss: bool,
    },
}

impl ActionEventData {
    pub fn from_result(result: &DamageResult) -> Self {
        Self::Damage {
            amount: result.total_damage,
            is_critical: result.is_critical,
            is_miss: result.is_miss,
        }
    }
}

/// Событие, доставляемое подписчикам
#[derive(Debug, Clone)]
pub struct ActionEvent {
    pub kind: ActionEventKind,
    pub skill: Option<SkillRef>,
    pub caster: Entity,
    pub target: Option<Entity>,
    /// Время симуляции (секунды от старта)
    pub timestamp: f64,
    pub position: Option<Vec2>,
    pub direction: Option<Vec2>,
    pub data: ActionEventData,
}

impl ActionEvent {
    pub fn new(kind: ActionEventKind, caster: Entity, timestamp: f64) -> Self {
        Self {
            kind,
            skill: None,
            caster,
            target: None,
            timestamp,
            position: None,
            direction: None,
            data: ActionEventData::None,
        }
    }

    pub fn with_skill(mut self, skill: SkillRef) -> Self {
        self.skill = Some(skill);
        self
    }

    pub fn with_target(mut self, target: Entity) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_data(mut self, data: ActionEventData) -> Self {
        self.data = data;
        self
    }
}

/// Id подписки (для unsubscribe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&ActionEvent) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: HashMap<ActionEventKind, Vec<Subscriber>>,
}

/// Шина событий боя (ресурс мира — никаких глобалов)
#[derive(Resource, Default)]
pub struct ActionEventBus {
    inner: Mutex<BusInner>,
}

impl ActionEventBus {
    pub fn subscribe(
        &self,
        kind: ActionEventKind,
        handler: impl Fn(&ActionEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.subscribers.entry(kind).or_default().push(Subscriber {
            id,
            handler: Arc::new(handler),
        });
        id
    }

    /// false если подписка не найдена (уже снята)
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        for subs in inner.subscribers.values_mut() {
            if let Some(pos) = subs.iter().position(|s| s.id == id) {
                subs.remove(pos);
                return true;
            }
        }
        false
    }

    /// Синхронная доставка в порядке регистрации
    ///
    /// Снапшот списка берётся под локом, диспатч — без лока: обработчик
    /// может публиковать дальше (re-entrancy) и подписываться/отписываться.
    pub fn publish(&self, event: &ActionEvent) {
        let snapshot: Vec<Handler> = {
            let inner = self.inner.lock().unwrap();
            match inner.subscribers.get(&event.kind) {
                Some(subs) => subs.iter().map(|s| s.handler.clone()).collect(),
                None => return,
            }
        };

        for handler in snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(event))) {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "<non-string panic>".to_string());
                crate::logger::log_error(&format!(
                    "ActionEventBus: handler panicked on {:?}: {}",
                    event.kind, message
                ));
            }
        }
    }

    pub fn subscriber_count(&self, kind: ActionEventKind) -> usize {
        self.inner
            .lock()
            .unwrap()
            .subscribers
            .get(&kind)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(kind: ActionEventKind) -> ActionEvent {
        ActionEvent::new(kind, Entity::from_raw(1), 0.0)
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let bus = ActionEventBus::default();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            bus.subscribe(ActionEventKind::CastStart, move |_| {
                order.lock().unwrap().push(i);
            });
        }

        bus.publish(&event(ActionEventKind::CastStart));
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = ActionEventBus::default();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let id = bus.subscribe(ActionEventKind::DamageDealt, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&event(ActionEventKind::DamageDealt));
        assert!(bus.unsubscribe(id));
        bus.publish(&event(ActionEventKind::DamageDealt));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!bus.unsubscribe(id)); // повторная отписка — false
    }

    #[test]
    fn test_panicking_handler_does_not_break_delivery() {
        let bus = ActionEventBus::default();
        let reached = Arc::new(AtomicUsize::new(0));

        bus.subscribe(ActionEventKind::Death, |_| {
            panic!("bad subscriber");
        });
        let r = reached.clone();
        bus.subscribe(ActionEventKind::Death, move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&event(ActionEventKind::Death));
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_publish_allowed() {
        let bus = Arc::new(ActionEventBus::default());
        let chained = Arc::new(AtomicUsize::new(0));

        {
            let bus2 = bus.clone();
            bus.subscribe(ActionEventKind::CastEffect, move |e| {
                // Из обработчика публикуем следующее событие
                bus2.publish(
                    &ActionEvent::new(ActionEventKind::CastComplete, e.caster, e.timestamp),
                );
            });
        }
        {
            let chained = chained.clone();
            bus.subscribe(ActionEventKind::CastComplete, move |_| {
                chained.fetch_add(1, Ordering::SeqCst);
            });
        }

        bus.publish(&event(ActionEventKind::CastEffect));
        assert_eq!(chained.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = ActionEventBus::default();
        bus.publish(&event(ActionEventKind::PlayerKill));
        assert_eq!(bus.subscriber_count(ActionEventKind::PlayerKill), 0);
    }
}
