//! CombatantRegistry — реестр живых комбатантов
//!
//! Явный сервис вместо глобального синглтона: ресурс принадлежит миру,
//! несколько независимых симуляций (тесты!) не мешают друг другу.
//! Поисковый движок и combat router ходят только через реестр.

use bevy::prelude::*;

/// Реестр живых комбатантов + указатель на игрока
///
/// Порядок `all()` — порядок регистрации (детерминизм запросов).
#[derive(Resource, Debug, Default)]
pub struct CombatantRegistry {
    entries: Vec<Entity>,
    player: Option<Entity>,
}

impl CombatantRegistry {
    /// Повторная регистрация — invariant violation: логируем и пропускаем
    pub fn register(&mut self, entity: Entity) {
        if self.entries.contains(&entity) {
            crate::logger::log_warning(&format!(
                "CombatantRegistry: duplicate registration of {:?}, skipped",
                entity
            ));
            return;
        }
        self.entries.push(entity);
    }

    pub fn unregister(&mut self, entity: Entity) {
        self.entries.retain(|&e| e != entity);
        if self.player == Some(entity) {
            self.player = None;
        }
    }

    /// None если entity не зарегистрирован (lookup failure, не ошибка)
    pub fn get(&self, entity: Entity) -> Option<Entity> {
        self.entries.iter().copied().find(|&e| e == entity)
    }

    pub fn all(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_player(&mut self, entity: Entity) {
        if self.get(entity).is_none() {
            self.register(entity);
        }
        self.player = Some(entity);
    }

    pub fn player(&self) -> Option<Entity> {
        self.player
    }
}
