//! Каталог скиллов — внешний коллаборатор
//!
//! Ядро резолвит (skill id, level) → исполняемое действие через trait;
//! чем каталог наполняется (JSON, статичные таблицы) — не наша забота.
//! Для тестов и headless-демо есть StaticSkillCatalog.

use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;

use crate::combat::AttackDefinition;
use crate::lifecycle::CastBehavior;
use crate::projectile::ProjectileSpec;
use crate::targeting::SearchArea;

/// Shared id скилла (instance нет — скилл не entity)
pub type SkillId = u32;

/// Что происходит в момент CastEffect
#[derive(Debug, Clone)]
pub enum SkillEffect {
    /// Выпустить снаряд (направление — к ближайшему врагу)
    SpawnProjectile(ProjectileSpec),
    /// Мгновенный удар по области вокруг кастера
    AreaStrike {
        area: SearchArea,
        attack: AttackDefinition,
        /// 0 = без ограничения
        max_targets: usize,
    },
    /// Самолечение
    SelfHeal { amount: u32 },
}

/// Исполняемый скилл: поведение каста + цена + эффект
#[derive(Debug, Clone)]
pub struct SkillAction {
    pub cast: CastBehavior,
    pub energy_cost: f32,
    pub effect: SkillEffect,
}

/// Фабрика скиллов (коллаборатор, реализация снаружи)
pub trait SkillCatalog: Send + Sync {
    fn resolve(&self, id: SkillId, level: u32) -> Option<SkillAction>;
}

/// Ресурс-обёртка над каталогом
///
/// Отсутствующий скилл — lookup failure: warning + None, операция
/// прерывается без мутаций.
#[derive(Resource, Clone)]
pub struct Skills {
    catalog: Arc<dyn SkillCatalog>,
}

impl Skills {
    pub fn new(catalog: Arc<dyn SkillCatalog>) -> Self {
        Self { catalog }
    }

    pub fn resolve(&self, id: SkillId, level: u32) -> Option<SkillAction> {
        let action = self.catalog.resolve(id, level);
        if action.is_none() {
            crate::logger::log_warning(&format!(
                "Skills: unknown skill id={} level={}, cast aborted",
                id, level
            ));
        }
        action
    }
}

impl Default for Skills {
    fn default() -> Self {
        Self::new(Arc::new(StaticSkillCatalog::default()))
    }
}

/// Статичный каталог (тесты, headless-демо)
///
/// Уровень без точного совпадения падает к ближайшему меньшему.
#[derive(Default)]
pub struct StaticSkillCatalog {
    entries: HashMap<(SkillId, u32), SkillAction>,
}

impl StaticSkillCatalog {
    pub fn with(mut self, id: SkillId, level: u32, action: SkillAction) -> Self {
        self.entries.insert((id, level), action);
        self
    }

    pub fn insert(&mut self, id: SkillId, level: u32, action: SkillAction) {
        self.entries.insert((id, level), action);
    }
}

impl SkillCatalog for StaticSkillCatalog {
    fn resolve(&self, id: SkillId, level: u32) -> Option<SkillAction> {
        if let Some(action) = self.entries.get(&(id, level)) {
            return Some(action.clone());
        }
        // Фоллбэк на ближайший меньший уровень
        (1..level)
            .rev()
            .find_map(|l| self.entries.get(&(id, l)))
            .cloned()
    }
}
