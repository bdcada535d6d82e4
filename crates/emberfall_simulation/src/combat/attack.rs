//! Определение атаки: тип урона, множитель, дополнительные эффекты
//!
//! Данные приходят из каталога скиллов (serde), ядро их не загружает.

use bevy::prelude::*;

use crate::components::{StatusInstance, StatusTag};

/// Тип урона атаки
///
/// Неизвестный тип в данных — ошибка программиста: парсинг падает на serde,
/// а runtime-фоллбэк (см. resolver) трактует как Physical с warning'ом.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, serde::Serialize, serde::Deserialize)]
pub enum DamageType {
    #[default]
    Physical,
    Magical,
    /// Обе компоненты по 55% множителя каждая
    Mixed,
}

/// Дополнительный эффект атаки (накладывается с шансом при попадании)
#[derive(Debug, Clone, Reflect, serde::Serialize, serde::Deserialize)]
pub struct AdditionalEffect {
    pub effect: StatusTag,
    /// Шанс наложения (0..1)
    pub chance: f32,
    pub value: f32,
    pub duration: f32,
}

impl AdditionalEffect {
    pub fn to_instance(&self) -> StatusInstance {
        StatusInstance {
            tag: self.effect,
            value: self.value,
            remaining: self.duration,
        }
    }
}

/// Определение атаки (часть скилла/снаряда)
#[derive(Debug, Clone, Reflect, serde::Serialize, serde::Deserialize)]
pub struct AttackDefinition {
    pub damage_type: DamageType,
    pub damage_multiplier: f32,
    pub effects: Vec<AdditionalEffect>,
    /// Человекочитаемая метка для трейсов/логов
    pub label: Option<String>,
}

impl Default for AttackDefinition {
    fn default() -> Self {
        Self {
            damage_type: DamageType::Physical,
            damage_multiplier: 1.0,
            effects: Vec::new(),
            label: None,
        }
    }
}

impl AttackDefinition {
    pub fn physical(multiplier: f32) -> Self {
        Self {
            damage_multiplier: multiplier,
            ..Self::default()
        }
    }

    pub fn magical(multiplier: f32) -> Self {
        Self {
            damage_type: DamageType::Magical,
            damage_multiplier: multiplier,
            ..Self::default()
        }
    }

    pub fn mixed(multiplier: f32) -> Self {
        Self {
            damage_type: DamageType::Mixed,
            damage_multiplier: multiplier,
            ..Self::default()
        }
    }

    pub fn with_effect(mut self, effect: AdditionalEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Масштабирование множителя (charge-скиллы)
    pub fn scaled(&self, factor: f32) -> Self {
        let mut scaled = self.clone();
        scaled.damage_multiplier *= factor;
        scaled
    }
}
