//! Weighted skill pool NPC
//!
//! Пул взвешенных скиллов с индивидуальными кулдаунами. Выбор — на интервале
//! активации (не каждый тик), по seeded weighted random. Chainable-скилл
//! зануляет интервал: следующая проверка сразу после завершения каста.

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::combat::SkillRef;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SkillPoolEntry {
    pub skill: SkillRef,
    pub weight: f32,
    pub cooldown: f32,
    #[serde(default)]
    pub cooldown_left: f32,
    /// 0 = без ограничения дальности
    pub max_range: f32,
    pub chainable: bool,
}

impl SkillPoolEntry {
    pub fn new(skill: SkillRef, weight: f32, cooldown: f32, max_range: f32) -> Self {
        Self {
            skill,
            weight,
            cooldown,
            cooldown_left: 0.0,
            max_range,
            chainable: false,
        }
    }

    pub fn chainable(mut self) -> Self {
        self.chainable = true;
        self
    }

    fn usable(&self, distance: f32) -> bool {
        self.cooldown_left <= 0.0
            && self.weight > 0.0
            && (self.max_range <= 0.0 || distance <= self.max_range)
    }
}

/// Пул скиллов комбатанта
#[derive(Component, Debug, Clone)]
pub struct SkillPool {
    pub entries: Vec<SkillPoolEntry>,
    /// Интервал между попытками активации (секунды)
    pub activation_interval: f32,
    pub interval_left: f32,
}

impl Default for SkillPool {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            activation_interval: 1.0,
            interval_left: 0.0,
        }
    }
}

impl SkillPool {
    pub fn new(entries: Vec<SkillPoolEntry>, activation_interval: f32) -> Self {
        Self {
            entries,
            activation_interval,
            interval_left: 0.0,
        }
    }

    /// Тик кулдаунов (идёт всегда, даже вне боя)
    pub fn tick_cooldowns(&mut self, delta: f32) {
        for entry in self.entries.iter_mut() {
            if entry.cooldown_left > 0.0 {
                entry.cooldown_left -= delta;
            }
        }
    }

    /// Попытка выбрать скилл на этом тике
    ///
    /// `can_cast == false` (кастер занят) — интервал не тикает заново,
    /// выбор отложится до освобождения.
    pub fn try_pick(
        &mut self,
        delta: f32,
        can_cast: bool,
        target_distance: f32,
        rng: &mut ChaCha8Rng,
    ) -> Option<SkillRef> {
        if self.interval_left > 0.0 {
            self.interval_left -= delta;
            return None;
        }
        if !can_cast {
            return None;
        }

        let usable: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.usable(target_distance))
            .map(|(i, _)| i)
            .collect();

        if usable.is_empty() {
            // Нечего кастовать — короткий re-check вместо полного интервала
            self.interval_left = (self.activation_interval * 0.25).max(0.1);
            return None;
        }

        // Weighted random по кумулятивной сумме
        let total: f32 = usable.iter().map(|&i| self.entries[i].weight).sum();
        let mut roll = rng.gen_range(0.0..total);
        let mut picked = usable[usable.len() - 1];
        for &i in &usable {
            if roll < self.entries[i].weight {
                picked = i;
                break;
            }
            roll -= self.entries[i].weight;
        }

        let entry = &mut self.entries[picked];
        entry.cooldown_left = entry.cooldown;
        self.interval_left = if entry.chainable {
            0.0
        } else {
            self.activation_interval
        };

        Some(entry.skill)
    }
}
