//! CombatantStats — числовые атрибуты комбатанта
//!
//! Инварианты:
//! - 0 ≤ hp ≤ max_hp, 0.0 ≤ energy ≤ max_energy
//! - мутации ТОЛЬКО через take_damage / heal / use_energy / regenerate_energy
//!
//! Snapshot-семантика: когда урон ставится в очередь, stats атакующего
//! копируются целиком (Clone) — если атакующий умрёт до обработки события,
//! расчёт всё равно идёт по значениям на момент атаки.

use bevy::prelude::*;

/// Полный набор атрибутов. Проценты хранятся как 0..100, crit_rate как 0..1.
#[derive(Component, Debug, Clone, Reflect, serde::Serialize, serde::Deserialize)]
#[reflect(Component)]
pub struct CombatantStats {
    pub level: u32,

    pub hp: u32,
    pub max_hp: u32,

    pub energy: f32,
    pub max_energy: f32,
    /// Реген энергии (units/sec)
    pub energy_regen: f32,

    pub physical_attack: f32,
    pub magical_attack: f32,
    pub physical_defense: f32,
    pub magical_defense: f32,

    pub accuracy: f32,
    pub evasion: f32,

    /// Плоское пробивание, входит в знаменатель кривой снижения урона
    pub physical_penetration: f32,
    pub magical_penetration: f32,
    /// Процент игнорируемой защиты цели (0..100)
    pub defense_ignore: f32,

    /// Вероятность крита (0..1)
    pub crit_rate: f32,
    /// Множитель критического урона (1.5 = +50%)
    pub crit_damage: f32,

    /// Стабильность урона: выше → уже коридор разброса (clamp ≥ 10)
    pub damage_stability: f32,

    /// Абсолютное снижение входящего урона, % (0..100)
    pub damage_reduction: f32,
    /// Бонус исходящего урона по типам, % (0..100+)
    pub physical_damage_bonus: f32,
    pub magical_damage_bonus: f32,
    /// Уязвимость цели: увеличивает входящий урон, %
    pub vulnerability: f32,

    /// Скорость перемещения (м/с)
    pub move_speed: f32,
    /// Скорость атаки: делит cast/recovery фазы (1.0 = базовая)
    pub attack_speed: f32,
}

impl Default for CombatantStats {
    fn default() -> Self {
        Self {
            level: 1,
            hp: 100,
            max_hp: 100,
            energy: 100.0,
            max_energy: 100.0,
            energy_regen: 5.0,
            physical_attack: 10.0,
            magical_attack: 10.0,
            physical_defense: 5.0,
            magical_defense: 5.0,
            accuracy: 100.0,
            evasion: 10.0,
            physical_penetration: 0.0,
            magical_penetration: 0.0,
            defense_ignore: 0.0,
            crit_rate: 0.05,
            crit_damage: 1.5,
            damage_stability: 100.0,
            damage_reduction: 0.0,
            physical_damage_bonus: 0.0,
            magical_damage_bonus: 0.0,
            vulnerability: 0.0,
            move_speed: 3.0,
            attack_speed: 1.0,
        }
    }
}

impl CombatantStats {
    /// Болванка уровня N с масштабированными атакой/защитой/HP
    pub fn for_level(level: u32) -> Self {
        let l = level.max(1) as f32;
        Self {
            level: level.max(1),
            hp: (100.0 + 20.0 * (l - 1.0)) as u32,
            max_hp: (100.0 + 20.0 * (l - 1.0)) as u32,
            physical_attack: 10.0 + 3.0 * (l - 1.0),
            magical_attack: 10.0 + 3.0 * (l - 1.0),
            physical_defense: 5.0 + 2.0 * (l - 1.0),
            magical_defense: 5.0 + 2.0 * (l - 1.0),
            accuracy: 100.0 + 5.0 * (l - 1.0),
            evasion: 10.0 + 2.0 * (l - 1.0),
            ..Self::default()
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn hp_percent(&self) -> f32 {
        if self.max_hp == 0 {
            return 0.0;
        }
        self.hp as f32 / self.max_hp as f32 * 100.0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.hp = self.hp.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.energy >= cost
    }

    /// false если энергии не хватило (ничего не списано)
    pub fn use_energy(&mut self, cost: f32) -> bool {
        if self.can_afford(cost) {
            self.energy -= cost;
            true
        } else {
            false
        }
    }

    pub fn regenerate_energy(&mut self, delta_time: f32) {
        self.energy = (self.energy + self.energy_regen * delta_time).min(self.max_energy);
    }

    /// Шанс попадания в процентах: sqrt(acc / (acc + eva)) * 100
    ///
    /// evasion == 0 → гарантированные 100 (даже при accuracy == 0),
    /// accuracy == 0 при ненулевом evasion → 0.
    pub fn hit_rate_against(&self, defender: &CombatantStats) -> f32 {
        if defender.evasion <= 0.0 {
            return 100.0;
        }
        if self.accuracy <= 0.0 {
            return 0.0;
        }
        (self.accuracy / (self.accuracy + defender.evasion)).sqrt() * 100.0
    }
}

/// Система: реген энергии каждый тик
pub fn regenerate_energy(mut stats: Query<&mut CombatantStats>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    for mut s in stats.iter_mut() {
        if s.is_alive() && s.energy < s.max_energy {
            s.regenerate_energy(delta);
        }
    }
}
