//! DamageResolver — расчёт урона
//!
//! Чистые функции: (stats атакующего, stats цели, определение атаки, RNG) →
//! DamageResult. Конвейер одной компоненты:
//!   base = attack × multiplier
//!   eff_def = defense × (1 − defense_ignore/100)
//!   reduction = eff_def / (300 + eff_def + penetration)
//!   крит (Bernoulli), разброс от damage_stability,
//!   затем ×(1 − reduction%), ×(1 + bonus%), ×(1 + vulnerability%),
//!   floor → минимум 1.
//! Mixed = физическая + магическая компоненты по 55% множителя, крит = OR.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::combat::{AttackDefinition, DamageType};
use crate::components::CombatantStats;

/// "Особая корректировка защиты" — мёртвая точка расширения формулы.
/// Наблюдаемое поведение всегда ноль; форму слагаемого сохраняем.
const SPECIAL_DEFENSE_ADJUSTMENT: f32 = 0.0;

/// Результат расчёта урона
#[derive(Debug, Clone, Default)]
pub struct DamageResult {
    pub is_miss: bool,
    pub is_critical: bool,
    pub physical_damage: u32,
    pub magical_damage: u32,
    /// Всегда = physical + magical
    pub total_damage: u32,
    /// Диагностический трейс вычисления (логикой не используется)
    pub trace: Vec<String>,
}

/// Какие поля читает компонентный расчёт
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    Physical,
    Magical,
}

/// Расчёт урона атаки attacker → defender
pub fn resolve(
    attacker: &CombatantStats,
    defender: &CombatantStats,
    attack: &AttackDefinition,
    rng: &mut ChaCha8Rng,
) -> DamageResult {
    let mut result = DamageResult::default();

    // 1. Hit check
    let hit_rate = attacker.hit_rate_against(defender);
    let roll: f32 = rng.gen_range(0.0..100.0);
    result
        .trace
        .push(format!("hit_rate={:.2} roll={:.2}", hit_rate, roll));

    if roll > hit_rate {
        result.is_miss = true;
        result.trace.push("miss".to_string());
        return result;
    }

    // 2. Компоненты по типу атаки
    match attack.damage_type {
        DamageType::Physical => {
            let (damage, crit) = resolve_component(
                attacker,
                defender,
                attack.damage_multiplier,
                Component::Physical,
                rng,
                &mut result.trace,
            );
            result.physical_damage = damage;
            result.is_critical = crit;
        }
        DamageType::Magical => {
            let (damage, crit) = resolve_component(
                attacker,
                defender,
                attack.damage_multiplier,
                Component::Magical,
                rng,
                &mut result.trace,
            );
            result.magical_damage = damage;
            result.is_critical = crit;
        }
        DamageType::Mixed => {
            // Обе компоненты по 55% запрошенного множителя
            let sub_multiplier = attack.damage_multiplier * 0.55;
            let (phys, phys_crit) = resolve_component(
                attacker,
                defender,
                sub_multiplier,
                Component::Physical,
                rng,
                &mut result.trace,
            );
            let (mag, mag_crit) = resolve_component(
                attacker,
                defender,
                sub_multiplier,
                Component::Magical,
                rng,
                &mut result.trace,
            );
            result.physical_damage = phys;
            result.magical_damage = mag;
            result.is_critical = phys_crit || mag_crit;
        }
    }

    result.total_damage = result.physical_damage + result.magical_damage;
    result.trace.push(format!(
        "total={} (phys={} mag={} crit={})",
        result.total_damage, result.physical_damage, result.magical_damage, result.is_critical
    ));

    result
}

/// Одна компонента (физическая или магическая), общая формула
fn resolve_component(
    attacker: &CombatantStats,
    defender: &CombatantStats,
    multiplier: f32,
    component: Component,
    rng: &mut ChaCha8Rng,
    trace: &mut Vec<String>,
) -> (u32, bool) {
    let (attack, defense, penetration, damage_bonus) = match component {
        Component::Physical => (
            attacker.physical_attack,
            defender.physical_defense,
            attacker.physical_penetration,
            attacker.physical_damage_bonus,
        ),
        Component::Magical => (
            attacker.magical_attack,
            defender.magical_defense,
            attacker.magical_penetration,
            attacker.magical_damage_bonus,
        ),
    };

    let base = attack * multiplier;

    let effective_defense = defense * (1.0 - attacker.defense_ignore / 100.0);
    let reduction_coeff = effective_defense / (300.0 + effective_defense + penetration);
    let final_multiplier = 1.0 - reduction_coeff - SPECIAL_DEFENSE_ADJUSTMENT;

    let is_critical = rng.gen_bool(attacker.crit_rate.clamp(0.0, 1.0) as f64);
    let fluctuation = fluctuation_coefficient(attacker.damage_stability, rng);

    let mut damage = base * final_multiplier * fluctuation;
    if is_critical {
        damage *= attacker.crit_damage;
    }

    // Порядок фиксирован: абсолютное снижение → бонус урона → уязвимость
    damage *= 1.0 - defender.damage_reduction / 100.0;
    damage *= 1.0 + damage_bonus / 100.0;
    damage *= 1.0 + defender.vulnerability / 100.0;

    let damage = (damage.floor() as i64).max(1) as u32;

    trace.push(format!(
        "{:?}: base={:.1} eff_def={:.1} red={:.3} fluct={:.3} crit={} → {}",
        component, base, effective_defense, reduction_coeff, fluctuation, is_critical, damage
    ));

    (damage, is_critical)
}

/// Коэффициент разброса из damage_stability (clamp ≥ 10)
///
/// high = log10(sqrt(10·sqrt(s))), low = high·sqrt(1 − 1/max(1, log10(s))),
/// итог равномерно из [low, high]. При s = 100 коридор ≈ [0.707, 1.0].
fn fluctuation_coefficient(stability: f32, rng: &mut ChaCha8Rng) -> f32 {
    let s = stability.max(10.0);
    let high = (10.0 * s.sqrt()).sqrt().log10();
    let low_factor = (1.0 - 1.0 / s.log10().max(1.0)).sqrt();
    let low = low_factor * high;
    if high - low < 1e-9 {
        return high;
    }
    rng.gen_range(low..=high)
}

/// Применение результата к цели
///
/// Смерть здесь не обрабатывается — возвращаем факт летальности, решает caller.
pub fn apply(target: &mut CombatantStats, result: &DamageResult) -> bool {
    if !result.is_miss {
        target.take_damage(result.total_damage);
    }
    target.hp == 0
}
