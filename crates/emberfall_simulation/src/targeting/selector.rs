//! ResultSelector — сортировка и усечение результатов поиска
//!
//! random_count и limit взаимоисключающие: random_count приоритетнее.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use bevy::prelude::*;

use crate::targeting::TargetCandidate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SortMethod {
    #[default]
    Nearest,
    Farthest,
    MostHp,
    LeastHp,
    /// Случайный порядок (seeded shuffle)
    Random,
}

#[derive(Debug, Clone, Default)]
pub struct ResultSelector {
    pub sort: SortMethod,
    pub limit: Option<usize>,
    /// Случайная подвыборка N целей; выигрывает у limit если заданы оба
    pub random_count: Option<usize>,
}

impl ResultSelector {
    pub fn nearest(limit: usize) -> Self {
        Self {
            sort: SortMethod::Nearest,
            limit: Some(limit),
            random_count: None,
        }
    }

    /// Сортирует (stable) и усекает список. origin нужен Nearest/Farthest.
    pub fn apply(
        &self,
        mut matched: Vec<TargetCandidate>,
        origin: Vec2,
        rng: &mut ChaCha8Rng,
    ) -> Vec<TargetCandidate> {
        match self.sort {
            SortMethod::Nearest => {
                matched.sort_by(|a, b| {
                    dist2(a, origin)
                        .partial_cmp(&dist2(b, origin))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            SortMethod::Farthest => {
                matched.sort_by(|a, b| {
                    dist2(b, origin)
                        .partial_cmp(&dist2(a, origin))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            SortMethod::MostHp => matched.sort_by(|a, b| b.hp.cmp(&a.hp)),
            SortMethod::LeastHp => matched.sort_by(|a, b| a.hp.cmp(&b.hp)),
            SortMethod::Random => shuffle(&mut matched, rng),
        }

        if let Some(n) = self.random_count {
            // Равновероятная подвыборка: первые n после частичного shuffle
            partial_shuffle(&mut matched, n, rng);
            matched.truncate(n);
        } else if let Some(limit) = self.limit {
            matched.truncate(limit);
        }

        matched
    }
}

fn dist2(c: &TargetCandidate, origin: Vec2) -> f32 {
    c.pos.distance_squared(origin)
}

/// Fisher-Yates на seeded RNG
fn shuffle(items: &mut [TargetCandidate], rng: &mut ChaCha8Rng) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Частичный Fisher-Yates: первые n позиций — равновероятная подвыборка
fn partial_shuffle(items: &mut [TargetCandidate], n: usize, rng: &mut ChaCha8Rng) {
    let n = n.min(items.len());
    for i in 0..n {
        let j = rng.gen_range(i..items.len());
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn candidate_at(id: u32, x: f32, hp: u32) -> TargetCandidate {
        TargetCandidate {
            entity: Entity::from_raw(id),
            pos: Vec2::new(x, 0.0),
            half: Vec2::splat(0.5),
            team: 0,
            kind: crate::components::CombatantKind::Npc,
            hp,
            hp_percent: 100.0,
            statuses: Vec::new(),
            resistances: Vec::new(),
        }
    }

    #[test]
    fn test_nearest_limit_one() {
        // Дистанции {10, 50, 5} → limit 1 возвращает цель на 5
        let items = vec![
            candidate_at(1, 10.0, 100),
            candidate_at(2, 50.0, 100),
            candidate_at(3, 5.0, 100),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = ResultSelector::nearest(1).apply(items, Vec2::ZERO, &mut rng);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].entity, Entity::from_raw(3));
    }

    #[test]
    fn test_farthest_and_hp_sorts() {
        let items = vec![
            candidate_at(1, 10.0, 30),
            candidate_at(2, 50.0, 80),
            candidate_at(3, 5.0, 55),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let far = ResultSelector {
            sort: SortMethod::Farthest,
            ..Default::default()
        }
        .apply(items.clone(), Vec2::ZERO, &mut rng);
        assert_eq!(far[0].entity, Entity::from_raw(2));

        let most = ResultSelector {
            sort: SortMethod::MostHp,
            ..Default::default()
        }
        .apply(items.clone(), Vec2::ZERO, &mut rng);
        assert_eq!(most[0].hp, 80);

        let least = ResultSelector {
            sort: SortMethod::LeastHp,
            ..Default::default()
        }
        .apply(items, Vec2::ZERO, &mut rng);
        assert_eq!(least[0].hp, 30);
    }

    #[test]
    fn test_random_count_wins_over_limit() {
        let items: Vec<_> = (0..10).map(|i| candidate_at(i, i as f32, 100)).collect();
        let selector = ResultSelector {
            sort: SortMethod::Nearest,
            limit: Some(8),
            random_count: Some(3),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = selector.apply(items, Vec2::ZERO, &mut rng);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_random_count_larger_than_set() {
        let items: Vec<_> = (0..3).map(|i| candidate_at(i, i as f32, 100)).collect();
        let selector = ResultSelector {
            sort: SortMethod::Nearest,
            limit: None,
            random_count: Some(10),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = selector.apply(items, Vec2::ZERO, &mut rng);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_stable_sort_preserves_registration_order_on_ties() {
        // Одинаковая дистанция → порядок входа сохраняется
        let items = vec![
            candidate_at(5, 7.0, 100),
            candidate_at(6, 7.0, 100),
            candidate_at(7, 7.0, 100),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = ResultSelector {
            sort: SortMethod::Nearest,
            ..Default::default()
        }
        .apply(items, Vec2::ZERO, &mut rng);
        let ids: Vec<u32> = result.iter().map(|c| c.entity.index()).collect();
        assert_eq!(ids, vec![5, 6, 7]);
    }
}
