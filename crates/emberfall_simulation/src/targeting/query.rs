//! EntityQuery: сбор кандидатов из ECS + чистый поисковый конвейер
//!
//! Snapshot-подход: кандидаты собираются один раз в порядке регистрации,
//! дальше работает чистая функция search() — её легко тестировать без мира.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::components::{BodyExtents, Combatant, CombatTarget, CombatantStats, StatusEffects};
use crate::projectile::Projectile;
use crate::registry::CombatantRegistry;
use crate::targeting::{ResultSelector, SearchFilter, TargetCandidate};

/// SystemParam-бандл поискового движка
///
/// Capability-компоненты запрашиваются типизированно: entity без
/// CombatTarget/stats в выдачу не попадает, никаких runtime-проверок формы.
#[derive(SystemParam)]
pub struct TargetQuery<'w, 's> {
    registry: Res<'w, CombatantRegistry>,
    combatants: Query<
        'w,
        's,
        (
            Entity,
            &'static Transform,
            &'static BodyExtents,
            &'static Combatant,
            &'static CombatantStats,
            &'static StatusEffects,
        ),
        (With<CombatTarget>, Without<Projectile>),
    >,
}

impl TargetQuery<'_, '_> {
    /// Snapshot всех живых зарегистрированных комбатантов
    pub fn collect_candidates(&self) -> Vec<TargetCandidate> {
        let mut candidates = Vec::with_capacity(self.registry.len());
        for entity in self.registry.all() {
            let Ok((entity, transform, extents, combatant, stats, status)) =
                self.combatants.get(entity)
            else {
                // Зарегистрирован, но без боевых capability — не кандидат
                continue;
            };

            candidates.push(TargetCandidate {
                entity,
                pos: transform.translation.truncate(),
                half: extents.half,
                team: combatant.team,
                kind: combatant.kind,
                hp: stats.hp,
                hp_percent: stats.hp_percent(),
                statuses: status.active.iter().map(|s| s.tag).collect(),
                resistances: status.resistances.clone(),
            });
        }
        candidates
    }

    /// query(shape, filter, selector) из контракта движка
    ///
    /// Форма берётся из filter.area (None = весь реестр).
    pub fn run(
        &self,
        origin: Vec2,
        filter: &SearchFilter,
        selector: &ResultSelector,
        rng: &mut ChaCha8Rng,
    ) -> Vec<Entity> {
        search(self.collect_candidates(), origin, filter, selector, rng)
    }
}

/// Чистый конвейер поиска: геометрия → фильтры → selector
pub fn search(
    candidates: Vec<TargetCandidate>,
    origin: Vec2,
    filter: &SearchFilter,
    selector: &ResultSelector,
    rng: &mut ChaCha8Rng,
) -> Vec<Entity> {
    let matched: Vec<TargetCandidate> = candidates
        .into_iter()
        .filter(|c| match &filter.area {
            Some(area) => area.contains(origin, c.pos, c.half),
            None => true,
        })
        .filter(|c| filter.matches(c))
        .collect();

    selector
        .apply(matched, origin, rng)
        .into_iter()
        .map(|c| c.entity)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::CombatantKind;
    use crate::targeting::{SearchArea, SortMethod, TeamConstraint};
    use rand::SeedableRng;

    fn candidate(id: u32, pos: Vec2, team: u64) -> TargetCandidate {
        TargetCandidate {
            entity: Entity::from_raw(id),
            pos,
            half: Vec2::splat(0.5),
            team,
            kind: CombatantKind::Npc,
            hp: 100,
            hp_percent: 100.0,
            statuses: Vec::new(),
            resistances: Vec::new(),
        }
    }

    #[test]
    fn test_search_geometry_then_filter_then_selector() {
        let candidates = vec![
            candidate(1, Vec2::new(3.0, 0.0), 2),
            candidate(2, Vec2::new(8.0, 0.0), 2),
            candidate(3, Vec2::new(4.0, 0.0), 1), // союзник, отфильтруется
            candidate(4, Vec2::new(40.0, 0.0), 2), // вне круга
        ];

        let filter = SearchFilter {
            team: TeamConstraint::HostilesOf(1),
            area: Some(SearchArea::Circle { radius: 10.0 }),
            ..Default::default()
        };
        let selector = ResultSelector {
            sort: SortMethod::Nearest,
            ..Default::default()
        };

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let result = search(candidates, Vec2::ZERO, &filter, &selector, &mut rng);

        assert_eq!(
            result,
            vec![Entity::from_raw(1), Entity::from_raw(2)],
            "ближайший первым, союзники и дальние исключены"
        );
    }

    #[test]
    fn test_search_without_area_scans_everything() {
        let candidates = vec![
            candidate(1, Vec2::new(1000.0, 0.0), 2),
            candidate(2, Vec2::new(-1000.0, 0.0), 2),
        ];
        let filter = SearchFilter::default();
        let selector = ResultSelector::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let result = search(candidates, Vec2::ZERO, &filter, &selector, &mut rng);
        assert_eq!(result.len(), 2);
    }
}
