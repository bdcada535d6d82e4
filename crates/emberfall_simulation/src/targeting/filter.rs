//! SearchFilter — чистый предикат над snapshot'ом комбатанта
//!
//! Порядок применения фиксирован (short-circuit на первом провале):
//! kind → exclude → require → team → health bounds → status → resistance → custom

use bevy::prelude::*;

use crate::components::{CombatantKind, StatusTag, TeamId};
use crate::targeting::SearchArea;

/// Snapshot комбатанта на момент запроса (фильтры не трогают ECS)
#[derive(Debug, Clone)]
pub struct TargetCandidate {
    pub entity: Entity,
    pub pos: Vec2,
    pub half: Vec2,
    pub team: TeamId,
    pub kind: CombatantKind,
    pub hp: u32,
    pub hp_percent: f32,
    pub statuses: Vec<StatusTag>,
    pub resistances: Vec<StatusTag>,
}

impl TargetCandidate {
    pub fn has_status(&self, tag: StatusTag) -> bool {
        self.statuses.contains(&tag)
    }
}

/// Ограничение по команде относительно reference-команды
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TeamConstraint {
    #[default]
    Any,
    /// Только союзники команды (включая её саму)
    AlliesOf(TeamId),
    /// Только враги команды
    HostilesOf(TeamId),
}

/// Фильтр поиска целей
///
/// `area` — опциональная геометрия; None = без пространственного ограничения
/// (фильтруется весь реестр).
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// None = любые разновидности
    pub kinds: Option<Vec<CombatantKind>>,
    pub exclude: Vec<Entity>,
    /// Some = кандидат обязан быть в списке
    pub require: Option<Vec<Entity>>,
    pub team: TeamConstraint,
    pub min_health_percent: Option<f32>,
    pub max_health_percent: Option<f32>,
    pub required_status: Vec<StatusTag>,
    pub forbidden_status: Vec<StatusTag>,
    /// Кандидат обязан резистить этот тег
    pub resistance: Option<StatusTag>,
    /// Непрозрачный предикат, применяется последним
    pub custom: Option<fn(&TargetCandidate) -> bool>,
    pub area: Option<SearchArea>,
}

impl SearchFilter {
    /// Враги команды team, исключая самого ищущего
    pub fn hostiles(of_team: TeamId, searcher: Entity) -> Self {
        Self {
            team: TeamConstraint::HostilesOf(of_team),
            exclude: vec![searcher],
            ..Self::default()
        }
    }

    pub fn with_area(mut self, area: SearchArea) -> Self {
        self.area = Some(area);
        self
    }

    /// Чистый предикат: без side effects, порядок проверок фиксирован
    pub fn matches(&self, candidate: &TargetCandidate) -> bool {
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&candidate.kind) {
                return false;
            }
        }

        if self.exclude.contains(&candidate.entity) {
            return false;
        }

        if let Some(require) = &self.require {
            if !require.contains(&candidate.entity) {
                return false;
            }
        }

        match self.team {
            TeamConstraint::Any => {}
            TeamConstraint::AlliesOf(team) => {
                if candidate.team != team {
                    return false;
                }
            }
            TeamConstraint::HostilesOf(team) => {
                if candidate.team == team {
                    return false;
                }
            }
        }

        if let Some(min) = self.min_health_percent {
            if candidate.hp_percent < min {
                return false;
            }
        }
        if let Some(max) = self.max_health_percent {
            if candidate.hp_percent > max {
                return false;
            }
        }

        for &tag in &self.required_status {
            if !candidate.has_status(tag) {
                return false;
            }
        }
        for &tag in &self.forbidden_status {
            if candidate.has_status(tag) {
                return false;
            }
        }

        if let Some(tag) = self.resistance {
            if !candidate.resistances.contains(&tag) {
                return false;
            }
        }

        if let Some(custom) = self.custom {
            if !custom(candidate) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(entity: u32, team: TeamId, hp_percent: f32) -> TargetCandidate {
        TargetCandidate {
            entity: Entity::from_raw(entity),
            pos: Vec2::ZERO,
            half: Vec2::splat(0.5),
            team,
            kind: CombatantKind::Npc,
            hp: 100,
            hp_percent,
            statuses: Vec::new(),
            resistances: Vec::new(),
        }
    }

    #[test]
    fn test_team_constraints() {
        let ally_filter = SearchFilter {
            team: TeamConstraint::AlliesOf(1),
            ..Default::default()
        };
        let enemy_filter = SearchFilter {
            team: TeamConstraint::HostilesOf(1),
            ..Default::default()
        };

        let friend = candidate(1, 1, 100.0);
        let foe = candidate(2, 2, 100.0);

        assert!(ally_filter.matches(&friend));
        assert!(!ally_filter.matches(&foe));
        assert!(enemy_filter.matches(&foe));
        assert!(!enemy_filter.matches(&friend));
    }

    #[test]
    fn test_exclude_and_require() {
        let mut filter = SearchFilter::default();
        filter.exclude.push(Entity::from_raw(1));
        assert!(!filter.matches(&candidate(1, 0, 100.0)));
        assert!(filter.matches(&candidate(2, 0, 100.0)));

        let require_filter = SearchFilter {
            require: Some(vec![Entity::from_raw(3)]),
            ..Default::default()
        };
        assert!(require_filter.matches(&candidate(3, 0, 100.0)));
        assert!(!require_filter.matches(&candidate(4, 0, 100.0)));
    }

    #[test]
    fn test_health_bounds_closed() {
        let filter = SearchFilter {
            min_health_percent: Some(25.0),
            max_health_percent: Some(75.0),
            ..Default::default()
        };
        assert!(!filter.matches(&candidate(1, 0, 20.0)));
        assert!(filter.matches(&candidate(2, 0, 25.0))); // граница включена
        assert!(filter.matches(&candidate(3, 0, 75.0)));
        assert!(!filter.matches(&candidate(4, 0, 80.0)));
    }

    #[test]
    fn test_status_predicates() {
        let mut wounded = candidate(1, 0, 50.0);
        wounded.statuses.push(StatusTag::Burn);

        let need_burn = SearchFilter {
            required_status: vec![StatusTag::Burn],
            ..Default::default()
        };
        let no_burn = SearchFilter {
            forbidden_status: vec![StatusTag::Burn],
            ..Default::default()
        };

        assert!(need_burn.matches(&wounded));
        assert!(!no_burn.matches(&wounded));
        assert!(!need_burn.matches(&candidate(2, 0, 50.0)));
    }

    #[test]
    fn test_custom_predicate_runs_last() {
        let filter = SearchFilter {
            custom: Some(|c| c.hp > 50),
            ..Default::default()
        };
        let mut weak = candidate(1, 0, 100.0);
        weak.hp = 10;
        assert!(!filter.matches(&weak));
        assert!(filter.matches(&candidate(2, 0, 100.0)));
    }

    #[test]
    fn test_kind_filter() {
        let filter = SearchFilter {
            kinds: Some(vec![CombatantKind::Player]),
            ..Default::default()
        };
        let mut player = candidate(1, 0, 100.0);
        player.kind = CombatantKind::Player;
        assert!(filter.matches(&player));
        assert!(!filter.matches(&candidate(2, 0, 100.0)));
    }
}
