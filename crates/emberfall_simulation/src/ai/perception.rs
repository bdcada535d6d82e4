//! Восприятие NPC: обнаружение цели, line-of-sight, последний обидчик
//!
//! Пересчитывается раз в тик до мозга. Приоритетная цель — игрок (через
//! реестр), иначе ближайший враждебный комбатант. LOS — отрезок до цели
//! против статичной геометрии.

use bevy::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::ai::AiConfig;
use crate::components::{Combatant, StaticObstacle};
use crate::registry::CombatantRegistry;
use crate::targeting::{ResultSelector, SearchFilter, TargetQuery};

/// Snapshot восприятия одного NPC
#[derive(Component, Debug, Clone, Default)]
pub struct Perception {
    /// Текущая отслеживаемая цель (живая, враждебная)
    pub target: Option<Entity>,
    pub target_pos: Vec2,
    pub target_distance: f32,
    pub has_los: bool,
    /// Цель в радиусе обнаружения И в прямой видимости
    pub detected: bool,
    /// Последняя позиция, где цель была обнаружена
    pub last_known_pos: Option<Vec2>,
    /// Кто ударил последним (реакции на урон)
    pub last_attacker: Option<Entity>,
}

/// Система: обновление восприятия всех NPC
pub fn update_perception(
    mut npcs: Query<(Entity, &Transform, &Combatant, &AiConfig, &mut Perception)>,
    targets: TargetQuery,
    registry: Res<CombatantRegistry>,
    obstacles: Query<&StaticObstacle>,
    mut rng: ResMut<crate::DeterministicRng>,
) {
    let walls: Vec<StaticObstacle> = obstacles.iter().copied().collect();
    let candidates = targets.collect_candidates();

    for (entity, transform, combatant, config, mut perception) in npcs.iter_mut() {
        let pos = transform.translation.truncate();

        // Игрок приоритетнее; иначе ближайший враждебный
        let target = registry
            .player()
            .and_then(|p| candidates.iter().find(|c| c.entity == p))
            .filter(|c| c.team != combatant.team && c.hp > 0)
            .map(|c| (c.entity, c.pos))
            .or_else(|| {
                let filter = SearchFilter::hostiles(combatant.team, entity);
                let selector = ResultSelector::nearest(1);
                let found =
                    crate::targeting::search(candidates.clone(), pos, &filter, &selector, &mut rng.rng);
                found.first().and_then(|&e| {
                    candidates
                        .iter()
                        .find(|c| c.entity == e)
                        .map(|c| (c.entity, c.pos))
                })
            });

        match target {
            Some((target_entity, target_pos)) => {
                let distance = pos.distance(target_pos);
                let has_los = !walls.iter().any(|w| w.segment_hits(pos, target_pos));
                let detected = distance <= config.detection_range && has_los;

                perception.target = Some(target_entity);
                perception.target_pos = target_pos;
                perception.target_distance = distance;
                perception.has_los = has_los;
                perception.detected = detected;
                if detected {
                    perception.last_known_pos = Some(target_pos);
                }
            }
            None => {
                perception.target = None;
                perception.has_los = false;
                perception.detected = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perception_default_sees_nothing() {
        let perception = Perception::default();
        assert!(perception.target.is_none());
        assert!(!perception.detected);
        assert!(perception.last_known_pos.is_none());
    }
}
