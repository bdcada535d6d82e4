//! Состояние кастера + самовосстановление инварианта
//!
//! Инвариант: is_casting == true ⇒ current_skill != None. Нарушение —
//! recoverable inconsistency: чиним к is_casting = false с warning'ом,
//! бой не останавливаем.

use bevy::prelude::*;

use crate::combat::SkillRef;

/// Текущее состояние каста комбатанта
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct CasterState {
    pub is_casting: bool,
    pub current_skill: Option<SkillRef>,
}

impl CasterState {
    pub fn begin(&mut self, skill: SkillRef) {
        self.is_casting = true;
        self.current_skill = Some(skill);
    }

    pub fn finish(&mut self) {
        self.is_casting = false;
        self.current_skill = None;
    }

    /// true если инвариант пришлось чинить
    pub fn heal_inconsistency(&mut self) -> bool {
        if self.is_casting && self.current_skill.is_none() {
            self.is_casting = false;
            true
        } else {
            false
        }
    }
}

/// Система: проверка инварианта кастера каждый тик
pub fn heal_caster_state(mut casters: Query<(Entity, &mut CasterState)>) {
    for (entity, mut state) in casters.iter_mut() {
        if state.heal_inconsistency() {
            crate::logger::log_warning(&format!(
                "CasterState: {:?} was casting without a skill, reset to idle",
                entity
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_finish_roundtrip() {
        let mut state = CasterState::default();
        assert!(!state.is_casting);

        state.begin(SkillRef { id: 1, level: 1 });
        assert!(state.is_casting);
        assert!(state.current_skill.is_some());

        state.finish();
        assert!(!state.is_casting);
        assert!(state.current_skill.is_none());
    }

    #[test]
    fn test_inconsistency_auto_corrected() {
        let mut state = CasterState {
            is_casting: true,
            current_skill: None,
        };
        assert!(state.heal_inconsistency());
        assert!(!state.is_casting);

        // Консистентное состояние не трогаем
        let mut ok = CasterState::default();
        ok.begin(SkillRef { id: 2, level: 1 });
        assert!(!ok.heal_inconsistency());
        assert!(ok.is_casting);
    }
}
