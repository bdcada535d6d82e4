//! Жизненный цикл действия: cast → effect → recovery
//!
//! Четыре поведения (Click/Hold/Toggle/Charge), все — явные state machines,
//! продвигаемые тиком симуляции. Никаких отложенных колбэков: прерывание
//! каста просто снимает компонент, "висящих" таймеров не остаётся.

use bevy::prelude::*;

pub mod behavior;
pub mod caster;
pub mod systems;

pub use behavior::{CastBehavior, CastPhase};
pub use caster::{heal_caster_state, CasterState};
pub use systems::{
    apply_resource_changes, lock_casting_movement, process_interrupts, process_releases,
    start_requested_casts, update_active_casts, ActiveCast, CastRelease, CastRequest,
    EnergySpent, InterruptCast, SelfHealed, ToggledSkills,
};

use crate::SimSet;

/// Lifecycle Plugin
///
/// Порядок (FixedUpdate, chain):
/// 1. heal_caster_state — самовосстановление инварианта кастера
/// 2. process_interrupts — прерывания
/// 3. start_requested_casts — новые касты
/// 4. process_releases — отпускание кнопки
/// 5. update_active_casts — фазы + эффекты
/// 6. apply_resource_changes — отложенные мутации stats
/// 7. lock_casting_movement — запрет движения под кастом
pub struct LifecyclePlugin;

impl Plugin for LifecyclePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CastRequest>()
            .add_event::<CastRelease>()
            .add_event::<InterruptCast>()
            .add_event::<EnergySpent>()
            .add_event::<SelfHealed>();

        app.add_systems(
            FixedUpdate,
            (
                heal_caster_state,
                process_interrupts,
                start_requested_casts,
                process_releases,
                update_active_casts,
                apply_resource_changes,
                lock_casting_movement,
            )
                .chain()
                .in_set(SimSet::Lifecycle),
        );
    }
}
