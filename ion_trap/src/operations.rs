//! Cool, pulse and entangle operations
//!
//! Every operation validates its preconditions first and returns an error
//! without touching any state when they fail. Deferred work (settling, color
//! refresh, the end of the entangling window, effect cleanup) is queued as
//! [`TrapEvent`]s and applied by [`OperationEngine::advance`].
//!
//! Operations are not mutually exclusive: starting a pulse while a cool is still
//! settling is allowed, and the settle will then reset the freshly pulsed ions.

use crate::config::{Palette, TrapConfig, Timings};
use crate::effects::{EffectPlayer, Stage};
use crate::error::TrapError;
use crate::ion::{EnergyLevel, IonId};
use crate::scene::ObjectHandle;
use crate::scheduler::Scheduler;
use crate::trap::{TrapState, TrapStatus};
use glam::Vec3;
use std::time::Duration;

/// Laser pulse area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseKind {
    /// Full Rabi flop: |0⟩ ↔ |1⟩
    Pi,
    /// Half flop into the superposition marker
    HalfPi,
}

impl PulseKind {
    /// Level an ion ends up in after this pulse
    pub fn transition(self, from: EnergyLevel) -> EnergyLevel {
        match self {
            PulseKind::Pi => match from {
                EnergyLevel::Ground => EnergyLevel::Excited,
                EnergyLevel::Excited => EnergyLevel::Ground,
                // No amplitude model behind the marker, so resolve upwards
                EnergyLevel::Superposition => EnergyLevel::Excited,
            },
            PulseKind::HalfPi => EnergyLevel::Superposition,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PulseKind::Pi => "π",
            PulseKind::HalfPi => "π/2",
        }
    }
}

/// Deferred work queued by operations and effects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrapEvent {
    /// End of the cooling settle delay
    CoolSettled,
    /// Recolor an ion to match its level
    RefreshColor(IonId),
    /// End of the entangling window for this pair
    EntangleFinished { pair: [IonId; 2] },
    /// Effect cleanup
    RemoveObject(ObjectHandle),
}

pub struct OperationEngine {
    timings: Timings,
    palette: Palette,
    effects: EffectPlayer,
    timers: Scheduler<TrapEvent>,
}

impl OperationEngine {
    pub fn new(config: &TrapConfig) -> Self {
        Self {
            timings: config.timings.clone(),
            palette: config.palette.clone(),
            effects: EffectPlayer::new(config.timings.clone(), config.palette.clone()),
            timers: Scheduler::new(),
        }
    }

    /// Laser-cool the whole chain back to the ground state
    ///
    /// The selection is cleared and the label recomputed right away; the levels
    /// only reset once the settle delay has passed.
    pub fn cool(&mut self, state: &mut TrapState, stage: &mut Stage) {
        log::info!("Cooling {} ions", state.ions.len());
        state.status = TrapStatus::Cooling;

        let (from, to) = chain_span(state);
        self.effects.global_laser(stage, &mut self.timers, from, to);
        self.timers.schedule(self.timings.cool_settle, TrapEvent::CoolSettled);

        state.selection.clear(&mut state.ions);
        state.display.render(&state.ions);
    }

    /// Apply a pulse to every selected ion, in ascending id order
    ///
    /// Returns the pulsed ions. Each one is deselected once its transition is
    /// applied, so the selection is always empty afterwards.
    pub fn pulse(
        &mut self,
        state: &mut TrapState,
        stage: &mut Stage,
        kind: PulseKind,
    ) -> Result<Vec<IonId>, TrapError> {
        let targets = state.selection.current();
        if targets.is_empty() {
            log::debug!("{} pulse rejected: nothing selected", kind.label());
            return Err(TrapError::NoSelection);
        }

        log::info!("{} pulse on ions {:?}", kind.label(), targets);
        state.status = TrapStatus::Pulsed(kind);

        for &id in &targets {
            let ion = state.ions.get_mut(id)?;
            let from = ion.energy_level;

            self.effects.targeted_laser(stage, &mut self.timers, ion, kind);
            self.effects.energy_popup(stage, &mut self.timers, ion, from, kind);

            ion.energy_level = kind.transition(from);
            log::debug!("Ion {}: {:?} -> {:?}", id, from, ion.energy_level);
            state.display.render(&state.ions);

            self.timers.schedule(self.timings.color_settle, TrapEvent::RefreshColor(id));
            state.selection.remove(&mut state.ions, id);
        }

        Ok(targets)
    }

    /// Entangle the two selected ions for a fixed window
    ///
    /// Levels are left untouched; only the entangling flag, the link and the
    /// pair's tint change.
    pub fn entangle(&mut self, state: &mut TrapState, stage: &mut Stage) -> Result<[IonId; 2], TrapError> {
        let pair = match state.selection.current().as_slice() {
            &[a, b] => [a, b],
            _ => {
                log::debug!("Entangle rejected: {} ions selected", state.selection.len());
                return Err(TrapError::InvalidSelectionCount {
                    selected: state.selection.len(),
                });
            }
        };

        log::info!("Entangling ions {} and {}", pair[0], pair[1]);
        state.entangling = true;
        state.status = TrapStatus::Entangling;

        self.effects.entanglement_link(stage, &mut self.timers, pair[0], pair[1]);
        for id in pair {
            state.ions.get_mut(id)?.color = self.palette.entangled;
        }

        self.timers
            .schedule(self.timings.entangle_duration, TrapEvent::EntangleFinished { pair });
        Ok(pair)
    }

    /// Advance the timer clock and apply everything that became due
    pub fn advance(&mut self, dt: Duration, state: &mut TrapState, stage: &mut Stage) {
        for event in self.timers.advance(dt) {
            self.apply(event, state, stage);
        }
    }

    fn apply(&mut self, event: TrapEvent, state: &mut TrapState, stage: &mut Stage) {
        log::debug!("Timer fired: {:?}", event);
        match event {
            TrapEvent::CoolSettled => {
                for ion in state.ions.iter_mut() {
                    ion.energy_level = EnergyLevel::Ground;
                    ion.color = EnergyLevel::Ground.color(&self.palette);
                }
                state.status = TrapStatus::IdleGround;
                state.display.render(&state.ions);
            }
            TrapEvent::RefreshColor(id) => {
                if let Ok(ion) = state.ions.get_mut(id) {
                    ion.color = ion.energy_level.color(&self.palette);
                }
            }
            TrapEvent::EntangleFinished { pair } => {
                state.entangling = false;
                state.selection.clear(&mut state.ions);
                for id in pair {
                    if let Ok(ion) = state.ions.get_mut(id) {
                        ion.color = ion.energy_level.color(&self.palette);
                    }
                }
                if state.status == TrapStatus::Entangling {
                    state.status = TrapStatus::Idle;
                }
                log::info!("Entanglement of ions {} and {} finished", pair[0], pair[1]);
            }
            TrapEvent::RemoveObject(handle) => {
                stage.scene.remove(handle);
            }
        }
    }

    /// Time since the engine was created
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }
}

/// Endpoints of the cooling beam, a little past both ends of the chain
fn chain_span(state: &TrapState) -> (Vec3, Vec3) {
    const MARGIN: f32 = 1.5;
    let (min, max) = state
        .ions
        .iter()
        .map(|ion| ion.base_position.x)
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));
    if min > max {
        // Empty chain
        return (Vec3::new(-MARGIN, 0.0, 0.0), Vec3::new(MARGIN, 0.0, 0.0));
    }
    (Vec3::new(min - MARGIN, 0.0, 0.0), Vec3::new(max + MARGIN, 0.0, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneObject;

    fn setup() -> (OperationEngine, TrapState, Stage) {
        let config = TrapConfig::default();
        (OperationEngine::new(&config), TrapState::new(&config), Stage::new())
    }

    fn select(state: &mut TrapState, ids: &[usize]) {
        for &id in ids {
            state.selection.toggle(&mut state.ions, IonId(id)).unwrap();
        }
    }

    fn level(state: &TrapState, id: usize) -> EnergyLevel {
        state.ions.get(IonId(id)).unwrap().energy_level
    }

    #[test]
    fn pi_transitions() {
        assert_eq!(PulseKind::Pi.transition(EnergyLevel::Ground), EnergyLevel::Excited);
        assert_eq!(PulseKind::Pi.transition(EnergyLevel::Excited), EnergyLevel::Ground);
        assert_eq!(PulseKind::Pi.transition(EnergyLevel::Superposition), EnergyLevel::Excited);
    }

    #[test]
    fn half_pi_always_lands_in_superposition() {
        for from in [EnergyLevel::Ground, EnergyLevel::Excited, EnergyLevel::Superposition] {
            assert_eq!(PulseKind::HalfPi.transition(from), EnergyLevel::Superposition);
        }
    }

    #[test]
    fn pulse_without_selection_changes_nothing() {
        let (mut engine, mut state, mut stage) = setup();
        let before = state.ions.levels();

        assert_eq!(
            engine.pulse(&mut state, &mut stage, PulseKind::Pi),
            Err(TrapError::NoSelection)
        );
        assert_eq!(state.ions.levels(), before);
        assert!(stage.scene.is_empty());
        assert_eq!(engine.pending_timers(), 0);
        assert_eq!(state.status, TrapStatus::IdleGround);
    }

    #[test]
    fn pi_pulse_flips_and_deselects() {
        let (mut engine, mut state, mut stage) = setup();
        select(&mut state, &[2]);
        assert_eq!(engine.pulse(&mut state, &mut stage, PulseKind::Pi), Ok(vec![IonId(2)]));
        assert_eq!(level(&state, 2), EnergyLevel::Excited);
        assert!(state.selection.is_empty());
        assert!(!state.ions.get(IonId(2)).unwrap().is_selected);

        select(&mut state, &[2]);
        engine.pulse(&mut state, &mut stage, PulseKind::Pi).unwrap();
        assert_eq!(level(&state, 2), EnergyLevel::Ground);
    }

    #[test]
    fn pulse_updates_label_immediately() {
        let (mut engine, mut state, mut stage) = setup();
        select(&mut state, &[0, 2]);
        engine.pulse(&mut state, &mut stage, PulseKind::HalfPi).unwrap();
        assert_eq!(state.display.label(), "|+⟩ ⊗ |0⟩ ⊗ |+⟩ ⊗ |0⟩ ⊗ |0⟩");
    }

    #[test]
    fn pulse_places_laser_and_popup_per_ion() {
        let (mut engine, mut state, mut stage) = setup();
        select(&mut state, &[1, 3]);
        engine.pulse(&mut state, &mut stage, PulseKind::Pi).unwrap();
        assert_eq!(stage.scene.len(), 4);

        // Everything cleans itself up
        engine.advance(Duration::from_secs(5), &mut state, &mut stage);
        assert!(stage.scene.is_empty());
    }

    #[test]
    fn color_follows_level_after_settle() {
        let (mut engine, mut state, mut stage) = setup();
        let palette = Palette::default();
        select(&mut state, &[4]);
        engine.pulse(&mut state, &mut stage, PulseKind::Pi).unwrap();
        assert_eq!(state.ions.get(IonId(4)).unwrap().color, palette.ground);

        engine.advance(Duration::from_millis(199), &mut state, &mut stage);
        assert_eq!(state.ions.get(IonId(4)).unwrap().color, palette.ground);
        engine.advance(Duration::from_millis(1), &mut state, &mut stage);
        assert_eq!(state.ions.get(IonId(4)).unwrap().color, palette.excited);
    }

    #[test]
    fn entangle_requires_exactly_two() {
        let (mut engine, mut state, mut stage) = setup();
        for ids in [&[][..], &[3][..]] {
            select(&mut state, ids);
            assert_eq!(
                engine.entangle(&mut state, &mut stage),
                Err(TrapError::InvalidSelectionCount { selected: ids.len() })
            );
            assert!(!state.entangling);
            assert!(stage.scene.is_empty());
            state.selection.clear(&mut state.ions);
        }
    }

    #[test]
    fn entangle_window_opens_and_closes() {
        let (mut engine, mut state, mut stage) = setup();
        select(&mut state, &[3, 1]);
        assert_eq!(engine.entangle(&mut state, &mut stage), Ok([IonId(1), IonId(3)]));
        assert!(state.entangling);
        assert_eq!(state.status, TrapStatus::Entangling);
        assert_eq!(state.ions.get(IonId(1)).unwrap().color, Palette::default().entangled);

        engine.advance(Duration::from_millis(2999), &mut state, &mut stage);
        assert!(state.entangling);
        assert_eq!(state.selection.len(), 2);

        engine.advance(Duration::from_millis(1), &mut state, &mut stage);
        assert!(!state.entangling);
        assert!(state.selection.is_empty());
        assert!(state.ions.iter().all(|ion| !ion.is_selected));
        assert_eq!(state.ions.get(IonId(3)).unwrap().color, Palette::default().ground);
        assert!(stage.scene.is_empty());
        assert_eq!(state.status, TrapStatus::Idle);
    }

    #[test]
    fn cool_clears_selection_now_and_levels_later() {
        let (mut engine, mut state, mut stage) = setup();
        select(&mut state, &[0, 1]);
        engine.pulse(&mut state, &mut stage, PulseKind::Pi).unwrap();
        select(&mut state, &[4]);

        engine.cool(&mut state, &mut stage);
        assert!(state.selection.is_empty());
        assert!(!state.ions.get(IonId(4)).unwrap().is_selected);
        assert_eq!(state.status, TrapStatus::Cooling);
        assert_eq!(level(&state, 0), EnergyLevel::Excited);

        engine.advance(Duration::from_millis(500), &mut state, &mut stage);
        assert!(state.ions.iter().all(|ion| ion.energy_level == EnergyLevel::Ground));
        assert_eq!(state.status, TrapStatus::IdleGround);
        assert_eq!(state.display.label(), "|0⟩ ⊗ |0⟩ ⊗ |0⟩ ⊗ |0⟩ ⊗ |0⟩");
    }

    #[test]
    fn pulse_during_cool_settle_is_overwritten() {
        let (mut engine, mut state, mut stage) = setup();
        engine.cool(&mut state, &mut stage);
        select(&mut state, &[2]);
        engine.pulse(&mut state, &mut stage, PulseKind::Pi).unwrap();
        assert_eq!(level(&state, 2), EnergyLevel::Excited);

        engine.advance(Duration::from_millis(500), &mut state, &mut stage);
        assert_eq!(level(&state, 2), EnergyLevel::Ground);
    }

    #[test]
    fn earlier_entangle_timer_closes_later_window() {
        let (mut engine, mut state, mut stage) = setup();
        select(&mut state, &[0, 1]);
        engine.entangle(&mut state, &mut stage).unwrap();

        engine.advance(Duration::from_millis(1000), &mut state, &mut stage);
        state.selection.toggle(&mut state.ions, IonId(0)).unwrap();
        select(&mut state, &[2]);
        engine.entangle(&mut state, &mut stage).unwrap();

        engine.advance(Duration::from_millis(2000), &mut state, &mut stage);
        assert!(!state.entangling);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn pulse_visits_ions_in_ascending_order() {
        let (mut engine, mut state, mut stage) = setup();
        select(&mut state, &[3, 1]);
        let pulsed = engine.pulse(&mut state, &mut stage, PulseKind::Pi).unwrap();
        assert_eq!(pulsed, vec![IonId(1), IonId(3)]);

        let beam_targets: Vec<f32> = stage
            .scene
            .iter()
            .filter_map(|(_, placed)| match placed.object {
                SceneObject::LaserBeam { target, .. } => Some(target.x),
                _ => None,
            })
            .collect();
        let expected: Vec<f32> = [1, 3]
            .iter()
            .map(|&id| state.ions.get(IonId(id)).unwrap().base_position.x)
            .collect();
        assert_eq!(beam_targets, expected);
    }

    #[test]
    fn cooling_beam_spans_even_chain() {
        let config = TrapConfig::with_ion_count(4);
        let mut engine = OperationEngine::new(&config);
        let mut state = TrapState::new(&config);
        let mut stage = Stage::new();
        assert!(state.ions.iter().all(|ion| ion.base_position.x != 0.0));

        engine.cool(&mut state, &mut stage);

        let (_, beam) = stage.scene.iter().next().unwrap();
        let SceneObject::LaserBeam { target, .. } = beam.object else {
            panic!("expected the cooling beam, got {:?}", beam.object);
        };
        let half = 1.5 * config.ion_spacing + 1.5;
        assert!((beam.position.x + half).abs() < 1e-4);
        assert!((target.x - half).abs() < 1e-4);
    }
}
