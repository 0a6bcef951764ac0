//! End-to-end scenarios driven through the public `IonTrap` handle

use ion_trap::trap::TrapStatus;
use ion_trap::{EnergyLevel, IonId, IonTrap, PulseKind, TrapConfig, TrapError};
use std::time::Duration;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Run the trap at 60 fps for `total`
fn run_frames(trap: &mut IonTrap, total: Duration) {
    let frame = Duration::from_micros(16_667);
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        let dt = frame.min(total - elapsed);
        trap.update(dt);
        elapsed += dt;
    }
}

#[test]
fn fresh_chains_of_any_length() {
    for n in 1..=9 {
        let trap = IonTrap::new(TrapConfig::with_ion_count(n));
        let ids: Vec<IonId> = trap.state.ions.iter().map(|ion| ion.id).collect();
        assert_eq!(ids, (0..n).map(IonId).collect::<Vec<_>>());
        assert!(trap.state.ions.iter().all(|ion| ion.energy_level == EnergyLevel::Ground));
        assert!(trap.state.selection.is_empty());
    }
}

#[test]
fn entangle_pair_and_wait_out_the_window() {
    let mut trap = IonTrap::default();
    trap.toggle(IonId(1)).unwrap();
    trap.toggle(IonId(3)).unwrap();
    let before = trap.state.ions.levels();

    trap.entangle().unwrap();
    assert!(trap.state.entangling);

    run_frames(&mut trap, ms(1500));
    assert!(trap.state.entangling);

    run_frames(&mut trap, ms(1500));
    assert!(!trap.state.entangling);
    assert!(trap.state.selection.is_empty());
    assert_eq!(trap.state.ions.levels(), before);
    assert!(trap.stage.scene.is_empty());
}

#[test]
fn rejected_input_leaves_state_alone() {
    let mut trap = IonTrap::default();
    assert_eq!(trap.pulse(PulseKind::HalfPi), Err(TrapError::NoSelection));
    assert_eq!(trap.entangle(), Err(TrapError::InvalidSelectionCount { selected: 0 }));

    trap.toggle(IonId(0)).unwrap();
    trap.toggle(IonId(2)).unwrap();
    assert_eq!(trap.toggle(IonId(4)), Err(TrapError::SelectionFull { capacity: 2 }));
    assert_eq!(trap.state.selection.current(), vec![IonId(0), IonId(2)]);
    assert!(!trap.state.entangling);
    assert_eq!(trap.label(), "|0⟩ ⊗ |0⟩ ⊗ |0⟩ ⊗ |0⟩ ⊗ |0⟩");
}

#[test]
fn prepare_mixed_state_then_cool() {
    let mut trap = IonTrap::default();

    trap.toggle(IonId(1)).unwrap();
    trap.pulse(PulseKind::Pi).unwrap();
    trap.toggle(IonId(2)).unwrap();
    trap.toggle(IonId(4)).unwrap();
    trap.pulse(PulseKind::HalfPi).unwrap();
    assert!(trap.state.selection.is_empty());
    assert_eq!(trap.label(), "|0⟩ ⊗ |1⟩ ⊗ |+⟩ ⊗ |0⟩ ⊗ |+⟩");
    assert_eq!(trap.state.status, TrapStatus::Pulsed(PulseKind::HalfPi));

    run_frames(&mut trap, ms(2000));
    trap.toggle(IonId(0)).unwrap();
    trap.cool();
    assert!(trap.state.selection.is_empty());
    assert_eq!(trap.state.ions.get(IonId(1)).unwrap().energy_level, EnergyLevel::Excited);

    run_frames(&mut trap, ms(500));
    assert_eq!(trap.label(), "|0⟩ ⊗ |0⟩ ⊗ |0⟩ ⊗ |0⟩ ⊗ |0⟩");
    assert_eq!(trap.state.status.to_string(), "Idle (Ground State)");
}

#[test]
fn entangle_keeps_pulsed_levels() {
    let mut trap = IonTrap::default();
    trap.toggle(IonId(0)).unwrap();
    trap.pulse(PulseKind::Pi).unwrap();

    trap.toggle(IonId(0)).unwrap();
    trap.toggle(IonId(4)).unwrap();
    trap.entangle().unwrap();
    run_frames(&mut trap, ms(3000));

    assert_eq!(trap.state.ions.get(IonId(0)).unwrap().energy_level, EnergyLevel::Excited);
    assert_eq!(trap.state.ions.get(IonId(4)).unwrap().energy_level, EnergyLevel::Ground);
    assert_eq!(trap.state.status, TrapStatus::Idle);
}

#[test]
fn entangled_ions_move_while_others_stay_close() {
    let mut trap = IonTrap::default();
    trap.toggle(IonId(1)).unwrap();
    trap.toggle(IonId(3)).unwrap();
    trap.entangle().unwrap();
    run_frames(&mut trap, ms(100));

    let positions = trap.ion_positions();
    for (id, pos) in positions {
        let base = trap.state.ions.get(id).unwrap().base_position;
        let offset = (pos - base).length();
        if id == IonId(1) || id == IonId(3) {
            assert!(offset > 0.1, "ion {} barely moved", id);
        } else {
            assert!(offset < 0.1, "ion {} moved too far", id);
        }
    }
}

#[test]
fn one_long_frame_catches_up_on_every_timer() {
    let mut trap = IonTrap::default();
    trap.toggle(IonId(0)).unwrap();
    trap.toggle(IonId(4)).unwrap();
    trap.entangle().unwrap();
    trap.pulse(PulseKind::Pi).unwrap();

    // A single stalled frame longer than every delay
    trap.update(ms(4000));

    assert!(!trap.state.entangling);
    assert_eq!(trap.state.status, TrapStatus::Pulsed(PulseKind::Pi));
    assert_eq!(trap.engine.pending_timers(), 0);
    assert!(trap.stage.scene.is_empty());
    assert_eq!(trap.stage.tweens.active(), 0);
    for id in [IonId(0), IonId(4)] {
        let ion = trap.state.ions.get(id).unwrap();
        assert_eq!(ion.color, EnergyLevel::Excited.color(&trap.config.palette));
    }
}
