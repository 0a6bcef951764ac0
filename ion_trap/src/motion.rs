//! Per-frame ion positions
//!
//! Positions are a pure function of elapsed time and the current trap state;
//! nothing about the motion is carried between frames.

use crate::config::MotionParams;
use crate::ion::Ion;
use crate::selection::SelectionController;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Displayed position of `ion` at `time` seconds
///
/// Selected ions oscillate collectively along the trap axis while the entangling
/// flag is set, the second selected ion half a period behind the first. All
/// other ions jitter around their base position.
pub fn ion_position(
    ion: &Ion,
    selection: &SelectionController,
    entangling: bool,
    time: f32,
    params: &MotionParams,
) -> Vec3 {
    if entangling {
        if let Some(rank) = selection.phase_index(ion.id) {
            return ion.base_position + collective_offset(rank, time, params);
        }
    }
    ion.base_position + thermal_jitter(ion.id.0, time, params.jitter_amplitude)
}

/// Center-of-mass style oscillation, phase set by the rank in the selection
pub fn collective_offset(rank: usize, time: f32, params: &MotionParams) -> Vec3 {
    let phase = rank as f32 * PI;
    let omega = TAU * params.oscillation_frequency;
    let axial = (omega * time + phase).sin() * params.oscillation_amplitude;
    // Small vertical bob at twice the frequency traces a figure-eight
    let radial = (2.0 * omega * time + phase).sin() * params.oscillation_amplitude * 0.2;
    Vec3::new(axial, radial, 0.0)
}

/// Deterministic pseudo-random wobble, different for every ion
pub fn thermal_jitter(seed: usize, time: f32, amplitude: f32) -> Vec3 {
    let s = seed as f32;
    Vec3::new(
        (time * 13.1 + s * 1.7).sin() + 0.5 * (time * 29.3 + s * 4.1).sin(),
        (time * 11.7 + s * 2.9).sin() + 0.5 * (time * 23.9 + s * 0.3).sin(),
        (time * 17.3 + s * 0.7).sin() + 0.5 * (time * 31.1 + s * 3.7).sin(),
    ) * (amplitude / 1.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ion::{IonId, IonRegistry};

    fn chain() -> (IonRegistry, SelectionController) {
        (IonRegistry::create_ions(5, 1.0, [0.0; 4]), SelectionController::new())
    }

    #[test]
    fn jitter_is_small_and_deterministic() {
        let params = MotionParams::default();
        for t in [0.0, 0.4, 3.7, 120.0] {
            let a = thermal_jitter(3, t, params.jitter_amplitude);
            assert_eq!(a, thermal_jitter(3, t, params.jitter_amplitude));
            assert!(a.abs().max_element() <= params.jitter_amplitude + 1e-6);
        }
        assert_ne!(thermal_jitter(1, 0.5, 0.03), thermal_jitter(2, 0.5, 0.03));
    }

    #[test]
    fn selected_ions_oscillate_in_antiphase_while_entangling() {
        let (mut ions, mut sel) = chain();
        sel.toggle(&mut ions, IonId(3)).unwrap();
        sel.toggle(&mut ions, IonId(1)).unwrap();
        let params = MotionParams::default();
        let t = 0.1;

        let first = ion_position(ions.get(IonId(1)).unwrap(), &sel, true, t, &params)
            - ions.get(IonId(1)).unwrap().base_position;
        let second = ion_position(ions.get(IonId(3)).unwrap(), &sel, true, t, &params)
            - ions.get(IonId(3)).unwrap().base_position;

        assert!(first.x.abs() > 0.1);
        assert!((first.x + second.x).abs() < 1e-5);
    }

    #[test]
    fn unselected_ions_jitter_even_while_entangling() {
        let (mut ions, mut sel) = chain();
        sel.toggle(&mut ions, IonId(0)).unwrap();
        sel.toggle(&mut ions, IonId(1)).unwrap();
        let params = MotionParams::default();
        let ion = ions.get(IonId(4)).unwrap();

        let pos = ion_position(ion, &sel, true, 1.3, &params);
        assert_eq!(pos, ion.base_position + thermal_jitter(4, 1.3, params.jitter_amplitude));
    }

    #[test]
    fn selection_alone_does_not_oscillate() {
        let (mut ions, mut sel) = chain();
        sel.toggle(&mut ions, IonId(2)).unwrap();
        let params = MotionParams::default();
        let ion = ions.get(IonId(2)).unwrap();
        let offset = ion_position(ion, &sel, false, 0.1, &params) - ion.base_position;
        assert!(offset.length() <= params.jitter_amplitude * 2.0);
    }
}
