//! Reference configuration of the trap demo

use crate::constants::{DEFAULT_ION_COUNT, ION_SPACING};
use std::time::Duration;

/// Durations of every timed step in the demo
#[derive(Debug, Clone, PartialEq)]
pub struct Timings {
    /// Delay between starting a Cool and the chain reaching the ground state
    pub cool_settle: Duration,
    /// Delay before a pulsed ion's color follows its new level
    pub color_settle: Duration,
    /// How long the entangling window stays open
    pub entangle_duration: Duration,
    /// Lifetime of a targeted laser beam
    pub targeted_laser: Duration,
    /// Lifetime of the whole-trap cooling laser
    pub global_laser: Duration,
    pub popup_pop_in: Duration,
    pub popup_transition: Duration,
    pub popup_split: Duration,
    pub popup_hold: Duration,
    pub popup_fade: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            cool_settle: Duration::from_millis(500),
            color_settle: Duration::from_millis(200),
            entangle_duration: Duration::from_millis(3000),
            targeted_laser: Duration::from_millis(600),
            global_laser: Duration::from_millis(500),
            popup_pop_in: Duration::from_millis(150),
            popup_transition: Duration::from_millis(450),
            popup_split: Duration::from_millis(250),
            popup_hold: Duration::from_millis(150),
            popup_fade: Duration::from_millis(300),
        }
    }
}

/// Colors used for ions and effects (RGBA)
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub ground: [f32; 4],
    pub excited: [f32; 4],
    pub superposition: [f32; 4],
    /// Shared tint of an entangled pair
    pub entangled: [f32; 4],
    pub selection_halo: [f32; 4],
    pub pi_laser: [f32; 4],
    pub half_pi_laser: [f32; 4],
    pub cooling_laser: [f32; 4],
    pub entanglement_link: [f32; 4],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            ground: [0.25, 0.55, 1.0, 1.0],        // Blue
            excited: [1.0, 0.55, 0.15, 1.0],       // Orange
            superposition: [0.6, 1.0, 0.45, 1.0],  // Green
            entangled: [1.0, 0.85, 0.2, 1.0],      // Gold
            selection_halo: [1.0, 1.0, 1.0, 0.35],
            pi_laser: [1.0, 0.1, 0.1, 0.9],        // Red
            half_pi_laser: [1.0, 0.1, 1.0, 0.9],   // Magenta
            cooling_laser: [0.3, 0.8, 1.0, 0.6],   // Cyan
            entanglement_link: [1.0, 0.5, 1.0, 0.9],
        }
    }
}

/// Parameters of the per-frame ion motion
#[derive(Debug, Clone, PartialEq)]
pub struct MotionParams {
    /// Amplitude of the ambient thermal jitter
    pub jitter_amplitude: f32,
    /// Amplitude of the collective oscillation while entangling
    pub oscillation_amplitude: f32,
    /// Collective oscillation frequency in Hz
    pub oscillation_frequency: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            jitter_amplitude: 0.03,
            oscillation_amplitude: 0.3,
            oscillation_frequency: 1.5,
        }
    }
}

/// Complete configuration of an [`crate::IonTrap`]
#[derive(Debug, Clone, PartialEq)]
pub struct TrapConfig {
    pub ion_count: usize,
    pub ion_spacing: f32,
    pub timings: Timings,
    pub palette: Palette,
    pub motion: MotionParams,
}

impl TrapConfig {
    /// Reference configuration with a custom chain length
    pub fn with_ion_count(ion_count: usize) -> Self {
        Self {
            ion_count,
            ..Self::default()
        }
    }
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self {
            ion_count: DEFAULT_ION_COUNT,
            ion_spacing: ION_SPACING,
            timings: Timings::default(),
            palette: Palette::default(),
            motion: MotionParams::default(),
        }
    }
}
