//! Trapped-Ion Quantum Computer Demo
//!
//! An interactive visualization of a linear Paul trap holding a short chain of ions:
//!
//! - **Ion Registry**: fixed chain of ions with cosmetic energy levels
//! - **Selection**: pick up to two ions as targets for the next operation
//! - **Operations**: laser cooling, π and π/2 pulses, and a two-ion entangling gate
//! - **Effects**: laser beams, entanglement link and energy-level popups
//! - **State Display**: tensor-product label of the chain's mocked quantum state
//!
//! The simulation core is deterministic and frame-driven: every delay is a one-shot
//! event on [`scheduler::Scheduler`], advanced by [`trap::IonTrap::update`].

pub mod config;
pub mod error;
pub mod ion;
pub mod selection;
pub mod scheduler;
pub mod scene;
pub mod tween;
pub mod effects;
pub mod state_display;
pub mod operations;
pub mod motion;
pub mod picking;
pub mod trap;
pub mod renderer;
pub mod control_panel;

pub use config::TrapConfig;
pub use error::TrapError;
pub use ion::{EnergyLevel, Ion, IonId, IonRegistry};
pub use operations::PulseKind;
pub use trap::{Command, IonTrap};

/// Tuning constants for the trap visualization
pub mod constants {
    /// Number of ions in the reference configuration
    pub const DEFAULT_ION_COUNT: usize = 5;

    /// Spacing between neighbouring ions along the trap axis
    pub const ION_SPACING: f32 = 1.6;

    /// Rendered ion radius
    pub const ION_RADIUS: f32 = 0.28;

    /// Maximum number of simultaneously selected ions
    pub const MAX_SELECTION: usize = 2;

    /// Height above the chain that targeted lasers are fired from
    pub const LASER_SOURCE_HEIGHT: f32 = 4.0;

    /// Height of the energy-level popup above its ion
    pub const POPUP_HEIGHT: f32 = 0.9;
}
