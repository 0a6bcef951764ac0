//! Trap state and the top-level simulation handle

use crate::config::TrapConfig;
use crate::constants::ION_RADIUS;
use crate::effects::Stage;
use crate::error::TrapError;
use crate::ion::{IonId, IonRegistry};
use crate::motion;
use crate::operations::{OperationEngine, PulseKind};
use crate::picking;
use crate::selection::{SelectionChange, SelectionController};
use crate::state_display::StateDisplay;
use glam::Vec3;
use std::fmt;
use std::time::Duration;

/// Status line shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapStatus {
    /// Freshly created or cooled chain
    IdleGround,
    Idle,
    Cooling,
    Pulsed(PulseKind),
    Entangling,
}

impl fmt::Display for TrapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrapStatus::IdleGround => write!(f, "Idle (Ground State)"),
            TrapStatus::Idle => write!(f, "Idle"),
            TrapStatus::Cooling => write!(f, "Cooling"),
            TrapStatus::Pulsed(kind) => write!(f, "Pulsing ({})", kind.label()),
            TrapStatus::Entangling => write!(f, "Entangling"),
        }
    }
}

/// User command from the panel or the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Cool,
    Pulse(PulseKind),
    Entangle,
    ClearSelection,
}

/// Everything the selection and operation code mutates
pub struct TrapState {
    pub ions: IonRegistry,
    pub selection: SelectionController,
    /// Set while an entangling window is open
    pub entangling: bool,
    pub status: TrapStatus,
    pub display: StateDisplay,
}

impl TrapState {
    pub fn new(config: &TrapConfig) -> Self {
        let ions = IonRegistry::create_ions(config.ion_count, config.ion_spacing, config.palette.ground);
        let mut display = StateDisplay::new();
        display.render(&ions);

        Self {
            ions,
            selection: SelectionController::new(),
            entangling: false,
            status: TrapStatus::IdleGround,
            display,
        }
    }
}

/// The whole demo: state, operations and the effects stage, driven by [`IonTrap::update`]
pub struct IonTrap {
    pub config: TrapConfig,
    pub state: TrapState,
    pub engine: OperationEngine,
    pub stage: Stage,
}

impl IonTrap {
    pub fn new(config: TrapConfig) -> Self {
        log::info!("Creating ion trap with {} ions", config.ion_count);
        let state = TrapState::new(&config);
        let engine = OperationEngine::new(&config);
        Self {
            config,
            state,
            engine,
            stage: Stage::new(),
        }
    }

    /// Toggle selection of an ion
    pub fn toggle(&mut self, id: IonId) -> Result<SelectionChange, TrapError> {
        let change = self.state.selection.toggle(&mut self.state.ions, id);
        match &change {
            Ok(change) => log::debug!("{:?}", change),
            Err(e) => log::debug!("Selection unchanged: {}", e),
        }
        change
    }

    pub fn clear_selection(&mut self) {
        self.state.selection.clear(&mut self.state.ions);
    }

    pub fn cool(&mut self) {
        self.engine.cool(&mut self.state, &mut self.stage);
    }

    pub fn pulse(&mut self, kind: PulseKind) -> Result<Vec<IonId>, TrapError> {
        self.engine.pulse(&mut self.state, &mut self.stage, kind)
    }

    pub fn entangle(&mut self) -> Result<[IonId; 2], TrapError> {
        self.engine.entangle(&mut self.state, &mut self.stage)
    }

    /// Run a command, surfacing rejected input as the error
    pub fn execute(&mut self, command: Command) -> Result<(), TrapError> {
        match command {
            Command::Cool => self.cool(),
            Command::Pulse(kind) => {
                self.pulse(kind)?;
            }
            Command::Entangle => {
                self.entangle()?;
            }
            Command::ClearSelection => self.clear_selection(),
        }
        Ok(())
    }

    /// Advance timers and tweens by one frame
    pub fn update(&mut self, dt: Duration) {
        self.engine.advance(dt, &mut self.state, &mut self.stage);
        self.stage.advance(dt);
    }

    /// Seconds since the trap was created
    pub fn elapsed(&self) -> f32 {
        self.engine.now().as_secs_f32()
    }

    /// Displayed position of every ion for the current frame
    pub fn ion_positions(&self) -> Vec<(IonId, Vec3)> {
        let time = self.elapsed();
        self.state
            .ions
            .iter()
            .map(|ion| {
                let pos = motion::ion_position(
                    ion,
                    &self.state.selection,
                    self.state.entangling,
                    time,
                    &self.config.motion,
                );
                (ion.id, pos)
            })
            .collect()
    }

    /// Ion under a pointer ray, tested against the displayed positions
    pub fn pick(&self, origin: Vec3, dir: Vec3) -> Option<IonId> {
        picking::pick_ion(origin, dir, self.ion_positions(), ION_RADIUS * 1.2)
    }

    pub fn label(&self) -> &str {
        self.state.display.label()
    }
}

impl Default for IonTrap {
    fn default() -> Self {
        Self::new(TrapConfig::default())
    }
}
