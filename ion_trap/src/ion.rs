//! Ion chain state
//!
//! Ions are created once with evenly spaced equilibrium positions and are never
//! added or removed afterwards.

use crate::error::TrapError;
use glam::Vec3;
use std::fmt;

/// Stable 0-based ion index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IonId(pub usize);

impl fmt::Display for IonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cosmetic energy level of an ion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyLevel {
    /// |0⟩
    Ground,
    /// Equal superposition marker, not an amplitude pair
    Superposition,
    /// |1⟩
    Excited,
}

impl EnergyLevel {
    /// Numeric level: 0, 0.5 or 1
    pub fn value(self) -> f32 {
        match self {
            EnergyLevel::Ground => 0.0,
            EnergyLevel::Superposition => 0.5,
            EnergyLevel::Excited => 1.0,
        }
    }

    /// Inverse of [`EnergyLevel::value`]; `None` for anything else
    pub fn from_value(value: f32) -> Option<Self> {
        if value == 0.0 {
            Some(EnergyLevel::Ground)
        } else if value == 0.5 {
            Some(EnergyLevel::Superposition)
        } else if value == 1.0 {
            Some(EnergyLevel::Excited)
        } else {
            None
        }
    }

    /// Color of an ion resting at this level
    pub fn color(self, palette: &crate::config::Palette) -> [f32; 4] {
        match self {
            EnergyLevel::Ground => palette.ground,
            EnergyLevel::Superposition => palette.superposition,
            EnergyLevel::Excited => palette.excited,
        }
    }
}

/// A single trapped ion
#[derive(Debug, Clone)]
pub struct Ion {
    pub id: IonId,
    pub energy_level: EnergyLevel,
    /// Equilibrium point the motion oscillates around
    pub base_position: Vec3,
    /// Mirrors membership in the selection set
    pub is_selected: bool,
    /// Currently rendered tint
    pub color: [f32; 4],
}

/// Ordered, fixed-size collection of ions
#[derive(Debug, Clone)]
pub struct IonRegistry {
    ions: Vec<Ion>,
}

impl IonRegistry {
    /// Create `count` ground-state ions centred on the origin along the x axis
    pub fn create_ions(count: usize, spacing: f32, ground_color: [f32; 4]) -> Self {
        let half_span = (count.saturating_sub(1)) as f32 * spacing / 2.0;

        let ions = (0..count)
            .map(|i| Ion {
                id: IonId(i),
                energy_level: EnergyLevel::Ground,
                base_position: Vec3::new(i as f32 * spacing - half_span, 0.0, 0.0),
                is_selected: false,
                color: ground_color,
            })
            .collect();

        Self { ions }
    }

    pub fn get(&self, id: IonId) -> Result<&Ion, TrapError> {
        self.ions.get(id.0).ok_or(TrapError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: IonId) -> Result<&mut Ion, TrapError> {
        self.ions.get_mut(id.0).ok_or(TrapError::NotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ion> {
        self.ions.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Ion> {
        self.ions.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.ions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ions.is_empty()
    }

    /// Energy levels in id order
    pub fn levels(&self) -> Vec<EnergyLevel> {
        self.ions.iter().map(|ion| ion.energy_level).collect()
    }
}
