//! Tensor-product label of the chain state
//!
//! Each ion contributes one ket in id order, e.g. `|0⟩ ⊗ |1⟩ ⊗ |+⟩`. The label is
//! cosmetic: it is built from the per-ion levels, not from an amplitude vector.

use crate::ion::{EnergyLevel, IonRegistry};

pub const GROUND_SYMBOL: &str = "|0⟩";
pub const EXCITED_SYMBOL: &str = "|1⟩";
pub const SUPERPOSITION_SYMBOL: &str = "|+⟩";
pub const UNKNOWN_SYMBOL: &str = "|?⟩";
pub const TENSOR_SEPARATOR: &str = " ⊗ ";

/// Ket for a numeric level value; anything outside {0, 0.5, 1} renders as unknown
pub fn symbol_for_value(value: f32) -> &'static str {
    match EnergyLevel::from_value(value) {
        Some(level) => symbol(level),
        None => UNKNOWN_SYMBOL,
    }
}

pub fn symbol(level: EnergyLevel) -> &'static str {
    match level {
        EnergyLevel::Ground => GROUND_SYMBOL,
        EnergyLevel::Excited => EXCITED_SYMBOL,
        EnergyLevel::Superposition => SUPERPOSITION_SYMBOL,
    }
}

fn latex_symbol(value: f32) -> &'static str {
    match EnergyLevel::from_value(value) {
        Some(EnergyLevel::Ground) => r"|0\rangle",
        Some(EnergyLevel::Excited) => r"|1\rangle",
        Some(EnergyLevel::Superposition) => r"|+\rangle",
        None => r"|?\rangle",
    }
}

/// Build the composite label from level values in id order
pub fn render_values(values: &[f32]) -> String {
    values
        .iter()
        .map(|&v| symbol_for_value(v))
        .collect::<Vec<_>>()
        .join(TENSOR_SEPARATOR)
}

/// Current label plus a revision counter for surfaces that re-render on change
#[derive(Debug, Clone, Default)]
pub struct StateDisplay {
    label: String,
    latex: String,
    revision: u64,
}

impl StateDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the label from the registry and publish it
    pub fn render(&mut self, ions: &IonRegistry) -> &str {
        let values: Vec<f32> = ions.iter().map(|ion| ion.energy_level.value()).collect();
        self.label = render_values(&values);
        self.latex = values
            .iter()
            .map(|&v| latex_symbol(v))
            .collect::<Vec<_>>()
            .join(r" \otimes ");
        self.revision += 1;
        log::debug!("State label: {}", self.label);
        &self.label
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The same label as LaTeX markup
    pub fn latex(&self) -> &str {
        &self.latex
    }

    /// Incremented on every render
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ion::IonId;

    #[test]
    fn mixed_levels_in_id_order() {
        assert_eq!(render_values(&[0.0, 1.0, 0.5]), "|0⟩ ⊗ |1⟩ ⊗ |+⟩");
    }

    #[test]
    fn unexpected_value_is_unknown() {
        assert_eq!(render_values(&[0.0, 0.3]), "|0⟩ ⊗ |?⟩");
    }

    #[test]
    fn single_ion_has_no_separator() {
        assert_eq!(render_values(&[1.0]), EXCITED_SYMBOL);
    }

    #[test]
    fn render_reads_registry_and_bumps_revision() {
        let mut ions = IonRegistry::create_ions(3, 1.0, [0.0; 4]);
        ions.get_mut(IonId(1)).unwrap().energy_level = EnergyLevel::Excited;
        ions.get_mut(IonId(2)).unwrap().energy_level = EnergyLevel::Superposition;

        let mut display = StateDisplay::new();
        assert_eq!(display.render(&ions), "|0⟩ ⊗ |1⟩ ⊗ |+⟩");
        assert_eq!(display.latex(), r"|0\rangle \otimes |1\rangle \otimes |+\rangle");
        assert_eq!(display.revision(), 1);

        display.render(&ions);
        assert_eq!(display.revision(), 2);
    }
}
