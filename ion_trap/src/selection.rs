//! Ion selection bookkeeping
//!
//! Holds at most [`MAX_SELECTION`] ion ids and mirrors membership into each
//! ion's `is_selected` highlight flag.

use crate::constants::MAX_SELECTION;
use crate::error::TrapError;
use crate::ion::{IonId, IonRegistry};
use std::collections::BTreeSet;

/// Result of a successful toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Selected(IonId),
    Deselected(IonId),
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    // BTreeSet keeps ids ascending, which is the tie-break every consumer uses
    selected: BTreeSet<IonId>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if absent and there is room, remove it if present
    pub fn toggle(&mut self, ions: &mut IonRegistry, id: IonId) -> Result<SelectionChange, TrapError> {
        let ion = ions.get_mut(id)?;

        if self.selected.remove(&id) {
            ion.is_selected = false;
            return Ok(SelectionChange::Deselected(id));
        }

        if self.selected.len() >= MAX_SELECTION {
            return Err(TrapError::SelectionFull {
                capacity: MAX_SELECTION,
            });
        }

        self.selected.insert(id);
        ion.is_selected = true;
        Ok(SelectionChange::Selected(id))
    }

    /// Deselect a single ion; returns whether it was selected
    pub fn remove(&mut self, ions: &mut IonRegistry, id: IonId) -> bool {
        let was_selected = self.selected.remove(&id);
        if let Ok(ion) = ions.get_mut(id) {
            ion.is_selected = false;
        }
        was_selected
    }

    /// Empty the selection and clear every highlight it held
    pub fn clear(&mut self, ions: &mut IonRegistry) {
        for id in std::mem::take(&mut self.selected) {
            if let Ok(ion) = ions.get_mut(id) {
                ion.is_selected = false;
            }
        }
    }

    /// Selected ids in ascending order
    pub fn current(&self) -> Vec<IonId> {
        self.selected.iter().copied().collect()
    }

    pub fn contains(&self, id: IonId) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Rank of `id` within the ascending selection
    pub fn phase_index(&self, id: IonId) -> Option<usize> {
        self.selected.iter().position(|&s| s == id)
    }
}
