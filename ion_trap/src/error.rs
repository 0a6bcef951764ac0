//! Error types for the trap core
//!
//! Every variant is a rejected user input: the triggering call returns before
//! touching any state, and the app shows the message as a blocking notice.

use crate::ion::IonId;
use thiserror::Error;

/// Errors reported by selection and operation calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrapError {
    /// A pulse was requested with no ion selected.
    #[error("select at least one ion before applying a pulse")]
    NoSelection,

    /// Entangle needs exactly two selected ions.
    #[error("entangling requires exactly 2 selected ions, {selected} selected")]
    InvalidSelectionCount {
        /// Number of ions selected when the call was made.
        selected: usize,
    },

    /// The selection already holds its maximum number of ions.
    #[error("at most {capacity} ions can be selected at once")]
    SelectionFull {
        /// Selection capacity.
        capacity: usize,
    },

    /// No ion with this id exists in the chain.
    #[error("ion {0} not found")]
    NotFound(IonId),
}
