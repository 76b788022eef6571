//! Error type for the simulation core.
//!
//! Only internal consistency violations are errors: either a step commits
//! or the simulation is aborted. The dispatcher surfaces them as `Err`;
//! the simulator converts them into the terminal
//! [`SimulatorState::Error`](crate::simulator::SimulatorState) so drivers
//! always observe an absorbing state. Dead states and expired time budgets
//! are ordinary terminal outcomes, not errors.

use thiserror::Error;

/// Unrecoverable per-step failures surfaced to the driver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// The dispatcher walked past the last ensemble entry without the
    /// residual rate budget selecting a complex.
    #[error("event selection walked past the last entry with residual budget {residual}")]
    EntryWalkOverrun { residual: f64 },

    /// A picked complex reported no move for a budget below its cached
    /// flux, meaning its cache and its move enumeration disagree.
    #[error("picked complex produced no move for residual budget {residual}")]
    MoveSelection { residual: f64 },

    /// The integer join budget did not land in any pairing window even
    /// though it was below the aggregate join flux.
    #[error("join choice {int_choice} landed outside every pairing window")]
    JoinResolution { int_choice: u64 },
}

pub type SimResult<T> = Result<T, SimulationError>;
