//! Stochastic state-ensemble simulation of interacting nucleic-acid
//! strands at the secondary-structure level.
//!
//! The core is a continuous-time kinetic Monte Carlo loop over an
//! ensemble of strand complexes:
//! - [`ensemble`]: the live complex collection, cached rate accounting,
//!   the aggregate bimolecular join channel, and the per-step event
//!   dispatcher.
//! - [`stopcond`]: structural macrostate predicates evaluated against the
//!   ensemble after every move.
//! - [`simulator`]: the per-run state machine with exponential waiting
//!   times and a rayon-parallel batch runner for independent trajectories.
//!
//! The energy model and the per-complex move enumeration are external
//! collaborators behind the traits in [`model`]; the simulator never looks
//! inside a complex beyond that contract. Given a seed, trajectories are
//! bit-reproducible: event selection depends only on the ensemble walk
//! order, the exterior-base tallies, and the uniform deviate stream.

pub mod ensemble;
pub mod error;
pub mod model;
pub mod report;
pub mod simulator;
pub mod stopcond;

#[cfg(test)]
pub(crate) mod testutil;

pub use ensemble::{
    join_flux, join_move_count, resolve_join, ComplexEnsemble, ComplexEntry, JoinSelection,
    StepOutcome,
};
pub use error::{SimResult, SimulationError};
pub use model::{BaseCounts, BaseType, EnergyModel, EntryId, StrandComplex, StrandId};
pub use report::{DiagnosticSink, EnergyView, EntryReport, TracingSink};
pub use simulator::{
    run_trajectories_parallel, SimulationConfig, Simulator, SimulatorState, TrajectoryResult,
};
pub use stopcond::{
    matches_count_structure, matches_loose_structure, Macrostate, MacrostateKind, StopCondition,
};
