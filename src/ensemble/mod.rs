//! Complex ensemble management: the live set of strand complexes, the
//! aggregate join channel, and the per-step event dispatcher.

pub mod dispatch;
pub mod entry;
pub mod join;
pub mod list;

pub use dispatch::StepOutcome;
pub use entry::ComplexEntry;
pub use join::{join_flux, join_move_count, resolve_join, JoinSelection};
pub use list::ComplexEnsemble;
