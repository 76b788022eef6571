//! Diagnostics and energy reporting.
//!
//! The diagnostic channel is an injected writer, never a process-wide
//! stream; the default sink forwards to the `tracing` subscriber. Energy
//! reporting follows a two-bit convention selecting which per-excess-strand
//! corrections stay in the emitted values.

use serde::Serialize;

use crate::model::EntryId;

/// Injected sink for configuration diagnostics raised during evaluation.
pub trait DiagnosticSink {
    /// Report a configuration error.
    fn error(&mut self, message: &str);
}

/// Default sink: emit through the `tracing` subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn error(&mut self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Which corrections remain in emitted energies.
///
/// Bit 0 keeps the volume correction, bit 1 the association correction;
/// cleared bits are subtracted back out of the cached value. With both
/// bits set the cached energy is reported as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnergyView {
    pub include_volume: bool,
    pub include_assoc: bool,
}

impl EnergyView {
    /// Decode the two-bit flag.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            include_volume: bits & 0b01 != 0,
            include_assoc: bits & 0b10 != 0,
        }
    }

    /// Encode back to the two-bit flag.
    pub fn bits(self) -> u8 {
        (self.include_volume as u8) | ((self.include_assoc as u8) << 1)
    }
}

impl Default for EnergyView {
    /// The cached value as-is: both corrections included.
    fn default() -> Self {
        Self::from_bits(0b11)
    }
}

/// Snapshot of one ensemble entry for external reporting.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntryReport {
    pub id: EntryId,
    pub names: String,
    pub sequence: String,
    pub structure: String,
    pub energy: f64,
}
