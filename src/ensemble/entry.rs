//! One ensemble entry: an owned complex plus its cached scalars.

use crate::model::{EnergyModel, EntryId, StrandComplex};

/// Wraps one live complex with its insertion id and the cached energy and
/// flux used by event selection.
///
/// The entry exclusively owns its complex; removing the entry from the
/// ensemble drops the complex with it. Caches start at zero and are only
/// meaningful after [`refresh`](ComplexEntry::refresh) has run.
#[derive(Clone, Debug)]
pub struct ComplexEntry<C> {
    id: EntryId,
    complex: C,
    energy: f64,
    flux: f64,
}

impl<C: StrandComplex> ComplexEntry<C> {
    pub(crate) fn new(id: EntryId, complex: C) -> Self {
        Self {
            id,
            complex,
            energy: 0.0,
            flux: 0.0,
        }
    }

    /// Id assigned at insertion; unique for the lifetime of the run.
    #[inline]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// The owned complex.
    #[inline]
    pub fn complex(&self) -> &C {
        &self.complex
    }

    /// Cached energy including volume and association corrections.
    #[inline]
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Cached total unimolecular flux out of the complex.
    #[inline]
    pub fn flux(&self) -> f64 {
        self.flux
    }

    pub(crate) fn complex_mut(&mut self) -> &mut C {
        &mut self.complex
    }

    pub(crate) fn into_complex(self) -> C {
        self.complex
    }

    /// Run the complex's initialization hooks.
    pub(crate) fn initialize(&mut self) {
        self.complex.generate_loops();
        self.complex.display_moves();
    }

    /// Repopulate the cached scalars from the complex and the energy
    /// model. The volume and association corrections scale with the
    /// number of excess strands.
    pub(crate) fn refresh<M: EnergyModel>(&mut self, model: &M) {
        let excess = self.complex.strand_count() as f64 - 1.0;
        self.energy = self.complex.energy() + (model.volume_energy() + model.assoc_energy()) * excess;
        self.flux = self.complex.total_flux();
    }
}
