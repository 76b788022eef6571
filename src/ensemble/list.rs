//! The ensemble manager: the ordered collection of live complexes.
//!
//! Entries sit in head-insertion order, newest first. The walk order
//! drives event selection and the head-to-tail floating-point accumulation
//! in [`total_flux`], so it is load-bearing for seeded reproducibility
//! even though callers only ever see the iteration and mutation
//! operations.
//!
//! [`total_flux`]: ComplexEnsemble::total_flux

use std::io;

use crate::model::{EnergyModel, EntryId, StrandComplex};
use crate::report::{EnergyView, EntryReport};

use super::entry::ComplexEntry;
use super::join;

/// The set of live strand complexes plus the cached aggregate join rate.
#[derive(Clone, Debug)]
pub struct ComplexEnsemble<C, M> {
    pub(crate) entries: Vec<ComplexEntry<C>>,
    pub(crate) join_flux: f64,
    pub(crate) model: M,
    next_id: EntryId,
}

impl<C: StrandComplex, M: EnergyModel> ComplexEnsemble<C, M> {
    /// Create an empty ensemble backed by the given energy model.
    pub fn new(model: M) -> Self {
        Self {
            entries: Vec::new(),
            join_flux: 0.0,
            model,
            next_id: 0,
        }
    }

    /// Insert a complex at the head of the walk order with a fresh id.
    ///
    /// Caches are not populated; call [`initialize`](Self::initialize) or
    /// [`refresh_entry`](Self::refresh_entry) before the entry takes part
    /// in event selection.
    pub fn add(&mut self, complex: C) -> EntryId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(0, ComplexEntry::new(id, complex));
        tracing::debug!(id, live = self.entries.len(), "complex added to ensemble");
        id
    }

    /// Run every entry's initialization hooks and populate its caches.
    pub fn initialize(&mut self) {
        let (entries, model) = (&mut self.entries, &self.model);
        for entry in entries.iter_mut() {
            entry.initialize();
            entry.refresh(model);
        }
    }

    /// Repopulate one entry's caches. Returns false if the id is not live.
    pub fn refresh_entry(&mut self, id: EntryId) -> bool {
        let (entries, model) = (&mut self.entries, &self.model);
        match entries.iter_mut().find(|e| e.id() == id) {
            Some(entry) => {
                entry.refresh(model);
                true
            }
            None => false,
        }
    }

    /// Sum of all cached entry fluxes plus the aggregate join flux.
    ///
    /// The join flux is re-derived from the current exterior-base tallies
    /// on every call and cached for the dispatcher. Entry fluxes are
    /// accumulated head-to-tail; the addition order is part of the
    /// reproducibility contract.
    pub fn total_flux(&mut self) -> f64 {
        let mut total = 0.0;
        for entry in &self.entries {
            total += entry.flux();
        }
        self.join_flux = join::join_flux(&self.entries, self.model.join_rate());
        total + self.join_flux
    }

    /// The join flux cached by the last [`total_flux`](Self::total_flux)
    /// call.
    #[inline]
    pub fn join_flux(&self) -> f64 {
        self.join_flux
    }

    /// Unlink an entry and take back its complex. Returns `None` if the id
    /// is not live.
    pub fn remove(&mut self, id: EntryId) -> Option<C> {
        let index = self.entries.iter().position(|e| e.id() == id)?;
        let entry = self.entries.remove(index);
        tracing::debug!(id, live = self.entries.len(), "complex removed from ensemble");
        Some(entry.into_complex())
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ensemble holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stable walk over the live entries, newest first. No mutation may
    /// happen during the walk.
    pub fn entries(&self) -> impl Iterator<Item = &ComplexEntry<C>> {
        self.entries.iter()
    }

    /// Look up a live entry by id.
    pub fn entry(&self, id: EntryId) -> Option<&ComplexEntry<C>> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// The energy model backing this ensemble.
    #[inline]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Per-entry energies under the given reporting convention. Each bit
    /// of the view keeps the corresponding correction in the cached value;
    /// cleared bits subtract it back out.
    pub fn energies(&self, view: EnergyView) -> Vec<f64> {
        self.entries
            .iter()
            .map(|entry| {
                let excess = entry.complex().strand_count() as f64 - 1.0;
                let mut energy = entry.energy();
                if !view.include_volume {
                    energy -= self.model.volume_energy() * excess;
                }
                if !view.include_assoc {
                    energy -= self.model.assoc_energy() * excess;
                }
                energy
            })
            .collect()
    }

    /// Snapshot every entry as a serializable report record.
    pub fn dump_entries(&self) -> Vec<EntryReport> {
        self.entries
            .iter()
            .map(|entry| EntryReport {
                id: entry.id(),
                names: entry.complex().strand_names(),
                sequence: entry.complex().sequence(),
                structure: entry.complex().structure(),
                energy: entry.energy(),
            })
            .collect()
    }

    /// Pretty-print every entry under the given energy convention.
    pub fn write_pretty<W: io::Write>(&self, w: &mut W, view: EnergyView) -> io::Result<()> {
        for (entry, energy) in self.entries.iter().zip(self.energies(view)) {
            writeln!(w, "Complex {:02}: {}", entry.id(), entry.complex().strand_names())?;
            writeln!(w, "          : {}", entry.complex().sequence())?;
            writeln!(w, "          : {}", entry.complex().structure())?;
            writeln!(
                w,
                "          : Energy: ({:.6}) TotalFlux: {:.2}",
                energy,
                entry.flux()
            )?;
        }
        Ok(())
    }
}
