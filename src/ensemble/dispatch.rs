//! The event dispatcher: one step over the ensemble.
//!
//! A step is a straight-line transaction: the caller draws a uniform
//! deviate in `[0, total_flux)` and the dispatcher routes it either to the
//! aggregate join channel or to a unimolecular move on a single picked
//! complex, then re-establishes the touched caches.

use crate::error::{SimResult, SimulationError};
use crate::model::{EnergyModel, EntryId, StrandComplex};

use super::entry::ComplexEntry;
use super::join;
use super::list::ComplexEnsemble;

/// What a single dispatched step did to the ensemble.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Two complexes merged; no single entry represents the event.
    Joined,
    /// The picked complex rearranged in place.
    Rearranged { entry: EntryId },
    /// The picked complex split; the child entry is the event's result.
    Dissociated { new_entry: EntryId },
}

impl<C: StrandComplex, M: EnergyModel> ComplexEnsemble<C, M> {
    /// Dispatch one event for a deviate `choice ∈ [0, total_flux)`.
    ///
    /// `newtime` is the caller-advanced simulated time of the event; the
    /// dispatcher is time-agnostic and only records it in trace output.
    ///
    /// Must be preceded by a [`total_flux`](Self::total_flux) call so the
    /// cached join flux and entry fluxes reflect the current ensemble.
    /// Deviates below the join flux go to the join channel; the remainder
    /// walks the entries in order with strict `<` against each cached
    /// flux, and the walk stops at the picked entry.
    pub fn single_step(&mut self, choice: f64, newtime: f64) -> SimResult<StepOutcome> {
        tracing::trace!(choice, newtime, "dispatching event");
        let mut residual = choice;
        if residual < self.join_flux {
            self.perform_join_choice(residual)?;
            return Ok(StepOutcome::Joined);
        }
        residual -= self.join_flux;

        let mut picked = None;
        for (index, entry) in self.entries.iter().enumerate() {
            if residual < entry.flux() {
                picked = Some(index);
                break;
            }
            residual -= entry.flux();
        }
        let index = picked.ok_or(SimulationError::EntryWalkOverrun { residual })?;

        let mv = self.entries[index]
            .complex()
            .select_move(&mut residual)
            .ok_or(SimulationError::MoveSelection { residual })?;

        match self.entries[index].complex_mut().apply_move(mv) {
            Some(child) => {
                // Dissociation: the child joins at the head, shifting the
                // picked entry one slot down the walk order.
                let new_entry = self.add(child);
                let (entries, model) = (&mut self.entries, &self.model);
                entries[0].refresh(model);
                entries[index + 1].refresh(model);
                Ok(StepOutcome::Dissociated { new_entry })
            }
            None => {
                let (entries, model) = (&mut self.entries, &self.model);
                entries[index].refresh(model);
                Ok(StepOutcome::Rearranged {
                    entry: entries[index].id(),
                })
            }
        }
    }

    /// Resolve a deviate inside the join channel and perform the join.
    ///
    /// The merged complex is re-homed into the first picked entry, which
    /// keeps its id; the partner entry is unlinked and its complex is
    /// consumed by the join primitive.
    fn perform_join_choice(&mut self, choice: f64) -> SimResult<()> {
        let int_choice = (choice / self.model.join_rate()).floor() as u64;
        let selection = join::resolve_join(&self.entries, int_choice)
            .ok_or(SimulationError::JoinResolution { int_choice })?;
        tracing::debug!(
            first = selection.first,
            second = selection.second,
            types = ?selection.types,
            "join selected"
        );

        // Remove the later entry first so the earlier index stays valid.
        let second = self.entries.remove(selection.second);
        let first = self.entries.remove(selection.first);
        let first_id = first.id();

        let merged = C::perform_join(
            first.into_complex(),
            second.into_complex(),
            selection.types,
            selection.indices,
        );

        let mut entry = ComplexEntry::new(first_id, merged);
        entry.refresh(&self.model);
        self.entries.insert(selection.first, entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BaseCounts;
    use crate::testutil::{FixedEnergyModel, ScriptComplex};

    fn model() -> FixedEnergyModel {
        FixedEnergyModel::new(0.0, 0.0, 1.0)
    }

    fn two_complex_ensemble() -> ComplexEnsemble<ScriptComplex, FixedEnergyModel> {
        let mut ensemble = ComplexEnsemble::new(model());
        ensemble.add(
            ScriptComplex::single("a", 1, "A", ".")
                .with_exterior(BaseCounts::new(1, 0, 0, 0))
                .with_rearrange_move(2.0, "."),
        );
        ensemble.add(
            ScriptComplex::single("t", 2, "T", ".")
                .with_exterior(BaseCounts::new(0, 0, 0, 1))
                .with_rearrange_move(3.0, "."),
        );
        ensemble.initialize();
        ensemble
    }

    #[test]
    fn test_zero_choice_routes_to_join_when_join_flux_positive() {
        let mut ensemble = two_complex_ensemble();
        let total = ensemble.total_flux();
        assert_eq!(total, 6.0);
        assert_eq!(ensemble.join_flux(), 1.0);

        let outcome = ensemble.single_step(0.0, 0.1).unwrap();
        assert_eq!(outcome, StepOutcome::Joined);
        assert_eq!(ensemble.len(), 1);
    }

    #[test]
    fn test_join_rehomes_into_first_picked_entry() {
        let mut ensemble = two_complex_ensemble();
        // Head insertion: walk order is [t (id 1), a (id 0)], so the
        // first picked entry of the join is id 1.
        ensemble.total_flux();
        ensemble.single_step(0.0, 0.1).unwrap();

        let survivor = ensemble.entries().next().unwrap();
        assert_eq!(survivor.id(), 1);
        assert_eq!(survivor.complex().strand_count(), 2);
        // The joined pair consumed both exterior bases.
        assert_eq!(survivor.complex().exterior_bases().total(), 0);
    }

    #[test]
    fn test_choice_past_join_flux_picks_unimolecular_move() {
        let mut ensemble = two_complex_ensemble();
        ensemble.total_flux();
        // join_flux = 1.0; walk order fluxes are [3.0 (id 1), 2.0 (id 0)].
        // choice 1.5 → residual 0.5 < 3.0 picks the head entry.
        let outcome = ensemble.single_step(1.5, 0.1).unwrap();
        assert_eq!(outcome, StepOutcome::Rearranged { entry: 1 });
        assert_eq!(ensemble.len(), 2);
    }

    #[test]
    fn test_boundary_residual_moves_to_next_entry() {
        let mut ensemble = two_complex_ensemble();
        ensemble.total_flux();
        // residual exactly equal to the head flux is not picked there:
        // 4.0 − 1.0 = 3.0, and 3.0 < 3.0 is false, so the walk moves on.
        let outcome = ensemble.single_step(4.0, 0.1).unwrap();
        assert_eq!(outcome, StepOutcome::Rearranged { entry: 0 });
    }

    #[test]
    fn test_single_complex_never_joins() {
        let mut ensemble = ComplexEnsemble::new(model());
        ensemble.add(
            ScriptComplex::single("solo", 1, "ACGT", "....")
                .with_exterior(BaseCounts::new(1, 1, 1, 1))
                .with_rearrange_move(1.0, "(..)"),
        );
        ensemble.initialize();

        let total = ensemble.total_flux();
        assert_eq!(ensemble.join_flux(), 0.0);
        assert_eq!(total, 1.0);

        let outcome = ensemble.single_step(0.0, 0.1).unwrap();
        assert!(matches!(outcome, StepOutcome::Rearranged { .. }));
    }

    #[test]
    fn test_dissociation_inserts_child_at_head_and_refreshes_both() {
        let child = ScriptComplex::single("b", 2, "CCC", "...")
            .with_rearrange_move(0.5, "...");
        let remain = ScriptComplex::single("a", 1, "AAA", "...")
            .with_rearrange_move(1.5, "...");
        let parent = ScriptComplex::new("a,b", vec![1, 2], "AAA+CCC", "...+...")
            .with_split_move(2.0, remain, child);

        let mut ensemble = ComplexEnsemble::new(model());
        let parent_id = ensemble.add(parent);
        ensemble.initialize();
        ensemble.total_flux();

        let outcome = ensemble.single_step(0.5, 0.1).unwrap();
        let new_entry = match outcome {
            StepOutcome::Dissociated { new_entry } => new_entry,
            other => panic!("expected dissociation, got {:?}", other),
        };

        assert_eq!(ensemble.len(), 2);
        let order: Vec<_> = ensemble.entries().map(|e| e.id()).collect();
        assert_eq!(order, vec![new_entry, parent_id]);
        // Both touched entries carry fresh caches.
        assert_eq!(ensemble.entry(new_entry).unwrap().flux(), 0.5);
        assert_eq!(ensemble.entry(parent_id).unwrap().flux(), 1.5);
    }

    #[test]
    fn test_walk_overrun_is_an_error() {
        let mut ensemble = two_complex_ensemble();
        let total = ensemble.total_flux();
        let result = ensemble.single_step(total + 1.0, 0.1);
        assert!(matches!(
            result,
            Err(SimulationError::EntryWalkOverrun { .. })
        ));
    }
}
