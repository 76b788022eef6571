//! Aggregate bimolecular join flux and its resolution to a concrete join.
//!
//! All external-base pairings between distinct complexes form a single
//! reaction channel. The aggregate move count is computed in two linear
//! passes over the entries, and a uniform deviate inside the channel is
//! resolved back to a specific (complex, base, complex, base) join by
//! replaying the second pass.

use crate::model::{BaseCounts, BaseType, StrandComplex};

use super::entry::ComplexEntry;

/// Watson–Crick pairing channels in resolution order. For a channel
/// `(x, y)`, `x` is drawn from the totals of the *later* entries and `y`
/// from the entry currently being visited.
const CHANNELS: [(BaseType, BaseType); 4] = [
    (BaseType::A, BaseType::T),
    (BaseType::T, BaseType::A),
    (BaseType::G, BaseType::C),
    (BaseType::C, BaseType::G),
];

/// A resolved bimolecular join: entry indices in walk order
/// (`first < second`), the base types consumed on each side, and the
/// exterior-base offsets selecting the concrete bases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinSelection {
    pub first: usize,
    pub second: usize,
    pub types: [BaseType; 2],
    pub indices: [usize; 2],
}

fn exterior_totals<C: StrandComplex>(entries: &[ComplexEntry<C>]) -> BaseCounts {
    let mut totals = BaseCounts::default();
    for entry in entries {
        totals.accumulate(&entry.complex().exterior_bases());
    }
    totals
}

/// Number of distinct bimolecular pairing moves available to the ensemble.
///
/// Pass 1 sums exterior bases over all entries; pass 2 visits entries in
/// walk order, first subtracting the visited entry's tally from the totals
/// so that only *later* entries contribute, then accumulating the
/// complementary pairings. Each ordered pair of distinct complexes is
/// counted exactly once per pairing.
pub fn join_move_count<C: StrandComplex>(entries: &[ComplexEntry<C>]) -> u64 {
    if entries.len() <= 1 {
        return 0;
    }

    let mut totals = exterior_totals(entries);
    let mut count = 0u64;
    for entry in entries {
        let ext = entry.complex().exterior_bases();
        totals.subtract(&ext);
        count += totals.complement_pairings(&ext);
    }
    count
}

/// Aggregate join flux: the pairing move count scaled by the per-event
/// join rate. Identically zero for ensembles of one complex, and exactly
/// `0.0` when no complementary exterior bases exist.
pub fn join_flux<C: StrandComplex>(entries: &[ComplexEntry<C>], k_join: f64) -> f64 {
    let count = join_move_count(entries);
    if count == 0 {
        // Multi-complex ensembles with no complementary exterior bases are
        // common; the flux must be exactly zero, not a rounded product.
        0.0
    } else {
        count as f64 * k_join
    }
}

/// Resolve an integer choice in `[0, join_move_count)` to a concrete join.
///
/// Replays pass 2: at each entry the four channels are tested in order;
/// channel `(x, y)` spans a window of `totals[x] · ext[y]` moves. Within a
/// hit, the later entries are walked with per-partner sub-windows of
/// `partner[x] · ext[y]`, and the remainder picks the base offsets on each
/// side. Deterministic given the choice and the entry order.
///
/// Returns `None` only if the choice lies outside the aggregate window,
/// which callers treat as an internal consistency violation.
pub fn resolve_join<C: StrandComplex>(
    entries: &[ComplexEntry<C>],
    mut int_choice: u64,
) -> Option<JoinSelection> {
    if entries.len() <= 1 {
        return None;
    }

    let mut totals = exterior_totals(entries);
    for (i, entry) in entries.iter().enumerate() {
        let ext = entry.complex().exterior_bases();
        totals.subtract(&ext);

        for &(x, y) in CHANNELS.iter() {
            let window = totals.count(x) as u64 * ext.count(y) as u64;
            if int_choice < window {
                // This entry supplies base type `y`; walk the later
                // entries to find the partner supplying `x`.
                for (j, partner) in entries.iter().enumerate().skip(i + 1) {
                    let partner_x = partner.complex().exterior_bases().count(x) as u64;
                    let sub_window = partner_x * ext.count(y) as u64;
                    if int_choice < sub_window {
                        let first_offset = (int_choice / partner_x) as usize;
                        let second_offset = (int_choice - first_offset as u64 * partner_x) as usize;
                        return Some(JoinSelection {
                            first: i,
                            second: j,
                            types: [y, x],
                            indices: [first_offset, second_offset],
                        });
                    }
                    int_choice -= sub_window;
                }
                // The channel window claimed the choice but no partner
                // absorbed it: the tallies changed mid-resolution.
                return None;
            }
            int_choice -= window;
        }
    }
    None
}
