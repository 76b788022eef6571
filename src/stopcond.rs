//! Stop-condition predicates over the live ensemble.
//!
//! A stop condition is a tagged AND-list of macrostates. Each macrostate
//! names the strands of one complex (matched up to circular rotation) and
//! constrains its structure by one of five closed kinds. Loose and Count
//! kinds score a structure against a dot-bracket target with a two-stack
//! disagreement metric that charges every position whose pairing partner
//! differs, not just positions whose characters differ.

use serde::{Deserialize, Serialize};

use crate::ensemble::ComplexEnsemble;
use crate::model::{EnergyModel, StrandComplex, StrandId};
use crate::report::DiagnosticSink;

/// The five macrostate kinds. Serialized names follow the external
/// predicate encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacrostateKind {
    /// Structure string must match exactly.
    #[serde(rename = "STRUCTURE")]
    Exact,
    /// Strand-id match alone suffices.
    #[serde(rename = "DISASSOC")]
    Disassoc,
    /// Disagreement distance within tolerance; `*` wildcards allowed.
    #[serde(rename = "LOOSE_STRUCTURE")]
    Loose,
    /// Disagreement distance within tolerance; every position counts.
    #[serde(rename = "PERCENT_OR_COUNT_STRUCTURE")]
    Count,
    /// Every listed strand is bound somewhere in the ensemble.
    #[serde(rename = "BOUND")]
    Bound,
}

/// One complex-level predicate inside a stop condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Macrostate {
    /// Required strand ids in order; any circular rotation matches.
    pub strand_ids: Vec<StrandId>,
    pub kind: MacrostateKind,
    /// Dot-bracket target; unused for Disassoc and Bound.
    #[serde(default)]
    pub structure: String,
    /// Maximum allowed disagreements for Loose and Count. Percentage
    /// tolerances are converted to counts upstream.
    #[serde(default)]
    pub tolerance: u32,
}

impl Macrostate {
    /// Exact-structure macrostate.
    pub fn exact(strand_ids: Vec<StrandId>, structure: impl Into<String>) -> Self {
        Self {
            strand_ids,
            kind: MacrostateKind::Exact,
            structure: structure.into(),
            tolerance: 0,
        }
    }

    /// Disassociation macrostate: the strand set alone.
    pub fn disassoc(strand_ids: Vec<StrandId>) -> Self {
        Self {
            strand_ids,
            kind: MacrostateKind::Disassoc,
            structure: String::new(),
            tolerance: 0,
        }
    }

    /// Loose-structure macrostate with wildcard support.
    pub fn loose(strand_ids: Vec<StrandId>, structure: impl Into<String>, tolerance: u32) -> Self {
        Self {
            strand_ids,
            kind: MacrostateKind::Loose,
            structure: structure.into(),
            tolerance,
        }
    }

    /// Count-structure macrostate; no wildcards.
    pub fn count(strand_ids: Vec<StrandId>, structure: impl Into<String>, tolerance: u32) -> Self {
        Self {
            strand_ids,
            kind: MacrostateKind::Count,
            structure: structure.into(),
            tolerance,
        }
    }

    /// Bound macrostate over the listed strands.
    pub fn bound(strand_ids: Vec<StrandId>) -> Self {
        Self {
            strand_ids,
            kind: MacrostateKind::Bound,
            structure: String::new(),
            tolerance: 0,
        }
    }

    /// Convert a percentage tolerance to the integer disagreement count
    /// used by Loose and Count matching.
    pub fn percent_tolerance(structure: &str, percent: f64) -> u32 {
        (percent / 100.0 * structure.len() as f64).floor() as u32
    }

    fn matches_complex<C: StrandComplex>(&self, complex: &C) -> bool {
        if !complex.matches_strand_ids(&self.strand_ids) {
            return false;
        }
        match self.kind {
            MacrostateKind::Exact => complex.structure() == self.structure,
            MacrostateKind::Disassoc => true,
            MacrostateKind::Loose => {
                matches_loose_structure(&complex.structure(), &self.structure, self.tolerance)
            }
            MacrostateKind::Count => {
                matches_count_structure(&complex.structure(), &self.structure, self.tolerance)
            }
            // Bound is only meaningful at the head of a condition.
            MacrostateKind::Bound => false,
        }
    }
}

/// A named stop condition: every macrostate must be satisfied by some
/// live complex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StopCondition {
    pub tag: String,
    pub macrostates: Vec<Macrostate>,
}

impl StopCondition {
    pub fn new(tag: impl Into<String>, macrostates: Vec<Macrostate>) -> Self {
        Self {
            tag: tag.into(),
            macrostates,
        }
    }

    /// Test this condition against the live ensemble.
    ///
    /// A head macrostate of kind Bound switches to bound matching, which
    /// supports exactly one macrostate per condition; longer lists are a
    /// configuration error reported on the diagnostic sink.
    pub fn matches<C: StrandComplex, M: EnergyModel>(
        &self,
        ensemble: &ComplexEnsemble<C, M>,
        diag: &mut dyn DiagnosticSink,
    ) -> bool {
        let head = match self.macrostates.first() {
            Some(head) => head,
            None => return false,
        };
        if head.kind == MacrostateKind::Bound {
            self.matches_bound(ensemble, diag)
        } else {
            self.matches_structural(ensemble)
        }
    }

    fn matches_bound<C: StrandComplex, M: EnergyModel>(
        &self,
        ensemble: &ComplexEnsemble<C, M>,
        diag: &mut dyn DiagnosticSink,
    ) -> bool {
        if self.macrostates.len() > 1 {
            diag.error(
                "checking multiple complexes for boundness in one stop condition is not supported",
            );
            return false;
        }
        // Each listed strand must be bound in some live complex; distinct
        // strands may be bound in distinct complexes.
        for &id in &self.macrostates[0].strand_ids {
            let bound = ensemble.entries().any(|entry| entry.complex().strand_bound(id));
            if !bound {
                return false;
            }
        }
        true
    }

    fn matches_structural<C: StrandComplex, M: EnergyModel>(
        &self,
        ensemble: &ComplexEnsemble<C, M>,
    ) -> bool {
        // More macrostates than live complexes can never all be matched,
        // even though a single complex may satisfy several of them.
        if self.macrostates.len() > ensemble.len() {
            return false;
        }
        for macrostate in &self.macrostates {
            let satisfied = ensemble
                .entries()
                .any(|entry| macrostate.matches_complex(entry.complex()));
            if !satisfied {
                return false;
            }
        }
        true
    }
}

/// Loose matching: `*` in the target suppresses the character comparison
/// at that position.
pub fn matches_loose_structure(ours: &str, target: &str, tolerance: u32) -> bool {
    structure_within_distance(ours, target, tolerance, true)
}

/// Count matching: every target character participates.
pub fn matches_count_structure(ours: &str, target: &str, tolerance: u32) -> bool {
    structure_within_distance(ours, target, tolerance, false)
}

/// Single left-to-right pass with one stack of open-paren positions per
/// string. Beyond character mismatches, a `)` closing a differently
/// positioned pair charges the closing position, and the target's opening
/// position is charged once more when our structure also opened there.
/// Exits early once the remaining tolerance goes negative. Mismatched
/// lengths and structurally unbalanced input never match.
fn structure_within_distance(ours: &str, target: &str, tolerance: u32, wildcard: bool) -> bool {
    let ours = ours.as_bytes();
    let target = target.as_bytes();
    if ours.len() != target.len() {
        return false;
    }

    let mut remaining = tolerance as i64;
    let mut our_pairs: Vec<usize> = Vec::new();
    let mut stop_pairs: Vec<usize> = Vec::new();

    for (i, (&o, &s)) in ours.iter().zip(target.iter()).enumerate() {
        if (!wildcard || s != b'*') && o != s {
            remaining -= 1;
        }

        if o == b'(' {
            our_pairs.push(i);
        }
        if s == b'(' {
            stop_pairs.push(i);
        }

        if o == b')' && s == b')' {
            let (our_open, stop_open) = match (our_pairs.pop(), stop_pairs.pop()) {
                (Some(a), Some(b)) => (a, b),
                _ => return false,
            };
            if our_open != stop_open {
                // This closing position is paired wrong, and the target's
                // opening position was a mis-pairing too if we also
                // opened there (the characters agreed, so it was not
                // charged above).
                remaining -= 1;
                if ours[stop_open] == b'(' {
                    remaining -= 1;
                }
            }
        } else {
            if o == b')' && our_pairs.pop().is_none() {
                return false;
            }
            if s == b')' {
                match stop_pairs.pop() {
                    // The closing position itself was already charged by
                    // the character comparison; charge the opening
                    // position if we opened there.
                    Some(stop_open) => {
                        if ours[stop_open] == b'(' {
                            remaining -= 1;
                        }
                    }
                    None => return false,
                }
            }
        }

        if remaining < 0 {
            return false;
        }
    }
    true
}
