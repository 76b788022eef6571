//! Scripted stand-ins for the external collaborators, used across the
//! crate's unit tests.
//!
//! `ScriptComplex` satisfies the complex contract with a fixed exterior
//! tally and a hand-written move list, so ensemble bookkeeping, event
//! selection, and stop conditions can be exercised deterministically
//! without a real energy model or move enumerator.

use crate::model::{BaseCounts, BaseType, EnergyModel, StrandComplex, StrandId};
use crate::report::DiagnosticSink;

/// Energy model with fixed corrections and join rate.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FixedEnergyModel {
    volume: f64,
    assoc: f64,
    k_join: f64,
}

impl FixedEnergyModel {
    pub(crate) fn new(volume: f64, assoc: f64, k_join: f64) -> Self {
        Self {
            volume,
            assoc,
            k_join,
        }
    }
}

impl EnergyModel for FixedEnergyModel {
    fn volume_energy(&self) -> f64 {
        self.volume
    }

    fn assoc_energy(&self) -> f64 {
        self.assoc
    }

    fn join_rate(&self) -> f64 {
        self.k_join
    }
}

/// Diagnostic sink that records every message.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingSink {
    pub(crate) messages: Vec<String>,
}

impl DiagnosticSink for RecordingSink {
    fn error(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// What applying a scripted move does to the complex.
#[derive(Clone, Debug)]
enum MoveAction {
    /// Rewrite the structure string in place.
    Rearrange(String),
    /// Replace the whole complex with the next scripted state.
    Become(Box<ScriptComplex>),
    /// Split: this complex becomes `remain` and `child` is released.
    Split {
        remain: Box<ScriptComplex>,
        child: Box<ScriptComplex>,
    },
}

#[derive(Clone, Debug)]
struct ScriptedMove {
    rate: f64,
    action: MoveAction,
}

/// A deterministic, scriptable complex.
#[derive(Clone, Debug)]
pub(crate) struct ScriptComplex {
    names: String,
    strand_ids: Vec<StrandId>,
    sequence: String,
    structure: String,
    energy: f64,
    exterior: BaseCounts,
    moves: Vec<ScriptedMove>,
    bound_strands: Vec<StrandId>,
    phantom_flux: f64,
}

impl ScriptComplex {
    pub(crate) fn new(
        names: &str,
        strand_ids: Vec<StrandId>,
        sequence: &str,
        structure: &str,
    ) -> Self {
        Self {
            names: names.to_string(),
            strand_ids,
            sequence: sequence.to_string(),
            structure: structure.to_string(),
            energy: 0.0,
            exterior: BaseCounts::default(),
            moves: Vec::new(),
            bound_strands: Vec::new(),
            phantom_flux: 0.0,
        }
    }

    /// Single-strand complex.
    pub(crate) fn single(name: &str, id: StrandId, sequence: &str, structure: &str) -> Self {
        Self::new(name, vec![id], sequence, structure)
    }

    pub(crate) fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy;
        self
    }

    pub(crate) fn with_exterior(mut self, exterior: BaseCounts) -> Self {
        self.exterior = exterior;
        self
    }

    pub(crate) fn with_bound_strands(mut self, bound: Vec<StrandId>) -> Self {
        self.bound_strands = bound;
        self
    }

    /// Report flux beyond what the move list backs, breaking the complex
    /// contract on purpose so consistency-violation paths can be tested.
    pub(crate) fn with_phantom_flux(mut self, flux: f64) -> Self {
        self.phantom_flux = flux;
        self
    }

    /// Add a move that rewrites the structure in place.
    pub(crate) fn with_rearrange_move(mut self, rate: f64, structure: &str) -> Self {
        self.moves.push(ScriptedMove {
            rate,
            action: MoveAction::Rearrange(structure.to_string()),
        });
        self
    }

    /// Add a move that replaces the complex with the next scripted state.
    pub(crate) fn with_become_move(mut self, rate: f64, next: ScriptComplex) -> Self {
        self.moves.push(ScriptedMove {
            rate,
            action: MoveAction::Become(Box::new(next)),
        });
        self
    }

    /// Add a dissociation move.
    pub(crate) fn with_split_move(
        mut self,
        rate: f64,
        remain: ScriptComplex,
        child: ScriptComplex,
    ) -> Self {
        self.moves.push(ScriptedMove {
            rate,
            action: MoveAction::Split {
                remain: Box::new(remain),
                child: Box::new(child),
            },
        });
        self
    }
}

impl StrandComplex for ScriptComplex {
    type Move = usize;

    fn generate_loops(&mut self) {}

    fn total_flux(&self) -> f64 {
        self.moves.iter().map(|m| m.rate).sum::<f64>() + self.phantom_flux
    }

    fn energy(&self) -> f64 {
        self.energy
    }

    fn strand_count(&self) -> usize {
        self.strand_ids.len()
    }

    fn exterior_bases(&self) -> BaseCounts {
        self.exterior
    }

    fn structure(&self) -> String {
        self.structure.clone()
    }

    fn strand_names(&self) -> String {
        self.names.clone()
    }

    fn sequence(&self) -> String {
        self.sequence.clone()
    }

    fn select_move(&self, residual: &mut f64) -> Option<usize> {
        for (index, mv) in self.moves.iter().enumerate() {
            if *residual < mv.rate {
                return Some(index);
            }
            *residual -= mv.rate;
        }
        None
    }

    fn apply_move(&mut self, mv: usize) -> Option<Self> {
        match self.moves[mv].action.clone() {
            MoveAction::Rearrange(structure) => {
                self.structure = structure;
                None
            }
            MoveAction::Become(next) => {
                *self = *next;
                None
            }
            MoveAction::Split { remain, child } => {
                *self = *remain;
                Some(*child)
            }
        }
    }

    fn strand_bound(&self, id: StrandId) -> bool {
        self.bound_strands.contains(&id)
    }

    fn matches_strand_ids(&self, ids: &[StrandId]) -> bool {
        let n = self.strand_ids.len();
        if ids.len() != n {
            return false;
        }
        if n == 0 {
            return true;
        }
        (0..n).any(|rotation| (0..n).all(|k| self.strand_ids[(rotation + k) % n] == ids[k]))
    }

    fn perform_join(
        first: Self,
        second: Self,
        types: [BaseType; 2],
        _indices: [usize; 2],
    ) -> Self {
        let mut exterior = first.exterior;
        exterior.accumulate(&second.exterior);
        exterior.decrement(types[0]);
        exterior.decrement(types[1]);

        let mut strand_ids = first.strand_ids;
        strand_ids.extend(second.strand_ids);
        let bound_strands = strand_ids.clone();

        let mut moves = first.moves;
        moves.extend(second.moves);

        Self {
            names: format!("{},{}", first.names, second.names),
            strand_ids,
            sequence: format!("{}+{}", first.sequence, second.sequence),
            structure: format!("{}+{}", first.structure, second.structure),
            energy: first.energy + second.energy,
            exterior,
            moves,
            bound_strands,
            phantom_flux: first.phantom_flux + second.phantom_flux,
        }
    }
}
