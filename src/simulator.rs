//! Per-simulation loop: continuous-time event stepping with stop
//! conditions, plus parallel trajectory batches.
//!
//! One simulator owns one ensemble and one seeded RNG stream; given the
//! same seed and inputs, trajectories are bit-reproducible. Parallelism
//! happens only across independent simulators, each with a disjoint
//! ensemble.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ensemble::ComplexEnsemble;
use crate::error::SimResult;
use crate::model::{EnergyModel, StrandComplex};
use crate::report::{DiagnosticSink, TracingSink};
use crate::stopcond::StopCondition;

/// Configuration for one simulation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulated-time budget; reaching it expires the run.
    pub max_sim_time: f64,
    /// Optional hard cap on dispatched events.
    pub max_steps: Option<u64>,
    /// Seed for the uniform deviate stream.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_sim_time: 1.0,
            max_steps: None,
            seed: 0,
        }
    }
}

/// Lifecycle of a simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimulatorState {
    /// Constructed; the ensemble has not been initialized yet.
    Initialized,
    /// At least one event has been considered and no terminal state
    /// reached.
    Running,
    /// A stop condition matched; carries its tag.
    Stopped { tag: String },
    /// The time or step budget ran out with no match.
    Expired,
    /// The ensemble reached total flux zero with no match.
    Unproductive,
    /// A consistency violation aborted the run.
    Error { reason: String },
}

impl SimulatorState {
    /// Whether no further steps will be taken.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SimulatorState::Initialized | SimulatorState::Running)
    }
}

/// Summary of a finished trajectory.
#[derive(Clone, Debug, PartialEq)]
pub struct TrajectoryResult {
    pub state: SimulatorState,
    pub sim_time: f64,
    pub steps: u64,
}

/// One stochastic simulation over one ensemble.
pub struct Simulator<C: StrandComplex, M: EnergyModel> {
    ensemble: ComplexEnsemble<C, M>,
    stop_conditions: Vec<StopCondition>,
    config: SimulationConfig,
    rng: StdRng,
    sim_time: f64,
    steps: u64,
    state: SimulatorState,
    diag: Box<dyn DiagnosticSink + Send>,
}

impl<C: StrandComplex, M: EnergyModel> Simulator<C, M> {
    pub fn new(
        ensemble: ComplexEnsemble<C, M>,
        stop_conditions: Vec<StopCondition>,
        config: SimulationConfig,
    ) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            ensemble,
            stop_conditions,
            config,
            rng,
            sim_time: 0.0,
            steps: 0,
            state: SimulatorState::Initialized,
            diag: Box::new(TracingSink),
        }
    }

    /// Replace the default diagnostic sink.
    pub fn with_diagnostics(mut self, diag: Box<dyn DiagnosticSink + Send>) -> Self {
        self.diag = diag;
        self
    }

    #[inline]
    pub fn state(&self) -> &SimulatorState {
        &self.state
    }

    #[inline]
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[inline]
    pub fn ensemble(&self) -> &ComplexEnsemble<C, M> {
        &self.ensemble
    }

    /// Advance by one event.
    ///
    /// The waiting time is exponential with rate equal to the total flux;
    /// it is drawn and applied before the event itself, so a draw past the
    /// time budget expires the run without dispatching. After a dispatched
    /// event, stop conditions are evaluated in order and the first match
    /// terminates the run. A consistency violation in the dispatcher moves
    /// the machine to the terminal `Error` state rather than escaping as a
    /// raw `Err`. Terminal states are absorbing.
    pub fn step(&mut self) -> SimResult<&SimulatorState> {
        if self.state.is_terminal() {
            return Ok(&self.state);
        }
        if matches!(self.state, SimulatorState::Initialized) {
            self.ensemble.initialize();
            self.state = SimulatorState::Running;
        }

        let total = self.ensemble.total_flux();
        if total <= 0.0 {
            tracing::debug!(sim_time = self.sim_time, "dead state: total flux is zero");
            self.state = SimulatorState::Unproductive;
            return Ok(&self.state);
        }

        let dt = -self.rng.gen::<f64>().ln() / total;
        self.sim_time += dt;
        if self.sim_time >= self.config.max_sim_time {
            self.state = SimulatorState::Expired;
            return Ok(&self.state);
        }

        let choice = self.rng.gen::<f64>() * total;
        let outcome = match self.ensemble.single_step(choice, self.sim_time) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(%err, "consistency violation aborted the simulation");
                self.state = SimulatorState::Error {
                    reason: err.to_string(),
                };
                return Ok(&self.state);
            }
        };
        self.steps += 1;
        tracing::trace!(?outcome, sim_time = self.sim_time, "event dispatched");

        let (conditions, ensemble, diag) =
            (&self.stop_conditions, &self.ensemble, &mut self.diag);
        for condition in conditions {
            if condition.matches(ensemble, &mut **diag) {
                self.state = SimulatorState::Stopped {
                    tag: condition.tag.clone(),
                };
                return Ok(&self.state);
            }
        }

        if let Some(max_steps) = self.config.max_steps {
            if self.steps >= max_steps {
                self.state = SimulatorState::Expired;
            }
        }
        Ok(&self.state)
    }

    /// Step until a terminal state and summarize the trajectory.
    pub fn run(&mut self) -> SimResult<TrajectoryResult> {
        while !self.state.is_terminal() {
            self.step()?;
        }
        Ok(TrajectoryResult {
            state: self.state.clone(),
            sim_time: self.sim_time,
            steps: self.steps,
        })
    }
}

/// Run independent trajectories in parallel.
///
/// The builder receives a derived seed (`seed + i` for trajectory `i`) and
/// must produce a fully configured simulator with its own ensemble and
/// energy model.
pub fn run_trajectories_parallel<C, M, F>(
    build: F,
    n_trajectories: usize,
    seed: u64,
) -> Vec<SimResult<TrajectoryResult>>
where
    C: StrandComplex,
    M: EnergyModel,
    F: Fn(u64) -> Simulator<C, M> + Sync,
{
    (0..n_trajectories)
        .into_par_iter()
        .map(|i| {
            let mut simulator = build(seed.wrapping_add(i as u64));
            simulator.run()
        })
        .collect()
}
