use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::canonical::{canonical_fingerprint, Fingerprint};
use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::generator::{GraphSource, first_admissible};
use crate::graph::Graph;
use crate::graph6::to_graph6;
use crate::mutation::MutationEngine;
use crate::oracle::PackingOracle;
use crate::search::{
    CancellationToken, Cursor, Record, SearchError, SearchOutcome, SearchReport, SearchState,
    best_effort_checkpoint,
};

/// parameters of the random walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomWalkParams {
    /// number of vertices of every graph of the walk
    pub initial_vertices: usize,
    /// total number of iterations (including the ones of previous runs)
    pub iterations: usize,
    /// a checkpoint is written every save_interval iterations
    pub save_interval: usize,
    /// seed of the mutation engine
    pub seed: u64,
}

impl Default for RandomWalkParams {
    fn default() -> Self {
        Self { initial_vertices: 10, iterations: 1000, save_interval: 100, seed: 0 }
    }
}

/** random walk through planar subcubic connected graphs of a fixed order.

Each iteration mutates the current graph. The candidate is discarded if an isomorphic graph was
already visited during this run, or if the oracle fails on it. Otherwise it is scored, recorded,
and becomes the current graph. Every iteration counts towards the budget, whatever happened
to its candidate.

The set of visited graphs lives in memory only: a resumed walk starts with the current graph and
the best graphs as visited. The mutation engine of a resumed walk is seeded with
seed + iteration.
*/
pub struct RandomWalk<'a> {
    /// initial graph
    source: &'a dyn GraphSource,
    /// packing coloring number
    oracle: &'a dyn PackingOracle,
    /// where the state is saved
    store: &'a mut dyn CheckpointStore,
    /// walk parameters
    params: RandomWalkParams,
    /// stops the walk (after a checkpoint)
    cancel: CancellationToken,
}

impl<'a> fmt::Debug for RandomWalk<'a> {
    fn fmt(&self, f:&mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomWalk")
            .field("params", &self.params)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl<'a> RandomWalk<'a> {
    /// random walk (never cancelled unless with_cancellation is called)
    pub fn new(
        source:&'a dyn GraphSource,
        oracle:&'a dyn PackingOracle,
        store:&'a mut dyn CheckpointStore,
        params:RandomWalkParams,
    ) -> Self {
        Self { source, oracle, store, params, cancel: CancellationToken::new() }
    }

    /// uses the given cancellation token
    pub fn with_cancellation(mut self, cancel:CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /** runs (or resumes) the walk until the iteration budget is spent or the walk is cancelled.
    Duplicates and oracle failures are skipped. Other errors stop the walk after a best-effort checkpoint.
    */
    pub fn run(&mut self) -> Result<SearchReport, SearchError> {
        if self.params.save_interval == 0 {
            return Err(SearchError::InvalidParameter("the save interval must be positive".to_string()));
        }
        let time_start = Instant::now();
        let mut state = self.initial_state()?;
        let (iteration, current) = match &state.cursor {
            Cursor::RandomWalk { iteration, current } => (*iteration, current.clone()),
            other => return Err(SearchError::ModeMismatch { expected: "random_walk", found: other.mode() }),
        };
        let mut report = SearchReport::new();
        match self.explore(iteration, current, &mut state, &mut report) {
            Ok(outcome) => Ok(report.finish(outcome, &state, time_start.elapsed().as_secs_f32())),
            Err(e) => {
                best_effort_checkpoint(&mut *self.store, &state, &e);
                Err(e)
            }
        }
    }

    /// loads the checkpoint, or scores the first admissible graph of the initial order
    fn initial_state(&mut self) -> Result<SearchState, SearchError> {
        match self.store.load() {
            Ok(state) => {
                info!(
                    "resuming from checkpoint: highest value {} ({} graphs)",
                    state.highest_value, state.best_graphs.len()
                );
                Ok(state)
            },
            Err(CheckpointError::NotFound(_)) => {
                let n = self.params.initial_vertices;
                let g = first_admissible(self.source, n)?;
                let value = self.oracle.packing_number(&g).map_err(SearchError::InitialScore)?;
                info!("starting a new random walk from {} (value {})", to_graph6(&g), value);
                let mut state = SearchState::new(Cursor::RandomWalk { iteration:0, current:g.clone() });
                state.record(value, &g);
                self.store.save(&state)?;
                Ok(state)
            },
            Err(e) => Err(e.into()),
        }
    }

    /// main loop, starting at the given iteration on the graph current
    fn explore(
        &mut self,
        mut iteration:usize,
        mut current:Graph,
        state:&mut SearchState,
        report:&mut SearchReport,
    ) -> Result<SearchOutcome, SearchError> {
        let mut engine = MutationEngine::seeded(self.params.seed.wrapping_add(iteration as u64));
        let mut seen:HashSet<Fingerprint> = state.best_graphs.iter()
            .chain(std::iter::once(&current))
            .map(canonical_fingerprint)
            .collect();
        let mut nb_unsaved = 0;
        while iteration < self.params.iterations {
            if self.cancel.is_cancelled() {
                self.store.save(state)?;
                info!("random walk cancelled at iteration {}, state saved", iteration);
                return Ok(SearchOutcome::Cancelled);
            }
            let candidate = engine.mutate(&current)?;
            iteration += 1;
            report.nb_candidates += 1;
            if !seen.insert(canonical_fingerprint(&candidate)) {
                report.nb_duplicates += 1;
                debug!("iteration {}: {} already visited", iteration, to_graph6(&candidate));
            } else {
                match self.oracle.packing_number(&candidate) {
                    Err(e) => {
                        report.nb_oracle_failures += 1;
                        warn!("iteration {}: skipping {}: {}", iteration, to_graph6(&candidate), e);
                    },
                    Ok(value) => {
                        report.nb_scored += 1;
                        match state.record(value, &candidate) {
                            Record::NewBest => info!(
                                "iteration {}: new highest value {} with {}",
                                iteration, value, to_graph6(&candidate)
                            ),
                            Record::Tie => info!(
                                "iteration {}: {} also reaches {}",
                                iteration, to_graph6(&candidate), value
                            ),
                            Record::Below => debug!(
                                "iteration {}: {} scored {}", iteration, to_graph6(&candidate), value
                            ),
                        }
                        current = candidate;
                    },
                }
            }
            state.cursor = Cursor::RandomWalk { iteration, current:current.clone() };
            nb_unsaved += 1;
            if nb_unsaved >= self.params.save_interval {
                self.store.save(state)?;
                info!(
                    "iteration {}: checkpoint (highest value {}, {} graphs)",
                    iteration, state.highest_value, state.best_graphs.len()
                );
                nb_unsaved = 0;
            }
        }
        self.store.save(state)?;
        info!(
            "random walk finished after {} iterations: highest value {} reached by {} graphs",
            iteration, state.highest_value, state.best_graphs.len()
        );
        Ok(SearchOutcome::Exhausted)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::checkpoint::MemoryCheckpointStore;
    use crate::generator::{FixedSource, GeneratorError, is_admissible};
    use crate::oracle::{IlpOracle, OracleError};

    /// fails on every graph
    struct FailingOracle;

    impl PackingOracle for FailingOracle {
        fn packing_number(&self, _g:&Graph) -> Result<usize, OracleError> {
            Err(OracleError::Solver("unavailable".to_string()))
        }
    }

    fn params(iterations:usize, save_interval:usize) -> RandomWalkParams {
        RandomWalkParams { initial_vertices: 6, iterations, save_interval, seed: 11 }
    }

    fn source() -> FixedSource {
        let k4 = Graph::from_edges(4, &[(0,1),(0,2),(0,3),(1,2),(1,3),(2,3)]).unwrap();
        FixedSource::from_graphs(vec![Graph::with_vertices(6), Graph::cycle(6), k4])
    }

    #[test]
    fn test_fresh_walk() {
        let source = source();
        let oracle = IlpOracle::new();
        let mut store = MemoryCheckpointStore::new();
        let report = RandomWalk::new(&source, &oracle, &mut store, params(30, 10)).run().unwrap();
        assert_eq!(report.outcome, SearchOutcome::Exhausted);
        assert_eq!(report.nb_candidates, 30);
        assert_eq!(report.nb_scored + report.nb_duplicates + report.nb_oracle_failures, 30);
        // initial, 3 periodic and final checkpoints
        assert_eq!(store.nb_saves(), 5);
        let state = store.load().unwrap();
        match &state.cursor {
            Cursor::RandomWalk { iteration, current } => {
                assert_eq!(*iteration, 30);
                assert_eq!(current.nb_vertices(), 6);
                assert!(is_admissible(current));
            },
            other => panic!("unexpected cursor {:?}", other),
        }
        // C6 has packing coloring number 4
        assert!(state.highest_value >= 4);
        for g in &state.best_graphs {
            assert_eq!(oracle.compute(g).unwrap(), state.highest_value);
        }
    }

    #[test]
    fn test_resumed_walk() {
        let source = source();
        let oracle = IlpOracle::new();
        let mut store = MemoryCheckpointStore::new();
        RandomWalk::new(&source, &oracle, &mut store, params(10, 5)).run().unwrap();
        let before = store.load().unwrap();
        let report = RandomWalk::new(&source, &oracle, &mut store, params(25, 5)).run().unwrap();
        assert_eq!(report.nb_candidates, 15);
        let after = store.load().unwrap();
        assert!(after.highest_value >= before.highest_value);
        assert!(matches!(after.cursor, Cursor::RandomWalk { iteration:25, .. }));
        // a spent budget does nothing
        let report = RandomWalk::new(&source, &oracle, &mut store, params(25, 5)).run().unwrap();
        assert_eq!(report.nb_candidates, 0);
        assert_eq!(store.load().unwrap(), after);
    }

    #[test]
    fn test_cancelled_walk() {
        let source = source();
        let oracle = IlpOracle::new();
        let mut store = MemoryCheckpointStore::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = RandomWalk::new(&source, &oracle, &mut store, params(30, 10))
            .with_cancellation(cancel)
            .run().unwrap();
        assert_eq!(report.outcome, SearchOutcome::Cancelled);
        assert_eq!(report.nb_candidates, 0);
        let state = store.load().unwrap();
        assert_eq!(state.highest_value, 4);
        assert_eq!(state.best_graphs, vec![Graph::cycle(6)]);
        assert_eq!(state.cursor, Cursor::RandomWalk { iteration:0, current:Graph::cycle(6) });
    }

    #[test]
    fn test_oracle_failures_are_skipped() {
        let source = source();
        let mut store = MemoryCheckpointStore::with_state(SearchState {
            highest_value: 4,
            best_graphs: vec![Graph::cycle(6)],
            cursor: Cursor::RandomWalk { iteration:0, current:Graph::cycle(6) },
        });
        let report = RandomWalk::new(&source, &FailingOracle, &mut store, params(12, 100)).run().unwrap();
        assert_eq!(report.nb_candidates, 12);
        assert_eq!(report.nb_scored, 0);
        assert_eq!(report.nb_duplicates + report.nb_oracle_failures, 12);
        // the walk never moves
        let state = store.load().unwrap();
        assert_eq!(state.cursor, Cursor::RandomWalk { iteration:12, current:Graph::cycle(6) });
        assert_eq!(state.best_graphs, vec![Graph::cycle(6)]);
    }

    #[test]
    fn test_initial_graph_errors() {
        let empty = FixedSource::new();
        let oracle = IlpOracle::new();
        let mut store = MemoryCheckpointStore::new();
        let res = RandomWalk::new(&empty, &oracle, &mut store, params(5, 5)).run();
        assert!(matches!(res, Err(SearchError::Generator(GeneratorError::NoAdmissibleGraph(6)))));
        let source = source();
        let res = RandomWalk::new(&source, &FailingOracle, &mut store, params(5, 5)).run();
        assert!(matches!(res, Err(SearchError::InitialScore(OracleError::Solver(_)))));
        assert_eq!(store.nb_saves(), 0);
    }

    #[test]
    fn test_mode_mismatch() {
        let source = source();
        let oracle = IlpOracle::new();
        let mut store = MemoryCheckpointStore::with_state(SearchState::new(Cursor::Exhaustive { n:2, offset:0 }));
        let res = RandomWalk::new(&source, &oracle, &mut store, params(5, 5)).run();
        assert!(matches!(res, Err(SearchError::ModeMismatch { expected:"random_walk", found:"exhaustive" })));
    }
}
