use std::fmt;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::generator::{GraphSource, is_admissible};
use crate::graph::Graph;
use crate::graph6::to_graph6;
use crate::oracle::PackingOracle;
use crate::search::{
    CancellationToken, Cursor, Record, SearchError, SearchOutcome, SearchReport, SearchState,
    best_effort_checkpoint,
};

/// parameters of the exhaustive search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExhaustiveParams {
    /// largest number of vertices enumerated (inclusive)
    pub max_vertices: usize,
    /// a checkpoint is written every save_frequency graphs taken from the source
    pub save_frequency: usize,
}

impl Default for ExhaustiveParams {
    fn default() -> Self {
        Self { max_vertices: 10, save_frequency: 100 }
    }
}

/** scores every admissible graph with 1, 2, ..., max_vertices vertices.

The position (order n, number of graphs of order n already consumed) is checkpointed:
 - every save_frequency graphs,
 - when an order is finished (cursor (n+1, 0)),
 - on cancellation,
 - at the end of the search.
A resumed search enumerates order n again and skips the graphs already consumed.
*/
pub struct ExhaustiveSearch<'a> {
    /// graphs of each order
    source: &'a dyn GraphSource,
    /// packing coloring number
    oracle: &'a dyn PackingOracle,
    /// where the state is saved
    store: &'a mut dyn CheckpointStore,
    /// search parameters
    params: ExhaustiveParams,
    /// stops the search (after a checkpoint)
    cancel: CancellationToken,
}

impl<'a> fmt::Debug for ExhaustiveSearch<'a> {
    fn fmt(&self, f:&mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExhaustiveSearch")
            .field("params", &self.params)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl<'a> ExhaustiveSearch<'a> {
    /// exhaustive search (never cancelled unless with_cancellation is called)
    pub fn new(
        source:&'a dyn GraphSource,
        oracle:&'a dyn PackingOracle,
        store:&'a mut dyn CheckpointStore,
        params:ExhaustiveParams,
    ) -> Self {
        Self { source, oracle, store, params, cancel: CancellationToken::new() }
    }

    /// uses the given cancellation token
    pub fn with_cancellation(mut self, cancel:CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /** runs (or resumes) the search until every order is explored or the search is cancelled.
    Oracle failures skip the candidate. Other errors stop the search after a best-effort checkpoint.
    */
    pub fn run(&mut self) -> Result<SearchReport, SearchError> {
        if self.params.save_frequency == 0 {
            return Err(SearchError::InvalidParameter("the save frequency must be positive".to_string()));
        }
        let time_start = Instant::now();
        let mut state = match self.store.load() {
            Ok(state) => {
                info!(
                    "resuming from checkpoint: highest value {} ({} graphs), {:?}",
                    state.highest_value, state.best_graphs.len(), state.cursor
                );
                state
            },
            Err(CheckpointError::NotFound(_)) => {
                info!("no checkpoint found, starting a new exhaustive search");
                SearchState::new(Cursor::Exhaustive { n:1, offset:0 })
            },
            Err(e) => return Err(e.into()),
        };
        let (n, offset) = match &state.cursor {
            Cursor::Exhaustive { n, offset } => (*n, *offset),
            other => return Err(SearchError::ModeMismatch { expected: "exhaustive", found: other.mode() }),
        };
        let mut report = SearchReport::new();
        match self.explore(n.max(1), offset, &mut state, &mut report) {
            Ok(outcome) => Ok(report.finish(outcome, &state, time_start.elapsed().as_secs_f32())),
            Err(e) => {
                best_effort_checkpoint(&mut *self.store, &state, &e);
                Err(e)
            }
        }
    }

    /// main loop, starting at graph `offset` of order `n`
    fn explore(
        &mut self,
        mut n:usize,
        mut offset:usize,
        state:&mut SearchState,
        report:&mut SearchReport,
    ) -> Result<SearchOutcome, SearchError> {
        let mut nb_unsaved = 0;
        while n <= self.params.max_vertices {
            info!("exploring graphs with {} vertices (highest value so far: {})", n, state.highest_value);
            let mut stream = self.source.enumerate(n)?;
            if offset > 0 {
                debug!("skipping {} graphs already processed", offset);
                for g in stream.by_ref().take(offset) { g?; }
            }
            loop {
                if self.cancel.is_cancelled() {
                    state.cursor = Cursor::Exhaustive { n, offset };
                    self.store.save(state)?;
                    info!("search cancelled at n={} offset={}, state saved", n, offset);
                    return Ok(SearchOutcome::Cancelled);
                }
                let g = match stream.next() {
                    None => break,
                    Some(g) => g?,
                };
                offset += 1;
                report.nb_candidates += 1;
                self.process(&g, state, report);
                state.cursor = Cursor::Exhaustive { n, offset };
                nb_unsaved += 1;
                if nb_unsaved >= self.params.save_frequency {
                    self.store.save(state)?;
                    debug!("checkpoint at n={} offset={}", n, offset);
                    nb_unsaved = 0;
                }
            }
            info!("finished graphs with {} vertices ({} graphs)", n, offset);
            n += 1;
            offset = 0;
            state.cursor = Cursor::Exhaustive { n, offset };
            self.store.save(state)?;
            nb_unsaved = 0;
        }
        self.store.save(state)?;
        info!(
            "exhaustive search finished: highest value {} reached by {} graphs",
            state.highest_value, state.best_graphs.len()
        );
        Ok(SearchOutcome::Exhausted)
    }

    /// scores a candidate and updates the best results
    fn process(&self, g:&Graph, state:&mut SearchState, report:&mut SearchReport) {
        if !is_admissible(g) {
            report.nb_rejected += 1;
            debug!("skipping {}: not planar, subcubic and connected", to_graph6(g));
            return;
        }
        let value = match self.oracle.packing_number(g) {
            Ok(value) => value,
            Err(e) => {
                report.nb_oracle_failures += 1;
                warn!("skipping {}: {}", to_graph6(g), e);
                return;
            }
        };
        report.nb_scored += 1;
        match state.record(value, g) {
            Record::NewBest => info!("new highest value {} with {}", value, to_graph6(g)),
            Record::Tie => info!("{} also reaches {}", to_graph6(g), value),
            Record::Below => debug!("{} scored {}", to_graph6(g), value),
        }
    }
}
