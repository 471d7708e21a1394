//! Search loops looking for graphs with a large packing coloring number.

/// exhaustive search over every graph of each order
pub mod exhaustive;

/// random walk through planar subcubic connected graphs
pub mod random_walk;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::warn;

use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::generator::GeneratorError;
use crate::graph::Graph;
use crate::mutation::MutationError;
use crate::oracle::OracleError;

/** position of a search, specific to its mode */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Cursor {
    /// next graph: item `offset` of the enumeration of graphs with `n` vertices
    Exhaustive {
        /// number of vertices
        n: usize,
        /// number of graphs of order n already consumed
        offset: usize,
    },
    /// `iteration` iterations done, the walk stands on `current`
    RandomWalk {
        /// number of iterations done
        iteration: usize,
        /// graph the walk stands on
        current: Graph,
    },
}

impl Cursor {
    /// name of the search mode
    pub fn mode(&self) -> &'static str {
        match self {
            Cursor::Exhaustive { .. } => "exhaustive",
            Cursor::RandomWalk { .. } => "random_walk",
        }
    }
}

/// effect of a scored graph on the best results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    /// strictly better than every graph so far
    NewBest,
    /// as good as the best graphs
    Tie,
    /// worse than the best graphs
    Below,
}

/** state of a search (what a checkpoint contains).

Invariant: every graph in best_graphs has packing coloring number highest_value.
A fresh state has highest_value 0 and no best graph.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    /// largest packing coloring number seen
    pub highest_value: usize,
    /// graphs reaching highest_value, in discovery order
    pub best_graphs: Vec<Graph>,
    /// where the search stands
    pub cursor: Cursor,
}

impl SearchState {
    /// fresh state at the given position
    pub fn new(cursor:Cursor) -> Self {
        Self { highest_value: 0, best_graphs: Vec::new(), cursor }
    }

    /// updates the best results with a graph g of packing coloring number value
    pub fn record(&mut self, value:usize, g:&Graph) -> Record {
        if value > self.highest_value {
            self.highest_value = value;
            self.best_graphs = vec![g.clone()];
            Record::NewBest
        } else if value == self.highest_value {
            self.best_graphs.push(g.clone());
            Record::Tie
        } else {
            Record::Below
        }
    }
}

/** cooperative cancellation flag, shared between the search and an interrupt handler */
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// token not cancelled yet
    pub fn new() -> Self { Self::default() }

    /// requests the search to stop (after a checkpoint)
    pub fn cancel(&self) { self.flag.store(true, Ordering::SeqCst); }

    /// true once cancel has been called
    pub fn is_cancelled(&self) -> bool { self.flag.load(Ordering::SeqCst) }
}

/// how a search run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    /// interrupted, the state was checkpointed
    Cancelled,
    /// nothing left to explore, the final state was checkpointed
    Exhausted,
}

/** statistics of a search run (exported as JSON by the executables) */
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    /// how the run ended
    pub outcome: SearchOutcome,
    /// largest packing coloring number (including previous runs)
    pub highest_value: usize,
    /// number of graphs reaching it
    pub nb_best_graphs: usize,
    /// graphs taken from the generator or the mutation engine in this run
    pub nb_candidates: usize,
    /// candidates scored by the oracle
    pub nb_scored: usize,
    /// candidates that are not planar, subcubic and connected
    pub nb_rejected: usize,
    /// candidates already visited (random walk)
    pub nb_duplicates: usize,
    /// candidates skipped because the oracle failed
    pub nb_oracle_failures: usize,
    /// duration of the run (seconds)
    pub time_searched: f32,
}

impl SearchReport {
    /// empty statistics
    fn new() -> Self {
        Self {
            outcome: SearchOutcome::Exhausted,
            highest_value: 0,
            nb_best_graphs: 0,
            nb_candidates: 0,
            nb_scored: 0,
            nb_rejected: 0,
            nb_duplicates: 0,
            nb_oracle_failures: 0,
            time_searched: 0.,
        }
    }

    /// completes the statistics at the end of a run
    fn finish(mut self, outcome:SearchOutcome, state:&SearchState, time_searched:f32) -> Self {
        self.outcome = outcome;
        self.highest_value = state.highest_value;
        self.nb_best_graphs = state.best_graphs.len();
        self.time_searched = time_searched;
        self
    }
}

/// errors that stop a search
#[derive(Debug, Error)]
pub enum SearchError {
    /// the state could not be saved or restored
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    /// the graph source failed
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    /// the mutation engine received an invalid graph
    #[error(transparent)]
    Mutation(#[from] MutationError),
    /// the initial graph of a random walk could not be scored
    #[error("unable to score the initial graph: {0}")]
    InitialScore(OracleError),
    /// the checkpoint belongs to another search mode
    #[error("the checkpoint belongs to a {found} search, not to a {expected} search")]
    ModeMismatch {
        /// mode of the running search
        expected: &'static str,
        /// mode found in the checkpoint
        found: &'static str,
    },
    /// a search parameter is out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// saves the state after a fatal error, without hiding that error
fn best_effort_checkpoint(store:&mut dyn CheckpointStore, state:&SearchState, error:&SearchError) {
    if matches!(error, SearchError::Checkpoint(_)) { return; }
    if let Err(e) = store.save(state) {
        warn!("unable to save the state after a fatal error: {}", e);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_invariant() {
        let mut state = SearchState::new(Cursor::Exhaustive { n:1, offset:0 });
        assert_eq!(state.record(2, &Graph::path(2)), Record::NewBest);
        assert_eq!(state.record(2, &Graph::path(3)), Record::Tie);
        assert_eq!(state.record(1, &Graph::path(1)), Record::Below);
        assert_eq!(state.highest_value, 2);
        assert_eq!(state.best_graphs, vec![Graph::path(2), Graph::path(3)]);
        assert_eq!(state.record(3, &Graph::cycle(3)), Record::NewBest);
        assert_eq!(state.best_graphs, vec![Graph::cycle(3)]);
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let handler_side = token.clone();
        assert!(!token.is_cancelled());
        handler_side.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cursor_modes() {
        assert_eq!(Cursor::Exhaustive { n:3, offset:0 }.mode(), "exhaustive");
        assert_eq!(Cursor::RandomWalk { iteration:0, current:Graph::path(2) }.mode(), "random_walk");
    }
}
