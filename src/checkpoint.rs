/*
Persistence of the search state.

A checkpoint is a single JSON record:
    { "version": 1, "highest_value": 3, "best_graphs": [...], "cursor": { "mode": ..., ... } }
It is written to a temporary file of the same directory, synced, then renamed over the target:
a reader sees either the previous checkpoint or the new one, never a partial write.
*/
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::graph::Graph;
use crate::search::{Cursor, SearchState};

/// version of the checkpoint format
pub const CHECKPOINT_VERSION:u32 = 1;

/// errors of checkpoint stores
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// no checkpoint was saved yet (expected on a first run)
    #[error("no checkpoint found at {0}")]
    NotFound(PathBuf),
    /// the checkpoint file could not be read or written
    #[error("checkpoint i/o error on {path}: {source}")]
    Io {
        /// checkpoint file
        path: PathBuf,
        /// underlying error
        source: std::io::Error,
    },
    /// the checkpoint file is not a valid record
    #[error("invalid checkpoint {path}: {source}")]
    Format {
        /// checkpoint file
        path: PathBuf,
        /// underlying error
        source: serde_json::Error,
    },
    /// the record was written by an incompatible version
    #[error("unsupported checkpoint version {0}")]
    Version(u32),
}

/** persists and restores the search state */
pub trait CheckpointStore {
    /// saves the state, replacing the previous checkpoint
    fn save(&mut self, state:&SearchState) -> Result<(), CheckpointError>;

    /// last saved state (CheckpointError::NotFound if none)
    fn load(&self) -> Result<SearchState, CheckpointError>;
}

/// record written on disk
#[derive(Serialize)]
struct RecordRef<'a> {
    version: u32,
    highest_value: usize,
    best_graphs: &'a [Graph],
    cursor: &'a Cursor,
}

/// record read from disk
#[derive(Deserialize)]
struct Record {
    version: u32,
    highest_value: usize,
    best_graphs: Vec<Graph>,
    cursor: Cursor,
}

/** stores the state as a JSON file */
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    /// checkpoint file
    path: PathBuf,
}

impl JsonCheckpointStore {
    /// store writing to the given file
    pub fn new(path:impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    /// checkpoint file
    pub fn path(&self) -> &Path { &self.path }

    fn io_error(&self, source:std::io::Error) -> CheckpointError {
        CheckpointError::Io { path: self.path.clone(), source }
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn save(&mut self, state:&SearchState) -> Result<(), CheckpointError> {
        let record = RecordRef {
            version: CHECKPOINT_VERSION,
            highest_value: state.highest_value,
            best_graphs: &state.best_graphs,
            cursor: &state.cursor,
        };
        let content = serde_json::to_string(&record)
            .map_err(|source| CheckpointError::Format { path: self.path.clone(), source })?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut file = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        file.write_all(content.as_bytes()).map_err(|e| self.io_error(e))?;
        file.as_file().sync_all().map_err(|e| self.io_error(e))?;
        file.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        debug!("checkpoint written to {}", self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<SearchState, CheckpointError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound(self.path.clone()));
            },
            Err(e) => return Err(self.io_error(e)),
        };
        let record:Record = serde_json::from_str(&content)
            .map_err(|source| CheckpointError::Format { path: self.path.clone(), source })?;
        if record.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::Version(record.version));
        }
        Ok(SearchState {
            highest_value: record.highest_value,
            best_graphs: record.best_graphs,
            cursor: record.cursor,
        })
    }
}

/** keeps the last saved state in memory (useful for tests and dry runs) */
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    /// last saved state
    state: Option<SearchState>,
    /// number of saves so far
    nb_saves: usize,
}

impl MemoryCheckpointStore {
    /// empty store
    pub fn new() -> Self { Self::default() }

    /// store already holding a state
    pub fn with_state(state:SearchState) -> Self {
        Self { state: Some(state), nb_saves: 0 }
    }

    /// number of calls to save
    pub fn nb_saves(&self) -> usize { self.nb_saves }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn save(&mut self, state:&SearchState) -> Result<(), CheckpointError> {
        self.state = Some(state.clone());
        self.nb_saves += 1;
        Ok(())
    }

    fn load(&self) -> Result<SearchState, CheckpointError> {
        self.state.clone().ok_or_else(|| CheckpointError::NotFound(PathBuf::from("<memory>")))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use tempfile::tempdir;

    use crate::canonical::{canonical_fingerprint, Fingerprint};

    fn fingerprints(graphs:&[Graph]) -> HashSet<Fingerprint> {
        graphs.iter().map(canonical_fingerprint).collect()
    }

    #[test]
    fn test_not_found() {
        let tmp = tempdir().expect("create temp dir");
        let store = JsonCheckpointStore::new(tmp.path().join("state.json"));
        assert!(matches!(store.load(), Err(CheckpointError::NotFound(_))));
    }

    #[test]
    fn test_round_trip_exhaustive() {
        let tmp = tempdir().expect("create temp dir");
        let mut store = JsonCheckpointStore::new(tmp.path().join("state.json"));
        let state = SearchState {
            highest_value: 3,
            best_graphs: vec![Graph::cycle(3), Graph::path(4)],
            cursor: Cursor::Exhaustive { n:4, offset:17 },
        };
        store.save(&state).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(fingerprints(&loaded.best_graphs), fingerprints(&state.best_graphs));
    }

    #[test]
    fn test_round_trip_random_walk() {
        let tmp = tempdir().expect("create temp dir");
        let mut store = JsonCheckpointStore::new(tmp.path().join("walk.json"));
        let mut current = Graph::cycle(6);
        current.remove_vertex(2);
        current.add_vertex(11);
        current.add_edge(11, 1).unwrap();
        let state = SearchState {
            highest_value: 4,
            best_graphs: vec![Graph::cycle(5)],
            cursor: Cursor::RandomWalk { iteration:1200, current },
        };
        store.save(&state).unwrap();
        // a second save replaces the first one
        let mut next = state.clone();
        next.highest_value = 5;
        store.save(&next).unwrap();
        assert_eq!(store.load().unwrap(), next);
        // no temporary file left behind
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_record_format() {
        let tmp = tempdir().expect("create temp dir");
        let path = tmp.path().join("state.json");
        let mut store = JsonCheckpointStore::new(&path);
        let state = SearchState {
            highest_value: 2,
            best_graphs: vec![Graph::path(2)],
            cursor: Cursor::Exhaustive { n:3, offset:0 },
        };
        store.save(&state).unwrap();
        let value:serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({
            "version": 1,
            "highest_value": 2,
            "best_graphs": [{"vertices": [0,1], "edges": [[0,1]]}],
            "cursor": {"mode": "exhaustive", "n": 3, "offset": 0}
        }));
    }

    #[test]
    fn test_invalid_records() {
        let tmp = tempdir().expect("create temp dir");
        let path = tmp.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonCheckpointStore::new(&path);
        assert!(matches!(store.load(), Err(CheckpointError::Format { .. })));
        fs::write(&path, r#"{"version":9,"highest_value":0,"best_graphs":[],"cursor":{"mode":"exhaustive","n":1,"offset":0}}"#).unwrap();
        assert!(matches!(store.load(), Err(CheckpointError::Version(9))));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryCheckpointStore::new();
        assert!(matches!(store.load(), Err(CheckpointError::NotFound(_))));
        let state = SearchState::new(Cursor::Exhaustive { n:1, offset:0 });
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
        assert_eq!(store.nb_saves(), 1);
    }
}
