//! C9: atomic checkpointing of a prediction model's state, plus the
//! retrain-scheduler counters that travel alongside it.
//!
//! `save` writes a temp file next to the target, `fsync`s it, then renames
//! over the target — a reader never observes a partially-written file.
//! `load` degrades to "start fresh" on every failure mode (absent file,
//! corrupt JSON, a schema version newer than this binary understands) and
//! only ever logs a warning; persistence is a cache, never a dependency of
//! correctness.

use capfox_core_prediction::PredictionModel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to serialise snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("model state is not valid utf-8: {0}")]
    InvalidModelState(#[from] std::string::FromUtf8Error),
    #[error("model save failed: {0}")]
    Model(#[from] capfox_core_prediction::ModelError),
    #[error("snapshot write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to persist temp file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    schema_version: u32,
    saved_at: DateTime<Utc>,
    model_state: String,
    retrain_count: u64,
    last_retrain: Option<DateTime<Utc>>,
}

/// What `load` found on disk, if anything. Callers fold this back into the
/// retrain scheduler's counters; the model itself is mutated in place by
/// `load` since `PredictionModel::load` takes `&self`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Fresh,
    Restored {
        retrain_count: u64,
        last_retrain: Option<DateTime<Utc>>,
    },
}

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn save(
        &self,
        model: &dyn PredictionModel,
        retrain_count: u64,
        last_retrain: Option<DateTime<Utc>>,
    ) -> Result<(), PersistenceError> {
        let mut model_bytes = Vec::new();
        model.save(&mut model_bytes)?;

        let snapshot = Snapshot {
            schema_version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            model_state: String::from_utf8(model_bytes)?,
            retrain_count,
            last_retrain,
        };
        let encoded = serde_json::to_vec_pretty(&snapshot)?;

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut temp, &encoded)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path)?;
        Ok(())
    }

    /// Never returns an error: a missing, corrupt or too-new file all
    /// resolve to `LoadOutcome::Fresh`, with the latter two logged.
    pub fn load(&self, model: &dyn PredictionModel) -> LoadOutcome {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return LoadOutcome::Fresh,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read snapshot, starting fresh");
                return LoadOutcome::Fresh;
            }
        };

        let snapshot: Snapshot = match serde_json::from_slice(&bytes) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "corrupt snapshot, starting fresh");
                return LoadOutcome::Fresh;
            }
        };

        if snapshot.schema_version > SCHEMA_VERSION {
            warn!(
                path = %self.path.display(),
                found = snapshot.schema_version,
                supported = SCHEMA_VERSION,
                "snapshot schema is newer than this binary understands, starting fresh"
            );
            return LoadOutcome::Fresh;
        }

        if let Err(err) = model.load(&mut snapshot.model_state.as_bytes()) {
            warn!(path = %self.path.display(), error = %err, "failed to decode model state, starting fresh");
            return LoadOutcome::Fresh;
        }

        LoadOutcome::Restored {
            retrain_count: snapshot.retrain_count,
            last_retrain: snapshot.last_retrain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capfox_core_prediction::LinearModel;
    use capfox_domain_models::ResourceImpact;
    use tempfile::tempdir;

    #[test]
    fn load_of_absent_file_is_fresh() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("state.json"));
        let model = LinearModel::new(2);
        assert_eq!(store.load(&model), LoadOutcome::Fresh);
    }

    #[test]
    fn save_then_load_restores_model_state_and_counters() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("state.json"));

        let model = LinearModel::new(2);
        for c in [10u64, 20, 30] {
            model.observe("t", c, ResourceImpact { cpu: c as f64 * 2.0, ..Default::default() });
        }
        store.save(&model, 5, Some(Utc::now())).unwrap();

        let restored_model = LinearModel::new(2);
        let outcome = store.load(&restored_model);
        match outcome {
            LoadOutcome::Restored { retrain_count, .. } => assert_eq!(retrain_count, 5),
            LoadOutcome::Fresh => panic!("expected a restored snapshot"),
        }
        assert_eq!(
            restored_model.predict("t", 40).unwrap().cpu,
            model.predict("t", 40).unwrap().cpu,
        );
    }

    #[test]
    fn corrupt_file_is_non_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"not json").unwrap();
        let store = SnapshotStore::new(path);
        let model = LinearModel::new(2);
        assert_eq!(store.load(&model), LoadOutcome::Fresh);
    }

    #[test]
    fn newer_schema_version_is_non_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let snapshot = Snapshot {
            schema_version: SCHEMA_VERSION + 1,
            saved_at: Utc::now(),
            model_state: "{}".to_string(),
            retrain_count: 0,
            last_retrain: None,
        };
        std::fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();
        let store = SnapshotStore::new(path);
        let model = LinearModel::new(2);
        assert_eq!(store.load(&model), LoadOutcome::Fresh);
    }

    #[test]
    fn save_is_atomic_rename_over_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"stale").unwrap();

        let store = SnapshotStore::new(path.clone());
        let model = LinearModel::new(2);
        model.observe("t", 1, ResourceImpact::default());
        store.save(&model, 0, None).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("schema_version"));
    }
}
