//! Shared state handed to every handler via axum's `State` extractor.

use crate::config::CapfoxConfig;
use capfox_core_aggregator::Aggregator;
use capfox_core_decision::DecisionManager;
use capfox_core_learning::{LearningEngine, RetrainScheduler};
use capfox_core_prediction::PredictionModel;
use capfox_infra_persistence::SnapshotStore;
use capfox_shared_telemetry::ReloadHandle;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

pub const SERVICE_NAME: &str = "capfox";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything a handler may need, grouped by lifecycle: the always-present
/// core pipeline, and the optional "v2" decision engine which may be
/// disabled.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub model: Option<Arc<dyn PredictionModel>>,
    pub learning: Option<Arc<LearningEngine>>,
    pub scheduler: Option<Arc<RetrainScheduler>>,
    pub decision: Option<Arc<DecisionManager>>,
    pub snapshot_store: Arc<SnapshotStore>,
    pub config: Arc<RwLock<CapfoxConfig>>,
    pub reload_handle: ReloadHandle,
    pub cancel: CancellationToken,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn v2_enabled(&self) -> bool {
        self.model.is_some() && self.decision.is_some()
    }
}
