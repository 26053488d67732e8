//! The context a decision strategy reads and the result it produces (C6/C7).

use crate::{
    impact::ResourceImpact, system_state::SystemState, task::PendingTask, thresholds::Thresholds,
};
use serde::{Deserialize, Serialize};

/// Optional caller-supplied hints accompanying an `/ask` request. Currently
/// informational only — no strategy branches on them, but the field is part
/// of the wire contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientHints {
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub gpu: Option<f64>,
    pub vram: Option<f64>,
}

/// Everything a strategy needs to decide, assembled by the decision manager
/// (C7) from the aggregator, the prediction model and the pending queue.
#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub task_name: String,
    pub complexity: u64,
    pub client_hints: Option<ClientHints>,
    pub current_state: Option<SystemState>,
    pub prediction: Option<ResourceImpact>,
    pub thresholds: Option<Thresholds>,
    pub safety_buffer: f64,
    pub pending_tasks: Vec<PendingTask>,
}

/// The outcome of a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResult {
    pub allowed: bool,
    pub reasons: Vec<String>,
    pub predicted_state: Option<SystemState>,
    pub confidence: f64,
    pub strategy_name: String,
    pub model_name: String,
}

impl DecisionResult {
    /// The degenerate "no information, fail open" result every strategy
    /// returns when context, current state or thresholds are missing.
    pub fn fail_open(strategy_name: &str) -> Self {
        Self {
            allowed: true,
            reasons: Vec::new(),
            predicted_state: None,
            confidence: 0.0,
            strategy_name: strategy_name.to_string(),
            model_name: "none".to_string(),
        }
    }
}
