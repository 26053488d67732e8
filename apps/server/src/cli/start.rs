//! `start`: the long-running server process — wires C1-C9 together, binds
//! the HTTP listener, and drives the signal-triggered reload/shutdown
//! lifecycle.

use crate::config::{CapfoxConfig, ModelKind, StrategyKind};
use crate::routes::build_router;
use crate::state::AppState;
use crate::{middleware::RateLimiterRegistry, pidfile};
use anyhow::{Context, Result};
use capfox_core_aggregator::Aggregator;
use capfox_core_decision::{
    ConservativeStrategy, DecisionManager, DecisionStrategy, PredictiveStrategy, QueueAwareStrategy,
    ThresholdStrategy,
};
use capfox_core_learning::{LearningEngine, RetrainScheduler};
use capfox_core_prediction::{
    GradientBoostModel, LearningType, LinearModel, MovingAverageModel, NoopModel, PolynomialModel, PredictionModel,
};
use capfox_core_probes::{CpuProbe, GpuProbe, MemoryProbe, Probe, ProcessProbe, StorageProbe};
use capfox_infra_persistence::{LoadOutcome, SnapshotStore};
use capfox_shared_telemetry::LogFormat;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

fn build_model(kind: ModelKind, retrain_interval: Duration) -> Arc<dyn PredictionModel> {
    match kind {
        ModelKind::Noop => Arc::new(NoopModel::default()),
        ModelKind::MovingAverage => Arc::new(MovingAverageModel::default()),
        ModelKind::Linear => Arc::new(LinearModel::default()),
        ModelKind::Polynomial => Arc::new(PolynomialModel::default()),
        ModelKind::GradientBoost => Arc::new(GradientBoostModel::new(2, 10_000, retrain_interval)),
    }
}

fn build_strategy(kind: StrategyKind) -> Arc<dyn DecisionStrategy> {
    let fallback: Arc<dyn DecisionStrategy> = Arc::new(ThresholdStrategy);
    match kind {
        StrategyKind::Threshold => fallback,
        StrategyKind::Predictive => Arc::new(PredictiveStrategy::new(fallback)),
        StrategyKind::Conservative => Arc::new(ConservativeStrategy::new(fallback)),
        StrategyKind::QueueAware => Arc::new(QueueAwareStrategy::new(fallback)),
    }
}

pub async fn run(config: CapfoxConfig, config_path: PathBuf) -> Result<()> {
    let format: LogFormat = config.logging.format.parse().unwrap_or(LogFormat::Compact);
    let reload_handle = capfox_shared_telemetry::init_tracing_reloadable("capfox", &config.logging.level, format);

    pidfile::write(&config.server.pid_file).context("writing pidfile")?;

    let cancel = CancellationToken::new();

    let probes: Vec<Box<dyn Probe>> = vec![
        Box::new(CpuProbe::new()),
        Box::new(MemoryProbe::new()),
        Box::new(StorageProbe::new(config.aggregator.storage_paths.iter().map(PathBuf::from).collect())),
        Box::new(GpuProbe::new()),
        Box::new(ProcessProbe::new()),
    ];
    let aggregator = Arc::new(Aggregator::new(probes, Duration::from_millis(config.aggregator.interval_ms)));
    aggregator.start(cancel.clone()).await;
    info!("aggregator ready after initial collection");

    let retrain_interval = Duration::from_secs(config.retrain.interval_secs);
    let model = build_model(config.learning.model, retrain_interval);

    let snapshot_store = Arc::new(SnapshotStore::new(config.persistence.snapshot_path.clone()));
    let mut seeded_retrain_count = 0u64;
    let mut seeded_last_retrain = None;
    match snapshot_store.load(model.as_ref()) {
        LoadOutcome::Fresh => info!("no prior snapshot, starting the model fresh"),
        LoadOutcome::Restored { retrain_count, last_retrain } => {
            info!(retrain_count, "restored model state from snapshot");
            seeded_retrain_count = retrain_count;
            seeded_last_retrain = last_retrain;
        }
    }

    let learning = Arc::new(LearningEngine::new(
        Arc::clone(&aggregator),
        Arc::clone(&model),
        config.learning.max_workers,
        Duration::from_millis(config.learning.observation_delay_ms),
        cancel.clone(),
    ));

    let scheduler = if model.learning_type() == LearningType::Batch {
        let scheduler = Arc::new(RetrainScheduler::new(Arc::clone(&model), retrain_interval, cancel.clone()));
        scheduler.seed_from_snapshot(seeded_retrain_count, seeded_last_retrain);
        scheduler.start();
        Some(scheduler)
    } else {
        None
    };

    let strategy = build_strategy(config.decision.strategy);
    let decision = Arc::new(DecisionManager::new(
        Arc::clone(&aggregator),
        Some(Arc::clone(&model)),
        strategy,
        config.thresholds.clone().into(),
        config.decision.safety_buffer,
    ));

    let rate_limiters = Arc::new(RateLimiterRegistry::new(
        config.rate_limit.global_per_second,
        config.rate_limit.per_ip_per_second,
    ));

    let bind_addr = SocketAddr::new(config.server.host, config.server.port);
    let config_lock = Arc::new(RwLock::new(config));

    let state = AppState {
        aggregator: Arc::clone(&aggregator),
        model: Some(Arc::clone(&model)),
        learning: Some(Arc::clone(&learning)),
        scheduler: scheduler.clone(),
        decision: Some(Arc::clone(&decision)),
        snapshot_store: Arc::clone(&snapshot_store),
        config: Arc::clone(&config_lock),
        reload_handle: reload_handle.clone(),
        cancel: cancel.clone(),
        started_at: chrono::Utc::now(),
    };

    let app = build_router(state, Arc::clone(&rate_limiters));
    let listener = tokio::net::TcpListener::bind(bind_addr).await.context("binding HTTP listener")?;
    info!(%bind_addr, "capfox listening");

    spawn_sighup_listener(
        Arc::clone(&config_lock),
        config_path,
        Arc::clone(&decision),
        Arc::clone(&rate_limiters),
        reload_handle,
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("shutdown signal received, closing learning engine, scheduler and aggregator");
    cancel.cancel();
    learning.stop_with_timeout(Duration::from_secs(10)).await;
    if let Some(scheduler) = &scheduler {
        scheduler.stop().await;
    }

    if let Err(err) = snapshot_store.save(
        model.as_ref(),
        scheduler.as_ref().map(|s| s.stats().retrain_count).unwrap_or(seeded_retrain_count),
        scheduler.as_ref().and_then(|s| s.stats().last_retrain).or(seeded_last_retrain),
    ) {
        warn!(error = %err, "final snapshot save failed");
    }

    pidfile::remove(&config_lock.read().await.server.pid_file);
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => warn!(error = %err, "failed to install SIGTERM handler"),
        }
    };
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Reloads config on each SIGHUP: auth, thresholds, rate limits and
/// logging level/format. The bind address is immutable after start.
fn spawn_sighup_listener(
    config: Arc<RwLock<CapfoxConfig>>,
    config_path: PathBuf,
    decision: Arc<DecisionManager>,
    rate_limiters: Arc<RateLimiterRegistry>,
    reload_handle: capfox_shared_telemetry::ReloadHandle,
) {
    tokio::spawn(async move {
        let mut stream = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "failed to install SIGHUP handler, config reload disabled");
                return;
            }
        };
        loop {
            stream.recv().await;
            info!("SIGHUP received, reloading configuration");
            let fresh = match CapfoxConfig::load(&config_path) {
                Ok(fresh) => fresh,
                Err(err) => {
                    warn!(error = %err, "config reload failed, keeping previous configuration");
                    continue;
                }
            };

            let mut current = config.write().await;
            current.apply_reloadable(fresh);
            decision.update_thresholds(current.thresholds.clone().into()).await;
            rate_limiters
                .reload(current.rate_limit.global_per_second, current.rate_limit.per_ip_per_second)
                .await;
            reload_handle.set_level(&current.logging.level);
            info!("configuration reloaded");
        }
    });
}
