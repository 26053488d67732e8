//! HTTP-surface integration tests for the seed admission scenarios (S1,
//! S2, S3, S6). S4 and S5 are exercised at the model/decision crate level
//! (`capfox_core_prediction::linear`, `capfox_core_decision::queue_aware`)
//! since they depend on a single task's regression history or queue state
//! rather than the router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use capfox::config::{
    AggregatorConfig, AuthConfig, CapfoxConfig, DecisionConfig, LearningConfig, LoggingConfig, ModelKind,
    PersistenceConfig, RateLimitConfig, RetrainConfig, ServerConfig, StrategyKind, ThresholdsConfig,
};
use capfox::middleware::RateLimiterRegistry;
use capfox::routes::build_router;
use capfox::state::AppState;
use capfox_core_aggregator::{Aggregator, MetricsOverride};
use capfox_core_decision::{DecisionManager, ThresholdStrategy};
use capfox_infra_persistence::SnapshotStore;
use capfox_shared_telemetry::{init_tracing_reloadable, LogFormat, ReloadHandle};
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn reload_handle() -> ReloadHandle {
    static HANDLE: OnceLock<ReloadHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| init_tracing_reloadable("capfox-tests", "warn", LogFormat::Compact))
        .clone()
}

fn sample_config(port: u16) -> CapfoxConfig {
    CapfoxConfig {
        server: ServerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            pid_file: "capfox-test.pid".to_string(),
        },
        auth: AuthConfig::default(),
        rate_limit: RateLimitConfig { global_per_second: 1000, per_ip_per_second: 1000 },
        aggregator: AggregatorConfig { interval_ms: 60_000, storage_paths: vec![] },
        thresholds: ThresholdsConfig {
            cpu_max_percent: 80.0,
            memory_max_percent: 85.0,
            gpu_max_percent: 90.0,
            vram_max_percent: 90.0,
            storage_min_free_gb: 10.0,
        },
        learning: LearningConfig { max_workers: 4, observation_delay_ms: 50, model: ModelKind::Noop },
        retrain: RetrainConfig { interval_secs: 3600 },
        decision: DecisionConfig { strategy: StrategyKind::Threshold, safety_buffer: 0.0 },
        persistence: PersistenceConfig { snapshot_path: "/tmp/capfox-test-unused.json".to_string() },
        logging: LoggingConfig { level: "warn".to_string(), format: "compact".to_string() },
    }
}

/// Wires a real `Aggregator` + `DecisionManager` (threshold strategy, no
/// model) behind the full HTTP router, so tests can drive `/ask` and
/// `/v2/ask` exactly as a client would.
async fn build_app(cpu_percent: f64, memory_percent: f64, free_gb: f64) -> (axum::Router, Arc<DecisionManager>) {
    let cancel = CancellationToken::new();
    let aggregator = Arc::new(Aggregator::new(vec![], Duration::from_secs(3600)));
    aggregator.start(cancel.clone()).await;
    aggregator
        .inject_metrics(MetricsOverride {
            cpu_overall_percent: Some(cpu_percent),
            memory_used_bytes: Some((memory_percent * 10.0) as u64),
            memory_total_bytes: Some(1000),
            storage: Some(
                [("/".to_string(), (0u64, (free_gb * 1_073_741_824.0) as u64))]
                    .into_iter()
                    .collect(),
            ),
            ..Default::default()
        })
        .await
        .unwrap();

    let decision = Arc::new(DecisionManager::new(
        Arc::clone(&aggregator),
        None,
        Arc::new(ThresholdStrategy),
        capfox_domain_models::Thresholds::default(),
        0.0,
    ));

    let config = sample_config(0);
    let state = AppState {
        aggregator,
        model: None,
        learning: None,
        scheduler: None,
        decision: Some(Arc::clone(&decision)),
        snapshot_store: Arc::new(SnapshotStore::new("/tmp/capfox-test-unused.json")),
        config: Arc::new(RwLock::new(config)),
        reload_handle: reload_handle(),
        cancel,
        started_at: chrono::Utc::now(),
    };

    let rate_limiters = Arc::new(RateLimiterRegistry::new(1000, 1000));
    (build_router(state, rate_limiters), decision)
}

async fn post_ask(app: axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn s1_admission_allowed_when_idle() {
    let (app, _decision) = build_app(50.0, 50.0, 400.0).await;
    let (status, body) = post_ask(app, "/ask", json!({ "task": "enc", "complexity": 100 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], json!(true));
}

#[tokio::test]
async fn s2_admission_denied_with_reasons() {
    let (app, _decision) = build_app(90.0, 90.0, 400.0).await;
    let (status, body) = post_ask(app, "/ask?reason=true", json!({ "task": "enc" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["allowed"], json!(false));
    let reasons: Vec<String> = serde_json::from_value(body["reasons"].clone()).unwrap();
    assert!(reasons.contains(&"cpu_overload".to_string()));
    assert!(reasons.contains(&"memory_overload".to_string()));
}

#[tokio::test]
async fn s3_threshold_reload_flips_a_denied_decision_to_allowed() {
    let (app, decision) = build_app(85.0, 10.0, 400.0).await;
    let (status, body) = post_ask(app.clone(), "/v2/ask", json!({ "task": "enc", "complexity": 1 })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["allowed"], json!(false));

    decision
        .update_thresholds(capfox_domain_models::Thresholds { cpu_max_percent: 90.0, ..Default::default() })
        .await;

    let (status, body) = post_ask(app, "/v2/ask", json!({ "task": "enc", "complexity": 1 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], json!(true));
}

async fn spawn_server(app: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });
    addr
}

#[tokio::test]
async fn s6_wrapper_exit_codes() {
    let marker = "/tmp/capfox-test-should-not-exist";
    let _ = std::fs::remove_file(marker);

    let (deny_app, _decision) = build_app(95.0, 10.0, 400.0).await;
    let deny_addr = spawn_server(deny_app).await;
    let deny_config = sample_config(deny_addr.port());

    let denied_code = capfox::cli::run::run(&deny_config, "enc", 1, &["touch".to_string(), marker.to_string()]).await;
    assert_eq!(denied_code, 75);
    assert!(!std::path::Path::new("/tmp/capfox-test-should-not-exist").exists());

    let (allow_app, _decision) = build_app(10.0, 10.0, 400.0).await;
    let allow_addr = spawn_server(allow_app).await;
    let allow_config = sample_config(allow_addr.port());

    let allowed_code = capfox::cli::run::run(
        &allow_config,
        "enc",
        1,
        &["sh".to_string(), "-c".to_string(), "exit 42".to_string()],
    )
    .await;
    assert_eq!(allowed_code, 42);

    // Port 1 is a privileged port nothing is listening on in the test
    // sandbox: the connection is refused, so the wrapper must fail open
    // and still run the child.
    let unreachable_config = sample_config(1);
    let unreachable_code = capfox::cli::run::run(
        &unreachable_config,
        "enc",
        1,
        &["sh".to_string(), "-c".to_string(), "exit 42".to_string()],
    )
    .await;
    assert_eq!(unreachable_code, 42);
}
