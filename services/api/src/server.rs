use crate::cli::ServeArgs;
use crate::infra::{build_analyzer, AppState, InMemoryContractStore, InMemoryDecisionStore};
use crate::routes::with_review_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use contrat_ai::config::AppConfig;
use contrat_ai::error::AppError;
use contrat_ai::review::{ContractReviewScheduler, ContractReviewService, ReviewState};
use contrat_ai::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let contracts = Arc::new(InMemoryContractStore::default());
    let decisions = Arc::new(InMemoryDecisionStore::default());
    let analyzer = build_analyzer(&config)?;
    let service = Arc::new(ContractReviewService::new(
        contracts,
        decisions,
        analyzer,
        config.review.clone(),
    ));
    let scheduler = Arc::new(ContractReviewScheduler::new(
        Arc::clone(&service),
        Duration::from_secs(config.review.scheduler_interval_secs),
    ));
    tokio::spawn(Arc::clone(&scheduler).run());

    let app = with_review_routes(ReviewState { service, scheduler })
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "contract screening service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
