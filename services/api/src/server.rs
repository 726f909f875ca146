use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryLearningPathRepository};
use crate::routes::with_learning_path_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use coursepath::config::AppConfig;
use coursepath::error::AppError;
use coursepath::learning_paths::LearningPathService;
use coursepath::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
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
        policy: config.paths,
    };

    let repository = Arc::new(InMemoryLearningPathRepository::default());
    let path_service = Arc::new(LearningPathService::new(repository, config.paths));

    let app = with_learning_path_routes(path_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_courses_per_path = config.paths.max_courses_per_path,
        "course path service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
