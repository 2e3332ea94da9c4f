use crate::cli::ServeArgs;
use crate::infra::{demo_roster, AppState, InMemoryOrderRepository, InMemoryPusherDirectory};
use crate::routes::with_dispatch_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use pushr::config::AppConfig;
use pushr::dispatch::{CategoryAdvisor, DispatchService, HttpCategoryAdvisor};
use pushr::error::AppError;
use pushr::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let repository = Arc::new(InMemoryOrderRepository::default());
    let pushers = Arc::new(InMemoryPusherDirectory::with_roster(demo_roster()));
    let dispatch_service = Arc::new(DispatchService::new(
        repository,
        pushers,
        config.rules.clone(),
    ));

    let advisor = HttpCategoryAdvisor::from_config(&config.suggestion)?
        .map(|advisor| Arc::new(advisor) as Arc<dyn CategoryAdvisor>);
    if advisor.is_none() {
        warn!("category suggestion endpoint not configured, serving fallback suggestions");
    }

    let app = with_dispatch_routes(dispatch_service, advisor)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "pushr dispatch api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
