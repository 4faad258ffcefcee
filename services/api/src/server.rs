use crate::cli::ServeArgs;
use crate::infra::{seed_directory, AppState, InMemoryTicketStore, LoggingNotifier};
use crate::routes::with_ticket_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fixit::config::AppConfig;
use fixit::error::AppError;
use fixit::telemetry;
use fixit::tickets::TicketService;
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
    };

    let store = Arc::new(InMemoryTicketStore::default());
    let directory = Arc::new(seed_directory());
    let notifier = Arc::new(LoggingNotifier);
    let ticket_service = Arc::new(TicketService::new(store, directory, notifier));

    let app = with_ticket_routes(ticket_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "ticket lifecycle service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
