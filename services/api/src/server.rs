use crate::cli::ServeArgs;
use crate::infra::{load_state, AppState, IdssStore};
use crate::routes::with_idss_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use idss_sim::config::AppConfig;
use idss_sim::error::AppError;
use idss_sim::idss::{DocumentPaths, ScoringContext};
use idss_sim::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    let paths = DocumentPaths {
        operational: config.data.operational_path.clone(),
        historical: config.data.historical_path.clone(),
    };
    let context = ScoringContext {
        reference_year: config.scoring.reference_year,
        operator_size: config.scoring.operator_size,
    };
    let state = load_state(&paths, context).await?;
    let store = IdssStore::new(state, paths.historical);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_idss_routes(store)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "idss simulator ready");

    axum::serve(listener, app).await?;
    Ok(())
}
