use crate::cli::ServeArgs;
use crate::infra::{build_stores, AppState};
use crate::routes::{with_back_office_routes, Services};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use shopspace::access::AccessControl;
use shopspace::clock::{Clock, SystemClock};
use shopspace::config::AppConfig;
use shopspace::error::AppError;
use shopspace::telemetry;
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
    config.seed_demo |= args.seed_demo;

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let client = reqwest::Client::builder().build()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let stores = build_stores(&config.store, &client, config.seed_demo, clock.now());
    let access = Arc::new(AccessControl::from_config(
        &config.admin,
        &config.store,
        client,
    )?);
    let services = Services::new(stores, clock);

    let app = with_back_office_routes(&services, access)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        store = ?config.store,
        login_path = %config.admin.login_path,
        "shopspace back office ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
