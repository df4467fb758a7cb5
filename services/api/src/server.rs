use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use matricula::auth::SessionManager;
use matricula::config::AppConfig;
use matricula::error::AppError;
use matricula::telemetry;
use matricula::workflows::enrollment::EnrollmentService;
use matricula::workflows::leads::LeadService;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryCatalog, InMemoryEnrollmentStore, InMemoryLeadStore, InMemoryPaymentStore,
    InMemorySessionStore, InMemoryStudentStore,
};
use crate::routes::{api_router, ApiContext};

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

    let students = Arc::new(InMemoryStudentStore::default());
    let enrollments = Arc::new(InMemoryEnrollmentStore::default());
    let payments = Arc::new(InMemoryPaymentStore::default());
    let context = ApiContext {
        catalog: Arc::new(InMemoryCatalog::seeded()),
        students: students.clone(),
        enrollments: enrollments.clone(),
        payments: payments.clone(),
        leads: Arc::new(LeadService::new(Arc::new(InMemoryLeadStore::default()))),
        sessions: Arc::new(SessionManager::from_config(
            Arc::new(InMemorySessionStore::default()),
            &config.auth,
        )),
        wizard: Arc::new(EnrollmentService::new(students, enrollments, payments)),
    };

    let app = api_router(context)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "servicio de matrículas listo");

    axum::serve(listener, app).await?;
    Ok(())
}
