use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Json, Router};
use chrono::{Local, Utc};
use matricula::auth::{AuthError, Credentials, SessionManager, SessionToken, SessionUser};
use matricula::catalog::{CampusId, CatalogError, CatalogRepository, CourseId, LevelId, NewProduct};
use matricula::error::ErrorBody;
use matricula::records::{NewEnrollment, NewPayment, PaymentId, StudentId};
use matricula::workflows::enrollment::{
    EnrollmentDraft, EnrollmentError, EnrollmentGateway, EnrollmentService, PaymentGateway,
    StudentGateway,
};
use matricula::workflows::leads::{LeadError, LeadId, LeadService, LeadStatus, NewLead};
use serde::Deserialize;
use serde_json::json;

use crate::infra::{
    compute_debts, AppState, InMemoryCatalog, InMemoryEnrollmentStore, InMemoryLeadStore,
    InMemoryPaymentStore, InMemorySessionStore, InMemoryStudentStore,
};

pub(crate) const SESSION_COOKIE: &str = "matricula_session";

/// Shared handler state: the in-memory stores plus the services composed
/// over them at startup.
#[derive(Clone)]
pub(crate) struct ApiContext {
    pub(crate) catalog: Arc<InMemoryCatalog>,
    pub(crate) students: Arc<InMemoryStudentStore>,
    pub(crate) enrollments: Arc<InMemoryEnrollmentStore>,
    pub(crate) payments: Arc<InMemoryPaymentStore>,
    pub(crate) leads: Arc<LeadService<InMemoryLeadStore>>,
    pub(crate) sessions: Arc<SessionManager<InMemorySessionStore>>,
    pub(crate) wizard:
        Arc<EnrollmentService<InMemoryStudentStore, InMemoryEnrollmentStore, InMemoryPaymentStore>>,
}

pub(crate) fn api_router(context: ApiContext) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/auth/login", post(login_endpoint))
        .route("/auth/me", get(me_endpoint))
        .route("/auth/logout", post(logout_endpoint))
        .route("/campuses", get(campuses_endpoint))
        .route("/campuses/active", get(active_campuses_endpoint))
        .route("/plans", get(plans_endpoint))
        .route("/plans/active", get(active_plans_endpoint))
        .route("/plans/prices", get(plan_prices_endpoint))
        .route("/levels/courses", get(courses_endpoint))
        .route("/levels", get(levels_endpoint))
        .route("/levels/cycles", get(cycles_endpoint))
        .route(
            "/products",
            get(products_endpoint).post(create_product_endpoint),
        )
        .route("/products/active", get(active_products_endpoint))
        .route(
            "/students",
            get(students_endpoint).post(create_student_endpoint),
        )
        .route("/students/:id", get(student_endpoint))
        .route(
            "/enrollments",
            get(enrollments_endpoint).post(create_enrollment_endpoint),
        )
        .route("/enrollments/wizard", post(wizard_submit_endpoint))
        .route(
            "/payments",
            get(payments_endpoint).post(create_payment_endpoint),
        )
        .route(
            "/payments/:id/prepayment-details",
            get(prepayment_details_endpoint),
        )
        .route("/debts", get(debts_endpoint))
        .route("/leads", get(leads_endpoint).post(capture_lead_endpoint))
        .route("/leads/:id", patch(update_lead_endpoint))
        .route("/leads/cleanup/test-data", delete(cleanup_leads_endpoint))
        .with_state(context)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(status.as_u16(), message))).into_response()
}

fn catalog_error(err: CatalogError) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn lead_error(err: LeadError) -> Response {
    match err {
        LeadError::MissingContact => error_response(StatusCode::BAD_REQUEST, err.to_string()),
        LeadError::NotFound => error_response(StatusCode::NOT_FOUND, "Consulta no encontrada"),
        LeadError::Unavailable(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn auth_error(err: AuthError) -> Response {
    match err {
        AuthError::InvalidCredentials | AuthError::Unauthorized => {
            error_response(StatusCode::UNAUTHORIZED, err.to_string())
        }
        AuthError::Store(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// Enrollment submissions keep the backend's `statusCode` in the body even
/// when it is not a transportable HTTP status (connectivity failures carry
/// `0`); the response status falls back to 502 in that case.
fn enrollment_error(err: EnrollmentError) -> Response {
    if let EnrollmentError::Validation(errors) = &err {
        let payload = json!({
            "message": "El formulario tiene campos inválidos",
            "statusCode": 400,
            "errors": errors,
        });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    let code = err.status_code();
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = ErrorBody::new(code, err.to_string());
    (status, Json(body)).into_response()
}

fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| SessionToken(value.to_string()))
    })
}

/// Resolve the session cookie to its user; admin handlers call this first.
fn require_session(context: &ApiContext, headers: &HeaderMap) -> Result<SessionUser, Response> {
    let token = session_token(headers)
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "Sesión inválida o expirada"))?;
    context
        .sessions
        .authenticate(&token, Utc::now())
        .map_err(auth_error)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn login_endpoint(
    State(context): State<ApiContext>,
    Json(credentials): Json<Credentials>,
) -> Response {
    match context.sessions.login(&credentials, Utc::now()) {
        Ok(session) => {
            let cookie = format!(
                "{}={}; HttpOnly; SameSite=Lax; Path=/",
                SESSION_COOKIE, session.token.0
            );
            (
                StatusCode::OK,
                [(header::SET_COOKIE, cookie)],
                Json(session.user),
            )
                .into_response()
        }
        Err(err) => auth_error(err),
    }
}

pub(crate) async fn me_endpoint(State(context): State<ApiContext>, headers: HeaderMap) -> Response {
    match require_session(&context, &headers) {
        Ok(user) => Json(user).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn logout_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
) -> Response {
    let Some(token) = session_token(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };
    match context.sessions.logout(&token) {
        Ok(()) => {
            let expired = format!("{}=; HttpOnly; Path=/; Max-Age=0", SESSION_COOKIE);
            (StatusCode::NO_CONTENT, [(header::SET_COOKIE, expired)]).into_response()
        }
        Err(err) => auth_error(err),
    }
}

pub(crate) async fn campuses_endpoint(State(context): State<ApiContext>) -> Response {
    match context.catalog.campuses() {
        Ok(campuses) => Json(campuses).into_response(),
        Err(err) => catalog_error(err),
    }
}

pub(crate) async fn active_campuses_endpoint(State(context): State<ApiContext>) -> Response {
    match context.catalog.active_campuses() {
        Ok(campuses) => Json(campuses).into_response(),
        Err(err) => catalog_error(err),
    }
}

pub(crate) async fn plans_endpoint(State(context): State<ApiContext>) -> Response {
    match context.catalog.plans() {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => catalog_error(err),
    }
}

pub(crate) async fn active_plans_endpoint(State(context): State<ApiContext>) -> Response {
    match context.catalog.active_plans() {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => catalog_error(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PriceListQuery {
    #[serde(rename = "campusId")]
    pub(crate) campus_id: u32,
}

pub(crate) async fn plan_prices_endpoint(
    State(context): State<ApiContext>,
    Query(query): Query<PriceListQuery>,
) -> Response {
    match context.catalog.prices_for_campus(CampusId(query.campus_id)) {
        Ok(prices) => Json(prices).into_response(),
        Err(err) => catalog_error(err),
    }
}

pub(crate) async fn courses_endpoint(State(context): State<ApiContext>) -> Response {
    match context.catalog.courses() {
        Ok(courses) => Json(courses).into_response(),
        Err(err) => catalog_error(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LevelsQuery {
    #[serde(rename = "courseId")]
    pub(crate) course_id: u32,
}

pub(crate) async fn levels_endpoint(
    State(context): State<ApiContext>,
    Query(query): Query<LevelsQuery>,
) -> Response {
    match context.catalog.levels_for_course(CourseId(query.course_id)) {
        Ok(levels) => Json(levels).into_response(),
        Err(err) => catalog_error(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CyclesQuery {
    #[serde(rename = "levelId")]
    pub(crate) level_id: u32,
}

pub(crate) async fn cycles_endpoint(
    State(context): State<ApiContext>,
    Query(query): Query<CyclesQuery>,
) -> Response {
    match context.catalog.cycles_for_level(LevelId(query.level_id)) {
        Ok(cycles) => Json(cycles).into_response(),
        Err(err) => catalog_error(err),
    }
}

pub(crate) async fn products_endpoint(State(context): State<ApiContext>) -> Response {
    match context.catalog.products() {
        Ok(products) => Json(products).into_response(),
        Err(err) => catalog_error(err),
    }
}

pub(crate) async fn active_products_endpoint(State(context): State<ApiContext>) -> Response {
    match context.catalog.active_products() {
        Ok(products) => Json(products).into_response(),
        Err(err) => catalog_error(err),
    }
}

pub(crate) async fn create_product_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
    Json(product): Json<NewProduct>,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    if product.nombre.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Ingrese el nombre del producto");
    }
    match context.catalog.insert_product(product) {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(err) => catalog_error(err),
    }
}

pub(crate) async fn students_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    Json(context.students.list()).into_response()
}

pub(crate) async fn student_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    match context.students.get(StudentId(id)) {
        Some(student) => Json(student).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Alumno no encontrado"),
    }
}

pub(crate) async fn create_student_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
    Json(student): Json<matricula::records::NewStudent>,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    match context.students.create(student).await {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(err) => enrollment_error(err.into()),
    }
}

pub(crate) async fn enrollments_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    Json(context.enrollments.list()).into_response()
}

pub(crate) async fn create_enrollment_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
    Json(enrollment): Json<NewEnrollment>,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    match context.enrollments.create(enrollment).await {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(err) => enrollment_error(err.into()),
    }
}

/// Full wizard submission: validates the draft at review and runs the
/// student/enrollment/payments sequence with compensation on failure.
pub(crate) async fn wizard_submit_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
    Json(draft): Json<EnrollmentDraft>,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    let today = Local::now().date_naive();
    match context.wizard.submit(&draft, today).await {
        Ok(receipt) => {
            let payload = json!({
                "student": receipt.student,
                "studentCreated": receipt.student_created,
                "enrollment": receipt.enrollment,
                "payments": receipt.payments,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => enrollment_error(err),
    }
}

pub(crate) async fn payments_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    Json(context.payments.list()).into_response()
}

pub(crate) async fn create_payment_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
    Json(payment): Json<NewPayment>,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    match context.payments.create(payment).await {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(err) => enrollment_error(err.into()),
    }
}

pub(crate) async fn prepayment_details_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    match context.payments.get(PaymentId(id)) {
        Some(payment) => Json(payment.meses_adelantados).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Pago no encontrado"),
    }
}

pub(crate) async fn debts_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    let enrollments = context.enrollments.list();
    let payments = context.payments.list();
    match compute_debts(context.catalog.as_ref(), &enrollments, &payments) {
        Ok(debts) => Json(debts).into_response(),
        Err(err) => catalog_error(err),
    }
}

pub(crate) async fn capture_lead_endpoint(
    State(context): State<ApiContext>,
    Json(lead): Json<NewLead>,
) -> Response {
    match context.leads.capture(lead, Utc::now()) {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(err) => lead_error(err),
    }
}

pub(crate) async fn leads_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    match context.leads.list() {
        Ok(leads) => Json(leads).into_response(),
        Err(err) => lead_error(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LeadStatusUpdate {
    pub(crate) status: LeadStatus,
}

pub(crate) async fn update_lead_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
    Path(id): Path<u32>,
    Json(update): Json<LeadStatusUpdate>,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    match context.leads.update_status(LeadId(id), update.status) {
        Ok(lead) => Json(lead).into_response(),
        Err(err) => lead_error(err),
    }
}

pub(crate) async fn cleanup_leads_endpoint(
    State(context): State<ApiContext>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_session(&context, &headers) {
        return response;
    }
    match context.leads.cleanup_test_data() {
        Ok(removed) => Json(json!({ "removed": removed })).into_response(),
        Err(err) => lead_error(err),
    }
}
