use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use super::accounts::{LoginRequest, PasswordResetRequest, SignupRequest};
use super::documents::DocumentStore;
use super::domain::{DocumentId, OccupancyId, OwnerId, PaymentId, PropertyId};
use super::lifecycle::{OccupancyRequest, OccupancyUpdate};
use super::notifications::NotificationRuleRequest;
use super::properties::{PropertyRemoval, PropertyRequest, PropertyUpdate};
use super::repository::PortfolioStore;
use super::service::{PortfolioError, PortfolioService};

type Shared<S, D> = State<Arc<PortfolioService<S, D>>>;

/// JSON API over every owner-scoped portfolio operation. Byte transfer
/// routes (upload and download) are mounted by the binary.
pub fn portfolio_router<S, D>(service: Arc<PortfolioService<S, D>>) -> Router
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    Router::new()
        .route("/api/signup", post(signup_handler::<S, D>))
        .route("/api/login", post(login_handler::<S, D>))
        .route("/api/logout", post(logout_handler::<S, D>))
        .route("/api/password-reset", post(password_reset_handler::<S, D>))
        .route(
            "/api/properties",
            get(list_properties_handler::<S, D>).post(add_property_handler::<S, D>),
        )
        .route(
            "/api/properties/overview",
            get(property_overview_handler::<S, D>),
        )
        .route("/api/properties/vacant", get(vacant_properties_handler::<S, D>))
        .route(
            "/api/properties/:property_id",
            get(property_handler::<S, D>)
                .put(update_property_handler::<S, D>)
                .delete(delete_property_handler::<S, D>),
        )
        .route(
            "/api/properties/:property_id/full-details",
            get(full_details_handler::<S, D>),
        )
        .route(
            "/api/properties/:property_id/summary",
            get(property_summary_handler::<S, D>),
        )
        .route(
            "/api/properties/:property_id/income",
            get(income_handler::<S, D>),
        )
        .route(
            "/api/properties/:property_id/occupancy",
            post(create_occupancy_handler::<S, D>)
                .put(update_current_occupancy_handler::<S, D>)
                .delete(end_occupancy_handler::<S, D>),
        )
        .route(
            "/api/properties/:property_id/notifications",
            get(list_rules_handler::<S, D>)
                .post(save_rule_handler::<S, D>)
                .delete(disable_rule_handler::<S, D>),
        )
        .route(
            "/api/properties/:property_id/documents",
            get(list_documents_handler::<S, D>),
        )
        .route(
            "/api/documents/:document_id",
            axum::routing::delete(delete_document_handler::<S, D>),
        )
        .route(
            "/api/notifications/check",
            get(check_notifications_handler::<S, D>),
        )
        .route("/api/dashboard", get(dashboard_handler::<S, D>))
        .route("/api/occupants", get(occupants_handler::<S, D>))
        .route(
            "/api/occupants/overview",
            get(occupants_overview_handler::<S, D>),
        )
        .route(
            "/api/occupants/:occupancy_id/payments",
            get(payments_handler::<S, D>).put(set_payment_status_handler::<S, D>),
        )
        .route(
            "/api/occupants/:occupancy_id/payments.csv",
            get(payments_csv_handler::<S, D>),
        )
        .route(
            "/api/occupants/:occupancy_id/check-delete",
            get(check_delete_handler::<S, D>),
        )
        .route(
            "/api/occupants/:occupancy_id/delete",
            post(delete_occupant_handler::<S, D>),
        )
        .route(
            "/api/occupancies/:occupancy_id",
            get(occupancy_detail_handler::<S, D>).put(update_occupancy_handler::<S, D>),
        )
        .with_state(service)
}

impl IntoResponse for PortfolioError {
    fn into_response(self) -> Response {
        let status = match &self {
            PortfolioError::Validation(_) => StatusCode::BAD_REQUEST,
            PortfolioError::Conflict(_) => StatusCode::CONFLICT,
            PortfolioError::NotFound => StatusCode::NOT_FOUND,
            PortfolioError::Unauthenticated => StatusCode::UNAUTHORIZED,
            PortfolioError::Storage(detail) => {
                error!(error = %detail, "portfolio storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PortfolioError::Files(detail) => {
                error!(error = %detail, "document storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PortfolioError::Credential(detail) | PortfolioError::Export(detail) => {
                error!(error = %detail, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}

/// Resolves the `Authorization: Bearer <token>` header to an owner.
pub fn resolve_caller<S, D>(
    service: &PortfolioService<S, D>,
    headers: &HeaderMap,
) -> Result<OwnerId, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let token = bearer_token(headers).ok_or(PortfolioError::Unauthenticated)?;
    service.authenticate(token)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Calendar date used for every date-relative rule in a request.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_payload<T: DeserializeOwned>(payload: Value) -> Result<T, PortfolioError> {
    serde_json::from_value(payload).map_err(|err| PortfolioError::validation(err.to_string()))
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn signup_handler<S, D>(
    State(service): Shared<S, D>,
    Json(payload): Json<Value>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let request: SignupRequest = parse_payload(payload)?;
    let profile = service.register(request)?;
    Ok((StatusCode::CREATED, Json(profile)).into_response())
}

async fn login_handler<S, D>(
    State(service): Shared<S, D>,
    Json(payload): Json<Value>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let request: LoginRequest = parse_payload(payload)?;
    let session = service.login(request)?;
    Ok((StatusCode::OK, Json(session)).into_response())
}

async fn logout_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let token = bearer_token(&headers).ok_or(PortfolioError::Unauthenticated)?;
    service.logout(token)?;
    Ok(message(StatusCode::OK, "Logged out"))
}

async fn password_reset_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let request: PasswordResetRequest = parse_payload(payload)?;
    let owner = resolve_caller(&service, &headers)?;
    service.reset_password(owner, request)?;
    Ok(message(StatusCode::OK, "Password updated successfully"))
}

async fn list_properties_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    Ok(Json(service.list_properties(owner)?).into_response())
}

async fn add_property_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let request: PropertyRequest = parse_payload(payload)?;
    let owner = resolve_caller(&service, &headers)?;
    let property = service.add_property(owner, request)?;
    let payload = json!({
        "message": "Property added successfully",
        "property_id": property.property_id,
    });
    Ok((StatusCode::CREATED, Json(payload)).into_response())
}

async fn property_overview_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    Ok(Json(service.property_overview(owner)?).into_response())
}

async fn vacant_properties_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    Ok(Json(service.vacant_properties(owner)?).into_response())
}

async fn property_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    Ok(Json(service.property(owner, &PropertyId(property_id))?).into_response())
}

async fn update_property_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    let update: PropertyUpdate = parse_payload(payload)?;
    let property = service.update_property(owner, &PropertyId(property_id), update)?;
    Ok(Json(property).into_response())
}

#[derive(Debug, Default, Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    confirm: bool,
}

async fn delete_property_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    let response = match service.delete_property(owner, &PropertyId(property_id), query.confirm)? {
        PropertyRemoval::RequiresConfirmation => {
            let payload = json!({
                "warning": "Property has active occupancy. Confirm deletion?",
                "requires_confirmation": true,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        PropertyRemoval::Deleted { .. } => message(StatusCode::OK, "Property deleted successfully"),
    };
    Ok(response)
}

async fn full_details_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    let details = service.property_full_details(owner, &PropertyId(property_id), today())?;
    Ok(Json(details).into_response())
}

async fn property_summary_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    let summary = service.property_summary(owner, &PropertyId(property_id), today())?;
    Ok(Json(summary).into_response())
}

async fn income_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    let summary = service.income_summary(owner, &PropertyId(property_id), today())?;
    Ok(Json(summary).into_response())
}

async fn create_occupancy_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let request: OccupancyRequest = parse_payload(payload)?;
    let owner = resolve_caller(&service, &headers)?;
    let created = service.create_occupancy(owner, &PropertyId(property_id), request, today())?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn update_current_occupancy_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    let update: OccupancyUpdate = parse_payload(payload)?;
    let occupancy = service.update_current_occupancy(owner, &PropertyId(property_id), update)?;
    Ok(Json(occupancy).into_response())
}

async fn end_occupancy_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    service.end_occupancy(owner, &PropertyId(property_id))?;
    Ok(message(StatusCode::OK, "Occupancy ended"))
}

async fn list_rules_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    let rules = service.notification_rules(owner, &PropertyId(property_id))?;
    Ok(Json(rules).into_response())
}

async fn save_rule_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let request: NotificationRuleRequest = parse_payload(payload)?;
    let owner = resolve_caller(&service, &headers)?;
    let rule = service.save_notification_rule(owner, &PropertyId(property_id), request)?;
    Ok((StatusCode::CREATED, Json(rule)).into_response())
}

#[derive(Debug, Default, Deserialize)]
struct RuleQuery {
    #[serde(default)]
    notification_type: Option<String>,
}

async fn disable_rule_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
    Query(query): Query<RuleQuery>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    service.disable_notification_rule(
        owner,
        &PropertyId(property_id),
        query.notification_type.as_deref(),
    )?;
    Ok(message(StatusCode::OK, "Notification disabled successfully"))
}

async fn check_notifications_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    Ok(Json(service.evaluate_notifications(owner, today())?).into_response())
}

async fn list_documents_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    let documents = service.documents(owner, &PropertyId(property_id))?;
    Ok(Json(documents).into_response())
}

async fn delete_document_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(document_id): Path<u64>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    service.delete_document(owner, DocumentId(document_id))?;
    Ok(message(StatusCode::OK, "Document deleted successfully"))
}

async fn dashboard_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    Ok(Json(service.dashboard(owner, today())?).into_response())
}

async fn occupants_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    Ok(Json(service.occupants(owner, today())?).into_response())
}

async fn occupants_overview_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    Ok(Json(service.occupants_overview(owner, today())?).into_response())
}

async fn payments_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(occupancy_id): Path<u64>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    Ok(Json(service.payments(owner, OccupancyId(occupancy_id))?).into_response())
}

#[derive(Debug, Deserialize)]
struct PaymentStatusRequest {
    payment_id: u64,
    status: String,
}

async fn set_payment_status_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(occupancy_id): Path<u64>,
    Json(payload): Json<Value>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let request: PaymentStatusRequest = parse_payload(payload)?;
    let owner = resolve_caller(&service, &headers)?;
    let payment = service.set_payment_status(
        owner,
        OccupancyId(occupancy_id),
        PaymentId(request.payment_id),
        &request.status,
    )?;
    Ok(Json(payment).into_response())
}

async fn payments_csv_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(occupancy_id): Path<u64>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    let body = service.export_payments_csv(owner, OccupancyId(occupancy_id))?;
    let disposition = format!("attachment; filename=\"payments-{occupancy_id}.csv\"");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn check_delete_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(occupancy_id): Path<u64>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    Ok(Json(service.check_delete(owner, OccupancyId(occupancy_id))?).into_response())
}

async fn delete_occupant_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(occupancy_id): Path<u64>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    service.delete_occupant(owner, OccupancyId(occupancy_id))?;
    Ok(message(
        StatusCode::OK,
        "Occupant and all related records deleted successfully",
    ))
}

async fn occupancy_detail_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(occupancy_id): Path<u64>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    Ok(Json(service.occupancy_detail(owner, OccupancyId(occupancy_id))?).into_response())
}

async fn update_occupancy_handler<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(occupancy_id): Path<u64>,
    Json(payload): Json<Value>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    let update: OccupancyUpdate = parse_payload(payload)?;
    let occupancy = service.update_occupancy(owner, OccupancyId(occupancy_id), update)?;
    Ok(Json(occupancy).into_response())
}
