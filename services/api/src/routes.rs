use crate::infra::AppState;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use property_ledger::portfolio::{
    portfolio_router, resolve_caller, today, DocumentId, DocumentStore, PortfolioError,
    PortfolioService, PortfolioStore, PropertyId,
};
use serde_json::json;
use std::sync::Arc;

type Shared<S, D> = State<Arc<PortfolioService<S, D>>>;

/// Portfolio JSON API plus document transfer and operational endpoints.
pub(crate) fn with_portfolio_routes<S, D>(service: Arc<PortfolioService<S, D>>) -> Router
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    portfolio_router(service.clone())
        .merge(document_transfer_router(service))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

fn document_transfer_router<S, D>(service: Arc<PortfolioService<S, D>>) -> Router
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    Router::new()
        .route(
            "/api/properties/:property_id/documents",
            axum::routing::post(upload_document_endpoint::<S, D>),
        )
        .route(
            "/api/documents/:document_id/download",
            get(download_document_endpoint::<S, D>),
        )
        .with_state(service)
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

/// Accepts a multipart form with a `file` part and an optional `title`.
async fn upload_document_endpoint<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;

    let mut title = None;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| PortfolioError::Validation(err.body_text()))?
    {
        match field.name() {
            Some("title") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| PortfolioError::Validation(err.body_text()))?;
                title = Some(text);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| PortfolioError::Validation(err.body_text()))?;
                upload = Some((file_name, bytes));
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| PortfolioError::Validation("No file provided".to_string()))?;
    let document = service.upload_document(
        owner,
        &PropertyId(property_id),
        title,
        &file_name,
        &bytes,
        today(),
    )?;
    let payload = json!({
        "message": "Document uploaded successfully",
        "document_id": document.document_id,
    });
    Ok((StatusCode::CREATED, Json(payload)).into_response())
}

async fn download_document_endpoint<S, D>(
    State(service): Shared<S, D>,
    headers: HeaderMap,
    Path(document_id): Path<u64>,
) -> Result<Response, PortfolioError>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    let owner = resolve_caller(&service, &headers)?;
    let (document, bytes) = service.document_contents(owner, DocumentId(document_id))?;

    let content_type = mime_guess::from_path(&document.file_path)
        .first_or_octet_stream()
        .to_string();
    let file_name = std::path::Path::new(&document.file_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| document.title.clone());
    let disposition = format!("attachment; filename=\"{file_name}\"");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
