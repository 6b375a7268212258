use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use serde_json::Value;
use tower::ServiceExt;

use crate::portfolio::{
    InMemoryDocumentStore, InMemoryPortfolioStore, OccupancyId, OccupancyRequest, OwnerId,
    PaymentOverride, PortfolioPolicy, PortfolioService, PortfolioStore, PortfolioTables,
    PropertyId, PropertyRequest, RepositoryError, SignupRequest,
};

pub(super) type MemoryService = PortfolioService<InMemoryPortfolioStore, InMemoryDocumentStore>;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// First day of the fixture leases; also the default "today".
pub(super) fn lease_start() -> NaiveDate {
    date(2025, 1, 1)
}

pub(super) fn cheap_policy() -> PortfolioPolicy {
    PortfolioPolicy {
        hash_memory_kib: 8,
        hash_iterations: 1,
        ..PortfolioPolicy::default()
    }
}

pub(super) fn build_service() -> (Arc<MemoryService>, Arc<InMemoryDocumentStore>) {
    let files = Arc::new(InMemoryDocumentStore::default());
    let service = Arc::new(PortfolioService::new(
        Arc::new(InMemoryPortfolioStore::new()),
        files.clone(),
        cheap_policy(),
    ));
    (service, files)
}

pub(super) fn signup(email: &str) -> SignupRequest {
    SignupRequest {
        full_name: Some("Dana Whitfield".to_string()),
        email: Some(email.to_string()),
        password: Some("s3cure-passphrase".to_string()),
        phone_number: Some("555-0100".to_string()),
    }
}

pub(super) fn register_owner<S>(service: &PortfolioService<S, InMemoryDocumentStore>, email: &str) -> OwnerId
where
    S: PortfolioStore + 'static,
{
    service
        .register(signup(email))
        .expect("owner registers")
        .owner_id
}

pub(super) fn property_request(street: &str) -> PropertyRequest {
    PropertyRequest {
        property_type: Some("apartment".to_string()),
        street_name: Some(street.to_string()),
        city: Some("Springfield".to_string()),
        building_details: Some("Second floor".to_string()),
        size_sqft: Some(850.0),
        bedrooms: Some(2),
        units: Some(1),
        rent_per_month: Some(1_000.0),
    }
}

pub(super) fn add_property<S>(
    service: &PortfolioService<S, InMemoryDocumentStore>,
    owner: OwnerId,
    street: &str,
) -> PropertyId
where
    S: PortfolioStore + 'static,
{
    service
        .add_property(owner, property_request(street))
        .expect("property added")
        .property_id
}

pub(super) fn lease(total_rent: f64, payments: i64) -> OccupancyRequest {
    OccupancyRequest {
        tenant_name: Some("Jordan Reyes".to_string()),
        tenant_phone: Some("555-0199".to_string()),
        tenant_email: Some("jordan@example.com".to_string()),
        lease_start_date: Some("2025-01-01".to_string()),
        lease_end_date: Some("2025-12-31".to_string()),
        total_rent: Some(total_rent),
        number_of_payments: Some(payments),
        payments: Vec::new(),
    }
}

pub(super) fn lease_with_statuses(total_rent: f64, statuses: &[&str]) -> OccupancyRequest {
    OccupancyRequest {
        number_of_payments: Some(statuses.len() as i64),
        payments: statuses
            .iter()
            .map(|status| PaymentOverride {
                status: Some((*status).to_string()),
            })
            .collect(),
        ..lease(total_rent, statuses.len() as i64)
    }
}

/// Owner with one occupied property: 12000 over 12 installments from
/// 2025-01-01.
pub(super) fn occupied_fixture() -> (Arc<MemoryService>, OwnerId, PropertyId, OccupancyId) {
    let (service, _) = build_service();
    let owner = register_owner(&service, "dana@example.com");
    let property = add_property(&service, owner, "12 Elm Street");
    let created = service
        .create_occupancy(owner, &property, lease(12_000.0, 12), lease_start())
        .expect("occupancy created");
    (service, owner, property, created.occupancy_id)
}

/// Store that can be switched to reject every commit after running the
/// staged work, so rollback can be observed.
#[derive(Debug, Default)]
pub(super) struct RejectingCommitStore {
    inner: InMemoryPortfolioStore,
    reject: AtomicBool,
}

impl RejectingCommitStore {
    pub(super) fn reject_commits(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    pub(super) fn snapshot(&self) -> PortfolioTables {
        self.inner
            .read(|tables| tables.clone())
            .expect("snapshot readable")
    }
}

impl PortfolioStore for RejectingCommitStore {
    fn read<T>(&self, view: impl FnOnce(&PortfolioTables) -> T) -> Result<T, RepositoryError> {
        self.inner.read(view)
    }

    fn transaction<T, E>(
        &self,
        work: impl FnOnce(&mut PortfolioTables) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepositoryError>,
    {
        if !self.reject.load(Ordering::SeqCst) {
            return self.inner.transaction(work);
        }
        let mut staged = self.inner.read(|tables| tables.clone())?;
        work(&mut staged)?;
        Err(RepositoryError::CommitRejected("disk full".to_string()).into())
    }
}

#[derive(Debug, Default)]
pub(super) struct UnavailableStore;

impl PortfolioStore for UnavailableStore {
    fn read<T>(&self, _view: impl FnOnce(&PortfolioTables) -> T) -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    fn transaction<T, E>(
        &self,
        _work: impl FnOnce(&mut PortfolioTables) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("connection refused".to_string()).into())
    }
}

pub(super) fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("request builds")
}

pub(super) fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request builds")
}

pub(super) async fn send(router: &Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router responds")
}

pub(super) async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}
