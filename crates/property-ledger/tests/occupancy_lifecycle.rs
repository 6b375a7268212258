use chrono::NaiveDate;
use property_ledger::portfolio::{
    InMemoryDocumentStore, InMemoryPortfolioStore, OccupancyRequest, OccupancyStatus,
    OccupancyUpdate, OwnerId, PaymentStatus, PortfolioError, PortfolioPolicy, PortfolioService,
    PropertyId, PropertyRequest, SignupRequest,
};
use std::sync::Arc;

type Service = PortfolioService<InMemoryPortfolioStore, InMemoryDocumentStore>;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn portfolio() -> (Service, OwnerId, PropertyId) {
    let service = PortfolioService::new(
        Arc::new(InMemoryPortfolioStore::new()),
        Arc::new(InMemoryDocumentStore::default()),
        PortfolioPolicy {
            hash_memory_kib: 8,
            hash_iterations: 1,
            ..PortfolioPolicy::default()
        },
    );
    let owner = service
        .register(SignupRequest {
            full_name: Some("Avery Stone".to_string()),
            email: Some("avery@example.com".to_string()),
            password: Some("long-enough-secret".to_string()),
            phone_number: Some("555-0111".to_string()),
        })
        .expect("owner registers")
        .owner_id;
    let property = service
        .add_property(
            owner,
            PropertyRequest {
                property_type: Some("duplex".to_string()),
                street_name: Some("88 Birch Way".to_string()),
                city: Some("Lakeside".to_string()),
                building_details: None,
                size_sqft: Some(1_100.0),
                bedrooms: Some(3),
                units: Some(2),
                rent_per_month: Some(1_500.0),
            },
        )
        .expect("property added")
        .property_id;
    (service, owner, property)
}

fn lease(start: &str, end: &str, total_rent: f64, payments: i64) -> OccupancyRequest {
    OccupancyRequest {
        tenant_name: Some("Quinn Park".to_string()),
        tenant_phone: Some("555-0123".to_string()),
        tenant_email: Some("quinn@example.com".to_string()),
        lease_start_date: Some(start.to_string()),
        lease_end_date: Some(end.to_string()),
        total_rent: Some(total_rent),
        number_of_payments: Some(payments),
        payments: Vec::new(),
    }
}

#[test]
fn tenancy_runs_from_move_in_to_move_out() {
    let (service, owner, property) = portfolio();
    let today = date(2025, 3, 1);

    let created = service
        .create_occupancy(owner, &property, lease("2025-03-01", "2026-02-28", 18_000.0, 12), today)
        .expect("tenancy created");
    assert_eq!(created.schedule.len(), 12);
    assert_eq!(created.schedule[0].due_date, today);
    let scheduled: f64 = created.schedule.iter().map(|payment| payment.amount).sum();
    assert!((scheduled - 18_000.0).abs() < 1e-6);
    assert_eq!(
        service.property(owner, &property).expect("property").occupancy_status,
        OccupancyStatus::Occupied
    );

    for payment in created.schedule.iter().take(2) {
        service
            .set_payment_status(owner, created.occupancy_id, payment.payment_id, "paid")
            .expect("paid");
    }
    let income = service
        .income_summary(owner, &property, date(2025, 4, 20))
        .expect("income");
    assert_eq!(income.total_paid, 3_000.0);
    assert_eq!(income.total_due, 15_000.0);
    assert!(income.overdue_payments.is_empty());

    let ended = service.end_occupancy(owner, &property).expect("ended");
    assert_eq!(ended.payments_removed, 12);
    assert_eq!(
        service.property(owner, &property).expect("property").occupancy_status,
        OccupancyStatus::Vacant
    );
    assert!(matches!(
        service.occupancy_detail(owner, created.occupancy_id),
        Err(PortfolioError::NotFound)
    ));
    assert_eq!(
        service.income_summary(owner, &property, today).expect("income").total_rent,
        0.0
    );

    service
        .create_occupancy(owner, &property, lease("2026-03-01", "2027-02-28", 19_200.0, 12), today)
        .expect("property can be let again");
}

#[test]
fn pinned_updates_detect_concurrent_edits() {
    let (service, owner, property) = portfolio();
    let today = date(2025, 3, 1);
    let created = service
        .create_occupancy(owner, &property, lease("2025-03-01", "2026-02-28", 12_000.0, 12), today)
        .expect("tenancy created");
    let version = service
        .occupancy_detail(owner, created.occupancy_id)
        .expect("detail")
        .occupancy
        .version;

    let first = service
        .update_occupancy(
            owner,
            created.occupancy_id,
            OccupancyUpdate {
                tenant_phone: Some("555-0999".to_string()),
                expected_version: Some(version),
                ..OccupancyUpdate::default()
            },
        )
        .expect("first writer wins");
    assert_eq!(first.version, version + 1);

    let second = service.update_occupancy(
        owner,
        created.occupancy_id,
        OccupancyUpdate {
            tenant_phone: Some("555-0888".to_string()),
            expected_version: Some(version),
            ..OccupancyUpdate::default()
        },
    );
    assert!(matches!(second, Err(PortfolioError::Conflict(_))));
    assert_eq!(
        service
            .occupancy_detail(owner, created.occupancy_id)
            .expect("detail")
            .occupancy
            .tenant_phone,
        "555-0999"
    );
}

#[test]
fn regenerating_the_schedule_resets_statuses() {
    let (service, owner, property) = portfolio();
    let today = date(2025, 3, 1);
    let created = service
        .create_occupancy(owner, &property, lease("2025-03-01", "2026-02-28", 12_000.0, 12), today)
        .expect("tenancy created");
    service
        .set_payment_status(owner, created.occupancy_id, created.schedule[0].payment_id, "paid")
        .expect("paid");

    service
        .update_occupancy(
            owner,
            created.occupancy_id,
            OccupancyUpdate {
                number_of_payments: Some(4),
                ..OccupancyUpdate::default()
            },
        )
        .expect("regenerated");

    let payments = service
        .payments(owner, created.occupancy_id)
        .expect("payments");
    assert_eq!(payments.len(), 4);
    assert!(payments.iter().all(|payment| payment.amount == 3_000.0));
    assert!(payments
        .iter()
        .all(|payment| payment.status == PaymentStatus::Due));
}
