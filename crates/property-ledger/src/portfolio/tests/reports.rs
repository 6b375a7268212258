use super::common::*;
use crate::portfolio::{
    IncomeSummary, OccupancyRequest, OccupantStatus, PaymentStatus, PortfolioError, PropertyId,
};

#[test]
fn half_paid_lease_with_overdue_installment() {
    let (service, _) = build_service();
    let owner = register_owner(&service, "dana@example.com");
    let property = add_property(&service, owner, "12 Elm Street");
    let created = service
        .create_occupancy(owner, &property, lease(1_000.0, 2), lease_start())
        .expect("created");
    service
        .set_payment_status(owner, created.occupancy_id, created.schedule[0].payment_id, "paid")
        .expect("paid");

    let summary = service
        .income_summary(owner, &property, date(2025, 2, 5))
        .expect("summary");

    assert_eq!(summary.total_rent, 1_000.0);
    assert_eq!(summary.total_paid, 500.0);
    assert_eq!(summary.total_due, 500.0);
    assert_eq!(summary.overdue_amount, 500.0);
    assert_eq!(summary.payment_percentage, 50.0);
    assert_eq!(summary.overdue_payments.len(), 1);
    assert_eq!(summary.overdue_payments[0].due_date, date(2025, 1, 31));
}

#[test]
fn vacant_property_reports_zeroed_income() {
    let (service, _) = build_service();
    let owner = register_owner(&service, "dana@example.com");
    let property = add_property(&service, owner, "12 Elm Street");

    let summary = service
        .income_summary(owner, &property, lease_start())
        .expect("summary");

    assert_eq!(summary, IncomeSummary::default());
    assert_eq!(summary.payment_percentage, 0.0);
}

#[test]
fn income_of_foreign_property_is_not_found() {
    let (service, _, property, _) = occupied_fixture();
    let intruder = register_owner(&service, "mallory@example.com");

    assert!(matches!(
        service.income_summary(intruder, &property, lease_start()),
        Err(PortfolioError::NotFound)
    ));
    assert!(matches!(
        service.income_summary(intruder, &PropertyId("missing".to_string()), lease_start()),
        Err(PortfolioError::NotFound)
    ));
}

#[test]
fn empty_portfolio_dashboard_is_zeroed() {
    let (service, _) = build_service();
    let owner = register_owner(&service, "dana@example.com");

    let dashboard = service.dashboard(owner, lease_start()).expect("dashboard");

    assert_eq!(dashboard.property_stats.total, 0);
    assert_eq!(dashboard.property_stats.occupancy_rate, 0.0);
    assert_eq!(dashboard.financial_stats.collection_rate, 0.0);
    assert!(dashboard.recent_activities.is_empty());
    assert!(dashboard.properties.is_empty());
}

#[test]
fn dashboard_aggregates_occupied_properties_only() {
    let (service, owner, occupied, occupancy_id) = occupied_fixture();
    add_property(&service, owner, "7 Vacant Court");
    add_property(&service, owner, "9 Empty Row");
    let first = service.payments(owner, occupancy_id).expect("payments")[0].payment_id;
    service
        .set_payment_status(owner, occupancy_id, first, "paid")
        .expect("paid");
    let today = date(2025, 2, 10);

    let dashboard = service.dashboard(owner, today).expect("dashboard");

    assert_eq!(dashboard.property_stats.total, 3);
    assert_eq!(dashboard.property_stats.occupied, 1);
    assert_eq!(dashboard.property_stats.vacant, 2);
    assert_eq!(dashboard.property_stats.occupancy_rate, 33.3);

    assert_eq!(dashboard.financial_stats.total_collected, 1_000.0);
    assert_eq!(dashboard.financial_stats.total_pending, 11_000.0);
    assert_eq!(dashboard.financial_stats.total_expected, 1_000.0);
    assert_eq!(dashboard.financial_stats.collection_rate, 100.0);

    assert_eq!(dashboard.recent_activities.len(), 5);
    assert_eq!(dashboard.recent_activities[0].due_date, date(2025, 11, 27));
    assert!(dashboard
        .recent_activities
        .windows(2)
        .all(|pair| pair[0].due_date >= pair[1].due_date));

    assert_eq!(dashboard.overdue_payments.len(), 1);
    assert_eq!(dashboard.overdue_payments[0].due_date, date(2025, 1, 31));
    assert_eq!(dashboard.overdue_payments[0].days_overdue, 10);
    assert_eq!(dashboard.overdue_payments[0].property, "12 Elm Street");

    assert!(dashboard.upcoming_expirations.is_empty());
    assert_eq!(dashboard.properties.len(), 3);
    assert!(dashboard
        .properties
        .iter()
        .any(|entry| entry.property_id == occupied));
}

#[test]
fn lease_expiry_window_is_thirty_days_inclusive() {
    let (service, owner, _, _) = occupied_fixture();

    let inside = service
        .dashboard(owner, date(2025, 12, 1))
        .expect("dashboard");
    assert_eq!(inside.upcoming_expirations.len(), 1);
    assert_eq!(inside.upcoming_expirations[0].days_remaining, 30);
    assert_eq!(inside.upcoming_expirations[0].tenant, "Jordan Reyes");

    let outside = service
        .dashboard(owner, date(2025, 11, 30))
        .expect("dashboard");
    assert!(outside.upcoming_expirations.is_empty());

    let expired = service
        .dashboard(owner, date(2026, 1, 1))
        .expect("dashboard");
    assert!(expired.upcoming_expirations.is_empty());
}

#[test]
fn full_details_and_summary_join_every_view() {
    let (service, owner, property, occupancy_id) = occupied_fixture();
    let first = service.payments(owner, occupancy_id).expect("payments")[0].payment_id;
    service
        .set_payment_status(owner, occupancy_id, first, "paid")
        .expect("paid");
    service
        .upload_document(
            owner,
            &property,
            Some("Lease".to_string()),
            "lease.pdf",
            b"%PDF-1.7",
            lease_start(),
        )
        .expect("uploaded");

    let details = service
        .property_full_details(owner, &property, lease_start())
        .expect("details");
    let occupancy = details.occupancy.expect("occupied");
    assert_eq!(occupancy.payments_completed, 1);
    assert_eq!(details.financial_summary.total_paid, 1_000.0);
    assert_eq!(details.documents.total_documents, 1);
    assert_eq!(details.documents.documents_list[0].title, "Lease");

    let summary = service
        .property_summary(owner, &property, lease_start())
        .expect("summary");
    assert_eq!(summary.document_count, 1);
    assert_eq!(summary.income_summary.total_rent, 12_000.0);
    assert_eq!(
        summary.occupancy.map(|occupancy| occupancy.occupancy_id),
        Some(occupancy_id)
    );
}

#[test]
fn occupants_are_classified_against_today() {
    let (service, _) = build_service();
    let owner = register_owner(&service, "dana@example.com");
    let current = add_property(&service, owner, "1 Current St");
    let future = add_property(&service, owner, "2 Future St");
    service
        .create_occupancy(owner, &current, lease(12_000.0, 12), lease_start())
        .expect("current");
    service
        .create_occupancy(
            owner,
            &future,
            OccupancyRequest {
                lease_start_date: Some("2025-06-01".to_string()),
                lease_end_date: Some("2026-05-31".to_string()),
                ..lease(6_000.0, 6)
            },
            lease_start(),
        )
        .expect("future");

    let today = date(2025, 3, 1);
    let occupants = service.occupants(owner, today).expect("occupants");
    assert_eq!(occupants.len(), 2);
    let current_row = occupants
        .iter()
        .find(|row| row.property_id == current)
        .expect("current row");
    assert_eq!(current_row.status, OccupantStatus::Active);
    assert_eq!(current_row.property_address, "1 Current St, Springfield");
    assert_eq!(current_row.payment_summary, "0/12 payments completed");
    let future_row = occupants
        .iter()
        .find(|row| row.property_id == future)
        .expect("future row");
    assert_eq!(future_row.status, OccupantStatus::Pending);

    let overview = service
        .occupants_overview(owner, date(2026, 1, 15))
        .expect("overview");
    assert_eq!(overview.total_occupants, 2);
    assert_eq!(overview.inactive_occupants, 1);
    assert_eq!(overview.active_occupants, 1);
    assert_eq!(overview.pending_occupants, 0);
}

#[test]
fn property_overview_counts_statuses() {
    let (service, owner, _, _) = occupied_fixture();
    add_property(&service, owner, "7 Vacant Court");

    let overview = service.property_overview(owner).expect("overview");

    assert_eq!(overview.total_properties, 2);
    assert_eq!(overview.occupied_properties, 1);
    assert_eq!(overview.vacant_properties, 1);
    assert_eq!(overview.occupancy_rate, 50.0);
}

#[test]
fn payment_percentage_can_exceed_one_hundred_after_rent_cut() {
    let (service, owner, _, occupancy_id) = occupied_fixture();
    let payments = service.payments(owner, occupancy_id).expect("payments");
    for payment in payments.iter().take(3) {
        service
            .set_payment_status(owner, occupancy_id, payment.payment_id, "paid")
            .expect("paid");
    }
    let property = service
        .occupancy_detail(owner, occupancy_id)
        .expect("detail")
        .occupancy
        .property_id;
    service
        .update_occupancy(
            owner,
            occupancy_id,
            crate::portfolio::OccupancyUpdate {
                total_rent: Some(2_000.0),
                ..Default::default()
            },
        )
        .expect("rent cut");

    let summary = service
        .income_summary(owner, &property, lease_start())
        .expect("summary");
    assert_eq!(summary.total_paid, 3_000.0);
    assert_eq!(summary.payment_percentage, 150.0);
    assert!(service
        .payments(owner, occupancy_id)
        .expect("payments")
        .iter()
        .take(3)
        .all(|payment| payment.status == PaymentStatus::Paid));
}
