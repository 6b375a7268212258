use super::common::*;
use crate::portfolio::{
    NotificationRuleRequest, NotificationType, PortfolioError, PropertyId,
};

fn rule(kind: &str, period: i64) -> NotificationRuleRequest {
    NotificationRuleRequest {
        notification_type: Some(kind.to_string()),
        notification_period: Some(period),
    }
}

#[test]
fn saving_twice_keeps_one_rule_with_latest_period() {
    let (service, owner, property, _) = occupied_fixture();

    service
        .save_notification_rule(owner, &property, rule("lease_renewal", 30))
        .expect("first save");
    let refreshed = service
        .save_notification_rule(owner, &property, rule("lease_renewal", 15))
        .expect("second save");

    let rules = service
        .notification_rules(owner, &property)
        .expect("rules");
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].notification_id, refreshed.notification_id);
    assert_eq!(rules[0].notification_period.days(), 15);
    assert!(rules[0].is_active);
}

#[test]
fn rule_input_is_validated_before_lookup() {
    let (service, owner, property, _) = occupied_fixture();
    let cases = [
        (NotificationRuleRequest::default(), "Missing required fields"),
        (
            NotificationRuleRequest {
                notification_type: Some("payment".to_string()),
                notification_period: None,
            },
            "Missing required fields",
        ),
        (rule("payment", 10), "Invalid notification period"),
        (rule("eviction", 10), "Invalid notification period"),
        (rule("eviction", 30), "Invalid notification type"),
    ];

    for (request, expected) in cases {
        match service.save_notification_rule(owner, &property, request) {
            Err(PortfolioError::Validation(message)) => assert_eq!(message, expected),
            other => panic!("expected validation error {expected:?}, got {other:?}"),
        }
    }
}

#[test]
fn rules_on_foreign_property_are_not_found() {
    let (service, _, property, _) = occupied_fixture();
    let intruder = register_owner(&service, "mallory@example.com");

    assert!(matches!(
        service.save_notification_rule(intruder, &property, rule("payment", 7)),
        Err(PortfolioError::NotFound)
    ));
    assert!(matches!(
        service.notification_rules(intruder, &property),
        Err(PortfolioError::NotFound)
    ));
}

#[test]
fn disabled_rules_stop_alerting_until_saved_again() {
    let (service, owner, property, _) = occupied_fixture();
    service
        .save_notification_rule(owner, &property, rule("payment", 7))
        .expect("saved");

    let disabled = service
        .disable_notification_rule(owner, &property, Some("payment"))
        .expect("disabled");
    assert!(!disabled.is_active);
    assert!(service
        .notification_rules(owner, &property)
        .expect("rules")
        .is_empty());
    assert!(service
        .evaluate_notifications(owner, date(2025, 1, 28))
        .expect("digest")
        .is_empty());

    let revived = service
        .save_notification_rule(owner, &property, rule("payment", 7))
        .expect("revived");
    assert_eq!(revived.notification_id, disabled.notification_id);
    assert!(revived.is_active);
}

#[test]
fn disabling_requires_type_and_existing_rule() {
    let (service, owner, property, _) = occupied_fixture();

    match service.disable_notification_rule(owner, &property, None) {
        Err(PortfolioError::Validation(message)) => {
            assert_eq!(message, "Missing notification type")
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(matches!(
        service.disable_notification_rule(owner, &property, Some("lease_renewal")),
        Err(PortfolioError::NotFound)
    ));
    assert!(matches!(
        service.disable_notification_rule(
            owner,
            &PropertyId("missing".to_string()),
            Some("payment")
        ),
        Err(PortfolioError::NotFound)
    ));
}

#[test]
fn payment_window_includes_both_ends() {
    let (service, owner, property, occupancy_id) = occupied_fixture();
    service
        .save_notification_rule(owner, &property, rule("payment", 7))
        .expect("saved");
    let payments = service.payments(owner, occupancy_id).expect("payments");
    service
        .set_payment_status(owner, occupancy_id, payments[0].payment_id, "paid")
        .expect("paid");

    // 2025-01-24 is exactly seven days before the 2025-01-31 installment.
    let digest = service
        .evaluate_notifications(owner, date(2025, 1, 24))
        .expect("digest");
    assert_eq!(digest.payment_dues.len(), 1);
    assert_eq!(digest.payment_dues[0].due_date, date(2025, 1, 31));
    assert_eq!(digest.payment_dues[0].days_until_due, 7);
    assert!(digest.lease_renewals.is_empty());

    let too_early = service
        .evaluate_notifications(owner, date(2025, 1, 23))
        .expect("digest");
    assert!(too_early.payment_dues.is_empty());

    let same_day = service
        .evaluate_notifications(owner, date(2025, 1, 31))
        .expect("digest");
    assert_eq!(same_day.payment_dues.len(), 1);
    assert_eq!(same_day.payment_dues[0].days_until_due, 0);
}

#[test]
fn lease_renewal_alerts_inside_period() {
    let (service, owner, property, _) = occupied_fixture();
    let saved = service
        .save_notification_rule(owner, &property, rule("lease_renewal", 30))
        .expect("saved");
    assert_eq!(saved.notification_type, NotificationType::LeaseRenewal);

    let digest = service
        .evaluate_notifications(owner, date(2025, 12, 10))
        .expect("digest");
    assert_eq!(digest.lease_renewals.len(), 1);
    assert_eq!(digest.lease_renewals[0].days_remaining, 21);
    assert_eq!(digest.lease_renewals[0].street_name, "12 Elm Street");

    let after_end = service
        .evaluate_notifications(owner, date(2026, 1, 2))
        .expect("digest");
    assert!(after_end.lease_renewals.is_empty());
}

#[test]
fn vacant_properties_never_alert() {
    let (service, _) = build_service();
    let owner = register_owner(&service, "dana@example.com");
    let property = add_property(&service, owner, "7 Vacant Court");
    service
        .save_notification_rule(owner, &property, rule("lease_renewal", 30))
        .expect("saved");
    service
        .save_notification_rule(owner, &property, rule("payment", 30))
        .expect("saved");

    let digest = service
        .evaluate_notifications(owner, lease_start())
        .expect("digest");
    assert!(digest.is_empty());
}
