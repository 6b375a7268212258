use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::documents::DocumentStore;
use super::domain::{
    NotificationPeriod, NotificationRule, NotificationType, OwnerId, PaymentStatus, PropertyId,
    RuleId,
};
use super::repository::{PortfolioStore, PropertyLedger};
use super::service::{PortfolioError, PortfolioService};

/// Payload for creating or refreshing a reminder rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationRuleRequest {
    #[serde(default)]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub notification_period: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaseRenewalAlert {
    pub property_id: PropertyId,
    pub street_name: String,
    pub lease_end_date: NaiveDate,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentDueAlert {
    pub property_id: PropertyId,
    pub street_name: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub days_until_due: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationDigest {
    pub lease_renewals: Vec<LeaseRenewalAlert>,
    pub payment_dues: Vec<PaymentDueAlert>,
}

impl NotificationDigest {
    pub fn is_empty(&self) -> bool {
        self.lease_renewals.is_empty() && self.payment_dues.is_empty()
    }
}

/// Evaluates active rules against each property's current tenancy.
///
/// A window is inclusive on both ends: an event `period` days away alerts,
/// one already past does not. Properties without a tenancy are skipped.
pub fn evaluate<'a>(
    entries: impl IntoIterator<Item = (&'a NotificationRule, PropertyLedger<'a>)>,
    today: NaiveDate,
) -> NotificationDigest {
    let mut digest = NotificationDigest::default();

    for (rule, ledger) in entries {
        if !rule.is_active {
            continue;
        }
        let Some(occupancy) = ledger.occupancy else {
            continue;
        };
        let window = 0..=rule.notification_period.days();
        let property = ledger.property;

        match rule.notification_type {
            NotificationType::LeaseRenewal => {
                let days_remaining = (occupancy.lease_end_date - today).num_days();
                if window.contains(&days_remaining) {
                    digest.lease_renewals.push(LeaseRenewalAlert {
                        property_id: property.property_id.clone(),
                        street_name: property.street_name.clone(),
                        lease_end_date: occupancy.lease_end_date,
                        days_remaining,
                    });
                }
            }
            NotificationType::Payment => {
                for payment in &ledger.payments {
                    if payment.status != PaymentStatus::Due {
                        continue;
                    }
                    let days_until_due = (payment.due_date - today).num_days();
                    if window.contains(&days_until_due) {
                        digest.payment_dues.push(PaymentDueAlert {
                            property_id: property.property_id.clone(),
                            street_name: property.street_name.clone(),
                            amount: payment.amount,
                            due_date: payment.due_date,
                            days_until_due,
                        });
                    }
                }
            }
        }
    }

    digest
}

fn parse_rule_type(raw: &str) -> Result<NotificationType, PortfolioError> {
    NotificationType::from_label(raw)
        .ok_or_else(|| PortfolioError::validation("Invalid notification type"))
}

impl<S, D> PortfolioService<S, D>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    /// Creates the rule for `(property, type)` or, when one exists, updates
    /// its period and reactivates it.
    pub fn save_notification_rule(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
        request: NotificationRuleRequest,
    ) -> Result<NotificationRule, PortfolioError> {
        let (Some(raw_type), Some(raw_period)) =
            (request.notification_type, request.notification_period)
        else {
            return Err(PortfolioError::validation("Missing required fields"));
        };
        let period = NotificationPeriod::new(raw_period)
            .ok_or_else(|| PortfolioError::validation("Invalid notification period"))?;
        let kind = parse_rule_type(&raw_type)?;

        let rule = self.store.transaction(|tables| {
            tables
                .owned_property(owner, property_id)
                .ok_or(PortfolioError::NotFound)?;
            if let Some(existing) = tables.rule_mut(property_id, kind) {
                existing.notification_period = period;
                existing.is_active = true;
                return Ok(existing.clone());
            }
            let rule = NotificationRule {
                notification_id: RuleId(tables.next_id()),
                property_id: property_id.clone(),
                notification_type: kind,
                notification_period: period,
                is_active: true,
                created_at: Utc::now(),
            };
            tables.insert_rule(rule.clone());
            Ok::<_, PortfolioError>(rule)
        })?;

        info!(
            property_id = %property_id,
            notification_type = kind.label(),
            period_days = period.days(),
            "notification rule saved"
        );
        Ok(rule)
    }

    pub fn notification_rules(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
    ) -> Result<Vec<NotificationRule>, PortfolioError> {
        self.read(|tables| {
            tables.owned_property(owner, property_id).map(|_| {
                tables
                    .rules_for(property_id)
                    .into_iter()
                    .filter(|rule| rule.is_active)
                    .cloned()
                    .collect()
            })
        })?
        .ok_or(PortfolioError::NotFound)
    }

    pub fn disable_notification_rule(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
        notification_type: Option<&str>,
    ) -> Result<NotificationRule, PortfolioError> {
        let kind = notification_type
            .ok_or_else(|| PortfolioError::validation("Missing notification type"))
            .and_then(parse_rule_type)?;

        let rule = self.store.transaction(|tables| {
            tables
                .owned_property(owner, property_id)
                .ok_or(PortfolioError::NotFound)?;
            let rule = tables
                .rule_mut(property_id, kind)
                .ok_or(PortfolioError::NotFound)?;
            rule.is_active = false;
            Ok::<_, PortfolioError>(rule.clone())
        })?;

        info!(property_id = %property_id, notification_type = kind.label(), "notification rule disabled");
        Ok(rule)
    }

    pub fn evaluate_notifications(
        &self,
        owner: OwnerId,
        today: NaiveDate,
    ) -> Result<NotificationDigest, PortfolioError> {
        self.read(|tables| {
            let entries = tables.properties_of(owner).flat_map(|property| {
                tables
                    .rules_for(&property.property_id)
                    .into_iter()
                    .map(move |rule| (rule, tables.ledger(property)))
            });
            evaluate(entries, today)
        })
    }
}
