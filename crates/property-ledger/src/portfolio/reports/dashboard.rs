use chrono::NaiveDate;
use serde::Serialize;

use crate::portfolio::domain::{OccupancyStatus, PaymentStatus, PropertyId};
use crate::portfolio::repository::PropertyLedger;

use super::income::{percentage, sum_with_status};
use super::round1;

/// Payments per property that feed the activity list.
pub const RECENT_PAYMENTS_PER_PROPERTY: usize = 5;

/// Leases ending within this many days are flagged.
pub const EXPIRY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyStats {
    pub total: usize,
    pub occupied: usize,
    pub vacant: usize,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialStats {
    pub total_collected: f64,
    pub total_pending: f64,
    pub total_expected: f64,
    pub collection_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentActivity {
    pub property: String,
    pub tenant: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaseExpiration {
    pub property: String,
    pub tenant: String,
    pub expiry_date: NaiveDate,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverduePayment {
    pub property: String,
    pub tenant: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRef {
    pub property_id: PropertyId,
    pub street_name: String,
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    pub property_stats: PropertyStats,
    pub financial_stats: FinancialStats,
    pub recent_activities: Vec<RecentActivity>,
    pub upcoming_expirations: Vec<LeaseExpiration>,
    pub overdue_payments: Vec<OverduePayment>,
    pub properties: Vec<PropertyRef>,
}

pub fn property_stats(ledgers: &[PropertyLedger<'_>]) -> PropertyStats {
    let total = ledgers.len();
    let occupied = ledgers
        .iter()
        .filter(|ledger| ledger.property.occupancy_status == OccupancyStatus::Occupied)
        .count();
    PropertyStats {
        total,
        occupied,
        vacant: total - occupied,
        occupancy_rate: round1(percentage(occupied as f64, total as f64)),
    }
}

/// Builds the owner dashboard. Only properties with a current tenancy
/// contribute to the financial figures and feeds.
pub fn dashboard(ledgers: &[PropertyLedger<'_>], today: NaiveDate) -> Dashboard {
    let mut financial = FinancialStats::default();
    let mut recent_activities = Vec::new();
    let mut upcoming_expirations = Vec::new();
    let mut overdue_payments = Vec::new();

    for ledger in ledgers {
        let Some(occupancy) = ledger.occupancy else {
            continue;
        };
        let street = &ledger.property.street_name;

        financial.total_expected += ledger.property.rent_per_month;
        financial.total_collected += sum_with_status(ledger, PaymentStatus::Paid);
        financial.total_pending += sum_with_status(ledger, PaymentStatus::Due);

        let mut latest = ledger.payments.clone();
        latest.sort_by(|a, b| b.due_date.cmp(&a.due_date));
        recent_activities.extend(latest.into_iter().take(RECENT_PAYMENTS_PER_PROPERTY).map(
            |payment| RecentActivity {
                property: street.clone(),
                tenant: occupancy.tenant_name.clone(),
                amount: payment.amount,
                due_date: payment.due_date,
                status: payment.status,
            },
        ));

        let days_remaining = (occupancy.lease_end_date - today).num_days();
        if (0..=EXPIRY_WINDOW_DAYS).contains(&days_remaining) {
            upcoming_expirations.push(LeaseExpiration {
                property: street.clone(),
                tenant: occupancy.tenant_name.clone(),
                expiry_date: occupancy.lease_end_date,
                days_remaining,
            });
        }

        overdue_payments.extend(
            ledger
                .payments
                .iter()
                .filter(|payment| payment.is_overdue(today))
                .map(|payment| OverduePayment {
                    property: street.clone(),
                    tenant: occupancy.tenant_name.clone(),
                    amount: payment.amount,
                    due_date: payment.due_date,
                    days_overdue: (today - payment.due_date).num_days(),
                }),
        );
    }
    financial.collection_rate = round1(percentage(
        financial.total_collected,
        financial.total_expected,
    ));

    Dashboard {
        property_stats: property_stats(ledgers),
        financial_stats: financial,
        recent_activities,
        upcoming_expirations,
        overdue_payments,
        properties: ledgers
            .iter()
            .map(|ledger| PropertyRef {
                property_id: ledger.property.property_id.clone(),
                street_name: ledger.property.street_name.clone(),
                city: ledger.property.city.clone(),
            })
            .collect(),
    }
}
