use chrono::NaiveDate;
use serde::Serialize;

use crate::portfolio::domain::PaymentStatus;
use crate::portfolio::repository::PropertyLedger;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueLine {
    pub amount: f64,
    pub due_date: NaiveDate,
}

/// Collection state of a property's current tenancy on a given day.
///
/// A property without a tenancy reports the zeroed default.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IncomeSummary {
    pub total_rent: f64,
    pub total_paid: f64,
    pub total_due: f64,
    pub payment_percentage: f64,
    pub overdue_amount: f64,
    pub overdue_payments: Vec<OverdueLine>,
}

pub fn income_summary(ledger: &PropertyLedger<'_>, today: NaiveDate) -> IncomeSummary {
    let Some(occupancy) = ledger.occupancy else {
        return IncomeSummary::default();
    };

    let total_paid = sum_with_status(ledger, PaymentStatus::Paid);
    let total_due = sum_with_status(ledger, PaymentStatus::Due);
    let overdue_payments: Vec<OverdueLine> = ledger
        .payments
        .iter()
        .filter(|payment| payment.is_overdue(today))
        .map(|payment| OverdueLine {
            amount: payment.amount,
            due_date: payment.due_date,
        })
        .collect();
    let overdue_amount = overdue_payments.iter().map(|line| line.amount).sum();

    IncomeSummary {
        total_rent: occupancy.total_rent,
        total_paid,
        total_due,
        payment_percentage: percentage(total_paid, occupancy.total_rent),
        overdue_amount,
        overdue_payments,
    }
}

/// Totals shown on the property detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub total_rent: f64,
    pub total_paid: f64,
    pub total_due: f64,
    pub payment_percentage: f64,
}

impl From<&IncomeSummary> for FinancialSummary {
    fn from(summary: &IncomeSummary) -> Self {
        Self {
            total_rent: summary.total_rent,
            total_paid: summary.total_paid,
            total_due: summary.total_due,
            payment_percentage: summary.payment_percentage,
        }
    }
}

pub(crate) fn sum_with_status(ledger: &PropertyLedger<'_>, status: PaymentStatus) -> f64 {
    ledger
        .payments
        .iter()
        .filter(|payment| payment.status == status)
        .map(|payment| payment.amount)
        .sum()
}

pub(crate) fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
