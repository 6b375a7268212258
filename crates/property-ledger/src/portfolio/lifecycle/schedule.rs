use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::portfolio::domain::PaymentStatus;

/// Fixed spacing between installments. Deliberately not calendar-month aware.
pub const PAYMENT_INTERVAL_DAYS: i64 = 30;

/// Upper bound on installments per lease (thirty years of monthly rent).
pub const MAX_PAYMENTS: u32 = 360;

/// An installment before it has been assigned storage identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledPayment {
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
}

/// Splits `total_rent` into `count` equal installments due every
/// [`PAYMENT_INTERVAL_DAYS`] days from `start`.
///
/// The split is not remainder-adjusted: every installment carries
/// `total_rent / count`. `overrides[i]` replaces the default `due` status of
/// installment `i`; surplus overrides are ignored.
///
/// Returns `None` when a due date would fall outside the supported calendar.
pub fn build_schedule(
    total_rent: f64,
    start: NaiveDate,
    count: u32,
    overrides: &[PaymentStatus],
) -> Option<Vec<ScheduledPayment>> {
    if count == 0 {
        return Some(Vec::new());
    }
    let amount = total_rent / f64::from(count);

    (0..count)
        .map(|index| {
            let offset = Duration::days(PAYMENT_INTERVAL_DAYS * i64::from(index));
            let due_date = start.checked_add_signed(offset)?;
            let status = overrides
                .get(index as usize)
                .copied()
                .unwrap_or(PaymentStatus::Due);
            Some(ScheduledPayment {
                amount,
                due_date,
                status,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn yearly_lease_splits_into_thirty_day_installments() {
        let schedule = build_schedule(12_000.0, date(2025, 1, 1), 12, &[]).expect("schedule");

        assert_eq!(schedule.len(), 12);
        assert!(schedule.iter().all(|payment| payment.amount == 1_000.0));
        assert!(schedule
            .iter()
            .all(|payment| payment.status == PaymentStatus::Due));
        let dates: Vec<NaiveDate> = schedule.iter().take(3).map(|p| p.due_date).collect();
        assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 1, 31), date(2025, 3, 2)]);
        assert_eq!(schedule[11].due_date, date(2025, 11, 27));
    }

    #[test]
    fn uneven_split_is_not_remainder_adjusted() {
        let schedule = build_schedule(1_000.0, date(2025, 1, 1), 3, &[]).expect("schedule");
        let expected = 1_000.0 / 3.0;
        assert!(schedule.iter().all(|payment| payment.amount == expected));
        let total: f64 = schedule.iter().map(|payment| payment.amount).sum();
        assert!((total - 1_000.0).abs() < 1e-6);
    }

    #[test]
    fn sums_match_total_rent_for_many_splits() {
        for count in 1..=MAX_PAYMENTS {
            let schedule =
                build_schedule(9_876.54, date(2025, 6, 15), count, &[]).expect("schedule");
            assert_eq!(schedule.len(), count as usize);
            let total: f64 = schedule.iter().map(|payment| payment.amount).sum();
            assert!(
                (total - 9_876.54).abs() < 1e-6,
                "count {count} summed to {total}"
            );
        }
    }

    #[test]
    fn overrides_apply_by_index() {
        let schedule = build_schedule(
            900.0,
            date(2025, 1, 1),
            3,
            &[PaymentStatus::Paid, PaymentStatus::Due, PaymentStatus::Paid, PaymentStatus::Paid],
        )
        .expect("schedule");
        let statuses: Vec<PaymentStatus> = schedule.iter().map(|p| p.status).collect();
        assert_eq!(
            statuses,
            vec![PaymentStatus::Paid, PaymentStatus::Due, PaymentStatus::Paid]
        );
    }

    #[test]
    fn rejects_dates_beyond_calendar() {
        assert!(build_schedule(100.0, NaiveDate::MAX, 2, &[]).is_none());
    }
}
