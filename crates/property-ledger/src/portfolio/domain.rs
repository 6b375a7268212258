use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential identifier of a registered owner account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u64);

/// Opaque property key handed out on creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub String);

impl PropertyId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccupancyId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub u64);

/// Landlord account. The credential hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: OwnerId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyStatus {
    Vacant,
    Occupied,
}

impl OccupancyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Vacant => "vacant",
            Self::Occupied => "occupied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub property_id: PropertyId,
    #[serde(skip)]
    pub owner_id: OwnerId,
    pub property_type: String,
    pub street_name: String,
    pub city: String,
    pub building_details: Option<String>,
    pub size_sqft: f64,
    pub bedrooms: u32,
    pub units: u32,
    pub rent_per_month: f64,
    pub occupancy_status: OccupancyStatus,
}

impl Property {
    pub fn address(&self) -> String {
        format!("{}, {}", self.street_name, self.city)
    }

    pub fn is_owned_by(&self, owner: OwnerId) -> bool {
        self.owner_id == owner
    }
}

/// A tenancy on one property for one lease interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occupancy {
    pub occupancy_id: OccupancyId,
    pub property_id: PropertyId,
    pub tenant_name: String,
    pub tenant_phone: String,
    pub tenant_email: String,
    pub lease_start_date: NaiveDate,
    pub lease_end_date: NaiveDate,
    pub total_rent: f64,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Due,
    Paid,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Due => "due",
            Self::Paid => "paid",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim() {
            "due" => Some(Self::Due),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

/// One scheduled installment of an occupancy's total rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub occupancy_id: OccupancyId,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
}

impl Payment {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == PaymentStatus::Due && self.due_date < today
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub document_id: DocumentId,
    pub property_id: PropertyId,
    pub title: String,
    #[serde(skip)]
    pub file_path: String,
    pub upload_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    LeaseRenewal,
    Payment,
}

impl NotificationType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::LeaseRenewal => "lease_renewal",
            Self::Payment => "payment",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim() {
            "lease_renewal" => Some(Self::LeaseRenewal),
            "payment" => Some(Self::Payment),
            _ => None,
        }
    }
}

/// Reminder lead time in days; only 7, 15 and 30 are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NotificationPeriod(u8);

impl NotificationPeriod {
    pub const ALLOWED: [u8; 3] = [7, 15, 30];

    pub fn new(days: i64) -> Option<Self> {
        Self::ALLOWED
            .into_iter()
            .find(|allowed| i64::from(*allowed) == days)
            .map(Self)
    }

    pub const fn days(self) -> i64 {
        self.0 as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRule {
    pub notification_id: RuleId,
    #[serde(skip)]
    pub property_id: PropertyId,
    pub notification_type: NotificationType,
    pub notification_period: NotificationPeriod,
    pub is_active: bool,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

/// Where an occupancy sits relative to an evaluation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupantStatus {
    Pending,
    Active,
    Inactive,
}

impl OccupantStatus {
    /// Lease days on either boundary count as active.
    pub fn classify(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Self {
        if start > today {
            Self::Pending
        } else if end < today {
            Self::Inactive
        } else {
            Self::Active
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// Parses a `YYYY-MM-DD` boundary date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn notification_period_accepts_only_offered_lead_times() {
        assert_eq!(NotificationPeriod::new(15).map(NotificationPeriod::days), Some(15));
        assert!(NotificationPeriod::new(14).is_none());
        assert!(NotificationPeriod::new(-7).is_none());
    }

    #[test]
    fn classification_boundaries_map_to_active() {
        let start = date(2025, 1, 1);
        let end = date(2025, 12, 31);
        assert_eq!(OccupantStatus::classify(start, end, start), OccupantStatus::Active);
        assert_eq!(OccupantStatus::classify(start, end, end), OccupantStatus::Active);
        assert_eq!(
            OccupantStatus::classify(start, end, date(2024, 12, 31)),
            OccupantStatus::Pending
        );
        assert_eq!(
            OccupantStatus::classify(start, end, date(2026, 1, 1)),
            OccupantStatus::Inactive
        );
    }

    #[test]
    fn payment_status_labels_round_trip() {
        for status in [PaymentStatus::Due, PaymentStatus::Paid] {
            assert_eq!(PaymentStatus::from_label(status.label()), Some(status));
        }
        assert_eq!(PaymentStatus::from_label("refunded"), None);
    }

    #[test]
    fn overdue_requires_due_status_and_past_date() {
        let mut payment = Payment {
            payment_id: PaymentId(1),
            occupancy_id: OccupancyId(1),
            amount: 500.0,
            due_date: date(2025, 3, 1),
            status: PaymentStatus::Due,
        };
        assert!(payment.is_overdue(date(2025, 3, 2)));
        assert!(!payment.is_overdue(date(2025, 3, 1)));
        payment.status = PaymentStatus::Paid;
        assert!(!payment.is_overdue(date(2025, 3, 2)));
    }
}
