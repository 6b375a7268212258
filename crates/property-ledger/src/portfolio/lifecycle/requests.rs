use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::portfolio::domain::{parse_date, PaymentStatus};
use crate::portfolio::service::PortfolioError;

use super::schedule::MAX_PAYMENTS;

/// Payload accepted when a vacant property takes a tenant.
///
/// Every field is optional at the type level so missing keys are reported by
/// [`OccupancyRequest::validate`] with the names of all absent fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccupancyRequest {
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub tenant_phone: Option<String>,
    #[serde(default)]
    pub tenant_email: Option<String>,
    #[serde(default)]
    pub lease_start_date: Option<String>,
    #[serde(default)]
    pub lease_end_date: Option<String>,
    #[serde(default)]
    pub total_rent: Option<f64>,
    #[serde(default)]
    pub number_of_payments: Option<i64>,
    /// Status overrides for back-dated imports, applied by schedule index.
    #[serde(default)]
    pub payments: Vec<PaymentOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentOverride {
    #[serde(default)]
    pub status: Option<String>,
}

/// Tenant contact block shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContact {
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOccupancy {
    pub tenant: TenantContact,
    pub lease_start_date: NaiveDate,
    pub lease_end_date: NaiveDate,
    pub total_rent: f64,
    pub number_of_payments: u32,
    pub overrides: Vec<PaymentStatus>,
}

impl OccupancyRequest {
    /// Applies the create rules in order and reports the first failure.
    pub fn validate(self, today: NaiveDate) -> Result<ValidatedOccupancy, PortfolioError> {
        let mut missing = Vec::new();
        let tenant_name = required_text(self.tenant_name, "tenant_name", &mut missing);
        let tenant_phone = required_text(self.tenant_phone, "tenant_phone", &mut missing);
        let tenant_email = required_text(self.tenant_email, "tenant_email", &mut missing);
        let start_raw = required_text(self.lease_start_date, "lease_start_date", &mut missing);
        let end_raw = required_text(self.lease_end_date, "lease_end_date", &mut missing);
        if self.total_rent.is_none() {
            missing.push("total_rent");
        }
        if self.number_of_payments.is_none() {
            missing.push("number_of_payments");
        }
        if !missing.is_empty() {
            return Err(PortfolioError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let lease_start_date = date_field(&start_raw, "lease_start_date")?;
        let lease_end_date = date_field(&end_raw, "lease_end_date")?;
        ensure_lease_order(lease_start_date, lease_end_date)?;
        if lease_start_date < today {
            return Err(PortfolioError::validation(
                "Lease start date cannot be in the past",
            ));
        }

        let total_rent = positive_rent(self.total_rent.unwrap_or_default())?;
        let number_of_payments = payment_count(self.number_of_payments.unwrap_or_default())?;

        let overrides = self
            .payments
            .into_iter()
            .map(|entry| match entry.status {
                None => Ok(PaymentStatus::Due),
                Some(raw) => payment_status(&raw),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedOccupancy {
            tenant: TenantContact {
                name: tenant_name,
                phone: tenant_phone,
                email: tenant_email,
            },
            lease_start_date,
            lease_end_date,
            total_rent,
            number_of_payments,
            overrides,
        })
    }
}

/// Allow-listed partial update of an occupancy. Unknown keys are rejected
/// during deserialization rather than silently assigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OccupancyUpdate {
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub tenant_phone: Option<String>,
    #[serde(default)]
    pub tenant_email: Option<String>,
    #[serde(default)]
    pub lease_start_date: Option<String>,
    #[serde(default)]
    pub lease_end_date: Option<String>,
    #[serde(default)]
    pub total_rent: Option<f64>,
    /// Regenerates the schedule when no replacement `payments` are given.
    #[serde(default)]
    pub number_of_payments: Option<i64>,
    /// Wholesale replacement of the schedule.
    #[serde(default)]
    pub payments: Option<Vec<PaymentReplacement>>,
    /// Optimistic concurrency token; must equal the stored row version.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentReplacement {
    pub amount: f64,
    #[serde(alias = "due_date")]
    pub date: String,
    pub status: String,
}

/// Parsed replacement installment.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementPayment {
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
}

/// Outcome of checking an update payload field by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedUpdate {
    pub tenant_name: Option<String>,
    pub tenant_phone: Option<String>,
    pub tenant_email: Option<String>,
    pub lease_start_date: Option<NaiveDate>,
    pub lease_end_date: Option<NaiveDate>,
    pub total_rent: Option<f64>,
    pub schedule: ScheduleChange,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScheduleChange {
    #[default]
    Keep,
    Regenerate(u32),
    Replace(Vec<ReplacementPayment>),
}

impl OccupancyUpdate {
    pub fn validate(self) -> Result<ValidatedUpdate, PortfolioError> {
        let tenant_name = optional_text(self.tenant_name, "tenant_name")?;
        let tenant_phone = optional_text(self.tenant_phone, "tenant_phone")?;
        let tenant_email = optional_text(self.tenant_email, "tenant_email")?;
        let lease_start_date = self
            .lease_start_date
            .map(|raw| date_field(&raw, "lease_start_date"))
            .transpose()?;
        let lease_end_date = self
            .lease_end_date
            .map(|raw| date_field(&raw, "lease_end_date"))
            .transpose()?;
        let total_rent = self.total_rent.map(positive_rent).transpose()?;

        let schedule = match (self.payments, self.number_of_payments) {
            (Some(payments), _) => ScheduleChange::Replace(
                payments
                    .into_iter()
                    .map(ReplacementPayment::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            (None, Some(count)) => ScheduleChange::Regenerate(payment_count(count)?),
            (None, None) => ScheduleChange::Keep,
        };

        Ok(ValidatedUpdate {
            tenant_name,
            tenant_phone,
            tenant_email,
            lease_start_date,
            lease_end_date,
            total_rent,
            schedule,
            expected_version: self.expected_version,
        })
    }
}

impl TryFrom<PaymentReplacement> for ReplacementPayment {
    type Error = PortfolioError;

    fn try_from(value: PaymentReplacement) -> Result<Self, Self::Error> {
        if !(value.amount.is_finite() && value.amount > 0.0) {
            return Err(PortfolioError::validation(
                "Payment amount must be greater than 0",
            ));
        }
        Ok(Self {
            amount: value.amount,
            due_date: date_field(&value.date, "payment date")?,
            status: payment_status(&value.status)?,
        })
    }
}

pub(crate) fn ensure_lease_order(start: NaiveDate, end: NaiveDate) -> Result<(), PortfolioError> {
    if start >= end {
        return Err(PortfolioError::validation(
            "Lease start date must be before end date",
        ));
    }
    Ok(())
}

pub(crate) fn payment_status(raw: &str) -> Result<PaymentStatus, PortfolioError> {
    PaymentStatus::from_label(raw)
        .ok_or_else(|| PortfolioError::validation(format!("Invalid payment status '{raw}'")))
}

fn required_text(
    value: Option<String>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> String {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => value,
        _ => {
            missing.push(field);
            String::new()
        }
    }
}

fn optional_text(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<String>, PortfolioError> {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if value.is_empty() => Err(PortfolioError::validation(format!(
            "{field} cannot be blank"
        ))),
        other => Ok(other),
    }
}

fn date_field(raw: &str, field: &str) -> Result<NaiveDate, PortfolioError> {
    parse_date(raw).map_err(|_| {
        PortfolioError::validation(format!(
            "Invalid date format: {field} must be YYYY-MM-DD, got '{raw}'"
        ))
    })
}

fn positive_rent(value: f64) -> Result<f64, PortfolioError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PortfolioError::validation(
            "Total rent must be greater than 0",
        ))
    }
}

fn payment_count(value: i64) -> Result<u32, PortfolioError> {
    if value <= 0 {
        return Err(PortfolioError::validation(
            "Number of payments must be greater than 0",
        ));
    }
    u32::try_from(value)
        .ok()
        .filter(|count| *count <= MAX_PAYMENTS)
        .ok_or_else(|| {
            PortfolioError::validation(format!(
                "Number of payments cannot exceed {MAX_PAYMENTS}"
            ))
        })
}
