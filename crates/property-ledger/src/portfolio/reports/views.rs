use chrono::NaiveDate;
use serde::Serialize;

use crate::portfolio::domain::{
    Document, Occupancy, OccupancyId, OccupantStatus, Payment, PaymentStatus, Property,
    PropertyId,
};

use super::income::{FinancialSummary, IncomeSummary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancyInfo {
    pub tenant_name: String,
    pub tenant_phone: String,
    pub tenant_email: String,
    pub lease_start_date: NaiveDate,
    pub lease_end_date: NaiveDate,
    pub payments_completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentListing {
    pub total_documents: usize,
    pub documents_list: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyFullDetails {
    pub property_info: Property,
    pub occupancy: Option<OccupancyInfo>,
    pub financial_summary: FinancialSummary,
    pub documents: DocumentListing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySummary {
    pub property: Property,
    pub occupancy: Option<Occupancy>,
    pub income_summary: IncomeSummary,
    pub document_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyOverview {
    pub total_properties: usize,
    pub occupied_properties: usize,
    pub vacant_properties: usize,
    pub occupancy_rate: f64,
}

/// One row of the occupants table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupantView {
    pub occupancy_id: OccupancyId,
    pub property_id: PropertyId,
    pub property_address: String,
    pub tenant_name: String,
    pub tenant_phone: String,
    pub tenant_email: String,
    pub lease_start_date: NaiveDate,
    pub lease_end_date: NaiveDate,
    pub total_rent: f64,
    pub status: OccupantStatus,
    pub payment_summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OccupantsOverview {
    pub total_occupants: usize,
    pub active_occupants: usize,
    pub pending_occupants: usize,
    pub inactive_occupants: usize,
}

impl OccupancyInfo {
    pub fn new(occupancy: &Occupancy, payments: &[&Payment]) -> Self {
        Self {
            tenant_name: occupancy.tenant_name.clone(),
            tenant_phone: occupancy.tenant_phone.clone(),
            tenant_email: occupancy.tenant_email.clone(),
            lease_start_date: occupancy.lease_start_date,
            lease_end_date: occupancy.lease_end_date,
            payments_completed: paid_count(payments),
        }
    }
}

impl OccupantView {
    pub fn new(
        occupancy: &Occupancy,
        property: &Property,
        payments: &[&Payment],
        today: NaiveDate,
    ) -> Self {
        Self {
            occupancy_id: occupancy.occupancy_id,
            property_id: property.property_id.clone(),
            property_address: property.address(),
            tenant_name: occupancy.tenant_name.clone(),
            tenant_phone: occupancy.tenant_phone.clone(),
            tenant_email: occupancy.tenant_email.clone(),
            lease_start_date: occupancy.lease_start_date,
            lease_end_date: occupancy.lease_end_date,
            total_rent: occupancy.total_rent,
            status: OccupantStatus::classify(
                occupancy.lease_start_date,
                occupancy.lease_end_date,
                today,
            ),
            payment_summary: format!(
                "{}/{} payments completed",
                paid_count(payments),
                payments.len()
            ),
        }
    }
}

impl OccupantsOverview {
    pub fn tally<'a>(
        occupancies: impl IntoIterator<Item = &'a Occupancy>,
        today: NaiveDate,
    ) -> Self {
        occupancies
            .into_iter()
            .fold(Self::default(), |mut overview, occupancy| {
                overview.total_occupants += 1;
                match OccupantStatus::classify(
                    occupancy.lease_start_date,
                    occupancy.lease_end_date,
                    today,
                ) {
                    OccupantStatus::Pending => overview.pending_occupants += 1,
                    OccupantStatus::Active => overview.active_occupants += 1,
                    OccupantStatus::Inactive => overview.inactive_occupants += 1,
                }
                overview
            })
    }
}

fn paid_count(payments: &[&Payment]) -> usize {
    payments
        .iter()
        .filter(|payment| payment.status == PaymentStatus::Paid)
        .count()
}
