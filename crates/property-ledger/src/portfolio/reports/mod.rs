//! Read-only aggregation over an owner's ledgers. Nothing here fails for lack
//! of data: empty portfolios produce zeroed structures.

pub mod dashboard;
pub mod income;
pub mod views;

use chrono::NaiveDate;

use super::documents::DocumentStore;
use super::domain::{OwnerId, PropertyId};
use super::repository::PortfolioStore;
use super::service::{PortfolioError, PortfolioService};

pub use dashboard::{
    dashboard, property_stats, Dashboard, FinancialStats, LeaseExpiration, OverduePayment,
    PropertyRef, PropertyStats, RecentActivity,
};
pub use income::{income_summary, FinancialSummary, IncomeSummary, OverdueLine};
pub use views::{
    DocumentListing, OccupancyInfo, OccupantView, OccupantsOverview, PropertyFullDetails,
    PropertyOverview, PropertySummary,
};

/// Rounds a percentage to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl<S, D> PortfolioService<S, D>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    pub fn income_summary(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
        today: NaiveDate,
    ) -> Result<IncomeSummary, PortfolioError> {
        self.read(|tables| {
            tables
                .owned_property(owner, property_id)
                .map(|property| income_summary(&tables.ledger(property), today))
        })?
        .ok_or(PortfolioError::NotFound)
    }

    pub fn dashboard(&self, owner: OwnerId, today: NaiveDate) -> Result<Dashboard, PortfolioError> {
        self.read(|tables| dashboard(&tables.ledgers_of(owner), today))
    }

    pub fn property_overview(&self, owner: OwnerId) -> Result<PropertyOverview, PortfolioError> {
        self.read(|tables| {
            let stats = property_stats(&tables.ledgers_of(owner));
            PropertyOverview {
                total_properties: stats.total,
                occupied_properties: stats.occupied,
                vacant_properties: stats.vacant,
                occupancy_rate: stats.occupancy_rate,
            }
        })
    }

    pub fn property_full_details(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
        today: NaiveDate,
    ) -> Result<PropertyFullDetails, PortfolioError> {
        self.read(|tables| {
            let property = tables.owned_property(owner, property_id)?;
            let ledger = tables.ledger(property);
            let summary = income_summary(&ledger, today);
            let documents: Vec<_> = tables
                .documents_for(property_id)
                .into_iter()
                .cloned()
                .collect();
            Some(PropertyFullDetails {
                property_info: property.clone(),
                occupancy: ledger
                    .occupancy
                    .map(|occupancy| OccupancyInfo::new(occupancy, &ledger.payments)),
                financial_summary: FinancialSummary::from(&summary),
                documents: DocumentListing {
                    total_documents: documents.len(),
                    documents_list: documents,
                },
            })
        })?
        .ok_or(PortfolioError::NotFound)
    }

    pub fn property_summary(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
        today: NaiveDate,
    ) -> Result<PropertySummary, PortfolioError> {
        self.read(|tables| {
            let property = tables.owned_property(owner, property_id)?;
            let ledger = tables.ledger(property);
            Some(PropertySummary {
                property: property.clone(),
                occupancy: ledger.occupancy.cloned(),
                income_summary: income_summary(&ledger, today),
                document_count: tables.documents_for(property_id).len(),
            })
        })?
        .ok_or(PortfolioError::NotFound)
    }

    /// Every occupancy on the owner's properties with its status on `today`.
    pub fn occupants(
        &self,
        owner: OwnerId,
        today: NaiveDate,
    ) -> Result<Vec<OccupantView>, PortfolioError> {
        self.read(|tables| {
            tables
                .occupancies_of(owner)
                .into_iter()
                .map(|(occupancy, property)| {
                    let payments = tables.payments_for(occupancy.occupancy_id);
                    OccupantView::new(occupancy, property, &payments, today)
                })
                .collect()
        })
    }

    pub fn occupants_overview(
        &self,
        owner: OwnerId,
        today: NaiveDate,
    ) -> Result<OccupantsOverview, PortfolioError> {
        self.read(|tables| {
            OccupantsOverview::tally(
                tables
                    .occupancies_of(owner)
                    .into_iter()
                    .map(|(occupancy, _)| occupancy),
                today,
            )
        })
    }
}
