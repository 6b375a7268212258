//! Landlord portfolio: accounts, properties, tenancies with their rent
//! schedules, collection reporting, reminder rules and documents.
//!
//! All operations hang off [`PortfolioService`], which is generic over the
//! row store and the document byte store.

pub mod accounts;
pub mod documents;
pub mod domain;
pub mod lifecycle;
pub mod notifications;
pub mod properties;
pub mod reports;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use accounts::{LoginRequest, OwnerProfile, PasswordResetRequest, Session, SignupRequest};
pub use documents::{sanitize_file_name, DocumentStore, DocumentStoreError, InMemoryDocumentStore};
pub use domain::{
    parse_date, Document, DocumentId, NotificationPeriod, NotificationRule, NotificationType,
    Occupancy, OccupancyId, OccupancyStatus, OccupantStatus, Owner, OwnerId, Payment, PaymentId,
    PaymentStatus, Property, PropertyId, RuleId,
};
pub use lifecycle::{
    build_schedule, DeleteCheck, DuePaymentLine, EndedOccupancy, OccupancyCreated,
    OccupancyDetail, OccupancyRequest, OccupancyUpdate, PaymentOverride, PaymentReplacement,
    ScheduledPayment, MAX_PAYMENTS, PAYMENT_INTERVAL_DAYS,
};
pub use notifications::{
    LeaseRenewalAlert, NotificationDigest, NotificationRuleRequest, PaymentDueAlert,
};
pub use properties::{PropertyRemoval, PropertyRequest, PropertyUpdate};
pub use reports::{
    Dashboard, FinancialStats, IncomeSummary, OccupantView, OccupantsOverview,
    PropertyFullDetails, PropertyOverview, PropertyStats, PropertySummary,
};
pub use repository::{
    InMemoryPortfolioStore, PortfolioStore, PortfolioTables, PropertyLedger, RepositoryError,
};
pub use router::{portfolio_router, resolve_caller, today};
pub use service::{PortfolioError, PortfolioPolicy, PortfolioService};
