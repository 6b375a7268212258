use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::domain::{
    Document, DocumentId, NotificationRule, NotificationType, Occupancy, OccupancyId,
    OccupancyStatus, Owner, OwnerId, Payment, PaymentId, Property, PropertyId, RuleId,
};

/// Row storage for every entity the portfolio services manage.
///
/// Services never hold a reference across calls: they borrow the tables for the
/// duration of one [`PortfolioStore::read`] or [`PortfolioStore::transaction`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioTables {
    owners: BTreeMap<OwnerId, Owner>,
    sessions: BTreeMap<String, OwnerId>,
    properties: BTreeMap<PropertyId, Property>,
    occupancies: BTreeMap<OccupancyId, Occupancy>,
    payments: BTreeMap<PaymentId, Payment>,
    documents: BTreeMap<DocumentId, Document>,
    rules: BTreeMap<RuleId, NotificationRule>,
    sequence: u64,
}

impl PortfolioTables {
    pub(crate) fn next_id(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    pub fn owner(&self, id: OwnerId) -> Option<&Owner> {
        self.owners.get(&id)
    }

    pub(crate) fn owner_mut(&mut self, id: OwnerId) -> Option<&mut Owner> {
        self.owners.get_mut(&id)
    }

    pub fn owner_by_email(&self, email: &str) -> Option<&Owner> {
        self.owners
            .values()
            .find(|owner| owner.email.eq_ignore_ascii_case(email.trim()))
    }

    pub(crate) fn insert_owner(&mut self, owner: Owner) {
        self.owners.insert(owner.id, owner);
    }

    pub fn session_owner(&self, token: &str) -> Option<OwnerId> {
        self.sessions.get(token).copied()
    }

    pub(crate) fn insert_session(&mut self, token: String, owner: OwnerId) {
        self.sessions.insert(token, owner);
    }

    pub(crate) fn remove_session(&mut self, token: &str) -> Option<OwnerId> {
        self.sessions.remove(token)
    }

    pub fn property(&self, id: &PropertyId) -> Option<&Property> {
        self.properties.get(id)
    }

    /// Looks a property up only inside the caller's own portfolio.
    pub fn owned_property(&self, owner: OwnerId, id: &PropertyId) -> Option<&Property> {
        self.properties
            .get(id)
            .filter(|property| property.is_owned_by(owner))
    }

    pub(crate) fn owned_property_mut(
        &mut self,
        owner: OwnerId,
        id: &PropertyId,
    ) -> Option<&mut Property> {
        self.properties
            .get_mut(id)
            .filter(|property| property.is_owned_by(owner))
    }

    pub fn properties_of(&self, owner: OwnerId) -> impl Iterator<Item = &Property> + '_ {
        self.properties
            .values()
            .filter(move |property| property.is_owned_by(owner))
    }

    pub(crate) fn insert_property(&mut self, property: Property) {
        self.properties
            .insert(property.property_id.clone(), property);
    }

    pub(crate) fn remove_property(&mut self, id: &PropertyId) -> Option<Property> {
        self.properties.remove(id)
    }

    pub(crate) fn set_occupancy_status(&mut self, id: &PropertyId, status: OccupancyStatus) {
        if let Some(property) = self.properties.get_mut(id) {
            property.occupancy_status = status;
        }
    }

    pub fn occupancy(&self, id: OccupancyId) -> Option<&Occupancy> {
        self.occupancies.get(&id)
    }

    pub(crate) fn occupancy_mut(&mut self, id: OccupancyId) -> Option<&mut Occupancy> {
        self.occupancies.get_mut(&id)
    }

    /// Resolves an occupancy together with its property, scoped to one owner.
    pub fn owned_occupancy(
        &self,
        owner: OwnerId,
        id: OccupancyId,
    ) -> Option<(&Occupancy, &Property)> {
        let occupancy = self.occupancies.get(&id)?;
        let property = self.owned_property(owner, &occupancy.property_id)?;
        Some((occupancy, property))
    }

    pub fn current_occupancy(&self, property: &PropertyId) -> Option<&Occupancy> {
        self.occupancies
            .values()
            .find(|occupancy| &occupancy.property_id == property)
    }

    pub fn occupancies_of(&self, owner: OwnerId) -> Vec<(&Occupancy, &Property)> {
        self.occupancies
            .values()
            .filter_map(|occupancy| {
                self.owned_property(owner, &occupancy.property_id)
                    .map(|property| (occupancy, property))
            })
            .collect()
    }

    pub(crate) fn insert_occupancy(&mut self, occupancy: Occupancy) {
        self.occupancies.insert(occupancy.occupancy_id, occupancy);
    }

    pub(crate) fn remove_occupancy(&mut self, id: OccupancyId) -> Option<Occupancy> {
        self.occupancies.remove(&id)
    }

    pub fn payment(&self, id: PaymentId) -> Option<&Payment> {
        self.payments.get(&id)
    }

    pub(crate) fn payment_mut(&mut self, id: PaymentId) -> Option<&mut Payment> {
        self.payments.get_mut(&id)
    }

    /// Schedule of one occupancy, ordered by due date then insertion.
    pub fn payments_for(&self, occupancy: OccupancyId) -> Vec<&Payment> {
        let mut payments: Vec<&Payment> = self
            .payments
            .values()
            .filter(|payment| payment.occupancy_id == occupancy)
            .collect();
        payments.sort_by_key(|payment| (payment.due_date, payment.payment_id));
        payments
    }

    pub(crate) fn insert_payment(&mut self, payment: Payment) {
        self.payments.insert(payment.payment_id, payment);
    }

    pub(crate) fn delete_payments_for(&mut self, occupancy: OccupancyId) -> usize {
        let before = self.payments.len();
        self.payments
            .retain(|_, payment| payment.occupancy_id != occupancy);
        before - self.payments.len()
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }

    pub fn documents_for(&self, property: &PropertyId) -> Vec<&Document> {
        self.documents
            .values()
            .filter(|document| &document.property_id == property)
            .collect()
    }

    pub(crate) fn insert_document(&mut self, document: Document) {
        self.documents.insert(document.document_id, document);
    }

    pub(crate) fn remove_document(&mut self, id: DocumentId) -> Option<Document> {
        self.documents.remove(&id)
    }

    pub fn rules_for(&self, property: &PropertyId) -> Vec<&NotificationRule> {
        self.rules
            .values()
            .filter(|rule| &rule.property_id == property)
            .collect()
    }

    pub(crate) fn rule_mut(
        &mut self,
        property: &PropertyId,
        kind: NotificationType,
    ) -> Option<&mut NotificationRule> {
        self.rules
            .values_mut()
            .find(|rule| &rule.property_id == property && rule.notification_type == kind)
    }

    pub(crate) fn insert_rule(&mut self, rule: NotificationRule) {
        self.rules.insert(rule.notification_id, rule);
    }

    pub(crate) fn remove_rules_for(&mut self, property: &PropertyId) -> usize {
        let before = self.rules.len();
        self.rules.retain(|_, rule| &rule.property_id != property);
        before - self.rules.len()
    }

    /// Joined property → occupancy → payments views for one owner.
    pub fn ledgers_of(&self, owner: OwnerId) -> Vec<PropertyLedger<'_>> {
        self.properties_of(owner)
            .map(|property| self.ledger(property))
            .collect()
    }

    pub fn ledger<'a>(&'a self, property: &'a Property) -> PropertyLedger<'a> {
        let occupancy = self.current_occupancy(&property.property_id);
        let payments = occupancy
            .map(|occupancy| self.payments_for(occupancy.occupancy_id))
            .unwrap_or_default();
        PropertyLedger {
            property,
            occupancy,
            payments,
        }
    }
}

/// Read-only join of a property with its current tenancy and schedule.
#[derive(Debug, Clone)]
pub struct PropertyLedger<'a> {
    pub property: &'a Property,
    pub occupancy: Option<&'a Occupancy>,
    pub payments: Vec<&'a Payment>,
}

/// Transactional storage abstraction so services can be exercised in isolation.
///
/// `transaction` must publish the mutations made by `work` only when it returns
/// `Ok`; an `Err` from `work` (or from the commit itself) leaves the tables
/// exactly as they were.
pub trait PortfolioStore: Send + Sync {
    fn read<T>(&self, view: impl FnOnce(&PortfolioTables) -> T) -> Result<T, RepositoryError>;

    fn transaction<T, E>(
        &self,
        work: impl FnOnce(&mut PortfolioTables) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepositoryError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("commit rejected: {0}")]
    CommitRejected(String),
}

/// Process-local store. Writers stage their changes on a copy of the tables
/// while holding the lock, so concurrent writers are serialised and a failed
/// operation never leaves partial rows behind.
#[derive(Debug, Default)]
pub struct InMemoryPortfolioStore {
    tables: Mutex<PortfolioTables>,
}

impl InMemoryPortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PortfolioStore for InMemoryPortfolioStore {
    fn read<T>(&self, view: impl FnOnce(&PortfolioTables) -> T) -> Result<T, RepositoryError> {
        let guard = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(view(&guard))
    }

    fn transaction<T, E>(
        &self,
        work: impl FnOnce(&mut PortfolioTables) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepositoryError>,
    {
        // A writer that panicked never published its staged copy, so the
        // tables behind a poisoned lock are still consistent.
        let mut guard = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let mut staged = guard.clone();
        let value = work(&mut staged)?;
        *guard = staged;
        Ok(value)
    }
}
