//! Occupancy lifecycle: taking a tenant, editing the lease, tracking
//! installments and ending the tenancy.

pub mod requests;
pub mod schedule;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::documents::DocumentStore;
use super::domain::{
    Occupancy, OccupancyId, OccupancyStatus, OwnerId, Payment, PaymentId, PaymentStatus,
    PropertyId,
};
use super::repository::{PortfolioStore, PortfolioTables};
use super::service::{PortfolioError, PortfolioService};

pub use requests::{
    OccupancyRequest, OccupancyUpdate, PaymentOverride, PaymentReplacement, ScheduleChange,
    ValidatedOccupancy, ValidatedUpdate,
};
pub use schedule::{build_schedule, ScheduledPayment, MAX_PAYMENTS, PAYMENT_INTERVAL_DAYS};

use requests::{ensure_lease_order, payment_status};

/// Result of a successful create: the new occupancy and its stored schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancyCreated {
    pub occupancy_id: OccupancyId,
    pub schedule: Vec<Payment>,
}

/// Occupancy row with its installments, as shown on the edit screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancyDetail {
    #[serde(flatten)]
    pub occupancy: Occupancy,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuePaymentLine {
    pub payment_id: PaymentId,
    pub amount: f64,
    pub due_date: NaiveDate,
}

/// What would be discarded if an occupant were removed now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteCheck {
    pub occupancy_id: OccupancyId,
    pub has_due_payments: bool,
    pub due_payments: Vec<DuePaymentLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndedOccupancy {
    pub occupancy_id: OccupancyId,
    pub property_id: PropertyId,
    pub payments_removed: usize,
}

impl<S, D> PortfolioService<S, D>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    /// Records a tenancy on a vacant property and generates its schedule.
    ///
    /// The occupancy, every installment and the `occupied` flip commit in a
    /// single transaction.
    pub fn create_occupancy(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
        request: OccupancyRequest,
        today: NaiveDate,
    ) -> Result<OccupancyCreated, PortfolioError> {
        let created = self.store.transaction(|tables| {
            let property = tables
                .owned_property(owner, property_id)
                .ok_or(PortfolioError::NotFound)?;
            if property.occupancy_status != OccupancyStatus::Vacant
                || tables.current_occupancy(property_id).is_some()
            {
                return Err(PortfolioError::conflict("Property is not vacant"));
            }

            let lease = request.validate(today)?;
            let planned = build_schedule(
                lease.total_rent,
                lease.lease_start_date,
                lease.number_of_payments,
                &lease.overrides,
            )
            .ok_or_else(out_of_calendar)?;

            let occupancy_id = OccupancyId(tables.next_id());
            tables.insert_occupancy(Occupancy {
                occupancy_id,
                property_id: property_id.clone(),
                tenant_name: lease.tenant.name,
                tenant_phone: lease.tenant.phone,
                tenant_email: lease.tenant.email,
                lease_start_date: lease.lease_start_date,
                lease_end_date: lease.lease_end_date,
                total_rent: lease.total_rent,
                version: 1,
            });
            let schedule = insert_schedule(tables, occupancy_id, planned);
            tables.set_occupancy_status(property_id, OccupancyStatus::Occupied);

            Ok(OccupancyCreated {
                occupancy_id,
                schedule,
            })
        });

        match &created {
            Ok(created) => info!(
                occupancy_id = created.occupancy_id.0,
                property_id = %property_id,
                payments = created.schedule.len(),
                "occupancy created"
            ),
            Err(err) => warn!(property_id = %property_id, error = %err, "occupancy rejected"),
        }
        created
    }

    /// Applies an allow-listed update to one occupancy.
    pub fn update_occupancy(
        &self,
        owner: OwnerId,
        occupancy_id: OccupancyId,
        update: OccupancyUpdate,
    ) -> Result<Occupancy, PortfolioError> {
        let update = update.validate()?;
        let updated = self
            .store
            .transaction(|tables| apply_update(tables, owner, occupancy_id, update));
        log_update(occupancy_id, &updated);
        updated
    }

    /// Same as [`Self::update_occupancy`], addressing the tenancy through its
    /// property.
    pub fn update_current_occupancy(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
        update: OccupancyUpdate,
    ) -> Result<Occupancy, PortfolioError> {
        let update = update.validate()?;
        let mut target = None;
        let updated = self.store.transaction(|tables| {
            tables
                .owned_property(owner, property_id)
                .ok_or(PortfolioError::NotFound)?;
            let occupancy_id = tables
                .current_occupancy(property_id)
                .map(|occupancy| occupancy.occupancy_id)
                .ok_or(PortfolioError::NotFound)?;
            target = Some(occupancy_id);
            apply_update(tables, owner, occupancy_id, update)
        });
        if let Some(occupancy_id) = target {
            log_update(occupancy_id, &updated);
        }
        updated
    }

    /// Ends the current tenancy of a property.
    pub fn end_occupancy(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
    ) -> Result<EndedOccupancy, PortfolioError> {
        let ended = self.store.transaction(|tables| {
            tables
                .owned_property(owner, property_id)
                .ok_or(PortfolioError::NotFound)?;
            let occupancy_id = tables
                .current_occupancy(property_id)
                .map(|occupancy| occupancy.occupancy_id)
                .ok_or(PortfolioError::NotFound)?;
            Ok::<_, PortfolioError>(remove_tenancy(tables, occupancy_id, property_id.clone()))
        })?;
        info!(
            occupancy_id = ended.occupancy_id.0,
            property_id = %ended.property_id,
            payments_removed = ended.payments_removed,
            "occupancy ended"
        );
        Ok(ended)
    }

    /// Removes an occupant by occupancy id, with the same cascade as
    /// [`Self::end_occupancy`].
    pub fn delete_occupant(
        &self,
        owner: OwnerId,
        occupancy_id: OccupancyId,
    ) -> Result<EndedOccupancy, PortfolioError> {
        let ended = self.store.transaction(|tables| {
            let property_id = tables
                .owned_occupancy(owner, occupancy_id)
                .map(|(_, property)| property.property_id.clone())
                .ok_or(PortfolioError::NotFound)?;
            Ok::<_, PortfolioError>(remove_tenancy(tables, occupancy_id, property_id))
        })?;
        info!(
            occupancy_id = occupancy_id.0,
            property_id = %ended.property_id,
            payments_removed = ended.payments_removed,
            "occupant deleted"
        );
        Ok(ended)
    }

    pub fn check_delete(
        &self,
        owner: OwnerId,
        occupancy_id: OccupancyId,
    ) -> Result<DeleteCheck, PortfolioError> {
        self.read(|tables| {
            tables.owned_occupancy(owner, occupancy_id)?;
            let due_payments: Vec<DuePaymentLine> = tables
                .payments_for(occupancy_id)
                .into_iter()
                .filter(|payment| payment.status == PaymentStatus::Due)
                .map(|payment| DuePaymentLine {
                    payment_id: payment.payment_id,
                    amount: payment.amount,
                    due_date: payment.due_date,
                })
                .collect();
            Some(DeleteCheck {
                occupancy_id,
                has_due_payments: !due_payments.is_empty(),
                due_payments,
            })
        })?
        .ok_or(PortfolioError::NotFound)
    }

    /// Marks an installment paid. Paid installments never go back to due.
    pub fn set_payment_status(
        &self,
        owner: OwnerId,
        occupancy_id: OccupancyId,
        payment_id: PaymentId,
        status: &str,
    ) -> Result<Payment, PortfolioError> {
        let requested = payment_status(status)?;
        let (payment, changed) = self.store.transaction(|tables| {
            tables
                .owned_occupancy(owner, occupancy_id)
                .ok_or(PortfolioError::NotFound)?;
            let payment = tables
                .payment_mut(payment_id)
                .filter(|payment| payment.occupancy_id == occupancy_id)
                .ok_or(PortfolioError::NotFound)?;

            match (payment.status, requested) {
                (current, wanted) if current == wanted => Ok((payment.clone(), false)),
                (PaymentStatus::Due, PaymentStatus::Paid) => {
                    payment.status = PaymentStatus::Paid;
                    let payment = payment.clone();
                    if let Some(occupancy) = tables.occupancy_mut(occupancy_id) {
                        occupancy.version += 1;
                    }
                    Ok((payment, true))
                }
                _ => Err(PortfolioError::validation(
                    "A paid payment cannot be reverted to due",
                )),
            }
        })?;

        if changed {
            info!(
                payment_id = payment_id.0,
                occupancy_id = occupancy_id.0,
                "payment marked paid"
            );
        }
        Ok(payment)
    }

    pub fn occupancy_detail(
        &self,
        owner: OwnerId,
        occupancy_id: OccupancyId,
    ) -> Result<OccupancyDetail, PortfolioError> {
        self.read(|tables| {
            tables
                .owned_occupancy(owner, occupancy_id)
                .map(|(occupancy, _)| OccupancyDetail {
                    occupancy: occupancy.clone(),
                    payments: tables
                        .payments_for(occupancy_id)
                        .into_iter()
                        .cloned()
                        .collect(),
                })
        })?
        .ok_or(PortfolioError::NotFound)
    }

    pub fn payments(
        &self,
        owner: OwnerId,
        occupancy_id: OccupancyId,
    ) -> Result<Vec<Payment>, PortfolioError> {
        self.occupancy_detail(owner, occupancy_id)
            .map(|detail| detail.payments)
    }

    /// Payment ledger of one occupancy as `payment_id,amount,due_date,status`.
    pub fn export_payments_csv(
        &self,
        owner: OwnerId,
        occupancy_id: OccupancyId,
    ) -> Result<String, PortfolioError> {
        let payments = self.payments(owner, occupancy_id)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["payment_id", "amount", "due_date", "status"])
            .map_err(export_error)?;
        for payment in &payments {
            writer
                .write_record([
                    payment.payment_id.0.to_string(),
                    format!("{:.2}", payment.amount),
                    payment.due_date.format("%Y-%m-%d").to_string(),
                    payment.status.label().to_string(),
                ])
                .map_err(export_error)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| PortfolioError::Export(err.to_string()))?;
        String::from_utf8(bytes).map_err(|err| PortfolioError::Export(err.to_string()))
    }
}

fn apply_update(
    tables: &mut PortfolioTables,
    owner: OwnerId,
    occupancy_id: OccupancyId,
    update: ValidatedUpdate,
) -> Result<Occupancy, PortfolioError> {
    let current = tables
        .owned_occupancy(owner, occupancy_id)
        .map(|(occupancy, _)| occupancy.clone())
        .ok_or(PortfolioError::NotFound)?;

    if let Some(expected) = update.expected_version {
        if expected != current.version {
            return Err(PortfolioError::conflict(format!(
                "Occupancy was modified concurrently (expected version {expected}, found {})",
                current.version
            )));
        }
    }

    let mut merged = current;
    if let Some(name) = update.tenant_name {
        merged.tenant_name = name;
    }
    if let Some(phone) = update.tenant_phone {
        merged.tenant_phone = phone;
    }
    if let Some(email) = update.tenant_email {
        merged.tenant_email = email;
    }
    if let Some(start) = update.lease_start_date {
        merged.lease_start_date = start;
    }
    if let Some(end) = update.lease_end_date {
        merged.lease_end_date = end;
    }
    if let Some(total_rent) = update.total_rent {
        merged.total_rent = total_rent;
    }
    ensure_lease_order(merged.lease_start_date, merged.lease_end_date)?;
    merged.version += 1;

    match update.schedule {
        ScheduleChange::Keep => {}
        ScheduleChange::Regenerate(count) => {
            let planned = build_schedule(merged.total_rent, merged.lease_start_date, count, &[])
                .ok_or_else(out_of_calendar)?;
            tables.delete_payments_for(occupancy_id);
            insert_schedule(tables, occupancy_id, planned);
        }
        ScheduleChange::Replace(replacements) => {
            tables.delete_payments_for(occupancy_id);
            for replacement in replacements {
                let payment_id = PaymentId(tables.next_id());
                tables.insert_payment(Payment {
                    payment_id,
                    occupancy_id,
                    amount: replacement.amount,
                    due_date: replacement.due_date,
                    status: replacement.status,
                });
            }
        }
    }

    let occupancy = tables
        .occupancy_mut(occupancy_id)
        .ok_or(PortfolioError::NotFound)?;
    *occupancy = merged.clone();
    Ok(merged)
}

fn insert_schedule(
    tables: &mut PortfolioTables,
    occupancy_id: OccupancyId,
    planned: Vec<ScheduledPayment>,
) -> Vec<Payment> {
    planned
        .into_iter()
        .map(|planned| {
            let payment = Payment {
                payment_id: PaymentId(tables.next_id()),
                occupancy_id,
                amount: planned.amount,
                due_date: planned.due_date,
                status: planned.status,
            };
            tables.insert_payment(payment.clone());
            payment
        })
        .collect()
}

/// Payments first, then the occupancy, then the vacancy flag.
fn remove_tenancy(
    tables: &mut PortfolioTables,
    occupancy_id: OccupancyId,
    property_id: PropertyId,
) -> EndedOccupancy {
    let payments_removed = tables.delete_payments_for(occupancy_id);
    tables.remove_occupancy(occupancy_id);
    tables.set_occupancy_status(&property_id, OccupancyStatus::Vacant);
    EndedOccupancy {
        occupancy_id,
        property_id,
        payments_removed,
    }
}

fn log_update(occupancy_id: OccupancyId, outcome: &Result<Occupancy, PortfolioError>) {
    match outcome {
        Ok(occupancy) => info!(
            occupancy_id = occupancy_id.0,
            version = occupancy.version,
            "occupancy updated"
        ),
        Err(err) => warn!(occupancy_id = occupancy_id.0, error = %err, "occupancy update rejected"),
    }
}

fn out_of_calendar() -> PortfolioError {
    PortfolioError::validation("Payment schedule falls outside the supported date range")
}

fn export_error(err: csv::Error) -> PortfolioError {
    PortfolioError::Export(err.to_string())
}
