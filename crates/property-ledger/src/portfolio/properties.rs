use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::documents::DocumentStore;
use super::domain::{OccupancyStatus, OwnerId, Property, PropertyId};
use super::repository::PortfolioStore;
use super::service::{PortfolioError, PortfolioService};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRequest {
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub street_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub building_details: Option<String>,
    #[serde(default)]
    pub size_sqft: Option<f64>,
    #[serde(default)]
    pub bedrooms: Option<i64>,
    #[serde(default)]
    pub units: Option<i64>,
    #[serde(default)]
    pub rent_per_month: Option<f64>,
}

/// Fields an owner may change after creation. Occupancy status is managed by
/// the lifecycle operations only and is rejected here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyUpdate {
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub street_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub building_details: Option<String>,
    #[serde(default)]
    pub size_sqft: Option<f64>,
    #[serde(default)]
    pub bedrooms: Option<i64>,
    #[serde(default)]
    pub units: Option<i64>,
    #[serde(default)]
    pub rent_per_month: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PropertyRemoval {
    /// The property still has a tenancy and the caller did not confirm.
    RequiresConfirmation,
    Deleted {
        property_id: PropertyId,
        payments_removed: usize,
        document_paths: Vec<String>,
    },
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn positive(value: f64, message: &str) -> Result<f64, PortfolioError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PortfolioError::validation(message))
    }
}

fn bedrooms(value: i64) -> Result<u32, PortfolioError> {
    u32::try_from(value).map_err(|_| PortfolioError::validation("Bedrooms cannot be negative"))
}

fn units(value: i64) -> Result<u32, PortfolioError> {
    u32::try_from(value)
        .ok()
        .filter(|units| *units >= 1)
        .ok_or_else(|| PortfolioError::validation("Units must be at least 1"))
}

const SIZE_MESSAGE: &str = "Size must be greater than 0";
const RENT_MESSAGE: &str = "Rent per month must be greater than 0";

impl PropertyRequest {
    pub fn into_property(self, owner: OwnerId) -> Result<Property, PortfolioError> {
        let property_type = text(self.property_type);
        let street_name = text(self.street_name);
        let city = text(self.city);

        let missing: Vec<&str> = [
            ("property_type", property_type.is_none()),
            ("street_name", street_name.is_none()),
            ("city", city.is_none()),
            ("size_sqft", self.size_sqft.is_none()),
            ("bedrooms", self.bedrooms.is_none()),
            ("units", self.units.is_none()),
            ("rent_per_month", self.rent_per_month.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();
        if !missing.is_empty() {
            return Err(PortfolioError::validation(format!(
                "Missing fields: {}",
                missing.join(", ")
            )));
        }

        Ok(Property {
            property_id: PropertyId::generate(),
            owner_id: owner,
            property_type: property_type.unwrap_or_default(),
            street_name: street_name.unwrap_or_default(),
            city: city.unwrap_or_default(),
            building_details: text(self.building_details),
            size_sqft: positive(self.size_sqft.unwrap_or_default(), SIZE_MESSAGE)?,
            bedrooms: bedrooms(self.bedrooms.unwrap_or_default())?,
            units: units(self.units.unwrap_or_default())?,
            rent_per_month: positive(self.rent_per_month.unwrap_or_default(), RENT_MESSAGE)?,
            occupancy_status: OccupancyStatus::Vacant,
        })
    }
}

impl PropertyUpdate {
    /// Validates every supplied field and writes it onto `property`.
    pub fn apply_to(self, property: &mut Property) -> Result<(), PortfolioError> {
        let mut updated = property.clone();
        for (slot, value, field) in [
            (&mut updated.property_type, self.property_type, "property_type"),
            (&mut updated.street_name, self.street_name, "street_name"),
            (&mut updated.city, self.city, "city"),
        ] {
            if let Some(value) = value {
                *slot = text(Some(value)).ok_or_else(|| {
                    PortfolioError::validation(format!("{field} cannot be blank"))
                })?;
            }
        }
        if let Some(details) = self.building_details {
            updated.building_details = text(Some(details));
        }
        if let Some(size) = self.size_sqft {
            updated.size_sqft = positive(size, SIZE_MESSAGE)?;
        }
        if let Some(count) = self.bedrooms {
            updated.bedrooms = bedrooms(count)?;
        }
        if let Some(count) = self.units {
            updated.units = units(count)?;
        }
        if let Some(rent) = self.rent_per_month {
            updated.rent_per_month = positive(rent, RENT_MESSAGE)?;
        }
        *property = updated;
        Ok(())
    }
}

impl<S, D> PortfolioService<S, D>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    /// Registers a property; new properties always start vacant.
    pub fn add_property(
        &self,
        owner: OwnerId,
        request: PropertyRequest,
    ) -> Result<Property, PortfolioError> {
        let property = request.into_property(owner)?;
        self.store.transaction(|tables| {
            if tables.owner(owner).is_none() {
                return Err(PortfolioError::Unauthenticated);
            }
            tables.insert_property(property.clone());
            Ok(())
        })?;
        info!(property_id = %property.property_id, owner_id = owner.0, "property added");
        Ok(property)
    }

    pub fn list_properties(&self, owner: OwnerId) -> Result<Vec<Property>, PortfolioError> {
        self.read(|tables| tables.properties_of(owner).cloned().collect())
    }

    pub fn vacant_properties(&self, owner: OwnerId) -> Result<Vec<Property>, PortfolioError> {
        self.read(|tables| {
            tables
                .properties_of(owner)
                .filter(|property| property.occupancy_status == OccupancyStatus::Vacant)
                .cloned()
                .collect()
        })
    }

    pub fn property(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
    ) -> Result<Property, PortfolioError> {
        self.read(|tables| tables.owned_property(owner, property_id).cloned())?
            .ok_or(PortfolioError::NotFound)
    }

    pub fn update_property(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
        update: PropertyUpdate,
    ) -> Result<Property, PortfolioError> {
        let property = self.store.transaction(|tables| {
            let property = tables
                .owned_property_mut(owner, property_id)
                .ok_or(PortfolioError::NotFound)?;
            update.apply_to(property)?;
            Ok::<_, PortfolioError>(property.clone())
        })?;
        info!(property_id = %property_id, "property updated");
        Ok(property)
    }

    /// Deletes a property and everything hanging off it.
    ///
    /// A property with a current tenancy is only removed when `confirm` is
    /// set; otherwise nothing changes and [`PropertyRemoval::RequiresConfirmation`]
    /// is returned. Stored document bytes are removed after the commit.
    pub fn delete_property(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
        confirm: bool,
    ) -> Result<PropertyRemoval, PortfolioError> {
        let removal = self.store.transaction(|tables| {
            tables
                .owned_property(owner, property_id)
                .ok_or(PortfolioError::NotFound)?;
            let occupancy = tables
                .current_occupancy(property_id)
                .map(|occupancy| occupancy.occupancy_id);
            if occupancy.is_some() && !confirm {
                return Ok(PropertyRemoval::RequiresConfirmation);
            }

            let mut payments_removed = 0;
            if let Some(occupancy_id) = occupancy {
                payments_removed = tables.delete_payments_for(occupancy_id);
                tables.remove_occupancy(occupancy_id);
            }
            let document_ids: Vec<_> = tables
                .documents_for(property_id)
                .into_iter()
                .map(|document| document.document_id)
                .collect();
            let document_paths = document_ids
                .into_iter()
                .filter_map(|id| tables.remove_document(id))
                .map(|document| document.file_path)
                .collect();
            tables.remove_rules_for(property_id);
            tables.remove_property(property_id);

            Ok::<_, PortfolioError>(PropertyRemoval::Deleted {
                property_id: property_id.clone(),
                payments_removed,
                document_paths,
            })
        })?;

        match &removal {
            PropertyRemoval::RequiresConfirmation => {
                warn!(property_id = %property_id, "property delete needs confirmation");
            }
            PropertyRemoval::Deleted {
                payments_removed,
                document_paths,
                ..
            } => {
                self.discard_files(document_paths.iter().map(String::as_str));
                info!(
                    property_id = %property_id,
                    payments_removed,
                    documents_removed = document_paths.len(),
                    "property deleted"
                );
            }
        }
        Ok(removal)
    }
}
