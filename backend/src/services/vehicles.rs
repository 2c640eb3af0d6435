//! # Vehicle Manager
//!
//! The vehicle catalog. (make, model, year) identifies a vehicle, and a
//! vehicle referenced by an opportunity or a quotation item is kept.

use tracing::{info, warn};

use crate::db::queries::vehicles;
use crate::db::{Database, VehicleFields};
use crate::models::{VehicleRequest, VehicleResponse};
use crate::utils::require_text;

use super::clients::search_fragment;
use super::error::{blocked_on_reference, rejected_on_unique};
use super::CrmError;

const MAX_MAKE_LEN: usize = 100;
const MAX_MODEL_LEN: usize = 150;

/// Accepted model years.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

const DUPLICATE_VEHICLE: &str = "a vehicle with this make, model and year already exists";

pub fn validate_vehicle(req: &VehicleRequest) -> Result<VehicleFields, CrmError> {
    let mut problems = Vec::new();

    let make = require_text(&mut problems, "make", &req.make, Some(MAX_MAKE_LEN));
    let model = require_text(&mut problems, "model", &req.model, Some(MAX_MODEL_LEN));

    if !YEAR_RANGE.contains(&req.year) {
        problems.push(format!(
            "year must be between {} and {}",
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        ));
    }
    if req.price < 0 {
        problems.push("price cannot be negative".to_string());
    }

    if !problems.is_empty() {
        return Err(CrmError::Validation(problems));
    }

    Ok(VehicleFields {
        make,
        model,
        year: req.year,
        price: req.price,
    })
}

#[derive(Clone)]
pub struct VehicleManager {
    db: Database,
}

impl VehicleManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<VehicleResponse>, CrmError> {
        let rows = vehicles::list_vehicles(self.db.pool()).await?;
        Ok(rows.iter().map(VehicleResponse::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<VehicleResponse, CrmError> {
        vehicles::get_vehicle(self.db.pool(), id)
            .await?
            .map(|v| VehicleResponse::from(&v))
            .ok_or_else(|| vehicle_not_found(id))
    }

    pub async fn by_make(&self, make: &str) -> Result<Vec<VehicleResponse>, CrmError> {
        let fragment = search_fragment(make, "make")?;
        let rows = vehicles::list_vehicles_by_make(self.db.pool(), &fragment).await?;
        Ok(rows.iter().map(VehicleResponse::from).collect())
    }

    /// Substring search over make and model.
    pub async fn search(&self, term: Option<&str>) -> Result<Vec<VehicleResponse>, CrmError> {
        let fragment = search_fragment(term.unwrap_or_default(), "search term")?;
        let rows = vehicles::search_vehicles(self.db.pool(), &fragment).await?;
        Ok(rows.iter().map(VehicleResponse::from).collect())
    }

    pub async fn makes(&self) -> Result<Vec<String>, CrmError> {
        Ok(vehicles::list_makes(self.db.pool()).await?)
    }

    pub async fn create(&self, req: &VehicleRequest) -> Result<VehicleResponse, CrmError> {
        let fields = validate_vehicle(req)?;

        if vehicles::vehicle_exists(self.db.pool(), &fields, None).await? {
            return Err(CrmError::BusinessRule(DUPLICATE_VEHICLE.to_string()));
        }

        let vehicle = vehicles::insert_vehicle(self.db.pool(), &fields)
            .await
            .map_err(|e| rejected_on_unique(e, DUPLICATE_VEHICLE))?;

        info!(
            "Vehicle created: {} {} {} (id {})",
            vehicle.make, vehicle.model, vehicle.year, vehicle.id
        );

        Ok(VehicleResponse::from(&vehicle))
    }

    pub async fn update(&self, id: i32, req: &VehicleRequest) -> Result<VehicleResponse, CrmError> {
        let fields = validate_vehicle(req)?;

        if vehicles::get_vehicle(self.db.pool(), id).await?.is_none() {
            return Err(vehicle_not_found(id));
        }

        if vehicles::vehicle_exists(self.db.pool(), &fields, Some(id)).await? {
            return Err(CrmError::BusinessRule(DUPLICATE_VEHICLE.to_string()));
        }

        let vehicle = vehicles::update_vehicle(self.db.pool(), id, &fields)
            .await
            .map_err(|e| rejected_on_unique(e, DUPLICATE_VEHICLE))?
            .ok_or_else(|| vehicle_not_found(id))?;

        info!("Vehicle {} updated", id);

        Ok(VehicleResponse::from(&vehicle))
    }

    pub async fn delete(&self, id: i32) -> Result<(), CrmError> {
        if vehicles::get_vehicle(self.db.pool(), id).await?.is_none() {
            return Err(vehicle_not_found(id));
        }

        if vehicles::vehicle_in_use(self.db.pool(), id).await? {
            warn!("Refusing to delete vehicle {} still in use", id);
            return Err(CrmError::BusinessRule(
                "cannot delete a vehicle referenced by opportunities or quotation items".to_string(),
            ));
        }

        let deleted = vehicles::delete_vehicle(self.db.pool(), id)
            .await
            .map_err(|e| blocked_on_reference(e, "cannot delete a vehicle that has been sold"))?;
        if !deleted {
            return Err(vehicle_not_found(id));
        }

        info!("Vehicle {} deleted", id);
        Ok(())
    }
}

fn vehicle_not_found(id: i32) -> CrmError {
    CrmError::NotFound(format!("vehicle {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{test_db, unique};

    fn request(make: &str, model: &str, year: i32, price: i64) -> VehicleRequest {
        VehicleRequest {
            make: make.to_string(),
            model: model.to_string(),
            year,
            price,
        }
    }

    #[test]
    fn test_validate_vehicle() {
        let fields = validate_vehicle(&request(" Toyota", "Hilux ", 2024, 28_500_000)).unwrap();
        assert_eq!(fields.make, "Toyota");
        assert_eq!(fields.model, "Hilux");
        assert_eq!(fields.price, 28_500_000);
    }

    #[test]
    fn test_validate_vehicle_limits() {
        let too_long = "x".repeat(MAX_MAKE_LEN + 1);
        match validate_vehicle(&request(&too_long, "", 1850, -1)) {
            Err(CrmError::Validation(problems)) => assert_eq!(problems.len(), 4),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(validate_vehicle(&request("Kia", "Rio", 2100, 0)).is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_vehicle_is_a_bad_request() {
        let Some(db) = test_db().await else { return };
        let manager = VehicleManager::new(db);
        let model = unique("Hilux");

        let first = manager.create(&request("Toyota", &model, 2024, 28_500_000)).await.unwrap();
        let err = manager
            .create(&request("Toyota", &model, 2024, 27_000_000))
            .await
            .unwrap_err();
        assert_eq!(err.status().as_u16(), 400);

        // Updating a vehicle onto itself is not a duplicate.
        let same = manager
            .update(first.id, &request("Toyota", &model, 2024, 29_000_000))
            .await
            .unwrap();
        assert_eq!(same.price, 29_000_000);
    }
}
