//! # Product Manager
//!
//! Product inventory, addressed by unique name.

use tracing::info;

use crate::db::queries::products;
use crate::db::{Database, ProductFields};
use crate::models::{ProductRequest, ProductResponse};
use crate::utils::require_text;

use super::error::conflict_on_unique;
use super::CrmError;

pub fn validate_product(req: &ProductRequest) -> Result<ProductFields, CrmError> {
    let mut problems = Vec::new();

    let name = require_text(&mut problems, "name", &req.name, None);
    if req.price <= 0 {
        problems.push("price must be greater than zero".to_string());
    }
    if req.quantity < 0 {
        problems.push("quantity cannot be negative".to_string());
    }
    let description = require_text(&mut problems, "description", &req.description, None);

    if !problems.is_empty() {
        return Err(CrmError::Validation(problems));
    }

    Ok(ProductFields {
        name,
        price: req.price,
        quantity: req.quantity,
        description,
    })
}

#[derive(Clone)]
pub struct ProductManager {
    db: Database,
}

impl ProductManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<ProductResponse>, CrmError> {
        let rows = products::list_products(self.db.pool()).await?;
        Ok(rows.iter().map(ProductResponse::from).collect())
    }

    pub async fn get(&self, name: &str) -> Result<ProductResponse, CrmError> {
        products::get_product_by_name(self.db.pool(), name)
            .await?
            .map(|p| ProductResponse::from(&p))
            .ok_or_else(|| product_not_found(name))
    }

    pub async fn create(&self, req: &ProductRequest) -> Result<ProductResponse, CrmError> {
        let fields = validate_product(req)?;

        let product = products::insert_product(self.db.pool(), &fields)
            .await
            .map_err(|e| conflict_on_unique(e, "a product with this name already exists"))?;

        info!("Product created: {} (id {})", product.name, product.id);

        Ok(ProductResponse::from(&product))
    }

    /// Update price, quantity and description. The body must name the same product as the path.
    pub async fn update(&self, name: &str, req: &ProductRequest) -> Result<(), CrmError> {
        if req.name.trim() != name {
            return Err(CrmError::invalid("product name in body does not match the URL"));
        }

        let fields = validate_product(req)?;

        if products::update_product(self.db.pool(), &fields).await?.is_none() {
            return Err(product_not_found(name));
        }

        info!("Product {} updated", name);
        Ok(())
    }

    pub async fn delete(&self, name: &str) -> Result<(), CrmError> {
        if !products::delete_product(self.db.pool(), name).await? {
            return Err(product_not_found(name));
        }

        info!("Product {} deleted", name);
        Ok(())
    }
}

fn product_not_found(name: &str) -> CrmError {
    CrmError::NotFound(format!("product '{}' not found", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product() {
        let req = ProductRequest {
            name: "Floor mats".into(),
            price: 45_000,
            quantity: 0,
            description: "Rubber, set of 4".into(),
        };
        assert!(validate_product(&req).is_ok());

        let req = ProductRequest {
            name: " ".into(),
            price: 0,
            quantity: -2,
            description: "".into(),
        };
        match validate_product(&req) {
            Err(CrmError::Validation(problems)) => assert_eq!(problems.len(), 4),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
