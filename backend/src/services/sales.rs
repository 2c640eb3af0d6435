//! # Sale Manager
//!
//! Direct vehicle sales. Unit prices come from the vehicle catalog at the
//! moment of sale, and the sale is written together with its lines.

use tracing::info;

use crate::db::queries::{clients, sales, vehicles};
use crate::db::{Database, NewSaleLine, SaleRow};
use crate::models::{ListResponse, SaleRequest, SaleResponse};
use crate::utils::format_money;

use super::CrmError;

/// Check the shape of a sale request before touching the database.
pub fn validate_sale_request(req: &SaleRequest) -> Result<(), CrmError> {
    if req.vehicles.is_empty() {
        return Err(CrmError::invalid("a sale needs at least one vehicle"));
    }

    let problems: Vec<String> = req
        .vehicles
        .iter()
        .enumerate()
        .filter(|(_, line)| line.quantity <= 0)
        .map(|(i, line)| {
            format!(
                "line {} (vehicle {}): quantity must be greater than zero",
                i + 1,
                line.vehicle_id
            )
        })
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(CrmError::Validation(problems))
    }
}

/// Σ unit_price × quantity over the lines.
pub fn sale_total(lines: &[NewSaleLine]) -> Result<i64, CrmError> {
    lines.iter().try_fold(0i64, |acc, line| {
        line.unit_price
            .checked_mul(i64::from(line.quantity))
            .and_then(|subtotal| acc.checked_add(subtotal))
            .ok_or_else(|| CrmError::invalid("sale total is too large"))
    })
}

#[derive(Clone)]
pub struct SaleManager {
    db: Database,
}

impl SaleManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, req: &SaleRequest) -> Result<SaleResponse, CrmError> {
        validate_sale_request(req)?;

        let pool = self.db.pool();

        if clients::get_client(pool, req.client_id).await?.is_none() {
            return Err(CrmError::invalid("client not found"));
        }

        let mut lines = Vec::with_capacity(req.vehicles.len());
        let mut missing = Vec::new();
        for line in &req.vehicles {
            match vehicles::get_vehicle(pool, line.vehicle_id).await? {
                Some(vehicle) => lines.push(NewSaleLine {
                    vehicle_id: vehicle.id,
                    quantity: line.quantity,
                    unit_price: vehicle.price,
                }),
                None => missing.push(format!("vehicle {} not found", line.vehicle_id)),
            }
        }
        if !missing.is_empty() {
            return Err(CrmError::Validation(missing));
        }

        let total = sale_total(&lines)?;
        let sale = sales::insert_sale(pool, req.client_id, &lines, total).await?;

        info!("Sale {} total {}", sale.id, format_money(total));

        self.get(sale.id).await
    }

    /// All sales, newest first.
    pub async fn list(&self) -> Result<ListResponse<SaleResponse>, CrmError> {
        let rows = sales::list_sales(self.db.pool()).await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(self.response(row).await?);
        }

        Ok(ListResponse::new(items))
    }

    pub async fn get(&self, id: i32) -> Result<SaleResponse, CrmError> {
        let row = sales::get_sale(self.db.pool(), id)
            .await?
            .ok_or_else(|| CrmError::NotFound(format!("sale {} not found", id)))?;

        self.response(&row).await
    }

    async fn response(&self, row: &SaleRow) -> Result<SaleResponse, CrmError> {
        let lines = sales::list_sale_lines(self.db.pool(), row.sale.id).await?;
        Ok(SaleResponse::new(
            row.sale.id,
            row.sale.sold_at,
            &row.client,
            &lines,
            row.sale.total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SaleLineRequest;

    #[test]
    fn test_sale_request_needs_lines() {
        let req = SaleRequest { client_id: 1, vehicles: vec![] };
        assert!(matches!(validate_sale_request(&req), Err(CrmError::Validation(_))));
    }

    #[test]
    fn test_sale_request_rejects_non_positive_quantities() {
        let req = SaleRequest {
            client_id: 1,
            vehicles: vec![
                SaleLineRequest { vehicle_id: 4, quantity: 1 },
                SaleLineRequest { vehicle_id: 5, quantity: 0 },
                SaleLineRequest { vehicle_id: 6, quantity: -3 },
            ],
        };
        match validate_sale_request(&req) {
            Err(CrmError::Validation(problems)) => {
                assert_eq!(problems.len(), 2);
                assert!(problems[0].starts_with("line 2 (vehicle 5)"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_sale_total() {
        let lines = vec![
            NewSaleLine { vehicle_id: 1, quantity: 2, unit_price: 2_850_000 },
            NewSaleLine { vehicle_id: 2, quantity: 1, unit_price: 1_500_050 },
        ];
        assert_eq!(sale_total(&lines).unwrap(), 7_200_050);
        assert_eq!(sale_total(&[]).unwrap(), 0);

        let huge = vec![NewSaleLine { vehicle_id: 1, quantity: 2, unit_price: i64::MAX }];
        assert!(sale_total(&huge).is_err());
    }
}
