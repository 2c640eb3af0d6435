//! # Invoice Manager
//!
//! Invoices are created from an active quotation, one per quotation.
//!
//! ## Lifecycle
//!
//! ```text
//!   POST /api/invoices ──► pending ──PUT .../issue──► issued
//!                            │
//!                            └── DELETE (only while pending)
//! ```
//!
//! Numbers look like `FACT-20250115-3FA9C2`. The random suffix is checked
//! against stored numbers and regenerated on collision.

use chrono::Utc;
use tracing::{info, warn};

use crate::db::queries::{invoices, opportunities, quotations};
use crate::db::{Database, InvoiceRow, InvoiceStatus};
use crate::models::{
    ClientResponse, InvoiceDetailResponse, InvoiceListItem, InvoiceListResponse, InvoiceResponse,
    ListResponse, QuotationItemResponse, QuotationResponse, SellerResponse, VehicleResponse,
};
use crate::utils::generate_invoice_number;

use super::CrmError;

/// Attempts at drawing an unused invoice number.
const MAX_NUMBER_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct InvoiceManager {
    db: Database,
}

impl InvoiceManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All invoices, newest first, with issued/pending counts.
    pub async fn list(&self) -> Result<InvoiceListResponse, CrmError> {
        let rows = invoices::list_invoices(self.db.pool()).await?;
        Ok(InvoiceListResponse::new(rows.iter().map(InvoiceListItem::from).collect()))
    }

    pub async fn by_client(&self, client_id: i32) -> Result<ListResponse<InvoiceListItem>, CrmError> {
        let rows = invoices::list_invoices_by_client(self.db.pool(), client_id).await?;
        Ok(ListResponse::new(rows.iter().map(InvoiceListItem::from).collect()))
    }

    /// Pending invoices, oldest first.
    pub async fn pending(&self) -> Result<ListResponse<InvoiceListItem>, CrmError> {
        let rows = invoices::list_pending_invoices(self.db.pool()).await?;
        Ok(ListResponse::new(rows.iter().map(InvoiceListItem::from).collect()))
    }

    pub async fn get(&self, id: i32) -> Result<InvoiceDetailResponse, CrmError> {
        let row = invoices::get_invoice_row(self.db.pool(), id)
            .await?
            .ok_or_else(|| invoice_not_found(id))?;

        self.detail(row).await
    }

    pub async fn by_quotation(&self, quotation_id: i32) -> Result<InvoiceDetailResponse, CrmError> {
        let row = invoices::get_invoice_row_by_quotation(self.db.pool(), quotation_id)
            .await?
            .ok_or_else(|| {
                CrmError::NotFound(format!("quotation {} has no invoice", quotation_id))
            })?;

        self.detail(row).await
    }

    /// Invoice an active quotation. The total is copied from the quotation.
    pub async fn create(&self, quotation_id: i32) -> Result<InvoiceResponse, CrmError> {
        let pool = self.db.pool();

        let quotation = quotations::get_quotation(pool, quotation_id)
            .await?
            .ok_or_else(|| CrmError::invalid("quotation not found"))?;

        if !quotation.active {
            return Err(CrmError::BusinessRule(
                "cannot invoice an inactive quotation".to_string(),
            ));
        }
        if quotations::quotation_has_invoice(pool, quotation_id).await? {
            return Err(already_invoiced());
        }

        for _ in 0..MAX_NUMBER_ATTEMPTS {
            let number = generate_invoice_number(Utc::now().date_naive());
            if invoices::invoice_number_exists(pool, &number).await? {
                warn!("Invoice number {} already used, drawing another", number);
                continue;
            }

            match invoices::insert_invoice(pool, quotation_id, &number, quotation.total).await {
                Ok(invoice) => return Ok(InvoiceResponse::from(&invoice)),
                Err(e) if e.is_unique_violation() => {
                    if quotations::quotation_has_invoice(pool, quotation_id).await? {
                        return Err(already_invoiced());
                    }
                    warn!("Invoice number {} taken concurrently, drawing another", number);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CrmError::Internal(format!(
            "could not draw an unused invoice number in {} attempts",
            MAX_NUMBER_ATTEMPTS
        )))
    }

    /// Move a pending invoice to issued.
    pub async fn issue(&self, id: i32) -> Result<InvoiceResponse, CrmError> {
        let invoice = invoices::get_invoice(self.db.pool(), id)
            .await?
            .ok_or_else(|| invoice_not_found(id))?;

        if invoice.status == InvoiceStatus::Issued {
            return Err(already_issued());
        }

        let issued = invoices::mark_invoice_issued(self.db.pool(), id)
            .await?
            .ok_or_else(already_issued)?;

        info!("Invoice {} issued", issued.number);

        Ok(InvoiceResponse::from(&issued))
    }

    pub async fn delete(&self, id: i32) -> Result<(), CrmError> {
        let invoice = invoices::get_invoice(self.db.pool(), id)
            .await?
            .ok_or_else(|| invoice_not_found(id))?;

        if invoice.status == InvoiceStatus::Issued
            || !invoices::delete_pending_invoice(self.db.pool(), id).await?
        {
            return Err(CrmError::BusinessRule(
                "cannot delete an issued invoice".to_string(),
            ));
        }

        info!("Invoice {} deleted", invoice.number);
        Ok(())
    }

    async fn detail(&self, row: InvoiceRow) -> Result<InvoiceDetailResponse, CrmError> {
        let pool = self.db.pool();
        let quotation_id = row.invoice.quotation_id;

        let quotation = quotations::get_quotation(pool, quotation_id)
            .await?
            .ok_or_else(|| CrmError::Internal(format!("quotation {} vanished", quotation_id)))?;
        let items = quotations::list_items_with_vehicle(pool, quotation_id).await?;

        let vehicle = opportunities::get_opportunity_row(pool, row.opportunity_id)
            .await?
            .and_then(|o| o.vehicle())
            .map(|v| VehicleResponse::from(&v));

        Ok(InvoiceDetailResponse {
            invoice: InvoiceResponse::from(&row.invoice),
            client: ClientResponse {
                id: row.client_id,
                name: row.client_name,
                nit: row.client_nit,
                address: row.client_address,
                email: row.client_email,
            },
            seller: SellerResponse {
                id: row.seller_id,
                first_name: row.seller_first_name,
                last_name: row.seller_last_name,
                email: row.seller_email,
            },
            vehicle,
            quotation: QuotationResponse::from(&quotation),
            items: items.iter().map(QuotationItemResponse::from).collect(),
        })
    }
}

fn invoice_not_found(id: i32) -> CrmError {
    CrmError::NotFound(format!("invoice {} not found", id))
}

fn already_invoiced() -> CrmError {
    CrmError::BusinessRule("the quotation already has an invoice".to_string())
}

fn already_issued() -> CrmError {
    CrmError::BusinessRule("the invoice has already been issued".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{seed_pipeline, test_db};

    async fn active_quotation(db: &Database) -> i32 {
        let pipeline = seed_pipeline(db).await;
        quotations::insert_quotation(db.pool(), pipeline.opportunity_id, true)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_one_invoice_per_quotation() {
        let Some(db) = test_db().await else { return };
        let quotation_id = active_quotation(&db).await;
        let manager = InvoiceManager::new(db);

        let invoice = manager.create(quotation_id).await.unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert!(invoice.number.starts_with("FACT-"));

        assert!(matches!(manager.create(quotation_id).await, Err(CrmError::BusinessRule(_))));
        assert_eq!(manager.by_quotation(quotation_id).await.unwrap().invoice.id, invoice.id);
    }

    #[tokio::test]
    async fn test_issued_invoice_cannot_be_deleted() {
        let Some(db) = test_db().await else { return };
        let quotation_id = active_quotation(&db).await;
        let manager = InvoiceManager::new(db);

        let invoice = manager.create(quotation_id).await.unwrap();
        let issued = manager.issue(invoice.id).await.unwrap();
        assert_eq!(issued.status, InvoiceStatus::Issued);

        assert!(matches!(manager.issue(invoice.id).await, Err(CrmError::BusinessRule(_))));
        assert!(matches!(manager.delete(invoice.id).await, Err(CrmError::BusinessRule(_))));
        assert!(manager.get(invoice.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_pending_invoice_can_be_deleted() {
        let Some(db) = test_db().await else { return };
        let quotation_id = active_quotation(&db).await;
        let manager = InvoiceManager::new(db);

        let invoice = manager.create(quotation_id).await.unwrap();
        manager.delete(invoice.id).await.unwrap();

        assert!(matches!(manager.get(invoice.id).await, Err(CrmError::NotFound(_))));
    }
}
