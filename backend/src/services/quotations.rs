//! # Quotation Manager
//!
//! Quotations and their line items.
//!
//! ## Rules
//!
//! - An opportunity has at most one active quotation at a time, backed by a
//!   partial unique index. No quotation, active or not, can be created while
//!   one is active.
//! - Items can only be added, edited or removed while the quotation is active.
//! - `item.total = unit_price * quantity - discount`, never negative.
//! - `quotation.total` is the sum of its item totals. It is recomputed in the
//!   same transaction as every item write and is never taken from a client.
//! - A quotation that has an invoice cannot be deleted.

use tracing::{info, warn};

use crate::db::queries::quotations::ItemWrite;
use crate::db::queries::{opportunities, quotations, vehicles};
use crate::db::{Database, ItemFields, QuotationRecord};
use crate::models::{
    QuotationDetailResponse, QuotationItemMutationResponse, QuotationItemRequest,
    QuotationItemResponse, QuotationRequest, QuotationResponse, UpdateQuotationItemRequest,
};
use crate::utils::{format_money, require_text};

use super::error::rejected_on_unique;
use super::CrmError;

const MAX_DESCRIPTION_LEN: usize = 250;

const ACTIVE_EXISTS: &str = "the opportunity already has an active quotation";

/// `unit_price * quantity - discount`.
///
/// A discount larger than the gross amount is rejected rather than clamped.
pub fn compute_item_total(quantity: i32, unit_price: i64, discount: i64) -> Result<i64, CrmError> {
    let gross = unit_price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| CrmError::invalid("item amount is too large"))?;

    if discount > gross {
        return Err(CrmError::invalid(format!(
            "discount ({}) cannot exceed the item amount ({})",
            format_money(discount),
            format_money(gross)
        )));
    }

    Ok(gross - discount)
}

/// Validate editable item fields and compute the item total.
pub fn validate_item(
    description: &str,
    quantity: i32,
    unit_price: i64,
    discount: i64,
) -> Result<ItemFields, CrmError> {
    let mut problems = Vec::new();

    let description =
        require_text(&mut problems, "description", description, Some(MAX_DESCRIPTION_LEN));
    if quantity < 1 {
        problems.push("quantity must be at least 1".to_string());
    }
    if unit_price < 0 {
        problems.push("unit price cannot be negative".to_string());
    }
    if discount < 0 {
        problems.push("discount cannot be negative".to_string());
    }

    if !problems.is_empty() {
        return Err(CrmError::Validation(problems));
    }

    let total = compute_item_total(quantity, unit_price, discount)?;

    Ok(ItemFields {
        description,
        quantity,
        unit_price,
        discount,
        total,
    })
}

/// Unwrap an item write. A vanished quotation or item becomes `missing`.
fn item_written<T>(
    outcome: ItemWrite<T>,
    missing: CrmError,
    inactive: &str,
) -> Result<T, CrmError> {
    match outcome {
        ItemWrite::Written(value) => Ok(value),
        ItemWrite::QuotationMissing | ItemWrite::ItemMissing => Err(missing),
        ItemWrite::QuotationInactive => Err(CrmError::BusinessRule(inactive.to_string())),
    }
}

fn item_mutation(
    item: Option<QuotationItemResponse>,
    quotation_id: i32,
    total: i64,
) -> QuotationItemMutationResponse {
    QuotationItemMutationResponse {
        item,
        quotation_id,
        quotation_total: total,
        formatted_quotation_total: format_money(total),
    }
}

#[derive(Clone)]
pub struct QuotationManager {
    db: Database,
}

impl QuotationManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ==========================================
    // QUOTATIONS
    // ==========================================

    pub async fn list(&self) -> Result<Vec<QuotationResponse>, CrmError> {
        let rows = quotations::list_quotations(self.db.pool()).await?;
        Ok(rows.iter().map(QuotationResponse::from).collect())
    }

    /// A quotation with its items.
    pub async fn get(&self, id: i32) -> Result<QuotationDetailResponse, CrmError> {
        let quotation = self.find(id).await?;
        let items = quotations::list_items_with_vehicle(self.db.pool(), id).await?;

        Ok(QuotationDetailResponse {
            quotation: QuotationResponse::from(&quotation),
            items: items.iter().map(QuotationItemResponse::from).collect(),
        })
    }

    pub async fn create(&self, req: &QuotationRequest) -> Result<QuotationResponse, CrmError> {
        let pool = self.db.pool();

        if opportunities::get_opportunity(pool, req.opportunity_id).await?.is_none() {
            return Err(CrmError::invalid("opportunity not found"));
        }

        if quotations::has_active_quotation(pool, req.opportunity_id, None).await? {
            return Err(CrmError::BusinessRule(ACTIVE_EXISTS.to_string()));
        }

        let active = req.active.unwrap_or(true);
        let quotation = quotations::insert_quotation(pool, req.opportunity_id, active)
            .await
            .map_err(|e| rejected_on_unique(e, ACTIVE_EXISTS))?;

        info!(
            "Quotation {} created for opportunity {}",
            quotation.id, quotation.opportunity_id
        );

        Ok(QuotationResponse::from(&quotation))
    }

    /// Activate or deactivate. Activation keeps the one-active-quotation rule.
    pub async fn set_status(&self, id: i32, active: bool) -> Result<QuotationResponse, CrmError> {
        let quotation = self.find(id).await?;

        if active
            && !quotation.active
            && quotations::has_active_quotation(self.db.pool(), quotation.opportunity_id, Some(id))
                .await?
        {
            return Err(CrmError::BusinessRule(
                "the opportunity already has another active quotation".to_string(),
            ));
        }

        let updated = quotations::set_quotation_active(self.db.pool(), id, active)
            .await
            .map_err(|e| {
                rejected_on_unique(e, "the opportunity already has another active quotation")
            })?
            .ok_or_else(|| quotation_not_found(id))?;

        info!("Quotation {} active = {}", id, active);

        Ok(QuotationResponse::from(&updated))
    }

    /// Delete a quotation and its items.
    pub async fn delete(&self, id: i32) -> Result<(), CrmError> {
        self.find(id).await?;

        if quotations::quotation_has_invoice(self.db.pool(), id).await? {
            warn!("Refusing to delete invoiced quotation {}", id);
            return Err(CrmError::BusinessRule(
                "cannot delete a quotation that has an invoice".to_string(),
            ));
        }

        if !quotations::delete_quotation(self.db.pool(), id).await? {
            return Err(quotation_not_found(id));
        }

        info!("Quotation {} deleted", id);
        Ok(())
    }

    // ==========================================
    // ITEMS
    // ==========================================

    pub async fn get_item(&self, id: i32) -> Result<QuotationItemResponse, CrmError> {
        quotations::get_item(self.db.pool(), id)
            .await?
            .map(|i| QuotationItemResponse::from(&i))
            .ok_or_else(|| item_not_found(id))
    }

    /// Items of a quotation. An unknown quotation simply has none.
    pub async fn items_of(&self, quotation_id: i32) -> Result<Vec<QuotationItemResponse>, CrmError> {
        let items = quotations::list_items_with_vehicle(self.db.pool(), quotation_id).await?;
        Ok(items.iter().map(QuotationItemResponse::from).collect())
    }

    pub async fn add_item(
        &self,
        req: &QuotationItemRequest,
    ) -> Result<QuotationItemMutationResponse, CrmError> {
        let pool = self.db.pool();

        let quotation = quotations::get_quotation(pool, req.quotation_id)
            .await?
            .ok_or_else(|| CrmError::invalid("quotation not found"))?;
        if !quotation.active {
            return Err(CrmError::BusinessRule(
                "cannot add an item to an inactive quotation".to_string(),
            ));
        }

        if vehicles::get_vehicle(pool, req.vehicle_id).await?.is_none() {
            return Err(CrmError::invalid("vehicle not found"));
        }

        let fields = validate_item(&req.description, req.quantity, req.unit_price, req.discount)?;

        let (item, total) = item_written(
            quotations::insert_item(pool, quotation.id, req.vehicle_id, &fields).await?,
            CrmError::invalid("quotation not found"),
            "cannot add an item to an inactive quotation",
        )?;

        info!(
            "Item {} added to quotation {}; quotation total {}",
            item.id,
            quotation.id,
            format_money(total)
        );

        Ok(item_mutation(Some(QuotationItemResponse::from(&item)), quotation.id, total))
    }

    pub async fn update_item(
        &self,
        id: i32,
        req: &UpdateQuotationItemRequest,
    ) -> Result<QuotationItemMutationResponse, CrmError> {
        let pool = self.db.pool();

        let existing = quotations::get_item(pool, id)
            .await?
            .ok_or_else(|| item_not_found(id))?;

        let fields = validate_item(&req.description, req.quantity, req.unit_price, req.discount)?;

        let (item, total) = item_written(
            quotations::update_item(pool, id, existing.quotation_id, &fields).await?,
            item_not_found(id),
            "cannot edit an item of an inactive quotation",
        )?;

        info!(
            "Item {} updated; quotation {} total {}",
            id,
            existing.quotation_id,
            format_money(total)
        );

        Ok(item_mutation(Some(QuotationItemResponse::from(&item)), existing.quotation_id, total))
    }

    pub async fn delete_item(&self, id: i32) -> Result<QuotationItemMutationResponse, CrmError> {
        let pool = self.db.pool();

        let existing = quotations::get_item(pool, id)
            .await?
            .ok_or_else(|| item_not_found(id))?;

        let total = item_written(
            quotations::delete_item(pool, id, existing.quotation_id).await?,
            item_not_found(id),
            "cannot delete an item of an inactive quotation",
        )?;

        info!(
            "Item {} deleted; quotation {} total {}",
            id,
            existing.quotation_id,
            format_money(total)
        );

        Ok(item_mutation(None, existing.quotation_id, total))
    }

    async fn find(&self, id: i32) -> Result<QuotationRecord, CrmError> {
        quotations::get_quotation(self.db.pool(), id)
            .await?
            .ok_or_else(|| quotation_not_found(id))
    }
}

fn quotation_not_found(id: i32) -> CrmError {
    CrmError::NotFound(format!("quotation {} not found", id))
}

fn item_not_found(id: i32) -> CrmError {
    CrmError::NotFound(format!("quotation item {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{seed_pipeline, test_db, Pipeline};
    use crate::services::InvoiceManager;

    fn quotation_for(pipeline: &Pipeline, active: Option<bool>) -> QuotationRequest {
        QuotationRequest {
            opportunity_id: pipeline.opportunity_id,
            active,
        }
    }

    fn item(
        quotation_id: i32,
        vehicle_id: i32,
        quantity: i32,
        unit_price: i64,
    ) -> QuotationItemRequest {
        QuotationItemRequest {
            quotation_id,
            vehicle_id,
            description: "Hilux SR, white".to_string(),
            quantity,
            unit_price,
            discount: 0,
        }
    }

    fn edit(quantity: i32, unit_price: i64, discount: i64) -> UpdateQuotationItemRequest {
        UpdateQuotationItemRequest {
            description: "Hilux SR, white".to_string(),
            quantity,
            unit_price,
            discount,
        }
    }

    fn is_business_rule<T>(result: Result<T, CrmError>) -> bool {
        matches!(result, Err(CrmError::BusinessRule(_)))
    }

    #[test]
    fn test_item_total() {
        assert_eq!(compute_item_total(2, 2_850_000, 50_000).unwrap(), 5_650_000);
        assert_eq!(compute_item_total(1, 100, 100).unwrap(), 0);
        assert_eq!(compute_item_total(3, 0, 0).unwrap(), 0);
    }

    #[test]
    fn test_discount_above_gross_is_rejected() {
        let err = compute_item_total(1, 1_000, 1_001).unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
        assert!(err.to_string().contains("10.01"));
    }

    #[test]
    fn test_item_total_overflow() {
        assert!(compute_item_total(i32::MAX, i64::MAX / 2, 0).is_err());
    }

    #[test]
    fn test_validate_item() {
        let fields = validate_item(" Hilux, white ", 2, 1_000, 100).unwrap();
        assert_eq!(fields.description, "Hilux, white");
        assert_eq!(fields.total, 1_900);

        match validate_item(&"d".repeat(251), 0, -1, -1) {
            Err(CrmError::Validation(problems)) => assert_eq!(problems.len(), 4),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_quotation_total_follows_item_writes() {
        let Some(db) = test_db().await else { return };
        let pipeline = seed_pipeline(&db).await;
        let manager = QuotationManager::new(db);

        let quotation = manager.create(&quotation_for(&pipeline, None)).await.unwrap();
        assert!(quotation.active);
        assert_eq!(quotation.total, 0);

        let first = manager
            .add_item(&item(quotation.id, pipeline.vehicle_id, 2, 1_000_000))
            .await
            .unwrap();
        assert_eq!(first.quotation_total, 2_000_000);

        let second = manager
            .add_item(&item(quotation.id, pipeline.vehicle_id, 1, 500_000))
            .await
            .unwrap();
        assert_eq!(second.quotation_total, 2_500_000);

        let first_id = first.item.unwrap().id;
        let edited = manager.update_item(first_id, &edit(1, 1_000_000, 100_000)).await.unwrap();
        assert_eq!(edited.item.unwrap().total, 900_000);
        assert_eq!(edited.quotation_total, 1_400_000);

        let removed = manager.delete_item(second.item.unwrap().id).await.unwrap();
        assert!(removed.item.is_none());
        assert_eq!(removed.quotation_total, 900_000);

        let stored = manager.get(quotation.id).await.unwrap();
        assert_eq!(stored.quotation.total, 900_000);
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].id, first_id);
    }

    #[tokio::test]
    async fn test_no_quotation_is_created_while_one_is_active() {
        let Some(db) = test_db().await else { return };
        let pipeline = seed_pipeline(&db).await;
        let manager = QuotationManager::new(db);

        let active = manager.create(&quotation_for(&pipeline, Some(true))).await.unwrap();

        assert!(is_business_rule(manager.create(&quotation_for(&pipeline, Some(false))).await));
        assert!(is_business_rule(manager.create(&quotation_for(&pipeline, Some(true))).await));

        manager.set_status(active.id, false).await.unwrap();
        let replacement = manager.create(&quotation_for(&pipeline, None)).await.unwrap();
        assert!(replacement.active);

        // Reactivating the old one would make two.
        assert!(is_business_rule(manager.set_status(active.id, true).await));
    }

    #[tokio::test]
    async fn test_concurrent_creates_leave_one_active_quotation() {
        let Some(db) = test_db().await else { return };
        let pipeline = seed_pipeline(&db).await;
        let manager = QuotationManager::new(db.clone());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                let req = quotation_for(&pipeline, Some(true));
                tokio::spawn(async move { manager.create(&req).await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(CrmError::BusinessRule(_)) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }
        assert_eq!(created, 1);

        let stored = quotations::list_quotation_summaries(db.pool(), pipeline.opportunity_id)
            .await
            .unwrap();
        assert_eq!(stored.iter().filter(|q| q.active).count(), 1);
    }

    #[tokio::test]
    async fn test_items_of_inactive_quotation_are_frozen() {
        let Some(db) = test_db().await else { return };
        let pipeline = seed_pipeline(&db).await;
        let manager = QuotationManager::new(db);

        let quotation = manager.create(&quotation_for(&pipeline, None)).await.unwrap();
        let added = manager
            .add_item(&item(quotation.id, pipeline.vehicle_id, 1, 750_000))
            .await
            .unwrap();
        let item_id = added.item.unwrap().id;

        manager.set_status(quotation.id, false).await.unwrap();

        assert!(is_business_rule(manager.update_item(item_id, &edit(3, 750_000, 0)).await));
        assert!(is_business_rule(manager.delete_item(item_id).await));
        assert!(is_business_rule(
            manager.add_item(&item(quotation.id, pipeline.vehicle_id, 1, 1)).await
        ));

        let stored = manager.get(quotation.id).await.unwrap();
        assert_eq!(stored.quotation.total, 750_000);
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_invoiced_quotation_cannot_be_deleted() {
        let Some(db) = test_db().await else { return };
        let pipeline = seed_pipeline(&db).await;
        let manager = QuotationManager::new(db.clone());

        let quotation = manager.create(&quotation_for(&pipeline, None)).await.unwrap();
        manager
            .add_item(&item(quotation.id, pipeline.vehicle_id, 1, 750_000))
            .await
            .unwrap();
        InvoiceManager::new(db).create(quotation.id).await.unwrap();

        assert!(is_business_rule(manager.delete(quotation.id).await));
        assert!(manager.get(quotation.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_items_of_unknown_quotation_is_empty() {
        let Some(db) = test_db().await else { return };
        let manager = QuotationManager::new(db);

        assert!(manager.items_of(i32::MAX).await.unwrap().is_empty());
    }
}
