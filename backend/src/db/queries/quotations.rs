//! Quotation and quotation item queries.
//!
//! Item writes run in a transaction that locks the owning quotation, checks
//! it is still active and recomputes its `total` from its items, so the
//! stored total never drifts.

use deadpool_postgres::{Pool, Transaction};
use tokio_postgres::Row;
use tracing::debug;

use crate::db::models::{
    ItemFields, QuotationItemRecord, QuotationItemRow, QuotationRecord, QuotationSummaryRow,
};
use crate::db::DatabaseError;

const ITEM_COLUMNS: &str =
    "id, quotation_id, vehicle_id, description, quantity, unit_price, discount, total";

fn row_to_quotation(row: &Row) -> QuotationRecord {
    QuotationRecord {
        id: row.get("id"),
        opportunity_id: row.get("opportunity_id"),
        active: row.get("active"),
        total: row.get("total"),
    }
}

fn row_to_item(row: &Row) -> QuotationItemRecord {
    QuotationItemRecord {
        id: row.get("id"),
        quotation_id: row.get("quotation_id"),
        vehicle_id: row.get("vehicle_id"),
        description: row.get("description"),
        quantity: row.get("quantity"),
        unit_price: row.get("unit_price"),
        discount: row.get("discount"),
        total: row.get("total"),
    }
}

fn row_to_item_row(row: &Row) -> QuotationItemRow {
    QuotationItemRow {
        item: row_to_item(row),
        vehicle_make: row.get("vehicle_make"),
        vehicle_model: row.get("vehicle_model"),
    }
}

/// Outcome of an item write. Only `Written` commits anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemWrite<T> {
    Written(T),
    QuotationMissing,
    QuotationInactive,
    ItemMissing,
}

// ============================================
// QUOTATIONS
// ============================================

pub async fn list_quotations(pool: &Pool) -> Result<Vec<QuotationRecord>, DatabaseError> {
    let client = pool.get().await?;

    let rows = client.query(
        "SELECT id, opportunity_id, active, total FROM quotations ORDER BY id",
        &[],
    ).await?;

    Ok(rows.iter().map(row_to_quotation).collect())
}

pub async fn get_quotation(pool: &Pool, id: i32) -> Result<Option<QuotationRecord>, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_opt(
        "SELECT id, opportunity_id, active, total FROM quotations WHERE id = $1",
        &[&id],
    ).await?;

    Ok(row.as_ref().map(row_to_quotation))
}

/// Quotations of one opportunity with item and invoice counts.
pub async fn list_quotation_summaries(
    pool: &Pool,
    opportunity_id: i32,
) -> Result<Vec<QuotationSummaryRow>, DatabaseError> {
    let client = pool.get().await?;

    let rows = client.query(
        r#"
        SELECT
            q.id, q.active, q.total,
            (SELECT COUNT(*) FROM quotation_items qi WHERE qi.quotation_id = q.id)
                AS items_count,
            (SELECT COUNT(*) FROM invoices i WHERE i.quotation_id = q.id)
                AS invoices_count
        FROM quotations q
        WHERE q.opportunity_id = $1
        ORDER BY q.id
        "#,
        &[&opportunity_id],
    ).await?;

    Ok(rows
        .iter()
        .map(|row| QuotationSummaryRow {
            id: row.get("id"),
            active: row.get("active"),
            total: row.get("total"),
            items_count: row.get("items_count"),
            invoices_count: row.get("invoices_count"),
        })
        .collect())
}

/// Whether the opportunity has an active quotation other than `exclude_id`.
pub async fn has_active_quotation(
    pool: &Pool,
    opportunity_id: i32,
    exclude_id: Option<i32>,
) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM quotations
            WHERE opportunity_id = $1 AND active
              AND ($2::INT IS NULL OR id <> $2)
        ) AS present
        "#,
        &[&opportunity_id, &exclude_id],
    ).await?;

    Ok(row.get("present"))
}

/// Insert an empty quotation. Its total starts at zero.
pub async fn insert_quotation(
    pool: &Pool,
    opportunity_id: i32,
    active: bool,
) -> Result<QuotationRecord, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        r#"
        INSERT INTO quotations (opportunity_id, active, total)
        VALUES ($1, $2, 0)
        RETURNING id, opportunity_id, active, total
        "#,
        &[&opportunity_id, &active],
    ).await?;

    Ok(row_to_quotation(&row))
}

pub async fn set_quotation_active(
    pool: &Pool,
    id: i32,
    active: bool,
) -> Result<Option<QuotationRecord>, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_opt(
        r#"
        UPDATE quotations SET active = $2
        WHERE id = $1
        RETURNING id, opportunity_id, active, total
        "#,
        &[&id, &active],
    ).await?;

    Ok(row.as_ref().map(row_to_quotation))
}

pub async fn quotation_has_invoice(pool: &Pool, id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        "SELECT EXISTS (SELECT 1 FROM invoices WHERE quotation_id = $1) AS present",
        &[&id],
    ).await?;

    Ok(row.get("present"))
}

/// Delete a quotation. Items cascade.
pub async fn delete_quotation(pool: &Pool, id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let deleted = client.execute("DELETE FROM quotations WHERE id = $1", &[&id]).await?;

    Ok(deleted > 0)
}

// ============================================
// ITEMS
// ============================================

pub async fn get_item(pool: &Pool, id: i32) -> Result<Option<QuotationItemRecord>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("SELECT {} FROM quotation_items WHERE id = $1", ITEM_COLUMNS);
    let row = client.query_opt(sql.as_str(), &[&id]).await?;

    Ok(row.as_ref().map(row_to_item))
}

/// Items of a quotation joined with vehicle make and model.
pub async fn list_items_with_vehicle(
    pool: &Pool,
    quotation_id: i32,
) -> Result<Vec<QuotationItemRow>, DatabaseError> {
    let client = pool.get().await?;

    let rows = client.query(
        r#"
        SELECT
            qi.id, qi.quotation_id, qi.vehicle_id, qi.description, qi.quantity,
            qi.unit_price, qi.discount, qi.total,
            v.make AS vehicle_make, v.model AS vehicle_model
        FROM quotation_items qi
        JOIN vehicles v ON v.id = qi.vehicle_id
        WHERE qi.quotation_id = $1
        ORDER BY qi.id
        "#,
        &[&quotation_id],
    ).await?;

    Ok(rows.iter().map(row_to_item_row).collect())
}

/// Lock the quotation row and check that it is still active.
///
/// Item writes and status changes on the same quotation are serialized
/// behind this lock. `Some` carries the refusal when the quotation is
/// missing or inactive.
async fn lock_active<T>(
    tx: &Transaction<'_>,
    quotation_id: i32,
) -> Result<Option<ItemWrite<T>>, DatabaseError> {
    let row = tx
        .query_opt("SELECT active FROM quotations WHERE id = $1 FOR UPDATE", &[&quotation_id])
        .await?;

    Ok(match row.map(|r| r.get::<_, bool>("active")) {
        None => Some(ItemWrite::QuotationMissing),
        Some(false) => Some(ItemWrite::QuotationInactive),
        Some(true) => None,
    })
}

/// Recompute `quotations.total` from its items and return the new total.
async fn recalculate_total(tx: &Transaction<'_>, quotation_id: i32) -> Result<i64, DatabaseError> {
    let row = tx.query_one(
        r#"
        UPDATE quotations
        SET total = (
            SELECT COALESCE(SUM(total), 0) FROM quotation_items WHERE quotation_id = $1
        )
        WHERE id = $1
        RETURNING total
        "#,
        &[&quotation_id],
    ).await?;

    let total: i64 = row.get("total");
    debug!("Quotation {} total recalculated: {}", quotation_id, total);

    Ok(total)
}

/// Insert an item into an active quotation and recompute its total.
///
/// Writes the item and the quotation's new total.
pub async fn insert_item(
    pool: &Pool,
    quotation_id: i32,
    vehicle_id: i32,
    fields: &ItemFields,
) -> Result<ItemWrite<(QuotationItemRecord, i64)>, DatabaseError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    if let Some(refused) = lock_active(&tx, quotation_id).await? {
        return Ok(refused);
    }

    let sql = format!(
        r#"
        INSERT INTO quotation_items
            (quotation_id, vehicle_id, description, quantity, unit_price, discount, total)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {}
        "#,
        ITEM_COLUMNS
    );
    let row = tx.query_one(
        sql.as_str(),
        &[
            &quotation_id,
            &vehicle_id,
            &fields.description,
            &fields.quantity,
            &fields.unit_price,
            &fields.discount,
            &fields.total,
        ],
    ).await?;

    let item = row_to_item(&row);
    let total = recalculate_total(&tx, quotation_id).await?;

    tx.commit().await?;

    Ok(ItemWrite::Written((item, total)))
}

/// Update an item's editable fields and recompute the quotation total.
pub async fn update_item(
    pool: &Pool,
    id: i32,
    quotation_id: i32,
    fields: &ItemFields,
) -> Result<ItemWrite<(QuotationItemRecord, i64)>, DatabaseError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    if let Some(refused) = lock_active(&tx, quotation_id).await? {
        return Ok(refused);
    }

    let sql = format!(
        r#"
        UPDATE quotation_items
        SET description = $2, quantity = $3, unit_price = $4, discount = $5, total = $6
        WHERE id = $1 AND quotation_id = $7
        RETURNING {}
        "#,
        ITEM_COLUMNS
    );
    let row = tx.query_opt(
        sql.as_str(),
        &[
            &id,
            &fields.description,
            &fields.quantity,
            &fields.unit_price,
            &fields.discount,
            &fields.total,
            &quotation_id,
        ],
    ).await?;

    let Some(row) = row else {
        return Ok(ItemWrite::ItemMissing);
    };

    let item = row_to_item(&row);
    let total = recalculate_total(&tx, quotation_id).await?;

    tx.commit().await?;

    Ok(ItemWrite::Written((item, total)))
}

/// Delete an item and recompute the quotation total.
///
/// Writes the quotation's new total.
pub async fn delete_item(
    pool: &Pool,
    id: i32,
    quotation_id: i32,
) -> Result<ItemWrite<i64>, DatabaseError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    if let Some(refused) = lock_active(&tx, quotation_id).await? {
        return Ok(refused);
    }

    let deleted = tx.execute(
        "DELETE FROM quotation_items WHERE id = $1 AND quotation_id = $2",
        &[&id, &quotation_id],
    ).await?;
    if deleted == 0 {
        return Ok(ItemWrite::ItemMissing);
    }

    let total = recalculate_total(&tx, quotation_id).await?;

    tx.commit().await?;

    Ok(ItemWrite::Written(total))
}
