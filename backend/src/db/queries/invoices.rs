//! Invoice queries.

use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::info;

use crate::db::models::{InvoiceRecord, InvoiceRow, InvoiceStatus};
use crate::db::DatabaseError;

/// Invoices joined with the quotation, client and seller behind them.
const INVOICE_SELECT: &str = r#"
    SELECT
        i.id, i.quotation_id, i.number, i.status, i.total, i.created_at,
        o.id AS opportunity_id,
        c.id AS client_id, c.name AS client_name, c.nit AS client_nit,
        c.address AS client_address, c.email AS client_email,
        u.id AS seller_id, u.first_name AS seller_first_name,
        u.last_name AS seller_last_name, u.email AS seller_email
    FROM invoices i
    JOIN quotations q ON q.id = i.quotation_id
    JOIN opportunities o ON o.id = q.opportunity_id
    JOIN clients c ON c.id = o.client_id
    JOIN users u ON u.id = o.user_id
"#;

const INVOICE_COLUMNS: &str = "id, quotation_id, number, status, total, created_at";

fn row_to_invoice(row: &Row) -> Result<InvoiceRecord, DatabaseError> {
    let status: String = row.get("status");

    Ok(InvoiceRecord {
        id: row.get("id"),
        quotation_id: row.get("quotation_id"),
        number: row.get("number"),
        status: status.parse::<InvoiceStatus>().map_err(DatabaseError::InvalidData)?,
        total: row.get("total"),
        created_at: row.get("created_at"),
    })
}

fn row_to_invoice_row(row: &Row) -> Result<InvoiceRow, DatabaseError> {
    Ok(InvoiceRow {
        invoice: row_to_invoice(row)?,
        opportunity_id: row.get("opportunity_id"),
        client_id: row.get("client_id"),
        client_name: row.get("client_name"),
        client_nit: row.get("client_nit"),
        client_address: row.get("client_address"),
        client_email: row.get("client_email"),
        seller_id: row.get("seller_id"),
        seller_first_name: row.get("seller_first_name"),
        seller_last_name: row.get("seller_last_name"),
        seller_email: row.get("seller_email"),
    })
}

async fn query_invoice_rows(
    pool: &Pool,
    filter: &str,
    params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
) -> Result<Vec<InvoiceRow>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("{} {}", INVOICE_SELECT, filter);
    let rows = client.query(sql.as_str(), params).await?;

    rows.iter().map(row_to_invoice_row).collect()
}

/// All invoices, newest first.
pub async fn list_invoices(pool: &Pool) -> Result<Vec<InvoiceRow>, DatabaseError> {
    query_invoice_rows(pool, "ORDER BY i.id DESC", &[]).await
}

pub async fn list_invoices_by_client(
    pool: &Pool,
    client_id: i32,
) -> Result<Vec<InvoiceRow>, DatabaseError> {
    query_invoice_rows(pool, "WHERE c.id = $1 ORDER BY i.id DESC", &[&client_id]).await
}

/// Pending invoices, oldest first.
pub async fn list_pending_invoices(pool: &Pool) -> Result<Vec<InvoiceRow>, DatabaseError> {
    query_invoice_rows(pool, "WHERE i.status = 'pending' ORDER BY i.id ASC", &[]).await
}

pub async fn get_invoice_row(pool: &Pool, id: i32) -> Result<Option<InvoiceRow>, DatabaseError> {
    let mut rows = query_invoice_rows(pool, "WHERE i.id = $1", &[&id]).await?;
    Ok(rows.pop())
}

pub async fn get_invoice_row_by_quotation(
    pool: &Pool,
    quotation_id: i32,
) -> Result<Option<InvoiceRow>, DatabaseError> {
    let mut rows = query_invoice_rows(pool, "WHERE i.quotation_id = $1", &[&quotation_id]).await?;
    Ok(rows.pop())
}

pub async fn get_invoice(pool: &Pool, id: i32) -> Result<Option<InvoiceRecord>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("SELECT {} FROM invoices WHERE id = $1", INVOICE_COLUMNS);
    let row = client.query_opt(sql.as_str(), &[&id]).await?;

    row.as_ref().map(row_to_invoice).transpose()
}

pub async fn invoice_number_exists(pool: &Pool, number: &str) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        "SELECT EXISTS (SELECT 1 FROM invoices WHERE number = $1) AS present",
        &[&number],
    ).await?;

    Ok(row.get("present"))
}

/// Insert a pending invoice for a quotation.
///
/// A second invoice for the same quotation, or a reused number, surfaces
/// as a unique violation.
pub async fn insert_invoice(
    pool: &Pool,
    quotation_id: i32,
    number: &str,
    total: i64,
) -> Result<InvoiceRecord, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!(
        r#"
        INSERT INTO invoices (quotation_id, number, status, total)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        INVOICE_COLUMNS
    );
    let row = client.query_one(
        sql.as_str(),
        &[&quotation_id, &number, &InvoiceStatus::Pending.as_str(), &total],
    ).await?;

    let invoice = row_to_invoice(&row)?;
    info!("Invoice {} created for quotation {}", invoice.number, quotation_id);

    Ok(invoice)
}

/// Move a pending invoice to issued.
///
/// Returns `None` when the invoice is missing or no longer pending.
pub async fn mark_invoice_issued(
    pool: &Pool,
    id: i32,
) -> Result<Option<InvoiceRecord>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!(
        "UPDATE invoices SET status = $2 WHERE id = $1 AND status = $3 RETURNING {}",
        INVOICE_COLUMNS
    );
    let row = client.query_opt(
        sql.as_str(),
        &[&id, &InvoiceStatus::Issued.as_str(), &InvoiceStatus::Pending.as_str()],
    ).await?;

    row.as_ref().map(row_to_invoice).transpose()
}

/// Delete a pending invoice. Issued invoices are never removed.
pub async fn delete_pending_invoice(pool: &Pool, id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let deleted = client.execute(
        "DELETE FROM invoices WHERE id = $1 AND status = $2",
        &[&id, &InvoiceStatus::Pending.as_str()],
    ).await?;

    Ok(deleted > 0)
}
