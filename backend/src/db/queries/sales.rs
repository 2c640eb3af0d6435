//! Direct sale queries.

use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::info;

use super::clients::row_to_client;
use crate::db::models::{NewSaleLine, SaleLineRow, SaleRecord, SaleRow};
use crate::db::DatabaseError;

const SALE_SELECT: &str = r#"
    SELECT
        s.id AS sale_id, s.sold_at, s.total,
        c.id, c.name, c.nit, c.address, c.email
    FROM sales s
    JOIN clients c ON c.id = s.client_id
"#;

fn row_to_sale_row(row: &Row) -> SaleRow {
    let client = row_to_client(row);
    SaleRow {
        sale: SaleRecord {
            id: row.get("sale_id"),
            client_id: client.id,
            sold_at: row.get("sold_at"),
            total: row.get("total"),
        },
        client,
    }
}

/// Insert a sale and its lines in one transaction.
///
/// `total` must already equal the sum of the line subtotals.
pub async fn insert_sale(
    pool: &Pool,
    client_id: i32,
    lines: &[NewSaleLine],
    total: i64,
) -> Result<SaleRecord, DatabaseError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let row = tx.query_one(
        "INSERT INTO sales (client_id, total) VALUES ($1, $2) RETURNING id, sold_at",
        &[&client_id, &total],
    ).await?;

    let id: i32 = row.get("id");
    let sold_at: DateTime<Utc> = row.get("sold_at");

    let stmt = tx.prepare(
        "INSERT INTO sale_lines (sale_id, vehicle_id, quantity, unit_price) VALUES ($1, $2, $3, $4)",
    ).await?;

    for line in lines {
        tx.execute(&stmt, &[&id, &line.vehicle_id, &line.quantity, &line.unit_price])
            .await?;
    }

    tx.commit().await?;

    info!("Sale {} recorded: client {}, {} line(s), total {}", id, client_id, lines.len(), total);

    Ok(SaleRecord { id, client_id, sold_at, total })
}

/// All sales with their client, newest first.
pub async fn list_sales(pool: &Pool) -> Result<Vec<SaleRow>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("{} ORDER BY s.id DESC", SALE_SELECT);
    let rows = client.query(sql.as_str(), &[]).await?;

    Ok(rows.iter().map(row_to_sale_row).collect())
}

pub async fn get_sale(pool: &Pool, id: i32) -> Result<Option<SaleRow>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("{} WHERE s.id = $1", SALE_SELECT);
    let row = client.query_opt(sql.as_str(), &[&id]).await?;

    Ok(row.as_ref().map(row_to_sale_row))
}

/// Lines of a sale joined with their vehicle.
pub async fn list_sale_lines(pool: &Pool, sale_id: i32) -> Result<Vec<SaleLineRow>, DatabaseError> {
    let client = pool.get().await?;

    let rows = client.query(
        r#"
        SELECT
            sl.id, sl.vehicle_id, sl.quantity, sl.unit_price,
            v.make AS vehicle_make, v.model AS vehicle_model, v.year AS vehicle_year
        FROM sale_lines sl
        JOIN vehicles v ON v.id = sl.vehicle_id
        WHERE sl.sale_id = $1
        ORDER BY sl.id
        "#,
        &[&sale_id],
    ).await?;

    Ok(rows
        .iter()
        .map(|row| SaleLineRow {
            id: row.get("id"),
            vehicle_id: row.get("vehicle_id"),
            vehicle_make: row.get("vehicle_make"),
            vehicle_model: row.get("vehicle_model"),
            vehicle_year: row.get("vehicle_year"),
            quantity: row.get("quantity"),
            unit_price: row.get("unit_price"),
        })
        .collect())
}
