//! Vehicle catalog queries.

use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::debug;

use super::like_pattern;
use crate::db::models::{VehicleFields, VehicleRecord};
use crate::db::DatabaseError;

fn row_to_vehicle(row: &Row) -> VehicleRecord {
    VehicleRecord {
        id: row.get("id"),
        make: row.get("make"),
        model: row.get("model"),
        year: row.get("year"),
        price: row.get("price"),
    }
}

/// All vehicles ordered by make then model.
pub async fn list_vehicles(pool: &Pool) -> Result<Vec<VehicleRecord>, DatabaseError> {
    let client = pool.get().await?;

    let rows = client.query(
        "SELECT id, make, model, year, price FROM vehicles ORDER BY make, model, id",
        &[],
    ).await?;

    Ok(rows.iter().map(row_to_vehicle).collect())
}

pub async fn get_vehicle(pool: &Pool, id: i32) -> Result<Option<VehicleRecord>, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_opt(
        "SELECT id, make, model, year, price FROM vehicles WHERE id = $1",
        &[&id],
    ).await?;

    Ok(row.as_ref().map(row_to_vehicle))
}

/// Vehicles whose make contains `fragment` (case-insensitive), by model and year.
pub async fn list_vehicles_by_make(
    pool: &Pool,
    fragment: &str,
) -> Result<Vec<VehicleRecord>, DatabaseError> {
    debug!("Listing vehicles by make: {}", fragment);

    let client = pool.get().await?;

    let rows = client.query(
        r#"
        SELECT id, make, model, year, price
        FROM vehicles
        WHERE make ILIKE $1 ESCAPE '\'
        ORDER BY model, year, id
        "#,
        &[&like_pattern(fragment)],
    ).await?;

    Ok(rows.iter().map(row_to_vehicle).collect())
}

/// Vehicles whose make or model contains `term` (case-insensitive).
pub async fn search_vehicles(
    pool: &Pool,
    term: &str,
) -> Result<Vec<VehicleRecord>, DatabaseError> {
    let client = pool.get().await?;

    let rows = client.query(
        r#"
        SELECT id, make, model, year, price
        FROM vehicles
        WHERE make ILIKE $1 ESCAPE '\' OR model ILIKE $1 ESCAPE '\'
        ORDER BY make, model, id
        "#,
        &[&like_pattern(term)],
    ).await?;

    Ok(rows.iter().map(row_to_vehicle).collect())
}

/// Distinct makes, sorted.
pub async fn list_makes(pool: &Pool) -> Result<Vec<String>, DatabaseError> {
    let client = pool.get().await?;

    let rows = client.query("SELECT DISTINCT make FROM vehicles ORDER BY make", &[]).await?;

    Ok(rows.iter().map(|r| r.get("make")).collect())
}

/// Whether (make, model, year) is used by a vehicle other than `exclude_id`.
pub async fn vehicle_exists(
    pool: &Pool,
    fields: &VehicleFields,
    exclude_id: Option<i32>,
) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM vehicles
            WHERE make = $1 AND model = $2 AND year = $3
              AND ($4::INT IS NULL OR id <> $4)
        ) AS present
        "#,
        &[&fields.make, &fields.model, &fields.year, &exclude_id],
    ).await?;

    Ok(row.get("present"))
}

pub async fn insert_vehicle(
    pool: &Pool,
    fields: &VehicleFields,
) -> Result<VehicleRecord, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        r#"
        INSERT INTO vehicles (make, model, year, price)
        VALUES ($1, $2, $3, $4)
        RETURNING id, make, model, year, price
        "#,
        &[&fields.make, &fields.model, &fields.year, &fields.price],
    ).await?;

    Ok(row_to_vehicle(&row))
}

pub async fn update_vehicle(
    pool: &Pool,
    id: i32,
    fields: &VehicleFields,
) -> Result<Option<VehicleRecord>, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_opt(
        r#"
        UPDATE vehicles
        SET make = $2, model = $3, year = $4, price = $5
        WHERE id = $1
        RETURNING id, make, model, year, price
        "#,
        &[&id, &fields.make, &fields.model, &fields.year, &fields.price],
    ).await?;

    Ok(row.as_ref().map(row_to_vehicle))
}

/// Whether any opportunity or quotation item points at the vehicle.
pub async fn vehicle_in_use(pool: &Pool, id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        r#"
        SELECT
            EXISTS (SELECT 1 FROM opportunities WHERE vehicle_id = $1)
            OR EXISTS (SELECT 1 FROM quotation_items WHERE vehicle_id = $1)
            AS in_use
        "#,
        &[&id],
    ).await?;

    Ok(row.get("in_use"))
}

pub async fn delete_vehicle(pool: &Pool, id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let deleted = client.execute("DELETE FROM vehicles WHERE id = $1", &[&id]).await?;

    Ok(deleted > 0)
}
