//! Opportunity queries.

use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::info;

use crate::db::models::{OpportunityFields, OpportunityRecord, OpportunityRow};
use crate::db::DatabaseError;

/// Opportunities joined with client, seller, vehicle and stage.
const OPPORTUNITY_SELECT: &str = r#"
    SELECT
        o.id, o.active,
        c.id AS client_id, c.name AS client_name, c.nit AS client_nit,
        c.address AS client_address, c.email AS client_email,
        u.id AS seller_id, u.first_name AS seller_first_name,
        u.last_name AS seller_last_name, u.email AS seller_email,
        v.id AS vehicle_id, v.make AS vehicle_make, v.model AS vehicle_model,
        v.year AS vehicle_year, v.price AS vehicle_price,
        s.id AS stage_id, s.name AS stage_name,
        (SELECT COUNT(*) FROM quotations q WHERE q.opportunity_id = o.id)
            AS quotations_count,
        (SELECT COUNT(*) FROM invoices i
            JOIN quotations q ON q.id = i.quotation_id
            WHERE q.opportunity_id = o.id)
            AS invoices_count
    FROM opportunities o
    JOIN clients c ON c.id = o.client_id
    JOIN users u ON u.id = o.user_id
    JOIN stages s ON s.id = o.stage_id
    LEFT JOIN vehicles v ON v.id = o.vehicle_id
"#;

const OPPORTUNITY_COLUMNS: &str = "id, client_id, user_id, vehicle_id, stage_id, active";

fn row_to_opportunity(row: &Row) -> OpportunityRecord {
    OpportunityRecord {
        id: row.get("id"),
        client_id: row.get("client_id"),
        user_id: row.get("user_id"),
        vehicle_id: row.get("vehicle_id"),
        stage_id: row.get("stage_id"),
        active: row.get("active"),
    }
}

fn row_to_opportunity_row(row: &Row) -> OpportunityRow {
    OpportunityRow {
        id: row.get("id"),
        client_id: row.get("client_id"),
        client_name: row.get("client_name"),
        client_nit: row.get("client_nit"),
        client_address: row.get("client_address"),
        client_email: row.get("client_email"),
        seller_id: row.get("seller_id"),
        seller_first_name: row.get("seller_first_name"),
        seller_last_name: row.get("seller_last_name"),
        seller_email: row.get("seller_email"),
        vehicle_id: row.get("vehicle_id"),
        vehicle_make: row.get("vehicle_make"),
        vehicle_model: row.get("vehicle_model"),
        vehicle_year: row.get("vehicle_year"),
        vehicle_price: row.get("vehicle_price"),
        stage_id: row.get("stage_id"),
        stage_name: row.get("stage_name"),
        active: row.get("active"),
        quotations_count: row.get("quotations_count"),
        invoices_count: row.get("invoices_count"),
    }
}

pub async fn list_opportunities(pool: &Pool) -> Result<Vec<OpportunityRow>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("{} ORDER BY o.id", OPPORTUNITY_SELECT);
    let rows = client.query(sql.as_str(), &[]).await?;

    Ok(rows.iter().map(row_to_opportunity_row).collect())
}

pub async fn list_opportunities_by_client(
    pool: &Pool,
    client_id: i32,
) -> Result<Vec<OpportunityRow>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("{} WHERE o.client_id = $1 ORDER BY o.id", OPPORTUNITY_SELECT);
    let rows = client.query(sql.as_str(), &[&client_id]).await?;

    Ok(rows.iter().map(row_to_opportunity_row).collect())
}

pub async fn list_opportunities_by_user(
    pool: &Pool,
    user_id: i32,
) -> Result<Vec<OpportunityRow>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("{} WHERE o.user_id = $1 ORDER BY o.id", OPPORTUNITY_SELECT);
    let rows = client.query(sql.as_str(), &[&user_id]).await?;

    Ok(rows.iter().map(row_to_opportunity_row).collect())
}

/// Joined detail view of one opportunity.
pub async fn get_opportunity_row(
    pool: &Pool,
    id: i32,
) -> Result<Option<OpportunityRow>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("{} WHERE o.id = $1", OPPORTUNITY_SELECT);
    let row = client.query_opt(sql.as_str(), &[&id]).await?;

    Ok(row.as_ref().map(row_to_opportunity_row))
}

pub async fn get_opportunity(
    pool: &Pool,
    id: i32,
) -> Result<Option<OpportunityRecord>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("SELECT {} FROM opportunities WHERE id = $1", OPPORTUNITY_COLUMNS);
    let row = client.query_opt(sql.as_str(), &[&id]).await?;

    Ok(row.as_ref().map(row_to_opportunity))
}

pub async fn insert_opportunity(
    pool: &Pool,
    fields: &OpportunityFields,
) -> Result<OpportunityRecord, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!(
        r#"
        INSERT INTO opportunities (client_id, user_id, vehicle_id, stage_id, active)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        OPPORTUNITY_COLUMNS
    );
    let row = client.query_one(
        sql.as_str(),
        &[
            &fields.client_id,
            &fields.user_id,
            &fields.vehicle_id,
            &fields.stage_id,
            &fields.active,
        ],
    ).await?;

    let record = row_to_opportunity(&row);
    info!("Opportunity {} created for client {}", record.id, record.client_id);

    Ok(record)
}

pub async fn update_opportunity(
    pool: &Pool,
    id: i32,
    fields: &OpportunityFields,
) -> Result<Option<OpportunityRecord>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!(
        r#"
        UPDATE opportunities
        SET client_id = $2, user_id = $3, vehicle_id = $4, stage_id = $5, active = $6
        WHERE id = $1
        RETURNING {}
        "#,
        OPPORTUNITY_COLUMNS
    );
    let row = client.query_opt(
        sql.as_str(),
        &[
            &id,
            &fields.client_id,
            &fields.user_id,
            &fields.vehicle_id,
            &fields.stage_id,
            &fields.active,
        ],
    ).await?;

    Ok(row.as_ref().map(row_to_opportunity))
}

/// Flip the active flag. Returns `None` if the opportunity does not exist.
pub async fn set_opportunity_active(
    pool: &Pool,
    id: i32,
    active: bool,
) -> Result<Option<OpportunityRecord>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!(
        "UPDATE opportunities SET active = $2 WHERE id = $1 RETURNING {}",
        OPPORTUNITY_COLUMNS
    );
    let row = client.query_opt(sql.as_str(), &[&id, &active]).await?;

    Ok(row.as_ref().map(row_to_opportunity))
}

pub async fn opportunity_has_quotations(pool: &Pool, id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        "SELECT EXISTS (SELECT 1 FROM quotations WHERE opportunity_id = $1) AS present",
        &[&id],
    ).await?;

    Ok(row.get("present"))
}

pub async fn client_has_opportunities(pool: &Pool, client_id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        "SELECT EXISTS (SELECT 1 FROM opportunities WHERE client_id = $1) AS present",
        &[&client_id],
    ).await?;

    Ok(row.get("present"))
}

pub async fn user_has_opportunities(pool: &Pool, user_id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        "SELECT EXISTS (SELECT 1 FROM opportunities WHERE user_id = $1) AS present",
        &[&user_id],
    ).await?;

    Ok(row.get("present"))
}

pub async fn delete_opportunity(pool: &Pool, id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let deleted = client.execute("DELETE FROM opportunities WHERE id = $1", &[&id]).await?;

    Ok(deleted > 0)
}
