//! Client queries.

use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::debug;

use super::like_pattern;
use crate::db::models::{ClientFields, ClientRecord, ClientStats};
use crate::db::DatabaseError;

/// Clients with their opportunity and quotation counters.
const CLIENT_STATS_SELECT: &str = r#"
    SELECT
        c.id, c.name, c.nit, c.address, c.email,
        (SELECT COUNT(*) FROM opportunities o WHERE o.client_id = c.id)
            AS opportunities_count,
        (SELECT COUNT(*) FROM opportunities o WHERE o.client_id = c.id AND o.active)
            AS active_opportunities_count,
        (SELECT COUNT(*) FROM quotations q
            JOIN opportunities o ON o.id = q.opportunity_id
            WHERE o.client_id = c.id)
            AS quotations_count
    FROM clients c
"#;

pub(crate) fn row_to_client(row: &Row) -> ClientRecord {
    ClientRecord {
        id: row.get("id"),
        name: row.get("name"),
        nit: row.get("nit"),
        address: row.get("address"),
        email: row.get("email"),
    }
}

fn row_to_stats(row: &Row) -> ClientStats {
    ClientStats {
        client: row_to_client(row),
        opportunities_count: row.get("opportunities_count"),
        active_opportunities_count: row.get("active_opportunities_count"),
        quotations_count: row.get("quotations_count"),
    }
}

/// Get a client by id.
pub async fn get_client(pool: &Pool, id: i32) -> Result<Option<ClientRecord>, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_opt(
        "SELECT id, name, nit, address, email FROM clients WHERE id = $1",
        &[&id],
    ).await?;

    Ok(row.as_ref().map(row_to_client))
}

/// Whether a NIT is used by a client other than `exclude_id`.
pub async fn nit_taken(
    pool: &Pool,
    nit: &str,
    exclude_id: Option<i32>,
) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM clients WHERE nit = $1 AND ($2::INT IS NULL OR id <> $2)
        ) AS taken
        "#,
        &[&nit, &exclude_id],
    ).await?;

    Ok(row.get("taken"))
}

/// List every client with counters.
pub async fn list_clients(pool: &Pool) -> Result<Vec<ClientStats>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("{} ORDER BY c.id", CLIENT_STATS_SELECT);
    let rows = client.query(sql.as_str(), &[]).await?;

    Ok(rows.iter().map(row_to_stats).collect())
}

/// Case-insensitive substring search on client name.
pub async fn search_clients_by_name(
    pool: &Pool,
    fragment: &str,
) -> Result<Vec<ClientStats>, DatabaseError> {
    debug!("Searching clients by name: {}", fragment);

    let client = pool.get().await?;

    let sql = format!(
        "{} WHERE c.name ILIKE $1 ESCAPE '\\' ORDER BY c.name",
        CLIENT_STATS_SELECT
    );
    let rows = client.query(sql.as_str(), &[&like_pattern(fragment)]).await?;

    Ok(rows.iter().map(row_to_stats).collect())
}

/// Get a client with counters by exact NIT.
pub async fn get_client_stats_by_nit(
    pool: &Pool,
    nit: &str,
) -> Result<Option<ClientStats>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("{} WHERE c.nit = $1", CLIENT_STATS_SELECT);
    let row = client.query_opt(sql.as_str(), &[&nit]).await?;

    Ok(row.as_ref().map(row_to_stats))
}

/// Get a client with counters by id.
pub async fn get_client_stats(
    pool: &Pool,
    id: i32,
) -> Result<Option<ClientStats>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("{} WHERE c.id = $1", CLIENT_STATS_SELECT);
    let row = client.query_opt(sql.as_str(), &[&id]).await?;

    Ok(row.as_ref().map(row_to_stats))
}

/// Insert a client.
pub async fn insert_client(
    pool: &Pool,
    fields: &ClientFields,
) -> Result<ClientRecord, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        r#"
        INSERT INTO clients (name, nit, address, email)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, nit, address, email
        "#,
        &[&fields.name, &fields.nit, &fields.address, &fields.email],
    ).await?;

    Ok(row_to_client(&row))
}

/// Update a client. Returns `None` if it does not exist.
pub async fn update_client(
    pool: &Pool,
    id: i32,
    fields: &ClientFields,
) -> Result<Option<ClientRecord>, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_opt(
        r#"
        UPDATE clients
        SET name = $2, nit = $3, address = $4, email = $5
        WHERE id = $1
        RETURNING id, name, nit, address, email
        "#,
        &[&id, &fields.name, &fields.nit, &fields.address, &fields.email],
    ).await?;

    Ok(row.as_ref().map(row_to_client))
}

/// Delete a client.
pub async fn delete_client(pool: &Pool, id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let deleted = client.execute("DELETE FROM clients WHERE id = $1", &[&id]).await?;

    Ok(deleted > 0)
}
