//! Pipeline stage queries.

use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::db::models::{StageFields, StageRecord};
use crate::db::DatabaseError;

fn row_to_stage(row: &Row) -> StageRecord {
    StageRecord {
        id: row.get("id"),
        name: row.get("name"),
        position: row.get("position"),
    }
}

/// All stages in pipeline order.
pub async fn list_stages(pool: &Pool) -> Result<Vec<StageRecord>, DatabaseError> {
    let client = pool.get().await?;

    let rows = client.query(
        "SELECT id, name, position FROM stages ORDER BY position",
        &[],
    ).await?;

    Ok(rows.iter().map(row_to_stage).collect())
}

pub async fn get_stage(pool: &Pool, id: i32) -> Result<Option<StageRecord>, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_opt(
        "SELECT id, name, position FROM stages WHERE id = $1",
        &[&id],
    ).await?;

    Ok(row.as_ref().map(row_to_stage))
}

/// Which of name / position already belong to a stage other than `exclude_id`.
///
/// Returns `(name_taken, position_taken)`.
pub async fn stage_conflicts(
    pool: &Pool,
    fields: &StageFields,
    exclude_id: Option<i32>,
) -> Result<(bool, bool), DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        r#"
        SELECT
            EXISTS (SELECT 1 FROM stages
                    WHERE name = $1 AND ($3::INT IS NULL OR id <> $3)) AS name_taken,
            EXISTS (SELECT 1 FROM stages
                    WHERE position = $2 AND ($3::INT IS NULL OR id <> $3)) AS position_taken
        "#,
        &[&fields.name, &fields.position, &exclude_id],
    ).await?;

    Ok((row.get("name_taken"), row.get("position_taken")))
}

pub async fn insert_stage(pool: &Pool, fields: &StageFields) -> Result<StageRecord, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        "INSERT INTO stages (name, position) VALUES ($1, $2) RETURNING id, name, position",
        &[&fields.name, &fields.position],
    ).await?;

    Ok(row_to_stage(&row))
}

pub async fn update_stage(
    pool: &Pool,
    id: i32,
    fields: &StageFields,
) -> Result<Option<StageRecord>, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_opt(
        r#"
        UPDATE stages SET name = $2, position = $3
        WHERE id = $1
        RETURNING id, name, position
        "#,
        &[&id, &fields.name, &fields.position],
    ).await?;

    Ok(row.as_ref().map(row_to_stage))
}

pub async fn stage_in_use(pool: &Pool, id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        "SELECT EXISTS (SELECT 1 FROM opportunities WHERE stage_id = $1) AS in_use",
        &[&id],
    ).await?;

    Ok(row.get("in_use"))
}

pub async fn delete_stage(pool: &Pool, id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let deleted = client.execute("DELETE FROM stages WHERE id = $1", &[&id]).await?;

    Ok(deleted > 0)
}
