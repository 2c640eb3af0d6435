//! User and role queries.

use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::{debug, info};

use crate::db::models::{NewUser, UserRecord};
use crate::db::DatabaseError;

/// Users joined with their sorted role names.
const USER_SELECT: &str = r#"
    SELECT
        u.id, u.username, u.email, u.first_name, u.last_name,
        u.password_hash, u.created_at,
        COALESCE(
            array_agg(ur.role::TEXT ORDER BY ur.role) FILTER (WHERE ur.role IS NOT NULL),
            '{}'
        )::TEXT[] AS roles
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
"#;

fn row_to_user(row: &Row) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        roles: row.get("roles"),
    }
}

/// Get a user by id.
pub async fn get_user(pool: &Pool, id: i32) -> Result<Option<UserRecord>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("{} WHERE u.id = $1 GROUP BY u.id", USER_SELECT);
    let row = client.query_opt(sql.as_str(), &[&id]).await?;

    Ok(row.as_ref().map(row_to_user))
}

/// Get a user by username (exact match).
pub async fn get_user_by_username(
    pool: &Pool,
    username: &str,
) -> Result<Option<UserRecord>, DatabaseError> {
    debug!("Fetching user: {}", username);

    let client = pool.get().await?;

    let sql = format!("{} WHERE u.username = $1 GROUP BY u.id", USER_SELECT);
    let row = client.query_opt(sql.as_str(), &[&username]).await?;

    Ok(row.as_ref().map(row_to_user))
}

/// List all users ordered by id.
pub async fn list_users(pool: &Pool) -> Result<Vec<UserRecord>, DatabaseError> {
    let client = pool.get().await?;

    let sql = format!("{} GROUP BY u.id ORDER BY u.id", USER_SELECT);
    let rows = client.query(sql.as_str(), &[]).await?;

    Ok(rows.iter().map(row_to_user).collect())
}

/// Insert a user and its role in one transaction.
pub async fn insert_user(pool: &Pool, user: &NewUser) -> Result<UserRecord, DatabaseError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let row = tx.query_one(
        r#"
        INSERT INTO users (username, email, first_name, last_name, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, created_at
        "#,
        &[
            &user.username,
            &user.email,
            &user.first_name,
            &user.last_name,
            &user.password_hash,
        ],
    ).await?;

    let id: i32 = row.get("id");

    tx.execute(
        "INSERT INTO user_roles (user_id, role) VALUES ($1, $2)",
        &[&id, &user.role],
    ).await?;

    tx.commit().await?;

    info!("User created: {} (id {}, role {})", user.username, id, user.role);

    Ok(UserRecord {
        id,
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        password_hash: user.password_hash.clone(),
        created_at: row.get("created_at"),
        roles: vec![user.role.clone()],
    })
}

/// Replace a user's password hash. Returns false if the user is gone.
pub async fn update_password_hash(
    pool: &Pool,
    id: i32,
    password_hash: &str,
) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let updated = client.execute(
        "UPDATE users SET password_hash = $2 WHERE id = $1",
        &[&id, &password_hash],
    ).await?;

    Ok(updated > 0)
}

/// Delete a user. Role links cascade.
pub async fn delete_user(pool: &Pool, id: i32) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let deleted = client.execute("DELETE FROM users WHERE id = $1", &[&id]).await?;

    Ok(deleted > 0)
}

/// Whether any user holds the given role.
pub async fn role_has_members(pool: &Pool, role: &str) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        "SELECT EXISTS (SELECT 1 FROM user_roles WHERE role = $1) AS present",
        &[&role],
    ).await?;

    Ok(row.get("present"))
}
