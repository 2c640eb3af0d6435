//! Product inventory queries. Products are addressed by name.

use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::db::models::{ProductFields, ProductRecord};
use crate::db::DatabaseError;

fn row_to_product(row: &Row) -> ProductRecord {
    ProductRecord {
        id: row.get("id"),
        name: row.get("name"),
        price: row.get("price"),
        quantity: row.get("quantity"),
        description: row.get("description"),
    }
}

pub async fn list_products(pool: &Pool) -> Result<Vec<ProductRecord>, DatabaseError> {
    let client = pool.get().await?;

    let rows = client.query(
        "SELECT id, name, price, quantity, description FROM products ORDER BY id",
        &[],
    ).await?;

    Ok(rows.iter().map(row_to_product).collect())
}

pub async fn get_product_by_name(
    pool: &Pool,
    name: &str,
) -> Result<Option<ProductRecord>, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_opt(
        "SELECT id, name, price, quantity, description FROM products WHERE name = $1",
        &[&name],
    ).await?;

    Ok(row.as_ref().map(row_to_product))
}

/// Insert a product. A duplicate name surfaces as a unique violation.
pub async fn insert_product(
    pool: &Pool,
    fields: &ProductFields,
) -> Result<ProductRecord, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_one(
        r#"
        INSERT INTO products (name, price, quantity, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, price, quantity, description
        "#,
        &[&fields.name, &fields.price, &fields.quantity, &fields.description],
    ).await?;

    Ok(row_to_product(&row))
}

/// Update price, quantity and description of the named product.
pub async fn update_product(
    pool: &Pool,
    fields: &ProductFields,
) -> Result<Option<ProductRecord>, DatabaseError> {
    let client = pool.get().await?;

    let row = client.query_opt(
        r#"
        UPDATE products
        SET price = $2, quantity = $3, description = $4
        WHERE name = $1
        RETURNING id, name, price, quantity, description
        "#,
        &[&fields.name, &fields.price, &fields.quantity, &fields.description],
    ).await?;

    Ok(row.as_ref().map(row_to_product))
}

pub async fn delete_product(pool: &Pool, name: &str) -> Result<bool, DatabaseError> {
    let client = pool.get().await?;

    let deleted = client.execute("DELETE FROM products WHERE name = $1", &[&name]).await?;

    Ok(deleted > 0)
}
