//! # Database Queries
//!
//! This module contains all the SQL queries for interacting with the database.
//! Each function performs a specific database operation.
//!
//! ## Query Organization
//!
//! Queries are grouped by the table they operate on:
//! - `users` - accounts and role membership
//! - `clients`, `vehicles`, `stages`, `products` - catalog tables
//! - `opportunities` - pipeline deals
//! - `quotations` - quotations and their items (totals recomputed here)
//! - `invoices` - invoices and their joined views
//! - `sales` - direct sales and lines
//!
//! ## Error Handling
//!
//! All queries return `Result<T, DatabaseError>`. Lookups of a single row
//! return `Ok(None)` when the row does not exist; deletes return whether a
//! row was removed.

pub mod clients;
pub mod invoices;
pub mod opportunities;
pub mod products;
pub mod quotations;
pub mod sales;
pub mod stages;
pub mod users;
pub mod vehicles;

/// Escape `%`, `_` and `\` so user input is matched literally by `ILIKE`.
pub(crate) fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("toy"), "%toy%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
