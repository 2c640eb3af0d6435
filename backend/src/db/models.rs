//! # Database Models
//!
//! This module defines the data structures that map to database tables.
//! Each `*Record` struct is a row of one table; `*Row` structs are the
//! joined projections the API reads from.
//!
//! ## Table Overview
//!
//! | Table | Description |
//! |-------|-------------|
//! | `users`, `user_roles`, `roles` | Identity and role membership |
//! | `clients` | Customers, unique by NIT |
//! | `vehicles` | Vehicle catalog |
//! | `stages` | Sales pipeline stages |
//! | `opportunities` | A client's deal handled by a seller |
//! | `quotations`, `quotation_items` | Priced offers for an opportunity |
//! | `invoices` | One per quotation, unique number |
//! | `products` | Product inventory |
//! | `sales`, `sale_lines` | Direct vehicle sales |
//!
//! ## Relationship Diagram
//!
//! ```text
//! ┌──────────┐      ┌───────────────┐      ┌────────────┐      ┌──────────┐
//! │ clients  │─────<│ opportunities │─────<│ quotations │─────<│  items   │
//! └──────────┘      │ user_id (FK)  │      │ total      │      │ total    │
//!                   │ stage_id (FK) │      └────────────┘      └──────────┘
//!                   │ vehicle_id?   │            │
//!                   └───────────────┘            │ 0..1
//!                                          ┌────────────┐
//!                                          │  invoices  │
//!                                          └────────────┘
//! ```
//!
//! ## Note on Money
//!
//! Amounts are `i64` cents. PostgreSQL stores them as `BIGINT`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// IDENTITY
// ============================================

/// A user account with its role names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    /// bcrypt hash, never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,

    /// Role names from `user_roles`, sorted.
    pub roles: Vec<String>,
}

/// Fields for a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: String,
}

// ============================================
// CATALOG
// ============================================

/// A client (customer). NIT is the tax id and is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientRecord {
    pub id: i32,
    pub name: String,
    pub nit: String,
    pub address: String,
    pub email: Option<String>,
}

/// Client fields written on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFields {
    pub name: String,
    pub nit: String,
    pub address: String,
    pub email: Option<String>,
}

/// A client together with its pipeline counters.
#[derive(Debug, Clone)]
pub struct ClientStats {
    pub client: ClientRecord,
    pub opportunities_count: i64,
    pub active_opportunities_count: i64,
    pub quotations_count: i64,
}

/// A vehicle in the catalog. Unique by (make, model, year).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VehicleRecord {
    pub id: i32,
    pub make: String,
    pub model: String,
    pub year: i32,

    /// List price in cents.
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleFields {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
}

/// A sales pipeline stage. Both name and position are unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageRecord {
    pub id: i32,
    pub name: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFields {
    pub name: String,
    pub position: i32,
}

/// An inventory product, addressed by its unique name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRecord {
    pub id: i32,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub description: String,
}

// ============================================
// PIPELINE
// ============================================

/// An opportunity row as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpportunityRecord {
    pub id: i32,
    pub client_id: i32,
    pub user_id: i32,
    pub vehicle_id: Option<i32>,
    pub stage_id: i32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpportunityFields {
    pub client_id: i32,
    pub user_id: i32,
    pub vehicle_id: Option<i32>,
    pub stage_id: i32,
    pub active: bool,
}

/// An opportunity joined with its client, seller, vehicle and stage.
///
/// Every list and detail view of opportunities is a projection of this.
#[derive(Debug, Clone)]
pub struct OpportunityRow {
    pub id: i32,
    pub client_id: i32,
    pub client_name: String,
    pub client_nit: String,
    pub client_address: String,
    pub client_email: Option<String>,
    pub seller_id: i32,
    pub seller_first_name: String,
    pub seller_last_name: String,
    pub seller_email: String,
    pub vehicle_id: Option<i32>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_year: Option<i32>,
    pub vehicle_price: Option<i64>,
    pub stage_id: i32,
    pub stage_name: String,
    pub active: bool,
    pub quotations_count: i64,
    pub invoices_count: i64,
}

impl OpportunityRow {
    /// The vehicle of interest, if the opportunity names one.
    pub fn vehicle(&self) -> Option<VehicleRecord> {
        match (
            self.vehicle_id,
            &self.vehicle_make,
            &self.vehicle_model,
            self.vehicle_year,
            self.vehicle_price,
        ) {
            (Some(id), Some(make), Some(model), Some(year), Some(price)) => Some(VehicleRecord {
                id,
                make: make.clone(),
                model: model.clone(),
                year,
                price,
            }),
            _ => None,
        }
    }
}

/// A quotation. `total` is the sum of its item totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotationRecord {
    pub id: i32,
    pub opportunity_id: i32,
    pub active: bool,
    pub total: i64,
}

/// A quotation with its item and invoice counts.
#[derive(Debug, Clone)]
pub struct QuotationSummaryRow {
    pub id: i32,
    pub active: bool,
    pub total: i64,
    pub items_count: i64,
    pub invoices_count: i64,
}

/// A quotation line. `total = unit_price * quantity - discount`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotationItemRecord {
    pub id: i32,
    pub quotation_id: i32,
    pub vehicle_id: i32,
    pub description: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub discount: i64,
    pub total: i64,
}

/// Editable item fields plus the computed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFields {
    pub description: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub discount: i64,
    pub total: i64,
}

/// An item joined with its vehicle make and model.
#[derive(Debug, Clone)]
pub struct QuotationItemRow {
    pub item: QuotationItemRecord,
    pub vehicle_make: String,
    pub vehicle_model: String,
}

// ============================================
// INVOICES
// ============================================

/// Invoice lifecycle. An invoice starts pending and is issued once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Issued,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Issued => "issued",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "issued" => Ok(InvoiceStatus::Issued),
            other => Err(format!("unknown invoice status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvoiceRecord {
    pub id: i32,
    pub quotation_id: i32,
    pub number: String,
    pub status: InvoiceStatus,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

/// An invoice joined with the client and seller behind its quotation.
#[derive(Debug, Clone)]
pub struct InvoiceRow {
    pub invoice: InvoiceRecord,
    pub opportunity_id: i32,
    pub client_id: i32,
    pub client_name: String,
    pub client_nit: String,
    pub client_address: String,
    pub client_email: Option<String>,
    pub seller_id: i32,
    pub seller_first_name: String,
    pub seller_last_name: String,
    pub seller_email: String,
}

// ============================================
// DIRECT SALES
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleRecord {
    pub id: i32,
    pub client_id: i32,
    pub sold_at: DateTime<Utc>,
    pub total: i64,
}

/// A priced sale line ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSaleLine {
    pub vehicle_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
}

/// A stored sale line joined with its vehicle.
#[derive(Debug, Clone)]
pub struct SaleLineRow {
    pub id: i32,
    pub vehicle_id: i32,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: i32,
    pub quantity: i32,
    pub unit_price: i64,
}

/// A sale joined with its client.
#[derive(Debug, Clone)]
pub struct SaleRow {
    pub sale: SaleRecord,
    pub client: ClientRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_status_round_trips_through_text() {
        for status in [InvoiceStatus::Pending, InvoiceStatus::Issued] {
            assert_eq!(status.as_str().parse::<InvoiceStatus>(), Ok(status));
        }
        assert!("emitida".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = UserRecord {
            id: 1,
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            first_name: "Ana".to_string(),
            last_name: "López".to_string(),
            password_hash: "$2b$10$secret".to_string(),
            created_at: Utc::now(),
            roles: vec!["vendedor".to_string()],
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("vendedor"));
    }
}
