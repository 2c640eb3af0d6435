//! # API Request Models
//!
//! Structures for incoming API request bodies.
//! Each struct represents the expected JSON body for an endpoint.
//!
//! Missing fields fall back to their defaults so that the service layer
//! can report every problem at once instead of failing on the first
//! absent key.
//!
//! ## Money
//!
//! Amounts are accepted as JSON numbers or strings in currency units
//! (`25000.50`, `"25,000.50"`) and converted to cents on the way in.

use serde::{Deserialize, Serialize};

use crate::utils::deserialize_money;

// ============================================
// AUTH
// ============================================

/// Request to register a user.
///
/// ## Example JSON
///
/// ```json
/// {
///     "userName": "mlopez",
///     "email": "mlopez@example.com",
///     "firstName": "María",
///     "lastName": "López",
///     "password": "Ventas2024",
///     "role": "vendedor"
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,

    /// Defaults to `vendedor`.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

/// Admin password reset for another user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetPasswordRequest {
    pub new_password: String,
    pub confirm_new_password: String,
}

// ============================================
// CATALOG
// ============================================

/// Create or update a client.
///
/// On update, `id` may be omitted; if present it must match the path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientRequest {
    pub id: Option<i32>,
    pub name: String,
    pub nit: String,
    pub address: String,
    pub email: Option<String>,
}

/// Create or update a vehicle.
///
/// ## Example JSON
///
/// ```json
/// {
///     "make": "Toyota",
///     "model": "Hilux SR",
///     "year": 2024,
///     "price": 285000
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleRequest {
    pub make: String,
    pub model: String,
    pub year: i32,

    /// Price in cents.
    #[serde(deserialize_with = "deserialize_money")]
    pub price: i64,
}

/// Query string of `GET /api/vehicles/search`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VehicleSearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StageRequest {
    pub name: String,
    pub position: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductRequest {
    pub name: String,

    /// Price in cents.
    #[serde(deserialize_with = "deserialize_money")]
    pub price: i64,

    pub quantity: i32,
    pub description: String,
}

// ============================================
// PIPELINE
// ============================================

/// Create or replace an opportunity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpportunityRequest {
    pub client_id: i32,

    /// The seller handling the opportunity.
    pub user_id: i32,

    pub vehicle_id: Option<i32>,
    pub stage_id: i32,

    /// Ignored on create (opportunities start active); defaults to true on update.
    pub active: Option<bool>,
}

/// Body of the `.../status` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuotationRequest {
    pub opportunity_id: i32,

    /// Defaults to true.
    pub active: Option<bool>,
}

/// Add an item to a quotation.
///
/// ## Example JSON
///
/// ```json
/// {
///     "quotationId": 12,
///     "vehicleId": 4,
///     "description": "Hilux SR 2024, white",
///     "quantity": 2,
///     "unitPrice": 285000,
///     "discount": 5000
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuotationItemRequest {
    pub quotation_id: i32,
    pub vehicle_id: i32,
    pub description: String,
    pub quantity: i32,

    #[serde(deserialize_with = "deserialize_money")]
    pub unit_price: i64,

    #[serde(deserialize_with = "deserialize_money")]
    pub discount: i64,
}

/// Edit an item. The quotation and vehicle of an item never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateQuotationItemRequest {
    pub description: String,
    pub quantity: i32,

    #[serde(deserialize_with = "deserialize_money")]
    pub unit_price: i64,

    #[serde(deserialize_with = "deserialize_money")]
    pub discount: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceRequest {
    pub quotation_id: i32,
}

// ============================================
// DIRECT SALES
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleRequest {
    pub client_id: i32,
    pub vehicles: Vec<SaleLineRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleLineRequest {
    pub vehicle_id: i32,
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let req: ClientRequest = serde_json::from_str(r#"{"name": "Ana"}"#).unwrap();
        assert_eq!(req.name, "Ana");
        assert!(req.nit.is_empty());
        assert_eq!(req.id, None);
    }

    #[test]
    fn test_item_request_amounts_in_cents() {
        let req: QuotationItemRequest = serde_json::from_str(
            r#"{"quotationId": 1, "vehicleId": 2, "description": "x",
                "quantity": 1, "unitPrice": "1,500.25"}"#,
        )
        .unwrap();
        assert_eq!(req.unit_price, 150_025);
        assert_eq!(req.discount, 0);
    }

    #[test]
    fn test_register_uses_camel_case() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"userName": "mlopez", "firstName": "María", "role": "Gerente"}"#,
        )
        .unwrap();
        assert_eq!(req.user_name, "mlopez");
        assert_eq!(req.first_name, "María");
        assert_eq!(req.role.as_deref(), Some("Gerente"));
    }
}
