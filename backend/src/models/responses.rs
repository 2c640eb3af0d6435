//! # API Response Models
//!
//! Structures for outgoing API response bodies.
//! All responses are wrapped in a standard format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{
    ClientRecord, ClientStats, InvoiceRecord, InvoiceRow, InvoiceStatus, OpportunityRecord,
    OpportunityRow, ProductRecord, QuotationItemRecord, QuotationItemRow, QuotationRecord,
    QuotationSummaryRow, SaleLineRow, StageRecord, UserRecord, VehicleRecord,
};
use crate::utils::{format_money, format_sale_date};

/// Standard API response wrapper.
///
/// All API responses follow this format:
///
/// ## Success Response
///
/// ```json
/// {
///     "success": true,
///     "data": { ... },
///     "message": "Client created",
///     "error": null
/// }
/// ```
///
/// ## Error Response
///
/// ```json
/// {
///     "success": false,
///     "data": null,
///     "message": null,
///     "error": {
///         "code": "BUSINESS_RULE_VIOLATION",
///         "message": "cannot delete a client that has opportunities"
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the request was successful.
    pub success: bool,

    /// Response data (null on error).
    pub data: Option<T>,

    /// Optional human-readable note on success.
    pub message: Option<String>,

    /// Error information (null on success).
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    /// Create a successful response with data and a message.
    pub fn success_with_message(data: T, message: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

impl ApiResponse<()> {
    /// A successful response that carries only a message.
    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
            error: None,
        }
    }
}

/// API error information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Error code (e.g., "NOT_FOUND").
    pub code: String,

    /// Human-readable error message.
    pub message: String,
}

/// A list with its length.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "healthy" or "unhealthy".
    pub status: String,

    /// Database reachable.
    pub database: bool,

    /// Crate version.
    pub version: String,

    pub timestamp: DateTime<Utc>,
}

// ============================================
// AUTH
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub user_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserResponse {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            user_name: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            roles: user.roles.clone(),
            created_at: user.created_at,
        }
    }
}

/// Successful login.
///
/// ## Example Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "token": "eyJhbGciOiJIUzI1NiJ9...",
///         "expiresAt": "2025-01-01T14:00:00Z",
///         "user": { "id": 1, "userName": "admin", "roles": ["admin"], ... }
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

// ============================================
// CATALOG
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: i32,
    pub name: String,
    pub nit: String,
    pub address: String,
    pub email: Option<String>,
}

impl From<&ClientRecord> for ClientResponse {
    fn from(c: &ClientRecord) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            nit: c.nit.clone(),
            address: c.address.clone(),
            email: c.email.clone(),
        }
    }
}

/// A client with its pipeline counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummaryResponse {
    #[serde(flatten)]
    pub client: ClientResponse,
    pub opportunities_count: i64,
    pub active_opportunities_count: i64,
    pub quotations_count: i64,
}

impl From<&ClientStats> for ClientSummaryResponse {
    fn from(s: &ClientStats) -> Self {
        Self {
            client: ClientResponse::from(&s.client),
            opportunities_count: s.opportunities_count,
            active_opportunities_count: s.active_opportunities_count,
            quotations_count: s.quotations_count,
        }
    }
}

/// One line of a client's opportunity summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOpportunitySummary {
    pub id: i32,
    pub seller_name: String,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub stage_name: String,
    pub active: bool,
    pub quotations_count: i64,
}

/// `GET /api/clients/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetailResponse {
    #[serde(flatten)]
    pub summary: ClientSummaryResponse,
    pub opportunities: Vec<ClientOpportunitySummary>,
}

/// `GET /api/clients/{id}/opportunities`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOpportunitiesResponse {
    pub client: ClientRef,
    pub opportunities: Vec<OpportunityListItem>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub id: i32,
    pub make: String,
    pub model: String,
    pub year: i32,

    /// Price in cents.
    pub price: i64,

    /// Human-readable price (e.g., "285,000.00").
    pub formatted_price: String,
}

impl From<&VehicleRecord> for VehicleResponse {
    fn from(v: &VehicleRecord) -> Self {
        Self {
            id: v.id,
            make: v.make.clone(),
            model: v.model.clone(),
            year: v.year,
            price: v.price,
            formatted_price: format_money(v.price),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse {
    pub id: i32,
    pub name: String,
    pub position: i32,
}

impl From<&StageRecord> for StageResponse {
    fn from(s: &StageRecord) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            position: s.position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub price: i64,
    pub formatted_price: String,
    pub quantity: i32,
    pub description: String,
}

impl From<&ProductRecord> for ProductResponse {
    fn from(p: &ProductRecord) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            price: p.price,
            formatted_price: format_money(p.price),
            quantity: p.quantity,
            description: p.description.clone(),
        }
    }
}

// ============================================
// PIPELINE
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientRef {
    pub id: i32,
    pub name: String,
    pub nit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SellerRef {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SellerResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRef {
    pub id: i32,
    pub make: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StageRef {
    pub id: i32,
    pub name: String,
}

/// An opportunity as written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityResponse {
    pub id: i32,
    pub client_id: i32,
    pub user_id: i32,
    pub vehicle_id: Option<i32>,
    pub stage_id: i32,
    pub active: bool,
}

impl From<&OpportunityRecord> for OpportunityResponse {
    fn from(o: &OpportunityRecord) -> Self {
        Self {
            id: o.id,
            client_id: o.client_id,
            user_id: o.user_id,
            vehicle_id: o.vehicle_id,
            stage_id: o.stage_id,
            active: o.active,
        }
    }
}

/// An opportunity in a list view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityListItem {
    pub id: i32,
    pub client: ClientRef,
    pub seller: SellerRef,
    pub vehicle: Option<VehicleRef>,
    pub stage: StageRef,
    pub active: bool,
    pub quotations_count: i64,
    pub invoices_count: i64,
}

fn vehicle_ref(row: &OpportunityRow) -> Option<VehicleRef> {
    match (row.vehicle_id, &row.vehicle_make, &row.vehicle_model) {
        (Some(id), Some(make), Some(model)) => Some(VehicleRef {
            id,
            make: make.clone(),
            model: model.clone(),
        }),
        _ => None,
    }
}

impl From<&OpportunityRow> for OpportunityListItem {
    fn from(row: &OpportunityRow) -> Self {
        Self {
            id: row.id,
            client: ClientRef {
                id: row.client_id,
                name: row.client_name.clone(),
                nit: row.client_nit.clone(),
            },
            seller: SellerRef {
                id: row.seller_id,
                first_name: row.seller_first_name.clone(),
                last_name: row.seller_last_name.clone(),
            },
            vehicle: vehicle_ref(row),
            stage: StageRef {
                id: row.stage_id,
                name: row.stage_name.clone(),
            },
            active: row.active,
            quotations_count: row.quotations_count,
            invoices_count: row.invoices_count,
        }
    }
}

impl From<&OpportunityRow> for ClientOpportunitySummary {
    fn from(row: &OpportunityRow) -> Self {
        Self {
            id: row.id,
            seller_name: format!("{} {}", row.seller_first_name, row.seller_last_name)
                .trim()
                .to_string(),
            vehicle_make: row.vehicle_make.clone(),
            vehicle_model: row.vehicle_model.clone(),
            stage_name: row.stage_name.clone(),
            active: row.active,
            quotations_count: row.quotations_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationSummaryResponse {
    pub id: i32,
    pub active: bool,
    pub total: i64,
    pub formatted_total: String,
    pub items_count: i64,
    pub invoices_count: i64,
}

impl From<&QuotationSummaryRow> for QuotationSummaryResponse {
    fn from(q: &QuotationSummaryRow) -> Self {
        Self {
            id: q.id,
            active: q.active,
            total: q.total,
            formatted_total: format_money(q.total),
            items_count: q.items_count,
            invoices_count: q.invoices_count,
        }
    }
}

/// `GET /api/opportunities/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityDetailResponse {
    pub id: i32,
    pub client: ClientResponse,
    pub seller: SellerResponse,
    pub vehicle: Option<VehicleResponse>,
    pub stage: StageRef,
    pub active: bool,
    pub quotations: Vec<QuotationSummaryResponse>,
}

impl OpportunityDetailResponse {
    pub fn new(row: &OpportunityRow, quotations: &[QuotationSummaryRow]) -> Self {
        let vehicle = row.vehicle().map(|v| VehicleResponse::from(&v));

        Self {
            id: row.id,
            client: ClientResponse {
                id: row.client_id,
                name: row.client_name.clone(),
                nit: row.client_nit.clone(),
                address: row.client_address.clone(),
                email: row.client_email.clone(),
            },
            seller: SellerResponse {
                id: row.seller_id,
                first_name: row.seller_first_name.clone(),
                last_name: row.seller_last_name.clone(),
                email: row.seller_email.clone(),
            },
            vehicle,
            stage: StageRef {
                id: row.stage_id,
                name: row.stage_name.clone(),
            },
            active: row.active,
            quotations: quotations.iter().map(QuotationSummaryResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationResponse {
    pub id: i32,
    pub opportunity_id: i32,
    pub active: bool,

    /// Sum of item totals, in cents.
    pub total: i64,
    pub formatted_total: String,
}

impl From<&QuotationRecord> for QuotationResponse {
    fn from(q: &QuotationRecord) -> Self {
        Self {
            id: q.id,
            opportunity_id: q.opportunity_id,
            active: q.active,
            total: q.total,
            formatted_total: format_money(q.total),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationItemResponse {
    pub id: i32,
    pub quotation_id: i32,
    pub vehicle_id: i32,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub description: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub discount: i64,
    pub total: i64,
    pub formatted_total: String,
}

impl From<&QuotationItemRecord> for QuotationItemResponse {
    fn from(i: &QuotationItemRecord) -> Self {
        Self {
            id: i.id,
            quotation_id: i.quotation_id,
            vehicle_id: i.vehicle_id,
            vehicle_make: None,
            vehicle_model: None,
            description: i.description.clone(),
            quantity: i.quantity,
            unit_price: i.unit_price,
            discount: i.discount,
            total: i.total,
            formatted_total: format_money(i.total),
        }
    }
}

impl From<&QuotationItemRow> for QuotationItemResponse {
    fn from(row: &QuotationItemRow) -> Self {
        Self {
            vehicle_make: Some(row.vehicle_make.clone()),
            vehicle_model: Some(row.vehicle_model.clone()),
            ..Self::from(&row.item)
        }
    }
}

/// `GET /api/quotations/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationDetailResponse {
    #[serde(flatten)]
    pub quotation: QuotationResponse,
    pub items: Vec<QuotationItemResponse>,
}

/// Result of an item write: the item and its quotation's new total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationItemMutationResponse {
    pub item: Option<QuotationItemResponse>,
    pub quotation_id: i32,
    pub quotation_total: i64,
    pub formatted_quotation_total: String,
}

// ============================================
// INVOICES
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: i32,
    pub quotation_id: i32,
    pub number: String,
    pub status: InvoiceStatus,
    pub total: i64,
    pub formatted_total: String,
    pub created_at: DateTime<Utc>,
}

impl From<&InvoiceRecord> for InvoiceResponse {
    fn from(i: &InvoiceRecord) -> Self {
        Self {
            id: i.id,
            quotation_id: i.quotation_id,
            number: i.number.clone(),
            status: i.status,
            total: i.total,
            formatted_total: format_money(i.total),
            created_at: i.created_at,
        }
    }
}

/// An invoice in a list view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListItem {
    #[serde(flatten)]
    pub invoice: InvoiceResponse,
    pub client: ClientRef,
    pub seller: SellerRef,
}

impl From<&InvoiceRow> for InvoiceListItem {
    fn from(row: &InvoiceRow) -> Self {
        Self {
            invoice: InvoiceResponse::from(&row.invoice),
            client: ClientRef {
                id: row.client_id,
                name: row.client_name.clone(),
                nit: row.client_nit.clone(),
            },
            seller: SellerRef {
                id: row.seller_id,
                first_name: row.seller_first_name.clone(),
                last_name: row.seller_last_name.clone(),
            },
        }
    }
}

/// `GET /api/invoices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListResponse {
    pub items: Vec<InvoiceListItem>,
    pub total: usize,
    pub total_issued: usize,
    pub total_pending: usize,
}

impl InvoiceListResponse {
    pub fn new(items: Vec<InvoiceListItem>) -> Self {
        let total_issued = items
            .iter()
            .filter(|i| i.invoice.status == InvoiceStatus::Issued)
            .count();
        Self {
            total: items.len(),
            total_issued,
            total_pending: items.len() - total_issued,
            items,
        }
    }
}

/// `GET /api/invoices/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetailResponse {
    #[serde(flatten)]
    pub invoice: InvoiceResponse,
    pub client: ClientResponse,
    pub seller: SellerResponse,
    pub vehicle: Option<VehicleResponse>,
    pub quotation: QuotationResponse,
    pub items: Vec<QuotationItemResponse>,
}

// ============================================
// DIRECT SALES
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineResponse {
    pub id: i32,
    pub vehicle_id: i32,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub quantity: i32,
    pub unit_price: i64,
    pub subtotal: i64,
}

impl From<&SaleLineRow> for SaleLineResponse {
    fn from(l: &SaleLineRow) -> Self {
        Self {
            id: l.id,
            vehicle_id: l.vehicle_id,
            make: l.vehicle_make.clone(),
            model: l.vehicle_model.clone(),
            year: l.vehicle_year,
            quantity: l.quantity,
            unit_price: l.unit_price,
            subtotal: l.unit_price * i64::from(l.quantity),
        }
    }
}

/// A direct sale with its client and lines.
///
/// ## Example Response
///
/// ```json
/// {
///     "id": 3,
///     "date": "2025-01-15 10:42:07",
///     "client": { "id": 5, "name": "Transportes Ruiz", ... },
///     "lines": [ { "make": "Toyota", "model": "Hilux", "quantity": 2, "subtotal": 57000000, ... } ],
///     "total": 57000000,
///     "formattedTotal": "570,000.00"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    pub id: i32,
    pub date: String,
    pub client: ClientResponse,
    pub lines: Vec<SaleLineResponse>,
    pub total: i64,
    pub formatted_total: String,
}

impl SaleResponse {
    pub fn new(
        id: i32,
        sold_at: DateTime<Utc>,
        client: &ClientRecord,
        lines: &[SaleLineRow],
        total: i64,
    ) -> Self {
        Self {
            id,
            date: format_sale_date(sold_at),
            client: ClientResponse::from(client),
            lines: lines.iter().map(SaleLineResponse::from).collect(),
            total,
            formatted_total: format_money(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(id: i32, status: InvoiceStatus) -> InvoiceListItem {
        InvoiceListItem {
            invoice: InvoiceResponse {
                id,
                quotation_id: id,
                number: format!("FACT-20240101-00000{}", id),
                status,
                total: 1_000,
                formatted_total: format_money(1_000),
                created_at: Utc::now(),
            },
            client: ClientRef { id: 1, name: "Ana".into(), nit: "123".into() },
            seller: SellerRef { id: 2, first_name: "Luis".into(), last_name: "Paz".into() },
        }
    }

    #[test]
    fn test_invoice_list_totals() {
        let list = InvoiceListResponse::new(vec![
            invoice(3, InvoiceStatus::Issued),
            invoice(2, InvoiceStatus::Pending),
            invoice(1, InvoiceStatus::Pending),
        ]);
        assert_eq!(list.total, 3);
        assert_eq!(list.total_issued, 1);
        assert_eq!(list.total_pending, 2);

        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["totalIssued"], 1);
        assert_eq!(json["items"][0]["status"], "issued");
        assert_eq!(json["items"][0]["client"]["name"], "Ana");
    }

    #[test]
    fn test_error_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::<()>::error("NOT_FOUND", "client 9 not found"))
            .unwrap();
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[test]
    fn test_sale_line_subtotal() {
        let line = SaleLineRow {
            id: 1,
            vehicle_id: 4,
            vehicle_make: "Toyota".into(),
            vehicle_model: "Hilux".into(),
            vehicle_year: 2024,
            quantity: 3,
            unit_price: 2_500_000,
        };
        assert_eq!(SaleLineResponse::from(&line).subtotal, 7_500_000);
    }

    #[test]
    fn test_opportunity_without_vehicle() {
        let row = OpportunityRow {
            id: 1,
            client_id: 2,
            client_name: "Ana".into(),
            client_nit: "123".into(),
            client_address: "Zona 1".into(),
            client_email: None,
            seller_id: 3,
            seller_first_name: "Luis".into(),
            seller_last_name: "Paz".into(),
            seller_email: "luis@example.com".into(),
            vehicle_id: None,
            vehicle_make: None,
            vehicle_model: None,
            vehicle_year: None,
            vehicle_price: None,
            stage_id: 1,
            stage_name: "Prospecto".into(),
            active: true,
            quotations_count: 0,
            invoices_count: 0,
        };
        let item = OpportunityListItem::from(&row);
        assert!(item.vehicle.is_none());
        assert_eq!(ClientOpportunitySummary::from(&row).seller_name, "Luis Paz");
        assert!(OpportunityDetailResponse::new(&row, &[]).vehicle.is_none());
    }
}
