//! # REST API Module
//!
//! This module defines all HTTP endpoints for the vehicle sales CRM.
//!
//! ## Endpoint Overview
//!
//! | Prefix | Resource | Read policy | Write policy |
//! |--------|----------|-------------|--------------|
//! | `/api/auth` | Login, registration, passwords | – | admin for register/reset |
//! | `/api/admin/users` | User administration | admin | admin |
//! | `/api/clients` | Clients | any role | admin, vendedor (delete: admin, gerente) |
//! | `/api/vehicles` | Vehicle catalog | any role | admin, inventario (delete: admin) |
//! | `/api/stages` | Pipeline stages | any role | admin |
//! | `/api/opportunities` | Opportunities | admin, gerente, vendedor | admin, vendedor (delete: admin, gerente) |
//! | `/api/quotations` | Quotations | admin, gerente, vendedor | admin, vendedor (delete: admin, gerente) |
//! | `/api/quotation-items` | Quotation items | admin, vendedor | admin, vendedor |
//! | `/api/invoices` | Invoices | admin, asistente, inventario (pending: admin, gerente) | admin, gerente (delete: admin) |
//! | `/api/products` | Products | any role | admin, inventario |
//! | `/api/sales` | Direct sales | admin, gerente, vendedor | admin, vendedor |
//! | `/healthz` | Health check | public | – |
//!
//! ## Request/Response Format
//!
//! All requests and responses use JSON with camelCase field names:
//!
//! ```json
//! // Success response
//! {
//!     "success": true,
//!     "data": { ... },
//!     "message": null,
//!     "error": null
//! }
//!
//! // Error response
//! {
//!     "success": false,
//!     "data": null,
//!     "message": null,
//!     "error": {
//!         "code": "ERROR_CODE",
//!         "message": "Human readable message"
//!     }
//! }
//! ```

pub mod handlers;
pub mod routes;

pub use routes::configure_routes;
