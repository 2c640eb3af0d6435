//! # Services Module
//!
//! This module contains the business rules of the CRM. Each manager owns
//! one resource, validates input, enforces lifecycle rules and calls the
//! query layer. Handlers never talk to the database directly.
//!
//! ## Services Overview
//!
//! | Service | Responsibility |
//! |---------|---------------|
//! | `UserManager` | Registration, login, passwords, user administration |
//! | `ClientManager` | Clients, NIT uniqueness, client pipeline views |
//! | `VehicleManager` | Vehicle catalog |
//! | `StageManager` | Pipeline stages |
//! | `OpportunityManager` | Opportunities and their reference checks |
//! | `QuotationManager` | Quotations, items and total recomputation |
//! | `InvoiceManager` | Invoice numbering and the pending → issued lifecycle |
//! | `ProductManager` | Product inventory |
//! | `SaleManager` | Direct vehicle sales |
//!
//! ## Service Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        SERVICES LAYER                            │
//! │                                                                  │
//! │   Client ──► Opportunity ──► Quotation ──► Invoice               │
//! │     │            │  ▲            │                               │
//! │     │            │  │            └── items (total = Σ items)     │
//! │     │            ▼  │                                            │
//! │     │         Stage, Vehicle, User                               │
//! │     │                                                            │
//! │     └──────► Sale (lines priced from Vehicle)                    │
//! │                                                                  │
//! │   Every operation returns Result<T, CrmError>                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod clients;
pub mod error;
pub mod invoices;
pub mod opportunities;
pub mod products;
pub mod quotations;
pub mod sales;
pub mod stages;
pub mod users;
pub mod vehicles;

pub use clients::ClientManager;
pub use error::CrmError;
pub use invoices::InvoiceManager;
pub use opportunities::OpportunityManager;
pub use products::ProductManager;
pub use quotations::QuotationManager;
pub use sales::SaleManager;
pub use stages::StageManager;
pub use users::UserManager;
pub use vehicles::VehicleManager;
