//! # Vehicle Sales CRM Backend
//!
//! This is the main entry point for the REST backend of a vehicle sales
//! CRM. It provides:
//!
//! - Client, vehicle, stage and product catalogs
//! - The sales pipeline: opportunities, quotations with line items, invoices
//! - Direct vehicle sales
//! - Role-based access with bearer tokens
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        BACKEND SERVICE                           │
//! │                                                                  │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │  REST API (Actix)        AuthUser extractor (JWT)        │    │
//! │  │  /api/clients  /api/opportunities  /api/invoices  ...    │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │                          │                                       │
//! │  ┌───────────────────────┴───────────────────────────────────┐  │
//! │  │                    SERVICE LAYER                           │  │
//! │  │  ClientManager  OpportunityManager  QuotationManager       │  │
//! │  │  InvoiceManager  SaleManager  UserManager  ...             │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                          │                                       │
//! │                   ┌──────┴──────┐                                │
//! │                   │  PostgreSQL │                                │
//! │                   └─────────────┘                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! 1. Set up PostgreSQL and create the database
//! 2. Copy `.env.example` to `.env` and configure
//! 3. Start the server: `cargo run` (the schema is applied on startup)
//!
//! ## Environment Variables
//!
//! See `.env.example` and the [`config`] module.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod api;
mod auth;
mod config;
mod db;
mod models;
mod services;
mod utils;

use config::AppConfig;
use db::Database;
use services::{
    ClientManager, InvoiceManager, OpportunityManager, ProductManager, QuotationManager,
    SaleManager, StageManager, UserManager, VehicleManager,
};

/// Application state shared across all handlers.
///
/// Handlers receive it as `web::Data<Arc<AppState>>`. Every manager holds a
/// clone of the same connection pool.
pub struct AppState {
    /// Database connection pool for PostgreSQL
    pub db: Database,

    /// Application configuration
    pub config: AppConfig,

    pub users: UserManager,
    pub clients: ClientManager,
    pub vehicles: VehicleManager,
    pub stages: StageManager,
    pub opportunities: OpportunityManager,
    pub quotations: QuotationManager,
    pub invoices: InvoiceManager,
    pub products: ProductManager,
    pub sales: SaleManager,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        Self {
            users: UserManager::new(db.clone(), config.clone()),
            clients: ClientManager::new(db.clone()),
            vehicles: VehicleManager::new(db.clone()),
            stages: StageManager::new(db.clone()),
            opportunities: OpportunityManager::new(db.clone()),
            quotations: QuotationManager::new(db.clone()),
            invoices: InvoiceManager::new(db.clone()),
            products: ProductManager::new(db.clone()),
            sales: SaleManager::new(db.clone()),
            db,
            config,
        }
    }
}

/// Main entry point for the backend service.
///
/// This function:
/// 1. Loads configuration from environment
/// 2. Initializes logging
/// 3. Connects to the database and applies the schema
/// 4. Creates the bootstrap admin if needed
/// 5. Launches the HTTP server
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // =========================================
    // STEP 1: Load Configuration
    // =========================================
    dotenvy::dotenv().ok(); // It's okay if .env doesn't exist

    let config = AppConfig::from_env()
        .expect("Failed to load configuration");

    // =========================================
    // STEP 2: Initialize Logging
    // =========================================
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("🚀 Starting Vehicle Sales CRM backend");
    info!("📋 Configuration loaded");
    info!("   Token issuer: {}, lifetime {}h", config.jwt_issuer, config.jwt_ttl_hours);

    // =========================================
    // STEP 3: Initialize Database
    // =========================================
    let db = Database::connect(&config.database_url, config.db_pool_size)
        .await
        .expect("Failed to connect to database");

    info!("🗄️  Database connected");

    db.run_migrations()
        .await
        .expect("Failed to run migrations");

    info!("📦 Database migrations complete");

    // =========================================
    // STEP 4: Create Application State
    // =========================================
    let app_state = Arc::new(AppState::new(db, config.clone()));

    match &config.bootstrap_admin {
        Some(admin) => app_state
            .users
            .ensure_bootstrap_admin(admin)
            .await
            .expect("Failed to create bootstrap admin"),
        None => warn!("BOOTSTRAP_ADMIN_USERNAME not set, no admin account will be created"),
    }

    // =========================================
    // STEP 5: Start HTTP Server
    // =========================================
    let server_host = config.server_host.clone();
    let server_port = config.server_port;

    info!("🌐 Starting HTTP server on {}:{}", server_host, server_port);

    HttpServer::new(move || {
        App::new()
            // Attach shared application state
            .app_data(web::Data::new(app_state.clone()))

            // Add logging middleware
            .wrap(middleware::Logger::default())

            // Browser clients may be served from any origin
            .wrap(Cors::permissive())

            // Configure API routes
            .configure(api::configure_routes)
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .run()
    .await
}
