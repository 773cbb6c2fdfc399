//! Accounts API - User accounts service with bearer-token authentication.
//!
//! A REST backend providing user registration, token-based login/logout,
//! and CRUD management of user records with optional avatar upload.
//! Resource identifiers are never exposed raw: URLs carry an encrypted,
//! tamper-rejecting form of the primary key.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Core business entities and value objects
//! - **services**: Application use cases and business logic
//! - **infra**: Infrastructure concerns (database, file storage)
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: Shared types (pagination, responses)
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{IdCodec, Password, User};
pub use errors::{AppError, AppResult};
