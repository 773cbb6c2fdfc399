//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connections and repositories
//! - Filesystem storage for uploaded images
//! - Unit of Work for repository access

pub mod db;
pub mod repositories;
pub mod storage;
pub mod unit_of_work;

pub use db::Database;
pub use storage::{ImageStore, ImageUpload};
pub use unit_of_work::{Persistence, UnitOfWork};
