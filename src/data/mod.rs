//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Entity models and joined projections
//! - Query specs for listing endpoints

mod database;
mod models;

pub use database::Database;
pub use models::*;
