//! # Stockroom Inventory Service
//!
//! ## Overview
//! This library implements the inventory backend for a small e-bike retail
//! business: model records with duplicate detection, autocomplete-style
//! suggestion ranking, reference-price propagation, and filtered listings.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `normalize`: Field and date canonicalization used by all comparisons
//! - `matching`: Exact-duplicate detection over the active corpus
//! - `pricing`: Reference purchase-price resolution across colour siblings
//! - `suggest`: Relevance-ranked autocomplete suggestions
//! - `query`: Listing filter construction (search, company, colour, stock, warranty)
//! - `storage`: Persistent model store with a normalized unique-key index
//! - `engine`: Operation layer combining storage and the matching logic
//! - `api`: REST API endpoints
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Model records and partial search text from HTTP clients
//! - **Output**: Duplicate verdicts, ranked suggestions, filtered listings
//! - **Guarantee**: All matching is scoped to active records and is
//!   deterministic for identical input
//!
//! ## Usage
//! ```rust,no_run
//! use stockroom::{Config, engine::InventoryEngine, storage::ModelStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let store = Arc::new(ModelStore::new(config.storage.clone()).await?);
//!     let engine = InventoryEngine::new(Arc::new(config), store);
//!     let names = engine.suggest_model_names("her").await;
//!     println!("{} suggestions", names.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod errors;
pub mod normalize;
pub mod matching;
pub mod pricing;
pub mod suggest;
pub mod query;
pub mod storage;
pub mod engine;
pub mod api;

// Re-exports for convenience
pub use config::Config;
pub use errors::{Result, StockError};
pub use engine::InventoryEngine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for inventory model records
pub type ModelId = Uuid;

/// Quantity below which an in-stock record counts as low stock
pub const LOW_STOCK_THRESHOLD: u32 = 15;

/// A single inventory line for one model in one colour.
///
/// Distinct colours of the same model/company are stored as separate
/// records; grouping them is a presentation concern, not a storage one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryModel {
    /// Unique record identifier, assigned by storage at creation
    pub id: ModelId,
    /// Model name, stored in title case
    pub model_name: String,
    /// Manufacturer name, stored in title case
    pub company: String,
    /// Colour, stored lowercase and trimmed; may be empty
    pub colour: String,
    /// Units on hand, never negative
    pub quantity: u32,
    /// Purchase price; invalid or negative inputs are coerced to 0
    pub purchase_price: f64,
    /// Whether the unit was purchased under warranty
    pub purchased_in_warranty: bool,
    /// Purchase date; comparisons truncate to the calendar day
    pub purchase_date: DateTime<Utc>,
    /// Live records only; soft delete flips this to false
    pub is_active: bool,
    /// Creation timestamp, maintained by storage
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp, maintained by storage
    pub last_updated: DateTime<Utc>,
}

impl InventoryModel {
    /// Stock status derived from the on-hand quantity.
    pub fn stock_status(&self) -> StockStatus {
        if self.quantity == 0 {
            StockStatus::OutOfStock
        } else if self.quantity < LOW_STOCK_THRESHOLD {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

/// Presentation-level stock classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

/// Application state shared across API handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub engine: Arc<engine::InventoryEngine>,
    pub store: Arc<storage::ModelStore>,
}
