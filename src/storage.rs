//! # Storage Management Module
//!
//! ## Purpose
//! Persistent storage of inventory model records using an embedded sled
//! database, including the normalized unique-key index that makes the
//! duplicate invariant hold under concurrent writers.
//!
//! ## Input/Output Specification
//! - **Input**: New records, partial updates, quantity operations
//! - **Output**: Sanitized stored records, active-corpus reads, distinct
//!   field values for suggestions and filter dropdowns
//! - **Storage**: sled trees `models` (id → record) and `model_keys`
//!   (normalized duplicate key → id)
//!
//! ## Key Features
//! - Storage is the final authority on uniqueness: inserts and re-keying
//!   updates claim the normalized key with `compare_and_swap`, so two
//!   racing creates of the same line cannot both succeed
//! - Field sanitization on write: title-cased names, lowercased colours,
//!   negative/invalid prices coerced to 0
//! - Soft delete releases the unique key and hides the record from all
//!   reads without physically removing it

use crate::config::StorageConfig;
use crate::errors::{invalid_input, Result, StockError};
use crate::matching::duplicate_key;
use crate::normalize::{sanitize_price, to_title_case};
use crate::{InventoryModel, ModelId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Fields accepted when creating a record
#[derive(Debug, Clone, Default)]
pub struct NewModel {
    pub model_name: String,
    pub company: String,
    pub colour: Option<String>,
    pub quantity: u32,
    pub purchase_price: Option<f64>,
    pub purchased_in_warranty: Option<bool>,
    pub purchase_date: Option<DateTime<Utc>>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct ModelUpdate {
    pub model_name: Option<String>,
    pub company: Option<String>,
    pub colour: Option<String>,
    pub quantity: Option<u32>,
    pub purchase_price: Option<f64>,
    pub purchased_in_warranty: Option<bool>,
    pub purchase_date: Option<DateTime<Utc>>,
}

/// Quantity mutation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityOp {
    Set,
    Add,
    Subtract,
}

impl QuantityOp {
    /// Parse the wire value; defaults to `Set` like the original API.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("add") => QuantityOp::Add,
            Some("subtract") => QuantityOp::Subtract,
            _ => QuantityOp::Set,
        }
    }
}

/// Storage statistics
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub total_records: usize,
    pub active_records: usize,
    pub database_size_bytes: u64,
}

/// Main model store
pub struct ModelStore {
    config: StorageConfig,
    db: Arc<sled::Db>,
    models: Arc<sled::Tree>,
    keys: Arc<sled::Tree>,
}

impl ModelStore {
    /// Open the store, creating the database directory if needed.
    pub async fn new(config: StorageConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let db = sled::open(&config.db_path).map_err(|e| StockError::StorageUnavailable {
            details: format!("Failed to open database {:?}: {}", config.db_path, e),
        })?;

        let models = db.open_tree("models")?;
        let keys = db.open_tree("model_keys")?;

        let store = Self {
            config,
            db: Arc::new(db),
            models: Arc::new(models),
            keys: Arc::new(keys),
        };

        tracing::info!(
            records = store.models.len(),
            "model store initialized at {:?}",
            store.config.db_path
        );

        Ok(store)
    }

    /// Create a record with sanitized fields. The normalized duplicate key
    /// is claimed atomically; a second writer with the same key is rejected
    /// with `DuplicateModel`.
    pub async fn insert(&self, input: NewModel) -> Result<InventoryModel> {
        if input.model_name.trim().is_empty() || input.company.trim().is_empty() {
            return Err(invalid_input(
                "Please provide modelName, company, and quantity",
            ));
        }

        let now = Utc::now();
        let record = InventoryModel {
            id: Uuid::new_v4(),
            model_name: to_title_case(input.model_name.trim()),
            company: to_title_case(input.company.trim()),
            colour: input
                .colour
                .as_deref()
                .map(|c| c.trim().to_lowercase())
                .unwrap_or_default(),
            quantity: input.quantity,
            purchase_price: sanitize_price(input.purchase_price.unwrap_or(0.0)),
            purchased_in_warranty: input.purchased_in_warranty.unwrap_or(false),
            purchase_date: input.purchase_date.unwrap_or(now),
            is_active: true,
            created_at: now,
            last_updated: now,
        };

        self.claim_key(&record)?;
        if let Err(e) = self.put_record(&record) {
            // Roll the key claim back so a failed write does not poison it.
            let _ = self.keys.remove(self.key_of(&record));
            return Err(e);
        }
        self.maybe_flush().await?;

        tracing::info!(id = %record.id, model = %record.model_name, "created model");
        Ok(record)
    }

    /// Fetch a single record by id, active or not.
    pub async fn get(&self, id: ModelId) -> Result<Option<InventoryModel>> {
        match self.models.get(id.to_string().as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Apply a partial update. Changing any of the five key fields re-keys
    /// the unique index with the same atomicity as `insert`.
    pub async fn update(&self, id: ModelId, update: ModelUpdate) -> Result<InventoryModel> {
        let mut record = self
            .get(id)
            .await?
            .ok_or_else(|| StockError::NotFound { id: id.to_string() })?;
        let old_key = self.key_of(&record);

        if let Some(name) = update.model_name {
            record.model_name = to_title_case(name.trim());
        }
        if let Some(company) = update.company {
            record.company = to_title_case(company.trim());
        }
        if let Some(colour) = update.colour {
            record.colour = colour.trim().to_lowercase();
        }
        if let Some(quantity) = update.quantity {
            record.quantity = quantity;
        }
        if let Some(price) = update.purchase_price {
            record.purchase_price = sanitize_price(price);
        }
        if let Some(warranty) = update.purchased_in_warranty {
            record.purchased_in_warranty = warranty;
        }
        if let Some(date) = update.purchase_date {
            record.purchase_date = date;
        }
        record.last_updated = Utc::now();

        let new_key = self.key_of(&record);
        if record.is_active && new_key != old_key {
            self.claim_key(&record)?;
            self.keys.remove(old_key)?;
        }

        self.put_record(&record)?;
        self.maybe_flush().await?;

        tracing::debug!(id = %record.id, "updated model");
        Ok(record)
    }

    /// Mutate the on-hand quantity. Subtraction clamps at zero.
    pub async fn update_quantity(
        &self,
        id: ModelId,
        amount: u32,
        op: QuantityOp,
    ) -> Result<InventoryModel> {
        let mut record = self
            .get(id)
            .await?
            .ok_or_else(|| StockError::NotFound { id: id.to_string() })?;

        record.quantity = match op {
            QuantityOp::Set => amount,
            QuantityOp::Add => record.quantity.saturating_add(amount),
            QuantityOp::Subtract => record.quantity.saturating_sub(amount),
        };
        record.last_updated = Utc::now();

        self.put_record(&record)?;
        self.maybe_flush().await?;
        Ok(record)
    }

    /// Soft delete: the record stays on disk but leaves the active corpus,
    /// and its duplicate key becomes reusable.
    pub async fn soft_delete(&self, id: ModelId) -> Result<()> {
        let mut record = self
            .get(id)
            .await?
            .ok_or_else(|| StockError::NotFound { id: id.to_string() })?;

        if record.is_active {
            record.is_active = false;
            record.last_updated = Utc::now();
            self.keys.remove(self.key_of(&record))?;
            self.put_record(&record)?;
            self.maybe_flush().await?;
        }

        tracing::info!(id = %record.id, "soft-deleted model");
        Ok(())
    }

    /// All active records, in stable id order.
    pub async fn all_active(&self) -> Result<Vec<InventoryModel>> {
        let mut records = Vec::new();
        for entry in self.models.iter() {
            let (_, value) = entry?;
            let record: InventoryModel = bincode::deserialize(&value)?;
            if record.is_active {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Distinct model names across active records, alphabetical.
    pub async fn distinct_model_names(&self) -> Result<Vec<String>> {
        self.distinct_field(|r| Some(r.model_name.clone())).await
    }

    /// Distinct company names across active records, alphabetical.
    pub async fn distinct_companies(&self) -> Result<Vec<String>> {
        self.distinct_field(|r| Some(r.company.clone())).await
    }

    /// Distinct non-empty colours across active records, alphabetical.
    pub async fn distinct_colours(&self) -> Result<Vec<String>> {
        self.distinct_field(|r| {
            if r.colour.is_empty() {
                None
            } else {
                Some(r.colour.clone())
            }
        })
        .await
    }

    async fn distinct_field<F>(&self, extract: F) -> Result<Vec<String>>
    where
        F: Fn(&InventoryModel) -> Option<String>,
    {
        let mut values = BTreeSet::new();
        for record in self.all_active().await? {
            if let Some(value) = extract(&record) {
                values.insert(value);
            }
        }
        let mut sorted: Vec<String> = values.into_iter().collect();
        sorted.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
        Ok(sorted)
    }

    /// Storage statistics
    pub async fn stats(&self) -> Result<StorageStats> {
        let active = self.all_active().await?.len();
        Ok(StorageStats {
            total_records: self.models.len(),
            active_records: active,
            database_size_bytes: self.db.size_on_disk()?,
        })
    }

    /// Health check: a write, read, and delete round trip.
    pub async fn health_check(&self) -> Result<()> {
        let test_key = b"health_check";
        self.models.insert(test_key, b"ok")?;
        if self.models.get(test_key)?.is_none() {
            return Err(StockError::StorageUnavailable {
                details: "Health check value not found".to_string(),
            });
        }
        self.models.remove(test_key)?;
        Ok(())
    }

    fn key_of(&self, record: &InventoryModel) -> String {
        duplicate_key(
            &record.model_name,
            &record.company,
            &record.colour,
            record.purchase_date,
            record.purchased_in_warranty,
        )
    }

    /// Atomically claim the record's normalized key for its id.
    fn claim_key(&self, record: &InventoryModel) -> Result<()> {
        let key = self.key_of(record);
        let claim = self.keys.compare_and_swap(
            key.as_bytes(),
            None as Option<&[u8]>,
            Some(record.id.to_string().as_bytes()),
        )?;

        if let Err(existing) = claim {
            let existing_id = existing
                .current
                .map(|v| String::from_utf8_lossy(&v).to_string())
                .unwrap_or_default();
            return Err(StockError::DuplicateModel { existing_id });
        }
        Ok(())
    }

    fn put_record(&self, record: &InventoryModel) -> Result<()> {
        let value = bincode::serialize(record)?;
        self.models
            .insert(record.id.to_string().as_bytes(), value)?;
        Ok(())
    }

    async fn maybe_flush(&self) -> Result<()> {
        if self.config.flush_on_write {
            self.db.flush_async().await?;
        }
        Ok(())
    }
}
