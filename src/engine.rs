//! # Inventory Engine Module
//!
//! ## Purpose
//! Operation layer combining the model store with the matching, pricing,
//! suggestion, and filtering logic. This is the surface the API handlers
//! call; it owns the failure policy for each operation.
//!
//! ## Input/Output Specification
//! - **Input**: Validated request parameters from the transport layer
//! - **Output**: Plain data results ready for serialization
//! - **Failure policy**: Non-destructive checks (duplicate, price,
//!   suggestions) fail open when storage is unreachable — the user is not
//!   blocked by a degraded pre-check, and the storage-level unique key
//!   retains final authority on writes. Input-validation errors are hard
//!   errors throughout.
//!
//! ## Key Features
//! - Fresh corpus fetch per operation; no cross-request caching
//! - Admin listings sorted by (name, company); public listings randomly
//!   sampled
//! - Aggregated analytics rollups for the dashboard

use crate::config::Config;
use crate::errors::Result;
use crate::matching::{self, DuplicateCandidate, DuplicateMatch};
use crate::pricing::{self, PriceCandidate, PriceResult};
use crate::query::{ListParams, ModelFilter};
use crate::storage::{ModelStore, ModelUpdate, NewModel, QuantityOp};
use crate::suggest::rank_suggestions;
use crate::{InventoryModel, ModelId, StockStatus};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Listing presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListView {
    /// Full sorted listing for data-entry screens
    Admin,
    /// Random sample for the storefront
    Public,
}

impl ListView {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("admin") => ListView::Admin,
            _ => ListView::Public,
        }
    }
}

/// Listing result with the distinct values the filter dropdowns need
#[derive(Debug, Clone, Serialize)]
pub struct ModelListing {
    pub data: Vec<InventoryModel>,
    /// Total matches before the limit was applied
    pub total: usize,
    pub companies: Vec<String>,
    pub colours: Vec<String>,
}

/// Dashboard analytics
#[derive(Debug, Clone, Serialize)]
pub struct Analytics {
    pub summary: AnalyticsSummary,
    pub by_company: Vec<CompanyRollup>,
    pub by_colour: Vec<ColourRollup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub total_models: usize,
    pub in_stock: usize,
    pub out_of_stock: usize,
    pub low_stock: usize,
    pub total_quantity: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyRollup {
    pub company: String,
    pub count: usize,
    pub total_quantity: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColourRollup {
    pub colour: String,
    pub count: usize,
}

/// Main inventory engine
pub struct InventoryEngine {
    config: Arc<Config>,
    store: Arc<ModelStore>,
}

impl InventoryEngine {
    pub fn new(config: Arc<Config>, store: Arc<ModelStore>) -> Self {
        Self { config, store }
    }

    /// Check whether an exact duplicate of `candidate` exists.
    ///
    /// Storage failures degrade to "no duplicate": the check is advisory
    /// and the unique key on insert remains the final authority.
    pub async fn check_duplicate(&self, candidate: &DuplicateCandidate) -> Result<DuplicateMatch> {
        let corpus = match self.store.all_active().await {
            Ok(corpus) => corpus,
            Err(e) if e.is_fail_open() => {
                tracing::warn!(error = %e, "duplicate check degraded to no-duplicate");
                return matching::find_duplicate(candidate, &[], None);
            }
            Err(e) => return Err(e),
        };
        matching::find_duplicate(candidate, &corpus, None)
    }

    /// Edit-mode duplicate check excluding the record being edited.
    pub async fn check_duplicate_for_edit(
        &self,
        candidate: &DuplicateCandidate,
        exclude_id: ModelId,
    ) -> Result<DuplicateMatch> {
        let corpus = match self.store.all_active().await {
            Ok(corpus) => corpus,
            Err(e) if e.is_fail_open() => {
                tracing::warn!(error = %e, "edit duplicate check degraded to no-duplicate");
                return matching::find_duplicate_for_edit(candidate, &[], exclude_id);
            }
            Err(e) => return Err(e),
        };
        matching::find_duplicate_for_edit(candidate, &corpus, exclude_id)
    }

    /// Resolve a reference purchase price across colour siblings.
    /// Soft-fails on every error path.
    pub async fn check_reference_price(&self, candidate: &PriceCandidate) -> PriceResult {
        match self.store.all_active().await {
            Ok(corpus) => pricing::resolve_reference_price(candidate, &corpus),
            Err(e) => {
                tracing::warn!(error = %e, "price check degraded to no-price");
                pricing::resolve_reference_price(candidate, &[])
            }
        }
    }

    /// Ranked model-name suggestions; degrades to empty on storage failure.
    pub async fn suggest_model_names(&self, query: &str) -> Vec<String> {
        self.suggest(query, self.store.distinct_model_names().await)
    }

    /// Ranked company suggestions; degrades to empty on storage failure.
    pub async fn suggest_companies(&self, query: &str) -> Vec<String> {
        self.suggest(query, self.store.distinct_companies().await)
    }

    fn suggest(&self, query: &str, values: Result<Vec<String>>) -> Vec<String> {
        match values {
            Ok(values) => rank_suggestions(query, values, self.config.matching.max_suggestions),
            Err(e) => {
                tracing::warn!(error = %e, "suggestions degraded to empty");
                Vec::new()
            }
        }
    }

    /// All distinct model names, alphabetical.
    pub async fn all_model_names(&self) -> Result<Vec<String>> {
        self.store.distinct_model_names().await
    }

    /// All distinct company names, alphabetical.
    pub async fn all_companies(&self) -> Result<Vec<String>> {
        self.store.distinct_companies().await
    }

    /// Filtered listing. Admin view returns the matches sorted by
    /// (model name, company); the public view returns a random sample.
    pub async fn list_models(
        &self,
        params: &ListParams,
        view: ListView,
        limit: Option<usize>,
    ) -> Result<ModelListing> {
        let filter = ModelFilter::build(params)?;
        let corpus = self.store.all_active().await?;

        let mut matches: Vec<InventoryModel> =
            corpus.iter().filter(|r| filter.matches(r)).cloned().collect();
        let total = matches.len();
        let limit = limit.unwrap_or(self.config.matching.default_list_limit);

        match view {
            ListView::Admin => {
                matches.sort_by(|a, b| {
                    (a.model_name.as_str(), a.company.as_str())
                        .cmp(&(b.model_name.as_str(), b.company.as_str()))
                });
                matches.truncate(limit);
            }
            ListView::Public => {
                matches.shuffle(&mut rand::thread_rng());
                matches.truncate(limit);
            }
        }

        let companies = self.store.distinct_companies().await?;
        let colours = self.store.distinct_colours().await?;

        Ok(ModelListing {
            data: matches,
            total,
            companies,
            colours,
        })
    }

    /// Create a record; the storage unique key rejects duplicates.
    pub async fn create_model(&self, input: NewModel) -> Result<InventoryModel> {
        self.store.insert(input).await
    }

    /// Fetch a record by id.
    pub async fn get_model(&self, id: ModelId) -> Result<Option<InventoryModel>> {
        self.store.get(id).await
    }

    /// Apply a partial update.
    pub async fn update_model(&self, id: ModelId, update: ModelUpdate) -> Result<InventoryModel> {
        self.store.update(id, update).await
    }

    /// Mutate a record's quantity.
    pub async fn update_quantity(
        &self,
        id: ModelId,
        amount: u32,
        op: QuantityOp,
    ) -> Result<InventoryModel> {
        self.store.update_quantity(id, amount, op).await
    }

    /// Soft-delete a record.
    pub async fn delete_model(&self, id: ModelId) -> Result<()> {
        self.store.soft_delete(id).await
    }

    /// Aggregated stock analytics over the active corpus.
    pub async fn analytics(&self) -> Result<Analytics> {
        let corpus = self.store.all_active().await?;

        let mut summary = AnalyticsSummary {
            total_models: corpus.len(),
            in_stock: 0,
            out_of_stock: 0,
            low_stock: 0,
            total_quantity: 0,
        };
        let mut by_company: BTreeMap<String, (usize, u64)> = BTreeMap::new();
        let mut by_colour: BTreeMap<String, usize> = BTreeMap::new();

        for record in &corpus {
            match record.stock_status() {
                StockStatus::InStock => summary.in_stock += 1,
                StockStatus::LowStock => {
                    summary.in_stock += 1;
                    summary.low_stock += 1;
                }
                StockStatus::OutOfStock => summary.out_of_stock += 1,
            }
            summary.total_quantity += u64::from(record.quantity);

            let entry = by_company.entry(record.company.clone()).or_default();
            entry.0 += 1;
            entry.1 += u64::from(record.quantity);

            if !record.colour.is_empty() {
                *by_colour.entry(record.colour.clone()).or_default() += 1;
            }
        }

        let mut by_company: Vec<CompanyRollup> = by_company
            .into_iter()
            .map(|(company, (count, total_quantity))| CompanyRollup {
                company,
                count,
                total_quantity,
            })
            .collect();
        by_company.sort_by(|a, b| b.count.cmp(&a.count).then(a.company.cmp(&b.company)));

        let mut by_colour: Vec<ColourRollup> = by_colour
            .into_iter()
            .map(|(colour, count)| ColourRollup { colour, count })
            .collect();
        by_colour.sort_by(|a, b| b.count.cmp(&a.count).then(a.colour.cmp(&b.colour)));

        Ok(Analytics {
            summary,
            by_company,
            by_colour,
        })
    }

    /// Health check for the engine and its storage.
    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use chrono::{TimeZone, Utc};

    async fn test_engine() -> (InventoryEngine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage = StorageConfig {
            db_path: dir.path().join("engine.db"),
            flush_on_write: false,
        };
        let config = Arc::new(config);
        let store = Arc::new(ModelStore::new(config.storage.clone()).await.unwrap());
        (InventoryEngine::new(config, store), dir)
    }

    fn new_model(name: &str, company: &str, colour: &str, quantity: u32, price: f64) -> NewModel {
        NewModel {
            model_name: name.to_string(),
            company: company.to_string(),
            colour: Some(colour.to_string()),
            quantity,
            purchase_price: Some(price),
            purchased_in_warranty: Some(false),
            purchase_date: Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()),
        }
    }

    #[tokio::test]
    async fn duplicate_check_round_trip() {
        let (engine, _dir) = test_engine().await;
        engine
            .create_model(new_model("Hero", "Lectro", "red", 5, 450.0))
            .await
            .unwrap();

        let candidate = DuplicateCandidate {
            model_name: " hero ".to_string(),
            company: "LECTRO".to_string(),
            colour: "Red".to_string(),
            purchase_date: Some(Utc.with_ymd_and_hms(2024, 3, 5, 23, 0, 0).unwrap()),
            purchased_in_warranty: Some(false),
        };
        let result = engine.check_duplicate(&candidate).await.unwrap();
        assert!(result.exists);

        let mut other = candidate.clone();
        other.colour = "blue".to_string();
        assert!(!engine.check_duplicate(&other).await.unwrap().exists);
    }

    #[tokio::test]
    async fn edit_check_excludes_the_edited_record() {
        let (engine, _dir) = test_engine().await;
        let record = engine
            .create_model(new_model("Hero", "Lectro", "red", 5, 450.0))
            .await
            .unwrap();

        let candidate = DuplicateCandidate {
            model_name: "Hero".to_string(),
            company: "Lectro".to_string(),
            colour: "red".to_string(),
            purchase_date: Some(record.purchase_date),
            purchased_in_warranty: Some(false),
        };
        let result = engine
            .check_duplicate_for_edit(&candidate, record.id)
            .await
            .unwrap();
        assert!(!result.exists);
    }

    #[tokio::test]
    async fn reference_price_propagates_to_new_colour() {
        let (engine, _dir) = test_engine().await;
        engine
            .create_model(new_model("Hero", "Lectro", "red", 5, 500.0))
            .await
            .unwrap();

        let candidate = PriceCandidate {
            model_name: "Hero".to_string(),
            company: "Lectro".to_string(),
            purchase_date: Some(Utc.with_ymd_and_hms(2024, 3, 5, 16, 0, 0).unwrap()),
            purchased_in_warranty: Some(false),
        };
        let result = engine.check_reference_price(&candidate).await;
        assert!(result.has_price);
        assert_eq!(result.price, Some(500.0));
    }

    #[tokio::test]
    async fn suggestions_use_the_ranker_and_cap() {
        let (engine, _dir) = test_engine().await;
        for (name, colour) in [
            ("Heroic", "red"),
            ("Hero", "red"),
            ("Superhero", "red"),
            ("Zero", "red"),
        ] {
            engine
                .create_model(new_model(name, "Lectro", colour, 1, 100.0))
                .await
                .unwrap();
        }

        let names = engine.suggest_model_names("hero").await;
        assert_eq!(names, vec!["Hero", "Heroic", "Superhero"]);
        assert!(engine.suggest_model_names("").await.is_empty());

        let companies = engine.suggest_companies("lec").await;
        assert_eq!(companies, vec!["Lectro"]);
    }

    #[tokio::test]
    async fn listing_filters_and_sorts_admin_view() {
        let (engine, _dir) = test_engine().await;
        engine
            .create_model(new_model("Zeta", "Ampere", "blue", 0, 100.0))
            .await
            .unwrap();
        engine
            .create_model(new_model("Hero", "Lectro", "red", 5, 100.0))
            .await
            .unwrap();
        engine
            .create_model(new_model("Atlas", "Lectro", "red", 2, 100.0))
            .await
            .unwrap();

        let listing = engine
            .list_models(&ListParams::default(), ListView::Admin, None)
            .await
            .unwrap();
        assert_eq!(listing.total, 3);
        let names: Vec<&str> = listing.data.iter().map(|r| r.model_name.as_str()).collect();
        assert_eq!(names, vec!["Atlas", "Hero", "Zeta"]);
        assert_eq!(listing.companies, vec!["Ampere", "Lectro"]);

        let in_stock = engine
            .list_models(
                &ListParams {
                    stock_status: Some("instock".to_string()),
                    ..Default::default()
                },
                ListView::Admin,
                None,
            )
            .await
            .unwrap();
        assert_eq!(in_stock.total, 2);
    }

    #[tokio::test]
    async fn public_listing_respects_the_limit() {
        let (engine, _dir) = test_engine().await;
        for i in 0..6 {
            engine
                .create_model(new_model(&format!("Model {}", i), "Lectro", "red", 1, 100.0))
                .await
                .unwrap();
        }

        let listing = engine
            .list_models(&ListParams::default(), ListView::Public, Some(3))
            .await
            .unwrap();
        assert_eq!(listing.data.len(), 3);
        assert_eq!(listing.total, 6);
    }

    #[tokio::test]
    async fn analytics_rolls_up_stock_and_companies() {
        let (engine, _dir) = test_engine().await;
        engine
            .create_model(new_model("Hero", "Lectro", "red", 20, 100.0))
            .await
            .unwrap();
        engine
            .create_model(new_model("Atlas", "Lectro", "blue", 3, 100.0))
            .await
            .unwrap();
        engine
            .create_model(new_model("Zeta", "Ampere", "", 0, 100.0))
            .await
            .unwrap();

        let analytics = engine.analytics().await.unwrap();
        assert_eq!(analytics.summary.total_models, 3);
        assert_eq!(analytics.summary.in_stock, 2);
        assert_eq!(analytics.summary.low_stock, 1);
        assert_eq!(analytics.summary.out_of_stock, 1);
        assert_eq!(analytics.summary.total_quantity, 23);

        assert_eq!(analytics.by_company[0].company, "Lectro");
        assert_eq!(analytics.by_company[0].count, 2);
        assert_eq!(analytics.by_company[0].total_quantity, 23);

        // Empty colours are excluded from the rollup.
        assert_eq!(analytics.by_colour.len(), 2);
    }

    #[tokio::test]
    async fn deleted_records_leave_every_read_path() {
        let (engine, _dir) = test_engine().await;
        let record = engine
            .create_model(new_model("Hero", "Lectro", "red", 5, 500.0))
            .await
            .unwrap();
        engine.delete_model(record.id).await.unwrap();

        assert!(engine.suggest_model_names("hero").await.is_empty());
        let listing = engine
            .list_models(&ListParams::default(), ListView::Admin, None)
            .await
            .unwrap();
        assert_eq!(listing.total, 0);

        let candidate = DuplicateCandidate {
            model_name: "Hero".to_string(),
            company: "Lectro".to_string(),
            colour: "red".to_string(),
            purchase_date: Some(record.purchase_date),
            purchased_in_warranty: Some(false),
        };
        assert!(!engine.check_duplicate(&candidate).await.unwrap().exists);
    }
}
