//! # Listing Filter Module
//!
//! ## Purpose
//! Translates listing parameters (free-text search, company, colour, stock
//! status, warranty status) into a predicate over the active corpus.
//!
//! ## Input/Output Specification
//! - **Input**: Raw query parameters from the listing endpoint
//! - **Output**: A compiled `ModelFilter` whose `matches` closes over the
//!   constraints; all provided constraints combine with logical AND
//!
//! Free-text search is a case-insensitive **prefix** match across model
//! name, company, and colour. This is intentionally stricter than the
//! suggestion ranker's substring semantics: listings narrow as you type,
//! suggestions cast a wider net.

use crate::errors::{Result, StockError};
use crate::InventoryModel;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Sentinel meaning "no constraint" for dropdown-backed filters
const FILTER_ALL: &str = "all";

/// Stock status filter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockFilter {
    All,
    InStock,
    OutOfStock,
}

impl StockFilter {
    /// Parse the wire value; unknown values mean no constraint.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("instock") => StockFilter::InStock,
            Some("outofstock") => StockFilter::OutOfStock,
            _ => StockFilter::All,
        }
    }
}

/// Warranty status filter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarrantyFilter {
    All,
    InWarranty,
    NoWarranty,
}

impl WarrantyFilter {
    /// Parse the wire value; unknown values mean no constraint.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("inwarranty") => WarrantyFilter::InWarranty,
            Some("nowarranty") => WarrantyFilter::NoWarranty,
            _ => WarrantyFilter::All,
        }
    }
}

/// Raw listing parameters as delivered by the transport layer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub company: Option<String>,
    pub colour: Option<String>,
    pub stock_status: Option<String>,
    pub warranty: Option<String>,
}

/// Compiled corpus predicate
pub struct ModelFilter {
    search: Option<Regex>,
    company: Option<String>,
    colour: Option<String>,
    stock: StockFilter,
    warranty: WarrantyFilter,
}

impl ModelFilter {
    /// Build a filter from listing parameters.
    pub fn build(params: &ListParams) -> Result<Self> {
        // Escaped prefix regex, case-insensitive, matching the search
        // behavior of the data-entry UI.
        let search = match params.search.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(
                Regex::new(&format!("(?i)^{}", regex::escape(s))).map_err(|e| {
                    StockError::Internal {
                        message: format!("Failed to compile search pattern: {}", e),
                    }
                })?,
            ),
            _ => None,
        };

        let company = params
            .company
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(FILTER_ALL))
            .map(str::to_string);

        let colour = params
            .colour
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(FILTER_ALL))
            .map(str::to_lowercase);

        Ok(Self {
            search,
            company,
            colour,
            stock: StockFilter::parse(params.stock_status.as_deref()),
            warranty: WarrantyFilter::parse(params.warranty.as_deref()),
        })
    }

    /// Whether `record` satisfies every provided constraint. Inactive
    /// records never match.
    pub fn matches(&self, record: &InventoryModel) -> bool {
        if !record.is_active {
            return false;
        }

        if let Some(search) = &self.search {
            let hit = search.is_match(&record.model_name)
                || search.is_match(&record.company)
                || search.is_match(&record.colour);
            if !hit {
                return false;
            }
        }

        if let Some(company) = &self.company {
            if record.company != *company {
                return false;
            }
        }

        if let Some(colour) = &self.colour {
            if !record.colour.to_lowercase().contains(colour) {
                return false;
            }
        }

        match self.stock {
            StockFilter::InStock if record.quantity == 0 => return false,
            StockFilter::OutOfStock if record.quantity > 0 => return false,
            _ => {}
        }

        match self.warranty {
            WarrantyFilter::InWarranty if !record.purchased_in_warranty => return false,
            WarrantyFilter::NoWarranty if record.purchased_in_warranty => return false,
            _ => {}
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(name: &str, company: &str, colour: &str, quantity: u32, warranty: bool) -> InventoryModel {
        let now = Utc::now();
        InventoryModel {
            id: Uuid::new_v4(),
            model_name: name.to_string(),
            company: company.to_string(),
            colour: colour.to_string(),
            quantity,
            purchase_price: 0.0,
            purchased_in_warranty: warranty,
            purchase_date: now,
            is_active: true,
            created_at: now,
            last_updated: now,
        }
    }

    fn filter(params: ListParams) -> ModelFilter {
        ModelFilter::build(&params).unwrap()
    }

    #[test]
    fn search_is_prefix_only() {
        let f = filter(ListParams {
            search: Some("ero".to_string()),
            ..Default::default()
        });
        // "Hero" contains but does not start with "ero".
        assert!(!f.matches(&record("Hero", "Lectro", "red", 1, false)));

        let f = filter(ListParams {
            search: Some("her".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&record("Hero", "Lectro", "red", 1, false)));
    }

    #[test]
    fn search_spans_name_company_and_colour() {
        let f = filter(ListParams {
            search: Some("lec".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&record("Hero", "Lectro", "red", 1, false)));

        let f = filter(ListParams {
            search: Some("re".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&record("Hero", "Lectro", "red", 1, false)));
    }

    #[test]
    fn search_is_case_insensitive_and_literal() {
        let f = filter(ListParams {
            search: Some("HER".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&record("hero", "Lectro", "red", 1, false)));

        // Regex metacharacters are escaped, not interpreted.
        let f = filter(ListParams {
            search: Some(".*".to_string()),
            ..Default::default()
        });
        assert!(!f.matches(&record("Hero", "Lectro", "red", 1, false)));
    }

    #[test]
    fn company_filter_is_exact_with_all_sentinel() {
        let f = filter(ListParams {
            company: Some("Lectro".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&record("Hero", "Lectro", "red", 1, false)));
        assert!(!f.matches(&record("Hero", "Ampere", "red", 1, false)));

        let f = filter(ListParams {
            company: Some("all".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&record("Hero", "Ampere", "red", 1, false)));
    }

    #[test]
    fn colour_filter_is_substring() {
        let f = filter(ListParams {
            colour: Some("RED".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&record("Hero", "Lectro", "matte red", 1, false)));
        assert!(!f.matches(&record("Hero", "Lectro", "blue", 1, false)));
    }

    #[test]
    fn stock_and_warranty_filters() {
        let f = filter(ListParams {
            stock_status: Some("instock".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&record("Hero", "Lectro", "red", 2, false)));
        assert!(!f.matches(&record("Hero", "Lectro", "red", 0, false)));

        let f = filter(ListParams {
            stock_status: Some("outofstock".to_string()),
            warranty: Some("inwarranty".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&record("Hero", "Lectro", "red", 0, true)));
        assert!(!f.matches(&record("Hero", "Lectro", "red", 0, false)));
        assert!(!f.matches(&record("Hero", "Lectro", "red", 3, true)));
    }

    #[test]
    fn unknown_filter_values_are_unconstrained() {
        let f = filter(ListParams {
            stock_status: Some("whatever".to_string()),
            warranty: Some("all".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&record("Hero", "Lectro", "red", 0, true)));
    }

    #[test]
    fn constraints_combine_with_and() {
        let f = filter(ListParams {
            search: Some("her".to_string()),
            company: Some("Lectro".to_string()),
            stock_status: Some("instock".to_string()),
            ..Default::default()
        });
        assert!(f.matches(&record("Hero", "Lectro", "red", 2, false)));
        assert!(!f.matches(&record("Hero", "Ampere", "red", 2, false)));
        assert!(!f.matches(&record("Hero", "Lectro", "red", 0, false)));
    }

    #[test]
    fn inactive_records_never_match() {
        let mut r = record("Hero", "Lectro", "red", 2, false);
        r.is_active = false;
        assert!(!filter(ListParams::default()).matches(&r));
    }
}
