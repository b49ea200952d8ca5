//! # Reference-Price Resolution Module
//!
//! ## Purpose
//! Infers a purchase price for a new inventory line from prior records that
//! share its name, company, purchase day, and warranty status. Colour is
//! deliberately not part of the key, so a price recorded for one colour
//! propagates to sibling colours of the same line item.
//!
//! ## Input/Output Specification
//! - **Input**: Candidate name/company/date/warranty plus the active corpus
//! - **Output**: `PriceResult` with the resolved price and reference record
//! - **Soft-fail**: Missing candidate attributes yield "no price" rather
//!   than an error; price propagation is an enhancement, not a safety check
//!
//! Among several colour siblings with positive prices, the most recently
//! updated record wins (record id as the final tie-break), so the outcome
//! does not depend on storage iteration order.

use crate::normalize::{normalize_date_to_day, normalize_name};
use crate::InventoryModel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candidate attributes for price resolution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceCandidate {
    pub model_name: String,
    pub company: String,
    pub purchase_date: Option<DateTime<Utc>>,
    pub purchased_in_warranty: Option<bool>,
}

/// Outcome of a reference-price lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResult {
    pub has_price: bool,
    pub price: Option<f64>,
    /// The record the price was taken from
    pub reference: Option<InventoryModel>,
}

impl PriceResult {
    fn none() -> Self {
        Self {
            has_price: false,
            price: None,
            reference: None,
        }
    }
}

/// Resolve a reference price for `candidate` from `corpus`.
///
/// Matches active records with equal normalized name and company, the same
/// purchase calendar day, strict warranty equality, and a positive price.
pub fn resolve_reference_price(candidate: &PriceCandidate, corpus: &[InventoryModel]) -> PriceResult {
    if candidate.model_name.trim().is_empty() || candidate.company.trim().is_empty() {
        return PriceResult::none();
    }
    let (purchase_date, warranty) = match (candidate.purchase_date, candidate.purchased_in_warranty)
    {
        (Some(d), Some(w)) => (d, w),
        _ => return PriceResult::none(),
    };

    let name_key = normalize_name(&candidate.model_name);
    let company_key = normalize_name(&candidate.company);
    let day_key = normalize_date_to_day(purchase_date);

    let best = corpus
        .iter()
        .filter(|record| {
            record.is_active
                && record.purchase_price > 0.0
                && record.purchased_in_warranty == warranty
                && normalize_name(&record.model_name) == name_key
                && normalize_name(&record.company) == company_key
                && normalize_date_to_day(record.purchase_date) == day_key
        })
        .max_by_key(|record| (record.last_updated, record.id));

    match best {
        Some(record) => PriceResult {
            has_price: true,
            price: Some(record.purchase_price),
            reference: Some(record.clone()),
        },
        None => PriceResult::none(),
    }
}
