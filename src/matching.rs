//! # Exact-Duplicate Matching Module
//!
//! ## Purpose
//! Decides whether a candidate model is an exact duplicate of an existing
//! active record. Two records are the same inventory line iff their name,
//! company, colour, purchase calendar day, and warranty flag all compare
//! equal under normalization.
//!
//! ## Input/Output Specification
//! - **Input**: A candidate's descriptive fields plus the active corpus
//! - **Output**: `DuplicateMatch` carrying the full matched record, so the
//!   caller can present the conflicting field values
//! - **Failure**: Missing required candidate fields are an `InvalidInput`
//!   error, distinct from "no duplicate found"
//!
//! ## Key Features
//! - Edit mode excludes the record being edited so it never matches itself
//! - Short-circuits on the first match for determinism
//! - Missing dates never satisfy the date criterion

use crate::errors::{invalid_input, Result};
use crate::normalize::{normalize_colour, normalize_date_to_day, normalize_name};
use crate::{InventoryModel, ModelId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candidate fields for a duplicate check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub model_name: String,
    pub company: String,
    pub colour: String,
    /// Absent dates never match any record's date
    pub purchase_date: Option<DateTime<Utc>>,
    /// Absent warranty flags compare as `false`
    pub purchased_in_warranty: Option<bool>,
}

/// Outcome of a duplicate check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub exists: bool,
    /// The full matched record when `exists` is true
    pub matched: Option<InventoryModel>,
}

impl DuplicateMatch {
    fn none() -> Self {
        Self {
            exists: false,
            matched: None,
        }
    }

    fn found(record: InventoryModel) -> Self {
        Self {
            exists: true,
            matched: Some(record),
        }
    }
}

/// Find an exact duplicate of `candidate` in `corpus`, skipping the record
/// with id `exclude_id` when given (edit mode).
///
/// Requires `model_name`, `company`, and `colour` to be non-empty. Iterates
/// the corpus in order and stops at the first record whose five normalized
/// criteria all match.
pub fn find_duplicate(
    candidate: &DuplicateCandidate,
    corpus: &[InventoryModel],
    exclude_id: Option<ModelId>,
) -> Result<DuplicateMatch> {
    if candidate.model_name.trim().is_empty()
        || candidate.company.trim().is_empty()
        || candidate.colour.trim().is_empty()
    {
        return Err(invalid_input(
            "Please provide modelName, company, and colour",
        ));
    }

    let name_key = normalize_name(&candidate.model_name);
    let company_key = normalize_name(&candidate.company);
    let colour_key = normalize_colour(Some(&candidate.colour));
    let day_key = candidate.purchase_date.map(normalize_date_to_day);
    let warranty = candidate.purchased_in_warranty.unwrap_or(false);

    for record in corpus {
        if !record.is_active {
            continue;
        }
        if exclude_id == Some(record.id) {
            continue;
        }

        let name_match = normalize_name(&record.model_name) == name_key;
        let company_match = normalize_name(&record.company) == company_key;
        let colour_match = normalize_colour(Some(&record.colour)) == colour_key;
        // Both sides must carry a date; a missing candidate date never matches.
        let date_match = match day_key {
            Some(day) => normalize_date_to_day(record.purchase_date) == day,
            None => false,
        };
        let warranty_match = record.purchased_in_warranty == warranty;

        if name_match && company_match && colour_match && date_match && warranty_match {
            tracing::debug!(
                model = %record.model_name,
                company = %record.company,
                "exact duplicate found"
            );
            return Ok(DuplicateMatch::found(record.clone()));
        }
    }

    Ok(DuplicateMatch::none())
}

/// Edit-mode duplicate check. In addition to the create-mode requirements,
/// the purchase date and warranty flag must be present, and `exclude_id`
/// removes the record being edited from consideration.
pub fn find_duplicate_for_edit(
    candidate: &DuplicateCandidate,
    corpus: &[InventoryModel],
    exclude_id: ModelId,
) -> Result<DuplicateMatch> {
    if candidate.purchase_date.is_none() || candidate.purchased_in_warranty.is_none() {
        return Err(invalid_input(
            "Missing required parameters for duplicate check",
        ));
    }

    find_duplicate(candidate, corpus, Some(exclude_id))
}

/// Normalized compound key over the five duplicate criteria, used by
/// storage as a unique index so concurrent creates cannot both succeed.
pub fn duplicate_key(
    model_name: &str,
    company: &str,
    colour: &str,
    purchase_date: DateTime<Utc>,
    purchased_in_warranty: bool,
) -> String {
    format!(
        "{}\x1f{}\x1f{}\x1f{}\x1f{}",
        normalize_name(model_name),
        normalize_name(company),
        normalize_colour(Some(colour)),
        normalize_date_to_day(purchase_date),
        purchased_in_warranty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn record(name: &str, company: &str, colour: &str, hour: u32, warranty: bool) -> InventoryModel {
        let now = Utc::now();
        InventoryModel {
            id: Uuid::new_v4(),
            model_name: name.to_string(),
            company: company.to_string(),
            colour: colour.to_string(),
            quantity: 5,
            purchase_price: 100.0,
            purchased_in_warranty: warranty,
            purchase_date: Utc.with_ymd_and_hms(2024, 3, 5, hour, 0, 0).unwrap(),
            is_active: true,
            created_at: now,
            last_updated: now,
        }
    }

    fn candidate(name: &str, company: &str, colour: &str, warranty: bool) -> DuplicateCandidate {
        DuplicateCandidate {
            model_name: name.to_string(),
            company: company.to_string(),
            colour: colour.to_string(),
            purchase_date: Some(Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()),
            purchased_in_warranty: Some(warranty),
        }
    }

    #[test]
    fn matches_on_all_five_criteria() {
        let corpus = vec![record("Hero", "Lectro", "red", 8, true)];
        let result =
            find_duplicate(&candidate("Hero", "Lectro", "red", true), &corpus, None).unwrap();
        assert!(result.exists);
        assert_eq!(result.matched.unwrap().model_name, "Hero");
    }

    #[test]
    fn case_and_whitespace_insensitive() {
        let corpus = vec![record("HERO", "LECTRO", "Red", 8, false)];
        let result =
            find_duplicate(&candidate(" hero ", " lectro", " RED ", false), &corpus, None).unwrap();
        assert!(result.exists);
    }

    #[test]
    fn day_truncation_matches_different_times() {
        let corpus = vec![record("Hero", "Lectro", "red", 23, false)];
        let result =
            find_duplicate(&candidate("Hero", "Lectro", "red", false), &corpus, None).unwrap();
        assert!(result.exists);
    }

    #[test]
    fn any_differing_criterion_blocks_the_match() {
        let corpus = vec![record("Hero", "Lectro", "red", 8, false)];
        for cand in [
            candidate("Heroic", "Lectro", "red", false),
            candidate("Hero", "Ampere", "red", false),
            candidate("Hero", "Lectro", "blue", false),
            candidate("Hero", "Lectro", "red", true),
        ] {
            assert!(!find_duplicate(&cand, &corpus, None).unwrap().exists);
        }
    }

    #[test]
    fn missing_candidate_date_never_matches() {
        let corpus = vec![record("Hero", "Lectro", "red", 8, false)];
        let mut cand = candidate("Hero", "Lectro", "red", false);
        cand.purchase_date = None;
        assert!(!find_duplicate(&cand, &corpus, None).unwrap().exists);
    }

    #[test]
    fn missing_warranty_defaults_to_false() {
        let corpus = vec![record("Hero", "Lectro", "red", 8, false)];
        let mut cand = candidate("Hero", "Lectro", "red", false);
        cand.purchased_in_warranty = None;
        assert!(find_duplicate(&cand, &corpus, None).unwrap().exists);
    }

    #[test]
    fn missing_required_fields_are_invalid_input() {
        let corpus = vec![record("Hero", "Lectro", "red", 8, false)];
        let cand = DuplicateCandidate {
            model_name: "Hero".to_string(),
            ..Default::default()
        };
        assert!(find_duplicate(&cand, &corpus, None).is_err());
    }

    #[test]
    fn edit_mode_excludes_self() {
        let existing = record("Hero", "Lectro", "red", 8, false);
        let id = existing.id;
        let other = record("Heroic", "Lectro", "red", 8, false);
        let corpus = vec![existing, other];

        let result =
            find_duplicate_for_edit(&candidate("Hero", "Lectro", "red", false), &corpus, id)
                .unwrap();
        assert!(!result.exists);
    }

    #[test]
    fn edit_mode_requires_date_and_warranty() {
        let corpus = vec![record("Hero", "Lectro", "red", 8, false)];
        let mut cand = candidate("Hero", "Lectro", "red", false);
        cand.purchase_date = None;
        assert!(find_duplicate_for_edit(&cand, &corpus, Uuid::new_v4()).is_err());
    }

    #[test]
    fn inactive_records_are_ignored() {
        let mut existing = record("Hero", "Lectro", "red", 8, false);
        existing.is_active = false;
        let corpus = vec![existing];
        let result =
            find_duplicate(&candidate("Hero", "Lectro", "red", false), &corpus, None).unwrap();
        assert!(!result.exists);
    }

    #[test]
    fn duplicate_key_is_normalization_stable() {
        let date_a = Utc.with_ymd_and_hms(2024, 3, 5, 1, 0, 0).unwrap();
        let date_b = Utc.with_ymd_and_hms(2024, 3, 5, 22, 0, 0).unwrap();
        assert_eq!(
            duplicate_key(" hero ", "LECTRO", "Red", date_a, true),
            duplicate_key("HERO", " lectro", " red ", date_b, true)
        );
        assert_ne!(
            duplicate_key("hero", "lectro", "red", date_a, true),
            duplicate_key("hero", "lectro", "red", date_a, false)
        );
    }
}
