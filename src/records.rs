use serde::{Deserialize, Serialize};

/// One row of the source dataset as ingested. Empty CSV fields
/// deserialize to `None`, which is what "missing" means throughout the
/// cleaning rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub name: Option<String>,
    pub main_category: Option<String>,
    pub sub_category: Option<String>,
    pub discount_price: Option<String>,
    pub actual_price: Option<String>,
    pub ratings: Option<String>,
    pub no_of_ratings: Option<String>,
}

/// A `RawRecord` after validation and coercion. `id` is dense and
/// 1-based, assigned in final surviving row order; it is not a persistent
/// key from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub name: String,
    pub main_category: String,
    pub sub_category: String,
    pub discount_price: f64,
    pub actual_price: f64,
    pub ratings: f64,
    pub no_of_ratings: i64,
    pub id: i64,
}

impl RawRecord {
    /// Key for product-level deduplication: every column except the
    /// category labels, so the same product listed under two categories
    /// collapses to one row.
    pub fn dedup_key(
        &self,
    ) -> (
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
    ) {
        (
            self.name.clone(),
            self.discount_price.clone(),
            self.actual_price.clone(),
            self.ratings.clone(),
            self.no_of_ratings.clone(),
        )
    }

    pub fn has_missing(&self) -> bool {
        self.name.is_none()
            || self.main_category.is_none()
            || self.sub_category.is_none()
            || self.discount_price.is_none()
            || self.actual_price.is_none()
            || self.ratings.is_none()
            || self.no_of_ratings.is_none()
    }
}
