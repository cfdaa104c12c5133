use crate::config::CleaningConfig;
use crate::constants::RATING_DENYLIST;
use crate::error::{EtlError, Result};
use crate::records::{CleanRecord, RawRecord};
use csv::{ReaderBuilder, WriterBuilder};
use metrics::counter;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Applies the cleaning rules in their fixed order and rewrites the CSV
/// in place. The order is load-bearing: each rule assumes the invariants
/// the earlier ones established. There is no partial-success mode; a
/// malformed value that survives the rating gate aborts the whole stage.
#[instrument(skip(config))]
pub fn run(path: &Path, config: &CleaningConfig) -> Result<PathBuf> {
    let raw = read_raw(path)?;
    let total = raw.len();
    println!("🔧 Cleaning {} rows...", total);

    let cleaned = clean_records(raw, config)?;
    info!("✅ Cleaned {} rows down to {}", total, cleaned.len());
    println!("✅ {} rows survived cleaning", cleaned.len());
    counter!("etl_rows_cleaned_total").increment(cleaned.len() as u64);
    counter!("etl_rows_dropped_total").increment((total - cleaned.len()) as u64);

    write_clean(path, &cleaned)?;
    Ok(path.to_path_buf())
}

pub fn read_raw(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn write_clean(path: &Path, records: &[CleanRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// The full rule sequence over in-memory rows.
pub fn clean_records(raw: Vec<RawRecord>, config: &CleaningConfig) -> Result<Vec<CleanRecord>> {
    // 1. Rows missing any of the four measure columns are unusable.
    let with_measures: Vec<RawRecord> = raw
        .into_iter()
        .filter(|r| {
            r.ratings.is_some()
                && r.no_of_ratings.is_some()
                && r.discount_price.is_some()
                && r.actual_price.is_some()
        })
        .collect();

    // 2. The same product appears under several category labels; keep the
    // first occurrence in file order.
    let mut seen = HashSet::new();
    let mut deduped = Vec::with_capacity(with_measures.len());
    for record in with_measures {
        if seen.insert(record.dedup_key()) {
            deduped.push(record);
        } else {
            debug!("Dropping duplicate listing of {:?}", record.name);
        }
    }

    // 3. Rating gate. Anything that is not a plausible rating drops the
    // row here, so coercion below cannot fail on the ratings column.
    let rated: Vec<RawRecord> = deduped
        .into_iter()
        .filter(|r| {
            r.ratings
                .as_deref()
                .map(|raw| is_valid_rating(raw, config))
                .unwrap_or(false)
        })
        .collect();

    // 4. Safety net: a missing value in any remaining column drops the row.
    let complete: Vec<RawRecord> = rated.into_iter().filter(|r| !r.has_missing()).collect();

    // 5-7. Coerce the survivors and assign the dense 1-based id.
    let mut cleaned = Vec::with_capacity(complete.len());
    for (index, record) in complete.into_iter().enumerate() {
        cleaned.push(coerce(record, index as i64 + 1, config)?);
    }
    Ok(cleaned)
}

/// A usable rating is a finite decimal inside the configured range. Every
/// member of `RATING_DENYLIST` fails this predicate; the explicit check
/// keeps the observed garbage documented.
pub fn is_valid_rating(raw: &str, config: &CleaningConfig) -> bool {
    if RATING_DENYLIST.contains(&raw) {
        return false;
    }
    match raw.trim().parse::<f64>() {
        Ok(value) => value.is_finite() && value >= config.min_rating && value <= config.max_rating,
        Err(_) => false,
    }
}

/// Thousands-separated counts like "1,234".
pub fn parse_count(raw: &str) -> Result<i64> {
    let count: i64 = raw
        .replace(',', "")
        .trim()
        .parse()
        .map_err(|_| EtlError::Coercion(format!("rating count '{}' is not an integer", raw)))?;
    if count < 0 {
        return Err(EtlError::Coercion(format!(
            "rating count '{}' is negative",
            raw
        )));
    }
    Ok(count)
}

/// Locale-formatted prices like "₹1,299": strip the currency symbol and
/// thousands separators, then convert at the configured rate.
pub fn parse_price(raw: &str, rate: f64) -> Result<f64> {
    let value: f64 = raw
        .replace('₹', "")
        .replace(',', "")
        .trim()
        .parse()
        .map_err(|_| EtlError::Coercion(format!("price '{}' is not numeric", raw)))?;
    Ok(value * rate)
}

fn require(field: Option<String>, column: &str) -> Result<String> {
    field.ok_or_else(|| EtlError::Validation(format!("missing value in column '{}'", column)))
}

fn coerce(record: RawRecord, id: i64, config: &CleaningConfig) -> Result<CleanRecord> {
    let ratings_raw = require(record.ratings, "ratings")?;
    let ratings: f64 = ratings_raw
        .trim()
        .parse()
        .map_err(|_| EtlError::Coercion(format!("rating '{}' is not numeric", ratings_raw)))?;

    Ok(CleanRecord {
        name: require(record.name, "name")?,
        main_category: require(record.main_category, "main_category")?,
        sub_category: require(record.sub_category, "sub_category")?,
        discount_price: parse_price(&require(record.discount_price, "discount_price")?, config.currency_rate)?,
        actual_price: parse_price(&require(record.actual_price, "actual_price")?, config.currency_rate)?,
        ratings,
        no_of_ratings: parse_count(&require(record.no_of_ratings, "no_of_ratings")?)?,
        id,
    })
}
