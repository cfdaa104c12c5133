use crate::constants::{
    CATEGORY_ANALYSIS_TABLE, PRICE_ANALYSIS_TABLE, RATING_ANALYSIS_TABLE, SALES_TABLE,
    TIME_SERIES_TABLE,
};
use crate::db::Database;
use crate::error::{EtlError, Result};
use tracing::{info, instrument};

/// Rebuilds the pre-aggregated tables the dashboard reads. The three
/// categorical tables are replaced wholesale each run; the time series
/// keeps one row per run date so reruns on the same day stay idempotent
/// while successive days accumulate a trend.
#[instrument(skip(db))]
pub async fn run(db: &Database) -> Result<()> {
    println!("📈 Rebuilding analysis tables...");
    rebuild(db, CATEGORY_ANALYSIS_TABLE, &category_analysis_sql()).await?;
    rebuild(db, PRICE_ANALYSIS_TABLE, &price_analysis_sql()).await?;
    rebuild(db, RATING_ANALYSIS_TABLE, &rating_analysis_sql()).await?;
    append_time_series(db).await?;
    info!("✅ Analysis tables refreshed");
    Ok(())
}

async fn rebuild(db: &Database, table: &str, select: &str) -> Result<()> {
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
        .execute(db.pool())
        .await
        .map_err(|e| EtlError::Persistence(format!("failed to drop {}: {}", table, e)))?;

    sqlx::query(&format!("CREATE TABLE {} AS {}", table, select))
        .execute(db.pool())
        .await
        .map_err(|e| EtlError::Persistence(format!("failed to build {}: {}", table, e)))?;

    info!("Rebuilt {}", table);
    Ok(())
}

pub fn category_analysis_sql() -> String {
    format!(
        "SELECT Category AS main_category, \
         COUNT(*) AS product_count, \
         AVG(ActualPrice) AS avg_price, \
         AVG(Rating) AS avg_rating \
         FROM {} GROUP BY Category",
        SALES_TABLE
    )
}

pub fn price_analysis_sql() -> String {
    format!(
        "SELECT CASE \
         WHEN ActualPrice < 5 THEN 'under $5' \
         WHEN ActualPrice < 20 THEN '$5-$20' \
         WHEN ActualPrice < 50 THEN '$20-$50' \
         WHEN ActualPrice < 100 THEN '$50-$100' \
         ELSE '$100+' END AS price_range, \
         COUNT(*) AS product_count, \
         AVG(Rating) AS avg_rating, \
         CAST(SUM(RatingCount) AS SIGNED) AS total_ratings \
         FROM {} GROUP BY price_range",
        SALES_TABLE
    )
}

pub fn rating_analysis_sql() -> String {
    format!(
        "SELECT CASE \
         WHEN Rating < 1 THEN '0-1' \
         WHEN Rating < 2 THEN '1-2' \
         WHEN Rating < 3 THEN '2-3' \
         WHEN Rating < 4 THEN '3-4' \
         ELSE '4-5' END AS rating_range, \
         COUNT(*) AS product_count, \
         AVG(ActualPrice) AS avg_price, \
         CAST(SUM(RatingCount) AS SIGNED) AS total_ratings \
         FROM {} GROUP BY rating_range",
        SALES_TABLE
    )
}

async fn append_time_series(db: &Database) -> Result<()> {
    let ddl = format!(
        "CREATE TABLE IF NOT EXISTS {} (\n\
         analysis_date DATE PRIMARY KEY,\n\
         total_products INTEGER NOT NULL,\n\
         avg_price DOUBLE NOT NULL,\n\
         avg_rating DOUBLE NOT NULL,\n\
         total_ratings BIGINT NOT NULL\n\
         )",
        TIME_SERIES_TABLE
    );
    sqlx::query(&ddl).execute(db.pool()).await.map_err(|e| {
        EtlError::Persistence(format!("failed to create {}: {}", TIME_SERIES_TABLE, e))
    })?;

    // REPLACE keyed on the run date: a same-day rerun overwrites its own
    // row instead of duplicating it.
    sqlx::query(&time_series_insert_sql())
        .execute(db.pool())
        .await
        .map_err(|e| {
            EtlError::Persistence(format!("failed to append to {}: {}", TIME_SERIES_TABLE, e))
        })?;

    info!("Appended today's row to {}", TIME_SERIES_TABLE);
    Ok(())
}

pub fn time_series_insert_sql() -> String {
    format!(
        "REPLACE INTO {} (analysis_date, total_products, avg_price, avg_rating, total_ratings) \
         SELECT CURRENT_DATE, COUNT(*), \
         COALESCE(AVG(ActualPrice), 0), \
         COALESCE(AVG(Rating), 0), \
         CAST(COALESCE(SUM(RatingCount), 0) AS SIGNED) \
         FROM {}",
        TIME_SERIES_TABLE, SALES_TABLE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_analysis_exposes_dashboard_columns() {
        let sql = category_analysis_sql();
        for column in ["main_category", "product_count", "avg_price", "avg_rating"] {
            assert!(sql.contains(column), "missing column {}", column);
        }
        assert!(sql.contains("GROUP BY Category"));
    }

    #[test]
    fn price_buckets_cover_the_full_range() {
        let sql = price_analysis_sql();
        for bucket in ["under $5", "$5-$20", "$20-$50", "$50-$100", "$100+"] {
            assert!(sql.contains(bucket), "missing bucket {}", bucket);
        }
        assert!(sql.contains("total_ratings"));
    }

    #[test]
    fn rating_buckets_cover_zero_to_five() {
        let sql = rating_analysis_sql();
        for bucket in ["0-1", "1-2", "2-3", "3-4", "4-5"] {
            assert!(sql.contains(bucket), "missing bucket {}", bucket);
        }
    }

    #[test]
    fn time_series_replaces_by_run_date() {
        let sql = time_series_insert_sql();
        assert!(sql.starts_with("REPLACE INTO time_series_analysis"));
        assert!(sql.contains("CURRENT_DATE"));
    }
}
