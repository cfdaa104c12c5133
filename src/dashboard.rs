//! Read-only consumer of the loaded and aggregated tables. Chart
//! rendering lives outside this crate; these are the row shapes the
//! dashboard plots from, plus a text summary for the CLI.

use crate::constants::{
    CATEGORY_ANALYSIS_TABLE, PRICE_ANALYSIS_TABLE, RATING_ANALYSIS_TABLE, SALES_TABLE,
    TIME_SERIES_TABLE,
};
use crate::db::Database;
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Serialize, FromRow)]
pub struct Overview {
    pub total_products: i64,
    pub avg_price: f64,
    pub avg_rating: f64,
    pub total_ratings: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CategoryRow {
    pub main_category: String,
    pub product_count: i64,
    pub avg_price: f64,
    pub avg_rating: f64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PriceRow {
    pub price_range: String,
    pub product_count: i64,
    pub avg_rating: f64,
    pub total_ratings: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RatingRow {
    pub rating_range: String,
    pub product_count: i64,
    pub avg_price: f64,
    pub total_ratings: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct TimeSeriesRow {
    pub analysis_date: NaiveDate,
    pub total_products: i64,
    pub avg_price: f64,
    pub avg_rating: f64,
    pub total_ratings: i64,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub overview: Overview,
    pub top_categories: Vec<CategoryRow>,
}

pub async fn overview(db: &Database) -> Result<Overview> {
    let sql = format!(
        "SELECT COUNT(*) AS total_products, \
         COALESCE(AVG(ActualPrice), 0) AS avg_price, \
         COALESCE(AVG(Rating), 0) AS avg_rating, \
         CAST(COALESCE(SUM(RatingCount), 0) AS SIGNED) AS total_ratings \
         FROM {}",
        SALES_TABLE
    );
    let row = sqlx::query_as::<_, Overview>(&sql).fetch_one(db.pool()).await?;
    Ok(row)
}

pub async fn top_categories(db: &Database, limit: i64) -> Result<Vec<CategoryRow>> {
    let sql = format!(
        "SELECT main_category, product_count, avg_price, avg_rating \
         FROM {} ORDER BY product_count DESC LIMIT ?",
        CATEGORY_ANALYSIS_TABLE
    );
    let rows = sqlx::query_as::<_, CategoryRow>(&sql)
        .bind(limit)
        .fetch_all(db.pool())
        .await?;
    Ok(rows)
}

pub async fn price_analysis(db: &Database) -> Result<Vec<PriceRow>> {
    let sql = format!(
        "SELECT price_range, product_count, avg_rating, total_ratings FROM {}",
        PRICE_ANALYSIS_TABLE
    );
    let rows = sqlx::query_as::<_, PriceRow>(&sql).fetch_all(db.pool()).await?;
    Ok(rows)
}

pub async fn rating_analysis(db: &Database) -> Result<Vec<RatingRow>> {
    let sql = format!(
        "SELECT rating_range, product_count, avg_price, total_ratings FROM {}",
        RATING_ANALYSIS_TABLE
    );
    let rows = sqlx::query_as::<_, RatingRow>(&sql).fetch_all(db.pool()).await?;
    Ok(rows)
}

pub async fn time_series(db: &Database) -> Result<Vec<TimeSeriesRow>> {
    let sql = format!(
        "SELECT analysis_date, total_products, avg_price, avg_rating, total_ratings \
         FROM {} ORDER BY analysis_date",
        TIME_SERIES_TABLE
    );
    let rows = sqlx::query_as::<_, TimeSeriesRow>(&sql)
        .fetch_all(db.pool())
        .await?;
    Ok(rows)
}

/// Prints the overview the dashboard's landing page shows.
pub async fn print_summary(db: &Database, json: bool) -> Result<()> {
    let overview = overview(db).await?;
    let top_categories = top_categories(db, 10).await?;

    if json {
        let summary = Summary {
            overview,
            top_categories,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("📊 Sales data overview");
    println!("   Total products: {}", overview.total_products);
    println!("   Average price: ${:.2}", overview.avg_price);
    println!("   Average rating: {:.2}", overview.avg_rating);
    println!("   Total ratings: {}", overview.total_ratings);

    if !top_categories.is_empty() {
        println!("\n🏆 Top categories by product count:");
        for (rank, row) in top_categories.iter().enumerate() {
            println!(
                "   {}. {} — {} products (avg ${:.2}, rating {:.2})",
                rank + 1,
                row.main_category,
                row.product_count,
                row.avg_price,
                row.avg_rating
            );
        }
    }

    Ok(())
}
