use crate::constants::SALES_TABLE;
use crate::db::Database;
use crate::error::{EtlError, Result};
use crate::records::CleanRecord;
use csv::ReaderBuilder;
use metrics::counter;
use sqlx::QueryBuilder;
use std::path::Path;
use tracing::{info, instrument};

/// Rows per INSERT statement. MySQL packet limits leave plenty of
/// headroom at this size.
const INSERT_CHUNK: usize = 500;

/// Full replace-load of the cleaned CSV into the sales table: prior
/// contents are discarded wholesale inside one transaction, so a rerun
/// with identical input leaves the table in an identical state. All
/// failures are fatal here; retries belong to the orchestrator.
#[instrument(skip(db))]
pub async fn run(db: &Database, path: &Path) -> Result<usize> {
    let records = read_clean(path)?;
    info!("📦 Loading {} rows into {}", records.len(), SALES_TABLE);
    println!("📦 Loading {} rows into {}...", records.len(), SALES_TABLE);

    sqlx::query(&create_table_sql())
        .execute(db.pool())
        .await
        .map_err(|e| {
            EtlError::Persistence(format!("failed to create table {}: {}", SALES_TABLE, e))
        })?;

    let mut tx = db
        .pool()
        .begin()
        .await
        .map_err(|e| EtlError::Persistence(format!("failed to open transaction: {}", e)))?;

    sqlx::query(&format!("DELETE FROM {}", SALES_TABLE))
        .execute(&mut *tx)
        .await
        .map_err(|e| EtlError::Persistence(format!("failed to clear {}: {}", SALES_TABLE, e)))?;

    for chunk in records.chunks(INSERT_CHUNK) {
        let mut builder: QueryBuilder<sqlx::MySql> = QueryBuilder::new(insert_prefix());
        builder.push_values(chunk, |mut row, record| {
            row.push_bind(record.id)
                .push_bind(&record.main_category)
                .push_bind(&record.sub_category)
                .push_bind(&record.name)
                .push_bind(record.discount_price)
                .push_bind(record.actual_price)
                .push_bind(record.ratings)
                .push_bind(record.no_of_ratings);
        });
        builder.build().execute(&mut *tx).await.map_err(|e| {
            EtlError::Persistence(format!("failed to insert into {}: {}", SALES_TABLE, e))
        })?;
    }

    tx.commit()
        .await
        .map_err(|e| EtlError::Persistence(format!("failed to commit load: {}", e)))?;

    info!("✅ Replace-load committed ({} rows)", records.len());
    println!("✅ Loaded {} rows", records.len());
    counter!("etl_rows_loaded_total").increment(records.len() as u64);
    Ok(records.len())
}

pub fn read_clean(path: &Path) -> Result<Vec<CleanRecord>> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// DDL matching what the dashboard queries expect. Column names follow
/// the warehouse convention rather than the source CSV's.
pub fn create_table_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n\
         sales_id INTEGER PRIMARY KEY,\n\
         Category VARCHAR(50) NOT NULL,\n\
         SubCategory VARCHAR(50) NOT NULL,\n\
         ProductName VARCHAR(250) NOT NULL,\n\
         DiscountPrice FLOAT NOT NULL,\n\
         ActualPrice FLOAT NOT NULL,\n\
         Rating FLOAT NOT NULL,\n\
         RatingCount INTEGER NOT NULL\n\
         )",
        SALES_TABLE
    )
}

fn insert_prefix() -> String {
    format!(
        "INSERT INTO {} (sales_id, Category, SubCategory, ProductName, DiscountPrice, ActualPrice, Rating, RatingCount) ",
        SALES_TABLE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::WriterBuilder;
    use tempfile::tempdir;

    #[test]
    fn clean_csv_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.csv");

        let records = vec![
            CleanRecord {
                name: "Widget".to_string(),
                main_category: "Electronics".to_string(),
                sub_category: "Gadgets".to_string(),
                discount_price: 6.0,
                actual_price: 7.2,
                ratings: 4.2,
                no_of_ratings: 1234,
                id: 1,
            },
            CleanRecord {
                name: "Other".to_string(),
                main_category: "Home".to_string(),
                sub_category: "Kitchen".to_string(),
                discount_price: 1.2,
                actual_price: 2.4,
                ratings: 3.9,
                no_of_ratings: 7,
                id: 2,
            },
        ];

        let mut writer = WriterBuilder::new().from_path(&path).unwrap();
        for record in &records {
            writer.serialize(record).unwrap();
        }
        writer.flush().unwrap();

        let read_back = read_clean(&path).unwrap();
        assert_eq!(read_back, records);
    }

    #[test]
    fn table_ddl_matches_dashboard_contract() {
        let sql = create_table_sql();
        assert!(sql.contains("sales_id INTEGER PRIMARY KEY"));
        for column in [
            "Category",
            "SubCategory",
            "ProductName",
            "DiscountPrice",
            "ActualPrice",
            "Rating",
            "RatingCount",
        ] {
            assert!(sql.contains(column), "missing column {}", column);
        }
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS sales_data"));
    }
}
