use crate::config::DatasetConfig;
use crate::constants::RELEVANT_COLUMNS;
use crate::error::{EtlError, Result};
use crate::infra::dataset_client::DatasetSource;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use metrics::counter;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use zip::ZipArchive;

/// Downloads and unpacks the dataset archive, then narrows the expected
/// CSV to the relevant columns in place. Returns the path the cleaner
/// reads. Network failures, a missing expected file, and a missing
/// expected column are all fatal.
#[instrument(skip(source, config), fields(slug = %config.slug))]
pub async fn run(source: &dyn DatasetSource, config: &DatasetConfig) -> Result<PathBuf> {
    fs::create_dir_all(&config.download_dir)?;

    info!("📡 Fetching dataset archive for {}", config.slug);
    println!("📡 Fetching dataset archive for {}...", config.slug);
    let archive = source.fetch_archive(&config.slug).await?;
    info!("✅ Downloaded {} bytes", archive.len());
    counter!("etl_archive_bytes_total").increment(archive.len() as u64);

    extract_archive(&archive, Path::new(&config.download_dir))?;

    let csv_path = Path::new(&config.download_dir).join(&config.expected_file);
    if !csv_path.exists() {
        return Err(EtlError::Acquisition(format!(
            "expected file '{}' not found in archive",
            config.expected_file
        )));
    }

    let rows = project_columns(&csv_path)?;
    info!(
        "✅ Projected {} rows down to {} columns",
        rows,
        RELEVANT_COLUMNS.len()
    );
    println!("✅ Acquired {} rows", rows);
    counter!("etl_rows_acquired_total").increment(rows as u64);

    Ok(csv_path)
}

/// Unpack every file entry of the zip archive into `dest`. Directory
/// prefixes inside the archive are flattened to their basename; the
/// source archive is flat in practice.
pub fn extract_archive(bytes: &[u8], dest: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if !entry.is_file() {
            continue;
        }

        let name = entry.name().to_string();
        let file_name = Path::new(&name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                EtlError::Acquisition(format!("archive entry '{}' has no file name", name))
            })?;

        let out_path = dest.join(file_name);
        let mut out = fs::File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out)?;
        debug!("Extracted {} -> {}", name, out_path.display());
    }

    Ok(())
}

/// Rewrite the CSV at `path` keeping exactly the relevant columns, in
/// canonical order. Returns the surviving row count.
pub fn project_columns(path: &Path) -> Result<usize> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut indices = Vec::with_capacity(RELEVANT_COLUMNS.len());
    for column in RELEVANT_COLUMNS {
        let index = headers.iter().position(|h| h == column).ok_or_else(|| {
            EtlError::Acquisition(format!(
                "source dataset is missing expected column '{}'",
                column
            ))
        })?;
        indices.push(index);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let projected: StringRecord = indices
            .iter()
            .map(|&i| record.get(i).unwrap_or(""))
            .collect();
        rows.push(projected);
    }
    drop(reader);

    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(&RELEVANT_COLUMNS)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn projects_relevant_columns_and_drops_the_rest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("products.csv");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "index,name,main_category,sub_category,image,link,ratings,no_of_ratings,discount_price,actual_price"
        )
        .unwrap();
        writeln!(
            file,
            "0,Widget,Electronics,Gadgets,img.png,http://x,4.2,\"1,234\",₹500,₹600"
        )
        .unwrap();
        drop(file);

        let rows = project_columns(&path).unwrap();
        assert_eq!(rows, 1);

        let mut reader = ReaderBuilder::new().from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            RELEVANT_COLUMNS.to_vec()
        );
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.get(0), Some("Widget"));
        assert_eq!(record.get(6), Some("1,234"));
    }

    #[test]
    fn missing_expected_column_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("products.csv");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "name,main_category,sub_category").unwrap();
        writeln!(file, "Widget,Electronics,Gadgets").unwrap();
        drop(file);

        let err = project_columns(&path).unwrap_err();
        assert!(matches!(err, EtlError::Acquisition(_)));
        assert!(err.to_string().contains("discount_price"));
    }
}
