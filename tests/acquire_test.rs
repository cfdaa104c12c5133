use anyhow::Result;
use async_trait::async_trait;
use sales_etl::config::DatasetConfig;
use sales_etl::error::{EtlError, Result as EtlResult};
use sales_etl::infra::dataset_client::DatasetSource;
use sales_etl::pipeline::{acquire, clean};
use std::io::{Cursor, Write};
use tempfile::tempdir;
use zip::write::FileOptions;
use zip::CompressionMethod;

/// Serves a fixed in-memory archive instead of hitting the dataset API.
struct FixtureSource {
    archive: Vec<u8>,
}

#[async_trait]
impl DatasetSource for FixtureSource {
    async fn fetch_archive(&self, _slug: &str) -> EtlResult<Vec<u8>> {
        Ok(self.archive.clone())
    }
}

fn build_archive(file_name: &str, content: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(file_name, options)?;
        writer.write_all(content.as_bytes())?;
        writer.finish()?;
    }
    Ok(buf)
}

fn dataset_config(download_dir: &std::path::Path) -> DatasetConfig {
    DatasetConfig {
        slug: "fixture/products".to_string(),
        download_dir: download_dir.to_string_lossy().to_string(),
        expected_file: "Amazon-Products.csv".to_string(),
        api_base: "https://www.kaggle.com/api/v1".to_string(),
    }
}

#[tokio::test]
async fn acquires_and_projects_the_expected_file() -> Result<()> {
    let content = "\
index,name,main_category,sub_category,image,link,ratings,no_of_ratings,discount_price,actual_price\n\
0,Widget,Electronics,Gadgets,img.png,http://example.com,4.2,\"1,234\",₹500,₹600\n\
1,Kettle,Home,Kitchen,img2.png,http://example.com/2,3.9,87,\"₹1,299\",\"₹2,599\"\n";
    let archive = build_archive("Amazon-Products.csv", content)?;

    let temp_dir = tempdir()?;
    let download_dir = temp_dir.path().join("data");
    let source = FixtureSource { archive };

    let path = acquire::run(&source, &dataset_config(&download_dir)).await?;
    assert!(path.exists());

    // Narrowed to the relevant columns, rows intact
    let raw = clean::read_raw(&path)?;
    assert_eq!(raw.len(), 2);
    assert_eq!(raw[0].name.as_deref(), Some("Widget"));
    assert_eq!(raw[0].no_of_ratings.as_deref(), Some("1,234"));
    assert_eq!(raw[1].actual_price.as_deref(), Some("₹2,599"));
    Ok(())
}

#[tokio::test]
async fn missing_expected_file_is_an_acquisition_error() -> Result<()> {
    let archive = build_archive("Some-Other-File.csv", "name\nWidget\n")?;

    let temp_dir = tempdir()?;
    let download_dir = temp_dir.path().join("data");
    let source = FixtureSource { archive };

    let err = acquire::run(&source, &dataset_config(&download_dir))
        .await
        .unwrap_err();
    assert!(matches!(err, EtlError::Acquisition(_)));
    assert!(err.to_string().contains("Amazon-Products.csv"));
    Ok(())
}

#[tokio::test]
async fn missing_source_column_is_an_acquisition_error() -> Result<()> {
    // No ratings column in the source
    let content = "name,main_category,sub_category,no_of_ratings,discount_price,actual_price\n\
Widget,Electronics,Gadgets,12,₹500,₹600\n";
    let archive = build_archive("Amazon-Products.csv", content)?;

    let temp_dir = tempdir()?;
    let download_dir = temp_dir.path().join("data");
    let source = FixtureSource { archive };

    let err = acquire::run(&source, &dataset_config(&download_dir))
        .await
        .unwrap_err();
    assert!(matches!(err, EtlError::Acquisition(_)));
    assert!(err.to_string().contains("ratings"));
    Ok(())
}
