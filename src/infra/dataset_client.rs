use crate::error::{EtlError, Result};
use async_trait::async_trait;
use tracing::info;

/// Port for fetching a dataset archive by slug. The production
/// implementation talks to the Kaggle API; tests substitute a local
/// fixture archive.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch_archive(&self, slug: &str) -> Result<Vec<u8>>;
}

/// Kaggle dataset download client. Authenticates with HTTP basic auth
/// the way the official client does.
pub struct KaggleClient {
    api_base: String,
    username: String,
    key: String,
    client: reqwest::Client,
}

impl KaggleClient {
    /// Credentials come from KAGGLE_USERNAME / KAGGLE_KEY, matching the
    /// official client's environment convention.
    pub fn from_env(api_base: &str) -> Result<Self> {
        let username = std::env::var("KAGGLE_USERNAME").map_err(|_| {
            EtlError::Acquisition("KAGGLE_USERNAME environment variable not set".to_string())
        })?;
        let key = std::env::var("KAGGLE_KEY").map_err(|_| {
            EtlError::Acquisition("KAGGLE_KEY environment variable not set".to_string())
        })?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            username,
            key,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl DatasetSource for KaggleClient {
    async fn fetch_archive(&self, slug: &str) -> Result<Vec<u8>> {
        let url = format!("{}/datasets/download/{}", self.api_base, slug);
        info!("Downloading dataset archive from {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EtlError::Acquisition(format!(
                "dataset download for '{}' returned status {}",
                slug,
                response.status().as_u16()
            )));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
