use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::infra::dataset_client::DatasetSource;
use crate::pipeline::{acquire, aggregate, clean, load};
use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Result of a complete pipeline run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub attempts: u32,
    pub loaded_rows: usize,
    pub output_file: String,
    pub duration_secs: f64,
}

/// Composes acquire → clean → load → aggregate and owns the retry
/// policy: the whole sequence is retried as a unit with a fixed delay,
/// never a single stage. Stages are terminal success/failure with no
/// local recovery.
pub struct Orchestrator {
    config: Config,
    source: Arc<dyn DatasetSource>,
}

impl Orchestrator {
    pub fn new(config: Config, source: Arc<dyn DatasetSource>) -> Self {
        Self { config, source }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let delay = Duration::from_secs(self.config.retry.delay_secs);

        let mut attempt = 0;
        loop {
            attempt += 1;
            info!("🚀 Pipeline attempt {}/{}", attempt, max_attempts);
            counter!("etl_runs_total").increment(1);
            let started = Instant::now();

            match self.run_once().await {
                Ok((loaded_rows, output_file)) => {
                    let duration_secs = started.elapsed().as_secs_f64();
                    histogram!("etl_run_duration_seconds").record(duration_secs);
                    info!("✅ Pipeline completed in {:.1}s", duration_secs);
                    return Ok(RunReport {
                        attempts: attempt,
                        loaded_rows,
                        output_file,
                        duration_secs,
                    });
                }
                Err(e) if attempt < max_attempts => {
                    counter!("etl_run_failures_total").increment(1);
                    warn!(
                        "Pipeline attempt {} failed: {}; retrying in {}s",
                        attempt,
                        e,
                        delay.as_secs()
                    );
                    println!("⚠️  Attempt {} failed: {}", attempt, e);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    counter!("etl_run_failures_total").increment(1);
                    error!("Pipeline failed permanently after {} attempts: {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }

    /// One acquire → clean → load → aggregate sequence. Each stage's
    /// output path feeds the next; nothing runs before its predecessor
    /// finishes.
    async fn run_once(&self) -> Result<(usize, String)> {
        let csv_path = acquire::run(self.source.as_ref(), &self.config.dataset).await?;
        let csv_path = clean::run(&csv_path, &self.config.cleaning)?;

        let db = Database::connect(&self.config.database).await?;
        let loaded_rows = load::run(&db, &csv_path).await?;
        aggregate::run(&db).await?;
        db.close().await;

        Ok((loaded_rows, csv_path.display().to_string()))
    }
}
