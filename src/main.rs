use clap::{Parser, Subcommand};
use sales_etl::config::Config;
use sales_etl::dashboard;
use sales_etl::db::Database;
use sales_etl::infra::dataset_client::{DatasetSource, KaggleClient};
use sales_etl::logging;
use sales_etl::pipeline::{acquire, aggregate, clean, load, Orchestrator};
use std::path::Path;
use std::sync::Arc;
use tracing::error;

#[derive(Parser)]
#[command(name = "sales_etl")]
#[command(about = "Amazon products dataset ETL pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the dataset archive and narrow it to the relevant columns
    Acquire,
    /// Run the cleaning rules over the acquired CSV
    Clean {
        /// CSV produced by the acquire step (defaults to the configured path)
        #[arg(long)]
        file: Option<String>,
    },
    /// Replace-load the cleaned CSV into the sales table
    Load {
        /// CSV produced by the clean step (defaults to the configured path)
        #[arg(long)]
        file: Option<String>,
    },
    /// Rebuild the analysis tables the dashboard reads
    Aggregate,
    /// Run the full pipeline (acquire, clean, load, aggregate) with retries
    Run,
    /// Print a read-only overview of the loaded data
    Summary {
        /// Emit machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Acquire => {
            let source = KaggleClient::from_env(&config.dataset.api_base)?;
            let path = acquire::run(&source, &config.dataset).await?;
            println!("✅ Dataset ready at {}", path.display());
        }
        Commands::Clean { file } => {
            let path = file.unwrap_or_else(|| default_csv_path(&config));
            let path = clean::run(Path::new(&path), &config.cleaning)?;
            println!("✅ Cleaned data written to {}", path.display());
        }
        Commands::Load { file } => {
            let path = file.unwrap_or_else(|| default_csv_path(&config));
            let db = Database::connect(&config.database).await?;
            load::run(&db, Path::new(&path)).await?;
            db.close().await;
        }
        Commands::Aggregate => {
            let db = Database::connect(&config.database).await?;
            aggregate::run(&db).await?;
            db.close().await;
            println!("✅ Analysis tables refreshed");
        }
        Commands::Run => {
            println!("🚀 Running full pipeline...");
            let source: Arc<dyn DatasetSource> =
                Arc::new(KaggleClient::from_env(&config.dataset.api_base)?);
            let orchestrator = Orchestrator::new(config, source);

            match orchestrator.run().await {
                Ok(report) => {
                    println!("\n📊 Pipeline Results:");
                    println!("   Attempts: {}", report.attempts);
                    println!("   Loaded rows: {}", report.loaded_rows);
                    println!("   Output file: {}", report.output_file);
                    println!("   Duration: {:.1}s", report.duration_secs);
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    println!("❌ Pipeline failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Summary { json } => {
            let db = Database::connect(&config.database).await?;
            dashboard::print_summary(&db, json).await?;
            db.close().await;
        }
    }

    Ok(())
}

fn default_csv_path(config: &Config) -> String {
    Path::new(&config.dataset.download_dir)
        .join(&config.dataset.expected_file)
        .display()
        .to_string()
}
