use clap::Parser;
use gasdepot::config::DepotConfig;
use gasdepot::interfaces::api::{ApiResponse, status_code};
use gasdepot::interfaces::csv::ops_reader::OpsReader;
use gasdepot::interfaces::csv::stock_writer::StockWriter;
use gasdepot::interfaces::replay::ReplayDriver;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input replay script CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[cfg(feature = "storage-rocksdb")]
async fn persistent_driver(config: DepotConfig, path: PathBuf) -> Result<ReplayDriver> {
    ReplayDriver::with_rocksdb(config, path)
        .await
        .into_diagnostic()
}

#[cfg(not(feature = "storage-rocksdb"))]
async fn persistent_driver(_config: DepotConfig, _path: PathBuf) -> Result<ReplayDriver> {
    Err(miette::miette!(
        "persistent storage requires the storage-rocksdb feature"
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DepotConfig::from_env();

    let mut driver = match cli.db_path {
        Some(db_path) => persistent_driver(config, db_path).await?,
        None => ReplayDriver::in_memory(config).await.into_diagnostic()?,
    };

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = OpsReader::new(file);
    for record in reader.records() {
        match record {
            Ok(record) => {
                if let Err(err) = driver.apply(record).await {
                    let envelope = ApiResponse::failure(err.to_string());
                    eprintln!(
                        "{} {}",
                        status_code(&err),
                        serde_json::to_string(&envelope).into_diagnostic()?
                    );
                }
            }
            Err(err) => {
                eprintln!("Error reading operation: {}", err);
            }
        }
    }

    let levels = driver.levels().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = StockWriter::new(stdout.lock());
    writer.write_levels(levels).into_diagnostic()?;

    Ok(())
}
