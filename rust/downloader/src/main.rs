//! Dataset Download Tool
//!
//! Streams the datasets listed in a YAML config into sharded JSON Lines files
//! on local disk, in an S3 bucket, or both.
//!
//! # Usage
//!
//! ```bash
//! # Use config.yml defaults
//! dataset-download
//!
//! # Override the bucket
//! dataset-download --cloud-bucket my-custom-bucket
//!
//! # Download full datasets to S3
//! dataset-download --mode full --storage s3 --cloud-bucket my-bucket
//!
//! # Download to both local and S3
//! dataset-download --storage both --cloud-bucket my-bucket --region us-west-2
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use acquire_core::{
    AcquireConfig, ConfigOverrides, Dispatcher, HubSource, RunMode, StorageMode, StorageSink,
};

/// Download streaming datasets to local storage and/or S3
#[derive(Parser, Debug)]
#[command(name = "dataset-download")]
#[command(about = "Download streaming datasets to local storage and/or S3")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yml")]
    config: String,

    /// Bucket name (overrides the config file)
    #[arg(long, visible_alias = "s3-bucket")]
    cloud_bucket: Option<String>,

    /// Bucket region (overrides the config file)
    #[arg(long)]
    region: Option<String>,

    /// Storage mode: local, s3 or both
    #[arg(long)]
    storage: Option<StorageMode>,

    /// Run mode: test (limited) or full (complete datasets)
    #[arg(long)]
    mode: Option<RunMode>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dataset download");

    let mut config = match AcquireConfig::from_file(&args.config) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            tracing::error!("{e}");
            return Err(e.into());
        }
    };

    config.apply_overrides(&ConfigOverrides {
        bucket: args.cloud_bucket,
        region: args.region,
        storage_mode: args.storage,
        run_mode: args.mode,
    });
    config.validate()?;

    tracing::info!("  Mode: {}", config.mode);
    tracing::info!("  Storage: {}", config.storage.mode);
    tracing::info!("  Local dir: {}", config.storage.local_dir.display());
    if config.storage.mode.writes_cloud() {
        tracing::info!("  Bucket: s3://{}/{}", config.cloud.bucket, config.cloud.prefix);
        tracing::info!("  Region: {}", config.cloud.region);
    }
    tracing::info!("  Datasets: {}", config.datasets.len());

    let source = HubSource::new(&config.hub)?;
    let sink = StorageSink::from_config(&config)?;

    let summary = Dispatcher::new(&source, &sink).run(&config);

    println!("{summary}");

    let failed = summary.failed();
    if !failed.is_empty() {
        tracing::warn!("{} dataset(s) failed: {}", failed.len(), failed.join(", "));
    }

    Ok(())
}
