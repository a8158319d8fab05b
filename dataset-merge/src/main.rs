//! Dataset Merge
//!
//! Offline job that builds the classifier's training table from two
//! candidate catalogs:
//!
//! ```text
//!  data1_clean.csv (KOI)        data2_clean.csv (TOI)
//!          │                             │
//!          │                    + snr_proxy (derived)
//!          ▼                             ▼
//!     rename koi_*                rename pl_* / st_*
//!          └──────────────┬──────────────┘
//!                         ▼
//!                  clean.csv (unified)
//! ```
//!
//! There is no partial output: any bad row aborts the whole run.

mod error;
mod merge;
mod schema;
mod snr;
mod table;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use merge::MergeOptions;

#[derive(Debug, Parser)]
#[command(name = "dataset-merge", version, about = "Merge KOI and TOI candidate tables into one training table")]
struct Cli {
    /// KOI catalog (Kepler column names)
    #[arg(long, env = "MERGE_KOI", default_value = "data1_clean.csv")]
    koi: PathBuf,

    /// TOI catalog (TESS column names)
    #[arg(long, env = "MERGE_TOI", default_value = "data2_clean.csv")]
    toi: PathBuf,

    /// Output file with the unified schema
    #[arg(long, env = "MERGE_OUTPUT", default_value = "clean.csv")]
    output: PathBuf,

    /// Per-hour noise floor for the SNR proxy (ppm)
    #[arg(long, default_value_t = snr::DEFAULT_NOISE_FLOOR_PPM)]
    noise_floor: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "dataset_merge=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(
        cli.noise_floor.is_finite() && cli.noise_floor > 0.0,
        "--noise-floor must be a positive number, got {}",
        cli.noise_floor
    );

    let options = MergeOptions {
        koi_path: cli.koi,
        toi_path: cli.toi,
        output_path: cli.output,
        noise_floor_ppm: cli.noise_floor,
    };

    let summary = merge::run(&options)
        .with_context(|| format!("merge into {} failed", options.output_path.display()))?;

    tracing::info!(
        "Merged {} KOI + {} TOI rows into {}",
        summary.koi_rows,
        summary.toi_rows,
        options.output_path.display()
    );
    Ok(())
}
