//! Merge pipeline: SNR proxy for TOI, rename both catalogs, stack them.

use std::path::PathBuf;

use crate::error::MergeResult;
use crate::schema::{
    KOI_COLUMNS, SNR_PROXY_COLUMN, TOI_COLUMNS, TOI_DEPTH_PPM, TOI_DURATION_HOURS,
    TOI_PERIOD_DAYS, TOI_TMAG, UNIFIED_COLUMNS,
};
use crate::snr::TransitObservation;
use crate::table::Table;

/// Inputs and knobs for one merge run
#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub koi_path: PathBuf,
    pub toi_path: PathBuf,
    pub output_path: PathBuf,
    pub noise_floor_ppm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeSummary {
    pub koi_rows: usize,
    pub toi_rows: usize,
    pub output_rows: usize,
    pub output_columns: usize,
}

/// Append (or overwrite) the `snr_proxy` column of a TOI table
pub fn add_snr_proxy(toi: &mut Table, noise_floor_ppm: f64) -> MergeResult<()> {
    let depth = toi.required_numeric_column(TOI_DEPTH_PPM)?;
    let period = toi.required_numeric_column(TOI_PERIOD_DAYS)?;
    let duration = toi.required_numeric_column(TOI_DURATION_HOURS)?;
    let tmag = toi
        .numeric_column(TOI_TMAG)?
        .unwrap_or_else(|| vec![None; toi.row_count()]);

    let values = (0..toi.row_count())
        .map(|i| {
            let obs = TransitObservation {
                depth_ppm: depth[i],
                period_days: period[i],
                duration_hours: duration[i],
                tmag: tmag[i],
            };
            obs.snr_proxy(noise_floor_ppm)
                .map(|snr| snr.to_string())
                .unwrap_or_default()
        })
        .collect();

    toi.set_column(SNR_PROXY_COLUMN, values);
    Ok(())
}

/// Derive, rename and stack. KOI rows come first.
///
/// A rename that collides with a column already present is an error.
pub fn merge_tables(mut koi: Table, mut toi: Table, noise_floor_ppm: f64) -> MergeResult<Table> {
    add_snr_proxy(&mut toi, noise_floor_ppm)?;

    koi.rename_columns(&KOI_COLUMNS);
    toi.rename_columns(&TOI_COLUMNS);
    koi.ensure_unique_columns()?;
    toi.ensure_unique_columns()?;

    Ok(Table::concat(koi, toi))
}

/// Read both inputs, merge them and write the result once
pub fn run(options: &MergeOptions) -> MergeResult<MergeSummary> {
    let koi = Table::read_csv(&options.koi_path)?;
    let toi = Table::read_csv(&options.toi_path)?;
    tracing::info!(
        "Loaded {} KOI rows from {} and {} TOI rows from {}",
        koi.row_count(),
        options.koi_path.display(),
        toi.row_count(),
        options.toi_path.display()
    );

    let koi_rows = koi.row_count();
    let toi_rows = toi.row_count();
    let merged = merge_tables(koi, toi, options.noise_floor_ppm)?;

    let missing: Vec<&str> = UNIFIED_COLUMNS
        .iter()
        .copied()
        .filter(|column| merged.column_index(column).is_none())
        .collect();
    if !missing.is_empty() {
        tracing::warn!("{} lacks unified columns: {}", merged.name(), missing.join(", "));
    }

    merged.write_csv(&options.output_path)?;

    let summary = MergeSummary {
        koi_rows,
        toi_rows,
        output_rows: merged.row_count(),
        output_columns: merged.headers().len(),
    };
    tracing::info!(
        "Wrote {} rows x {} columns to {}",
        summary.output_rows,
        summary.output_columns,
        options.output_path.display()
    );

    Ok(summary)
}
