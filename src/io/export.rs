//! Export per-sample fit results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use crate::app::pipeline::FittedSelection;
use crate::error::AppError;

/// Write `date,t_days,observed,fitted,residual` rows for the fitted selection.
pub fn write_residuals_csv(path: &Path, fitted: &FittedSelection) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writer
        .write_record(["date", "t_days", "observed", "fitted", "residual"])
        .map_err(|e| AppError::input(format!("Failed to write export CSV header: {e}")))?;

    for row in fitted.rows() {
        writer
            .write_record([
                row.date.to_string(),
                format!("{:.0}", row.t),
                format!("{:.6}", row.observed),
                format!("{:.6}", row.fitted),
                format!("{:.6}", row.residual),
            ])
            .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV: {e}")))?;
    log::info!("wrote residuals to {}", path.display());
    Ok(())
}
