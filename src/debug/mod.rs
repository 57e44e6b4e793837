//! Debug bundle writer for inspecting one analysis in detail.
//!
//! The bundle is a markdown file under `debug/` with the solver settings, the
//! full fit diagnostics (covariance, rank, stop reason) and every residual.

use std::fmt::Write as _;
use std::fs::{File, create_dir_all};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::Analysis;
use crate::domain::{ModelKind, Selection};
use crate::error::AppError;
use crate::math::SolverOptions;

/// Write a bundle for `analysis` into `dir` and return its path.
pub fn write_debug_bundle(
    dir: &Path,
    csv_path: &Path,
    model: ModelKind,
    solver: &SolverOptions,
    analysis: &Analysis,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::runtime(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let tag = match analysis.selection {
        Selection::All => "all".to_string(),
        Selection::Year(y) => y.to_string(),
    };
    let path = dir.join(format!("anomfit_debug_{tag}_{ts}.md"));

    let body = render_bundle(csv_path, model, solver, analysis);
    let mut file =
        File::create(&path).map_err(|e| AppError::runtime(format!("Failed to create debug file: {e}")))?;
    file.write_all(body.as_bytes())
        .map_err(|e| AppError::runtime(format!("Failed to write debug file: {e}")))?;

    log::info!("wrote debug bundle {}", path.display());
    Ok(path)
}

/// Markdown body of a debug bundle.
pub fn render_bundle(csv_path: &Path, model: ModelKind, solver: &SolverOptions, analysis: &Analysis) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_bundle(&mut out, csv_path, model, solver, analysis);
    out
}

fn write_bundle(
    out: &mut String,
    csv_path: &Path,
    model: ModelKind,
    solver: &SolverOptions,
    analysis: &Analysis,
) -> std::fmt::Result {
    writeln!(out, "# anomfit debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- input: {}", csv_path.display())?;
    writeln!(out, "- selection: {} (n={})", analysis.selection.label(), analysis.n_samples)?;
    writeln!(out, "- model: {} | f(t) = {}", model.display_name(), model.formula())?;
    writeln!(
        out,
        "- solver: max_iter={}, ftol={:e}, xtol={:e}, gtol={:e}, lambda0={:e}",
        solver.max_iter, solver.ftol, solver.xtol, solver.gtol, solver.initial_lambda
    )?;

    let fitted = match &analysis.outcome {
        Ok(f) => f,
        Err(e) => {
            writeln!(out, "\nFit unavailable: {e}")?;
            return Ok(());
        }
    };
    let fit = &fitted.fit;

    writeln!(out, "\n## Fit")?;
    writeln!(
        out,
        "- iterations: {}, stop: {:?}, SSE: {:.6e}, rank: {}",
        fit.iterations, fit.termination, fit.sse, fit.rank
    )?;
    writeln!(out, "| param | value | std error |")?;
    writeln!(out, "| - | - | - |")?;
    let names = crate::models::model_for(fit.model).param_names();
    for ((name, p), se) in names.iter().zip(&fit.params).zip(&fit.std_errors) {
        writeln!(out, "| {name} | {p:.9} | {se:.6e} |")?;
    }

    writeln!(out, "\n### Covariance")?;
    for row in &fit.covariance {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:.6e}")).collect();
        writeln!(out, "| {} |", cells.join(" | "))?;
    }

    let s = &fitted.summary;
    writeln!(out, "\n## Statistics")?;
    writeln!(out, "- residual error: {:.6}", s.residual_error)?;
    writeln!(
        out,
        "- local minimum: {:.6} at t={:.3} ({}), converged={}",
        s.min_anomaly,
        s.min_t,
        fitted.date_at(s.min_t),
        s.min_converged
    )?;
    writeln!(out, "- average: {:.6}", s.average)?;
    writeln!(out, "- slope heuristic: {:.6}", s.slope)?;

    writeln!(out, "\n## Residuals")?;
    writeln!(out, "| date | t | observed | fitted | residual |")?;
    writeln!(out, "| - | - | - | - | - |")?;
    for r in fitted.rows() {
        writeln!(
            out,
            "| {} | {:.0} | {:.4} | {:.4} | {:.4} |",
            r.date, r.t, r.observed, r.fitted, r.residual
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::analyze;
    use crate::domain::{Sample, TimeSeries};
    use chrono::NaiveDate;

    fn series() -> TimeSeries {
        TimeSeries::new(
            (1..=12)
                .map(|m| Sample {
                    date: NaiveDate::from_ymd_opt(1999, m, 6).unwrap(),
                    anomaly: 0.2,
                })
                .collect(),
        )
    }

    #[test]
    fn bundle_lists_every_residual() {
        let opts = SolverOptions::default();
        let analysis = analyze(&series(), Selection::Year(1999), ModelKind::Literal, &opts);
        let md = render_bundle(Path::new("monthly_csv.csv"), ModelKind::Literal, &opts, &analysis);

        assert!(md.starts_with("# anomfit debug bundle\n"));
        assert!(md.contains("- selection: year 1999 (n=12)"));
        assert!(md.contains("### Covariance"));
        assert_eq!(md.lines().filter(|l| l.starts_with("| 1999-")).count(), 12);
    }

    #[test]
    fn bundle_records_unavailable_fit() {
        let opts = SolverOptions::default();
        let analysis = analyze(&series(), Selection::Year(2001), ModelKind::Literal, &opts);
        let md = render_bundle(Path::new("x.csv"), ModelKind::Literal, &opts, &analysis);
        assert!(md.contains("Fit unavailable: no samples for year 2001"));
        assert!(!md.contains("## Fit"));
    }
}
