//! Text formatting for fit reports and the per-year scan table.

use crate::app::pipeline::{Analysis, FittedSelection};
use crate::domain::{RunConfig, TimeSeries};
use crate::models::model_for;

/// One labelled line of the results block (shared with the TUI panel).
#[derive(Debug, Clone, PartialEq)]
pub struct ResultLine {
    pub label: String,
    pub value: String,
}

impl ResultLine {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Parameters with standard errors followed by the derived statistics.
pub fn result_lines(fitted: &FittedSelection) -> Vec<ResultLine> {
    let fit = &fitted.fit;
    let summary = &fitted.summary;
    let names = model_for(fit.model).param_names();

    let mut lines: Vec<ResultLine> = names
        .iter()
        .zip(fit.params.iter().zip(&fit.std_errors))
        .map(|(name, (p, se))| ResultLine::new(*name, format!("{p:.6} ± {}", fmt_err(*se))))
        .collect();

    lines.push(ResultLine::new("residual error", format!("{:.4} C", summary.residual_error)));

    let min_note = if summary.min_converged { "" } else { " (not converged)" };
    lines.push(ResultLine::new(
        "local minimum",
        format!(
            "{:.4} C at {} (t={:.1}){min_note}",
            summary.min_anomaly,
            fitted.date_at(summary.min_t),
            summary.min_t
        ),
    ));
    lines.push(ResultLine::new("average", format!("{:.4} C", summary.average)));
    lines.push(ResultLine::new("slope (heuristic)", format!("{:.4}", summary.slope)));
    lines
}

/// Full `anomfit fit` report: dataset, model and the results block.
pub fn format_run_summary(series: &TimeSeries, fitted: &FittedSelection, config: &RunConfig) -> String {
    let mut out = String::new();

    out.push_str("=== anomfit - Temperature Anomaly Curve Fit ===\n");
    out.push_str(&format!("Input: {}\n", config.csv_path.display()));
    if let (Some(first), Some(last)) = (series.samples.first(), series.samples.last()) {
        out.push_str(&format!(
            "Series: n={} | {} .. {}\n",
            series.len(),
            first.date,
            last.date
        ));
    }
    out.push_str(&format!(
        "Selection: {} (n={})\n",
        fitted.selection.label(),
        fitted.t.len()
    ));
    out.push_str(&format!(
        "Model: {} | f(t) = {}\n",
        config.model.display_name(),
        config.model.formula()
    ));
    out.push_str(&format!(
        "Solver: {} iterations, stop={:?}, SSE={:.6}, rank={}\n",
        fitted.fit.iterations, fitted.fit.termination, fitted.fit.sse, fitted.fit.rank
    ));

    out.push_str("\nResults:\n");
    out.push_str(&format_result_lines(&result_lines(fitted)));
    out
}

fn format_result_lines(lines: &[ResultLine]) -> String {
    let width = lines.iter().map(|l| l.label.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for line in lines {
        out.push_str(&format!("  {:<width$} : {}\n", line.label, line.value));
    }
    out
}

/// One row per analyzed year; unavailable fits show their reason.
pub fn format_scan_table(analyses: &[Analysis]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<10} {:>4} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
            "selection", "n", "a", "b", "c", "resid", "average", "slope"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<10} {:-<4} {:-<10} {:-<10} {:-<10} {:-<10} {:-<10} {:-<10}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for a in analyses {
        let label = match a.selection {
            crate::domain::Selection::All => "all".to_string(),
            crate::domain::Selection::Year(y) => y.to_string(),
        };
        let row = match &a.outcome {
            Ok(f) => format!(
                "{:<10} {:>4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                label,
                a.n_samples,
                f.fit.params[0],
                f.fit.params[1],
                f.fit.params[2],
                f.summary.residual_error,
                f.summary.average,
                f.summary.slope
            ),
            Err(e) => format!("{:<10} {:>4} fit unavailable: {e}", label, a.n_samples),
        };
        out.push_str(row.trim_end());
        out.push('\n');
    }

    out
}

fn fmt_err(se: f64) -> String {
    if se.is_finite() { format!("{se:.6}") } else { "inf".to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{analyze, scan_years};
    use crate::domain::{ModelKind, Sample, Selection};
    use crate::math::SolverOptions;
    use chrono::NaiveDate;

    fn flat_year(year: i32, value: f64) -> Vec<Sample> {
        (1..=12)
            .map(|m| Sample {
                date: NaiveDate::from_ymd_opt(year, m, 6).unwrap(),
                anomaly: value,
            })
            .collect()
    }

    #[test]
    fn result_lines_name_every_statistic() {
        let series = TimeSeries::new(flat_year(2000, 0.4));
        let fitted = analyze(&series, Selection::All, ModelKind::Literal, &SolverOptions::default())
            .outcome
            .unwrap();

        let labels: Vec<String> = result_lines(&fitted).into_iter().map(|l| l.label).collect();
        assert_eq!(
            labels,
            vec!["a", "b", "c", "residual error", "local minimum", "average", "slope (heuristic)"]
        );
    }

    #[test]
    fn scan_table_reports_unavailable_years() {
        let mut samples = flat_year(2000, 0.4);
        samples.extend(flat_year(2002, 0.5));
        let series = TimeSeries::new(samples);
        let rows = scan_years(&series, &[2000, 2001, 2002], ModelKind::Literal, &SolverOptions::default());

        let table = format_scan_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[2].starts_with("2000"));
        assert_eq!(lines[3], "2001          0 fit unavailable: no samples for year 2001");
        assert!(lines[4].contains("0.5000"));
    }

    #[test]
    fn infinite_errors_print_as_inf() {
        assert_eq!(fmt_err(f64::INFINITY), "inf");
        assert_eq!(fmt_err(0.5), "0.500000");
    }
}
