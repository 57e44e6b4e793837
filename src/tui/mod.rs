//! Ratatui-based terminal UI.
//!
//! A year slider selects which year of the series is fitted; every change
//! re-runs the pipeline synchronously and redraws the results panel and the
//! chart (data with error bars, fitted curve).

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, LineGauge, Paragraph, Wrap},
};

use crate::app::pipeline::{Analysis, FittedSelection, analyze, date_at};
use crate::domain::{ModelKind, Selection, TimeSeries};
use crate::error::AppError;
use crate::math::SolverOptions;
use crate::models::predict;
use crate::plot::{DATA_LABEL, FIT_LABEL, X_LABEL, Y_LABEL};

mod plotters_chart;

use plotters_chart::{AnomalyChart, CURVE_RGB, POINT_RGB};

/// Slider bounds and starting position.
pub const YEAR_MIN: i32 = 1880;
pub const YEAR_MAX: i32 = 2016;
pub const DEFAULT_YEAR: i32 = 2000;

/// Curve samples per chart; the literal model needs many to look continuous.
const CURVE_SAMPLES: usize = 1200;

/// Everything the TUI needs to run.
pub struct Session {
    pub series: TimeSeries,
    pub csv_path: PathBuf,
    pub model: ModelKind,
    pub solver: SolverOptions,
    pub year: i32,
}

/// Start the TUI.
pub fn run(session: Session) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(session);
    app.event_loop(&mut terminal)
}

/// Restores the terminal (raw mode, alternate screen) and logging on exit.
struct TerminalGuard {
    log_level: log::LevelFilter,
}

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        // stderr log lines would tear the alternate screen.
        let log_level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        Ok(Self { log_level })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        log::set_max_level(self.log_level);
    }
}

/// Year slider clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearSlider {
    value: i32,
    min: i32,
    max: i32,
}

impl YearSlider {
    pub fn new(value: i32, min: i32, max: i32) -> Self {
        Self {
            value: value.clamp(min, max),
            min,
            max,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Move by `delta` years; returns whether the value changed.
    pub fn step(&mut self, delta: i32) -> bool {
        self.set(self.value.saturating_add(delta))
    }

    pub fn to_min(&mut self) -> bool {
        self.set(self.min)
    }

    pub fn to_max(&mut self) -> bool {
        self.set(self.max)
    }

    fn set(&mut self, value: i32) -> bool {
        let value = value.clamp(self.min, self.max);
        let changed = value != self.value;
        self.value = value;
        changed
    }

    /// Position in `[0, 1]` for gauge rendering.
    pub fn ratio(&self) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        f64::from(self.value - self.min) / f64::from(self.max - self.min)
    }
}

struct App {
    series: TimeSeries,
    csv_path: PathBuf,
    model: ModelKind,
    solver: SolverOptions,
    slider: YearSlider,
    analysis: Analysis,
    status: String,
}

impl App {
    fn new(session: Session) -> Self {
        let slider = YearSlider::new(session.year, YEAR_MIN, YEAR_MAX);
        let analysis = analyze(
            &session.series,
            Selection::Year(slider.value()),
            session.model,
            &session.solver,
        );
        let status = format!("Loaded {} samples.", session.series.len());
        Self {
            series: session.series,
            csv_path: session.csv_path,
            model: session.model,
            solver: session.solver,
            slider,
            analysis,
            status,
        }
    }

    fn refit(&mut self) {
        self.analysis = analyze(
            &self.series,
            Selection::Year(self.slider.value()),
            self.model,
            &self.solver,
        );
        self.status = match &self.analysis.outcome {
            Ok(f) => format!("year {}: {} iterations", self.slider.value(), f.fit.iterations),
            Err(e) => format!("year {}: fit unavailable ({e})", self.slider.value()),
        };
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        let moved = match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => self.slider.step(-1),
            KeyCode::Right => self.slider.step(1),
            KeyCode::PageDown => self.slider.step(-10),
            KeyCode::PageUp => self.slider.step(10),
            KeyCode::Home => self.slider.to_min(),
            KeyCode::End => self.slider.to_max(),
            KeyCode::Char('m') => {
                self.model = match self.model {
                    ModelKind::Literal => ModelKind::Annual,
                    ModelKind::Annual => ModelKind::Literal,
                };
                true
            }
            KeyCode::Char('d') => {
                self.status = match crate::debug::write_debug_bundle(
                    std::path::Path::new("debug"),
                    &self.csv_path,
                    self.model,
                    &self.solver,
                    &self.analysis,
                ) {
                    Ok(path) => format!("Wrote debug bundle: {}", path.display()),
                    Err(err) => format!("Debug write failed: {err}"),
                };
                false
            }
            _ => false,
        };

        if moved {
            self.refit();
        }
        false
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_slider(frame, chunks[1]);
        self.draw_body(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = vec![
            Line::from(vec![
                Span::styled("anomfit", Style::default().fg(Color::Cyan)),
                Span::raw(" - Temperature anomaly curve fit"),
            ]),
            Line::from(Span::styled(
                format!(
                    "input: {} | model: {} f(t) = {} | samples: {}",
                    self.csv_path.display(),
                    self.model.display_name(),
                    self.model.formula(),
                    self.series.len()
                ),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_slider(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let gauge = LineGauge::default()
            .block(Block::default().title("Year").borders(Borders::ALL))
            .filled_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .label(format!("{} [{YEAR_MIN}-{YEAR_MAX}]", self.slider.value()))
            .ratio(self.slider.ratio());
        frame.render_widget(gauge, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(48)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_results(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let legend = Line::from(vec![
            Span::styled(format!(" ┃ {DATA_LABEL} "), Style::default().fg(rgb(POINT_RGB))),
            Span::styled(format!(" ─ {FIT_LABEL} "), Style::default().fg(rgb(CURVE_RGB))),
        ]);
        let block = Block::default()
            .title(format!("Year {}", self.slider.value()))
            .title_bottom(legend)
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let fitted = match &self.analysis.outcome {
            Ok(f) => f,
            Err(e) => {
                let msg = Paragraph::new(format!("Fit unavailable: {e}"))
                    .style(Style::default().fg(Color::Yellow))
                    .alignment(Alignment::Center);
                frame.render_widget(msg, inner);
                return;
            }
        };

        let data = chart_data(fitted);
        let (chart_rect, insets) = chart_layout(inner);
        let widget = AnomalyChart {
            curve: &data.curve,
            points: &data.points,
            error: data.error,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            x_label: X_LABEL,
            y_label: Y_LABEL,
            fmt_x: fmt_axis_x,
            fmt_y: fmt_axis_y,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, data.x_bounds, data.y_bounds);
        }
    }

    fn draw_results(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Results").borders(Borders::ALL);

        let lines: Vec<Line> = match &self.analysis.outcome {
            Ok(fitted) => {
                let mut lines = vec![Line::from(Span::styled(
                    format!(
                        "n={} | {} iter | rank {}",
                        self.analysis.n_samples, fitted.fit.iterations, fitted.fit.rank
                    ),
                    Style::default().fg(Color::Gray),
                ))];
                lines.extend(crate::report::result_lines(fitted).into_iter().map(|l| {
                    Line::from(vec![
                        Span::styled(format!("{}: ", l.label), Style::default().fg(Color::Cyan)),
                        Span::raw(l.value),
                    ])
                }));
                lines
            }
            Err(e) => vec![
                Line::from(Span::styled(
                    "Fit unavailable",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(e.to_string()),
            ],
        };

        let p = Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ ±1y  PgUp/PgDn ±10y  Home/End bounds  m model  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

/// Series and bounds for one chart, x in decimal years.
#[derive(Debug, Clone)]
struct ChartData {
    curve: Vec<(f64, f64)>,
    points: Vec<(f64, f64)>,
    error: f64,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn chart_data(fitted: &FittedSelection) -> ChartData {
    let origin = fitted.origin;
    let (t0, t1) = fitted.t_range();
    let error = fitted.summary.residual_error;

    let points: Vec<(f64, f64)> = fitted
        .t
        .iter()
        .zip(&fitted.y)
        .map(|(&t, &y)| (decimal_year(origin, t), y))
        .collect();

    let curve: Vec<(f64, f64)> = (0..CURVE_SAMPLES)
        .map(|i| {
            let t = t0 + (t1 - t0) * i as f64 / (CURVE_SAMPLES as f64 - 1.0);
            (decimal_year(origin, t), predict(fitted.fit.model, t, &fitted.fit.params))
        })
        .collect();

    let mut x_bounds = [decimal_year(origin, t0), decimal_year(origin, t1)];
    if !(x_bounds[1] > x_bounds[0]) {
        x_bounds = [x_bounds[0] - 0.5, x_bounds[0] + 0.5];
    }

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let e = if error.is_finite() { error } else { 0.0 };
    for &(_, y) in &points {
        y_min = y_min.min(y - e);
        y_max = y_max.max(y + e);
    }
    for &(_, y) in curve.iter().filter(|(_, y)| y.is_finite()) {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        let mid = if y_min.is_finite() { y_min } else { 0.0 };
        y_min = mid - 0.5;
        y_max = mid + 0.5;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    ChartData {
        curve,
        points,
        error,
        x_bounds,
        y_bounds: [y_min - pad, y_max + pad],
    }
}

/// Time-axis value as a fractional calendar year.
fn decimal_year(origin: NaiveDate, t: f64) -> f64 {
    let day = t.floor();
    let date = date_at(origin, day);
    let year_len = if NaiveDate::from_ymd_opt(date.year(), 2, 29).is_some() { 366.0 } else { 365.0 };
    f64::from(date.year()) + (f64::from(date.ordinal0()) + (t - day)) / year_len
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.2}")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.2}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_x(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub(label_len / 2);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_y(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new(X_LABEL)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    // The y label is wider than the tick column, so it sits on the top row.
    let y_label = Paragraph::new(Y_LABEL).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: inner.width,
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sample;

    #[test]
    fn slider_clamps_to_bounds() {
        let mut s = YearSlider::new(DEFAULT_YEAR, YEAR_MIN, YEAR_MAX);
        assert_eq!(s.value(), 2000);

        assert!(s.step(10));
        assert!(s.step(10));
        assert_eq!(s.value(), 2016);
        assert!(!s.step(1));

        assert!(s.to_min());
        assert_eq!(s.value(), 1880);
        assert!(!s.step(-10));
        assert_eq!(s.ratio(), 0.0);

        assert!(s.to_max());
        assert_eq!(s.ratio(), 1.0);
    }

    #[test]
    fn slider_starts_inside_bounds() {
        assert_eq!(YearSlider::new(2050, YEAR_MIN, YEAR_MAX).value(), YEAR_MAX);
        assert_eq!(YearSlider::new(1700, YEAR_MIN, YEAR_MAX).value(), YEAR_MIN);
    }

    #[test]
    fn keys_move_the_slider_and_refit() {
        let samples = (2000..=2001)
            .flat_map(|y| (1..=12).map(move |m| (y, m)))
            .map(|(y, m)| Sample {
                date: NaiveDate::from_ymd_opt(y, m, 6).unwrap(),
                anomaly: 0.25,
            })
            .collect();
        let mut app = App::new(Session {
            series: TimeSeries::new(samples),
            csv_path: PathBuf::from("x.csv"),
            model: ModelKind::Literal,
            solver: SolverOptions::default(),
            year: DEFAULT_YEAR,
        });
        assert!(app.analysis.outcome.is_ok());

        assert!(!app.handle_key(KeyCode::Right));
        assert_eq!(app.analysis.selection, Selection::Year(2001));
        assert!(app.analysis.outcome.is_ok());

        assert!(!app.handle_key(KeyCode::End));
        assert_eq!(app.slider.value(), YEAR_MAX);
        assert!(app.analysis.outcome.is_err());
        assert!(app.status.contains("fit unavailable"), "{}", app.status);

        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn decimal_year_tracks_calendar() {
        let origin = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert_eq!(decimal_year(origin, 0.0), 2000.0);
        assert_eq!(decimal_year(origin, 366.0), 2001.0);
        assert!((decimal_year(origin, 183.0) - 2000.5).abs() < 1e-12);
    }

    #[test]
    fn chart_bounds_cover_error_bars() {
        let samples = [0.1, 0.3, 0.2, 0.4, 0.1, 0.3, 0.2, 0.5, 0.1, 0.3, 0.2, 0.4]
            .iter()
            .enumerate()
            .map(|(m, &anomaly)| Sample {
                date: NaiveDate::from_ymd_opt(2000, m as u32 + 1, 6).unwrap(),
                anomaly,
            })
            .collect();
        let series = TimeSeries::new(samples);
        let fitted = analyze(&series, Selection::Year(2000), ModelKind::Annual, &SolverOptions::default())
            .outcome
            .unwrap();

        let data = chart_data(&fitted);
        assert_eq!(data.points.len(), 12);
        assert_eq!(data.curve.len(), CURVE_SAMPLES);
        assert!(data.x_bounds[0] < data.x_bounds[1]);
        for &(x, y) in &data.points {
            assert!(x >= data.x_bounds[0] && x <= data.x_bounds[1]);
            assert!(y - data.error >= data.y_bounds[0]);
            assert!(y + data.error <= data.y_bounds[1]);
        }
    }
}
