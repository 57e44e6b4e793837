//! Interactive CSV picker.
//!
//! Reached only when no CSV was named (`-f`, `ANOMFIT_CSV`) and the default
//! `monthly_csv.csv` is missing, with stdin attached to a terminal. Lists the
//! `*.csv` files below the working directory with their header row, files
//! with at least the source/date/anomaly columns first. The user can also
//! generate the default file from the synthetic record instead.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::app::DEFAULT_CSV;
use crate::data::{SynthConfig, write_synth_csv};
use crate::error::AppError;

/// How deep to recurse when looking for CSV files.
const SEARCH_DEPTH: usize = 4;

/// Columns an anomaly CSV needs: source, date, value.
const MIN_COLUMNS: usize = 3;

/// A CSV file found on disk and its header row, if readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub header: Option<Vec<String>>,
}

impl Candidate {
    fn inspect(path: PathBuf) -> Self {
        let header = csv::Reader::from_path(&path)
            .ok()
            .and_then(|mut reader| reader.headers().ok().map(|h| h.iter().map(str::to_string).collect()));
        Self { path, header }
    }

    /// Whether the header has room for a date and an anomaly column.
    pub fn has_anomaly_columns(&self) -> bool {
        self.header.as_ref().is_some_and(|h| h.len() >= MIN_COLUMNS)
    }

    fn describe(&self) -> String {
        match &self.header {
            Some(cols) if self.has_anomaly_columns() => format!("{}  [{}]", display_path(&self.path), cols.join(", ")),
            Some(cols) => format!("{}  ({} column(s), too few)", display_path(&self.path), cols.len()),
            None => format!("{}  (unreadable)", display_path(&self.path)),
        }
    }
}

/// What the user typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Answer {
    Use(PathBuf),
    Synthesize,
    Quit,
}

/// Ask the user for the anomaly CSV to load.
///
/// Accepts a list number, an explicit path, `s` to write a synthetic
/// `monthly_csv.csv`, or `q` to cancel.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let candidates = discover_candidates(Path::new("."));

    println!("{DEFAULT_CSV} not found and no CSV was given with -f or {}.", crate::cli::CSV_ENV);
    if candidates.is_empty() {
        println!("No .csv files below the current directory.");
    } else {
        println!("CSV files below the current directory:");
        for (idx, c) in candidates.iter().enumerate() {
            println!("{:>3}) {}", idx + 1, c.describe());
        }
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if candidates.is_empty() {
            print!("Type a path, s to generate {DEFAULT_CSV}, or q to quit: ");
        } else {
            print!(
                "Select 1-{}, type a path, s to generate {DEFAULT_CSV}, or q to quit: ",
                candidates.len()
            );
        }
        io::stdout()
            .flush()
            .map_err(|e| AppError::runtime(format!("Failed to write prompt: {e}")))?;

        let Some(line) = lines.next() else {
            return Err(AppError::input("No input received. Provide a CSV path with `-f <file.csv>`."));
        };
        let line = line.map_err(|e| AppError::runtime(format!("Failed to read input: {e}")))?;

        match parse_answer(line.trim(), &candidates) {
            Ok(Answer::Use(path)) => return Ok(path),
            Ok(Answer::Synthesize) => {
                let path = PathBuf::from(DEFAULT_CSV);
                let series = write_synth_csv(&path, &SynthConfig::default())?;
                println!("Wrote {} synthetic samples to {DEFAULT_CSV}.", series.len());
                return Ok(path);
            }
            Ok(Answer::Quit) => return Err(AppError::input("Canceled.")),
            Err(msg) => println!("{msg}"),
        }
    }
}

fn parse_answer(answer: &str, candidates: &[Candidate]) -> Result<Answer, String> {
    if answer.eq_ignore_ascii_case("q") {
        return Ok(Answer::Quit);
    }
    if answer.eq_ignore_ascii_case("s") {
        return Ok(Answer::Synthesize);
    }
    if let Ok(choice) = answer.parse::<usize>() {
        let Some(c) = choice.checked_sub(1).and_then(|i| candidates.get(i)) else {
            return Err(format!("No file numbered {choice}."));
        };
        if !c.has_anomaly_columns() {
            return Err(format!(
                "{} has no source/date/anomaly columns; pick another file.",
                display_path(&c.path)
            ));
        }
        return Ok(Answer::Use(c.path.clone()));
    }
    validate_csv_path(Path::new(answer))
        .map(Answer::Use)
        .map_err(|e| e.to_string())
}

/// Check that `path` names an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if path.is_dir() {
        return Err(AppError::input(format!("{} is a directory", path.display())));
    }
    if !path.is_file() {
        return Err(AppError::input(format!("CSV file not found: {}", path.display())));
    }
    if !has_csv_extension(path) {
        return Err(AppError::input(format!("Expected a .csv file (got: {})", path.display())));
    }
    Ok(path.to_path_buf())
}

/// `*.csv` files under `root` with their headers; likely anomaly files first.
pub fn discover_candidates(root: &Path) -> Vec<Candidate> {
    let mut paths = Vec::new();
    collect_csv_paths(root, 0, &mut paths);

    let mut out: Vec<Candidate> = paths.into_iter().map(Candidate::inspect).collect();
    out.sort_by_key(|c| (!c.has_anomaly_columns(), display_path(&c.path)));
    out
}

fn collect_csv_paths(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > SEARCH_DEPTH {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(kind) = entry.file_type() else {
            continue;
        };
        if kind.is_dir() && !is_skipped_dir(&path) {
            collect_csv_paths(&path, depth + 1, out);
        } else if kind.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn is_skipped_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "debug")
}

fn display_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(path: &str, cols: Option<&[&str]>) -> Candidate {
        Candidate {
            path: PathBuf::from(path),
            header: cols.map(|c| c.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn numbers_pick_only_files_with_anomaly_columns() {
        let list = vec![
            candidate("monthly.csv", Some(&["Source", "Date", "Mean"])),
            candidate("notes.csv", Some(&["text"])),
        ];
        assert_eq!(parse_answer("1", &list), Ok(Answer::Use(PathBuf::from("monthly.csv"))));
        assert!(parse_answer("2", &list).unwrap_err().contains("no source/date/anomaly columns"));
        assert!(parse_answer("0", &list).unwrap_err().contains("No file numbered 0"));
        assert!(parse_answer("3", &list).is_err());
    }

    #[test]
    fn letters_synthesize_or_quit() {
        assert_eq!(parse_answer("S", &[]), Ok(Answer::Synthesize));
        assert_eq!(parse_answer("q", &[]), Ok(Answer::Quit));
    }

    #[test]
    fn discovery_reads_headers_and_lists_usable_files_first() {
        let dir = std::env::temp_dir().join(format!("anomfit-picker-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("a_notes.csv"), "text\nhello\n").unwrap();
        std::fs::write(dir.join("nested").join("z_monthly.csv"), "Source,Date,Mean\nGCAG,2000-01-06,0.1\n").unwrap();
        std::fs::write(dir.join("readme.txt"), "not a csv").unwrap();

        let found = discover_candidates(&dir);
        assert_eq!(found.len(), 2);
        assert!(found[0].path.ends_with("nested/z_monthly.csv"));
        assert_eq!(found[0].header.as_deref().map(|h| h.len()), Some(3));
        assert!(!found[1].has_anomaly_columns());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = validate_csv_path(Path::new("definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }
}
