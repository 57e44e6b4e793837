//! Year filtering over the loaded series.

use chrono::Datelike;

use crate::domain::{Selection, TimeSeries};

/// Indices of the samples dated in `year`, in file order.
pub fn year_indices(series: &TimeSeries, year: i32) -> Vec<usize> {
    series
        .samples
        .iter()
        .enumerate()
        .filter(|(_, s)| s.date.year() == year)
        .map(|(i, _)| i)
        .collect()
}

/// Indices covered by a selection.
pub fn selection_indices(series: &TimeSeries, selection: Selection) -> Vec<usize> {
    match selection {
        Selection::All => (0..series.len()).collect(),
        Selection::Year(year) => year_indices(series, year),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sample;
    use chrono::NaiveDate;

    fn monthly_series(from: i32, to: i32) -> TimeSeries {
        let mut samples = Vec::new();
        for year in from..=to {
            for month in 1..=12 {
                samples.push(Sample {
                    date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
                    anomaly: year as f64 + month as f64 / 100.0,
                });
            }
        }
        TimeSeries::new(samples)
    }

    #[test]
    fn filters_exactly_one_year_in_order() {
        let series = monthly_series(1880, 2016);
        let idx = year_indices(&series, 1950);

        assert_eq!(idx.len(), 12);
        assert!(idx.windows(2).all(|w| w[0] < w[1]));
        for (k, &i) in idx.iter().enumerate() {
            let s = series.samples[i];
            assert_eq!(s.date.year(), 1950);
            assert_eq!(s.date.month() as usize, k + 1);
        }
    }

    #[test]
    fn absent_year_selects_nothing() {
        let series = monthly_series(1880, 1890);
        assert!(year_indices(&series, 2000).is_empty());
    }

    #[test]
    fn keeps_file_order_for_unsorted_input() {
        let d = |y, m| NaiveDate::from_ymd_opt(y, m, 1).unwrap();
        let series = TimeSeries::new(vec![
            Sample { date: d(1951, 3), anomaly: 0.0 },
            Sample { date: d(1950, 2), anomaly: 1.0 },
            Sample { date: d(1950, 1), anomaly: 2.0 },
            Sample { date: d(1950, 7), anomaly: 3.0 },
        ]);
        assert_eq!(year_indices(&series, 1950), vec![1, 2, 3]);
        assert_eq!(selection_indices(&series, Selection::All), vec![0, 1, 2, 3]);
    }
}
