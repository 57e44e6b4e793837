//! Small descriptive statistics.

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`).
///
/// A single value has zero spread, so this returns `Some(0.0)` for `n = 1`.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std_dev_basic() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), Some(5.0));
        assert!((std_dev(&v).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn constant_values_have_zero_spread() {
        let v = [0.37; 9];
        assert!(std_dev(&v).unwrap().abs() < 1e-15);
        assert_eq!(std_dev(&[1.5]), Some(0.0));
        assert_eq!(std_dev(&[]), None);
    }
}
