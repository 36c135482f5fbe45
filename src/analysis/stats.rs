//! Year-range statistics over a chronology
//!
//! Queries intersect the chronology's native year axis with the requested
//! interval by membership. Nothing is interpolated or extrapolated, so an
//! empty intersection yields NaN.

use crate::record::{Chronology, TreeringRecord};

/// Arithmetic mean of integer measurements
///
/// Returns NaN for an empty slice.
pub fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator)
///
/// Returns NaN when fewer than two values are present.
pub fn sample_variance(values: &[i64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values
        .iter()
        .map(|&v| {
            let d = v as f64 - m;
            d * d
        })
        .sum();
    sum_sq / (n - 1) as f64
}

impl Chronology {
    /// Values whose year lies in both `[begin, end]` and `[t1, t2]`
    pub fn window(&self, t1: i32, t2: i32) -> &[i64] {
        let start = t1.max(self.begin());
        let stop = t2.min(self.end());
        if start > stop {
            return &[];
        }
        let lo = (start - self.begin()) as usize;
        let hi = (stop - self.begin()) as usize;
        &self.data()[lo..=hi]
    }

    /// Mean of the chronology over the years `t1..=t2`
    pub fn mean(&self, t1: i32, t2: i32) -> f64 {
        mean(self.window(t1, t2))
    }

    /// Sample variance of the chronology over the years `t1..=t2`
    pub fn variance(&self, t1: i32, t2: i32) -> f64 {
        sample_variance(self.window(t1, t2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordMeta;

    fn chronology(begin: i32, data: Vec<i64>) -> Chronology {
        let end = begin + data.len() as i32 - 1;
        Chronology::new(
            RecordMeta::new("chrono.fh", Vec::new(), begin, end, "1/100 mm", "CHR", data, None)
                .unwrap(),
        )
    }

    #[test]
    fn test_mean_full_range() {
        let c = chronology(1900, vec![2, 4, 6, 8]);
        assert_eq!(c.mean(1900, 1903), 5.0);
    }

    #[test]
    fn test_mean_partial_overlap() {
        let c = chronology(1900, vec![2, 4, 6, 8]);
        // Only 1902 and 1903 lie on the chronology's axis
        assert_eq!(c.mean(1902, 1950), 7.0);
        assert_eq!(c.mean(1850, 1900), 2.0);
    }

    #[test]
    fn test_empty_intersection_is_nan() {
        let c = chronology(1900, vec![2, 4, 6, 8]);
        assert!(c.mean(1800, 1850).is_nan());
        assert!(c.variance(2000, 2010).is_nan());
        assert!(c.mean(1903, 1901).is_nan());
    }

    #[test]
    fn test_sample_variance() {
        let c = chronology(1900, vec![2, 4, 4, 4, 5, 5, 7, 9]);
        // Sum of squared deviations is 32 over 8 values
        let v = c.variance(1900, 1907);
        assert!((v - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_variance_is_nan() {
        let c = chronology(1900, vec![3, 5]);
        assert!(c.variance(1901, 1901).is_nan());
    }

    #[test]
    fn test_window_slices() {
        let c = chronology(1900, vec![1, 2, 3, 4, 5]);
        assert_eq!(c.window(1901, 1903), &[2, 3, 4]);
        assert_eq!(c.window(1899, 1900), &[1]);
        assert!(c.window(1905, 1910).is_empty());
    }

    #[test]
    fn test_free_functions() {
        assert_eq!(mean(&[1, 2, 3]), 2.0);
        assert_eq!(mean(&[5, 6]), 5.5);
        assert!(mean(&[]).is_nan());
        assert_eq!(sample_variance(&[1, 3]), 2.0);
        assert!(sample_variance(&[4]).is_nan());
    }
}
