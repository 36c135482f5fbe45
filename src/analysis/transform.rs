//! Series transforms
//!
//! Both transforms attach a derived product to a series. Calling either
//! again replaces whatever product was there before.

use crate::analysis::stats::mean;
use crate::error::{TreeringError, TreeringResult};
use crate::record::{Chronology, Correction, Fitting, Product, Series, TreeringRecord};

impl Series {
    /// Apply a linear altitude correction: `data * factor + offset`
    pub fn altitude_correction(&mut self, factor: f64, offset: f64) {
        let data = self
            .data()
            .iter()
            .map(|&v| v as f64 * factor + offset)
            .collect();

        tracing::debug!(key = %self.key(), factor, offset, "Applied altitude correction");

        self.set_product(Product::Corrected(Correction {
            factor,
            offset,
            data,
        }));
    }

    /// Identity correction (factor 1, offset 0)
    pub fn altitude_correction_default(&mut self) {
        self.altitude_correction(1.0, 0.0);
    }

    /// Scale the series so its mean matches the chronology over the same years
    ///
    /// The series must lie strictly inside the chronology's year range: a
    /// series starting or ending on the chronology's first or last year is
    /// rejected.
    pub fn altitude_fitting(&mut self, chronology: &Chronology) -> TreeringResult<()> {
        check_fitting_preconditions(self, chronology)?;

        let fit_factor = chronology.mean(self.begin(), self.end()) / mean(self.data());
        let data = self.data().iter().map(|&v| v as f64 * fit_factor).collect();

        tracing::debug!(
            key = %self.key(),
            chronology = %chronology.key(),
            fit_factor,
            "Fitted series to chronology"
        );

        self.set_product(Product::Fitted(Fitting {
            fit_factor,
            chronology_key: chronology.key().to_string(),
            data,
        }));
        Ok(())
    }
}

fn check_fitting_preconditions(series: &Series, chronology: &Chronology) -> TreeringResult<()> {
    if series.unit() != chronology.unit() {
        return Err(TreeringError::Precondition(format!(
            "units do not match: series {} uses '{}', chronology {} uses '{}'",
            series.key(),
            series.unit(),
            chronology.key(),
            chronology.unit()
        )));
    }

    let (c_begin, c_end) = (chronology.begin(), chronology.end());
    if !(c_begin < series.begin() && series.begin() < c_end) {
        return Err(TreeringError::Precondition(format!(
            "begin date {} of series {} not inside chronology {} ({c_begin}-{c_end})",
            series.begin(),
            series.key(),
            chronology.key()
        )));
    }
    if !(c_begin < series.end() && series.end() < c_end) {
        return Err(TreeringError::Precondition(format!(
            "end date {} of series {} not inside chronology {} ({c_begin}-{c_end})",
            series.end(),
            series.key(),
            chronology.key()
        )));
    }
    if series.begin() >= series.end() {
        return Err(TreeringError::Precondition(format!(
            "series {} has begin {} not before end {}",
            series.key(),
            series.begin(),
            series.end()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ProductKind, RecordMeta};

    fn series(begin: i32, data: Vec<i64>, unit: &str) -> Series {
        let end = begin + data.len() as i32 - 1;
        Series::new(
            RecordMeta::new("specimen.fh", Vec::new(), begin, end, unit, "S01", data, None).unwrap(),
        )
    }

    fn chronology(begin: i32, end: i32, value: i64, unit: &str) -> Chronology {
        let data = vec![value; (end - begin + 1) as usize];
        Chronology::new(
            RecordMeta::new("chrono.fh", Vec::new(), begin, end, unit, "MASTER", data, None)
                .unwrap(),
        )
    }

    #[test]
    fn test_altitude_correction() {
        let mut s = series(1950, vec![10, 20, 30], "mm");
        s.altitude_correction(0.5, 2.0);

        match s.product() {
            Product::Corrected(c) => {
                assert_eq!(c.factor, 0.5);
                assert_eq!(c.offset, 2.0);
                assert_eq!(c.data, vec![7.0, 12.0, 17.0]);
            }
            other => panic!("expected corrected product, got {other:?}"),
        }
    }

    #[test]
    fn test_identity_correction() {
        let mut s = series(1950, vec![10, 20, 30], "mm");
        s.altitude_correction_default();
        assert_eq!(s.product().data(), Some(&[10.0, 20.0, 30.0][..]));
    }

    #[test]
    fn test_fitting_factor() {
        // Chronology mean over 1950-1960 is 10, series mean is 5
        let c = chronology(1900, 2000, 10, "mm");
        let mut s = series(1950, vec![4, 6, 5, 5, 4, 6, 5, 5, 4, 6, 5], "mm");
        s.altitude_fitting(&c).unwrap();

        match s.product() {
            Product::Fitted(f) => {
                assert_eq!(f.fit_factor, 2.0);
                assert_eq!(f.chronology_key, "MASTER");
                let expected: Vec<f64> = s.data().iter().map(|&v| v as f64 * 2.0).collect();
                assert_eq!(f.data, expected);
            }
            other => panic!("expected fitted product, got {other:?}"),
        }
    }

    #[test]
    fn test_fitting_rejects_boundary_begin() {
        let c = chronology(1900, 2000, 10, "mm");
        let mut s = series(1900, vec![5; 11], "mm");
        let err = s.altitude_fitting(&c).unwrap_err();
        assert!(matches!(err, TreeringError::Precondition(_)));
        assert!(s.product().is_none());
    }

    #[test]
    fn test_fitting_rejects_boundary_end() {
        let c = chronology(1900, 2000, 10, "mm");
        let mut s = series(1990, vec![5; 11], "mm");
        assert!(matches!(
            s.altitude_fitting(&c),
            Err(TreeringError::Precondition(_))
        ));
    }

    #[test]
    fn test_fitting_rejects_unit_mismatch() {
        let c = chronology(1900, 2000, 10, "1/100 mm");
        let mut s = series(1950, vec![5; 11], "1/1000 mm");
        let err = s.altitude_fitting(&c).unwrap_err();
        assert!(err.to_string().contains("units do not match"));
    }

    #[test]
    fn test_fitting_rejects_single_year_series() {
        let c = chronology(1900, 2000, 10, "mm");
        let mut s = series(1950, vec![5], "mm");
        assert!(matches!(
            s.altitude_fitting(&c),
            Err(TreeringError::Precondition(_))
        ));
    }

    #[test]
    fn test_last_transform_wins() {
        let c = chronology(1900, 2000, 10, "mm");
        let mut s = series(1950, vec![5; 11], "mm");

        s.altitude_fitting(&c).unwrap();
        assert_eq!(s.product().kind(), Some(ProductKind::Fitted));

        s.altitude_correction(1.1, 0.0);
        assert_eq!(s.product().kind(), Some(ProductKind::Corrected));

        s.altitude_fitting(&c).unwrap();
        assert_eq!(s.product().kind(), Some(ProductKind::Fitted));
    }
}
