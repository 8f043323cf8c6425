//! Numeric bounds for constraint properties

use serde::{Deserialize, Serialize};

/// Inclusive bounds plus an editor step
///
/// Assigned values are clamped into `[min, max]`, never rejected. Bounds are
/// always ordered; deserialized bounds go through [`Constraint::new`] too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Bounds")]
pub struct Constraint {
    min: f64,
    max: f64,
    step: f64,
}

#[derive(Deserialize)]
struct Bounds {
    min: f64,
    max: f64,
    step: f64,
}

impl From<Bounds> for Constraint {
    fn from(b: Bounds) -> Self {
        Self::new(b.min, b.max, b.step)
    }
}

impl Constraint {
    /// Create bounds; `min` and `max` are swapped if given out of order
    ///
    /// A NaN bound leaves that side open.
    #[must_use]
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        let min = if min.is_nan() { f64::NEG_INFINITY } else { min };
        let max = if max.is_nan() { f64::INFINITY } else { max };
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { min, max, step }
    }

    #[inline]
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Percent range `0..=100`
    #[inline]
    #[must_use]
    pub fn percent() -> Self {
        Self::new(0.0, 100.0, 1.0)
    }

    /// Clamp a float into range
    #[inline]
    #[must_use]
    pub fn clamp_f64(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Clamp an integer into range
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn clamp_i64(&self, value: i64) -> i64 {
        let min = self.min.ceil() as i64;
        let max = self.max.floor() as i64;
        value.clamp(min, max.max(min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamps_integers() {
        let c = Constraint::new(0.0, 100.0, 1.0);
        assert_eq!(c.clamp_i64(500), 100);
        assert_eq!(c.clamp_i64(-500), 0);
        assert_eq!(c.clamp_i64(42), 42);
    }

    #[test]
    fn reversed_bounds_are_normalised() {
        let c = Constraint::new(10.0, -10.0, 1.0);
        assert_eq!(c.min, -10.0);
        assert_eq!(c.max, 10.0);
    }

    #[test]
    fn deserialized_bounds_are_normalised() {
        let c: Constraint =
            serde_json::from_str(r#"{"min": 100.0, "max": 0.0, "step": 1.0}"#).unwrap();
        assert_eq!((c.min(), c.max()), (0.0, 100.0));
        assert_eq!(c.clamp_f64(250.0), 100.0);
        assert_eq!(c.clamp_i64(-3), 0);
    }

    #[test]
    fn nan_bounds_stay_open() {
        let c = Constraint::new(f64::NAN, 5.0, 1.0);
        assert_eq!(c.clamp_f64(-1.0e9), -1.0e9);
        assert_eq!(c.clamp_f64(9.0), 5.0);
    }

    proptest! {
        #[test]
        fn clamped_float_stays_in_range(v in -1.0e9f64..1.0e9) {
            let c = Constraint::new(-5.0, 5.0, 0.5);
            let clamped = c.clamp_f64(v);
            prop_assert!((-5.0..=5.0).contains(&clamped));
        }
    }
}
