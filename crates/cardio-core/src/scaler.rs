//! Min-max scaling for the custom logistic model.
//!
//! The bounds approximate the training set's min/max. They are not hard limits:
//! values outside a range map outside [0, 1] and are passed on unclamped.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingRange {
    pub min: f64,
    pub max: f64,
}

/// Inputs that have a scaling range. Ordinal and binary codes are not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scaled {
    Age,
    Height,
    Weight,
    ApHi,
    ApLo,
    Bmi,
    PulsePressure,
}

impl Scaled {
    pub const fn range(self) -> ScalingRange {
        let (min, max) = match self {
            Scaled::Age => (29.0, 65.0),
            Scaled::Height => (55.0, 250.0),
            Scaled::Weight => (10.0, 200.0),
            Scaled::ApHi => (60.0, 240.0),
            Scaled::ApLo => (30.0, 180.0),
            Scaled::Bmi => (10.0, 60.0),
            Scaled::PulsePressure => (10.0, 120.0),
        };
        ScalingRange { min, max }
    }
}

#[inline]
pub fn norm(value: f64, feature: Scaled) -> f64 {
    let r = feature.range();
    (value - r.min) / (r.max - r.min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_endpoints_and_midpoint() {
        assert_eq!(norm(29.0, Scaled::Age), 0.0);
        assert_eq!(norm(65.0, Scaled::Age), 1.0);
        assert_eq!(norm(47.0, Scaled::Age), 0.5);
    }

    #[test]
    fn out_of_range_is_not_clamped() {
        assert!(norm(20.0, Scaled::Age) < 0.0);
        assert!(norm(300.0, Scaled::ApHi) > 1.0);
        assert!((norm(130.0, Scaled::PulsePressure) - 120.0 / 110.0).abs() < 1e-12);
    }

    #[test]
    fn ranges_are_non_degenerate() {
        for f in [
            Scaled::Age,
            Scaled::Height,
            Scaled::Weight,
            Scaled::ApHi,
            Scaled::ApLo,
            Scaled::Bmi,
            Scaled::PulsePressure,
        ] {
            let r = f.range();
            assert!(r.max > r.min, "{f:?}");
        }
    }
}
