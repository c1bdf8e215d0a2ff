//! Numeric helpers shared by the rate calculators.

/// Returns `part / whole * 100`, or 0 when `whole` is zero.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}

/// Clamps a percentage to `[0, 100]`. NaN maps to 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(50.0, 200.0), 25.0);
        assert_eq!(percent_of(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(-3.0), 0.0);
        assert_eq!(clamp_percent(101.5), 100.0);
        assert_eq!(clamp_percent(42.0), 42.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
    }
}
