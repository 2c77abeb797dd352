//! Small numeric helpers shared by the sync detector, extractor and normalizer.

/// Rounds `x` up to the nearest multiple of 4.
///
/// Byte offsets into 16-bit stereo sample data must land on a sample
/// boundary (4 bytes = one L+R frame), so every byte-range computation
/// in the sync detector and block extractor goes through this.
#[must_use]
pub fn round4(x: f64) -> i64 {
    let ceiled = x.ceil() as i64;
    let remainder = ceiled.rem_euclid(4);
    if remainder == 0 {
        ceiled
    } else {
        ceiled + (4 - remainder)
    }
}

/// Rounds `x` down to the nearest multiple of 4.
#[must_use]
pub fn round_down4(x: f64) -> i64 {
    let floored = x.floor() as i64;
    floored - floored.rem_euclid(4)
}

/// Rounds `x` to `precision` decimal digits, away from zero on ties.
///
/// `roundFloat(0, p) == 0` by construction (no sign to carry).
#[must_use]
pub fn round_float(x: f64, precision: i32) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    let scale = 10f64.powi(precision);
    x.signum() * (x.abs() * scale + 0.5).floor() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round4_is_multiple_of_four_and_within_range() {
        for x in 0..200 {
            let x = x as f64 * 0.37;
            let r = round4(x);
            assert_eq!(r.rem_euclid(4), 0);
            assert!(r as f64 - x >= 0.0);
            assert!(r as f64 - x < 4.0);
        }
    }

    #[test]
    fn round4_exact_multiple_stays_put() {
        assert_eq!(round4(8.0), 8);
        assert_eq!(round4(0.0), 0);
    }

    #[test]
    fn round_down4_is_multiple_of_four_and_within_range() {
        for x in 0..200 {
            let x = x as f64 * 0.37;
            let r = round_down4(x);
            assert_eq!(r.rem_euclid(4), 0);
            assert!(x - r as f64 >= 0.0);
            assert!(x - r as f64 < 4.0);
        }
    }

    #[test]
    fn round_float_basic() {
        assert_eq!(round_float(1.2345, 2), 1.23);
        assert_eq!(round_float(-1.2345, 2), -1.23);
        assert_eq!(round_float(0.0, 2), 0.0);
    }

    #[test]
    fn round_float_half_rounds_away_from_zero() {
        assert_eq!(round_float(1.005, 2), 1.01);
        assert_eq!(round_float(-1.005, 2), -1.01);
    }
}
