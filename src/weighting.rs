//! Maps a difference's closeness to the noise floor into a plotting
//! weight via one of seven curves, the steepest of which are regularized
//! incomplete beta functions.

/// Regularized incomplete beta function `I_x(a, b)`, via the standard
/// Lentz continued-fraction evaluation (Numerical Recipes §6.4).
#[must_use]
pub fn incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_beta = ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b);
    let front = (a * x.ln() + b * (1.0 - x).ln() - ln_beta).exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        front * continued_fraction(x, a, b) / a
    } else {
        1.0 - front * continued_fraction(1.0 - x, b, a) / b
    }
}

fn continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITER: u32 = 200;
    const EPS: f64 = 1e-12;
    const TINY: f64 = 1e-30;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m_f = m as f64;
        let m2 = 2.0 * m_f;

        let aa = m_f * (b - m_f) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m_f) * (qab + m_f) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }

    h
}

/// Lanczos approximation to `ln(Gamma(x))`.
fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFICIENTS: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        let pi = std::f64::consts::PI;
        (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let mut a = COEFFICIENTS[0];
        let t = x + G + 0.5;
        for (i, coeff) in COEFFICIENTS.iter().enumerate().skip(1) {
            a += coeff / (x + i as f64);
        }
        0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
    }
}

/// Maps `pError` (already clipped to `[0,1]` by the caller) to a weight
/// in `[0,1]` under `option` (spec.md §4.8).
#[must_use]
pub fn weight(p_error: f64, option: u8) -> f64 {
    let p = p_error.clamp(0.0, 1.0);
    match option {
        0 => 1.0,
        1 => p,
        2 => incomplete_beta(p, 8.0, 8.0),
        3 => incomplete_beta(p, 3.0, 1.0),
        4 => incomplete_beta(p, 5.0, 0.5),
        5 => incomplete_beta(p, 1.0, 3.0),
        6 => incomplete_beta(p, 0.5, 6.0),
        _ => 1.0,
    }
}

/// `pError = clip01((|floor| - |peakDb|) / |floor|)` (spec.md §4.8).
#[must_use]
pub fn p_error(floor_db: f64, peak_db: f64) -> f64 {
    if floor_db == 0.0 {
        return 0.0;
    }
    ((floor_db.abs() - peak_db.abs()) / floor_db.abs()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_0_is_constant_one() {
        assert_eq!(weight(0.0, 0), 1.0);
        assert_eq!(weight(0.3, 0), 1.0);
        assert_eq!(weight(1.0, 0), 1.0);
    }

    #[test]
    fn option_1_is_identity() {
        assert_eq!(weight(0.0, 1), 0.0);
        assert_eq!(weight(0.7, 1), 0.7);
        assert_eq!(weight(1.0, 1), 1.0);
    }

    #[test]
    fn boundary_values_hold_for_all_beta_options() {
        for option in 2..=6 {
            assert!(weight(0.0, option) < 1e-6, "option {option} at 0");
            assert!((weight(1.0, option) - 1.0).abs() < 1e-6, "option {option} at 1");
        }
    }

    #[test]
    fn weight_0_5_2_matches_symmetric_beta_midpoint() {
        // incbeta(8,8,0.5) = 0.5 exactly by symmetry of a == b.
        let w = weight(0.5, 2);
        assert!((w - 0.5).abs() < 1e-9, "got {w}");
    }

    #[test]
    fn p_error_clips_to_unit_range() {
        assert_eq!(p_error(-60.0, -60.0), 0.0);
        assert_eq!(p_error(-60.0, 0.0), 1.0);
        assert_eq!(p_error(0.0, -10.0), 0.0);
    }
}
