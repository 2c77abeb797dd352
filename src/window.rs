//! Window functions applied to each block's samples before the DFT, and a
//! cache so the same window isn't recomputed for every block of a given
//! duration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    None,
    Hann,
    Hamming,
    FlatTop,
    Tukey,
}

impl WindowKind {
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Some(WindowKind::None),
            "hann" => Some(WindowKind::Hann),
            "hamming" => Some(WindowKind::Hamming),
            "flattop" => Some(WindowKind::FlatTop),
            "tukey" => Some(WindowKind::Tukey),
            _ => None,
        }
    }
}

/// Generates a window of length `n` for `kind`. `n == 1` returns `[1.0]`
/// to avoid division by zero in the periodic-window formulas below.
#[must_use]
pub fn generate(kind: WindowKind, n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let nm1 = (n - 1) as f64;
    match kind {
        WindowKind::None => vec![1.0; n],
        WindowKind::Hann => (0..n)
            .map(|i| (0.5 * (1.0 - (2.0 * PI * i as f64 / nm1).cos())) as f32)
            .collect(),
        WindowKind::Hamming => (0..n)
            .map(|i| (0.54 - 0.46 * (2.0 * PI * i as f64 / nm1).cos()) as f32)
            .collect(),
        WindowKind::FlatTop => {
            const A0: f64 = 0.215_578_95;
            const A1: f64 = 0.416_631_58;
            const A2: f64 = 0.277_263_16;
            const A3: f64 = 0.083_578_95;
            const A4: f64 = 0.006_947_37;
            (0..n)
                .map(|i| {
                    let phase = 2.0 * PI * i as f64 / nm1;
                    (A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos() - A3 * (3.0 * phase).cos()
                        + A4 * (4.0 * phase).cos()) as f32
                })
                .collect()
        }
        WindowKind::Tukey => {
            const ALPHA: f64 = 0.5;
            (0..n)
                .map(|i| {
                    let x = i as f64 / nm1;
                    let taper = ALPHA / 2.0;
                    let v = if x < taper {
                        0.5 * (1.0 + (PI * (x / taper - 1.0)).cos())
                    } else if x > 1.0 - taper {
                        0.5 * (1.0 + (PI * ((x - 1.0) / taper + 1.0)).cos())
                    } else {
                        1.0
                    };
                    v as f32
                })
                .collect()
        }
    }
}

/// Caches generated windows keyed by length, since many blocks in a
/// layout share the same duration (and therefore the same `N`).
#[derive(Default)]
pub struct WindowCache {
    kind: WindowKind,
    cache: HashMap<usize, Arc<Vec<f32>>>,
}

impl WindowCache {
    #[must_use]
    pub fn new(kind: WindowKind) -> Self {
        Self {
            kind,
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, n: usize) -> Arc<Vec<f32>> {
        self.cache
            .entry(n)
            .or_insert_with(|| Arc::new(generate(self.kind, n)))
            .clone()
    }
}

impl Default for WindowKind {
    fn default() -> Self {
        WindowKind::Hann
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_window_is_all_ones() {
        let w = generate(WindowKind::None, 16);
        assert!(w.iter().all(|&x| (x - 1.0).abs() < 1e-6));
    }

    #[test]
    fn hann_window_endpoints_are_near_zero() {
        let w = generate(WindowKind::Hann, 64);
        assert!(w[0].abs() < 1e-6);
        assert!((w[63]).abs() < 1e-6);
        let mid = w[32];
        assert!(mid > 0.9);
    }

    #[test]
    fn cache_reuses_same_length() {
        let mut cache = WindowCache::new(WindowKind::Hamming);
        let a = cache.get(128);
        let b = cache.get(128);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!(WindowKind::from_str("HANN"), Some(WindowKind::Hann));
        assert_eq!(WindowKind::from_str("bogus"), None);
    }
}
