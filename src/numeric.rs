//! Floating point helpers: tolerant comparison (wrapping the `approx` crate) and the fixed
//! decimal rounding used for reported percentages.

use approx::AbsDiffEq;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Rounds `value` to `decimals` places after the point, halves away from zero.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

/// `count` as a percentage of `total`, unrounded. Zero when `total` is zero.
#[must_use]
pub fn share_percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 * 100.0 / total as f64
}

/// [`share_percent`] rounded to two decimals, as reported.
#[must_use]
pub fn percentage(count: usize, total: usize) -> f64 {
    round_to(share_percent(count, total), 2)
}

#[macro_export]
macro_rules! assert_almost_eq {
    ($a:expr, $b:expr, $prec:expr $(,)?) => {
        if !$crate::numeric::almost_eq($a, $b, $prec) {
            panic!(
                "assertion failed: `abs(left - right) < {:e}`, (left: `{}`, right: `{}`)",
                $prec, $a, $b
            );
        }
    };
}
pub use assert_almost_eq;
