//! Error measures between relit frames.
//!
//! Used to quantify how far a truncated relighting is from the full sum.

use crate::error::precondition;
use crate::Result;

/// Mean squared error between two byte buffers of equal length.
///
/// Returns `0.0` for empty buffers.
pub fn mse(a: &[u8], b: &[u8]) -> Result<f64> {
    if a.len() != b.len() {
        return precondition(format!(
            "cannot compare {} bytes against {} bytes",
            a.len(),
            b.len()
        ));
    }

    if a.is_empty() {
        return Ok(0.0);
    }

    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let diff = f64::from(x) - f64::from(y);
            diff * diff
        })
        .sum();

    Ok(sum / a.len() as f64)
}

/// Peak signal-to-noise ratio in decibels, infinite for identical buffers.
pub fn psnr(a: &[u8], b: &[u8]) -> Result<f64> {
    let mse = mse(a, b)?;

    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }

    Ok(10.0 * (255.0 * 255.0 / mse).log10())
}
