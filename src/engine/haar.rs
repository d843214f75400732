//! Orthonormal Haar wavelet transforms over power-of-two fields.
//!
//! Both transforms are the standard pyramid: each level splits the current
//! low-pass band into pairwise sums and differences scaled by `1/sqrt(2)`,
//! then recurses on the sums only. Since every level is orthonormal the sum
//! of squares of the field is preserved.

use crate::error::precondition;
use crate::Result;
use std::f32::consts::SQRT_2;

/// Shape of a power-of-two basis vector when seen as a wavelet field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaarLayout {
    /// Flat vector of the given length, transformed in 1D.
    Row(usize),
    /// Square field of the given side, transformed in 2D.
    Square(usize),
}

impl HaarLayout {
    /// Picks the layout for a vector of `len` elements.
    ///
    /// Lengths which form a power-of-two square use the 2D transform, other
    /// powers of two use the 1D transform. Anything else is rejected.
    pub fn for_len(len: usize) -> Result<Self> {
        if len == 0 || !len.is_power_of_two() {
            return precondition(format!("{} is not a power of two", len));
        }

        Ok(match square_side(len) {
            Some(side) => Self::Square(side),
            None => Self::Row(len),
        })
    }

    pub fn len(self) -> usize {
        match self {
            Self::Row(len) => len,
            Self::Square(side) => side * side,
        }
    }

    /// Transforms `field` in place into the wavelet domain.
    pub fn forward(self, field: &mut [f32]) -> Result<()> {
        match self {
            Self::Row(_) if field.len() != self.len() => {
                precondition(format!("expected {} elements, got {}", self.len(), field.len()))
            }
            Self::Row(_) => forward_haar_1d(field),
            Self::Square(side) => forward_haar_2d(field, side),
        }
    }
}

/// Returns the side of `len` when it is a square with a power-of-two side.
pub fn square_side(len: usize) -> Option<usize> {
    if !len.is_power_of_two() {
        return None;
    }

    let bits = len.trailing_zeros();

    if bits % 2 == 0 {
        Some(1 << (bits / 2))
    } else {
        None
    }
}

/// Forward 1D Haar transform of a power-of-two length vector.
pub fn forward_haar_1d(field: &mut [f32]) -> Result<()> {
    if field.is_empty() || !field.len().is_power_of_two() {
        return precondition(format!("length {} is not a power of two", field.len()));
    }

    let mut width = field.len();

    while width > 1 {
        let mut scratch = vec![0.0; width];
        haar_step(field, 0, 1, width, &mut scratch);
        width /= 2;
    }

    Ok(())
}

/// Forward 2D Haar transform of a `resolution` by `resolution` row-major field.
pub fn forward_haar_2d(field: &mut [f32], resolution: usize) -> Result<()> {
    if resolution == 0 || !resolution.is_power_of_two() {
        return precondition(format!("resolution {} is not a power of two", resolution));
    }

    if field.len() != resolution * resolution {
        return precondition(format!(
            "field of {} elements is not {}x{}",
            field.len(),
            resolution,
            resolution
        ));
    }

    let mut width = resolution;

    while width > 1 {
        let mut scratch = vec![0.0; width];

        for row in 0..width {
            haar_step(field, row * resolution, 1, width, &mut scratch);
        }

        for col in 0..width {
            haar_step(field, col, resolution, width, &mut scratch);
        }

        width /= 2;
    }

    Ok(())
}

// one level over `width` elements starting at `offset`, `stride` apart
fn haar_step(field: &mut [f32], offset: usize, stride: usize, width: usize, scratch: &mut [f32]) {
    let half = width / 2;

    for i in 0..half {
        let a = field[offset + 2 * i * stride];
        let b = field[offset + (2 * i + 1) * stride];

        scratch[i] = (a + b) / SQRT_2;
        scratch[half + i] = (a - b) / SQRT_2;
    }

    for (i, &value) in scratch[..width].iter().enumerate() {
        field[offset + i * stride] = value;
    }
}
