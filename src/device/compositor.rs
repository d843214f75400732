#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::error::precondition;
use crate::{RankedCoefficients, Result, TransportMatrix, CHANNELS};
use rayon::prelude::*;
use std::time::Instant;

const PIXELS_PER_TASK: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderStatistics {
    pub frame_time_us: f32,
    /// Number of terms summed per channel.
    pub terms: usize,
    /// Largest accumulated value seen, used for exposure.
    pub maximum: f32,
}

/// Relit 8-bit RGB image.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub statistics: RenderStatistics,
}

/// Raw per-pixel sums of the selected lighting terms.
#[derive(Clone, Debug, PartialEq)]
pub struct Accumulation {
    pub values: Vec<[f32; CHANNELS]>,
    /// Number of terms summed per channel.
    pub terms: usize,
    /// Largest value any pixel reached while summing, including partial sums.
    pub maximum: f32,
}

impl Accumulation {
    /// Scale applied to every value before quantization.
    ///
    /// Frames whose maximum is at least one are divided by it, dimmer frames
    /// are multiplied by it instead. A frame without positive energy is black.
    pub fn exposure(&self) -> f32 {
        if self.maximum <= 0.0 {
            0.0
        } else if self.maximum >= 1.0 {
            255.0 / self.maximum
        } else {
            255.0 * self.maximum
        }
    }

    /// Converts the sums into tightly packed 8-bit RGB.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let scale = self.exposure();
        let mut pixels = vec![0u8; self.values.len() * CHANNELS];

        pixels
            .par_chunks_mut(CHANNELS)
            .zip(self.values.par_iter())
            .for_each(|(output, input)| {
                for (byte, &value) in output.iter_mut().zip(input) {
                    *byte = quantize(value * scale);
                }
            });

        pixels
    }
}

/// Sums `transport[channel][index][pixel] * value` over the first `top_k`
/// ranked terms of each channel, tracking the running maximum.
pub fn accumulate(
    transport: &TransportMatrix,
    ranked: &RankedCoefficients,
    top_k: usize,
) -> Result<Accumulation> {
    let basis_count = transport.basis_count();

    if ranked.iter().any(|list| list.len() != basis_count) {
        return precondition(format!(
            "ranked lists must hold {} coefficients",
            basis_count
        ));
    }

    let terms = top_k.min(basis_count);

    for list in ranked {
        if let Some(c) = list[..terms].iter().find(|c| c.index >= basis_count) {
            return precondition(format!("basis index {} out of range", c.index));
        }
    }

    let mut values = vec![[0.0f32; CHANNELS]; transport.pixel_count()];

    let maximum = values
        .par_chunks_mut(PIXELS_PER_TASK)
        .enumerate()
        .map(|(task, block)| {
            let offset = task * PIXELS_PER_TASK;
            let mut maximum = 0.0f32;

            for j in 0..terms {
                for (channel, list) in ranked.iter().enumerate() {
                    let term = list[j];
                    let row = &transport.row(channel, term.index)[offset..offset + block.len()];

                    for (pixel, &weight) in block.iter_mut().zip(row) {
                        pixel[channel] += weight * term.value;
                        maximum = maximum.max(pixel[channel]);
                    }
                }
            }

            maximum
        })
        .reduce(|| 0.0, f32::max);

    Ok(Accumulation {
        values,
        terms,
        maximum,
    })
}

/// Sums the first `top_k` ranked terms of each channel into a displayable frame.
pub fn composite(
    transport: &TransportMatrix,
    ranked: &RankedCoefficients,
    top_k: usize,
) -> Result<Frame> {
    let start = Instant::now();
    let accumulation = accumulate(transport, ranked, top_k)?;

    if accumulation.maximum <= 0.0 {
        warn!("no lighting term contributed any energy");
    }

    let pixels = accumulation.to_rgb8();

    let statistics = RenderStatistics {
        frame_time_us: start.elapsed().as_secs_f32() * 1e6,
        terms: accumulation.terms,
        maximum: accumulation.maximum,
    };

    debug!(
        "composited {} terms in {:.0} us (maximum {})",
        statistics.terms, statistics.frame_time_us, statistics.maximum
    );

    Ok(Frame {
        width: transport.width(),
        height: transport.height(),
        pixels,
        statistics,
    })
}

/// Clamps to [0, 255] and rounds half away from zero.
fn quantize(value: f32) -> u8 {
    value.max(0.0).min(255.0).round() as u8
}
