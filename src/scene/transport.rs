use crate::error::precondition;
use crate::Result;
use rayon::prelude::*;

pub const CHANNELS: usize = 3;

/// Per-channel light transport, indexed by `(channel, basis, pixel)`.
///
/// Row `(channel, basis)` holds the response of every pixel to basis term
/// `basis`. Once built the matrix is never modified.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportMatrix {
    width: u32,
    height: u32,
    basis_count: usize,
    data: Vec<f32>,
}

impl TransportMatrix {
    pub(crate) fn zeroed(width: u32, height: u32, basis_count: usize) -> Self {
        let pixel_count = width as usize * height as usize;

        Self {
            width,
            height,
            basis_count,
            data: vec![0.0; CHANNELS * basis_count * pixel_count],
        }
    }

    /// Wraps existing transport data laid out as `(channel, basis, pixel)`.
    pub fn from_data(width: u32, height: u32, basis_count: usize, data: Vec<f32>) -> Result<Self> {
        let expected = CHANNELS * basis_count * width as usize * height as usize;

        if data.len() != expected {
            return precondition(format!(
                "transport data has {} values, expected {}",
                data.len(),
                expected
            ));
        }

        Ok(Self {
            width,
            height,
            basis_count,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn basis_count(&self) -> usize {
        self.basis_count
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn get(&self, channel: usize, basis: usize, pixel: usize) -> f32 {
        self.row(channel, basis)[pixel]
    }

    pub fn row(&self, channel: usize, basis: usize) -> &[f32] {
        let start = (channel * self.basis_count + basis) * self.pixel_count();
        &self.data[start..start + self.pixel_count()]
    }

    pub(crate) fn row_mut(&mut self, channel: usize, basis: usize) -> &mut [f32] {
        let pixel_count = self.pixel_count();
        let start = (channel * self.basis_count + basis) * pixel_count;
        &mut self.data[start..start + pixel_count]
    }

    /// All rows of one channel, basis-major.
    pub fn channel(&self, channel: usize) -> &[f32] {
        let len = self.basis_count * self.pixel_count();
        &self.data[channel * len..(channel + 1) * len]
    }

    pub(crate) fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        let len = self.basis_count * self.pixel_count();
        &mut self.data[channel * len..(channel + 1) * len]
    }
}

/// Average transport of each basis term over all pixels, per channel.
#[derive(Clone, Debug, PartialEq)]
pub struct MeanResponse {
    channels: [Vec<f32>; CHANNELS],
}

impl MeanResponse {
    pub fn compute(transport: &TransportMatrix) -> Self {
        let pixel_count = transport.pixel_count().max(1);

        let mean = |channel: usize| -> Vec<f32> {
            transport
                .channel(channel)
                .par_chunks(pixel_count)
                .map(|row| {
                    let sum: f64 = row.iter().map(|&value| f64::from(value)).sum();
                    (sum / row.len() as f64) as f32
                })
                .collect()
        };

        Self {
            channels: [mean(0), mean(1), mean(2)],
        }
    }

    pub fn from_channels(channels: [Vec<f32>; CHANNELS]) -> Result<Self> {
        if channels.iter().any(|c| c.len() != channels[0].len()) {
            return precondition("mean response channels differ in length");
        }

        Ok(Self { channels })
    }

    pub fn basis_count(&self) -> usize {
        self.channels[0].len()
    }

    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> TransportMatrix {
        // 2 pixels, 2 basis terms: value = 10 * channel + 2 * basis + pixel
        let mut data = vec![];

        for channel in 0..CHANNELS {
            for basis in 0..2 {
                for pixel in 0..2 {
                    data.push((10 * channel + 2 * basis + pixel) as f32);
                }
            }
        }

        TransportMatrix::from_data(2, 1, 2, data).unwrap()
    }

    #[test]
    fn indexes_channel_basis_pixel() {
        let matrix = sample_matrix();

        assert_eq!(matrix.get(0, 0, 1), 1.0);
        assert_eq!(matrix.get(1, 1, 0), 12.0);
        assert_eq!(matrix.row(2, 1), &[22.0, 23.0]);
        assert_eq!(matrix.channel(1).len(), 4);
    }

    #[test]
    fn rejects_mismatched_data() {
        assert!(TransportMatrix::from_data(2, 2, 3, vec![0.0; 35]).is_err());
    }

    #[test]
    fn mean_response_averages_pixels() {
        let mean = MeanResponse::compute(&sample_matrix());

        assert_eq!(mean.basis_count(), 2);
        assert_eq!(mean.channel(0), &[0.5, 2.5]);
        assert_eq!(mean.channel(2), &[20.5, 22.5]);
    }

    #[test]
    fn mean_response_channels_must_agree() {
        assert!(MeanResponse::from_channels([vec![0.0; 2], vec![0.0; 2], vec![0.0; 3]]).is_err());
    }
}
