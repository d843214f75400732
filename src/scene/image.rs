use crate::Rgba8Image;
use itertools::iproduct;

/// Three-channel image with samples normalized to [0, 1].
///
/// Samples are stored channel-planar so that a basis image can be copied
/// straight into a transport matrix row.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearImage {
    width: u32,
    height: u32,
    channels: [Vec<f32>; 3],
}

impl LinearImage {
    pub fn from_rgba8(image: &Rgba8Image) -> Self {
        let len = image.width as usize * image.height as usize;
        let mut channels = [
            Vec::with_capacity(len),
            Vec::with_capacity(len),
            Vec::with_capacity(len),
        ];

        for pixel in image.pixels.chunks_exact(4) {
            for (channel, &byte) in channels.iter_mut().zip(pixel) {
                channel.push(f32::from(byte) / 255.0);
            }
        }

        Self {
            width: image.width,
            height: image.height,
            channels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel]
    }

    /// Halves both dimensions by averaging each 2x2 block.
    ///
    /// Dimensions must be even.
    pub fn downsample(&self) -> Self {
        let cols = self.width as usize;
        let half_cols = cols / 2;
        let half_rows = self.height as usize / 2;

        let mut channels = [
            vec![0.0; half_cols * half_rows],
            vec![0.0; half_cols * half_rows],
            vec![0.0; half_cols * half_rows],
        ];

        for (output, input) in channels.iter_mut().zip(&self.channels) {
            for (y, x) in iproduct!(0..half_rows, 0..half_cols) {
                let top = (2 * y) * cols + 2 * x;
                let bottom = top + cols;

                output[y * half_cols + x] =
                    (input[top] + input[top + 1] + input[bottom] + input[bottom + 1]) / 4.0;
            }
        }

        Self {
            width: half_cols as u32,
            height: half_rows as u32,
            channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_drops_alpha() {
        let image = Rgba8Image::new(1, 1, vec![255, 0, 51, 7]).unwrap();
        let linear = LinearImage::from_rgba8(&image);

        assert_eq!(linear.channel(0), &[1.0]);
        assert_eq!(linear.channel(1), &[0.0]);
        assert_eq!(linear.channel(2), &[0.2]);
    }

    #[test]
    fn downsample_averages_blocks() {
        let image = Rgba8Image::from_fn(4, 2, |x, y| {
            let value = if x < 2 { 0.0 } else { 1.0 };
            [value, y as f32, 1.0]
        });

        let half = LinearImage::from_rgba8(&image).downsample();

        assert_eq!((half.width(), half.height()), (2, 1));
        assert_eq!(half.channel(0), &[0.0, 1.0]);
        assert_eq!(half.channel(1), &[0.5, 0.5]);
        assert_eq!(half.channel(2), &[1.0, 1.0]);
    }
}
