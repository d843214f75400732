#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::error::precondition;
use crate::{AssetSource, Error, LinearImage, Result, Settings, CHANNELS};
use std::path::Path;

/// Incident radiance of every environment texel, per channel.
///
/// The faces are concatenated in face order and each face is stored row by
/// row, so the map can be seen as `faces * resolution` rows of `resolution`
/// texels each.
#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentMap {
    resolution: usize,
    faces: usize,
    channels: [Vec<f32>; CHANNELS],
}

impl EnvironmentMap {
    pub fn new(resolution: usize, faces: usize, channels: [Vec<f32>; CHANNELS]) -> Result<Self> {
        let len = faces * resolution * resolution;

        if len == 0 {
            return precondition("environment map is empty");
        }

        if channels.iter().any(|channel| channel.len() != len) {
            return precondition(format!(
                "environment channels must hold {} texels ({} faces of {}x{})",
                len, faces, resolution, resolution
            ));
        }

        Ok(Self {
            resolution,
            faces,
            channels,
        })
    }

    /// Loads the faces of environment `name` found under `root`.
    ///
    /// Face `i` is read from `root/name/name{i}.png` and box-filtered down to
    /// the configured resolution. Any failure aborts the whole load.
    pub fn load(
        assets: &dyn AssetSource,
        root: &Path,
        name: &str,
        settings: &Settings,
    ) -> Result<Self> {
        let resolution = settings.environment_resolution;

        if resolution == 0 || !resolution.is_power_of_two() {
            return precondition(format!(
                "environment resolution {} is not a power of two",
                resolution
            ));
        }

        let folder = root.join(name);
        let len = settings.faces * resolution * resolution;

        let mut channels = [
            Vec::with_capacity(len),
            Vec::with_capacity(len),
            Vec::with_capacity(len),
        ];

        for face in 0..settings.faces {
            let path = folder.join(format!("{}{}.png", name, face));
            let image = load_face(assets, &path, resolution)?;

            for (c, channel) in channels.iter_mut().enumerate() {
                channel.extend(image.channel(c).iter().map(|&value| value * settings.tint[c]));
            }
        }

        info!(
            "loaded environment '{}' ({} faces at {}x{})",
            name, settings.faces, resolution, resolution
        );

        Self::new(resolution, settings.faces, channels)
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn faces(&self) -> usize {
        self.faces
    }

    /// Number of texels per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of texel rows, which is also the rotation period.
    pub fn rows(&self) -> usize {
        self.faces * self.resolution
    }

    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel]
    }

    /// Cyclically rotates every channel by `rows` texel rows.
    ///
    /// Positive values move texels towards the end of the map and wrap them
    /// around to the start, negative values move them the other way.
    pub fn rotate(&mut self, rows: isize) {
        let period = self.rows() as isize;
        let shift = rows.rem_euclid(period) as usize * self.resolution;

        for channel in &mut self.channels {
            channel.rotate_right(shift);
        }
    }
}

fn load_face(assets: &dyn AssetSource, path: &Path, resolution: usize) -> Result<LinearImage> {
    let image = assets.decode(path)?;
    image.check(path)?;

    let side = image.width as usize;

    if image.width != image.height || !side.is_power_of_two() || side < resolution {
        return Err(Error::FaceSize {
            path: path.to_owned(),
            minimum: resolution as u32,
            found: (image.width, image.height),
        });
    }

    let mut face = LinearImage::from_rgba8(&image);

    while face.width() as usize > resolution {
        face = face.downsample();
    }

    debug!(
        "downsampled {} from {} to {}",
        path.display(),
        side,
        face.width()
    );

    Ok(face)
}
