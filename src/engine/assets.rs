#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::{Error, Result};
use png::{BitDepth, ColorType, DecodingError, Transformations};
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Decoded 8-bit RGBA image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rgba8Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Rgba8Image {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if pixels.len() != width as usize * height as usize * 4 {
            return crate::error::precondition(format!(
                "{} bytes do not form a {}x{} RGBA image",
                pixels.len(),
                width,
                height
            ));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Checks that the pixel buffer matches the dimensions of the image
    /// decoded from `path`.
    pub fn check(&self, path: &Path) -> Result<()> {
        let expected = self.width as usize * self.height as usize * 4;

        if self.pixels.len() != expected {
            return Err(Error::Decode {
                path: path.to_owned(),
                code: "length",
                message: format!(
                    "{} bytes do not form a {}x{} RGBA image",
                    self.pixels.len(),
                    self.width,
                    self.height
                ),
            });
        }

        Ok(())
    }

    /// Creates an image from a per-pixel closure returning linear RGB values.
    ///
    /// Values are clamped to [0, 1] and quantized to 8 bits, alpha is opaque.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [f32; 3]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);

        for y in 0..height {
            for x in 0..width {
                for value in &f(x, y) {
                    pixels.push((value.max(0.0).min(1.0) * 255.0).round() as u8);
                }

                pixels.push(255);
            }
        }

        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Source of the images consumed while building scenes and environments.
///
/// Decoding and directory enumeration live behind this trait so that scenes
/// can be assembled from disk or from memory.
pub trait AssetSource: Sync {
    /// Counts the assets directly inside `folder` whose file name matches.
    fn count_matching(&self, folder: &Path, pattern: &Regex) -> Result<usize>;

    /// Decodes the asset at `path` into an RGBA8 image.
    fn decode(&self, path: &Path) -> Result<Rgba8Image>;
}

/// Reads PNG assets from the local file system.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSystem;

impl AssetSource for FileSystem {
    fn count_matching(&self, folder: &Path, pattern: &Regex) -> Result<usize> {
        let mut count = 0;

        for entry in std::fs::read_dir(folder)? {
            let entry = entry?;

            if !entry.file_type()?.is_file() {
                continue;
            }

            if let Some(name) = entry.file_name().to_str() {
                if pattern.is_match(name) {
                    count += 1;
                }
            }
        }

        Ok(count)
    }

    fn decode(&self, path: &Path) -> Result<Rgba8Image> {
        let file = File::open(path).map_err(|err| Error::Decode {
            path: path.to_owned(),
            code: "io",
            message: err.to_string(),
        })?;

        let mut decoder = png::Decoder::new(BufReader::new(file));
        decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);

        let mut reader = decoder.read_info().map_err(|err| decode_error(path, err))?;
        let mut buffer = vec![0u8; reader.output_buffer_size()];

        let info = reader
            .next_frame(&mut buffer)
            .map_err(|err| decode_error(path, err))?;

        buffer.truncate(info.buffer_size());

        let pixels = match info.color_type {
            ColorType::Rgba => buffer,
            ColorType::Rgb => buffer
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            ColorType::GrayscaleAlpha => buffer
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            ColorType::Grayscale => buffer.iter().flat_map(|&g| [g, g, g, 255]).collect(),
            ColorType::Indexed => {
                return Err(Error::Decode {
                    path: path.to_owned(),
                    code: "unsupported",
                    message: "indexed color was not expanded".to_owned(),
                })
            }
        };

        Rgba8Image::new(info.width, info.height, pixels)
    }
}

fn decode_error(path: &Path, err: DecodingError) -> Error {
    let code = match &err {
        DecodingError::IoError(_) => "io",
        DecodingError::Format(_) => "format",
        DecodingError::Parameter(_) => "parameter",
        #[allow(unreachable_patterns)]
        _ => "limits",
    };

    Error::Decode {
        path: path.to_owned(),
        code,
        message: err.to_string(),
    }
}

/// In-memory assets keyed by path.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssets {
    images: HashMap<PathBuf, Rgba8Image>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, image: Rgba8Image) {
        self.images.insert(path.into(), image);
    }

    pub fn remove(&mut self, path: impl AsRef<Path>) -> Option<Rgba8Image> {
        self.images.remove(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl AssetSource for MemoryAssets {
    fn count_matching(&self, folder: &Path, pattern: &Regex) -> Result<usize> {
        Ok(self
            .images
            .keys()
            .filter(|path| path.parent() == Some(folder))
            .filter_map(|path| path.file_name()?.to_str())
            .filter(|name| pattern.is_match(name))
            .count())
    }

    fn decode(&self, path: &Path) -> Result<Rgba8Image> {
        self.images.get(path).cloned().ok_or_else(|| Error::Decode {
            path: path.to_owned(),
            code: "missing",
            message: "no such asset".to_owned(),
        })
    }
}

/// Writes tightly packed 8-bit RGB pixels as a PNG file.
pub fn write_rgb_png(path: &Path, width: u32, height: u32, pixels: &[u8]) -> Result<()> {
    let encode_error = |message: String| Error::Encode {
        path: path.to_owned(),
        message,
    };

    let file = File::create(path)?;

    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|err| encode_error(err.to_string()))?;

    writer
        .write_image_data(pixels)
        .map_err(|err| encode_error(err.to_string()))?;

    debug!("wrote {}x{} frame to {}", width, height, path.display());

    Ok(())
}
