#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::error::precondition;
use crate::{
    AssetSource, Error, HaarLayout, LinearImage, MeanResponse, Result, Settings, TransportMatrix,
    CHANNELS,
};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

static BASIS_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{3,5}\.png$").unwrap());

/// Immutable precomputed state of a scene, shareable across frames.
#[derive(Clone, Debug)]
pub struct Scene {
    pub transport: Arc<TransportMatrix>,
    pub mean_response: Arc<MeanResponse>,
    /// Wavelet layout the transport was compressed with, `None` for texels.
    pub layout: Option<HaarLayout>,
}

impl Scene {
    /// Builds a scene from a transport matrix already expressed in `layout`.
    pub fn from_transport(transport: TransportMatrix, layout: Option<HaarLayout>) -> Self {
        let mean_response = MeanResponse::compute(&transport);

        Self {
            transport: Arc::new(transport),
            mean_response: Arc::new(mean_response),
            layout,
        }
    }

    /// Loads the basis images of `folder` and builds the scene transport.
    ///
    /// The folder must hold exactly one image per environment texel. Every
    /// image must decode and share the dimensions of the first one, else the
    /// build is aborted and nothing is returned.
    pub fn build(assets: &dyn AssetSource, folder: &Path, settings: &Settings) -> Result<Self> {
        let layout = settings.validate()?;
        let expected = settings.basis_count();

        let found = assets.count_matching(folder, &BASIS_IMAGE)?;

        if found != expected {
            return Err(Error::MissingBasis {
                folder: folder.to_owned(),
                found,
                expected,
            });
        }

        let digits = index_digits(found)?;
        let start = Instant::now();

        let mut transport: Option<TransportMatrix> = None;

        for index in 0..found {
            let path = folder.join(format!("{:0width$}.png", index, width = digits));
            let image = assets.decode(&path)?;
            image.check(&path)?;

            let matrix = transport
                .get_or_insert_with(|| TransportMatrix::zeroed(image.width, image.height, found));

            if (image.width, image.height) != (matrix.width(), matrix.height()) {
                return Err(Error::Dimensions {
                    path,
                    expected: (matrix.width(), matrix.height()),
                    found: (image.width, image.height),
                });
            }

            let image = LinearImage::from_rgba8(&image);

            for channel in 0..CHANNELS {
                matrix
                    .row_mut(channel, index)
                    .copy_from_slice(image.channel(channel));
            }
        }

        let mut transport = transport.ok_or_else(|| Error::MissingBasis {
            folder: folder.to_owned(),
            found: 0,
            expected,
        })?;

        info!(
            "loaded {} basis images of {}x{} in {:.2?}",
            found,
            transport.width(),
            transport.height(),
            start.elapsed()
        );

        if let Some(layout) = layout {
            compress(&mut transport, layout)?;
        }

        let scene = Self::from_transport(transport, layout);

        info!("built scene transport in {:.2?}", start.elapsed());

        Ok(scene)
    }
}

/// Projects every pixel's transport vector onto the wavelet basis.
pub fn compress(transport: &mut TransportMatrix, layout: HaarLayout) -> Result<()> {
    let basis_count = transport.basis_count();
    let pixel_count = transport.pixel_count();

    if layout.len() != basis_count {
        return precondition(format!(
            "layout of {} terms does not match {} basis images",
            layout.len(),
            basis_count
        ));
    }

    if pixel_count == 0 {
        return Ok(());
    }

    for channel in 0..CHANNELS {
        let start = Instant::now();
        let rows = transport.channel(channel);

        // gather each pixel's vector over all basis terms, pixel-major
        let mut vectors = vec![0.0f32; basis_count * pixel_count];

        vectors
            .par_chunks_mut(basis_count)
            .enumerate()
            .try_for_each(|(pixel, vector)| {
                for (basis, value) in vector.iter_mut().enumerate() {
                    *value = rows[basis * pixel_count + pixel];
                }

                layout.forward(vector)
            })?;

        transport
            .channel_mut(channel)
            .par_chunks_mut(pixel_count)
            .enumerate()
            .for_each(|(basis, row)| {
                for (pixel, value) in row.iter_mut().enumerate() {
                    *value = vectors[pixel * basis_count + basis];
                }
            });

        debug!(
            "compressed channel {} ({} pixels) in {:.2?}",
            channel,
            pixel_count,
            start.elapsed()
        );
    }

    Ok(())
}

/// Width of the zero-padded index in basis image file names.
pub fn index_digits(count: usize) -> Result<usize> {
    match count {
        0..=1_000 => Ok(3),
        1_001..=10_000 => Ok(4),
        10_001..=100_000 => Ok(5),
        _ => precondition(format!("{} basis images cannot be numbered", count)),
    }
}
