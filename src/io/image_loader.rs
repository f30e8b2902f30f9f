use crate::types::{DenoiseError, DenoiseResult, IntensityImage};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Synthetic test patterns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticPattern {
    /// Every pixel set to `level`
    Flat { level: f32 },
    /// Horizontal ramp from 0 to 1
    Gradient,
    /// Alternating 0.25 / 0.75 squares of side `cell`
    Checkerboard { cell: usize },
}

/// Where the reference image comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    File(PathBuf),
    Synthetic {
        pattern: SyntheticPattern,
        width: usize,
        height: usize,
    },
}

impl Default for ImageSource {
    fn default() -> Self {
        ImageSource::File(PathBuf::from("data/reference.png"))
    }
}

/// Decodes reference images to normalized grayscale grids
pub struct ImageLoader;

impl ImageLoader {
    /// Load `source` as a [0, 1] grayscale image
    pub fn load(source: &ImageSource) -> DenoiseResult<IntensityImage> {
        match source {
            ImageSource::File(path) => Self::load_file(path),
            ImageSource::Synthetic {
                pattern,
                width,
                height,
            } => synthesize(*pattern, *width, *height),
        }
    }

    /// Decode an image file, converting color images to luma
    pub fn load_file(path: &Path) -> DenoiseResult<IntensityImage> {
        log::info!("Loading reference image {}", path.display());

        if !path.exists() {
            return Err(DenoiseError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Image file not found: {}", path.display()),
            )));
        }

        let decoded = image::open(path)?;
        let luma = decoded.to_luma32f();
        let (width, height) = luma.dimensions();
        log::debug!("Decoded {}x{} {:?} image", width, height, decoded.color());

        let samples: Vec<f32> = luma.into_raw().into_iter().map(|v| v.clamp(0.0, 1.0)).collect();
        Array2::from_shape_vec((height as usize, width as usize), samples)
            .map_err(|e| DenoiseError::InvalidParameter(format!("Unexpected image layout: {}", e)))
    }
}

/// Generate a synthetic pattern of the given size
pub fn synthesize(
    pattern: SyntheticPattern,
    width: usize,
    height: usize,
) -> DenoiseResult<IntensityImage> {
    if width == 0 || height == 0 {
        return Err(DenoiseError::InvalidParameter(format!(
            "Synthetic image must be non-empty, got {}x{}",
            width, height
        )));
    }

    let image = match pattern {
        SyntheticPattern::Flat { level } => {
            if !(0.0..=1.0).contains(&level) {
                return Err(DenoiseError::InvalidParameter(format!(
                    "Flat level must be in [0, 1], got {}",
                    level
                )));
            }
            Array2::from_elem((height, width), level)
        }
        SyntheticPattern::Gradient => {
            let denom = (width.max(2) - 1) as f32;
            Array2::from_shape_fn((height, width), |(_, j)| j as f32 / denom)
        }
        SyntheticPattern::Checkerboard { cell } => {
            let cell = cell.max(1);
            Array2::from_shape_fn((height, width), |(i, j)| {
                if (i / cell + j / cell) % 2 == 0 {
                    0.25
                } else {
                    0.75
                }
            })
        }
    };

    log::info!("Synthesized {}x{} {:?} image", width, height, pattern);
    Ok(image)
}

/// Quantize to 8-bit luma for display or encoding
pub fn to_luma8(image: &IntensityImage) -> image::GrayImage {
    let (height, width) = image.dim();
    let bytes: Vec<u8> = image
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    image::GrayImage::from_raw(width as u32, height as u32, bytes)
        .unwrap_or_else(|| image::GrayImage::new(width as u32, height as u32))
}
