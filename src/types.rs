use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Normalized grayscale intensity sample in [0, 1]
pub type Intensity = f32;

/// 2D intensity image (row x col)
pub type IntensityImage = Array2<Intensity>;

/// Candidate methods compared in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Noisy input, no denoising applied
    Noisy,
    /// Adaptive local-statistics filter
    Traditional,
    /// Pretrained convolutional denoiser
    Ai,
}

impl Method {
    /// Report order: noisy baseline first, then the two denoisers.
    pub const REPORT_ORDER: [Method; 3] = [Method::Noisy, Method::Traditional, Method::Ai];
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Noisy => write!(f, "Noisy"),
            Method::Traditional => write!(f, "Traditional"),
            Method::Ai => write!(f, "AI"),
        }
    }
}

/// Quality metrics of one candidate against the reference image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPair {
    /// Peak signal-to-noise ratio in dB, `+inf` for identical images
    pub psnr: f64,
    /// Mean structural similarity in [-1, 1]
    pub ssim: f64,
}

/// The four images produced by one pipeline run
#[derive(Debug, Clone)]
pub struct ImageSet {
    pub original: IntensityImage,
    pub noisy: IntensityImage,
    pub traditional: IntensityImage,
    pub ai: IntensityImage,
}

impl ImageSet {
    /// Image produced by `method`
    pub fn candidate(&self, method: Method) -> &IntensityImage {
        match method {
            Method::Noisy => &self.noisy,
            Method::Traditional => &self.traditional,
            Method::Ai => &self.ai,
        }
    }

    /// Dimensions shared by all four images (height, width)
    pub fn dim(&self) -> (usize, usize) {
        self.original.dim()
    }
}

/// Error types for denoising and evaluation
#[derive(Debug, thiserror::Error)]
pub enum DenoiseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid window size: {0}")]
    InvalidWindow(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Pretrained model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report window error: {0}")]
    Viewer(String),
}

/// Result type for denoising operations
pub type DenoiseResult<T> = Result<T, DenoiseError>;

/// Fail with `ShapeMismatch` unless both images share dimensions.
pub fn ensure_same_shape(a: &IntensityImage, b: &IntensityImage) -> DenoiseResult<()> {
    if a.dim() != b.dim() {
        return Err(DenoiseError::ShapeMismatch {
            left: a.dim(),
            right: b.dim(),
        });
    }
    Ok(())
}
