//! denoise-compare: adaptive local-statistics filtering vs. a pretrained denoiser
//!
//! Loads a grayscale reference image, corrupts it with additive Gaussian noise,
//! denoises it with a local-statistics MMSE filter and with a pretrained
//! convolutional network, then scores all candidates with PSNR and SSIM.

pub mod types;
pub mod io;
pub mod core;
pub mod config;
pub mod pipeline;
#[cfg(feature = "viewer")]
pub mod viewer;

// Re-export main types and functions for easier access
pub use types::{
    DenoiseError, DenoiseResult, ImageSet, Intensity, IntensityImage, MetricPair, Method,
};

pub use crate::config::{NoiseVariancePolicy, PipelineConfig};
pub use crate::core::{AdaptiveFilter, Denoiser, IdentityDenoiser, Report};
pub use crate::io::{ImageLoader, ImageSource};
pub use crate::pipeline::{run, run_on_image, PipelineOutcome};
