//! Denoising, evaluation and reporting stages

pub mod local_stats;
pub mod noise;
pub mod adaptive_filter;
pub mod denoiser;
pub mod metrics;
pub mod report;

// Re-export main types
pub use noise::{add_gaussian_noise, NoiseParams};
pub use adaptive_filter::{AdaptiveFilter, AdaptiveFilterParams, NoiseVariance};
pub use denoiser::{load_pretrained, Denoiser, IdentityDenoiser, ModelConfig, ModelOutput};
#[cfg(feature = "onnx")]
pub use denoiser::OnnxDenoiser;
pub use metrics::{evaluate, mse, psnr, ssim, validate_dimensions};
pub use report::{BarSeries, Report, ReportEntry};
