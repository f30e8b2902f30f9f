use crate::core::{AdaptiveFilterParams, ModelConfig, NoiseParams, NoiseVariance};
use crate::io::ImageSource;
use crate::types::{DenoiseError, DenoiseResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "DENOISE_COMPARE_CONFIG";

/// Noise variance handed to the adaptive filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseVariancePolicy {
    /// The variance used to synthesize the noise (`noise_sigma²`)
    Oracle,
    /// Mean of all local variances of the noisy image
    MeanLocal,
    /// Mean of the local variances at or below their median
    LowerHalfLocal,
    /// A fixed value
    Fixed(f32),
}

/// Comparison pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Reference image
    pub image: ImageSource,
    /// Standard deviation of the synthetic Gaussian noise
    pub noise_sigma: f32,
    /// Adaptive filter window (odd)
    pub window_size: usize,
    pub noise_variance: NoiseVariancePolicy,
    /// Noise RNG seed; entropy-seeded when absent
    pub seed: Option<u64>,
    /// Pretrained denoiser
    pub model: ModelConfig,
    /// Open the report window after printing the table
    pub show_window: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image: ImageSource::default(),
            noise_sigma: 0.1,
            window_size: 5,
            noise_variance: NoiseVariancePolicy::Oracle,
            seed: None,
            model: ModelConfig::default(),
            show_window: true,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> DenoiseResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            DenoiseError::Config(format!("{}: {}", path.display(), e))
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject values no stage can run with
    pub fn validate(&self) -> DenoiseResult<()> {
        if !self.noise_sigma.is_finite() || self.noise_sigma < 0.0 {
            return Err(DenoiseError::Config(format!(
                "noise_sigma must be finite and non-negative, got {}",
                self.noise_sigma
            )));
        }

        if self.window_size == 0 || self.window_size % 2 == 0 {
            return Err(DenoiseError::InvalidWindow(format!(
                "Window size must be odd and at least 1, got {}",
                self.window_size
            )));
        }

        if let NoiseVariancePolicy::Fixed(v) = self.noise_variance {
            if !v.is_finite() || v < 0.0 {
                return Err(DenoiseError::Config(format!(
                    "Fixed noise variance must be finite and non-negative, got {}",
                    v
                )));
            }
        }

        Ok(())
    }

    pub fn noise_params(&self) -> NoiseParams {
        NoiseParams {
            seed: self.seed,
            ..NoiseParams::with_sigma(self.noise_sigma)
        }
    }

    pub fn filter_params(&self) -> AdaptiveFilterParams {
        let noise_variance = match self.noise_variance {
            NoiseVariancePolicy::Oracle => {
                NoiseVariance::Known(self.noise_sigma * self.noise_sigma)
            }
            NoiseVariancePolicy::MeanLocal => NoiseVariance::MeanLocalVariance,
            NoiseVariancePolicy::LowerHalfLocal => NoiseVariance::LowerHalfLocalVariance,
            NoiseVariancePolicy::Fixed(v) => NoiseVariance::Known(v),
        };

        AdaptiveFilterParams {
            window_size: self.window_size,
            noise_variance,
            ..AdaptiveFilterParams::default()
        }
    }
}
