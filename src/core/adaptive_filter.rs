use crate::core::local_stats::{local_moments, WindowMoments};
use crate::types::{DenoiseError, DenoiseResult, IntensityImage};
use ndarray::{Array2, Zip};

/// Floor on the local variance used as the gain denominator
pub const VARIANCE_EPSILON: f64 = 1e-10;

/// How the noise variance fed to the filter is obtained
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseVariance {
    /// Variance supplied by the caller
    Known(f32),
    /// Mean of all local variances
    MeanLocalVariance,
    /// Mean of the local variances at or below their median
    LowerHalfLocalVariance,
}

/// Adaptive filter parameters
#[derive(Debug, Clone)]
pub struct AdaptiveFilterParams {
    /// Filter window size (must be odd)
    pub window_size: usize,
    /// Noise variance policy
    pub noise_variance: NoiseVariance,
    /// Clamp the output to [0, 1]
    pub clamp_output: bool,
}

impl Default for AdaptiveFilterParams {
    fn default() -> Self {
        Self {
            window_size: 5,                                 // 5x5 window
            noise_variance: NoiseVariance::MeanLocalVariance,
            clamp_output: true,
        }
    }
}

/// Local-statistics MMSE filter.
///
/// Each pixel is pulled toward its window mean by the fraction of the local
/// variance attributed to noise:
///
/// ```text
/// out = mean + max(0, var_local - var_noise) / max(var_local, eps) * (p - mean)
/// ```
///
/// Windows are centred on the pixel and borders are replicated.
pub struct AdaptiveFilter {
    params: AdaptiveFilterParams,
}

impl AdaptiveFilter {
    /// Create a filter with default parameters
    pub fn new() -> Self {
        Self {
            params: AdaptiveFilterParams::default(),
        }
    }

    /// Create a filter with custom parameters
    pub fn with_params(params: AdaptiveFilterParams) -> Self {
        Self { params }
    }

    /// Check the window against an image of the given dimensions
    pub fn validate_window(&self, height: usize, width: usize) -> DenoiseResult<()> {
        let window = self.params.window_size;

        if window == 0 {
            return Err(DenoiseError::InvalidWindow(
                "Window size must be at least 1".to_string(),
            ));
        }

        if window % 2 == 0 {
            return Err(DenoiseError::InvalidWindow(format!(
                "Window size must be odd, got {}",
                window
            )));
        }

        if height < window || width < window {
            return Err(DenoiseError::InvalidWindow(format!(
                "Image size {}x{} is too small for window size {}",
                height, width, window
            )));
        }

        Ok(())
    }

    /// Apply the filter to `image`
    pub fn apply(&self, image: &IntensityImage) -> DenoiseResult<IntensityImage> {
        log::info!(
            "Applying adaptive local-statistics filter ({}x{} window)",
            self.params.window_size,
            self.params.window_size
        );
        log::debug!("Filter parameters: {:?}", self.params);

        let (height, width) = image.dim();
        self.validate_window(height, width)?;

        let samples = image.mapv(f64::from);
        let moments = local_moments(samples.view(), self.params.window_size);
        let noise_variance = self.resolve_noise_variance(&moments)?;
        log::info!("Noise variance used by filter: {:.6e}", noise_variance);

        let mut filtered = Array2::zeros((height, width));
        let clamp = self.params.clamp_output;

        let apply_gain = |out: &mut f32, &p: &f64, &mean: &f64, &variance: &f64| {
            let gain = (variance - noise_variance).max(0.0) / variance.max(VARIANCE_EPSILON);
            let value = mean + gain * (p - mean);
            let value = if clamp { value.clamp(0.0, 1.0) } else { value };
            *out = value as f32;
        };

        let zip = Zip::from(&mut filtered)
            .and(&samples)
            .and(&moments.mean)
            .and(&moments.variance);
        #[cfg(feature = "parallel")]
        zip.par_for_each(apply_gain);
        #[cfg(not(feature = "parallel"))]
        zip.for_each(apply_gain);

        log::info!("Adaptive filtering completed successfully");
        Ok(filtered)
    }

    fn resolve_noise_variance(&self, moments: &WindowMoments) -> DenoiseResult<f64> {
        match self.params.noise_variance {
            NoiseVariance::Known(value) => {
                if !value.is_finite() || value < 0.0 {
                    return Err(DenoiseError::InvalidParameter(format!(
                        "Noise variance must be finite and non-negative, got {}",
                        value
                    )));
                }
                Ok(f64::from(value))
            }
            NoiseVariance::MeanLocalVariance => Ok(estimate_mean_local_variance(&moments.variance)),
            NoiseVariance::LowerHalfLocalVariance => {
                Ok(estimate_lower_half_local_variance(&moments.variance))
            }
        }
    }
}

impl Default for AdaptiveFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean of all local variances
pub fn estimate_mean_local_variance(local_variance: &Array2<f64>) -> f64 {
    local_variance.mean().unwrap_or(0.0)
}

/// Mean of the local variances at or below the median
pub fn estimate_lower_half_local_variance(local_variance: &Array2<f64>) -> f64 {
    let mut values: Vec<f64> = local_variance.iter().copied().collect();
    if values.is_empty() {
        return 0.0;
    }

    let by_value = |a: &f64, b: &f64| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal);
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        values.par_sort_unstable_by(by_value);
    }
    #[cfg(not(feature = "parallel"))]
    values.sort_unstable_by(by_value);
    let median = values[(values.len() - 1) / 2];
    let lower: Vec<f64> = values.into_iter().take_while(|&v| v <= median).collect();

    lower.iter().sum::<f64>() / lower.len() as f64
}
