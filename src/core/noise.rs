use crate::types::{DenoiseError, DenoiseResult, IntensityImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Additive Gaussian noise parameters
#[derive(Debug, Clone)]
pub struct NoiseParams {
    /// Noise mean
    pub mean: f32,
    /// Noise standard deviation
    pub sigma: f32,
    /// Clip the noisy image to [0, 1]
    pub clip: bool,
    /// RNG seed, entropy-seeded when `None`
    pub seed: Option<u64>,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            mean: 0.0,
            sigma: 0.1,
            clip: true,
            seed: None,
        }
    }
}

impl NoiseParams {
    /// Zero-mean, clipped noise with the given standard deviation
    pub fn with_sigma(sigma: f32) -> Self {
        Self {
            sigma,
            ..Self::default()
        }
    }
}

/// Add independent per-pixel Gaussian noise to `image`
pub fn add_gaussian_noise(
    image: &IntensityImage,
    params: &NoiseParams,
) -> DenoiseResult<IntensityImage> {
    if !params.sigma.is_finite() || params.sigma < 0.0 {
        return Err(DenoiseError::InvalidParameter(format!(
            "Noise sigma must be finite and non-negative, got {}",
            params.sigma
        )));
    }
    if !params.mean.is_finite() {
        return Err(DenoiseError::InvalidParameter(format!(
            "Noise mean must be finite, got {}",
            params.mean
        )));
    }

    log::info!(
        "Adding Gaussian noise (mean {}, sigma {}, clip {})",
        params.mean,
        params.sigma,
        params.clip
    );

    if params.sigma == 0.0 && params.mean == 0.0 {
        return Ok(image.clone());
    }

    let normal = Normal::new(params.mean, params.sigma)
        .map_err(|e| DenoiseError::InvalidParameter(format!("Invalid noise distribution: {}", e)))?;

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let noisy = image.mapv(|p| {
        let value = p + normal.sample(&mut rng);
        if params.clip {
            value.clamp(0.0, 1.0)
        } else {
            value
        }
    });

    Ok(noisy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    #[test]
    fn test_zero_sigma_is_identity() {
        let image = Array2::from_shape_fn((5, 7), |(i, j)| (i + j) as f32 / 12.0);
        let noisy = add_gaussian_noise(&image, &NoiseParams::with_sigma(0.0)).unwrap();
        assert_eq!(noisy, image);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let image = Array2::from_elem((16, 16), 0.5f32);
        let params = NoiseParams {
            seed: Some(7),
            ..NoiseParams::with_sigma(0.1)
        };

        let a = add_gaussian_noise(&image, &params).unwrap();
        let b = add_gaussian_noise(&image, &params).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, image);
    }

    #[test]
    fn test_clipped_to_unit_range() {
        let image = Array2::from_shape_fn((32, 32), |(i, _)| if i % 2 == 0 { 0.0 } else { 1.0 });
        let params = NoiseParams {
            seed: Some(3),
            ..NoiseParams::with_sigma(0.5)
        };

        let noisy = add_gaussian_noise(&image, &params).unwrap();
        assert!(noisy.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_noise_statistics_roughly_match() {
        let image = Array2::from_elem((128, 128), 0.5f32);
        let params = NoiseParams {
            seed: Some(11),
            clip: false,
            ..NoiseParams::with_sigma(0.05)
        };

        let noisy = add_gaussian_noise(&image, &params).unwrap();
        let diff = &noisy - &image;
        let mean = diff.mean().unwrap();
        let var = diff.mapv(|d| (d - mean) * (d - mean)).mean().unwrap();

        assert_abs_diff_eq!(mean, 0.0, epsilon = 0.005);
        assert_abs_diff_eq!(var.sqrt(), 0.05, epsilon = 0.005);
    }

    #[test]
    fn test_negative_sigma_rejected() {
        let image = Array2::from_elem((4, 4), 0.5f32);
        let err = add_gaussian_noise(&image, &NoiseParams::with_sigma(-0.1)).unwrap_err();
        assert!(matches!(err, DenoiseError::InvalidParameter(_)));
    }
}
