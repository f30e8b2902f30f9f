//! Single-pass comparison pipeline
//!
//! load -> add noise -> {adaptive filter, pretrained denoiser} -> metrics -> report.
//! Every stage takes its inputs by reference and returns a new image.

use crate::config::PipelineConfig;
use crate::core::metrics::validate_dimensions;
use crate::core::{add_gaussian_noise, AdaptiveFilter, Denoiser, NoiseParams, Report};
use crate::io::ImageLoader;
use crate::types::{ensure_same_shape, DenoiseResult, ImageSet, IntensityImage};
use std::time::Instant;

/// Images and metrics of one run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub images: ImageSet,
    pub report: Report,
}

/// Corrupt the reference with Gaussian noise
pub fn synthesize_noise(
    original: &IntensityImage,
    params: &NoiseParams,
) -> DenoiseResult<IntensityImage> {
    add_gaussian_noise(original, params)
}

/// Run the adaptive local-statistics filter
pub fn denoise_traditional(
    noisy: &IntensityImage,
    filter: &AdaptiveFilter,
) -> DenoiseResult<IntensityImage> {
    let start = Instant::now();
    let filtered = filter.apply(noisy)?;
    log::info!("Traditional filter took {:.3} s", start.elapsed().as_secs_f64());
    Ok(filtered)
}

/// Run the pretrained denoiser and check it preserved the shape
pub fn denoise_ai(
    noisy: &IntensityImage,
    denoiser: &dyn Denoiser,
) -> DenoiseResult<IntensityImage> {
    log::info!("Running pretrained denoiser '{}'", denoiser.name());
    let start = Instant::now();
    let denoised = denoiser.denoise(noisy)?;
    ensure_same_shape(noisy, &denoised)?;
    log::info!("Pretrained denoiser took {:.3} s", start.elapsed().as_secs_f64());
    Ok(denoised)
}

/// Run every stage on an already loaded reference image
pub fn run_on_image(
    original: IntensityImage,
    config: &PipelineConfig,
    denoiser: &dyn Denoiser,
) -> DenoiseResult<PipelineOutcome> {
    config.validate()?;

    let (height, width) = original.dim();
    let filter = AdaptiveFilter::with_params(config.filter_params());
    filter.validate_window(height, width)?;
    validate_dimensions(height, width)?;

    let noisy = synthesize_noise(&original, &config.noise_params())?;
    let traditional = denoise_traditional(&noisy, &filter)?;
    let ai = denoise_ai(&noisy, denoiser)?;

    let images = ImageSet {
        original,
        noisy,
        traditional,
        ai,
    };
    let report = Report::from_images(&images)?;

    Ok(PipelineOutcome { images, report })
}

/// Load the configured reference image and run every stage
pub fn run(config: &PipelineConfig, denoiser: &dyn Denoiser) -> DenoiseResult<PipelineOutcome> {
    config.validate()?;
    let original = ImageLoader::load(&config.image)?;
    let (height, width) = original.dim();
    log::info!("Reference image: {}x{}", width, height);
    run_on_image(original, config, denoiser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IdentityDenoiser;
    use crate::types::{DenoiseError, Method};
    use ndarray::Array2;
    use std::cell::Cell;

    struct CroppingDenoiser;

    #[derive(Default)]
    struct CountingDenoiser {
        calls: Cell<usize>,
    }

    impl Denoiser for CountingDenoiser {
        fn name(&self) -> &str {
            "counting"
        }

        fn denoise(&self, image: &IntensityImage) -> DenoiseResult<IntensityImage> {
            self.calls.set(self.calls.get() + 1);
            Ok(image.clone())
        }
    }

    impl Denoiser for CroppingDenoiser {
        fn name(&self) -> &str {
            "cropping"
        }

        fn denoise(&self, image: &IntensityImage) -> DenoiseResult<IntensityImage> {
            let (h, w) = image.dim();
            Ok(Array2::zeros((h - 1, w)))
        }
    }

    #[test]
    fn test_run_on_image_orders_report() {
        let original = Array2::from_shape_fn((16, 16), |(i, j)| ((i + j) % 5) as f32 / 4.0);
        let config = PipelineConfig {
            seed: Some(1),
            ..PipelineConfig::default()
        };

        let outcome = run_on_image(original, &config, &IdentityDenoiser).unwrap();
        let methods: Vec<Method> = outcome.report.entries().iter().map(|e| e.method).collect();
        assert_eq!(methods, Method::REPORT_ORDER.to_vec());
        assert_eq!(outcome.images.dim(), (16, 16));
        assert_eq!(outcome.images.ai, outcome.images.noisy);
    }

    #[test]
    fn test_shape_changing_denoiser_rejected() {
        let original = Array2::from_elem((10, 10), 0.5f32);
        let err =
            run_on_image(original, &PipelineConfig::default(), &CroppingDenoiser).unwrap_err();
        assert!(matches!(err, DenoiseError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_window_validated_before_noise() {
        let original = Array2::from_elem((3, 3), 0.5f32);
        let err =
            run_on_image(original, &PipelineConfig::default(), &IdentityDenoiser).unwrap_err();
        assert!(matches!(err, DenoiseError::InvalidWindow(_)));
    }

    #[test]
    fn test_image_below_ssim_window_rejected_before_denoising() {
        // Passes the 5x5 filter window but cannot hold an 8x8 SSIM window
        let original = Array2::from_elem((6, 6), 0.5f32);
        let denoiser = CountingDenoiser::default();
        let config = PipelineConfig {
            seed: Some(5),
            ..PipelineConfig::default()
        };

        let err = run_on_image(original, &config, &denoiser).unwrap_err();
        assert!(matches!(err, DenoiseError::InvalidParameter(_)));
        assert_eq!(denoiser.calls.get(), 0);
    }

    #[test]
    fn test_denoiser_called_once_per_run() {
        let original = Array2::from_elem((8, 8), 0.5f32);
        let denoiser = CountingDenoiser::default();

        run_on_image(original, &PipelineConfig::default(), &denoiser).unwrap();
        assert_eq!(denoiser.calls.get(), 1);
    }
}
