//! Full-reference image quality metrics
//!
//! PSNR over the normalized samples and mean SSIM from `image_compare` on the
//! 8-bit quantized images.

use crate::io::image_loader::to_luma8;
use crate::types::{ensure_same_shape, DenoiseError, DenoiseResult, IntensityImage, MetricPair};
use image_compare::Algorithm;

/// Data range of normalized images
pub const UNIT_DATA_RANGE: f64 = 1.0;

/// Side of the SSIM windows used by `image_compare`
pub const SSIM_WINDOW: usize = 8;

/// Reject images too small to hold one full SSIM window
pub fn validate_dimensions(height: usize, width: usize) -> DenoiseResult<()> {
    if height < SSIM_WINDOW || width < SSIM_WINDOW {
        return Err(DenoiseError::InvalidParameter(format!(
            "Image size {}x{} is smaller than the SSIM window {}",
            height, width, SSIM_WINDOW
        )));
    }
    Ok(())
}

/// Mean squared pixel difference
pub fn mse(a: &IntensityImage, b: &IntensityImage) -> DenoiseResult<f64> {
    ensure_same_shape(a, b)?;
    if a.is_empty() {
        return Err(DenoiseError::InvalidParameter(
            "Cannot compare empty images".to_string(),
        ));
    }

    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum();

    Ok(sum / a.len() as f64)
}

/// Peak signal-to-noise ratio in dB; `+inf` when the images are identical
pub fn psnr(
    candidate: &IntensityImage,
    reference: &IntensityImage,
    data_range: f64,
) -> DenoiseResult<f64> {
    let error = mse(candidate, reference)?;
    if error == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (data_range * data_range / error).log10())
}

/// Mean structural similarity (`image_compare` MSSIM)
pub fn ssim(a: &IntensityImage, b: &IntensityImage) -> DenoiseResult<f64> {
    ensure_same_shape(a, b)?;
    let (height, width) = a.dim();
    validate_dimensions(height, width)?;

    let (first, second) = (to_luma8(a), to_luma8(b));
    let similarity =
        image_compare::gray_similarity_structure(&Algorithm::MSSIMSimple, &first, &second)
            .map_err(|e| DenoiseError::InvalidParameter(format!("SSIM failed: {}", e)))?;

    Ok(similarity.score)
}

/// PSNR and SSIM of `candidate` against `reference`
pub fn evaluate(
    candidate: &IntensityImage,
    reference: &IntensityImage,
) -> DenoiseResult<MetricPair> {
    let psnr = psnr(candidate, reference, UNIT_DATA_RANGE)?;
    let ssim = ssim(candidate, reference)?;
    log::debug!("Evaluated candidate: PSNR {:.4} dB, SSIM {:.4}", psnr, ssim);
    Ok(MetricPair { psnr, ssim })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    fn pattern(height: usize, width: usize) -> IntensityImage {
        Array2::from_shape_fn((height, width), |(i, j)| ((i * 3 + j * 5) % 11) as f32 / 10.0)
    }

    #[test]
    fn test_psnr_identical_is_infinite() {
        let image = pattern(8, 8);
        assert_eq!(psnr(&image, &image, 1.0).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_psnr_known_value() {
        let reference = Array2::from_elem((4, 4), 0.5f32);
        let candidate = Array2::from_elem((4, 4), 0.6f32);
        // MSE = 0.01 -> 20 dB
        assert_abs_diff_eq!(psnr(&candidate, &reference, 1.0).unwrap(), 20.0, epsilon = 1e-4);
    }

    #[test]
    fn test_mse_shape_mismatch() {
        let a = Array2::zeros((4, 4));
        let b = Array2::zeros((4, 5));
        let err = mse(&a, &b).unwrap_err();
        assert!(matches!(err, DenoiseError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_ssim_identical_is_one() {
        let image = pattern(16, 12);
        assert_abs_diff_eq!(ssim(&image, &image).unwrap(), 1.0, epsilon = 1e-6);

        let flat = Array2::from_elem((8, 8), 0.5f32);
        assert_abs_diff_eq!(ssim(&flat, &flat).unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ssim_drops_for_inverted_image() {
        let image = pattern(16, 16);
        let inverted = image.mapv(|v| 1.0 - v);
        let value = ssim(&image, &inverted).unwrap();
        assert!(value < 0.5, "inverted SSIM should be low, got {}", value);
        assert!(value >= -1.0);
    }

    #[test]
    fn test_ssim_rejects_small_images() {
        let image = pattern(6, 20);
        let err = ssim(&image, &image).unwrap_err();
        assert!(matches!(err, DenoiseError::InvalidParameter(_)));
        assert!(validate_dimensions(8, 8).is_ok());
        assert!(validate_dimensions(8, 7).is_err());
    }

    #[test]
    fn test_ssim_shape_mismatch() {
        let a = pattern(8, 8);
        let b = pattern(9, 8);
        let err = ssim(&a, &b).unwrap_err();
        assert!(matches!(err, DenoiseError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_evaluate_pairs_metrics() {
        let reference = pattern(16, 16);
        let candidate = reference.mapv(|v| (v + 0.02).min(1.0));
        let metrics = evaluate(&candidate, &reference).unwrap();

        assert!(metrics.psnr.is_finite() && metrics.psnr > 30.0);
        assert!(metrics.ssim > 0.9 && metrics.ssim <= 1.0);
    }
}
