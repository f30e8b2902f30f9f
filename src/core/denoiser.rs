use crate::types::{DenoiseError, DenoiseResult, IntensityImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image-to-image denoiser.
///
/// Implementations receive a normalized grayscale image and must return an
/// image of the same dimensions with values compatible with [0, 1].
pub trait Denoiser {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn denoise(&self, image: &IntensityImage) -> DenoiseResult<IntensityImage>;
}

/// What the model's output tensor represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelOutput {
    /// The denoised image itself
    Clean,
    /// The predicted noise, subtracted from the input (DnCNN-style)
    Residual,
}

/// Pretrained model location and interpretation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub output: ModelOutput,
    pub intra_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/dncnn_gray.onnx"),
            output: ModelOutput::Residual,
            intra_threads: 2,
        }
    }
}

/// Returns its input unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityDenoiser;

impl Denoiser for IdentityDenoiser {
    fn name(&self) -> &str {
        "identity"
    }

    fn denoise(&self, image: &IntensityImage) -> DenoiseResult<IntensityImage> {
        Ok(image.clone())
    }
}

/// Turn a raw model output buffer into an image shaped like `input`
pub fn decode_model_output(
    input: &IntensityImage,
    raw: &[f32],
    output: ModelOutput,
) -> DenoiseResult<IntensityImage> {
    let (height, width) = input.dim();
    if raw.len() != height * width {
        return Err(DenoiseError::Inference(format!(
            "Model returned {} values for a {}x{} image",
            raw.len(),
            height,
            width
        )));
    }

    let prediction = IntensityImage::from_shape_vec((height, width), raw.to_vec())
        .map_err(|e| DenoiseError::Inference(e.to_string()))?;

    let denoised = match output {
        ModelOutput::Clean => prediction,
        ModelOutput::Residual => input - &prediction,
    };

    Ok(denoised.mapv(|v| v.clamp(0.0, 1.0)))
}

// ONNX denoiser, behind the `onnx` feature

#[cfg(feature = "onnx")]
mod onnx {
    use super::{decode_model_output, Denoiser, ModelConfig, ModelOutput};
    use crate::types::{DenoiseError, DenoiseResult, IntensityImage};
    use ort::session::Session;
    use ort::value::Tensor;
    use std::sync::Mutex;

    /// Pretrained convolutional denoiser run through ONNX Runtime.
    ///
    /// The model takes a single `1x1xHxW` f32 tensor. `Session::run` needs
    /// `&mut self`, so the session sits behind a mutex.
    pub struct OnnxDenoiser {
        session: Mutex<Session>,
        output: ModelOutput,
        name: String,
    }

    impl OnnxDenoiser {
        pub fn load(config: &ModelConfig) -> DenoiseResult<Self> {
            if !config.path.exists() {
                return Err(DenoiseError::ModelUnavailable(format!(
                    "Model file not found: {}",
                    config.path.display()
                )));
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| DenoiseError::ModelUnavailable(e.to_string()))?
                .with_intra_threads(config.intra_threads)
                .map_err(|e: ort::Error| DenoiseError::ModelUnavailable(e.to_string()))?
                .commit_from_file(&config.path)
                .map_err(|e: ort::Error| {
                    DenoiseError::ModelUnavailable(format!("ONNX load failed: {e}"))
                })?;

            let name = config
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "onnx".to_string());

            log::info!("ONNX denoiser loaded from {}", config.path.display());

            Ok(Self {
                session: Mutex::new(session),
                output: config.output,
                name,
            })
        }
    }

    impl Denoiser for OnnxDenoiser {
        fn name(&self) -> &str {
            &self.name
        }

        fn denoise(&self, image: &IntensityImage) -> DenoiseResult<IntensityImage> {
            let (height, width) = image.dim();
            let data: Vec<f32> = image.iter().copied().collect();

            let input = Tensor::from_array(([1usize, 1, height, width], data))
                .map_err(|e| DenoiseError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| DenoiseError::Inference("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![input])
                .map_err(|e| DenoiseError::Inference(format!("ONNX inference failed: {e}")))?;

            let (shape, raw) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| DenoiseError::Inference(format!("Output extraction: {e}")))?;
            log::debug!("Model output shape: {:?}", shape);

            decode_model_output(image, raw, self.output)
        }
    }
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxDenoiser;

/// Load the pretrained denoiser described by `config`
#[cfg(feature = "onnx")]
pub fn load_pretrained(config: &ModelConfig) -> DenoiseResult<Box<dyn Denoiser>> {
    Ok(Box::new(OnnxDenoiser::load(config)?))
}

/// Load the pretrained denoiser described by `config`
#[cfg(not(feature = "onnx"))]
pub fn load_pretrained(config: &ModelConfig) -> DenoiseResult<Box<dyn Denoiser>> {
    Err(DenoiseError::ModelUnavailable(format!(
        "cannot load {}: built without the `onnx` feature",
        config.path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    #[test]
    fn test_identity_denoiser() {
        let image = Array2::from_shape_fn((4, 5), |(i, j)| (i * 5 + j) as f32 / 20.0);
        let out = IdentityDenoiser.denoise(&image).unwrap();
        assert_eq!(out, image);
        assert_eq!(IdentityDenoiser.name(), "identity");
    }

    #[test]
    fn test_decode_clean_output() {
        let input = Array2::from_elem((2, 2), 0.5f32);
        let out = decode_model_output(&input, &[0.1, 0.2, 1.5, -0.3], ModelOutput::Clean).unwrap();

        assert_abs_diff_eq!(out[[0, 0]], 0.1);
        assert_abs_diff_eq!(out[[0, 1]], 0.2);
        assert_abs_diff_eq!(out[[1, 0]], 1.0);
        assert_abs_diff_eq!(out[[1, 1]], 0.0);
    }

    #[test]
    fn test_decode_residual_output() {
        let input = Array2::from_elem((1, 3), 0.5f32);
        let out = decode_model_output(&input, &[0.1, -0.1, 0.0], ModelOutput::Residual).unwrap();

        assert_abs_diff_eq!(out[[0, 0]], 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(out[[0, 1]], 0.6, epsilon = 1e-6);
        assert_abs_diff_eq!(out[[0, 2]], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let input = Array2::from_elem((3, 3), 0.5f32);
        let err = decode_model_output(&input, &[0.0; 4], ModelOutput::Clean).unwrap_err();
        assert!(matches!(err, DenoiseError::Inference(_)));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_load_without_onnx_feature_is_unavailable() {
        let result = load_pretrained(&ModelConfig::default());
        assert!(matches!(result, Err(DenoiseError::ModelUnavailable(_))));
    }
}
