//! CLIP image encoder running on ONNX Runtime.
//!
//! Expects the vision tower of a CLIP model (e.g. ViT-B/16) exported to
//! ONNX with a `pixel_values` style `[1, 3, S, S]` input.

use super::{Embedding, ImageEmbedder};
use crate::core::imaging::{to_nchw, ChannelStats, FastDecoder, FastResizer};
use crate::core::runtime;
use crate::error::{EmbedError, ModelError};
use ort::session::Session;
use ort::value::Tensor;
use std::path::{Path, PathBuf};

/// Output preferred when the export carries several
const IMAGE_EMBEDS_OUTPUT: &str = "image_embeds";

/// Configuration for the CLIP encoder
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Square resolution images are resized to
    pub image_size: u32,
    pub mean: ChannelStats,
    pub std: ChannelStats,
    /// Scale embeddings to unit length
    pub normalize: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            image_size: 224,
            mean: [0.481_454_66, 0.457_827_5, 0.408_210_73],
            std: [0.268_629_54, 0.261_302_58, 0.275_777_11],
            normalize: true,
        }
    }
}

/// CLIP vision encoder
pub struct ClipEncoder {
    session: Session,
    input_name: String,
    output_name: String,
    config: EncoderConfig,
    resizer: FastResizer,
}

impl ClipEncoder {
    /// Load a CLIP vision ONNX export.
    ///
    /// Fails with [`ModelError::NotFound`] if the path is not a file.
    pub fn load(model_path: &Path, config: EncoderConfig) -> Result<Self, ModelError> {
        let session = runtime::load_session(model_path)?;
        let input_name = runtime::first_input_name(&session, model_path)?;

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name == IMAGE_EMBEDS_OUTPUT)
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .ok_or_else(|| ModelError::InvalidSignature {
                path: model_path.to_path_buf(),
                reason: "model declares no outputs".to_string(),
            })?;

        tracing::info!(
            model = %model_path.display(),
            output = %output_name,
            image_size = config.image_size,
            "encoder loaded"
        );

        Ok(Self {
            session,
            input_name,
            output_name,
            config,
            resizer: FastResizer::new(),
        })
    }
}

impl ImageEmbedder for ClipEncoder {
    fn embed(&mut self, image_path: &Path) -> Result<Embedding, EmbedError> {
        let image = FastDecoder::decode_rgb(image_path)?;
        let size = self.config.image_size;
        let resized = self
            .resizer
            .resize_rgb(&image, size, size)
            .ok_or_else(|| inference_error(image_path, "image has no pixels"))?;

        let (shape, data) = to_nchw(&resized, self.config.mean, self.config.std);
        let input = Tensor::from_array((shape, data))
            .map_err(|e| inference_error(image_path, &e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| inference_error(image_path, &e.to_string()))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| inference_error(image_path, "encoder output missing"))?;
        let (output_shape, values) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| inference_error(image_path, &e.to_string()))?;
        let dims: Vec<usize> = output_shape.iter().map(|&d| d as usize).collect();

        let mut embedding = pool(&dims, values);
        drop(outputs);

        if embedding.is_empty() {
            return Err(EmbedError::Empty {
                path: image_path.to_path_buf(),
            });
        }

        if self.config.normalize {
            l2_normalize(&mut embedding);
        }

        Ok(Embedding::new(embedding))
    }
}

/// Reduce an encoder output to one vector.
///
/// `[1, dim]` and `[dim]` are taken as-is; `[1, tokens, dim]` is mean-pooled
/// over tokens.
fn pool(dims: &[usize], values: &[f32]) -> Vec<f32> {
    match dims {
        [1, tokens, dim] if *tokens > 0 && values.len() >= tokens * dim => {
            let mut pooled = vec![0.0f32; *dim];
            for token in values.chunks_exact(*dim).take(*tokens) {
                for (acc, v) in pooled.iter_mut().zip(token) {
                    *acc += v;
                }
            }
            pooled.iter_mut().for_each(|v| *v /= *tokens as f32);
            pooled
        }
        _ => values.to_vec(),
    }
}

/// Scale to unit length; zero vectors are left untouched
fn l2_normalize(values: &mut [f32]) {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        values.iter_mut().for_each(|v| *v /= norm);
    }
}

fn inference_error(path: &Path, reason: &str) -> EmbedError {
    EmbedError::Inference {
        path: PathBuf::from(path),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_output_is_taken_as_is() {
        assert_eq!(pool(&[1, 3], &[1.0, 2.0, 3.0]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn token_output_is_mean_pooled() {
        let pooled = pool(&[1, 2, 3], &[1.0, 2.0, 3.0, 3.0, 4.0, 5.0]);
        assert_eq!(pooled, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn normalization_gives_unit_length() {
        let mut values = vec![3.0, 4.0];
        l2_normalize(&mut values);
        assert_eq!(values, vec![0.6, 0.8]);
    }

    #[test]
    fn zero_vector_is_not_normalized() {
        let mut values = vec![0.0, 0.0];
        l2_normalize(&mut values);
        assert_eq!(values, vec![0.0, 0.0]);
    }

    #[test]
    fn missing_model_reports_not_found() {
        let result = ClipEncoder::load(
            Path::new("/nonexistent/clip-vision.onnx"),
            EncoderConfig::default(),
        );
        assert!(matches!(result, Err(ModelError::NotFound { .. })));
    }

    #[test]
    #[ignore] // Needs models/clip-vision.onnx
    fn real_model_embeds_to_unit_length() {
        let model_path = Path::new("models/clip-vision.onnx");
        let mut encoder = ClipEncoder::load(model_path, EncoderConfig::default()).unwrap();

        let temp_dir = tempfile::TempDir::new().unwrap();
        let image_path = temp_dir.path().join("gradient.jpg");
        image::RgbImage::from_fn(256, 256, |x, y| image::Rgb([x as u8, y as u8, 128]))
            .save(&image_path)
            .unwrap();

        let embedding = encoder.embed(&image_path).unwrap();

        let norm: f32 = embedding.as_slice().iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }
}
