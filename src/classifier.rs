//! Paddy disease classifier: an opaque (label, confidence) scorer.
//!
//! The model itself is trained elsewhere; this layer consumes it through a
//! narrow trait. The real ONNX implementation lives behind the
//! `onnx-classifier` feature; when the model cannot be loaded at startup the
//! registry simply carries no scorer and every image-diagnosis request
//! answers with the "model unavailable" envelope.

use image::DynamicImage;

use crate::pipeline::types::DiagnosisResult;
use crate::pipeline::AssistantError;

/// The fixed closed label set the classifier was trained on.
pub const CLASS_NAMES: &[&str] = &[
    "bacterial_leaf_blight",
    "bacterial_leaf_streak",
    "bacterial_panicle_blight",
    "blast",
    "brown_spot",
    "dead_heart",
    "downy_mildew",
    "hispa",
    "normal",
    "tungro",
];

/// Opaque image scorer: one forward pass, one (label, confidence) pair.
///
/// A single pass is authoritative; callers never retry. `infer` is a
/// blocking call and runs on the blocking pool.
pub trait CropClassifier: Send + Sync {
    fn infer(&self, image: &DynamicImage) -> Result<DiagnosisResult, AssistantError>;
}

// ═══════════════════════════════════════════════════════════
// ONNX classifier, behind the `onnx-classifier` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-classifier")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use image::imageops::FilterType;
    use image::{DynamicImage, GenericImageView};
    use ort::session::Session;

    use super::{CropClassifier, CLASS_NAMES};
    use crate::pipeline::types::DiagnosisResult;
    use crate::pipeline::AssistantError;

    /// Shorter image side after the initial resize.
    const RESIZE_TO: u32 = 256;
    /// Square crop fed to the network.
    const CROP_TO: u32 = 224;
    /// ImageNet channel statistics the model was trained with.
    const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
    const STD: [f32; 3] = [0.229, 0.224, 0.225];

    /// Paddy disease classifier using ONNX Runtime.
    ///
    /// Uses interior mutability (Mutex) because ort::Session::run requires
    /// `&mut self` but the CropClassifier trait exposes `&self` for ergonomic
    /// shared usage.
    pub struct OnnxClassifier {
        session: Mutex<Session>,
    }

    impl OnnxClassifier {
        /// Load the classifier from `model_path` (a `.onnx` file).
        pub fn load(model_path: &Path) -> Result<Self, AssistantError> {
            if !model_path.exists() {
                return Err(AssistantError::BackendUnavailable("disease classifier"));
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| AssistantError::BackendCallFailed(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| AssistantError::BackendCallFailed(e.to_string()))?
                .commit_from_file(model_path)
                .map_err(|e: ort::Error| {
                    AssistantError::BackendCallFailed(format!("ONNX load failed: {e}"))
                })?;

            tracing::info!("Disease classifier loaded from {}", model_path.display());

            Ok(Self {
                session: Mutex::new(session),
            })
        }

        /// Resize (shorter side → 256), center crop 224, normalize to NCHW.
        fn preprocess(image: &DynamicImage) -> ndarray::Array4<f32> {
            let (w, h) = image.dimensions();
            let scale = RESIZE_TO as f32 / w.min(h) as f32;
            let (nw, nh) = (
                (w as f32 * scale).round() as u32,
                (h as f32 * scale).round() as u32,
            );
            let resized = image.resize_exact(nw.max(RESIZE_TO), nh.max(RESIZE_TO), FilterType::Triangle);

            let x = (resized.width() - CROP_TO) / 2;
            let y = (resized.height() - CROP_TO) / 2;
            let cropped = resized.crop_imm(x, y, CROP_TO, CROP_TO).to_rgb8();

            let mut tensor =
                ndarray::Array4::<f32>::zeros((1, 3, CROP_TO as usize, CROP_TO as usize));
            for (px, py, pixel) in cropped.enumerate_pixels() {
                for c in 0..3 {
                    let value = pixel.0[c] as f32 / 255.0;
                    tensor[[0, c, py as usize, px as usize]] = (value - MEAN[c]) / STD[c];
                }
            }
            tensor
        }
    }

    impl CropClassifier for OnnxClassifier {
        fn infer(&self, image: &DynamicImage) -> Result<DiagnosisResult, AssistantError> {
            use ort::value::TensorRef;

            let tensor = Self::preprocess(image);
            let input = TensorRef::from_array_view(&tensor)
                .map_err(|e| AssistantError::BackendCallFailed(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| AssistantError::BackendCallFailed("Session lock poisoned".into()))?;

            let outputs = session
                .run(ort::inputs![input])
                .map_err(|e| AssistantError::BackendCallFailed(format!("Inference failed: {e}")))?;

            let (shape, logits) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| AssistantError::BackendCallFailed(format!("Output extraction: {e}")))?;

            if shape.len() != 2 || shape[1] as usize != CLASS_NAMES.len() {
                return Err(AssistantError::BackendCallFailed(format!(
                    "Unexpected output shape: {shape:?}, expected [1, {}]",
                    CLASS_NAMES.len()
                )));
            }

            // Softmax over logits, then argmax.
            let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let exps: Vec<f32> = logits.iter().map(|l| (l - max_logit).exp()).collect();
            let sum: f32 = exps.iter().sum();

            let (best_idx, best_exp) = exps
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .ok_or_else(|| AssistantError::BackendCallFailed("Empty logits".into()))?;

            Ok(DiagnosisResult {
                label: CLASS_NAMES[best_idx].to_string(),
                confidence: best_exp / sum,
            })
        }
    }
}

#[cfg(feature = "onnx-classifier")]
pub use onnx::OnnxClassifier;

/// Fixed-result classifier for testing.
pub struct FixedClassifier {
    pub label: &'static str,
    pub confidence: f32,
}

impl CropClassifier for FixedClassifier {
    fn infer(&self, _image: &DynamicImage) -> Result<DiagnosisResult, AssistantError> {
        Ok(DiagnosisResult {
            label: self.label.to_string(),
            confidence: self.confidence,
        })
    }
}

/// Classifier that always fails, for exercising the FAILED path.
pub struct FailingClassifier;

impl CropClassifier for FailingClassifier {
    fn infer(&self, _image: &DynamicImage) -> Result<DiagnosisResult, AssistantError> {
        Err(AssistantError::BackendCallFailed(
            "simulated classifier failure".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names_has_ten_labels() {
        assert_eq!(CLASS_NAMES.len(), 10);
        assert!(CLASS_NAMES.contains(&"blast"));
        assert!(CLASS_NAMES.contains(&"normal"));
    }

    #[test]
    fn fixed_classifier_returns_configured_result() {
        let classifier = FixedClassifier {
            label: "blast",
            confidence: 0.92,
        };
        let image = DynamicImage::new_rgb8(8, 8);
        let result = classifier.infer(&image).unwrap();
        assert_eq!(result.label, "blast");
        assert!((result.confidence - 0.92).abs() < f32::EPSILON);
    }

    #[test]
    fn failing_classifier_is_backend_call_failed() {
        let image = DynamicImage::new_rgb8(8, 8);
        let err = FailingClassifier.infer(&image).unwrap_err();
        assert!(matches!(err, AssistantError::BackendCallFailed(_)));
    }
}
