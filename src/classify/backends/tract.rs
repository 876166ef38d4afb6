#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use tract_onnx::prelude::*;

use crate::classify::backend::PredictionBackend;
use crate::classify::prediction::{rank_predictions, Prediction};
use crate::frame::ImageView;

const DEFAULT_TOP_K: usize = 5;

/// Tract-based backend for ONNX image classifiers.
///
/// Loads a local model and a newline-separated labels file (one label per
/// output index). Images are resized to the model input, scaled to [0, 1] and
/// fed as a 1x3xHxW tensor. Scores are passed through softmax unless the model
/// already emits probabilities (`with_softmax(false)`). No network I/O.
pub struct TractBackend {
    model: TypedRunnableModel<TypedModel>,
    labels: Vec<String>,
    width: u32,
    height: u32,
    apply_softmax: bool,
    top_k: usize,
}

impl TractBackend {
    /// Load an ONNX model and its labels from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>, L: AsRef<Path>>(
        model_path: P,
        labels_path: L,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("model input must be non-empty, got {}x{}", width, height));
        }

        let labels_path = labels_path.as_ref();
        let labels = load_labels(labels_path)?;

        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        log::info!(
            "TractBackend: loaded {} ({} labels, input {}x{})",
            model_path.display(),
            labels.len(),
            width,
            height
        );

        Ok(Self {
            model,
            labels,
            width,
            height,
            apply_softmax: true,
            top_k: DEFAULT_TOP_K,
        })
    }

    /// Convert raw logits to probabilities before ranking (default). Disable
    /// only for models whose output layer already is a softmax.
    pub fn with_softmax(mut self, apply_softmax: bool) -> Self {
        self.apply_softmax = apply_softmax;
        self
    }

    /// Override how many ranked predictions are returned.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    fn build_input(&self, image: ImageView<'_>) -> Result<Tensor> {
        let rgb = image
            .to_rgb_image()
            .ok_or_else(|| anyhow!("image view is not a well-formed RGB8 buffer"))?;
        let rgb = if rgb.dimensions() == (self.width, self.height) {
            rgb
        } else {
            imageops::resize(&rgb, self.width, self.height, FilterType::Triangle)
        };

        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, self.height as usize, self.width as usize),
            |(_, channel, y, x)| rgb.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
        );

        Ok(input.into_tensor())
    }

    fn extract_scores(&self, outputs: TVec<TValue>) -> Result<Vec<f32>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores: Vec<f32> = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .iter()
            .copied()
            .collect();

        Ok(scores)
    }
}

impl PredictionBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn predict(&self, image: ImageView<'_>) -> Result<Vec<Prediction>> {
        let input = self.build_input(image)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let scores = self.extract_scores(outputs)?;
        scores_to_predictions(&self.labels, scores, self.apply_softmax, self.top_k)
    }

    fn warm_up(&self) -> Result<()> {
        let blank = crate::frame::DecodedImage::from_rgb8(
            self.width,
            self.height,
            vec![0u8; self.width as usize * self.height as usize * 3],
        );
        self.predict(blank.view()).map(|_| ())
    }
}

/// Pair scores with labels by output index and rank them.
///
/// Without softmax every score must already be a probability; a raw logit
/// fails the call instead of leaking out as a confidence.
fn scores_to_predictions(
    labels: &[String],
    scores: Vec<f32>,
    apply_softmax: bool,
    top_k: usize,
) -> Result<Vec<Prediction>> {
    if scores.len() != labels.len() {
        return Err(anyhow!(
            "model produced {} scores but {} labels are configured",
            scores.len(),
            labels.len()
        ));
    }

    let confidences = if apply_softmax {
        softmax(&scores)
    } else {
        if let Some((idx, score)) = scores
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && (0.0..=1.0).contains(*s)))
        {
            return Err(anyhow!(
                "score {} for label '{}' is not a probability; enable apply_softmax for logit outputs",
                score,
                labels[idx]
            ));
        }
        scores
    };

    let predictions = labels
        .iter()
        .zip(confidences)
        .map(|(label, confidence)| Prediction::new(label.clone(), confidence))
        .collect();

    Ok(rank_predictions(predictions, top_k))
}

fn load_labels(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read labels file {}", path.display()))?;
    let labels = parse_labels(&raw);
    if labels.is_empty() {
        return Err(anyhow!("labels file {} is empty", path.display()));
    }
    Ok(labels)
}

/// One label per line; trailing blank lines are ignored.
fn parse_labels(raw: &str) -> Vec<String> {
    let mut labels: Vec<String> = raw.lines().map(|line| line.trim().to_string()).collect();
    while labels.last().is_some_and(|label| label.is_empty()) {
        labels.pop();
    }
    labels
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_keep_line_positions() {
        let labels = parse_labels("cardboard\n\nglass\nmetal\n\n");
        assert_eq!(labels, vec!["cardboard", "", "glass", "metal"]);
    }

    #[test]
    fn softmax_sums_to_one_and_preserves_order() {
        let probs = softmax(&[2.0, 1.0, 0.1]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }

    fn waste_labels() -> Vec<String> {
        ["cardboard", "glass", "metal", "paper", "plastic"]
            .iter()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn logit_scores_become_ranked_probabilities() {
        let logits = vec![-1.2, 0.3, 4.1, 2.5, -3.0];
        let predictions = scores_to_predictions(&waste_labels(), logits, true, 3).unwrap();

        let labels: Vec<&str> = predictions.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["metal", "paper", "glass"]);
        assert!(predictions.iter().all(|p| p.is_well_formed()));
        assert!(predictions[0].confidence > 0.7);
    }

    #[test]
    fn logit_scores_without_softmax_name_the_setting() {
        let logits = vec![-1.2, 0.3, 4.1, 2.5, -3.0];
        let err = scores_to_predictions(&waste_labels(), logits, false, 3).unwrap_err();
        assert!(err.to_string().contains("apply_softmax"));
    }

    #[test]
    fn probability_scores_pass_through_without_softmax() {
        let probs = vec![0.05, 0.1, 0.15, 0.2, 0.5];
        let predictions = scores_to_predictions(&waste_labels(), probs, false, 2).unwrap();
        assert_eq!(predictions[0], Prediction::new("plastic", 0.5));
        assert_eq!(predictions[1], Prediction::new("paper", 0.2));
    }

    #[test]
    fn score_count_must_match_labels() {
        let err = scores_to_predictions(&waste_labels(), vec![0.5, 0.5], true, 5).unwrap_err();
        assert!(err.to_string().contains("2 scores but 5 labels"));
    }

    #[test]
    fn missing_labels_file_fails_before_model_load() {
        let err = TractBackend::new("/nonexistent/model.onnx", "/nonexistent/labels.txt", 224, 224)
            .err()
            .expect("load must fail");
        assert!(err.to_string().contains("labels file"));
    }
}
