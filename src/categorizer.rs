//! Classification → recyclability category.
//!
//! One call runs a fixed sequence: validate the image, ask the backend for
//! ranked predictions, take the top one, map its label through the rule set.
//! No retries and no state carried between calls.

use serde::Serialize;

use crate::category::{Category, CategoryRules};
use crate::classify::{Prediction, PredictionBackend};
use crate::error::ClassifyError;
use crate::frame::DecodedImage;

/// Outcome of one successful classification.
///
/// The category is always set. Label and confidence come from the winning
/// prediction, so they are either both present or both absent.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassificationResult {
    category: Category,
    prediction: Option<Prediction>,
}

impl ClassificationResult {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.prediction.as_ref().map(|p| p.label.as_str())
    }

    pub fn confidence(&self) -> Option<f32> {
        self.prediction.as_ref().map(|p| p.confidence)
    }
}

/// Runs an injected backend and maps its top label to a category.
///
/// The rule set is read-only after construction, so one categorizer can serve
/// concurrent callers when the backend is `Sync` (which `PredictionBackend`
/// requires).
pub struct ClassificationCategorizer<B> {
    backend: B,
    rules: CategoryRules,
}

impl<B: PredictionBackend> ClassificationCategorizer<B> {
    pub fn new(backend: B, rules: CategoryRules) -> Self {
        Self { backend, rules }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn rules(&self) -> &CategoryRules {
        &self.rules
    }

    /// Classify one image.
    ///
    /// Fails with `InvalidImage` before the backend is called when the image is
    /// structurally unusable, and with `Backend` when prediction fails or the
    /// top prediction has a confidence outside [0, 1]. Lower-ranked entries are
    /// not consumed and not checked. A label with no matching rule, or no
    /// prediction at all, yields `Category::Unknown`.
    pub fn classify(&self, image: &DecodedImage) -> Result<ClassificationResult, ClassifyError> {
        image.validate()?;

        let predictions =
            self.backend
                .predict(image.view())
                .map_err(|source| ClassifyError::Backend {
                    backend: self.backend.name(),
                    source,
                })?;

        let top = predictions.into_iter().next();
        if let Some(bad) = top.as_ref().filter(|p| !p.is_well_formed()) {
            return Err(ClassifyError::Backend {
                backend: self.backend.name(),
                source: anyhow::anyhow!(
                    "confidence {} for label '{}' is outside [0, 1]",
                    bad.confidence,
                    bad.label
                ),
            });
        }

        let category = top
            .as_ref()
            .map(|p| self.rules.lookup(&p.label))
            .unwrap_or(Category::Unknown);

        Ok(ClassificationResult {
            category,
            prediction: top,
        })
    }
}
