use std::sync::Arc;

use anyhow::Result;

use crate::frame::ImageView;

use super::prediction::Prediction;

/// Image classification backend.
///
/// Implementations return candidate labels ranked by descending confidence.
/// An empty list is a valid answer ("nothing recognized"); load or inference
/// failures are returned as errors.
///
/// Backends must treat the view as read-only and must not retain it past the
/// `predict` call.
pub trait PredictionBackend: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Classify one image.
    fn predict(&self, image: ImageView<'_>) -> Result<Vec<Prediction>>;

    /// Optional warm-up hook.
    fn warm_up(&self) -> Result<()> {
        Ok(())
    }
}

impl<B: PredictionBackend + ?Sized> PredictionBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn predict(&self, image: ImageView<'_>) -> Result<Vec<Prediction>> {
        (**self).predict(image)
    }

    fn warm_up(&self) -> Result<()> {
        (**self).warm_up()
    }
}

impl<B: PredictionBackend + ?Sized> PredictionBackend for Arc<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn predict(&self, image: ImageView<'_>) -> Result<Vec<Prediction>> {
        (**self).predict(image)
    }

    fn warm_up(&self) -> Result<()> {
        (**self).warm_up()
    }
}
