use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};

use crate::classify::backend::PredictionBackend;
use crate::classify::prediction::Prediction;
use crate::frame::ImageView;

enum StubOutcome {
    Predictions(Vec<Prediction>),
    Failure(String),
}

/// Stub backend for testing and dry runs.
///
/// Answers every call with the same prediction list (or the same failure)
/// and counts how often it was invoked.
pub struct StubBackend {
    outcome: StubOutcome,
    calls: AtomicUsize,
}

impl StubBackend {
    /// Always answer with `predictions`, in the given order.
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self {
            outcome: StubOutcome::Predictions(predictions),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answer with an empty prediction list.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: StubOutcome::Failure(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `predict` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::empty()
    }
}

impl PredictionBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn predict(&self, _image: ImageView<'_>) -> Result<Vec<Prediction>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            StubOutcome::Predictions(predictions) => Ok(predictions.clone()),
            StubOutcome::Failure(message) => Err(anyhow!("{}", message)),
        }
    }
}
