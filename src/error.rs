use thiserror::Error;

/// Failures surfaced by `ClassificationCategorizer::classify`.
///
/// An unrecognized label is not an error; it is a successful result with
/// `Category::Unknown`.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// The input image failed structural validation. The backend was not called.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The prediction backend failed to load, run, or produced malformed output.
    #[error("prediction backend '{backend}' failed")]
    Backend {
        backend: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ClassifyError {
    pub fn is_invalid_image(&self) -> bool {
        matches!(self, ClassifyError::InvalidImage(_))
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, ClassifyError::Backend { .. })
    }
}
