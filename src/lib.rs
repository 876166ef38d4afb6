//! waste-sort
//!
//! Classifies a photo of a waste item with a pluggable image classifier and
//! maps the top label to a recyclability category.
//!
//! # Architecture
//!
//! The crate keeps one invariant between its layers: a classification either
//! fails with a typed error or yields a category. An unrecognized label is a
//! successful `Category::Unknown`, never an error.
//!
//! # Module Structure
//!
//! - `frame`: Decoded image handle (`DecodedImage`) and the read-only `ImageView` backends see
//! - `classify`: `PredictionBackend` trait, stub/tract backends, backend registry
//! - `category`: `Category` and the `CategoryRules` lookup table
//! - `categorizer`: `ClassificationCategorizer`, the validate → predict → lookup pipeline
//! - `config`: JSON config file + environment overrides

pub mod categorizer;
pub mod category;
pub mod classify;
pub mod config;
pub mod error;
pub mod frame;

pub use categorizer::{ClassificationCategorizer, ClassificationResult};
pub use category::{Category, CategoryRules};
pub use classify::{BackendRegistry, Prediction, PredictionBackend, StubBackend};
#[cfg(feature = "backend-tract")]
pub use classify::TractBackend;
pub use config::{BackendSettings, WasteSortConfig};
pub use error::ClassifyError;
pub use frame::{DecodedImage, ImageView};
