mod backend;
mod backends;
mod prediction;
mod registry;

pub use backend::PredictionBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use prediction::{rank_predictions, Prediction};
pub use registry::BackendRegistry;
