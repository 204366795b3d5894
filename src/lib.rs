// Principal component analysis (PCA)

#![doc = include_str!("../README.md")]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod linalg_backends;
pub mod model_record;
pub mod nipals;
pub mod pca;
pub mod preprocessing;

pub use config::{FitConfig, PcaMethod, PredictConfig};
pub use error::PcaError;
pub use model_record::{PcaRecord, MODEL_KIND};
pub use pca::PcaModel;
