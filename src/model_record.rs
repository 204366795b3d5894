// src/model_record.rs

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::PcaError;
use crate::pca::PcaModel;
use crate::preprocessing::Adjustment;

/// Discriminator stored in every serialized model.
pub const MODEL_KIND: &str = "PCA";

/// Flat, language-neutral representation of a fitted [`PcaModel`].
///
/// Every field is defaulted so partial records deserialize; [`PcaModel::from_record`]
/// decides whether the result describes a usable model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PcaRecord {
    pub kind: Option<String>,
    pub center: bool,
    pub scale: bool,
    /// Present iff `center`.
    pub means: Option<Vec<f64>>,
    /// Present iff `scale`.
    pub stdevs: Option<Vec<f64>>,
    /// Original column indices dropped for zero variance.
    pub excluded_features: Vec<usize>,
    /// Rows are retained features, columns are components.
    pub components: Vec<Vec<f64>>,
    /// Descending.
    pub eigenvalues: Vec<f64>,
}

impl PcaModel {
    /// Exports the full fitted state as a flat record tagged with `kind = "PCA"`.
    pub fn to_record(&self) -> PcaRecord {
        PcaRecord {
            kind: Some(MODEL_KIND.to_string()),
            center: self.is_centered(),
            scale: self.is_scaled(),
            means: self.means().map(|m| m.to_vec()),
            stdevs: self.stdevs().map(|s| s.to_vec()),
            excluded_features: self.excluded_features().to_vec(),
            components: self.eigenvectors().rows().into_iter().map(|row| row.to_vec()).collect(),
            eigenvalues: self.eigenvalues().to_vec(),
        }
    }

    /// Rebuilds a model from a record produced by [`PcaModel::to_record`].
    ///
    /// # Errors
    /// `InvalidModel` if the `kind` discriminator is missing or is not `"PCA"`, or if the
    /// record is internally inconsistent (ragged component rows, vector lengths that
    /// disagree with the component matrix, negative or non-finite eigenvalues).
    pub fn from_record(record: PcaRecord) -> Result<Self, PcaError> {
        match record.kind.as_deref() {
            None => return Err(PcaError::InvalidModel("model record must have a kind property".to_string())),
            Some(MODEL_KIND) => {}
            Some(other) => return Err(PcaError::InvalidModel(format!("unexpected model kind '{}'", other))),
        }

        let n_rows = record.components.len();
        let n_cols = record.components.first().map_or(0, Vec::len);
        if record.components.iter().any(|row| row.len() != n_cols) {
            return Err(PcaError::InvalidModel("component rows have unequal lengths".to_string()));
        }
        let flat: Vec<f64> = record.components.into_iter().flatten().collect();
        let components = Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| PcaError::InvalidModel(format!("component matrix: {}", e)))?;

        if record.eigenvalues.len() != n_cols {
            return Err(PcaError::InvalidModel(format!(
                "eigenvalues length ({}) does not match the number of components ({})",
                record.eigenvalues.len(),
                n_cols
            )));
        }
        if record.eigenvalues.iter().any(|&v| !v.is_finite() || v < 0.0) {
            return Err(PcaError::InvalidModel(
                "eigenvalues contain negative or non-finite values".to_string(),
            ));
        }

        let center = record.center;
        let scale = record.center && record.scale;

        let means = if center {
            let means = record
                .means
                .ok_or_else(|| PcaError::InvalidModel("centered model is missing its means".to_string()))?;
            if means.len() != n_rows + record.excluded_features.len() {
                return Err(PcaError::InvalidModel(format!(
                    "means length ({}) does not match {} retained + {} excluded features",
                    means.len(),
                    n_rows,
                    record.excluded_features.len()
                )));
            }
            Some(Array1::from(means))
        } else {
            None
        };

        let stdevs = if scale {
            let stdevs = record
                .stdevs
                .ok_or_else(|| PcaError::InvalidModel("scaled model is missing its stdevs".to_string()))?;
            if stdevs.len() != n_rows {
                return Err(PcaError::InvalidModel(format!(
                    "stdevs length ({}) does not match the retained features ({})",
                    stdevs.len(),
                    n_rows
                )));
            }
            if stdevs.iter().any(|&v| !v.is_finite() || v <= 0.0) {
                return Err(PcaError::InvalidModel("stdevs must be positive and finite".to_string()));
            }
            Some(Array1::from(stdevs))
        } else {
            None
        };

        let excluded_features = record.excluded_features;
        if !excluded_features.is_empty() {
            if !scale {
                return Err(PcaError::InvalidModel(
                    "excluded features are only valid on a scaled model".to_string(),
                ));
            }
            let n_features = n_rows + excluded_features.len();
            let ascending = excluded_features.windows(2).all(|pair| pair[0] < pair[1]);
            if !ascending || excluded_features.iter().any(|&idx| idx >= n_features) {
                return Err(PcaError::InvalidModel(format!(
                    "excluded features {:?} are not distinct ascending indices below {}",
                    excluded_features, n_features
                )));
            }
        }

        let adjustment = Adjustment {
            means,
            stdevs,
            excluded_features,
        };
        Ok(PcaModel::from_parts(center, scale, adjustment, components, Array1::from(record.eigenvalues)))
    }

    /// Serializes the model record as JSON.
    pub fn to_json(&self) -> Result<String, PcaError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    /// Parses a JSON model record and validates it with [`PcaModel::from_record`].
    pub fn from_json(json: &str) -> Result<Self, PcaError> {
        let record: PcaRecord = serde_json::from_str(json)?;
        Self::from_record(record)
    }

    /// Saves the model record to a file using bincode.
    ///
    /// # Errors
    /// Returns an error if file I/O or serialization fails.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<(), PcaError> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        bincode::serde::encode_into_std_write(self.to_record(), &mut writer, bincode::config::standard())?;
        Ok(())
    }

    /// Loads a model previously saved with [`PcaModel::save_model`].
    ///
    /// # Errors
    /// Returns an error if file I/O or deserialization fails, or if the loaded record
    /// is rejected by [`PcaModel::from_record`].
    pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Self, PcaError> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let record: PcaRecord = bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())?;
        Self::from_record(record)
    }
}
