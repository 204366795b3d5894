// src/config.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PcaError;

/// Strategy used to compute the principal components of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PcaMethod {
    /// Singular value decomposition of the adjusted data matrix.
    #[default]
    Svd,
    /// Eigen-decomposition of `XᵗX / (n-1)` built from the adjusted data matrix.
    CovarianceMatrix,
    /// Iterative rank-1 extraction with deflation; only `n_comp_nipals` components.
    Nipals,
}

impl PcaMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PcaMethod::Svd => "SVD",
            PcaMethod::CovarianceMatrix => "covarianceMatrix",
            PcaMethod::Nipals => "NIPALS",
        }
    }
}

impl fmt::Display for PcaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PcaMethod {
    type Err = PcaError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "SVD" => Ok(PcaMethod::Svd),
            "covarianceMatrix" => Ok(PcaMethod::CovarianceMatrix),
            "NIPALS" => Ok(PcaMethod::Nipals),
            other => Err(PcaError::UnknownMethod(other.to_string())),
        }
    }
}

impl TryFrom<String> for PcaMethod {
    type Error = PcaError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<PcaMethod> for String {
    fn from(method: PcaMethod) -> Self {
        method.as_str().to_string()
    }
}

/// Options controlling how `PcaModel::fit` treats its input.
///
/// Every field has a default, so a partial JSON option bag such as
/// `{"scale": true, "method": "NIPALS"}` deserializes into a complete config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FitConfig {
    /// The input is already a symmetric covariance/correlation matrix.
    /// Preprocessing is skipped and `method` is ignored.
    pub is_covariance_matrix: bool,
    pub method: PcaMethod,
    /// Subtract the per-column mean before decomposition.
    pub center: bool,
    /// Divide by the per-column standard deviation. Only honored together with `center`.
    pub scale: bool,
    /// Number of components extracted by the NIPALS strategy.
    #[serde(rename = "nCompNIPALS")]
    pub n_comp_nipals: usize,
    /// Drop zero-variance columns instead of failing when scaling.
    pub ignore_zero_variance: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            is_covariance_matrix: false,
            method: PcaMethod::Svd,
            center: true,
            scale: false,
            n_comp_nipals: 2,
            ignore_zero_variance: false,
        }
    }
}

impl FitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: PcaMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_covariance_matrix(mut self, is_covariance_matrix: bool) -> Self {
        self.is_covariance_matrix = is_covariance_matrix;
        self
    }

    pub fn with_center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    pub fn with_scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_n_comp_nipals(mut self, n_comp_nipals: usize) -> Self {
        self.n_comp_nipals = n_comp_nipals;
        self
    }

    pub fn with_ignore_zero_variance(mut self, ignore_zero_variance: bool) -> Self {
        self.ignore_zero_variance = ignore_zero_variance;
        self
    }

    /// Parses a JSON option bag, filling in defaults for missing keys.
    pub fn from_json(json: &str) -> Result<Self, PcaError> {
        let config: FitConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Checks option combinations that can be rejected before looking at the data.
    pub fn validate(&self) -> Result<(), PcaError> {
        if !self.is_covariance_matrix
            && self.method == PcaMethod::Nipals
            && self.n_comp_nipals == 0
        {
            return Err(PcaError::InvalidConfig(
                "nCompNIPALS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options for `PcaModel::predict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PredictConfig {
    /// Number of leading components to keep. `None` keeps all fitted components.
    pub n_components: Option<usize>,
}

impl PredictConfig {
    pub fn with_n_components(n_components: usize) -> Self {
        Self {
            n_components: Some(n_components),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_round_trip() {
        for method in [PcaMethod::Svd, PcaMethod::CovarianceMatrix, PcaMethod::Nipals] {
            assert_eq!(method.to_string().parse::<PcaMethod>().unwrap(), method);
        }
    }

    #[test]
    fn unknown_method_is_named_in_error() {
        let err = "variance".parse::<PcaMethod>().unwrap_err();
        assert!(matches!(err, PcaError::UnknownMethod(ref name) if name == "variance"));
        assert_eq!(err.to_string(), "unknown method: variance");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = FitConfig::from_json(r#"{"scale": true, "method": "NIPALS", "nCompNIPALS": 4}"#)
            .unwrap();
        assert!(config.center);
        assert!(config.scale);
        assert_eq!(config.method, PcaMethod::Nipals);
        assert_eq!(config.n_comp_nipals, 4);
        assert!(!config.ignore_zero_variance);
        assert!(!config.is_covariance_matrix);
    }

    #[test]
    fn json_with_unknown_method_fails() {
        let err = FitConfig::from_json(r#"{"method": "XXX"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown method: XXX"), "{}", err);
    }

    #[test]
    fn nipals_with_zero_components_is_rejected() {
        let config = FitConfig::new()
            .with_method(PcaMethod::Nipals)
            .with_n_comp_nipals(0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PcaError::InvalidConfig(_)), "{:?}", err);
        assert!(err.to_string().contains("nCompNIPALS"));
        assert!(FitConfig::default().validate().is_ok());
    }
}
