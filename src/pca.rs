// Principal component analysis (PCA)

use log::{debug, info, log_enabled, Level};
use ndarray::{s, Array1, Array2, ArrayView2};

use crate::config::{FitConfig, PcaMethod, PredictConfig};
use crate::diagnostics::FitDiagnostics;
use crate::error::PcaError;
use crate::linalg_backends::{BackendEigh, BackendSVD, EighOutput, LinAlgBackendProvider};
use crate::nipals::nipals;
use crate::preprocessing::{adjust, Adjustment};

/// A fitted principal component analysis model.
///
/// Built once, either by [`PcaModel::fit`] or by [`PcaModel::from_record`], and immutable
/// afterwards. `predict` and `invert` only read it, so a model can be shared freely.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaModel {
    /// Whether centering was applied at fit time.
    center: bool,
    /// Whether scaling was applied at fit time (never true without `center`).
    scale: bool,
    /// Means, standard deviations and excluded columns replayed on new data.
    adjustment: Adjustment,
    /// Unit-norm loading vectors, one per column.
    /// Shape: (n_features - n_excluded, k_components)
    components: Array2<f64>,
    /// Variance captured by each component, descending.
    /// Shape: (k_components)
    eigenvalues: Array1<f64>,
}

impl PcaModel {
    /// Fits a PCA model to `data` (n_samples × n_features), or to a covariance matrix
    /// when `config.is_covariance_matrix` is set.
    ///
    /// Unless the input is a covariance matrix, the data is first centered (and
    /// optionally scaled) on a private copy, then decomposed with `config.method`:
    ///
    /// - `Svd`: right singular vectors of the adjusted matrix; eigenvalues are `σ² / (n - 1)`.
    /// - `CovarianceMatrix`: symmetric eigendecomposition of `XᵗX / (n - 1)`.
    /// - `Nipals`: the `config.n_comp_nipals` leading components by deflation.
    ///
    /// # Errors
    /// - `EmptyInput` for a matrix without rows or columns, or when every column was excluded.
    /// - `InsufficientSamples` for fewer than 2 rows (data input only).
    /// - `NotSquare` for a non-square covariance matrix.
    /// - `DegenerateInput` when scaling meets a zero-variance column and
    ///   `ignore_zero_variance` is not set.
    /// - `InvalidConfig` when `n_comp_nipals` is 0.
    /// - `InvalidComponentCount` when `n_comp_nipals` exceeds the retained columns.
    /// - `Decomposition` when the linear algebra backend fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndarray::array;
    /// use ml_pca::{FitConfig, PcaModel, PredictConfig};
    ///
    /// let data = array![[1.0, 2.0, 3.0], [0.0, 3.0, 5.0], [2.0, 2.0, 2.0]];
    /// let pca = PcaModel::fit(data.view(), &FitConfig::default()).unwrap();
    /// let scores = pca.predict(data.view(), &PredictConfig::default()).unwrap();
    /// assert_eq!(scores.nrows(), 3);
    /// ```
    pub fn fit(data: ArrayView2<f64>, config: &FitConfig) -> Result<Self, PcaError> {
        config.validate()?;
        let (n_samples, n_features) = data.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(PcaError::EmptyInput);
        }

        if config.is_covariance_matrix {
            if n_samples != n_features {
                return Err(PcaError::NotSquare {
                    rows: n_samples,
                    columns: n_features,
                });
            }
            info!("Fitting PCA from a {}x{} covariance matrix.", n_samples, n_features);
            let (components, eigenvalues) = eigen_from_covariance(&data.to_owned())?;
            return Ok(Self::finish(None, false, false, Adjustment::default(), components, eigenvalues));
        }

        if n_samples < 2 {
            return Err(PcaError::InsufficientSamples(n_samples));
        }

        let center = config.center;
        let scale = config.center && config.scale;
        info!(
            "Fitting PCA ({}) on {}x{} data; center={}, scale={}.",
            config.method, n_samples, n_features, center, scale
        );

        let (working, adjustment) = adjust(data, center, scale, config.ignore_zero_variance)?;
        if working.ncols() == 0 {
            return Err(PcaError::EmptyInput);
        }

        let (components, eigenvalues) = match config.method {
            PcaMethod::Svd => svd_components(working)?,
            PcaMethod::CovarianceMatrix => {
                let mut covariance = working.t().dot(&working);
                covariance /= (n_samples - 1) as f64;
                eigen_from_covariance(&covariance)?
            }
            PcaMethod::Nipals => nipals(&working, config.n_comp_nipals)?,
        };

        Ok(Self::finish(Some(config.method), center, scale, adjustment, components, eigenvalues))
    }

    fn finish(
        method: Option<PcaMethod>,
        center: bool,
        scale: bool,
        adjustment: Adjustment,
        components: Array2<f64>,
        eigenvalues: Array1<f64>,
    ) -> Self {
        if log_enabled!(Level::Debug) {
            let diagnostics = FitDiagnostics::compute(method, components.view(), eigenvalues.view());
            debug!("Fit diagnostics: {:?}", diagnostics);
        }
        info!(
            "PCA fitted: {} component(s) over {} retained feature(s).",
            components.ncols(),
            components.nrows()
        );
        Self {
            center,
            scale,
            adjustment,
            components,
            eigenvalues,
        }
    }

    /// Assembles a model from already validated parts.
    pub(crate) fn from_parts(
        center: bool,
        scale: bool,
        adjustment: Adjustment,
        components: Array2<f64>,
        eigenvalues: Array1<f64>,
    ) -> Self {
        Self {
            center,
            scale,
            adjustment,
            components,
            eigenvalues,
        }
    }

    /// Projects `data` into component space.
    ///
    /// The centering, column exclusion and scaling recorded at fit time are replayed
    /// (never recomputed from `data`), then the result is multiplied by the component
    /// matrix and truncated to `config.n_components` columns.
    ///
    /// # Errors
    /// `DimensionMismatch` when the width of `data` does not match the fitted model, and
    /// `InvalidComponentCount` when more components are requested than were fitted.
    pub fn predict(&self, data: ArrayView2<f64>, config: &PredictConfig) -> Result<Array2<f64>, PcaError> {
        let adjusted = self.adjustment.replay(data)?;
        if adjusted.ncols() != self.components.nrows() {
            return Err(PcaError::DimensionMismatch {
                expected: self.components.nrows(),
                found: adjusted.ncols(),
                context: "predict input columns",
            });
        }

        let available = self.components.ncols();
        let k = config.n_components.unwrap_or(available);
        if k > available || config.n_components == Some(0) {
            return Err(PcaError::InvalidComponentCount {
                requested: k,
                available,
            });
        }
        Ok(adjusted.dot(&self.components.slice(s![.., ..k])))
    }

    /// Maps scores back to the original feature space: `scores · componentsᵗ`, then
    /// undoes scaling and centering.
    ///
    /// `scores` may hold fewer columns than the model has components; the leading
    /// components are used. The result is exact only when all components are used.
    pub fn invert(&self, scores: ArrayView2<f64>) -> Result<Array2<f64>, PcaError> {
        let k = scores.ncols();
        if k > self.components.ncols() {
            return Err(PcaError::DimensionMismatch {
                expected: self.components.ncols(),
                found: k,
                context: "invert score columns",
            });
        }
        let reconstructed = scores.dot(&self.components.slice(s![.., ..k]).t());
        self.adjustment.restore(reconstructed)
    }

    /// Proportion of the total variance captured by each component.
    /// Empty when the model has no eigenvalues.
    pub fn explained_variance(&self) -> Array1<f64> {
        let total = self.eigenvalues.sum();
        if self.eigenvalues.is_empty() || total <= 0.0 {
            return Array1::zeros(self.eigenvalues.len());
        }
        self.eigenvalues.mapv(|v| v / total)
    }

    /// Running sum of [`PcaModel::explained_variance`].
    pub fn cumulative_variance(&self) -> Array1<f64> {
        let mut cumulative = self.explained_variance();
        let mut running = 0.0;
        cumulative.mapv_inplace(|v| {
            running += v;
            running
        });
        cumulative
    }

    /// Component matrix, one unit-norm loading vector per column.
    /// Shape: (n_features - n_excluded, k_components)
    pub fn eigenvectors(&self) -> &Array2<f64> {
        &self.components
    }

    /// Variance captured by each component, descending.
    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Standard deviation of the data along each component.
    pub fn standard_deviations(&self) -> Array1<f64> {
        self.eigenvalues.mapv(f64::sqrt)
    }

    /// Loadings matrix: rows are components, columns are the retained features.
    pub fn loadings(&self) -> Array2<f64> {
        self.components.t().to_owned()
    }

    pub fn n_components(&self) -> usize {
        self.components.ncols()
    }

    pub fn is_centered(&self) -> bool {
        self.center
    }

    pub fn is_scaled(&self) -> bool {
        self.scale
    }

    pub fn means(&self) -> Option<&Array1<f64>> {
        self.adjustment.means.as_ref()
    }

    pub fn stdevs(&self) -> Option<&Array1<f64>> {
        self.adjustment.stdevs.as_ref()
    }

    /// Original indices of the zero-variance columns dropped at fit time.
    pub fn excluded_features(&self) -> &[usize] {
        &self.adjustment.excluded_features
    }
}

/// Right singular vectors of `working` and their variances `σ² / (n - 1)`.
///
/// Wide matrices are decomposed transposed; the left singular vectors of `Xᵗ` are the
/// right singular vectors of `X`. Only the `min(n, p)` leading vectors are kept.
fn svd_components(working: Array2<f64>) -> Result<(Array2<f64>, Array1<f64>), PcaError> {
    let (n_samples, n_features) = working.dim();
    let dof = (n_samples - 1) as f64;
    let k = n_samples.min(n_features);
    let backend = LinAlgBackendProvider::new();

    let (components, singular_values) = if n_samples < n_features {
        let out = backend.svd_into(working.reversed_axes(), true, false)?;
        let u = out
            .u
            .ok_or_else(|| PcaError::Decomposition("left singular vectors of Xᵗ not computed".to_string()))?;
        (u.slice(s![.., ..k]).to_owned(), out.s)
    } else {
        let out = backend.svd_into(working, false, true)?;
        let vt = out
            .vt
            .ok_or_else(|| PcaError::Decomposition("right singular vectors not computed".to_string()))?;
        (vt.slice(s![..k, ..]).t().to_owned(), out.s)
    };

    let eigenvalues = singular_values.slice(s![..k]).mapv(|sv| sv * sv / dof);
    Ok((components, eigenvalues))
}

/// Eigendecomposition of a symmetric covariance matrix, reordered to descending eigenvalues.
///
/// The backend returns ascending eigenvalues; both the eigenvalues and the eigenvector
/// columns are reversed so that column `k` still pairs with eigenvalue `k`.
/// Negative round-off is clamped to zero.
fn eigen_from_covariance(covariance: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>), PcaError> {
    let EighOutput {
        eigenvalues,
        eigenvectors,
    } = LinAlgBackendProvider::new().eigh_upper(covariance)?;

    let eigenvalues = eigenvalues.slice(s![..;-1]).mapv(|v| v.max(0.0));
    let components = eigenvectors.slice(s![.., ..;-1]).to_owned();
    Ok((components, eigenvalues))
}
