// src/diagnostics.rs

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::config::PcaMethod;

/// Numerical health of a freshly fitted model, computed only when debug logging is enabled.
#[derive(Debug, Clone, Default)]
pub struct FitDiagnostics {
    /// `None` when the model was fitted from a precomputed covariance matrix.
    pub method: Option<PcaMethod>,
    pub components_dims: (usize, usize),
    pub orthogonality_error: f64,       // ||I - C^T C||_F
    pub eigenvalues_descending: bool,
    pub total_variance: f64,
}

impl FitDiagnostics {
    pub fn compute(method: Option<PcaMethod>, components: ArrayView2<f64>, eigenvalues: ArrayView1<f64>) -> Self {
        Self {
            method,
            components_dims: components.dim(),
            orthogonality_error: orthogonality_error(components),
            eigenvalues_descending: is_descending(eigenvalues, 1e-9),
            total_variance: eigenvalues.sum(),
        }
    }
}

/// Frobenius norm of `I - QᵗQ`; zero for a matrix with orthonormal columns.
pub fn orthogonality_error(q_matrix: ArrayView2<f64>) -> f64 {
    let k = q_matrix.ncols();
    let gram = q_matrix.t().dot(&q_matrix);
    let deviation = Array2::<f64>::eye(k) - gram;
    frobenius_norm(deviation.view())
}

/// `‖A - B‖_F / ‖A‖_F`, or the absolute error when `A` is zero.
pub fn relative_reconstruction_error(original: ArrayView2<f64>, reconstructed: ArrayView2<f64>) -> f64 {
    let diff = &original - &reconstructed;
    let abs_error = frobenius_norm(diff.view());
    let base = frobenius_norm(original);
    if base > 0.0 { abs_error / base } else { abs_error }
}

pub fn frobenius_norm(matrix: ArrayView2<f64>) -> f64 {
    matrix.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// True when every value is at least its successor minus `slack`.
pub fn is_descending(values: ArrayView1<f64>, slack: f64) -> bool {
    values.windows(2).into_iter().all(|pair| pair[0] >= pair[1] - slack)
}
