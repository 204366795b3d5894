// src/linalg_backends.rs

use ndarray::{Array1, Array2};

use crate::error::PcaError;

/// Output of a symmetric eigendecomposition.
#[derive(Debug)]
pub struct EighOutput {
    /// Eigenvalues in ascending order.
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors as columns of the matrix.
    /// eigenvectors.column(i) corresponds to eigenvalues[i].
    pub eigenvectors: Array2<f64>,
}

/// Trait for symmetric eigendecomposition (LAPACK's DSYEVD and friends).
/// Only the upper triangle of `matrix` is read.
pub trait BackendEigh {
    fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput, PcaError>;
}

/// Output of a Singular Value Decomposition.
/// Singular values are sorted in descending order.
#[derive(Debug)]
pub struct SVDOutput {
    pub u: Option<Array2<f64>>,
    pub s: Array1<f64>,
    pub vt: Option<Array2<f64>>,
}

/// Trait for Singular Value Decomposition.
pub trait BackendSVD {
    fn svd_into(&self, matrix: Array2<f64>, compute_u: bool, compute_v: bool) -> Result<SVDOutput, PcaError>;
}

// --- ndarray-linalg (LAPACK) backend ---
use ndarray_linalg::{Eigh as NdLinalgEigh, SVDInto as NdLinalgSVDInto, UPLO};

#[derive(Debug, Default, Copy, Clone)]
pub struct NdarrayLinAlgBackend;

impl BackendEigh for NdarrayLinAlgBackend {
    fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput, PcaError> {
        let (eigenvalues, eigenvectors) = matrix
            .eigh(UPLO::Upper)
            .map_err(|e| PcaError::Decomposition(format!("symmetric eigendecomposition failed: {}", e)))?;
        Ok(EighOutput { eigenvalues, eigenvectors })
    }
}

impl BackendSVD for NdarrayLinAlgBackend {
    fn svd_into(&self, matrix: Array2<f64>, compute_u: bool, compute_v: bool) -> Result<SVDOutput, PcaError> {
        let (u, s, vt) = matrix
            .svd_into(compute_u, compute_v)
            .map_err(|e| PcaError::Decomposition(format!("SVD failed: {}", e)))?;
        Ok(SVDOutput { u, s, vt })
    }
}

// --- faer backend ---
#[cfg(feature = "backend_faer")]
mod faer_specific_code {
    use super::{BackendEigh, BackendSVD, EighOutput, SVDOutput};
    use crate::error::PcaError;
    use faer::{Mat, MatRef, Side};
    use ndarray::{Array1, Array2};

    #[derive(Debug, Default, Copy, Clone)]
    pub struct FaerLinAlgBackend;

    // Copies into an owned faer matrix so any ndarray layout is accepted.
    fn ndarray_to_faer(matrix: &Array2<f64>) -> Mat<f64> {
        Mat::from_fn(matrix.nrows(), matrix.ncols(), |i, j| matrix[[i, j]])
    }

    fn faer_mat_to_ndarray(faer_mat: MatRef<'_, f64>) -> Array2<f64> {
        Array2::from_shape_fn((faer_mat.nrows(), faer_mat.ncols()), |(i, j)| faer_mat[(i, j)])
    }

    impl BackendEigh for FaerLinAlgBackend {
        fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput, PcaError> {
            if matrix.nrows() != matrix.ncols() {
                return Err(PcaError::NotSquare { rows: matrix.nrows(), columns: matrix.ncols() });
            }
            if matrix.is_empty() {
                return Ok(EighOutput { eigenvalues: Array1::zeros(0), eigenvectors: Array2::zeros((0, 0)) });
            }
            let eig = ndarray_to_faer(matrix)
                .self_adjoint_eigen(Side::Upper)
                .map_err(|e| PcaError::Decomposition(format!("faer eigendecomposition failed: {:?}", e)))?;
            let values = eig.S().column_vector();
            Ok(EighOutput {
                eigenvalues: Array1::from_shape_fn(values.nrows(), |i| values[i]),
                eigenvectors: faer_mat_to_ndarray(eig.U()),
            })
        }
    }

    impl BackendSVD for FaerLinAlgBackend {
        fn svd_into(&self, matrix: Array2<f64>, compute_u: bool, compute_v: bool) -> Result<SVDOutput, PcaError> {
            let (nrows, ncols) = matrix.dim();
            if matrix.is_empty() {
                let k_dim = nrows.min(ncols);
                return Ok(SVDOutput {
                    u: compute_u.then(|| Array2::zeros((nrows, k_dim))),
                    s: Array1::zeros(k_dim),
                    vt: compute_v.then(|| Array2::zeros((k_dim, ncols))),
                });
            }
            let svd = ndarray_to_faer(&matrix)
                .thin_svd()
                .map_err(|e| PcaError::Decomposition(format!("faer SVD failed: {:?}", e)))?;
            let values = svd.S().column_vector();
            Ok(SVDOutput {
                u: compute_u.then(|| faer_mat_to_ndarray(svd.U())),
                s: Array1::from_shape_fn(values.nrows(), |i| values[i]),
                vt: compute_v.then(|| faer_mat_to_ndarray(svd.V()).t().into_owned()),
            })
        }
    }
}

/// A provider struct that dispatches to the selected linear algebra backend
/// based on compile-time feature flags.
#[derive(Debug, Default, Copy, Clone)]
pub struct LinAlgBackendProvider;

impl LinAlgBackendProvider {
    pub fn new() -> Self {
        Self
    }
}

impl BackendEigh for LinAlgBackendProvider {
    fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput, PcaError> {
        #[cfg(feature = "backend_faer")]
        {
            faer_specific_code::FaerLinAlgBackend.eigh_upper(matrix)
        }
        #[cfg(not(feature = "backend_faer"))]
        {
            NdarrayLinAlgBackend.eigh_upper(matrix)
        }
    }
}

impl BackendSVD for LinAlgBackendProvider {
    fn svd_into(&self, matrix: Array2<f64>, compute_u: bool, compute_v: bool) -> Result<SVDOutput, PcaError> {
        #[cfg(feature = "backend_faer")]
        {
            faer_specific_code::FaerLinAlgBackend.svd_into(matrix, compute_u, compute_v)
        }
        #[cfg(not(feature = "backend_faer"))]
        {
            NdarrayLinAlgBackend.svd_into(matrix, compute_u, compute_v)
        }
    }
}
