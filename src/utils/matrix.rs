//! Dense row-major matrices
//!
//! Policy parameters, score-function gradients and the Fisher matrix are all
//! small dense matrices, so a flat `Vec<f64>` with row-major indexing is
//! enough. Flattening is free: [`Matrix::as_slice`] is already the
//! row-major vector `flat(θ)`.

use serde::{Deserialize, Serialize};

use crate::error::PgError;

/// Pivots smaller than this (relative to the largest entry) are singular
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Dense matrix of `f64` stored row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// All-zero matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![0.0; rows * cols] }
    }

    /// Identity matrix of size `n`
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Wrap a row-major buffer
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, PgError> {
        if data.len() != rows * cols {
            return Err(PgError::mismatch(rows * cols, data.len()));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix by evaluating `f(row, col)` for every entry
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Outer product `u vᵀ`
    pub fn outer(u: &[f64], v: &[f64]) -> Self {
        Self::from_fn(u.len(), v.len(), |i, j| u[i] * v[j])
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the matrix has no entries
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Entry at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Overwrite entry at `(row, col)`
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// One row as a slice
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Row-major view of all entries
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major view of all entries
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the matrix, returning its row-major buffer
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Same entries viewed with a different shape
    pub fn reshape(self, rows: usize, cols: usize) -> Result<Self, PgError> {
        Self::from_vec(rows, cols, self.data)
    }

    /// Matrix-vector product `M x`
    pub fn mat_vec(&self, x: &[f64]) -> Result<Vec<f64>, PgError> {
        if x.len() != self.cols {
            return Err(PgError::mismatch(self.cols, x.len()));
        }
        (0..self.rows).map(|i| dot(self.row(i), x)).collect()
    }

    /// Quadratic form `xᵀ M x`; `M` must be square
    pub fn quadratic_form(&self, x: &[f64]) -> Result<f64, PgError> {
        if self.rows != self.cols {
            return Err(PgError::mismatch(
                format!("square matrix of size {}", x.len()),
                format!("{:?}", self.shape()),
            ));
        }
        dot(x, &self.mat_vec(x)?)
    }

    /// Frobenius norm
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Multiply every entry by `factor`
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.data {
            *v *= factor;
        }
    }

    /// Copy scaled by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        let mut m = self.clone();
        m.scale(factor);
        m
    }

    /// `self += factor * other`
    pub fn add_scaled(&mut self, other: &Matrix, factor: f64) -> Result<(), PgError> {
        if self.shape() != other.shape() {
            return Err(PgError::mismatch(
                format!("{:?}", self.shape()),
                format!("{:?}", other.shape()),
            ));
        }
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += factor * b;
        }
        Ok(())
    }

    /// Whether every entry is finite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Inverse by Gauss-Jordan elimination with partial pivoting
    pub fn inverse(&self) -> Result<Self, PgError> {
        if self.rows != self.cols {
            return Err(PgError::IllConditioned(format!(
                "cannot invert non-square {}x{} matrix",
                self.rows, self.cols
            )));
        }
        let n = self.rows;
        let scale = self.data.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if n > 0 && (scale == 0.0 || !scale.is_finite()) {
            return Err(PgError::IllConditioned("matrix is zero or non-finite".into()));
        }

        let mut a = self.data.clone();
        let mut inv = Self::identity(n).data;

        for col in 0..n {
            let pivot_row = (col..n)
                .max_by(|&x, &y| a[x * n + col].abs().total_cmp(&a[y * n + col].abs()))
                .unwrap_or(col);
            let pivot = a[pivot_row * n + col];
            if pivot.abs() <= SINGULAR_TOLERANCE * scale {
                return Err(PgError::IllConditioned(format!(
                    "singular matrix: pivot {pivot:e} in column {col}"
                )));
            }
            if pivot_row != col {
                for k in 0..n {
                    a.swap(col * n + k, pivot_row * n + k);
                    inv.swap(col * n + k, pivot_row * n + k);
                }
            }

            let inv_pivot = 1.0 / pivot;
            for k in 0..n {
                a[col * n + k] *= inv_pivot;
                inv[col * n + k] *= inv_pivot;
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = a[row * n + col];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..n {
                    a[row * n + k] -= factor * a[col * n + k];
                    inv[row * n + k] -= factor * inv[col * n + k];
                }
            }
        }

        let inv = Self { rows: n, cols: n, data: inv };
        if !inv.is_finite() {
            return Err(PgError::IllConditioned("inverse has non-finite entries".into()));
        }
        Ok(inv)
    }
}

/// Inner product of two equal-length slices
pub fn dot(a: &[f64], b: &[f64]) -> Result<f64, PgError> {
    if a.len() != b.len() {
        return Err(PgError::mismatch(a.len(), b.len()));
    }
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}
