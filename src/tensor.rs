//! Dense Matrix Runtime
//!
//! This module provides the minimal dense 2D tensor the scale-and-shift layer
//! runs on. Matrices store a flat `Vec<f32>` in row-major order together with
//! shape and stride information.
//!
//! ## Core Concepts
//!
//! - **Data**: Flat `Vec<f32>` storing all elements in row-major order
//! - **Shape**: Always `[rows, cols]`
//! - **Strides**: Step sizes for each dimension to compute flat indices
//!
//! ## Broadcasting
//!
//! Element-wise operations accept exactly two operand layouts:
//!
//! ```text
//! [N, D] op [N, D]   exact match
//! [N, D] op [1, D]   right-hand row replicated across all N rows
//! ```
//!
//! Anything else is a [`Error::ShapeMismatch`]. Operands are never
//! truncated or padded to make them fit.
//!
//! ## Example
//!
//! ```rust
//! use scaleshift::Tensor;
//!
//! let x = Tensor::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]])?;
//! let row = Tensor::new(vec![10.0, 20.0], vec![1, 2])?;
//! let y = x.add(&row)?;
//! assert_eq!(y.data, vec![11.0, 22.0, 13.0, 24.0]);
//! # Ok::<(), scaleshift::Error>(())
//! ```
//!
//! Element-wise operations and the column-sum reduction run through Rayon
//! parallel iterators.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A dense row-major matrix
///
/// # Fields
///
/// - `data`: Flat array of f32 values
/// - `shape`: `[rows, cols]`
/// - `strides`: Step sizes for each dimension (private, computed from shape)
///
/// Every constructor guarantees `shape.len() == 2`; the accessors below rely
/// on it, so code that edits `shape` by hand must keep it rank 2.
///
/// # Memory Layout
///
/// For shape `[2, 3]`, data is stored as:
/// `[row0_col0, row0_col1, row0_col2, row1_col0, row1_col1, row1_col2]`
/// with strides `[3, 1]`.
///
/// # Serialization
///
/// Serializes as `{"data": [..], "shape": [rows, cols]}`. Strides are
/// recomputed on load, and a payload whose data does not fit its shape is
/// rejected with the same checks as [`Tensor::new`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TensorRepr")]
pub struct Tensor {
    /// Flat storage of all matrix elements
    pub data: Vec<f32>,
    /// Shape of the matrix (`[rows, cols]`)
    pub shape: Vec<usize>,
    /// Strides for each dimension (computed from shape)
    #[serde(skip_serializing)]
    strides: Vec<usize>,
}

/// Wire form of a [`Tensor`]
#[derive(Deserialize)]
struct TensorRepr {
    data: Vec<f32>,
    shape: Vec<usize>,
}

impl TryFrom<TensorRepr> for Tensor {
    type Error = Error;

    fn try_from(repr: TensorRepr) -> Result<Self> {
        Tensor::new(repr.data, repr.shape)
    }
}

impl Tensor {
    /// Create a new matrix with given data and shape
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `shape` is not two-dimensional
    /// - [`Error::DataLength`] if `data.len()` is not `rows * cols`
    ///
    /// # Example
    ///
    /// ```rust
    /// # use scaleshift::Tensor;
    /// let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2])?;
    /// assert_eq!(t.shape, vec![2, 2]);
    /// # Ok::<(), scaleshift::Error>(())
    /// ```
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Result<Self> {
        if shape.len() != 2 {
            return Err(Error::InvalidArgument {
                arg: "shape",
                reason: format!("expected [rows, cols], got {:?}", shape),
            });
        }
        let expected_size: usize = shape.iter().product();
        if data.len() != expected_size {
            return Err(Error::DataLength {
                len: data.len(),
                shape,
            });
        }

        Ok(Self::from_parts(data, shape))
    }

    /// Internal constructor for buffers whose length is already known to fit
    fn from_parts(data: Vec<f32>, shape: Vec<usize>) -> Self {
        let strides = Self::compute_strides(&shape);
        Self {
            data,
            shape,
            strides,
        }
    }

    /// Build a matrix from a slice of equally sized rows
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the rows are ragged.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(Error::shape_mismatch("from_rows", &[1, cols], &[1, row.len()]));
            }
            data.extend_from_slice(row);
        }
        Ok(Self::from_parts(data, vec![rows.len(), cols]))
    }

    /// Create a matrix filled with a constant value
    pub fn full(rows: usize, cols: usize, value: f32) -> Self {
        Self::from_parts(vec![value; rows * cols], vec![rows, cols])
    }

    /// Create a matrix filled with zeros
    ///
    /// # Example
    ///
    /// ```rust
    /// # use scaleshift::Tensor;
    /// let t = Tensor::zeros(3, 4);
    /// assert_eq!(t.data.len(), 12);
    /// assert!(t.data.iter().all(|&x| x == 0.0));
    /// ```
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::full(rows, cols, 0.0)
    }

    /// Create a matrix filled with ones
    pub fn ones(rows: usize, cols: usize) -> Self {
        Self::full(rows, cols, 1.0)
    }

    /// Create a matrix of standard-normal samples from a seeded generator
    ///
    /// The same `seed` always produces the same matrix.
    pub fn randn(rows: usize, cols: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..rows * cols)
            .map(|_| rng.sample::<f32, _>(StandardNormal))
            .collect();
        Self::from_parts(data, vec![rows, cols])
    }

    /// Compute strides from shape (row-major layout)
    ///
    /// For shape `[d0, d1]`, strides are `[d1, 1]`
    fn compute_strides(shape: &[usize]) -> Vec<usize> {
        let mut strides = vec![1; shape.len()];
        for i in (0..shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }
        strides
    }

    /// Number of rows (`shape[0]`)
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    /// Number of columns (features, `shape[1]`)
    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    /// True for a `[1, D]` matrix
    pub fn is_row_vector(&self) -> bool {
        self.rows() == 1
    }

    /// Element at row `i`, column `j`
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of bounds, like slice indexing.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        assert!(
            i < self.rows() && j < self.cols(),
            "Index ({}, {}) out of bounds for shape {:?}",
            i,
            j,
            self.shape
        );
        self.data[i * self.strides[0] + j * self.strides[1]]
    }

    /// Borrow row `i` as a slice
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds, like slice indexing.
    pub fn row(&self, i: usize) -> &[f32] {
        let start = i * self.strides[0];
        &self.data[start..start + self.cols()]
    }

    /// Copy the matrix out as nested rows
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        (0..self.rows()).map(|i| self.row(i).to_vec()).collect()
    }

    /// Apply a binary element-wise operation with row broadcasting
    ///
    /// `other` must either match `self` exactly or be a `[1, D]` row whose
    /// width equals `self`'s column count.
    fn zip_with<F>(&self, other: &Tensor, op: &'static str, f: F) -> Result<Tensor>
    where
        F: Fn(f32, f32) -> f32 + Sync + Send,
    {
        // === EXACT MATCH: Same shape ===
        if self.shape == other.shape {
            let result = self
                .data
                .par_iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect();
            return Ok(Self::from_parts(result, self.shape.clone()));
        }

        // === BROADCAST ROW: [N, D] op [1, D] ===
        if other.is_row_vector() && other.cols() == self.cols() {
            let cols = self.cols();
            let result = self
                .data
                .par_iter()
                .enumerate()
                .map(|(i, &a)| f(a, other.data[i % cols]))
                .collect();
            return Ok(Self::from_parts(result, self.shape.clone()));
        }

        Err(Error::shape_mismatch(op, &self.shape, &other.shape))
    }

    /// Element-wise multiplication of two same-shaped matrices
    ///
    /// Unlike [`Tensor::mul`], no broadcasting is attempted: a `[1, D]`
    /// operand against `[N, D]` with `N > 1` is a shape mismatch.
    pub fn hadamard(&self, other: &Tensor) -> Result<Tensor> {
        if self.shape != other.shape {
            return Err(Error::shape_mismatch("hadamard", &self.shape, &other.shape));
        }
        let result = self
            .data
            .par_iter()
            .zip(&other.data)
            .map(|(a, b)| a * b)
            .collect();
        Ok(Self::from_parts(result, self.shape.clone()))
    }

    /// Element-wise addition with row broadcasting
    ///
    /// # Example
    ///
    /// ```rust
    /// # use scaleshift::Tensor;
    /// let a = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2])?;
    /// let b = Tensor::ones(2, 2);
    /// assert_eq!(a.add(&b)?.data, vec![2.0, 3.0, 4.0, 5.0]);
    /// # Ok::<(), scaleshift::Error>(())
    /// ```
    pub fn add(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    /// Element-wise subtraction with row broadcasting
    pub fn sub(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    /// Element-wise multiplication with row broadcasting
    ///
    /// See [`Tensor::add`] for the accepted layouts.
    pub fn mul(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_with(other, "mul", |a, b| a * b)
    }

    /// Multiply all elements by scalar
    pub fn mul_scalar(&self, scalar: f32) -> Tensor {
        let result = self.data.par_iter().map(|&x| x * scalar).collect();
        Self::from_parts(result, self.shape.clone())
    }

    /// Column-sum reduction: `[N, D] -> [1, D]`
    ///
    /// An empty batch (`N = 0`) reduces to a row of zeros.
    pub fn sum_rows(&self) -> Tensor {
        let rows = self.rows();
        let cols = self.cols();
        let result = (0..cols)
            .into_par_iter()
            .map(|j| (0..rows).map(|i| self.data[i * cols + j]).sum::<f32>())
            .collect();
        Self::from_parts(result, vec![1, cols])
    }

    /// Sum of squared elements
    pub fn sum_sq(&self) -> f32 {
        self.data.par_iter().map(|&x| x * x).sum()
    }

    /// Largest absolute element-wise difference between two same-shaped matrices
    pub fn max_abs_diff(&self, other: &Tensor) -> Result<f32> {
        if self.shape != other.shape {
            return Err(Error::shape_mismatch("max_abs_diff", &self.shape, &other.shape));
        }
        Ok(self
            .data
            .par_iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .reduce(|| 0.0, f32::max))
    }
}
