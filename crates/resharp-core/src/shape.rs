use crate::error::{TensorError, TensorResult};
use serde::{Deserialize, Serialize};

/// Represents the shape of a tensor (dimensions).
///
/// Image batches are laid out NCHW: batch, channel, height, width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    pub fn from_slice(dims: &[usize]) -> Self {
        Shape {
            dims: dims.to_vec(),
        }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Size along a specific axis.
    pub fn dim(&self, axis: usize) -> TensorResult<usize> {
        self.dims
            .get(axis)
            .copied()
            .ok_or(TensorError::InvalidAxis {
                axis,
                ndim: self.ndim(),
            })
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.dims.clone()
    }

    /// Interpret as a 4-D batch shape (batch, channels, height, width).
    pub fn as_nchw(&self) -> TensorResult<(usize, usize, usize, usize)> {
        if self.dims.len() != 4 {
            return Err(TensorError::NotABatch {
                got: self.to_vec(),
            });
        }
        Ok((self.dims[0], self.dims[1], self.dims[2], self.dims[3]))
    }

    /// Compute row-major (C-order) strides.
    pub fn strides(&self) -> Vec<usize> {
        if self.dims.is_empty() {
            return vec![];
        }
        let mut strides = vec![1usize; self.dims.len()];
        for i in (0..self.dims.len() - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims)
    }
}
