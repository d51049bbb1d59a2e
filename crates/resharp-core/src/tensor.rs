use crate::error::{TensorError, TensorResult};
use crate::shape::Shape;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense f32 tensor — the fundamental data structure of resharp.
///
/// Stores data in a flat contiguous `Vec<f32>` with row-major (C-order)
/// layout. Image batches use the NCHW convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    data: Vec<f32>,
    shape: Shape,
}

// ─── Construction ───────────────────────────────────────────────────────────

impl Tensor {
    /// Create a tensor from raw data and shape.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> TensorResult<Self> {
        let s = Shape::new(shape);
        if data.len() != s.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: s.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor { data, shape: s })
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let s = Shape::new(shape);
        Tensor {
            data: vec![0.0; s.numel()],
            shape: s,
        }
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: Vec<usize>) -> Self {
        Self::full(shape, 1.0)
    }

    /// Create a tensor filled with a constant value.
    pub fn full(shape: Vec<usize>, value: f32) -> Self {
        let s = Shape::new(shape);
        Tensor {
            data: vec![value; s.numel()],
            shape: s,
        }
    }

    /// Evenly spaced values over `[start, end]` inclusive.
    pub fn linspace(start: f32, end: f32, n: usize) -> Self {
        let mut data = Vec::with_capacity(n);
        if n == 1 {
            data.push(start);
        } else {
            let step = (end - start) / (n - 1) as f32;
            for i in 0..n {
                data.push(start + step * i as f32);
            }
        }
        let len = data.len();
        Tensor {
            data,
            shape: Shape::new(vec![len]),
        }
    }

    /// Random tensor with uniform distribution in [0, 1).
    pub fn rand(shape: Vec<usize>, seed: Option<u64>) -> Self {
        let s = Shape::new(shape);
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let data: Vec<f32> = (0..s.numel()).map(|_| rng.gen::<f32>()).collect();
        Tensor { data, shape: s }
    }

    /// Random tensor with standard normal distribution (Box-Muller).
    pub fn randn(shape: Vec<usize>, seed: Option<u64>) -> Self {
        let s = Shape::new(shape);
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let n = s.numel();
        let mut data = Vec::with_capacity(n);
        while data.len() < n {
            let (a, b) = normal_pair(&mut rng);
            data.push(a);
            if data.len() < n {
                data.push(b);
            }
        }
        Tensor { data, shape: s }
    }

    /// Overwrite every element with a draw from N(mean, std²).
    pub fn fill_normal(&mut self, rng: &mut StdRng, mean: f32, std: f32) {
        let mut pending: Option<f32> = None;
        for v in self.data.iter_mut() {
            let z = match pending.take() {
                Some(z) => z,
                None => {
                    let (a, b) = normal_pair(rng);
                    pending = Some(b);
                    a
                }
            };
            *v = mean + std * z;
        }
    }

    /// Overwrite every element with a constant.
    pub fn fill(&mut self, value: f32) {
        for v in self.data.iter_mut() {
            *v = value;
        }
    }
}

/// One Box-Muller draw: two independent standard normal samples.
fn normal_pair(rng: &mut StdRng) -> (f32, f32) {
    let u1: f64 = rng.gen::<f64>().max(1e-10);
    let u2: f64 = rng.gen::<f64>();
    let r = (-2.0 * u1.ln()).sqrt();
    let theta = 2.0 * std::f64::consts::PI * u2;
    ((r * theta.cos()) as f32, (r * theta.sin()) as f32)
}

// ─── Accessors ──────────────────────────────────────────────────────────────

impl Tensor {
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_vec(&self) -> Vec<usize> {
        self.shape.to_vec()
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Batch view: (batch, channels, height, width).
    pub fn dims4(&self) -> TensorResult<(usize, usize, usize, usize)> {
        self.shape.as_nchw()
    }

    pub fn get(&self, indices: &[usize]) -> TensorResult<f32> {
        let idx = self.flat_index(indices)?;
        Ok(self.data[idx])
    }

    pub fn set(&mut self, indices: &[usize], value: f32) -> TensorResult<()> {
        let idx = self.flat_index(indices)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Flat offset of `[n, c, h, w]` in a 4-D tensor. No bounds checks beyond
    /// debug assertions; callers validate the batch shape once up front.
    #[inline]
    pub fn offset4(&self, n: usize, c: usize, h: usize, w: usize) -> usize {
        let d = self.shape.dims();
        debug_assert_eq!(d.len(), 4);
        debug_assert!(n < d[0] && c < d[1] && h < d[2] && w < d[3]);
        ((n * d[1] + c) * d[2] + h) * d[3] + w
    }

    fn flat_index(&self, indices: &[usize]) -> TensorResult<usize> {
        if indices.len() != self.ndim() {
            return Err(TensorError::InvalidAxis {
                axis: indices.len(),
                ndim: self.ndim(),
            });
        }
        let dims = self.shape.dims();
        let strides = self.shape.strides();
        let mut idx = 0;
        for (axis, (&i, (&d, &s))) in indices
            .iter()
            .zip(dims.iter().zip(strides.iter()))
            .enumerate()
        {
            if i >= d {
                return Err(TensorError::IndexOutOfBounds {
                    index: i,
                    axis,
                    size: d,
                });
            }
            idx += i * s;
        }
        Ok(idx)
    }

    pub fn reshape(&self, new_shape: Vec<usize>) -> TensorResult<Tensor> {
        let s = Shape::new(new_shape);
        if s.numel() != self.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: s.to_vec(),
                got: self.shape_vec(),
            });
        }
        Ok(Tensor {
            data: self.data.clone(),
            shape: s,
        })
    }
}

// ─── Element-wise maps ──────────────────────────────────────────────────────

impl Tensor {
    pub fn apply<F: Fn(f32) -> f32>(&self, f: F) -> Tensor {
        Tensor {
            data: self.data.iter().map(|&v| f(v)).collect(),
            shape: self.shape.clone(),
        }
    }

    pub fn apply_mut<F: Fn(f32) -> f32>(&mut self, f: F) {
        for v in self.data.iter_mut() {
            *v = f(*v);
        }
    }

    pub fn clamp(&self, min: f32, max: f32) -> Tensor {
        self.apply(|x| x.clamp(min, max))
    }

    pub fn tanh(&self) -> Tensor {
        self.apply(f32::tanh)
    }

    pub fn sigmoid(&self) -> Tensor {
        self.apply(|x| 1.0 / (1.0 + (-x).exp()))
    }

    pub fn relu(&self) -> Tensor {
        self.apply(|x| x.max(0.0))
    }

    pub fn leaky_relu(&self, slope: f32) -> Tensor {
        self.apply(|x| if x >= 0.0 { x } else { slope * x })
    }

    pub fn abs(&self) -> Tensor {
        self.apply(f32::abs)
    }

    pub fn sqrt(&self) -> Tensor {
        self.apply(f32::sqrt)
    }

    pub fn add_scalar(&self, s: f32) -> Tensor {
        self.apply(|x| x + s)
    }

    pub fn sub_scalar(&self, s: f32) -> Tensor {
        self.apply(|x| x - s)
    }

    pub fn mul_scalar(&self, s: f32) -> Tensor {
        self.apply(|x| x * s)
    }

    pub fn div_scalar(&self, s: f32) -> Tensor {
        self.apply(|x| x / s)
    }
}

// ─── Binary operations (same shape) ─────────────────────────────────────────

impl Tensor {
    fn zip_with<F: Fn(f32, f32) -> f32>(&self, other: &Tensor, f: F) -> TensorResult<Tensor> {
        if self.shape != other.shape {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape_vec(),
                got: other.shape_vec(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Tensor {
            data,
            shape: self.shape.clone(),
        })
    }

    pub fn add(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn mul(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn div(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.zip_with(other, |a, b| a / b)
    }
}

// ─── Reductions ─────────────────────────────────────────────────────────────

impl Tensor {
    pub fn sum_all(&self) -> f32 {
        self.data.iter().sum()
    }

    pub fn mean_all(&self) -> f32 {
        if self.data.is_empty() {
            0.0
        } else {
            self.sum_all() / self.numel() as f32
        }
    }

    pub fn max_all(&self) -> TensorResult<f32> {
        self.data
            .iter()
            .copied()
            .reduce(f32::max)
            .ok_or(TensorError::EmptyTensor)
    }

    pub fn min_all(&self) -> TensorResult<f32> {
        self.data
            .iter()
            .copied()
            .reduce(f32::min)
            .ok_or(TensorError::EmptyTensor)
    }
}

// ─── Joining and splitting ──────────────────────────────────────────────────

impl Tensor {
    /// Concatenate tensors along an axis. All other dimensions must match.
    pub fn concat(tensors: &[&Tensor], axis: usize) -> TensorResult<Tensor> {
        let first = tensors.first().ok_or(TensorError::EmptyTensor)?;
        let ndim = first.ndim();
        if axis >= ndim {
            return Err(TensorError::InvalidAxis { axis, ndim });
        }
        let mut out_dims = first.shape_vec();
        for t in &tensors[1..] {
            let dims = t.shape_vec();
            if dims.len() != ndim
                || dims
                    .iter()
                    .zip(out_dims.iter())
                    .enumerate()
                    .any(|(i, (&a, &b))| i != axis && a != b)
            {
                return Err(TensorError::ShapeMismatch {
                    expected: out_dims,
                    got: dims,
                });
            }
            out_dims[axis] += dims[axis];
        }

        // Copy block-by-block: `outer` rows, each row holding the axis dim
        // times the trailing `inner` elements.
        let inner: usize = first.shape.dims()[axis + 1..].iter().product();
        let outer: usize = first.shape.dims()[..axis].iter().product();
        let mut data = Vec::with_capacity(out_dims.iter().product());
        for o in 0..outer {
            for t in tensors {
                let block = t.shape.dims()[axis] * inner;
                let start = o * block;
                data.extend_from_slice(&t.data[start..start + block]);
            }
        }
        Tensor::new(data, out_dims)
    }

    /// Split along the leading axis into at most `parts` nearly-equal chunks.
    /// Chunks preserve order; fewer are returned when the axis is short.
    pub fn chunk(&self, parts: usize) -> TensorResult<Vec<Tensor>> {
        if self.ndim() == 0 || parts == 0 {
            return Err(TensorError::InvalidOperation(
                "chunk requires a leading axis and parts > 0".into(),
            ));
        }
        let lead = self.shape.dim(0)?;
        let parts = parts.min(lead);
        let per = lead.div_ceil(parts);
        let row: usize = self.shape.dims()[1..].iter().product();
        let mut out = Vec::new();
        let mut start = 0;
        while start < lead {
            let end = (start + per).min(lead);
            let mut dims = self.shape_vec();
            dims[0] = end - start;
            out.push(Tensor::new(
                self.data[start * row..end * row].to_vec(),
                dims,
            )?);
            start = end;
        }
        Ok(out)
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor{:?}", self.shape.dims())
    }
}
