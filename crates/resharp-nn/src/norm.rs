use crate::module::{Layer, LayerKind};
use resharp_core::{Tensor, TensorError, TensorResult};

/// Which normalization a network is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormKind {
    Batch,
    Instance,
}

impl NormKind {
    /// Build a normalization layer over `features` channels.
    pub fn build(self, features: usize) -> Box<dyn Layer> {
        match self {
            NormKind::Batch => Box::new(BatchNorm2d::new(features)),
            NormKind::Instance => Box::new(InstanceNorm2d::new(features)),
        }
    }

    /// Convolutions feeding an instance norm keep their bias; a batch norm's
    /// shift absorbs it.
    pub fn use_bias(self) -> bool {
        matches!(self, NormKind::Instance)
    }
}

fn check_channels(input: &Tensor, features: usize) -> TensorResult<(usize, usize, usize, usize)> {
    let (n, c, h, w) = input.dims4()?;
    if c != features {
        return Err(TensorError::ShapeMismatch {
            expected: vec![n, features, h, w],
            got: input.shape_vec(),
        });
    }
    Ok((n, c, h, w))
}

/// 2D batch normalization with learnable per-channel scale and shift.
///
/// Statistics are computed over the batch and spatial dimensions:
/// y = (x − μ_c) / √(σ²_c + ε) · γ_c + β_c
pub struct BatchNorm2d {
    pub num_features: usize,
    pub eps: f32,
    weight: Tensor, // γ, [C]
    bias: Tensor,   // β, [C]
}

impl BatchNorm2d {
    pub fn new(num_features: usize) -> Self {
        BatchNorm2d {
            num_features,
            eps: 1e-5,
            weight: Tensor::ones(vec![num_features]),
            bias: Tensor::zeros(vec![num_features]),
        }
    }
}

impl Layer for BatchNorm2d {
    fn kind(&self) -> LayerKind {
        LayerKind::BatchNorm
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let (n, c, h, w) = check_channels(input, self.num_features)?;
        let plane = h * w;
        let count = (n * plane) as f32;
        let x = input.data();
        let mut out = input.clone();
        let o = out.data_mut();
        for ch in 0..c {
            let mut mean = 0.0f32;
            for b in 0..n {
                let start = (b * c + ch) * plane;
                mean += x[start..start + plane].iter().sum::<f32>();
            }
            mean /= count;
            let mut var = 0.0f32;
            for b in 0..n {
                let start = (b * c + ch) * plane;
                var += x[start..start + plane]
                    .iter()
                    .map(|&v| (v - mean) * (v - mean))
                    .sum::<f32>();
            }
            var /= count;

            let gamma = self.weight.data()[ch];
            let beta = self.bias.data()[ch];
            let inv = (var + self.eps).sqrt().recip();
            for b in 0..n {
                let start = (b * c + ch) * plane;
                for v in &mut o[start..start + plane] {
                    *v = (*v - mean) * inv * gamma + beta;
                }
            }
        }
        Ok(out)
    }

    fn parameters(&self) -> Vec<(String, &Tensor)> {
        vec![
            ("weight".to_string(), &self.weight),
            ("bias".to_string(), &self.bias),
        ]
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        vec![
            ("weight".to_string(), &mut self.weight),
            ("bias".to_string(), &mut self.bias),
        ]
    }
}

/// 2D instance normalization, no learnable parameters.
///
/// Each (sample, channel) plane is normalized with its own statistics.
pub struct InstanceNorm2d {
    pub num_features: usize,
    pub eps: f32,
}

impl InstanceNorm2d {
    pub fn new(num_features: usize) -> Self {
        InstanceNorm2d {
            num_features,
            eps: 1e-5,
        }
    }
}

impl Layer for InstanceNorm2d {
    fn kind(&self) -> LayerKind {
        LayerKind::InstanceNorm
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let (n, c, h, w) = check_channels(input, self.num_features)?;
        let plane = h * w;
        let x = input.data();
        let mut out = input.clone();
        let o = out.data_mut();
        for b in 0..n {
            for ch in 0..c {
                let start = (b * c + ch) * plane;
                let slice = &x[start..start + plane];
                let mean = slice.iter().sum::<f32>() / plane as f32;
                let var =
                    slice.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / plane as f32;
                let inv = (var + self.eps).sqrt().recip();
                for v in &mut o[start..start + plane] {
                    *v = (*v - mean) * inv;
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_instance_norm_zero_mean_unit_var() {
        let norm = InstanceNorm2d::new(2);
        let x = Tensor::rand(vec![2, 2, 8, 8], Some(5)).mul_scalar(3.0).add_scalar(1.0);
        let y = norm.forward(&x).unwrap();
        let plane = 64;
        for b in 0..2 {
            for c in 0..2 {
                let start = (b * 2 + c) * plane;
                let s = &y.data()[start..start + plane];
                let mean: f32 = s.iter().sum::<f32>() / plane as f32;
                let var: f32 = s.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / plane as f32;
                assert_relative_eq!(mean, 0.0, epsilon = 1e-4);
                assert_relative_eq!(var, 1.0, epsilon = 1e-2);
            }
        }
    }

    #[test]
    fn test_batch_norm_applies_affine() {
        let mut norm = BatchNorm2d::new(1);
        for (name, t) in norm.parameters_mut() {
            if name == "weight" {
                t.fill(2.0);
            } else {
                t.fill(0.5);
            }
        }
        let x = Tensor::rand(vec![4, 1, 4, 4], Some(9));
        let y = norm.forward(&x).unwrap();
        let mean: f32 = y.data().iter().sum::<f32>() / y.numel() as f32;
        assert_relative_eq!(mean, 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_norm_rejects_channel_mismatch() {
        let norm = InstanceNorm2d::new(3);
        assert!(norm.forward(&Tensor::zeros(vec![1, 2, 4, 4])).is_err());
    }

    #[test]
    fn test_zero_input_stays_zero() {
        let x = Tensor::zeros(vec![1, 3, 4, 4]);
        let y = InstanceNorm2d::new(3).forward(&x).unwrap();
        assert!(y.data().iter().all(|&v| v == 0.0));
        let y = BatchNorm2d::new(3).forward(&x).unwrap();
        assert!(y.data().iter().all(|&v| v == 0.0));
    }
}
