use crate::module::{Layer, LayerKind};
use resharp_core::{Tensor, TensorResult};

/// ReLU activation layer.
pub struct Relu;

impl Layer for Relu {
    fn kind(&self) -> LayerKind {
        LayerKind::Activation
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        Ok(input.relu())
    }
}

/// LeakyReLU activation: f(x) = x for x ≥ 0, slope·x otherwise.
pub struct LeakyRelu {
    pub slope: f32,
}

impl LeakyRelu {
    pub fn new(slope: f32) -> Self {
        LeakyRelu { slope }
    }
}

impl Layer for LeakyRelu {
    fn kind(&self) -> LayerKind {
        LayerKind::Activation
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        Ok(input.leaky_relu(self.slope))
    }
}

/// Tanh activation layer. Bounds its output to [-1, 1].
pub struct Tanh;

impl Layer for Tanh {
    fn kind(&self) -> LayerKind {
        LayerKind::Activation
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        Ok(input.tanh())
    }
}

/// Sigmoid activation layer.
pub struct Sigmoid;

impl Layer for Sigmoid {
    fn kind(&self) -> LayerKind {
        LayerKind::Activation
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        Ok(input.sigmoid())
    }
}

/// Dropout layer — randomly zeros elements during training, identity during
/// inference. Survivors are rescaled by 1/(1-p).
pub struct Dropout {
    pub p: f32,
    training: bool,
}

impl Dropout {
    pub fn new(p: f32) -> Self {
        Dropout { p, training: true }
    }
}

impl Layer for Dropout {
    fn kind(&self) -> LayerKind {
        LayerKind::Dropout
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        if !self.training {
            return Ok(input.clone());
        }
        let mask = Tensor::rand(input.shape_vec(), None);
        let scale = 1.0 / (1.0 - self.p);
        let data = input
            .data()
            .iter()
            .zip(mask.data().iter())
            .map(|(&v, &m)| if m > self.p { v * scale } else { 0.0 })
            .collect();
        Tensor::new(data, input.shape_vec())
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaky_relu_slope() {
        let l = LeakyRelu::new(0.2);
        let out = l
            .forward(&Tensor::new(vec![-1.0, 2.0], vec![2]).unwrap())
            .unwrap();
        assert_eq!(out.data(), &[-0.2, 2.0]);
    }

    #[test]
    fn test_dropout_eval_is_identity() {
        let mut d = Dropout::new(0.5);
        d.set_training(false);
        let x = Tensor::rand(vec![2, 3, 4, 4], Some(1));
        let y = d.forward(&x).unwrap();
        assert_eq!(x.data(), y.data());
    }

    #[test]
    fn test_dropout_training_zeroes_and_rescales() {
        let d = Dropout::new(0.5);
        let x = Tensor::ones(vec![1, 1, 32, 32]);
        let y = d.forward(&x).unwrap();
        for &v in y.data() {
            assert!(v == 0.0 || v == 2.0);
        }
        let kept = y.data().iter().filter(|&&v| v != 0.0).count();
        assert!(kept > 0 && kept < y.numel());
    }
}
