use crate::activation::{Dropout, Relu};
use crate::conv::Conv2d;
use crate::module::{Layer, LayerKind};
use crate::norm::NormKind;
use crate::padding::{ReflectionPad2d, ReplicationPad2d};
use crate::sequential::Sequential;
use resharp_core::{Tensor, TensorResult};

/// How convolutions pad their input inside residual blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingKind {
    Reflect,
    Replicate,
    Zero,
}

fn pad_and_conv(body: Sequential, dim: usize, padding: PaddingKind, use_bias: bool) -> Sequential {
    match padding {
        PaddingKind::Reflect => body
            .add(ReflectionPad2d::new(1))
            .add(Conv2d::new(dim, dim, 3, 1, 0, use_bias)),
        PaddingKind::Replicate => body
            .add(ReplicationPad2d::new(1))
            .add(Conv2d::new(dim, dim, 3, 1, 0, use_bias)),
        PaddingKind::Zero => body.add(Conv2d::new(dim, dim, 3, 1, 1, use_bias)),
    }
}

/// Residual block: pad → conv3 → norm → ReLU → [dropout] → pad → conv3 → norm,
/// with an identity shortcut. Channel count and spatial size are preserved.
pub struct ResnetBlock {
    body: Sequential,
}

impl ResnetBlock {
    pub fn new(
        dim: usize,
        padding: PaddingKind,
        norm: NormKind,
        use_dropout: bool,
        use_bias: bool,
    ) -> Self {
        let mut body = pad_and_conv(Sequential::new(), dim, padding, use_bias)
            .add_boxed(norm.build(dim))
            .add(Relu);
        if use_dropout {
            body = body.add(Dropout::new(0.5));
        }
        let body = pad_and_conv(body, dim, padding, use_bias).add_boxed(norm.build(dim));
        ResnetBlock { body }
    }
}

impl Layer for ResnetBlock {
    fn kind(&self) -> LayerKind {
        LayerKind::Container
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        input.add(&self.body.forward(input)?)
    }

    fn parameters(&self) -> Vec<(String, &Tensor)> {
        self.body
            .parameters()
            .into_iter()
            .map(|(n, t)| (format!("body.{n}"), t))
            .collect()
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        self.body
            .parameters_mut()
            .into_iter()
            .map(|(n, t)| (format!("body.{n}"), t))
            .collect()
    }

    fn set_training(&mut self, training: bool) {
        self.body.set_training(training);
    }

    fn children_mut(&mut self, f: &mut dyn FnMut(&mut dyn Layer)) {
        f(&mut self.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::visit_mut;

    #[test]
    fn test_block_preserves_shape() {
        for padding in [PaddingKind::Reflect, PaddingKind::Replicate, PaddingKind::Zero] {
            let block = ResnetBlock::new(4, padding, NormKind::Instance, false, true);
            let x = Tensor::rand(vec![2, 4, 8, 8], Some(2));
            let y = block.forward(&x).unwrap();
            assert_eq!(y.shape_vec(), x.shape_vec());
        }
    }

    #[test]
    fn test_zeroed_block_is_identity() {
        // with every weight and bias zeroed the residual branch contributes
        // nothing, so the shortcut carries the input through untouched
        let mut block = ResnetBlock::new(3, PaddingKind::Reflect, NormKind::Instance, false, true);
        visit_mut(&mut block, &mut |layer| {
            for (_, t) in layer.parameters_mut() {
                t.fill(0.0);
            }
        });
        let x = Tensor::rand(vec![1, 3, 6, 6], Some(4));
        let y = block.forward(&x).unwrap();
        assert_eq!(x.data(), y.data());
    }

    #[test]
    fn test_dropout_block_in_eval_mode_is_deterministic() {
        let mut block = ResnetBlock::new(2, PaddingKind::Zero, NormKind::Instance, true, true);
        block.set_training(false);
        let x = Tensor::rand(vec![1, 2, 8, 8], Some(6));
        let a = block.forward(&x).unwrap();
        let b = block.forward(&x).unwrap();
        assert_eq!(a.data(), b.data());
    }
}
