use crate::config::DiscriminatorConfig;
use resharp_core::{Tensor, TensorResult};
use resharp_nn::{Conv2d, Layer, LayerKind, LeakyRelu, Sequential, Sigmoid};

/// Patch classifier: a strided 4×4 convolutional stack ending in a 1-channel
/// map of per-patch realism scores.
pub struct NLayerDiscriminator {
    model: Sequential,
}

const KW: usize = 4;
const PADW: usize = 1;

impl NLayerDiscriminator {
    pub(crate) fn build(cfg: &DiscriminatorConfig) -> Self {
        let ndf = cfg.base_width;
        let use_bias = cfg.norm.use_bias();

        let mut model = Sequential::new()
            .add(Conv2d::new(cfg.input_channels, ndf, KW, 2, PADW, true))
            .add(LeakyRelu::new(0.2));

        let mut mult = 1;
        for n in 1..cfg.n_layers {
            let prev = mult;
            mult = (1 << n).min(8);
            model = model
                .add(Conv2d::new(ndf * prev, ndf * mult, KW, 2, PADW, use_bias))
                .add_boxed(cfg.norm.build(ndf * mult))
                .add(LeakyRelu::new(0.2));
        }

        let prev = mult;
        mult = (1 << cfg.n_layers).min(8);
        model = model
            .add(Conv2d::new(ndf * prev, ndf * mult, KW, 1, PADW, use_bias))
            .add_boxed(cfg.norm.build(ndf * mult))
            .add(LeakyRelu::new(0.2))
            .add(Conv2d::new(ndf * mult, 1, KW, 1, PADW, true));

        if cfg.use_sigmoid {
            model = model.add(Sigmoid);
        }
        NLayerDiscriminator { model }
    }

    /// Spatial size of the patch map for a given input size.
    pub fn patch_map_dim(&self, input: usize, n_layers: usize) -> usize {
        let mut dim = input;
        for _ in 0..n_layers {
            dim = Conv2d::out_dim(dim, KW, 2, PADW);
        }
        dim = Conv2d::out_dim(dim, KW, 1, PADW);
        Conv2d::out_dim(dim, KW, 1, PADW)
    }
}

impl Layer for NLayerDiscriminator {
    fn kind(&self) -> LayerKind {
        LayerKind::Container
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        self.model.forward(input)
    }

    fn parameters(&self) -> Vec<(String, &Tensor)> {
        self.model
            .parameters()
            .into_iter()
            .map(|(n, t)| (format!("model.{n}"), t))
            .collect()
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        self.model
            .parameters_mut()
            .into_iter()
            .map(|(n, t)| (format!("model.{n}"), t))
            .collect()
    }

    fn set_training(&mut self, training: bool) {
        self.model.set_training(training);
    }

    fn children_mut(&mut self, f: &mut dyn FnMut(&mut dyn Layer)) {
        f(&mut self.model);
    }
}
