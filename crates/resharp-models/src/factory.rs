use crate::config::{DiscriminatorConfig, GeneratorConfig, GeneratorVariant, ResidualBase};
use crate::discriminator::NLayerDiscriminator;
use crate::error::ConfigError;
use crate::generator::{ResnetGenerator, ResnetGeneratorSr, ResnetGeneratorSrBlur};
use resharp_core::{Tensor, TensorResult};
use resharp_nn::{init_weights, GaussianFilter, Layer, LayerKind};

/// A constructed generator of any variant.
pub enum Generator {
    Resnet(ResnetGenerator),
    Sr(ResnetGeneratorSr),
    SrBlur(ResnetGeneratorSrBlur),
}

impl Generator {
    fn inner(&self) -> &dyn Layer {
        match self {
            Generator::Resnet(g) => g,
            Generator::Sr(g) => g,
            Generator::SrBlur(g) => g,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Layer {
        match self {
            Generator::Resnet(g) => g,
            Generator::Sr(g) => g,
            Generator::SrBlur(g) => g,
        }
    }
}

impl Layer for Generator {
    fn kind(&self) -> LayerKind {
        LayerKind::Container
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        self.inner().forward(input)
    }

    fn parameters(&self) -> Vec<(String, &Tensor)> {
        self.inner().parameters()
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        self.inner_mut().parameters_mut()
    }

    fn set_training(&mut self, training: bool) {
        self.inner_mut().set_training(training);
    }

    fn children_mut(&mut self, f: &mut dyn FnMut(&mut dyn Layer)) {
        f(self.inner_mut());
    }
}

fn build_blur(cfg: &GeneratorConfig, channels: usize) -> Result<Option<GaussianFilter>, ConfigError> {
    match &cfg.blur_prior {
        Some(blur) => GaussianFilter::new(channels, blur.kernel_size, blur.sigma)
            .map(Some)
            .map_err(|_| ConfigError::InvalidBlurKernel(blur.kernel_size)),
        None => Ok(None),
    }
}

/// Validate a configuration, build the requested generator variant and
/// randomize its weights. Nothing is allocated for invalid configurations.
pub fn build_generator(cfg: &GeneratorConfig, seed: Option<u64>) -> Result<Generator, ConfigError> {
    cfg.validate()?;
    let mut net = match cfg.variant {
        GeneratorVariant::Resnet => Generator::Resnet(ResnetGenerator::build(cfg)),
        GeneratorVariant::ResnetSr => {
            // the smoothing filter runs on the already-upsampled base image
            let blur = match cfg.residual_base() {
                ResidualBase::Blurred => build_blur(cfg, cfg.input_channels)?,
                _ => None,
            };
            Generator::Sr(ResnetGeneratorSr::build(cfg, blur))
        }
        GeneratorVariant::ResnetSrBlur => {
            let blur = build_blur(cfg, cfg.input_channels)?;
            Generator::SrBlur(ResnetGeneratorSrBlur::build(cfg, blur))
        }
    };
    init_weights(&mut net, seed);
    Ok(net)
}

/// Validate a configuration, build the patch discriminator and randomize its
/// weights.
pub fn build_discriminator(
    cfg: &DiscriminatorConfig,
    seed: Option<u64>,
) -> Result<NLayerDiscriminator, ConfigError> {
    cfg.validate()?;
    let mut net = NLayerDiscriminator::build(cfg);
    init_weights(&mut net, seed);
    Ok(net)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlurPriorConfig;
    use resharp_nn::{NormKind, PaddingKind};

    fn small_generator_config() -> GeneratorConfig {
        GeneratorConfig {
            base_width: 8,
            residual_blocks: 2,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_invalid_config_builds_nothing() {
        let cfg = GeneratorConfig {
            base_width: 0,
            ..GeneratorConfig::default()
        };
        assert!(build_generator(&cfg, Some(0)).is_err());
    }

    #[test]
    fn test_plain_generator_preserves_shape() {
        let cfg = GeneratorConfig {
            variant: GeneratorVariant::Resnet,
            base_width: 8,
            residual_blocks: 2,
            ..GeneratorConfig::default()
        };
        let net = build_generator(&cfg, Some(0)).unwrap();
        let x = Tensor::rand(vec![1, 3, 16, 16], Some(1));
        let y = net.forward(&x).unwrap();
        assert_eq!(y.shape_vec(), vec![1, 3, 16, 16]);
        assert!(y.data().iter().all(|&v| (-1.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_plain_generator_zero_input_is_spatially_uniform() {
        // zero input, zero biases: every activation stays exactly zero all
        // the way through, so the output is uniform
        let cfg = GeneratorConfig {
            variant: GeneratorVariant::Resnet,
            base_width: 16,
            residual_blocks: 3,
            norm: NormKind::Instance,
            padding: PaddingKind::Reflect,
            ..GeneratorConfig::default()
        };
        let net = build_generator(&cfg, Some(0)).unwrap();
        let x = Tensor::zeros(vec![1, 3, 32, 32]);
        let y = net.forward(&x).unwrap();
        assert_eq!(y.shape_vec(), vec![1, 3, 32, 32]);
        let first = y.data()[0];
        assert!(y.data().iter().all(|&v| v == first));
        assert_eq!(first, 0.0);
    }

    #[test]
    fn test_sr_generator_upscales_by_factor() {
        let cfg = small_generator_config();
        let net = build_generator(&cfg, Some(0)).unwrap();
        let x = Tensor::rand(vec![1, 3, 8, 8], Some(2));
        let y = net.forward(&x).unwrap();
        assert_eq!(y.shape_vec(), vec![1, 3, 32, 32]);
        assert!(y.data().iter().all(|&v| (-1.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_sr_generator_with_blurred_residual_base() {
        let cfg = GeneratorConfig {
            learn_residual: true,
            blur_prior: Some(BlurPriorConfig::default()),
            ..small_generator_config()
        };
        let net = build_generator(&cfg, Some(0)).unwrap();
        let x = Tensor::rand(vec![2, 3, 8, 8], Some(3));
        let y = net.forward(&x).unwrap();
        assert_eq!(y.shape_vec(), vec![2, 3, 32, 32]);
        assert!(y.data().iter().all(|&v| (-1.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_sr_blur_generator_consumes_doubled_channels() {
        let cfg = GeneratorConfig {
            variant: GeneratorVariant::ResnetSrBlur,
            learn_residual: true,
            blur_prior: Some(BlurPriorConfig::default()),
            ..small_generator_config()
        };
        let net = build_generator(&cfg, Some(0)).unwrap();
        // first convolution sees 6 channels
        let (name, weight) = &net.parameters()[0];
        assert!(name.ends_with("weight"));
        assert_eq!(weight.shape_vec(), vec![8, 6, 7, 7]);

        let x = Tensor::rand(vec![1, 3, 8, 8], Some(4));
        let y = net.forward(&x).unwrap();
        assert_eq!(y.shape_vec(), vec![1, 3, 32, 32]);
    }

    #[test]
    fn test_sr_blur_generator_without_filter_duplicates_input() {
        let cfg = GeneratorConfig {
            variant: GeneratorVariant::ResnetSrBlur,
            blur_prior: None,
            ..small_generator_config()
        };
        let net = build_generator(&cfg, Some(0)).unwrap();
        let x = Tensor::rand(vec![1, 3, 8, 8], Some(5));
        assert_eq!(net.forward(&x).unwrap().shape_vec(), vec![1, 3, 32, 32]);
    }

    #[test]
    fn test_discriminator_patch_map_shape() {
        let cfg = DiscriminatorConfig {
            base_width: 8,
            ..DiscriminatorConfig::default()
        };
        let net = build_discriminator(&cfg, Some(0)).unwrap();
        assert_eq!(net.patch_map_dim(256, cfg.n_layers), 30);
        let x = Tensor::rand(vec![1, 3, 256, 256], Some(6));
        let y = net.forward(&x).unwrap();
        assert_eq!(y.shape_vec(), vec![1, 1, 30, 30]);
    }

    #[test]
    fn test_discriminator_default_width_small_input() {
        let cfg = DiscriminatorConfig::default();
        let net = build_discriminator(&cfg, Some(0)).unwrap();
        let x = Tensor::rand(vec![1, 3, 64, 64], Some(7));
        let y = net.forward(&x).unwrap();
        // 64 -> 32 -> 16 -> 8 -> 7 -> 6
        assert_eq!(y.shape_vec(), vec![1, 1, 6, 6]);
    }

    #[test]
    fn test_discriminator_sigmoid_bounds_scores() {
        let cfg = DiscriminatorConfig {
            base_width: 8,
            use_sigmoid: true,
            ..DiscriminatorConfig::default()
        };
        let net = build_discriminator(&cfg, Some(0)).unwrap();
        let x = Tensor::rand(vec![1, 3, 32, 32], Some(8));
        let y = net.forward(&x).unwrap();
        assert!(y.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    // Full-size check of the published 256×256 scenario; slow in debug
    // builds, so opt-in.
    #[test]
    #[ignore]
    fn test_discriminator_full_width_full_size() {
        let cfg = DiscriminatorConfig::default();
        let net = build_discriminator(&cfg, Some(0)).unwrap();
        let x = Tensor::rand(vec![1, 3, 256, 256], Some(9));
        assert_eq!(net.forward(&x).unwrap().shape_vec(), vec![1, 1, 30, 30]);
    }
}
