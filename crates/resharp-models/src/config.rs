use crate::error::ConfigError;
use resharp_nn::{NormKind, PaddingKind, UpsampleMode};

/// Channel width of the decoder stage that the upscaling stages divide down
/// from. Fixed by the architecture.
pub const MID_WIDTH: usize = 100;

/// Which generator topology to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorVariant {
    /// Encoder → residual stack → decoder at the input resolution.
    Resnet,
    /// Extended decoder with four upsampling stages for upscale× output.
    ResnetSr,
    /// Like `ResnetSr`, but the encoder consumes the raw input concatenated
    /// with its smoothed copy (double the input channels).
    ResnetSrBlur,
}

impl GeneratorVariant {
    /// Resolve a variant name from the configuration surface. Unknown names
    /// fail here, before any network is constructed.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "resnet" => Ok(GeneratorVariant::Resnet),
            "resnet_sr" => Ok(GeneratorVariant::ResnetSr),
            "resnet_sr_blur" => Ok(GeneratorVariant::ResnetSrBlur),
            other => Err(ConfigError::UnknownGenerator(other.to_string())),
        }
    }

    pub fn is_super_resolution(self) -> bool {
        !matches!(self, GeneratorVariant::Resnet)
    }
}

/// Resolve a normalization name ("batch" / "instance").
pub fn parse_norm(name: &str) -> Result<NormKind, ConfigError> {
    match name {
        "batch" => Ok(NormKind::Batch),
        "instance" => Ok(NormKind::Instance),
        other => Err(ConfigError::UnknownNorm(other.to_string())),
    }
}

/// Resolve a padding-mode name ("reflect" / "replicate" / "zero").
pub fn parse_padding(name: &str) -> Result<PaddingKind, ConfigError> {
    match name {
        "reflect" => Ok(PaddingKind::Reflect),
        "replicate" => Ok(PaddingKind::Replicate),
        "zero" => Ok(PaddingKind::Zero),
        other => Err(ConfigError::UnknownPadding(other.to_string())),
    }
}

/// Fixed smoothing prior: kernel size and Gaussian spread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurPriorConfig {
    pub kernel_size: usize,
    pub sigma: f32,
}

impl Default for BlurPriorConfig {
    fn default() -> Self {
        BlurPriorConfig {
            kernel_size: 5,
            sigma: 1.0,
        }
    }
}

/// What gets added to the network output before the final clamp.
///
/// Selected once at validation time; there is no silent fallback. When
/// residual learning is off the network output is the image, full stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidualBase {
    /// No additive base.
    None,
    /// The input, upsampled to the output resolution.
    Upsampled,
    /// The upsampled input, smoothed by the blur prior.
    Blurred,
}

/// Everything the factory needs to build a generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub input_channels: usize,
    pub output_channels: usize,
    /// Encoder width of the first convolution (ngf).
    pub base_width: usize,
    pub variant: GeneratorVariant,
    pub norm: NormKind,
    pub residual_blocks: usize,
    pub padding: PaddingKind,
    pub use_dropout: bool,
    /// Predict a correction on top of an additive base instead of the image.
    pub learn_residual: bool,
    pub blur_prior: Option<BlurPriorConfig>,
    pub upscale: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            input_channels: 3,
            output_channels: 3,
            base_width: 64,
            variant: GeneratorVariant::ResnetSr,
            norm: NormKind::Instance,
            residual_blocks: 9,
            padding: PaddingKind::Reflect,
            use_dropout: false,
            learn_residual: false,
            blur_prior: None,
            upscale: 4,
        }
    }
}

impl GeneratorConfig {
    /// Fail fast on any invalid combination, before parameter allocation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("input_channels", self.input_channels),
            ("output_channels", self.output_channels),
            ("base_width", self.base_width),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive { key });
            }
        }
        if self.variant.is_super_resolution() {
            if self.upscale == 0 {
                return Err(ConfigError::NotPositive { key: "upscale" });
            }
            if MID_WIDTH % self.upscale != 0 || MID_WIDTH % (self.upscale * self.upscale) != 0 {
                return Err(ConfigError::InvalidUpscale {
                    upscale: self.upscale,
                    mid: MID_WIDTH,
                });
            }
        }
        if let Some(blur) = &self.blur_prior {
            if blur.kernel_size == 0 || blur.kernel_size % 2 == 0 {
                return Err(ConfigError::InvalidBlurKernel(blur.kernel_size));
            }
            if blur.sigma <= 0.0 {
                return Err(ConfigError::InvalidBlurSigma(blur.sigma));
            }
        }
        Ok(())
    }

    /// The additive base used by the super-resolution variants.
    pub fn residual_base(&self) -> ResidualBase {
        if !self.learn_residual {
            return ResidualBase::None;
        }
        match self.variant {
            GeneratorVariant::ResnetSr if self.blur_prior.is_some() => ResidualBase::Blurred,
            _ => ResidualBase::Upsampled,
        }
    }

    /// Interpolation used when upsampling the additive base. The
    /// blur-concat variant keeps hard pixel edges for its base; the plain
    /// super-resolution variant interpolates.
    pub fn base_interpolation(&self) -> UpsampleMode {
        match self.variant {
            GeneratorVariant::ResnetSrBlur => UpsampleMode::Nearest,
            _ => UpsampleMode::Bilinear,
        }
    }
}

/// Everything the factory needs to build a patch discriminator.
#[derive(Debug, Clone)]
pub struct DiscriminatorConfig {
    pub input_channels: usize,
    /// Width of the first stage (ndf).
    pub base_width: usize,
    /// Number of strided downsampling stages.
    pub n_layers: usize,
    pub norm: NormKind,
    /// Bound scores to (0, 1) for losses that expect probabilities.
    pub use_sigmoid: bool,
}

impl Default for DiscriminatorConfig {
    fn default() -> Self {
        DiscriminatorConfig {
            input_channels: 3,
            base_width: 64,
            n_layers: 3,
            norm: NormKind::Instance,
            use_sigmoid: false,
        }
    }
}

impl DiscriminatorConfig {
    /// Resolve the discriminator model name from the configuration surface:
    /// "basic" pins three strided stages, "n_layers" keeps the configured
    /// count. Unknown names fail before construction.
    pub fn resolve_variant(mut self, name: &str) -> Result<Self, ConfigError> {
        match name {
            "basic" => {
                self.n_layers = 3;
                Ok(self)
            }
            "n_layers" => Ok(self),
            other => Err(ConfigError::UnknownDiscriminator(other.to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("input_channels", self.input_channels),
            ("base_width", self.base_width),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive { key });
            }
        }
        if self.n_layers == 0 {
            return Err(ConfigError::TooFewDiscriminatorLayers(self.n_layers));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_unknown_names() {
        assert!(GeneratorVariant::parse("resnet_sr").is_ok());
        assert!(matches!(
            GeneratorVariant::parse("unet"),
            Err(ConfigError::UnknownGenerator(_))
        ));
        assert!(matches!(
            parse_norm("group"),
            Err(ConfigError::UnknownNorm(_))
        ));
        assert!(matches!(
            parse_padding("circular"),
            Err(ConfigError::UnknownPadding(_))
        ));
    }

    #[test]
    fn test_upscale_must_divide_mid_width() {
        let cfg = GeneratorConfig {
            upscale: 3,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidUpscale { upscale: 3, .. })
        ));

        let cfg = GeneratorConfig {
            upscale: 10,
            ..GeneratorConfig::default()
        };
        // 100 / 10 = 10 but 100 / 100 = 1: both stages stay integral
        assert!(cfg.validate().is_ok());

        let cfg = GeneratorConfig {
            upscale: 20,
            ..GeneratorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_residual_base_selection() {
        let mut cfg = GeneratorConfig {
            learn_residual: false,
            blur_prior: Some(BlurPriorConfig::default()),
            ..GeneratorConfig::default()
        };
        assert_eq!(cfg.residual_base(), ResidualBase::None);

        cfg.learn_residual = true;
        assert_eq!(cfg.residual_base(), ResidualBase::Blurred);

        cfg.blur_prior = None;
        assert_eq!(cfg.residual_base(), ResidualBase::Upsampled);

        cfg.variant = GeneratorVariant::ResnetSrBlur;
        cfg.blur_prior = Some(BlurPriorConfig::default());
        assert_eq!(cfg.residual_base(), ResidualBase::Upsampled);
    }

    #[test]
    fn test_discriminator_variant_resolution() {
        let cfg = DiscriminatorConfig {
            n_layers: 5,
            ..DiscriminatorConfig::default()
        };
        assert_eq!(cfg.clone().resolve_variant("basic").unwrap().n_layers, 3);
        assert_eq!(cfg.clone().resolve_variant("n_layers").unwrap().n_layers, 5);
        assert!(matches!(
            cfg.resolve_variant("pixel"),
            Err(ConfigError::UnknownDiscriminator(_))
        ));
    }

    #[test]
    fn test_blur_prior_validation() {
        let cfg = GeneratorConfig {
            blur_prior: Some(BlurPriorConfig {
                kernel_size: 4,
                sigma: 1.0,
            }),
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidBlurKernel(4))
        ));
    }
}
