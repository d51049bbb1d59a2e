use crate::config::{GeneratorConfig, ResidualBase, MID_WIDTH};
use resharp_core::{Tensor, TensorResult};
use resharp_nn::{
    Conv2d, ConvTranspose2d, GaussianFilter, Layer, LayerKind, ReflectionPad2d, Relu, ResnetBlock,
    Sequential, Tanh, Upsample2d,
};

/// Shared encoder + residual stack: reflect-pad → 7×7 conv → two strided
/// downsampling stages → `residual_blocks` ResnetBlocks at 4× width.
fn encoder(cfg: &GeneratorConfig, input_channels: usize) -> Sequential {
    let ngf = cfg.base_width;
    let use_bias = cfg.norm.use_bias();
    let mut model = Sequential::new()
        .add(ReflectionPad2d::new(3))
        .add(Conv2d::new(input_channels, ngf, 7, 1, 0, use_bias))
        .add_boxed(cfg.norm.build(ngf))
        .add(Relu)
        .add(Conv2d::new(ngf, ngf * 2, 3, 2, 1, use_bias))
        .add_boxed(cfg.norm.build(ngf * 2))
        .add(Relu)
        .add(Conv2d::new(ngf * 2, ngf * 4, 3, 2, 1, use_bias))
        .add_boxed(cfg.norm.build(ngf * 4))
        .add(Relu);
    for _ in 0..cfg.residual_blocks {
        model = model.add(ResnetBlock::new(
            ngf * 4,
            cfg.padding,
            cfg.norm,
            cfg.use_dropout,
            use_bias,
        ));
    }
    model
}

fn upsampling_stage(
    model: Sequential,
    cfg: &GeneratorConfig,
    in_width: usize,
    out_width: usize,
) -> Sequential {
    let use_bias = cfg.norm.use_bias();
    model
        .add(ConvTranspose2d::new(in_width, out_width, 3, 2, 1, 1, use_bias))
        .add_boxed(cfg.norm.build(out_width))
        .add(Relu)
}

fn output_stage(model: Sequential, cfg: &GeneratorConfig, in_width: usize) -> Sequential {
    model
        .add(ReflectionPad2d::new(3))
        .add(Conv2d::new(in_width, cfg.output_channels, 7, 1, 0, true))
        .add(Tanh)
}

/// Decoder of the super-resolution variants: four upsampling stages
/// narrowing 4·ngf → 2·ngf → 100 → 100/s → 100/s², then the 7×7 output head.
fn sr_decoder(model: Sequential, cfg: &GeneratorConfig) -> Sequential {
    let ngf = cfg.base_width;
    let s = cfg.upscale;
    let model = upsampling_stage(model, cfg, ngf * 4, ngf * 2);
    let model = upsampling_stage(model, cfg, ngf * 2, MID_WIDTH);
    let model = upsampling_stage(model, cfg, MID_WIDTH, MID_WIDTH / s);
    let model = upsampling_stage(model, cfg, MID_WIDTH / s, MID_WIDTH / (s * s));
    output_stage(model, cfg, MID_WIDTH / (s * s))
}

/// Image-to-image generator at the input resolution.
///
/// With `learn_residual` the network predicts a correction that is added to
/// the input before clamping to [-1, 1].
pub struct ResnetGenerator {
    model: Sequential,
    learn_residual: bool,
}

impl ResnetGenerator {
    pub(crate) fn build(cfg: &GeneratorConfig) -> Self {
        let ngf = cfg.base_width;
        let model = encoder(cfg, cfg.input_channels);
        let model = upsampling_stage(model, cfg, ngf * 4, ngf * 2);
        let model = upsampling_stage(model, cfg, ngf * 2, ngf);
        let model = output_stage(model, cfg, ngf);
        ResnetGenerator {
            model,
            learn_residual: cfg.learn_residual,
        }
    }
}

impl Layer for ResnetGenerator {
    fn kind(&self) -> LayerKind {
        LayerKind::Container
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let output = self.model.forward(input)?;
        if self.learn_residual {
            Ok(input.add(&output)?.clamp(-1.0, 1.0))
        } else {
            Ok(output)
        }
    }

    fn parameters(&self) -> Vec<(String, &Tensor)> {
        prefixed(&self.model)
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        prefixed_mut(&mut self.model)
    }

    fn set_training(&mut self, training: bool) {
        self.model.set_training(training);
    }

    fn children_mut(&mut self, f: &mut dyn FnMut(&mut dyn Layer)) {
        f(&mut self.model);
    }
}

/// Super-resolution generator: same encoder, four-stage decoder, output
/// spatial size = upscale × input size.
pub struct ResnetGeneratorSr {
    model: Sequential,
    base: ResidualBase,
    upsample: Upsample2d,
    blur: Option<GaussianFilter>,
}

impl ResnetGeneratorSr {
    pub(crate) fn build(cfg: &GeneratorConfig, blur: Option<GaussianFilter>) -> Self {
        let model = sr_decoder(encoder(cfg, cfg.input_channels), cfg);
        ResnetGeneratorSr {
            model,
            base: cfg.residual_base(),
            upsample: Upsample2d::new(cfg.upscale, cfg.base_interpolation()),
            blur,
        }
    }
}

impl Layer for ResnetGeneratorSr {
    fn kind(&self) -> LayerKind {
        LayerKind::Container
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let output = self.model.forward(input)?;
        let base = match (&self.base, &self.blur) {
            (ResidualBase::None, _) => return Ok(output),
            (ResidualBase::Upsampled, _) => self.upsample.forward(input)?,
            (ResidualBase::Blurred, Some(blur)) => {
                blur.forward(&self.upsample.forward(input)?)?
            }
            // validation guarantees a filter when the base is Blurred
            (ResidualBase::Blurred, None) => self.upsample.forward(input)?,
        };
        Ok(base.add(&output)?.clamp(-1.0, 1.0))
    }

    fn parameters(&self) -> Vec<(String, &Tensor)> {
        prefixed(&self.model)
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        prefixed_mut(&mut self.model)
    }

    fn set_training(&mut self, training: bool) {
        self.model.set_training(training);
    }

    fn children_mut(&mut self, f: &mut dyn FnMut(&mut dyn Layer)) {
        f(&mut self.model);
    }
}

/// Super-resolution generator whose encoder sees the raw input concatenated
/// with its smoothed copy, so the first convolution consumes twice the
/// configured input channels. Without a blur prior the input is duplicated.
pub struct ResnetGeneratorSrBlur {
    model: Sequential,
    base: ResidualBase,
    upsample: Upsample2d,
    blur: Option<GaussianFilter>,
}

impl ResnetGeneratorSrBlur {
    pub(crate) fn build(cfg: &GeneratorConfig, blur: Option<GaussianFilter>) -> Self {
        let model = sr_decoder(encoder(cfg, cfg.input_channels * 2), cfg);
        ResnetGeneratorSrBlur {
            model,
            base: cfg.residual_base(),
            upsample: Upsample2d::new(cfg.upscale, cfg.base_interpolation()),
            blur,
        }
    }
}

impl Layer for ResnetGeneratorSrBlur {
    fn kind(&self) -> LayerKind {
        LayerKind::Container
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let smoothed = match &self.blur {
            Some(blur) => blur.forward(input)?,
            None => input.clone(),
        };
        let doubled = Tensor::concat(&[input, &smoothed], 1)?;
        let output = self.model.forward(&doubled)?;
        match self.base {
            ResidualBase::None => Ok(output),
            _ => Ok(self.upsample.forward(input)?.add(&output)?.clamp(-1.0, 1.0)),
        }
    }

    fn parameters(&self) -> Vec<(String, &Tensor)> {
        prefixed(&self.model)
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        prefixed_mut(&mut self.model)
    }

    fn set_training(&mut self, training: bool) {
        self.model.set_training(training);
    }

    fn children_mut(&mut self, f: &mut dyn FnMut(&mut dyn Layer)) {
        f(&mut self.model);
    }
}

fn prefixed(model: &Sequential) -> Vec<(String, &Tensor)> {
    model
        .parameters()
        .into_iter()
        .map(|(n, t)| (format!("model.{n}"), t))
        .collect()
}

fn prefixed_mut(model: &mut Sequential) -> Vec<(String, &mut Tensor)> {
    model
        .parameters_mut()
        .into_iter()
        .map(|(n, t)| (format!("model.{n}"), t))
        .collect()
}
