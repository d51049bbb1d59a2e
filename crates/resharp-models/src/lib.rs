pub mod config;
pub mod device;
pub mod discriminator;
pub mod error;
pub mod factory;
pub mod generator;

pub use config::{
    BlurPriorConfig, DiscriminatorConfig, GeneratorConfig, GeneratorVariant, ResidualBase,
    MID_WIDTH,
};
pub use device::{DeviceDispatcher, DeviceSet};
pub use discriminator::NLayerDiscriminator;
pub use error::{ConfigError, DeviceError, DispatchError};
pub use factory::{build_discriminator, build_generator, Generator};
pub use generator::{ResnetGenerator, ResnetGeneratorSr, ResnetGeneratorSrBlur};
