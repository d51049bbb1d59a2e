pub mod activation;
pub mod block;
pub mod blur;
pub mod conv;
pub mod init;
pub mod module;
pub mod norm;
pub mod padding;
pub mod resample;
pub mod sequential;

pub use activation::{Dropout, LeakyRelu, Relu, Sigmoid, Tanh};
pub use block::{PaddingKind, ResnetBlock};
pub use blur::{gaussian_kernel, GaussianFilter};
pub use conv::{Conv2d, ConvTranspose2d};
pub use init::init_weights;
pub use module::{visit_mut, Layer, LayerKind};
pub use norm::{BatchNorm2d, InstanceNorm2d, NormKind};
pub use padding::{ReflectionPad2d, ReplicationPad2d};
pub use resample::{Upsample2d, UpsampleMode};
pub use sequential::Sequential;
