use resharp_core::TensorError;
use thiserror::Error;

/// Rejected network configuration. Raised before any parameter allocation.
#[derive(Debug, Error, Clone)]
pub enum ConfigError {
    #[error("generator model name [{0}] is not recognized")]
    UnknownGenerator(String),

    #[error("discriminator model name [{0}] is not recognized")]
    UnknownDiscriminator(String),

    #[error("normalization layer [{0}] is not found")]
    UnknownNorm(String),

    #[error("padding [{0}] is not implemented")]
    UnknownPadding(String),

    #[error("{key} must be positive")]
    NotPositive { key: &'static str },

    #[error("upscale factor {upscale} does not divide the decoder mid width {mid} at both upsampling stages")]
    InvalidUpscale { upscale: usize, mid: usize },

    #[error("blur kernel size must be odd and positive, got {0}")]
    InvalidBlurKernel(usize),

    #[error("blur sigma must be positive, got {0}")]
    InvalidBlurSigma(f32),

    #[error("discriminator needs at least one strided stage, got n_layers = {0}")]
    TooFewDiscriminatorLayers(usize),
}

/// A requested compute device cannot be used.
#[derive(Debug, Error, Clone)]
pub enum DeviceError {
    #[error("device lane {lane} requested but only {available} parallel lanes are available")]
    Unavailable { lane: usize, available: usize },
}

/// Failure during data-parallel execution. The whole dispatch aborts; no
/// partial results are exposed.
#[derive(Debug, Error, Clone)]
pub enum DispatchError {
    #[error("replica on device lane {lane} failed: {source}")]
    Replica {
        lane: usize,
        #[source]
        source: TensorError,
    },

    #[error(transparent)]
    Tensor(#[from] TensorError),
}
