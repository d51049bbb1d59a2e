use resharp_core::TensorError;
use resharp_models::{ConfigError, DeviceError, DispatchError};
use std::path::PathBuf;
use thiserror::Error;

/// Malformed or incompatible checkpoint. Fatal to a resume or inference load.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed checkpoint at {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("checkpoint tensor {name} has shape {got:?}, network expects {expected:?}")]
    TopologyMismatch {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("checkpoint is missing tensor {0}")]
    MissingTensor(String),

    #[error("checkpoint holds {got} tensors, network has {expected}")]
    ParameterCountMismatch { expected: usize, got: usize },
}

/// Any failure surfaced to the training orchestrator. Nothing is retried or
/// downgraded; the loop halts on the first error.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("batch fetch failed: {0}")]
    Fetch(String),

    #[error("optimization step failed: {0}")]
    Optimize(String),

    #[error("report sink failed: {0}")]
    Report(String),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Tensor(#[from] TensorError),
}
