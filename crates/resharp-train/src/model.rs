use crate::checkpoint::CheckpointTag;
use crate::error::{CheckpointError, TrainError};
use resharp_core::Tensor;
use std::collections::HashMap;

/// One unit of work from the data loader: tensors keyed by role
/// (e.g. "blurred", "sharp") plus the source paths they were decoded from.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    tensors: HashMap<String, Tensor>,
    pub paths: Vec<String>,
}

impl Batch {
    pub fn new() -> Self {
        Batch::default()
    }

    pub fn insert(&mut self, role: &str, tensor: Tensor) {
        self.tensors.insert(role.to_string(), tensor);
    }

    pub fn get(&self, role: &str) -> Option<&Tensor> {
        self.tensors.get(role)
    }

    /// Number of samples, taken from the leading axis of any tensor.
    pub fn batch_size(&self) -> usize {
        self.tensors
            .values()
            .next()
            .and_then(|t| t.shape().dim(0).ok())
            .unwrap_or(0)
    }
}

/// Data-loading collaborator. Batches arrive in loader order; iteration
/// order is never reshuffled mid-epoch.
pub trait BatchSource {
    /// Total number of training samples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Next batch, or `None` at the end of the epoch. A fetch failure
    /// surfaces as an error and halts the epoch.
    fn next_batch(&mut self) -> Option<Result<Batch, TrainError>>;

    /// Rewind to the start of a new epoch.
    fn reset(&mut self);
}

/// Optimization collaborator driven by the orchestrator. Owns the networks,
/// the losses and the optimizer state; the orchestrator only schedules it.
pub trait Model {
    fn set_input(&mut self, batch: Batch) -> Result<(), TrainError>;

    /// One forward + optimization step on the current input.
    fn optimize_parameters(&mut self) -> Result<(), TrainError>;

    /// Scalar error metrics of the latest step, in display order.
    fn current_errors(&self) -> Vec<(String, f64)>;

    /// Named image tensors of the latest step, for visualization.
    fn current_visuals(&self) -> Vec<(String, Tensor)>;

    /// Persist a named snapshot of every network.
    fn save(&mut self, tag: &CheckpointTag) -> Result<(), CheckpointError>;

    /// One learning-rate decay step, invoked between epochs.
    fn update_learning_rate(&mut self);
}
