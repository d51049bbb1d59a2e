use crate::checkpoint::{CheckpointStore, CheckpointTag};
use crate::error::TrainError;
use resharp_core::Tensor;
use resharp_models::{build_generator, DeviceDispatcher, DeviceSet, Generator, GeneratorConfig};
use resharp_nn::Layer;

/// Restore-only session: a generator rebuilt from its configuration, loaded
/// from a tagged checkpoint and switched to inference behavior.
pub struct InferenceSession {
    net: Generator,
    dispatcher: DeviceDispatcher,
}

impl std::fmt::Debug for InferenceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceSession").finish_non_exhaustive()
    }
}

impl InferenceSession {
    pub fn load(
        cfg: &GeneratorConfig,
        devices: DeviceSet,
        store: &CheckpointStore,
        tag: &CheckpointTag,
        label: &str,
    ) -> Result<Self, TrainError> {
        let mut net = build_generator(cfg, None)?;
        store.load(tag, label, &mut net)?;
        net.set_training(false);
        Ok(InferenceSession {
            net,
            dispatcher: DeviceDispatcher::new(devices),
        })
    }

    /// Run one degraded batch through the generator.
    pub fn restore(&self, input: &Tensor) -> Result<Tensor, TrainError> {
        Ok(self.dispatcher.forward(&self.net, input)?)
    }

    pub fn network(&self) -> &Generator {
        &self.net
    }
}
