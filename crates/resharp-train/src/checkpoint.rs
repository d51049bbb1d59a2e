use crate::error::CheckpointError;
use resharp_core::Tensor;
use resharp_nn::Layer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Identifies a snapshot: the rolling "latest" or a pinned epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointTag {
    Latest,
    Epoch(usize),
}

impl fmt::Display for CheckpointTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointTag::Latest => write!(f, "latest"),
            CheckpointTag::Epoch(n) => write!(f, "{n}"),
        }
    }
}

/// Serializable snapshot of a network: named tensors with their shapes.
#[derive(Debug, Serialize, Deserialize)]
pub struct NetworkState {
    pub tensors: Vec<(String, Vec<f32>, Vec<usize>)>,
}

impl NetworkState {
    /// Capture every trainable parameter of `net`, in parameter order.
    pub fn capture(net: &dyn Layer) -> Self {
        let tensors = net
            .parameters()
            .into_iter()
            .map(|(name, t)| (name, t.data().to_vec(), t.shape_vec()))
            .collect();
        NetworkState { tensors }
    }

    fn find(&self, name: &str) -> Option<&(String, Vec<f32>, Vec<usize>)> {
        self.tensors.iter().find(|(n, _, _)| n == name)
    }

    /// Write the snapshot back into `net`. The network topology must match
    /// exactly: same parameter count, names and shapes.
    pub fn apply(&self, net: &mut dyn Layer) -> Result<(), CheckpointError> {
        let expected = net.parameters().len();
        if self.tensors.len() != expected {
            return Err(CheckpointError::ParameterCountMismatch {
                expected,
                got: self.tensors.len(),
            });
        }
        for (name, param) in net.parameters_mut() {
            let (_, data, shape) = self
                .find(&name)
                .ok_or_else(|| CheckpointError::MissingTensor(name.clone()))?;
            if *shape != param.shape_vec() || data.len() != param.numel() {
                return Err(CheckpointError::TopologyMismatch {
                    name,
                    expected: param.shape_vec(),
                    got: shape.clone(),
                });
            }
            param.data_mut().copy_from_slice(data);
        }
        Ok(())
    }
}

/// On-disk checkpoint directory. Snapshots are immutable once written;
/// writes go through a temp file and a rename so a crash never leaves a
/// half-written checkpoint under its final name.
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(CheckpointStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{tag}_net_{label}.json` inside the store directory.
    pub fn path(&self, tag: &CheckpointTag, label: &str) -> PathBuf {
        self.dir.join(format!("{tag}_net_{label}.json"))
    }

    pub fn exists(&self, tag: &CheckpointTag, label: &str) -> bool {
        self.path(tag, label).is_file()
    }

    pub fn save(
        &self,
        tag: &CheckpointTag,
        label: &str,
        net: &dyn Layer,
    ) -> Result<(), CheckpointError> {
        let path = self.path(tag, label);
        let state = NetworkState::capture(net);
        let json = serde_json::to_string(&state).map_err(|e| CheckpointError::Malformed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn load(
        &self,
        tag: &CheckpointTag,
        label: &str,
        net: &mut dyn Layer,
    ) -> Result<(), CheckpointError> {
        let path = self.path(tag, label);
        let json = fs::read_to_string(&path)?;
        let state: NetworkState =
            serde_json::from_str(&json).map_err(|e| CheckpointError::Malformed {
                path: path.clone(),
                message: e.to_string(),
            })?;
        state.apply(net)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resharp_nn::{Conv2d, Sequential};

    fn test_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("resharp-checkpoint-{}-{name}", std::process::id()))
    }

    fn net(seed: u64) -> Sequential {
        let mut net = Sequential::new().add(Conv2d::new(2, 3, 3, 1, 1, true));
        resharp_nn::init_weights(&mut net, Some(seed));
        net
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = test_dir("roundtrip");
        let store = CheckpointStore::new(&dir).unwrap();
        let source = net(1);
        store.save(&CheckpointTag::Latest, "g", &source).unwrap();
        assert!(store.exists(&CheckpointTag::Latest, "g"));

        let mut target = net(2);
        store.load(&CheckpointTag::Latest, "g", &mut target).unwrap();
        let a = source.parameters();
        let b = target.parameters();
        for ((_, ta), (_, tb)) in a.iter().zip(b.iter()) {
            assert_eq!(ta.data(), tb.data());
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_epoch_tag_names_file_by_number() {
        let store = CheckpointStore::new(test_dir("tags")).unwrap();
        let path = store.path(&CheckpointTag::Epoch(12), "d");
        assert!(path.ends_with("12_net_d.json"));
        let path = store.path(&CheckpointTag::Latest, "g");
        assert!(path.ends_with("latest_net_g.json"));
    }

    #[test]
    fn test_topology_mismatch_rejected() {
        let dir = test_dir("mismatch");
        let store = CheckpointStore::new(&dir).unwrap();
        let source = net(1);
        store.save(&CheckpointTag::Latest, "g", &source).unwrap();

        let mut wrong = Sequential::new().add(Conv2d::new(2, 4, 3, 1, 1, true));
        let err = store
            .load(&CheckpointTag::Latest, "g", &mut wrong)
            .unwrap_err();
        assert!(matches!(err, CheckpointError::TopologyMismatch { .. }));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_malformed_checkpoint_rejected() {
        let dir = test_dir("malformed");
        let store = CheckpointStore::new(&dir).unwrap();
        let path = store.path(&CheckpointTag::Latest, "g");
        fs::write(&path, "not json").unwrap();
        let mut target = net(1);
        let err = store
            .load(&CheckpointTag::Latest, "g", &mut target)
            .unwrap_err();
        assert!(matches!(err, CheckpointError::Malformed { .. }));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_checkpoint_is_io_error() {
        let dir = test_dir("missing");
        let store = CheckpointStore::new(&dir).unwrap();
        let mut target = net(1);
        let err = store
            .load(&CheckpointTag::Epoch(99), "g", &mut target)
            .unwrap_err();
        assert!(matches!(err, CheckpointError::Io(_)));
        fs::remove_dir_all(&dir).ok();
    }
}
