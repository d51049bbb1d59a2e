use crate::error::{DeviceError, DispatchError};
use rayon::prelude::*;
use resharp_core::Tensor;
use resharp_nn::Layer;

/// Ordered set of compute lanes a network may run on. Lanes are logical CPU
/// workers; requesting more than the host offers fails at construction, not
/// at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSet {
    lanes: Vec<usize>,
}

impl DeviceSet {
    /// Single-lane execution on the calling thread.
    pub fn current() -> Self {
        DeviceSet { lanes: vec![0] }
    }

    pub fn new(lanes: Vec<usize>) -> Result<Self, DeviceError> {
        let available = available_lanes();
        for &lane in &lanes {
            if lane >= available {
                return Err(DeviceError::Unavailable { lane, available });
            }
        }
        Ok(DeviceSet { lanes })
    }

    pub fn lanes(&self) -> &[usize] {
        &self.lanes
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn is_parallel(&self) -> bool {
        self.lanes.len() > 1
    }
}

/// Number of parallel lanes the host offers.
pub fn available_lanes() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Synchronous data-parallel executor.
///
/// With more than one lane and more than one sample, the batch is split
/// along its leading axis, every part runs a replica concurrently, and the
/// outputs are concatenated in the original order. The call blocks until
/// every replica finishes; a failing replica aborts the whole dispatch.
pub struct DeviceDispatcher {
    set: DeviceSet,
}

impl DeviceDispatcher {
    pub fn new(set: DeviceSet) -> Self {
        DeviceDispatcher { set }
    }

    pub fn device_set(&self) -> &DeviceSet {
        &self.set
    }

    pub fn forward(&self, net: &dyn Layer, input: &Tensor) -> Result<Tensor, DispatchError> {
        let batch = input.shape().dim(0)?;
        if !self.set.is_parallel() || batch < 2 {
            return net.forward(input).map_err(DispatchError::Tensor);
        }

        let parts = input.chunk(self.set.len())?;
        let results: Vec<Result<Tensor, DispatchError>> = parts
            .par_iter()
            .enumerate()
            .map(|(i, part)| {
                net.forward(part).map_err(|source| DispatchError::Replica {
                    lane: self.set.lanes()[i],
                    source,
                })
            })
            .collect();

        let mut outputs = Vec::with_capacity(results.len());
        for r in results {
            outputs.push(r?);
        }
        let refs: Vec<&Tensor> = outputs.iter().collect();
        Tensor::concat(&refs, 0).map_err(DispatchError::Tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resharp_nn::{Conv2d, Relu, Sequential};

    fn small_net() -> Sequential {
        Sequential::new()
            .add(Conv2d::new(2, 4, 3, 1, 1, true))
            .add(Relu)
    }

    #[test]
    fn test_rejects_unavailable_lane() {
        let err = DeviceSet::new(vec![usize::MAX]).unwrap_err();
        assert!(matches!(err, DeviceError::Unavailable { .. }));
    }

    #[test]
    fn test_single_lane_matches_direct_execution() {
        let net = small_net();
        let x = Tensor::rand(vec![4, 2, 8, 8], Some(0));
        let direct = net.forward(&x).unwrap();
        let dispatcher = DeviceDispatcher::new(DeviceSet::new(vec![0]).unwrap());
        let via = dispatcher.forward(&net, &x).unwrap();
        assert_eq!(direct.data(), via.data());
    }

    #[test]
    fn test_parallel_dispatch_preserves_order_and_values() {
        if available_lanes() < 2 {
            return;
        }
        let net = small_net();
        let x = Tensor::rand(vec![5, 2, 8, 8], Some(1));
        let direct = net.forward(&x).unwrap();
        let dispatcher = DeviceDispatcher::new(DeviceSet::new(vec![0, 1]).unwrap());
        let via = dispatcher.forward(&net, &x).unwrap();
        assert_eq!(direct.shape_vec(), via.shape_vec());
        // per-sample operators make the split/merge exact
        assert_eq!(direct.data(), via.data());
    }

    #[test]
    fn test_replica_failure_aborts_dispatch() {
        if available_lanes() < 2 {
            return;
        }
        let net = small_net();
        // wrong channel count: every replica fails, the dispatch propagates
        let x = Tensor::rand(vec![4, 3, 8, 8], Some(2));
        let dispatcher = DeviceDispatcher::new(DeviceSet::new(vec![0, 1]).unwrap());
        let err = dispatcher.forward(&net, &x).unwrap_err();
        assert!(matches!(err, DispatchError::Replica { .. }));
    }
}
