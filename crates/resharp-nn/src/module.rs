use resharp_core::{Tensor, TensorResult};

/// Capability tag assigned to every layer at construction. Weight
/// initialization and other structural passes dispatch on this tag rather
/// than inspecting concrete types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Convolution,
    BatchNorm,
    InstanceNorm,
    Activation,
    Padding,
    Dropout,
    Resample,
    /// Fixed, non-trainable filter (e.g. the Gaussian blur prior).
    FixedFilter,
    /// Composite of other layers.
    Container,
}

/// Trait for a neural network layer.
///
/// Layers own their parameters as plain tensors; gradient bookkeeping lives
/// with the optimization collaborator, not here. `forward` is `&self` so a
/// network can be shared read-only across data-parallel workers.
pub trait Layer: Send + Sync {
    fn kind(&self) -> LayerKind;

    /// Forward pass.
    fn forward(&self, input: &Tensor) -> TensorResult<Tensor>;

    /// Named trainable parameters, local names ("weight", "bias").
    /// Containers prefix child names with the child's position.
    fn parameters(&self) -> Vec<(String, &Tensor)> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        Vec::new()
    }

    /// Switch between training and inference behavior (dropout).
    fn set_training(&mut self, _training: bool) {}

    /// Yield each direct child to `f`. Leaves have none.
    fn children_mut(&mut self, _f: &mut dyn FnMut(&mut dyn Layer)) {}
}

/// Depth-first traversal over `layer` and every nested child; children are
/// visited before their parent.
pub fn visit_mut(layer: &mut dyn Layer, f: &mut dyn FnMut(&mut dyn Layer)) {
    layer.children_mut(&mut |child| visit_mut(child, &mut *f));
    f(layer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Relu;
    use crate::sequential::Sequential;

    #[test]
    fn test_visit_reaches_nested_layers() {
        let inner = Sequential::new().add(Relu).add(Relu);
        let mut outer = Sequential::new().add(inner).add(Relu);
        let mut count = 0;
        visit_mut(&mut outer, &mut |_| count += 1);
        // three activations, the inner container, the outer container
        assert_eq!(count, 5);
    }
}
