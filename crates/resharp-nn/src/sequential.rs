use crate::module::{Layer, LayerKind};
use resharp_core::{Tensor, TensorResult};

/// Sequential container — chains layers in order.
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
}

impl Sequential {
    pub fn new() -> Self {
        Sequential { layers: Vec::new() }
    }

    /// Add a layer to the chain.
    pub fn add<L: Layer + 'static>(mut self, layer: L) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Add an already-boxed layer (normalization layers are built boxed).
    pub fn add_boxed(mut self, layer: Box<dyn Layer>) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for Sequential {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for Sequential {
    fn kind(&self) -> LayerKind {
        LayerKind::Container
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let mut x = input.clone();
        for layer in &self.layers {
            x = layer.forward(&x)?;
        }
        Ok(x)
    }

    fn parameters(&self) -> Vec<(String, &Tensor)> {
        let mut params = Vec::new();
        for (i, layer) in self.layers.iter().enumerate() {
            for (name, t) in layer.parameters() {
                params.push((format!("{i}.{name}"), t));
            }
        }
        params
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        let mut params = Vec::new();
        for (i, layer) in self.layers.iter_mut().enumerate() {
            for (name, t) in layer.parameters_mut() {
                params.push((format!("{i}.{name}"), t));
            }
        }
        params
    }

    fn set_training(&mut self, training: bool) {
        for layer in &mut self.layers {
            layer.set_training(training);
        }
    }

    fn children_mut(&mut self, f: &mut dyn FnMut(&mut dyn Layer)) {
        for layer in &mut self.layers {
            f(layer.as_mut());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Relu;
    use crate::conv::Conv2d;

    #[test]
    fn test_forward_chains_layers() {
        let net = Sequential::new().add(Relu).add(Relu);
        let x = Tensor::new(vec![-1.0, 2.0], vec![1, 1, 1, 2]).unwrap();
        let y = net.forward(&x).unwrap();
        assert_eq!(y.data(), &[0.0, 2.0]);
    }

    #[test]
    fn test_parameter_names_are_position_prefixed() {
        let net = Sequential::new()
            .add(Relu)
            .add(Conv2d::new(1, 2, 3, 1, 1, true));
        let names: Vec<String> = net.parameters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["1.weight".to_string(), "1.bias".to_string()]);
    }
}
