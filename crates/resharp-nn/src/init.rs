use crate::module::{visit_mut, Layer, LayerKind};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// In-place weight randomization applied once, right after construction.
///
/// Convolutions get N(0, 0.02²) weights and zeroed biases; batch norms get
/// N(1, 0.02²) scales and zeroed shifts. Every other layer kind is left
/// untouched. Dispatch is on the capability tag, not the concrete type.
pub fn init_weights(net: &mut dyn Layer, seed: Option<u64>) {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    visit_mut(net, &mut |layer| {
        let (mean, std) = match layer.kind() {
            LayerKind::Convolution => (0.0, 0.02),
            LayerKind::BatchNorm => (1.0, 0.02),
            _ => return,
        };
        for (name, tensor) in layer.parameters_mut() {
            if name == "weight" {
                tensor.fill_normal(&mut rng, mean, std);
            } else {
                tensor.fill(0.0);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blur::GaussianFilter;
    use crate::conv::Conv2d;
    use crate::norm::BatchNorm2d;
    use crate::sequential::Sequential;
    use approx::assert_relative_eq;

    #[test]
    fn test_conv_weights_centred_at_zero_bias_zeroed() {
        let mut net = Sequential::new().add(Conv2d::new(16, 64, 3, 1, 1, true));
        init_weights(&mut net, Some(0));
        let params = net.parameters();
        let (_, weight) = &params[0];
        let (_, bias) = &params[1];
        assert_relative_eq!(weight.mean_all(), 0.0, epsilon = 5e-3);
        assert!(bias.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_batch_norm_scale_centred_at_one() {
        let mut net = Sequential::new().add(BatchNorm2d::new(512));
        init_weights(&mut net, Some(1));
        let params = net.parameters();
        let (_, weight) = &params[0];
        assert_relative_eq!(weight.mean_all(), 1.0, epsilon = 5e-3);
        assert!(weight.data().iter().any(|&v| v != 1.0));
    }

    #[test]
    fn test_other_layers_left_untouched() {
        let mut filter = GaussianFilter::new(3, 5, 1.0).unwrap();
        let before = filter.kernel().clone();
        init_weights(&mut filter, Some(2));
        assert_eq!(before.data(), filter.kernel().data());
    }

    #[test]
    fn test_seeded_init_is_reproducible() {
        let mut a = Sequential::new().add(Conv2d::new(3, 8, 3, 1, 1, false));
        let mut b = Sequential::new().add(Conv2d::new(3, 8, 3, 1, 1, false));
        init_weights(&mut a, Some(7));
        init_weights(&mut b, Some(7));
        let pa = a.parameters();
        let pb = b.parameters();
        assert_eq!(pa[0].1.data(), pb[0].1.data());
    }
}
