use resharp_core::Tensor;

/// Mean Squared Error.
pub fn mse(y_true: &Tensor, y_pred: &Tensor) -> f64 {
    assert_eq!(y_true.numel(), y_pred.numel());
    let n = y_true.numel();
    let sum: f64 = y_true
        .data()
        .iter()
        .zip(y_pred.data().iter())
        .map(|(&t, &p)| {
            let d = (t - p) as f64;
            d * d
        })
        .sum();
    sum / n as f64
}

/// Peak signal-to-noise ratio in decibels. `peak` is the value range of the
/// images (2.0 for tensors normalized to [-1, 1]).
pub fn psnr(y_true: &Tensor, y_pred: &Tensor, peak: f64) -> f64 {
    let m = mse(y_true, y_pred);
    if m == 0.0 {
        return f64::INFINITY;
    }
    10.0 * (peak * peak / m).log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mse_of_known_difference() {
        let a = Tensor::zeros(vec![2, 2]);
        let b = Tensor::full(vec![2, 2], 0.5);
        assert_relative_eq!(mse(&a, &b), 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_psnr_of_identical_images_is_infinite() {
        let a = Tensor::rand(vec![1, 3, 4, 4], Some(0));
        assert!(psnr(&a, &a.clone(), 2.0).is_infinite());
    }

    #[test]
    fn test_psnr_known_value() {
        let a = Tensor::zeros(vec![100]);
        let b = Tensor::full(vec![100], 0.1);
        // mse = 0.01, peak² = 4 -> 10·log10(400) ≈ 26.02
        assert_relative_eq!(psnr(&a, &b, 2.0), 26.0206, epsilon = 1e-3);
    }
}
