use crate::module::{Layer, LayerKind};
use resharp_core::{Tensor, TensorError, TensorResult};

/// Abramowitz & Stegun 7.1.26 polynomial approximation, |error| < 1.5e-7.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// 2D Gaussian kernel: differences of the standard normal CDF over
/// `kernel_size + 1` points spanning ±sigma, outer-multiplied and normalized
/// to sum to 1.
pub fn gaussian_kernel(kernel_size: usize, sigma: f32) -> TensorResult<Tensor> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(TensorError::InvalidOperation(format!(
            "gaussian kernel size must be odd and positive, got {kernel_size}"
        )));
    }
    let points = Tensor::linspace(-sigma, sigma, kernel_size + 1);
    let cdf: Vec<f64> = points
        .data()
        .iter()
        .map(|&x| normal_cdf(x as f64))
        .collect();
    let k1: Vec<f64> = cdf.windows(2).map(|p| p[1] - p[0]).collect();

    let mut k2 = Vec::with_capacity(kernel_size * kernel_size);
    for &a in &k1 {
        for &b in &k1 {
            k2.push(a * b);
        }
    }
    let total: f64 = k2.iter().sum();
    let data = k2.iter().map(|&v| (v / total) as f32).collect();
    Tensor::new(data, vec![kernel_size, kernel_size])
}

/// Fixed depthwise Gaussian smoothing. The kernel is shared by every channel
/// and never trained; spatial size is preserved.
pub struct GaussianFilter {
    pub channels: usize,
    pub kernel_size: usize,
    kernel: Tensor, // [k, k]
}

impl GaussianFilter {
    pub fn new(channels: usize, kernel_size: usize, sigma: f32) -> TensorResult<Self> {
        Ok(GaussianFilter {
            channels,
            kernel_size,
            kernel: gaussian_kernel(kernel_size, sigma)?,
        })
    }

    pub fn kernel(&self) -> &Tensor {
        &self.kernel
    }
}

impl Layer for GaussianFilter {
    fn kind(&self) -> LayerKind {
        LayerKind::FixedFilter
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let (n, c, h, w) = input.dims4()?;
        if c != self.channels {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n, self.channels, h, w],
                got: input.shape_vec(),
            });
        }
        let k = self.kernel_size;
        let pad = (k - 1) / 2;
        let mut out = Tensor::zeros(vec![n, c, h, w]);
        let x = input.data();
        let kw = self.kernel.data();
        let o = out.data_mut();
        for b in 0..n {
            for ch in 0..c {
                let plane = (b * c + ch) * h * w;
                for oy in 0..h {
                    for ox in 0..w {
                        let mut sum = 0.0;
                        for ky in 0..k {
                            let iy = (oy + ky) as isize - pad as isize;
                            if iy < 0 || iy >= h as isize {
                                continue;
                            }
                            for kx in 0..k {
                                let ix = (ox + kx) as isize - pad as isize;
                                if ix < 0 || ix >= w as isize {
                                    continue;
                                }
                                sum += kw[ky * k + kx] * x[plane + iy as usize * w + ix as usize];
                            }
                        }
                        o[plane + oy * w + ox] = sum;
                    }
                }
            }
        }
        Ok(out)
    }
}
