use crate::module::{Layer, LayerKind};
use resharp_core::{Tensor, TensorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsampleMode {
    Nearest,
    Bilinear,
}

/// Spatial upsampling by an integer factor.
pub struct Upsample2d {
    pub scale: usize,
    pub mode: UpsampleMode,
}

impl Upsample2d {
    pub fn new(scale: usize, mode: UpsampleMode) -> Self {
        Upsample2d { scale, mode }
    }
}

impl Layer for Upsample2d {
    fn kind(&self) -> LayerKind {
        LayerKind::Resample
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let (n, c, h, w) = input.dims4()?;
        if self.scale <= 1 {
            return Ok(input.clone());
        }
        let (oh, ow) = (h * self.scale, w * self.scale);
        let mut out = Tensor::zeros(vec![n, c, oh, ow]);
        let x = input.data();
        let o = out.data_mut();
        let scale = self.scale as f32;
        for b in 0..n {
            for ch in 0..c {
                let src_plane = (b * c + ch) * h * w;
                let dst_plane = (b * c + ch) * oh * ow;
                for oy in 0..oh {
                    for ox in 0..ow {
                        let v = match self.mode {
                            UpsampleMode::Nearest => {
                                x[src_plane + (oy / self.scale) * w + ox / self.scale]
                            }
                            UpsampleMode::Bilinear => {
                                // half-pixel centres, edges clamped
                                let sy = ((oy as f32 + 0.5) / scale - 0.5)
                                    .clamp(0.0, (h - 1) as f32);
                                let sx = ((ox as f32 + 0.5) / scale - 0.5)
                                    .clamp(0.0, (w - 1) as f32);
                                let y0 = sy.floor() as usize;
                                let x0 = sx.floor() as usize;
                                let y1 = (y0 + 1).min(h - 1);
                                let x1 = (x0 + 1).min(w - 1);
                                let fy = sy - y0 as f32;
                                let fx = sx - x0 as f32;
                                let top = x[src_plane + y0 * w + x0] * (1.0 - fx)
                                    + x[src_plane + y0 * w + x1] * fx;
                                let bottom = x[src_plane + y1 * w + x0] * (1.0 - fx)
                                    + x[src_plane + y1 * w + x1] * fx;
                                top * (1.0 - fy) + bottom * fy
                            }
                        };
                        o[dst_plane + oy * ow + ox] = v;
                    }
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_repeats_pixels() {
        let x = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![1, 1, 2, 2]).unwrap();
        let y = Upsample2d::new(2, UpsampleMode::Nearest).forward(&x).unwrap();
        assert_eq!(y.shape_vec(), vec![1, 1, 4, 4]);
        assert_eq!(y.get(&[0, 0, 0, 1]).unwrap(), 1.0);
        assert_eq!(y.get(&[0, 0, 3, 3]).unwrap(), 4.0);
    }

    #[test]
    fn test_bilinear_preserves_constant_images() {
        let x = Tensor::full(vec![1, 2, 3, 3], 0.75);
        let y = Upsample2d::new(4, UpsampleMode::Bilinear).forward(&x).unwrap();
        assert_eq!(y.shape_vec(), vec![1, 2, 12, 12]);
        assert!(y.data().iter().all(|&v| (v - 0.75).abs() < 1e-6));
    }

    #[test]
    fn test_bilinear_interpolates_between_neighbours() {
        let x = Tensor::new(vec![0.0, 1.0], vec![1, 1, 1, 2]).unwrap();
        let y = Upsample2d::new(2, UpsampleMode::Bilinear).forward(&x).unwrap();
        let vals = y.data();
        // monotone left-to-right ramp
        assert!(vals.windows(2).all(|p| p[0] <= p[1]));
        assert_eq!(vals[0], 0.0);
        assert_eq!(vals[3], 1.0);
    }
}
