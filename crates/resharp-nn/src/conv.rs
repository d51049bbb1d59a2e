use crate::module::{Layer, LayerKind};
use resharp_core::{Tensor, TensorError, TensorResult};

fn named<'a>(weight: &'a Tensor, bias: Option<&'a Tensor>) -> Vec<(String, &'a Tensor)> {
    let mut out = vec![("weight".to_string(), weight)];
    if let Some(b) = bias {
        out.push(("bias".to_string(), b));
    }
    out
}

fn named_mut<'a>(
    weight: &'a mut Tensor,
    bias: Option<&'a mut Tensor>,
) -> Vec<(String, &'a mut Tensor)> {
    let mut out = vec![("weight".to_string(), weight)];
    if let Some(b) = bias {
        out.push(("bias".to_string(), b));
    }
    out
}

/// 2D convolution with square kernel and zero padding.
///
/// Input shape:  [batch, in_channels, H, W]
/// Output shape: [batch, out_channels, (H + 2·padding − kernel)/stride + 1, ...]
pub struct Conv2d {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: usize,
    pub stride: usize,
    pub padding: usize,
    weight: Tensor, // [out_channels, in_channels, k, k]
    bias: Option<Tensor>,
}

impl Conv2d {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        with_bias: bool,
    ) -> Self {
        let fan_in = in_channels * kernel_size * kernel_size;
        let k = (2.0 / fan_in as f32).sqrt();
        let weight = Tensor::rand(
            vec![out_channels, in_channels, kernel_size, kernel_size],
            None,
        )
        .mul_scalar(2.0 * k)
        .add_scalar(-k);
        let bias = with_bias.then(|| Tensor::zeros(vec![out_channels]));
        Conv2d {
            in_channels,
            out_channels,
            kernel_size,
            stride,
            padding,
            weight,
            bias,
        }
    }

    /// Compute output spatial dimension.
    pub fn out_dim(input: usize, kernel: usize, stride: usize, padding: usize) -> usize {
        (input + 2 * padding - kernel) / stride + 1
    }
}

impl Layer for Conv2d {
    fn kind(&self) -> LayerKind {
        LayerKind::Convolution
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let (n, ic, h, w) = input.dims4()?;
        if ic != self.in_channels {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n, self.in_channels, h, w],
                got: input.shape_vec(),
            });
        }
        let k = self.kernel_size;
        let oh = Self::out_dim(h, k, self.stride, self.padding);
        let ow = Self::out_dim(w, k, self.stride, self.padding);
        let mut out = Tensor::zeros(vec![n, self.out_channels, oh, ow]);

        let x = input.data();
        let wt = self.weight.data();
        let o = out.data_mut();
        for b in 0..n {
            for oc in 0..self.out_channels {
                let bias = self.bias.as_ref().map_or(0.0, |t| t.data()[oc]);
                let dst_plane = (b * self.out_channels + oc) * oh * ow;
                for oy in 0..oh {
                    for ox in 0..ow {
                        let mut sum = bias;
                        for c in 0..ic {
                            let src_plane = (b * ic + c) * h * w;
                            let w_plane = (oc * ic + c) * k * k;
                            for ky in 0..k {
                                let iy = (oy * self.stride + ky) as isize - self.padding as isize;
                                if iy < 0 || iy >= h as isize {
                                    continue;
                                }
                                for kx in 0..k {
                                    let ix =
                                        (ox * self.stride + kx) as isize - self.padding as isize;
                                    if ix < 0 || ix >= w as isize {
                                        continue;
                                    }
                                    sum += wt[w_plane + ky * k + kx]
                                        * x[src_plane + iy as usize * w + ix as usize];
                                }
                            }
                        }
                        o[dst_plane + oy * ow + ox] = sum;
                    }
                }
            }
        }
        Ok(out)
    }

    fn parameters(&self) -> Vec<(String, &Tensor)> {
        named(&self.weight, self.bias.as_ref())
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        named_mut(&mut self.weight, self.bias.as_mut())
    }
}

/// 2D transposed (fractionally-strided) convolution, used for upsampling.
///
/// Output spatial size: (in − 1)·stride − 2·padding + kernel + output_padding.
pub struct ConvTranspose2d {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: usize,
    pub stride: usize,
    pub padding: usize,
    pub output_padding: usize,
    weight: Tensor, // [in_channels, out_channels, k, k]
    bias: Option<Tensor>,
}

impl ConvTranspose2d {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        output_padding: usize,
        with_bias: bool,
    ) -> Self {
        let fan_in = in_channels * kernel_size * kernel_size;
        let k = (2.0 / fan_in as f32).sqrt();
        let weight = Tensor::rand(
            vec![in_channels, out_channels, kernel_size, kernel_size],
            None,
        )
        .mul_scalar(2.0 * k)
        .add_scalar(-k);
        let bias = with_bias.then(|| Tensor::zeros(vec![out_channels]));
        ConvTranspose2d {
            in_channels,
            out_channels,
            kernel_size,
            stride,
            padding,
            output_padding,
            weight,
            bias,
        }
    }

    pub fn out_dim(&self, input: usize) -> usize {
        (input - 1) * self.stride + self.kernel_size + self.output_padding - 2 * self.padding
    }
}

impl Layer for ConvTranspose2d {
    fn kind(&self) -> LayerKind {
        LayerKind::Convolution
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let (n, ic, h, w) = input.dims4()?;
        if ic != self.in_channels {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n, self.in_channels, h, w],
                got: input.shape_vec(),
            });
        }
        let k = self.kernel_size;
        let oh = self.out_dim(h);
        let ow = self.out_dim(w);
        let mut out = Tensor::zeros(vec![n, self.out_channels, oh, ow]);

        // Scatter each input pixel through the kernel.
        let x = input.data();
        let wt = self.weight.data();
        let o = out.data_mut();
        for b in 0..n {
            for c in 0..ic {
                let src_plane = (b * ic + c) * h * w;
                for iy in 0..h {
                    for ix in 0..w {
                        let v = x[src_plane + iy * w + ix];
                        for oc in 0..self.out_channels {
                            let dst_plane = (b * self.out_channels + oc) * oh * ow;
                            let w_plane = (c * self.out_channels + oc) * k * k;
                            for ky in 0..k {
                                let oy = (iy * self.stride + ky) as isize - self.padding as isize;
                                if oy < 0 || oy >= oh as isize {
                                    continue;
                                }
                                for kx in 0..k {
                                    let ox =
                                        (ix * self.stride + kx) as isize - self.padding as isize;
                                    if ox < 0 || ox >= ow as isize {
                                        continue;
                                    }
                                    o[dst_plane + oy as usize * ow + ox as usize] +=
                                        v * wt[w_plane + ky * k + kx];
                                }
                            }
                        }
                    }
                }
            }
        }

        if let Some(bias) = &self.bias {
            for b in 0..n {
                for oc in 0..self.out_channels {
                    let dst_plane = (b * self.out_channels + oc) * oh * ow;
                    let add = bias.data()[oc];
                    for p in &mut o[dst_plane..dst_plane + oh * ow] {
                        *p += add;
                    }
                }
            }
        }
        Ok(out)
    }

    fn parameters(&self) -> Vec<(String, &Tensor)> {
        named(&self.weight, self.bias.as_ref())
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        named_mut(&mut self.weight, self.bias.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conv2d_shape() {
        let conv = Conv2d::new(3, 8, 3, 2, 1, true);
        let x = Tensor::rand(vec![2, 3, 16, 16], Some(0));
        let y = conv.forward(&x).unwrap();
        assert_eq!(y.shape_vec(), vec![2, 8, 8, 8]);
    }

    #[test]
    fn test_conv2d_same_padding_identity_kernel() {
        // 3x3 kernel with centre 1: convolution is the identity.
        let mut conv = Conv2d::new(1, 1, 3, 1, 1, false);
        for (_, t) in conv.parameters_mut() {
            t.fill(0.0);
            t.set(&[0, 0, 1, 1], 1.0).unwrap();
        }
        let x = Tensor::rand(vec![1, 1, 5, 5], Some(7));
        let y = conv.forward(&x).unwrap();
        assert_eq!(x.data(), y.data());
    }

    #[test]
    fn test_conv2d_rejects_wrong_channels() {
        let conv = Conv2d::new(3, 8, 3, 1, 1, true);
        let x = Tensor::zeros(vec![1, 4, 8, 8]);
        assert!(conv.forward(&x).is_err());
    }

    #[test]
    fn test_conv_transpose_doubles_spatial_size() {
        let up = ConvTranspose2d::new(4, 2, 3, 2, 1, 1, true);
        let x = Tensor::rand(vec![1, 4, 8, 8], Some(1));
        let y = up.forward(&x).unwrap();
        assert_eq!(y.shape_vec(), vec![1, 2, 16, 16]);
    }

    #[test]
    fn test_conv_transpose_matches_manual_scatter() {
        // Single input pixel scatters a copy of the kernel.
        let mut up = ConvTranspose2d::new(1, 1, 3, 2, 1, 1, false);
        for (_, t) in up.parameters_mut() {
            t.fill(1.0);
        }
        let mut x = Tensor::zeros(vec![1, 1, 2, 2]);
        x.set(&[0, 0, 0, 0], 2.0).unwrap();
        let y = up.forward(&x).unwrap();
        assert_eq!(y.shape_vec(), vec![1, 1, 4, 4]);
        // kernel footprint around (0,0) lands at rows/cols -1..=1, clipped
        assert_eq!(y.get(&[0, 0, 0, 0]).unwrap(), 2.0);
        assert_eq!(y.get(&[0, 0, 1, 1]).unwrap(), 2.0);
        assert_eq!(y.get(&[0, 0, 2, 2]).unwrap(), 0.0);
    }
}
