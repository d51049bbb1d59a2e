use crate::module::{Layer, LayerKind};
use resharp_core::{Tensor, TensorError, TensorResult};

fn pad_spatial(
    input: &Tensor,
    pad: usize,
    index: impl Fn(isize, usize) -> usize,
) -> TensorResult<Tensor> {
    let (n, c, h, w) = input.dims4()?;
    let (oh, ow) = (h + 2 * pad, w + 2 * pad);
    let mut out = Tensor::zeros(vec![n, c, oh, ow]);
    let x = input.data();
    let o = out.data_mut();
    for b in 0..n {
        for ch in 0..c {
            let src_plane = (b * c + ch) * h * w;
            let dst_plane = (b * c + ch) * oh * ow;
            for oy in 0..oh {
                let sy = index(oy as isize - pad as isize, h);
                for ox in 0..ow {
                    let sx = index(ox as isize - pad as isize, w);
                    o[dst_plane + oy * ow + ox] = x[src_plane + sy * w + sx];
                }
            }
        }
    }
    Ok(out)
}

/// Pads the spatial borders by mirroring interior pixels (the border pixel
/// itself is not duplicated). Requires pad < spatial size.
pub struct ReflectionPad2d {
    pub pad: usize,
}

impl ReflectionPad2d {
    pub fn new(pad: usize) -> Self {
        ReflectionPad2d { pad }
    }
}

impl Layer for ReflectionPad2d {
    fn kind(&self) -> LayerKind {
        LayerKind::Padding
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let (_, _, h, w) = input.dims4()?;
        if self.pad >= h || self.pad >= w {
            return Err(TensorError::InvalidOperation(format!(
                "reflection pad {} too large for {}x{} input",
                self.pad, h, w
            )));
        }
        pad_spatial(input, self.pad, |s, size| {
            let m = if s < 0 { -s } else { s };
            let m = m as usize;
            if m >= size {
                2 * size - 2 - m
            } else {
                m
            }
        })
    }
}

/// Pads the spatial borders by replicating the edge pixel.
pub struct ReplicationPad2d {
    pub pad: usize,
}

impl ReplicationPad2d {
    pub fn new(pad: usize) -> Self {
        ReplicationPad2d { pad }
    }
}

impl Layer for ReplicationPad2d {
    fn kind(&self) -> LayerKind {
        LayerKind::Padding
    }

    fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        pad_spatial(input, self.pad, |s, size| {
            s.clamp(0, size as isize - 1) as usize
        })
    }
}
