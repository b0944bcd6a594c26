use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Precomputed nearest source pixel per destination pixel. Rebuilt only
/// when the window size changes.
pub struct ScaleMap {
    xs: Vec<usize>,
    ys: Vec<usize>,
}

impl ScaleMap {
    pub fn empty() -> Self {
        Self {
            xs: Vec::new(),
            ys: Vec::new(),
        }
    }
}

pub fn build_scale_map(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> ScaleMap {
    let map_axis = |dst: usize, src: usize| {
        (0..dst)
            .map(|i| (i * src / dst.max(1)).min(src - 1))
            .collect()
    };
    ScaleMap {
        xs: map_axis(dst_w, src_w),
        ys: map_axis(dst_h, src_h),
    }
}

#[inline]
fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    // BGRA8 in little-endian memory, alpha at 0
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16)
}

/// Stretches the renderer's RGBA frame onto the window surface, converting
/// to the surface's packed format on the way. Rows run in parallel; the
/// frame is only read, so this stays outside the render pass's
/// single-threaded contract.
pub fn blit_frame(dst: &mut [u32], dst_w: usize, frame: &[u8], src_w: usize, map: &ScaleMap) {
    dst.par_chunks_mut(dst_w).enumerate().for_each(|(y, row)| {
        let src_row = map.ys[y] * src_w;
        for (x, out) in row.iter_mut().enumerate() {
            let i = (src_row + map.xs[x]) * 4;
            *out = pack_rgb(frame[i], frame[i + 1], frame[i + 2]);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blit_doubles_pixels_on_upscale() {
        // 2x1 source: red then blue.
        let frame = [255, 0, 0, 255, 0, 0, 255, 255];
        let map = build_scale_map(4, 2, 2, 1);
        let mut dst = vec![0u32; 8];
        blit_frame(&mut dst, 4, &frame, 2, &map);

        let red = pack_rgb(255, 0, 0);
        let blue = pack_rgb(0, 0, 255);
        assert_eq!(&dst[..4], &[red, red, blue, blue]);
        assert_eq!(&dst[4..], &[red, red, blue, blue]);
    }
}
