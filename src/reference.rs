//! CPU reference for the GPU mip chain and PPM output for inspection

use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Bilinear fetch with clamp-to-edge addressing, matching the linear blit sampler
fn sample_bilinear(pixels: &[[u8; 4]], width: u32, height: u32, u: f32, v: f32) -> [f32; 4] {
    let x = u * width as f32 - 0.5;
    let y = v * height as f32 - 0.5;
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);

    let fetch = |px: f32, py: f32| -> [f32; 4] {
        let cx = (px as i64).clamp(0, width as i64 - 1) as usize;
        let cy = (py as i64).clamp(0, height as i64 - 1) as usize;
        pixels[cy * width as usize + cx].map(|c| c as f32)
    };

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1.0, y0);
    let p01 = fetch(x0, y0 + 1.0);
    let p11 = fetch(x0 + 1.0, y0 + 1.0);

    std::array::from_fn(|c| {
        let top = p00[c] + (p10[c] - p00[c]) * fx;
        let bottom = p01[c] + (p11[c] - p01[c]) * fx;
        top + (bottom - top) * fy
    })
}

/// Downsample an RGBA8 image to `(dst_width, dst_height)` by sampling the
/// center of each destination pixel, the way the linear blit does.
pub fn downsample_rgba8(
    src: &[u8],
    src_size: (u32, u32),
    dst_size: (u32, u32),
) -> Vec<u8> {
    let (src_width, src_height) = src_size;
    let (dst_width, dst_height) = dst_size;
    let pixels: &[[u8; 4]] = bytemuck::cast_slice(src);

    let mut dst = vec![0u8; (dst_width * dst_height * 4) as usize];
    dst.par_chunks_mut((dst_width * 4) as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let v = (y as f32 + 0.5) / dst_height as f32;
            for (x, out) in row.chunks_exact_mut(4).enumerate() {
                let u = (x as f32 + 0.5) / dst_width as f32;
                let texel = sample_bilinear(pixels, src_width, src_height, u, v);
                for (o, t) in out.iter_mut().zip(texel) {
                    *o = t.round().clamp(0.0, 255.0) as u8;
                }
            }
        });
    dst
}

/// Mean absolute per-channel difference between two RGBA8 images
pub fn mean_abs_error(a: &[u8], b: &[u8]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return f64::INFINITY;
    }
    let total: u64 = a
        .par_iter()
        .zip(b.par_iter())
        .map(|(&x, &y)| x.abs_diff(y) as u64)
        .sum();
    total as f64 / a.len() as f64
}

/// Save RGBA8 pixels as a binary PPM (alpha is dropped)
pub fn save_ppm(pixels: &[u8], width: u32, height: u32, path: &Path) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "P6")?;
    writeln!(file, "{} {}", width, height)?;
    writeln!(file, "255")?;

    for px in pixels.chunks_exact(4) {
        file.write_all(&px[..3])?;
    }
    file.flush()
}
