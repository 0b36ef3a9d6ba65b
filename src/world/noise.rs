//! Fractal noise via layered smoothed random fields
//!
//! Each octave draws a low-resolution standard-normal field, bilinearly
//! upsamples it to the full grid, and adds it with octave-halving
//! amplitude. The result is normalized to [0, 1]. Everything is a pure
//! function of the RNG stream, so grids are reproducible per seed.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// Generate a fractal noise field of `width * height` values in [0, 1].
pub fn fractal_noise(
    width: usize,
    height: usize,
    rng: &mut ChaCha8Rng,
    octaves: u32,
    scale: f64,
) -> Vec<f64> {
    let mut result = vec![0.0f64; width * height];

    for octave in 0..octaves {
        let freq = (1u32 << octave) as f64;
        let amp = 1.0 / freq;
        let low_w = ((width as f64 * scale * freq) as usize).max(2);
        let low_h = ((height as f64 * scale * freq) as usize).max(2);

        let field: Vec<f64> = (0..low_w * low_h)
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();

        upsample_into(&mut result, &field, width, height, low_w, low_h, amp);
    }

    normalize(&mut result);
    result
}

/// Bilinearly upsample `field` (low_w x low_h) onto the full grid,
/// accumulating with amplitude `amp`.
fn upsample_into(
    out: &mut [f64],
    field: &[f64],
    width: usize,
    height: usize,
    low_w: usize,
    low_h: usize,
    amp: f64,
) {
    for y in 0..height {
        let fy = if height > 1 {
            y as f64 * (low_h - 1) as f64 / (height - 1) as f64
        } else {
            0.0
        };
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(low_h - 1);
        let dy = fy - y0 as f64;

        for x in 0..width {
            let fx = if width > 1 {
                x as f64 * (low_w - 1) as f64 / (width - 1) as f64
            } else {
                0.0
            };
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(low_w - 1);
            let dx = fx - x0 as f64;

            let v = field[y0 * low_w + x0] * (1.0 - dy) * (1.0 - dx)
                + field[y1 * low_w + x0] * dy * (1.0 - dx)
                + field[y0 * low_w + x1] * (1.0 - dy) * dx
                + field[y1 * low_w + x1] * dy * dx;

            out[y * width + x] += amp * v;
        }
    }
}

fn normalize(values: &mut [f64]) {
    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if hi - lo > 1e-8 {
        for v in values.iter_mut() {
            *v = (*v - lo) / (hi - lo);
        }
    }
}
