// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f};

// 2^-24: maps the top 24 bits of a draw onto [0, 1).
const FLOAT_UNIT: Float = 1.0 / 16777216.0;

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Per-path generator state. Each worker owns its own instance.
#[derive(Debug, Clone)]
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: seed };
        // Decorrelate neighbouring seeds before the first draw.
        rng.next_u32();
        rng.state = rng.state.wrapping_add(seed.rotate_left(17) ^ 0x9E37_79B9_7F4A_7C15);
        rng
    }

    /// Seed derived from a pixel position and a frame/user seed.
    pub fn for_pixel(seed: u64, x: usize, y: usize) -> Self {
        Self::for_sample(seed, x, y, 0)
    }

    /// Independent stream for one sample of one pixel.
    pub fn for_sample(seed: u64, x: usize, y: usize, sample: u32) -> Self {
        let mut h = splitmix64(seed);
        h = splitmix64(h ^ (x as u64));
        h = splitmix64(h ^ ((y as u64) << 20));
        h = splitmix64(h ^ ((sample as u64) << 40));
        Self::new(h)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.state >> 32) as u32
    }

    /// Uniform sample in [0, 1); never returns 1.
    pub fn next_f32(&mut self) -> Float {
        ((self.next_u32() >> 8) as Float) * FLOAT_UNIT
    }

    pub fn next_2d(&mut self) -> Vector2f {
        let u = self.next_f32();
        let v = self.next_f32();
        Vector2f::new(u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcg_rng_range_and_mean() {
        let mut rng = LcgRng::new(7);
        let n = 100_000;
        let mut sum = 0.0f64;
        for _ in 0..n {
            let u = rng.next_f32();
            assert!(u >= 0.0 && u < 1.0);
            sum += u as f64;
        }
        let mean = sum / n as f64;
        assert!((mean - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_lcg_rng_deterministic_per_pixel() {
        let mut a = LcgRng::for_pixel(3, 10, 20);
        let mut b = LcgRng::for_pixel(3, 10, 20);
        let mut c = LcgRng::for_pixel(3, 11, 20);
        let first_a = a.next_u32();
        assert_eq!(first_a, b.next_u32());
        assert_ne!(first_a, c.next_u32());
    }

    #[test]
    fn test_lcg_rng_samples_are_distinct_streams() {
        let mut a = LcgRng::for_sample(0, 4, 4, 0);
        let mut b = LcgRng::for_sample(0, 4, 4, 1);
        let sa: Vec<u32> = (0..4).map(|_| a.next_u32()).collect();
        let sb: Vec<u32> = (0..4).map(|_| b.next_u32()).collect();
        assert_ne!(sa, sb);
    }
}
