// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f};

#[derive(Debug, Copy, Clone)]
pub struct Ray3f {
    origin: Vector3f,
    dir: Vector3f,
    pub min_t: Float,
    pub max_t: Float
}

impl Ray3f {
    pub fn new(o: Vector3f, d: Vector3f, 
               min_t: Option<Float>, max_t: Option<Float>) -> Self {
        Self { origin: o, dir: d.normalize(), 
               min_t: min_t.unwrap_or(0.0),
               max_t: max_t.unwrap_or(std::f32::MAX)}
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    pub fn dir(&self) -> Vector3f {
        self.dir
    }

    pub fn at(&self, t: Float) -> Vector3f {
        self.origin + self.dir * t
    }

    pub fn update(&mut self, t: Float) -> bool {
        if t < self.min_t || t > self.max_t {
            false
        } else {
            self.max_t = t;
            true
        }
    }

    pub fn test_segment(&self, t: Float) -> bool {
        t >= self.min_t && t <= self.max_t
    }
}

const ORIGIN: Float = 1.0 / 32.0;
const FLOAT_SCALE: Float = 1.0 / 65536.0;
const INT_SCALE: Float = 256.0;

/// Offsets `p` along the geometric normal `n` so that a ray leaving the
/// surface on the side `n` points to does not hit the surface again.
/// Far from the origin the offset is applied in ULPs, near it as a small
/// absolute distance.
pub fn offset_ray_origin(p: &Vector3f, n: &Vector3f) -> Vector3f {
    let mut out = Vector3f::zeros();
    for idx in 0..3 {
        let of_i = (INT_SCALE * n[idx]) as i32;
        let bits = p[idx].to_bits() as i32;
        let shifted = if p[idx] < 0.0 { bits - of_i } else { bits + of_i };
        let p_i = Float::from_bits(shifted as u32);
        out[idx] = if p[idx].abs() < ORIGIN {
            p[idx] + FLOAT_SCALE * n[idx]
        } else {
            p_i
        };
    }
    out
}

/* Tests for Ray */

#[cfg(test)]
mod tests {
    use super::Vector3f;
    use super::{offset_ray_origin, Ray3f};

    #[test]
    fn test_ray3f() {
        let o = Vector3f::new(0.0, 0.0, 0.0);
        let d = Vector3f::new(1.0, 0.0, 1.0);
        let mut ray = Ray3f::new(o, d, None, None);
        assert_eq!(o, ray.origin());

        let v1 = ray.at(2.0);
        assert!((v1[0] - std::f32::consts::SQRT_2).abs() < 1e-5);
        assert!((v1[1] - 0.0).abs() < 1e-5);
        assert!((v1[2] - std::f32::consts::SQRT_2).abs() < 1e-5);

        let status1 = ray.update(100.0);
        let status2 = ray.update(105.0);
        assert_eq!(status1, true);
        assert_eq!(status2, false);
    }

    #[test]
    fn test_offset_ray_origin_moves_along_normal() {
        let n = Vector3f::new(0.0, 0.0, 1.0);

        let far = Vector3f::new(3.0, -2.0, 5.0);
        let moved = offset_ray_origin(&far, &n);
        assert!(moved.z > far.z);
        assert_eq!(moved.x, far.x);
        assert_eq!(moved.y, far.y);

        let near = Vector3f::new(0.0, 0.0, 0.0);
        let moved = offset_ray_origin(&near, &-n);
        assert!(moved.z < 0.0);

        let negative = Vector3f::new(0.0, 0.0, -4.0);
        let moved = offset_ray_origin(&negative, &n);
        assert!(moved.z > -4.0);
    }
}
