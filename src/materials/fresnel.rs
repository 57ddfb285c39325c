// Copyright @yucwang 2026

use crate::math::constants::{ Float, Vector3f };

/// Mirror of `wi` about `m`.
pub fn reflect(wi: &Vector3f, m: &Vector3f) -> Vector3f {
    2.0 * wi.dot(m) * m - wi
}

/// Refraction of `wi` through a boundary with normal `m` on the side of
/// `wi`. `eta` is incident over transmitted index. None on total internal
/// reflection.
pub fn refract(wi: &Vector3f, m: &Vector3f, eta: Float) -> Option<Vector3f> {
    let cos_i = wi.dot(m).max(-1.0).min(1.0);
    let sin2_i = (1.0 - cos_i * cos_i).max(0.0);
    let sin2_t = eta * eta * sin2_i;
    if sin2_t >= 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    Some(-eta * wi + (eta * cos_i - cos_t) * m)
}

/// Unpolarized Fresnel reflectance for light arriving at `cos_i` (taken
/// as absolute) with relative index `eta = eta_i / eta_t`.
pub fn fresnel_dielectric(cos_i: Float, eta: Float) -> Float {
    let cos_i = cos_i.abs().min(1.0);
    let sin2_i = (1.0 - cos_i * cos_i).max(0.0);
    let sin2_t = eta * eta * sin2_i;
    if sin2_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    let r_parl = (cos_i - eta * cos_t) / (cos_i + eta * cos_t);
    let r_perp = (eta * cos_i - cos_t) / (eta * cos_i + cos_t);
    0.5 * (r_parl * r_parl + r_perp * r_perp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresnel_normal_incidence() {
        // ((n1 - n2) / (n1 + n2))^2 for air to glass.
        let expected = (0.5f32 / 2.5).powi(2);
        assert!((fresnel_dielectric(1.0, 1.0 / 1.5) - expected).abs() < 1e-5);
        assert!((fresnel_dielectric(1.0, 1.5) - expected).abs() < 1e-5);
        assert!(fresnel_dielectric(0.8, 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_total_internal_reflection() {
        let wi = Vector3f::new(0.9, 0.0, (1.0f32 - 0.81).sqrt());
        let n = Vector3f::new(0.0, 0.0, 1.0);
        assert!(refract(&wi, &n, 1.5).is_none());
        assert_eq!(fresnel_dielectric(wi.z, 1.5), 1.0);
    }

    #[test]
    fn test_refract_obeys_snell() {
        let wi = Vector3f::new(0.6, 0.0, 0.8);
        let n = Vector3f::new(0.0, 0.0, 1.0);
        let eta = 1.0 / 1.5;
        let wt = refract(&wi, &n, eta).unwrap();
        assert!((wt.norm() - 1.0).abs() < 1e-5);
        assert!(wt.z < 0.0);
        let sin_t = (wt.x * wt.x + wt.y * wt.y).sqrt();
        assert!((sin_t - eta * 0.6).abs() < 1e-5);
        assert!(wt.x < 0.0);

        let r = reflect(&wi, &n);
        assert!((r - Vector3f::new(-0.6, 0.0, 0.8)).norm() < 1e-6);
    }
}
