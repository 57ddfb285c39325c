// Copyright @yucwang 2026

use crate::core::bsdf::{ BSDFSample, BSDF };
use crate::materials::fresnel::{ fresnel_dielectric, reflect, refract };
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::spectrum::RGBSpectrum;

/// Smooth glass-like boundary. Reflection and transmission are both delta
/// lobes, chosen proportionally to the Fresnel term.
pub struct DielectricBSDF {
    specular_reflectance: RGBSpectrum,
    specular_transmittance: RGBSpectrum,
}

impl DielectricBSDF {
    pub fn new() -> Self {
        Self::with_tint(RGBSpectrum::one(), RGBSpectrum::one())
    }

    pub fn with_tint(specular_reflectance: RGBSpectrum, specular_transmittance: RGBSpectrum) -> Self {
        Self { specular_reflectance, specular_transmittance }
    }
}

impl BSDF for DielectricBSDF {
    fn name(&self) -> &'static str {
        "DielectricBSDF"
    }

    fn eval(&self, _wi: &Vector3f, _wo: &Vector3f, _eta: Float) -> RGBSpectrum {
        RGBSpectrum::default()
    }

    fn pdf(&self, _wi: &Vector3f, _wo: &Vector3f, _eta: Float) -> Float {
        0.0
    }

    fn sample(&self, wi: &Vector3f, eta: Float, _u: &Vector2f, u_lobe: Float) -> Option<BSDFSample> {
        if wi.z <= 0.0 || !(eta > 0.0) {
            return None;
        }
        let n = Vector3f::new(0.0, 0.0, 1.0);
        let f = fresnel_dielectric(wi.z, eta);

        if u_lobe < f {
            return Some(BSDFSample {
                wo: reflect(wi, &n),
                weight: self.specular_reflectance,
                pdf: f,
                is_transmission: false,
                is_delta: true,
            });
        }

        let wo = refract(wi, &n, eta)?;
        // Radiance is compressed into the denser medium.
        Some(BSDFSample {
            wo: wo.normalize(),
            weight: self.specular_transmittance * (eta * eta),
            pdf: 1.0 - f,
            is_transmission: true,
            is_delta: true,
        })
    }

    fn is_delta(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::spectrum::Spectrum;

    #[test]
    fn test_dielectric_lobe_selection() {
        let glass = DielectricBSDF::new();
        let wi = Vector3f::new(0.0, 0.0, 1.0);
        let eta = 1.0 / 1.5;

        let r = glass.sample(&wi, eta, &Vector2f::zeros(), 0.0).unwrap();
        assert!(!r.is_transmission && r.is_delta);
        assert!((r.wo - wi).norm() < 1e-6);
        assert!((r.pdf - 0.04).abs() < 1e-4);

        let t = glass.sample(&wi, eta, &Vector2f::zeros(), 0.5).unwrap();
        assert!(t.is_transmission);
        assert!((t.wo - Vector3f::new(0.0, 0.0, -1.0)).norm() < 1e-6);
        assert!((t.weight[0] - eta * eta).abs() < 1e-5);
        assert!(glass.eval(&wi, &t.wo, eta).is_black());
    }

    #[test]
    fn test_dielectric_index_matched_always_transmits() {
        let glass = DielectricBSDF::new();
        let wi = Vector3f::new(0.6, 0.0, 0.8);
        let s = glass.sample(&wi, 1.0, &Vector2f::zeros(), 0.0).unwrap();
        assert!(s.is_transmission);
        assert!((s.wo + wi).norm() < 1e-5);
        assert!((s.weight[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let glass = DielectricBSDF::new();
        let wi = Vector3f::new(0.9, 0.0, (1.0f32 - 0.81).sqrt());
        let s = glass.sample(&wi, 1.5, &Vector2f::zeros(), 0.999).unwrap();
        assert!(!s.is_transmission);
        assert_eq!(s.pdf, 1.0);
    }
}
