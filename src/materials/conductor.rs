// Copyright @yucwang 2026

use crate::core::bsdf::{ BSDFSample, BSDF };
use crate::materials::fresnel::reflect;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::spectrum::RGBSpectrum;

/// Tinted perfect mirror.
pub struct ConductorBSDF {
    specular_reflectance: RGBSpectrum,
}

impl ConductorBSDF {
    pub fn new(specular_reflectance: RGBSpectrum) -> Self {
        Self { specular_reflectance }
    }
}

impl BSDF for ConductorBSDF {
    fn name(&self) -> &'static str {
        "ConductorBSDF"
    }

    fn eval(&self, _wi: &Vector3f, _wo: &Vector3f, _eta: Float) -> RGBSpectrum {
        RGBSpectrum::default()
    }

    fn pdf(&self, _wi: &Vector3f, _wo: &Vector3f, _eta: Float) -> Float {
        0.0
    }

    fn sample(&self, wi: &Vector3f, _eta: Float, _u: &Vector2f, _u_lobe: Float) -> Option<BSDFSample> {
        if wi.z <= 0.0 {
            return None;
        }
        let wo = reflect(wi, &Vector3f::new(0.0, 0.0, 1.0));
        Some(BSDFSample { wo, weight: self.specular_reflectance, pdf: 1.0, is_transmission: false, is_delta: true })
    }

    fn is_delta(&self) -> bool {
        true
    }
}
