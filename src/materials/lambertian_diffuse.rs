// Copyright @yucwang 2023

use crate::core::bsdf::{ BSDFSample, BSDF };
use crate::math::constants::{ Float, INV_PI, Vector2f, Vector3f };
use crate::math::spectrum::{ RGBSpectrum, Spectrum };
use crate::math::warp::{ sample_cosine_hemisphere, sample_cosine_hemisphere_pdf };

pub struct LambertianDiffuseBSDF {
    color: RGBSpectrum
}

impl LambertianDiffuseBSDF {
    pub fn new(rgb: RGBSpectrum) -> Self {
        Self {
            color: rgb,
        }
    }

    pub fn color(&self) -> RGBSpectrum {
        self.color
    }
}

impl BSDF for LambertianDiffuseBSDF {
    fn name(&self) -> &'static str {
        "LambertianDiffuseBSDF"
    }

    fn eval(&self, wi: &Vector3f, wo: &Vector3f, _eta: Float) -> RGBSpectrum {
        if wi.z <= 0.0 || wo.z <= 0.0 {
            return RGBSpectrum::default();
        }
        self.color * (INV_PI * wo.z)
    }

    fn pdf(&self, wi: &Vector3f, wo: &Vector3f, _eta: Float) -> Float {
        if wi.z <= 0.0 {
            return 0.0;
        }
        sample_cosine_hemisphere_pdf(wo.z)
    }

    fn sample(&self, wi: &Vector3f, _eta: Float, u: &Vector2f, _u_lobe: Float) -> Option<BSDFSample> {
        if wi.z <= 0.0 || self.color.is_black() {
            return None;
        }
        let wo = sample_cosine_hemisphere(u);
        let pdf = sample_cosine_hemisphere_pdf(wo.z);
        if !(pdf > 0.0) {
            return None;
        }
        Some(BSDFSample { wo, weight: self.color, pdf, is_transmission: false, is_delta: false })
    }
}
