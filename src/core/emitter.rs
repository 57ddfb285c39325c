// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::rng::LcgRng;
use crate::core::shading::ShadingData;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;

/// Candidate light connection from a shading point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Unit direction from the shading point toward the light.
    pub direction: Vector3f,
    pub distance: Float,
    /// Radiance arriving along `-direction`, unoccluded.
    pub radiance: RGBSpectrum,
    /// Solid-angle density at the shading point.
    pub pdf: Float,
}

/// Sampling of emissive geometry.
pub trait LightSampler: Sync {
    fn has_lights(&self) -> bool;

    fn sample(&self, shading: &ShadingData, sample_index: u32, rng: &mut LcgRng) -> Option<LightSample>;

    /// Solid-angle density with which `sample` would have produced the
    /// emissive hit `light_hit` as seen from `origin`.
    fn eval_pdf(&self, origin: &Vector3f, light_hit: &ShadingData) -> Float;
}

/// Distant illumination surrounding the scene.
pub trait EnvironmentSampler: ComputationNode + Send + Sync {
    fn sample(&self, rng: &mut LcgRng) -> Option<LightSample>;
    fn eval_radiance(&self, direction: &Vector3f) -> RGBSpectrum;
    fn eval_pdf(&self, direction: &Vector3f) -> Float;
}
