// Copyright @yucwang 2023

use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::spectrum::RGBSpectrum;

// All directions are in the local shading frame: z is the shading normal on
// the side `wi` arrives from, `wi` points back toward the previous vertex and
// `wo` away from the surface. `eta` is the relative index of refraction
// (incident over transmitted) of the boundary being crossed.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BSDFSample {
    pub wo: Vector3f,
    /// `f * |cos(wo)| / pdf`.
    pub weight: RGBSpectrum,
    /// Density of `wo`; for delta lobes the discrete lobe probability.
    pub pdf: Float,
    pub is_transmission: bool,
    pub is_delta: bool,
}

pub trait BSDF: Send + Sync {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns `f * |cos(wo)|`. Delta lobes evaluate to zero.
    fn eval(&self, wi: &Vector3f, wo: &Vector3f, eta: Float) -> RGBSpectrum;

    fn pdf(&self, wi: &Vector3f, wo: &Vector3f, eta: Float) -> Float;

    /// `u` drives the direction, `u_lobe` the lobe choice. None means the
    /// sample was absorbed.
    fn sample(&self, wi: &Vector3f, eta: Float, u: &Vector2f, u_lobe: Float) -> Option<BSDFSample>;

    fn is_delta(&self) -> bool {
        false
    }
}
