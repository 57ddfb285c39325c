// Copyright @yucwang 2026

use crate::core::bsdf::BSDF;
use crate::core::hit::HitDescriptor;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::frame::Frame;
use crate::math::ray::offset_ray_origin;
use crate::math::spectrum::RGBSpectrum;

use std::sync::Arc;

/// Material-evaluated surface data at a hit.
#[derive(Clone)]
pub struct ShadingData {
    pub hit: HitDescriptor,
    pub position: Vector3f,
    /// Geometric normal, flipped onto the side `wi` lies on.
    pub geo_normal: Vector3f,
    /// Shading frame; `frame.z` is the shading normal on the side of `wi`.
    pub frame: Frame,
    pub front_facing: bool,
    /// Unit direction toward the previous path vertex.
    pub wi: Vector3f,
    pub uv: Vector2f,
    pub material_id: u32,
    pub nested_priority: u32,
    /// Radiance emitted toward `wi`.
    pub emission: RGBSpectrum,
    /// Relative index of refraction for crossing this surface.
    pub eta: Float,
    pub bsdf: Arc<dyn BSDF>,
}

impl ShadingData {
    pub fn wi_local(&self) -> Vector3f {
        self.frame.to_local(&self.wi)
    }

    pub fn eval_bsdf(&self, wo_world: &Vector3f) -> RGBSpectrum {
        self.bsdf.eval(&self.wi_local(), &self.frame.to_local(wo_world), self.eta)
    }

    pub fn pdf_bsdf(&self, wo_world: &Vector3f) -> Float {
        self.bsdf.pdf(&self.wi_local(), &self.frame.to_local(wo_world), self.eta)
    }

    /// Origin for a ray leaving the surface along `dir`, pushed off the
    /// surface on the side `dir` points to.
    pub fn ray_origin(&self, dir: &Vector3f) -> Vector3f {
        if dir.dot(&self.geo_normal) >= 0.0 {
            offset_ray_origin(&self.position, &self.geo_normal)
        } else {
            offset_ray_origin(&self.position, &-self.geo_normal)
        }
    }

    /// Origin on the side the path arrived from.
    pub fn front_ray_origin(&self) -> Vector3f {
        offset_ray_origin(&self.position, &self.geo_normal)
    }
}

pub trait ShadingResolver: Sync {
    /// Re-hydrates a hit; `incoming_dir` is the direction of the ray that
    /// found it.
    fn resolve(&self, hit: &HitDescriptor, incoming_dir: &Vector3f) -> ShadingData;
    fn material_ior(&self, material_id: u32) -> Float;
    /// Volume absorption coefficient of the medium inside `material_id`.
    fn material_absorption(&self, material_id: u32) -> RGBSpectrum;
}
