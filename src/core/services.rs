// Copyright @yucwang 2026

use crate::core::emitter::{EnvironmentSampler, LightSampler};
use crate::core::ray_cast::RayCastService;
use crate::core::shading::ShadingResolver;

/// Everything the path tracer needs from a scene.
pub trait SceneServices: RayCastService + ShadingResolver + LightSampler {
    fn environment(&self) -> Option<&dyn EnvironmentSampler>;
}
