// Copyright @yucwang 2023

use crate::core::computation_node::ComputationNode;
use crate::math::aabb::AABB;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::ray::Ray3f;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeHit {
    pub t: Float,
    /// Surface parameterization of the hit, enough to rebuild it later.
    pub uv: Vector2f,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub p: Vector3f,
    /// Outward unit normal.
    pub n: Vector3f,
    /// Unnormalized tangent along u; may vanish at parameter singularities.
    pub dpdu: Vector3f,
    pub uv: Vector2f,
}

pub trait Shape: ComputationNode + Send + Sync {
    fn bounding_box(&self) -> AABB;
    fn ray_intersection(&self, ray: &Ray3f) -> Option<ShapeHit>;
    fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
        self.ray_intersection(ray).is_some()
    }
    fn surface_point(&self, uv: &Vector2f) -> SurfacePoint;
    /// Uniform sample by area; the density is `1 / surface_area()`.
    fn sample(&self, u: &Vector2f) -> SurfacePoint;
    fn surface_area(&self) -> Float;
}
