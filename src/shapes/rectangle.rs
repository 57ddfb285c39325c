// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::shape::{Shape, ShapeHit, SurfacePoint};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;

/// Parallelogram spanned by two edges around a center. The front side is
/// the one `edge_u x edge_v` points to.
pub struct Rectangle {
    id: String,
    center: Vector3f,
    edge_u: Vector3f,
    edge_v: Vector3f,
    normal: Vector3f,
    area: Float,
}

impl Rectangle {
    pub fn new(center: Vector3f, edge_u: Vector3f, edge_v: Vector3f) -> Self {
        let cross = edge_u.cross(&edge_v);
        let area = cross.norm();
        let normal = if area > 0.0 { cross / area } else { Vector3f::new(0.0, 0.0, 1.0) };
        Self { id: generate_node_id("rectangle"), center, edge_u, edge_v, normal, area }
    }

    pub fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }

    pub fn normal(&self) -> Vector3f {
        self.normal
    }
}

impl ComputationNode for Rectangle {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("Rectangle [center: ({}, {}, {}), area: {}]",
                self.center.x, self.center.y, self.center.z, self.area)
    }
}

impl Shape for Rectangle {
    fn bounding_box(&self) -> AABB {
        let mut bbox = AABB::default();
        for (su, sv) in &[(-0.5, -0.5), (-0.5, 0.5), (0.5, -0.5), (0.5, 0.5)] {
            let corner: Vector3f = self.center + self.edge_u * *su + self.edge_v * *sv;
            bbox.expand_by_point(&corner);
        }
        // Give flat boxes some thickness for the slab test.
        let pad = Vector3f::new(1e-4, 1e-4, 1e-4);
        AABB::new(bbox.p_min - pad, bbox.p_max + pad)
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<ShapeHit> {
        let denom = ray.dir().dot(&self.normal);
        if denom.abs() < 1e-8 {
            return None;
        }
        let t = (self.center - ray.origin()).dot(&self.normal) / denom;
        if !ray.test_segment(t) {
            return None;
        }
        let rel = ray.at(t) - self.center;
        let a = rel.dot(&self.edge_u) / self.edge_u.norm_squared();
        let b = rel.dot(&self.edge_v) / self.edge_v.norm_squared();
        if a.abs() > 0.5 || b.abs() > 0.5 {
            return None;
        }
        Some(ShapeHit { t, uv: Vector2f::new(a + 0.5, b + 0.5) })
    }

    fn surface_point(&self, uv: &Vector2f) -> SurfacePoint {
        let p = self.center + self.edge_u * (uv.x - 0.5) + self.edge_v * (uv.y - 0.5);
        SurfacePoint { p, n: self.normal, dpdu: self.edge_u, uv: *uv }
    }

    fn sample(&self, u: &Vector2f) -> SurfacePoint {
        self.surface_point(u)
    }

    fn surface_area(&self) -> Float {
        self.area
    }
}
