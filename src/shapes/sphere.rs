// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::shape::{Shape, ShapeHit, SurfacePoint};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f, PI};
use crate::math::ray::Ray3f;
use crate::math::warp::sample_uniform_sphere;

pub struct Sphere {
    id: String,
    center: Vector3f,
    radius: Float,
}

impl Sphere {
    pub fn new(center: Vector3f, radius: Float) -> Self {
        Self { id: generate_node_id("sphere"), center, radius: radius.abs() }
    }

    pub fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }

    pub fn center(&self) -> Vector3f {
        self.center
    }

    pub fn radius(&self) -> Float {
        self.radius
    }

    // (phi / 2pi, theta / pi) of a unit direction from the center.
    fn direction_to_uv(d: &Vector3f) -> Vector2f {
        let mut phi = d.y.atan2(d.x);
        if phi < 0.0 {
            phi += 2.0 * PI;
        }
        let theta = (d.x * d.x + d.y * d.y).sqrt().atan2(d.z);
        Vector2f::new(phi / (2.0 * PI), theta / PI)
    }
}

impl ComputationNode for Sphere {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("Sphere [center: ({}, {}, {}), radius: {}]",
                self.center.x, self.center.y, self.center.z, self.radius)
    }
}

impl Shape for Sphere {
    fn bounding_box(&self) -> AABB {
        let r = Vector3f::new(self.radius, self.radius, self.radius);
        AABB::new(self.center - r, self.center + r)
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<ShapeHit> {
        let oc = ray.origin() - self.center;
        let d = ray.dir();
        let half_b = oc.dot(&d);
        let c = oc.dot(&oc) - self.radius * self.radius;
        let disc = half_b * half_b - c;
        if !(disc >= 0.0) {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let near = -half_b - sqrt_disc;
        let far = -half_b + sqrt_disc;
        let t = if ray.test_segment(near) {
            near
        } else if ray.test_segment(far) {
            far
        } else {
            return None;
        };

        let local = (ray.at(t) - self.center) / self.radius;
        Some(ShapeHit { t, uv: Sphere::direction_to_uv(&local) })
    }

    fn surface_point(&self, uv: &Vector2f) -> SurfacePoint {
        let phi = uv.x * 2.0 * PI;
        let theta = uv.y * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let n = Vector3f::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta);
        // Vanishes at the poles.
        let dpdu = 2.0 * PI * self.radius * Vector3f::new(-sin_theta * sin_phi, sin_theta * cos_phi, 0.0);
        SurfacePoint { p: self.center + self.radius * n, n, dpdu, uv: *uv }
    }

    fn sample(&self, u: &Vector2f) -> SurfacePoint {
        let d = sample_uniform_sphere(u);
        let mut point = self.surface_point(&Sphere::direction_to_uv(&d));
        point.p = self.center + self.radius * d;
        point.n = d;
        point
    }

    fn surface_area(&self) -> Float {
        4.0 * PI * self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_intersection_from_outside_and_inside() {
        let sphere = Sphere::new(Vector3f::new(0.0, 0.0, 0.0), 1.0);
        let outside = Ray3f::new(Vector3f::new(0.0, 0.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit = sphere.ray_intersection(&outside).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-5);

        let inside = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let hit = sphere.ray_intersection(&inside).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-5);

        let miss = Ray3f::new(Vector3f::new(0.0, 2.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(sphere.ray_intersection(&miss).is_none());

        let short = Ray3f::new(Vector3f::new(0.0, 0.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), None, Some(3.0));
        assert!(!sphere.ray_intersection_t(&short));
    }

    #[test]
    fn test_sphere_surface_point_matches_hit() {
        let sphere = Sphere::new(Vector3f::new(1.0, 2.0, 3.0), 2.0);
        let ray = Ray3f::new(Vector3f::new(1.0, 2.0, 3.0), Vector3f::new(0.3, -0.5, 0.8), None, None);
        let hit = sphere.ray_intersection(&ray).unwrap();
        let point = sphere.surface_point(&hit.uv);
        assert!((point.p - ray.at(hit.t)).norm() < 1e-4);
        assert!((point.n.norm() - 1.0).abs() < 1e-5);
        assert!(point.n.dot(&ray.dir()) > 0.99);
    }

    #[test]
    fn test_sphere_tangent_vanishes_at_pole() {
        let sphere = Sphere::new(Vector3f::zeros(), 1.0);
        let pole = sphere.surface_point(&Vector2f::new(0.25, 0.0));
        assert!(pole.dpdu.norm() < 1e-5);
        assert!((pole.n - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-5);
    }
}
