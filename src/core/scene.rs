// Copyright @yucwang 2026

use crate::core::bvh::BVH;
use crate::core::emitter::{EnvironmentSampler, LightSample, LightSampler};
use crate::core::hit::{HitDescriptor, RayFlags, RayPayload};
use crate::core::material::SceneMaterial;
use crate::core::ray_cast::RayCastService;
use crate::core::rng::LcgRng;
use crate::core::sensor::Sensor;
use crate::core::services::SceneServices;
use crate::core::shading::{ShadingData, ShadingResolver};
use crate::core::shape::{Shape, ShapeHit};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;
use crate::math::spectrum::{RGBSpectrum, Spectrum};
use std::sync::Arc;

// Upper bound on false intersections skipped by one scatter ray.
const MAX_NESTED_SKIPS: usize = 64;

pub struct SceneObject {
    pub shape: Arc<dyn Shape>,
    pub material_id: u32,
    pub name: Option<String>,
}

impl SceneObject {
    pub fn new(shape: Arc<dyn Shape>, material_id: u32) -> Self {
        Self { shape, material_id, name: None }
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }
}

pub struct Scene {
    objects: Vec<SceneObject>,
    materials: Vec<SceneMaterial>,
    sensors: Vec<Box<dyn Sensor>>,
    // Indices of objects with emissive materials.
    lights: Vec<usize>,
    environment: Option<Box<dyn EnvironmentSampler>>,
    scene_bounds: AABB,
    bvh: Option<BVH>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            materials: Vec::new(),
            sensors: Vec::new(),
            lights: Vec::new(),
            environment: None,
            scene_bounds: AABB::default(),
            bvh: None,
        }
    }

    /// Returns the id objects use to refer to the material.
    pub fn add_material(&mut self, material: SceneMaterial) -> u32 {
        self.materials.push(material);
        (self.materials.len() - 1) as u32
    }

    pub fn material(&self, material_id: u32) -> Option<&SceneMaterial> {
        self.materials.get(material_id as usize)
    }

    pub fn materials(&self) -> &Vec<SceneMaterial> {
        &self.materials
    }

    pub fn add_object(&mut self, object: SceneObject) {
        let emissive = self
            .material(object.material_id)
            .map_or(false, |m| !m.emission.is_black());
        if emissive {
            self.lights.push(self.objects.len());
        }
        self.objects.push(object);
        self.bvh = None;
    }

    pub fn objects(&self) -> &Vec<SceneObject> {
        &self.objects
    }

    pub fn lights(&self) -> &Vec<usize> {
        &self.lights
    }

    pub fn set_environment(&mut self, environment: Box<dyn EnvironmentSampler>) {
        self.environment = Some(environment);
    }

    pub fn sensors(&self) -> &Vec<Box<dyn Sensor>> {
        &self.sensors
    }

    pub fn add_sensor(&mut self, sensor: Box<dyn Sensor>) {
        self.sensors.push(sensor);
    }

    pub fn take_sensor(&mut self, camera_id: usize) -> Option<Box<dyn Sensor>> {
        if camera_id < self.sensors.len() {
            Some(self.sensors.remove(camera_id))
        } else {
            None
        }
    }

    pub fn insert_sensor(&mut self, camera_id: usize, sensor: Box<dyn Sensor>) {
        if camera_id <= self.sensors.len() {
            self.sensors.insert(camera_id, sensor);
        } else {
            self.sensors.push(sensor);
        }
    }

    pub fn camera(&self, camera_id: usize) -> Option<&dyn Sensor> {
        self.sensors.get(camera_id).map(|s| s.as_ref())
    }

    pub fn scene_bounds(&self) -> &AABB {
        &self.scene_bounds
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn build_bvh(&mut self) {
        let mut prim_bounds = Vec::with_capacity(self.objects.len());
        let mut prim_centroids = Vec::with_capacity(self.objects.len());
        let mut scene_bounds = AABB::default();
        for obj in &self.objects {
            let bounds = obj.shape.bounding_box();
            prim_centroids.push(bounds.center());
            prim_bounds.push(bounds);
            scene_bounds.expand_by_aabb(&bounds);
        }

        self.bvh = Some(BVH::new(prim_bounds, prim_centroids));
        self.scene_bounds = scene_bounds;
    }

    pub fn log_summary(&self) {
        log::info!("Scene: {} objects, {} materials, {} area lights, environment: {}.",
                   self.objects.len(),
                   self.materials.len(),
                   self.lights.len(),
                   self.environment.as_ref().map_or(String::from("none"), |e| e.to_string()));
        for material in &self.materials {
            log::debug!("  material {}", material.describe());
        }
        for object in &self.objects {
            log::debug!("  object {} -> material {}", object.shape.to_string(), object.material_id);
        }
    }

    fn nested_priority(&self, material_id: u32) -> u32 {
        self.material(material_id).map_or(crate::core::material::OPAQUE_PRIORITY, |m| m.nested_priority)
    }

    // Falls back to a linear scan while no BVH has been built.
    fn closest_hit(&self, ray: &Ray3f) -> Option<(usize, ShapeHit)> {
        match &self.bvh {
            Some(bvh) => bvh.ray_intersection(ray, |prim_idx, ray| {
                self.objects[prim_idx].shape.ray_intersection(ray).map(|h| (h, h.t))
            }),
            None => {
                let mut closest: Option<(usize, ShapeHit)> = None;
                for (idx, obj) in self.objects.iter().enumerate() {
                    if let Some(h) = obj.shape.ray_intersection(ray) {
                        if closest.as_ref().map_or(true, |(_, c)| h.t < c.t) {
                            closest = Some((idx, h));
                        }
                    }
                }
                closest
            }
        }
    }

    fn any_hit(&self, ray: &Ray3f) -> bool {
        match &self.bvh {
            Some(bvh) => bvh.ray_intersection_t(ray, |prim_idx, ray| {
                self.objects[prim_idx].shape.ray_intersection_t(ray)
            }),
            None => self.objects.iter().any(|obj| obj.shape.ray_intersection_t(ray)),
        }
    }

    fn light_pdf_area(&self, object_index: usize) -> Float {
        let area = self.objects[object_index].shape.surface_area();
        if !(area > 0.0) {
            return 0.0;
        }
        1.0 / (area * self.lights.len() as Float)
    }
}

impl RayCastService for Scene {
    fn trace(&self, ray: &Ray3f, flags: RayFlags, payload: &mut RayPayload) {
        match payload {
            RayPayload::Shadow(shadow) => {
                shadow.visible = !self.any_hit(ray);
            }
            RayPayload::Scatter(scatter) => {
                let resolve_nested = flags.contains(RayFlags::RESOLVE_NESTED);
                let mut ray = *ray;
                scatter.hit = HitDescriptor::invalid();
                for _ in 0..MAX_NESTED_SKIPS {
                    let (idx, hit) = match self.closest_hit(&ray) {
                        Some(found) => found,
                        None => return,
                    };
                    let object = &self.objects[idx];
                    if resolve_nested {
                        let point = object.shape.surface_point(&hit.uv);
                        let front_facing = ray.dir().dot(&point.n) < 0.0;
                        let priority = self.nested_priority(object.material_id);
                        if !scatter.interior.resolve_candidate(object.material_id, priority, front_facing) {
                            ray.min_t = hit.t + (1e-4 * hit.t).max(1e-5);
                            continue;
                        }
                    }
                    scatter.hit = HitDescriptor::new(idx as u32, 0, hit.uv);
                    return;
                }
                log::debug!("Scatter ray skipped more than {} nested boundaries.", MAX_NESTED_SKIPS);
            }
        }
    }
}

impl ShadingResolver for Scene {
    fn resolve(&self, hit: &HitDescriptor, incoming_dir: &Vector3f) -> ShadingData {
        let object = &self.objects[hit.object as usize];
        let material = &self.materials[object.material_id as usize];
        let point = object.shape.surface_point(&hit.barycentrics);

        let wi = -incoming_dir.normalize();
        let front_facing = point.n.dot(&wi) >= 0.0;
        let normal = if front_facing { point.n } else { -point.n };
        let ior = material.ior;

        ShadingData {
            hit: *hit,
            position: point.p,
            geo_normal: normal,
            frame: Frame::from_tangent(&normal, &point.dpdu),
            front_facing,
            wi,
            uv: point.uv,
            material_id: object.material_id,
            nested_priority: material.nested_priority,
            emission: if front_facing { material.emission } else { RGBSpectrum::default() },
            eta: if front_facing { 1.0 / ior } else { ior },
            bsdf: material.bsdf.clone(),
        }
    }

    fn material_ior(&self, material_id: u32) -> Float {
        self.material(material_id).map_or(1.0, |m| m.ior)
    }

    fn material_absorption(&self, material_id: u32) -> RGBSpectrum {
        self.material(material_id).map_or(RGBSpectrum::default(), |m| m.absorption)
    }
}

impl LightSampler for Scene {
    fn has_lights(&self) -> bool {
        !self.lights.is_empty()
    }

    fn sample(&self, shading: &ShadingData, _sample_index: u32, rng: &mut LcgRng) -> Option<LightSample> {
        if self.lights.is_empty() {
            return None;
        }
        let pick = ((rng.next_f32() * self.lights.len() as Float) as usize).min(self.lights.len() - 1);
        let object_index = self.lights[pick];
        let object = &self.objects[object_index];
        let point = object.shape.sample(&rng.next_2d());

        let to_light = point.p - shading.position;
        let dist2 = to_light.norm_squared();
        if !(dist2 > 0.0) {
            return None;
        }
        let distance = dist2.sqrt();
        let direction = to_light / distance;
        // Emission leaves the front side only.
        let cos_light = -direction.dot(&point.n);
        if !(cos_light > 0.0) {
            return None;
        }

        let pdf = self.light_pdf_area(object_index) * dist2 / cos_light;
        let radiance = self.materials[object.material_id as usize].emission;
        Some(LightSample { direction, distance, radiance, pdf })
    }

    fn eval_pdf(&self, origin: &Vector3f, light_hit: &ShadingData) -> Float {
        if light_hit.emission.is_black() || !light_hit.front_facing {
            return 0.0;
        }
        let object_index = light_hit.hit.object as usize;
        if !self.lights.contains(&object_index) {
            return 0.0;
        }
        let dist2 = (light_hit.position - origin).norm_squared();
        let cos_light = light_hit.geo_normal.dot(&light_hit.wi).abs();
        if !(cos_light > 0.0) {
            return 0.0;
        }
        self.light_pdf_area(object_index) * dist2 / cos_light
    }
}

impl SceneServices for Scene {
    fn environment(&self) -> Option<&dyn EnvironmentSampler> {
        self.environment.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hit::{ScatterPayload, ShadowPayload};
    use crate::core::interior::InteriorStack;
    use crate::core::material::OPAQUE_PRIORITY;
    use crate::materials::dielectric::DielectricBSDF;
    use crate::materials::lambertian_diffuse::LambertianDiffuseBSDF;
    use crate::math::constants::PI;
    use crate::shapes::sphere::Sphere;

    fn diffuse() -> SceneMaterial {
        SceneMaterial::opaque("white", Arc::new(LambertianDiffuseBSDF::new(RGBSpectrum::splat(0.5))))
    }

    fn scatter_payload(interior: InteriorStack) -> RayPayload {
        RayPayload::Scatter(ScatterPayload { hit: HitDescriptor::invalid(), interior })
    }

    #[test]
    fn test_scene_closest_hit_and_shading() {
        let mut scene = Scene::new();
        let white = scene.add_material(diffuse());
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::new(0.0, 0.0, 0.0), 1.0)), white));
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::new(0.0, 0.0, 5.0), 1.0)), white));
        scene.build_bvh();

        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 10.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        let mut payload = scatter_payload(InteriorStack::new());
        scene.trace(&ray, RayFlags::CLOSEST_HIT, &mut payload);
        let hit = match payload {
            RayPayload::Scatter(s) => s.hit,
            _ => unreachable!(),
        };
        assert_eq!(hit.object, 1);

        let sd = scene.resolve(&hit, &ray.dir());
        assert!((sd.position - Vector3f::new(0.0, 0.0, 6.0)).norm() < 1e-4);
        assert!(sd.front_facing);
        assert!((sd.geo_normal - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-4);
        assert_eq!(sd.nested_priority, OPAQUE_PRIORITY);
    }

    #[test]
    fn test_scene_shadow_ray_visibility() {
        let mut scene = Scene::new();
        let white = scene.add_material(diffuse());
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::zeros(), 1.0)), white));

        let blocked = Ray3f::new(Vector3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, -1.0), Some(0.0), Some(10.0));
        let short = Ray3f::new(Vector3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, -1.0), Some(0.0), Some(3.0));
        let mut payload = RayPayload::Shadow(ShadowPayload { visible: false });
        scene.trace(&blocked, RayFlags::ACCEPT_FIRST_HIT, &mut payload);
        assert_eq!(payload, RayPayload::Shadow(ShadowPayload { visible: false }));
        scene.trace(&short, RayFlags::ACCEPT_FIRST_HIT, &mut payload);
        assert_eq!(payload, RayPayload::Shadow(ShadowPayload { visible: true }));
    }

    #[test]
    fn test_scene_skips_false_nested_intersections() {
        let mut scene = Scene::new();
        let outer = scene.add_material(SceneMaterial::dielectric("outer", Arc::new(DielectricBSDF::new()), 1.5, 5));
        let inner = scene.add_material(SceneMaterial::dielectric("inner", Arc::new(DielectricBSDF::new()), 1.33, 2));
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::zeros(), 2.0)), outer));
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::zeros(), 1.0)), inner));
        scene.build_bvh();

        // Inside the outer medium, travelling through the embedded inner one.
        let mut interior = InteriorStack::new();
        interior.push(outer, 5);
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, -1.5), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let mut payload = scatter_payload(interior);
        scene.trace(&ray, RayFlags::CLOSEST_HIT | RayFlags::RESOLVE_NESTED, &mut payload);
        match payload {
            RayPayload::Scatter(s) => {
                assert_eq!(s.hit.object, 0);
                // Entered and left the inner sphere during traversal.
                assert_eq!(s.interior.len(), 1);
                assert_eq!(s.interior.top_material_id(), Some(outer));
                let sd = scene.resolve(&s.hit, &ray.dir());
                assert!((sd.position.z - 2.0).abs() < 1e-4);
                assert!(!sd.front_facing);
            }
            _ => unreachable!(),
        }

        // Without resolution the inner sphere is reported.
        let mut payload = scatter_payload(interior);
        scene.trace(&ray, RayFlags::CLOSEST_HIT, &mut payload);
        match payload {
            RayPayload::Scatter(s) => assert_eq!(s.hit.object, 1),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_scene_light_sample_pdf_matches_eval_pdf() {
        let mut scene = Scene::new();
        let white = scene.add_material(diffuse());
        let lamp = scene.add_material(diffuse().with_emission(RGBSpectrum::splat(3.0)));
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::new(0.0, 0.0, -5.0), 1.0)), white));
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::new(0.0, 0.0, 5.0), 1.0)), lamp));
        scene.build_bvh();
        assert_eq!(scene.lights(), &vec![1]);

        let down = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        let mut payload = scatter_payload(InteriorStack::new());
        scene.trace(&down, RayFlags::CLOSEST_HIT, &mut payload);
        let hit = match payload {
            RayPayload::Scatter(s) => s.hit,
            _ => unreachable!(),
        };
        let shading = scene.resolve(&hit, &down.dir());

        let mut rng = LcgRng::new(5);
        let mut checked = 0;
        for _ in 0..64 {
            let sample = match scene.sample(&shading, 0, &mut rng) {
                Some(s) => s,
                None => continue,
            };
            assert_eq!(sample.radiance, RGBSpectrum::splat(3.0));
            let ray = Ray3f::new(shading.ray_origin(&sample.direction), sample.direction, None, None);
            let mut payload = scatter_payload(InteriorStack::new());
            scene.trace(&ray, RayFlags::CLOSEST_HIT, &mut payload);
            if let RayPayload::Scatter(s) = payload {
                assert_eq!(s.hit.object, 1);
                let light_hit = scene.resolve(&s.hit, &sample.direction);
                // Near the silhouette the traced point drifts from the sampled one.
                let sampled_point = shading.position + sample.direction * sample.distance;
                if light_hit.geo_normal.dot(&-sample.direction) < 0.2
                    || (light_hit.position - sampled_point).norm() > 1e-3 {
                    continue;
                }
                let pdf = scene.eval_pdf(&shading.position, &light_hit);
                assert!((pdf - sample.pdf).abs() / sample.pdf < 1e-2);
                checked += 1;
            }
        }
        assert!(checked > 10);

        // Uniform sphere sampling: pdf integrates to the visible cap fraction.
        let area = 4.0 * PI;
        assert!((scene.light_pdf_area(1) - 1.0 / area).abs() < 1e-6);
    }
}
