// Copyright @yucwang 2026

use crate::core::bsdf::BSDFSample;
use crate::core::config::{ConfigError, PathTracerConfig};
use crate::core::emitter::{LightSample, LightSampler};
use crate::core::hit::{HitDescriptor, RayFlags, RayPayload, ScatterPayload, ShadowPayload};
use crate::core::integrator::{Integrator, PixelContext};
use crate::core::interior::InteriorStack;
use crate::core::mis::eval_mis;
use crate::core::path_state::{PathOutcome, PathState, PathTermination};
use crate::core::pixel_log::LogValue;
use crate::core::ray_cast::RayCastService;
use crate::core::rng::LcgRng;
use crate::core::sensor::Sensor;
use crate::core::services::SceneServices;
use crate::core::shading::ShadingData;
use crate::math::constants::{Float, Vector2f, Vector3f, MAX_RAY_DISTANCE};
use crate::math::ray::Ray3f;
use crate::math::spectrum::{RGBSpectrum, Spectrum};

/// Relative amount shadow rays stop short of the sampled light point.
pub const SHADOW_RAY_EPSILON: Float = 1e-4;

/// Candidate connection to a light, ready to be tested for visibility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowRaySample {
    pub direction: Vector3f,
    pub distance: Float,
    /// MIS-weighted contribution, not yet multiplied by path throughput.
    pub unweighted_radiance: RGBSpectrum,
    pub valid: bool,
}

impl ShadowRaySample {
    fn invalid(direction: Vector3f) -> Self {
        Self { direction, distance: 0.0, unweighted_radiance: RGBSpectrum::default(), valid: false }
    }
}

/// Unidirectional path tracer with next-event estimation, multiple
/// importance sampling, Russian roulette and nested dielectrics.
pub struct PathIntegrator {
    config: PathTracerConfig,
}

impl PathIntegrator {
    pub fn new(config: PathTracerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!("Path tracer: {} spp, {} bounces, {} light samples per vertex, MIS: {} ({:?}), RR: {} (p = {}), nested dielectrics: {}.",
                   config.samples_per_pixel,
                   config.max_bounces,
                   config.light_samples_per_vertex,
                   config.use_mis,
                   config.mis_heuristic,
                   config.use_russian_roulette,
                   config.probability_absorption,
                   config.use_nested_dielectrics);
        Ok(Self { config })
    }

    pub fn config(&self) -> &PathTracerConfig {
        &self.config
    }

    /// Binary visibility along `[0, distance]`. Invalid samples are still
    /// traced, with an empty range, but never count as visible nor as a
    /// traced shadow ray.
    pub fn trace_shadow_ray<S: RayCastService + ?Sized>(&self,
                                                        scene: &S,
                                                        ctx: &PixelContext,
                                                        origin: &Vector3f,
                                                        dir: &Vector3f,
                                                        distance: Float,
                                                        valid: bool) -> bool {
        let max_t = if valid { distance } else { 0.0 };
        let ray = Ray3f::new(*origin, *dir, Some(0.0), Some(max_t));
        let mut payload = RayPayload::Shadow(ShadowPayload { visible: false });
        scene.trace(&ray, RayFlags::ACCEPT_FIRST_HIT, &mut payload);
        if valid {
            ctx.stats.record_shadow_ray();
        }

        match payload {
            RayPayload::Shadow(shadow) => valid && shadow.visible,
            RayPayload::Scatter(_) => false,
        }
    }

    /// Closest hit along `dir`. The interior stack travels with the ray and
    /// whatever the tracer folded into it is committed back, hit or miss.
    /// `hit` is only written on success.
    pub fn trace_scatter_ray<S: RayCastService + ?Sized>(&self,
                                                         scene: &S,
                                                         ctx: &PixelContext,
                                                         origin: &Vector3f,
                                                         dir: &Vector3f,
                                                         interior: &mut InteriorStack,
                                                         hit: &mut HitDescriptor) -> bool {
        let ray = Ray3f::new(*origin, *dir, Some(0.0), Some(MAX_RAY_DISTANCE));
        let mut flags = RayFlags::CLOSEST_HIT;
        if self.config.use_nested_dielectrics {
            flags |= RayFlags::RESOLVE_NESTED;
        }
        let mut payload = RayPayload::Scatter(ScatterPayload { hit: HitDescriptor::invalid(), interior: *interior });
        scene.trace(&ray, flags, &mut payload);
        ctx.stats.record_scatter_ray();

        match payload {
            RayPayload::Scatter(scatter) => {
                *interior = scatter.interior;
                if scatter.hit.is_valid() {
                    *hit = scatter.hit;
                    true
                } else {
                    false
                }
            }
            RayPayload::Shadow(_) => false,
        }
    }

    fn light_strategies<S: SceneServices + ?Sized>(&self, scene: &S) -> (bool, bool) {
        let emissive = self.config.samples_emissive_lights() && scene.has_lights();
        let environment = self.config.use_env_light && scene.environment().is_some();
        (emissive, environment)
    }

    /// Probability of picking any one of the enabled light strategies.
    pub fn light_selection_pdf<S: SceneServices + ?Sized>(&self, scene: &S) -> Float {
        match self.light_strategies(scene) {
            (true, true) => 0.5,
            (false, false) => 0.0,
            _ => 1.0,
        }
    }

    fn sample_light<S: SceneServices + ?Sized>(&self,
                                               scene: &S,
                                               sd: &ShadingData,
                                               sample_index: u32,
                                               rng: &mut LcgRng) -> Option<LightSample> {
        let use_environment = match self.light_strategies(scene) {
            (true, true) => rng.next_f32() < 0.5,
            (false, true) => true,
            (true, false) => false,
            (false, false) => return None,
        };

        let mut sample = if use_environment {
            scene.environment()?.sample(rng)?
        } else {
            LightSampler::sample(scene, sd, sample_index, rng)?
        };
        sample.pdf *= self.light_selection_pdf(scene);
        Some(sample)
    }

    /// Samples a light from the vertex `sd`. MIS against the BSDF strategy only applies when
    /// `scatter_follows`, i.e. the path will also sample a scatter ray from this vertex.
    pub fn generate_shadow_ray<S: SceneServices + ?Sized>(&self,
                                                          scene: &S,
                                                          sd: &ShadingData,
                                                          sample_index: u32,
                                                          scatter_follows: bool,
                                                          rng: &mut LcgRng) -> ShadowRaySample {
        let light = match self.sample_light(scene, sd, sample_index, rng) {
            Some(light) => light,
            None => return ShadowRaySample::invalid(sd.geo_normal),
        };
        if !(light.pdf > 0.0) || light.radiance.is_black() {
            return ShadowRaySample::invalid(sd.geo_normal);
        }

        let f = sd.eval_bsdf(&light.direction);
        if f.is_black() {
            return ShadowRaySample::invalid(sd.geo_normal);
        }

        let n_light = self.config.light_samples_per_vertex;
        let mis_weight = if self.config.use_mis && scatter_follows && !sd.bsdf.is_delta() {
            eval_mis(self.config.mis_heuristic,
                     self.config.mis_power_exponent,
                     n_light,
                     light.pdf,
                     1,
                     sd.pdf_bsdf(&light.direction))
        } else {
            1.0
        };

        ShadowRaySample {
            direction: light.direction,
            distance: light.distance * (1.0 - SHADOW_RAY_EPSILON),
            unweighted_radiance: light.radiance * f * (mis_weight / (light.pdf * n_light as Float)),
            valid: true,
        }
    }

    /// Next-event estimation at the current vertex.
    fn eval_direct<S: SceneServices + ?Sized>(&self,
                                              scene: &S,
                                              ctx: &PixelContext,
                                              sd: &ShadingData,
                                              path: &mut PathState) {
        let scatter_follows = path.length < self.config.max_iterations();
        for sample_index in 0..self.config.light_samples_per_vertex {
            let sample = self.generate_shadow_ray(scene, sd, sample_index, scatter_follows, &mut path.rng);
            let origin = sd.ray_origin(&sample.direction);
            if self.trace_shadow_ray(scene, ctx, &origin, &sample.direction, sample.distance, sample.valid) {
                path.add_radiance(sample.unweighted_radiance);
            }
        }
        path.light_sampled_at_last_vertex = self.config.light_samples_per_vertex > 0;
    }

    /// Samples the BSDF and moves the path onto the new direction.
    fn generate_scatter_ray(&self, sd: &ShadingData, path: &mut PathState) -> Option<BSDFSample> {
        let u = path.rng.next_2d();
        let u_lobe = path.rng.next_f32();
        let sample = sd.bsdf.sample(&sd.wi_local(), sd.eta, &u, u_lobe)?;
        if !sample.is_delta && !(sample.pdf > 0.0) {
            return None;
        }
        if sample.weight.is_black() || !sample.weight.is_finite() {
            return None;
        }

        let dir = sd.frame.from_local(&sample.wo).normalize();
        path.direction = dir;
        path.origin = sd.front_ray_origin();
        path.throughput *= sample.weight;
        path.last_scatter_pdf = sample.pdf;
        path.last_scatter_delta = sample.is_delta;
        Some(sample)
    }

    /// Resolves the current hit and applies everything that happened along
    /// the segment leading to it.
    fn shade_vertex<S: SceneServices + ?Sized>(&self,
                                               scene: &S,
                                               ctx: &PixelContext,
                                               path: &mut PathState) -> ShadingData {
        let mut sd = scene.resolve(&path.hit, &path.direction);

        if self.config.use_nested_dielectrics {
            sd.eta = path.interior.relative_eta(sd.material_id, sd.front_facing, |id| scene.material_ior(id));
            if let Some(medium) = path.interior.top_material_id() {
                let sigma_a = scene.material_absorption(medium);
                let distance = (sd.position - path.origin).norm();
                path.throughput *= (sigma_a * (-distance)).exp();
            }
        }

        if sd.frame.repair() {
            ctx.print("repaired shading frame", LogValue::Vec3(sd.frame.z));
        }
        sd
    }

    /// Whether light sampling at the previous vertex could have produced the
    /// light just reached by BSDF sampling.
    fn covered_by_light_sampling(&self, path: &PathState, strategy_enabled: bool) -> bool {
        strategy_enabled
            && path.light_sampled_at_last_vertex
            && !path.last_scatter_delta
            && path.last_scatter_pdf > 0.0
    }

    fn handle_hit<S: SceneServices + ?Sized>(&self,
                                             scene: &S,
                                             ctx: &PixelContext,
                                             path: &mut PathState) -> ShadingData {
        let sd = self.shade_vertex(scene, ctx, path);

        if self.config.use_emissive_lights && !sd.emission.is_black() {
            let (emissive_sampled, _) = self.light_strategies(scene);
            let weight = if !self.covered_by_light_sampling(path, emissive_sampled) {
                1.0
            } else if self.config.use_mis {
                let light_pdf = LightSampler::eval_pdf(scene, &path.origin, &sd) * self.light_selection_pdf(scene);
                eval_mis(self.config.mis_heuristic,
                         self.config.mis_power_exponent,
                         1,
                         path.last_scatter_pdf,
                         self.config.light_samples_per_vertex,
                         light_pdf)
            } else {
                0.0
            };
            if weight > 0.0 {
                path.add_radiance(sd.emission * weight);
            }
        }

        path.length += 1;
        path.origin = sd.front_ray_origin();
        ctx.print("path length", LogValue::UInt(path.length));
        sd
    }

    fn handle_miss<S: SceneServices + ?Sized>(&self, scene: &S, path: &mut PathState) {
        if !self.config.use_env_light {
            return;
        }
        let env = match scene.environment() {
            Some(env) => env,
            None => return,
        };
        let radiance = env.eval_radiance(&path.direction);
        if radiance.is_black() {
            return;
        }

        let weight = if !self.covered_by_light_sampling(path, true) {
            1.0
        } else if self.config.use_mis {
            let light_pdf = env.eval_pdf(&path.direction) * self.light_selection_pdf(scene);
            eval_mis(self.config.mis_heuristic,
                     self.config.mis_power_exponent,
                     1,
                     path.last_scatter_pdf,
                     self.config.light_samples_per_vertex,
                     light_pdf)
        } else {
            0.0
        };
        if weight > 0.0 {
            path.add_radiance(radiance * weight);
        }
    }

    fn finish(&self, ctx: &PixelContext, path: &PathState, termination: PathTermination) -> PathOutcome {
        ctx.stats.record_path(path.length);
        ctx.print("radiance", LogValue::Vec3(path.radiance.to_vec()));
        path.finish(termination)
    }

    /// Walks a path whose primary hit is already stored in `path.hit`.
    pub fn trace_path<S: SceneServices + ?Sized>(&self,
                                                 scene: &S,
                                                 ctx: &PixelContext,
                                                 mut path: PathState) -> PathOutcome {
        let mut sd = self.shade_vertex(scene, ctx, &mut path);
        // Primary emission is counted exactly once, whatever the sampling setup.
        if !sd.emission.is_black() {
            path.add_radiance(sd.emission);
        }
        path.origin = sd.front_ray_origin();
        self.eval_direct(scene, ctx, &sd, &mut path);

        for _ in 0..self.config.max_iterations() {
            if self.config.use_russian_roulette {
                let p = self.config.probability_absorption;
                if path.rng.next_f32() < p {
                    return self.finish(ctx, &path, PathTermination::Absorbed);
                }
                path.throughput /= 1.0 - p;
                ctx.check(path.throughput.is_finite() && path.throughput.min_value() >= 0.0,
                          "throughput after roulette",
                          LogValue::Vec3(path.throughput.to_vec()));
            }

            let sample = match self.generate_scatter_ray(&sd, &mut path) {
                Some(sample) => sample,
                None => return self.finish(ctx, &path, PathTermination::ScatterFailed),
            };
            if sample.is_transmission {
                path.origin = sd.ray_origin(&path.direction);
                if self.config.use_nested_dielectrics {
                    path.interior.handle_intersection(sd.material_id, sd.nested_priority, sd.front_facing);
                }
            }

            if !self.trace_scatter_ray(scene, ctx, &path.origin, &path.direction, &mut path.interior, &mut path.hit) {
                self.handle_miss(scene, &mut path);
                return self.finish(ctx, &path, PathTermination::Escaped);
            }

            sd = self.handle_hit(scene, ctx, &mut path);

            let may_sample_lights = self.config.use_light_samples_in_volumes || path.interior.is_empty();
            if path.length <= self.config.max_bounces && may_sample_lights {
                self.eval_direct(scene, ctx, &sd, &mut path);
            } else {
                path.light_sampled_at_last_vertex = false;
            }
        }

        self.finish(ctx, &path, PathTermination::MaxDepthReached)
    }

    /// Traces a camera ray and, if it hits something, the path behind it.
    pub fn trace_camera_ray<S: SceneServices + ?Sized>(&self,
                                                       scene: &S,
                                                       ctx: &PixelContext,
                                                       ray: &Ray3f,
                                                       rng: LcgRng) -> PathOutcome {
        let mut path = PathState::new(ray.origin(), ray.dir(), rng);
        if !self.trace_scatter_ray(scene, ctx, &path.origin, &path.direction, &mut path.interior, &mut path.hit) {
            if self.config.use_env_background {
                if let Some(env) = scene.environment() {
                    path.radiance = env.eval_radiance(&path.direction);
                }
            }
            return self.finish(ctx, &path, PathTermination::Escaped);
        }
        self.trace_path(scene, ctx, path)
    }
}

impl Integrator for PathIntegrator {
    fn trace_ray_forward(&self,
                         scene: &dyn SceneServices,
                         sensor: &dyn Sensor,
                         ctx: &PixelContext,
                         mut rng: LcgRng) -> RGBSpectrum {
        let (width, height) = {
            let bmp = sensor.bitmap();
            (bmp.width().max(1) as Float, bmp.height().max(1) as Float)
        };
        let (x, y) = ctx.pixel;
        let jitter = rng.next_2d();
        let u = Vector2f::new((x as Float + jitter.x) / width, (y as Float + jitter.y) / height);
        let ray = sensor.sample_ray(&u);

        let outcome = self.trace_camera_ray(scene, ctx, &ray, rng);
        let mut radiance = outcome.radiance;
        if !ctx.check(radiance.is_finite(), "finite radiance", LogValue::Vec3(radiance.to_vec())) {
            return RGBSpectrum::default();
        }
        if self.config.clamp_samples {
            let peak = radiance.max_value();
            if peak > self.config.clamp_threshold {
                radiance *= self.config.clamp_threshold / peak;
            }
        }
        radiance
    }

    fn samples_per_pixel(&self) -> u32 {
        self.config.samples_per_pixel
    }

    fn max_path_length(&self) -> u32 {
        self.config.max_iterations()
    }

    fn describe(&self) -> String {
        format!("PathIntegrator [max bounces: {}, spp: {}]", self.config.max_bounces, self.config.samples_per_pixel)
    }
}
