// Copyright @yucwang 2026

use crate::core::computation_node::{ComputationNode, generate_node_id};
use crate::core::emitter::{EnvironmentSampler, LightSample};
use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Vector3f, MAX_RAY_DISTANCE};
use crate::math::spectrum::{RGBSpectrum, Spectrum};
use crate::math::warp::{sample_uniform_sphere, sample_uniform_sphere_pdf};

/// Uniform radiance arriving from every direction.
pub struct ConstantEnvironment {
    id: String,
    radiance: RGBSpectrum,
}

impl ConstantEnvironment {
    pub fn new(radiance: RGBSpectrum) -> Self {
        Self { id: generate_node_id("ConstantEnvironment"), radiance }
    }

    pub fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }
}

impl ComputationNode for ConstantEnvironment {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("ConstantEnvironment [radiance: ({}, {}, {})]",
                self.radiance[0], self.radiance[1], self.radiance[2])
    }
}

impl EnvironmentSampler for ConstantEnvironment {
    fn sample(&self, rng: &mut LcgRng) -> Option<LightSample> {
        if self.radiance.is_black() {
            return None;
        }
        let direction = sample_uniform_sphere(&rng.next_2d());
        Some(LightSample {
            direction,
            distance: MAX_RAY_DISTANCE,
            radiance: self.radiance,
            pdf: sample_uniform_sphere_pdf(),
        })
    }

    fn eval_radiance(&self, _direction: &Vector3f) -> RGBSpectrum {
        self.radiance
    }

    fn eval_pdf(&self, _direction: &Vector3f) -> Float {
        if self.radiance.is_black() {
            0.0
        } else {
            sample_uniform_sphere_pdf()
        }
    }
}
