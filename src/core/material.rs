// Copyright @yucwang 2026

use crate::core::bsdf::BSDF;
use crate::math::constants::Float;
use crate::math::spectrum::RGBSpectrum;

use std::sync::Arc;

/// Nesting priority of surfaces that never bound a medium; they are never
/// skipped by nested-dielectric resolution.
pub const OPAQUE_PRIORITY: u32 = u32::MAX;

/// Everything the scene knows about a surface material.
#[derive(Clone)]
pub struct SceneMaterial {
    pub name: String,
    pub bsdf: Arc<dyn BSDF>,
    /// Radiance leaving the front side.
    pub emission: RGBSpectrum,
    pub ior: Float,
    /// Absorption coefficient of the enclosed volume.
    pub absorption: RGBSpectrum,
    pub nested_priority: u32,
}

impl SceneMaterial {
    pub fn opaque(name: &str, bsdf: Arc<dyn BSDF>) -> Self {
        Self {
            name: name.to_string(),
            bsdf,
            emission: RGBSpectrum::default(),
            ior: 1.0,
            absorption: RGBSpectrum::default(),
            nested_priority: OPAQUE_PRIORITY,
        }
    }

    pub fn dielectric(name: &str, bsdf: Arc<dyn BSDF>, ior: Float, nested_priority: u32) -> Self {
        Self {
            name: name.to_string(),
            bsdf,
            emission: RGBSpectrum::default(),
            ior,
            absorption: RGBSpectrum::default(),
            nested_priority,
        }
    }

    pub fn with_emission(mut self, emission: RGBSpectrum) -> Self {
        self.emission = emission;
        self
    }

    pub fn with_absorption(mut self, absorption: RGBSpectrum) -> Self {
        self.absorption = absorption;
        self
    }

    pub fn describe(&self) -> String {
        format!("{} [{}, ior: {}, priority: {}]", self.name, self.bsdf.name(), self.ior, self.nested_priority)
    }
}
