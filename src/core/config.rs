// Copyright @yucwang 2026

use crate::math::constants::Float;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MisHeuristic {
    Balance,
    PowerTwo,
    PowerExp,
}

impl MisHeuristic {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "balance" => Some(MisHeuristic::Balance),
            "power2" | "power_two" => Some(MisHeuristic::PowerTwo),
            "power_exp" => Some(MisHeuristic::PowerExp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroSamplesPerPixel,
    InvalidAbsorptionProbability(Float),
    LightSamplingWithoutSamples,
    InvalidMisExponent(Float),
    InvalidClampThreshold(Float),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroSamplesPerPixel => write!(f, "samples_per_pixel must be at least 1"),
            ConfigError::InvalidAbsorptionProbability(p) => {
                write!(f, "probability_absorption must lie in [0, 1], got {}", p)
            }
            ConfigError::LightSamplingWithoutSamples => write!(
                f,
                "emissive or environment light sampling is enabled but light_samples_per_vertex is 0"
            ),
            ConfigError::InvalidMisExponent(e) => write!(f, "mis_power_exponent must be positive, got {}", e),
            ConfigError::InvalidClampThreshold(t) => write!(f, "clamp_threshold must be positive, got {}", t),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Static settings of the path tracer, resolved once per render.
#[derive(Debug, Clone, PartialEq)]
pub struct PathTracerConfig {
    pub samples_per_pixel: u32,
    pub max_bounces: u32,
    pub light_samples_per_vertex: u32,
    pub use_russian_roulette: bool,
    pub probability_absorption: Float,
    pub use_nested_dielectrics: bool,
    pub use_emissive_lights: bool,
    pub use_emissive_sampler: bool,
    pub use_mis: bool,
    pub mis_heuristic: MisHeuristic,
    pub mis_power_exponent: Float,
    pub use_env_light: bool,
    pub use_env_background: bool,
    pub use_light_samples_in_volumes: bool,
    pub trace_scatter_ray_from_last_path_vertex: bool,
    pub clamp_samples: bool,
    pub clamp_threshold: Float,
    pub use_fixed_seed: bool,
    pub seed: u64,
}

impl Default for PathTracerConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 1,
            max_bounces: 3,
            light_samples_per_vertex: 1,
            use_russian_roulette: false,
            probability_absorption: 0.2,
            use_nested_dielectrics: true,
            use_emissive_lights: true,
            use_emissive_sampler: true,
            use_mis: true,
            mis_heuristic: MisHeuristic::PowerTwo,
            mis_power_exponent: 2.0,
            use_env_light: true,
            use_env_background: true,
            use_light_samples_in_volumes: false,
            trace_scatter_ray_from_last_path_vertex: true,
            clamp_samples: false,
            clamp_threshold: 10.0,
            use_fixed_seed: false,
            seed: 0,
        }
    }
}

impl PathTracerConfig {
    /// Rejects combinations the integrator cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::ZeroSamplesPerPixel);
        }
        let p = self.probability_absorption;
        if !(p >= 0.0 && p <= 1.0) {
            return Err(ConfigError::InvalidAbsorptionProbability(p));
        }
        if self.light_samples_per_vertex == 0 && (self.samples_emissive_lights() || self.use_env_light) {
            return Err(ConfigError::LightSamplingWithoutSamples);
        }
        if self.mis_heuristic == MisHeuristic::PowerExp
            && !(self.mis_power_exponent > 0.0 && self.mis_power_exponent.is_finite())
        {
            return Err(ConfigError::InvalidMisExponent(self.mis_power_exponent));
        }
        if self.clamp_samples && !(self.clamp_threshold > 0.0) {
            return Err(ConfigError::InvalidClampThreshold(self.clamp_threshold));
        }
        Ok(())
    }

    /// Upper bound of the bounce loop. One extra iteration traces a scatter
    /// ray from the last vertex so that emission it hits is still collected.
    pub fn max_iterations(&self) -> u32 {
        if self.trace_scatter_ray_from_last_path_vertex {
            self.max_bounces + 1
        } else {
            self.max_bounces
        }
    }

    /// Whether emissive geometry is reached by next-event estimation.
    pub fn samples_emissive_lights(&self) -> bool {
        self.use_emissive_lights && self.use_emissive_sampler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PathTracerConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.max_iterations(), config.max_bounces + 1);
    }

    #[test]
    fn test_max_iterations_without_last_vertex_scatter() {
        let config = PathTracerConfig {
            max_bounces: 4,
            trace_scatter_ray_from_last_path_vertex: false,
            ..PathTracerConfig::default()
        };
        assert_eq!(config.max_iterations(), 4);
    }

    #[test]
    fn test_rejects_light_sampling_without_samples() {
        let config = PathTracerConfig {
            light_samples_per_vertex: 0,
            ..PathTracerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::LightSamplingWithoutSamples));

        let bsdf_only = PathTracerConfig {
            light_samples_per_vertex: 0,
            use_emissive_sampler: false,
            use_env_light: false,
            ..PathTracerConfig::default()
        };
        assert_eq!(bsdf_only.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let nan_rr = PathTracerConfig {
            probability_absorption: Float::NAN,
            ..PathTracerConfig::default()
        };
        assert!(matches!(nan_rr.validate(), Err(ConfigError::InvalidAbsorptionProbability(_))));

        let certain_absorption = PathTracerConfig {
            probability_absorption: 1.0,
            ..PathTracerConfig::default()
        };
        assert_eq!(certain_absorption.validate(), Ok(()));

        let zero_spp = PathTracerConfig {
            samples_per_pixel: 0,
            ..PathTracerConfig::default()
        };
        assert_eq!(zero_spp.validate(), Err(ConfigError::ZeroSamplesPerPixel));

        let bad_exp = PathTracerConfig {
            mis_heuristic: MisHeuristic::PowerExp,
            mis_power_exponent: 0.0,
            ..PathTracerConfig::default()
        };
        assert_eq!(bad_exp.validate(), Err(ConfigError::InvalidMisExponent(0.0)));

        let bad_clamp = PathTracerConfig {
            clamp_samples: true,
            clamp_threshold: -1.0,
            ..PathTracerConfig::default()
        };
        assert_eq!(bad_clamp.validate(), Err(ConfigError::InvalidClampThreshold(-1.0)));
    }

    #[test]
    fn test_heuristic_names() {
        assert_eq!(MisHeuristic::from_name("balance"), Some(MisHeuristic::Balance));
        assert_eq!(MisHeuristic::from_name("power2"), Some(MisHeuristic::PowerTwo));
        assert_eq!(MisHeuristic::from_name("power_exp"), Some(MisHeuristic::PowerExp));
        assert_eq!(MisHeuristic::from_name("nope"), None);
    }
}
