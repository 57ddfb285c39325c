// Copyright @yucwang 2026

use crate::core::hit::HitDescriptor;
use crate::core::interior::InteriorStack;
use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTermination {
    /// Killed by Russian roulette.
    Absorbed,
    /// Scatter ray left the scene.
    Escaped,
    /// The BSDF produced no usable direction.
    ScatterFailed,
    MaxDepthReached,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathOutcome {
    pub radiance: RGBSpectrum,
    pub termination: PathTermination,
    pub path_length: u32,
}

/// Mutable record of one random walk. Owned by the worker tracing it.
#[derive(Debug, Clone)]
pub struct PathState {
    pub origin: Vector3f,
    pub direction: Vector3f,
    pub throughput: RGBSpectrum,
    pub radiance: RGBSpectrum,
    pub length: u32,
    /// Zero until the first scatter event.
    pub last_scatter_pdf: Float,
    pub last_scatter_delta: bool,
    pub light_sampled_at_last_vertex: bool,
    pub rng: LcgRng,
    pub interior: InteriorStack,
    pub hit: HitDescriptor,
}

impl PathState {
    pub fn new(origin: Vector3f, direction: Vector3f, rng: LcgRng) -> Self {
        Self {
            origin,
            direction,
            throughput: RGBSpectrum::one(),
            radiance: RGBSpectrum::default(),
            length: 0,
            last_scatter_pdf: 0.0,
            last_scatter_delta: false,
            light_sampled_at_last_vertex: false,
            rng,
            interior: InteriorStack::new(),
            hit: HitDescriptor::invalid(),
        }
    }

    /// Accumulates radiance arriving at the current vertex, scaled by the throughput.
    pub fn add_radiance(&mut self, contribution: RGBSpectrum) {
        self.radiance += self.throughput * contribution;
    }

    pub fn finish(&self, termination: PathTermination) -> PathOutcome {
        PathOutcome { radiance: self.radiance, termination, path_length: self.length }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::spectrum::Spectrum;

    #[test]
    fn test_path_state_starts_clean() {
        let state = PathState::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), LcgRng::new(1));
        assert_eq!(state.throughput, RGBSpectrum::one());
        assert!(state.radiance.is_black());
        assert_eq!(state.length, 0);
        assert_eq!(state.last_scatter_pdf, 0.0);
        assert!(state.interior.is_empty());
        assert!(!state.hit.is_valid());

        let outcome = state.finish(PathTermination::Escaped);
        assert_eq!(outcome.path_length, 0);
        assert_eq!(outcome.termination, PathTermination::Escaped);
    }

    #[test]
    fn test_add_radiance_scales_by_throughput() {
        let mut state = PathState::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), LcgRng::new(1));
        state.add_radiance(RGBSpectrum::splat(2.0));
        state.throughput = RGBSpectrum::new(0.5, 0.25, 0.0);
        state.add_radiance(RGBSpectrum::splat(4.0));
        assert_eq!(state.radiance, RGBSpectrum::new(4.0, 3.0, 2.0));
    }
}
