// Copyright @yucwang 2026

use crate::core::pixel_log::{LogValue, PixelLog, PixelLogRecord, RecordKind};
use crate::core::rng::LcgRng;
use crate::core::sensor::Sensor;
use crate::core::services::SceneServices;
use crate::core::stats::RayStatistics;
use crate::math::spectrum::RGBSpectrum;

/// Per-invocation context threaded through a path: which pixel is being
/// traced, which pixel (if any) is being debugged, and the shared sinks.
#[derive(Clone, Copy)]
pub struct PixelContext<'a> {
    pub pixel: (usize, usize),
    pub debug_pixel: Option<(usize, usize)>,
    pub stats: &'a RayStatistics,
    pub log: &'a PixelLog,
}

impl<'a> PixelContext<'a> {
    pub fn new(pixel: (usize, usize),
               debug_pixel: Option<(usize, usize)>,
               stats: &'a RayStatistics,
               log: &'a PixelLog) -> Self {
        Self { pixel, debug_pixel, stats, log }
    }

    pub fn is_debug_pixel(&self) -> bool {
        self.debug_pixel == Some(self.pixel)
    }

    /// Recorded only while tracing the debug pixel.
    pub fn print(&self, label: &'static str, value: LogValue) {
        if self.is_debug_pixel() {
            self.log.append(PixelLogRecord { pixel: self.pixel, kind: RecordKind::Print, label, value });
        }
    }

    /// Records a failed check for any pixel. Returns `condition`.
    pub fn check(&self, condition: bool, label: &'static str, value: LogValue) -> bool {
        if !condition {
            self.log.append(PixelLogRecord { pixel: self.pixel, kind: RecordKind::Assert, label, value });
        }
        condition
    }
}

pub trait Integrator: Sync {
    /// Estimates the radiance of one sample of `ctx.pixel`.
    fn trace_ray_forward(&self,
                         scene: &dyn SceneServices,
                         sensor: &dyn Sensor,
                         ctx: &PixelContext,
                         rng: LcgRng) -> RGBSpectrum;

    fn samples_per_pixel(&self) -> u32;

    /// Longest path the integrator can produce, in scattering vertices.
    fn max_path_length(&self) -> u32 {
        0
    }

    fn describe(&self) -> String {
        String::from("Integrator")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_context_print_only_for_debug_pixel() {
        let stats = RayStatistics::new(1);
        let log = PixelLog::new(8);
        let debugged = PixelContext::new((2, 3), Some((2, 3)), &stats, &log);
        let other = PixelContext::new((1, 3), Some((2, 3)), &stats, &log);

        debugged.print("depth", LogValue::UInt(1));
        other.print("depth", LogValue::UInt(2));
        assert_eq!(log.len(), 1);
        assert_eq!(log.records()[0].pixel, (2, 3));

        assert!(!other.check(false, "finite", LogValue::Bool(false)));
        assert!(other.check(true, "finite", LogValue::Bool(true)));
        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].kind, RecordKind::Assert);
        assert_eq!(records[1].pixel, (1, 3));
    }
}
