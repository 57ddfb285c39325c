// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::integrator::{Integrator, PixelContext};
use crate::core::pixel_log::PixelLog;
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::core::services::SceneServices;
use crate::core::stats::RayStatistics;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

pub use super::renderer::Renderer;

const BLOCK_SIZE: usize = 32;
const DEFAULT_LOG_CAPACITY: usize = 4096;

pub struct SimpleRenderer {
    id: String,
    integrator: Box<dyn Integrator>,
    camera_id: usize,
    seed: u64,
    debug_pixel: Option<(usize, usize)>,
    stats: RayStatistics,
    log: PixelLog,
}

impl ComputationNode for SimpleRenderer {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("SimpleRenderer: [camera: {}, seed: {}, {}]", self.camera_id, self.seed, self.integrator.describe())
    }
}

impl Renderer for SimpleRenderer {
    fn render(&self, scene: &mut Scene) -> Bitmap {
        let mut sensor = match scene.take_sensor(self.camera_id) {
            Some(sensor) => sensor,
            None => {
                log::warn!("Camera {} does not exist, nothing to render.", self.camera_id);
                return Bitmap::new(0, 0);
            }
        };

        let (width, height) = {
            let bmp = sensor.bitmap();
            (bmp.width(), bmp.height())
        };
        if width == 0 || height == 0 {
            scene.insert_sensor(self.camera_id, sensor);
            return Bitmap::new(0, 0);
        }
        let spp = match self.integrator.samples_per_pixel() {
            0 => 1,
            v => v,
        };
        let inv_spp = 1.0 / (spp as Float);

        let blocks_x = (width + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let blocks_y = (height + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let total_blocks = blocks_x * blocks_y;
        let scene_ref: &dyn SceneServices = &*scene;
        let sensor_ref: &dyn Sensor = sensor.as_ref();
        let integrator_ref: &dyn Integrator = self.integrator.as_ref();
        let stats = &self.stats;
        let pixel_log = &self.log;
        let debug_pixel = self.debug_pixel;
        let seed = self.seed;

        log::info!("Rendering {}x{} pixels at {} spp with {}.", width, height, spp, integrator_ref.describe());
        let start = Instant::now();

        let progress = ProgressBar::new(total_blocks as u64);
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let next_block = Arc::new(AtomicUsize::new(0));
        let thread_count = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let (tx, rx) = mpsc::channel::<(usize, usize, usize, usize, Vec<Vector3f>)>();
        let mut output = vec![Vector3f::zeros(); width * height];

        thread::scope(|scope| {
            for _ in 0..thread_count {
                let next_block = Arc::clone(&next_block);
                let tx = tx.clone();
                scope.spawn(move || {
                    loop {
                        let block_index = next_block.fetch_add(1, Ordering::Relaxed);
                        if block_index >= total_blocks {
                            break;
                        }

                        let bx = block_index % blocks_x;
                        let by = block_index / blocks_x;
                        let x0 = bx * BLOCK_SIZE;
                        let y0 = by * BLOCK_SIZE;
                        let x1 = (x0 + BLOCK_SIZE).min(width);
                        let y1 = (y0 + BLOCK_SIZE).min(height);

                        let mut block = vec![Vector3f::zeros(); (x1 - x0) * (y1 - y0)];
                        for y in y0..y1 {
                            for x in x0..x1 {
                                let ctx = PixelContext::new((x, y), debug_pixel, stats, pixel_log);
                                let mut color = RGBSpectrum::default();
                                for sample in 0..spp {
                                    let rng = LcgRng::for_sample(seed, x, y, sample);
                                    color += integrator_ref.trace_ray_forward(scene_ref, sensor_ref, &ctx, rng);
                                }
                                block[(x - x0) + (x1 - x0) * (y - y0)] = (color * inv_spp).to_vec();
                            }
                        }
                        if tx.send((x0, y0, x1, y1, block)).is_err() {
                            break;
                        }
                    }
                });
            }

            drop(tx);
            for _ in 0..total_blocks {
                if let Ok((x0, y0, x1, y1, block)) = rx.recv() {
                    for y in y0..y1 {
                        for x in x0..x1 {
                            output[x + width * y] = block[(x - x0) + (x1 - x0) * (y - y0)];
                        }
                    }
                    progress.inc(1);
                }
            }
        });
        progress.finish_and_clear();
        log::info!("Render finished in {:.2?}.", start.elapsed());

        let bitmap = sensor.bitmap_mut();
        for y in 0..height {
            for x in 0..width {
                bitmap[(x, y)] = output[x + width * y];
            }
        }
        let bitmap = bitmap.clone();
        scene.insert_sensor(self.camera_id, sensor);
        bitmap
    }
}

impl SimpleRenderer {
    pub fn new(integrator: Box<dyn Integrator>, camera_id: usize, seed: u64) -> Self {
        let stats = RayStatistics::new(integrator.max_path_length());
        Self {
            id: generate_node_id("simple_renderer"),
            integrator,
            camera_id,
            seed,
            debug_pixel: None,
            stats,
            log: PixelLog::new(DEFAULT_LOG_CAPACITY),
        }
    }

    pub fn with_debug_pixel(mut self, pixel: (usize, usize)) -> Self {
        self.debug_pixel = Some(pixel);
        self
    }

    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log = PixelLog::new(capacity);
        self
    }

    pub fn stats(&self) -> &RayStatistics {
        &self.stats
    }

    pub fn pixel_log(&self) -> &PixelLog {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pixel_log::{LogValue, RecordKind};
    use crate::sensors::perspective::PerspectiveCamera;

    // Returns the pixel coordinates so the block layout can be checked.
    struct CoordinateIntegrator;

    impl Integrator for CoordinateIntegrator {
        fn trace_ray_forward(&self,
                             _scene: &dyn SceneServices,
                             _sensor: &dyn Sensor,
                             ctx: &PixelContext,
                             mut rng: LcgRng) -> RGBSpectrum {
            ctx.print("pixel", LogValue::UInt(ctx.pixel.0 as u32));
            ctx.stats.record_path(0);
            let _ = rng.next_f32();
            RGBSpectrum::new(ctx.pixel.0 as Float, ctx.pixel.1 as Float, 1.0)
        }

        fn samples_per_pixel(&self) -> u32 {
            4
        }
    }

    fn camera(width: usize, height: usize) -> Box<dyn Sensor> {
        Box::new(PerspectiveCamera::new(Vector3f::new(0.0, 0.0, 5.0),
                                        Vector3f::zeros(),
                                        Vector3f::new(0.0, 1.0, 0.0),
                                        0.8,
                                        width as Float / height as Float,
                                        width,
                                        height,
                                        0.0,
                                        std::f32::MAX))
    }

    #[test]
    fn test_render_fills_every_pixel_across_blocks() {
        let mut scene = Scene::new();
        scene.add_sensor(camera(45, 37));
        let renderer = SimpleRenderer::new(Box::new(CoordinateIntegrator), 0, 7).with_debug_pixel((40, 33));

        let image = renderer.render(&mut scene);
        assert_eq!(image.width(), 45);
        assert_eq!(image.height(), 37);
        for &(x, y) in &[(0, 0), (31, 5), (32, 32), (44, 36)] {
            let p = image[(x, y)];
            assert!((p.x - x as Float).abs() < 1e-4);
            assert!((p.y - y as Float).abs() < 1e-4);
            assert!((p.z - 1.0).abs() < 1e-6);
        }
        assert_eq!(renderer.stats().paths(), 45 * 37 * 4);

        let records = renderer.pixel_log().records();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.pixel == (40, 33) && r.kind == RecordKind::Print));

        // The sensor goes back into the scene.
        assert!(scene.camera(0).is_some());
    }

    #[test]
    fn test_missing_camera_renders_nothing() {
        let mut scene = Scene::new();
        let renderer = SimpleRenderer::new(Box::new(CoordinateIntegrator), 3, 0);
        let image = renderer.render(&mut scene);
        assert_eq!(image.width(), 0);
        assert_eq!(image.height(), 0);
    }
}
