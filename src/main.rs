// Copyright 2020 TwoCookingMice

use millefeuille::core::pixel_log::RecordKind;
use millefeuille::core::scene_loader::load_scene;
use millefeuille::integrators::path::PathIntegrator;
use millefeuille::io;
use millefeuille::renderers::simple::{Renderer, SimpleRenderer};

use console::style;
use std::env;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <scene.xml> <output.(exr|png)> [--spp N] [--max-bounces N] [--seed N] [--camera N] [--debug-pixel X Y]",
              program);
    process::exit(1);
}

fn parse_arg<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i).and_then(|v| v.parse::<T>().ok()) {
        Some(v) => v,
        None => {
            eprintln!("{} {} expects a number", style("error:").red().bold(), flag);
            process::exit(1);
        }
    }
}

fn main() {
    env::set_var("RUST_LOG", env::var("RUST_LOG").unwrap_or_else(|_| String::from("info")));
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        usage(&args[0]);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let mut spp_override: Option<u32> = None;
    let mut max_bounces_override: Option<u32> = None;
    let mut seed_override: Option<u64> = None;
    let mut camera_id: usize = 0;
    let mut debug_pixel: Option<(usize, usize)> = None;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--spp" => {
                i += 1;
                spp_override = Some(parse_arg(&args, i, "--spp"));
            }
            "--max-bounces" => {
                i += 1;
                max_bounces_override = Some(parse_arg(&args, i, "--max-bounces"));
            }
            "--seed" => {
                i += 1;
                seed_override = Some(parse_arg(&args, i, "--seed"));
            }
            "--camera" => {
                i += 1;
                camera_id = parse_arg(&args, i, "--camera");
            }
            "--debug-pixel" => {
                let x = parse_arg(&args, i + 1, "--debug-pixel");
                let y = parse_arg(&args, i + 2, "--debug-pixel");
                debug_pixel = Some((x, y));
                i += 2;
            }
            other => {
                eprintln!("{} unknown argument {}", style("error:").red().bold(), other);
                usage(&args[0]);
            }
        }
        i += 1;
    }

    let load_result = match load_scene(input_path) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            process::exit(1);
        }
    };

    let mut scene = load_result.scene;
    let mut config = load_result.config;
    if let Some(spp) = spp_override {
        config.samples_per_pixel = spp;
    }
    if let Some(max_bounces) = max_bounces_override {
        config.max_bounces = max_bounces;
    }
    if let Some(seed) = seed_override {
        config.use_fixed_seed = true;
        config.seed = seed;
    }
    let seed = if config.use_fixed_seed {
        config.seed
    } else {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    };

    let integrator = match PathIntegrator::new(config) {
        Ok(integrator) => integrator,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            process::exit(1);
        }
    };

    let mut renderer = SimpleRenderer::new(Box::new(integrator), camera_id, seed);
    if let Some(pixel) = debug_pixel {
        renderer = renderer.with_debug_pixel(pixel);
    }
    let image = renderer.render(&mut scene);
    if image.width() == 0 || image.height() == 0 {
        eprintln!("{} camera {} produced no image", style("error:").red().bold(), camera_id);
        process::exit(1);
    }

    let stats = renderer.stats();
    stats.log_summary();
    println!("{} {} paths, {} scatter rays, {} shadow rays, average length {:.2}",
             style("stats:").cyan().bold(),
             stats.paths(),
             stats.scatter_rays(),
             stats.shadow_rays(),
             stats.average_path_length());

    let pixel_log = renderer.pixel_log();
    let mut failed_checks = 0usize;
    for record in pixel_log.records() {
        match record.kind {
            RecordKind::Print => log::info!("pixel ({}, {}) {}: {}", record.pixel.0, record.pixel.1, record.label, record.value),
            RecordKind::Assert => {
                failed_checks += 1;
                log::warn!("pixel ({}, {}) failed check {}: {}", record.pixel.0, record.pixel.1, record.label, record.value);
            }
        }
    }
    if pixel_log.dropped() > 0 {
        log::warn!("{} pixel log records dropped.", pixel_log.dropped());
    }
    if failed_checks > 0 {
        println!("{} {} failed checks", style("warning:").yellow().bold(), failed_checks);
    }

    if let Err(e) = io::write_bitmap(&image, output_path) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        process::exit(1);
    }
    println!("{} {}", style("written:").green().bold(), output_path);
}
