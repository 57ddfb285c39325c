// Copyright @yucwang 2021

pub mod bsdf;
pub mod bvh;
pub mod computation_node;
pub mod config;
pub mod emitter;
pub mod hit;
pub mod integrator;
pub mod interior;
pub mod material;
pub mod mis;
pub mod path_state;
pub mod pixel_log;
pub mod ray_cast;
pub mod rng;
pub mod scene;
pub mod scene_loader;
pub mod sensor;
pub mod services;
pub mod shading;
pub mod shape;
pub mod stats;
