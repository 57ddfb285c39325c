// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::bsdf::BSDF;
use crate::core::config::{ConfigError, MisHeuristic, PathTracerConfig};
use crate::core::material::{SceneMaterial, OPAQUE_PRIORITY};
use crate::core::scene::{Scene, SceneObject};
use crate::core::shape::Shape;
use crate::emitters::constant::ConstantEnvironment;
use crate::materials::conductor::ConductorBSDF;
use crate::materials::dielectric::DielectricBSDF;
use crate::materials::lambertian_diffuse::LambertianDiffuseBSDF;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::{RGBSpectrum, Spectrum};
use crate::sensors::perspective::PerspectiveCamera;
use crate::shapes::rectangle::Rectangle;
use crate::shapes::sphere::Sphere;

#[derive(Debug)]
pub enum SceneLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
    InvalidConfig(ConfigError),
}

impl From<std::io::Error> for SceneLoadError {
    fn from(err: std::io::Error) -> Self {
        SceneLoadError::Io(err)
    }
}

impl From<ConfigError> for SceneLoadError {
    fn from(err: ConfigError) -> Self {
        SceneLoadError::InvalidConfig(err)
    }
}

impl std::fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneLoadError::Io(err) => write!(f, "cannot read scene: {}", err),
            SceneLoadError::Parse(msg) => write!(f, "malformed scene: {}", msg),
            SceneLoadError::MissingField(field) => write!(f, "missing scene field: {}", field),
            SceneLoadError::InvalidConfig(err) => write!(f, "invalid integrator settings: {}", err),
        }
    }
}

impl std::error::Error for SceneLoadError {}

pub struct SceneLoadResult {
    pub scene: Scene,
    pub config: PathTracerConfig,
}

pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<SceneLoadResult, SceneLoadError> {
    let path = path.as_ref();
    log::info!("Loading scene from: {}.", path.display());
    let xml = fs::read_to_string(path)?;
    parse_scene(&xml)
}

/// Named values collected from the property elements of one scene element.
#[derive(Default)]
struct Properties {
    values: HashMap<String, String>,
}

impl Properties {
    fn insert(&mut self, name: String, value: String) {
        self.values.insert(name, value);
    }

    fn raw(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|v| v.as_str())
    }

    fn float(&self, name: &str) -> Result<Option<Float>, SceneLoadError> {
        self.raw(name).map(parse_float).transpose()
    }

    fn uint(&self, name: &str) -> Result<Option<u32>, SceneLoadError> {
        self.raw(name).map(parse_u32).transpose()
    }

    fn boolean(&self, name: &str) -> Result<Option<bool>, SceneLoadError> {
        self.raw(name).map(parse_bool).transpose()
    }

    fn vec3(&self, name: &str) -> Result<Option<Vector3f>, SceneLoadError> {
        self.raw(name).map(parse_vec3).transpose()
    }

    fn spectrum(&self, name: &str) -> Result<Option<RGBSpectrum>, SceneLoadError> {
        self.raw(name).map(parse_spectrum).transpose()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Integrator,
    Sensor,
    Bsdf,
    Shape,
    ShapeEmitter,
    Emitter,
}

struct PendingElement {
    section: Section,
    kind: String,
    id: Option<String>,
    props: Properties,
}

struct LoaderState {
    defaults: HashMap<String, String>,
    scene: Scene,
    config: PathTracerConfig,
    // bsdf id -> material template
    materials: HashMap<String, SceneMaterial>,
    // bsdf id -> material id already registered with the scene
    registered: HashMap<String, u32>,
    stack: Vec<PendingElement>,
    shape_emission: Option<RGBSpectrum>,
    shape_bsdf_ref: Option<String>,
}

pub fn parse_scene(xml: &str) -> Result<SceneLoadResult, SceneLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut state = LoaderState {
        defaults: HashMap::new(),
        scene: Scene::new(),
        config: PathTracerConfig::default(),
        materials: HashMap::new(),
        registered: HashMap::new(),
        stack: Vec::new(),
        shape_emission: None,
        shape_bsdf_ref: None,
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => state.open(&e, false)?,
            Ok(Event::Empty(e)) => state.open(&e, true)?,
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                state.close(&name)?;
            }
            Err(e) => {
                return Err(SceneLoadError::Parse(e.to_string()));
            }
            _ => {}
        }

        buf.clear();
    }

    let LoaderState { mut scene, config, .. } = state;
    config.validate()?;
    scene.build_bvh();
    scene.log_summary();

    Ok(SceneLoadResult { scene, config })
}

impl LoaderState {
    fn attributes(&self, e: &BytesStart) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        for attr in e.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().unwrap_or_default();
            attrs.insert(key, resolve_value(&value, &self.defaults));
        }
        attrs
    }

    fn open(&mut self, e: &BytesStart, empty: bool) -> Result<(), SceneLoadError> {
        let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let mut attrs = self.attributes(e);
        let section = match tag.as_str() {
            "integrator" => Some(Section::Integrator),
            "sensor" => Some(Section::Sensor),
            "bsdf" => Some(Section::Bsdf),
            "shape" => Some(Section::Shape),
            "emitter" => {
                if self.stack.last().map(|p| p.section) == Some(Section::Shape) {
                    Some(Section::ShapeEmitter)
                } else {
                    Some(Section::Emitter)
                }
            }
            _ => None,
        };

        if let Some(section) = section {
            let kind = attrs.remove("type").unwrap_or_default();
            let id = attrs.remove("id");
            self.stack.push(PendingElement { section, kind, id, props: Properties::default() });
            if empty {
                self.close(&tag)?;
            }
            return Ok(());
        }

        match tag.as_str() {
            "default" => {
                if let (Some(name), Some(value)) = (attrs.remove("name"), attrs.remove("value")) {
                    self.defaults.insert(name, value);
                }
            }
            "float" | "integer" | "boolean" | "string" | "rgb" | "point" | "vector" => {
                if let (Some(name), Some(value)) = (attrs.remove("name"), attrs.remove("value")) {
                    if let Some(pending) = self.stack.last_mut() {
                        pending.props.insert(name, value);
                    }
                }
            }
            "lookat" => {
                if let Some(pending) = self.stack.last_mut() {
                    for key in &["origin", "target", "up"] {
                        if let Some(value) = attrs.remove(*key) {
                            pending.props.insert(format!("lookat.{}", key), value);
                        }
                    }
                }
            }
            "ref" => {
                if self.stack.last().map(|p| p.section) == Some(Section::Shape) {
                    self.shape_bsdf_ref = attrs.remove("id");
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, tag: &str) -> Result<(), SceneLoadError> {
        let is_section = matches!(tag, "integrator" | "sensor" | "bsdf" | "shape" | "emitter");
        if !is_section {
            return Ok(());
        }
        let pending = match self.stack.pop() {
            Some(pending) => pending,
            None => return Err(SceneLoadError::Parse(format!("unbalanced </{}>", tag))),
        };

        match pending.section {
            Section::Integrator => self.finish_integrator(&pending),
            Section::Sensor => self.finish_sensor(&pending),
            Section::Bsdf => self.finish_bsdf(pending),
            Section::Shape => self.finish_shape(pending),
            Section::ShapeEmitter => {
                if pending.kind != "area" {
                    return Err(SceneLoadError::Parse(format!("unsupported shape emitter: {}", pending.kind)));
                }
                self.shape_emission = Some(pending.props.spectrum("radiance")?.unwrap_or(RGBSpectrum::one()));
                Ok(())
            }
            Section::Emitter => self.finish_emitter(&pending),
        }
    }

    fn finish_integrator(&mut self, pending: &PendingElement) -> Result<(), SceneLoadError> {
        if pending.kind != "path" {
            return Err(SceneLoadError::Parse(format!("unsupported integrator: {}", pending.kind)));
        }
        let props = &pending.props;
        let config = &mut self.config;

        if let Some(v) = props.uint("max_depth")? {
            config.max_bounces = v;
        }
        if let Some(v) = props.uint("max_bounces")? {
            config.max_bounces = v;
        }
        if let Some(v) = props.uint("sample_count")? {
            config.samples_per_pixel = v;
        }
        if let Some(v) = props.uint("light_samples")? {
            config.light_samples_per_vertex = v;
        }
        if let Some(v) = props.boolean("russian_roulette")? {
            config.use_russian_roulette = v;
        }
        if let Some(v) = props.float("rr_absorption")? {
            config.probability_absorption = v;
        }
        if let Some(v) = props.boolean("nested_dielectrics")? {
            config.use_nested_dielectrics = v;
        }
        if let Some(v) = props.boolean("emissive_lights")? {
            config.use_emissive_lights = v;
        }
        if let Some(v) = props.boolean("emissive_sampler")? {
            config.use_emissive_sampler = v;
        }
        if let Some(v) = props.boolean("mis")? {
            config.use_mis = v;
        }
        if let Some(name) = props.raw("mis_heuristic") {
            config.mis_heuristic = MisHeuristic::from_name(name)
                .ok_or_else(|| SceneLoadError::Parse(format!("unknown MIS heuristic: {}", name)))?;
        }
        if let Some(v) = props.float("mis_exponent")? {
            config.mis_power_exponent = v;
        }
        if let Some(v) = props.boolean("env_light")? {
            config.use_env_light = v;
        }
        if let Some(v) = props.boolean("env_background")? {
            config.use_env_background = v;
        }
        if let Some(v) = props.boolean("light_samples_in_volumes")? {
            config.use_light_samples_in_volumes = v;
        }
        if let Some(v) = props.boolean("trace_from_last_vertex")? {
            config.trace_scatter_ray_from_last_path_vertex = v;
        }
        if let Some(v) = props.float("clamp_threshold")? {
            config.clamp_samples = true;
            config.clamp_threshold = v;
        }
        if let Some(v) = props.raw("seed") {
            config.use_fixed_seed = true;
            config.seed = v.parse::<u64>().map_err(|_| SceneLoadError::Parse(format!("invalid seed: {}", v)))?;
        }
        Ok(())
    }

    fn finish_sensor(&mut self, pending: &PendingElement) -> Result<(), SceneLoadError> {
        if pending.kind != "perspective" {
            return Err(SceneLoadError::Parse(format!("unsupported sensor: {}", pending.kind)));
        }
        let props = &pending.props;
        let fov_deg = require(props.float("fov")?, "sensor.fov")?;
        let origin = require(props.vec3("lookat.origin")?, "sensor.origin")?;
        let target = require(props.vec3("lookat.target")?, "sensor.target")?;
        let up = require(props.vec3("lookat.up")?, "sensor.up")?;
        let width = require(props.uint("width")?, "film.width")? as usize;
        let height = require(props.uint("height")?, "film.height")? as usize;
        if width == 0 || height == 0 {
            return Err(SceneLoadError::Parse(format!("empty film: {}x{}", width, height)));
        }

        let camera = PerspectiveCamera::new(origin,
                                            target,
                                            up,
                                            fov_deg.to_radians(),
                                            width as Float / height as Float,
                                            width,
                                            height,
                                            props.float("near_clip")?.unwrap_or(0.0),
                                            props.float("far_clip")?.unwrap_or(std::f32::MAX));
        self.scene.add_sensor(Box::new(camera));
        Ok(())
    }

    fn finish_bsdf(&mut self, pending: PendingElement) -> Result<(), SceneLoadError> {
        let id = require(pending.id.clone(), "bsdf.id")?;
        let props = &pending.props;
        let material = match pending.kind.as_str() {
            "diffuse" => {
                let reflectance = props.spectrum("reflectance")?.unwrap_or(RGBSpectrum::splat(0.5));
                let bsdf: Arc<dyn BSDF> = Arc::new(LambertianDiffuseBSDF::new(reflectance));
                SceneMaterial::opaque(&id, bsdf)
            }
            "conductor" => {
                let reflectance = props.spectrum("specular_reflectance")?.unwrap_or(RGBSpectrum::one());
                let bsdf: Arc<dyn BSDF> = Arc::new(ConductorBSDF::new(reflectance));
                SceneMaterial::opaque(&id, bsdf)
            }
            "dielectric" => {
                let bsdf: Arc<dyn BSDF> = Arc::new(DielectricBSDF::with_tint(
                    props.spectrum("specular_reflectance")?.unwrap_or(RGBSpectrum::one()),
                    props.spectrum("specular_transmittance")?.unwrap_or(RGBSpectrum::one()),
                ));
                let ior = props.float("int_ior")?.unwrap_or(1.5);
                if !(ior > 0.0) {
                    return Err(SceneLoadError::Parse(format!("invalid int_ior: {}", ior)));
                }
                let priority = props.uint("priority")?.unwrap_or(1);
                if priority == OPAQUE_PRIORITY {
                    return Err(SceneLoadError::Parse(format!("priority {} is reserved", priority)));
                }
                SceneMaterial::dielectric(&id, bsdf, ior, priority)
                    .with_absorption(props.spectrum("absorption")?.unwrap_or_default())
            }
            other => return Err(SceneLoadError::Parse(format!("unsupported bsdf: {}", other))),
        };
        self.materials.insert(id, material);
        Ok(())
    }

    fn finish_shape(&mut self, pending: PendingElement) -> Result<(), SceneLoadError> {
        let props = &pending.props;
        let shape: Arc<dyn Shape> = match pending.kind.as_str() {
            "sphere" => {
                let center = props.vec3("center")?.unwrap_or_else(Vector3f::zeros);
                let radius = props.float("radius")?.unwrap_or(1.0);
                let mut sphere = Sphere::new(center, radius);
                if let Some(id) = pending.id.clone() {
                    sphere = sphere.with_id(id);
                }
                Arc::new(sphere)
            }
            "rectangle" => {
                let center = props.vec3("center")?.unwrap_or_else(Vector3f::zeros);
                let edge_u = require(props.vec3("edge_u")?, "rectangle.edge_u")?;
                let edge_v = require(props.vec3("edge_v")?, "rectangle.edge_v")?;
                let mut rectangle = Rectangle::new(center, edge_u, edge_v);
                if let Some(id) = pending.id.clone() {
                    rectangle = rectangle.with_id(id);
                }
                Arc::new(rectangle)
            }
            other => return Err(SceneLoadError::Parse(format!("unsupported shape: {}", other))),
        };

        let bsdf_ref = require(self.shape_bsdf_ref.take(), "shape.bsdf_ref")?;
        let emission = self.shape_emission.take();
        let template = self.materials
            .get(&bsdf_ref)
            .ok_or_else(|| SceneLoadError::Parse(format!("missing bsdf ref: {}", bsdf_ref)))?;

        // Emission is per shape, so emissive shapes get their own material.
        let material_id = match emission {
            Some(radiance) if !radiance.is_black() => {
                let material = template.clone().with_emission(radiance);
                self.scene.add_material(material)
            }
            _ => match self.registered.get(&bsdf_ref) {
                Some(id) => *id,
                None => {
                    let id = self.scene.add_material(template.clone());
                    self.registered.insert(bsdf_ref, id);
                    id
                }
            },
        };

        let mut object = SceneObject::new(shape, material_id);
        if let Some(id) = pending.id {
            object = object.with_name(id);
        }
        self.scene.add_object(object);
        Ok(())
    }

    fn finish_emitter(&mut self, pending: &PendingElement) -> Result<(), SceneLoadError> {
        match pending.kind.as_str() {
            "constant" => {
                let radiance = pending.props.spectrum("radiance")?.unwrap_or(RGBSpectrum::one());
                let mut env = ConstantEnvironment::new(radiance);
                if let Some(id) = pending.id.clone() {
                    env = env.with_id(id);
                }
                self.scene.set_environment(Box::new(env));
                Ok(())
            }
            other => Err(SceneLoadError::Parse(format!("unsupported emitter: {}", other))),
        }
    }
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T, SceneLoadError> {
    value.ok_or(SceneLoadError::MissingField(field))
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn parse_float(value: &str) -> Result<Float, SceneLoadError> {
    value.trim().parse::<Float>().map_err(|_| SceneLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_u32(value: &str) -> Result<u32, SceneLoadError> {
    value.trim().parse::<u32>().map_err(|_| SceneLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_bool(value: &str) -> Result<bool, SceneLoadError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(SceneLoadError::Parse(format!("invalid boolean: {}", other))),
    }
}

fn parse_vec3(value: &str) -> Result<Vector3f, SceneLoadError> {
    let mut parts = value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty());
    let x = parts.next().ok_or_else(|| SceneLoadError::Parse("invalid vec3".to_string()))?;
    let y = parts.next().ok_or_else(|| SceneLoadError::Parse("invalid vec3".to_string()))?;
    let z = parts.next().ok_or_else(|| SceneLoadError::Parse("invalid vec3".to_string()))?;
    Ok(Vector3f::new(parse_float(x)?, parse_float(y)?, parse_float(z)?))
}

// A single value is a grey spectrum.
fn parse_spectrum(value: &str) -> Result<RGBSpectrum, SceneLoadError> {
    if value.contains(',') {
        let v = parse_vec3(value)?;
        Ok(RGBSpectrum::new(v.x, v.y, v.z))
    } else {
        Ok(RGBSpectrum::splat(parse_float(value)?))
    }
}
