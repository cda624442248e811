//! Headless orrery demo
//!
//! Builds a sun, an orbiting earth and its moon, renders a few frames through
//! the recording context and logs what each frame did. Pass a `.toml` or
//! `.ron` renderer config path as the first argument to override defaults.

use std::rc::Rc;

use orrery_engine::config::ConfigError;
use orrery_engine::foundation::math::{constants::PI, Mat4Ext};
use orrery_engine::material::PropertyValue;
use orrery_engine::prelude::*;

const FRAMES: u32 = 8;
const SURFACE: (u32, u32) = (1280, 720);
const DEFAULT_CONFIG: &str = "orrery.toml";

const EARTH_ORBIT: f32 = 6.0;
const MOON_ORBIT: f32 = 1.5;
const SUN_RADIUS: f32 = 1.0;
const EARTH_RADIUS: f32 = 0.5;
const MOON_RADIUS: f32 = 0.15;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Node handles the frame loop animates
struct Orrery {
    earth_orbit: NodeId,
    moon_orbit: NodeId,
    sun: NodeId,
    earth: NodeId,
    moon: NodeId,
    earth_material: MaterialId,
    camera: NodeId,
}

struct OrreryApp {
    ctx: HeadlessContext,
    config: RendererConfig,
    renderer: Renderer,
    scene: Scene,
    orrery: Orrery,
}

impl OrreryApp {
    fn new(config: RendererConfig) -> Result<Self, AppError> {
        let mut ctx = HeadlessContext::new(SURFACE.0, SURFACE.1);
        let mut renderer = Renderer::new(&mut ctx, &config)?;
        let mut scene = Scene::new();
        let orrery = Self::build_scene(&mut ctx, &mut scene, &config)?;

        let sun_light = scene.add_light(orrery.sun, Self::sun_light_transform(), Light::directional(Vec3::new(1.0, 0.95, 0.85)))?;
        match &config.shadows {
            Some(settings) => renderer.enable_shadows_from(&mut ctx, &scene, sun_light, settings)?,
            None => renderer.enable_shadows(&mut ctx, &scene, sun_light, 0.6, [1024, 1024], 0.002)?,
        }

        Ok(Self { ctx, config, renderer, scene, orrery })
    }

    fn sun_light_transform() -> Transform {
        let mut transform = Transform::from_position(Vec3::new(0.0, 0.0, 0.0));
        transform.set_direction(Vec3::new(1.0, 0.0, 0.0));
        transform
    }

    fn build_scene(ctx: &mut HeadlessContext, scene: &mut Scene, config: &RendererConfig) -> Result<Orrery, AppError> {
        let validation = config.binding_validation;
        let root = scene.root();
        let sphere = Rc::new(Geometry::sphere(1.0, 48, 24));

        let sun_material = LambertMaterial::new()
            .with_properties(MaterialProperties::new().with("u_color", PropertyValue::Vec3([1.0, 0.85, 0.4])))
            .build(ctx, validation)?;
        let sun_material = scene.add_material(sun_material);

        let mut earth_builder = OrbitalMaterial::new().with_shadows(true).with_bodies(OrbitalBodies {
            sun_radius: SUN_RADIUS,
            moon_radius: MOON_RADIUS,
            ..OrbitalBodies::default()
        });
        if let Some(dir) = &config.shader_dir {
            earth_builder = earth_builder.with_shader(ShaderSource::load(dir, "orbital")?);
        }
        let earth_material = scene.add_material(earth_builder.build(ctx, validation)?);

        let moon_material = LambertMaterial::new()
            .with_shadows(true)
            .with_properties(MaterialProperties::new().with("u_color", PropertyValue::Vec3([0.7, 0.7, 0.7])))
            .build(ctx, validation)?;
        let moon_material = scene.add_material(moon_material);

        let sun = scene.add_mesh(ctx, root, scaled(Vec3::zeros(), SUN_RADIUS), Rc::clone(&sphere), sun_material, validation)?;
        let earth_orbit = scene.add_group(root, Transform::identity())?;
        let earth = scene.add_mesh(
            ctx,
            earth_orbit,
            scaled(Vec3::new(EARTH_ORBIT, 0.0, 0.0), EARTH_RADIUS),
            Rc::clone(&sphere),
            earth_material,
            validation,
        )?;
        let moon_orbit = scene.add_group(earth_orbit, Transform::from_position(Vec3::new(EARTH_ORBIT, 0.0, 0.0)))?;
        let moon = scene.add_mesh(
            ctx,
            moon_orbit,
            scaled(Vec3::new(MOON_ORBIT, 0.0, 0.0), MOON_RADIUS),
            sphere,
            moon_material,
            validation,
        )?;
        scene.add_light(root, Transform::identity(), Light::ambient(Vec3::new(0.05, 0.05, 0.08)))?;

        let mut eye = Transform::from_position(Vec3::new(0.0, 4.0, 14.0));
        eye.look_at(Vec3::zeros());
        let aspect = SURFACE.0 as f32 / SURFACE.1 as f32;
        let camera = scene.add_camera(root, eye, Camera::perspective(45.0, aspect, 0.1, 100.0))?;

        log::info!("Scene built with {} nodes", scene.len());
        Ok(Orrery { earth_orbit, moon_orbit, sun, earth, moon, earth_material, camera })
    }

    /// Advance the orbits and feed the new body layout to the earth's material
    fn animate(&mut self, frame: u32) -> Result<(), AppError> {
        let y = Vec3::y_axis();
        self.scene.transform_mut(self.orrery.earth_orbit)?.rotate_local(&y, 2.0 * PI / 64.0);
        self.scene.transform_mut(self.orrery.moon_orbit)?.rotate_local(&y, 2.0 * PI / 8.0);

        let sun = self.scene.world_position(self.orrery.sun)?;
        let earth = self.scene.world_position(self.orrery.earth)?;
        let moon = self.scene.world_position(self.orrery.moon)?;
        let bodies = OrbitalBodies {
            sun_position: sun,
            sun_radius: SUN_RADIUS,
            moon_position: moon,
            moon_radius: MOON_RADIUS,
        };
        let material = self.scene.material_mut(self.orrery.earth_material)?;
        OrbitalMaterial::update_bodies(material, &bodies)?;
        OrbitalMaterial::set_light_direction(material, (earth - sun).normalize())?;

        log::trace!("Frame {frame}: earth {earth:?}, moon {moon:?}");
        Ok(())
    }

    fn run(&mut self) -> Result<(), AppError> {
        for frame in 0..FRAMES {
            self.animate(frame)?;
            self.renderer.render(&mut self.ctx, &mut self.scene, self.orrery.camera)?;

            let stats = self.renderer.last_frame_stats();
            log::info!(
                "Frame {frame}: {} color draws, {} shadow draws, {} lights",
                stats.draw_calls,
                stats.shadow_draw_calls,
                stats.lights
            );
            let commands = self.ctx.take_commands();
            log::debug!("Frame {frame}: {} context calls recorded", commands.len());
        }

        let camera = self.scene.world_matrix(self.orrery.camera)?;
        log::info!(
            "Rendered {FRAMES} frames from {:?} (multisample {})",
            camera.translation_part(),
            self.config.multisample
        );
        Ok(())
    }

    fn shutdown(mut self) {
        self.renderer.release(&mut self.ctx);
        self.scene.release(&mut self.ctx);
        log::info!("Released all GPU resources ({} left)", self.ctx.live_resources());
    }
}

fn scaled(position: Vec3, scale: f32) -> Transform {
    let mut transform = Transform::from_position(position);
    transform.scale = Vec3::new(scale, scale, scale);
    transform
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("Starting orrery demo");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = RendererConfig::load_or_default(&config_path)?;

    let mut app = OrreryApp::new(config)?;
    let result = app.run();
    app.shutdown();

    match result {
        Ok(()) => {
            log::info!("Orrery demo finished");
            Ok(())
        }
        Err(e) => {
            log::error!("Orrery demo failed: {e}");
            Err(e.into())
        }
    }
}
