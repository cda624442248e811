//! End-to-end render loop tests against the headless context

mod frame;
mod lights;

use std::rc::Rc;

use crate::config::{BindingValidation, RendererConfig};
use crate::foundation::math::{Transform, Vec3};
use crate::geometry::Geometry;
use crate::gpu::{DrawCall, FramebufferId, GpuCommand, HeadlessContext, ProgramId};
use crate::light::Light;
use crate::material::{LambertMaterial, OrbitalMaterial};
use crate::scene::{Camera, MaterialId, NodeId, Scene};

use super::Renderer;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

/// Context, scene, renderer and a camera at (0, 0, 5) looking at the origin
struct Fixture {
    ctx: HeadlessContext,
    scene: Scene,
    renderer: Renderer,
    camera: NodeId,
}

impl Fixture {
    fn new() -> Self {
        let mut ctx = HeadlessContext::new(WIDTH, HEIGHT);
        let config = RendererConfig::default()
            .with_clear_color([0.1, 0.2, 0.3])
            .with_binding_validation(BindingValidation::Strict);
        let renderer = Renderer::new(&mut ctx, &config).unwrap();

        let mut scene = Scene::new();
        let root = scene.root();
        let mut transform = Transform::from_position(Vec3::new(0.0, 0.0, 5.0));
        transform.look_at(Vec3::zeros());
        let camera = scene
            .add_camera(root, transform, Camera::perspective(60.0, WIDTH as f32 / HEIGHT as f32, 0.1, 100.0))
            .unwrap();

        Self { ctx, scene, renderer, camera }
    }

    fn lambert(&mut self) -> MaterialId {
        let material = LambertMaterial::new().build(&mut self.ctx, BindingValidation::Strict).unwrap();
        self.scene.add_material(material)
    }

    fn shadowed_lambert(&mut self) -> MaterialId {
        let material = LambertMaterial::new()
            .with_shadows(true)
            .build(&mut self.ctx, BindingValidation::Strict)
            .unwrap();
        self.scene.add_material(material)
    }

    fn orbital(&mut self) -> MaterialId {
        let material = OrbitalMaterial::new().build(&mut self.ctx, BindingValidation::Strict).unwrap();
        self.scene.add_material(material)
    }

    fn add_cube(&mut self, material: MaterialId, position: Vec3) -> NodeId {
        let root = self.scene.root();
        self.scene
            .add_mesh(
                &mut self.ctx,
                root,
                Transform::from_position(position),
                Rc::new(Geometry::cuboid(1.0, 1.0, 1.0)),
                material,
                BindingValidation::Strict,
            )
            .unwrap()
    }

    fn add_sun(&mut self) -> NodeId {
        let root = self.scene.root();
        let mut transform = Transform::from_position(Vec3::new(0.0, 10.0, 0.0));
        transform.set_direction(Vec3::new(0.0, -1.0, 0.0));
        self.scene
            .add_light(root, transform, Light::directional(Vec3::new(1.0, 0.9, 0.8)))
            .unwrap()
    }

    fn render(&mut self) {
        self.renderer.render(&mut self.ctx, &mut self.scene, self.camera).unwrap();
    }

    fn program(&self, material: MaterialId) -> ProgramId {
        self.scene.material(material).unwrap().program()
    }

    fn shadow_framebuffer(&self) -> Option<FramebufferId> {
        self.renderer.shadow().map(|shadow| shadow.render_target().framebuffer())
    }

    /// Draws issued into the given framebuffer
    fn draws_into(&self, framebuffer: Option<FramebufferId>) -> Vec<DrawCall> {
        self.ctx
            .draw_calls()
            .into_iter()
            .filter(|draw| draw.framebuffer == framebuffer)
            .cloned()
            .collect()
    }

    /// Every offscreen framebuffer touched by a bind, clear or draw
    fn offscreen_activity(&self) -> usize {
        self.ctx
            .commands()
            .iter()
            .filter(|command| match command {
                GpuCommand::BindFramebuffer(framebuffer) => framebuffer.is_some(),
                GpuCommand::Clear { framebuffer, .. } => framebuffer.is_some(),
                GpuCommand::Draw(draw) => draw.framebuffer.is_some(),
                _ => false,
            })
            .count()
    }
}
