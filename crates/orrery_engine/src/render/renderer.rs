//! # Renderer
//!
//! Per-frame orchestration of the shadow pass and the color pass.
//!
//! ## Responsibilities
//!
//! - Global pipeline state set once at startup (depth test, multisampling)
//! - Owning at most one [`Shadow`] and its GPU resources
//! - Writing per-draw uniforms (matrices, light slots, view position, shadow)
//!   into each mesh's material before uploading it
//!
//! Nothing is assumed to stay bound between calls: every pass binds the
//! framebuffer, program and vertex array it uses.

use crate::config::{BindingValidation, RendererConfig, ShadowSettings};
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::gpu::{BlendFactor, Capability, ClearFlags, DrawStyle, GraphicsContext};
use crate::light::{fill_light_slots, LightData, LIGHT_SLOTS};
use crate::material::{UniformValue, MODEL, PROJECTION, VIEW};
use crate::scene::{NodeId, NodeKind, Scene};

use super::{FrameStats, RenderError, RenderResult, RenderTarget, Shadow};

const LIGHT_UNIFORMS: [&str; LIGHT_SLOTS] = ["u_light0", "u_light1", "u_light2", "u_light3"];
const VIEW_POSITION: &str = "u_viewPosition";
const SHADOW_UNIFORM: &str = "u_shadow0";

// Depth written by the shadow program is compared against this clear value
const SHADOW_CLEAR_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Options for a single [`Renderer::render_with`] call
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    /// Clear the color buffer before drawing
    pub clear_color: bool,
    /// Clear the depth buffer before drawing
    pub clear_depth: bool,
    /// Offscreen target; `None` renders to the default framebuffer
    pub target: Option<&'a RenderTarget>,
}

impl Default for RenderOptions<'_> {
    fn default() -> Self {
        Self {
            clear_color: true,
            clear_depth: true,
            target: None,
        }
    }
}

impl<'a> RenderOptions<'a> {
    /// Render into `target` instead of the default framebuffer
    pub fn with_target(mut self, target: &'a RenderTarget) -> Self {
        self.target = Some(target);
        self
    }

    fn clear_flags(&self) -> ClearFlags {
        let mut flags = ClearFlags::empty();
        if self.clear_color {
            flags |= ClearFlags::COLOR;
        }
        if self.clear_depth {
            flags |= ClearFlags::DEPTH;
        }
        flags
    }
}

/// Meshes and lights pulled out of one traversal
struct FrameContents {
    meshes: Vec<(NodeId, Mat4)>,
    lights: Vec<LightData>,
    invisible: usize,
}

impl FrameContents {
    fn collect(scene: &Scene) -> Self {
        let mut contents = Self {
            meshes: Vec::new(),
            lights: Vec::new(),
            invisible: 0,
        };
        for (id, world) in scene.flatten() {
            let Ok(node) = scene.node(id) else {
                continue;
            };
            match &node.kind {
                NodeKind::Mesh(mesh) if mesh.visible => contents.meshes.push((id, world)),
                NodeKind::Mesh(_) => contents.invisible += 1,
                NodeKind::Light(light) => contents.lights.push(light.resolve(&world)),
                NodeKind::Group | NodeKind::Camera(_) => {}
            }
        }
        contents
    }
}

/// Draws a [`Scene`] through a [`GraphicsContext`]
#[derive(Debug)]
pub struct Renderer {
    clear_color: [f32; 4],
    surface_size: (u32, u32),
    validation: BindingValidation,
    shadow: Option<Shadow>,
    last_frame: FrameStats,
    frame_index: u64,
}

impl Renderer {
    /// Set up global pipeline state
    ///
    /// # Errors
    /// Returns [`RenderError::Config`] when `config` fails validation.
    pub fn new(ctx: &mut dyn GraphicsContext, config: &RendererConfig) -> RenderResult<Self> {
        config.validate()?;

        let [r, g, b] = config.clear_color;
        let clear_color = [r, g, b, 1.0];
        ctx.enable(Capability::DepthTest);
        if config.multisample {
            ctx.enable(Capability::Multisample);
        }
        ctx.set_clear_color(clear_color);

        let surface_size = ctx.surface_size();
        log::info!(
            "Renderer initialized: surface {}x{}, multisample {}, binding validation {:?}",
            surface_size.0,
            surface_size.1,
            config.multisample,
            config.binding_validation
        );

        Ok(Self {
            clear_color,
            surface_size,
            validation: config.binding_validation,
            shadow: None,
            last_frame: FrameStats::default(),
            frame_index: 0,
        })
    }

    /// Cast shadows from `light`
    ///
    /// `strength` is clamped to [0, 1]. The shadow camera uses the default
    /// bounds of [`ShadowSettings`]. A previous shadow is released first.
    pub fn enable_shadows(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        scene: &Scene,
        light: NodeId,
        strength: f32,
        resolution: [u32; 2],
        bias: f32,
    ) -> RenderResult<()> {
        let clamped = strength.clamp(0.0, 1.0);
        if clamped != strength {
            log::warn!("Shadow strength {strength} clamped to {clamped}");
        }
        let settings = ShadowSettings {
            strength: clamped,
            resolution,
            bias,
            ..ShadowSettings::default()
        };
        self.enable_shadows_from(ctx, scene, light, &settings)
    }

    /// Cast shadows from `light` with explicit settings
    pub fn enable_shadows_from(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        scene: &Scene,
        light: NodeId,
        settings: &ShadowSettings,
    ) -> RenderResult<()> {
        scene.light(light)?;
        settings.validate().map_err(RenderError::InvalidShadowSettings)?;

        self.disable_shadows(ctx);
        let shadow = Shadow::new(ctx, light, settings, self.validation)?;
        log::info!(
            "Shadows enabled from {:?}: {}x{} map, strength {}, bias {}",
            light,
            settings.resolution[0],
            settings.resolution[1],
            settings.strength,
            settings.bias
        );
        self.shadow = Some(shadow);
        Ok(())
    }

    /// Turn shadows off and release their resources
    pub fn disable_shadows(&mut self, ctx: &mut dyn GraphicsContext) {
        if let Some(shadow) = self.shadow.take() {
            log::debug!("Releasing shadow map {:?}", shadow.render_target().framebuffer());
            shadow.release(ctx);
        }
    }

    /// Active shadow, if any
    pub const fn shadow(&self) -> Option<&Shadow> {
        self.shadow.as_ref()
    }

    /// Whether a shadow pass runs each frame
    pub const fn shadows_enabled(&self) -> bool {
        self.shadow.is_some()
    }

    /// Track a new default framebuffer size
    pub fn resize(&mut self, width: u32, height: u32) {
        log::debug!("Renderer resized to {width}x{height}");
        self.surface_size = (width, height);
    }

    /// Counters of the last completed frame
    pub const fn last_frame_stats(&self) -> &FrameStats {
        &self.last_frame
    }

    /// Frames rendered so far
    pub const fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Render `scene` as seen from the `camera` node with default options
    pub fn render(&mut self, ctx: &mut dyn GraphicsContext, scene: &mut Scene, camera: NodeId) -> RenderResult<()> {
        self.render_with(ctx, scene, camera, &RenderOptions::default())
    }

    /// Render `scene` as seen from the `camera` node
    pub fn render_with(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        scene: &mut Scene,
        camera: NodeId,
        options: &RenderOptions<'_>,
    ) -> RenderResult<()> {
        scene.camera(camera)?;
        let contents = FrameContents::collect(scene);
        let mut stats = FrameStats {
            meshes: contents.meshes.len() + contents.invisible,
            invisible_meshes: contents.invisible,
            lights: contents.lights.len(),
            ..FrameStats::default()
        };

        if let Some(shadow) = self.shadow.as_mut() {
            let drawn = shadow_pass(ctx, shadow, scene, &contents.meshes);
            ctx.set_clear_color(self.clear_color);
            stats.shadow_draw_calls = drawn?;
        }

        match options.target {
            Some(target) => {
                ctx.bind_framebuffer(Some(target.framebuffer()));
                ctx.set_viewport(0, 0, target.width(), target.height());
            }
            None => {
                ctx.bind_framebuffer(None);
                ctx.set_viewport(0, 0, self.surface_size.0, self.surface_size.1);
            }
        }
        let flags = options.clear_flags();
        if !flags.is_empty() {
            ctx.clear(flags);
        }
        ctx.enable(Capability::Blend);
        ctx.set_blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);

        let camera_world = scene.world_matrix(camera)?;
        let (view, projection) = {
            let camera = scene.camera_mut(camera)?;
            camera.update_view_matrix(&camera_world);
            (*camera.view_matrix(), *camera.projection_matrix())
        };
        let view_position = camera_world.translation_part();

        if contents.lights.len() > LIGHT_SLOTS {
            log::debug!(
                "{} lights in the scene, only the first {LIGHT_SLOTS} are used",
                contents.lights.len()
            );
        }
        let lights = fill_light_slots(contents.lights);
        let shadow_data = self.shadow.as_ref().map(Shadow::shadow_data);

        for (id, world) in &contents.meshes {
            let (mesh, material) = scene.mesh_and_material_mut(*id)?;

            ctx.use_program(material.program());
            ctx.bind_vertex_array(Some(mesh.vertex_array()));

            material.set_uniform(MODEL, UniformValue::Mat4(*world))?;
            material.set_uniform(VIEW, UniformValue::Mat4(view))?;
            material.set_uniform(PROJECTION, UniformValue::Mat4(projection))?;
            if material.has_uniform(LIGHT_UNIFORMS[0]) {
                for (name, light) in LIGHT_UNIFORMS.iter().zip(lights) {
                    material.set_uniform(name, UniformValue::Light(light))?;
                }
            }
            if material.has_uniform(VIEW_POSITION) {
                material.set_uniform(VIEW_POSITION, UniformValue::Vec3(view_position))?;
            }
            if let Some(data) = shadow_data {
                if material.has_uniform(SHADOW_UNIFORM) {
                    material.set_uniform(SHADOW_UNIFORM, UniformValue::Shadow(data))?;
                }
            }

            material.upload_uniforms(ctx);
            material.apply_render_settings(ctx);
            let style = material.settings.draw_style;
            ctx.draw_arrays(style, 0, mesh.vertex_count());
            stats.draw_calls += 1;
            log::trace!(
                "Drew {:?} with '{}': {:?} x{}",
                id,
                material.name(),
                style,
                mesh.vertex_count()
            );
        }
        ctx.bind_vertex_array(None);

        log::debug!(
            "Frame {}: {} color draws, {} shadow draws, {} lights, {} hidden",
            self.frame_index,
            stats.draw_calls,
            stats.shadow_draw_calls,
            stats.lights,
            stats.invisible_meshes
        );
        self.last_frame = stats;
        self.frame_index += 1;
        Ok(())
    }

    /// Release the shadow resources
    pub fn release(mut self, ctx: &mut dyn GraphicsContext) {
        self.disable_shadows(ctx);
    }
}

/// Draw every triangle mesh into the shadow map; returns the draw count
fn shadow_pass(
    ctx: &mut dyn GraphicsContext,
    shadow: &mut Shadow,
    scene: &Scene,
    meshes: &[(NodeId, Mat4)],
) -> RenderResult<usize> {
    let target = shadow.render_target();
    ctx.bind_framebuffer(Some(target.framebuffer()));
    ctx.set_viewport(0, 0, target.width(), target.height());
    ctx.set_clear_color(SHADOW_CLEAR_COLOR);
    ctx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
    ctx.use_program(shadow.depth_material().program());
    shadow.update_internal(scene)?;

    let mut draws = 0;
    for (id, world) in meshes {
        let mesh = scene.mesh(*id)?;
        if scene.material(mesh.material())?.settings.draw_style != DrawStyle::Triangles {
            continue;
        }
        ctx.bind_vertex_array(Some(mesh.vertex_array()));
        let depth = shadow.depth_material_mut();
        depth.set_uniform(MODEL, UniformValue::Mat4(*world))?;
        depth.upload_uniforms(ctx);
        ctx.draw_arrays(DrawStyle::Triangles, 0, mesh.vertex_count());
        draws += 1;
    }
    ctx.bind_vertex_array(None);

    log::debug!("Shadow pass: {draws} of {} meshes", meshes.len());
    Ok(draws)
}
