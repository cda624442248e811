//! Material system
//!
//! A [`Material`] owns a linked program, an insertion-ordered uniform table
//! and the render state applied before each draw. The renderer writes the
//! per-draw uniforms (`u_model`, `u_view`, `u_proj`, lights, shadow) into the
//! table and uploads the whole table once per draw.
//!
//! # Variants
//!
//! - [`LambertMaterial`]: four-light diffuse, optional texture, bump map and
//!   one shadow caster
//! - [`OrbitalMaterial`]: single sun with a sun/moon eclipse model
//! - [`DepthMaterial`]: the shadow pass program

mod depth;
mod lambert;
mod orbital;
mod properties;
mod shader_source;
mod uniform;

pub use depth::DepthMaterial;
pub use lambert::{LambertMaterial, BUMP_TEXTURE_UNIT, SHADOW_TEXTURE_UNIT, TEXTURE_UNIT};
pub use orbital::{OrbitalMaterial, OrbitalBodies};
pub use properties::{MaterialProperties, PropertyValue};
pub use shader_source::ShaderSource;
pub use uniform::{Uniform, UniformKind, UniformValue, LIGHT_MEMBERS, SHADOW_MEMBERS};

use serde::{Deserialize, Serialize};

use crate::config::{BindingValidation, NameKind};
use crate::foundation::math::Mat4;
use crate::gpu::{Capability, DrawStyle, GraphicsContext, PolygonMode, ProgramId};
use crate::render::{RenderError, RenderResult};

/// Model matrix uniform, set per draw
pub const MODEL: &str = "u_model";
/// View matrix uniform, set per draw
pub const VIEW: &str = "u_view";
/// Projection matrix uniform, set per draw
pub const PROJECTION: &str = "u_proj";

/// Render state applied before a material's draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Render both faces (disables culling)
    pub double_sided: bool,
    /// Rasterize polygon edges only
    pub wireframe: bool,
    /// Line width for wireframe and line styles
    pub line_width: f32,
    /// Primitive topology
    pub draw_style: DrawStyle,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            double_sided: true,
            wireframe: false,
            line_width: 1.0,
            draw_style: DrawStyle::Triangles,
        }
    }
}

/// Shader program with its uniform table and render settings
#[derive(Debug)]
pub struct Material {
    name: String,
    program: ProgramId,
    uniforms: Vec<Uniform>,
    /// Render state applied by [`apply_render_settings`](Self::apply_render_settings)
    pub settings: RenderSettings,
}

impl Material {
    /// Compile `source` and start a uniform table with the three matrices
    ///
    /// # Errors
    /// Compile and link failures are returned before any handle escapes.
    pub fn new(ctx: &mut dyn GraphicsContext, name: impl Into<String>, source: &ShaderSource) -> RenderResult<Self> {
        let name = name.into();
        let program = ctx.create_program(&source.vertex, &source.fragment)?;
        log::info!("Created material '{}' ({:?})", name, program);

        let mut material = Self {
            name,
            program,
            uniforms: Vec::new(),
            settings: RenderSettings::default(),
        };
        for matrix in [MODEL, VIEW, PROJECTION] {
            material.add_uniform(matrix, UniformValue::Mat4(Mat4::identity()));
        }
        Ok(material)
    }

    /// Material name used in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Program handle
    pub const fn program(&self) -> ProgramId {
        self.program
    }

    /// Add a uniform, replacing any existing one with the same name
    ///
    /// A replaced uniform keeps its table position. Call
    /// [`locate_uniforms`](Self::locate_uniforms) after adding.
    pub fn add_uniform(&mut self, name: &str, value: UniformValue) {
        self.insert(Uniform::new(name, value));
    }

    /// Add a uniform whose value is supplied later
    pub fn add_unset_uniform(&mut self, name: &str, kind: UniformKind) {
        self.insert(Uniform::unset(name, kind));
    }

    fn insert(&mut self, uniform: Uniform) {
        if let Some(existing) = self.uniforms.iter_mut().find(|u| u.name() == uniform.name()) {
            *existing = uniform;
        } else {
            self.uniforms.push(uniform);
        }
    }

    /// Whether the table has an entry for `name`
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniform(name).is_some()
    }

    /// Table entry for `name`
    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.iter().find(|u| u.name() == name)
    }

    /// Table entries in insertion order
    pub fn uniforms(&self) -> &[Uniform] {
        &self.uniforms
    }

    /// Set the value of an existing uniform
    ///
    /// # Errors
    /// Fails for names not in the table and for values of another kind.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> RenderResult<()> {
        let material = &self.name;
        let uniform = self
            .uniforms
            .iter_mut()
            .find(|u| u.name() == name)
            .ok_or_else(|| RenderError::UnknownProperty {
                material: material.clone(),
                name: name.to_string(),
            })?;
        if uniform.kind() != value.kind() {
            return Err(RenderError::PropertyType {
                name: name.to_string(),
                expected: uniform.kind(),
            });
        }
        uniform.set_value(value);
        Ok(())
    }

    /// Bind every uniform to its location in the program
    ///
    /// Names the program doesn't declare stay unlocated and are skipped on
    /// upload; `validation` decides whether that is logged or fatal.
    pub fn locate_uniforms(&mut self, ctx: &dyn GraphicsContext, validation: BindingValidation) -> RenderResult<()> {
        let program = self.program;
        let unmatched: Vec<String> = self
            .uniforms
            .iter_mut()
            .filter_map(|uniform| (!uniform.locate(ctx, program)).then(|| uniform.name().to_string()))
            .collect();
        validation.check(NameKind::Uniform, &self.name, unmatched)
    }

    /// Locate uniforms and apply `properties`, releasing the program on failure
    pub(crate) fn finish(
        mut self,
        ctx: &mut dyn GraphicsContext,
        validation: BindingValidation,
        properties: &MaterialProperties,
    ) -> RenderResult<Self> {
        let result = self
            .locate_uniforms(ctx, validation)
            .and_then(|()| self.set_properties(properties));
        match result {
            Ok(()) => Ok(self),
            Err(err) => {
                self.release(ctx);
                Err(err)
            }
        }
    }

    /// Upload every located uniform to the program in use
    pub fn upload_uniforms(&self, ctx: &mut dyn GraphicsContext) {
        for uniform in &self.uniforms {
            uniform.upload(ctx);
        }
    }

    /// Apply culling, fill mode and line width
    pub fn apply_render_settings(&self, ctx: &mut dyn GraphicsContext) {
        if self.settings.double_sided {
            ctx.disable(Capability::CullFace);
        } else {
            ctx.enable(Capability::CullFace);
        }
        ctx.set_polygon_mode(if self.settings.wireframe {
            PolygonMode::Line
        } else {
            PolygonMode::Fill
        });
        ctx.set_line_width(self.settings.line_width);
    }

    /// Apply a batch of uniform values and settings by name
    ///
    /// # Errors
    /// Fails on the first name that is neither a uniform nor a setting, or
    /// whose value doesn't fit.
    pub fn set_properties(&mut self, properties: &MaterialProperties) -> RenderResult<()> {
        for (name, value) in properties.iter() {
            if let Some(kind) = self.uniform(name).map(Uniform::kind) {
                let converted = value.to_uniform(kind).ok_or_else(|| RenderError::PropertyType {
                    name: name.to_string(),
                    expected: kind,
                })?;
                self.set_uniform(name, converted)?;
            } else if !self.settings.apply(name, value)? {
                return Err(RenderError::UnknownProperty {
                    material: self.name.clone(),
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Release the program
    pub fn release(self, ctx: &mut dyn GraphicsContext) {
        log::debug!("Releasing material '{}'", self.name);
        ctx.delete_program(self.program);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::gpu::{GpuCommand, HeadlessContext};

    fn lambert(ctx: &mut HeadlessContext) -> Material {
        Material::new(ctx, "plain", &ShaderSource::lambert()).unwrap()
    }

    #[test]
    fn test_new_material_has_matrix_uniforms() {
        let mut ctx = HeadlessContext::new(16, 16);
        let material = lambert(&mut ctx);
        let names: Vec<_> = material.uniforms().iter().map(Uniform::name).collect();
        assert_eq!(names, [MODEL, VIEW, PROJECTION]);
    }

    #[test]
    fn test_add_uniform_replaces_in_place() {
        let mut ctx = HeadlessContext::new(16, 16);
        let mut material = lambert(&mut ctx);
        material.add_uniform("u_color", UniformValue::Vec3(Vec3::new(1.0, 1.0, 1.0)));
        material.add_uniform("u_useShadow", UniformValue::Bool(false));
        material.add_uniform("u_color", UniformValue::Vec3(Vec3::new(0.5, 0.0, 0.0)));

        assert_eq!(material.uniforms().len(), 5);
        assert_eq!(material.uniforms()[3].name(), "u_color");
        assert_eq!(
            material.uniform("u_color").and_then(Uniform::value),
            Some(&UniformValue::Vec3(Vec3::new(0.5, 0.0, 0.0)))
        );
    }

    #[test]
    fn test_set_uniform_checks_kind_and_name() {
        let mut ctx = HeadlessContext::new(16, 16);
        let mut material = lambert(&mut ctx);

        let wrong_kind = material.set_uniform(MODEL, UniformValue::Float(1.0));
        assert!(matches!(wrong_kind, Err(RenderError::PropertyType { .. })));

        let unknown = material.set_uniform("u_nothing", UniformValue::Float(1.0));
        assert!(matches!(unknown, Err(RenderError::UnknownProperty { .. })));
    }

    #[test]
    fn test_strict_locate_reports_unmatched_names() {
        let mut ctx = HeadlessContext::new(16, 16);
        let mut material = lambert(&mut ctx);
        material.add_uniform("u_colour", UniformValue::Vec3(Vec3::zeros()));

        assert!(material.locate_uniforms(&ctx, BindingValidation::Warn).is_ok());
        let err = material.locate_uniforms(&ctx, BindingValidation::Strict).unwrap_err();
        match err {
            RenderError::UnboundNames { names, .. } => assert_eq!(names, vec!["u_colour".to_string()]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_render_settings_applied() {
        let mut ctx = HeadlessContext::new(16, 16);
        let mut material = lambert(&mut ctx);
        material.settings.double_sided = false;
        material.settings.wireframe = true;
        material.settings.line_width = 3.0;

        material.apply_render_settings(&mut ctx);
        assert!(ctx.is_enabled(Capability::CullFace));
        assert_eq!(ctx.polygon_mode(), PolygonMode::Line);
        assert!((ctx.line_width() - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_upload_only_touches_located_uniforms() {
        let mut ctx = HeadlessContext::new(16, 16);
        let mut material = lambert(&mut ctx);
        material.add_uniform("u_unused", UniformValue::Float(2.0));
        material.locate_uniforms(&ctx, BindingValidation::Permissive).unwrap();

        ctx.use_program(material.program());
        material.upload_uniforms(&mut ctx);

        let written: Vec<_> = ctx
            .commands()
            .iter()
            .filter_map(|c| match c {
                GpuCommand::SetUniform { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(written, [MODEL, VIEW, PROJECTION]);
    }

    #[test]
    fn test_set_properties_mixes_uniforms_and_settings() {
        let mut ctx = HeadlessContext::new(16, 16);
        let mut material = lambert(&mut ctx);
        material.add_uniform("u_color", UniformValue::Vec3(Vec3::new(1.0, 1.0, 1.0)));

        let properties = MaterialProperties::new()
            .with("u_color", PropertyValue::Vec3([0.2, 0.4, 0.6]))
            .with("wireframe", PropertyValue::Bool(true))
            .with("draw_style", PropertyValue::DrawStyle(DrawStyle::Lines));
        material.set_properties(&properties).unwrap();

        assert!(material.settings.wireframe);
        assert_eq!(material.settings.draw_style, DrawStyle::Lines);
        assert_eq!(
            material.uniform("u_color").and_then(Uniform::value),
            Some(&UniformValue::Vec3(Vec3::new(0.2, 0.4, 0.6)))
        );

        let unknown = MaterialProperties::new().with("glow", PropertyValue::Float(1.0));
        assert!(matches!(
            material.set_properties(&unknown),
            Err(RenderError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn test_release_deletes_program() {
        let mut ctx = HeadlessContext::new(16, 16);
        let material = lambert(&mut ctx);
        let program = material.program();
        material.release(&mut ctx);
        assert!(!ctx.has_program(program));
    }
}
