//! Four-light diffuse material

use super::{Material, MaterialProperties, ShaderSource, UniformKind, UniformValue};
use crate::config::BindingValidation;
use crate::foundation::math::Vec3;
use crate::gpu::GraphicsContext;
use crate::light::LIGHT_SLOTS;
use crate::render::RenderResult;
use crate::texture::Texture;

/// Texture unit of the base color texture
pub const TEXTURE_UNIT: u32 = 1;
/// Texture unit of the bump texture
pub const BUMP_TEXTURE_UNIT: u32 = 2;
/// Texture unit of the shadow depth texture
pub const SHADOW_TEXTURE_UNIT: u32 = 3;

/// Builder for the Lambert material
///
/// Diffuse lighting from the four `u_light` slots, an optional color
/// texture, an optional bump texture perturbing the normal, and one shadow
/// caster. Shadows are opt-in: `u_useShadow` is false unless
/// [`with_shadows`](Self::with_shadows) is set, and `u_shadow0` only exists
/// in the uniform table when it is.
#[derive(Debug, Clone, Default)]
pub struct LambertMaterial {
    /// Base color texture
    pub texture: Option<Texture>,
    /// Bump texture
    pub bump_texture: Option<Texture>,
    /// Receive shadows from the renderer's shadow caster
    pub use_shadows: bool,
    /// Values applied after the defaults
    pub properties: MaterialProperties,
}

impl LambertMaterial {
    /// Untextured, unshadowed Lambert material
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample a base color texture
    #[must_use]
    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Perturb normals with a bump texture
    #[must_use]
    pub fn with_bump_texture(mut self, texture: Texture) -> Self {
        self.bump_texture = Some(texture);
        self
    }

    /// Receive shadows
    #[must_use]
    pub fn with_shadows(mut self, use_shadows: bool) -> Self {
        self.use_shadows = use_shadows;
        self
    }

    /// Override defaults by name
    #[must_use]
    pub fn with_properties(mut self, properties: MaterialProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Compile the program and fill the uniform table
    pub fn build(&self, ctx: &mut dyn GraphicsContext, validation: BindingValidation) -> RenderResult<Material> {
        let mut material = Material::new(ctx, "lambert", &ShaderSource::lambert())?;

        material.add_uniform("u_color", UniformValue::Vec3(Vec3::new(1.0, 1.0, 1.0)));
        for slot in 0..LIGHT_SLOTS {
            material.add_unset_uniform(&format!("u_light{slot}"), UniformKind::Light);
        }

        material.add_uniform("u_useTexture", UniformValue::Bool(self.texture.is_some()));
        if let Some(texture) = &self.texture {
            material.add_uniform(
                "u_texture",
                UniformValue::Sampler2D { texture: texture.id(), unit: TEXTURE_UNIT },
            );
        }

        material.add_uniform("u_useBumpTexture", UniformValue::Bool(self.bump_texture.is_some()));
        if let Some(bump) = &self.bump_texture {
            material.add_uniform(
                "u_bumpTexture",
                UniformValue::Sampler2D { texture: bump.id(), unit: BUMP_TEXTURE_UNIT },
            );
            material.add_uniform("u_bumpStrength", UniformValue::Float(1.0));
        }

        material.add_uniform("u_useShadow", UniformValue::Bool(self.use_shadows));
        if self.use_shadows {
            material.add_unset_uniform("u_shadow0", UniformKind::Shadow);
        }

        material.finish(ctx, validation, &self.properties)
    }
}
