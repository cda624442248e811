//! Sun/moon material
//!
//! One directional sun light with ambient, diffuse and specular terms. With
//! shadows on, the fragment shader dims the sun by the fraction of its disc
//! the moon covers as seen from the fragment, which produces eclipses on the
//! body wearing the material.

use super::{Material, MaterialProperties, ShaderSource, UniformValue};
use super::lambert::{BUMP_TEXTURE_UNIT, TEXTURE_UNIT};
use crate::config::BindingValidation;
use crate::foundation::math::Vec3;
use crate::gpu::GraphicsContext;
use crate::render::RenderResult;
use crate::texture::Texture;

/// Positions and radii of the two bodies in the eclipse model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalBodies {
    /// World-space sun center
    pub sun_position: Vec3,
    /// Sun radius
    pub sun_radius: f32,
    /// World-space moon center
    pub moon_position: Vec3,
    /// Moon radius
    pub moon_radius: f32,
}

impl Default for OrbitalBodies {
    fn default() -> Self {
        Self {
            sun_position: Vec3::zeros(),
            sun_radius: 1.0,
            moon_position: Vec3::zeros(),
            moon_radius: 1.0,
        }
    }
}

/// Builder for the orbital material
#[derive(Debug, Clone, Default)]
pub struct OrbitalMaterial {
    /// Base color texture
    pub texture: Option<Texture>,
    /// Bump texture
    pub bump_texture: Option<Texture>,
    /// Replacement program; must declare the same uniforms
    pub shader: Option<ShaderSource>,
    /// Apply the eclipse model
    pub use_shadows: bool,
    /// Initial body layout
    pub bodies: OrbitalBodies,
    /// Values applied after the defaults
    pub properties: MaterialProperties,
}

impl OrbitalMaterial {
    /// Orbital material with the built-in program
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

    /// Use a custom program, e.g. from [`ShaderSource::load`]
    #[must_use]
    pub fn with_shader(mut self, shader: ShaderSource) -> Self {
        self.shader = Some(shader);
        self
    }

    /// Apply the eclipse model
    #[must_use]
    pub fn with_shadows(mut self, use_shadows: bool) -> Self {
        self.use_shadows = use_shadows;
        self
    }

    /// Initial body layout
    #[must_use]
    pub fn with_bodies(mut self, bodies: OrbitalBodies) -> Self {
        self.bodies = bodies;
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
        let source = self.shader.clone().unwrap_or_else(ShaderSource::orbital);
        let mut material = Material::new(ctx, "orbital", &source)?;

        material.add_uniform("u_color", UniformValue::Vec3(Vec3::new(1.0, 1.0, 1.0)));

        material.add_uniform("u_ambientColor", UniformValue::Vec3(Vec3::new(0.4, 0.4, 0.4)));
        material.add_uniform("u_lightColor", UniformValue::Vec3(Vec3::new(0.6, 0.6, 0.6)));
        material.add_uniform("u_lightDirection", UniformValue::Vec3(Vec3::new(-1.0, 0.0, 0.0)));
        material.add_uniform("u_viewPosition", UniformValue::Vec3(Vec3::zeros()));
        material.add_uniform("u_specularStrength", UniformValue::Float(1.0));
        material.add_uniform("u_shininess", UniformValue::Float(1.0));

        material.add_uniform("u_useShadows", UniformValue::Bool(self.use_shadows));
        material.add_uniform("u_sunPosition", UniformValue::Vec3(self.bodies.sun_position));
        material.add_uniform("u_sunRadius", UniformValue::Float(self.bodies.sun_radius));
        material.add_uniform("u_moonPosition", UniformValue::Vec3(self.bodies.moon_position));
        material.add_uniform("u_moonRadius", UniformValue::Float(self.bodies.moon_radius));

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

        material.finish(ctx, validation, &self.properties)
    }

    /// Move the bodies of an already built orbital material
    pub fn update_bodies(material: &mut Material, bodies: &OrbitalBodies) -> RenderResult<()> {
        material.set_uniform("u_sunPosition", UniformValue::Vec3(bodies.sun_position))?;
        material.set_uniform("u_sunRadius", UniformValue::Float(bodies.sun_radius))?;
        material.set_uniform("u_moonPosition", UniformValue::Vec3(bodies.moon_position))?;
        material.set_uniform("u_moonRadius", UniformValue::Float(bodies.moon_radius))
    }

    /// Point the sun light along `direction`
    pub fn set_light_direction(material: &mut Material, direction: Vec3) -> RenderResult<()> {
        material.set_uniform("u_lightDirection", UniformValue::Vec3(direction))
    }
}
