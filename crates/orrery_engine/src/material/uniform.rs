//! Material uniforms
//!
//! A [`Uniform`] pairs a shader variable name with its declared kind, its
//! current CPU-side value and the locations found in the program. Struct
//! kinds (`Light`, `Shadow`) are located member by member because that is how
//! programs expose them.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3, Vec4};
use crate::gpu::{GpuValue, GraphicsContext, ProgramId, TextureId, UniformLocation};
use crate::light::LightData;
use crate::render::ShadowData;

/// Member names of the `Light` shader struct, in upload order
pub const LIGHT_MEMBERS: [&str; 5] = ["lightType", "color", "direction", "position", "attenuation"];

/// Member names of the `Shadow` shader struct, in upload order
pub const SHADOW_MEMBERS: [&str; 6] = ["lightDirection", "proj", "view", "depthTexture", "strength", "bias"];

/// Declared type of a uniform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `mat4`
    Mat4,
    /// `sampler2D` with its texture unit
    Sampler2D,
    /// `Light` struct
    Light,
    /// `Shadow` struct
    Shadow,
}

impl UniformKind {
    /// Members located separately; empty for plain kinds
    pub const fn members(self) -> &'static [&'static str] {
        match self {
            Self::Light => &LIGHT_MEMBERS,
            Self::Shadow => &SHADOW_MEMBERS,
            _ => &[],
        }
    }
}

/// Value of a uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `bool`
    Bool(bool),
    /// `int`
    Int(i32),
    /// `float`
    Float(f32),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `mat4`
    Mat4(Mat4),
    /// Texture sampled through `unit`
    Sampler2D {
        /// Texture bound before the draw
        texture: TextureId,
        /// Texture unit written to the sampler
        unit: u32,
    },
    /// Resolved light
    Light(LightData),
    /// Shadow caster data
    Shadow(ShadowData),
}

impl UniformValue {
    /// Kind this value fits
    pub const fn kind(&self) -> UniformKind {
        match self {
            Self::Bool(_) => UniformKind::Bool,
            Self::Int(_) => UniformKind::Int,
            Self::Float(_) => UniformKind::Float,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Vec4(_) => UniformKind::Vec4,
            Self::Mat4(_) => UniformKind::Mat4,
            Self::Sampler2D { .. } => UniformKind::Sampler2D,
            Self::Light(_) => UniformKind::Light,
            Self::Shadow(_) => UniformKind::Shadow,
        }
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        Self::Mat4(value)
    }
}

/// A named uniform of a material
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    name: String,
    kind: UniformKind,
    value: Option<UniformValue>,
    // One slot for plain kinds, one per member for structs
    locations: Vec<Option<UniformLocation>>,
}

impl Uniform {
    /// Uniform with an initial value
    pub fn new(name: impl Into<String>, value: UniformValue) -> Self {
        let mut uniform = Self::unset(name, value.kind());
        uniform.value = Some(value);
        uniform
    }

    /// Uniform whose value is filled in later, e.g. by the renderer
    pub fn unset(name: impl Into<String>, kind: UniformKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: None,
            locations: Vec::new(),
        }
    }

    /// Shader variable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind
    pub const fn kind(&self) -> UniformKind {
        self.kind
    }

    /// Current value, `None` until set
    pub const fn value(&self) -> Option<&UniformValue> {
        self.value.as_ref()
    }

    pub(crate) fn set_value(&mut self, value: UniformValue) {
        debug_assert_eq!(value.kind(), self.kind);
        self.value = Some(value);
    }

    /// Whether the program declares this uniform (any member, for structs)
    pub fn is_located(&self) -> bool {
        self.locations.iter().any(Option::is_some)
    }

    /// Look up locations in `program`; returns whether anything was found
    pub fn locate(&mut self, ctx: &dyn GraphicsContext, program: ProgramId) -> bool {
        let members = self.kind.members();
        self.locations = if members.is_empty() {
            vec![ctx.uniform_location(program, &self.name)]
        } else {
            members
                .iter()
                .map(|member| ctx.uniform_location(program, &format!("{}.{member}", self.name)))
                .collect()
        };
        self.is_located()
    }

    /// Push the current value to the program in use
    ///
    /// Unset and unlocated uniforms are skipped. Samplers also bind their
    /// texture to their unit.
    pub fn upload(&self, ctx: &mut dyn GraphicsContext) {
        let Some(value) = &self.value else {
            return;
        };
        match value {
            UniformValue::Bool(b) => self.write(ctx, 0, GpuValue::Bool(*b)),
            UniformValue::Int(i) => self.write(ctx, 0, GpuValue::Int(*i)),
            UniformValue::Float(f) => self.write(ctx, 0, GpuValue::Float(*f)),
            UniformValue::Vec3(v) => self.write(ctx, 0, vec3(v)),
            UniformValue::Vec4(v) => self.write(ctx, 0, GpuValue::Vec4([v.x, v.y, v.z, v.w])),
            UniformValue::Mat4(m) => self.write(ctx, 0, GpuValue::Mat4(m.to_cols_array())),
            UniformValue::Sampler2D { texture, unit } => self.write_sampler(ctx, 0, *texture, *unit),
            UniformValue::Light(light) => {
                self.write(ctx, 0, GpuValue::Int(light.kind.shader_id()));
                self.write(ctx, 1, vec3(&light.color));
                self.write(ctx, 2, vec3(&light.direction));
                self.write(ctx, 3, vec3(&light.position));
                self.write(ctx, 4, vec3(&light.attenuation));
            }
            UniformValue::Shadow(shadow) => {
                self.write(ctx, 0, vec3(&shadow.light_direction));
                self.write(ctx, 1, GpuValue::Mat4(shadow.projection.to_cols_array()));
                self.write(ctx, 2, GpuValue::Mat4(shadow.view.to_cols_array()));
                self.write_sampler(ctx, 3, shadow.depth_texture, shadow.texture_unit);
                self.write(ctx, 4, GpuValue::Float(shadow.strength));
                self.write(ctx, 5, GpuValue::Float(shadow.bias));
            }
        }
    }

    fn write(&self, ctx: &mut dyn GraphicsContext, slot: usize, value: GpuValue) {
        if let Some(Some(location)) = self.locations.get(slot) {
            ctx.set_uniform(*location, value);
        }
    }

    fn write_sampler(&self, ctx: &mut dyn GraphicsContext, slot: usize, texture: TextureId, unit: u32) {
        if let Some(Some(location)) = self.locations.get(slot) {
            ctx.bind_texture(unit, texture);
            ctx.set_uniform(*location, GpuValue::Int(i32::try_from(unit).unwrap_or(i32::MAX)));
        }
    }
}

fn vec3(v: &Vec3) -> GpuValue {
    GpuValue::Vec3([v.x, v.y, v.z])
}
