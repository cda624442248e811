//! Graphics context abstraction
//!
//! Every step of the render loop that touches GPU state receives a
//! `&mut dyn GraphicsContext`. The trait mirrors an immediate-mode API: the
//! context holds one current program, vertex array, framebuffer and viewport,
//! and the last bind wins. Callers re-bind whatever they need instead of
//! relying on state left behind by an earlier pass.
//!
//! [`HeadlessContext`] is the in-memory implementation. It compiles shader
//! interfaces from GLSL source, validates handles and records every command,
//! which makes the render loop observable without a window.

pub mod glsl;
pub mod headless;

pub use glsl::{GlslType, ShaderInterface, ShaderStage};
pub use headless::{DrawCall, GpuCommand, HeadlessContext};

use bitflags::bitflags;
use thiserror::Error;

/// Result type for context operations
pub type GpuResult<T> = Result<T, GpuError>;

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Handle to a vertex array object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayId(pub u32);

/// Handle to a vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Handle to a 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Handle to an offscreen framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub u32);

/// Location of a uniform inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// Location of a vertex attribute inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeLocation(pub u32);

/// Primitive topology used by a draw call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum DrawStyle {
    /// Independent triangles
    #[default]
    Triangles,
    /// Independent line segments
    Lines,
    /// Connected line strip
    LineStrip,
    /// Closed line loop
    LineLoop,
    /// Points
    Points,
}

/// Rasterizer fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolygonMode {
    /// Filled polygons
    #[default]
    Fill,
    /// Polygon edges only
    Line,
}

/// Toggleable pipeline capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Depth testing
    DepthTest,
    /// Color blending
    Blend,
    /// Face culling
    CullFace,
    /// Multisample rasterization
    Multisample,
}

/// Blend factors; only the ones the renderer uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    /// 1
    One,
    /// 0
    Zero,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
}

bitflags! {
    /// Buffers cleared by [`GraphicsContext::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Color attachment
        const COLOR = 0b01;
        /// Depth attachment
        const DEPTH = 0b10;
    }
}

/// Raw value written to a uniform location
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpuValue {
    /// `bool`
    Bool(bool),
    /// `int`, also used for sampler units
    Int(i32),
    /// `float`
    Float(f32),
    /// `vec3`
    Vec3([f32; 3]),
    /// `vec4`
    Vec4([f32; 4]),
    /// `mat4`, column-major
    Mat4([f32; 16]),
}

/// Texel format of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA
    Rgba8,
    /// 32-bit float depth
    Depth32F,
}

impl TextureFormat {
    /// Bytes per texel
    pub const fn bytes_per_texel(self) -> usize {
        4
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum TextureFilter {
    /// Nearest texel
    Nearest,
    /// Bilinear
    #[default]
    Linear,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum TextureWrap {
    /// Tile
    #[default]
    Repeat,
    /// Clamp to the edge texel
    ClampToEdge,
}

/// Everything needed to allocate a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Texel format
    pub format: TextureFormat,
    /// Magnification filter
    pub mag_filter: TextureFilter,
    /// Minification filter
    pub min_filter: TextureFilter,
    /// Wrap mode for both axes
    pub wrap: TextureWrap,
}

impl TextureDescriptor {
    /// RGBA8 texture with default sampling
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Rgba8,
            mag_filter: TextureFilter::Linear,
            min_filter: TextureFilter::Linear,
            wrap: TextureWrap::Repeat,
        }
    }

    /// Expected byte length of the pixel data
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_texel()
    }
}

/// Errors reported by a graphics context
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
    /// A shader stage failed to compile
    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompilation {
        /// Stage that failed
        stage: ShaderStage,
        /// Compiler log
        log: String,
    },

    /// Linking the program failed
    #[error("program link failed: {0}")]
    ProgramLink(String),

    /// Framebuffer attachments are unusable
    #[error("framebuffer incomplete: {0}")]
    FramebufferIncomplete(String),

    /// A handle was used after release or never existed
    #[error("invalid {kind} handle {id}")]
    InvalidHandle {
        /// Resource kind
        kind: &'static str,
        /// Raw handle value
        id: u32,
    },

    /// Texture allocation or upload failed
    #[error("texture upload failed: {0}")]
    TextureUpload(String),
}

/// Immediate-mode graphics context
///
/// Mirrors the subset of a GL-style API the renderer needs. Creation calls
/// fail with [`GpuError`]; binding and drawing calls never fail and follow the
/// "last bind wins" rule.
pub trait GraphicsContext {
    /// Size of the default (window) framebuffer
    fn surface_size(&self) -> (u32, u32);

    /// Enable a capability
    fn enable(&mut self, capability: Capability);

    /// Disable a capability
    fn disable(&mut self, capability: Capability);

    /// Set the color used by [`clear`](Self::clear)
    fn set_clear_color(&mut self, color: [f32; 4]);

    /// Clear buffers of the bound framebuffer
    fn clear(&mut self, flags: ClearFlags);

    /// Set the viewport rectangle
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Set blend factors
    fn set_blend_func(&mut self, source: BlendFactor, destination: BlendFactor);

    /// Set polygon fill mode for both faces
    fn set_polygon_mode(&mut self, mode: PolygonMode);

    /// Set rasterized line width
    fn set_line_width(&mut self, width: f32);

    /// Compile and link a program
    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> GpuResult<ProgramId>;

    /// Release a program
    fn delete_program(&mut self, program: ProgramId);

    /// Make a program current
    fn use_program(&mut self, program: ProgramId);

    /// Look up a uniform by name; `None` if the program doesn't declare it
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Look up a vertex input by name; `None` if the program doesn't declare it
    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttributeLocation>;

    /// Write a uniform of the current program
    fn set_uniform(&mut self, location: UniformLocation, value: GpuValue);

    /// Allocate a vertex array
    fn create_vertex_array(&mut self) -> GpuResult<VertexArrayId>;

    /// Release a vertex array
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);

    /// Bind a vertex array, or unbind with `None`
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>);

    /// Upload vertex data into a new buffer
    fn create_buffer(&mut self, data: &[u8]) -> GpuResult<BufferId>;

    /// Release a buffer
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Point an attribute of the bound vertex array at a float buffer
    fn vertex_attribute(
        &mut self,
        location: AttributeLocation,
        buffer: BufferId,
        components: u32,
    ) -> GpuResult<()>;

    /// Allocate a texture, optionally with initial pixel data
    fn create_texture(&mut self, descriptor: &TextureDescriptor, pixels: Option<&[u8]>) -> GpuResult<TextureId>;

    /// Release a texture
    fn delete_texture(&mut self, texture: TextureId);

    /// Bind a texture to a texture unit
    fn bind_texture(&mut self, unit: u32, texture: TextureId);

    /// Build a framebuffer from attachments and check completeness
    fn create_framebuffer(&mut self, color: TextureId, depth: Option<TextureId>) -> GpuResult<FramebufferId>;

    /// Release a framebuffer (attachments are released separately)
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    /// Bind an offscreen framebuffer, or the default one with `None`
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    /// Draw `count` vertices from the bound vertex array
    fn draw_arrays(&mut self, style: DrawStyle, first: u32, count: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_flags_combine() {
        let flags = ClearFlags::COLOR | ClearFlags::DEPTH;
        assert!(flags.contains(ClearFlags::COLOR));
        assert!(flags.contains(ClearFlags::DEPTH));
        assert!(!ClearFlags::COLOR.contains(ClearFlags::DEPTH));
    }

    #[test]
    fn test_descriptor_byte_len() {
        assert_eq!(TextureDescriptor::rgba8(4, 2).byte_len(), 32);
    }
}
