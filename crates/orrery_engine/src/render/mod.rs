//! Rendering
//!
//! [`Renderer`] draws a [`Scene`](crate::scene::Scene) in two passes: an
//! optional shadow pass into a [`Shadow`]'s depth target, then the color pass
//! into the window or a [`RenderTarget`]. Every step receives the graphics
//! context explicitly and re-binds what it needs.
//!
//! ## Frame sequence
//!
//! ```text
//! flatten scene ──► shadow pass (depth program, triangle meshes)
//!               └─► color pass (per mesh: program, VAO, uniforms, settings, draw)
//! ```

mod mesh;
mod renderer;
mod shadow;
mod stats;
mod target;

#[cfg(test)]
mod tests;

pub use mesh::Mesh;
pub use renderer::{RenderOptions, Renderer};
pub use shadow::{Shadow, ShadowData};
pub use stats::FrameStats;
pub use target::RenderTarget;

use thiserror::Error;

use crate::config::{ConfigError, NameKind};
use crate::gpu::GpuError;
use crate::material::{PropertyValue, UniformKind};
use crate::scene::{MaterialId, NodeId};

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Graphics context failure
    #[error(transparent)]
    Gpu(#[from] GpuError),

    /// Image could not be read or decoded
    #[error("failed to load texture {path}: {source}")]
    TextureLoad {
        /// Image path
        path: String,
        /// Decoder error
        #[source]
        source: image::ImageError,
    },

    /// Shader file could not be read
    #[error("failed to read shader {path}: {source}")]
    ShaderLoad {
        /// Shader path
        path: String,
        /// IO error
        #[source]
        source: std::io::Error,
    },

    /// Names the shader doesn't declare, under strict validation
    #[error("{owner}: {kind}(s) not declared by the shader: {}", .names.join(", "))]
    UnboundNames {
        /// Uniform or attribute
        kind: NameKind,
        /// Material or mesh being set up
        owner: String,
        /// Unmatched names
        names: Vec<String>,
    },

    /// Geometry cannot be drawn
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Node id not in the scene
    #[error("scene node {0:?} does not exist")]
    MissingNode(NodeId),

    /// Node exists but has another kind
    #[error("scene node {node:?} is not a {expected}")]
    WrongNodeKind {
        /// Node
        node: NodeId,
        /// Expected kind
        expected: &'static str,
    },

    /// Material id not in the scene
    #[error("material {0:?} does not exist")]
    MissingMaterial(MaterialId),

    /// Shadow parameters out of range
    #[error("invalid shadow settings: {0}")]
    InvalidShadowSettings(#[source] ConfigError),

    /// Property name is neither a uniform nor a setting
    #[error("material '{material}' has no property '{name}'")]
    UnknownProperty {
        /// Material name
        material: String,
        /// Property name
        name: String,
    },

    /// Uniform value of the wrong kind
    #[error("uniform '{name}' expects a {expected:?} value")]
    PropertyType {
        /// Uniform name
        name: String,
        /// Declared kind
        expected: UniformKind,
    },

    /// Setting value of the wrong shape
    #[error("setting '{name}' cannot take {value:?}")]
    SettingType {
        /// Setting name
        name: String,
        /// Rejected value
        value: PropertyValue,
    },

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),
}
