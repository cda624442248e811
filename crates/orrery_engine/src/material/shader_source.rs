//! GLSL source pairs
//!
//! The built-in programs are compiled into the library from
//! `resources/shaders`. Custom programs are read at runtime from a shader
//! directory as `<name>.vert` and `<name>.frag`.

use std::path::Path;

use crate::render::{RenderError, RenderResult};

/// Vertex and fragment source of one program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    /// Vertex stage source
    pub vertex: String,
    /// Fragment stage source
    pub fragment: String,
}

impl ShaderSource {
    /// Source pair from strings
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Four-light diffuse program
    pub fn lambert() -> Self {
        Self::new(
            include_str!("../../../../resources/shaders/lambert.vert"),
            include_str!("../../../../resources/shaders/lambert.frag"),
        )
    }

    /// Sun/moon program
    pub fn orbital() -> Self {
        Self::new(
            include_str!("../../../../resources/shaders/orbital.vert"),
            include_str!("../../../../resources/shaders/orbital.frag"),
        )
    }

    /// Depth-only program of the shadow pass
    pub fn depth() -> Self {
        Self::new(
            include_str!("../../../../resources/shaders/depth.vert"),
            include_str!("../../../../resources/shaders/depth.frag"),
        )
    }

    /// Read `<dir>/<name>.vert` and `<dir>/<name>.frag`
    pub fn load(dir: impl AsRef<Path>, name: &str) -> RenderResult<Self> {
        let dir = dir.as_ref();
        let read = |extension: &str| {
            let path = dir.join(format!("{name}.{extension}"));
            std::fs::read_to_string(&path).map_err(|source| RenderError::ShaderLoad {
                path: path.display().to_string(),
                source,
            })
        };
        let source = Self {
            vertex: read("vert")?,
            fragment: read("frag")?,
        };
        log::debug!("Loaded shader '{}' from {}", name, dir.display());
        Ok(source)
    }
}
