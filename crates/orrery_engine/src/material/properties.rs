//! Named material properties
//!
//! Properties are applied in one batch with
//! [`Material::set_properties`](super::Material::set_properties). They
//! deserialize from a TOML or RON table, so materials can be tuned from
//! config files. Names must exist on the target material; this table suits
//! any of the built-in Lambert or orbital materials:
//!
//! ```toml
//! u_color = [0.2, 0.4, 1.0]
//! line_width = 2.0
//! draw_style = "Triangles"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{RenderSettings, UniformKind, UniformValue};
use crate::foundation::math::{Vec3, Vec4};
use crate::gpu::DrawStyle;
use crate::render::{RenderError, RenderResult};

/// Value of a named property
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean uniform or flag setting
    Bool(bool),
    /// Integer; also accepted by float uniforms
    Int(i32),
    /// Float uniform or line width
    Float(f32),
    /// `vec3` uniform
    Vec3([f32; 3]),
    /// `vec4` uniform
    Vec4([f32; 4]),
    /// Primitive topology setting
    DrawStyle(DrawStyle),
}

impl PropertyValue {
    /// Convert to a uniform value of `kind`, if the shapes agree
    #[allow(clippy::cast_precision_loss)]
    pub fn to_uniform(self, kind: UniformKind) -> Option<UniformValue> {
        Some(match (kind, self) {
            (UniformKind::Bool, Self::Bool(b)) => UniformValue::Bool(b),
            (UniformKind::Int, Self::Int(i)) => UniformValue::Int(i),
            (UniformKind::Float, Self::Float(f)) => UniformValue::Float(f),
            (UniformKind::Float, Self::Int(i)) => UniformValue::Float(i as f32),
            (UniformKind::Vec3, Self::Vec3(v)) => UniformValue::Vec3(Vec3::from(v)),
            (UniformKind::Vec4, Self::Vec4(v)) => UniformValue::Vec4(Vec4::from(v)),
            _ => return None,
        })
    }
}

/// Batch of named properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialProperties(BTreeMap<String, PropertyValue>);

impl MaterialProperties {
    /// Empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Properties in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, PropertyValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl RenderSettings {
    /// Apply a setting by name; `Ok(false)` if no setting has that name
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn apply(&mut self, name: &str, value: PropertyValue) -> RenderResult<bool> {
        let mismatch = || RenderError::SettingType {
            name: name.to_string(),
            value,
        };
        match (name, value) {
            ("double_sided", PropertyValue::Bool(b)) => self.double_sided = b,
            ("wireframe", PropertyValue::Bool(b)) => self.wireframe = b,
            ("line_width", PropertyValue::Float(w)) => self.line_width = w,
            ("line_width", PropertyValue::Int(w)) => self.line_width = w as f32,
            ("draw_style", PropertyValue::DrawStyle(style)) => self.draw_style = style,
            ("double_sided" | "wireframe" | "line_width" | "draw_style", _) => return Err(mismatch()),
            _ => return Ok(false),
        }
        Ok(true)
    }
}
