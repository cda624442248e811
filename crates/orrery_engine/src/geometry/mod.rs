//! Vertex geometry
//!
//! A [`Geometry`] is a set of named vertex attributes. Names are matched
//! against the `in` variables of a material's vertex shader when a mesh is
//! built, so they follow the shader contract: `a_position`, `a_texCoords`,
//! `a_vNormal`.

mod shapes;

use crate::foundation::math::{Mat3, Mat4, Point3, Vec3};

/// Vertex position attribute name
pub const POSITION: &str = "a_position";
/// Texture coordinate attribute name
pub const TEX_COORDS: &str = "a_texCoords";
/// Vertex normal attribute name
pub const NORMAL: &str = "a_vNormal";

/// Per-vertex data of one attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    /// One float per vertex
    Float(Vec<f32>),
    /// Two floats per vertex
    Vec2(Vec<[f32; 2]>),
    /// Three floats per vertex
    Vec3(Vec<[f32; 3]>),
    /// Four floats per vertex
    Vec4(Vec<[f32; 4]>),
}

impl AttributeData {
    /// Number of vertices
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Vec2(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) => v.len(),
        }
    }

    /// Whether there are no vertices
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Floats per vertex
    pub const fn components(&self) -> u32 {
        match self {
            Self::Float(_) => 1,
            Self::Vec2(_) => 2,
            Self::Vec3(_) => 3,
            Self::Vec4(_) => 4,
        }
    }

    /// Raw bytes for buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Float(v) => bytemuck::cast_slice(v),
            Self::Vec2(v) => bytemuck::cast_slice(v),
            Self::Vec3(v) => bytemuck::cast_slice(v),
            Self::Vec4(v) => bytemuck::cast_slice(v),
        }
    }
}

/// Named vertex attributes sharing one vertex count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    attributes: Vec<(String, AttributeData)>,
}

impl Geometry {
    /// Empty geometry
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`add_attribute`](Self::add_attribute)
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, data: AttributeData) -> Self {
        self.add_attribute(name, data);
        self
    }

    /// Add or replace an attribute
    pub fn add_attribute(&mut self, name: impl Into<String>, data: AttributeData) {
        let name = name.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = data;
        } else {
            self.attributes.push((name, data));
        }
    }

    /// Look up an attribute
    pub fn attribute(&self, name: &str) -> Option<&AttributeData> {
        self.attributes
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, data)| data)
    }

    /// Attributes in insertion order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeData)> {
        self.attributes.iter().map(|(name, data)| (name.as_str(), data))
    }

    /// Vertex count, taken from the first attribute
    pub fn vertex_count(&self) -> usize {
        self.attributes.first().map_or(0, |(_, data)| data.len())
    }

    /// Names of attributes whose length differs from the vertex count
    pub fn mismatched_attributes(&self) -> Vec<&str> {
        let count = self.vertex_count();
        self.attributes
            .iter()
            .filter(|(_, data)| data.len() != count)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Transform positions by `matrix` and normals by its normal matrix
    pub fn apply_matrix(&mut self, matrix: &Mat4) {
        let linear: Mat3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear.try_inverse().map_or(linear, |inv| inv.transpose());

        for (name, data) in &mut self.attributes {
            match (name.as_str(), data) {
                (POSITION, AttributeData::Vec3(positions)) => {
                    for p in positions.iter_mut() {
                        let moved = matrix.transform_point(&Point3::new(p[0], p[1], p[2]));
                        *p = [moved.x, moved.y, moved.z];
                    }
                }
                (NORMAL, AttributeData::Vec3(normals)) => {
                    for n in normals.iter_mut() {
                        let turned = (normal_matrix * Vec3::new(n[0], n[1], n[2])).normalize();
                        *n = [turned.x, turned.y, turned.z];
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Transform};
    use approx::assert_relative_eq;

    #[test]
    fn test_vertex_count_and_mismatch() {
        let geometry = Geometry::new()
            .with_attribute(POSITION, AttributeData::Vec3(vec![[0.0; 3]; 3]))
            .with_attribute(TEX_COORDS, AttributeData::Vec2(vec![[0.0; 2]; 2]));

        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.mismatched_attributes(), vec![TEX_COORDS]);
    }

    #[test]
    fn test_add_attribute_replaces_by_name() {
        let mut geometry = Geometry::new();
        geometry.add_attribute(POSITION, AttributeData::Vec3(vec![[0.0; 3]; 3]));
        geometry.add_attribute(POSITION, AttributeData::Vec3(vec![[0.0; 3]; 6]));

        assert_eq!(geometry.attributes().count(), 1);
        assert_eq!(geometry.vertex_count(), 6);
    }

    #[test]
    fn test_attribute_bytes() {
        let data = AttributeData::Vec2(vec![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(data.as_bytes().len(), 16);
        assert_eq!(data.components(), 2);
    }

    #[test]
    fn test_apply_matrix_moves_positions_and_turns_normals() {
        let mut geometry = Geometry::new()
            .with_attribute(POSITION, AttributeData::Vec3(vec![[0.0, 0.0, 0.0]]))
            .with_attribute(NORMAL, AttributeData::Vec3(vec![[0.0, 0.0, 1.0]]));

        let mut transform = Transform::from_position(Vec3::new(0.0, 1.0, 0.0));
        transform.set_direction(Vec3::new(0.0, -1.0, 0.0));
        geometry.apply_matrix(&transform.to_matrix());

        let Some(AttributeData::Vec3(positions)) = geometry.attribute(POSITION) else {
            panic!("positions missing");
        };
        let Some(AttributeData::Vec3(normals)) = geometry.attribute(NORMAL) else {
            panic!("normals missing");
        };
        assert_relative_eq!(positions[0][1], 1.0, epsilon = 1e-6);
        // +Z normal follows the rotated frame, opposite to the new -Z
        let expected = -transform.to_matrix().forward_direction();
        assert_relative_eq!(Vec3::from(normals[0]), expected, epsilon = 1e-5);
    }
}
