//! Drawable geometry bound to a material
//!
//! A mesh's vertex array is created once, at construction, by uploading each
//! geometry attribute and pointing it at the attribute location of the same
//! name in the material's program. The renderer only binds it afterwards.

use std::rc::Rc;

use crate::config::{BindingValidation, NameKind};
use crate::geometry::Geometry;
use crate::gpu::{BufferId, GraphicsContext, VertexArrayId};
use crate::material::Material;
use crate::scene::MaterialId;

use super::{RenderError, RenderResult};

/// Geometry plus material plus the vertex array joining them
#[derive(Debug)]
pub struct Mesh {
    geometry: Rc<Geometry>,
    material: MaterialId,
    vertex_array: VertexArrayId,
    buffers: Vec<BufferId>,
    vertex_count: u32,
    /// Hidden meshes are skipped by both passes
    pub visible: bool,
}

impl Mesh {
    /// Bind `geometry` to `material`'s program
    ///
    /// # Errors
    /// Geometry whose attributes disagree on the vertex count is rejected.
    /// Attributes the program doesn't declare are handled per `validation`;
    /// on any failure the resources created so far are released.
    pub fn new(
        ctx: &mut dyn GraphicsContext,
        geometry: Rc<Geometry>,
        material_id: MaterialId,
        material: &Material,
        validation: BindingValidation,
    ) -> RenderResult<Self> {
        let mismatched = geometry.mismatched_attributes();
        if !mismatched.is_empty() {
            return Err(RenderError::InvalidGeometry(format!(
                "attributes {mismatched:?} differ from the vertex count {}",
                geometry.vertex_count()
            )));
        }
        let vertex_count = u32::try_from(geometry.vertex_count())
            .map_err(|_| RenderError::InvalidGeometry(format!("{} vertices", geometry.vertex_count())))?;

        let vertex_array = ctx.create_vertex_array()?;
        let mut buffers = Vec::new();
        let bound = bind_attributes(ctx, &geometry, material, vertex_array, &mut buffers)
            .and_then(|unmatched| validation.check(NameKind::Attribute, material.name(), unmatched));
        ctx.bind_vertex_array(None);

        if let Err(err) = bound {
            release_resources(ctx, vertex_array, &buffers);
            return Err(err);
        }

        log::debug!(
            "Mesh {:?}: {} vertices, {} attribute buffers, material '{}'",
            vertex_array,
            vertex_count,
            buffers.len(),
            material.name()
        );
        Ok(Self {
            geometry,
            material: material_id,
            vertex_array,
            buffers,
            vertex_count,
            visible: true,
        })
    }

    /// Shared geometry
    pub fn geometry(&self) -> &Rc<Geometry> {
        &self.geometry
    }

    /// Material in the scene's arena
    pub const fn material(&self) -> MaterialId {
        self.material
    }

    /// Vertex array handle
    pub const fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    /// Vertices per draw
    pub const fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Release the vertex array and its buffers
    pub fn release(self, ctx: &mut dyn GraphicsContext) {
        release_resources(ctx, self.vertex_array, &self.buffers);
    }
}

/// Upload and bind every attribute; returns the names with no location
fn bind_attributes(
    ctx: &mut dyn GraphicsContext,
    geometry: &Geometry,
    material: &Material,
    vertex_array: VertexArrayId,
    buffers: &mut Vec<BufferId>,
) -> RenderResult<Vec<String>> {
    ctx.bind_vertex_array(Some(vertex_array));
    let mut unmatched = Vec::new();
    for (name, data) in geometry.attributes() {
        let Some(location) = ctx.attribute_location(material.program(), name) else {
            unmatched.push(name.to_string());
            continue;
        };
        let buffer = ctx.create_buffer(data.as_bytes())?;
        buffers.push(buffer);
        ctx.vertex_attribute(location, buffer, data.components())?;
    }
    Ok(unmatched)
}

fn release_resources(ctx: &mut dyn GraphicsContext, vertex_array: VertexArrayId, buffers: &[BufferId]) {
    for buffer in buffers {
        ctx.delete_buffer(*buffer);
    }
    ctx.delete_vertex_array(vertex_array);
}
