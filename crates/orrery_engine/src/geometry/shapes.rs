//! Built-in shapes
//!
//! Every shape is an unindexed triangle list with positions, texture
//! coordinates and normals.

use super::{AttributeData, Geometry, NORMAL, POSITION, TEX_COORDS};
use crate::foundation::math::constants::PI;

#[derive(Default)]
struct TriangleListBuilder {
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
}

impl TriangleListBuilder {
    /// Two triangles for the quad `a b c d` (counter-clockwise)
    fn quad(&mut self, corners: [[f32; 3]; 4], uvs: [[f32; 2]; 4], normals: [[f32; 3]; 4]) {
        for i in [0, 1, 2, 0, 2, 3] {
            self.positions.push(corners[i]);
            self.tex_coords.push(uvs[i]);
            self.normals.push(normals[i]);
        }
    }

    fn build(self) -> Geometry {
        Geometry::new()
            .with_attribute(POSITION, AttributeData::Vec3(self.positions))
            .with_attribute(TEX_COORDS, AttributeData::Vec2(self.tex_coords))
            .with_attribute(NORMAL, AttributeData::Vec3(self.normals))
    }
}

const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

impl Geometry {
    /// Rectangle in the XY plane centered at the origin, facing +Z
    pub fn rectangle(width: f32, height: f32) -> Self {
        let (w, h) = (width / 2.0, height / 2.0);
        let mut builder = TriangleListBuilder::default();
        builder.quad(
            [[-w, -h, 0.0], [w, -h, 0.0], [w, h, 0.0], [-w, h, 0.0]],
            QUAD_UVS,
            [[0.0, 0.0, 1.0]; 4],
        );
        builder.build()
    }

    /// Axis-aligned box centered at the origin
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (w, h, d) = (width / 2.0, height / 2.0, depth / 2.0);
        let faces: [([[f32; 3]; 4], [f32; 3]); 6] = [
            ([[w, -h, d], [w, -h, -d], [w, h, -d], [w, h, d]], [1.0, 0.0, 0.0]),
            ([[-w, -h, -d], [-w, -h, d], [-w, h, d], [-w, h, -d]], [-1.0, 0.0, 0.0]),
            ([[-w, h, d], [w, h, d], [w, h, -d], [-w, h, -d]], [0.0, 1.0, 0.0]),
            ([[-w, -h, -d], [w, -h, -d], [w, -h, d], [-w, -h, d]], [0.0, -1.0, 0.0]),
            ([[-w, -h, d], [w, -h, d], [w, h, d], [-w, h, d]], [0.0, 0.0, 1.0]),
            ([[w, -h, -d], [-w, -h, -d], [-w, h, -d], [w, h, -d]], [0.0, 0.0, -1.0]),
        ];

        let mut builder = TriangleListBuilder::default();
        for (corners, normal) in faces {
            builder.quad(corners, QUAD_UVS, [normal; 4]);
        }
        builder.build()
    }

    /// UV sphere centered at the origin
    ///
    /// Segment counts below 3 (around) and 2 (top to bottom) are raised to
    /// those minimums.
    pub fn sphere(radius: f32, segments_around: u32, segments_down: u32) -> Self {
        let around = segments_around.max(3);
        let down = segments_down.max(2);

        let point = |u: u32, v: u32| -> ([f32; 3], [f32; 2], [f32; 3]) {
            let s = u as f32 / around as f32;
            let t = v as f32 / down as f32;
            let theta = s * 2.0 * PI;
            let phi = t * PI;
            let normal = [theta.sin() * phi.sin(), phi.cos(), theta.cos() * phi.sin()];
            let position = [normal[0] * radius, normal[1] * radius, normal[2] * radius];
            (position, [s, 1.0 - t], normal)
        };

        let mut builder = TriangleListBuilder::default();
        for v in 0..down {
            for u in 0..around {
                let corners = [point(u, v + 1), point(u + 1, v + 1), point(u + 1, v), point(u, v)];
                builder.quad(
                    corners.map(|c| c.0),
                    corners.map(|c| c.1),
                    corners.map(|c| c.2),
                );
            }
        }
        builder.build()
    }
}
