//! Camera node data

use crate::foundation::math::{utils, Mat4, Mat4Ext};

/// Projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
        /// Width / height
        aspect: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
    /// Orthographic projection
    Orthographic {
        /// Left plane
        left: f32,
        /// Right plane
        right: f32,
        /// Bottom plane
        bottom: f32,
        /// Top plane
        top: f32,
        /// Near plane
        near: f32,
        /// Far plane
        far: f32,
    },
}

impl Projection {
    /// Projection matrix, clip-space depth in [-1, 1]
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Perspective { fov_y, aspect, near, far } => Mat4::perspective(fov_y, aspect, near, far),
            Self::Orthographic { left, right, bottom, top, near, far } => {
                Mat4::orthographic(left, right, bottom, top, near, far)
            }
        }
    }
}

/// Camera attached to a scene node
///
/// The camera looks down its node's local -Z axis. The view matrix is the
/// inverse of the node's world matrix and is refreshed by the renderer once
/// per frame through [`update_view_matrix`](Self::update_view_matrix).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    projection: Projection,
    projection_matrix: Mat4,
    view_matrix: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(60.0, 1.0, 0.1, 1000.0)
    }
}

impl Camera {
    /// Perspective camera; `fov_degrees` is the vertical field of view
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::with_projection(Projection::Perspective {
            fov_y: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        })
    }

    /// Orthographic camera
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        Self::with_projection(Projection::Orthographic { left, right, bottom, top, near, far })
    }

    fn with_projection(projection: Projection) -> Self {
        Self {
            projection_matrix: projection.matrix(),
            projection,
            view_matrix: Mat4::identity(),
        }
    }

    /// Change the aspect ratio of a perspective camera, e.g. after a resize
    pub fn set_aspect(&mut self, aspect: f32) {
        if let Projection::Perspective { aspect: current, .. } = &mut self.projection {
            *current = aspect;
            self.projection_matrix = self.projection.matrix();
        } else {
            log::warn!("set_aspect ignored on an orthographic camera");
        }
    }

    /// Projection parameters
    pub const fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Projection matrix
    pub const fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// View matrix from the last update
    pub const fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Recompute the view matrix from the node's world matrix
    pub fn update_view_matrix(&mut self, world: &Mat4) {
        self.view_matrix = world.try_inverse().unwrap_or_else(|| {
            log::warn!("Camera world matrix is singular, using identity view");
            Mat4::identity()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Transform, Vec3, Vec4};
    use approx::assert_relative_eq;

    #[test]
    fn test_view_is_inverse_of_world() {
        let mut transform = Transform::from_position(Vec3::new(0.0, 2.0, 5.0));
        transform.look_at(Vec3::zeros());
        let world = transform.to_matrix();

        let mut camera = Camera::default();
        camera.update_view_matrix(&world);
        assert_relative_eq!(camera.view_matrix() * world, Mat4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn test_point_ahead_lands_inside_clip_volume() {
        let mut camera = Camera::perspective(60.0, 16.0 / 9.0, 0.1, 100.0);
        camera.update_view_matrix(&Mat4::identity());

        let clip = camera.projection_matrix() * camera.view_matrix() * Vec4::new(0.0, 0.0, -10.0, 1.0);
        let ndc_z = clip.z / clip.w;
        assert!(ndc_z > -1.0 && ndc_z < 1.0);
    }

    #[test]
    fn test_set_aspect_rebuilds_projection() {
        let mut camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        let before = *camera.projection_matrix();
        camera.set_aspect(2.0);
        assert_relative_eq!(camera.projection_matrix()[(0, 0)], before[(0, 0)] / 2.0, epsilon = 1e-6);
    }
}
