//! Math utilities and types
//!
//! Provides the nalgebra aliases used across the renderer plus the matrix
//! builders the camera and shadow code need. Conventions are OpenGL-style:
//! right-handed, Y-up, cameras look down -Z, clip-space depth in [-1, 1].

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix (translate * rotate * scale)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Rotate so the local -Z axis points along `direction`.
    ///
    /// A zero direction leaves the rotation untouched.
    pub fn set_direction(&mut self, direction: Vec3) {
        if direction.norm_squared() <= f32::EPSILON {
            return;
        }
        let up = pick_up_vector(&direction);
        self.rotation = Quat::face_towards(&-direction, &up);
    }

    /// Rotate so the local -Z axis points from `position` towards `target`.
    pub fn look_at(&mut self, target: Vec3) {
        self.set_direction(target - self.position);
    }

    /// Translate in the parent frame
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Rotate about a local axis by `angle` radians
    pub fn rotate_local(&mut self, axis: &Unit<Vec3>, angle: f32) {
        self.rotation *= Quat::from_axis_angle(axis, angle);
    }
}

/// Up vector that is never parallel to `direction`
fn pick_up_vector(direction: &Vec3) -> Vec3 {
    let dir = direction.normalize();
    if dir.y.abs() > 0.999 {
        Vec3::new(0.0, 0.0, -dir.y.signum())
    } else {
        Vec3::new(0.0, 1.0, 0.0)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Perspective projection with clip-space depth in [-1, 1]
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Orthographic projection with clip-space depth in [-1, 1]
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Translation part of an affine matrix
    fn translation_part(&self) -> Vec3;

    /// World-space -Z axis of an affine matrix, normalized
    fn forward_direction(&self) -> Vec3;

    /// Column-major float array, the layout uniform uploads use
    fn to_cols_array(&self) -> [f32; 16];
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let f = 1.0 / (fov_y * 0.5).tan();
        let mut result = Mat4::zeros();
        result[(0, 0)] = f / aspect;
        result[(1, 1)] = f;
        result[(2, 2)] = (far + near) / (near - far);
        result[(2, 3)] = 2.0 * far * near / (near - far);
        result[(3, 2)] = -1.0;
        result
    }

    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new(
            2.0 / (right - left), 0.0, 0.0, -(right + left) / (right - left),
            0.0, 2.0 / (top - bottom), 0.0, -(top + bottom) / (top - bottom),
            0.0, 0.0, -2.0 / (far - near), -(far + near) / (far - near),
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self[(0, 3)], self[(1, 3)], self[(2, 3)])
    }

    fn forward_direction(&self) -> Vec3 {
        let forward = self.transform_vector(&Vec3::new(0.0, 0.0, -1.0));
        if forward.norm_squared() <= f32::EPSILON {
            forward
        } else {
            forward.normalize()
        }
    }

    fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.as_slice());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_transform_identity_matrix() {
        assert_relative_eq!(Transform::identity().to_matrix(), Mat4::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_set_direction_points_negative_z() {
        let mut transform = Transform::identity();
        let direction = Vec3::new(1.0, -1.0, 0.0);
        transform.set_direction(direction);

        let forward = transform.to_matrix().forward_direction();
        assert_relative_eq!(forward, direction.normalize(), epsilon = EPSILON);
    }

    #[test]
    fn test_set_direction_straight_down() {
        let mut transform = Transform::identity();
        transform.set_direction(Vec3::new(0.0, -3.0, 0.0));

        let forward = transform.to_matrix().forward_direction();
        assert_relative_eq!(forward, Vec3::new(0.0, -1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_look_at_matches_nalgebra_view() {
        let mut transform = Transform::from_position(Vec3::new(0.0, 2.0, 5.0));
        transform.look_at(Vec3::zeros());

        let view = transform.to_matrix().try_inverse().unwrap();
        let expected = Mat4::look_at(Vec3::new(0.0, 2.0, 5.0), Vec3::zeros(), Vec3::y());
        assert_relative_eq!(view, expected, epsilon = EPSILON);
    }

    #[test]
    fn test_orthographic_maps_bounds_to_unit_cube() {
        let proj = Mat4::orthographic(-5.0, 5.0, -5.0, 5.0, 0.0, 20.0);

        let near_corner = proj.transform_point(&Point3::new(-5.0, -5.0, 0.0));
        let far_corner = proj.transform_point(&Point3::new(5.0, 5.0, -20.0));
        assert_relative_eq!(near_corner.coords, Vec3::new(-1.0, -1.0, -1.0), epsilon = EPSILON);
        assert_relative_eq!(far_corner.coords, Vec3::new(1.0, 1.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = Mat4::perspective(utils::deg_to_rad(60.0), 1.0, 0.1, 100.0);

        let near = proj.transform_point(&Point3::new(0.0, 0.0, -0.1));
        let far = proj.transform_point(&Point3::new(0.0, 0.0, -100.0));
        assert_relative_eq!(near.z, -1.0, epsilon = 1e-3);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_translation_part() {
        let matrix = Transform::from_position(Vec3::new(1.0, 2.0, 3.0)).to_matrix();
        assert_eq!(matrix.translation_part(), Vec3::new(1.0, 2.0, 3.0));
    }
}
