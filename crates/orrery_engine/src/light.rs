//! Light descriptors
//!
//! A [`Light`] is plain data attached to a scene node. Position and direction
//! are not stored on the light: they come from the node's world transform
//! (direction is the node's -Z axis) when the renderer resolves the light
//! into [`LightData`] for upload.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Number of light slots every lit shader declares (`u_light0..3`)
pub const LIGHT_SLOTS: usize = 4;

/// Light kind, numbered as the shaders expect in `lightType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum LightKind {
    /// Contributes nothing; used to pad unused slots
    #[default]
    Disabled = 0,
    /// Constant light from everywhere
    Ambient = 1,
    /// Parallel rays along the node's -Z axis
    Directional = 2,
    /// Light radiating from the node's position with distance attenuation
    Point = 3,
}

impl LightKind {
    /// Value written to the `lightType` uniform member
    pub const fn shader_id(self) -> i32 {
        self as i32
    }
}

/// Light attached to a scene node
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Kind of light
    pub kind: LightKind,
    /// Linear RGB color, doubling as intensity
    pub color: Vec3,
    /// Constant, linear and quadratic attenuation (point lights)
    pub attenuation: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::Disabled,
            color: Vec3::new(1.0, 1.0, 1.0),
            attenuation: Vec3::new(1.0, 0.0, 0.0),
        }
    }
}

impl Light {
    /// Ambient light
    pub fn ambient(color: Vec3) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            ..Self::default()
        }
    }

    /// Directional light; orient the node to aim it
    pub fn directional(color: Vec3) -> Self {
        Self {
            kind: LightKind::Directional,
            color,
            ..Self::default()
        }
    }

    /// Point light with `(constant, linear, quadratic)` attenuation
    pub fn point(color: Vec3, attenuation: Vec3) -> Self {
        Self {
            kind: LightKind::Point,
            color,
            attenuation,
        }
    }

    /// Resolve against the owning node's world matrix
    pub fn resolve(&self, world: &Mat4) -> LightData {
        LightData {
            kind: self.kind,
            color: self.color,
            direction: world.forward_direction(),
            position: world.translation_part(),
            attenuation: self.attenuation,
        }
    }
}

/// World-space light values as uploaded into a `Light` uniform struct
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightData {
    /// Kind of light
    pub kind: LightKind,
    /// Linear RGB color
    pub color: Vec3,
    /// World-space direction
    pub direction: Vec3,
    /// World-space position
    pub position: Vec3,
    /// Attenuation coefficients
    pub attenuation: Vec3,
}

impl Default for LightData {
    /// The neutral padding light: disabled, so it adds no light
    fn default() -> Self {
        Light::default().resolve(&Mat4::identity())
    }
}

/// Build exactly [`LIGHT_SLOTS`] lights: the first ones in `lights`, padded
/// with neutral lights. Extra lights are dropped.
pub fn fill_light_slots<I>(lights: I) -> [LightData; LIGHT_SLOTS]
where
    I: IntoIterator<Item = LightData>,
{
    let mut slots = [LightData::default(); LIGHT_SLOTS];
    for (slot, light) in slots.iter_mut().zip(lights) {
        *slot = light;
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use approx::assert_relative_eq;

    #[test]
    fn test_resolve_uses_node_frame() {
        let mut transform = Transform::from_position(Vec3::new(1.0, 4.0, 0.0));
        transform.set_direction(Vec3::new(0.0, -1.0, 0.0));

        let data = Light::directional(Vec3::new(0.8, 0.8, 0.8)).resolve(&transform.to_matrix());
        assert_eq!(data.kind, LightKind::Directional);
        assert_relative_eq!(data.direction, Vec3::new(0.0, -1.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(data.position, Vec3::new(1.0, 4.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_fill_pads_with_disabled_lights() {
        let ambient = Light::ambient(Vec3::new(0.2, 0.2, 0.2)).resolve(&Mat4::identity());
        let slots = fill_light_slots([ambient]);

        assert_eq!(slots[0].kind, LightKind::Ambient);
        assert!(slots[1..].iter().all(|s| s.kind == LightKind::Disabled));
    }

    #[test]
    fn test_fill_truncates_in_order() {
        let lights: Vec<_> = (0..6)
            .map(|i| Light::ambient(Vec3::new(i as f32, 0.0, 0.0)).resolve(&Mat4::identity()))
            .collect();
        let slots = fill_light_slots(lights);

        assert_eq!(slots.len(), LIGHT_SLOTS);
        for (i, slot) in slots.iter().enumerate() {
            assert_relative_eq!(slot.color.x, i as f32);
        }
    }

    #[test]
    fn test_shader_ids() {
        assert_eq!(LightKind::Disabled.shader_id(), 0);
        assert_eq!(LightKind::Ambient.shader_id(), 1);
        assert_eq!(LightKind::Directional.shader_id(), 2);
        assert_eq!(LightKind::Point.shader_id(), 3);
    }
}
