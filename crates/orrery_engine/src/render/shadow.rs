//! Single shadow caster
//!
//! A shadow renders the scene's depth from a light node's point of view into
//! its own [`RenderTarget`]. Materials that declare `u_shadow0` then sample
//! that map through [`ShadowData`].

use crate::config::{BindingValidation, ShadowSettings};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::gpu::{GraphicsContext, TextureId};
use crate::material::{DepthMaterial, Material, UniformValue, PROJECTION, SHADOW_TEXTURE_UNIT, VIEW};
use crate::scene::{NodeId, Scene};

use super::{RenderError, RenderResult, RenderTarget};

/// Values uploaded into a `Shadow` uniform struct
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowData {
    /// World-space direction the caster looks along
    pub light_direction: Vec3,
    /// Light-space projection
    pub projection: Mat4,
    /// Light-space view
    pub view: Mat4,
    /// Depth map texture
    pub depth_texture: TextureId,
    /// Texture unit the depth map is bound to
    pub texture_unit: u32,
    /// Darkening in [0, 1]
    pub strength: f32,
    /// Depth comparison bias
    pub bias: f32,
}

/// Shadow map bound to a light node
#[derive(Debug)]
pub struct Shadow {
    light: NodeId,
    target: RenderTarget,
    material: Material,
    strength: f32,
    bias: f32,
    bounds: [f32; 6],
    projection: Mat4,
    view: Mat4,
    light_direction: Vec3,
}

impl Shadow {
    /// Allocate the shadow map and compile the depth program
    pub(crate) fn new(
        ctx: &mut dyn GraphicsContext,
        light: NodeId,
        settings: &ShadowSettings,
        validation: BindingValidation,
    ) -> RenderResult<Self> {
        settings.validate().map_err(RenderError::InvalidShadowSettings)?;
        let [width, height] = settings.resolution;
        let target = RenderTarget::new(ctx, width, height)?;
        let material = match DepthMaterial::build(ctx, validation) {
            Ok(material) => material,
            Err(err) => {
                target.release(ctx);
                return Err(err);
            }
        };
        let [left, right, bottom, top, near, far] = settings.camera_bounds;

        Ok(Self {
            light,
            target,
            material,
            strength: settings.strength,
            bias: settings.bias,
            bounds: settings.camera_bounds,
            projection: Mat4::orthographic(left, right, bottom, top, near, far),
            view: Mat4::identity(),
            light_direction: Vec3::new(0.0, 0.0, -1.0),
        })
    }

    /// Refresh the light-space matrices from the light's world transform
    ///
    /// Both land in the depth material's `u_view` and `u_proj`.
    pub fn update_internal(&mut self, scene: &Scene) -> RenderResult<()> {
        let world = scene.world_matrix(self.light)?;
        self.view = world.try_inverse().unwrap_or_else(|| {
            log::warn!("Shadow light {:?} has a singular world matrix", self.light);
            Mat4::identity()
        });
        let [left, right, bottom, top, near, far] = self.bounds;
        self.projection = Mat4::orthographic(left, right, bottom, top, near, far);
        self.light_direction = world.forward_direction();

        self.material.set_uniform(VIEW, UniformValue::Mat4(self.view))?;
        self.material.set_uniform(PROJECTION, UniformValue::Mat4(self.projection))?;
        Ok(())
    }

    /// Values for a material's `u_shadow0`
    pub fn shadow_data(&self) -> ShadowData {
        ShadowData {
            light_direction: self.light_direction,
            projection: self.projection,
            view: self.view,
            depth_texture: self.target.color_texture().id(),
            texture_unit: SHADOW_TEXTURE_UNIT,
            strength: self.strength,
            bias: self.bias,
        }
    }

    /// Light node casting the shadow
    pub const fn light(&self) -> NodeId {
        self.light
    }

    /// Shadow map target
    pub const fn render_target(&self) -> &RenderTarget {
        &self.target
    }

    /// Depth-only material
    pub const fn depth_material(&self) -> &Material {
        &self.material
    }

    pub(crate) fn depth_material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    /// Darkening in [0, 1]
    pub const fn strength(&self) -> f32 {
        self.strength
    }

    /// Depth comparison bias
    pub const fn bias(&self) -> f32 {
        self.bias
    }

    /// Release the target and the depth program
    pub fn release(self, ctx: &mut dyn GraphicsContext) {
        self.target.release(ctx);
        self.material.release(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use crate::gpu::HeadlessContext;
    use crate::light::Light;
    use approx::assert_relative_eq;

    #[test]
    fn test_update_writes_light_space_matrices() {
        let mut ctx = HeadlessContext::new(64, 64);
        let mut scene = Scene::new();
        let mut transform = Transform::from_position(Vec3::new(0.0, 10.0, 0.0));
        transform.set_direction(Vec3::new(0.0, -1.0, 0.0));
        let light = scene
            .add_light(scene.root(), transform, Light::directional(Vec3::new(1.0, 1.0, 1.0)))
            .unwrap();

        let mut shadow = Shadow::new(&mut ctx, light, &ShadowSettings::default(), BindingValidation::Strict).unwrap();
        shadow.update_internal(&scene).unwrap();

        let data = shadow.shadow_data();
        assert_relative_eq!(data.light_direction, Vec3::new(0.0, -1.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(data.view * scene.world_matrix(light).unwrap(), Mat4::identity(), epsilon = 1e-5);
        assert_eq!(data.texture_unit, 3);
        assert_eq!(data.depth_texture, shadow.render_target().color_texture().id());

        let view = shadow.depth_material().uniform(VIEW).and_then(|u| u.value()).cloned();
        assert_eq!(view, Some(UniformValue::Mat4(data.view)));
    }

    #[test]
    fn test_invalid_settings_rejected_before_allocation() {
        let mut ctx = HeadlessContext::new(64, 64);
        let mut scene = Scene::new();
        let light = scene
            .add_light(scene.root(), Transform::identity(), Light::directional(Vec3::new(1.0, 1.0, 1.0)))
            .unwrap();
        let settings = ShadowSettings { resolution: [0, 512], ..ShadowSettings::default() };

        let err = Shadow::new(&mut ctx, light, &settings, BindingValidation::Warn).unwrap_err();
        assert!(matches!(err, RenderError::InvalidShadowSettings(_)));
        assert_eq!(ctx.live_resources(), 0);
    }
}
