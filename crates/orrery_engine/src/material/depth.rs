//! Shadow pass material

use super::{Material, MaterialProperties, ShaderSource};
use crate::config::BindingValidation;
use crate::gpu::GraphicsContext;
use crate::render::RenderResult;

/// Depth-only material drawn from the shadow caster's point of view
///
/// Its table holds just `u_model`, `u_view` and `u_proj`. The fragment stage
/// writes window-space depth into the color attachment.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthMaterial;

impl DepthMaterial {
    /// Compile the depth program
    pub fn build(ctx: &mut dyn GraphicsContext, validation: BindingValidation) -> RenderResult<Material> {
        Material::new(ctx, "depth", &ShaderSource::depth())?.finish(ctx, validation, &MaterialProperties::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessContext;
    use crate::material::{MODEL, PROJECTION, VIEW};

    #[test]
    fn test_depth_material_has_only_matrices() {
        let mut ctx = HeadlessContext::new(16, 16);
        let material = DepthMaterial::build(&mut ctx, BindingValidation::Strict).unwrap();

        let names: Vec<_> = material.uniforms().iter().map(|u| u.name()).collect();
        assert_eq!(names, [MODEL, VIEW, PROJECTION]);
        assert!(material.uniforms().iter().all(|u| u.is_located()));
    }
}
