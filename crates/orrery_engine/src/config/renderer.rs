//! Renderer configuration

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::render::{RenderError, RenderResult};

/// What to do when CPU-side names have no counterpart in a shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BindingValidation {
    /// Skip the binding; only a debug log
    Permissive,
    /// Skip the binding and warn once per material or mesh at setup
    #[default]
    Warn,
    /// Fail material or mesh construction
    Strict,
}

/// Kind of name being bound, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// Material uniform
    Uniform,
    /// Geometry attribute
    Attribute,
}

impl std::fmt::Display for NameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uniform => write!(f, "uniform"),
            Self::Attribute => write!(f, "attribute"),
        }
    }
}

impl BindingValidation {
    /// Apply the policy to the names `owner` failed to bind
    pub fn check(self, kind: NameKind, owner: &str, unmatched: Vec<String>) -> RenderResult<()> {
        if unmatched.is_empty() {
            return Ok(());
        }
        match self {
            Self::Permissive => {
                log::debug!("{owner}: skipped {kind} bindings {unmatched:?}");
                Ok(())
            }
            Self::Warn => {
                log::warn!(
                    "{owner}: {} {kind}(s) not declared by the shader, binding skipped: {}",
                    unmatched.len(),
                    unmatched.join(", ")
                );
                Ok(())
            }
            Self::Strict => Err(RenderError::UnboundNames {
                kind,
                owner: owner.to_string(),
                names: unmatched,
            }),
        }
    }
}

/// Shadow defaults used by [`Renderer::enable_shadows_from`](crate::render::Renderer::enable_shadows_from)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Darkening of shadowed regions, in [0, 1]
    pub strength: f32,
    /// Shadow map size in texels
    pub resolution: [u32; 2],
    /// Depth bias against shadow acne
    pub bias: f32,
    /// Orthographic shadow camera bounds: left, right, bottom, top, near, far
    pub camera_bounds: [f32; 6],
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            strength: 0.5,
            resolution: [512, 512],
            bias: 0.001,
            camera_bounds: [-5.0, 5.0, -5.0, 5.0, 0.0, 20.0],
        }
    }
}

impl ShadowSettings {
    /// Validate ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.strength) {
            return Err(ConfigError::Invalid(format!("shadow strength {} outside [0, 1]", self.strength)));
        }
        if self.resolution.contains(&0) {
            return Err(ConfigError::Invalid(format!(
                "shadow resolution {:?} has a zero edge",
                self.resolution
            )));
        }
        let [left, right, bottom, top, near, far] = self.camera_bounds;
        if left >= right || bottom >= top || near >= far {
            return Err(ConfigError::Invalid(format!(
                "degenerate shadow camera bounds {:?}",
                self.camera_bounds
            )));
        }
        Ok(())
    }
}

/// # Renderer Configuration
///
/// Startup options for [`Renderer`](crate::render::Renderer) and the
/// materials built alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Clear color, RGB in [0, 1]
    pub clear_color: [f32; 3],
    /// Enable multisample rasterization
    pub multisample: bool,
    /// Policy for uniform and attribute names the shaders don't declare
    pub binding_validation: BindingValidation,
    /// Directory searched by [`ShaderSource::load`](crate::material::ShaderSource::load)
    pub shader_dir: Option<String>,
    /// Shadow settings used when shadows are enabled from config
    pub shadows: Option<ShadowSettings>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0],
            multisample: true,
            binding_validation: BindingValidation::Warn,
            shader_dir: None,
            shadows: None,
        }
    }
}

impl Config for RendererConfig {}

impl RendererConfig {
    /// Set the clear color
    #[must_use]
    pub fn with_clear_color(mut self, color: [f32; 3]) -> Self {
        self.clear_color = color;
        self
    }

    /// Set the binding validation policy
    #[must_use]
    pub fn with_binding_validation(mut self, validation: BindingValidation) -> Self {
        self.binding_validation = validation;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::Invalid(format!(
                "clear color {:?} outside [0, 1]",
                self.clear_color
            )));
        }
        if let Some(shadows) = &self.shadows {
            shadows.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RendererConfig::default().validate().is_ok());
    }

    #[test]
    fn test_clear_color_out_of_range() {
        let config = RendererConfig::default().with_clear_color([0.0, 2.0, 0.0]);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_round_trip_with_partial_fields() {
        let text = r#"
            clear_color = [0.1, 0.2, 0.3]
            binding_validation = "Strict"

            [shadows]
            strength = 0.7
        "#;
        let config: RendererConfig = toml::from_str(text).unwrap();
        assert_eq!(config.binding_validation, BindingValidation::Strict);
        assert!(config.multisample);

        let shadows = config.shadows.unwrap();
        assert_eq!(shadows.resolution, [512, 512]);
        assert!((shadows.strength - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_shadow_settings_validation() {
        let mut settings = ShadowSettings::default();
        assert!(settings.validate().is_ok());

        settings.resolution = [0, 512];
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));

        settings = ShadowSettings { camera_bounds: [1.0, -1.0, -1.0, 1.0, 0.0, 10.0], ..Default::default() };
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_rejects_bad_shadow_settings() {
        let config = RendererConfig {
            shadows: Some(ShadowSettings { strength: 1.5, ..ShadowSettings::default() }),
            ..RendererConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref message) if message.contains("strength")));
    }

    #[test]
    fn test_strict_validation_fails_on_unmatched() {
        let result = BindingValidation::Strict.check(NameKind::Uniform, "lambert", vec!["u_typo".into()]);
        assert!(matches!(result, Err(RenderError::UnboundNames { .. })));
        assert!(BindingValidation::Warn.check(NameKind::Uniform, "lambert", vec!["u_typo".into()]).is_ok());
        assert!(BindingValidation::Strict.check(NameKind::Attribute, "mesh", Vec::new()).is_ok());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = RendererConfig::default().save_to_file("renderer.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
