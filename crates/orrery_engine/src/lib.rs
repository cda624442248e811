//! # Orrery Engine
//!
//! A minimal scene-graph renderer: geometry bound to materials, four-light
//! shading and a single shadow caster, driven through an explicit
//! [`GraphicsContext`](gpu::GraphicsContext).
//!
//! ## Features
//!
//! - **Scene graph**: slotmap-backed node tree with groups, meshes, lights and cameras
//! - **Materials**: Lambert, orbital (sun/moon eclipse) and depth-only programs
//! - **Shadows**: one shadow map rendered from a light node each frame
//! - **Headless context**: a device-free backend that records every call
//! - **Configuration**: renderer settings loaded from TOML or RON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use orrery_engine::prelude::*;
//!
//! fn main() -> Result<(), RenderError> {
//!     let mut ctx = HeadlessContext::new(800, 600);
//!     let config = RendererConfig::default();
//!     let mut renderer = Renderer::new(&mut ctx, &config)?;
//!
//!     let mut scene = Scene::new();
//!     let root = scene.root();
//!     let material = LambertMaterial::new().build(&mut ctx, config.binding_validation)?;
//!     let material = scene.add_material(material);
//!     let geometry = Rc::new(Geometry::sphere(1.0, 32, 16));
//!     scene.add_mesh(&mut ctx, root, Transform::identity(), geometry, material, config.binding_validation)?;
//!     scene.add_light(root, Transform::identity(), Light::ambient(Vec3::new(0.3, 0.3, 0.3)))?;
//!     let camera = scene.add_camera(root, Transform::from_position(Vec3::new(0.0, 0.0, 5.0)), Camera::default())?;
//!
//!     renderer.render(&mut ctx, &mut scene, camera)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod geometry;
pub mod gpu;
pub mod light;
pub mod material;
pub mod render;
pub mod scene;
pub mod texture;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{BindingValidation, Config, RendererConfig, ShadowSettings},
        foundation::math::{Mat4, Transform, Vec3},
        geometry::Geometry,
        gpu::{GraphicsContext, HeadlessContext},
        light::Light,
        material::{
            DepthMaterial, LambertMaterial, Material, MaterialProperties, OrbitalBodies, OrbitalMaterial,
            ShaderSource, UniformValue,
        },
        render::{FrameStats, RenderError, RenderOptions, RenderResult, RenderTarget, Renderer},
        scene::{Camera, MaterialId, NodeId, Scene},
        texture::Texture,
    };
}
