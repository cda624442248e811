use super::*;
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::gpu::{BlendFactor, Capability, ClearFlags, DrawStyle, GpuValue, PolygonMode};
use crate::render::{RenderError, RenderOptions, RenderTarget};

#[test]
fn test_renderer_setup_state() {
    let f = Fixture::new();
    assert!(f.ctx.is_enabled(Capability::DepthTest));
    assert!(f.ctx.is_enabled(Capability::Multisample));
    assert_eq!(f.ctx.clear_color(), [0.1, 0.2, 0.3, 1.0]);
    assert!(!f.renderer.shadows_enabled());
}

#[test]
fn test_one_draw_per_visible_mesh() {
    let mut f = Fixture::new();
    let material = f.lambert();
    let a = f.add_cube(material, Vec3::new(-1.0, 0.0, 0.0));
    f.add_cube(material, Vec3::new(1.0, 0.0, 0.0));
    f.add_cube(material, Vec3::new(0.0, 1.0, 0.0));
    f.scene.mesh_mut(a).unwrap().visible = false;

    f.render();

    let draws = f.draws_into(None);
    assert_eq!(draws.len(), 2);
    assert!(draws.iter().all(|draw| draw.count == 36 && draw.style == DrawStyle::Triangles));

    let stats = f.renderer.last_frame_stats();
    assert_eq!(stats.meshes, 3);
    assert_eq!(stats.invisible_meshes, 1);
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.shadow_draw_calls, 0);
}

#[test]
fn test_draws_follow_traversal_order() {
    let mut f = Fixture::new();
    let lambert = f.lambert();
    let orbital = f.orbital();
    let first = f.add_cube(orbital, Vec3::zeros());
    let second = f.add_cube(lambert, Vec3::zeros());

    f.render();

    let arrays: Vec<_> = f.draws_into(None).iter().map(|draw| draw.vertex_array).collect();
    let expected = vec![
        Some(f.scene.mesh(first).unwrap().vertex_array()),
        Some(f.scene.mesh(second).unwrap().vertex_array()),
    ];
    assert_eq!(arrays, expected);
    let programs: Vec<_> = f.draws_into(None).iter().map(|draw| draw.program).collect();
    assert_eq!(programs, vec![Some(f.program(orbital)), Some(f.program(lambert))]);
}

#[test]
fn test_matrices_uploaded_per_mesh() {
    let mut f = Fixture::new();
    let material = f.lambert();
    let mesh = f.add_cube(material, Vec3::new(2.0, 0.0, -1.0));

    f.render();

    let program = f.program(material);
    let model = f.scene.world_matrix(mesh).unwrap();
    let view = f.scene.world_matrix(f.camera).unwrap().try_inverse().unwrap();
    let projection = *f.scene.camera(f.camera).unwrap().projection_matrix();
    assert_eq!(f.ctx.uniform_value(program, "u_model"), Some(GpuValue::Mat4(model.to_cols_array())));
    assert_eq!(f.ctx.uniform_value(program, "u_proj"), Some(GpuValue::Mat4(projection.to_cols_array())));

    let Some(GpuValue::Mat4(uploaded)) = f.ctx.uniform_value(program, "u_view") else {
        panic!("u_view not uploaded");
    };
    approx::assert_relative_eq!(Mat4::from_column_slice(&uploaded), view, epsilon = 1e-5);
}

#[test]
fn test_blending_and_render_settings() {
    let mut f = Fixture::new();
    let material = f.lambert();
    f.add_cube(material, Vec3::zeros());
    let settings = &mut f.scene.material_mut(material).unwrap().settings;
    settings.wireframe = true;
    settings.double_sided = false;
    settings.line_width = 2.0;

    f.render();

    assert!(f.ctx.is_enabled(Capability::Blend));
    assert_eq!(f.ctx.blend_func(), (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha));
    assert!(f.ctx.is_enabled(Capability::CullFace));
    assert_eq!(f.ctx.polygon_mode(), PolygonMode::Line);
    assert_eq!(f.ctx.line_width(), 2.0);
}

#[test]
fn test_clear_flags_follow_options() {
    let mut f = Fixture::new();
    let material = f.lambert();
    f.add_cube(material, Vec3::zeros());

    let options = RenderOptions { clear_color: false, ..RenderOptions::default() };
    f.renderer.render_with(&mut f.ctx, &mut f.scene, f.camera, &options).unwrap();
    let clears: Vec<_> = f
        .ctx
        .take_commands()
        .into_iter()
        .filter_map(|command| match command {
            GpuCommand::Clear { flags, .. } => Some(flags),
            _ => None,
        })
        .collect();
    assert_eq!(clears, vec![ClearFlags::DEPTH]);

    let options = RenderOptions { clear_color: false, clear_depth: false, target: None };
    f.renderer.render_with(&mut f.ctx, &mut f.scene, f.camera, &options).unwrap();
    assert!(!f.ctx.commands().iter().any(|command| matches!(command, GpuCommand::Clear { .. })));
}

#[test]
fn test_render_into_target() {
    let mut f = Fixture::new();
    let material = f.lambert();
    f.add_cube(material, Vec3::zeros());
    let target = RenderTarget::new(&mut f.ctx, 64, 32).unwrap();

    let options = RenderOptions::default().with_target(&target);
    f.renderer.render_with(&mut f.ctx, &mut f.scene, f.camera, &options).unwrap();

    assert_eq!(f.draws_into(Some(target.framebuffer())).len(), 1);
    assert!(f.draws_into(None).is_empty());
    assert_eq!(f.ctx.viewport(), (0, 0, 64, 32));

    f.ctx.take_commands();
    f.renderer.resize(800, 600);
    f.render();
    assert_eq!(f.ctx.bound_framebuffer(), None);
    assert_eq!(f.ctx.viewport(), (0, 0, 800, 600));
}

#[test]
fn test_repeated_renders_upload_identical_values() {
    let mut f = Fixture::new();
    let lambert = f.shadowed_lambert();
    let orbital = f.orbital();
    f.add_cube(lambert, Vec3::new(-1.0, 0.0, 0.0));
    f.add_cube(orbital, Vec3::new(1.0, 0.0, 0.0));
    let sun = f.add_sun();
    f.renderer.enable_shadows(&mut f.ctx, &f.scene, sun, 0.6, [256, 256], 0.002).unwrap();

    f.ctx.take_commands();
    f.render();
    let first = f.ctx.take_commands();
    f.render();
    let second = f.ctx.take_commands();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_camera_must_be_a_camera_node() {
    let mut f = Fixture::new();
    let material = f.lambert();
    let mesh = f.add_cube(material, Vec3::zeros());

    let err = f.renderer.render(&mut f.ctx, &mut f.scene, mesh).unwrap_err();
    assert!(matches!(err, RenderError::WrongNodeKind { expected: "camera", .. }));
    assert!(f.ctx.draw_calls().is_empty());
}
