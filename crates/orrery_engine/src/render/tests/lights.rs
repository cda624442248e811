use super::*;
use crate::gpu::GpuValue;
use crate::light::LightKind;

/// Member of one of the four `u_lightN` slot structs
fn is_light_slot_member(name: &str) -> bool {
    (0..4).any(|slot| name.starts_with(&format!("u_light{slot}.")))
}

fn light_member(f: &Fixture, program: ProgramId, slot: usize, member: &str) -> Option<GpuValue> {
    f.ctx.uniform_value(program, &format!("u_light{slot}.{member}"))
}

#[test]
fn test_no_lights_fill_every_slot_with_neutral_lights() {
    let mut f = Fixture::new();
    let material = f.lambert();
    f.add_cube(material, Vec3::zeros());

    f.render();

    let program = f.program(material);
    for slot in 0..4 {
        assert_eq!(
            light_member(&f, program, slot, "lightType"),
            Some(GpuValue::Int(LightKind::Disabled.shader_id()))
        );
    }
    assert_eq!(f.renderer.last_frame_stats().lights, 0);
}

#[test]
fn test_extra_lights_are_dropped_in_traversal_order() {
    let mut f = Fixture::new();
    let material = f.lambert();
    f.add_cube(material, Vec3::zeros());
    let root = f.scene.root();
    for i in 0..6 {
        let color = Vec3::new(i as f32, 0.0, 0.0);
        f.scene.add_light(root, Transform::identity(), Light::ambient(color)).unwrap();
    }

    f.render();

    let program = f.program(material);
    for slot in 0..4 {
        assert_eq!(light_member(&f, program, slot, "color"), Some(GpuValue::Vec3([slot as f32, 0.0, 0.0])));
        assert_eq!(
            light_member(&f, program, slot, "lightType"),
            Some(GpuValue::Int(LightKind::Ambient.shader_id()))
        );
    }
    // Four slots written once each per draw, whatever the light count
    assert_eq!(f.ctx.uniform_writes(program, "u_light0.color").len(), 1);
    assert!(f.ctx.program_interface(program).is_some_and(|i| i.uniform_index("u_light4.color").is_none()));
    assert_eq!(f.renderer.last_frame_stats().lights, 6);
}

#[test]
fn test_lights_resolved_in_world_space() {
    let mut f = Fixture::new();
    let material = f.lambert();
    f.add_cube(material, Vec3::zeros());
    let root = f.scene.root();
    let group = f.scene.add_group(root, Transform::from_position(Vec3::new(0.0, 3.0, 0.0))).unwrap();
    f.scene
        .add_light(
            group,
            Transform::from_position(Vec3::new(1.0, 0.0, 0.0)),
            Light::point(Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 0.1, 0.01)),
        )
        .unwrap();

    f.render();

    let program = f.program(material);
    assert_eq!(light_member(&f, program, 0, "position"), Some(GpuValue::Vec3([1.0, 3.0, 0.0])));
    assert_eq!(light_member(&f, program, 0, "attenuation"), Some(GpuValue::Vec3([1.0, 0.1, 0.01])));
    assert_eq!(
        light_member(&f, program, 1, "lightType"),
        Some(GpuValue::Int(LightKind::Disabled.shader_id()))
    );
}

#[test]
fn test_materials_without_light_slots_get_no_light_writes() {
    let mut f = Fixture::new();
    let orbital = f.orbital();
    f.add_cube(orbital, Vec3::zeros());
    let sun = f.add_sun();
    f.renderer.enable_shadows(&mut f.ctx, &f.scene, sun, 0.5, [128, 128], 0.001).unwrap();

    f.render();

    let material = f.scene.material(orbital).unwrap();
    assert!(!material.has_uniform("u_light0"));
    // Its own u_lightColor/u_lightDirection uniforms are not slot writes
    assert!(material.has_uniform("u_lightColor"));
    let slot_writes = f
        .ctx
        .commands()
        .iter()
        .filter(|command| matches!(command, GpuCommand::SetUniform { name, .. } if is_light_slot_member(name)))
        .count();
    assert_eq!(slot_writes, 0);
}

#[test]
fn test_light_slot_member_matching() {
    assert!(is_light_slot_member("u_light0.color"));
    assert!(is_light_slot_member("u_light3.lightType"));
    assert!(!is_light_slot_member("u_lightColor"));
    assert!(!is_light_slot_member("u_lightDirection"));
    assert!(!is_light_slot_member("u_light4.color"));
}

#[test]
fn test_view_position_only_for_materials_declaring_it() {
    let mut f = Fixture::new();
    let lambert = f.lambert();
    let orbital = f.orbital();
    f.add_cube(lambert, Vec3::zeros());
    f.add_cube(orbital, Vec3::zeros());

    f.render();

    assert_eq!(
        f.ctx.uniform_value(f.program(orbital), "u_viewPosition"),
        Some(GpuValue::Vec3([0.0, 0.0, 5.0]))
    );
    assert!(!f.scene.material(lambert).unwrap().has_uniform("u_viewPosition"));
}
