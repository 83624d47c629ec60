//! Scene state machine, draw order and input tests against a recording device.

mod common;

use common::{Call, RecordingDevice, RecordingHooks};
use glam::Vec3;
use layerview_core::Point2;
use layerview_visualizer::geometry::{
    GeometryBuffer, InstanceArray, InstanceRecord, TriangleMesh,
};
use layerview_visualizer::visualizer::{
    FrameState, MouseButton, MouseEvent, Scene, SceneConfig, SceneState, StaticPass, StaticSlot,
    UploadState, Volume,
};

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

fn ready_scene(config: SceneConfig) -> Scene<RecordingDevice> {
    let mut scene = Scene::new(RecordingDevice::new(), config);
    scene.init().unwrap();
    scene.resize(800, 600, 1.0);
    scene.device_mut().clear_calls();
    scene
}

fn cube(size: f32) -> TriangleMesh {
    TriangleMesh::cube(size)
}

fn label(call: &Call) -> String {
    match call {
        Call::Clear(_) => "clear".into(),
        Call::Background => "background".into(),
        Call::DrawStatic(slot, _) => format!("{:?}", slot),
        Call::DrawVolume { .. } => "volume".into(),
        Call::Hook(name) => (*name).into(),
        Call::Present => "present".into(),
        other => format!("{:?}", other),
    }
}

#[test]
fn test_render_before_init_does_nothing() {
    let mut scene = Scene::new(RecordingDevice::new(), SceneConfig::default());
    assert_eq!(scene.state(), SceneState::Uninitialized);
    assert!(!scene.render());
    assert!(scene.device().calls.is_empty());
}

#[test]
fn test_init_is_idempotent() {
    let mut scene = Scene::new(RecordingDevice::new(), SceneConfig::default());
    scene.init().unwrap();
    scene.init().unwrap();
    assert_eq!(scene.device().count(&Call::Init), 1);
    assert!(scene.is_ready());
    assert!(scene
        .device()
        .calls
        .iter()
        .any(|c| matches!(c, Call::SetStatic(StaticSlot::Axes, 6))));
}

#[test]
fn test_init_failure_leaves_scene_uninitialized() {
    let mut device = RecordingDevice::new();
    device.fail_init = true;
    let mut scene = Scene::new(device, SceneConfig::default());

    assert!(scene.init().is_err());
    assert_eq!(scene.state(), SceneState::Uninitialized);
    assert!(!scene.render());

    scene.device_mut().fail_init = false;
    scene.init().unwrap();
    assert_eq!(scene.state(), SceneState::Ready);
}

#[test]
fn test_resize_ignores_non_positive_sizes() {
    let mut scene = ready_scene(SceneConfig::default());
    scene.resize(0, 600, 1.0);
    scene.resize(800, -1, 1.0);
    scene.resize(800, 600, 0.0);
    scene.resize(800, 600, f32::NAN);
    assert!(scene.device().calls.is_empty());
    assert_eq!(scene.camera().viewport(), (800.0, 600.0));

    scene.resize(1024, 768, 1.0);
    assert_eq!(scene.device().calls, vec![Call::Resize(1024, 768)]);
}

#[test]
fn test_resize_scales_framebuffer_not_viewport() {
    let mut scene = ready_scene(SceneConfig::default());
    scene.resize(800, 600, 2.0);
    assert_eq!(scene.device().calls, vec![Call::Resize(1600, 1200)]);
    assert_eq!(scene.camera().viewport(), (800.0, 600.0));
    assert_eq!(scene.scale_factor(), 2.0);
}

#[test]
fn test_frame_draw_order() {
    let mut scene = ready_scene(SceneConfig::default());
    let index = scene.load_mesh(&cube(10.0), RED, Vec3::ZERO);
    scene.select(Some(index));

    assert!(scene.render_with(&mut RecordingHooks));
    assert_eq!(scene.frame_state(), FrameState::Idle);

    let order: Vec<String> = scene
        .device()
        .calls
        .iter()
        .filter(|c| !matches!(c, Call::Upload { .. } | Call::SetStatic(..)))
        .map(label)
        .collect();
    assert_eq!(
        order,
        vec![
            "clear",
            "background",
            "Ground",
            "Grid",
            "BedOutline",
            "before_render",
            "volume",
            "SelectionOutlines",
            "Axes",
            "after_render",
            "overlay",
            "present",
        ]
    );

    let calls = &scene.device().calls;
    assert!(calls.contains(&Call::DrawStatic(
        StaticSlot::Grid,
        StaticPass {
            depth_test: true,
            blend: true
        }
    )));
    assert!(calls.contains(&Call::DrawStatic(
        StaticSlot::Axes,
        StaticPass {
            depth_test: false,
            blend: false
        }
    )));
    // 8 corners x 3 brackets x 2 vertices.
    assert!(calls.contains(&Call::SetStatic(StaticSlot::SelectionOutlines, 48)));
}

#[test]
fn test_flat_background_skips_gradient() {
    let mut config = SceneConfig::default();
    config.theme.flat_background = true;
    let mut scene = ready_scene(config);
    scene.render();
    assert_eq!(scene.device().count(&Call::Background), 0);
    assert_eq!(scene.device().count(&Call::Present), 1);
}

#[test]
fn test_volume_uploads_once_per_mutation() {
    let mut scene = ready_scene(SceneConfig::default());
    let index = scene.load_mesh(&cube(1.0), RED, Vec3::ZERO);

    scene.render();
    scene.render();
    let volume = scene.volume(index).unwrap();
    assert_eq!(volume.upload_count(), 1);
    assert_eq!(volume.state(), UploadState::Clean);

    scene
        .volume_mut(index)
        .unwrap()
        .geometry_mut()
        .translate(Vec3::X);
    scene.render();
    assert_eq!(scene.volume(index).unwrap().upload_count(), 2);
    // The first upload was released before the second was made.
    assert_eq!(scene.device().live_buffers.get(), 1);
}

#[test]
fn test_moving_origin_does_not_reupload() {
    let mut scene = ready_scene(SceneConfig::default());
    let index = scene.load_mesh(&cube(1.0), RED, Vec3::ZERO);
    scene.render();

    scene
        .volume_mut(index)
        .unwrap()
        .set_origin(Vec3::new(20.0, 0.0, 0.0));
    let volume = scene.volume(index).unwrap();
    assert_eq!(volume.state(), UploadState::Clean);
    assert_eq!(volume.bounding_box().min, Vec3::new(20.0, 0.0, 0.0));

    scene.device_mut().clear_calls();
    scene.render();
    assert_eq!(scene.volume(index).unwrap().upload_count(), 1);
    assert!(!scene
        .device()
        .calls
        .iter()
        .any(|c| matches!(c, Call::Upload { .. })));
}

#[test]
fn test_failed_upload_skips_volume_and_retries() {
    let mut scene = ready_scene(SceneConfig::default());
    scene.load_mesh(&cube(1.0), RED, Vec3::ZERO);
    scene.device_mut().fail_upload = true;

    assert!(scene.render());
    assert!(scene.device().volume_draws().is_empty());
    assert!(scene.volume(0).unwrap().is_dirty());

    scene.device_mut().fail_upload = false;
    scene.render();
    assert_eq!(scene.device().volume_draws().len(), 1);
    assert!(!scene.volume(0).unwrap().is_dirty());
}

#[test]
fn test_hidden_and_empty_volumes_are_not_drawn() {
    let mut scene = ready_scene(SceneConfig::default());
    scene.add_volume(Volume::new(RED, GeometryBuffer::triangles()));
    let hidden = scene.load_mesh(&cube(1.0), BLUE, Vec3::ZERO);
    scene.volume_mut(hidden).unwrap().visible = false;

    scene.render();
    assert!(scene
        .device()
        .calls
        .iter()
        .all(|c| !matches!(c, Call::Upload { .. } | Call::DrawVolume { .. })));
}

#[test]
fn test_clearing_volumes_releases_buffers() {
    let mut scene = ready_scene(SceneConfig::default());
    scene.load_mesh(&cube(1.0), RED, Vec3::ZERO);
    scene.load_mesh(&cube(1.0), BLUE, Vec3::new(5.0, 0.0, 0.0));
    scene.render();
    let live = std::rc::Rc::clone(&scene.device().live_buffers);
    assert_eq!(live.get(), 2);

    scene.clear_volumes();
    assert_eq!(live.get(), 0);

    scene.load_mesh(&cube(1.0), RED, Vec3::ZERO);
    scene.render();
    drop(scene);
    assert_eq!(live.get(), 0);
}

#[test]
fn test_picking_reports_hovered_volume() {
    let config = SceneConfig {
        picking: true,
        ..SceneConfig::default()
    };
    let mut scene = ready_scene(config);
    scene.load_mesh(&cube(1.0), RED, Vec3::ZERO);
    scene.load_mesh(&cube(1.0), BLUE, Vec3::new(5.0, 0.0, 0.0));

    assert!(scene.handle_mouse(MouseEvent::Move { x: 400.0, y: 300.0 }));
    scene.render();

    // The recording device returns the last flat colour: volume 1.
    assert_eq!(scene.hovered(), Some(1));
    assert!(scene.volume(1).unwrap().hovered);
    assert!(!scene.volume(0).unwrap().hovered);
    assert!(scene.device().calls.contains(&Call::ReadPixel(400, 300)));

    // Flat draws come first and are followed by a normal clear and redraw.
    let calls = &scene.device().calls;
    let read = calls
        .iter()
        .position(|c| matches!(c, Call::ReadPixel(..)))
        .unwrap();
    assert!(calls[..read]
        .iter()
        .filter(|c| matches!(c, Call::DrawVolume { .. }))
        .all(|c| matches!(c, Call::DrawVolume { flat: true, .. })));
    assert!(matches!(calls[read + 1], Call::Clear(_)));

    scene.device_mut().pixel = Some([0, 0, 0, 255]);
    scene.handle_mouse(MouseEvent::Move { x: 10.0, y: 10.0 });
    scene.render();
    assert_eq!(scene.hovered(), None);
}

#[test]
fn test_picking_reads_framebuffer_pixels_on_scaled_display() {
    let config = SceneConfig {
        picking: true,
        ..SceneConfig::default()
    };
    let mut scene = ready_scene(config);
    scene.resize(800, 600, 2.0);
    scene.load_mesh(&cube(1.0), RED, Vec3::ZERO);

    scene.handle_mouse(MouseEvent::Move { x: 400.0, y: 300.0 });
    scene.render();
    assert!(scene.device().calls.contains(&Call::ReadPixel(800, 600)));
    assert_eq!(scene.hovered(), Some(0));
}

#[test]
fn test_hovered_instanced_volume_uses_highlight_colour() {
    let config = SceneConfig {
        picking: true,
        ..SceneConfig::default()
    };
    let hover = config.theme.hover;
    let mut scene = ready_scene(config);
    let mut instances = InstanceArray::new();
    instances.push(InstanceRecord::new(
        Vec3::new(0.0, 0.0, 0.2),
        Vec3::new(10.0, 0.0, 0.2),
        0.45,
        0.2,
        RED,
    ));
    scene.add_volume(Volume::instanced(RED, instances));

    scene.handle_mouse(MouseEvent::Move { x: 400.0, y: 300.0 });
    scene.render();
    assert_eq!(scene.hovered(), Some(0));

    // Last draw is the shaded pass after the pick.
    let draws = scene.device().volume_draws();
    let Some(Call::DrawVolume {
        color,
        flat,
        override_color,
        ..
    }) = draws.last()
    else {
        panic!("no volume drawn");
    };
    assert_eq!(*color, hover);
    assert!(!*flat);
    assert!(*override_color);

    scene.device_mut().pixel = Some([0, 0, 0, 255]);
    scene.handle_mouse(MouseEvent::Move { x: 10.0, y: 10.0 });
    scene.device_mut().clear_calls();
    scene.render();
    let draws = scene.device().volume_draws();
    assert!(matches!(
        draws.last(),
        Some(Call::DrawVolume { override_color: false, .. })
    ));
}

#[test]
fn test_hover_without_picking_does_nothing() {
    let mut scene = ready_scene(SceneConfig::default());
    scene.load_mesh(&cube(1.0), RED, Vec3::ZERO);
    assert!(!scene.handle_mouse(MouseEvent::Move { x: 10.0, y: 10.0 }));
    scene.render();
    assert!(!scene
        .device()
        .calls
        .iter()
        .any(|c| matches!(c, Call::ReadPixel(..))));
}

#[test]
fn test_left_drag_rotates_with_inverted_sign() {
    let mut scene = ready_scene(SceneConfig::default());
    let azimuth = scene.camera().azimuth();
    let polar = scene.camera().polar();

    scene.handle_mouse(MouseEvent::Down {
        button: MouseButton::Left,
        x: 100.0,
        y: 100.0,
    });
    assert!(scene.handle_mouse(MouseEvent::Move { x: 110.0, y: 104.0 }));

    let s = scene.config().rotate_sensitivity;
    let expected_azimuth = (azimuth - 10.0 * s).rem_euclid(360.0);
    assert!((scene.camera().azimuth() - expected_azimuth).abs() < 1e-4);
    assert!((scene.camera().polar() - (polar - 4.0 * s)).abs() < 1e-4);

    scene.handle_mouse(MouseEvent::Up {
        button: MouseButton::Left,
        x: 110.0,
        y: 104.0,
    });
    let before = scene.camera().azimuth();
    scene.handle_mouse(MouseEvent::Move { x: 200.0, y: 104.0 });
    assert_eq!(scene.camera().azimuth(), before);
}

#[test]
fn test_right_drag_pans() {
    let mut scene = ready_scene(SceneConfig::default());
    let target = scene.camera().target;
    scene.handle_mouse(MouseEvent::Down {
        button: MouseButton::Right,
        x: 0.0,
        y: 0.0,
    });
    scene.handle_mouse(MouseEvent::Move { x: 50.0, y: 0.0 });
    assert_ne!(scene.camera().target, target);
}

#[test]
fn test_wheel_zooms_by_notches() {
    let mut scene = ready_scene(SceneConfig::default());
    assert!(scene.handle_mouse(MouseEvent::Wheel {
        notches: 2.0,
        x: 0.0,
        y: 0.0
    }));
    assert!((scene.camera().zoom_factor() - 1.21).abs() < 1e-5);
}

#[test]
fn test_bounding_box_and_zoom_to_volumes() {
    let mut scene = ready_scene(SceneConfig::default());
    scene.load_mesh(&cube(2.0), RED, Vec3::ZERO);
    scene.load_mesh(&cube(2.0), BLUE, Vec3::new(8.0, 0.0, 0.0));

    let bbox = scene.bounding_box();
    assert_eq!(bbox.min, Vec3::ZERO);
    assert_eq!(bbox.max, Vec3::new(10.0, 2.0, 2.0));

    scene.zoom_to_volumes();
    assert!((scene.camera().target - bbox.center()).length() < 1e-4);
}

#[test]
fn test_clip_range_reaches_draws() {
    let mut scene = ready_scene(SceneConfig::default());
    scene.load_mesh(&cube(1.0), RED, Vec3::ZERO);
    scene.set_clip_range(0.2, 0.6);
    scene.render();
    assert!(matches!(
        scene.device().volume_draws()[0],
        Call::DrawVolume { clip: (min, max), .. } if *min == 0.2 && *max == 0.6
    ));
}

#[test]
fn test_bed_outline_change_rebuilds_statics() {
    let mut scene = ready_scene(SceneConfig::default());
    scene.set_bed_outline(vec![
        Point2::new(0.0, 0.0),
        Point2::new(100.0, 0.0),
        Point2::new(100.0, 100.0),
        Point2::new(0.0, 100.0),
    ]);
    scene.render();
    let calls = &scene.device().calls;
    assert!(calls.contains(&Call::SetStatic(StaticSlot::Ground, 6)));
    assert!(calls.contains(&Call::SetStatic(StaticSlot::BedOutline, 8)));
}
