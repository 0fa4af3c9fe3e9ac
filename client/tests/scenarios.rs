use std::collections::HashMap;

use glam::Vec3;
use skyfall::animation::{AnimationClip, ClipId, ClipLibrary};
use skyfall::camera::CameraMode;
use skyfall::collision::PhysicsWorld;
use skyfall::mesh::{Bounds, ColliderMesh};
use skyfall::player::{Gait, Phase};
use skyfall::{FrameReport, InputState, LogSink, Viewer, ViewerConfig};
use winit::keyboard::KeyCode;

const FEET: f32 = 1.0;

fn floor(center: Vec3, half: f32) -> ColliderMesh {
    let c = center;
    ColliderMesh {
        vertices: vec![
            Vec3::new(c.x - half, c.y, c.z - half),
            Vec3::new(c.x + half, c.y, c.z - half),
            Vec3::new(c.x + half, c.y, c.z + half),
            Vec3::new(c.x - half, c.y, c.z + half),
        ],
        indices: vec![[0, 2, 1], [0, 3, 2]],
    }
}

fn library() -> ClipLibrary {
    let named = [("Idle", 2.0), ("Walk", 1.0), ("Run", 0.8), ("Jump", 0.6)];
    let clips: HashMap<String, AnimationClip> = named
        .into_iter()
        .map(|(name, duration)| {
            (
                name.to_string(),
                AnimationClip {
                    name: name.to_string(),
                    duration,
                },
            )
        })
        .collect();
    ClipLibrary::resolve(&clips)
}

/// Flat floor of half-size `half` centered on the origin at y = 0.
fn viewer_on_floor(half: f32, config: ViewerConfig) -> Viewer<LogSink> {
    let mut bounds = Bounds::EMPTY;
    bounds.include(Vec3::new(-half, 0.0, -half));
    bounds.include(Vec3::new(half, 0.0, half));
    Viewer::from_parts(
        PhysicsWorld::new(&[floor(Vec3::ZERO, half)]).unwrap(),
        bounds,
        FEET,
        library(),
        config,
        LogSink::new(1000),
    )
}

/// Runs frames until the first raw ground contact and returns that frame.
fn run_until_landed(
    viewer: &mut Viewer<LogSink>,
    input: &mut InputState,
    dt: f32,
) -> FrameReport {
    for _ in 0..2000 {
        let report = viewer.frame(dt, input).unwrap();
        if report.step.grounded {
            return report;
        }
    }
    panic!("never landed");
}

/// Coarse frames so timer thresholds land on exact multiples. Landings from
/// the spawn drop still use small steps.
fn coarse_steps() -> ViewerConfig {
    ViewerConfig {
        max_frame_delta: 0.125,
        ..Default::default()
    }
}

#[test]
fn spawn_drop_lands_and_switches_jump_to_idle() {
    let mut viewer = viewer_on_floor(50.0, ViewerConfig::default());
    let mut input = InputState::new();
    let cfg = ViewerConfig::default();

    let spawn = viewer.player().body.position;
    assert_eq!(spawn, Vec3::new(0.0, cfg.spawn_altitude, 0.0));
    assert_eq!(
        viewer.player().state.vertical_velocity,
        cfg.locomotion.spawn_vertical_velocity
    );
    assert_eq!(viewer.animation().current(), Some(ClipId::Jump));

    let landing = run_until_landed(&mut viewer, &mut input, 0.02);
    assert!(landing.step.just_landed);
    assert_eq!(viewer.player().state.vertical_velocity, 0.0);
    assert!(viewer.player().body.feet_position().y.abs() < 1e-4);
    assert_eq!(viewer.animation().current(), Some(ClipId::Idle));
    assert_eq!(viewer.player().state.phase, Phase::Grounded(Gait::Idle));
}

#[test]
fn walking_turns_into_sprint_exactly_at_threshold() {
    let mut viewer = viewer_on_floor(200.0, coarse_steps());
    let mut input = InputState::new();
    run_until_landed(&mut viewer, &mut input, 0.02);
    viewer.frame(0.125, &mut input);

    let threshold = viewer.config().locomotion.walk_to_sprint_time;
    let frames_to_sprint = (threshold / 0.125) as usize;

    input.handle_key_press(KeyCode::KeyW);
    for _ in 0..frames_to_sprint - 1 {
        viewer.frame(0.125, &mut input);
        assert!(!viewer.player().state.sprint_intent);
        assert_eq!(viewer.animation().current(), Some(ClipId::Walk));
    }
    viewer.frame(0.125, &mut input);
    assert!(viewer.player().state.sprint_intent);
    assert_eq!(viewer.animation().current(), Some(ClipId::Sprint));
    assert!(viewer.player().flags().sprinting);
}

#[test]
fn sprint_survives_a_jump_and_camera_switch_fires_once() {
    let mut viewer = viewer_on_floor(200.0, coarse_steps());
    let mut input = InputState::new();
    let mut switches = 0;

    let landing = run_until_landed(&mut viewer, &mut input, 0.02);
    switches += landing.camera_switched as u32;

    input.handle_key_press(KeyCode::KeyW);
    for _ in 0..12 {
        switches += viewer.frame(0.125, &mut input).unwrap().camera_switched as u32;
    }
    assert!(viewer.player().state.sprint_intent);

    input.handle_key_press(KeyCode::Space);
    switches += viewer.frame(0.125, &mut input).unwrap().camera_switched as u32;
    input.handle_key_release(KeyCode::Space);
    assert!(viewer.player().flags().jumping);
    assert_eq!(viewer.animation().current(), Some(ClipId::Jump));

    let mut airborne_frames = 0;
    loop {
        let report = viewer.frame(0.125, &mut input).unwrap();
        switches += report.camera_switched as u32;
        if report.step.grounded {
            break;
        }
        airborne_frames += 1;
        assert!(viewer.player().state.sprint_intent);
        assert!(airborne_frames < 50);
    }
    assert!(airborne_frames > 0);
    assert!(viewer.player().state.sprint_intent);
    assert_eq!(viewer.animation().current(), Some(ClipId::Sprint));
    assert_eq!(switches, 1);
    assert_eq!(viewer.camera().mode(), CameraMode::ThirdPerson);
}

#[test]
fn falling_into_the_void_respawns_with_cinematic_camera() {
    let mut viewer = viewer_on_floor(5.0, ViewerConfig::default());
    let mut input = InputState::new();
    run_until_landed(&mut viewer, &mut input, 0.05);
    for _ in 0..10 {
        viewer.frame(0.05, &mut input);
    }
    assert_eq!(viewer.camera().mode(), CameraMode::ThirdPerson);

    input.handle_key_press(KeyCode::KeyW);
    let mut respawned = false;
    for _ in 0..2000 {
        let report = viewer.frame(0.05, &mut input).unwrap();
        if report.step.respawned {
            respawned = true;
            break;
        }
    }
    assert!(respawned);

    let player = viewer.player();
    assert_eq!(player.body.position, player.spawn_position());
    assert_eq!(
        player.state.vertical_velocity,
        player.tuning().spawn_vertical_velocity
    );
    let flags = player.flags();
    assert!(!flags.jumping && !flags.walking && !flags.sprinting);
    assert!(flags.falling);
    assert_eq!(viewer.camera().mode(), CameraMode::CinematicFall);
    assert_eq!(viewer.animation().current(), Some(ClipId::Jump));
}

#[test]
fn restart_twice_matches_restart_once() {
    let mut viewer = viewer_on_floor(50.0, ViewerConfig::default());
    let mut input = InputState::new();
    run_until_landed(&mut viewer, &mut input, 0.02);
    input.handle_key_press(KeyCode::KeyW);
    for _ in 0..30 {
        viewer.frame(0.02, &mut input);
    }

    let snapshot = |v: &Viewer<LogSink>| {
        (
            v.player().body,
            v.player().state,
            v.camera().mode(),
            v.camera().eye(),
            v.camera().look_at(),
            v.animation().current(),
        )
    };
    viewer.restart();
    let once = snapshot(&viewer);
    viewer.restart();
    let twice = snapshot(&viewer);
    assert_eq!(once, twice);
    assert_eq!(once.2, CameraMode::CinematicFall);
    assert_eq!(once.0.position, viewer.player().spawn_position());
}

#[test]
fn destroy_releases_once_and_halts_the_loop() {
    let mut viewer = viewer_on_floor(50.0, ViewerConfig::default());
    let mut input = InputState::new();
    viewer.frame(0.016, &mut input);
    assert!(viewer.destroy());
    assert!(!viewer.destroy());
    assert!(viewer.sink().released());
    assert_eq!(viewer.sink().submitted(), 1);
    assert!(viewer.frame(0.016, &mut input).is_none());
    assert_eq!(viewer.sink().submitted(), 1);
}

#[test]
fn mouse_look_drives_the_follow_camera() {
    let mut viewer = viewer_on_floor(50.0, ViewerConfig::default());
    let mut input = InputState::new();
    run_until_landed(&mut viewer, &mut input, 0.02);
    viewer.frame(0.02, &mut input);
    let before = viewer.camera().azimuth();

    input.cursor_grabbed = true;
    input.handle_mouse_move(200.0, 0.0);
    viewer.frame(0.02, &mut input);
    assert!((viewer.camera().azimuth() - before).abs() > 0.1);

    // The delta is consumed; the angle holds while the mouse is still.
    let held = viewer.camera().azimuth();
    viewer.frame(0.02, &mut input);
    assert!((viewer.camera().azimuth() - held).abs() < 1e-6);
}
