//! Camera state machine: a timed cinematic shot while the character drops in,
//! then a third-person orbit once it has landed.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec3};

use crate::config::CameraTuning;
use crate::player::CharacterBody;

const FOV_Y: f32 = 60.0 * PI / 180.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 2000.0;
/// Horizontal offset from the world center below which the body counts as
/// directly above it.
const CENTERED_RADIUS: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    CinematicFall,
    ThirdPerson,
}

/// Mouse-look input for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LookInput {
    pub active: bool,
    pub delta: (f32, f32),
}

/// Wrap an angle into (-PI, PI].
pub fn wrap_angle(a: f32) -> f32 {
    let wrapped = (a + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Interpolate between two angles along the shorter arc.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    wrap_angle(from + wrap_angle(to - from) * t)
}

fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Offset on a sphere: polar measured from +Y, azimuth around Y from +Z.
fn spherical_offset(radius: f32, polar: f32, azimuth: f32) -> Vec3 {
    Vec3::new(
        radius * polar.sin() * azimuth.sin(),
        radius * polar.cos(),
        radius * polar.sin() * azimuth.cos(),
    )
}

pub struct CameraRig {
    tuning: CameraTuning,
    world_center: Vec3,
    mode: CameraMode,
    polar: f32,
    azimuth: f32,
    cinematic_timer: f32,
    start_azimuth: f32,
    end_azimuth: f32,
    eye: Vec3,
    look_at: Vec3,
}

impl CameraRig {
    pub fn new(tuning: CameraTuning, world_center: Vec3, body: &CharacterBody) -> Self {
        let mut rig = Self {
            tuning,
            world_center,
            mode: CameraMode::CinematicFall,
            polar: tuning.cinematic_start_polar,
            azimuth: 0.0,
            cinematic_timer: 0.0,
            start_azimuth: 0.0,
            end_azimuth: 0.0,
            eye: Vec3::ZERO,
            look_at: Vec3::ZERO,
        };
        rig.reset(body);
        rig
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn cinematic_timer(&self) -> f32 {
        self.cinematic_timer
    }

    pub fn end_azimuth(&self) -> f32 {
        self.end_azimuth
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.look_at, Vec3::Y)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOV_Y, aspect, Z_NEAR, Z_FAR) * self.view_matrix()
    }

    /// Back to the start of the cinematic shot, snapped with no smoothing.
    pub fn reset(&mut self, body: &CharacterBody) {
        self.mode = CameraMode::CinematicFall;
        self.cinematic_timer = 0.0;
        self.start_azimuth = wrap_angle(body.yaw + PI);
        self.end_azimuth = self.end_bearing(body);
        self.azimuth = self.start_azimuth;
        self.polar = self.tuning.cinematic_start_polar;
        let (eye, look_at) = self.cinematic_targets(body, 0.0);
        self.apply(eye, look_at, None);
    }

    /// One-way switch to third person on the first debounced landing.
    pub fn check_landing(&mut self, grounded_debounced: bool) -> bool {
        if self.mode != CameraMode::CinematicFall || !grounded_debounced {
            return false;
        }
        log::info!(
            "Camera: landed after {:.2}s, switching to third person",
            self.cinematic_timer
        );
        self.mode = CameraMode::ThirdPerson;
        self.polar = self.tuning.follow_polar;
        true
    }

    pub fn update(&mut self, dt: f32, body: &CharacterBody, look: LookInput) {
        let (eye, look_at) = match self.mode {
            CameraMode::CinematicFall => {
                let duration = self.tuning.cinematic_duration.max(f32::EPSILON);
                self.cinematic_timer = (self.cinematic_timer + dt).min(duration);
                self.cinematic_targets(body, ease_in_out(self.cinematic_timer / duration))
            }
            CameraMode::ThirdPerson => self.follow_targets(dt, body, look),
        };
        self.apply(eye, look_at, Some(dt));
    }

    /// Fixed for the whole shot. Off-center spawns end on the far side of the
    /// body from the world center so the center stays in frame; centered
    /// spawns sweep by `cinematic_sweep`.
    fn end_bearing(&self, body: &CharacterBody) -> f32 {
        let away = body.position - self.world_center;
        if away.x.hypot(away.z) > CENTERED_RADIUS {
            away.x.atan2(away.z)
        } else {
            wrap_angle(self.start_azimuth + self.tuning.cinematic_sweep)
        }
    }

    fn cinematic_targets(&mut self, body: &CharacterBody, t: f32) -> (Vec3, Vec3) {
        let tuning = &self.tuning;
        self.polar = tuning.cinematic_start_polar
            + (tuning.cinematic_end_polar - tuning.cinematic_start_polar) * t;
        self.azimuth = lerp_angle(self.start_azimuth, self.end_azimuth, t);

        let look_at = body.position.lerp(self.world_center, t);
        let eye = body.position
            + spherical_offset(tuning.cinematic_distance, self.polar, self.azimuth);
        (eye, look_at)
    }

    fn follow_targets(&mut self, dt: f32, body: &CharacterBody, look: LookInput) -> (Vec3, Vec3) {
        let tuning = &self.tuning;
        if look.active {
            let (dx, dy) = look.delta;
            self.azimuth = wrap_angle(self.azimuth - dx * tuning.mouse_sensitivity);
            self.polar -= dy * tuning.mouse_sensitivity;
        } else {
            let t = 1.0 - (-tuning.azimuth_follow_rate * dt).exp();
            self.azimuth = lerp_angle(self.azimuth, body.yaw + PI, t);
        }
        self.polar = self.polar.max(tuning.polar_min).min(tuning.polar_max);

        let look_at = body.position + Vec3::Y * tuning.look_height;
        let eye = look_at + spherical_offset(tuning.follow_distance, self.polar, self.azimuth);
        (eye, look_at)
    }

    /// Exponential smoothing toward the targets; `None` snaps.
    fn apply(&mut self, eye: Vec3, look_at: Vec3, dt: Option<f32>) {
        let s = match dt {
            Some(dt) => 1.0 - self.tuning.smoothing.powf(dt.max(0.0)),
            None => 1.0,
        };
        self.eye = self.eye.lerp(eye, s);
        self.look_at = self.look_at.lerp(look_at, s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocomotionTuning;
    use crate::player::Player;

    fn body_at(position: Vec3) -> CharacterBody {
        Player::new(position, 1.0, LocomotionTuning::default()).body
    }

    fn rig() -> (CameraRig, CharacterBody) {
        let body = body_at(Vec3::new(10.0, 40.0, 0.0));
        (CameraRig::new(CameraTuning::default(), Vec3::ZERO, &body), body)
    }

    #[test]
    fn wrap_keeps_angles_in_half_open_range() {
        assert!((wrap_angle(3.0 * PI + 0.5) - (-PI + 0.5)).abs() < 1e-4);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-5);
        assert!((wrap_angle(0.5) - 0.5).abs() < 1e-6);
        assert!((wrap_angle(-TAU - 0.5) + 0.5).abs() < 1e-5);
    }

    #[test]
    fn angle_lerp_takes_the_short_way_through_180() {
        let from = 170f32.to_radians();
        let to = (-170f32).to_radians();
        let mid = lerp_angle(from, to, 0.5);
        assert!((mid.abs() - PI).abs() < 1e-4, "mid = {}", mid.to_degrees());
        let quarter = lerp_angle(from, to, 0.25);
        assert!((quarter.to_degrees() - 175.0).abs() < 1e-3);
        let end = lerp_angle(from, to, 1.0);
        assert!((end.to_degrees() + 170.0).abs() < 1e-3);
    }

    #[test]
    fn reset_snaps_without_smoothing() {
        let (rig, body) = rig();
        let expected = body.position
            + spherical_offset(
                CameraTuning::default().cinematic_distance,
                rig.polar(),
                rig.azimuth(),
            );
        assert!(rig.eye().distance(expected) < 1e-4);
        assert!(rig.look_at().distance(body.position) < 1e-4);
        assert_eq!(rig.mode(), CameraMode::CinematicFall);
    }

    #[test]
    fn cinematic_reaches_end_pose_and_holds() {
        let (mut rig, body) = rig();
        let tuning = CameraTuning::default();
        for _ in 0..200 {
            rig.update(0.05, &body, LookInput::default());
        }
        assert_eq!(rig.cinematic_timer(), tuning.cinematic_duration);
        assert!((rig.polar() - tuning.cinematic_end_polar).abs() < 1e-5);
        // Character sits on +X of the center, so the camera ends on +X too.
        assert!((rig.azimuth() - PI / 2.0).abs() < 1e-4);
        assert!(rig.look_at().distance(Vec3::ZERO) < 1e-2);
        assert_eq!(rig.mode(), CameraMode::CinematicFall);
    }

    #[test]
    fn centered_spawn_still_sweeps() {
        let body = body_at(Vec3::new(0.0, 40.0, 0.0));
        let mut rig = CameraRig::new(CameraTuning::default(), Vec3::ZERO, &body);
        let start = rig.azimuth();
        let sweep = CameraTuning::default().cinematic_sweep;
        assert!((wrap_angle(rig.end_azimuth() - start) - sweep).abs() < 1e-4);

        for _ in 0..200 {
            rig.update(0.05, &body, LookInput::default());
        }
        assert!((rig.azimuth() - rig.end_azimuth()).abs() < 1e-4);
        assert!((wrap_angle(rig.azimuth() - start)).abs() > 0.5);
    }

    #[test]
    fn small_drift_does_not_move_the_end_bearing() {
        let body = body_at(Vec3::new(0.0, 40.0, 0.0));
        let mut left = CameraRig::new(CameraTuning::default(), Vec3::ZERO, &body);
        let mut right = CameraRig::new(CameraTuning::default(), Vec3::ZERO, &body);
        let mut drift_left = body;
        drift_left.position.x -= 0.01;
        let mut drift_right = body;
        drift_right.position.x += 0.01;
        for _ in 0..35 {
            left.update(0.05, &drift_left, LookInput::default());
            right.update(0.05, &drift_right, LookInput::default());
        }
        assert!((left.azimuth() - right.azimuth()).abs() < 1e-5);
        assert_eq!(left.end_azimuth(), right.end_azimuth());
    }

    #[test]
    fn landing_switch_is_one_way_and_fires_once() {
        let (mut rig, body) = rig();
        assert!(!rig.check_landing(false));
        assert_eq!(rig.mode(), CameraMode::CinematicFall);

        let fired: Vec<bool> = (0..5).map(|_| rig.check_landing(true)).collect();
        assert_eq!(fired, vec![true, false, false, false, false]);
        assert_eq!(rig.mode(), CameraMode::ThirdPerson);

        rig.check_landing(false);
        rig.update(0.016, &body, LookInput::default());
        assert_eq!(rig.mode(), CameraMode::ThirdPerson);

        rig.reset(&body);
        assert_eq!(rig.mode(), CameraMode::CinematicFall);
        assert_eq!(rig.cinematic_timer(), 0.0);
    }

    #[test]
    fn follow_azimuth_tracks_character_yaw() {
        let (mut rig, mut body) = rig();
        rig.check_landing(true);
        body.yaw = 1.0;
        for _ in 0..300 {
            rig.update(0.016, &body, LookInput::default());
        }
        assert!((rig.azimuth() - wrap_angle(1.0 + PI)).abs() < 1e-3);
        let expected_look = body.position + Vec3::Y * CameraTuning::default().look_height;
        assert!(rig.look_at().distance(expected_look) < 1e-2);
    }

    #[test]
    fn inverted_polar_limits_do_not_panic() {
        let body = body_at(Vec3::new(10.0, 40.0, 0.0));
        let tuning = CameraTuning {
            polar_min: 1.4,
            polar_max: 0.3,
            ..Default::default()
        };
        let mut rig = CameraRig::new(tuning, Vec3::ZERO, &body);
        rig.check_landing(true);
        rig.update(0.016, &body, LookInput::default());
        assert_eq!(rig.polar(), 0.3);
    }

    #[test]
    fn mouse_look_drives_angles_and_clamps_polar() {
        let (mut rig, body) = rig();
        rig.check_landing(true);
        let before = rig.azimuth();
        rig.update(
            0.016,
            &body,
            LookInput {
                active: true,
                delta: (100.0, -100_000.0),
            },
        );
        let tuning = CameraTuning::default();
        let expected = wrap_angle(before - 100.0 * tuning.mouse_sensitivity);
        assert!((rig.azimuth() - expected).abs() < 1e-5);
        assert_eq!(rig.polar(), tuning.polar_max);

        rig.update(
            0.016,
            &body,
            LookInput {
                active: true,
                delta: (0.0, 100_000.0),
            },
        );
        assert_eq!(rig.polar(), tuning.polar_min);
    }

    #[test]
    fn smoothing_moves_part_of_the_way() {
        let (mut rig, body) = rig();
        rig.check_landing(true);
        let start = rig.eye();
        rig.update(0.016, &body, LookInput::default());
        let step = rig.eye();
        assert_ne!(start, step);
        let tuning = CameraTuning::default();
        let target = body.position
            + Vec3::Y * tuning.look_height
            + spherical_offset(tuning.follow_distance, rig.polar(), rig.azimuth());
        assert!(step.distance(target) > 0.1);
    }

    #[test]
    fn reset_is_idempotent() {
        let (mut rig, body) = rig();
        rig.check_landing(true);
        rig.update(0.5, &body, LookInput::default());
        rig.reset(&body);
        let once = (rig.mode(), rig.eye(), rig.look_at(), rig.polar(), rig.azimuth());
        rig.reset(&body);
        let twice = (rig.mode(), rig.eye(), rig.look_at(), rig.polar(), rig.azimuth());
        assert_eq!(once, twice);
    }
}
