use serde::Deserialize;

// Character physics
pub const GRAVITY: f32 = -30.0;
pub const TERMINAL_VELOCITY: f32 = -50.0;
pub const JUMP_FORCE: f32 = 10.0;
pub const SPAWN_VERTICAL_VELOCITY: f32 = -1.0; // settle speed on spawn/reset
pub const WALK_SPEED: f32 = 4.0;
pub const SPRINT_SPEED: f32 = 9.0;
pub const TURN_SPEED: f32 = 2.5; // radians per second
pub const AIR_CONTROL: f32 = 0.4;
pub const AIR_TILT: f32 = 0.15; // radians of forward lean while airborne

// Ground detection
pub const PROBE_HEIGHT: f32 = 3.0;
pub const GROUND_TOLERANCE: f32 = 0.1;
pub const PROBE_RANGE: f32 = 500.0;
pub const GROUNDED_BUFFER_TIME: f32 = 0.2;

// Locomotion timing
pub const JUMP_GRACE_TIME: f32 = 0.3;
pub const FALL_CLIP_DELAY: f32 = 0.4;
pub const WALK_TO_SPRINT_TIME: f32 = 1.0;
pub const VOID_THRESHOLD: f32 = -50.0;

// Animation
pub const CROSS_FADE_DURATION: f32 = 0.25;

// Spawn
pub const SPAWN_ALTITUDE: f32 = 40.0; // above the top of the world bounds
pub const MAX_FRAME_DELTA: f32 = 0.05;

// Camera
pub const CINEMATIC_DURATION: f32 = 3.5;
pub const CINEMATIC_DISTANCE: f32 = 18.0;
pub const CINEMATIC_START_POLAR: f32 = 0.25;
pub const CINEMATIC_END_POLAR: f32 = 1.15;
pub const CINEMATIC_SWEEP: f32 = 1.2; // radians of orbit when spawning over the center
pub const FOLLOW_DISTANCE: f32 = 6.0;
pub const FOLLOW_POLAR: f32 = 1.2;
pub const LOOK_HEIGHT: f32 = 1.5;
pub const POLAR_MIN: f32 = 0.35;
pub const POLAR_MAX: f32 = 1.45; // stays above the horizon
pub const CAMERA_SMOOTHING: f32 = 0.002; // fraction of the gap left after one second
pub const AZIMUTH_FOLLOW_RATE: f32 = 4.0;
pub const MOUSE_SENSITIVITY: f32 = 0.002;

// Environment
pub const DAY_LENGTH: f32 = 240.0; // seconds per full day/night cycle
pub const START_TIME_OF_DAY: f32 = 0.3;
pub const SHADOW_EXTENT: f32 = 30.0;
pub const MAX_PARTICLES: usize = 512;
pub const LANDING_BURST: usize = 24;
pub const AMBIENT_PARTICLE_RATE: f32 = 12.0; // per second

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocomotionTuning {
    pub gravity: f32,
    pub terminal_velocity: f32,
    pub jump_force: f32,
    pub spawn_vertical_velocity: f32,
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub turn_speed: f32,
    pub air_control: f32,
    pub air_tilt: f32,
    pub probe_height: f32,
    pub ground_tolerance: f32,
    pub probe_range: f32,
    pub grounded_buffer_time: f32,
    pub jump_grace_time: f32,
    pub fall_clip_delay: f32,
    pub walk_to_sprint_time: f32,
    pub void_threshold: f32,
}

impl Default for LocomotionTuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            terminal_velocity: TERMINAL_VELOCITY,
            jump_force: JUMP_FORCE,
            spawn_vertical_velocity: SPAWN_VERTICAL_VELOCITY,
            walk_speed: WALK_SPEED,
            sprint_speed: SPRINT_SPEED,
            turn_speed: TURN_SPEED,
            air_control: AIR_CONTROL,
            air_tilt: AIR_TILT,
            probe_height: PROBE_HEIGHT,
            ground_tolerance: GROUND_TOLERANCE,
            probe_range: PROBE_RANGE,
            grounded_buffer_time: GROUNDED_BUFFER_TIME,
            jump_grace_time: JUMP_GRACE_TIME,
            fall_clip_delay: FALL_CLIP_DELAY,
            walk_to_sprint_time: WALK_TO_SPRINT_TIME,
            void_threshold: VOID_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    pub cinematic_duration: f32,
    pub cinematic_distance: f32,
    pub cinematic_start_polar: f32,
    pub cinematic_end_polar: f32,
    pub cinematic_sweep: f32,
    pub follow_distance: f32,
    pub follow_polar: f32,
    pub look_height: f32,
    pub polar_min: f32,
    pub polar_max: f32,
    pub smoothing: f32,
    pub azimuth_follow_rate: f32,
    pub mouse_sensitivity: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            cinematic_duration: CINEMATIC_DURATION,
            cinematic_distance: CINEMATIC_DISTANCE,
            cinematic_start_polar: CINEMATIC_START_POLAR,
            cinematic_end_polar: CINEMATIC_END_POLAR,
            cinematic_sweep: CINEMATIC_SWEEP,
            follow_distance: FOLLOW_DISTANCE,
            follow_polar: FOLLOW_POLAR,
            look_height: LOOK_HEIGHT,
            polar_min: POLAR_MIN,
            polar_max: POLAR_MAX,
            smoothing: CAMERA_SMOOTHING,
            azimuth_follow_rate: AZIMUTH_FOLLOW_RATE,
            mouse_sensitivity: MOUSE_SENSITIVITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnvironmentTuning {
    pub day_length: f32,
    pub start_time_of_day: f32,
    pub shadow_extent: f32,
    pub max_particles: usize,
    pub landing_burst: usize,
    pub ambient_particle_rate: f32,
    /// Particle RNG seed; a random one per viewer when unset.
    pub seed: Option<u64>,
}

impl Default for EnvironmentTuning {
    fn default() -> Self {
        Self {
            day_length: DAY_LENGTH,
            start_time_of_day: START_TIME_OF_DAY,
            shadow_extent: SHADOW_EXTENT,
            max_particles: MAX_PARTICLES,
            landing_burst: LANDING_BURST,
            ambient_particle_rate: AMBIENT_PARTICLE_RATE,
            seed: None,
        }
    }
}

/// Per-viewer settings. Every field falls back to the constants above, so a
/// JSON document only needs to name what it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub locomotion: LocomotionTuning,
    pub camera: CameraTuning,
    pub environment: EnvironmentTuning,
    pub spawn_altitude: f32,
    pub max_frame_delta: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            locomotion: LocomotionTuning::default(),
            camera: CameraTuning::default(),
            environment: EnvironmentTuning::default(),
            spawn_altitude: SPAWN_ALTITUDE,
            max_frame_delta: MAX_FRAME_DELTA,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ViewerConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if !(self.max_frame_delta > 0.0) {
            return invalid(format!(
                "max_frame_delta must be positive, got {}",
                self.max_frame_delta
            ));
        }
        let camera = &self.camera;
        if !(camera.polar_min <= camera.polar_max) {
            return invalid(format!(
                "camera.polar_min ({}) exceeds camera.polar_max ({})",
                camera.polar_min, camera.polar_max
            ));
        }
        if !(0.0..=1.0).contains(&camera.smoothing) {
            return invalid(format!(
                "camera.smoothing must be within [0, 1], got {}",
                camera.smoothing
            ));
        }
        let locomotion = &self.locomotion;
        if !(locomotion.grounded_buffer_time > 0.0) {
            return invalid(format!(
                "locomotion.grounded_buffer_time must be positive, got {}",
                locomotion.grounded_buffer_time
            ));
        }
        if !(locomotion.terminal_velocity < 0.0) {
            return invalid(format!(
                "locomotion.terminal_velocity must be negative, got {}",
                locomotion.terminal_velocity
            ));
        }
        if self.environment.day_length < 0.0 {
            return invalid(format!(
                "environment.day_length must not be negative, got {}",
                self.environment.day_length
            ));
        }
        Ok(())
    }
}
