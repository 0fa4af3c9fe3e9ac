//! Character body and the locomotion state machine.
//!
//! The primary phase is a tagged variant (grounded gait vs. airborne phase);
//! the sprint intent is kept beside it so it survives jumps and falls.

use glam::{Mat4, Quat, Vec3};

use crate::animation::{AnimationBlender, ClipId};
use crate::collision::{GroundHit, GroundSensor, PhysicsWorld};
use crate::config::LocomotionTuning;
use crate::input::Intents;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gait {
    Idle,
    Moving,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AirPhase {
    /// Stepped off an edge, still inside the grounded buffer.
    Leaving,
    Jumping,
    Falling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Grounded(Gait),
    Airborne(AirPhase),
}

impl Phase {
    pub fn is_airborne(self) -> bool {
        matches!(self, Phase::Airborne(_))
    }
}

/// Flat view of the phase for hosts that expect independent booleans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocomotionFlags {
    pub idle: bool,
    pub walking: bool,
    pub sprinting: bool,
    pub jumping: bool,
    pub falling: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocomotionState {
    pub vertical_velocity: f32,
    pub time_since_grounded: f32,
    pub phase: Phase,
    pub sprint_intent: bool,
    pub walk_to_sprint_timer: f32,
    /// Seconds since the current jump started.
    pub jump_time: f32,
}

impl LocomotionState {
    fn spawn(tuning: &LocomotionTuning) -> Self {
        Self {
            vertical_velocity: tuning.spawn_vertical_velocity,
            // Not debounced-grounded until the first real contact.
            time_since_grounded: tuning.grounded_buffer_time,
            phase: Phase::Airborne(AirPhase::Falling),
            sprint_intent: false,
            walk_to_sprint_timer: 0.0,
            jump_time: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterBody {
    pub position: Vec3,
    pub yaw: f32,
    /// Forward lean applied while airborne.
    pub tilt: f32,
    feet_offset: f32,
}

impl CharacterBody {
    pub fn feet_offset(&self) -> f32 {
        self.feet_offset
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    pub fn feet_position(&self) -> Vec3 {
        self.position - Vec3::Y * self.feet_offset
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(
            Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.tilt),
            self.position,
        )
    }
}

/// Edge triggers and sensor output from one locomotion step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    pub ground: GroundHit,
    pub grounded: bool,
    pub just_left_ground: bool,
    pub just_landed: bool,
    pub respawned: bool,
}

pub struct Player {
    pub body: CharacterBody,
    pub state: LocomotionState,
    sensor: GroundSensor,
    tuning: LocomotionTuning,
    spawn_position: Vec3,
    spawn_yaw: f32,
}

impl Player {
    pub fn new(spawn_position: Vec3, feet_offset: f32, tuning: LocomotionTuning) -> Self {
        Self {
            body: CharacterBody {
                position: spawn_position,
                yaw: 0.0,
                tilt: 0.0,
                feet_offset,
            },
            state: LocomotionState::spawn(&tuning),
            sensor: GroundSensor::new(&tuning, feet_offset),
            tuning,
            spawn_position,
            spawn_yaw: 0.0,
        }
    }

    pub fn spawn_position(&self) -> Vec3 {
        self.spawn_position
    }

    pub fn tuning(&self) -> &LocomotionTuning {
        &self.tuning
    }

    /// Grounded within the last buffer window; what the camera keys off.
    pub fn grounded_debounced(&self) -> bool {
        self.state.time_since_grounded < self.tuning.grounded_buffer_time
    }

    /// A jump counts as falling once it is past the grace window, even
    /// before the fall clip takes over.
    pub fn flags(&self) -> LocomotionFlags {
        let phase = self.state.phase;
        let jumping = phase == Phase::Airborne(AirPhase::Jumping);
        LocomotionFlags {
            idle: phase == Phase::Grounded(Gait::Idle),
            walking: phase == Phase::Grounded(Gait::Moving),
            sprinting: self.state.sprint_intent,
            jumping,
            falling: phase == Phase::Airborne(AirPhase::Falling)
                || (jumping && self.state.jump_time >= self.tuning.jump_grace_time),
        }
    }

    /// Back to spawn: position, velocity, phase and the airborne clip.
    pub fn reset(&mut self, animation: &mut AnimationBlender) {
        self.body.position = self.spawn_position;
        self.body.yaw = self.spawn_yaw;
        self.body.tilt = 0.0;
        self.state = LocomotionState::spawn(&self.tuning);
        animation.snap_to(ClipId::Jump);
    }

    pub fn update(
        &mut self,
        dt: f32,
        intents: &Intents,
        world: &PhysicsWorld,
        animation: &mut AnimationBlender,
    ) -> StepReport {
        let t = self.tuning;
        let was_grounded = self.grounded_debounced();

        let ground = self.sensor.probe(world, self.body.position);
        // A contact while still rising from a jump is not a landing.
        let grounded = ground.grounded && self.state.vertical_velocity <= 0.0;

        if grounded {
            self.state.time_since_grounded = 0.0;
            if self.state.phase.is_airborne() {
                self.state.phase = Phase::Grounded(Gait::Idle);
                self.body.tilt = 0.0;
            }
        } else {
            self.state.time_since_grounded += dt;
            match self.state.phase {
                Phase::Airborne(AirPhase::Jumping) => self.state.jump_time += dt,
                Phase::Grounded(_) => self.state.phase = Phase::Airborne(AirPhase::Leaving),
                Phase::Airborne(_) => {}
            }
            if self.state.phase == Phase::Airborne(AirPhase::Leaving)
                && self.state.time_since_grounded >= t.grounded_buffer_time
            {
                self.state.phase = Phase::Airborne(AirPhase::Falling);
            }
        }

        let just_left_ground = !grounded && was_grounded;
        let just_landed = grounded && !was_grounded;

        if just_left_ground
            && animation
                .current()
                .is_some_and(ClipId::is_ground_locomotion)
        {
            animation.play(ClipId::Idle);
        }

        let mut jumped = false;
        if grounded && intents.jump {
            self.state.vertical_velocity = t.jump_force;
            self.state.phase = Phase::Airborne(AirPhase::Jumping);
            self.state.jump_time = 0.0;
            animation.play(ClipId::Jump);
            jumped = true;
        }
        let airborne = !grounded || jumped;

        self.move_horizontal(dt, intents, airborne);
        self.integrate_vertical(dt, grounded && !jumped, &ground);

        if airborne {
            self.update_airborne_clip(animation);
        } else {
            self.update_ground_gait(dt, intents, animation);
        }

        let respawned = self.body.position.y < t.void_threshold;
        if respawned {
            log::info!(
                "Character fell below {:.1} at {:?}, respawning",
                t.void_threshold,
                self.body.position
            );
            self.reset(animation);
        }

        StepReport {
            ground,
            grounded,
            just_left_ground,
            just_landed,
            respawned,
        }
    }

    fn move_horizontal(&mut self, dt: f32, intents: &Intents, airborne: bool) {
        let turn = intents.left as i8 - intents.right as i8;
        self.body.yaw += f32::from(turn) * self.tuning.turn_speed * dt;

        let drive = intents.forward as i8 - intents.backward as i8;
        if drive == 0 {
            if airborne {
                self.body.tilt = 0.0;
            }
            return;
        }
        let mut speed = if self.state.sprint_intent {
            self.tuning.sprint_speed
        } else {
            self.tuning.walk_speed
        };
        if airborne {
            speed *= self.tuning.air_control;
            self.body.tilt = self.tuning.air_tilt * f32::from(drive);
        }
        self.body.position += self.body.forward() * f32::from(drive) * speed * dt;
    }

    fn integrate_vertical(&mut self, dt: f32, grounded: bool, ground: &GroundHit) {
        let t = &self.tuning;
        self.state.vertical_velocity =
            (self.state.vertical_velocity + t.gravity * dt).max(t.terminal_velocity);

        if grounded && self.state.vertical_velocity < 0.0 {
            self.state.vertical_velocity = 0.0;
            if let Some(point) = ground.point {
                self.body.position.y = point.y + self.body.feet_offset;
            }
        } else {
            self.body.position.y += self.state.vertical_velocity * dt;
        }
    }

    fn update_airborne_clip(&mut self, animation: &mut AnimationBlender) {
        if self.state.phase == Phase::Airborne(AirPhase::Jumping)
            && animation.current() == Some(ClipId::Jump)
            && self.state.jump_time > self.tuning.fall_clip_delay
            && self.state.vertical_velocity < 0.0
        {
            self.state.phase = Phase::Airborne(AirPhase::Falling);
            animation.play(ClipId::Fall);
        }
    }

    fn update_ground_gait(&mut self, dt: f32, intents: &Intents, animation: &mut AnimationBlender) {
        if intents.is_moving() {
            if !self.state.sprint_intent {
                self.state.walk_to_sprint_timer += dt;
                if self.state.walk_to_sprint_timer >= self.tuning.walk_to_sprint_time {
                    self.state.sprint_intent = true;
                }
            }
            self.state.phase = Phase::Grounded(Gait::Moving);
            animation.play(if self.state.sprint_intent {
                ClipId::Sprint
            } else {
                ClipId::Walk
            });
        } else {
            animation.play(ClipId::Idle);
            self.state.walk_to_sprint_timer = 0.0;
            self.state.sprint_intent = false;
            self.state.phase = Phase::Grounded(Gait::Idle);
        }
    }
}
