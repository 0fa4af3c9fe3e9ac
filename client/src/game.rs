use glam::Vec3;
use rand::Rng;
use web_time::Instant;

use crate::animation::{AnimationBlender, ClipLibrary};
use crate::camera::{CameraRig, LookInput};
use crate::collision::PhysicsWorld;
use crate::config::ViewerConfig;
use crate::environment::Environment;
use crate::glb::{LoadError, LoadedAssets};
use crate::input::InputState;
use crate::mesh::Bounds;
use crate::player::{Player, StepReport};
use crate::render::{FrameSink, FrameView};

/// What happened during one simulated frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    pub dt: f32,
    pub step: StepReport,
    pub camera_switched: bool,
}

pub struct Viewer<S: FrameSink> {
    config: ViewerConfig,
    physics: PhysicsWorld,
    world_bounds: Bounds,
    player: Player,
    animation: AnimationBlender,
    camera: CameraRig,
    environment: Environment,
    sink: S,
    frame_index: u64,
    last_update: Instant,
    destroyed: bool,
}

/// Above the middle of the world, `altitude` over its highest point.
pub fn spawn_point(world_bounds: &Bounds, altitude: f32) -> Vec3 {
    let center = world_bounds.center();
    Vec3::new(center.x, world_bounds.max.y + altitude, center.z)
}

impl<S: FrameSink> Viewer<S> {
    /// Builds the viewer from fully loaded assets and hands their meshes to
    /// the sink. Nothing is kept if the world has no usable collision geometry.
    pub fn new(
        assets: LoadedAssets,
        config: ViewerConfig,
        mut sink: S,
    ) -> Result<Self, LoadError> {
        let physics = PhysicsWorld::new(&assets.world.colliders).map_err(LoadError::map_load)?;
        let library = ClipLibrary::resolve(&assets.character.clips);
        sink.upload(&assets.world.mesh, &assets.character.mesh);
        Ok(Self::from_parts(
            physics,
            assets.world.bounds,
            assets.character.feet_offset,
            library,
            config,
            sink,
        ))
    }

    /// Assembles a viewer from already-built parts. No meshes reach the
    /// sink on this path.
    pub fn from_parts(
        physics: PhysicsWorld,
        world_bounds: Bounds,
        feet_offset: f32,
        library: ClipLibrary,
        config: ViewerConfig,
        sink: S,
    ) -> Self {
        let spawn = spawn_point(&world_bounds, config.spawn_altitude);
        let mut animation = AnimationBlender::new(library);
        let mut player = Player::new(spawn, feet_offset, config.locomotion);
        player.reset(&mut animation);
        let camera = CameraRig::new(config.camera, world_bounds.center(), &player.body);
        let seed = config
            .environment
            .seed
            .unwrap_or_else(|| rand::rng().random());
        let environment = Environment::new(config.environment, seed);

        log::info!(
            "Viewer ready: spawn {:?}, {} colliders, {} clips",
            spawn,
            physics.collider_count(),
            animation.library().len()
        );

        Self {
            config,
            physics,
            world_bounds,
            player,
            animation,
            camera,
            environment,
            sink,
            frame_index: 0,
            last_update: Instant::now(),
            destroyed: false,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn animation(&self) -> &AnimationBlender {
        &self.animation
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn world_bounds(&self) -> Bounds {
        self.world_bounds
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Advance by wall-clock time since the previous tick.
    pub fn tick(&mut self, input: &mut InputState) -> Option<FrameReport> {
        let now = Instant::now();
        let dt = (now - self.last_update).as_secs_f32();
        self.last_update = now;
        self.frame(dt, input)
    }

    /// One frame: locomotion, then camera, then environment, animation and
    /// the sink. Returns `None` once the viewer is destroyed.
    pub fn frame(&mut self, dt: f32, input: &mut InputState) -> Option<FrameReport> {
        if self.destroyed {
            return None;
        }
        let dt = dt.max(0.0).min(self.config.max_frame_delta.max(0.0));
        let intents = input.intents();
        let look = LookInput {
            active: intents.mouse_look_active,
            delta: input.consume_mouse_delta(),
        };

        let step = self
            .player
            .update(dt, &intents, &self.physics, &mut self.animation);
        if step.respawned {
            self.camera.reset(&self.player.body);
        }

        let grounded = self.player.grounded_debounced();
        let camera_switched = self.camera.check_landing(grounded);
        self.camera.update(dt, &self.player.body, look);

        self.environment
            .update(dt, self.player.body.feet_position(), grounded);
        self.animation.update(dt);

        let poses = self.animation.poses();
        self.sink.submit(&FrameView {
            frame_index: self.frame_index,
            character_model: self.player.body.model_matrix(),
            clip_poses: &poses,
            camera_eye: self.camera.eye(),
            camera_target: self.camera.look_at(),
            view: self.camera.view_matrix(),
            lighting: self.environment.lighting(),
            particles: self.environment.particles(),
        });
        self.frame_index += 1;

        Some(FrameReport {
            dt,
            step,
            camera_switched,
        })
    }

    /// Back to the spawn drop with the cinematic camera.
    pub fn restart(&mut self) {
        if self.destroyed {
            return;
        }
        self.player.reset(&mut self.animation);
        self.camera.reset(&self.player.body);
        self.environment.reset();
        self.last_update = Instant::now();
        log::info!("Restarted at {:?}", self.player.spawn_position());
    }

    /// Releases the sink and stops further frames. Returns false if the
    /// viewer was already destroyed.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        self.sink.release();
        log::info!("Viewer destroyed after {} frames", self.frame_index);
        true
    }
}
