//! Boundary between the simulation and whatever draws it.
//!
//! The viewer never talks to a GPU directly. Each frame it hands a
//! [`FrameView`] to a [`FrameSink`]; a browser host forwards it to WebGL,
//! the native harness logs it, tests record it.

use glam::{Mat4, Vec3};

use crate::animation::ClipPlayback;
use crate::environment::{Lighting, Particle};
use crate::mesh::Mesh;

/// Everything a renderer needs to draw one frame.
pub struct FrameView<'a> {
    pub frame_index: u64,
    pub character_model: Mat4,
    pub clip_poses: &'a [ClipPlayback],
    pub camera_eye: Vec3,
    pub camera_target: Vec3,
    pub view: Mat4,
    pub lighting: &'a Lighting,
    pub particles: &'a [Particle],
}

pub trait FrameSink {
    /// Receives the static world and the character's bind-pose mesh once,
    /// before the first frame.
    fn upload(&mut self, world: &Mesh, character: &Mesh);

    fn submit(&mut self, frame: &FrameView<'_>);

    /// Drop any GPU or DOM resources. Called once, from `Viewer::destroy`.
    fn release(&mut self);
}

/// Logs a one-line summary every `every` frames.
pub struct LogSink {
    every: u64,
    submitted: u64,
    released: bool,
}

impl LogSink {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            submitted: 0,
            released: false,
        }
    }

    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    pub fn released(&self) -> bool {
        self.released
    }
}

impl FrameSink for LogSink {
    fn upload(&mut self, world: &Mesh, character: &Mesh) {
        log::info!(
            "Uploaded world ({} submeshes, {} triangles, {} textures) and character ({} triangles)",
            world.submeshes.len(),
            world.triangle_count(),
            world.textures.len(),
            character.triangle_count()
        );
    }

    fn submit(&mut self, frame: &FrameView<'_>) {
        self.submitted += 1;
        if frame.frame_index % self.every != 0 {
            return;
        }
        let position = frame.character_model.w_axis.truncate();
        let clips: Vec<String> = frame
            .clip_poses
            .iter()
            .map(|p| format!("{:?}@{:.2}", p.id, p.weight))
            .collect();
        log::info!(
            "frame {}: character {:.2?}, eye {:.2?}, clips [{}], daylight {:.2}, {} particles",
            frame.frame_index,
            position,
            frame.camera_eye,
            clips.join(", "),
            frame.lighting.daylight,
            frame.particles.len()
        );
    }

    fn release(&mut self) {
        self.released = true;
        log::info!("Released after {} frames", self.submitted);
    }
}
