//! Skyfall: a third-person drop-in viewer. A character falls onto a loaded
//! world under a cinematic camera, lands, and is then walked around with a
//! follow camera.

pub mod animation;
pub mod camera;
pub mod collision;
pub mod config;
pub mod environment;
pub mod game;
pub mod glb;
pub mod input;
pub mod mesh;
pub mod player;
pub mod render;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use animation::{AnimationBlender, AnimationClip, ClipId, ClipLibrary};
pub use camera::{CameraMode, CameraRig};
pub use config::{ConfigError, ViewerConfig};
pub use game::{FrameReport, Viewer};
pub use glb::{AssetError, LoadError, LoadedAssets, load_assets};
pub use input::{InputState, Intents};
pub use player::{Phase, Player};
pub use render::{FrameSink, FrameView, LogSink};
