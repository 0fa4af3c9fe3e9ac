//! JavaScript entry points. The page owns the canvas and the
//! requestAnimationFrame loop; it feeds input in and reads meshes and transforms out.

use glam::Mat4;
use wasm_bindgen::prelude::*;

use crate::animation::ClipPlayback;
use crate::camera::CameraMode;
use crate::config::ViewerConfig;
use crate::environment::Lighting;
use crate::game::Viewer;
use crate::glb::load_assets;
use crate::input::{InputState, TouchControls, key_from_dom_code};
use crate::mesh::{Mesh, SubMesh};
use crate::render::{FrameSink, FrameView};

#[wasm_bindgen(start)]
pub fn start() {
    std::panic::set_hook(Box::new(|info| {
        web_sys::console::error_1(&info.to_string().into())
    }));
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
}

/// Keeps the latest frame around for the page to read back.
#[derive(Default)]
struct SnapshotSink {
    world: Mesh,
    character: Mesh,
    model: Mat4,
    view: Mat4,
    poses: Vec<ClipPlayback>,
    lighting: Option<Lighting>,
    particles: Vec<f32>,
}

impl FrameSink for SnapshotSink {
    fn upload(&mut self, world: &Mesh, character: &Mesh) {
        self.world = world.clone();
        self.character = character.clone();
    }

    fn submit(&mut self, frame: &FrameView<'_>) {
        self.model = frame.character_model;
        self.view = frame.view;
        self.poses.clear();
        self.poses.extend_from_slice(frame.clip_poses);
        self.lighting = Some(*frame.lighting);
        self.particles.clear();
        for p in frame.particles {
            self.particles
                .extend_from_slice(&[p.position.x, p.position.y, p.position.z, p.size, p.life]);
        }
    }

    fn release(&mut self) {
        *self = Self::default();
    }
}

#[wasm_bindgen]
pub struct WebViewer {
    viewer: Viewer<SnapshotSink>,
    input: InputState,
}

#[wasm_bindgen]
impl WebViewer {
    /// `config_json` may override any subset of the tuning values.
    #[wasm_bindgen(constructor)]
    pub fn new(
        world: &[u8],
        character: &[u8],
        config_json: Option<String>,
    ) -> Result<WebViewer, JsError> {
        let config = match config_json.as_deref() {
            Some(text) => {
                ViewerConfig::from_json(text).map_err(|e| JsError::new(&e.to_string()))?
            }
            None => ViewerConfig::default(),
        };
        let assets = load_assets(world, character).map_err(|e| {
            log::error!("{}", e);
            JsError::new(&e.to_string())
        })?;
        let viewer = Viewer::new(assets, config, SnapshotSink::default())
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self {
            viewer,
            input: InputState::new(),
        })
    }

    pub fn key_down(&mut self, code: &str) {
        if let Some(key) = key_from_dom_code(code) {
            self.input.handle_key_press(key);
        }
    }

    pub fn key_up(&mut self, code: &str) {
        if let Some(key) = key_from_dom_code(code) {
            self.input.handle_key_release(key);
        }
    }

    pub fn mouse_move(&mut self, dx: f32, dy: f32) {
        self.input.handle_mouse_move(dx, dy);
    }

    pub fn set_mouse_look(&mut self, active: bool) {
        self.input.cursor_grabbed = active;
    }

    pub fn set_touch(&mut self, stick_x: f32, stick_y: f32, jump: bool) {
        self.input.touch = Some(TouchControls {
            stick: (stick_x, stick_y),
            jump,
        });
    }

    pub fn clear_touch(&mut self) {
        self.input.touch = None;
    }

    /// Page lost focus: nothing stays held.
    pub fn blur(&mut self) {
        self.input.release_all();
    }

    /// Returns false once destroyed so the page can stop scheduling frames.
    pub fn frame(&mut self, dt: f32) -> bool {
        self.viewer.frame(dt, &mut self.input).is_some()
    }

    pub fn restart(&mut self) {
        self.viewer.restart();
    }

    pub fn destroy(&mut self) -> bool {
        self.viewer.destroy()
    }

    pub fn player_position(&self) -> Vec<f32> {
        self.viewer.player().body.position.to_array().to_vec()
    }

    pub fn grounded(&self) -> bool {
        self.viewer.player().grounded_debounced()
    }

    pub fn camera_eye(&self) -> Vec<f32> {
        self.viewer.camera().eye().to_array().to_vec()
    }

    pub fn camera_look_at(&self) -> Vec<f32> {
        self.viewer.camera().look_at().to_array().to_vec()
    }

    pub fn third_person(&self) -> bool {
        self.viewer.camera().mode() == CameraMode::ThirdPerson
    }

    pub fn model_matrix(&self) -> Vec<f32> {
        self.viewer.sink().model.to_cols_array().to_vec()
    }

    pub fn view_matrix(&self) -> Vec<f32> {
        self.viewer.sink().view.to_cols_array().to_vec()
    }

    /// Active clip names and blend weights as `name:weight` pairs.
    pub fn clip_weights(&self) -> Vec<String> {
        let library = self.viewer.animation().library();
        self.viewer
            .sink()
            .poses
            .iter()
            .filter_map(|p| library.get(p.id).map(|c| format!("{}:{:.3}", c.name, p.weight)))
            .collect()
    }

    /// `[sun.x, sun.y, sun.z, daylight, fog_near, fog_far, bloom]`
    pub fn lighting(&self) -> Vec<f32> {
        match &self.viewer.sink().lighting {
            Some(l) => vec![
                l.sun_direction.x,
                l.sun_direction.y,
                l.sun_direction.z,
                l.daylight,
                l.fog_near,
                l.fog_far,
                l.bloom_strength,
            ],
            None => Vec::new(),
        }
    }

    /// Number of submeshes in the world (`character == false`) or the
    /// character mesh.
    pub fn submesh_count(&self, character: bool) -> usize {
        self.mesh(character).submeshes.len()
    }

    /// Interleaved `position, tex_coord, normal`: eight floats per vertex.
    pub fn submesh_vertices(&self, character: bool, index: usize) -> Vec<f32> {
        self.submesh(character, index)
            .map(|s| {
                s.vertices
                    .iter()
                    .flat_map(|v| {
                        v.position
                            .into_iter()
                            .chain(v.tex_coord)
                            .chain(v.normal)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn submesh_indices(&self, character: bool, index: usize) -> Vec<u32> {
        self.submesh(character, index)
            .map(|s| s.indices.clone())
            .unwrap_or_default()
    }

    pub fn submesh_texture(&self, character: bool, index: usize) -> Option<String> {
        self.submesh(character, index)
            .map(|s| s.texture_name.clone())
    }

    /// `[width, height]`, empty when the texture is unknown.
    pub fn texture_size(&self, character: bool, name: &str) -> Vec<u32> {
        self.mesh(character)
            .textures
            .get(name)
            .map(|t| vec![t.width, t.height])
            .unwrap_or_default()
    }

    pub fn texture_rgba(&self, character: bool, name: &str) -> Vec<u8> {
        self.mesh(character)
            .textures
            .get(name)
            .map(|t| t.rgba.clone())
            .unwrap_or_default()
    }

    /// Five floats per particle: position, size, life.
    pub fn particles(&self) -> Vec<f32> {
        self.viewer.sink().particles.clone()
    }
}

impl WebViewer {
    fn mesh(&self, character: bool) -> &Mesh {
        let sink = self.viewer.sink();
        if character { &sink.character } else { &sink.world }
    }

    fn submesh(&self, character: bool, index: usize) -> Option<&SubMesh> {
        self.mesh(character).submeshes.get(index)
    }
}
