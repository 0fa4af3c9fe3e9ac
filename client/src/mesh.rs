use glam::Vec3;
use std::collections::HashMap;

/// Unified vertex type for all meshes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
}

/// Texture data (RGBA pixels)
#[derive(Clone, Debug)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A submesh with its own material/texture
#[derive(Clone, Debug)]
pub struct SubMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub texture_name: String,
}

/// A loaded mesh with multiple submeshes and textures
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub submeshes: Vec<SubMesh>,
    pub textures: HashMap<String, TextureData>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.indices.len() / 3).sum()
    }
}

/// Axis-aligned bounds in world (or model) space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    pub fn include(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Triangle soup for one world mesh, already in world space.
#[derive(Clone, Debug, Default)]
pub struct ColliderMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<[u32; 3]>,
}
