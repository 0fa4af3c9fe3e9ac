use glam::{Mat3, Mat4, Vec3};
use gltf::image::Format;
use std::collections::HashMap;

use crate::animation::AnimationClip;
use crate::mesh::{Bounds, ColliderMesh, Mesh, SubMesh, TextureData, Vertex};

/// Why a single asset file could not be used.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to parse glTF: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file contains no mesh geometry")]
    NoGeometry,

    #[error("invalid collision mesh: {0}")]
    InvalidCollider(String),
}

/// Fatal initialization errors, tagged with the asset that failed.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load world: {source}")]
    MapLoad {
        #[source]
        source: AssetError,
    },

    #[error("failed to load character: {source}")]
    CharacterLoad {
        #[source]
        source: AssetError,
    },
}

impl LoadError {
    pub fn map_load(source: impl Into<AssetError>) -> Self {
        Self::MapLoad {
            source: source.into(),
        }
    }

    pub fn character_load(source: impl Into<AssetError>) -> Self {
        Self::CharacterLoad {
            source: source.into(),
        }
    }
}

pub struct LoadedWorld {
    pub mesh: Mesh,
    pub colliders: Vec<ColliderMesh>,
    pub bounds: Bounds,
}

impl LoadedWorld {
    pub fn center(&self) -> Vec3 {
        self.bounds.center()
    }
}

pub struct LoadedCharacter {
    pub mesh: Mesh,
    pub bounds: Bounds,
    /// Distance from the model origin down to its feet.
    pub feet_offset: f32,
    pub clips: HashMap<String, AnimationClip>,
}

pub struct LoadedAssets {
    pub world: LoadedWorld,
    pub character: LoadedCharacter,
}

/// Geometry gathered from a scene walk, already in scene space.
#[derive(Default)]
struct SceneGeometry {
    mesh: Mesh,
    colliders: Vec<ColliderMesh>,
    bounds: Option<Bounds>,
}

pub fn load_assets(world: &[u8], character: &[u8]) -> Result<LoadedAssets, LoadError> {
    let world = load_world_from_bytes(world).map_err(LoadError::map_load)?;
    let character = load_character_from_bytes(character).map_err(LoadError::character_load)?;
    Ok(LoadedAssets { world, character })
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_assets_from_paths(
    world: &std::path::Path,
    character: &std::path::Path,
) -> Result<LoadedAssets, LoadError> {
    let world_bytes = std::fs::read(world).map_err(LoadError::map_load)?;
    let character_bytes = std::fs::read(character).map_err(LoadError::character_load)?;
    load_assets(&world_bytes, &character_bytes)
}

pub fn load_world_from_bytes(data: &[u8]) -> Result<LoadedWorld, AssetError> {
    let (document, buffers, images) = gltf::import_slice(data)?;
    let geometry = walk_scene(&document, &buffers, &images)?;
    let bounds = geometry.bounds.ok_or(AssetError::NoGeometry)?;

    log::info!(
        "Loaded world: {} submeshes, {} textures, {} triangles, {} colliders, bounds {:?}..{:?}",
        geometry.mesh.submeshes.len(),
        geometry.mesh.textures.len(),
        geometry.mesh.triangle_count(),
        geometry.colliders.len(),
        bounds.min,
        bounds.max
    );

    Ok(LoadedWorld {
        mesh: geometry.mesh,
        colliders: geometry.colliders,
        bounds,
    })
}

pub fn load_character_from_bytes(data: &[u8]) -> Result<LoadedCharacter, AssetError> {
    let (document, buffers, images) = gltf::import_slice(data)?;
    let geometry = walk_scene(&document, &buffers, &images)?;
    let bounds = geometry.bounds.ok_or(AssetError::NoGeometry)?;
    let feet_offset = (-bounds.min.y).max(0.0);

    let mut clips = HashMap::new();
    for animation in document.animations() {
        let name = animation
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("animation_{}", animation.index()));
        let mut duration = 0.0f32;
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
            if let Some(inputs) = reader.read_inputs() {
                duration = inputs.fold(duration, f32::max);
            }
        }
        clips.insert(name.clone(), AnimationClip { name, duration });
    }

    log::info!(
        "Loaded character: {} triangles, feet offset {:.3}, clips {:?}",
        geometry.mesh.triangle_count(),
        feet_offset,
        clips.keys().collect::<Vec<_>>()
    );

    Ok(LoadedCharacter {
        mesh: geometry.mesh,
        bounds,
        feet_offset,
        clips,
    })
}

fn walk_scene(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> Result<SceneGeometry, AssetError> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(AssetError::NoGeometry)?;

    let mut geometry = SceneGeometry::default();
    for (idx, image) in images.iter().enumerate() {
        geometry.mesh.textures.insert(
            format!("texture_{}", idx),
            TextureData {
                width: image.width,
                height: image.height,
                rgba: convert_image_to_rgba(image),
            },
        );
    }

    for node in scene.nodes() {
        visit_node(&node, Mat4::IDENTITY, buffers, &mut geometry);
    }

    if geometry.mesh.submeshes.is_empty() {
        return Err(AssetError::NoGeometry);
    }
    Ok(geometry)
}

fn visit_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    geometry: &mut SceneGeometry,
) {
    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let Some(positions) = reader.read_positions().map(|i| i.collect::<Vec<_>>()) else {
                continue;
            };
            if positions.is_empty() {
                continue;
            }

            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|i| i.collect())
                .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);

            let tex_coords: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|i| i.into_f32().collect())
                .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|i| i.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            let world_positions: Vec<Vec3> = positions
                .iter()
                .map(|p| transform.transform_point3(Vec3::from(*p)))
                .collect();

            let vertices: Vec<Vertex> = world_positions
                .iter()
                .zip(&tex_coords)
                .zip(&normals)
                .map(|((pos, tex), norm)| Vertex {
                    position: pos.to_array(),
                    tex_coord: *tex,
                    normal: (normal_matrix * Vec3::from(*norm))
                        .normalize_or_zero()
                        .to_array(),
                })
                .collect();

            let texture_name = primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_texture()
                .map(|t| format!("texture_{}", t.texture().source().index()))
                .or_else(|| {
                    primitive
                        .material()
                        .index()
                        .map(|i| format!("material_{}", i))
                })
                .unwrap_or_else(|| "default".to_string());

            let bounds = geometry.bounds.get_or_insert(Bounds::EMPTY);
            for p in &world_positions {
                bounds.include(*p);
            }

            geometry.colliders.push(ColliderMesh {
                vertices: world_positions,
                indices: indices
                    .chunks(3)
                    .filter(|c| c.len() == 3)
                    .map(|c| [c[0], c[1], c[2]])
                    .collect(),
            });
            geometry.mesh.submeshes.push(SubMesh {
                vertices,
                indices,
                texture_name,
            });
        }
    }

    for child in node.children() {
        visit_node(&child, transform, buffers, geometry);
    }
}

fn convert_image_to_rgba(image: &gltf::image::Data) -> Vec<u8> {
    match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => image
            .pixels
            .chunks(3)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect(),
        Format::R8 => image.pixels.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        Format::R8G8 => image
            .pixels
            .chunks(2)
            .flat_map(|c| [c[0], c[0], c[0], c[1]])
            .collect(),
        _ => {
            log::warn!(
                "Unsupported image format {:?}, using placeholder",
                image.format
            );
            [255, 0, 255, 255].repeat((image.width * image.height) as usize)
        }
    }
}
