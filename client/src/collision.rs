use glam::Vec3;
use parry3d::math::{Pose3, Vector};
use parry3d::query::{Ray, RayCast};
use parry3d::shape::TriMesh;

use crate::config::LocomotionTuning;
use crate::glb::AssetError;
use crate::mesh::ColliderMesh;

/// The immutable ground collision set, built once when the world loads.
pub struct PhysicsWorld {
    colliders: Vec<TriMesh>,
}

impl PhysicsWorld {
    pub fn new(meshes: &[ColliderMesh]) -> Result<Self, AssetError> {
        let mut colliders = Vec::with_capacity(meshes.len());
        for mesh in meshes {
            if mesh.vertices.is_empty() || mesh.indices.is_empty() {
                continue;
            }
            let vertices: Vec<Vector> = mesh
                .vertices
                .iter()
                .map(|v| Vector::new(v.x, v.y, v.z))
                .collect();
            let trimesh = TriMesh::new(vertices, mesh.indices.clone())
                .map_err(|e| AssetError::InvalidCollider(format!("{e:?}")))?;
            colliders.push(trimesh);
        }
        if colliders.is_empty() {
            return Err(AssetError::NoGeometry);
        }
        Ok(Self { colliders })
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Closest hit across every collider.
    pub fn cast_ray(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<f32> {
        let ray = Ray::new(
            Vector::new(origin.x, origin.y, origin.z),
            Vector::new(dir.x, dir.y, dir.z),
        );
        self.colliders
            .iter()
            .filter_map(|mesh| mesh.cast_ray(&Pose3::IDENTITY, &ray, max_dist, true))
            .reduce(f32::min)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundHit {
    pub grounded: bool,
    pub distance: f32,
    pub point: Option<Vec3>,
}

impl GroundHit {
    pub const MISS: Self = Self {
        grounded: false,
        distance: f32::INFINITY,
        point: None,
    };
}

/// Single downward ray from `probe_height` above the character origin.
#[derive(Clone, Copy, Debug)]
pub struct GroundSensor {
    pub probe_height: f32,
    pub tolerance: f32,
    pub range: f32,
    pub feet_offset: f32,
}

impl GroundSensor {
    pub fn new(tuning: &LocomotionTuning, feet_offset: f32) -> Self {
        Self {
            probe_height: tuning.probe_height,
            tolerance: tuning.ground_tolerance,
            range: tuning.probe_range,
            feet_offset,
        }
    }

    /// Distance from the probe origin to the ground when the feet rest on it.
    pub fn rest_distance(&self) -> f32 {
        self.probe_height + self.feet_offset
    }

    pub fn probe(&self, world: &PhysicsWorld, position: Vec3) -> GroundHit {
        let origin = position + Vec3::Y * self.probe_height;
        let Some(distance) = world.cast_ray(origin, Vec3::NEG_Y, self.range) else {
            return GroundHit::MISS;
        };
        GroundHit {
            grounded: distance < self.rest_distance() + self.tolerance,
            distance,
            point: Some(origin - Vec3::Y * distance),
        }
    }
}
