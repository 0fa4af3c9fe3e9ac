//! Day/night cycle, fog, shadow focus and particles.
//!
//! Reads the player position and grounded signal each frame; nothing here
//! feeds back into gameplay.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::EnvironmentTuning;

const DAY_SKY: Vec3 = Vec3::new(0.55, 0.72, 0.95);
const NIGHT_SKY: Vec3 = Vec3::new(0.03, 0.04, 0.10);
const DAY_FOG: (f32, f32) = (60.0, 400.0);
const NIGHT_FOG: (f32, f32) = (20.0, 150.0);
const DAY_BLOOM: f32 = 0.15;
const NIGHT_BLOOM: f32 = 0.6;

/// Lighting and post-effect parameters for the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub time_of_day: f32,
    pub sun_direction: Vec3,
    /// 0 at night, 1 at full day.
    pub daylight: f32,
    pub sun_intensity: f32,
    pub ambient_intensity: f32,
    pub sky_color: Vec3,
    pub fog_color: Vec3,
    pub fog_near: f32,
    pub fog_far: f32,
    pub bloom_strength: f32,
    /// Center of the directional shadow frustum.
    pub shadow_focus: Vec3,
    pub shadow_extent: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Remaining life (1.0 = just spawned, 0.0 = dead)
    pub life: f32,
    pub decay: f32,
    pub size: f32,
}

impl Particle {
    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }
}

pub struct Environment {
    tuning: EnvironmentTuning,
    time_of_day: f32,
    lighting: Lighting,
    particles: Vec<Particle>,
    ambient_accumulator: f32,
    was_grounded: bool,
    rng: SmallRng,
}

impl Environment {
    pub fn new(tuning: EnvironmentTuning, seed: u64) -> Self {
        let time_of_day = tuning.start_time_of_day.rem_euclid(1.0);
        Self {
            tuning,
            time_of_day,
            lighting: compute_lighting(time_of_day, Vec3::ZERO, tuning.shadow_extent),
            particles: Vec::with_capacity(tuning.max_particles),
            ambient_accumulator: 0.0,
            was_grounded: false,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Clears transient effects; the clock keeps running across restarts.
    pub fn reset(&mut self) {
        self.particles.clear();
        self.ambient_accumulator = 0.0;
        self.was_grounded = false;
    }

    pub fn update(&mut self, dt: f32, player_position: Vec3, grounded: bool) {
        if self.tuning.day_length > 0.0 {
            self.time_of_day = (self.time_of_day + dt / self.tuning.day_length).rem_euclid(1.0);
        }
        self.lighting =
            compute_lighting(self.time_of_day, player_position, self.tuning.shadow_extent);

        for p in &mut self.particles {
            p.position += p.velocity * dt;
            p.velocity.y -= 2.0 * dt;
            p.life -= p.decay * dt;
        }
        self.particles.retain(Particle::is_alive);

        if grounded && !self.was_grounded {
            self.spawn_landing_burst(player_position);
        }
        self.was_grounded = grounded;

        self.ambient_accumulator += self.tuning.ambient_particle_rate * dt;
        while self.ambient_accumulator >= 1.0 {
            self.ambient_accumulator -= 1.0;
            self.spawn_ambient(player_position);
        }
    }

    fn push(&mut self, particle: Particle) {
        if self.particles.len() < self.tuning.max_particles {
            self.particles.push(particle);
        }
    }

    fn spawn_landing_burst(&mut self, feet: Vec3) {
        for _ in 0..self.tuning.landing_burst {
            let angle = self.rng.random_range(0.0..TAU);
            let speed = self.rng.random_range(1.0..3.0);
            let lift = self.rng.random_range(0.5..1.5);
            let particle = Particle {
                position: feet,
                velocity: Vec3::new(angle.cos() * speed, lift, angle.sin() * speed),
                life: 1.0,
                decay: 1.5,
                size: 0.12,
            };
            self.push(particle);
        }
    }

    fn spawn_ambient(&mut self, around: Vec3) {
        let offset = Vec3::new(
            self.rng.random_range(-15.0..15.0),
            self.rng.random_range(0.0..6.0),
            self.rng.random_range(-15.0..15.0),
        );
        let particle = Particle {
            position: around + offset,
            velocity: Vec3::new(0.0, self.rng.random_range(0.1..0.4), 0.0),
            life: 1.0,
            decay: 0.2,
            size: 0.05,
        };
        self.push(particle);
    }
}

fn compute_lighting(time_of_day: f32, focus: Vec3, shadow_extent: f32) -> Lighting {
    // Sunrise at 0.25, noon at 0.5, sunset at 0.75.
    let angle = (time_of_day - 0.25) * TAU;
    let sun_direction = Vec3::new(angle.cos(), angle.sin(), 0.3).normalize();
    let daylight = smoothstep(-0.1, 0.25, sun_direction.y);

    let sky_color = NIGHT_SKY.lerp(DAY_SKY, daylight);
    Lighting {
        time_of_day,
        sun_direction,
        daylight,
        sun_intensity: 0.05 + 0.95 * daylight,
        ambient_intensity: 0.15 + 0.35 * daylight,
        sky_color,
        fog_color: sky_color * 0.9,
        fog_near: NIGHT_FOG.0 + (DAY_FOG.0 - NIGHT_FOG.0) * daylight,
        fog_far: NIGHT_FOG.1 + (DAY_FOG.1 - NIGHT_FOG.1) * daylight,
        bloom_strength: NIGHT_BLOOM + (DAY_BLOOM - NIGHT_BLOOM) * daylight,
        shadow_focus: focus,
        shadow_extent,
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
