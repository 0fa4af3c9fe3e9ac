//! Locomotion clip selection and cross-fading.
//!
//! Clip names from the character file are resolved once, at load time, into
//! the fixed [`ClipId`] set. Playback state is a current clip fading in and at
//! most one previous clip fading out.

use std::collections::{HashMap, HashSet};

use crate::config::CROSS_FADE_DURATION;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClipId {
    Idle,
    Walk,
    Sprint,
    Jump,
    Fall,
}

impl ClipId {
    pub const ALL: [ClipId; 5] = [
        ClipId::Idle,
        ClipId::Walk,
        ClipId::Sprint,
        ClipId::Jump,
        ClipId::Fall,
    ];

    /// Clip names tried in order when resolving against the character file.
    /// Fall reuses the idle pose when the file ships no dedicated clip.
    fn candidates(self) -> &'static [&'static str] {
        match self {
            ClipId::Idle => &["idle"],
            ClipId::Walk => &["walk", "walking"],
            ClipId::Sprint => &["run", "sprint", "running"],
            ClipId::Jump => &["jump"],
            ClipId::Fall => &["fall", "falling", "idle"],
        }
    }

    pub fn descriptor(self) -> ClipDescriptor {
        match self {
            ClipId::Jump => ClipDescriptor::ONE_SHOT,
            _ => ClipDescriptor::LOOP,
        }
    }

    pub fn is_ground_locomotion(self) -> bool {
        matches!(self, ClipId::Walk | ClipId::Sprint)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipDescriptor {
    pub looping: bool,
    pub hold_last_frame: bool,
}

impl ClipDescriptor {
    pub const LOOP: Self = Self {
        looping: true,
        hold_last_frame: false,
    };
    pub const ONE_SHOT: Self = Self {
        looping: false,
        hold_last_frame: true,
    };
}

/// A named clip as it appears in the character file.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
}

/// Clips keyed by locomotion identifier.
#[derive(Clone, Debug, Default)]
pub struct ClipLibrary {
    clips: HashMap<ClipId, AnimationClip>,
}

impl ClipLibrary {
    /// Match file clips to identifiers (case-insensitive). Unresolved
    /// identifiers are logged once here instead of failing on first use.
    pub fn resolve(available: &HashMap<String, AnimationClip>) -> Self {
        let by_lower: HashMap<String, &AnimationClip> = available
            .iter()
            .map(|(name, clip)| (name.to_lowercase(), clip))
            .collect();

        let mut clips = HashMap::new();
        for id in ClipId::ALL {
            let found = id
                .candidates()
                .iter()
                .find_map(|name| by_lower.get(*name));
            match found {
                Some(clip) => {
                    clips.insert(id, (*clip).clone());
                }
                None => log::warn!("No animation clip found for {:?}", id),
            }
        }
        Self { clips }
    }

    pub fn get(&self, id: ClipId) -> Option<&AnimationClip> {
        self.clips.get(&id)
    }

    pub fn contains(&self, id: ClipId) -> bool {
        self.clips.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipPlayback {
    pub id: ClipId,
    pub time: f32,
    pub weight: f32,
    duration: f32,
    descriptor: ClipDescriptor,
}

impl ClipPlayback {
    fn start(id: ClipId, duration: f32, weight: f32) -> Self {
        Self {
            id,
            time: 0.0,
            weight,
            duration,
            descriptor: id.descriptor(),
        }
    }

    fn advance(&mut self, dt: f32) {
        self.time += dt;
        if self.duration <= 0.0 {
            self.time = 0.0;
        } else if self.descriptor.looping {
            self.time %= self.duration;
        } else if self.descriptor.hold_last_frame {
            self.time = self.time.min(self.duration);
        }
    }

    /// One-shot clip that has reached (and is holding) its last frame.
    pub fn finished(&self) -> bool {
        !self.descriptor.looping && self.time >= self.duration
    }
}

pub struct AnimationBlender {
    library: ClipLibrary,
    fade_duration: f32,
    current: Option<ClipPlayback>,
    previous: Option<ClipPlayback>,
    switches: u32,
    /// Missing clips already reported; each is warned about once.
    warned: HashSet<ClipId>,
}

impl AnimationBlender {
    pub fn new(library: ClipLibrary) -> Self {
        Self {
            library,
            fade_duration: CROSS_FADE_DURATION,
            current: None,
            previous: None,
            switches: 0,
            warned: HashSet::new(),
        }
    }

    pub fn library(&self) -> &ClipLibrary {
        &self.library
    }

    pub fn current(&self) -> Option<ClipId> {
        self.current.map(|c| c.id)
    }

    pub fn current_playback(&self) -> Option<&ClipPlayback> {
        self.current.as_ref()
    }

    /// Number of clip switches that actually took effect.
    pub fn switch_count(&self) -> u32 {
        self.switches
    }

    /// Single entry point for clip changes. Returns true if a cross-fade
    /// started; requesting the active clip or an unknown clip changes nothing.
    pub fn play(&mut self, id: ClipId) -> bool {
        if self.current() == Some(id) {
            return false;
        }
        let Some(clip) = self.library.get(id) else {
            if self.warned.insert(id) {
                log::warn!("Animation {:?} not available, keeping current clip", id);
            }
            return false;
        };
        log::debug!("Animation {:?} -> {:?}", self.current(), id);
        let duration = clip.duration;
        self.previous = self.current.take();
        let weight = if self.previous.is_some() { 0.0 } else { 1.0 };
        self.current = Some(ClipPlayback::start(id, duration, weight));
        self.switches += 1;
        true
    }

    /// Switch without a fade; used on spawn and reset.
    pub fn snap_to(&mut self, id: ClipId) {
        self.previous = None;
        self.current = None;
        if self.play(id)
            && let Some(current) = self.current.as_mut()
        {
            current.weight = 1.0;
        }
    }

    pub fn update(&mut self, dt: f32) {
        let step = if self.fade_duration > 0.0 {
            dt / self.fade_duration
        } else {
            1.0
        };
        if let Some(current) = self.current.as_mut() {
            current.advance(dt);
            current.weight = (current.weight + step).min(1.0);
        }
        if let Some(previous) = self.previous.as_mut() {
            previous.advance(dt);
            previous.weight -= step;
            if previous.weight <= 0.0 {
                self.previous = None;
            }
        }
    }

    /// Active clips with their blend weights, outgoing clip first.
    pub fn poses(&self) -> Vec<ClipPlayback> {
        self.previous.into_iter().chain(self.current).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn clips(names: &[(&str, f32)]) -> HashMap<String, AnimationClip> {
        names
            .iter()
            .map(|(name, duration)| {
                (
                    name.to_string(),
                    AnimationClip {
                        name: name.to_string(),
                        duration: *duration,
                    },
                )
            })
            .collect()
    }

    pub(crate) fn full_library() -> ClipLibrary {
        ClipLibrary::resolve(&clips(&[
            ("Idle", 2.0),
            ("Walk", 1.0),
            ("Run", 0.8),
            ("Jump", 0.6),
        ]))
    }

    #[test]
    fn resolve_maps_names_and_falls_back_to_idle_for_fall() {
        let lib = full_library();
        assert_eq!(lib.len(), 5);
        assert_eq!(lib.get(ClipId::Sprint).unwrap().name, "Run");
        assert_eq!(lib.get(ClipId::Fall).unwrap().name, "Idle");
    }

    #[test]
    fn resolve_leaves_missing_clips_unmapped() {
        let lib = ClipLibrary::resolve(&clips(&[("idle", 1.0)]));
        assert!(lib.contains(ClipId::Idle));
        assert!(!lib.contains(ClipId::Jump));
    }

    #[test]
    fn replaying_active_clip_is_a_no_op() {
        let mut blender = AnimationBlender::new(full_library());
        assert!(blender.play(ClipId::Idle));
        assert!(!blender.play(ClipId::Idle));
        assert_eq!(blender.switch_count(), 1);
    }

    #[test]
    fn unknown_clip_keeps_current() {
        let mut blender = AnimationBlender::new(ClipLibrary::resolve(&clips(&[("idle", 1.0)])));
        blender.play(ClipId::Idle);
        assert!(!blender.play(ClipId::Jump));
        assert_eq!(blender.current(), Some(ClipId::Idle));
    }

    #[test]
    fn missing_clip_is_reported_once_per_clip() {
        let mut blender = AnimationBlender::new(ClipLibrary::resolve(&clips(&[("idle", 1.0)])));
        blender.play(ClipId::Idle);
        for _ in 0..120 {
            assert!(!blender.play(ClipId::Walk));
        }
        assert_eq!(blender.warned.len(), 1);
        blender.play(ClipId::Sprint);
        assert_eq!(blender.warned.len(), 2);
        assert_eq!(blender.current(), Some(ClipId::Idle));
    }

    #[test]
    fn cross_fade_moves_weight_to_new_clip() {
        let mut blender = AnimationBlender::new(full_library());
        blender.snap_to(ClipId::Idle);
        blender.play(ClipId::Walk);
        let poses = blender.poses();
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[0].id, ClipId::Idle);
        assert_eq!(poses[1].weight, 0.0);

        blender.update(CROSS_FADE_DURATION * 0.5);
        let poses = blender.poses();
        assert!((poses[0].weight - 0.5).abs() < 1e-4);
        assert!((poses[1].weight - 0.5).abs() < 1e-4);

        blender.update(CROSS_FADE_DURATION);
        let poses = blender.poses();
        assert_eq!(poses.len(), 1);
        assert_eq!(poses[0].id, ClipId::Walk);
        assert_eq!(poses[0].weight, 1.0);
    }

    #[test]
    fn jump_plays_once_and_holds_last_frame() {
        let mut blender = AnimationBlender::new(full_library());
        blender.snap_to(ClipId::Jump);
        for _ in 0..10 {
            blender.update(0.1);
        }
        let jump = blender.current_playback().unwrap();
        assert_eq!(jump.time, 0.6);
        assert!(jump.finished());
    }

    #[test]
    fn looping_clips_wrap() {
        let mut blender = AnimationBlender::new(full_library());
        blender.snap_to(ClipId::Walk);
        blender.update(1.25);
        let walk = blender.current_playback().unwrap();
        assert!((walk.time - 0.25).abs() < 1e-4);
        assert!(!walk.finished());
    }
}
