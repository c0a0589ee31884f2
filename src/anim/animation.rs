use super::types::AnimationError;
use crate::arm_error::ArmError;
use ahash::HashMap;
use itertools::Itertools;
use log::error;
use nalgebra_glm as glm;
use serde::Serialize;

/// One authored time sample of a clip: a local transform for each animated
/// joint, keyed by joint name
#[derive(Clone, Debug, Default, Serialize)]
pub struct AnimationKeyFrameData {
    time: f32,
    pose: HashMap<String, glm::Mat4>,
}

impl AnimationKeyFrameData {
    #[must_use]
    pub fn new(time: f32, pose: HashMap<String, glm::Mat4>) -> Self {
        Self { time, pose }
    }

    /// Time of this keyframe in seconds
    #[must_use]
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Local transform of the named joint at this instant. Joints without a
    /// channel in the clip return `None`.
    #[must_use]
    pub fn joint_transform(&self, name: &str) -> Option<&glm::Mat4> {
        self.pose.get(name)
    }

    #[must_use]
    pub const fn pose(&self) -> &HashMap<String, glm::Mat4> {
        &self.pose
    }

    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.pose.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pose.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pose.is_empty()
    }
}

/// An animation clip. Keyframes are ordered by time and the duration is the
/// time of the last one. There is no way to change it once built.
#[derive(Clone, Debug, Serialize)]
pub struct AnimationData {
    duration: f32,
    keyframes: Vec<AnimationKeyFrameData>,
}

impl AnimationData {
    /// Creates a clip from keyframes already in time order
    ///
    /// # Errors
    /// Returns `AnimationError` if there are no keyframes, a time is not
    /// finite, or the times go backwards
    pub fn new(keyframes: Vec<AnimationKeyFrameData>) -> Result<Self, ArmError> {
        let Some(last) = keyframes.last() else {
            error!("animation has no keyframes");
            return Err(AnimationError::NoKeyframes.into());
        };
        let duration = last.time;
        if let Some(bad) = keyframes.iter().position(|k| !k.time.is_finite()) {
            error!("keyframe {} time is not finite", bad);
            return Err(AnimationError::NonFiniteTime(bad).into());
        }
        if let Some((bad, _)) = keyframes
            .iter()
            .tuple_windows()
            .find_position(|(a, b)| b.time < a.time)
        {
            error!("keyframe {} goes back in time", bad + 1);
            return Err(AnimationError::UnsortedKeyframes(bad + 1).into());
        }
        Ok(Self {
            duration,
            keyframes,
        })
    }

    /// Length of the clip in seconds
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }

    #[must_use]
    pub fn keyframes(&self) -> &[AnimationKeyFrameData] {
        &self.keyframes
    }

    #[must_use]
    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    /// Names of every joint animated in any keyframe, sorted
    #[must_use]
    pub fn joint_names(&self) -> Vec<&str> {
        self.keyframes
            .iter()
            .flat_map(AnimationKeyFrameData::joint_names)
            .sorted()
            .dedup()
            .collect()
    }
}
