use nalgebra_glm as glm;
use serde::Serialize;
use smallvec::SmallVec;

/// Handle to a joint inside one skeleton. Only meaningful for the builder or
/// skeleton that returned it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct JointId(pub(crate) usize);

/// Rest-pose description of a joint as authored
///
/// `index` is the stable identity used to address per-joint arrays at
/// runtime. `name` is used to match keyframe data to the joint.
/// `local_bind_transform` is the rest transform relative to the parent joint.
#[derive(Clone, Debug)]
pub struct JointData {
    pub index: usize,
    pub name: String,
    pub local_bind_transform: glm::Mat4,
}

impl JointData {
    #[must_use]
    pub fn new(index: usize, name: &str, local_bind_transform: glm::Mat4) -> Self {
        Self {
            index,
            name: name.to_owned(),
            local_bind_transform,
        }
    }
}

/// A joint of a built skeleton
///
/// Only a `Skeleton` creates these, after the bind pass has run, so the
/// inverse bind transform is always valid.
#[derive(Clone, Debug, Serialize)]
pub struct Joint {
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) local_bind_transform: glm::Mat4,
    pub(crate) inverse_bind_transform: glm::Mat4,
    pub(crate) children: SmallVec<[JointId; 4]>,
}

impl Joint {
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn local_bind_transform(&self) -> &glm::Mat4 {
        &self.local_bind_transform
    }

    /// Inverse of the model-space bind transform. Moves a vertex from bind
    /// pose into this joint's local frame.
    #[must_use]
    pub const fn inverse_bind_transform(&self) -> &glm::Mat4 {
        &self.inverse_bind_transform
    }

    /// Child joints in authoring order
    #[must_use]
    pub fn children(&self) -> &[JointId] {
        &self.children
    }
}

/// Errors in the structure of a skeleton. These are authoring or programming
/// errors and are never expected during normal operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkeletonError {
    NoRoot,
    RootExists,
    UnknownJoint(usize),
    DuplicateIndex(usize),
    DuplicateName(String),
    NonInvertibleBind(String),
    IndexOutOfRange(usize),
}

impl std::fmt::Display for SkeletonError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NoRoot => write!(f, "skeleton has no root joint"),
            Self::RootExists => {
                write!(f, "skeleton already has a root joint")
            }
            Self::UnknownJoint(a) => {
                write!(f, "joint handle {a} does not belong to this skeleton")
            }
            Self::DuplicateIndex(a) => {
                write!(f, "joint index {a} is used more than once")
            }
            Self::DuplicateName(a) => {
                write!(f, "joint name {a} is used more than once")
            }
            Self::NonInvertibleBind(a) => {
                write!(f, "bind transform of joint {a} is not invertible")
            }
            Self::IndexOutOfRange(a) => {
                write!(f, "joint index {a} is too large for an index table")
            }
        }
    }
}

/// Errors from constructing animation data directly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    NoKeyframes,
    NonFiniteTime(usize),
    UnsortedKeyframes(usize),
}

impl std::fmt::Display for AnimationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NoKeyframes => {
                write!(f, "an animation needs at least one keyframe")
            }
            Self::NonFiniteTime(a) => {
                write!(f, "keyframe {a} has a time that is not finite")
            }
            Self::UnsortedKeyframes(a) => {
                write!(f, "keyframe {a} is earlier than the keyframe before it")
            }
        }
    }
}
