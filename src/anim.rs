mod animation;
mod skeleton;
mod types;

// Re-exports
pub use {
    animation::{AnimationData, AnimationKeyFrameData},
    skeleton::{Skeleton, SkeletonBuilder},
    types::{AnimationError, Joint, JointData, JointId, SkeletonError},
};
