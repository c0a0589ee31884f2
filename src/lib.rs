//! Skeletal animation core
//!
//! Builds a joint hierarchy from an authored skeleton, computes the inverse
//! bind transform of every joint, and reads keyframe animation samples into a
//! per-keyframe, per-joint table. Source documents are accessed through the
//! `document::DocumentNode` trait; `collada_import` reads the COLLADA layout.
pub mod anim;
pub mod arm_error;
pub mod collada_import;
pub mod document;
