use crate::{
    anim::{AnimationData, Skeleton},
    arm_error::ArmError,
};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Options for importing a COLLADA document
///
/// `armature_id` is the id of the visual scene node that holds the joint
/// hierarchy. Blender exports it as "Armature". `z_up_correction` rotates the
/// root joint and its animation samples from a Z axis up document into a Y
/// axis up engine.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(default)]
pub struct ImportOptions {
    pub armature_id: String,
    pub z_up_correction: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            armature_id: "Armature".to_owned(),
            z_up_correction: false,
        }
    }
}

impl ImportOptions {
    /// Reads options from YAML. Missing fields take their default values.
    ///
    /// # Errors
    /// May return `ArmError`
    pub fn from_yaml<R: Read>(reader: R) -> Result<Self, ArmError> {
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// Everything imported from one document
#[derive(Debug)]
pub struct ColladaLoaded {
    pub joint_order: Vec<String>,
    pub skeleton: Skeleton,
    pub animation: Option<AnimationData>,
}

/// Errors specific to importing data. These all mean the source asset is
/// malformed. `ArmError` has a `From` trait to handle these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    EmptyDocument,
    MalformedXml(String),
    MissingNode(String),
    MissingAttribute(String),
    MissingText(String),
    MissingSource(String),
    BadReference(String),
    BadNumber(String),
    BadTimeAxis,
    BadChannelTarget(String),
    DuplicateChannel(String),
    CountMismatch(String),
    NotMatrixData(usize),
    SampleCountMismatch(String),
    NoChannels,
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::EmptyDocument => write!(f, "document has no root element"),
            Self::MalformedXml(a) => {
                write!(f, "unexpected end tag </{a}>")
            }
            Self::MissingNode(a) => write!(f, "required element <{a}> missing"),
            Self::MissingAttribute(a) => {
                write!(f, "required attribute {a} missing")
            }
            Self::MissingText(a) => {
                write!(f, "element <{a}> has no text content")
            }
            Self::MissingSource(a) => {
                write!(f, "referenced source {a} does not exist")
            }
            Self::BadReference(a) => {
                write!(f, "reference {a} does not start with #")
            }
            Self::BadNumber(a) => write!(f, "{a} is not a valid number"),
            Self::BadTimeAxis => {
                write!(f, "keyframe times must be a non-empty ascending list")
            }
            Self::BadChannelTarget(a) => {
                write!(f, "channel target {a} does not name a joint")
            }
            Self::DuplicateChannel(a) => {
                write!(f, "joint {a} is animated by more than one channel")
            }
            Self::CountMismatch(a) => {
                write!(f, "array {a} does not hold the count it declares")
            }
            Self::NotMatrixData(a) => {
                write!(f, "{a} values can't be split into 4x4 matrices")
            }
            Self::SampleCountMismatch(a) => {
                write!(f, "joint {a} does not have one matrix per keyframe")
            }
            Self::NoChannels => write!(f, "animation has no channels"),
        }
    }
}
