use crate::{
    anim::{AnimationError, SkeletonError},
    collada_import::ImportError,
};
use std::{error, fmt};

/// Unified error type
///
/// Loading a skeleton or an animation clip is all or nothing. Any of these
/// errors means the whole call failed and no partial result was produced.
///
/// Some error types are very large so are boxed.
#[derive(Debug)]
pub enum ArmError {
    StdIoError(std::io::Error),
    SerdeYamlError(Box<serde_yaml::Error>),
    XmlError(Box<xml::reader::Error>),
    ImportError(ImportError),
    SkeletonError(SkeletonError),
    AnimationError(AnimationError),
}

impl error::Error for ArmError {}

impl fmt::Display for ArmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::StdIoError(e) => write!(f, "std::io::Error: {}", e.kind()),
            Self::SerdeYamlError(e) => {
                write!(f, "serde_yaml::Error: {e}")
            }
            Self::XmlError(e) => write!(f, "xml-rs reader error: {e}"),
            Self::ImportError(e) => write!(f, "import error: {e}"),
            Self::SkeletonError(e) => write!(f, "skeleton error: {e}"),
            Self::AnimationError(e) => write!(f, "animation error: {e}"),
        }
    }
}

impl From<std::io::Error> for ArmError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl From<serde_yaml::Error> for ArmError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(Box::new(e))
    }
}

impl From<xml::reader::Error> for ArmError {
    fn from(e: xml::reader::Error) -> Self {
        Self::XmlError(Box::new(e))
    }
}

impl From<ImportError> for ArmError {
    fn from(e: ImportError) -> Self {
        Self::ImportError(e)
    }
}

impl From<SkeletonError> for ArmError {
    fn from(e: SkeletonError) -> Self {
        Self::SkeletonError(e)
    }
}

impl From<AnimationError> for ArmError {
    fn from(e: AnimationError) -> Self {
        Self::AnimationError(e)
    }
}
