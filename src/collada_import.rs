//! Import of skeletons and keyframe animation from COLLADA style documents
pub mod animation_loader;
pub mod skeleton_loader;
pub mod skin_loader;
mod types;
mod util;

// Re-exports
pub use {
    animation_loader::{extract_animation, extract_animation_corrected, joint_name},
    skeleton_loader::extract_skeleton,
    skin_loader::extract_joint_order,
    types::{ColladaLoaded, ImportError, ImportOptions},
};

use crate::{
    arm_error::ArmError,
    document::{DocumentNode, XmlNode},
};
use log::{info, warn};
use std::{fs, io, path::Path};

/// Load a COLLADA file. Reads and parses the file then calls
/// `process_document`. You may call that directly if you've parsed the
/// document some other way.
///
/// # Errors
/// May return `ArmError`
pub fn load(path: &Path, options: &ImportOptions) -> Result<ColladaLoaded, ArmError> {
    info!("Loading {:?}", path);
    let file = fs::File::open(path)?;
    let root = XmlNode::parse(io::BufReader::new(file))?;
    process_document(&root, options)
}

/// Process a parsed COLLADA document. The skin's joint order is read if the
/// document has controllers, otherwise joints are numbered in visiting
/// order. The animation is `None` if the document has no animations.
///
/// # Errors
/// May return `ArmError`
pub fn process_document<N: DocumentNode>(
    root: &N,
    options: &ImportOptions,
) -> Result<ColladaLoaded, ArmError> {
    let joint_order = if let Some(controllers) = root.child("library_controllers")
    {
        extract_joint_order(controllers)?
    } else {
        warn!("No skin controllers, joints numbered in tree order");
        Vec::new()
    };

    let Some(scenes) = root.child("library_visual_scenes") else {
        return Err(
            ImportError::MissingNode("library_visual_scenes".to_owned()).into()
        );
    };
    let skeleton = extract_skeleton(scenes, &joint_order, options)?;

    let animation = match root.child("library_animations") {
        Some(animations) => {
            let root_joint = options
                .z_up_correction
                .then(|| skeleton.root().name());
            Some(extract_animation_corrected(animations, root_joint)?)
        }
        None => {
            info!("Document has no animations");
            None
        }
    };

    Ok(ColladaLoaded {
        joint_order,
        skeleton,
        animation,
    })
}
