use super::{
    types::ImportError,
    util::{self, read_float_array, require_attribute, require_child, MATRIX_SIZE},
};
use crate::{
    anim::{AnimationData, AnimationKeyFrameData},
    arm_error::ArmError,
    document::DocumentNode,
};
use ahash::{HashMap, HashMapExt};
use itertools::Itertools;
use log::{debug, error, info, trace};
use nalgebra_glm as glm;

/// Reads the keyframe samples of one clip into `AnimationData`
///
/// Expects `library_animations`. The first `source` of the first animation
/// node holds the key times shared by every joint. Each channel then
/// supplies one 4x4 matrix per key time for the joint it targets. An
/// animation node may hold several channels, each with its own sampler. Joints without a channel
/// simply have no entry in the keyframes.
///
/// # Errors
/// May return `ArmError`. Nothing is returned for a partially read clip.
pub fn extract_animation<N: DocumentNode>(
    library_animations: &N,
) -> Result<AnimationData, ArmError> {
    extract_animation_corrected(library_animations, None)
}

/// As `extract_animation`, but samples for the joint named `root_joint` are
/// rotated from Z axis up into Y axis up to match a skeleton loaded with
/// `z_up_correction`
///
/// # Errors
/// May return `ArmError`
pub fn extract_animation_corrected<N: DocumentNode>(
    library_animations: &N,
    root_joint: Option<&str>,
) -> Result<AnimationData, ArmError> {
    let mut channels = Vec::new();
    collect_channel_nodes(library_animations, &mut channels);
    let Some(first) = channels.first() else {
        error!("no animation channels found");
        return Err(ImportError::NoChannels.into());
    };

    let times = key_times(*first)?;
    let mut poses = vec![HashMap::<String, glm::Mat4>::new(); times.len()];
    let mut channel_count = 0;
    for node in &channels {
        for channel in node.children("channel") {
            load_joint_transforms(*node, channel, &mut poses, root_joint)?;
            channel_count += 1;
        }
    }

    let keyframes = times
        .iter()
        .zip(poses)
        .map(|(time, pose)| AnimationKeyFrameData::new(*time, pose))
        .collect();
    let animation = AnimationData::new(keyframes)?;
    info!(
        "Loaded animation: duration={}s, keyframes={}, channels={}",
        animation.duration(),
        animation.keyframe_count(),
        channel_count
    );
    Ok(animation)
}

/// Joint name from a channel target such as "Hips/transform". Everything
/// before the first `/` names the joint.
///
/// # Errors
/// Returns `ImportError::BadChannelTarget` if there is no `/` or nothing
/// before it
pub fn joint_name(target: &str) -> Result<&str, ImportError> {
    match target.split_once('/') {
        Some((name, _)) if !name.is_empty() => Ok(name),
        _ => {
            error!("channel target {:?} does not name a joint", target);
            Err(ImportError::BadChannelTarget(target.to_owned()))
        }
    }
}

// Animation nodes that carry a channel. Some exporters wrap a clip's
// channels in an extra animation node, so nodes without a channel are
// searched for nested ones.
fn collect_channel_nodes<'a, N: DocumentNode>(node: &'a N, out: &mut Vec<&'a N>) {
    for animation in node.children("animation") {
        if animation.child("channel").is_some() {
            out.push(animation);
        } else {
            collect_channel_nodes(animation, out);
        }
    }
}

fn key_times<N: DocumentNode>(node: &N) -> Result<Vec<f32>, ImportError> {
    let source = require_child(node, "source")?;
    let times = read_float_array(source)?;
    if times.is_empty() || times.iter().tuple_windows().any(|(a, b)| b < a) {
        error!("key times are empty or out of order: {:?}", times);
        return Err(ImportError::BadTimeAxis);
    }
    debug!("{} key times, last={:?}", times.len(), times.last());
    Ok(times)
}

/// Finds the id of the source holding a channel's transform samples: the
/// OUTPUT input of the sampler the channel refers to
fn data_id<'a, N: DocumentNode>(
    node: &'a N,
    channel: &'a N,
) -> Result<&'a str, ImportError> {
    let sampler_id = util::strip_reference(require_attribute(channel, "source")?)
        .map_err(|e| {
            error!("channel source is not a reference: {}", e);
            e
        })?;
    let Some(sampler) = node.child_with_attribute("sampler", "id", sampler_id)
    else {
        error!("channel refers to missing sampler {}", sampler_id);
        return Err(ImportError::MissingNode(format!(
            "sampler id=\"{sampler_id}\""
        )));
    };
    let Some(output) =
        sampler.child_with_attribute("input", "semantic", "OUTPUT")
    else {
        error!("sampler {} has no OUTPUT input", sampler_id);
        return Err(ImportError::MissingNode("input".to_owned()));
    };
    util::strip_reference(require_attribute(output, "source")?)
}

fn load_joint_transforms<N: DocumentNode>(
    node: &N,
    channel: &N,
    poses: &mut [HashMap<String, glm::Mat4>],
    root_joint: Option<&str>,
) -> Result<(), ImportError> {
    let name = joint_name(require_attribute(channel, "target")?)?;
    let id = data_id(node, channel)?;
    let Some(source) = node.child_with_attribute("source", "id", id) else {
        error!("joint {} refers to missing source {}", name, id);
        return Err(ImportError::MissingSource(id.to_owned()));
    };

    let values = read_float_array(source)?;
    if values.len() % MATRIX_SIZE != 0 {
        error!("joint {} has {} sample values", name, values.len());
        return Err(ImportError::NotMatrixData(values.len()));
    }
    if values.len() != MATRIX_SIZE * poses.len() {
        error!(
            "joint {} has {} samples for {} key times",
            name,
            values.len() / MATRIX_SIZE,
            poses.len()
        );
        return Err(ImportError::SampleCountMismatch(name.to_owned()));
    }
    if poses.iter().any(|pose| pose.contains_key(name)) {
        error!("joint {} has more than one channel", name);
        return Err(ImportError::DuplicateChannel(name.to_owned()));
    }

    let correction = (root_joint == Some(name)).then(util::z_up_correction);
    for (pose, chunk) in poses.iter_mut().zip(values.chunks_exact(MATRIX_SIZE)) {
        let chunk = <&[f32; MATRIX_SIZE]>::try_from(chunk)
            .map_err(|_| ImportError::NotMatrixData(values.len()))?;
        let mut transform = util::load_matrix(chunk);
        if let Some(correction) = correction {
            transform = correction * transform;
        }
        trace!("joint {} sample={:?}", name, transform);
        pose.insert(name.to_owned(), transform);
    }
    debug!("joint {} loaded from {}", name, id);
    Ok(())
}
