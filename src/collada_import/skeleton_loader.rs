use super::{
    types::{ImportError, ImportOptions},
    util::{self, require_child, MATRIX_SIZE},
};
use crate::{
    anim::{JointData, JointId, Skeleton, SkeletonBuilder},
    arm_error::ArmError,
    document::DocumentNode,
};
use log::{debug, error, info};

/// Hands out joint indices. Joints named by the skin keep their position in
/// the skin's joint list. Any other joint gets the next free index after the
/// skin joints, in the order the joints are visited.
struct Numbering<'a> {
    order: &'a [String],
    next: usize,
}

impl<'a> Numbering<'a> {
    const fn new(order: &'a [String]) -> Self {
        Self {
            order,
            next: order.len(),
        }
    }

    /// Index for the joint `name`. `keys` are the names the skin may know the
    /// joint by, tried in turn.
    fn index<'k>(
        &mut self,
        name: &str,
        mut keys: impl Iterator<Item = &'k str>,
    ) -> usize {
        if let Some(index) =
            keys.find_map(|key| self.order.iter().position(|n| n == key))
        {
            index
        } else {
            let index = self.next;
            self.next += 1;
            debug!("joint {} is not skinned, index={}", name, index);
            index
        }
    }
}

/// Builds the skeleton from the joint nodes under the armature node of the
/// first visual scene, then runs the bind pass
///
/// Expects `library_visual_scenes`. `joint_order` is normally the result of
/// `extract_joint_order` and may be empty, in which case joints are numbered
/// in visiting order.
///
/// # Errors
/// May return `ArmError`
pub fn extract_skeleton<N: DocumentNode>(
    library_visual_scenes: &N,
    joint_order: &[String],
    options: &ImportOptions,
) -> Result<Skeleton, ArmError> {
    let scene = require_child(library_visual_scenes, "visual_scene")?;
    let Some(armature) =
        scene.child_with_attribute("node", "id", &options.armature_id)
    else {
        error!("visual scene has no node with id {}", options.armature_id);
        return Err(ImportError::MissingNode(format!(
            "node id=\"{}\"",
            options.armature_id
        ))
        .into());
    };
    let head = require_child(armature, "node")?;

    let mut numbering = Numbering::new(joint_order);
    let mut builder = SkeletonBuilder::new();

    let mut root_data = joint_data(head, &mut numbering)?;
    if options.z_up_correction {
        root_data.local_bind_transform =
            util::z_up_correction() * root_data.local_bind_transform;
    }
    let root = builder.set_root(root_data)?;
    load_children(&mut builder, head, root, &mut numbering)?;

    info!("Found {} joints under {}", builder.len(), options.armature_id);
    builder.build()
}

/// Adds the joints below `head` in document order. Walked with an explicit
/// stack, visiting a joint before any of its descendants.
fn load_children<N: DocumentNode>(
    builder: &mut SkeletonBuilder,
    head: &N,
    parent: JointId,
    numbering: &mut Numbering,
) -> Result<(), ArmError> {
    let mut stack: Vec<(&N, JointId)> = head
        .children("node")
        .into_iter()
        .rev()
        .map(|child| (child, parent))
        .collect();
    while let Some((node, parent)) = stack.pop() {
        let data = joint_data(node, numbering)?;
        let id = builder.add_child(parent, data)?;
        stack.extend(
            node.children("node")
                .into_iter()
                .rev()
                .map(|child| (child, id)),
        );
    }
    Ok(())
}

fn joint_data<N: DocumentNode>(
    node: &N,
    numbering: &mut Numbering,
) -> Result<JointData, ArmError> {
    let Some(name) = node
        .attribute("id")
        .or_else(|| node.attribute("sid"))
        .or_else(|| node.attribute("name"))
    else {
        error!("joint node has no id, sid or name");
        return Err(ImportError::MissingAttribute("id".to_owned()).into());
    };

    let matrix = require_child(node, "matrix")?;
    let values = util::parse_floats(matrix.text().unwrap_or_default())?;
    let Ok(values) = <[f32; MATRIX_SIZE]>::try_from(values.as_slice()) else {
        error!("joint {} matrix has {} values", name, values.len());
        return Err(ImportError::NotMatrixData(values.len()).into());
    };

    // Skins list joints by sid while animation targets use the id
    let keys = [
        node.attribute("sid"),
        node.attribute("id"),
        node.attribute("name"),
    ];
    Ok(JointData::new(
        numbering.index(name, keys.into_iter().flatten()),
        name,
        util::load_matrix(&values),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering() {
        let order = vec!["Hips".to_owned(), "Spine".to_owned()];
        let mut numbering = Numbering::new(&order);
        assert_eq!(numbering.index("Spine", ["Spine"].into_iter()), 1);
        assert_eq!(numbering.index("Grip", ["Grip"].into_iter()), 2);
        assert_eq!(numbering.index("Hips", ["Hips"].into_iter()), 0);
        assert_eq!(numbering.index("Tail", std::iter::empty()), 3);
    }

    #[test]
    fn numbering_by_sid() {
        let order = vec!["Hips".to_owned(), "Spine".to_owned()];
        let mut numbering = Numbering::new(&order);
        let keys = ["Spine", "Armature_Spine"];
        assert_eq!(numbering.index("Armature_Spine", keys.into_iter()), 1);
        let keys = ["Armature_Hips", "Hips"];
        assert_eq!(numbering.index("Armature_Hips", keys.into_iter()), 0);
        let keys = ["Armature_Tail"];
        assert_eq!(numbering.index("Armature_Tail", keys.into_iter()), 2);
    }
}
