use super::types::{Joint, JointData, JointId, SkeletonError};
use crate::arm_error::ArmError;
use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use log::{debug, error, info};
use nalgebra_glm as glm;
use serde::Serialize;
use smallvec::SmallVec;

/// Smallest allowed ratio of the determinant to the product of the lengths
/// of the rotation and scale columns. The ratio does not depend on scale, so tiny rigs are fine, but
/// columns that are nearly parallel are treated as singular.
const SINGULAR_RATIO: f32 = 1.0e-6;

#[derive(Clone, Debug)]
struct BuilderNode {
    data: JointData,
    parent: Option<JointId>,
    children: SmallVec<[JointId; 4]>,
}

/// First phase of skeleton construction
///
/// Joints are stored in a flat arena and refer to their children by
/// `JointId`. Nothing derived from the rest pose exists yet; `build` runs the
/// bind pass and hands back an immutable `Skeleton`.
#[derive(Clone, Debug, Default)]
pub struct SkeletonBuilder {
    nodes: Vec<BuilderNode>,
    root: Option<JointId>,
}

impl SkeletonBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root joint. There can only be one.
    ///
    /// # Errors
    /// Returns `SkeletonError::RootExists` if called twice
    pub fn set_root(&mut self, data: JointData) -> Result<JointId, ArmError> {
        if self.root.is_some() {
            error!("second root joint {} rejected", data.name);
            return Err(SkeletonError::RootExists.into());
        }
        let id = self.push(data, None);
        self.root = Some(id);
        Ok(id)
    }

    /// Appends `child` to the children of `parent`. Children keep the order
    /// in which they were added.
    ///
    /// # Errors
    /// Returns `SkeletonError::UnknownJoint` if `parent` did not come from
    /// this builder
    pub fn add_child(
        &mut self,
        parent: JointId,
        child: JointData,
    ) -> Result<JointId, ArmError> {
        if parent.0 >= self.nodes.len() {
            error!("parent handle {} is not in this builder", parent.0);
            return Err(SkeletonError::UnknownJoint(parent.0).into());
        }
        let id = self.push(child, Some(parent));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, data: JointData, parent: Option<JointId>) -> JointId {
        let id = JointId(self.nodes.len());
        self.nodes.push(BuilderNode {
            data,
            parent,
            children: SmallVec::new(),
        });
        id
    }

    /// Validates the tree and runs the bind pass from the root
    ///
    /// # Errors
    /// Returns `SkeletonError` if there is no root, if an index or name is
    /// used twice, or if any joint's bind transform can't be inverted. No
    /// skeleton is returned in that case.
    pub fn build(self) -> Result<Skeleton, ArmError> {
        let Some(root) = self.root else {
            error!("skeleton has no root joint");
            return Err(SkeletonError::NoRoot.into());
        };

        let mut indices = HashSet::with_capacity(self.nodes.len());
        let mut by_name = HashMap::with_capacity(self.nodes.len());
        for (slot, node) in self.nodes.iter().enumerate() {
            if !indices.insert(node.data.index) {
                error!("joint index {} is not unique", node.data.index);
                return Err(SkeletonError::DuplicateIndex(node.data.index).into());
            }
            if by_name.insert(node.data.name.clone(), JointId(slot)).is_some() {
                error!("joint name {} is not unique", node.data.name);
                return Err(
                    SkeletonError::DuplicateName(node.data.name.clone()).into()
                );
            }
        }

        let mut inverse_binds = vec![glm::Mat4::identity(); self.nodes.len()];
        calculate_inverse_bind_transform(
            &self.nodes,
            root,
            &glm::Mat4::identity(),
            &mut inverse_binds,
        )?;

        let mut parents = Vec::with_capacity(self.nodes.len());
        let joints = self
            .nodes
            .into_iter()
            .zip(inverse_binds)
            .map(|(node, inverse_bind_transform)| {
                parents.push(node.parent);
                Joint {
                    index: node.data.index,
                    name: node.data.name,
                    local_bind_transform: node.data.local_bind_transform,
                    inverse_bind_transform,
                    children: node.children,
                }
            })
            .collect::<Vec<_>>();
        info!("Built skeleton with {} joints", joints.len());

        Ok(Skeleton {
            joints,
            parents,
            root,
            by_name,
        })
    }
}

/// Inverts a bind transform, rejecting singular and non-finite results
fn invert(m: &glm::Mat4) -> Option<glm::Mat4> {
    let linear = m.fixed_view::<3, 3>(0, 0);
    let volume: f32 = linear.column_iter().map(|c| c.norm()).product();
    if m.determinant().abs() <= SINGULAR_RATIO * volume {
        return None;
    }
    m.try_inverse().filter(|inv| inv.iter().all(|x| x.is_finite()))
}

// Call with the root and identity. Parents are handled before their children
// since a child's bind transform is built from its parent's. The walk keeps
// its own stack so chain depth is not limited by the thread's stack.
fn calculate_inverse_bind_transform(
    nodes: &[BuilderNode],
    id: JointId,
    parent_bind_transform: &glm::Mat4,
    inverse_binds: &mut [glm::Mat4],
) -> Result<(), SkeletonError> {
    let mut stack = vec![(id, *parent_bind_transform)];
    while let Some((id, parent_bind_transform)) = stack.pop() {
        let node = &nodes[id.0];
        let bind_transform = parent_bind_transform * node.data.local_bind_transform;
        let Some(inverse) = invert(&bind_transform) else {
            error!(
                "joint {} has a non-invertible bind transform {:?}",
                node.data.name, bind_transform
            );
            return Err(SkeletonError::NonInvertibleBind(node.data.name.clone()));
        };
        debug!("joint {} index={} bound", node.data.name, node.data.index);
        inverse_binds[id.0] = inverse;

        // Reversed so siblings are bound in authoring order
        stack.extend(
            node.children
                .iter()
                .rev()
                .map(|child| (*child, bind_transform)),
        );
    }
    Ok(())
}

/// A joint hierarchy with its bind pass completed
#[derive(Clone, Debug, Serialize)]
pub struct Skeleton {
    joints: Vec<Joint>,
    #[serde(skip)]
    parents: Vec<Option<JointId>>,
    root: JointId,
    #[serde(skip)]
    by_name: HashMap<String, JointId>,
}

impl Skeleton {
    #[must_use]
    pub const fn root_id(&self) -> JointId {
        self.root
    }

    #[must_use]
    pub fn root(&self) -> &Joint {
        &self.joints[self.root.0]
    }

    #[must_use]
    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.0)
    }

    #[must_use]
    pub fn parent(&self, id: JointId) -> Option<JointId> {
        self.parents.get(id.0).copied().flatten()
    }

    #[must_use]
    pub fn find_id(&self, name: &str) -> Option<JointId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Joint> {
        self.find_id(name).and_then(|id| self.joint(id))
    }

    /// Number of joints. A skeleton always has at least its root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Joints in the order they were added to the builder
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Returns the joint and all of its descendants. A joint is always listed
    /// before any of its descendants and siblings keep authoring order.
    #[must_use]
    pub fn collect_subtree(&self, id: JointId) -> Vec<&Joint> {
        let mut ret = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(joint) = self.joints.get(id.0) else {
                continue;
            };
            ret.push(joint);
            // Reversed so the first child is popped first
            stack.extend(joint.children.iter().rev().copied());
        }
        ret
    }

    /// Joints sorted by their `index`
    #[must_use]
    pub fn joints_by_index(&self) -> Vec<&Joint> {
        let mut ret: Vec<&Joint> = self.joints.iter().collect();
        ret.sort_by_key(|j| j.index);
        ret
    }

    #[must_use]
    pub fn max_index(&self) -> usize {
        self.joints.iter().map(|j| j.index).max().unwrap_or_default()
    }

    /// Inverse bind transforms addressed by joint index, ready for a skinning
    /// stage. Unused indices hold the identity.
    ///
    /// Indices are expected to be dense, as they are when numbered by the
    /// importer. The table is `max_index() + 1` long, so a single very large
    /// index makes a very large table.
    ///
    /// # Errors
    /// Returns `SkeletonError::IndexOutOfRange` if the largest index has no
    /// successor
    pub fn inverse_bind_transforms(&self) -> Result<Vec<glm::Mat4>, ArmError> {
        let max_index = self.max_index();
        let Some(len) = max_index.checked_add(1) else {
            error!("joint index {} can't address a table", max_index);
            return Err(SkeletonError::IndexOutOfRange(max_index).into());
        };
        let mut ret = vec![glm::Mat4::identity(); len];
        for joint in &self.joints {
            ret[joint.index] = joint.inverse_bind_transform;
        }
        Ok(ret)
    }

    /// Model-space bind transform of a joint, composed from the local bind
    /// transforms on the path from the root
    #[must_use]
    pub fn bind_transform(&self, id: JointId) -> Option<glm::Mat4> {
        let mut transform = self.joint(id)?.local_bind_transform;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            transform = self.joints[parent.0].local_bind_transform * transform;
            current = parent;
        }
        Some(transform)
    }
}
