use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::scene::joints::{JointSet, OverridableJoint};
use crate::scene::transform::Transform;

/// A single joint of a character skeleton.
#[derive(Debug, Clone)]
pub struct Joint {
    name: String,
    index: usize,
    has_position: bool,

    /// Live local transform, the result of this frame's blending.
    pub transform: Transform,

    /// Rotation last requested by the override layer.
    pub target_rotation: Quat,
    /// Position last requested by the override layer.
    pub target_position: Vec3,
}

impl Joint {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable index inside the owning skeleton.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether this joint accepts position writes.
    #[inline]
    #[must_use]
    pub fn has_position(&self) -> bool {
        self.has_position
    }
}

/// Joint storage of one character.
///
/// Joints are created once and never removed, so indices handed out by
/// [`add_joint`](Self::add_joint) stay valid for the skeleton's lifetime.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,
    joints: Vec<Joint>,
    lookup: FxHashMap<String, usize>,
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            joints: Vec::new(),
            lookup: FxHashMap::default(),
        }
    }

    /// Builds a skeleton holding every joint of `set`.
    #[must_use]
    pub fn avatar(name: &str, set: JointSet) -> Self {
        let mut skeleton = Self::new(name);
        for joint in set.joints() {
            skeleton.add_joint(joint.name(), joint.supports_position());
        }
        skeleton
    }

    /// Adds a joint and returns its index. Adding an existing name returns the
    /// existing index unchanged.
    pub fn add_joint(&mut self, name: &str, has_position: bool) -> usize {
        if let Some(&index) = self.lookup.get(name) {
            return index;
        }

        let index = self.joints.len();
        self.joints.push(Joint {
            name: name.to_string(),
            index,
            has_position,
            transform: Transform::IDENTITY,
            target_rotation: Quat::IDENTITY,
            target_position: Vec3::ZERO,
        });
        self.lookup.insert(name.to_string(), index);
        index
    }

    #[inline]
    #[must_use]
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    #[must_use]
    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joint_index(name).map(|index| &self.joints[index])
    }

    #[must_use]
    pub fn joint_mut(&mut self, name: &str) -> Option<&mut Joint> {
        let index = self.joint_index(name)?;
        self.joints.get_mut(index)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Joint> {
        self.joints.get_mut(index)
    }

    /// Convenience accessor for the joints of the override table.
    #[must_use]
    pub fn overridable(&self, joint: OverridableJoint) -> Option<&Joint> {
        self.joint(joint.name())
    }

    #[inline]
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Puts every joint back to the identity transform.
    pub fn reset_pose(&mut self) {
        for joint in &mut self.joints {
            joint.transform = Transform::IDENTITY;
        }
    }
}
