use glam::{Quat, Vec3};

use crate::scene::OverridableJoint;

/// Override values requested for one joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTarget {
    pub rotation: Quat,
    /// Offset applied only to position-capable joints.
    pub position: Vec3,
    pub scale: Vec3,
}

impl JointTarget {
    /// Identity rotation, no offset, unit scale.
    pub const REST: Self = Self {
        rotation: Quat::IDENTITY,
        position: Vec3::ZERO,
        scale: Vec3::ONE,
    };
}

impl Default for JointTarget {
    fn default() -> Self {
        Self::REST
    }
}

/// Per-character override targets, indexed by [`OverridableJoint::index`].
///
/// Each override motion owns one store, so two posed characters never share
/// targets.
#[derive(Debug, Clone)]
pub struct OverrideStore {
    targets: Vec<JointTarget>,
}

impl OverrideStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            targets: vec![JointTarget::REST; OverridableJoint::COUNT],
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, joint: OverridableJoint) -> &JointTarget {
        &self.targets[joint.index()]
    }

    pub fn set_rotation(&mut self, joint: OverridableJoint, rotation: Quat) {
        self.targets[joint.index()].rotation = rotation.normalize();
    }

    /// Ignored for joints that do not accept positions. Returns whether the
    /// value was stored.
    pub fn set_position(&mut self, joint: OverridableJoint, position: Vec3) -> bool {
        if !joint.supports_position() {
            return false;
        }
        self.targets[joint.index()].position = position;
        true
    }

    pub fn set_scale(&mut self, joint: OverridableJoint, scale: Vec3) {
        self.targets[joint.index()].scale = scale;
    }

    pub fn reset(&mut self, joint: OverridableJoint) {
        self.targets[joint.index()] = JointTarget::REST;
    }

    pub fn reset_all(&mut self) {
        self.targets.fill(JointTarget::REST);
    }

    pub fn iter(&self) -> impl Iterator<Item = (OverridableJoint, &JointTarget)> {
        OverridableJoint::ALL.iter().copied().zip(self.targets.iter())
    }
}

impl Default for OverrideStore {
    fn default() -> Self {
        Self::new()
    }
}
