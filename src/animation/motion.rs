use std::any::Any;

use bitflags::bitflags;
use glam::{Quat, Vec3};

use crate::errors::Result;
use crate::scene::Skeleton;

/// Blend priority band. Higher bands are applied later and win on shared joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum JointPriority {
    Low,
    #[default]
    Medium,
    High,
    Higher,
    Highest,
}

bitflags! {
    /// Channels of a [`JointState`] that contribute to the blended pose.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct JointUsage: u8 {
        const ROTATION = 1 << 0;
        const POSITION = 1 << 1;
        const SCALE    = 1 << 2;
    }
}

/// Values a motion wants a single joint to take this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointState {
    /// Index of the joint in the bound skeleton.
    pub joint_index: usize,
    pub rotation: Quat,
    pub position: Vec3,
    pub scale: Vec3,
    /// Empty usage means the state is ignored by the blender.
    pub usage: JointUsage,
}

impl JointState {
    #[must_use]
    pub fn new(joint_index: usize) -> Self {
        Self {
            joint_index,
            rotation: Quat::IDENTITY,
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            usage: JointUsage::empty(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.usage.is_empty()
    }
}

/// A layer in a character's animation stack.
///
/// The controller initializes a motion once against the character's skeleton,
/// activates it, then calls [`on_update`](Self::on_update) every tick with the
/// motion-local time. The motion publishes its results through
/// [`joint_states`](Self::joint_states); the controller blends them in
/// priority order using the ease-in/ease-out weights.
pub trait Motion: Any {
    fn name(&self) -> &str;

    fn priority(&self) -> JointPriority;

    /// Seconds to ramp the blend weight from 0 to 1 after activation.
    fn ease_in_duration(&self) -> f32;

    /// Seconds to ramp the blend weight from 1 to 0 after deactivation.
    fn ease_out_duration(&self) -> f32;

    /// Binds the motion to a skeleton. Called once before the first activation.
    fn on_initialize(&mut self, skeleton: &Skeleton) -> Result<()>;

    /// Returns `false` to refuse activation.
    fn on_activate(&mut self) -> bool;

    /// Evaluates the motion at `time` seconds since activation.
    /// Returns `false` once the motion has finished.
    fn on_update(&mut self, time: f32, skeleton: &mut Skeleton) -> bool;

    fn on_deactivate(&mut self);

    fn joint_states(&self) -> &[JointState];
}
