//! Joint Override Motion
//!
//! A persistent animation layer that pins selected joints to user-chosen
//! values. It never finishes on its own: while active it republishes the
//! current override of every enabled slot each tick, at the highest priority
//! band, so it wins over whatever the base animation stack plays on the same
//! joints.
//!
//! Two ways of changing values coexist:
//! - `set_target_*` snap the joint to the new value (slider edits).
//! - `slew_target_*` followed by [`start_interpolation_timer`] move every
//!   slot from its current value to the staged target along the configured
//!   [`InterpolationType`] (bulk pose loads).
//!
//! Scale always snaps.
//!
//! [`start_interpolation_timer`]: JointOverrideMotion::start_interpolation_timer

use glam::{Quat, Vec3};

use crate::animation::motion::{JointPriority, JointState, JointUsage, Motion};
use crate::animation::override_store::{JointTarget, OverrideStore};
use crate::animation::values::{Interpolatable, InterpolationType};
use crate::errors::{PoseError, Result};
use crate::scene::{JointSet, OverridableJoint, Skeleton};
use crate::utils::Timer;

pub const OVERRIDE_MOTION_NAME: &str = "joint_override";

/// Ease-in is effectively instant so a freshly activated override shows at once.
pub const EASE_IN_DURATION: f32 = 0.0;

/// Default ease-out so releasing the override does not snap.
pub const DEFAULT_EASE_OUT_DURATION: f32 = 0.5;

/// Angle (radians) and distance under which a spherical slew counts as done.
const CONVERGENCE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone)]
struct OverrideSlot {
    joint: OverridableJoint,
    enabled: bool,
    /// Values being written this tick. Lags the target while slewing.
    rotation: Quat,
    position: Vec3,
    /// Values captured when the current slew started.
    start_rotation: Quat,
    start_position: Vec3,
}

impl OverrideSlot {
    fn new(joint: OverridableJoint) -> Self {
        Self {
            joint,
            enabled: false,
            rotation: Quat::IDENTITY,
            position: Vec3::ZERO,
            start_rotation: Quat::IDENTITY,
            start_position: Vec3::ZERO,
        }
    }

    fn usage(&self) -> JointUsage {
        if !self.enabled {
            return JointUsage::empty();
        }
        let mut usage = JointUsage::ROTATION | JointUsage::SCALE;
        if self.joint.supports_position() {
            usage |= JointUsage::POSITION;
        }
        usage
    }
}

/// Read-only view of one bound slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotView {
    pub joint: OverridableJoint,
    pub enabled: bool,
    pub target: JointTarget,
}

pub struct JointOverrideMotion {
    joint_set: JointSet,
    ease_out_duration: f32,

    store: OverrideStore,

    // `slots` and `states` are parallel; `slot_lookup` maps joint index to slot.
    slots: Vec<OverrideSlot>,
    states: Vec<JointState>,
    slot_lookup: Vec<Option<usize>>,

    interpolation: InterpolationType,
    interpolation_time: f32,
    slew_timer: Timer,
    last_time: f32,
}

impl JointOverrideMotion {
    #[must_use]
    pub fn new(joint_set: JointSet) -> Self {
        Self {
            joint_set,
            ease_out_duration: DEFAULT_EASE_OUT_DURATION,
            store: OverrideStore::new(),
            slots: Vec::new(),
            states: Vec::new(),
            slot_lookup: vec![None; OverridableJoint::COUNT],
            interpolation: InterpolationType::None,
            interpolation_time: 0.0,
            slew_timer: Timer::new(),
            last_time: 0.0,
        }
    }

    #[must_use]
    pub fn with_ease_out_duration(mut self, seconds: f32) -> Self {
        self.ease_out_duration = seconds.max(0.0);
        self
    }

    #[inline]
    #[must_use]
    pub fn joint_set(&self) -> JointSet {
        self.joint_set
    }

    /// `true` once [`on_initialize`](Motion::on_initialize) has bound the slots.
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.slots.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &OverrideStore {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn is_bound(&self, joint: OverridableJoint) -> bool {
        self.slot_lookup[joint.index()].is_some()
    }

    /// Bound slots in joint index order.
    pub fn slots(&self) -> impl Iterator<Item = SlotView> + '_ {
        self.slots.iter().map(|slot| SlotView {
            joint: slot.joint,
            enabled: slot.enabled,
            target: *self.store.get(slot.joint),
        })
    }

    #[must_use]
    pub fn target(&self, joint: OverridableJoint) -> Option<&JointTarget> {
        self.is_bound(joint).then(|| self.store.get(joint))
    }

    /// Rotation written this tick, which trails the target during a slew.
    #[must_use]
    pub fn current_rotation(&self, joint: OverridableJoint) -> Option<Quat> {
        self.slot(joint).map(|slot| slot.rotation)
    }

    #[must_use]
    pub fn current_position(&self, joint: OverridableJoint) -> Option<Vec3> {
        self.slot(joint).map(|slot| slot.position)
    }

    #[must_use]
    pub fn is_enabled(&self, joint: OverridableJoint) -> bool {
        self.slot(joint).is_some_and(|slot| slot.enabled)
    }

    // ========================================================================
    // Slot enable / disable
    // ========================================================================

    /// Starts contributing the joint's override. Returns `true` if the slot
    /// changed state.
    pub fn add_joint_to_state(&mut self, joint: OverridableJoint) -> bool {
        self.set_slot_enabled(joint, true)
    }

    /// Hands the joint back to the base animation stack, keeping its
    /// override values. Returns `true` if the slot changed state.
    pub fn remove_joint_state(&mut self, joint: OverridableJoint) -> bool {
        self.set_slot_enabled(joint, false)
    }

    fn set_slot_enabled(&mut self, joint: OverridableJoint, enabled: bool) -> bool {
        let Some(i) = self.slot_lookup[joint.index()] else {
            return false;
        };
        if self.slots[i].enabled == enabled {
            return false;
        }
        self.slots[i].enabled = enabled;
        self.states[i].usage = self.slots[i].usage();
        true
    }

    // ========================================================================
    // Target writes
    // ========================================================================

    /// Sets the rotation target and snaps the joint to it.
    /// Returns `false` if the joint is not bound.
    pub fn set_target_rotation(&mut self, joint: OverridableJoint, rotation: Quat) -> bool {
        let Some(i) = self.slot_lookup[joint.index()] else {
            return false;
        };
        self.store.set_rotation(joint, rotation);
        let rotation = self.store.get(joint).rotation;
        let slot = &mut self.slots[i];
        slot.rotation = rotation;
        slot.start_rotation = rotation;
        true
    }

    /// Sets the position target and snaps the joint to it. Returns `false` if
    /// the joint is not bound or does not accept positions.
    pub fn set_target_position(&mut self, joint: OverridableJoint, position: Vec3) -> bool {
        let Some(i) = self.slot_lookup[joint.index()] else {
            return false;
        };
        if !self.store.set_position(joint, position) {
            return false;
        }
        let slot = &mut self.slots[i];
        slot.position = position;
        slot.start_position = position;
        true
    }

    pub fn set_target_scale(&mut self, joint: OverridableJoint, scale: Vec3) -> bool {
        if !self.is_bound(joint) {
            return false;
        }
        self.store.set_scale(joint, scale);
        true
    }

    /// Stages a rotation target without moving the joint. The next
    /// [`start_interpolation_timer`](Self::start_interpolation_timer) carries
    /// the joint over. Without one, the joint snaps to the staged target on
    /// the next update, since an idle motion always holds its targets.
    pub fn slew_target_rotation(&mut self, joint: OverridableJoint, rotation: Quat) -> bool {
        if !self.is_bound(joint) {
            return false;
        }
        self.store.set_rotation(joint, rotation);
        true
    }

    pub fn slew_target_position(&mut self, joint: OverridableJoint, position: Vec3) -> bool {
        self.is_bound(joint) && self.store.set_position(joint, position)
    }

    /// Restores the rest target of one joint and snaps to it.
    /// The enabled flag is left alone.
    pub fn reset_joint(&mut self, joint: OverridableJoint) {
        self.store.reset(joint);
        if let Some(i) = self.slot_lookup[joint.index()] {
            let slot = &mut self.slots[i];
            slot.rotation = Quat::IDENTITY;
            slot.position = Vec3::ZERO;
            slot.start_rotation = Quat::IDENTITY;
            slot.start_position = Vec3::ZERO;
        }
    }

    pub fn reset_all(&mut self) {
        self.slew_timer.stop();
        for joint in OverridableJoint::ALL {
            self.reset_joint(*joint);
        }
    }

    // ========================================================================
    // Interpolation
    // ========================================================================

    pub fn set_interpolation_type(&mut self, interpolation: InterpolationType) {
        self.interpolation = interpolation;
    }

    pub fn set_interpolation_time(&mut self, seconds: f32) {
        self.interpolation_time = seconds;
    }

    #[inline]
    #[must_use]
    pub fn interpolation_type(&self) -> InterpolationType {
        self.interpolation
    }

    #[inline]
    #[must_use]
    pub fn interpolation_time(&self) -> f32 {
        self.interpolation_time
    }

    /// `true` while a slew towards staged targets is in progress.
    #[inline]
    #[must_use]
    pub fn is_interpolating(&self) -> bool {
        self.slew_timer.is_running()
    }

    /// Begins moving every slot from its current value towards its target.
    ///
    /// With [`InterpolationType::None`], or a linear time of zero, the slots
    /// snap immediately.
    pub fn start_interpolation_timer(&mut self) {
        for slot in &mut self.slots {
            slot.start_rotation = slot.rotation;
            slot.start_position = slot.position;
        }

        let instant = match self.interpolation {
            InterpolationType::None => true,
            InterpolationType::Linear => self.interpolation_time <= 0.0,
            InterpolationType::Spherical => false,
        };
        if instant {
            self.slew_timer.stop();
            self.snap_to_targets();
        } else {
            self.slew_timer.start();
        }
    }

    fn snap_to_targets(&mut self) {
        for slot in &mut self.slots {
            let target = self.store.get(slot.joint);
            slot.rotation = target.rotation;
            slot.position = target.position;
        }
    }

    fn advance_slew(&mut self, dt: f32) {
        if !self.slew_timer.is_running() {
            self.snap_to_targets();
            return;
        }
        self.slew_timer.advance(dt);

        match self.interpolation {
            InterpolationType::None => {
                self.slew_timer.stop();
                self.snap_to_targets();
            }
            InterpolationType::Linear => {
                let t = (self.slew_timer.elapsed() / self.interpolation_time).min(1.0);
                for slot in &mut self.slots {
                    let target = self.store.get(slot.joint);
                    slot.rotation = Quat::interpolate_linear(slot.start_rotation, target.rotation, t);
                    slot.position = Vec3::interpolate_linear(slot.start_position, target.position, t);
                }
                if t >= 1.0 {
                    self.slew_timer.stop();
                    self.snap_to_targets();
                }
            }
            InterpolationType::Spherical => {
                // Fixed per-tick factor, so the approach is exponential.
                let factor = InterpolationType::Spherical.clamp_time(self.interpolation_time);
                let mut converged = true;
                for slot in &mut self.slots {
                    let target = self.store.get(slot.joint);
                    slot.rotation = Quat::interpolate_spherical(slot.rotation, target.rotation, factor);
                    slot.position = Vec3::interpolate_spherical(slot.position, target.position, factor);
                    converged &= <Quat as Interpolatable>::distance(slot.rotation, target.rotation)
                        < CONVERGENCE_EPSILON
                        && <Vec3 as Interpolatable>::distance(slot.position, target.position)
                            < CONVERGENCE_EPSILON;
                }
                if converged {
                    self.slew_timer.stop();
                    self.snap_to_targets();
                }
            }
        }
    }

    fn slot(&self, joint: OverridableJoint) -> Option<&OverrideSlot> {
        self.slot_lookup[joint.index()].map(|i| &self.slots[i])
    }

    /// Looks a bound joint up by skeleton name.
    pub fn resolve(&self, name: &str) -> Result<OverridableJoint> {
        OverridableJoint::from_name(name)
            .filter(|joint| self.is_bound(*joint))
            .ok_or_else(|| PoseError::UnknownJoint(name.to_string()))
    }
}

impl Motion for JointOverrideMotion {
    fn name(&self) -> &str {
        OVERRIDE_MOTION_NAME
    }

    fn priority(&self) -> JointPriority {
        JointPriority::Highest
    }

    fn ease_in_duration(&self) -> f32 {
        EASE_IN_DURATION
    }

    fn ease_out_duration(&self) -> f32 {
        self.ease_out_duration
    }

    fn on_initialize(&mut self, skeleton: &Skeleton) -> Result<()> {
        let mut slots = Vec::new();
        let mut states = Vec::new();
        for joint in self.joint_set.joints() {
            let joint_index =
                skeleton
                    .joint_index(joint.name())
                    .ok_or_else(|| PoseError::MissingJoint {
                        joint: joint.name(),
                        skeleton: skeleton.name.clone(),
                    })?;
            slots.push(OverrideSlot::new(joint));
            states.push(JointState::new(joint_index));
        }

        self.slot_lookup.fill(None);
        for (i, slot) in slots.iter().enumerate() {
            self.slot_lookup[slot.joint.index()] = Some(i);
        }
        self.slots = slots;
        self.states = states;
        self.slew_timer.stop();
        self.snap_to_targets();

        log::debug!(
            "Joint override bound {} joints on '{}'",
            self.slots.len(),
            skeleton.name
        );
        Ok(())
    }

    fn on_activate(&mut self) -> bool {
        self.last_time = 0.0;
        true
    }

    fn on_update(&mut self, time: f32, skeleton: &mut Skeleton) -> bool {
        let dt = (time - self.last_time).max(0.0);
        self.last_time = time;
        self.advance_slew(dt);

        for (slot, state) in self.slots.iter().zip(self.states.iter_mut()) {
            state.usage = slot.usage();
            if !slot.enabled {
                continue;
            }
            state.rotation = slot.rotation;
            state.position = slot.position;
            state.scale = self.store.get(slot.joint).scale;

            if let Some(joint) = skeleton.get_mut(state.joint_index) {
                joint.target_rotation = slot.rotation;
                if joint.has_position() {
                    joint.target_position = slot.position;
                }
            }
        }

        true
    }

    fn on_deactivate(&mut self) {}

    fn joint_states(&self) -> &[JointState] {
        &self.states
    }
}
