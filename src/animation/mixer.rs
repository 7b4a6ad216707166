use std::any::Any;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::animation::motion::{JointPriority, JointUsage, Motion};
use crate::errors::Result;
use crate::scene::Skeleton;

new_key_type! {
    pub struct MotionKey;
}

struct MotionInstance {
    motion: Box<dyn Motion>,
    active: bool,
    /// Seconds since activation.
    time: f32,
    /// Motion time at which ease-out began.
    stop_time: Option<f32>,
    weight: f32,
}

impl MotionInstance {
    fn blend_weight(&self) -> f32 {
        let ease_in = self.motion.ease_in_duration();
        let weight_in = if ease_in > 0.0 {
            (self.time / ease_in).min(1.0)
        } else {
            1.0
        };

        let weight_out = match self.stop_time {
            None => 1.0,
            Some(stop_time) => {
                let ease_out = self.motion.ease_out_duration();
                if ease_out > 0.0 {
                    1.0 - ((self.time - stop_time) / ease_out).min(1.0)
                } else {
                    0.0
                }
            }
        };

        (weight_in * weight_out).clamp(0.0, 1.0)
    }
}

/// Per-character motion controller.
///
/// Owns the character's motions, tracks their activation and ease weights,
/// and blends their joint states into the skeleton in priority order every
/// tick. Lower priority bands are applied first so higher bands overwrite
/// them on shared joints.
pub struct AnimationMixer {
    motions: SlotMap<MotionKey, MotionInstance>,
}

impl AnimationMixer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            motions: SlotMap::with_key(),
        }
    }

    /// Initializes `motion` against `skeleton` and registers it, inactive.
    ///
    /// A motion that fails to initialize is dropped and never becomes
    /// available on this character.
    pub fn add_motion(
        &mut self,
        mut motion: Box<dyn Motion>,
        skeleton: &Skeleton,
    ) -> Result<MotionKey> {
        if let Err(err) = motion.on_initialize(skeleton) {
            log::warn!("Motion '{}' failed to initialize: {err}", motion.name());
            return Err(err);
        }
        Ok(self.motions.insert(MotionInstance {
            motion,
            active: false,
            time: 0.0,
            stop_time: None,
            weight: 0.0,
        }))
    }

    pub fn remove_motion(&mut self, key: MotionKey) -> Option<Box<dyn Motion>> {
        let mut instance = self.motions.remove(key)?;
        if instance.active {
            instance.motion.on_deactivate();
        }
        Some(instance.motion)
    }

    /// Activates a motion. Restarting a motion that is easing out cancels the
    /// ease-out without resetting its time.
    pub fn start_motion(&mut self, key: MotionKey) -> bool {
        let Some(instance) = self.motions.get_mut(key) else {
            return false;
        };

        if instance.active {
            instance.stop_time = None;
            return true;
        }
        if !instance.motion.on_activate() {
            return false;
        }
        instance.active = true;
        instance.time = 0.0;
        instance.stop_time = None;
        instance.weight = instance.blend_weight();
        true
    }

    /// Begins easing the motion out. It is deactivated once its weight reaches zero.
    pub fn stop_motion(&mut self, key: MotionKey) {
        if let Some(instance) = self.motions.get_mut(key)
            && instance.active
            && instance.stop_time.is_none()
        {
            instance.stop_time = Some(instance.time);
        }
    }

    #[must_use]
    pub fn is_active(&self, key: MotionKey) -> bool {
        self.motions.get(key).is_some_and(|instance| instance.active)
    }

    /// Blend weight used during the last update.
    #[must_use]
    pub fn weight(&self, key: MotionKey) -> f32 {
        self.motions.get(key).map_or(0.0, |instance| instance.weight)
    }

    #[must_use]
    pub fn motion(&self, key: MotionKey) -> Option<&dyn Motion> {
        self.motions.get(key).map(|instance| instance.motion.as_ref())
    }

    /// Typed access to a registered motion.
    #[must_use]
    pub fn motion_as<M: Motion>(&self, key: MotionKey) -> Option<&M> {
        let motion: &dyn Any = &*self.motions.get(key)?.motion;
        motion.downcast_ref::<M>()
    }

    pub fn motion_mut<M: Motion>(&mut self, key: MotionKey) -> Option<&mut M> {
        let instance = self.motions.get_mut(key)?;
        let motion: &mut dyn Any = &mut *instance.motion;
        motion.downcast_mut::<M>()
    }

    pub fn update(&mut self, dt: f32, skeleton: &mut Skeleton) {
        // 1. Advance time and evaluate every active motion
        for (_key, instance) in &mut self.motions {
            if !instance.active {
                continue;
            }
            instance.time += dt;
            instance.weight = instance.blend_weight();

            if instance.stop_time.is_some() && instance.weight <= 0.0 {
                instance.active = false;
                instance.stop_time = None;
                instance.motion.on_deactivate();
                continue;
            }

            if !instance.motion.on_update(instance.time, skeleton) && instance.stop_time.is_none() {
                instance.stop_time = Some(instance.time);
            }
        }

        // 2. Blend in priority order
        let mut order: SmallVec<[(JointPriority, MotionKey); 8]> = self
            .motions
            .iter()
            .filter(|(_, instance)| instance.active && instance.weight > 0.0)
            .map(|(key, instance)| (instance.motion.priority(), key))
            .collect();
        order.sort_by_key(|(priority, _)| *priority);

        for (_, key) in order {
            let instance = &self.motions[key];
            let weight = instance.weight;

            for state in instance.motion.joint_states() {
                if !state.is_active() {
                    continue;
                }
                let Some(joint) = skeleton.get_mut(state.joint_index) else {
                    continue;
                };
                let has_position = joint.has_position();
                let transform = &mut joint.transform;

                if state.usage.contains(JointUsage::ROTATION) {
                    transform.rotation = if weight >= 1.0 {
                        state.rotation
                    } else {
                        transform.rotation.slerp(state.rotation, weight)
                    };
                }
                if state.usage.contains(JointUsage::POSITION) && has_position {
                    transform.position = transform.position.lerp(state.position, weight);
                }
                if state.usage.contains(JointUsage::SCALE) {
                    transform.scale = transform.scale.lerp(state.scale, weight);
                }
            }
        }
    }
}

impl Default for AnimationMixer {
    fn default() -> Self {
        Self::new()
    }
}
