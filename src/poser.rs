//! Poser facade
//!
//! One [`Poser`] per posed character. It owns the character's joint override
//! motion (registered in an [`AnimationMixer`]), the pose library and the
//! sequencer, and exposes the operations UI code is built on. Failures are
//! logged and reported as `false`; the caller decides what to show.

use glam::{EulerRot, Quat, Vec3};

use crate::animation::{
    Action, ActionExecuted, AnimationMixer, InterpolationType, JointOverrideMotion, Motion,
    MotionKey, Sequencer,
};
use crate::assets::{PoseEntry, PoseStore, SaveMode};
use crate::errors::Result;
use crate::scene::{OverridableJoint, Skeleton};
use crate::settings::PoserSettings;

pub struct Poser {
    settings: PoserSettings,
    store: PoseStore,
    mixer: AnimationMixer,
    override_key: MotionKey,
    sequencer: Sequencer,
}

impl Poser {
    /// Creates a poser with its own motion controller.
    ///
    /// Fails if `skeleton` lacks a joint of the configured joint set; the
    /// character then has no overrides at all.
    pub fn new(settings: PoserSettings, skeleton: &Skeleton) -> Result<Self> {
        Self::with_mixer(settings, AnimationMixer::new(), skeleton)
    }

    /// Creates a poser on top of an existing controller, e.g. one already
    /// playing the character's base animations.
    pub fn with_mixer(
        settings: PoserSettings,
        mut mixer: AnimationMixer,
        skeleton: &Skeleton,
    ) -> Result<Self> {
        let motion = JointOverrideMotion::new(settings.joint_set)
            .with_ease_out_duration(settings.ease_out_duration);
        let override_key = mixer.add_motion(Box::new(motion), skeleton)?;

        Ok(Self {
            store: PoseStore::new(settings.pose_dir.clone()),
            settings,
            mixer,
            override_key,
            sequencer: Sequencer::new(),
        })
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &PoserSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &PoseStore {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    #[inline]
    #[must_use]
    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    #[must_use]
    pub fn motion(&self) -> &JointOverrideMotion {
        self.mixer
            .motion_as(self.override_key)
            .expect("joint override motion stays registered for the poser's lifetime")
    }

    pub fn motion_mut(&mut self) -> &mut JointOverrideMotion {
        override_motion(&mut self.mixer, self.override_key)
    }

    // ========================================================================
    // Frame update & motion control
    // ========================================================================

    /// Runs one frame: advances the sequencer, then evaluates and blends every
    /// active motion into `skeleton`.
    pub fn update(&mut self, dt: f32, skeleton: &mut Skeleton) -> Option<ActionExecuted> {
        let motion = override_motion(&mut self.mixer, self.override_key);
        let executed = self.sequencer.tick(dt, &self.store, motion);
        self.mixer.update(dt, skeleton);
        executed
    }

    /// Activates the override layer. Override values are kept from the last
    /// activation.
    pub fn start_overrides(&mut self) -> bool {
        self.mixer.start_motion(self.override_key)
    }

    /// Fades the override layer out; values persist for the next start.
    pub fn stop_overrides(&mut self) {
        self.mixer.stop_motion(self.override_key);
    }

    #[must_use]
    pub fn overrides_active(&self) -> bool {
        self.mixer.is_active(self.override_key)
    }

    /// Registers another motion, e.g. a base animation, on the same controller.
    pub fn add_motion(&mut self, motion: Box<dyn Motion>, skeleton: &Skeleton) -> Result<MotionKey> {
        self.mixer.add_motion(motion, skeleton)
    }

    pub fn start_motion(&mut self, key: MotionKey) -> bool {
        self.mixer.start_motion(key)
    }

    pub fn stop_motion(&mut self, key: MotionKey) {
        self.mixer.stop_motion(key);
    }

    // ========================================================================
    // Pose library
    // ========================================================================

    pub fn load_pose(&mut self, name: &str) -> bool {
        let motion = override_motion(&mut self.mixer, self.override_key);
        match self.store.load(name, motion) {
            Ok(_) => true,
            Err(err) => {
                log::warn!("Failed to load pose '{name}': {err}");
                false
            }
        }
    }

    /// Saves the current overrides as `name`, or with `editing` set, rewrites
    /// only the blend header of the existing pose.
    pub fn save_pose(
        &mut self,
        name: &str,
        interpolation: InterpolationType,
        time: f32,
        editing: bool,
    ) -> bool {
        let mode = if editing {
            SaveMode::HeaderOnly
        } else {
            SaveMode::Full
        };
        match self.store.save(name, interpolation, time, mode, self.motion()) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Failed to save pose '{name}': {err}");
                false
            }
        }
    }

    /// Full save using the configured default blend.
    pub fn save_current_pose(&mut self, name: &str) -> bool {
        let interpolation = self.settings.default_interpolation;
        let time = self.settings.default_interpolation_time;
        self.save_pose(name, interpolation, time, false)
    }

    pub fn delete_pose(&self, name: &str) -> bool {
        self.store.delete(name)
    }

    #[must_use]
    pub fn enumerate_poses(&self) -> Vec<PoseEntry> {
        self.store.enumerate()
    }

    // ========================================================================
    // Sequencer
    // ========================================================================

    pub fn start_playback(&mut self) {
        self.sequencer.start_playback();
    }

    pub fn stop_playback(&mut self) {
        self.sequencer.stop_playback();
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    pub fn insert_action(&mut self, action: Action, index: usize) -> usize {
        self.sequencer.insert_action(action, index)
    }

    pub fn remove_action(&mut self, index: usize) -> bool {
        match self.sequencer.remove_action(index) {
            Ok(_) => true,
            Err(err) => {
                log::warn!("Cannot remove action {index}: {err}");
                false
            }
        }
    }

    pub fn clear_actions(&mut self) -> bool {
        match self.sequencer.clear_actions() {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Cannot clear actions: {err}");
                false
            }
        }
    }

    // ========================================================================
    // Joint overrides
    // ========================================================================

    pub fn set_joint_override_enabled(&mut self, joint_name: &str, enabled: bool) -> bool {
        let Some(joint) = self.resolve(joint_name) else {
            return false;
        };
        let motion = self.motion_mut();
        if enabled {
            motion.add_joint_to_state(joint);
        } else {
            motion.remove_joint_state(joint);
        }
        true
    }

    /// Sets a rotation from XYZ Euler angles in radians, snapping the joint.
    pub fn set_joint_target_rotation(&mut self, joint_name: &str, euler: Vec3) -> bool {
        let Some(joint) = self.resolve(joint_name) else {
            return false;
        };
        let rotation = Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z);
        self.motion_mut().set_target_rotation(joint, rotation)
    }

    pub fn set_joint_target_position(&mut self, joint_name: &str, position: Vec3) -> bool {
        let Some(joint) = self.resolve(joint_name) else {
            return false;
        };
        self.motion_mut().set_target_position(joint, position)
    }

    pub fn set_joint_target_scale(&mut self, joint_name: &str, scale: Vec3) -> bool {
        let Some(joint) = self.resolve(joint_name) else {
            return false;
        };
        self.motion_mut().set_target_scale(joint, scale)
    }

    /// Target rotation as XYZ Euler angles, for slider readback.
    #[must_use]
    pub fn joint_target_rotation(&self, joint_name: &str) -> Option<Vec3> {
        let joint = self.resolve(joint_name)?;
        let (x, y, z) = self.motion().target(joint)?.rotation.to_euler(EulerRot::XYZ);
        Some(Vec3::new(x, y, z))
    }

    fn resolve(&self, joint_name: &str) -> Option<OverridableJoint> {
        match self.motion().resolve(joint_name) {
            Ok(joint) => Some(joint),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }
}

fn override_motion(mixer: &mut AnimationMixer, key: MotionKey) -> &mut JointOverrideMotion {
    mixer
        .motion_mut(key)
        .expect("joint override motion stays registered for the poser's lifetime")
}
