mod values;
pub mod mixer;
pub mod motion;
pub mod override_motion;
pub mod override_store;
pub mod sequencer;

pub use mixer::{AnimationMixer, MotionKey};
pub use motion::{JointPriority, JointState, JointUsage, Motion};
pub use override_motion::{
    DEFAULT_EASE_OUT_DURATION, EASE_IN_DURATION, JointOverrideMotion, OVERRIDE_MOTION_NAME,
    SlotView,
};
pub use override_store::{JointTarget, OverrideStore};
pub use sequencer::{Action, ActionExecuted, PlaybackState, Sequencer};
pub use values::{Interpolatable, InterpolationType};
