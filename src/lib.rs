#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod assets;
pub mod errors;
pub mod poser;
pub mod scene;
pub mod settings;
pub mod utils;

pub use animation::{
    Action, ActionExecuted, AnimationMixer, InterpolationType, JointOverrideMotion, JointPriority,
    Motion, MotionKey, PlaybackState, Sequencer,
};
pub use assets::{LoadReport, PoseDocument, PoseEntry, PoseHeader, PoseStore, SaveMode};
pub use errors::{ErrorCategory, PoseError, Result};
pub use poser::Poser;
pub use scene::{JointSet, OverridableJoint, Skeleton, Transform};
pub use settings::PoserSettings;
pub use utils::Timer;
