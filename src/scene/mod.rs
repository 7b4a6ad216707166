//! Skeleton access module
//!
//! The character-side data the override layer reads and writes:
//! - Transform: local position, rotation, scale of a joint
//! - Skeleton / Joint: joint storage with name and index lookup
//! - OverridableJoint: the fixed table of joints the override motion drives

pub mod joints;
pub mod skeleton;
pub mod transform;

// Re-export commonly used types
pub use joints::{JointCategory, JointSet, OverridableJoint};
pub use skeleton::{Joint, Skeleton};
pub use transform::Transform;
