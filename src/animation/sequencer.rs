//! Pose Sequencer
//!
//! Plays an ordered list of [`Action`]s: wait for a while, load a pose,
//! jump back to the start. It is polled once per frame through
//! [`Sequencer::tick`] and executes at most one action per tick.
//!
//! Reaching the end of the list stops advancing but leaves the sequencer in
//! the playing state; only [`Sequencer::stop_playback`] returns it to
//! stopped. An action appended while parked at the end runs once the last
//! wait has elapsed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::animation::JointOverrideMotion;
use crate::assets::PoseStore;
use crate::errors::{PoseError, Result};
use crate::utils::Timer;

/// One step of a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Delay the next action by `duration` seconds.
    Wait { duration: f32 },
    /// Jump back to the first action with no delay.
    Repeat,
    /// Load the named pose into the override motion.
    Pose { name: String },
}

impl Action {
    #[must_use]
    pub fn wait(duration: f32) -> Self {
        Self::Wait { duration }
    }

    #[must_use]
    pub fn pose(name: impl Into<String>) -> Self {
        Self::Pose { name: name.into() }
    }
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionExecuted {
    Waited(f32),
    Repeated,
    /// `loaded` is `false` when the pose could not be read; playback continues.
    PoseApplied { name: String, loaded: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    actions: Vec<Action>,
    state: PlaybackState,
    current_index: usize,
    timer: Timer,
    expiry: f32,
}

impl Sequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_actions(actions: Vec<Action>) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Cursor into the action list. Only meaningful while playing.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.is_playing().then_some(self.current_index)
    }

    // ========================================================================
    // Playback
    // ========================================================================

    pub fn start_playback(&mut self) {
        self.current_index = 0;
        self.expiry = 0.0;
        self.timer.start();
        self.state = PlaybackState::Playing;
        log::info!("Sequencer playback started ({} actions)", self.actions.len());
    }

    pub fn stop_playback(&mut self) {
        self.timer.stop();
        self.state = PlaybackState::Stopped;
        log::info!("Sequencer playback stopped");
    }

    /// Advances playback by `dt` seconds and runs the due action, if any.
    ///
    /// A `Pose` action whose file is missing or broken is logged and skipped
    /// over; it never stops playback.
    pub fn tick(
        &mut self,
        dt: f32,
        store: &PoseStore,
        motion: &mut JointOverrideMotion,
    ) -> Option<ActionExecuted> {
        if !self.is_playing() {
            return None;
        }

        self.timer.advance(dt);
        if !self.timer.has_expired(self.expiry) {
            return None;
        }
        self.timer.stop();

        let action = self.actions.get(self.current_index)?.clone();
        log::debug!("Sequencer step {}: {action:?}", self.current_index);

        let executed = match action {
            Action::Wait { duration } => {
                self.expiry = duration;
                self.current_index += 1;
                ActionExecuted::Waited(duration)
            }
            Action::Repeat => {
                self.current_index = 0;
                self.expiry = 0.0;
                ActionExecuted::Repeated
            }
            Action::Pose { name } => {
                self.expiry = 0.0;
                let loaded = match store.load(&name, motion) {
                    Ok(_) => true,
                    Err(err) => {
                        log::warn!("Sequencer could not load pose '{name}': {err}");
                        false
                    }
                };
                self.current_index += 1;
                ActionExecuted::PoseApplied { name, loaded }
            }
        };

        if self.current_index < self.actions.len() {
            self.timer.start();
        }
        Some(executed)
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Inserts `action` before `index`, appending when `index` is past the
    /// end. Allowed during playback; the cursor keeps pointing at the same
    /// pending action. Returns the index the action landed at.
    pub fn insert_action(&mut self, action: Action, index: usize) -> usize {
        let old_len = self.actions.len();
        let index = index.min(old_len);
        self.actions.insert(index, action);

        let shifts_pending = index < self.current_index
            || (index == self.current_index && self.current_index < old_len);
        if self.is_playing() && shifts_pending {
            self.current_index += 1;
        }
        // Playback parked at the end picks the appended action up.
        if self.is_playing() && !self.timer.is_running() && index == self.current_index {
            self.timer.start();
        }
        index
    }

    pub fn push_action(&mut self, action: Action) -> usize {
        self.insert_action(action, self.actions.len())
    }

    /// Removes the action at `index`. Rejected while playing.
    pub fn remove_action(&mut self, index: usize) -> Result<Action> {
        if self.is_playing() {
            return Err(PoseError::PlaybackActive);
        }
        if index >= self.actions.len() {
            return Err(PoseError::ActionIndexOutOfBounds {
                index,
                len: self.actions.len(),
            });
        }
        Ok(self.actions.remove(index))
    }

    /// Empties the action list. Rejected while playing.
    pub fn clear_actions(&mut self) -> Result<()> {
        if self.is_playing() {
            return Err(PoseError::PlaybackActive);
        }
        self.actions.clear();
        Ok(())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.actions)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Replaces the action list with the one stored at `path`.
    /// Rejected while playing.
    pub fn load_json(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.is_playing() {
            return Err(PoseError::PlaybackActive);
        }
        let json = fs::read_to_string(path)?;
        self.actions = serde_json::from_str(&json)?;
        Ok(())
    }
}
