//! Per-feature history of user and system turns.
//!
//! User turns are registered before the system turn that answers them. Several
//! utterances registered for the same turn are merged into one observation by
//! duration-weighted averaging, so the history always holds either as many
//! user turns as system turns or exactly one unanswered user turn.

use tracing::trace;

use crate::domain::errors::{EntrainmentError, EntrainmentResult};
use crate::domain::models::TurnObservation;

#[derive(Debug, Clone, Default)]
pub struct TurnTracker {
    user_turns: Vec<TurnObservation>,
    system_turns: Vec<TurnObservation>,
}

impl TurnTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interlocutor utterance.
    ///
    /// Opens a new user turn if the last one was answered, otherwise merges
    /// into the unanswered turn.
    pub fn register_input(&mut self, value: f64, duration_secs: f64) -> EntrainmentResult<()> {
        let observation = observation(value, duration_secs)?;
        if self.has_unanswered_turn() {
            if let Some(last) = self.user_turns.last_mut() {
                *last = last.merge(observation);
            }
        } else {
            self.user_turns.push(observation);
        }
        trace!(
            user_turns = self.user_turns.len(),
            system_turns = self.system_turns.len(),
            value,
            "registered input"
        );
        Ok(())
    }

    /// Record a realized system utterance.
    ///
    /// Answers the pending user turn, or merges into the last system turn when
    /// there is none.
    pub fn register_output(&mut self, value: f64, duration_secs: f64) -> EntrainmentResult<()> {
        let observation = observation(value, duration_secs)?;
        if self.has_unanswered_turn() {
            self.system_turns.push(observation);
        } else if let Some(last) = self.system_turns.last_mut() {
            *last = last.merge(observation);
        } else {
            return Err(EntrainmentError::OutputBeforeInput);
        }
        trace!(
            user_turns = self.user_turns.len(),
            system_turns = self.system_turns.len(),
            value,
            "registered output"
        );
        Ok(())
    }

    pub fn has_unanswered_turn(&self) -> bool {
        self.system_turns.len() < self.user_turns.len()
    }

    pub fn user_turns(&self) -> &[TurnObservation] {
        &self.user_turns
    }

    pub fn system_turns(&self) -> &[TurnObservation] {
        &self.system_turns
    }

    pub fn last_user(&self) -> Option<TurnObservation> {
        self.user_turns.last().copied()
    }

    pub fn last_system(&self) -> Option<TurnObservation> {
        self.system_turns.last().copied()
    }
}

fn observation(value: f64, duration_secs: f64) -> EntrainmentResult<TurnObservation> {
    if !value.is_finite() {
        return Err(EntrainmentError::InvalidParameter {
            name: "value",
            reason: format!("must be finite, got {value}"),
        });
    }
    if !duration_secs.is_finite() || duration_secs < 0.0 {
        return Err(EntrainmentError::InvalidParameter {
            name: "duration_secs",
            reason: format!("must be a non-negative number of seconds, got {duration_secs}"),
        });
    }
    Ok(TurnObservation::new(value, duration_secs))
}
