//! Weighted global/local entrainer.
//!
//! Proposes the next system value for one feature as a mix of three terms:
//! a configured default value, a global term that pulls the running system
//! average toward the average of the first `k` user turns, and a local term
//! that follows the most recent user turn. The weights drift by a fixed delta
//! after every proposal, which models convergence toward (or away from) the
//! interlocutor over the course of a dialogue.

use tracing::debug;

use crate::domain::errors::{EntrainmentError, EntrainmentResult};
use crate::domain::models::WeightedConfig;

use super::turn_tracker::TurnTracker;

/// Construction parameters of an [`Entrainer`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntrainmentParams {
    pub default_value: f64,
    pub global_weight: f64,
    pub local_weight: f64,
    pub global_delta: f64,
    pub local_delta: f64,
    pub first_k: usize,
}

impl From<&WeightedConfig> for EntrainmentParams {
    fn from(config: &WeightedConfig) -> Self {
        Self {
            default_value: config.default_value,
            global_weight: config.global_weight,
            local_weight: config.local_weight,
            global_delta: config.global_delta,
            local_delta: config.local_delta,
            first_k: config.first_k,
        }
    }
}

/// Effective weights for one proposal. `default` is whatever is left of 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub global: f64,
    pub local: f64,
    pub default: f64,
}

impl Weights {
    /// Scale `(global, local)` down proportionally if their sum exceeds 1.
    ///
    /// A sum of exactly 1 is kept as is, leaving a default weight of 0.
    pub fn normalized(global: f64, local: f64) -> Self {
        let sum = global + local;
        let (global, local) = if sum > 1.0 {
            (global / sum, local / sum)
        } else {
            (global, local)
        };
        Self {
            global,
            local,
            default: (1.0 - global - local).max(0.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entrainer {
    default_value: f64,
    global_delta: f64,
    local_delta: f64,
    first_k: usize,
    /// Accumulated, unnormalized weights.
    tentative_global: f64,
    tentative_local: f64,
    /// Weights the next new turn will be proposed with.
    weights: Weights,
    /// Weights already consumed by the turn with this many user turns.
    turn_weights: Option<(usize, Weights)>,
    tracker: TurnTracker,
}

impl Entrainer {
    pub fn new(params: EntrainmentParams) -> EntrainmentResult<Self> {
        non_negative("global_weight", params.global_weight)?;
        non_negative("local_weight", params.local_weight)?;
        finite("default_value", params.default_value)?;
        finite("global_delta", params.global_delta)?;
        finite("local_delta", params.local_delta)?;
        if params.first_k == 0 {
            return Err(EntrainmentError::InvalidParameter {
                name: "first_k",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            default_value: params.default_value,
            global_delta: params.global_delta,
            local_delta: params.local_delta,
            first_k: params.first_k,
            tentative_global: params.global_weight,
            tentative_local: params.local_weight,
            weights: Weights::normalized(params.global_weight, params.local_weight),
            turn_weights: None,
            tracker: TurnTracker::new(),
        })
    }

    pub fn register_input(&mut self, value: f64, duration_secs: f64) -> EntrainmentResult<()> {
        self.tracker.register_input(value, duration_secs)
    }

    /// Register the value that was actually realized, which may differ from
    /// the proposal.
    pub fn register_output(&mut self, value: f64, duration_secs: f64) -> EntrainmentResult<()> {
        self.tracker.register_output(value, duration_secs)
    }

    /// Propose the value for the system's reply to the pending user turn.
    ///
    /// With no pending user turn the last realized system value is repeated
    /// (or the default value before any turn exists). Weights advance once per
    /// user turn; proposing again for the same turn reuses that turn's weights.
    pub fn propose_output(&mut self) -> f64 {
        if !self.tracker.has_unanswered_turn() {
            return self
                .tracker
                .last_system()
                .map_or(self.default_value, |turn| turn.value);
        }

        let user_turns = self.tracker.user_turns();
        let turn = user_turns.len();
        let weights = match self.turn_weights {
            Some((t, weights)) if t == turn => weights,
            _ => {
                let weights = self.weights;
                self.advance_weights();
                self.turn_weights = Some((turn, weights));
                weights
            }
        };

        let user_turns = self.tracker.user_turns();
        let k = turn.min(self.first_k);
        let k_average = user_turns[..k].iter().map(|t| t.value).sum::<f64>() / k as f64;
        let output_sum: f64 = self.tracker.system_turns().iter().map(|t| t.value).sum();
        let last_user = user_turns[turn - 1].value;

        // Value needed this turn for the system average to reach the k-average.
        let global = weights.global * (turn as f64).mul_add(k_average, -output_sum);
        let local = weights.local * last_user;
        let proposed = weights.default.mul_add(self.default_value, global + local);

        debug!(
            turn,
            k_average,
            global_weight = weights.global,
            local_weight = weights.local,
            proposed,
            "entrainer proposal"
        );
        proposed
    }

    fn advance_weights(&mut self) {
        self.tentative_global = (self.tentative_global + self.global_delta).max(0.0);
        self.tentative_local = (self.tentative_local + self.local_delta).max(0.0);
        self.weights = Weights::normalized(self.tentative_global, self.tentative_local);
    }

    /// Weights the next user turn will be answered with.
    pub const fn weights(&self) -> Weights {
        self.weights
    }

    pub const fn tracker(&self) -> &TurnTracker {
        &self.tracker
    }
}

fn finite(name: &'static str, value: f64) -> EntrainmentResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EntrainmentError::InvalidParameter {
            name,
            reason: format!("must be finite, got {value}"),
        })
    }
}

fn non_negative(name: &'static str, value: f64) -> EntrainmentResult<()> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(EntrainmentError::InvalidParameter {
            name,
            reason: format!("must be non-negative, got {value}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(global: f64, local: f64, global_delta: f64, local_delta: f64) -> EntrainmentParams {
        EntrainmentParams {
            default_value: 100.0,
            global_weight: global,
            local_weight: local,
            global_delta,
            local_delta,
            first_k: 3,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_default_only() {
        let mut entrainer = Entrainer::new(params(0.0, 0.0, 0.0, 0.0)).unwrap();
        entrainer.register_input(150.0, 1.0).unwrap();
        assert_close(entrainer.propose_output(), 100.0);
    }

    #[test]
    fn test_local_only_follows_last_user_turn() {
        let mut entrainer = Entrainer::new(params(0.0, 1.0, 0.0, 0.0)).unwrap();
        entrainer.register_input(150.0, 1.0).unwrap();
        assert_close(entrainer.propose_output(), 150.0);
        entrainer.register_output(150.0, 1.0).unwrap();
        entrainer.register_input(170.0, 1.0).unwrap();
        assert_close(entrainer.propose_output(), 170.0);
    }

    #[test]
    fn test_global_term_compensates_past_outputs() {
        let mut entrainer = Entrainer::new(params(1.0, 0.0, 0.0, 0.0)).unwrap();
        entrainer.register_input(120.0, 1.0).unwrap();
        assert_close(entrainer.propose_output(), 120.0);
        // The realized output undershot by 20.
        entrainer.register_output(100.0, 1.0).unwrap();
        entrainer.register_input(200.0, 1.0).unwrap();
        // k-average of the first turns is (120 + 200) / 2 = 160, two turns
        // need a sum of 320, 100 is already spent.
        assert_close(entrainer.propose_output(), 220.0);
    }

    #[test]
    fn test_first_k_limits_the_average() {
        let mut entrainer = Entrainer::new(EntrainmentParams {
            first_k: 1,
            ..params(1.0, 0.0, 0.0, 0.0)
        })
        .unwrap();
        entrainer.register_input(120.0, 1.0).unwrap();
        entrainer.propose_output();
        entrainer.register_output(120.0, 1.0).unwrap();
        entrainer.register_input(300.0, 1.0).unwrap();
        // Only the first turn counts toward the average.
        assert_close(entrainer.propose_output(), 120.0);
    }

    #[test]
    fn test_renormalizes_when_weights_exceed_one() {
        let mut entrainer = Entrainer::new(params(0.6, 0.6, 0.0, 0.0)).unwrap();
        entrainer.register_input(100.0, 1.0).unwrap();
        entrainer.propose_output();

        let weights = entrainer.weights();
        assert_close(weights.global, 0.5);
        assert_close(weights.local, 0.5);
        assert_close(weights.default, 0.0);
    }

    #[test]
    fn test_deltas_accumulate_before_renormalization() {
        let mut entrainer = Entrainer::new(params(0.2, 0.3, 0.1, 0.2)).unwrap();
        entrainer.register_input(100.0, 1.0).unwrap();
        entrainer.propose_output();
        let weights = entrainer.weights();
        assert_close(weights.global, 0.3);
        assert_close(weights.local, 0.5);
        assert_close(weights.default, 0.2);

        entrainer.register_output(100.0, 1.0).unwrap();
        entrainer.register_input(100.0, 1.0).unwrap();
        entrainer.propose_output();
        // Tentative 0.4 / 0.7 renormalized together.
        let weights = entrainer.weights();
        assert_close(weights.global, 0.4 / 1.1);
        assert_close(weights.local, 0.7 / 1.1);
        assert_close(weights.default, 0.0);
    }

    #[test]
    fn test_negative_deltas_floor_at_zero() {
        let mut entrainer = Entrainer::new(params(0.1, 0.1, -0.5, 0.0)).unwrap();
        entrainer.register_input(100.0, 1.0).unwrap();
        entrainer.propose_output();
        assert_close(entrainer.weights().global, 0.0);
        assert_close(entrainer.weights().default, 0.9);
    }

    #[test]
    fn test_sum_of_exactly_one_is_not_renormalized() {
        let weights = Weights::normalized(0.25, 0.75);
        assert_close(weights.global, 0.25);
        assert_close(weights.local, 0.75);
        assert_close(weights.default, 0.0);
    }

    #[test]
    fn test_repeated_proposal_reuses_turn_weights() {
        let mut entrainer = Entrainer::new(params(0.2, 0.2, 0.1, 0.1)).unwrap();
        entrainer.register_input(150.0, 1.0).unwrap();
        let first = entrainer.propose_output();
        let second = entrainer.propose_output();
        assert_close(first, second);
        assert_close(entrainer.weights().global, 0.3);
    }

    #[test]
    fn test_answered_turn_repeats_last_output() {
        let mut entrainer = Entrainer::new(params(0.5, 0.5, 0.0, 0.0)).unwrap();
        assert_close(entrainer.propose_output(), 100.0);
        entrainer.register_input(150.0, 1.0).unwrap();
        entrainer.propose_output();
        entrainer.register_output(133.0, 1.0).unwrap();
        assert_close(entrainer.propose_output(), 133.0);
        assert_close(entrainer.propose_output(), 133.0);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(matches!(
            Entrainer::new(params(-0.1, 0.0, 0.0, 0.0)),
            Err(EntrainmentError::InvalidParameter {
                name: "global_weight",
                ..
            })
        ));
        assert!(matches!(
            Entrainer::new(EntrainmentParams {
                first_k: 0,
                ..params(0.1, 0.1, 0.0, 0.0)
            }),
            Err(EntrainmentError::InvalidParameter { name: "first_k", .. })
        ));
        assert!(matches!(
            Entrainer::new(params(0.1, f64::NAN, 0.0, 0.0)),
            Err(EntrainmentError::InvalidParameter {
                name: "local_weight",
                ..
            })
        ));
    }
}
