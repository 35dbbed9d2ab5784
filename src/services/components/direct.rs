//! Direct goal components: global similarity, local similarity, synchrony.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{EntrainmentError, EntrainmentResult};

use super::{DirectGoal, GoalComponent};

/// Keeps the system's running average `distance` away from the interlocutor's.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSimilarity {
    pub distance: f64,
    inter_sum: f64,
    sys_sum: f64,
    turn_count: u64,
}

impl GlobalSimilarity {
    fn propose(&mut self, input: f64) -> f64 {
        // Sign of the previous difference; a tie resolves to -1.
        let sign = if self.inter_sum < self.sys_sum { 1.0 } else { -1.0 };
        self.inter_sum += input;
        self.turn_count += 1;
        (sign * self.turn_count as f64).mul_add(self.distance, self.inter_sum - self.sys_sum)
    }
}

/// Keeps each response `distance` away from the interlocutor's latest value.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSimilarity {
    pub distance: f64,
    last_input: f64,
    last_output: f64,
}

impl LocalSimilarity {
    fn propose(&mut self, input: f64) -> f64 {
        let sign: f64 = if self.last_input < self.last_output { 1.0 } else { -1.0 };
        self.last_input = input;
        sign.mul_add(self.distance, input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynchronyMode {
    /// Mirror the interlocutor's turn-to-turn ratio.
    Synchronize,
    /// Apply the reciprocal ratio.
    Desynchronize,
}

impl FromStr for SynchronyMode {
    type Err = EntrainmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synchronize" => Ok(Self::Synchronize),
            "desynchronize" => Ok(Self::Desynchronize),
            other => Err(EntrainmentError::InvalidParameter {
                name: "mode",
                reason: format!("must be synchronize or desynchronize, got {other:?}"),
            }),
        }
    }
}

impl fmt::Display for SynchronyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synchronize => f.write_str("synchronize"),
            Self::Desynchronize => f.write_str("desynchronize"),
        }
    }
}

/// Follows (or inverts) the ratio between consecutive interlocutor values.
#[derive(Debug, Clone, PartialEq)]
pub struct Synchrony {
    pub mode: SynchronyMode,
    last_input: f64,
    last_output: f64,
}

impl Synchrony {
    fn propose(&mut self, input: f64) -> f64 {
        let proposed = if self.last_input == 0.0 || self.last_output == 0.0 || input == 0.0 {
            // Ratio undefined.
            input
        } else {
            let ratio = match self.mode {
                SynchronyMode::Synchronize => input / self.last_input,
                SynchronyMode::Desynchronize => {
                    let ratio = self.last_input / input;
                    // A monotone interlocutor would otherwise be mirrored.
                    if ratio > 0.95 && ratio <= 1.0 {
                        0.9
                    } else if (1.0..1.05).contains(&ratio) {
                        1.1
                    } else {
                        ratio
                    }
                }
            };
            ratio * self.last_output
        };
        self.last_input = input;
        proposed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectStrategy {
    GlobalSimilarity(GlobalSimilarity),
    LocalSimilarity(LocalSimilarity),
    Synchrony(Synchrony),
}

/// A weighted direct strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectComponent {
    weight: u32,
    strategy: DirectStrategy,
}

impl DirectComponent {
    pub fn global_similarity(weight: u32, distance: f64) -> EntrainmentResult<Self> {
        Ok(Self {
            weight: validate_weight(weight)?,
            strategy: DirectStrategy::GlobalSimilarity(GlobalSimilarity {
                distance: validate_distance(distance)?,
                inter_sum: 0.0,
                sys_sum: 0.0,
                turn_count: 0,
            }),
        })
    }

    pub fn local_similarity(weight: u32, distance: f64) -> EntrainmentResult<Self> {
        Ok(Self {
            weight: validate_weight(weight)?,
            strategy: DirectStrategy::LocalSimilarity(LocalSimilarity {
                distance: validate_distance(distance)?,
                last_input: 0.0,
                last_output: 0.0,
            }),
        })
    }

    pub fn synchrony(weight: u32, mode: SynchronyMode) -> EntrainmentResult<Self> {
        Ok(Self {
            weight: validate_weight(weight)?,
            strategy: DirectStrategy::Synchrony(Synchrony {
                mode,
                last_input: 0.0,
                last_output: 0.0,
            }),
        })
    }

    pub const fn strategy(&self) -> &DirectStrategy {
        &self.strategy
    }

    pub const fn name(&self) -> &'static str {
        match self.strategy {
            DirectStrategy::GlobalSimilarity(_) => "global_similarity",
            DirectStrategy::LocalSimilarity(_) => "local_similarity",
            DirectStrategy::Synchrony(_) => "synchrony",
        }
    }

    pub const fn distance(&self) -> Option<f64> {
        match &self.strategy {
            DirectStrategy::GlobalSimilarity(s) => Some(s.distance),
            DirectStrategy::LocalSimilarity(s) => Some(s.distance),
            DirectStrategy::Synchrony(_) => None,
        }
    }
}

impl GoalComponent for DirectComponent {
    fn on_output_realized(&mut self, value: f64) {
        match &mut self.strategy {
            DirectStrategy::GlobalSimilarity(s) => s.sys_sum += value,
            DirectStrategy::LocalSimilarity(s) => s.last_output = value,
            DirectStrategy::Synchrony(s) => s.last_output = value,
        }
    }
}

impl DirectGoal for DirectComponent {
    fn weight(&self) -> u32 {
        self.weight
    }

    fn propose_output(&mut self, input: f64) -> f64 {
        match &mut self.strategy {
            DirectStrategy::GlobalSimilarity(s) => s.propose(input),
            DirectStrategy::LocalSimilarity(s) => s.propose(input),
            DirectStrategy::Synchrony(s) => s.propose(input),
        }
    }

    fn distance_mut(&mut self) -> Option<&mut f64> {
        match &mut self.strategy {
            DirectStrategy::GlobalSimilarity(s) => Some(&mut s.distance),
            DirectStrategy::LocalSimilarity(s) => Some(&mut s.distance),
            DirectStrategy::Synchrony(_) => None,
        }
    }
}

fn validate_weight(weight: u32) -> EntrainmentResult<u32> {
    if weight == 0 {
        return Err(EntrainmentError::InvalidParameter {
            name: "weight",
            reason: "must be a positive integer".to_string(),
        });
    }
    Ok(weight)
}

fn validate_distance(distance: f64) -> EntrainmentResult<f64> {
    if !distance.is_finite() || distance <= 0.0 {
        return Err(EntrainmentError::InvalidParameter {
            name: "distance",
            reason: format!("must be a positive number, got {distance}"),
        });
    }
    Ok(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_global_similarity_tie_resolves_negative() {
        let mut comp = DirectComponent::global_similarity(1, 5.0).unwrap();
        // 0 < 0 is false, so sign is -1: 10 - 0 + (-1 * 1 * 5)
        assert_close(comp.propose_output(10.0), 5.0);
    }

    #[test]
    fn test_global_similarity_empty_input_tie() {
        let mut comp = DirectComponent::global_similarity(1, 5.0).unwrap();
        assert_close(comp.propose_output(0.0), -5.0);
    }

    #[test]
    fn test_global_similarity_keeps_sign_of_previous_difference() {
        let mut comp = DirectComponent::global_similarity(1, 5.0).unwrap();
        comp.propose_output(10.0);
        comp.on_output_realized(20.0);
        // inter_sum 10 < sys_sum 20, sign +1; inter_sum becomes 22.
        assert_close(comp.propose_output(12.0), 22.0 - 20.0 + 2.0 * 5.0);
    }

    #[test]
    fn test_local_similarity_fresh_state() {
        let mut comp = DirectComponent::local_similarity(1, 3.0).unwrap();
        assert_close(comp.propose_output(10.0), 7.0);
    }

    #[test]
    fn test_local_similarity_follows_last_pair() {
        let mut comp = DirectComponent::local_similarity(1, 3.0).unwrap();
        comp.propose_output(10.0);
        comp.on_output_realized(12.0);
        // last input 10 < last output 12
        assert_close(comp.propose_output(20.0), 23.0);
    }

    #[test]
    fn test_local_similarity_sign_flips_when_output_falls_behind() {
        let mut comp = DirectComponent::local_similarity(1, 2.5).unwrap();
        comp.propose_output(100.0);
        comp.on_output_realized(110.0);
        assert_close(comp.propose_output(90.0), 92.5);
        comp.on_output_realized(80.0);
        // last input 90 > last output 80
        assert_close(comp.propose_output(90.0), 87.5);
    }

    #[test]
    fn test_synchrony_zero_short_circuit() {
        let mut comp = DirectComponent::synchrony(1, SynchronyMode::Synchronize).unwrap();
        assert_close(comp.propose_output(5.0), 5.0);
    }

    #[test]
    fn test_synchrony_mirrors_ratio() {
        let mut comp = DirectComponent::synchrony(1, SynchronyMode::Synchronize).unwrap();
        comp.propose_output(100.0);
        comp.on_output_realized(80.0);
        assert_close(comp.propose_output(150.0), 120.0);
    }

    #[test]
    fn test_desynchrony_inverts_ratio() {
        let mut comp = DirectComponent::synchrony(1, SynchronyMode::Desynchronize).unwrap();
        comp.propose_output(100.0);
        comp.on_output_realized(80.0);
        // 100 / 200 = 0.5
        assert_close(comp.propose_output(200.0), 40.0);
    }

    #[test]
    fn test_desynchrony_pushes_near_unity_ratios_apart() {
        let mut comp = DirectComponent::synchrony(1, SynchronyMode::Desynchronize).unwrap();
        comp.propose_output(100.0);
        comp.on_output_realized(100.0);
        // 100 / 102 lies in (0.95, 1.0]
        assert_close(comp.propose_output(102.0), 90.0);
        // 102 / 100 lies in [1.0, 1.05)
        assert_close(comp.propose_output(100.0), 110.0);
        // exactly 1.0 takes the lower clamp
        assert_close(comp.propose_output(100.0), 90.0);
    }

    #[test]
    fn test_construction_validation() {
        assert!(matches!(
            DirectComponent::global_similarity(0, 1.0),
            Err(EntrainmentError::InvalidParameter { name: "weight", .. })
        ));
        assert!(matches!(
            DirectComponent::local_similarity(1, 0.0),
            Err(EntrainmentError::InvalidParameter {
                name: "distance",
                ..
            })
        ));
        assert!(matches!(
            DirectComponent::local_similarity(1, f64::INFINITY),
            Err(EntrainmentError::InvalidParameter {
                name: "distance",
                ..
            })
        ));
        assert!("sometimes".parse::<SynchronyMode>().is_err());
    }

    #[test]
    fn test_only_similarity_components_expose_distance() {
        let mut sync = DirectComponent::synchrony(1, SynchronyMode::Synchronize).unwrap();
        assert!(sync.distance_mut().is_none());
        let mut local = DirectComponent::local_similarity(2, 4.0).unwrap();
        *local.distance_mut().unwrap() = 1.0;
        assert_eq!(local.distance(), Some(1.0));
    }
}
