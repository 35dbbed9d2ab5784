//! Indirect goal components: distance schedulers for linear and exponential
//! convergence (factor < 1) or divergence (factor > 1).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{EntrainmentError, EntrainmentResult};

use super::{ComponentId, DirectGoal, GoalComponent, Scheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceKind {
    /// Change the distance by a fixed fraction of its initial value per turn.
    Linear,
    /// Multiply the distance by the factor every turn.
    Exponential,
}

impl FromStr for ConvergenceKind {
    type Err = EntrainmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear_convergence" | "linear" => Ok(Self::Linear),
            "exponential_convergence" | "exponential" => Ok(Self::Exponential),
            other => Err(EntrainmentError::UnknownComponentKind(other.to_string())),
        }
    }
}

impl fmt::Display for ConvergenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear_convergence"),
            Self::Exponential => f.write_str("exponential_convergence"),
        }
    }
}

/// Unbound description of a scheduler, registered with a coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    pub kind: ConvergenceKind,
    pub target: ComponentId,
    pub factor: f64,
}

impl Convergence {
    pub fn new(kind: ConvergenceKind, target: ComponentId, factor: f64) -> EntrainmentResult<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(EntrainmentError::InvalidParameter {
                name: "factor",
                reason: format!("must be a positive number, got {factor}"),
            });
        }
        Ok(Self {
            kind,
            target,
            factor,
        })
    }

    pub fn linear(target: ComponentId, factor: f64) -> EntrainmentResult<Self> {
        Self::new(ConvergenceKind::Linear, target, factor)
    }

    pub fn exponential(target: ComponentId, factor: f64) -> EntrainmentResult<Self> {
        Self::new(ConvergenceKind::Exponential, target, factor)
    }

    /// Fix the per-turn schedule against the target's current distance.
    pub(crate) fn bind(self, initial_distance: f64) -> IndirectComponent {
        let schedule = match self.kind {
            ConvergenceKind::Linear => {
                // 0.9 on a distance of 100 yields 90, 80, 70; 1.2 on 60 yields 72, 84, 96.
                let step = if self.factor < 1.0 {
                    -(1.0 - self.factor)
                } else {
                    self.factor - 1.0
                };
                Schedule::Linear {
                    delta: step * initial_distance,
                }
            }
            ConvergenceKind::Exponential => Schedule::Exponential {
                factor: self.factor,
            },
        };
        IndirectComponent {
            target: self.target,
            schedule,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Schedule {
    Linear { delta: f64 },
    Exponential { factor: f64 },
}

/// A scheduler bound to one direct component.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectComponent {
    target: ComponentId,
    schedule: Schedule,
}

impl IndirectComponent {
    pub const fn schedule_kind(&self) -> Schedule {
        self.schedule
    }
}

impl GoalComponent for IndirectComponent {
    fn on_output_realized(&mut self, _value: f64) {}
}

impl Scheduler for IndirectComponent {
    fn target(&self) -> ComponentId {
        self.target
    }

    fn schedule(&self, target: &mut dyn DirectGoal) {
        let Some(distance) = target.distance_mut() else {
            return;
        };
        *distance = match self.schedule {
            Schedule::Linear { delta } => (*distance + delta).max(0.0),
            Schedule::Exponential { factor } => factor * *distance,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::components::DirectComponent;

    fn run(convergence: Convergence, initial: f64, turns: usize) -> Vec<f64> {
        let mut target = DirectComponent::local_similarity(1, initial).unwrap();
        let scheduler = convergence.bind(initial);
        (0..turns)
            .map(|_| {
                scheduler.schedule(&mut target);
                target.distance().unwrap()
            })
            .collect()
    }

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "expected {expected:?}, got {actual:?}");
        }
    }

    #[test]
    fn test_linear_convergence() {
        let conv = Convergence::linear(ComponentId(0), 0.9).unwrap();
        assert_all_close(&run(conv, 100.0, 3), &[90.0, 80.0, 70.0]);
    }

    #[test]
    fn test_linear_divergence() {
        let conv = Convergence::linear(ComponentId(0), 1.2).unwrap();
        assert_all_close(&run(conv, 60.0, 3), &[72.0, 84.0, 96.0]);
    }

    #[test]
    fn test_linear_convergence_floors_at_zero() {
        let conv = Convergence::linear(ComponentId(0), 0.5).unwrap();
        assert_all_close(&run(conv, 10.0, 3), &[5.0, 0.0, 0.0]);
    }

    #[test]
    fn test_exponential_convergence() {
        let conv = Convergence::exponential(ComponentId(0), 0.9).unwrap();
        assert_all_close(&run(conv, 100.0, 3), &[90.0, 81.0, 72.9]);
    }

    #[test]
    fn test_exponential_divergence() {
        let conv = Convergence::exponential(ComponentId(0), 1.2).unwrap();
        assert_all_close(&run(conv, 60.0, 3), &[72.0, 86.4, 103.68]);
    }

    #[test]
    fn test_factor_must_be_positive() {
        assert!(matches!(
            Convergence::linear(ComponentId(0), 0.0),
            Err(EntrainmentError::InvalidParameter { name: "factor", .. })
        ));
        assert!(matches!(
            Convergence::exponential(ComponentId(0), -1.0),
            Err(EntrainmentError::InvalidParameter { name: "factor", .. })
        ));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(
            "linear_convergence".parse::<ConvergenceKind>(),
            Ok(ConvergenceKind::Linear)
        );
        assert_eq!(
            "spiral".parse::<ConvergenceKind>(),
            Err(EntrainmentError::UnknownComponentKind("spiral".to_string()))
        );
    }
}
