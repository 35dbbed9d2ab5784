//! Component coordinator.
//!
//! Owns the goal components of one feature dimension, combines the direct
//! components' proposals into one bounded response and feeds the realized
//! output back. Each turn follows a fixed protocol:
//!
//! 1. `generate_response` asks every direct component for a proposal and
//!    returns a [`Proposal`] tagged with the current turn.
//! 2. `broadcast_output` hands the realized value for that turn to every
//!    component, then runs every scheduler exactly once and opens the next turn.
//!
//! Calls outside this order are rejected, so scheduling cannot run twice in
//! one turn and proposals cannot pile up without a realized output.

use tracing::{debug, instrument};

use crate::domain::errors::{EntrainmentError, EntrainmentResult};
use crate::domain::models::{Proposal, TurnIndex};

use super::components::{
    ComponentId, Convergence, DirectComponent, DirectGoal, GoalComponent, IndirectComponent,
    Scheduler,
};

#[derive(Debug, Clone)]
pub struct ComponentCoordinator {
    min_bound: f64,
    max_bound: f64,
    direct: Vec<DirectComponent>,
    indirect: Vec<IndirectComponent>,
    turn: TurnIndex,
    pending: Option<Proposal>,
}

impl ComponentCoordinator {
    pub fn new(min_bound: f64, max_bound: f64) -> EntrainmentResult<Self> {
        if !min_bound.is_finite() || !max_bound.is_finite() {
            return Err(EntrainmentError::InvalidParameter {
                name: "bounds",
                reason: format!("must be finite, got [{min_bound}, {max_bound}]"),
            });
        }
        if min_bound > max_bound {
            return Err(EntrainmentError::InvalidParameter {
                name: "min_bound",
                reason: format!("must be less than or equal to max_bound ({max_bound})"),
            });
        }
        Ok(Self {
            min_bound,
            max_bound,
            direct: Vec::new(),
            indirect: Vec::new(),
            turn: TurnIndex::default(),
            pending: None,
        })
    }

    /// Register a direct component; proposals are combined in insertion order.
    pub fn add_component(&mut self, component: DirectComponent) -> ComponentId {
        self.direct.push(component);
        ComponentId(self.direct.len() - 1)
    }

    /// Register a scheduler for one of the direct components.
    ///
    /// The target must already be registered and carry a distance parameter.
    /// A linear schedule's per-turn step is fixed here from the target's
    /// current distance.
    pub fn add_scheduler(&mut self, convergence: Convergence) -> EntrainmentResult<()> {
        let target = self
            .direct
            .get(convergence.target.0)
            .ok_or(EntrainmentError::UnknownComponent(convergence.target.0))?;
        let distance = target
            .distance()
            .ok_or(EntrainmentError::MissingDistance {
                component: convergence.target.0,
            })?;
        self.indirect.push(convergence.bind(distance));
        Ok(())
    }

    /// Combine all direct proposals for `input` into one bounded value.
    #[instrument(level = "debug", skip(self), fields(turn = %self.turn))]
    pub fn generate_response(&mut self, input: f64) -> EntrainmentResult<Proposal> {
        if let Some(pending) = self.pending {
            return Err(EntrainmentError::ProposalPending(pending.turn));
        }
        if self.direct.is_empty() {
            return Err(EntrainmentError::MissingDirectComponent);
        }

        let mut total_weight = 0.0;
        let mut weighted_sum = 0.0;
        for component in &mut self.direct {
            let weight = f64::from(component.weight());
            let proposed = component.propose_output(input);
            debug!(component = component.name(), weight, proposed, "component proposal");
            total_weight += weight;
            weighted_sum += weight * proposed;
        }

        let combined = weighted_sum / total_weight;
        let value = combined.clamp(self.min_bound, self.max_bound);
        debug!(combined, value, "combined response");

        let proposal = Proposal {
            turn: self.turn,
            value,
        };
        self.pending = Some(proposal);
        Ok(proposal)
    }

    /// Report the value realized for `turn` and advance to the next turn.
    #[instrument(level = "debug", skip(self))]
    pub fn broadcast_output(&mut self, turn: TurnIndex, value: f64) -> EntrainmentResult<()> {
        if turn != self.turn {
            return Err(EntrainmentError::TurnOutOfOrder {
                expected: self.turn,
                actual: turn,
            });
        }
        if self.pending.is_none() {
            return Err(EntrainmentError::NoPendingProposal(turn));
        }

        for component in &mut self.direct {
            component.on_output_realized(value);
        }
        for scheduler in &mut self.indirect {
            scheduler.on_output_realized(value);
        }
        for scheduler in &self.indirect {
            // Targets were validated on registration.
            if let Some(target) = self.direct.get_mut(scheduler.target().0) {
                scheduler.schedule(target);
            }
        }

        self.pending = None;
        self.turn = self.turn.next();
        Ok(())
    }

    pub const fn turn(&self) -> TurnIndex {
        self.turn
    }

    pub const fn pending(&self) -> Option<Proposal> {
        self.pending
    }

    pub const fn bounds(&self) -> (f64, f64) {
        (self.min_bound, self.max_bound)
    }

    pub fn component(&self, id: ComponentId) -> Option<&DirectComponent> {
        self.direct.get(id.0)
    }

    pub fn direct_components(&self) -> &[DirectComponent] {
        &self.direct
    }

    pub fn schedulers(&self) -> &[IndirectComponent] {
        &self.indirect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::components::SynchronyMode;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_weighted_mean_of_proposals() {
        let mut coord = ComponentCoordinator::new(0.0, 100.0).unwrap();
        // On a fresh state both propose input - distance: 10 and 30.
        coord.add_component(DirectComponent::local_similarity(1, 30.0).unwrap());
        coord.add_component(DirectComponent::global_similarity(3, 10.0).unwrap());
        let proposal = coord.generate_response(40.0).unwrap();
        // (1 * 10 + 3 * 30) / 4
        assert_close(proposal.value, 25.0);
        assert_eq!(proposal.turn, TurnIndex(0));
    }

    #[test]
    fn test_generate_requires_direct_component() {
        let mut coord = ComponentCoordinator::new(0.0, 100.0).unwrap();
        assert_eq!(
            coord.generate_response(50.0),
            Err(EntrainmentError::MissingDirectComponent)
        );
    }

    #[test]
    fn test_clamps_to_bounds() {
        let mut coord = ComponentCoordinator::new(0.0, 20.0).unwrap();
        coord.add_component(DirectComponent::synchrony(1, SynchronyMode::Synchronize).unwrap());
        // Synchrony passes the first input through.
        assert_close(coord.generate_response(25.0).unwrap().value, 20.0);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(matches!(
            ComponentCoordinator::new(10.0, 1.0),
            Err(EntrainmentError::InvalidParameter {
                name: "min_bound",
                ..
            })
        ));
    }

    #[test]
    fn test_second_proposal_before_realization_is_rejected() {
        let mut coord = ComponentCoordinator::new(0.0, 100.0).unwrap();
        coord.add_component(DirectComponent::local_similarity(1, 1.0).unwrap());
        coord.generate_response(50.0).unwrap();
        assert_eq!(
            coord.generate_response(50.0),
            Err(EntrainmentError::ProposalPending(TurnIndex(0)))
        );
    }

    #[test]
    fn test_broadcast_requires_matching_turn() {
        let mut coord = ComponentCoordinator::new(0.0, 100.0).unwrap();
        coord.add_component(DirectComponent::local_similarity(1, 1.0).unwrap());
        let proposal = coord.generate_response(50.0).unwrap();
        coord.broadcast_output(proposal.turn, proposal.value).unwrap();
        assert_eq!(coord.turn(), TurnIndex(1));

        assert_eq!(
            coord.broadcast_output(proposal.turn, proposal.value),
            Err(EntrainmentError::TurnOutOfOrder {
                expected: TurnIndex(1),
                actual: TurnIndex(0),
            })
        );
        assert_eq!(
            coord.broadcast_output(TurnIndex(1), 50.0),
            Err(EntrainmentError::NoPendingProposal(TurnIndex(1)))
        );
    }

    #[test]
    fn test_scheduler_runs_once_per_turn() {
        let mut coord = ComponentCoordinator::new(0.0, 1000.0).unwrap();
        let id = coord.add_component(DirectComponent::local_similarity(1, 100.0).unwrap());
        coord
            .add_scheduler(Convergence::linear(id, 0.9).unwrap())
            .unwrap();

        for expected in [90.0, 80.0, 70.0] {
            let proposal = coord.generate_response(500.0).unwrap();
            coord.broadcast_output(proposal.turn, proposal.value).unwrap();
            assert_close(coord.component(id).unwrap().distance().unwrap(), expected);
        }
    }

    #[test]
    fn test_scheduler_requires_distance() {
        let mut coord = ComponentCoordinator::new(0.0, 100.0).unwrap();
        let id = coord.add_component(DirectComponent::synchrony(1, SynchronyMode::Synchronize).unwrap());
        assert_eq!(
            coord.add_scheduler(Convergence::exponential(id, 0.5).unwrap()),
            Err(EntrainmentError::MissingDistance { component: 0 })
        );
        assert_eq!(
            coord.add_scheduler(Convergence::exponential(ComponentId(7), 0.5).unwrap()),
            Err(EntrainmentError::UnknownComponent(7))
        );
    }

    #[test]
    fn test_realized_output_reaches_components() {
        let mut coord = ComponentCoordinator::new(0.0, 1000.0).unwrap();
        coord.add_component(DirectComponent::synchrony(1, SynchronyMode::Synchronize).unwrap());
        let first = coord.generate_response(100.0).unwrap();
        // Realized value differs from the proposal.
        coord.broadcast_output(first.turn, 80.0).unwrap();
        let second = coord.generate_response(150.0).unwrap();
        assert_close(second.value, 120.0);
    }
}
