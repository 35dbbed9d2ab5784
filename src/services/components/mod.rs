//! Goal components that shape one feature's response value.
//!
//! Direct components propose a value for the system's next turn given the
//! interlocutor's latest value; their proposals are combined by weight in the
//! [`ComponentCoordinator`](super::coordinator::ComponentCoordinator).
//! Indirect components never propose a value. They reschedule the distance
//! parameter of one direct component once per turn, turning a fixed
//! (dis)similarity goal into convergence or divergence over time.

pub mod direct;
pub mod indirect;

pub use direct::{
    DirectComponent, DirectStrategy, GlobalSimilarity, LocalSimilarity, Synchrony, SynchronyMode,
};
pub use indirect::{Convergence, ConvergenceKind, IndirectComponent, Schedule};

use serde::{Deserialize, Serialize};

/// Position of a direct component within its coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub usize);

/// Capability shared by every component: observing the realized output.
pub trait GoalComponent {
    /// Called once per turn with the feature value the system actually produced.
    fn on_output_realized(&mut self, value: f64);
}

/// Components that propose a response value.
pub trait DirectGoal: GoalComponent {
    /// Relative weight of this component's proposal.
    fn weight(&self) -> u32;

    /// Propose a response to the interlocutor's latest value.
    ///
    /// Proposals need not lie within any sensible range; only the combined
    /// value is bounded.
    fn propose_output(&mut self, input: f64) -> f64;

    /// Distance parameter a scheduler may adjust, if the strategy has one.
    fn distance_mut(&mut self) -> Option<&mut f64>;
}

/// Components that adjust a direct component's parameters between turns.
pub trait Scheduler: GoalComponent {
    fn target(&self) -> ComponentId;

    /// Apply one turn's worth of adjustment to the target.
    fn schedule(&self, target: &mut dyn DirectGoal);
}
