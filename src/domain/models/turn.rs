use std::fmt;

use serde::{Deserialize, Serialize};

/// Zero-based index of a system turn within one dialogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurnIndex(pub u64);

impl TurnIndex {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TurnIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bounded response value awaiting realization.
///
/// The turn index must be handed back when the realized output is broadcast,
/// which ties every realization (and the parameter scheduling that follows
/// it) to exactly one proposal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub turn: TurnIndex,
    pub value: f64,
}
