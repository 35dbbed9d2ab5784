//! Entrainment core and the drivers built on it.

pub mod components;
pub mod convergence_search;
pub mod coordinator;
pub mod dialogue;
pub mod entrainer;
pub mod feature_channel;
pub mod imitation;
pub mod rate_table;
pub mod transcript;
pub mod turn_tracker;

pub use components::{ComponentId, Convergence, ConvergenceKind, DirectComponent, SynchronyMode};
pub use convergence_search::{ConvergenceSearch, Measurement};
pub use coordinator::ComponentCoordinator;
pub use dialogue::{DialogueSession, FeatureValues, TurnReport, UserTurn};
pub use entrainer::{EntrainmentParams, Entrainer, Weights};
pub use feature_channel::{build_coordinator, FeatureChannel};
pub use imitation::{scale_pitch, Imitator};
pub use rate_table::{RateCalibrator, RateSample, RateTable};
pub use transcript::{FeatureLog, TranscriptEvent, TranscriptKind};
pub use turn_tracker::TurnTracker;
