//! One feature dimension of a dialogue: turn history plus response strategy.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::errors::{EntrainmentError, EntrainmentResult};
use crate::domain::models::{ComponentConfig, ComponentsConfig, Feature, FeatureConfig};

use super::components::{ComponentId, Convergence, ConvergenceKind, DirectComponent, SynchronyMode};
use super::coordinator::ComponentCoordinator;
use super::entrainer::{EntrainmentParams, Entrainer};
use super::turn_tracker::TurnTracker;

#[derive(Debug, Clone)]
enum Policy {
    Weighted(Entrainer),
    Components {
        coordinator: ComponentCoordinator,
        tracker: TurnTracker,
    },
}

/// Register user input, propose a response, register the realized output.
#[derive(Debug, Clone)]
pub struct FeatureChannel {
    feature: Feature,
    policy: Policy,
}

impl FeatureChannel {
    pub const fn weighted(feature: Feature, entrainer: Entrainer) -> Self {
        Self {
            feature,
            policy: Policy::Weighted(entrainer),
        }
    }

    pub fn components(feature: Feature, coordinator: ComponentCoordinator) -> Self {
        Self {
            feature,
            policy: Policy::Components {
                coordinator,
                tracker: TurnTracker::new(),
            },
        }
    }

    pub fn from_config(feature: Feature, config: &FeatureConfig) -> EntrainmentResult<Self> {
        match config {
            FeatureConfig::Weighted(weighted) => Ok(Self::weighted(
                feature,
                Entrainer::new(EntrainmentParams::from(weighted))?,
            )),
            FeatureConfig::Components(components) => {
                Ok(Self::components(feature, build_coordinator(components)?))
            }
        }
    }

    pub const fn feature(&self) -> Feature {
        self.feature
    }

    pub fn register_input(&mut self, value: f64, duration_secs: f64) -> EntrainmentResult<()> {
        match &mut self.policy {
            Policy::Weighted(entrainer) => entrainer.register_input(value, duration_secs),
            Policy::Components { tracker, .. } => tracker.register_input(value, duration_secs),
        }
    }

    /// Target value for the system's reply.
    ///
    /// Asking again before the output is registered returns the same target.
    pub fn propose(&mut self) -> EntrainmentResult<f64> {
        let value = match &mut self.policy {
            Policy::Weighted(entrainer) => entrainer.propose_output(),
            Policy::Components {
                coordinator,
                tracker,
            } => {
                if let Some(pending) = coordinator.pending() {
                    pending.value
                } else if tracker.has_unanswered_turn() {
                    let input = tracker.last_user().ok_or(EntrainmentError::NoInput)?;
                    coordinator.generate_response(input.value)?.value
                } else {
                    tracker.last_system().ok_or(EntrainmentError::NoInput)?.value
                }
            }
        };
        debug!(feature = %self.feature, value, "proposed target");
        Ok(value)
    }

    /// Register a realized system utterance.
    ///
    /// A components channel only accepts the answer to a user turn after
    /// `propose`, so every answered turn reaches the components.
    pub fn register_output(&mut self, value: f64, duration_secs: f64) -> EntrainmentResult<()> {
        match &mut self.policy {
            Policy::Weighted(entrainer) => entrainer.register_output(value, duration_secs),
            Policy::Components {
                coordinator,
                tracker,
            } => match coordinator.pending() {
                Some(pending) => {
                    tracker.register_output(value, duration_secs)?;
                    coordinator.broadcast_output(pending.turn, value)
                }
                None if tracker.has_unanswered_turn() => {
                    Err(EntrainmentError::NoPendingProposal(coordinator.turn()))
                }
                // Further utterances of the same turn only extend the history.
                None => tracker.register_output(value, duration_secs),
            },
        }
    }

    pub const fn tracker(&self) -> &TurnTracker {
        match &self.policy {
            Policy::Weighted(entrainer) => entrainer.tracker(),
            Policy::Components { tracker, .. } => tracker,
        }
    }
}

/// Build a coordinator from its configuration.
///
/// Scheduler `target`s name positions in the component list, which may
/// appear before or after the scheduler itself.
pub fn build_coordinator(config: &ComponentsConfig) -> EntrainmentResult<ComponentCoordinator> {
    let mut coordinator = ComponentCoordinator::new(config.min_bound, config.max_bound)?;
    let mut ids: HashMap<usize, ComponentId> = HashMap::new();
    let mut schedulers = Vec::new();

    for (position, component) in config.components.iter().enumerate() {
        match component.kind.as_str() {
            "global_similarity" => {
                let built = DirectComponent::global_similarity(
                    required_weight(component)?,
                    required(component.distance, "distance")?,
                )?;
                ids.insert(position, coordinator.add_component(built));
            }
            "local_similarity" => {
                let built = DirectComponent::local_similarity(
                    required_weight(component)?,
                    required(component.distance, "distance")?,
                )?;
                ids.insert(position, coordinator.add_component(built));
            }
            "synchrony" => {
                let mode: SynchronyMode = required(component.mode.as_deref(), "mode")?.parse()?;
                let built = DirectComponent::synchrony(required_weight(component)?, mode)?;
                ids.insert(position, coordinator.add_component(built));
            }
            other => {
                let kind: ConvergenceKind = other.parse()?;
                schedulers.push((kind, component));
            }
        }
    }

    for (kind, component) in schedulers {
        let position = required(component.target, "target")?;
        let target = *ids
            .get(&position)
            .ok_or(EntrainmentError::UnknownComponent(position))?;
        let factor = required(component.factor, "factor")?;
        coordinator.add_scheduler(Convergence::new(kind, target, factor)?)?;
    }

    Ok(coordinator)
}

fn required<T>(value: Option<T>, name: &'static str) -> EntrainmentResult<T> {
    value.ok_or_else(|| EntrainmentError::InvalidParameter {
        name,
        reason: "is required".to_string(),
    })
}

fn required_weight(component: &ComponentConfig) -> EntrainmentResult<u32> {
    let weight = required(component.weight, "weight")?;
    u32::try_from(weight)
        .ok()
        .filter(|w| *w > 0)
        .ok_or_else(|| EntrainmentError::InvalidParameter {
            name: "weight",
            reason: format!("must be a positive integer, got {weight}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::WeightedConfig;

    fn component(kind: &str) -> ComponentConfig {
        ComponentConfig {
            kind: kind.to_string(),
            ..Default::default()
        }
    }

    fn sample_config() -> ComponentsConfig {
        ComponentsConfig {
            min_bound: 50.0,
            max_bound: 300.0,
            components: vec![
                ComponentConfig {
                    target: Some(1),
                    factor: Some(0.5),
                    ..component("exponential_convergence")
                },
                ComponentConfig {
                    weight: Some(1),
                    distance: Some(20.0),
                    ..component("local_similarity")
                },
                ComponentConfig {
                    weight: Some(1),
                    mode: Some("synchronize".to_string()),
                    ..component("synchrony")
                },
            ],
        }
    }

    #[test]
    fn test_builds_coordinator_with_forward_target() {
        let coordinator = build_coordinator(&sample_config()).unwrap();
        assert_eq!(coordinator.direct_components().len(), 2);
        assert_eq!(coordinator.schedulers().len(), 1);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let mut config = sample_config();
        config.components.push(component("mimicry"));
        assert_eq!(
            build_coordinator(&config).unwrap_err(),
            EntrainmentError::UnknownComponentKind("mimicry".to_string())
        );
    }

    #[test]
    fn test_scheduler_target_must_be_direct() {
        let mut config = sample_config();
        config.components[0].target = Some(0);
        assert_eq!(
            build_coordinator(&config).unwrap_err(),
            EntrainmentError::UnknownComponent(0)
        );
    }

    #[test]
    fn test_weight_validation() {
        let mut config = sample_config();
        config.components[1].weight = Some(-2);
        assert!(matches!(
            build_coordinator(&config),
            Err(EntrainmentError::InvalidParameter { name: "weight", .. })
        ));
        config.components[1].weight = None;
        assert!(matches!(
            build_coordinator(&config),
            Err(EntrainmentError::InvalidParameter { name: "weight", .. })
        ));
    }

    #[test]
    fn test_invalid_synchrony_mode() {
        let mut config = sample_config();
        config.components[2].mode = Some("sometimes".to_string());
        assert!(matches!(
            build_coordinator(&config),
            Err(EntrainmentError::InvalidParameter { name: "mode", .. })
        ));
    }

    #[test]
    fn test_component_channel_turn_cycle() {
        let mut channel = FeatureChannel::from_config(
            Feature::Pitch,
            &FeatureConfig::Components(sample_config()),
        )
        .unwrap();

        channel.register_input(100.0, 1.0).unwrap();
        // local: 100 - 20 = 80, synchrony passes 100 through.
        let target = channel.propose().unwrap();
        assert!((target - 90.0).abs() < 1e-9);
        assert!((channel.propose().unwrap() - target).abs() < f64::EPSILON);

        channel.register_output(95.0, 1.0).unwrap();
        assert!(!channel.tracker().has_unanswered_turn());

        channel.register_input(120.0, 1.0).unwrap();
        // local: 100 < 95 is false, distance halved to 10: 110
        // synchrony: 120 / 100 * 95 = 114
        let target = channel.propose().unwrap();
        assert!((target - 112.0).abs() < 1e-9);
    }

    #[test]
    fn test_components_output_requires_proposal() {
        let mut channel = FeatureChannel::from_config(
            Feature::Pitch,
            &FeatureConfig::Components(sample_config()),
        )
        .unwrap();
        channel.register_input(100.0, 1.0).unwrap();

        assert!(matches!(
            channel.register_output(95.0, 1.0),
            Err(EntrainmentError::NoPendingProposal(_))
        ));
        assert!(channel.tracker().system_turns().is_empty());
        assert!(channel.tracker().has_unanswered_turn());

        channel.propose().unwrap();
        channel.register_output(95.0, 1.0).unwrap();
        // A second utterance of the answered turn needs no proposal.
        channel.register_output(105.0, 1.0).unwrap();
        assert_eq!(channel.tracker().system_turns().len(), 1);
    }

    #[test]
    fn test_components_channel_without_input() {
        let mut channel = FeatureChannel::from_config(
            Feature::Rate,
            &FeatureConfig::Components(sample_config()),
        )
        .unwrap();
        assert_eq!(channel.propose(), Err(EntrainmentError::NoInput));
    }

    #[test]
    fn test_weighted_channel() {
        let mut channel = FeatureChannel::from_config(
            Feature::Intensity,
            &FeatureConfig::Weighted(WeightedConfig::with_default_value(60.0)),
        )
        .unwrap();
        channel.register_input(70.0, 2.0).unwrap();
        // 0.5 * 60 + 0.3 * 70 + 0.2 * 70
        assert!((channel.propose().unwrap() - 65.0).abs() < 1e-9);
    }
}
