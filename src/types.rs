//! Domain vocabulary: actions, action sets, features, outcomes and perceptions.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One of the discrete behaviors an agent can execute in a tick.
///
/// Each variant carries its table column index; the label is for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Wander to a random neighbouring location.
    RandomWalk,
    /// Travel to a depot and refill the carried resource.
    Replenish,
    /// Use the resource on the visible target.
    ActOnTarget,
    /// Broadcast a request for help on the shared channel.
    RequestHelpBroadcast,
    /// Send a request for help to a single peer.
    RequestHelpDirect,
    /// Handle the pending incoming message.
    ProcessMessage,
}

impl Action {
    /// Every action, ordered by index.
    pub const ALL: [Action; 6] = [
        Action::RandomWalk,
        Action::Replenish,
        Action::ActOnTarget,
        Action::RequestHelpBroadcast,
        Action::RequestHelpDirect,
        Action::ProcessMessage,
    ];

    /// Column of this action in the Q-table.
    pub const fn index(self) -> usize {
        match self {
            Action::RandomWalk => 0,
            Action::Replenish => 1,
            Action::ActOnTarget => 2,
            Action::RequestHelpBroadcast => 3,
            Action::RequestHelpDirect => 4,
            Action::ProcessMessage => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Self::ALL.get(index).copied()
    }

    pub const fn label(self) -> &'static str {
        match self {
            Action::RandomWalk => "random-walk",
            Action::Replenish => "replenish",
            Action::ActOnTarget => "act-on-target",
            Action::RequestHelpBroadcast => "request-help-broadcast",
            Action::RequestHelpDirect => "request-help-direct",
            Action::ProcessMessage => "process-message",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Closed set of actions available to an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ActionSet {
    /// Random walk, replenish, act on target.
    #[default]
    Basic,
    /// The basic actions plus help requests and message processing.
    Extended,
}

impl ActionSet {
    pub fn actions(self) -> &'static [Action] {
        match self {
            ActionSet::Basic => &Action::ALL[..3],
            ActionSet::Extended => &Action::ALL,
        }
    }

    pub fn len(self) -> usize {
        self.actions().len()
    }

    pub fn is_empty(self) -> bool {
        self.actions().is_empty()
    }

    /// Resolve a table column to an action of this set.
    pub fn get(self, index: usize) -> Option<Action> {
        self.actions().get(index).copied()
    }

    /// Whether `action` belongs to this set.
    pub fn contains(self, action: Action) -> bool {
        action.index() < self.len()
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionSet::Basic => "basic",
            ActionSet::Extended => "extended",
        };
        f.write_str(label)
    }
}

impl FromStr for ActionSet {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" | "3" => Ok(ActionSet::Basic),
            "extended" | "multi" | "6" => Ok(ActionSet::Extended),
            _ => Err(crate::Error::config(format!(
                "unknown action set '{s}' (expected basic or extended)"
            ))),
        }
    }
}

/// A binary observation of the agent's situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// A target of interest (e.g. a hazard) is in sight.
    TargetVisible,
    /// The agent carries some of its resource.
    HoldsResource,
    /// A message is waiting to be handled.
    MessagePending,
}

impl Feature {
    pub const ALL: [Feature; 3] = [
        Feature::TargetVisible,
        Feature::HoldsResource,
        Feature::MessagePending,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Feature::TargetVisible => "target-visible",
            Feature::HoldsResource => "holds-resource",
            Feature::MessagePending => "message-pending",
        }
    }

    /// Default feature order: two features for the single-agent preset, all three
    /// for the multi-agent preset.
    pub fn defaults_for(actions: ActionSet) -> Vec<Feature> {
        match actions {
            ActionSet::Basic => vec![Feature::TargetVisible, Feature::HoldsResource],
            ActionSet::Extended => Self::ALL.to_vec(),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result reported by the effector after executing an action.
///
/// Failures are ordinary learning signals, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Succeeded,
    /// The action could not start (no target, tank already full, ...).
    FailedPrecondition,
    /// The action ran without the intended effect, or was never reported.
    FailedNoEffect,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [
        Outcome::Succeeded,
        Outcome::FailedPrecondition,
        Outcome::FailedNoEffect,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Outcome::Succeeded => "succeeded",
            Outcome::FailedPrecondition => "failed-precondition",
            Outcome::FailedNoEffect => "failed-no-effect",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Outcome::Succeeded => 0,
            Outcome::FailedPrecondition => 1,
            Outcome::FailedNoEffect => 2,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Named feature readings supplied by the surrounding agent runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Perception {
    pub target_visible: bool,
    pub holds_resource: bool,
    pub message_pending: bool,
}

impl Perception {
    pub fn get(&self, feature: Feature) -> bool {
        match feature {
            Feature::TargetVisible => self.target_visible,
            Feature::HoldsResource => self.holds_resource,
            Feature::MessagePending => self.message_pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_index_roundtrip() {
        for action in Action::ALL {
            assert_eq!(Action::from_index(action.index()), Some(action));
        }
        assert_eq!(Action::from_index(6), None);
    }

    #[test]
    fn test_action_set_sizes() {
        assert_eq!(ActionSet::Basic.len(), 3);
        assert_eq!(ActionSet::Extended.len(), 6);
        assert!(ActionSet::Basic.contains(Action::ActOnTarget));
        assert!(!ActionSet::Basic.contains(Action::ProcessMessage));
        assert_eq!(ActionSet::Basic.get(3), None);
    }

    #[test]
    fn test_action_set_parse() {
        assert_eq!("Extended".parse::<ActionSet>().unwrap(), ActionSet::Extended);
        assert_eq!("3".parse::<ActionSet>().unwrap(), ActionSet::Basic);
        assert!("huge".parse::<ActionSet>().is_err());
    }

    #[test]
    fn test_perception_lookup() {
        let perception = Perception {
            target_visible: true,
            holds_resource: false,
            message_pending: true,
        };
        assert!(perception.get(Feature::TargetVisible));
        assert!(!perception.get(Feature::HoldsResource));
        assert!(perception.get(Feature::MessagePending));
    }
}
