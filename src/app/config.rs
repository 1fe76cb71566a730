//! Configuration types for agent creation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    error::Error,
    q_learning::{LearningParams, RewardTable, policy::validate_temperature},
    types::{ActionSet, Feature},
};

/// Configuration for creating a learning agent.
///
/// Read from JSON (every field optional) or assembled with the `with_*`
/// methods, then handed to [`crate::app::App::create_agent`].
///
/// # Examples
///
/// ```
/// use tabq::app::AgentConfig;
/// use tabq::ActionSet;
///
/// let config = AgentConfig::new(ActionSet::Extended)
///     .with_seed(42)
///     .with_temperature(4.0)
///     .with_persist_path("agent.qtable");
/// assert_eq!(config.shape()?, (8, 6));
/// # Ok::<(), tabq::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Learning rate in (0, 1].
    pub alpha: f64,
    /// Discount factor in [0, 1]; zero averages immediate rewards.
    pub gamma: f64,
    /// Softmax temperature; zero selects uniformly.
    pub temperature: f64,
    pub actions: ActionSet,
    /// Feature order; defaults to the action set's usual features.
    pub features: Option<Vec<Feature>>,
    /// Expected number of states, checked against the features.
    pub state_count: Option<usize>,
    /// Expected number of actions, checked against the action set.
    pub action_count: Option<usize>,
    /// Reward table; defaults to the action set's preset.
    pub rewards: Option<RewardTable>,
    /// Where the table is stored between sessions.
    pub persist_path: Option<PathBuf>,
    /// Start from the stored table instead of zeros.
    pub load_existing: bool,
    /// Save the table every this many ticks.
    pub snapshot_every: Option<u64>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(ActionSet::default())
    }
}

impl AgentConfig {
    /// Create a configuration for the given action set with default
    /// hyperparameters (α = 0.4, γ = 0.9, temperature 8).
    pub fn new(actions: ActionSet) -> Self {
        let params = LearningParams::default();
        Self {
            alpha: params.alpha,
            gamma: params.gamma,
            temperature: 8.0,
            actions,
            features: None,
            state_count: None,
            action_count: None,
            rewards: None,
            persist_path: None,
            load_existing: true,
            snapshot_every: None,
            seed: None,
        }
    }

    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("malformed agent configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config file {path:?}"),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn with_learning(mut self, alpha: f64, gamma: f64) -> Self {
        self.alpha = alpha;
        self.gamma = gamma;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = Some(features);
        self
    }

    /// Declare the expected table shape.
    pub fn with_shape(mut self, state_count: usize, action_count: usize) -> Self {
        self.state_count = Some(state_count);
        self.action_count = Some(action_count);
        self
    }

    pub fn with_rewards(mut self, rewards: RewardTable) -> Self {
        self.rewards = Some(rewards);
        self
    }

    pub fn with_persist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_path = Some(path.into());
        self
    }

    pub fn with_load_existing(mut self, load_existing: bool) -> Self {
        self.load_existing = load_existing;
        self
    }

    pub fn with_snapshot_every(mut self, ticks: u64) -> Self {
        self.snapshot_every = Some(ticks);
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn learning_params(&self) -> Result<LearningParams> {
        LearningParams::new(self.alpha, self.gamma)
    }

    pub fn resolved_features(&self) -> Vec<Feature> {
        self.features
            .clone()
            .unwrap_or_else(|| Feature::defaults_for(self.actions))
    }

    pub fn resolved_rewards(&self) -> RewardTable {
        self.rewards
            .clone()
            .unwrap_or_else(|| RewardTable::preset(self.actions))
    }

    /// (state count, action count) implied by the features and actions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if an explicit `state_count` or
    /// `action_count` disagrees with the features or action set.
    pub fn shape(&self) -> Result<(usize, usize)> {
        let features = self.resolved_features();
        if features.is_empty() || features.len() > Feature::ALL.len() {
            return Err(Error::config(format!(
                "expected 1 to {} features, got {}",
                Feature::ALL.len(),
                features.len()
            )));
        }
        let shape = (1usize << features.len(), self.actions.len());
        let declared = (
            self.state_count.unwrap_or(shape.0),
            self.action_count.unwrap_or(shape.1),
        );
        if declared != shape {
            return Err(Error::ShapeMismatch {
                stored_states: declared.0,
                stored_actions: declared.1,
                expected_states: shape.0,
                expected_actions: shape.1,
            });
        }
        Ok(shape)
    }

    /// Check every setting without building anything.
    pub fn validate(&self) -> Result<()> {
        self.learning_params()?;
        validate_temperature(self.temperature)?;
        self.shape()?;
        self.resolved_rewards().ensure_total(self.actions)?;
        if self.snapshot_every == Some(0) {
            return Err(Error::config("snapshot_every must be at least 1"));
        }
        if self.snapshot_every.is_some() && self.persist_path.is_none() {
            return Err(Error::config("snapshot_every requires persist_path"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, Outcome};

    #[test]
    fn test_defaults_match_basic_agent() {
        let config = AgentConfig::default();
        assert_eq!(config.alpha, 0.4);
        assert_eq!(config.gamma, 0.9);
        assert_eq!(config.temperature, 8.0);
        assert_eq!(config.shape().unwrap(), (4, 3));
        assert!(config.load_existing);
        assert_eq!(config.resolved_rewards(), RewardTable::basic());
        config.validate().unwrap();
    }

    #[test]
    fn test_json_with_partial_fields() {
        let config = AgentConfig::from_json_str(
            r#"{ "actions": "extended", "gamma": 0.0, "seed": 7, "persist_path": "a.qtable" }"#,
        )
        .unwrap();
        assert_eq!(config.actions, ActionSet::Extended);
        assert_eq!(config.gamma, 0.0);
        assert_eq!(config.alpha, 0.4);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.shape().unwrap(), (8, 6));
    }

    #[test]
    fn test_json_rewards_override_preset() {
        let config = AgentConfig::from_json_str(
            r#"{
                "rewards": [
                    { "action": "random-walk", "outcome": "succeeded", "reward": 0.0 },
                    { "action": "random-walk", "outcome": "failed-precondition", "reward": 0.0 },
                    { "action": "random-walk", "outcome": "failed-no-effect", "reward": 0.0 },
                    { "action": "replenish", "outcome": "succeeded", "reward": 2.0 },
                    { "action": "replenish", "outcome": "failed-precondition", "reward": -2.0 },
                    { "action": "replenish", "outcome": "failed-no-effect", "reward": 0.0 },
                    { "action": "act-on-target", "outcome": "succeeded", "reward": 3.0 },
                    { "action": "act-on-target", "outcome": "failed-precondition", "reward": -3.0 },
                    { "action": "act-on-target", "outcome": "failed-no-effect", "reward": -1.0 }
                ]
            }"#,
        )
        .unwrap();
        let rewards = config.resolved_rewards();
        assert_eq!(
            rewards.reward_for(Action::ActOnTarget, Outcome::Succeeded).unwrap(),
            3.0
        );
    }

    #[test]
    fn test_incomplete_rewards_rejected() {
        let err = AgentConfig::from_json_str(
            r#"{ "rewards": [ { "action": "random-walk", "outcome": "succeeded", "reward": 1.0 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingReward { .. }));
    }

    #[test]
    fn test_declared_shape_is_cross_checked() {
        let config = AgentConfig::new(ActionSet::Basic).with_shape(8, 6);
        assert!(matches!(
            config.shape().unwrap_err(),
            Error::ShapeMismatch {
                expected_states: 4,
                expected_actions: 3,
                ..
            }
        ));
        assert!(AgentConfig::new(ActionSet::Basic).with_shape(4, 3).validate().is_ok());
    }

    #[test]
    fn test_out_of_range_hyperparameters_rejected() {
        assert!(AgentConfig::default().with_learning(0.0, 0.9).validate().is_err());
        assert!(AgentConfig::default().with_learning(0.4, 1.5).validate().is_err());
        assert!(AgentConfig::default().with_temperature(-1.0).validate().is_err());
    }

    #[test]
    fn test_snapshot_requires_path() {
        let config = AgentConfig::default().with_snapshot_every(10);
        assert!(config.validate().unwrap_err().is_config_error());
        assert!(config.with_persist_path("x.qtable").validate().is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = AgentConfig::from_json_str(r#"{ "alpah": 0.5 }"#).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        for text in [r#"{ "alpha": 0.5"#, r#"{ "alpha": "high" }"#, "[]"] {
            let err = AgentConfig::from_json_str(text).unwrap_err();
            assert!(err.is_config_error(), "{text}: {err}");
            assert!(!err.is_persistence_error());
        }
    }
}
