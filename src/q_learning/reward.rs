//! Reward lookup from (action, outcome) pairs.
//!
//! Reward values are hyperparameters supplied with the configuration. Two
//! presets are provided: a single-agent preset for the basic action set and a
//! multi-agent preset for the extended one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    error::Error,
    types::{Action, ActionSet, Outcome},
};

/// One configured reward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub action: Action,
    pub outcome: Outcome,
    pub reward: f64,
}

/// Mapping from (action, outcome) to a scalar reward.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<RewardEntry>", into = "Vec<RewardEntry>")]
pub struct RewardTable {
    rewards: BTreeMap<(Action, Outcome), f64>,
}

impl RewardTable {
    /// Empty table; every lookup fails until rewards are set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-agent preset: small rewards around ±1.
    pub fn basic() -> Self {
        Self::new()
            .with_action(Action::RandomWalk, 0.0, 0.0, 0.0)
            .with_action(Action::Replenish, 1.0, -1.0, -0.1)
            .with_action(Action::ActOnTarget, 0.2, -1.0, -1.0)
    }

    /// Multi-agent preset: large penalties for pointless actions.
    pub fn extended() -> Self {
        Self::new()
            .with_action(Action::RandomWalk, 0.0, 0.0, 0.0)
            .with_action(Action::Replenish, 5.0, -500.0, -500.0)
            .with_action(Action::ActOnTarget, 10.0, -500.0, -50.0)
            .with_action(Action::RequestHelpBroadcast, 0.0, 0.0, 0.0)
            .with_action(Action::RequestHelpDirect, 0.0, 0.0, 0.0)
            .with_action(Action::ProcessMessage, 0.0, 0.0, 0.0)
    }

    /// Preset matching an action set.
    pub fn preset(actions: ActionSet) -> Self {
        match actions {
            ActionSet::Basic => Self::basic(),
            ActionSet::Extended => Self::extended(),
        }
    }

    /// Set the reward for one (action, outcome) pair.
    pub fn set(&mut self, action: Action, outcome: Outcome, reward: f64) {
        self.rewards.insert((action, outcome), reward);
    }

    /// Builder-style [`RewardTable::set`].
    pub fn with(mut self, action: Action, outcome: Outcome, reward: f64) -> Self {
        self.set(action, outcome, reward);
        self
    }

    /// Set all three outcomes of an action at once.
    pub fn with_action(
        self,
        action: Action,
        succeeded: f64,
        failed_precondition: f64,
        failed_no_effect: f64,
    ) -> Self {
        self.with(action, Outcome::Succeeded, succeeded)
            .with(action, Outcome::FailedPrecondition, failed_precondition)
            .with(action, Outcome::FailedNoEffect, failed_no_effect)
    }

    /// Reward for executing `action` with `outcome`.
    pub fn reward_for(&self, action: Action, outcome: Outcome) -> Result<f64> {
        self.rewards
            .get(&(action, outcome))
            .copied()
            .ok_or_else(|| Error::MissingReward {
                action: action.label().to_string(),
                outcome: outcome.label().to_string(),
            })
    }

    /// Check the table covers every reachable pair and holds only finite rewards.
    pub fn ensure_total(&self, actions: ActionSet) -> Result<()> {
        for &action in actions.actions() {
            for outcome in Outcome::ALL {
                let reward = self.reward_for(action, outcome)?;
                if !reward.is_finite() {
                    return Err(Error::config(format!(
                        "reward for {action}/{outcome} must be finite, got {reward}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn entries(&self) -> Vec<RewardEntry> {
        self.rewards
            .iter()
            .map(|(&(action, outcome), &reward)| RewardEntry {
                action,
                outcome,
                reward,
            })
            .collect()
    }
}

impl From<Vec<RewardEntry>> for RewardTable {
    fn from(entries: Vec<RewardEntry>) -> Self {
        entries.into_iter().fold(Self::new(), |table, entry| {
            table.with(entry.action, entry.outcome, entry.reward)
        })
    }
}

impl From<RewardTable> for Vec<RewardEntry> {
    fn from(table: RewardTable) -> Self {
        table.entries()
    }
}
