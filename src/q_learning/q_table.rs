//! Dense Q-table for temporal difference learning

use serde::{Deserialize, Serialize};

use crate::{Result, error::Error, q_learning::SavedQTable};

/// Step size and discount for the Q-learning update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningParams {
    /// Learning rate α, in (0, 1]
    pub alpha: f64,
    /// Discount factor γ, in [0, 1]; 0 reduces the update to reward averaging
    pub gamma: f64,
}

impl LearningParams {
    /// Create validated learning parameters.
    pub fn new(alpha: f64, gamma: f64) -> Result<Self> {
        validate_alpha(alpha)?;
        validate_gamma(gamma)?;
        Ok(Self { alpha, gamma })
    }
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            alpha: 0.4,
            gamma: 0.9,
        }
    }
}

fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(())
    } else {
        Err(Error::config(format!(
            "learning rate alpha must be in (0, 1], got {alpha}"
        )))
    }
}

fn validate_gamma(gamma: f64) -> Result<()> {
    if (0.0..=1.0).contains(&gamma) {
        Ok(())
    } else {
        Err(Error::config(format!(
            "discount factor gamma must be in [0, 1], got {gamma}"
        )))
    }
}

/// Q-table holding one value per (state, action) pair
///
/// Values are stored row-major: row `s` holds the action values of state `s`.
/// Serde goes through [`SavedQTable`], so a deserialized table is checked like
/// one built with [`QTable::from_values`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SavedQTable", into = "SavedQTable")]
pub struct QTable {
    states: usize,
    actions: usize,
    values: Vec<f64>,
}

impl QTable {
    /// Create a zero-initialized table
    pub fn zeros(states: usize, actions: usize) -> Result<Self> {
        if states == 0 || actions == 0 {
            return Err(Error::config(format!(
                "table dimensions must be non-zero, got {states}x{actions}"
            )));
        }
        Ok(Self {
            states,
            actions,
            values: vec![0.0; states * actions],
        })
    }

    /// Rebuild a table from row-major values
    pub fn from_values(states: usize, actions: usize, values: Vec<f64>) -> Result<Self> {
        let mut table = Self::zeros(states, actions)?;
        if values.len() != states * actions {
            return Err(Error::CorruptTable {
                reason: format!(
                    "{} values cannot fill a {states}x{actions} table",
                    values.len()
                ),
            });
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(Error::CorruptTable {
                reason: format!("non-finite value {bad}"),
            });
        }
        table.values = values;
        Ok(table)
    }

    /// (state count, action count)
    pub fn shape(&self) -> (usize, usize) {
        (self.states, self.actions)
    }

    pub fn state_count(&self) -> usize {
        self.states
    }

    pub fn action_count(&self) -> usize {
        self.actions
    }

    /// Row-major view of every value
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Action values for one state
    pub fn row(&self, state: usize) -> Result<&[f64]> {
        if state >= self.states {
            return Err(Error::StateOutOfRange {
                state,
                state_count: self.states,
            });
        }
        let start = state * self.actions;
        Ok(&self.values[start..start + self.actions])
    }

    /// Iterate over rows in state order
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.actions)
    }

    /// Get Q-value for a state-action pair
    pub fn get(&self, state: usize, action: usize) -> Result<f64> {
        let index = self.index(state, action)?;
        Ok(self.values[index])
    }

    /// Get maximum Q-value in a state
    pub fn max_q(&self, state: usize) -> Result<f64> {
        Ok(self
            .row(state)?
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max))
    }

    /// Select greedy action (highest Q-value, lowest index on ties)
    pub fn greedy_action(&self, state: usize) -> Result<usize> {
        let row = self.row(state)?;
        let mut best = 0;
        for (action, value) in row.iter().enumerate().skip(1) {
            if *value > row[best] {
                best = action;
            }
        }
        Ok(best)
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    ///
    /// Only the cell `(previous_state, action)` changes. Returns its new value.
    pub fn update(
        &mut self,
        previous_state: usize,
        action: usize,
        reward: f64,
        current_state: usize,
        alpha: f64,
        gamma: f64,
    ) -> Result<f64> {
        let (index, new_q) =
            self.td_value(previous_state, action, reward, current_state, alpha, gamma)?;
        self.values[index] = new_q;
        Ok(new_q)
    }

    /// Value [`QTable::update_with`] would write, leaving the table unchanged
    pub fn updated_value(
        &self,
        previous_state: usize,
        action: usize,
        reward: f64,
        current_state: usize,
        params: LearningParams,
    ) -> Result<f64> {
        self.td_value(
            previous_state,
            action,
            reward,
            current_state,
            params.alpha,
            params.gamma,
        )
        .map(|(_, value)| value)
    }

    fn td_value(
        &self,
        previous_state: usize,
        action: usize,
        reward: f64,
        current_state: usize,
        alpha: f64,
        gamma: f64,
    ) -> Result<(usize, f64)> {
        validate_alpha(alpha)?;
        validate_gamma(gamma)?;
        let index = self.index(previous_state, action)?;
        let max_next_q = self.max_q(current_state)?;

        let current_q = self.values[index];
        let td_target = reward + gamma * max_next_q;
        let td_error = td_target - current_q;
        let new_q = current_q + alpha * td_error;
        if !new_q.is_finite() {
            return Err(Error::NonFiniteValue {
                state: previous_state,
                action,
                value: new_q,
            });
        }
        Ok((index, new_q))
    }

    /// Write one cell directly
    pub(crate) fn set(&mut self, state: usize, action: usize, value: f64) -> Result<()> {
        let index = self.index(state, action)?;
        if !value.is_finite() {
            return Err(Error::NonFiniteValue {
                state,
                action,
                value,
            });
        }
        self.values[index] = value;
        Ok(())
    }

    /// Apply [`QTable::update`] with validated parameters
    pub fn update_with(
        &mut self,
        previous_state: usize,
        action: usize,
        reward: f64,
        current_state: usize,
        params: LearningParams,
    ) -> Result<f64> {
        self.update(
            previous_state,
            action,
            reward,
            current_state,
            params.alpha,
            params.gamma,
        )
    }

    /// Reset all Q-values to zero
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }

    fn index(&self, state: usize, action: usize) -> Result<usize> {
        if state >= self.states {
            return Err(Error::StateOutOfRange {
                state,
                state_count: self.states,
            });
        }
        if action >= self.actions {
            return Err(Error::ActionOutOfRange {
                action,
                action_count: self.actions,
            });
        }
        Ok(state * self.actions + action)
    }
}
