//! The per-tick decision cycle.
//!
//! Each tick walks `Idle → Encoding → SelectingAction → AwaitingOutcome →
//! UpdatingTable → Idle`. Outcomes are only known after an action has been
//! executed, so the table update of tick *n* credits the reward observed for
//! the action of tick *n − 1*, bootstrapping from the state encoded at tick *n*.
//! The first tick has nothing to credit and performs no update.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    Result,
    encoder::StateEncoder,
    error::Error,
    ports::Effector,
    q_learning::{BoltzmannPolicy, LearningParams, QTable, RewardTable},
    store::TableStore,
    types::{Action, ActionSet, Feature, Outcome, Perception},
};

/// Where the loop is within the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Encoding,
    SelectingAction,
    AwaitingOutcome,
    UpdatingTable,
}

/// The transition credited by one table update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub previous_state: usize,
    pub action_taken: Action,
    /// Reward accumulated since the previous update.
    pub reward: f64,
    pub current_state: usize,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// 1-based tick counter.
    pub tick: u64,
    pub state: usize,
    pub action: Action,
    pub outcome: Outcome,
    /// Reward earned by this tick's action, credited on the next tick.
    pub reward: f64,
    /// Transition credited during this tick, absent on the first tick.
    pub update: Option<CycleRecord>,
    /// New value of the updated cell.
    pub updated_value: Option<f64>,
    /// Whether a periodic snapshot was written during this tick.
    pub snapshot: Option<bool>,
}

/// Running counters over the lifetime of a loop.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoopStats {
    pub ticks: u64,
    pub updates: u64,
    pub total_reward: f64,
    /// Times each action was chosen, indexed by action.
    pub action_counts: Vec<u64>,
    /// Successful executions of each action, indexed by action.
    pub action_successes: Vec<u64>,
    /// Outcome frequencies, indexed by [`Outcome::index`].
    pub outcome_counts: [u64; 3],
    pub snapshots_saved: u64,
    pub snapshots_failed: u64,
}

impl LoopStats {
    fn new(action_count: usize) -> Self {
        Self {
            action_counts: vec![0; action_count],
            action_successes: vec![0; action_count],
            ..Self::default()
        }
    }

    fn record(&mut self, action: Action, outcome: Outcome, reward: f64) {
        self.ticks += 1;
        self.total_reward += reward;
        self.outcome_counts[outcome.index()] += 1;
        if let Some(count) = self.action_counts.get_mut(action.index()) {
            *count += 1;
        }
        if outcome == Outcome::Succeeded
            && let Some(count) = self.action_successes.get_mut(action.index())
        {
            *count += 1;
        }
    }

    /// Mean reward per tick.
    pub fn mean_reward(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.total_reward / self.ticks as f64
        }
    }
}

/// One agent's learning decision core.
///
/// # Examples
///
/// ```
/// use tabq::{Action, DecisionLoop, Outcome};
///
/// let mut agent = DecisionLoop::builder().seed(7).build()?;
/// let mut effector = |action: Action| match action {
///     Action::RandomWalk => Some(Outcome::Succeeded),
///     _ => Some(Outcome::FailedPrecondition),
/// };
///
/// let first = agent.tick(&[false, true], &mut effector)?;
/// assert!(first.update.is_none());
/// let second = agent.tick(&[true, true], &mut effector)?;
/// assert_eq!(second.update.map(|u| u.previous_state), Some(2));
/// # Ok::<(), tabq::Error>(())
/// ```
#[derive(Debug)]
pub struct DecisionLoop {
    encoder: StateEncoder,
    actions: ActionSet,
    table: QTable,
    policy: BoltzmannPolicy,
    rewards: RewardTable,
    params: LearningParams,
    phase: Phase,
    previous: Option<(usize, Action)>,
    pending_reward: f64,
    store: Option<TableStore>,
    snapshot_every: Option<u64>,
    stats: LoopStats,
}

impl DecisionLoop {
    pub fn builder() -> DecisionLoopBuilder {
        DecisionLoopBuilder::new()
    }

    /// Run one decision cycle.
    ///
    /// # Errors
    ///
    /// Malformed readings or an update producing a non-finite value are fatal;
    /// the loop returns to `Idle` without advancing and the effector is not
    /// called. Effector failures are never errors.
    pub fn tick<E>(&mut self, readings: &[bool], effector: &mut E) -> Result<TickReport>
    where
        E: Effector + ?Sized,
    {
        self.phase = Phase::Encoding;
        let state = match self.encoder.encode(readings) {
            Ok(state) => state,
            Err(err) => {
                self.phase = Phase::Idle;
                return Err(err);
            }
        };
        self.cycle(state, effector)
    }

    /// Run one decision cycle from named feature readings.
    pub fn tick_perception<E>(
        &mut self,
        perception: &Perception,
        effector: &mut E,
    ) -> Result<TickReport>
    where
        E: Effector + ?Sized,
    {
        self.phase = Phase::Encoding;
        let state = self.encoder.encode_perception(perception);
        self.cycle(state, effector)
    }

    fn cycle<E>(&mut self, state: usize, effector: &mut E) -> Result<TickReport>
    where
        E: Effector + ?Sized,
    {
        let result = self.run_phases(state, effector);
        self.phase = Phase::Idle;
        result
    }

    fn run_phases<E>(&mut self, state: usize, effector: &mut E) -> Result<TickReport>
    where
        E: Effector + ?Sized,
    {
        // The pending update is computed before anything reaches the world, so
        // a fatal update error leaves the effector untouched.
        let planned = match self.previous {
            Some((previous_state, previous_action)) => {
                let value = self.table.updated_value(
                    previous_state,
                    previous_action.index(),
                    self.pending_reward,
                    state,
                    self.params,
                )?;
                Some((previous_state, previous_action, value))
            }
            None => None,
        };

        self.phase = Phase::SelectingAction;
        let index = self.policy.select(&self.table, state)?;
        let action = self.actions.get(index).ok_or(Error::ActionOutOfRange {
            action: index,
            action_count: self.actions.len(),
        })?;

        self.phase = Phase::AwaitingOutcome;
        let outcome = effector.execute(action).unwrap_or(Outcome::FailedNoEffect);
        let reward = self.rewards.reward_for(action, outcome)?;

        self.phase = Phase::UpdatingTable;
        let mut update = None;
        let mut updated_value = None;
        if let Some((previous_state, previous_action, value)) = planned {
            self.table.set(previous_state, previous_action.index(), value)?;
            self.stats.updates += 1;
            updated_value = Some(value);
            update = Some(CycleRecord {
                previous_state,
                action_taken: previous_action,
                reward: self.pending_reward,
                current_state: state,
            });
        }

        self.previous = Some((state, action));
        self.pending_reward = reward;
        self.stats.record(action, outcome, reward);

        debug!(
            tick = self.stats.ticks,
            state,
            action = %action,
            outcome = %outcome,
            reward,
            "Tick complete"
        );

        let snapshot = match self.snapshot_every {
            Some(every) if every > 0 && self.stats.ticks % every == 0 => Some(self.snapshot()),
            _ => None,
        };

        Ok(TickReport {
            tick: self.stats.ticks,
            state,
            action,
            outcome,
            reward,
            update,
            updated_value,
            snapshot,
        })
    }

    /// Add an externally observed reward to the one pending for the last action.
    ///
    /// A non-finite reward, or one that would make the pending sum non-finite,
    /// is rejected and the pending reward is left as it was.
    pub fn add_reward(&mut self, reward: f64) -> Result<()> {
        let pending = self.pending_reward + reward;
        if !reward.is_finite() || !pending.is_finite() {
            return Err(Error::NonFiniteReward { reward });
        }
        self.pending_reward = pending;
        self.stats.total_reward += reward;
        Ok(())
    }

    /// Save the table, logging instead of failing.
    ///
    /// Returns whether the table was written. A failed save keeps the
    /// previously stored table and the loop continues in memory.
    pub fn snapshot(&mut self) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        match store.save(&self.table) {
            Ok(()) => {
                self.stats.snapshots_saved += 1;
                true
            }
            Err(err) => {
                warn!(
                    path = %store.path().display(),
                    error = %err,
                    "Failed to save Q-table, keeping in-memory copy"
                );
                self.stats.snapshots_failed += 1;
                false
            }
        }
    }

    /// Save the table, surfacing any failure.
    ///
    /// Returns `Ok(false)` if no store is configured.
    pub fn save(&self) -> Result<bool> {
        match &self.store {
            Some(store) => store.save(&self.table).map(|()| true),
            None => Ok(false),
        }
    }

    /// Stop the loop, persisting the table, and hand the table back.
    pub fn shutdown(mut self) -> QTable {
        self.snapshot();
        self.table
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn encoder(&self) -> &StateEncoder {
        &self.encoder
    }

    pub fn actions(&self) -> ActionSet {
        self.actions
    }

    pub fn rewards(&self) -> &RewardTable {
        &self.rewards
    }

    pub fn params(&self) -> LearningParams {
        self.params
    }

    pub fn policy(&self) -> &BoltzmannPolicy {
        &self.policy
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// State and action of the last completed tick.
    pub fn previous(&self) -> Option<(usize, Action)> {
        self.previous
    }

    /// Reward waiting to be credited to the previous action.
    pub fn pending_reward(&self) -> f64 {
        self.pending_reward
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn store(&self) -> Option<&TableStore> {
        self.store.as_ref()
    }
}

/// Builder for [`DecisionLoop`].
///
/// Defaults reproduce the basic agent: two features, three actions, α = 0.4,
/// γ = 0.9, temperature 8, zero table.
#[derive(Debug)]
pub struct DecisionLoopBuilder {
    actions: ActionSet,
    features: Option<Vec<Feature>>,
    rewards: Option<RewardTable>,
    params: LearningParams,
    temperature: f64,
    seed: Option<u64>,
    table: Option<QTable>,
    store: Option<TableStore>,
    snapshot_every: Option<u64>,
}

impl Default for DecisionLoopBuilder {
    fn default() -> Self {
        Self {
            actions: ActionSet::default(),
            features: None,
            rewards: None,
            params: LearningParams::default(),
            temperature: 8.0,
            seed: None,
            table: None,
            store: None,
            snapshot_every: None,
        }
    }
}

impl DecisionLoopBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(mut self, actions: ActionSet) -> Self {
        self.actions = actions;
        self
    }

    /// Feature order; defaults to [`Feature::defaults_for`] of the action set.
    pub fn features(mut self, features: Vec<Feature>) -> Self {
        self.features = Some(features);
        self
    }

    /// Reward table; defaults to the action set's preset.
    pub fn rewards(mut self, rewards: RewardTable) -> Self {
        self.rewards = Some(rewards);
        self
    }

    pub fn learning(mut self, params: LearningParams) -> Self {
        self.params = params;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Start from an existing table instead of zeros.
    pub fn table(mut self, table: QTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn store(mut self, store: TableStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Save the table every `ticks` ticks.
    pub fn snapshot_every(mut self, ticks: u64) -> Self {
        self.snapshot_every = Some(ticks);
        self
    }

    /// Validate the configuration and build the loop.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the table shape does not match the
    /// features and actions, the rewards are not total, or a hyperparameter
    /// is out of range.
    pub fn build(self) -> Result<DecisionLoop> {
        let features = self
            .features
            .unwrap_or_else(|| Feature::defaults_for(self.actions));
        let encoder = StateEncoder::new(features)?;
        let shape = (encoder.state_count(), self.actions.len());

        let params = LearningParams::new(self.params.alpha, self.params.gamma)?;
        let rewards = self
            .rewards
            .unwrap_or_else(|| RewardTable::preset(self.actions));
        rewards.ensure_total(self.actions)?;

        let mut policy = BoltzmannPolicy::new(self.temperature)?;
        if let Some(seed) = self.seed {
            policy.reseed(seed);
        }

        let table = match self.table {
            Some(table) => table,
            None => QTable::zeros(shape.0, shape.1)?,
        };
        if table.shape() != shape {
            return Err(Error::ShapeMismatch {
                stored_states: table.state_count(),
                stored_actions: table.action_count(),
                expected_states: shape.0,
                expected_actions: shape.1,
            });
        }
        if let Some(store) = &self.store
            && store.shape() != shape
        {
            return Err(Error::config(format!(
                "store expects a {}x{} table, loop uses {}x{}",
                store.shape().0,
                store.shape().1,
                shape.0,
                shape.1
            )));
        }
        if self.snapshot_every == Some(0) {
            return Err(Error::config("snapshot interval must be at least one tick"));
        }

        Ok(DecisionLoop {
            encoder,
            actions: self.actions,
            table,
            policy,
            rewards,
            params,
            phase: Phase::Idle,
            previous: None,
            pending_reward: 0.0,
            store: self.store,
            snapshot_every: self.snapshot_every,
            stats: LoopStats::new(shape.1),
        })
    }
}
