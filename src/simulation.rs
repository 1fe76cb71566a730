//! Scripted environment for training and exercising a decision loop offline.
//!
//! `ScriptedWorld` stands in for the agent runtime: targets flare up and die
//! down at random, acting on a target drains a resource tank, and the tank is
//! refilled at a depot that may take several ticks to reach. It plays both
//! roles the loop needs from its host, producing a [`Perception`] each tick and
//! executing the chosen [`Action`].

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    Result,
    decision::{DecisionLoop, LoopStats},
    error::Error,
    ports::{Effector, Observer},
    types::{Action, Outcome, Perception},
};

/// Dynamics of a [`ScriptedWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Resource units a full tank holds.
    pub tank_capacity: u32,
    /// Units consumed by one successful act on a target.
    pub use_cost: u32,
    /// Chance per tick that a target appears when none is visible.
    pub target_probability: f64,
    /// Chance per tick that a visible target disappears on its own.
    pub target_decay: f64,
    /// Chance that a replenish attempt reaches the depot this tick.
    pub depot_reach_probability: f64,
    /// Chance per tick that a message arrives when none is pending.
    pub message_probability: f64,
    /// Chance that a help request finds a responder.
    pub help_probability: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tank_capacity: 5,
            use_cost: 1,
            target_probability: 0.3,
            target_decay: 0.1,
            depot_reach_probability: 0.5,
            message_probability: 0.1,
            help_probability: 0.5,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tank_capacity == 0 {
            return Err(Error::config("tank capacity must be positive"));
        }
        if self.use_cost == 0 || self.use_cost > self.tank_capacity {
            return Err(Error::config(format!(
                "use cost must be in 1..={}, got {}",
                self.tank_capacity, self.use_cost
            )));
        }
        let probabilities = [
            ("target_probability", self.target_probability),
            ("target_decay", self.target_decay),
            ("depot_reach_probability", self.depot_reach_probability),
            ("message_probability", self.message_probability),
            ("help_probability", self.help_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::config(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }
}

/// A small randomized world with one target slot, a tank and a mailbox.
#[derive(Debug, Clone)]
pub struct ScriptedWorld {
    config: WorldConfig,
    rng: StdRng,
    tank: u32,
    target_visible: bool,
    message_pending: bool,
    targets_cleared: u64,
}

impl ScriptedWorld {
    /// Create a world with a full tank and nothing in sight.
    pub fn new(config: WorldConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Ok(Self {
            config,
            rng,
            tank: config.tank_capacity,
            target_visible: false,
            message_pending: false,
            targets_cleared: 0,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn tank(&self) -> u32 {
        self.tank
    }

    /// Targets removed by a successful act.
    pub fn targets_cleared(&self) -> u64 {
        self.targets_cleared
    }

    /// Advance the world by one tick and report what the agent senses.
    pub fn perceive(&mut self) -> Perception {
        if self.target_visible {
            if self.rng.random_bool(self.config.target_decay) {
                self.target_visible = false;
            }
        } else if self.rng.random_bool(self.config.target_probability) {
            self.target_visible = true;
        }
        if !self.message_pending && self.rng.random_bool(self.config.message_probability) {
            self.message_pending = true;
        }
        self.current()
    }

    /// What the agent senses right now, without advancing the world.
    pub fn current(&self) -> Perception {
        Perception {
            target_visible: self.target_visible,
            holds_resource: self.tank >= self.config.use_cost,
            message_pending: self.message_pending,
        }
    }

    fn replenish(&mut self) -> Outcome {
        if self.tank == self.config.tank_capacity {
            return Outcome::FailedPrecondition;
        }
        if self.rng.random_bool(self.config.depot_reach_probability) {
            self.tank = self.config.tank_capacity;
            Outcome::Succeeded
        } else {
            Outcome::FailedNoEffect
        }
    }

    fn act_on_target(&mut self) -> Outcome {
        if !self.target_visible {
            return Outcome::FailedPrecondition;
        }
        if self.tank < self.config.use_cost {
            return Outcome::FailedNoEffect;
        }
        self.tank -= self.config.use_cost;
        self.target_visible = false;
        self.targets_cleared += 1;
        Outcome::Succeeded
    }

    fn request_help(&mut self) -> Outcome {
        if !self.target_visible {
            return Outcome::FailedPrecondition;
        }
        if self.rng.random_bool(self.config.help_probability) {
            Outcome::Succeeded
        } else {
            Outcome::FailedNoEffect
        }
    }

    fn process_message(&mut self) -> Outcome {
        if self.message_pending {
            self.message_pending = false;
            Outcome::Succeeded
        } else {
            Outcome::FailedPrecondition
        }
    }
}

impl Effector for ScriptedWorld {
    fn execute(&mut self, action: Action) -> Option<Outcome> {
        let outcome = match action {
            Action::RandomWalk => Outcome::Succeeded,
            Action::Replenish => self.replenish(),
            Action::ActOnTarget => self.act_on_target(),
            Action::RequestHelpBroadcast | Action::RequestHelpDirect => self.request_help(),
            Action::ProcessMessage => self.process_message(),
        };
        Some(outcome)
    }
}

/// Drive `agent` through `ticks` ticks of `world`, notifying every observer.
///
/// Returns the loop's counters at the end of the run. The table is not saved
/// here; callers decide between [`DecisionLoop::save`] and
/// [`DecisionLoop::shutdown`].
pub fn run(
    agent: &mut DecisionLoop,
    world: &mut ScriptedWorld,
    ticks: u64,
    observers: &mut [Box<dyn Observer>],
) -> Result<LoopStats> {
    info!(ticks, actions = %agent.actions(), "Starting simulation");
    for observer in observers.iter_mut() {
        observer.on_run_start(ticks)?;
    }

    for _ in 0..ticks {
        let perception = world.perceive();
        let report = agent.tick_perception(&perception, world)?;
        for observer in observers.iter_mut() {
            observer.on_tick(&report)?;
        }
    }

    let stats = agent.stats().clone();
    for observer in observers.iter_mut() {
        observer.on_run_end(&stats)?;
    }
    info!(
        ticks = stats.ticks,
        updates = stats.updates,
        mean_reward = stats.mean_reward(),
        targets_cleared = world.targets_cleared(),
        "Simulation finished"
    );
    Ok(stats)
}
