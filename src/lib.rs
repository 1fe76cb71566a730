//! Tabular Q-learning decision core for reactive agents
//!
//! This crate provides:
//! - Encoding of boolean feature readings into a finite state index
//! - A dense Q-table with the one-step Q-learning update
//! - Boltzmann (softmax) action selection with a seedable random source
//! - A per-tick decision loop with one-tick-delayed credit assignment
//! - Atomic persistence of the table between sessions
//! - A scripted world and CLI for offline training and inspection

pub mod adapters;
pub mod app;
pub mod cli;
pub mod decision;
pub mod encoder;
pub mod error;
pub mod observers;
pub mod ports;
pub mod q_learning;
pub mod simulation;
pub mod store;
pub mod types;

pub use decision::{CycleRecord, DecisionLoop, DecisionLoopBuilder, LoopStats, Phase, TickReport};
pub use encoder::StateEncoder;
pub use error::{Error, Result};
pub use q_learning::{BoltzmannPolicy, LearningParams, QTable, RewardTable};
pub use store::TableStore;
pub use types::{Action, ActionSet, Feature, Outcome, Perception};
