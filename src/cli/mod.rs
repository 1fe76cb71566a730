//! CLI infrastructure for the `tabq` binary
//!
//! This module provides the command-line interface for training agents in the
//! scripted world and inspecting stored Q-tables.

pub mod commands;
pub mod output;
