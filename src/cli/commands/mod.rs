//! Subcommands of the `tabq` binary.

pub mod inspect;
pub mod simulate;
