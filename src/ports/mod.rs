//! Ports (trait boundaries) for external dependencies.
//!
//! This module defines the interfaces between the decision core and the
//! surrounding agent runtime. Following hexagonal architecture, these traits
//! are owned by the core and implemented by adapters or by the host.

pub mod effector;
pub mod observer;
pub mod repository;

pub use effector::Effector;
pub use observer::Observer;
pub use repository::TableRepository;
