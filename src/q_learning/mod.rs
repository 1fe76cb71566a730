//! Tabular Q-learning
//!
//! This module implements the learning side of the decision core: a dense
//! table of action values, the softmax policy that samples from it, the
//! reward lookup that turns outcomes into learning signals, and the stored
//! form of the table.
//!
//! ## Update rule
//!
//! | Term | Meaning |
//! |------|---------|
//! | α | Step size, in (0, 1] |
//! | γ | Discount, in [0, 1]; 0 averages immediate rewards |
//! | target | r + γ max_a' Q(s', a') |
//!
//! ## Usage Example
//!
//! ```
//! use tabq::q_learning::{BoltzmannPolicy, QTable};
//!
//! let mut table = QTable::zeros(4, 3)?;
//! table.update(2, 1, 1.0, 3, 0.4, 0.9)?;
//! assert!((table.get(2, 1)? - 0.4).abs() < 1e-12);
//!
//! let mut policy = BoltzmannPolicy::new(8.0)?.with_seed(42);
//! let action = policy.select(&table, 2)?;
//! assert!(action < 3);
//! # Ok::<(), tabq::Error>(())
//! ```

pub mod policy;
pub mod q_table;
pub mod reward;
pub mod serialization;

// Public re-exports
pub use policy::BoltzmannPolicy;
pub use q_table::{LearningParams, QTable};
pub use reward::{RewardEntry, RewardTable};
pub use serialization::SavedQTable;
