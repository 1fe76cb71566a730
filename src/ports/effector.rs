//! Effector port - executes a chosen action in the world.

use crate::types::{Action, Outcome};

/// Executes one action per tick and reports how it went.
///
/// Movement, resource transfer and messaging live behind this trait; the
/// decision core only sees the reported [`Outcome`].
///
/// # Examples
///
/// ```
/// use tabq::{Action, Outcome, ports::Effector};
///
/// struct AlwaysWalk;
///
/// impl Effector for AlwaysWalk {
///     fn execute(&mut self, action: Action) -> Option<Outcome> {
///         match action {
///             Action::RandomWalk => Some(Outcome::Succeeded),
///             _ => Some(Outcome::FailedPrecondition),
///         }
///     }
/// }
/// ```
pub trait Effector {
    /// Execute `action`.
    ///
    /// Returns `None` when no outcome was reported in time; the decision loop
    /// treats that as [`Outcome::FailedNoEffect`].
    fn execute(&mut self, action: Action) -> Option<Outcome>;
}

impl<F> Effector for F
where
    F: FnMut(Action) -> Option<Outcome>,
{
    fn execute(&mut self, action: Action) -> Option<Outcome> {
        self(action)
    }
}
