//! Observer port for watching a running decision loop.
//!
//! Observers receive every tick report without being able to influence the
//! loop, so progress display and trace export can be composed freely.

use crate::{
    Result,
    decision::{LoopStats, TickReport},
};

/// Observer trait for monitoring a run.
///
/// # Event Sequence
///
/// 1. `on_run_start(total_ticks)` once at the beginning
/// 2. `on_tick(report)` after every completed tick
/// 3. `on_run_end(stats)` once at the end
///
/// # Examples
///
/// ```no_run
/// use tabq::{decision::TickReport, ports::Observer};
///
/// struct RewardSum {
///     total: f64,
/// }
///
/// impl Observer for RewardSum {
///     fn on_tick(&mut self, report: &TickReport) -> tabq::Result<()> {
///         self.total += report.reward;
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called before the first tick.
    ///
    /// # Default Implementation
    ///
    /// Does nothing.
    fn on_run_start(&mut self, _total_ticks: u64) -> Result<()> {
        Ok(())
    }

    /// Called after each tick with what the loop did.
    fn on_tick(&mut self, _report: &TickReport) -> Result<()> {
        Ok(())
    }

    /// Called once the run completes. Use this to flush outputs or print
    /// summaries.
    fn on_run_end(&mut self, _stats: &LoopStats) -> Result<()> {
        Ok(())
    }
}
