//! Observers for simulation runs.
//!
//! Observers allow composable data collection during a run without coupling
//! the loop to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    Result,
    decision::{LoopStats, TickReport},
    error::Error,
    ports::Observer,
    types::Outcome,
};

/// Progress bar observer - shows ticks completed and the success rate so far.
#[derive(Default)]
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    successes: u64,
    ticks: u64,
    total_reward: f64,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn message(&self) -> String {
        let rate = if self.ticks == 0 {
            0.0
        } else {
            self.successes as f64 / self.ticks as f64 * 100.0
        };
        format!("success {rate:.1}% reward {:.1}", self.total_reward)
    }
}

impl Observer for ProgressObserver {
    fn on_run_start(&mut self, total_ticks: u64) -> Result<()> {
        let pb = ProgressBar::new(total_ticks);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ticks ({msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_tick(&mut self, report: &TickReport) -> Result<()> {
        self.ticks += 1;
        self.total_reward += report.reward;
        if report.outcome == Outcome::Succeeded {
            self.successes += 1;
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(report.tick);
            if report.tick % 64 == 0 {
                pb.set_message(self.message());
            }
        }
        Ok(())
    }

    fn on_run_end(&mut self, _stats: &LoopStats) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// JSONL observer - writes one tick report per line.
pub struct JsonlObserver {
    writer: BufWriter<File>,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create observation file {path:?}"),
            source,
        })?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_tick(&mut self, report: &TickReport) -> Result<()> {
        serde_json::to_writer(&mut self.writer, report)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_run_end(&mut self, _stats: &LoopStats) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::{decision::CycleRecord, types::Action};

    fn report(tick: u64) -> TickReport {
        TickReport {
            tick,
            state: 3,
            action: Action::ActOnTarget,
            outcome: Outcome::Succeeded,
            reward: 0.2,
            update: (tick > 1).then_some(CycleRecord {
                previous_state: 1,
                action_taken: Action::RandomWalk,
                reward: 0.0,
                current_state: 3,
            }),
            updated_value: (tick > 1).then_some(0.0),
            snapshot: None,
        }
    }

    #[test]
    fn test_jsonl_observer_writes_one_line_per_tick() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("ticks.jsonl");

        let mut observer = JsonlObserver::new(&path).expect("Failed to create observer");
        observer.on_run_start(2).unwrap();
        observer.on_tick(&report(1)).unwrap();
        observer.on_tick(&report(2)).unwrap();
        observer.on_run_end(&LoopStats::default()).unwrap();

        let contents = fs::read_to_string(&path).expect("Failed to read");
        let lines: Vec<TickReport> = contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid json line"))
            .collect();
        assert_eq!(lines, vec![report(1), report(2)]);
    }

    #[test]
    fn test_progress_observer_counts_successes() {
        let mut observer = ProgressObserver::new();
        observer.on_tick(&report(1)).unwrap();
        observer.on_tick(&report(2)).unwrap();
        assert_eq!(observer.successes, 2);
        assert!(observer.message().starts_with("success 100.0%"));
    }
}
