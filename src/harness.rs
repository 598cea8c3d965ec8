//! In-process benchmark harness.
//!
//! Drives one or more election iterations against a shared coordination
//! service: provision the namespace, spawn N participants as independent
//! tasks (the service is their only shared state), bound the iteration
//! with a deadline, abort stragglers, and collect terminal outcomes.

use std::time::{Duration, Instant};

use crate::config::ElectionConfig;
use crate::death::DeathFile;
use crate::memory::InMemoryHive;
use crate::participant::{Outcome, Participant};
use crate::registry::NodeRegistry;
use crate::Error;

/// Wall-clock slack past the leader tenure before stragglers are aborted.
const SETTLE_BUFFER: Duration = Duration::from_secs(3);
/// Pause between consecutive iterations.
const INTER_RUN_PAUSE: Duration = Duration::from_secs(1);

/// What one iteration produced.
#[derive(Debug)]
pub struct IterationReport {
    pub run_no: u32,
    pub outcomes: Vec<Outcome>,
    /// Stringified fatal participant errors (connect loss, vanished nodes).
    pub fatal_errors: Vec<String>,
    /// Participants still running at the deadline, aborted by the harness.
    pub aborted: usize,
    pub elapsed: Duration,
}

impl IterationReport {
    pub fn crashes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Crashed { .. }))
            .count()
    }

    pub fn failovers(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::ObservedFailover { .. }))
            .count()
    }
}

pub struct Harness {
    hive: InMemoryHive,
    config: ElectionConfig,
    participants: usize,
}

impl Harness {
    pub fn new(hive: InMemoryHive, config: ElectionConfig, participants: usize) -> Self {
        Self {
            hive,
            config,
            participants,
        }
    }

    /// Satisfy the precondition every participant relies on: the election
    /// parent node exists. With `clear_stale`, leftovers from a previous
    /// run (stale children and the death-timestamp slot) are removed first
    /// so a fresh iteration cannot mistake an old crash for its own.
    pub async fn provision(&self, clear_stale: bool) -> Result<(), Error> {
        let session = self.hive.connect().await?;
        session.ensure_node(&self.config.namespace).await?;

        if clear_stale {
            for leaf in session.children(&self.config.namespace).await? {
                session.delete(&self.config.sibling_path(&leaf)).await?;
            }
            DeathFile::new(&self.config.death_file).clear().await?;
        }

        session.close().await
    }

    /// Run a single provision-spawn-collect iteration.
    pub async fn run_iteration(
        &self,
        run_no: u32,
        clear_stale: bool,
    ) -> Result<IterationReport, Error> {
        self.provision(clear_stale).await?;
        tracing::info!(run_no, participants = self.participants, "iteration starting");

        let started = Instant::now();
        let mut handles = Vec::with_capacity(self.participants);
        for _ in 0..self.participants {
            let session = self.hive.connect().await?;
            let participant = Participant::new(session, self.config.clone(), run_no);
            tracing::debug!(run_no, id = %participant.short_id(), "spawning participant");
            handles.push(tokio::spawn(participant.run()));
        }

        let deadline = self.config.leader_tenure + SETTLE_BUFFER;
        let mut outcomes = Vec::new();
        let mut fatal_errors = Vec::new();
        let mut aborted = 0;

        for handle in handles {
            let remaining = deadline.saturating_sub(started.elapsed());
            let aborter = handle.abort_handle();
            match tokio::time::timeout(remaining, handle).await {
                Ok(Ok(Ok(outcome))) => outcomes.push(outcome),
                Ok(Ok(Err(e))) => {
                    tracing::warn!(run_no, "participant failed: {}", e);
                    fatal_errors.push(e.to_string());
                }
                Ok(Err(join_err)) => {
                    tracing::warn!(run_no, "participant task panicked: {}", join_err);
                    fatal_errors.push(join_err.to_string());
                }
                Err(_) => {
                    // Still running at the deadline, the in-process
                    // stand-in for killing a leftover process.
                    aborter.abort();
                    aborted += 1;
                }
            }
        }

        let report = IterationReport {
            run_no,
            outcomes,
            fatal_errors,
            aborted,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            run_no,
            crashes = report.crashes(),
            failovers = report.failovers(),
            aborted = report.aborted,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "iteration complete"
        );
        Ok(report)
    }

    /// Run several iterations back to back with a short pause between them.
    pub async fn run(
        &self,
        iterations: u32,
        run_offset: u32,
        clear_stale: bool,
    ) -> Result<Vec<IterationReport>, Error> {
        let mut reports = Vec::with_capacity(iterations as usize);
        for i in 0..iterations {
            reports.push(self.run_iteration(run_offset + i, clear_stale).await?);
            if i + 1 < iterations {
                tokio::time::sleep(INTER_RUN_PAUSE).await;
            }
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> ElectionConfig {
        ElectionConfig {
            leader_tenure: Duration::from_millis(100),
            retry_delay: Duration::from_millis(10),
            watch_timeout: Duration::from_millis(50),
            death_file: dir.path().join("last_leader_death.txt"),
            cold_start_file: dir.path().join("cold_start_data.csv"),
            failover_file: dir.path().join("failover_data.csv"),
            ..ElectionConfig::default()
        }
    }

    #[tokio::test]
    async fn test_provision_clears_stale_children_and_death_slot() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let hive = InMemoryHive::new();

        // Leftovers from a "previous run".
        let stale = hive.connect().await.unwrap();
        stale.ensure_node("/election").await.unwrap();
        stale.create_sequential("/election/guid-n_").await.unwrap();
        DeathFile::new(&config.death_file)
            .write_death(SystemTime::now())
            .await
            .unwrap();

        let harness = Harness::new(hive.clone(), config.clone(), 3);
        harness.provision(true).await.unwrap();

        let session = hive.connect().await.unwrap();
        assert!(session.children("/election").await.unwrap().is_empty());
        assert!(DeathFile::new(&config.death_file).read_death().await.is_none());
        stale.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_provision_skip_cleanup_keeps_children() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let hive = InMemoryHive::new();

        let stale = hive.connect().await.unwrap();
        stale.ensure_node("/election").await.unwrap();
        stale.create_sequential("/election/guid-n_").await.unwrap();

        let harness = Harness::new(hive.clone(), config, 3);
        harness.provision(false).await.unwrap();

        let session = hive.connect().await.unwrap();
        assert_eq!(session.children("/election").await.unwrap().len(), 1);
        stale.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_iteration_yields_one_crash_and_failovers() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let harness = Harness::new(InMemoryHive::new(), config, 3);

        let report = harness.run_iteration(1, true).await.unwrap();

        assert_eq!(report.crashes(), 1, "exactly one simulated crash");
        assert!(
            report.failovers() >= 1,
            "at least one survivor must log the failover, report: {:?}",
            report
        );
        assert!(report.fatal_errors.is_empty(), "{:?}", report.fatal_errors);
    }
}
