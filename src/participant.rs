//! The election participant state machine.
//!
//! One participant owns one coordination-service session and one logical
//! control loop: register an ephemeral sequential node, compute rank from a
//! fresh sibling snapshot, and either lead for a fixed tenure before
//! simulating a crash, or watch the current leader's node and re-check when
//! it disappears. Cold-start and failover latencies are recorded as a side
//! effect, each at most once per participant lifetime.
//!
//! Followers watch the *leader's* node rather than their immediate
//! predecessor, so several followers can wake from the same deletion.
//! Every wake-up therefore loops back to a fresh sibling fetch instead of
//! trusting the event.

use std::time::{Instant, SystemTime};
use uuid::Uuid;

use crate::config::ElectionConfig;
use crate::death::DeathFile;
use crate::metrics::MetricsSink;
use crate::rank;
use crate::registry::{NodeRegistry, WatchOutcome};
use crate::Error;

/// Terminal result of one participant's run.
///
/// Participants never exit the process; they hand this back to the caller
/// so many of them can share one process in tests and the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Held leadership for the full tenure, wrote the death timestamp and
    /// released the session.
    Crashed { node_name: String },
    /// Observed a leader death within the recency window and logged the
    /// failover latency. The participant's job ends once it has discovered
    /// the new state.
    ObservedFailover { new_leader: String },
}

pub struct Participant<R: NodeRegistry> {
    registry: R,
    config: ElectionConfig,
    run_no: u32,
    identity: Uuid,
    short_id: String,
    death: DeathFile,
    cold_start_sink: MetricsSink,
    failover_sink: MetricsSink,
}

impl<R: NodeRegistry> Participant<R> {
    pub fn new(registry: R, config: ElectionConfig, run_no: u32) -> Self {
        let identity = Uuid::new_v4();
        let short_id = identity.to_string()[..8].to_string();
        let death = DeathFile::new(&config.death_file);
        let cold_start_sink = MetricsSink::new(&config.cold_start_file);
        let failover_sink = MetricsSink::new(&config.failover_file);
        Self {
            registry,
            config,
            run_no,
            identity,
            short_id,
            death,
            cold_start_sink,
            failover_sink,
        }
    }

    pub fn short_id(&self) -> &str {
        &self.short_id
    }

    /// Run the election to a terminal state.
    ///
    /// # Errors
    ///
    /// Fatal conditions only: registration failure, or this participant's
    /// own node vanishing from a fresh sibling snapshot. Transient sibling
    /// fetch problems are retried indefinitely with a fixed delay.
    pub async fn run(self) -> Result<Outcome, Error> {
        let start_time = Instant::now();

        // Registering: identity within the election round. Any failure here
        // is fatal, the participant cannot proceed without a node.
        let node_path = self
            .registry
            .create_sequential(&self.config.creation_prefix())
            .await
            .map_err(|e| Error::Registration(e.to_string()))?;
        let node_name = rank::node_basename(&node_path).to_string();
        tracing::info!(
            id = %self.short_id,
            uuid = %self.identity,
            path = %node_path,
            "registered for election"
        );

        let mut cold_start_logged = false;
        let mut failover_logged = false;

        loop {
            // Fresh snapshot every iteration; a rank computed before a
            // watch fired is never acted upon.
            let siblings = match self.registry.children(&self.config.namespace).await {
                Ok(siblings) if !siblings.is_empty() => siblings,
                Ok(_) => {
                    tokio::time::sleep(self.config.retry_delay).await;
                    continue;
                }
                Err(e) => {
                    tracing::debug!(id = %self.short_id, "sibling fetch failed, retrying: {}", e);
                    tokio::time::sleep(self.config.retry_delay).await;
                    continue;
                }
            };

            let rank = rank::resolve(&siblings, &node_name)?;

            if !cold_start_logged {
                cold_start_logged = true;
                let elapsed = start_time.elapsed();
                if elapsed < self.config.cold_start_window {
                    self.record(&self.cold_start_sink, &rank.leader, millis(elapsed))
                        .await;
                    tracing::info!(
                        id = %self.short_id,
                        leader = %rank.leader,
                        elapsed_ms = format!("{:.2}", millis(elapsed)),
                        "discovered leader"
                    );
                }
            }

            if !failover_logged {
                if let Some(death_time) = self.death.read_death().await {
                    // duration_since fails only if the death is in the
                    // future (clock skew); never log a negative duration.
                    if let Ok(age) = SystemTime::now().duration_since(death_time) {
                        if age < self.config.failover_window {
                            failover_logged = true;
                            self.record(&self.failover_sink, &rank.leader, millis(age))
                                .await;
                            tracing::info!(
                                id = %self.short_id,
                                new_leader = %rank.leader,
                                failover_ms = format!("{:.2}", millis(age)),
                                "failover complete"
                            );
                            // Done once the new state is discovered.
                            if let Err(e) = self.registry.close().await {
                                tracing::warn!(id = %self.short_id, "session close failed: {}", e);
                            }
                            return Ok(Outcome::ObservedFailover {
                                new_leader: rank.leader,
                            });
                        }
                    }
                }
            }

            if rank.is_leader() {
                return self.lead(&node_name).await;
            }

            // Follower: watch the current leader's node, bounded so the
            // loop re-polls even without a firing watch.
            let watch_path = self.config.sibling_path(&rank.leader);
            match self.registry.watch_deletion(&watch_path).await {
                Ok(Some(watch)) => {
                    if watch.wait(self.config.watch_timeout).await == WatchOutcome::Deleted {
                        tracing::info!(
                            id = %self.short_id,
                            leader = %rank.leader,
                            "leader node deleted, re-checking"
                        );
                    }
                }
                // Leader already gone between snapshot and watch; the next
                // iteration re-reads the sibling set.
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(id = %self.short_id, "watch setup failed, retrying: {}", e);
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }
    }

    /// Hold leadership for the configured tenure, then simulate a crash:
    /// write the death timestamp, release the session so the ephemeral node
    /// disappears, and terminate.
    async fn lead(&self, node_name: &str) -> Result<Outcome, Error> {
        tracing::info!(
            id = %self.short_id,
            node = %node_name,
            tenure_ms = self.config.leader_tenure.as_millis() as u64,
            "elected leader"
        );
        tokio::time::sleep(self.config.leader_tenure).await;

        // The crash signal consumed by followers. Written before the
        // session closes so an observer woken by the deletion always finds
        // a timestamp.
        if let Err(e) = self.death.write_death(SystemTime::now()).await {
            tracing::warn!(id = %self.short_id, "death timestamp write failed: {}", e);
        }
        if let Err(e) = self.registry.close().await {
            tracing::warn!(id = %self.short_id, "session close failed: {}", e);
        }
        tracing::info!(id = %self.short_id, "simulating crash");
        Ok(Outcome::Crashed {
            node_name: node_name.to_string(),
        })
    }

    async fn record(&self, sink: &MetricsSink, leader: &str, duration_ms: f64) {
        // Metrics loss never crashes a participant mid-protocol.
        if let Err(e) = sink
            .append(self.run_no, &self.short_id, leader, duration_ms)
            .await
        {
            tracing::warn!(id = %self.short_id, "metrics write failed: {}", e);
        }
    }
}

fn millis(duration: std::time::Duration) -> f64 {
    duration.as_secs_f64() * 1e3
}
