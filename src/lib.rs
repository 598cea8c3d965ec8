//! Leader-election failover benchmark over an ephemeral-sequential-node
//! coordination service.
//!
//! This crate provides:
//! - An election participant state machine: register an ephemeral sequential
//!   node, rank siblings by service-assigned suffix (rank 0 leads), watch
//!   the current leader's node for deletion, lead for a fixed tenure, then
//!   simulate a crash
//! - Latency instrumentation: cold-start (process start to first leader
//!   determination) and failover (leader death to a survivor's discovery of
//!   the new state), appended to CSV sinks
//! - A `NodeRegistry` trait at the coordination-service boundary, with an
//!   in-memory implementation for tests and the in-process harness
//!
//! The service contract this crate consumes (and never reimplements):
//! atomically sequenced ephemeral node creation, fresh child listings,
//! one-shot deletion watches, and ephemeral removal on session end.
//!
//! # Example
//!
//! ```rust,ignore
//! use election_bench::{ElectionConfig, Harness, InMemoryHive};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ElectionConfig::from_env();
//!     let harness = Harness::new(InMemoryHive::new(), config, 3);
//!
//!     // Provision the namespace, run three participants to completion.
//!     let report = harness.run_iteration(1, true).await?;
//!     println!("crashes: {}, failovers: {}", report.crashes(), report.failovers());
//!     Ok(())
//! }
//! ```
//!
//! # Failure semantics
//!
//! Fatal: connect failure, registration failure, a participant's own node
//! vanishing from a fresh sibling snapshot. Retried with a fixed delay:
//! transient sibling fetches. Swallowed: metrics writes, since losing a
//! data point never aborts the protocol.

mod config;
mod death;
mod error;
mod harness;
mod memory;
mod metrics;
mod participant;
pub mod rank;
mod registry;

pub use config::ElectionConfig;
pub use death::DeathFile;
pub use error::Error;
pub use harness::{Harness, IterationReport};
pub use memory::{InMemoryHive, MemorySession};
pub use metrics::MetricsSink;
pub use participant::{Outcome, Participant};
pub use registry::{DeletionWatch, NodeRegistry, WatchOutcome};
