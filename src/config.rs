use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_NAMESPACE: &str = "/election";
const DEFAULT_NODE_PREFIX: &str = "guid-n_";
const DEFAULT_TENURE_SECS: u64 = 5;
const DEFAULT_COLD_START_WINDOW_SECS: u64 = 30;
const DEFAULT_FAILOVER_WINDOW_SECS: u64 = 5;
const DEFAULT_RETRY_DELAY_MS: u64 = 100;
const DEFAULT_WATCH_TIMEOUT_MS: u64 = 1000;

/// Tunables for one election round.
///
/// Defaults match the benchmark topology: 5s leader tenure, 100ms retry
/// delay on transient sibling fetches, 1s bounded watch wait so followers
/// re-poll even without a firing watch.
#[derive(Debug, Clone)]
pub struct ElectionConfig {
    /// Parent node all participants register under.
    pub namespace: String,
    /// Leaf-name prefix for ephemeral sequential nodes.
    pub node_prefix: String,
    /// How long a leader holds leadership before simulating a crash.
    pub leader_tenure: Duration,
    /// Cold-start metrics are only recorded inside this window after start.
    pub cold_start_window: Duration,
    /// A death timestamp older than this is stale and ignored.
    pub failover_window: Duration,
    /// Delay between retries of a transient sibling-set fetch.
    pub retry_delay: Duration,
    /// Upper bound on a single deletion-watch wait.
    pub watch_timeout: Duration,
    /// Single-slot death-timestamp file shared by all participants.
    pub death_file: PathBuf,
    /// Cold-start metrics CSV.
    pub cold_start_file: PathBuf,
    /// Failover metrics CSV.
    pub failover_file: PathBuf,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            node_prefix: DEFAULT_NODE_PREFIX.to_string(),
            leader_tenure: Duration::from_secs(DEFAULT_TENURE_SECS),
            cold_start_window: Duration::from_secs(DEFAULT_COLD_START_WINDOW_SECS),
            failover_window: Duration::from_secs(DEFAULT_FAILOVER_WINDOW_SECS),
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            watch_timeout: Duration::from_millis(DEFAULT_WATCH_TIMEOUT_MS),
            death_file: PathBuf::from("last_leader_death.txt"),
            cold_start_file: PathBuf::from("cold_start_data.csv"),
            failover_file: PathBuf::from("failover_data.csv"),
        }
    }
}

impl ElectionConfig {
    /// Build a config from environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            namespace: env::var("ELECTION_NAMESPACE").unwrap_or(defaults.namespace),
            node_prefix: env::var("ELECTION_NODE_PREFIX").unwrap_or(defaults.node_prefix),
            leader_tenure: env_secs("LEADER_TENURE_SECS", defaults.leader_tenure),
            cold_start_window: env_secs("COLD_START_WINDOW_SECS", defaults.cold_start_window),
            failover_window: env_secs("FAILOVER_WINDOW_SECS", defaults.failover_window),
            retry_delay: env_millis("ELECTION_RETRY_DELAY_MS", defaults.retry_delay),
            watch_timeout: env_millis("ELECTION_WATCH_TIMEOUT_MS", defaults.watch_timeout),
            death_file: env_path("DEATH_TIMESTAMP_FILE", defaults.death_file),
            cold_start_file: env_path("COLD_START_FILE", defaults.cold_start_file),
            failover_file: env_path("FAILOVER_FILE", defaults.failover_file),
        }
    }

    /// Creation prefix for this participant's ephemeral sequential node,
    /// e.g. `/election/guid-n_`.
    pub fn creation_prefix(&self) -> String {
        format!("{}/{}", self.namespace, self.node_prefix)
    }

    /// Full path of a sibling given its leaf name.
    pub fn sibling_path(&self, leaf: &str) -> String {
        format!("{}/{}", self.namespace, leaf)
    }
}

fn env_secs(key: &str, default: Duration) -> Duration {
    match env::var(key).ok().and_then(|v| v.parse::<u64>().ok()) {
        Some(secs) => Duration::from_secs(secs),
        None => default,
    }
}

fn env_millis(key: &str, default: Duration) -> Duration {
    match env::var(key).ok().and_then(|v| v.parse::<u64>().ok()) {
        Some(ms) => Duration::from_millis(ms),
        None => default,
    }
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    env::var(key).map(PathBuf::from).unwrap_or(default)
}
