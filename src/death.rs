//! Single-slot death-timestamp store.
//!
//! A crashing leader writes its wall-clock time of death here; surviving
//! participants read it to compute failover latency across process
//! boundaries. Last write wins: the protocol guarantees one leader at a
//! time, so concurrent writers never occur. The encoding is integer
//! nanoseconds since the Unix epoch, identical for writer and reader.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::Error;

pub struct DeathFile {
    path: PathBuf,
}

impl DeathFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Record `at` as the most recent leader death, replacing any previous
    /// value.
    pub async fn write_death(&self, at: SystemTime) -> Result<(), Error> {
        let nanos = unix_nanos(at);
        tokio::fs::write(&self.path, nanos.to_string()).await?;
        Ok(())
    }

    /// Read the most recent death, if any.
    ///
    /// Absence means "no crash yet" and is not an error; unreadable or
    /// unparsable content is logged and also reads as `None`. Recency is
    /// the caller's judgment; the store keeps no history.
    pub async fn read_death(&self) -> Option<SystemTime> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "death timestamp unreadable: {}", e);
                return None;
            }
        };

        match raw.trim().parse::<u64>() {
            Ok(nanos) => Some(UNIX_EPOCH + Duration::from_nanos(nanos)),
            Err(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "death timestamp malformed, treating as absent"
                );
                None
            }
        }
    }

    /// Remove the slot entirely. Used by provisioning so a fresh run never
    /// mistakes the previous run's crash for its own.
    pub async fn clear(&self) -> Result<(), Error> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn unix_nanos(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store(dir: &tempfile::TempDir) -> DeathFile {
        DeathFile::new(dir.path().join("last_leader_death.txt"))
    }

    #[tokio::test]
    async fn test_roundtrip_is_exact_at_nanosecond_precision() {
        let dir = tempdir().unwrap();
        let death = store(&dir);

        let at = SystemTime::now();
        death.write_death(at).await.unwrap();
        let read = death.read_death().await.unwrap();

        // The encoding truncates to whole nanoseconds, so the written and
        // read values agree exactly.
        assert_eq!(unix_nanos(read), unix_nanos(at));
    }

    #[tokio::test]
    async fn test_failover_duration_is_observation_minus_death() {
        let dir = tempdir().unwrap();
        let death = store(&dir);

        let at = SystemTime::now();
        death.write_death(at).await.unwrap();
        let read = death.read_death().await.unwrap();

        let observed = at + Duration::from_millis(1234);
        assert_eq!(
            observed.duration_since(read).unwrap(),
            Duration::from_millis(1234)
        );
    }

    #[tokio::test]
    async fn test_absent_file_reads_as_none() {
        let dir = tempdir().unwrap();
        assert!(store(&dir).read_death().await.is_none());
    }

    #[tokio::test]
    async fn test_garbage_reads_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("last_leader_death.txt");
        tokio::fs::write(&path, "not-a-timestamp").await.unwrap();
        assert!(DeathFile::new(path).read_death().await.is_none());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let dir = tempdir().unwrap();
        let death = store(&dir);

        let first = UNIX_EPOCH + Duration::from_secs(100);
        let second = UNIX_EPOCH + Duration::from_secs(200);
        death.write_death(first).await.unwrap();
        death.write_death(second).await.unwrap();

        assert_eq!(death.read_death().await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let death = store(&dir);

        death.write_death(SystemTime::now()).await.unwrap();
        death.clear().await.unwrap();
        death.clear().await.unwrap();

        assert!(death.read_death().await.is_none());
    }
}
