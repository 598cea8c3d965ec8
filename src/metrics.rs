//! Append-only CSV metrics sink.
//!
//! One row per logged event: `run, participant-id, leader-name,
//! duration-ms`. The header is written exactly when the file is currently
//! empty. That check is best-effort, which is fine with one writing
//! process per file in the benchmark topology. Callers swallow sink errors: losing a metric
//! must never abort a participant mid-protocol.

use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::Error;

const HEADER: &str = "Run No,Node ID,Leader Node,Duration (ms)";

pub struct MetricsSink {
    path: PathBuf,
}

impl MetricsSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one event row, creating the file (and its header) on first
    /// write.
    pub async fn append(
        &self,
        run_no: u32,
        participant_id: &str,
        leader: &str,
        duration_ms: f64,
    ) -> Result<(), Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut chunk = String::new();
        if file.metadata().await?.len() == 0 {
            chunk.push_str(HEADER);
            chunk.push('\n');
        }
        chunk.push_str(&format!(
            "{},{},{},{:.5}\n",
            run_no, participant_id, leader, duration_ms
        ));

        file.write_all(chunk.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_header_written_once_for_many_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("failover_data.csv");
        let sink = MetricsSink::new(&path);

        for i in 0..4 {
            sink.append(1, "deadbeef", "guid-n_0000000002", i as f64)
                .await
                .unwrap();
        }

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1..].iter().all(|line| !line.contains("Run No")));
    }

    #[tokio::test]
    async fn test_header_written_once_across_sink_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cold_start_data.csv");

        MetricsSink::new(&path)
            .append(1, "aaaa1111", "guid-n_0000000001", 12.5)
            .await
            .unwrap();
        MetricsSink::new(&path)
            .append(2, "bbbb2222", "guid-n_0000000001", 7.25)
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let headers = content.lines().filter(|l| *l == HEADER).count();
        assert_eq!(headers, 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_row_format_five_decimal_millis() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        let sink = MetricsSink::new(&path);

        sink.append(3, "cafe0123", "guid-n_0000000002", 41.20571)
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            content.lines().nth(1),
            Some("3,cafe0123,guid-n_0000000002,41.20571")
        );
    }
}
