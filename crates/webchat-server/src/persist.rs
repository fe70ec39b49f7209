//! Periodic persistence of the message log.
//!
//! The scheduler owns the watermark: the number of log records already
//! written. Each tick compares it to the current log length and, when new
//! records exist, overwrites the snapshot file with the records selected by
//! the configured [`PersistMode`]. The watermark only advances after a
//! successful write, so a failed flush is retried on the next tick.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use webchat_store::{PersistMode, SnapshotFile, StoreError};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::state::ChatState;

/// Parse a human-readable interval such as `30s`, `5m` or `1h30m`.
pub fn parse_interval(value: &str) -> Result<Duration, ServerError> {
    let interval =
        humantime::parse_duration(value.trim()).map_err(|source| ServerError::InvalidInterval {
            value: value.to_string(),
            source,
        })?;
    if interval.is_zero() {
        return Err(ServerError::ZeroInterval);
    }
    Ok(interval)
}

pub struct PersistenceScheduler {
    state: ChatState,
    file: SnapshotFile,
    mode: PersistMode,
    interval: Duration,
    watermark: usize,
}

impl PersistenceScheduler {
    /// Fails if the configured interval cannot be parsed.
    pub fn new(state: ChatState, config: &ServerConfig) -> Result<Self, ServerError> {
        let interval = parse_interval(&config.persist_interval)?;
        Ok(Self {
            state,
            file: SnapshotFile::new(&config.persist_file),
            mode: config.persist_mode,
            interval,
            watermark: 0,
        })
    }

    pub fn watermark(&self) -> usize {
        self.watermark
    }

    /// Load the snapshot file into the log, if there is one. A missing or
    /// unreadable file leaves the log empty; neither stops the server.
    /// Returns the number of restored records.
    pub async fn restore_on_startup(&mut self) -> usize {
        let path = self.file.path().display().to_string();
        match self.file.load().await {
            Ok(Some(records)) => {
                let restored = self.state.restore_messages(records).await;
                self.watermark = restored;
                info!(path = %path, count = restored, "Restored messages");
                restored
            }
            Ok(None) => {
                info!(path = %path, "No persistence file found, starting with an empty log");
                0
            }
            Err(e) => {
                warn!(error = %e, "Failed to restore messages, starting with an empty log");
                0
            }
        }
    }

    /// One persistence cycle. Returns how many records were written; zero
    /// means nothing was appended since the last successful flush.
    pub async fn flush(&mut self) -> Result<usize, StoreError> {
        let pending = self.state.pending_flush(self.mode, self.watermark).await;
        if pending.records.is_empty() {
            return Ok(0);
        }

        info!(
            count = pending.records.len(),
            new = pending.len - self.watermark,
            path = %self.file.path().display(),
            mode = %self.mode,
            "Writing records"
        );
        self.file.write(&pending.records).await?;
        self.watermark = pending.len;
        Ok(pending.records.len())
    }

    async fn flush_logged(&mut self) {
        if let Err(e) = self.flush().await {
            error!(
                error = %e,
                watermark = self.watermark,
                "Persistence flush failed, will retry next tick"
            );
        }
    }

    /// Flush every interval until `shutdown` flips to `true`, then flush
    /// once more and return.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            path = %self.file.path().display(),
            every = %humantime::format_duration(self.interval),
            mode = %self.mode,
            "Persisting messages"
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.flush_logged().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Persistence task stopping, final flush");
        self.flush_logged().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use webchat_shared::Message;

    fn config(dir: &TempDir, mode: PersistMode) -> ServerConfig {
        ServerConfig {
            persist: true,
            persist_file: dir.path().join("data.json"),
            persist_interval: "50ms".to_string(),
            persist_mode: mode,
            ..ServerConfig::default()
        }
    }

    async fn on_disk(dir: &TempDir) -> Vec<Message> {
        SnapshotFile::new(dir.path().join("data.json"))
            .load()
            .await
            .unwrap()
            .unwrap_or_default()
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_interval("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_interval("250ms").unwrap(), Duration::from_millis(250));
        assert!(matches!(
            parse_interval("often"),
            Err(ServerError::InvalidInterval { .. })
        ));
        assert!(matches!(parse_interval("0s"), Err(ServerError::ZeroInterval)));
    }

    #[test]
    fn test_malformed_interval_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, PersistMode::Suffix);
        cfg.persist_interval = "five minutes-ish".to_string();
        assert!(PersistenceScheduler::new(ChatState::new(), &cfg).is_err());
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let state = ChatState::new();
        let mut scheduler =
            PersistenceScheduler::new(state.clone(), &config(&dir, PersistMode::Suffix)).unwrap();

        assert_eq!(scheduler.restore_on_startup().await, 0);
        assert_eq!(scheduler.watermark(), 0);
        assert_eq!(state.message_count().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("data.json"), "[{\"Name\":").await.unwrap();
        let state = ChatState::new();
        let mut scheduler =
            PersistenceScheduler::new(state.clone(), &config(&dir, PersistMode::Suffix)).unwrap();

        assert_eq!(scheduler.restore_on_startup().await, 0);
        assert_eq!(state.message_count().await, 0);
    }

    #[tokio::test]
    async fn test_flush_then_restore_roundtrip() {
        let dir = TempDir::new().unwrap();
        let state = ChatState::new();
        state.post_message("alice", "hi").await;
        state.post_message("bob", "").await;
        let mut scheduler =
            PersistenceScheduler::new(state.clone(), &config(&dir, PersistMode::Suffix)).unwrap();
        assert_eq!(scheduler.flush().await.unwrap(), 2);

        let restored_state = ChatState::new();
        let mut restorer =
            PersistenceScheduler::new(restored_state.clone(), &config(&dir, PersistMode::Suffix))
                .unwrap();
        assert_eq!(restorer.restore_on_startup().await, 2);
        assert_eq!(restorer.watermark(), 2);
        assert_eq!(restored_state.messages().await, state.messages().await);
    }

    #[tokio::test]
    async fn test_second_flush_without_appends_is_noop() {
        let dir = TempDir::new().unwrap();
        let state = ChatState::new();
        state.post_message("alice", "hi").await;
        let mut scheduler =
            PersistenceScheduler::new(state.clone(), &config(&dir, PersistMode::Suffix)).unwrap();

        assert_eq!(scheduler.flush().await.unwrap(), 1);
        // a file swapped in behind our back survives the no-op flush
        tokio::fs::write(dir.path().join("data.json"), "[]").await.unwrap();
        assert_eq!(scheduler.flush().await.unwrap(), 0);
        assert!(on_disk(&dir).await.is_empty());
        assert_eq!(scheduler.watermark(), 1);
    }

    #[tokio::test]
    async fn test_suffix_mode_writes_only_new_records() {
        let dir = TempDir::new().unwrap();
        let state = ChatState::new();
        let mut scheduler =
            PersistenceScheduler::new(state.clone(), &config(&dir, PersistMode::Suffix)).unwrap();

        state.post_message("a", "1").await;
        state.post_message("a", "2").await;
        scheduler.flush().await.unwrap();
        assert_eq!(scheduler.watermark(), 2);

        state.post_message("a", "3").await;
        assert_eq!(scheduler.flush().await.unwrap(), 1);
        assert_eq!(scheduler.watermark(), 3);

        let written = on_disk(&dir).await;
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].body, "3");
    }

    #[tokio::test]
    async fn test_cumulative_mode_writes_whole_log() {
        let dir = TempDir::new().unwrap();
        let state = ChatState::new();
        let mut scheduler =
            PersistenceScheduler::new(state.clone(), &config(&dir, PersistMode::Cumulative))
                .unwrap();

        state.post_message("a", "1").await;
        scheduler.flush().await.unwrap();
        state.post_message("a", "2").await;
        assert_eq!(scheduler.flush().await.unwrap(), 2);
        assert_eq!(on_disk(&dir).await.len(), 2);
        assert_eq!(scheduler.flush().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_restored_records_are_not_rewritten_in_suffix_mode() {
        let dir = TempDir::new().unwrap();
        SnapshotFile::new(dir.path().join("data.json"))
            .write(&[Message::new("old", "from disk")])
            .await
            .unwrap();

        let state = ChatState::new();
        let mut scheduler =
            PersistenceScheduler::new(state.clone(), &config(&dir, PersistMode::Suffix)).unwrap();
        scheduler.restore_on_startup().await;
        assert_eq!(scheduler.flush().await.unwrap(), 0);

        state.post_message("new", "fresh").await;
        assert_eq!(scheduler.flush().await.unwrap(), 1);
        assert_eq!(scheduler.watermark(), 2);
        assert_eq!(on_disk(&dir).await[0].author, "new");
    }

    #[tokio::test]
    async fn test_failed_write_keeps_watermark_and_retries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        // a directory in the file's place makes the write fail
        tokio::fs::create_dir(&path).await.unwrap();

        let state = ChatState::new();
        let mut scheduler =
            PersistenceScheduler::new(state.clone(), &config(&dir, PersistMode::Suffix)).unwrap();
        state.post_message("a", "1").await;

        assert!(scheduler.flush().await.is_err());
        assert_eq!(scheduler.watermark(), 0);

        tokio::fs::remove_dir(&path).await.unwrap();
        state.post_message("a", "2").await;
        assert_eq!(scheduler.flush().await.unwrap(), 2);
        assert_eq!(scheduler.watermark(), 2);
    }

    #[tokio::test]
    async fn test_run_flushes_on_tick_and_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let state = ChatState::new();
        let scheduler =
            PersistenceScheduler::new(state.clone(), &config(&dir, PersistMode::Cumulative))
                .unwrap();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(rx));

        state.post_message("a", "1").await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(on_disk(&dir).await.len(), 1);

        state.post_message("a", "2").await;
        tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(on_disk(&dir).await.len(), 2);
    }
}
