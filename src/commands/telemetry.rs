//! Usage telemetry for command handlers.
//!
//! Counts how often each handler type has run. Dispatches happen
//! concurrently, so the counters live in a concurrent map. A JSON snapshot is
//! saved on shutdown and loaded on the next start so totals survive restarts.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Concurrent per-handler invocation counters.
#[derive(Debug, Default)]
pub struct Telemetry {
    counts: DashMap<String, u64>,
}

impl Telemetry {
    /// Creates empty telemetry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the last saved snapshot, or empty telemetry if none exists.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let counts = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str::<TelemetrySnapshot>(&s).ok())
            .map(|snapshot| snapshot.counts.into_iter().collect::<DashMap<_, _>>())
            .unwrap_or_default();

        Self { counts }
    }

    /// Saves a snapshot to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, json)
    }

    /// Records one execution of a handler.
    pub fn record(&self, handler: &str) {
        self.counts
            .entry(handler.to_owned())
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    /// Number of recorded executions for one handler.
    #[must_use]
    pub fn count(&self, handler: &str) -> u64 {
        self.counts.get(handler).map_or(0, |entry| *entry)
    }

    /// Total recorded executions across all handlers.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|entry| *entry.value()).sum()
    }

    /// A point-in-time copy of the counters.
    #[must_use]
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            recorded_at: Utc::now(),
            counts: self
                .counts
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
        }
    }
}

/// Serializable telemetry state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// When the snapshot was taken.
    pub recorded_at: DateTime<Utc>,

    /// Executions per handler type.
    pub counts: BTreeMap<String, u64>,
}

impl TelemetrySnapshot {
    /// Total executions across all handlers.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_record_and_count() {
        let telemetry = Telemetry::new();
        telemetry.record("help");
        telemetry.record("help");
        telemetry.record("info");

        assert_eq!(telemetry.count("help"), 2);
        assert_eq!(telemetry.count("info"), 1);
        assert_eq!(telemetry.count("missing"), 0);
        assert_eq!(telemetry.total(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_records_are_not_lost() {
        let telemetry = Arc::new(Telemetry::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let telemetry = Arc::clone(&telemetry);
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    telemetry.record("ping");
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(telemetry.count("ping"), 800);
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.json");

        let telemetry = Telemetry::new();
        telemetry.record("help");
        telemetry.record("help");
        telemetry.save(&path).unwrap();

        let restored = Telemetry::load(&path);
        assert_eq!(restored.count("help"), 2);
        assert_eq!(restored.total(), 2);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let telemetry = Telemetry::load("/definitely/not/there.json");
        assert_eq!(telemetry.total(), 0);
    }
}
