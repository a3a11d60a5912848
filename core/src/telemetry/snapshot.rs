//! telemetry/snapshot.rs
//! Immutable report of one ingest call.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::IngestCounters;
use crate::telemetry::timers::{StageTimes, TelemetryTimer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub bytes_read: u64,
    pub members_seen: u64,
    pub members_skipped: u64,
    pub delivered: BTreeMap<String, u64>,
    pub peak_record_bytes: u64,
    pub peak_depth: usize,
    pub peak_scratch: usize,
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &IngestCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_read as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            bytes_read: counters.bytes_read,
            members_seen: counters.members_seen,
            members_skipped: counters.members_skipped,
            delivered: counters.delivered.clone(),
            peak_record_bytes: counters.peak_record_bytes,
            peak_depth: counters.peak_depth,
            peak_scratch: counters.peak_scratch,
            throughput_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    /// Records delivered for `field`; zero when the member never appeared.
    pub fn delivered_for(&self, field: &str) -> u64 {
        self.delivered.get(field).copied().unwrap_or(0)
    }

    pub fn total_delivered(&self) -> u64 {
        self.delivered.values().sum()
    }

    /// Internal consistency: skipped members are a subset, stages fit in the
    /// elapsed time.
    pub fn sanity_check(&self) -> bool {
        self.members_skipped <= self.members_seen && self.stage_times.total() <= self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::timers::Stage;

    #[test]
    fn snapshot_copies_counters_and_serializes() {
        let mut counters = IngestCounters::default();
        counters.add_member(false);
        counters.add_record("name", 7);
        counters.observe_reader(64, 2, 5);

        let mut timer = TelemetryTimer::new();
        timer.add_stage_time(Stage::Decode, Duration::ZERO);
        timer.finish();

        let snap = TelemetrySnapshot::from(&counters, &timer);
        assert_eq!(snap.delivered_for("name"), 1);
        assert_eq!(snap.delivered_for("gender"), 0);
        assert_eq!(snap.bytes_read, 64);
        assert!(snap.sanity_check());

        let json = serde_json::to_string(&snap).unwrap();
        let back: TelemetrySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.delivered, snap.delivered);
    }
}
