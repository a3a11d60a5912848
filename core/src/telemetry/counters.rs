//! telemetry/counters.rs
//! Mutable counters collected while one document is ingested.
//! Converted into an immutable TelemetrySnapshot when the call ends.

use std::collections::BTreeMap;

#[derive(Default, Clone, Debug, PartialEq)]
pub struct IngestCounters {
    pub bytes_read: u64,
    pub members_seen: u64,
    pub members_skipped: u64,
    /// Records delivered, keyed by member name.
    pub delivered: BTreeMap<String, u64>,
    /// Largest single element, measured in source bytes.
    pub peak_record_bytes: u64,
    pub peak_depth: usize,
    /// Longest member name or string the parser handed out.
    pub peak_scratch: usize,
}

impl IngestCounters {
    pub fn add_member(&mut self, skipped: bool) {
        self.members_seen += 1;
        if skipped {
            self.members_skipped += 1;
        }
    }

    /// Record one delivered element spanning `source_bytes` of input.
    pub fn add_record(&mut self, field: &str, source_bytes: u64) {
        match self.delivered.get_mut(field) {
            Some(n) => *n += 1,
            None => {
                self.delivered.insert(field.to_string(), 1);
            }
        }
        self.peak_record_bytes = self.peak_record_bytes.max(source_bytes);
    }

    pub fn total_delivered(&self) -> u64 {
        self.delivered.values().sum()
    }

    pub fn observe_reader(&mut self, bytes_read: u64, depth: usize, scratch: usize) {
        self.bytes_read = bytes_read;
        self.peak_depth = self.peak_depth.max(depth);
        self.peak_scratch = self.peak_scratch.max(scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_peaks() {
        let mut c = IngestCounters::default();
        c.add_member(false);
        c.add_member(true);
        c.add_record("name", 10);
        c.add_record("name", 4);
        c.add_record("gender", 30);
        assert_eq!(c.members_seen, 2);
        assert_eq!(c.members_skipped, 1);
        assert_eq!(c.delivered["name"], 2);
        assert_eq!(c.total_delivered(), 3);
        assert_eq!(c.peak_record_bytes, 30);
    }

    #[test]
    fn reader_peaks_only_grow() {
        let mut c = IngestCounters::default();
        c.observe_reader(100, 3, 8);
        c.observe_reader(140, 2, 20);
        assert_eq!(c.bytes_read, 140);
        assert_eq!(c.peak_depth, 3);
        assert_eq!(c.peak_scratch, 20);
    }
}
