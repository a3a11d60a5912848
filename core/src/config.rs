//! Ingest configuration.
//!
//! Every field has a default, so `{}` is a complete configuration.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_FIELDS, DEFAULT_MAX_DEPTH, DEFAULT_READ_BUFFER,
    MAX_DEPTH_LIMIT, MAX_READ_BUFFER, MIN_READ_BUFFER,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("field list must not be empty")]
    NoFields,

    #[error("field {0:?} listed more than once")]
    DuplicateField(String),

    #[error("read_buffer {have} outside {min}..={max}")]
    ReadBuffer { have: usize, min: usize, max: usize },

    #[error("max_depth {have} outside 1..={max}")]
    MaxDepth { have: usize, max: usize },

    #[error("channel_capacity must be at least 1")]
    ChannelCapacity,

    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Top-level members whose array elements are delivered, in any order.
    pub fields: Vec<String>,

    /// Bytes requested from the stream per read.
    pub read_buffer: usize,

    /// Nesting limit inside one element or one skipped value.
    pub max_depth: usize,

    /// Also check for cancellation before every array element, not just
    /// before every top-level member.
    pub check_cancel_per_element: bool,

    /// Bounded channel capacity used by the background runner.
    pub channel_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fields: DEFAULT_FIELDS.iter().map(|s| s.to_string()).collect(),
            read_buffer: DEFAULT_READ_BUFFER,
            max_depth: DEFAULT_MAX_DEPTH,
            check_cancel_per_element: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl IngestConfig {
    /// Config routing only the given members.
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(doc)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fields.is_empty() {
            return Err(ConfigError::NoFields);
        }
        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !seen.insert(field.as_str()) {
                return Err(ConfigError::DuplicateField(field.clone()));
            }
        }

        if !(MIN_READ_BUFFER..=MAX_READ_BUFFER).contains(&self.read_buffer) {
            return Err(ConfigError::ReadBuffer {
                have: self.read_buffer,
                min: MIN_READ_BUFFER,
                max: MAX_READ_BUFFER,
            });
        }
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::MaxDepth { have: self.max_depth, max: MAX_DEPTH_LIMIT });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ChannelCapacity);
        }
        Ok(())
    }

    /// Whether `member` is routed to the sink.
    #[inline]
    pub fn tracks(&self, member: &str) -> bool {
        self.fields.iter().any(|f| f == member)
    }
}
