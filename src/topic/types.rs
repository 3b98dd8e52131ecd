use crate::frame::framer::to_frame;
use crate::frame::types::Frame;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One delivered broker message. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub value: Vec<u8>,
}

impl Message {
    pub fn new(timestamp: DateTime<Utc>, value: impl Into<Vec<u8>>) -> Self {
        Message {
            timestamp,
            value: value.into(),
        }
    }
}

/// A configured sub-path to pull out of JSON message bodies.
///
/// `path` is matched against flattened keys (`a.b`, `c[0]`); an empty
/// `alias` means the column keeps the path as its name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionPath {
    pub path: String,
    #[serde(default)]
    pub alias: String,
}

impl ExtractionPath {
    pub fn new(path: impl Into<String>, alias: impl Into<String>) -> Self {
        ExtractionPath {
            path: path.into(),
            alias: alias.into(),
        }
    }

    /// Column name this path materializes under.
    pub fn column_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.path
        } else {
            &self.alias
        }
    }
}

/// Store key for a topic: the same path can be buffered at several
/// aggregation intervals, each its own entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicKey {
    pub interval: Duration,
    pub path: String,
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{}", self.interval, self.path)
    }
}

/// A subscribed message stream: its path, display configuration, and
/// buffered history.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    pub path: String,
    pub interval: Duration,
    pub extraction_paths: Vec<ExtractionPath>,
    pub messages: Vec<Message>,
}

impl Topic {
    pub fn new(path: impl Into<String>, interval: Duration) -> Self {
        Topic {
            path: path.into(),
            interval,
            extraction_paths: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn key(&self) -> TopicKey {
        TopicKey {
            interval: self.interval,
            path: self.path.clone(),
        }
    }

    /// Build the columnar frame for the current message history.
    ///
    /// Rebuilt from scratch on every call; with unchanged messages and
    /// extraction paths the result is identical each time.
    pub fn to_frame(&self) -> Frame {
        to_frame(&self.path, &self.messages, &self.extraction_paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_includes_interval_and_path() {
        let a = Topic::new("sensors/temp", Duration::from_secs(1));
        let b = Topic::new("sensors/temp", Duration::from_secs(5));

        assert_ne!(a.key(), b.key());
        assert_eq!(a.key().path, b.key().path);
    }

    #[test]
    fn test_extraction_path_column_name() {
        assert_eq!(ExtractionPath::new("a.b", "").column_name(), "a.b");
        assert_eq!(ExtractionPath::new("a.b", "temp").column_name(), "temp");
    }

    #[test]
    fn test_extraction_path_from_config_json() {
        let p: ExtractionPath = serde_json::from_str(r#"{"path": "a.b"}"#).unwrap();

        assert_eq!(p.path, "a.b");
        assert_eq!(p.alias, "");
    }
}
