//! Concurrent topic state store
//!
//! A sharded concurrent map keyed by `(interval, path)`. Producers append
//! messages while the query path materializes frames; the append happens in
//! place while the shard lock is held, so concurrent appends to the same
//! topic can never lose each other's messages.

use crate::error::{FramecastError, Result};
use crate::frame::types::Frame;
use crate::topic::types::{ExtractionPath, Message, Topic, TopicKey};
use dashmap::DashMap;

/// Keyed store of per-topic message history.
///
/// The same path may be stored once per aggregation interval; message
/// appends fan out to every interval bucket sharing the path.
#[derive(Debug, Default)]
pub struct TopicStore {
    topics: DashMap<TopicKey, Topic>,
}

impl TopicStore {
    pub fn new() -> Self {
        TopicStore {
            topics: DashMap::new(),
        }
    }

    /// Snapshot of the topic under `key`, if present.
    pub fn load(&self, key: &TopicKey) -> Option<Topic> {
        self.topics.get(key).map(|entry| entry.value().clone())
    }

    /// Upsert by the topic's computed key. Any previous entry is replaced
    /// entirely, not merged.
    pub fn store(&self, topic: Topic) {
        self.topics.insert(topic.key(), topic);
    }

    /// Create the topic for `(interval, path)` unless it already exists.
    ///
    /// Unlike `store`, an existing entry keeps its buffered messages and
    /// configuration. The check and insert happen under one entry lock, so
    /// an append racing the creation can never be overwritten.
    pub fn ensure(&self, path: &str, interval: std::time::Duration) {
        let key = TopicKey {
            interval,
            path: path.to_string(),
        };
        self.topics
            .entry(key)
            .or_insert_with(|| Topic::new(path, interval));
    }

    /// Remove a topic (unsubscribe).
    pub fn delete(&self, key: &TopicKey) -> Option<Topic> {
        self.topics.remove(key).map(|(_, topic)| topic)
    }

    /// Append a message to every topic buffered under `path`.
    ///
    /// Matches by path value, not full key, so one delivery lands in each
    /// interval bucket. The push runs under the shard lock: no
    /// read-modify-write window for a concurrent append to fall into.
    pub fn append_message(&self, path: &str, message: Message) {
        for mut entry in self.topics.iter_mut() {
            if entry.path == path {
                entry.messages.push(message.clone());
            }
        }
    }

    /// Replace the extraction-path configuration of every topic under `path`.
    pub fn set_extraction_paths(&self, path: &str, paths: Vec<ExtractionPath>) {
        for mut entry in self.topics.iter_mut() {
            if entry.path == path {
                entry.extraction_paths = paths.clone();
            }
        }
    }

    /// Build the frame for a topic from its current message history.
    ///
    /// Rebuilds on every call; for an unchanged topic the result is
    /// identical each time.
    pub fn materialize(&self, key: &TopicKey) -> Result<Frame> {
        let topic = self
            .topics
            .get(key)
            .ok_or_else(|| FramecastError::TopicNotFound(key.to_string()))?;

        Ok(topic.to_frame())
    }

    /// Keys of every interval bucket stored under `path`.
    pub fn keys_matching(&self, path: &str) -> Vec<TopicKey> {
        self.topics
            .iter()
            .filter(|entry| entry.path == path)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use std::time::Duration;

    fn msg(secs: u32, body: &str) -> Message {
        Message::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap(),
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_store_load_delete() {
        let store = TopicStore::new();
        let topic = Topic::new("sensors/temp", Duration::from_secs(1));
        let key = topic.key();

        store.store(topic);
        assert!(store.load(&key).is_some());

        store.delete(&key);
        assert!(store.load(&key).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_replaces_not_merges() {
        let store = TopicStore::new();
        let mut first = Topic::new("t", Duration::from_secs(1));
        first.messages.push(msg(1, "1.0"));
        let key = first.key();
        store.store(first);

        store.store(Topic::new("t", Duration::from_secs(1)));

        assert!(store.load(&key).unwrap().messages.is_empty());
    }

    #[test]
    fn test_ensure_keeps_existing_topic_intact() {
        let store = TopicStore::new();
        store.store(Topic::new("t", Duration::from_secs(1)));
        store.append_message("t", msg(1, "1.0"));

        store.ensure("t", Duration::from_secs(1));

        let key = TopicKey {
            interval: Duration::from_secs(1),
            path: "t".to_string(),
        };
        assert_eq!(store.load(&key).unwrap().messages.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ensure_concurrent_with_append_loses_nothing() {
        let store = Arc::new(TopicStore::new());
        store.store(Topic::new("t", Duration::ZERO));

        let appends = 200;
        let appender = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..appends {
                    store.append_message("t", msg(1, &format!("{}", i)));
                }
            })
        };
        let ensurer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..appends {
                    store.ensure("t", Duration::ZERO);
                }
            })
        };
        appender.join().unwrap();
        ensurer.join().unwrap();

        let key = TopicKey {
            interval: Duration::ZERO,
            path: "t".to_string(),
        };
        assert_eq!(store.load(&key).unwrap().messages.len(), appends);
    }

    #[test]
    fn test_append_fans_out_across_intervals() {
        let store = TopicStore::new();
        store.store(Topic::new("t", Duration::from_secs(1)));
        store.store(Topic::new("t", Duration::from_secs(5)));
        store.store(Topic::new("other", Duration::from_secs(1)));

        store.append_message("t", msg(1, "1.0"));

        for key in store.keys_matching("t") {
            assert_eq!(store.load(&key).unwrap().messages.len(), 1);
        }
        let other = TopicKey {
            interval: Duration::from_secs(1),
            path: "other".to_string(),
        };
        assert!(store.load(&other).unwrap().messages.is_empty());
    }

    #[test]
    fn test_materialize_unknown_key_is_an_error() {
        let store = TopicStore::new();
        let key = TopicKey {
            interval: Duration::from_secs(1),
            path: "missing".to_string(),
        };

        assert!(matches!(
            store.materialize(&key),
            Err(FramecastError::TopicNotFound(_))
        ));
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let store = TopicStore::new();
        let mut topic = Topic::new("t", Duration::from_secs(1));
        topic.messages.push(msg(1, r#"{"z": 1, "a": 2, "m": 3}"#));
        let key = topic.key();
        store.store(topic);

        let first = store.materialize(&key).unwrap();
        let second = store.materialize(&key).unwrap();

        assert_eq!(first, second);
        let names: Vec<&str> = first.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Time", "a", "m", "z"]);
    }

    #[test]
    fn test_set_extraction_paths_invalidates_materialization() {
        let store = TopicStore::new();
        let mut topic = Topic::new("t", Duration::from_secs(1));
        topic.messages.push(msg(1, r#"{"a": {"b": 1}, "c": 2}"#));
        let key = topic.key();
        store.store(topic);

        store.set_extraction_paths("t", vec![ExtractionPath::new("a.b", "temp")]);

        let frame = store.materialize(&key).unwrap();
        assert!(frame.column("temp").is_some());
        assert!(frame.column("c").is_none());
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let store = Arc::new(TopicStore::new());
        store.store(Topic::new("t", Duration::from_secs(1)));

        let producers = 8;
        let per_producer = 100;
        let mut handles = Vec::new();

        for p in 0..producers {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for i in 0..per_producer {
                    store.append_message("t", msg(1, &format!("{}.{}", p, i)));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let key = TopicKey {
            interval: Duration::from_secs(1),
            path: "t".to_string(),
        };
        let topic = store.load(&key).unwrap();
        assert_eq!(topic.messages.len(), producers * per_producer);

        // per-producer receipt order is preserved
        for p in 0..producers {
            let bodies: Vec<String> = topic
                .messages
                .iter()
                .map(|m| String::from_utf8(m.value.clone()).unwrap())
                .filter(|b| b.starts_with(&format!("{}.", p)))
                .collect();
            let expected: Vec<String> =
                (0..per_producer).map(|i| format!("{}.{}", p, i)).collect();
            assert_eq!(bodies, expected);
        }
    }
}
