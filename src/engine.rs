//! Boundary surface for the broker and request adapters
//!
//! The engine wraps the topic store with the three external touch points:
//! `on_message` for the broker's delivery callback, `query_topic` for the
//! request path, and a [`FrameSink`] for the streaming path. It also keeps
//! the last frame sent per topic path, so a stream client attaching late
//! receives the latest data instead of nothing.

use crate::error::Result;
use crate::frame::types::Frame;
use crate::topic::{ExtractionPath, Message, Topic, TopicKey, TopicStore};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Streaming outbound path. Delivery failures are logged by the engine and
/// never retried.
pub trait FrameSink: Send + Sync {
    fn send_frame(&self, frame: &Frame) -> anyhow::Result<()>;
}

/// Converts delivered messages into frames and routes them to queries and
/// stream subscribers.
pub struct Engine {
    store: TopicStore,
    channel_prefix: String,
    cache: DashMap<String, Arc<Frame>>,
    sink: Option<Arc<dyn FrameSink>>,
}

impl Engine {
    /// `channel_prefix` is prepended to topic paths to form the routing
    /// channel stamped into frame metadata (e.g. `"ds/abc123/"`).
    pub fn new(channel_prefix: impl Into<String>) -> Self {
        Engine {
            store: TopicStore::new(),
            channel_prefix: channel_prefix.into(),
            cache: DashMap::new(),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn FrameSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn store(&self) -> &TopicStore {
        &self.store
    }

    fn channel(&self, path: &str) -> String {
        format!("{}{}", self.channel_prefix, path)
    }

    /// Register a topic ahead of its first message.
    pub fn subscribe(
        &self,
        path: &str,
        interval: Duration,
        extraction_paths: Vec<ExtractionPath>,
    ) {
        log::info!("subscribing to topic {}", path);
        let mut topic = Topic::new(path, interval);
        topic.extraction_paths = extraction_paths;
        self.store.store(topic);
    }

    /// Drop a topic and its cached frame.
    pub fn unsubscribe(&self, path: &str, interval: Duration) {
        log::info!("unsubscribing from topic {}", path);
        let key = TopicKey {
            interval,
            path: path.to_string(),
        };
        self.store.delete(&key);
        if self.store.keys_matching(path).is_empty() {
            self.cache.remove(path);
        }
    }

    /// Broker delivery callback: append, rematerialize, push downstream.
    ///
    /// All work is in-memory transformation, bounded by the topic's buffered
    /// history; nothing here blocks on I/O. A path with no registered topic
    /// gets one created on the spot.
    pub fn on_message(&self, path: &str, timestamp: DateTime<Utc>, payload: Vec<u8>) {
        if self.store.keys_matching(path).is_empty() {
            self.store.ensure(path, Duration::ZERO);
        }
        self.store.append_message(path, Message::new(timestamp, payload));

        for key in self.store.keys_matching(path) {
            let frame = match self.store.materialize(&key) {
                Ok(mut frame) => {
                    frame.set_channel(self.channel(path));
                    Arc::new(frame)
                }
                // the topic was unsubscribed between append and rebuild
                Err(err) => {
                    log::debug!("skipping materialization for {}: {}", key, err);
                    continue;
                }
            };

            self.cache.insert(path.to_string(), Arc::clone(&frame));

            if let Some(sink) = &self.sink {
                if let Err(err) = sink.send_frame(&frame) {
                    log::error!("unable to send frame for {}: {}", path, err);
                }
            }
        }
    }

    /// Request path: materialize the topic's current history.
    ///
    /// A topic queried before any message arrives is created empty. When the
    /// exact `(interval, path)` bucket is unknown but a frame was cached for
    /// the path, the cached frame is returned instead of an empty one.
    pub fn query_topic(
        &self,
        path: &str,
        interval: Duration,
        extraction_paths: Option<Vec<ExtractionPath>>,
    ) -> Result<Frame> {
        let key = TopicKey {
            interval,
            path: path.to_string(),
        };

        if self.store.load(&key).is_none() {
            if let Some(cached) = self.last_frame(path) {
                return Ok((*cached).clone());
            }
            // ensure, not store: a message may have just created this
            // bucket, and replacing it would drop the append
            self.store.ensure(path, interval);
        }

        if let Some(paths) = extraction_paths {
            self.store.set_extraction_paths(path, paths);
        }

        let mut frame = self.store.materialize(&key)?;
        frame.set_channel(self.channel(path));
        self.cache
            .insert(path.to_string(), Arc::new(frame.clone()));
        Ok(frame)
    }

    /// Last frame materialized for `path`, for late stream joiners.
    pub fn last_frame(&self, path: &str) -> Option<Arc<Frame>> {
        self.cache.get(path).map(|entry| Arc::clone(entry.value()))
    }
}
