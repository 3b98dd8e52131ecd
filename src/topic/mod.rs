//! Topics and their concurrent state store
//!
//! A topic is a subscribed message-stream endpoint: its path, aggregation
//! interval, extraction-path configuration, and buffered message history.

pub mod store;
pub mod types;

pub use store::TopicStore;
pub use types::{ExtractionPath, Message, Topic, TopicKey};
