//! # Framecast - pub/sub messages to columnar frames
//!
//! A library for converting an unordered stream of heterogeneous broker
//! messages (bare numeric/text payloads or nested JSON) into typed,
//! columnar frames suitable for visualization and streaming.
//!
//! ## Modules
//!
//! - **frame**: flattening, type inference, and frame assembly
//! - **topic**: topics, message buffers, and the concurrent state store
//! - **engine**: the boundary surface for broker and request adapters
//!
//! ## Quick Start
//!
//! ### Flattening one message body
//!
//! ```rust
//! use framecast::frame::{flatten, Scalar};
//! use serde_json::json;
//!
//! let row = flatten(&json!({"a": {"b": 1}, "c": [10, 20]}));
//!
//! assert_eq!(row.get("a.b"), Some(&Scalar::Float64(1.0)));
//! assert_eq!(row.get("c[0]"), Some(&Scalar::Float64(10.0)));
//! assert_eq!(row.get("c[1]"), Some(&Scalar::Float64(20.0)));
//! ```
//!
//! ### Running the full pipeline
//!
//! ```rust
//! use framecast::Engine;
//! use std::time::Duration;
//!
//! # fn main() -> anyhow::Result<()> {
//! let engine = Engine::new("ds/demo/");
//! engine.subscribe("sensors/temp", Duration::from_secs(1), vec![]);
//! engine.on_message("sensors/temp", chrono::Utc::now(), br#"{"celsius": 21.5}"#.to_vec());
//!
//! let frame = engine.query_topic("sensors/temp", Duration::from_secs(1), None)?;
//! assert_eq!(frame.row_count(), 1);
//! assert!(frame.column("celsius").is_some());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use std::io::BufRead;

pub mod engine;
pub mod error;
pub mod frame;
pub mod topic;

// Re-export commonly used types for convenience
pub use engine::{Engine, FrameSink};
pub use error::FramecastError;
pub use frame::{Column, ColumnType, Frame, FrameMeta, Notice, Scalar, Severity};
pub use topic::{ExtractionPath, Message, Topic, TopicKey, TopicStore};

/// Convenience entry point: read one payload per line and materialize a
/// frame for them, stamped with the current time as each row's timestamp.
pub fn frame_from_reader<R: BufRead>(reader: R, topic: &str) -> Result<Frame> {
    let mut messages = Vec::new();

    for line in reader.lines() {
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        messages.push(Message::new(Utc::now(), line.into_bytes()));
    }

    Ok(frame::to_frame(topic, &messages, &[]))
}
