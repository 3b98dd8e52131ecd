//! Row source adapter - turn a topic's message history into a frame
//!
//! A batch is classified once, from its first message: a payload starting
//! with `{` makes the whole batch JSON, anything else makes it scalar.
//! There is no per-row re-classification.
//!
//! Error policy (applied consistently, see the module tests):
//! - JSON batch: a row whose body fails to parse keeps its Time cell and its
//!   slot in every column, contributes no data cells, and bumps
//!   `meta.rows_skipped`. A failure on the very first row additionally
//!   attaches an Error notice, since that row decided the batch shape.
//! - Scalar batch: a payload that does not parse as f64 leaves both the Time
//!   and Value cells absent for that row, silently.

use crate::frame::builder::FrameBuilder;
use crate::frame::flatten::flatten;
use crate::frame::types::{ColumnType, Frame, Scalar, Severity};
use crate::topic::types::{ExtractionPath, Message};
use serde_json::Value;

/// Name of the scalar batch's single data column.
const VALUE_COLUMN: &str = "Value";

/// Materialize one topic's ordered messages into a columnar frame.
///
/// An empty batch yields a valid zero-row frame with only a Time column.
pub fn to_frame(name: &str, messages: &[Message], paths: &[ExtractionPath]) -> Frame {
    match messages.first() {
        Some(first) if first.value.starts_with(b"{") => {
            json_messages_to_frame(name, messages, paths)
        }
        _ => scalar_messages_to_frame(name, messages),
    }
}

fn json_messages_to_frame(name: &str, messages: &[Message], paths: &[ExtractionPath]) -> Frame {
    let mut builder = FrameBuilder::new(name, messages.len());

    for (row, message) in messages.iter().enumerate() {
        builder.set_time(row, message.timestamp);

        let body: Value = match serde_json::from_slice(&message.value) {
            Ok(body) => body,
            Err(err) => {
                builder.skip_row();
                if row == 0 {
                    builder.push_notice(
                        Severity::Error,
                        format!("invalid JSON in first message: {}", err),
                    );
                }
                continue;
            }
        };

        let flat = flatten(&body);
        if paths.is_empty() {
            for (key, value) in &flat {
                builder.set_value(row, key, value);
            }
        } else {
            for path in paths {
                if let Some(value) = flat.get(&path.path) {
                    builder.set_value(row, path.column_name(), value);
                }
            }
        }
    }

    builder.finish()
}

fn scalar_messages_to_frame(name: &str, messages: &[Message]) -> Frame {
    let mut builder = FrameBuilder::new(name, messages.len());

    // The scalar shape is always {Time, Value}, even when every payload
    // fails to parse; an empty batch stays schema-less (Time only).
    if !messages.is_empty() {
        builder.declare_column(VALUE_COLUMN, ColumnType::Float64);
    }

    for (row, message) in messages.iter().enumerate() {
        let parsed = std::str::from_utf8(&message.value)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok());

        // Time and Value are set together or not at all
        if let Some(value) = parsed {
            builder.set_time(row, message.timestamp);
            builder.set_value(row, VALUE_COLUMN, &Scalar::Float64(value));
        }
    }

    builder.finish()
}
