//! Message-to-frame conversion pipeline
//!
//! This module turns one topic's ordered message history into a typed
//! columnar frame: payload bytes are classified (scalar vs. JSON), JSON
//! bodies are flattened to dotted/indexed keys, column types are inferred
//! and reconciled row by row, and the finished frame comes out with Time
//! pinned first and the remaining columns in alphabetical order.

pub mod builder;
pub mod flatten;
pub mod framer;
pub mod infer;
pub mod types;

pub use builder::FrameBuilder;
pub use flatten::{flatten, FlattenedRow};
pub use framer::to_frame;
pub use infer::{infer_column_type, promote_column, reconcile};
pub use types::{Cells, Column, ColumnType, Frame, FrameMeta, Notice, Scalar, Severity};
