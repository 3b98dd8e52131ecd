//! Assembles finalized frames from accumulated (row, key, value) triples
//!
//! The builder owns the Time axis plus a map of data columns, and pins the
//! output schema: Time always first, data columns alphabetical by name.

use crate::frame::infer::reconcile;
use crate::frame::types::{Column, ColumnType, Frame, FrameMeta, Notice, Scalar, Severity};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Accumulates typed columns for a fixed number of rows.
///
/// The row count is fixed up front (one row per input message) so every
/// column can be sized once; rows that never receive a value for a column
/// simply keep that cell absent.
pub struct FrameBuilder {
    name: String,
    row_count: usize,
    time: Column,
    columns: BTreeMap<String, Column>,
    rows_skipped: usize,
    notices: Vec<Notice>,
}

impl FrameBuilder {
    pub fn new(name: impl Into<String>, row_count: usize) -> Self {
        FrameBuilder {
            name: name.into(),
            row_count,
            time: Column::new("Time", ColumnType::Time, row_count),
            columns: BTreeMap::new(),
            rows_skipped: 0,
            notices: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn set_time(&mut self, row: usize, timestamp: DateTime<Utc>) {
        self.time.set_time(row, timestamp);
    }

    /// Route a value through type reconciliation into its column.
    pub fn set_value(&mut self, row: usize, key: &str, value: &Scalar) {
        reconcile(&mut self.columns, self.row_count, row, key, value);
    }

    /// Pre-register a column so it is part of the schema even when no row
    /// ends up supplying a value for it. An existing column is untouched.
    pub fn declare_column(&mut self, key: &str, column_type: ColumnType) {
        self.columns
            .entry(key.to_string())
            .or_insert_with(|| Column::new(key, column_type, self.row_count));
    }

    /// Record a row whose body could not be parsed.
    ///
    /// The row still occupies its slot in every column (all cells absent);
    /// only the skip counter in the frame metadata moves.
    pub fn skip_row(&mut self) {
        self.rows_skipped += 1;
    }

    pub fn push_notice(&mut self, severity: Severity, text: impl Into<String>) {
        self.notices.push(Notice {
            severity,
            text: text.into(),
        });
    }

    /// Finalize the frame: Time first, data columns in alphabetical order.
    pub fn finish(self) -> Frame {
        let mut columns = Vec::with_capacity(1 + self.columns.len());
        columns.push(self.time);
        // BTreeMap iteration is already sorted by key
        columns.extend(self.columns.into_values());

        Frame {
            name: self.name,
            columns,
            meta: FrameMeta {
                channel: None,
                rows_skipped: self.rows_skipped,
                notices: self.notices,
            },
        }
    }
}
