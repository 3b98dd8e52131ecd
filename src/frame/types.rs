use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single decoded cell value.
///
/// Numbers are always 64-bit floats (there is no integer column type);
/// strings and booleans are kept distinct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Float64(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl Scalar {
    /// Convert a non-container JSON value into a scalar.
    ///
    /// Objects and arrays have no scalar form and return `None`;
    /// numbers that don't fit an f64 collapse to `Null`.
    pub fn from_json(value: &serde_json::Value) -> Option<Scalar> {
        match value {
            serde_json::Value::Null => Some(Scalar::Null),
            serde_json::Value::Bool(b) => Some(Scalar::Bool(*b)),
            serde_json::Value::Number(n) => {
                Some(n.as_f64().map(Scalar::Float64).unwrap_or(Scalar::Null))
            }
            serde_json::Value::String(s) => Some(Scalar::Str(s.clone())),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

/// The declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Time,
    Float64,
    String,
    Bool,
    /// Only null values have been seen for this column so far.
    Unknown,
}

/// Typed cell storage for one column.
///
/// Every variant holds one slot per frame row; an absent slot means the
/// row supplied no value for this column. `Unknown` columns never hold
/// values, so only their length is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cells {
    Time(Vec<Option<DateTime<Utc>>>),
    Float64(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
    Bool(Vec<Option<bool>>),
    Unknown(usize),
}

/// A named, typed column of optional values.
///
/// Invariant: every populated cell matches the declared type, and the
/// column's length always equals the row count of the owning frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub cells: Cells,
}

impl Column {
    /// Create a column of the given type with `len` absent cells.
    pub fn new(name: impl Into<String>, column_type: ColumnType, len: usize) -> Self {
        let cells = match column_type {
            ColumnType::Time => Cells::Time(vec![None; len]),
            ColumnType::Float64 => Cells::Float64(vec![None; len]),
            ColumnType::String => Cells::Str(vec![None; len]),
            ColumnType::Bool => Cells::Bool(vec![None; len]),
            ColumnType::Unknown => Cells::Unknown(len),
        };

        Column {
            name: name.into(),
            cells,
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self.cells {
            Cells::Time(_) => ColumnType::Time,
            Cells::Float64(_) => ColumnType::Float64,
            Cells::Str(_) => ColumnType::String,
            Cells::Bool(_) => ColumnType::Bool,
            Cells::Unknown(_) => ColumnType::Unknown,
        }
    }

    pub fn len(&self) -> usize {
        match &self.cells {
            Cells::Time(v) => v.len(),
            Cells::Float64(v) => v.len(),
            Cells::Str(v) => v.len(),
            Cells::Bool(v) => v.len(),
            Cells::Unknown(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write a scalar at `row`.
    ///
    /// Returns `false` when the value's concrete type does not match the
    /// column (the caller decides whether to promote). A `Null` value is
    /// never a conflict: the cell simply stays absent.
    pub fn set(&mut self, row: usize, value: &Scalar) -> bool {
        match (&mut self.cells, value) {
            (_, Scalar::Null) => true,
            (Cells::Float64(v), Scalar::Float64(x)) => {
                v[row] = Some(*x);
                true
            }
            (Cells::Str(v), Scalar::Str(s)) => {
                v[row] = Some(s.clone());
                true
            }
            (Cells::Bool(v), Scalar::Bool(b)) => {
                v[row] = Some(*b);
                true
            }
            _ => false,
        }
    }

    /// Write a timestamp at `row`. No-op unless this is a Time column.
    pub fn set_time(&mut self, row: usize, timestamp: DateTime<Utc>) {
        if let Cells::Time(v) = &mut self.cells {
            v[row] = Some(timestamp);
        }
    }

    /// Read the cell at `row` as a scalar (`Null` when absent).
    ///
    /// Time columns have no scalar form; use [`Column::time_value`].
    pub fn value(&self, row: usize) -> Option<Scalar> {
        match &self.cells {
            Cells::Time(_) => None,
            Cells::Float64(v) => Some(v[row].map(Scalar::Float64).unwrap_or(Scalar::Null)),
            Cells::Str(v) => Some(
                v[row]
                    .as_ref()
                    .map(|s| Scalar::Str(s.clone()))
                    .unwrap_or(Scalar::Null),
            ),
            Cells::Bool(v) => Some(v[row].map(Scalar::Bool).unwrap_or(Scalar::Null)),
            Cells::Unknown(_) => Some(Scalar::Null),
        }
    }

    pub fn time_value(&self, row: usize) -> Option<DateTime<Utc>> {
        match &self.cells {
            Cells::Time(v) => v[row],
            _ => None,
        }
    }
}

/// Severity of a frame-level notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A diagnostic attached to a frame for downstream display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

/// Frame metadata carried alongside the columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameMeta {
    /// Routing channel for streaming consumers (prefix + topic path).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Rows whose body could not be parsed and contributed no data cells.
    pub rows_skipped: usize,

    pub notices: Vec<Notice>,
}

/// A columnar table built from one topic's message history.
///
/// The first column is always Time; the remaining columns are sorted
/// alphabetically by name, so repeated materializations of the same data
/// produce an identical schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub name: String,
    pub columns: Vec<Column>,
    pub meta: FrameMeta,
}

impl Frame {
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn set_channel(&mut self, channel: impl Into<String>) {
        self.meta.channel = Some(channel.into());
    }
}
