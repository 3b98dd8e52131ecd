//! Per-column type inference and reconciliation
//!
//! Column types are decided row by row as values arrive. The first sighting
//! of a key fixes the column's type from that value; a later value of a
//! different concrete type triggers [`promote_column`], which is lossy on
//! purpose: the column is rebuilt under the new type and every cell written
//! before the promotion becomes absent.

use crate::frame::types::{Column, ColumnType, Scalar};
use std::collections::BTreeMap;

/// Infer a column type from the first value seen for a key.
pub fn infer_column_type(value: &Scalar) -> ColumnType {
    match value {
        Scalar::Float64(_) => ColumnType::Float64,
        Scalar::Str(_) => ColumnType::String,
        Scalar::Bool(_) => ColumnType::Bool,
        Scalar::Null => ColumnType::Unknown,
    }
}

/// Replace a column with a freshly-typed one sized to the full row count.
///
/// This is the lossy half of type reconciliation: no prior values are
/// carried over. Callers write the conflicting value afterwards.
pub fn promote_column(column: &mut Column, new_type: ColumnType, row_count: usize) {
    log::debug!(
        "promoting column {} from {:?} to {:?}, dropping prior cells",
        column.name,
        column.column_type(),
        new_type
    );
    *column = Column::new(column.name.clone(), new_type, row_count);
}

/// Decide the column for `key` and write `value` at `row`.
///
/// Creates the column on first sighting. A `Null` value never creates a
/// conflict and never promotes; a differing concrete type promotes the
/// column and then writes.
pub fn reconcile(
    columns: &mut BTreeMap<String, Column>,
    row_count: usize,
    row: usize,
    key: &str,
    value: &Scalar,
) {
    let column = columns
        .entry(key.to_string())
        .or_insert_with(|| Column::new(key, infer_column_type(value), row_count));

    if !column.set(row, value) {
        promote_column(column, infer_column_type(value), row_count);
        column.set(row, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sighting_fixes_type() {
        let mut columns = BTreeMap::new();

        reconcile(&mut columns, 2, 0, "x", &Scalar::Float64(5.0));

        let col = columns.get("x").unwrap();
        assert_eq!(col.column_type(), ColumnType::Float64);
        assert_eq!(col.len(), 2);
        assert_eq!(col.value(0), Some(Scalar::Float64(5.0)));
    }

    #[test]
    fn test_promotion_drops_prior_cells() {
        let mut columns = BTreeMap::new();

        // row 0 sends a number, row 1 sends a string for the same key
        reconcile(&mut columns, 2, 0, "x", &Scalar::Float64(5.0));
        reconcile(&mut columns, 2, 1, "x", &Scalar::Str("five".to_string()));

        let col = columns.get("x").unwrap();
        assert_eq!(col.column_type(), ColumnType::String);
        assert_eq!(col.value(0), Some(Scalar::Null)); // data loss is the contract
        assert_eq!(col.value(1), Some(Scalar::Str("five".to_string())));
    }

    #[test]
    fn test_null_never_promotes() {
        let mut columns = BTreeMap::new();

        reconcile(&mut columns, 3, 0, "x", &Scalar::Float64(1.0));
        reconcile(&mut columns, 3, 1, "x", &Scalar::Null);
        reconcile(&mut columns, 3, 2, "x", &Scalar::Float64(3.0));

        let col = columns.get("x").unwrap();
        assert_eq!(col.column_type(), ColumnType::Float64);
        assert_eq!(col.value(0), Some(Scalar::Float64(1.0)));
        assert_eq!(col.value(1), Some(Scalar::Null));
        assert_eq!(col.value(2), Some(Scalar::Float64(3.0)));
    }

    #[test]
    fn test_unknown_column_promotes_on_first_concrete_value() {
        let mut columns = BTreeMap::new();

        reconcile(&mut columns, 2, 0, "x", &Scalar::Null);
        assert_eq!(columns.get("x").unwrap().column_type(), ColumnType::Unknown);

        reconcile(&mut columns, 2, 1, "x", &Scalar::Bool(true));

        let col = columns.get("x").unwrap();
        assert_eq!(col.column_type(), ColumnType::Bool);
        assert_eq!(col.value(1), Some(Scalar::Bool(true)));
    }
}
