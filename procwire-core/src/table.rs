//! Tabular parameter values.
//!
//! A `TableValue` is what a generated parameter mapper builds for a field that
//! holds a nested record (exactly one row) or a collection of records (one row
//! per element). Columns follow the nested type's field order.

use crate::error::{MapError, MapResult};
use crate::value::{SqlNullType, SqlValue, ToSqlValue};
use serde_json::{Map, Value as JsonValue};

/// One column of a tabular parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub name: String,
    pub null_type: SqlNullType,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, null_type: SqlNullType) -> Self {
        Self {
            name: name.into(),
            null_type,
        }
    }

    /// Column whose type hint is taken from `T`.
    pub fn of<T: ToSqlValue>(name: impl Into<String>) -> Self {
        Self::new(name, T::NULL_TYPE)
    }
}

/// Columnar structure bound as a single named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct TableValue {
    type_name: String,
    columns: Vec<TableColumn>,
    rows: Vec<Vec<SqlValue>>,
}

impl TableValue {
    pub fn new(type_name: impl Into<String>, columns: Vec<TableColumn>) -> Self {
        Self {
            type_name: type_name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_capacity(
        type_name: impl Into<String>,
        columns: Vec<TableColumn>,
        rows: usize,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            columns,
            rows: Vec::with_capacity(rows),
        }
    }

    /// Append a row; its width must match the column count.
    pub fn push_row(&mut self, row: Vec<SqlValue>) -> MapResult<()> {
        if row.len() != self.columns.len() {
            return Err(MapError::RowWidth {
                target: self.type_name.clone(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Render as a JSON array with one object per row, keyed by column name.
    pub fn to_json(&self) -> JsonValue {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut object = Map::with_capacity(self.columns.len());
                for (column, value) in self.columns.iter().zip(row) {
                    object.insert(column.name.clone(), value.to_json());
                }
                JsonValue::Object(object)
            })
            .collect();
        JsonValue::Array(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_columns() -> Vec<TableColumn> {
        vec![TableColumn::of::<String>("sku"), TableColumn::of::<i32>("quantity")]
    }

    #[test]
    fn test_push_row_checks_width() {
        let mut table = TableValue::new("order_line", line_columns());
        let err = table.push_row(vec![SqlValue::Text("a".into())]).unwrap_err();
        assert_eq!(
            err,
            MapError::RowWidth {
                target: "order_line".to_string(),
                expected: 2,
                actual: 1,
            }
        );
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_empty_table_renders_empty_array() {
        let table = TableValue::new("order_line", line_columns());
        assert_eq!(table.to_json(), JsonValue::Array(vec![]));
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_rows_render_as_objects() {
        let mut table = TableValue::new("order_line", line_columns());
        table
            .push_row(vec![SqlValue::Text("A-1".into()), SqlValue::I32(3)])
            .unwrap();
        let json = table.to_json();
        assert_eq!(json[0]["sku"], "A-1");
        assert_eq!(json[0]["quantity"], 3);
    }
}
