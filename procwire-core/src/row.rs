//! Row-like cursor handed to result mappers.

use crate::error::{MapError, MapResult};
use crate::value::{FromSqlValue, SqlValue};
use std::sync::Arc;

/// One decoded row: shared column names plus the row's values.
///
/// Column lookup tries an exact match first, then an ASCII case-insensitive
/// one, so `OrderId` still finds a folded `orderid` column.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl DataRow {
    /// Build a row over shared column names. The value count must match.
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> MapResult<Self> {
        if columns.len() != values.len() {
            return Err(MapError::RowWidth {
                target: "row".to_string(),
                expected: columns.len(),
                actual: values.len(),
            });
        }
        Ok(Self { columns, values })
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, SqlValue)>,
        K: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<SqlValue>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn value_at(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(column)))
    }

    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.index_of(column).and_then(|i| self.values.get(i))
    }

    /// True when the column exists and holds a non-NULL value.
    ///
    /// Generated result mappers guard every field with this so partial
    /// projections leave missing fields at their default.
    pub fn is_present(&self, column: &str) -> bool {
        self.value(column).is_some_and(|v| !v.is_null())
    }

    /// Decode a column into `T`.
    pub fn get<T: FromSqlValue>(&self, column: &str) -> MapResult<T> {
        let value = self.value(column).ok_or_else(|| MapError::MissingColumn {
            column: column.to_string(),
        })?;
        T::from_sql_value(value, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlNullType;

    #[test]
    fn test_new_rejects_width_mismatch() {
        let columns: Arc<[String]> = vec!["a".to_string(), "b".to_string()].into();
        assert!(DataRow::new(columns, vec![SqlValue::I32(1)]).is_err());
    }

    #[test]
    fn test_lookup_falls_back_to_case_insensitive() {
        let row = DataRow::from_pairs([("orderid", SqlValue::I64(9))]);
        assert_eq!(row.get::<i64>("OrderId").unwrap(), 9);
    }

    #[test]
    fn test_exact_match_wins_over_folded_match() {
        let row = DataRow::from_pairs([
            ("Name", SqlValue::Text("upper".into())),
            ("name", SqlValue::Text("lower".into())),
        ]);
        assert_eq!(row.get::<String>("name").unwrap(), "lower");
    }

    #[test]
    fn test_is_present_false_for_null_and_missing() {
        let row = DataRow::from_pairs([("name", SqlValue::Null(SqlNullType::Text))]);
        assert!(!row.is_present("name"));
        assert!(!row.is_present("other"));
    }

    #[test]
    fn test_missing_column_error() {
        let row = DataRow::from_pairs([("name", SqlValue::Text("x".into()))]);
        let err = row.get::<String>("count").unwrap_err();
        assert_eq!(
            err,
            MapError::MissingColumn {
                column: "count".to_string()
            }
        );
    }
}
