//! Named parameters bound to a procedure call.

use crate::value::SqlValue;

/// A named value bound to a call. Order of a parameter list is preserved
/// through to the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: SqlValue,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: SqlValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// True when this parameter carries a tabular value.
    pub fn is_table(&self) -> bool {
        matches!(self.value, SqlValue::Table(_))
    }
}
