//! Stored procedure descriptors and the result-set arity family.
//!
//! A descriptor is a unit type implementing [`StoredProcedure`]. It is never
//! instantiated for data: it only carries the procedure's name, its parameter
//! record type and its result slots, which the code generator reads from
//! source and the execution engine reads through its generic parameters.
//!
//! ```ignore
//! pub struct GetOrderSummary;
//!
//! impl StoredProcedure for GetOrderSummary {
//!     const NAME: &'static str = "get_order_summary";
//!     type Parameters = OrderIdParameters;
//!     type Results = (OrderView, Vec<OrderLineView>);
//! }
//! ```

use crate::error::{MapError, MapResult};
use crate::mapper::FromRows;
use crate::registry::MapperRegistries;
use crate::row::DataRow;
use std::fmt;

/// How a procedure is invoked on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InvocationStyle {
    /// `SELECT * FROM name(...)`: functions, including ones returning `SETOF refcursor`.
    #[default]
    Function,
    /// `CALL name(...)`: procedures.
    Procedure,
}

/// Optionally schema-qualified procedure name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcedureName {
    pub schema: Option<String>,
    pub name: String,
}

impl ProcedureName {
    pub fn new(schema: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.map(str::to_string),
            name: name.into(),
        }
    }
}

impl fmt::Display for ProcedureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Descriptor of a stored procedure: one parameter type, zero to sixteen
/// result slots.
pub trait StoredProcedure: Send + Sync + 'static {
    const NAME: &'static str;
    const SCHEMA: Option<&'static str> = None;
    const STYLE: InvocationStyle = InvocationStyle::Function;

    /// Parameter record; `()` for procedures without parameters.
    type Parameters: Send + Sync + 'static;

    /// `()` for commands, `(A,)` for one result set, `(A, B, ...)` for cursors.
    type Results: ResultSet;

    fn procedure_name() -> ProcedureName {
        ProcedureName::new(Self::SCHEMA, Self::NAME)
    }
}

// ============================================================================
// RESULT SETS
// ============================================================================

/// Execution mode implied by a descriptor's result slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultMode {
    /// No result slots; the call reports affected rows.
    Command,
    /// One result slot decoded from the call's own rows.
    Single,
    /// N result slots (2..=16), each fetched from a named server-side cursor.
    Multi(usize),
}

/// Raw material handed to [`ResultSet::decode`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResultSets {
    Affected(u64),
    Rows(Vec<Vec<DataRow>>),
}

impl ResultSets {
    fn into_row_sets(self, expected: usize) -> MapResult<Vec<Vec<DataRow>>> {
        match self {
            ResultSets::Rows(sets) if sets.len() == expected => Ok(sets),
            ResultSets::Rows(sets) => Err(MapError::ResultSetCount {
                expected,
                actual: sets.len(),
            }),
            ResultSets::Affected(_) => Err(MapError::ResultSetCount {
                expected,
                actual: 0,
            }),
        }
    }
}

/// The result slots of a descriptor, decoded into their output value.
pub trait ResultSet: Send + 'static {
    type Output: Send + 'static;

    const MODE: ResultMode;

    fn decode(sets: ResultSets, registries: &MapperRegistries) -> MapResult<Self::Output>;
}

impl ResultSet for () {
    type Output = u64;

    const MODE: ResultMode = ResultMode::Command;

    fn decode(sets: ResultSets, _registries: &MapperRegistries) -> MapResult<u64> {
        match sets {
            ResultSets::Affected(n) => Ok(n),
            ResultSets::Rows(sets) => Ok(sets.iter().map(|s| s.len() as u64).sum()),
        }
    }
}

impl<A: FromRows> ResultSet for (A,) {
    type Output = A;

    const MODE: ResultMode = ResultMode::Single;

    fn decode(sets: ResultSets, registries: &MapperRegistries) -> MapResult<A> {
        let sets = sets.into_row_sets(1)?;
        let rows = sets.first().map(Vec::as_slice).unwrap_or_default();
        A::from_rows(rows, registries)
    }
}

macro_rules! impl_cursor_result_set {
    ($count:literal; $($slot:ident),+) => {
        impl<$($slot: FromRows),+> ResultSet for ($($slot,)+) {
            type Output = Self;

            const MODE: ResultMode = ResultMode::Multi($count);

            fn decode(sets: ResultSets, registries: &MapperRegistries) -> MapResult<Self> {
                let mut sets = sets.into_row_sets($count)?.into_iter();
                Ok(($(
                    <$slot as FromRows>::from_rows(
                        &sets.next().unwrap_or_default(),
                        registries,
                    )?,
                )+))
            }
        }
    };
}

impl_cursor_result_set!(2; A, B);
impl_cursor_result_set!(3; A, B, C);
impl_cursor_result_set!(4; A, B, C, D);
impl_cursor_result_set!(5; A, B, C, D, E);
impl_cursor_result_set!(6; A, B, C, D, E, F);
impl_cursor_result_set!(7; A, B, C, D, E, F, G);
impl_cursor_result_set!(8; A, B, C, D, E, F, G, H);
impl_cursor_result_set!(9; A, B, C, D, E, F, G, H, I);
impl_cursor_result_set!(10; A, B, C, D, E, F, G, H, I, J);
impl_cursor_result_set!(11; A, B, C, D, E, F, G, H, I, J, K);
impl_cursor_result_set!(12; A, B, C, D, E, F, G, H, I, J, K, L);
impl_cursor_result_set!(13; A, B, C, D, E, F, G, H, I, J, K, L, M);
impl_cursor_result_set!(14; A, B, C, D, E, F, G, H, I, J, K, L, M, N);
impl_cursor_result_set!(15; A, B, C, D, E, F, G, H, I, J, K, L, M, N, O);
impl_cursor_result_set!(16; A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes_follow_arity() {
        assert_eq!(<() as ResultSet>::MODE, ResultMode::Command);
        assert_eq!(<(Vec<Counted>,) as ResultSet>::MODE, ResultMode::Single);
        assert_eq!(<(Counted, Counted) as ResultSet>::MODE, ResultMode::Multi(2));
        assert_eq!(
            <(
                Counted, Counted, Counted, Counted, Counted, Counted, Counted, Counted,
                Counted, Counted, Counted, Counted, Counted, Counted, Counted, Counted,
            ) as ResultSet>::MODE,
            ResultMode::Multi(16)
        );
    }

    #[test]
    fn test_procedure_name_display() {
        assert_eq!(ProcedureName::new(Some("sales"), "get_order").to_string(), "sales.get_order");
        assert_eq!(ProcedureName::new(None, "get_order").to_string(), "get_order");
    }

    #[test]
    fn test_command_decodes_affected_rows() {
        let registries = MapperRegistries::new();
        assert_eq!(<()>::decode(ResultSets::Affected(4), &registries).unwrap(), 4);
    }

    #[test]
    fn test_wrong_set_count_is_rejected() {
        let registries = MapperRegistries::new();
        let err = <(Counted, Counted)>::decode(ResultSets::Rows(vec![vec![]]), &registries)
            .err()
            .unwrap();
        assert_eq!(err, MapError::ResultSetCount { expected: 2, actual: 1 });
    }

    #[derive(Debug, Default, PartialEq)]
    struct Counted {
        count: i32,
    }

    crate::result_record!(Counted);
}
