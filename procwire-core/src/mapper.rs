//! Mapper traits implemented by generated code.
//!
//! A parameter mapper encodes one parameter record into an ordered list of
//! named [`Parameter`]s; a result mapper decodes one [`DataRow`] into a result
//! record. Both are registered once per type in [`MapperRegistries`] and
//! resolved by type at call time.

use crate::error::MapResult;
use crate::parameter::Parameter;
use crate::registry::MapperRegistries;
use crate::row::DataRow;

/// Encodes a parameter record of type `T`.
pub trait ParameterMapper<T>: Send + Sync {
    fn map(&self, value: &T) -> MapResult<Vec<Parameter>>;
}

/// Decodes a row into a result record of type `T`.
pub trait ResultMapper<T>: Send + Sync {
    fn map(&self, row: &DataRow) -> MapResult<T>;
}

/// Mapper for parameterless procedures. Binds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitParameterMapper;

impl ParameterMapper<()> for UnitParameterMapper {
    fn map(&self, _value: &()) -> MapResult<Vec<Parameter>> {
        Ok(Vec::new())
    }
}

/// Marker for record types that have a registered result mapper.
///
/// `Default` supplies the value returned when a result set has no rows.
pub trait ResultRecord: Default + Send + Sync + 'static {}

/// A result slot: how the rows of one result set become one value.
///
/// - a record `T` takes the first row, or `T::default()` when there are none
/// - `Option<T>` takes the first row, or `None`
/// - `Vec<T>` takes every row
pub trait FromRows: Sized + Send + 'static {
    fn from_rows(rows: &[DataRow], registries: &MapperRegistries) -> MapResult<Self>;
}

/// Decode the first row with `T`'s registered mapper, or `T::default()`.
///
/// The mapper is resolved even when `rows` is empty so a missing registration
/// is never masked by an empty result.
pub fn decode_first<T: ResultRecord>(
    rows: &[DataRow],
    registries: &MapperRegistries,
) -> MapResult<T> {
    let mapper = registries.results().resolve::<T>()?;
    match rows.first() {
        Some(row) => mapper.map(row),
        None => Ok(T::default()),
    }
}

impl<T: ResultRecord> FromRows for Option<T> {
    fn from_rows(rows: &[DataRow], registries: &MapperRegistries) -> MapResult<Self> {
        let mapper = registries.results().resolve::<T>()?;
        rows.first().map(|row| mapper.map(row)).transpose()
    }
}

impl<T: ResultRecord> FromRows for Vec<T> {
    fn from_rows(rows: &[DataRow], registries: &MapperRegistries) -> MapResult<Self> {
        let mapper = registries.results().resolve::<T>()?;
        rows.iter().map(|row| mapper.map(row)).collect()
    }
}

/// Implement [`ResultRecord`] and single-row [`FromRows`] for hand-written
/// result types. Generated result mappers emit the same impls inline.
#[macro_export]
macro_rules! result_record {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::ResultRecord for $ty {}

            impl $crate::FromRows for $ty {
                fn from_rows(
                    rows: &[$crate::DataRow],
                    registries: &$crate::MapperRegistries,
                ) -> $crate::MapResult<Self> {
                    $crate::decode_first::<$ty>(rows, registries)
                }
            }
        )+
    };
}
