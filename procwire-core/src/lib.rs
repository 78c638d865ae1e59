//! procwire Core - Wire Values, Mappers and Registries
//!
//! Shared vocabulary between the mapper code generator, the generated mapper
//! code, and the execution engine:
//!
//! ```text
//! parameter record ──ParameterMapper──▶ Vec<Parameter> (SqlValue / TableValue)
//! DataRow ──────────ResultMapper──────▶ result record
//! ```
//!
//! Mappers are resolved by type through [`MapperRegistries`], which the
//! generated registerer fills once at process start.

pub mod error;
pub mod mapper;
pub mod parameter;
pub mod procedure;
pub mod registry;
pub mod row;
pub mod table;
pub mod value;

pub use error::{MapError, MapResult, RegistryKind};
pub use mapper::{
    decode_first, FromRows, ParameterMapper, ResultMapper, ResultRecord, UnitParameterMapper,
};
pub use parameter::Parameter;
pub use procedure::{
    InvocationStyle, ProcedureName, ResultMode, ResultSet, ResultSets, StoredProcedure,
};
pub use registry::{MapperRegistries, ParameterMapperRegistry, ResultMapperRegistry};
pub use row::DataRow;
pub use table::{TableColumn, TableValue};
pub use value::{FromSqlValue, SqlNullType, SqlValue, ToSqlValue};

/// Maximum number of result slots a descriptor may declare.
pub const MAX_RESULT_SETS: usize = 16;
