//! procwire Codegen - Build-Time Mapper Generator
//!
//! Scans a crate's sources for `impl StoredProcedure for X` descriptors and
//! emits, for every record they reference:
//!
//! - a `<Type>ParameterMapper` for the `Parameters` record
//! - a `<Type>ResultMapper` plus `ResultRecord`/`FromRows` impls for each
//!   result slot's record
//! - a registerer with `register_mappers` and `register_global_mappers`
//!
//! ```text
//! <output_dir>/
//!   mod.rs
//!   registerer.rs
//!   parameter_mappers/{mod.rs, <snake>_parameter_mapper.rs, ...}
//!   result_mappers/{mod.rs, <snake>_result_mapper.rs, ...}
//! ```
//!
//! Output lives in the crate that defines the records and is checked in;
//! `procwire-gen --check` fails when it is out of date. Result records must
//! implement `Default`.

pub mod config;
pub mod emit;
pub mod error;
pub mod generator;
pub mod scan;
pub mod shape;

pub use config::GeneratorConfig;
pub use error::{ConfigError, GenerateError, GenerateResult};
pub use generator::{
    Drift, GeneratedOutput, GeneratedUnit, GenerationPlan, Generator, WriteSummary,
};
pub use scan::SourceIndex;
pub use shape::{Cardinality, ParameterField, ParameterShape, ResultShape, Scalar};
