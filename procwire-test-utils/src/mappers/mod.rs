// @generated by procwire-gen. Do not edit.

pub mod parameter_mappers;
pub mod registerer;
pub mod result_mappers;

pub use registerer::{register_global_mappers, register_mappers};
