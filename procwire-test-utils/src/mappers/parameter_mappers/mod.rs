// @generated by procwire-gen. Do not edit.

mod column_sample_parameter_mapper;
mod order_id_parameters_parameter_mapper;
mod replace_lines_parameters_parameter_mapper;

pub use column_sample_parameter_mapper::ColumnSampleParameterMapper;
pub use order_id_parameters_parameter_mapper::OrderIdParametersParameterMapper;
pub use replace_lines_parameters_parameter_mapper::ReplaceLinesParametersParameterMapper;
