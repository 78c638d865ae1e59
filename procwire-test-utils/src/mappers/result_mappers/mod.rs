// @generated by procwire-gen. Do not edit.

mod column_sample_result_mapper;
mod line_count_view_result_mapper;
mod order_header_view_result_mapper;

pub use column_sample_result_mapper::ColumnSampleResultMapper;
pub use line_count_view_result_mapper::LineCountViewResultMapper;
pub use order_header_view_result_mapper::OrderHeaderViewResultMapper;
