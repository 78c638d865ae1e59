// @generated by procwire-gen. Do not edit.

use procwire_core::{DataRow, FromRows, MapResult, MapperRegistries, ResultMapper, ResultRecord};

/// Result mapper for [`crate::fixtures::LineCountView`].
pub struct LineCountViewResultMapper;

impl ResultMapper<crate::fixtures::LineCountView> for LineCountViewResultMapper {
    fn map(&self, row: &DataRow) -> MapResult<crate::fixtures::LineCountView> {
        let mut record = <crate::fixtures::LineCountView>::default();
        if row.is_present("count") {
            record.count = row.get("count")?;
        }
        Ok(record)
    }
}

impl ResultRecord for crate::fixtures::LineCountView {}

impl FromRows for crate::fixtures::LineCountView {
    fn from_rows(rows: &[DataRow], registries: &MapperRegistries) -> MapResult<Self> {
        procwire_core::decode_first(rows, registries)
    }
}
