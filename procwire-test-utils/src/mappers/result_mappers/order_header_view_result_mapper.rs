// @generated by procwire-gen. Do not edit.

use procwire_core::{DataRow, FromRows, MapResult, MapperRegistries, ResultMapper, ResultRecord};

/// Result mapper for [`crate::fixtures::OrderHeaderView`].
pub struct OrderHeaderViewResultMapper;

impl ResultMapper<crate::fixtures::OrderHeaderView> for OrderHeaderViewResultMapper {
    fn map(&self, row: &DataRow) -> MapResult<crate::fixtures::OrderHeaderView> {
        let mut record = <crate::fixtures::OrderHeaderView>::default();
        if row.is_present("name") {
            record.name = row.get("name")?;
        }
        Ok(record)
    }
}

impl ResultRecord for crate::fixtures::OrderHeaderView {}

impl FromRows for crate::fixtures::OrderHeaderView {
    fn from_rows(rows: &[DataRow], registries: &MapperRegistries) -> MapResult<Self> {
        procwire_core::decode_first(rows, registries)
    }
}
