// @generated by procwire-gen. Do not edit.

use procwire_core::{DataRow, FromRows, MapResult, MapperRegistries, ResultMapper, ResultRecord};

/// Result mapper for [`crate::fixtures::ColumnSample`].
pub struct ColumnSampleResultMapper;

impl ResultMapper<crate::fixtures::ColumnSample> for ColumnSampleResultMapper {
    fn map(&self, row: &DataRow) -> MapResult<crate::fixtures::ColumnSample> {
        let mut record = <crate::fixtures::ColumnSample>::default();
        if row.is_present("flag") {
            record.flag = row.get("flag")?;
        }
        if row.is_present("small") {
            record.small = row.get("small")?;
        }
        if row.is_present("regular") {
            record.regular = row.get("regular")?;
        }
        if row.is_present("big") {
            record.big = row.get("big")?;
        }
        if row.is_present("single") {
            record.single = row.get("single")?;
        }
        if row.is_present("double") {
            record.double = row.get("double")?;
        }
        if row.is_present("amount") {
            record.amount = row.get("amount")?;
        }
        if row.is_present("initial") {
            record.initial = row.get("initial")?;
        }
        if row.is_present("label") {
            record.label = row.get("label")?;
        }
        if row.is_present("payload") {
            record.payload = row.get("payload")?;
        }
        if row.is_present("id") {
            record.id = row.get("id")?;
        }
        if row.is_present("day") {
            record.day = row.get("day")?;
        }
        if row.is_present("clock") {
            record.clock = row.get("clock")?;
        }
        if row.is_present("stamp") {
            record.stamp = row.get("stamp")?;
        }
        if row.is_present("instant") {
            record.instant = row.get("instant")?;
        }
        if row.is_present("document") {
            record.document = row.get("document")?;
        }
        if row.is_present("note") {
            record.note = row.get("note")?;
        }
        if row.is_present("type") {
            record.r#type = row.get("type")?;
        }
        Ok(record)
    }
}

impl ResultRecord for crate::fixtures::ColumnSample {}

impl FromRows for crate::fixtures::ColumnSample {
    fn from_rows(rows: &[DataRow], registries: &MapperRegistries) -> MapResult<Self> {
        procwire_core::decode_first(rows, registries)
    }
}
