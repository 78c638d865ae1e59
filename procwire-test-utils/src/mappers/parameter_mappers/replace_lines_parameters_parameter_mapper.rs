// @generated by procwire-gen. Do not edit.

use procwire_core::{MapResult, Parameter, ParameterMapper, SqlNullType, SqlValue, TableColumn, TableValue, ToSqlValue};

/// Parameter mapper for [`crate::fixtures::ReplaceLinesParameters`].
pub struct ReplaceLinesParametersParameterMapper;

impl ParameterMapper<crate::fixtures::ReplaceLinesParameters> for ReplaceLinesParametersParameterMapper {
    fn map(&self, value: &crate::fixtures::ReplaceLinesParameters) -> MapResult<Vec<Parameter>> {
        let mut parameters = Vec::with_capacity(2);
        parameters.push(Parameter::new("order_id", value.order_id.to_sql_value()));
        parameters.push(Parameter::new("lines", {
            let mut table = TableValue::with_capacity(
                "order_line",
                vec![
                    TableColumn::new("sku", SqlNullType::Text),
                    TableColumn::new("quantity", SqlNullType::I32),
                ],
                value.lines.len(),
            );
            for item in &value.lines {
                table.push_row(vec![item.sku.to_sql_value(), item.quantity.to_sql_value()])?;
            }
            SqlValue::Table(table)
        }));
        Ok(parameters)
    }
}
