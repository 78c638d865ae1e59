// @generated by procwire-gen. Do not edit.

use procwire_core::{MapResult, Parameter, ParameterMapper, ToSqlValue};

/// Parameter mapper for [`crate::fixtures::ColumnSample`].
pub struct ColumnSampleParameterMapper;

impl ParameterMapper<crate::fixtures::ColumnSample> for ColumnSampleParameterMapper {
    fn map(&self, value: &crate::fixtures::ColumnSample) -> MapResult<Vec<Parameter>> {
        let mut parameters = Vec::with_capacity(18);
        parameters.push(Parameter::new("flag", value.flag.to_sql_value()));
        parameters.push(Parameter::new("small", value.small.to_sql_value()));
        parameters.push(Parameter::new("regular", value.regular.to_sql_value()));
        parameters.push(Parameter::new("big", value.big.to_sql_value()));
        parameters.push(Parameter::new("single", value.single.to_sql_value()));
        parameters.push(Parameter::new("double", value.double.to_sql_value()));
        parameters.push(Parameter::new("amount", value.amount.to_sql_value()));
        parameters.push(Parameter::new("initial", value.initial.to_sql_value()));
        parameters.push(Parameter::new("label", value.label.to_sql_value()));
        parameters.push(Parameter::new("payload", value.payload.to_sql_value()));
        parameters.push(Parameter::new("id", value.id.to_sql_value()));
        parameters.push(Parameter::new("day", value.day.to_sql_value()));
        parameters.push(Parameter::new("clock", value.clock.to_sql_value()));
        parameters.push(Parameter::new("stamp", value.stamp.to_sql_value()));
        parameters.push(Parameter::new("instant", value.instant.to_sql_value()));
        parameters.push(Parameter::new("document", value.document.to_sql_value()));
        parameters.push(Parameter::new("note", value.note.to_sql_value()));
        parameters.push(Parameter::new("type", value.r#type.to_sql_value()));
        Ok(parameters)
    }
}
