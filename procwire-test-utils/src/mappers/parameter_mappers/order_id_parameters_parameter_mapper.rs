// @generated by procwire-gen. Do not edit.

use procwire_core::{MapResult, Parameter, ParameterMapper, SqlNullType, SqlValue, ToSqlValue};

/// Parameter mapper for [`crate::fixtures::OrderIdParameters`].
pub struct OrderIdParametersParameterMapper;

impl ParameterMapper<crate::fixtures::OrderIdParameters> for OrderIdParametersParameterMapper {
    fn map(&self, value: &crate::fixtures::OrderIdParameters) -> MapResult<Vec<Parameter>> {
        let mut parameters = Vec::with_capacity(1);
        parameters.push(Parameter::new("id", value.id.to_sql_value()));
        Ok(parameters)
    }
}

impl ParameterMapper<Option<crate::fixtures::OrderIdParameters>> for OrderIdParametersParameterMapper {
    fn map(&self, value: &Option<crate::fixtures::OrderIdParameters>) -> MapResult<Vec<Parameter>> {
        match value {
            Some(value) => ParameterMapper::<crate::fixtures::OrderIdParameters>::map(self, value),
            None => Ok(vec![
                Parameter::new("id", SqlValue::Null(SqlNullType::I32)),
            ]),
        }
    }
}
