// @generated by procwire-gen. Do not edit.

use procwire_core::MapperRegistries;

/// Register every generated mapper with `registries`.
///
/// Registration is idempotent: mappers already present are kept.
pub fn register_mappers(registries: &MapperRegistries) {
    registries
        .parameters()
        .register::<crate::fixtures::ColumnSample, _>(super::parameter_mappers::ColumnSampleParameterMapper);
    registries
        .parameters()
        .register::<crate::fixtures::OrderIdParameters, _>(super::parameter_mappers::OrderIdParametersParameterMapper);
    registries
        .parameters()
        .register::<Option<crate::fixtures::OrderIdParameters>, _>(super::parameter_mappers::OrderIdParametersParameterMapper);
    registries
        .parameters()
        .register::<crate::fixtures::ReplaceLinesParameters, _>(super::parameter_mappers::ReplaceLinesParametersParameterMapper);
    registries
        .results()
        .register::<crate::fixtures::ColumnSample, _>(super::result_mappers::ColumnSampleResultMapper);
    registries
        .results()
        .register::<crate::fixtures::LineCountView, _>(super::result_mappers::LineCountViewResultMapper);
    registries
        .results()
        .register::<crate::fixtures::OrderHeaderView, _>(super::result_mappers::OrderHeaderViewResultMapper);
}

/// Register every generated mapper with the process-wide registries.
pub fn register_global_mappers() {
    register_mappers(&MapperRegistries::global());
}
