//! Rust source emission for inferred shapes.
//!
//! Every emitter is a pure function of its shape and the configuration, so
//! repeated runs over unchanged sources produce byte-identical files.

use crate::shape::{
    snake_case, Cardinality, ParameterField, ParameterShape, RecordRef, ResultShape,
    TableColumnShape,
};

/// First line of every generated file.
pub const GENERATED_HEADER: &str = "// @generated by procwire-gen. Do not edit.\n";

pub fn parameter_mapper_name(record: &RecordRef) -> String {
    format!("{}ParameterMapper", record.name)
}

pub fn result_mapper_name(record: &RecordRef) -> String {
    format!("{}ResultMapper", record.name)
}

pub fn parameter_mapper_module(record: &RecordRef) -> String {
    format!("{}_parameter_mapper", snake_case(&record.name))
}

pub fn result_mapper_module(record: &RecordRef) -> String {
    format!("{}_result_mapper", snake_case(&record.name))
}

fn indent_str(level: usize) -> String {
    "    ".repeat(level)
}

fn use_line(core_crate: &str, names: &[&str]) -> String {
    let mut names = names.to_vec();
    names.sort_unstable();
    format!("use {}::{{{}}};\n", core_crate, names.join(", "))
}

// ============================================================================
// PARAMETER MAPPERS
// ============================================================================

pub fn parameter_mapper(shape: &ParameterShape, core_crate: &str) -> String {
    let mapper = parameter_mapper_name(&shape.record);
    let record = &shape.record.path;
    let bound = shape.bound_count();

    let mut imports = vec!["MapResult", "Parameter", "ParameterMapper"];
    let has_columns = shape.fields.iter().any(|field| {
        matches!(field, ParameterField::Table { columns, .. } if !columns.is_empty())
    });
    let has_scalars = shape
        .fields
        .iter()
        .any(|field| matches!(field, ParameterField::Scalar { .. }));
    let has_optional_tables = shape
        .fields
        .iter()
        .any(|field| matches!(field, ParameterField::Table { optional: true, .. }));
    // `None` of an optional record binds a typed NULL per parameter.
    let binds_nulls = shape.optional && bound > 0;
    if has_scalars || has_columns {
        imports.push("ToSqlValue");
    }
    if has_columns || has_optional_tables || binds_nulls {
        imports.push("SqlNullType");
    }
    if shape.has_tables() || binds_nulls {
        imports.push("SqlValue");
    }
    if shape.has_tables() {
        imports.push("TableValue");
    }
    if has_columns {
        imports.push("TableColumn");
    }

    let mut out = String::from(GENERATED_HEADER);
    out.push('\n');
    out.push_str(&use_line(core_crate, &imports));
    out.push('\n');
    out.push_str(&format!("/// Parameter mapper for [`{}`].\n", record));
    out.push_str(&format!("pub struct {};\n\n", mapper));
    out.push_str(&format!("impl ParameterMapper<{}> for {} {{\n", record, mapper));

    if bound == 0 {
        out.push_str(&format!(
            "    fn map(&self, _value: &{}) -> MapResult<Vec<Parameter>> {{\n",
            record
        ));
        out.push_str("        Ok(Vec::new())\n");
    } else {
        out.push_str(&format!(
            "    fn map(&self, value: &{}) -> MapResult<Vec<Parameter>> {{\n",
            record
        ));
        out.push_str(&format!(
            "        let mut parameters = Vec::with_capacity({});\n",
            bound
        ));
        for field in &shape.fields {
            match field {
                ParameterField::Scalar { access, name, .. } => {
                    out.push_str(&format!(
                        "        parameters.push(Parameter::new(\"{}\", value.{}.to_sql_value()));\n",
                        name, access
                    ));
                }
                ParameterField::Table {
                    access,
                    name,
                    type_name,
                    cardinality,
                    optional,
                    columns,
                } => {
                    out.push_str(&format!("        parameters.push(Parameter::new(\"{}\", ", name));
                    if *optional {
                        out.push_str(&format!("match &value.{} {{\n", access));
                        out.push_str("            Some(nested) => {\n");
                        out.push_str(&table_block(type_name, columns, *cardinality, "nested", 4));
                        out.push_str("            }\n");
                        out.push_str("            None => SqlValue::Null(SqlNullType::Table),\n");
                        out.push_str("        }));\n");
                    } else {
                        out.push_str("{\n");
                        let source = format!("&value.{}", access);
                        out.push_str(&table_block(type_name, columns, *cardinality, &source, 3));
                        out.push_str("        }));\n");
                    }
                }
                ParameterField::Skipped { .. } => {}
            }
        }
        out.push_str("        Ok(parameters)\n");
    }

    out.push_str("    }\n");
    out.push_str("}\n");
    if shape.optional {
        out.push('\n');
        out.push_str(&optional_parameter_impl(shape, &mapper));
    }
    out
}

/// `ParameterMapper<Option<T>>`: `Some` delegates, `None` binds a typed NULL
/// for every parameter.
fn optional_parameter_impl(shape: &ParameterShape, mapper: &str) -> String {
    let record = &shape.record.path;
    let mut out = String::new();
    out.push_str(&format!(
        "impl ParameterMapper<Option<{}>> for {} {{\n",
        record, mapper
    ));
    out.push_str(&format!(
        "    fn map(&self, value: &Option<{}>) -> MapResult<Vec<Parameter>> {{\n",
        record
    ));
    out.push_str("        match value {\n");
    out.push_str(&format!(
        "            Some(value) => ParameterMapper::<{}>::map(self, value),\n",
        record
    ));
    if shape.bound_count() == 0 {
        out.push_str("            None => Ok(Vec::new()),\n");
    } else {
        out.push_str("            None => Ok(vec![\n");
        for field in &shape.fields {
            let (name, null_type) = match field {
                ParameterField::Scalar { name, scalar, .. } => (name, scalar.null_type()),
                ParameterField::Table { name, .. } => (name, "Table"),
                ParameterField::Skipped { .. } => continue,
            };
            out.push_str(&format!(
                "                Parameter::new(\"{}\", SqlValue::Null(SqlNullType::{})),\n",
                name, null_type
            ));
        }
        out.push_str("            ]),\n");
    }
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n");
    out
}

/// Statements building a `TableValue` from `source` and yielding it as a
/// `SqlValue`. `source` is a reference expression to one record or a `Vec`.
fn table_block(
    type_name: &str,
    columns: &[TableColumnShape],
    cardinality: Cardinality,
    source: &str,
    indent: usize,
) -> String {
    let ind = indent_str(indent);
    let inner = indent_str(indent + 1);
    let mut out = String::new();

    let capacity = match cardinality {
        Cardinality::Many => format!("{}.len()", source.trim_start_matches('&')),
        Cardinality::One => "1".to_string(),
    };
    out.push_str(&format!("{}let mut table = TableValue::with_capacity(\n", ind));
    out.push_str(&format!("{}\"{}\",\n", inner, type_name));
    if columns.is_empty() {
        out.push_str(&format!("{}Vec::new(),\n", inner));
    } else {
        out.push_str(&format!("{}vec![\n", inner));
        for column in columns {
            out.push_str(&format!(
                "{}    TableColumn::new(\"{}\", SqlNullType::{}),\n",
                inner,
                column.column,
                column.scalar.null_type()
            ));
        }
        out.push_str(&format!("{}],\n", inner));
    }
    out.push_str(&format!("{}{},\n", inner, capacity));
    out.push_str(&format!("{});\n", ind));

    let row = row_expr(columns);
    let item = if columns.is_empty() { "_item" } else { "item" };
    match cardinality {
        Cardinality::Many => {
            out.push_str(&format!("{}for {} in {} {{\n", ind, item, source));
            out.push_str(&format!("{}table.push_row({})?;\n", inner, row));
            out.push_str(&format!("{}}}\n", ind));
        }
        Cardinality::One => {
            out.push_str(&format!("{}let {} = {};\n", ind, item, source));
            out.push_str(&format!("{}table.push_row({})?;\n", ind, row));
        }
    }
    out.push_str(&format!("{}SqlValue::Table(table)\n", ind));
    out
}

fn row_expr(columns: &[TableColumnShape]) -> String {
    if columns.is_empty() {
        return "Vec::new()".to_string();
    }
    let values: Vec<String> = columns
        .iter()
        .map(|column| format!("item.{}.to_sql_value()", column.access))
        .collect();
    format!("vec![{}]", values.join(", "))
}

// ============================================================================
// RESULT MAPPERS
// ============================================================================

pub fn result_mapper(shape: &ResultShape, core_crate: &str) -> String {
    let mapper = result_mapper_name(&shape.record);
    let record = &shape.record.path;

    let mut out = String::from(GENERATED_HEADER);
    out.push('\n');
    out.push_str(&use_line(
        core_crate,
        &["DataRow", "FromRows", "MapResult", "MapperRegistries", "ResultMapper", "ResultRecord"],
    ));
    out.push('\n');
    out.push_str(&format!("/// Result mapper for [`{}`].\n", record));
    out.push_str(&format!("pub struct {};\n\n", mapper));
    out.push_str(&format!("impl ResultMapper<{}> for {} {{\n", record, mapper));

    if shape.fields.is_empty() {
        out.push_str(&format!(
            "    fn map(&self, _row: &DataRow) -> MapResult<{}> {{\n",
            record
        ));
        out.push_str(&format!("        Ok(<{}>::default())\n", record));
    } else {
        out.push_str(&format!(
            "    fn map(&self, row: &DataRow) -> MapResult<{}> {{\n",
            record
        ));
        out.push_str(&format!("        let mut record = <{}>::default();\n", record));
        for field in &shape.fields {
            out.push_str(&format!("        if row.is_present(\"{}\") {{\n", field.column));
            out.push_str(&format!(
                "            record.{} = row.get(\"{}\")?;\n",
                field.access, field.column
            ));
            out.push_str("        }\n");
        }
        out.push_str("        Ok(record)\n");
    }
    out.push_str("    }\n");
    out.push_str("}\n\n");

    out.push_str(&format!("impl ResultRecord for {} {{}}\n\n", record));
    out.push_str(&format!("impl FromRows for {} {{\n", record));
    out.push_str(
        "    fn from_rows(rows: &[DataRow], registries: &MapperRegistries) -> MapResult<Self> {\n",
    );
    out.push_str(&format!("        {}::decode_first(rows, registries)\n", core_crate));
    out.push_str("    }\n");
    out.push_str("}\n");
    out
}

// ============================================================================
// MODULES AND REGISTERER
// ============================================================================

/// `mod.rs` of a mapper directory: private modules, public re-exports.
pub fn mapper_module(entries: &[(String, String)]) -> String {
    let mut out = String::from(GENERATED_HEADER);
    if entries.is_empty() {
        return out;
    }
    out.push('\n');
    for (module, _) in entries {
        out.push_str(&format!("mod {};\n", module));
    }
    out.push('\n');
    for (module, mapper) in entries {
        out.push_str(&format!("pub use {}::{};\n", module, mapper));
    }
    out
}

pub fn root_module() -> String {
    let mut out = String::from(GENERATED_HEADER);
    out.push('\n');
    out.push_str("pub mod parameter_mappers;\n");
    out.push_str("pub mod registerer;\n");
    out.push_str("pub mod result_mappers;\n\n");
    out.push_str("pub use registerer::{register_global_mappers, register_mappers};\n");
    out
}

pub fn registerer(
    parameters: &[ParameterShape],
    results: &[ResultShape],
    core_crate: &str,
) -> String {
    let mut out = String::from(GENERATED_HEADER);
    out.push('\n');
    out.push_str(&format!("use {}::MapperRegistries;\n\n", core_crate));

    out.push_str("/// Register every generated mapper with `registries`.\n");
    out.push_str("///\n");
    out.push_str("/// Registration is idempotent: mappers already present are kept.\n");
    out.push_str("pub fn register_mappers(registries: &MapperRegistries) {\n");
    if parameters.is_empty() && results.is_empty() {
        out.push_str("    let _ = registries;\n");
    }
    for shape in parameters {
        let mapper = parameter_mapper_name(&shape.record);
        out.push_str("    registries\n");
        out.push_str("        .parameters()\n");
        out.push_str(&format!(
            "        .register::<{}, _>(super::parameter_mappers::{});\n",
            shape.record.path, mapper
        ));
        if shape.optional {
            out.push_str("    registries\n");
            out.push_str("        .parameters()\n");
            out.push_str(&format!(
                "        .register::<Option<{}>, _>(super::parameter_mappers::{});\n",
                shape.record.path, mapper
            ));
        }
    }
    for shape in results {
        out.push_str("    registries\n");
        out.push_str("        .results()\n");
        out.push_str(&format!(
            "        .register::<{}, _>(super::result_mappers::{});\n",
            shape.record.path,
            result_mapper_name(&shape.record)
        ));
    }
    out.push_str("}\n\n");

    out.push_str("/// Register every generated mapper with the process-wide registries.\n");
    out.push_str("pub fn register_global_mappers() {\n");
    out.push_str("    register_mappers(&MapperRegistries::global());\n");
    out.push_str("}\n");
    out
}
