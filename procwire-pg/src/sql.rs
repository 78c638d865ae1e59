//! Call text rendering.

use procwire_core::{InvocationStyle, Parameter, ProcedureName};
use procwire_engine::quote_ident;
use std::fmt::Write;

/// `"schema"."name"`, or `"name"` when unqualified.
pub fn qualified_name(name: &ProcedureName) -> String {
    match &name.schema {
        Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(&name.name)),
        None => quote_ident(&name.name),
    }
}

/// Render the statement that invokes a stored procedure with named arguments.
///
/// Functions are selected from so set-returning functions (including
/// `SETOF refcursor`) yield their rows; procedures are `CALL`ed.
pub fn render_call(name: &ProcedureName, style: InvocationStyle, parameters: &[Parameter]) -> String {
    let mut sql = String::new();
    match style {
        InvocationStyle::Function => sql.push_str("SELECT * FROM "),
        InvocationStyle::Procedure => sql.push_str("CALL "),
    }
    sql.push_str(&qualified_name(name));
    sql.push('(');
    for (i, parameter) in parameters.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        // Writing to a String cannot fail.
        let _ = write!(sql, "{} => ${}", quote_ident(&parameter.name), i + 1);
    }
    sql.push(')');
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use procwire_core::SqlValue;

    fn params(names: &[&str]) -> Vec<Parameter> {
        names
            .iter()
            .map(|name| Parameter::new(*name, SqlValue::I32(0)))
            .collect()
    }

    #[test]
    fn test_function_call_with_named_arguments() {
        let name = ProcedureName::new(Some("sales"), "get_order_summary");
        assert_eq!(
            render_call(&name, InvocationStyle::Function, &params(&["id", "include_lines"])),
            "SELECT * FROM \"sales\".\"get_order_summary\"(\"id\" => $1, \"include_lines\" => $2)"
        );
    }

    #[test]
    fn test_procedure_call_without_arguments() {
        let name = ProcedureName::new(None, "refresh_totals");
        assert_eq!(
            render_call(&name, InvocationStyle::Procedure, &[]),
            "CALL \"refresh_totals\"()"
        );
    }

    #[test]
    fn test_identifiers_are_quoted() {
        let name = ProcedureName::new(Some("odd\"schema"), "Get Order");
        assert_eq!(qualified_name(&name), "\"odd\"\"schema\".\"Get Order\"");
    }
}
