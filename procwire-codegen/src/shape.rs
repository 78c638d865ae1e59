//! Shape inference: how each field of a parameter or result record maps onto
//! the wire.

use crate::config::GeneratorConfig;
use crate::error::{GenerateError, GenerateResult};
use crate::scan::{SourceIndex, StructDef};
use syn::{GenericArgument, PathArguments, Type};

/// A field type with a direct `SqlValue` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    I16,
    I32,
    I64,
    F32,
    F64,
    Decimal,
    Char,
    Text,
    Bytes,
    Uuid,
    Date,
    Time,
    DateTime,
    DateTimeUtc,
    Json,
}

impl Scalar {
    /// Classify a type, without unwrapping `Option`.
    pub fn of(ty: &Type) -> Option<Scalar> {
        let path = type_path(ty)?;
        let last = path.segments.last()?;
        let scalar = match last.ident.to_string().as_str() {
            "bool" => Scalar::Bool,
            "i16" => Scalar::I16,
            "i32" => Scalar::I32,
            "i64" => Scalar::I64,
            "f32" => Scalar::F32,
            "f64" => Scalar::F64,
            "Decimal" => Scalar::Decimal,
            "char" => Scalar::Char,
            "String" => Scalar::Text,
            "Uuid" => Scalar::Uuid,
            "NaiveDate" => Scalar::Date,
            "NaiveTime" => Scalar::Time,
            "NaiveDateTime" => Scalar::DateTime,
            "JsonValue" => Scalar::Json,
            "Value" if path.segments.len() >= 2 => {
                let module = &path.segments[path.segments.len() - 2].ident;
                if module != "serde_json" {
                    return None;
                }
                Scalar::Json
            }
            "DateTime" => {
                let zone = generic_arg(ty, "DateTime")?;
                if simple_name(zone)? != "Utc" {
                    return None;
                }
                Scalar::DateTimeUtc
            }
            "Vec" => {
                let element = generic_arg(ty, "Vec")?;
                if simple_name(element)? != "u8" {
                    return None;
                }
                Scalar::Bytes
            }
            _ => return None,
        };
        Some(scalar)
    }

    /// The `SqlNullType` variant for columns of this type.
    pub fn null_type(self) -> &'static str {
        match self {
            Scalar::Bool => "Bool",
            Scalar::I16 => "I16",
            Scalar::I32 => "I32",
            Scalar::I64 => "I64",
            Scalar::F32 => "F32",
            Scalar::F64 => "F64",
            Scalar::Decimal => "Decimal",
            Scalar::Char | Scalar::Text => "Text",
            Scalar::Bytes => "Bytes",
            Scalar::Uuid => "Uuid",
            Scalar::Date => "Date",
            Scalar::Time => "Time",
            Scalar::DateTime => "DateTime",
            Scalar::DateTimeUtc => "DateTimeUtc",
            Scalar::Json => "Json",
        }
    }
}

// ============================================================================
// SHAPES
// ============================================================================

/// A scanned record that gets a generated mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    /// Simple type name; generated names derive from it.
    pub name: String,
    /// Path used in generated code, e.g. `crate::orders::OrderView`.
    pub path: String,
}

impl RecordRef {
    fn of(def: &StructDef, type_root: &str) -> Self {
        Self {
            name: def.name.clone(),
            path: def.qualified_name(type_root),
        }
    }
}

/// One field read from a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultField {
    /// Field identifier as written (may carry `r#`).
    pub access: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultShape {
    pub record: RecordRef,
    pub fields: Vec<ResultField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumnShape {
    pub access: String,
    pub column: String,
    pub scalar: Scalar,
}

/// Whether a tabular field holds one nested record or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterField {
    Scalar {
        access: String,
        name: String,
        scalar: Scalar,
    },
    Table {
        access: String,
        name: String,
        /// Table type name: the nested record's name in snake case.
        type_name: String,
        cardinality: Cardinality,
        optional: bool,
        columns: Vec<TableColumnShape>,
    },
    Skipped {
        access: String,
        type_name: String,
    },
}

impl ParameterField {
    /// True for fields that bind a parameter.
    pub fn is_bound(&self) -> bool {
        !matches!(self, ParameterField::Skipped { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterShape {
    pub record: RecordRef,
    pub fields: Vec<ParameterField>,
    /// Some descriptor declares `Parameters = Option<Record>`.
    pub optional: bool,
}

impl ParameterShape {
    pub fn bound_count(&self) -> usize {
        self.fields.iter().filter(|field| field.is_bound()).count()
    }

    pub fn has_tables(&self) -> bool {
        self.fields
            .iter()
            .any(|field| matches!(field, ParameterField::Table { .. }))
    }
}

// ============================================================================
// INFERENCE
// ============================================================================

/// Every public field of a result record must be a scalar, optionally wrapped
/// in `Option`.
pub fn result_shape(def: &StructDef, config: &GeneratorConfig) -> GenerateResult<ResultShape> {
    def.ensure_fields_reachable()?;
    let fields = def
        .fields
        .iter()
        .map(|field| {
            let (inner, _) = unwrap_option(&field.ty);
            match Scalar::of(inner) {
                Some(_) => Ok(ResultField {
                    access: field.ident.clone(),
                    column: field.column().to_string(),
                }),
                None => Err(GenerateError::UnmappedField {
                    type_name: def.name.clone(),
                    field: field.column().to_string(),
                    field_type: render_type(&field.ty),
                }),
            }
        })
        .collect::<GenerateResult<Vec<_>>>()?;

    Ok(ResultShape {
        record: RecordRef::of(def, &config.type_root),
        fields,
    })
}

/// Classify each public field of a parameter record.
pub fn parameter_shape(
    index: &SourceIndex,
    def: &StructDef,
    config: &GeneratorConfig,
) -> GenerateResult<ParameterShape> {
    def.ensure_fields_reachable()?;
    let mut fields = Vec::with_capacity(def.fields.len());
    for field in &def.fields {
        let access = field.ident.clone();
        let name = format!("{}{}", config.parameter_prefix, field.column());
        let (inner, optional) = unwrap_option(&field.ty);

        if let Some(scalar) = Scalar::of(inner) {
            fields.push(ParameterField::Scalar { access, name, scalar });
            continue;
        }

        let (element, cardinality) = match generic_arg(inner, "Vec") {
            Some(element) => (element, Cardinality::Many),
            None => (inner, Cardinality::One),
        };
        if let Some(type_name) = skipped_type_name(element, config) {
            fields.push(ParameterField::Skipped { access, type_name });
            continue;
        }

        let unmapped = || GenerateError::UnmappedField {
            type_name: def.name.clone(),
            field: field.column().to_string(),
            field_type: render_type(&field.ty),
        };
        let nested = match type_path(element) {
            Some(path) => index.resolve(path, &config.type_root)?,
            None => None,
        };
        let nested = nested.ok_or_else(unmapped)?;
        if !nested.has_named_fields || nested.is_generic {
            return Err(unmapped());
        }
        nested.ensure_fields_reachable()?;

        fields.push(ParameterField::Table {
            access,
            name,
            type_name: snake_case(&nested.name),
            cardinality,
            optional,
            columns: table_columns(index, def, field.column(), nested, config)?,
        });
    }

    Ok(ParameterShape {
        record: RecordRef::of(def, &config.type_root),
        fields,
        optional: false,
    })
}

fn table_columns(
    index: &SourceIndex,
    owner: &StructDef,
    owner_field: &str,
    nested: &StructDef,
    config: &GeneratorConfig,
) -> GenerateResult<Vec<TableColumnShape>> {
    let mut columns = Vec::with_capacity(nested.fields.len());
    for field in &nested.fields {
        let (inner, _) = unwrap_option(&field.ty);
        if let Some(scalar) = Scalar::of(inner) {
            columns.push(TableColumnShape {
                access: field.ident.clone(),
                column: field.column().to_string(),
                scalar,
            });
            continue;
        }

        let element = generic_arg(inner, "Vec").unwrap_or(inner);
        if skipped_type_name(element, config).is_some() {
            continue;
        }

        let is_record = match type_path(element) {
            Some(path) => index.resolve(path, &config.type_root)?.is_some(),
            None => false,
        };
        if is_record || generic_arg(inner, "Vec").is_some() {
            return Err(GenerateError::UnsupportedNesting {
                type_name: owner.name.clone(),
                field: format!("{}.{}", owner_field, field.column()),
                nested: render_type(&field.ty),
            });
        }
        return Err(GenerateError::UnmappedField {
            type_name: nested.name.clone(),
            field: field.column().to_string(),
            field_type: render_type(&field.ty),
        });
    }
    Ok(columns)
}

fn skipped_type_name(ty: &Type, config: &GeneratorConfig) -> Option<String> {
    let name = simple_name(ty)?;
    config
        .skip_suffixes
        .iter()
        .any(|suffix| name.ends_with(suffix.as_str()))
        .then_some(name)
}

// ============================================================================
// TYPE HELPERS
// ============================================================================

pub(crate) fn type_path(ty: &Type) -> Option<&syn::Path> {
    match ty {
        Type::Path(path) if path.qself.is_none() => Some(&path.path),
        Type::Paren(paren) => type_path(&paren.elem),
        Type::Group(group) => type_path(&group.elem),
        _ => None,
    }
}

/// Last path segment of a type, e.g. `OrderView` for `crate::orders::OrderView`.
pub(crate) fn simple_name(ty: &Type) -> Option<String> {
    type_path(ty)?
        .segments
        .last()
        .map(|segment| segment.ident.to_string())
}

/// The single type argument of `wrapper<T>`, matched on the last path segment.
pub(crate) fn generic_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let segment = type_path(ty)?.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    });
    match (types.next(), types.next()) {
        (Some(ty), None) => Some(ty),
        _ => None,
    }
}

/// Strip one level of `Option`, reporting whether it was there.
pub(crate) fn unwrap_option(ty: &Type) -> (&Type, bool) {
    match generic_arg(ty, "Option") {
        Some(inner) => (inner, true),
        None => (ty, false),
    }
}

/// Readable rendering of a type for diagnostics.
pub fn render_type(ty: &Type) -> String {
    match ty {
        Type::Path(path) => render_path(&path.path),
        Type::Reference(reference) => {
            let mutability = if reference.mutability.is_some() { "mut " } else { "" };
            format!("&{}{}", mutability, render_type(&reference.elem))
        }
        Type::Slice(slice) => format!("[{}]", render_type(&slice.elem)),
        Type::Array(array) => format!("[{}; _]", render_type(&array.elem)),
        Type::Tuple(tuple) => {
            let elems: Vec<String> = tuple.elems.iter().map(render_type).collect();
            if elems.len() == 1 {
                format!("({},)", elems[0])
            } else {
                format!("({})", elems.join(", "))
            }
        }
        Type::Paren(paren) => render_type(&paren.elem),
        Type::Group(group) => render_type(&group.elem),
        _ => "_".to_string(),
    }
}

pub fn render_path(path: &syn::Path) -> String {
    let mut out = String::new();
    if path.leading_colon.is_some() {
        out.push_str("::");
    }
    for (i, segment) in path.segments.iter().enumerate() {
        if i > 0 {
            out.push_str("::");
        }
        out.push_str(&segment.ident.to_string());
        if let PathArguments::AngleBracketed(args) = &segment.arguments {
            let args: Vec<String> = args
                .args
                .iter()
                .map(|arg| match arg {
                    GenericArgument::Type(ty) => render_type(ty),
                    GenericArgument::Lifetime(lifetime) => format!("'{}", lifetime.ident),
                    _ => "_".to_string(),
                })
                .collect();
            out.push('<');
            out.push_str(&args.join(", "));
            out.push('>');
        }
    }
    out
}

/// `OrderLineView` -> `order_line_view`, `HTTPRequest` -> `http_request`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let after_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let acronym_end = i > 0
                && chars[i - 1].is_uppercase()
                && chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            if (after_lower || acronym_end) && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
