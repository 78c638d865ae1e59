//! Source scanning.
//!
//! Walks a crate's source tree, parses each file with `syn`, and indexes:
//! - struct definitions, by simple name, with their module path
//! - concrete `impl StoredProcedure for X` blocks with their `Parameters`
//!   and `Results` associated types

use crate::error::{GenerateError, GenerateResult};
use crate::shape::render_path;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use syn::{Fields, ImplItem, Item, Type, Visibility};
use walkdir::WalkDir;

/// A named field visible to generated code.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Identifier as written, including any `r#` prefix.
    pub ident: String,
    pub ty: Type,
}

impl FieldDef {
    /// Column or parameter name: the identifier without `r#`.
    pub fn column(&self) -> &str {
        self.ident.strip_prefix("r#").unwrap_or(&self.ident)
    }
}

/// A struct found in the scanned sources.
#[derive(Debug, Clone)]
pub struct StructDef {
    pub name: String,
    pub module_path: Vec<String>,
    /// Fields declared `pub` or `pub(crate)`.
    pub fields: Vec<FieldDef>,
    /// Fields declared `pub(super)` or `pub(in ..)`, with their visibility as
    /// written. Generated modules may not be able to reach them.
    pub restricted_fields: Vec<(String, String)>,
    pub has_named_fields: bool,
    pub is_generic: bool,
    pub file: PathBuf,
}

impl StructDef {
    /// Path of the struct under `type_root`, e.g. `crate::orders::OrderView`.
    pub fn qualified_name(&self, type_root: &str) -> String {
        let mut path = String::from(type_root);
        for segment in &self.module_path {
            path.push_str("::");
            path.push_str(segment);
        }
        path.push_str("::");
        path.push_str(&self.name);
        path
    }

    /// Fail if a field of this record is visible only to part of the crate.
    pub fn ensure_fields_reachable(&self) -> GenerateResult<()> {
        match self.restricted_fields.first() {
            Some((field, visibility)) => Err(GenerateError::InaccessibleField {
                type_name: self.name.clone(),
                field: field.clone(),
                visibility: visibility.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// A concrete stored procedure descriptor.
#[derive(Debug, Clone)]
pub struct ProcedureDef {
    pub descriptor: String,
    pub module_path: Vec<String>,
    pub parameters: Type,
    pub results: Type,
    pub file: PathBuf,
}

/// Index of everything the generator needs from the sources.
#[derive(Debug, Default)]
pub struct SourceIndex {
    structs: BTreeMap<String, Vec<StructDef>>,
    procedures: Vec<ProcedureDef>,
    files: usize,
}

impl SourceIndex {
    /// Scan every `.rs` file below `root`, skipping `exclude` (the output
    /// directory, when it lives inside the source tree).
    pub fn scan(root: &Path, exclude: Option<&Path>) -> GenerateResult<Self> {
        let root = root
            .canonicalize()
            .map_err(|e| GenerateError::io(root, e))?;
        let exclude = exclude.and_then(|path| path.canonicalize().ok());

        let mut index = SourceIndex::default();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| exclude.as_deref() != Some(entry.path()));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                GenerateError::io(path, e.into())
            })?;
            if !entry.file_type().is_file()
                || entry.path().extension().and_then(|ext| ext.to_str()) != Some("rs")
            {
                continue;
            }
            let contents = std::fs::read_to_string(entry.path())
                .map_err(|e| GenerateError::io(entry.path(), e))?;
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            index.add_file(relative, &contents)?;
        }

        tracing::debug!(
            root = %root.display(),
            files = index.files,
            structs = index.structs.values().map(Vec::len).sum::<usize>(),
            procedures = index.procedures.len(),
            "Scanned sources"
        );
        Ok(index)
    }

    /// Parse one file. `relative` is its path below the source root and
    /// determines the module path.
    pub fn add_file(&mut self, relative: &Path, contents: &str) -> GenerateResult<()> {
        let file = syn::parse_file(contents).map_err(|source| GenerateError::Parse {
            path: relative.to_path_buf(),
            line: source.span().start().line,
            source,
        })?;
        let module_path = module_path_of(relative);
        self.files += 1;
        self.visit_items(&file.items, &module_path, relative);
        Ok(())
    }

    fn visit_items(&mut self, items: &[Item], module_path: &[String], file: &Path) {
        for item in items {
            match item {
                Item::Struct(item) => {
                    let def = struct_def(item, module_path, file);
                    self.structs.entry(def.name.clone()).or_default().push(def);
                }
                Item::Impl(item) => {
                    if let Some(def) = procedure_def(item, module_path, file) {
                        self.procedures.push(def);
                    }
                }
                Item::Mod(item) => {
                    if is_test_only(&item.attrs) {
                        continue;
                    }
                    if let Some((_, nested)) = &item.content {
                        let mut path = module_path.to_vec();
                        path.push(unraw(&item.ident.to_string()));
                        self.visit_items(nested, &path, file);
                    }
                }
                _ => {}
            }
        }
    }

    pub fn procedures(&self) -> &[ProcedureDef] {
        &self.procedures
    }

    pub fn file_count(&self) -> usize {
        self.files
    }

    /// Every struct with this simple name.
    pub fn structs_named(&self, name: &str) -> &[StructDef] {
        self.structs.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Resolve a type path to a scanned struct.
    ///
    /// Qualifying segments (other than `crate`, `self` and `super`) narrow the
    /// candidates by module path suffix. `Ok(None)` means no struct matched.
    pub fn resolve(
        &self,
        path: &syn::Path,
        type_root: &str,
    ) -> GenerateResult<Option<&StructDef>> {
        let Some(last) = path.segments.last() else {
            return Ok(None);
        };
        let qualifier: Vec<String> = path
            .segments
            .iter()
            .take(path.segments.len() - 1)
            .map(|segment| unraw(&segment.ident.to_string()))
            .filter(|segment| !matches!(segment.as_str(), "crate" | "self" | "super"))
            .collect();

        let candidates: Vec<&StructDef> = self
            .structs_named(&unraw(&last.ident.to_string()))
            .iter()
            .filter(|def| def.module_path.ends_with(&qualifier))
            .collect();

        match candidates.as_slice() {
            [] => Ok(None),
            [def] => Ok(Some(def)),
            many => Err(GenerateError::AmbiguousType {
                name: render_path(path),
                candidates: many.iter().map(|def| def.qualified_name(type_root)).collect(),
            }),
        }
    }
}

/// How far a field's visibility reaches.
enum Reach {
    Crate,
    Partial(String),
    Private,
}

fn reach(vis: &Visibility) -> Reach {
    match vis {
        Visibility::Public(_) => Reach::Crate,
        Visibility::Restricted(restricted) if restricted.in_token.is_none() => {
            if restricted.path.is_ident("crate") {
                Reach::Crate
            } else if restricted.path.is_ident("self") {
                Reach::Private
            } else {
                Reach::Partial(format!("pub({})", render_path(&restricted.path)))
            }
        }
        Visibility::Restricted(restricted) => {
            Reach::Partial(format!("pub(in {})", render_path(&restricted.path)))
        }
        Visibility::Inherited => Reach::Private,
    }
}

fn struct_def(item: &syn::ItemStruct, module_path: &[String], file: &Path) -> StructDef {
    let mut fields = Vec::new();
    let mut restricted_fields = Vec::new();
    if let Fields::Named(named) = &item.fields {
        for field in &named.named {
            let Some(ident) = &field.ident else {
                continue;
            };
            match reach(&field.vis) {
                Reach::Crate => fields.push(FieldDef {
                    ident: ident.to_string(),
                    ty: field.ty.clone(),
                }),
                Reach::Partial(visibility) => {
                    restricted_fields.push((unraw(&ident.to_string()), visibility))
                }
                Reach::Private => {}
            }
        }
    }
    StructDef {
        name: unraw(&item.ident.to_string()),
        module_path: module_path.to_vec(),
        fields,
        restricted_fields,
        has_named_fields: !matches!(item.fields, Fields::Unnamed(_)),
        is_generic: !item.generics.params.is_empty(),
        file: file.to_path_buf(),
    }
}

fn procedure_def(item: &syn::ItemImpl, module_path: &[String], file: &Path) -> Option<ProcedureDef> {
    let (negative, trait_path, _) = item.trait_.as_ref()?;
    if negative.is_some() || trait_path.segments.last()?.ident != "StoredProcedure" {
        return None;
    }
    let Type::Path(self_ty) = item.self_ty.as_ref() else {
        return None;
    };
    let descriptor = render_path(&self_ty.path);
    if !item.generics.params.is_empty() {
        tracing::debug!(descriptor = %descriptor, "Skipping generic stored procedure impl");
        return None;
    }

    let mut parameters = None;
    let mut results = None;
    for impl_item in &item.items {
        if let ImplItem::Type(assoc) = impl_item {
            if assoc.ident == "Parameters" {
                parameters = Some(assoc.ty.clone());
            } else if assoc.ident == "Results" {
                results = Some(assoc.ty.clone());
            }
        }
    }

    Some(ProcedureDef {
        descriptor,
        module_path: module_path.to_vec(),
        // A missing associated type fails to compile anyway; treat it as `()`.
        parameters: parameters.unwrap_or_else(unit_type),
        results: results.unwrap_or_else(unit_type),
        file: file.to_path_buf(),
    })
}

fn unit_type() -> Type {
    Type::Tuple(syn::TypeTuple {
        paren_token: Default::default(),
        elems: Default::default(),
    })
}

fn is_test_only(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .meta
                .require_list()
                .is_ok_and(|list| list.tokens.to_string() == "test")
    })
}

fn unraw(ident: &str) -> String {
    ident.strip_prefix("r#").unwrap_or(ident).to_string()
}

/// Module path implied by a file's location below the source root.
///
/// `lib.rs`/`main.rs` at the root and any `mod.rs` name their directory;
/// every other file adds its stem.
pub fn module_path_of(relative: &Path) -> Vec<String> {
    let mut segments: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|component| component.as_os_str().to_str())
        .map(str::to_string)
        .collect();
    let stem = relative
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    let names_directory = stem == "mod" || (segments.is_empty() && (stem == "lib" || stem == "main"));
    if !names_directory {
        segments.push(stem.to_string());
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(files: &[(&str, &str)]) -> SourceIndex {
        let mut index = SourceIndex::default();
        for (path, contents) in files {
            index.add_file(Path::new(path), contents).unwrap();
        }
        index
    }

    #[test]
    fn test_module_paths() {
        assert!(module_path_of(Path::new("lib.rs")).is_empty());
        assert_eq!(module_path_of(Path::new("orders.rs")), vec!["orders"]);
        assert_eq!(module_path_of(Path::new("orders/mod.rs")), vec!["orders"]);
        assert_eq!(module_path_of(Path::new("orders/views.rs")), vec!["orders", "views"]);
        assert_eq!(module_path_of(Path::new("orders/lib.rs")), vec!["orders", "lib"]);
    }

    #[test]
    fn test_indexes_structs_and_inline_modules() {
        let index = index(&[(
            "orders.rs",
            r#"
            pub struct OrderView { pub id: i32, secret: String }
            pub mod lines { pub struct LineView { pub sku: String } }
            #[cfg(test)]
            mod tests { pub struct Hidden; }
            "#,
        )]);

        let order = &index.structs_named("OrderView")[0];
        assert_eq!(order.module_path, vec!["orders"]);
        assert_eq!(order.fields.len(), 1);
        assert_eq!(index.structs_named("LineView")[0].module_path, vec!["orders", "lines"]);
        assert!(index.structs_named("Hidden").is_empty());
    }

    #[test]
    fn test_field_visibility() {
        let index = index(&[(
            "orders.rs",
            r#"
            pub struct OrderView {
                pub id: i32,
                pub(crate) name: String,
                pub(self) hidden: i32,
                pub(super) note: String,
                pub(in crate::orders) code: String,
                secret: String,
            }
            pub struct LineView { pub sku: String }
            "#,
        )]);

        let order = &index.structs_named("OrderView")[0];
        let visible: Vec<&str> = order.fields.iter().map(FieldDef::column).collect();
        assert_eq!(visible, vec!["id", "name"]);
        assert_eq!(
            order.restricted_fields,
            vec![
                ("note".to_string(), "pub(super)".to_string()),
                ("code".to_string(), "pub(in crate::orders)".to_string()),
            ]
        );
        assert!(matches!(
            order.ensure_fields_reachable(),
            Err(GenerateError::InaccessibleField { ref field, .. }) if field == "note"
        ));
        assert!(index.structs_named("LineView")[0].ensure_fields_reachable().is_ok());
    }

    #[test]
    fn test_finds_concrete_descriptors_only() {
        let index = index(&[(
            "procs.rs",
            r#"
            pub struct GetOrder;
            impl procwire_core::StoredProcedure for GetOrder {
                const NAME: &'static str = "get_order";
                type Parameters = OrderId;
                type Results = (OrderView,);
            }
            impl<T: Send + Sync + 'static> StoredProcedure for Generic<T> {
                const NAME: &'static str = "generic";
                type Parameters = ();
                type Results = ();
            }
            "#,
        )]);

        assert_eq!(index.procedures().len(), 1);
        assert_eq!(index.procedures()[0].descriptor, "GetOrder");
    }

    #[test]
    fn test_parse_errors_carry_location() {
        let mut index = SourceIndex::default();
        let err = index
            .add_file(Path::new("broken.rs"), "pub struct A {\n  x: i32,\n  y: \n}")
            .unwrap_err();
        match err {
            GenerateError::Parse { path, line, .. } => {
                assert_eq!(path, Path::new("broken.rs"));
                assert!(line >= 3);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_by_qualifier() {
        let index = index(&[
            ("a.rs", "pub struct Order { pub id: i32 }"),
            ("b.rs", "pub struct Order { pub id: i64 }"),
        ]);

        let ambiguous: syn::Path = syn::parse_str("Order").unwrap();
        assert!(matches!(
            index.resolve(&ambiguous, "crate"),
            Err(GenerateError::AmbiguousType { .. })
        ));

        let qualified: syn::Path = syn::parse_str("crate::b::Order").unwrap();
        let def = index.resolve(&qualified, "crate").unwrap().unwrap();
        assert_eq!(def.qualified_name("crate"), "crate::b::Order");

        let missing: syn::Path = syn::parse_str("Missing").unwrap();
        assert!(index.resolve(&missing, "crate").unwrap().is_none());
    }
}
