//! Generation driver: scan, infer, emit, and sync the output directory.

use crate::config::GeneratorConfig;
use crate::emit;
use crate::error::{GenerateError, GenerateResult};
use crate::scan::{ProcedureDef, SourceIndex, StructDef};
use crate::shape::{
    generic_arg, parameter_shape, render_type, result_shape, type_path, unwrap_option,
    ParameterShape, RecordRef, ResultShape, Scalar,
};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Maximum number of result slots a descriptor may declare.
const MAX_RESULT_SLOTS: usize = 16;

const PARAMETER_DIR: &str = "parameter_mappers";
const RESULT_DIR: &str = "result_mappers";

/// Everything the generator will emit, before any source text is produced.
#[derive(Debug, Clone, Default)]
pub struct GenerationPlan {
    /// Descriptors that contributed, in scan order.
    pub procedures: Vec<String>,
    /// Sorted by record name.
    pub parameters: Vec<ParameterShape>,
    /// Sorted by record name.
    pub results: Vec<ResultShape>,
}

/// One generated file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub path: PathBuf,
    pub contents: String,
}

/// Outcome of [`GeneratedOutput::write_to`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: Vec<PathBuf>,
    pub unchanged: usize,
    pub removed: Vec<PathBuf>,
}

/// A difference between generated output and what is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    /// Would be generated but does not exist.
    Missing(PathBuf),
    /// Exists with different contents.
    Stale(PathBuf),
    /// A mapper file that would be removed.
    Extra(PathBuf),
}

impl std::fmt::Display for Drift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Drift::Missing(path) => write!(f, "missing: {}", path.display()),
            Drift::Stale(path) => write!(f, "out of date: {}", path.display()),
            Drift::Extra(path) => write!(f, "stale file: {}", path.display()),
        }
    }
}

/// The full set of generated files, held in memory.
#[derive(Debug, Clone, Default)]
pub struct GeneratedOutput {
    units: Vec<GeneratedUnit>,
}

impl GeneratedOutput {
    pub fn units(&self) -> &[GeneratedUnit] {
        &self.units
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&GeneratedUnit> {
        self.units.iter().find(|unit| unit.path == path.as_ref())
    }

    /// Remove `*.rs` files in the mapper directories that are no longer
    /// generated, then write every unit whose contents changed.
    pub fn write_to(&self, dir: &Path) -> GenerateResult<WriteSummary> {
        let mut summary = WriteSummary::default();

        for extra in self.extra_files(dir)? {
            let path = dir.join(&extra);
            std::fs::remove_file(&path).map_err(|e| GenerateError::io(&path, e))?;
            tracing::debug!(path = %extra.display(), "Removed stale mapper");
            summary.removed.push(extra);
        }

        for unit in &self.units {
            let path = dir.join(&unit.path);
            if std::fs::read_to_string(&path).is_ok_and(|existing| existing == unit.contents) {
                summary.unchanged += 1;
                continue;
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| GenerateError::io(parent, e))?;
            }
            std::fs::write(&path, &unit.contents).map_err(|e| GenerateError::io(&path, e))?;
            summary.written.push(unit.path.clone());
        }

        Ok(summary)
    }

    /// Compare against `dir` without modifying it.
    pub fn check_against(&self, dir: &Path) -> GenerateResult<Vec<Drift>> {
        let mut drift = Vec::new();
        for unit in &self.units {
            let path = dir.join(&unit.path);
            match std::fs::read_to_string(&path) {
                Ok(existing) if existing == unit.contents => {}
                Ok(_) => drift.push(Drift::Stale(unit.path.clone())),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    drift.push(Drift::Missing(unit.path.clone()))
                }
                Err(e) => return Err(GenerateError::io(path, e)),
            }
        }
        drift.extend(self.extra_files(dir)?.into_iter().map(Drift::Extra));
        Ok(drift)
    }

    /// Relative paths of `*.rs` files in the mapper directories that are not
    /// part of this output.
    fn extra_files(&self, dir: &Path) -> GenerateResult<Vec<PathBuf>> {
        let mut extra = Vec::new();
        for sub in [PARAMETER_DIR, RESULT_DIR] {
            let path = dir.join(sub);
            let entries = match std::fs::read_dir(&path) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(GenerateError::io(path, e)),
            };
            for entry in entries {
                let entry = entry.map_err(|e| GenerateError::io(&path, e))?;
                let file_name = entry.file_name();
                let relative = Path::new(sub).join(&file_name);
                let is_rust = Path::new(&file_name).extension().is_some_and(|ext| ext == "rs");
                if is_rust && entry.path().is_file() && self.get(&relative).is_none() {
                    extra.push(relative);
                }
            }
        }
        extra.sort();
        Ok(extra)
    }
}

/// Scans a crate and generates its mappers.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Scan the source root and infer every mapper shape.
    pub fn plan(&self) -> GenerateResult<GenerationPlan> {
        let index = SourceIndex::scan(&self.config.source_root, Some(&self.config.output_dir))?;
        self.plan_from_index(&index)
    }

    pub fn plan_from_index(&self, index: &SourceIndex) -> GenerateResult<GenerationPlan> {
        let mut parameters: BTreeMap<String, ParameterShape> = BTreeMap::new();
        let mut results: BTreeMap<String, ResultShape> = BTreeMap::new();
        let mut procedures = Vec::with_capacity(index.procedures().len());

        for procedure in index.procedures() {
            if let Some((def, optional)) = self.parameter_record(index, procedure)? {
                let shape = match parameters.entry(def.qualified_name(&self.config.type_root)) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => entry.insert(parameter_shape(index, def, &self.config)?),
                };
                shape.optional |= optional;
            }
            for def in self.result_records(index, procedure)? {
                let key = def.qualified_name(&self.config.type_root);
                if !results.contains_key(&key) {
                    results.insert(key, result_shape(def, &self.config)?);
                }
            }
            tracing::debug!(descriptor = %procedure.descriptor, "Planned stored procedure");
            procedures.push(procedure.descriptor.clone());
        }

        let mut parameters: Vec<ParameterShape> = parameters.into_values().collect();
        let mut results: Vec<ResultShape> = results.into_values().collect();
        parameters.sort_by(|a, b| a.record.name.cmp(&b.record.name));
        results.sort_by(|a, b| a.record.name.cmp(&b.record.name));
        ensure_unique_names(parameters.iter().map(|shape| &shape.record))?;
        ensure_unique_names(results.iter().map(|shape| &shape.record))?;

        Ok(GenerationPlan {
            procedures,
            parameters,
            results,
        })
    }

    /// Plan and emit every file, without touching the output directory.
    pub fn generate(&self) -> GenerateResult<GeneratedOutput> {
        let plan = self.plan()?;
        let output = self.emit(&plan);
        tracing::info!(
            procedures = plan.procedures.len(),
            parameter_mappers = plan.parameters.len(),
            result_mappers = plan.results.len(),
            files = output.units.len(),
            "Generated mappers"
        );
        Ok(output)
    }

    pub fn emit(&self, plan: &GenerationPlan) -> GeneratedOutput {
        let core = &self.config.core_crate;
        let mut units = Vec::with_capacity(plan.parameters.len() + plan.results.len() + 4);

        let mut parameter_entries = Vec::with_capacity(plan.parameters.len());
        for shape in &plan.parameters {
            let module = emit::parameter_mapper_module(&shape.record);
            units.push(GeneratedUnit {
                path: Path::new(PARAMETER_DIR).join(format!("{}.rs", module)),
                contents: emit::parameter_mapper(shape, core),
            });
            parameter_entries.push((module, emit::parameter_mapper_name(&shape.record)));
        }

        let mut result_entries = Vec::with_capacity(plan.results.len());
        for shape in &plan.results {
            let module = emit::result_mapper_module(&shape.record);
            units.push(GeneratedUnit {
                path: Path::new(RESULT_DIR).join(format!("{}.rs", module)),
                contents: emit::result_mapper(shape, core),
            });
            result_entries.push((module, emit::result_mapper_name(&shape.record)));
        }

        units.push(GeneratedUnit {
            path: Path::new(PARAMETER_DIR).join("mod.rs"),
            contents: emit::mapper_module(&parameter_entries),
        });
        units.push(GeneratedUnit {
            path: Path::new(RESULT_DIR).join("mod.rs"),
            contents: emit::mapper_module(&result_entries),
        });
        units.push(GeneratedUnit {
            path: PathBuf::from("mod.rs"),
            contents: emit::root_module(),
        });
        units.push(GeneratedUnit {
            path: PathBuf::from("registerer.rs"),
            contents: emit::registerer(&plan.parameters, &plan.results, core),
        });
        units.sort_by(|a, b| a.path.cmp(&b.path));

        GeneratedOutput { units }
    }

    /// The parameter record of a descriptor and whether it is wrapped in
    /// `Option`, or `None` for `()`.
    fn parameter_record<'a>(
        &self,
        index: &'a SourceIndex,
        procedure: &ProcedureDef,
    ) -> GenerateResult<Option<(&'a StructDef, bool)>> {
        let declared = &procedure.parameters;
        if matches!(declared, syn::Type::Tuple(tuple) if tuple.elems.is_empty()) {
            return Ok(None);
        }
        let (ty, optional) = unwrap_option(declared);
        if Scalar::of(ty).is_some() || generic_arg(ty, "Vec").is_some() {
            return Err(invalid(
                procedure,
                format!("Parameters = {} is not a record type", render_type(declared)),
            ));
        }
        let def = self.record(index, procedure, ty)?;
        Ok(Some((def, optional)))
    }

    /// Target record of each result slot, after unwrapping `Option`/`Vec`.
    fn result_records<'a>(
        &self,
        index: &'a SourceIndex,
        procedure: &ProcedureDef,
    ) -> GenerateResult<Vec<&'a StructDef>> {
        let syn::Type::Tuple(slots) = &procedure.results else {
            return Err(invalid(
                procedure,
                format!(
                    "Results = {} must be a tuple; write ({},) for one result set",
                    render_type(&procedure.results),
                    render_type(&procedure.results)
                ),
            ));
        };
        if slots.elems.len() > MAX_RESULT_SLOTS {
            return Err(invalid(
                procedure,
                format!(
                    "{} result slots declared, at most {} are supported",
                    slots.elems.len(),
                    MAX_RESULT_SLOTS
                ),
            ));
        }

        slots
            .elems
            .iter()
            .map(|slot| {
                let (inner, _) = unwrap_option(slot);
                let target = generic_arg(inner, "Vec").unwrap_or(inner);
                if Scalar::of(target).is_some() {
                    return Err(invalid(
                        procedure,
                        format!("result slot {} is not a record type", render_type(slot)),
                    ));
                }
                self.record(index, procedure, target)
            })
            .collect()
    }

    fn record<'a>(
        &self,
        index: &'a SourceIndex,
        procedure: &ProcedureDef,
        ty: &syn::Type,
    ) -> GenerateResult<&'a StructDef> {
        let unknown = || GenerateError::UnknownType {
            name: render_type(ty),
            referenced_by: procedure.descriptor.clone(),
        };
        let path = type_path(ty).ok_or_else(unknown)?;
        let def = index.resolve(path, &self.config.type_root)?.ok_or_else(unknown)?;
        if !def.has_named_fields || def.is_generic {
            return Err(invalid(
                procedure,
                format!("{} must be a non-generic struct with named fields", def.name),
            ));
        }
        Ok(def)
    }
}

fn invalid(procedure: &ProcedureDef, reason: String) -> GenerateError {
    GenerateError::InvalidDescriptor {
        descriptor: procedure.descriptor.clone(),
        reason,
    }
}

/// Generated names derive from simple names, so two records sharing one
/// would collide.
fn ensure_unique_names<'a>(records: impl Iterator<Item = &'a RecordRef>) -> GenerateResult<()> {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    for record in records {
        if let Some(previous) = seen.insert(&record.name, &record.path) {
            return Err(GenerateError::AmbiguousType {
                name: record.name.clone(),
                candidates: vec![previous.to_string(), record.path.clone()],
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(files: &[(&str, &str)]) -> GenerateResult<GenerationPlan> {
        let mut index = SourceIndex::default();
        for (path, contents) in files {
            index.add_file(Path::new(path), contents)?;
        }
        Generator::new(GeneratorConfig::new("src", "src/mappers")).plan_from_index(&index)
    }

    const MODEL: &str = r#"
        #[derive(Default)]
        pub struct OrderId { pub id: i32 }
        #[derive(Default)]
        pub struct OrderView { pub id: i32, pub name: String }
        #[derive(Default)]
        pub struct LineView { pub sku: String }
    "#;

    #[test]
    fn test_shared_records_are_deduplicated() {
        let plan = plan(&[
            ("model.rs", MODEL),
            (
                "procs.rs",
                r#"
                pub struct A;
                impl StoredProcedure for A {
                    const NAME: &'static str = "a";
                    type Parameters = crate::model::OrderId;
                    type Results = (OrderView, Vec<LineView>);
                }
                pub struct B;
                impl StoredProcedure for B {
                    const NAME: &'static str = "b";
                    type Parameters = OrderId;
                    type Results = (Option<OrderView>,);
                }
                "#,
            ),
        ])
        .unwrap();

        assert_eq!(plan.procedures, vec!["A", "B"]);
        assert_eq!(plan.parameters.len(), 1);
        let names: Vec<&str> = plan.results.iter().map(|s| s.record.name.as_str()).collect();
        assert_eq!(names, vec!["LineView", "OrderView"]);
    }

    #[test]
    fn test_optional_parameters_mark_the_shape() {
        let plan = plan(&[
            ("model.rs", MODEL),
            (
                "procs.rs",
                r#"
                pub struct A;
                impl StoredProcedure for A {
                    const NAME: &'static str = "a";
                    type Parameters = OrderId;
                    type Results = ();
                }
                pub struct B;
                impl StoredProcedure for B {
                    const NAME: &'static str = "b";
                    type Parameters = Option<OrderId>;
                    type Results = ();
                }
                "#,
            ),
        ])
        .unwrap();
        assert_eq!(plan.parameters.len(), 1);
        assert!(plan.parameters[0].optional);
        assert!(plan.results.is_empty());
    }

    #[test]
    fn test_results_must_be_a_tuple() {
        let err = plan(&[
            ("model.rs", MODEL),
            (
                "procs.rs",
                r#"
                pub struct A;
                impl StoredProcedure for A {
                    const NAME: &'static str = "a";
                    type Parameters = ();
                    type Results = OrderView;
                }
                "#,
            ),
        ])
        .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidDescriptor { descriptor, .. } if descriptor == "A"));
    }

    #[test]
    fn test_unknown_result_type() {
        let err = plan(&[(
            "procs.rs",
            r#"
            pub struct A;
            impl StoredProcedure for A {
                const NAME: &'static str = "a";
                type Parameters = ();
                type Results = (Missing,);
            }
            "#,
        )])
        .unwrap_err();
        assert!(matches!(
            err,
            GenerateError::UnknownType { name, referenced_by } if name == "Missing" && referenced_by == "A"
        ));
    }

    #[test]
    fn test_same_simple_name_in_two_modules_is_ambiguous() {
        let err = plan(&[
            ("a.rs", "#[derive(Default)] pub struct Row { pub id: i32 }"),
            ("b.rs", "#[derive(Default)] pub struct Row { pub id: i64 }"),
            (
                "procs.rs",
                r#"
                pub struct P;
                impl StoredProcedure for P {
                    const NAME: &'static str = "p";
                    type Parameters = ();
                    type Results = (crate::a::Row, crate::b::Row);
                }
                "#,
            ),
        ])
        .unwrap_err();
        assert!(matches!(err, GenerateError::AmbiguousType { name, .. } if name == "Row"));
    }

    #[test]
    fn test_emitted_units_are_sorted() {
        let plan = plan(&[
            ("model.rs", MODEL),
            (
                "procs.rs",
                r#"
                pub struct A;
                impl StoredProcedure for A {
                    const NAME: &'static str = "a";
                    type Parameters = OrderId;
                    type Results = (OrderView,);
                }
                "#,
            ),
        ])
        .unwrap();
        let output = Generator::new(GeneratorConfig::new("src", "out")).emit(&plan);

        let paths: Vec<PathBuf> = output.units().iter().map(|u| u.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
        assert!(output.get("parameter_mappers/order_id_parameter_mapper.rs").is_some());
        assert!(output.get("result_mappers/order_view_result_mapper.rs").is_some());
        assert!(output.get("registerer.rs").is_some());
    }
}
