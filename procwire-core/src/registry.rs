//! Process-wide mapper registries.
//!
//! Two independent registries exist, one for parameter encoding and one for
//! result decoding, because a type may appear on one side only. Both are keyed
//! by `TypeId` and are append-only: registration inserts only when the type is
//! absent (first registration wins, later ones are ignored), and there is no
//! removal. The generated registerer populates them once at start-up; after
//! that they are only read.

use crate::error::{MapError, MapResult, RegistryKind};
use crate::mapper::{ParameterMapper, ResultMapper, UnitParameterMapper};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::sync::Arc;

static GLOBAL: Lazy<Arc<MapperRegistries>> = Lazy::new(|| Arc::new(MapperRegistries::new()));

struct Registration {
    type_name: &'static str,
    mapper: Box<dyn Any + Send + Sync>,
}

/// `TypeId`-keyed storage of type-erased mapper handles.
struct TypeMap {
    kind: RegistryKind,
    entries: DashMap<TypeId, Registration>,
}

impl TypeMap {
    fn new(kind: RegistryKind) -> Self {
        Self {
            kind,
            entries: DashMap::new(),
        }
    }

    fn insert_if_absent<T: 'static, H: Any + Send + Sync>(&self, handle: H) -> bool {
        let type_name = std::any::type_name::<T>();
        match self.entries.entry(TypeId::of::<T>()) {
            Entry::Occupied(_) => {
                tracing::trace!(registry = %self.kind, type_name, "duplicate mapper registration ignored");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(Registration {
                    type_name,
                    mapper: Box::new(handle),
                });
                true
            }
        }
    }

    fn get<T: 'static, H: Any + Clone>(&self) -> MapResult<H> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.mapper.downcast_ref::<H>().cloned())
            .ok_or(MapError::MapperNotRegistered {
                registry: self.kind,
                type_name: std::any::type_name::<T>(),
            })
    }

    fn contains(&self, id: TypeId) -> bool {
        self.entries.contains_key(&id)
    }

    fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.iter().map(|e| e.type_name).collect();
        names.sort_unstable();
        names
    }
}

// ============================================================================
// PARAMETER MAPPERS
// ============================================================================

/// Registry of parameter mappers, one per parameter record type.
pub struct ParameterMapperRegistry {
    map: TypeMap,
}

impl ParameterMapperRegistry {
    pub fn new() -> Self {
        Self {
            map: TypeMap::new(RegistryKind::Parameter),
        }
    }

    /// Register `mapper` for `T` unless a mapper for `T` already exists.
    ///
    /// Returns `true` when this call inserted the mapper.
    pub fn register<T, M>(&self, mapper: M) -> bool
    where
        T: 'static,
        M: ParameterMapper<T> + 'static,
    {
        let handle: Arc<dyn ParameterMapper<T>> = Arc::new(mapper);
        self.map.insert_if_absent::<T, _>(handle)
    }

    /// Resolve the mapper for `T`, failing with `MapperNotRegistered`.
    pub fn resolve<T: 'static>(&self) -> MapResult<Arc<dyn ParameterMapper<T>>> {
        self.map.get::<T, Arc<dyn ParameterMapper<T>>>()
    }

    pub fn contains(&self, id: TypeId) -> bool {
        self.map.contains(id)
    }

    pub fn contains_type<T: 'static>(&self) -> bool {
        self.contains(TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.map.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.entries.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        self.map.type_names()
    }
}

impl Default for ParameterMapperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// RESULT MAPPERS
// ============================================================================

/// Registry of result mappers, one per result record type.
pub struct ResultMapperRegistry {
    map: TypeMap,
}

impl ResultMapperRegistry {
    pub fn new() -> Self {
        Self {
            map: TypeMap::new(RegistryKind::Result),
        }
    }

    /// Register `mapper` for `T` unless a mapper for `T` already exists.
    ///
    /// Returns `true` when this call inserted the mapper.
    pub fn register<T, M>(&self, mapper: M) -> bool
    where
        T: 'static,
        M: ResultMapper<T> + 'static,
    {
        let handle: Arc<dyn ResultMapper<T>> = Arc::new(mapper);
        self.map.insert_if_absent::<T, _>(handle)
    }

    /// Resolve the mapper for `T`, failing with `MapperNotRegistered`.
    pub fn resolve<T: 'static>(&self) -> MapResult<Arc<dyn ResultMapper<T>>> {
        self.map.get::<T, Arc<dyn ResultMapper<T>>>()
    }

    pub fn contains(&self, id: TypeId) -> bool {
        self.map.contains(id)
    }

    pub fn contains_type<T: 'static>(&self) -> bool {
        self.contains(TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.map.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.entries.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        self.map.type_names()
    }
}

impl Default for ResultMapperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// BOTH REGISTRIES
// ============================================================================

/// The pair of registries consulted by the execution engine.
pub struct MapperRegistries {
    parameters: ParameterMapperRegistry,
    results: ResultMapperRegistry,
}

impl MapperRegistries {
    /// Fresh registries with the unit parameter mapper pre-registered.
    pub fn new() -> Self {
        let registries = Self {
            parameters: ParameterMapperRegistry::new(),
            results: ResultMapperRegistry::new(),
        };
        registries.parameters.register::<(), _>(UnitParameterMapper);
        registries
    }

    /// The process-wide registries populated by the generated registerer.
    pub fn global() -> Arc<MapperRegistries> {
        Arc::clone(&GLOBAL)
    }

    pub fn parameters(&self) -> &ParameterMapperRegistry {
        &self.parameters
    }

    pub fn results(&self) -> &ResultMapperRegistry {
        &self.results
    }
}

impl Default for MapperRegistries {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MapperRegistries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperRegistries")
            .field("parameters", &self.parameters.type_names())
            .field("results", &self.results.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::Parameter;
    use crate::row::DataRow;
    use crate::value::SqlValue;

    struct Sample;

    struct FirstMapper;
    impl ParameterMapper<Sample> for FirstMapper {
        fn map(&self, _value: &Sample) -> MapResult<Vec<Parameter>> {
            Ok(vec![Parameter::new("first", SqlValue::I32(1))])
        }
    }

    struct SecondMapper;
    impl ParameterMapper<Sample> for SecondMapper {
        fn map(&self, _value: &Sample) -> MapResult<Vec<Parameter>> {
            Ok(vec![Parameter::new("second", SqlValue::I32(2))])
        }
    }

    struct CountMapper;
    impl ResultMapper<i64> for CountMapper {
        fn map(&self, row: &DataRow) -> MapResult<i64> {
            row.get("count")
        }
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = ParameterMapperRegistry::new();
        assert!(registry.register::<Sample, _>(FirstMapper));
        assert!(!registry.register::<Sample, _>(SecondMapper));
        assert_eq!(registry.len(), 1);

        let bound = registry.resolve::<Sample>().unwrap().map(&Sample).unwrap();
        assert_eq!(bound[0].name, "first");
    }

    #[test]
    fn test_resolve_unregistered_fails() {
        let registry = ResultMapperRegistry::new();
        let err = registry.resolve::<String>().err().unwrap();
        assert_eq!(
            err,
            MapError::MapperNotRegistered {
                registry: RegistryKind::Result,
                type_name: std::any::type_name::<String>(),
            }
        );
    }

    #[test]
    fn test_registries_are_independent() {
        let registries = MapperRegistries::new();
        registries.results().register::<i64, _>(CountMapper);
        assert!(registries.results().contains_type::<i64>());
        assert!(!registries.parameters().contains_type::<i64>());
    }

    #[test]
    fn test_unit_parameters_bind_nothing() {
        let registries = MapperRegistries::new();
        let bound = registries.parameters().resolve::<()>().unwrap().map(&()).unwrap();
        assert!(bound.is_empty());
    }

    #[test]
    fn test_type_names_sorted() {
        let registries = MapperRegistries::new();
        registries.parameters().register::<Sample, _>(FirstMapper);
        let names = registries.parameters().type_names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 2);
    }
}
