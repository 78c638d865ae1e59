//! Property-Based Tests for Mapper Registries
//!
//! Property: registering the same type any number of times yields exactly one
//! retrievable mapper, and it is always the first one registered.
//! Property: resolving a type that was never registered always fails with
//! `MapperNotRegistered`, in both registries.

use procwire_core::*;
use proptest::prelude::*;

struct Marker;

struct TaggedMapper(i32);

impl ParameterMapper<Marker> for TaggedMapper {
    fn map(&self, _value: &Marker) -> MapResult<Vec<Parameter>> {
        Ok(vec![Parameter::new("tag", SqlValue::I32(self.0))])
    }
}

impl ResultMapper<Marker> for TaggedMapper {
    fn map(&self, _row: &DataRow) -> MapResult<Marker> {
        Ok(Marker)
    }
}

struct NeverRegistered;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_duplicate_registration_keeps_first(tags in prop::collection::vec(any::<i32>(), 1..20)) {
        let registries = MapperRegistries::new();
        let before = registries.parameters().len();

        let inserted: Vec<bool> = tags
            .iter()
            .map(|tag| registries.parameters().register::<Marker, _>(TaggedMapper(*tag)))
            .collect();

        prop_assert!(inserted[0]);
        prop_assert!(inserted[1..].iter().all(|i| !i));
        prop_assert_eq!(registries.parameters().len(), before + 1);

        let bound = registries.parameters().resolve::<Marker>().unwrap().map(&Marker).unwrap();
        prop_assert_eq!(&bound[0].value, &SqlValue::I32(tags[0]));
    }

    #[test]
    fn prop_result_registration_is_idempotent(times in 1usize..10) {
        let registries = MapperRegistries::new();
        for i in 0..times {
            registries.results().register::<Marker, _>(TaggedMapper(i as i32));
        }
        prop_assert_eq!(registries.results().len(), 1);
        prop_assert!(registries.results().contains_type::<Marker>());
    }
}

#[test]
fn resolve_unregistered_fails_in_both_registries() {
    let registries = MapperRegistries::new();

    match registries.parameters().resolve::<NeverRegistered>() {
        Err(MapError::MapperNotRegistered { registry, type_name }) => {
            assert_eq!(registry, RegistryKind::Parameter);
            assert!(type_name.ends_with("NeverRegistered"));
        }
        _ => panic!("expected MapperNotRegistered"),
    }

    match registries.results().resolve::<NeverRegistered>() {
        Err(MapError::MapperNotRegistered { registry, .. }) => {
            assert_eq!(registry, RegistryKind::Result)
        }
        _ => panic!("expected MapperNotRegistered"),
    }
}

#[test]
fn global_registries_are_shared() {
    let a = MapperRegistries::global();
    let b = MapperRegistries::global();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
    assert!(a.parameters().contains_type::<()>());
}
