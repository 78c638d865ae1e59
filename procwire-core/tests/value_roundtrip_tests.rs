//! Property-Based Tests for Scalar Encode/Decode
//!
//! Property: for every supported primitive field type, a record encoded into a
//! row and decoded by a result mapper of the generated shape compares equal to
//! the original record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use procwire_core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllTypes {
    pub small: i16,
    pub regular: i32,
    pub big: i64,
    pub single: f32,
    pub double: f64,
    pub amount: Decimal,
    pub flag: bool,
    pub initial: char,
    pub label: String,
    pub payload: Vec<u8>,
    pub day: NaiveDate,
    pub clock: NaiveTime,
    pub stamp: NaiveDateTime,
    pub instant: DateTime<Utc>,
    pub id: Uuid,
    pub note: Option<String>,
    pub document: serde_json::Value,
}

struct AllTypesResultMapper;

impl ResultMapper<AllTypes> for AllTypesResultMapper {
    fn map(&self, row: &DataRow) -> MapResult<AllTypes> {
        let mut record = AllTypes::default();
        if row.is_present("small") {
            record.small = row.get("small")?;
        }
        if row.is_present("regular") {
            record.regular = row.get("regular")?;
        }
        if row.is_present("big") {
            record.big = row.get("big")?;
        }
        if row.is_present("single") {
            record.single = row.get("single")?;
        }
        if row.is_present("double") {
            record.double = row.get("double")?;
        }
        if row.is_present("amount") {
            record.amount = row.get("amount")?;
        }
        if row.is_present("flag") {
            record.flag = row.get("flag")?;
        }
        if row.is_present("initial") {
            record.initial = row.get("initial")?;
        }
        if row.is_present("label") {
            record.label = row.get("label")?;
        }
        if row.is_present("payload") {
            record.payload = row.get("payload")?;
        }
        if row.is_present("day") {
            record.day = row.get("day")?;
        }
        if row.is_present("clock") {
            record.clock = row.get("clock")?;
        }
        if row.is_present("stamp") {
            record.stamp = row.get("stamp")?;
        }
        if row.is_present("instant") {
            record.instant = row.get("instant")?;
        }
        if row.is_present("id") {
            record.id = row.get("id")?;
        }
        if row.is_present("note") {
            record.note = row.get("note")?;
        }
        if row.is_present("document") {
            record.document = row.get("document")?;
        }
        Ok(record)
    }
}

procwire_core::result_record!(AllTypes);

fn encode(record: &AllTypes) -> DataRow {
    DataRow::from_pairs([
        ("small", record.small.to_sql_value()),
        ("regular", record.regular.to_sql_value()),
        ("big", record.big.to_sql_value()),
        ("single", record.single.to_sql_value()),
        ("double", record.double.to_sql_value()),
        ("amount", record.amount.to_sql_value()),
        ("flag", record.flag.to_sql_value()),
        ("initial", record.initial.to_sql_value()),
        ("label", record.label.to_sql_value()),
        ("payload", record.payload.to_sql_value()),
        ("day", record.day.to_sql_value()),
        ("clock", record.clock.to_sql_value()),
        ("stamp", record.stamp.to_sql_value()),
        ("instant", record.instant.to_sql_value()),
        ("id", record.id.to_sql_value()),
        ("note", record.note.to_sql_value()),
        ("document", record.document.to_sql_value()),
    ])
}

fn arb_all_types() -> impl Strategy<Value = AllTypes> {
    let numbers = (
        any::<i16>(),
        any::<i32>(),
        any::<i64>(),
        -1.0e6f32..1.0e6f32,
        -1.0e12f64..1.0e12f64,
        (any::<i64>(), 0u32..10).prop_map(|(m, s)| Decimal::new(m, s)),
        any::<bool>(),
        any::<char>(),
    );
    let rest = (
        ".{0,24}",
        prop::collection::vec(any::<u8>(), 0..32),
        (0i64..3_000_000).prop_map(|secs| DateTime::from_timestamp(secs * 3_600, 0).unwrap_or_default()),
        any::<u128>().prop_map(Uuid::from_u128),
        prop::option::of("[a-z]{1,8}"),
        prop_oneof![
            Just(serde_json::Value::Null),
            any::<i64>().prop_map(serde_json::Value::from),
            prop::collection::btree_map("[a-z]{1,6}", ".{0,8}", 0..4).prop_map(|map| serde_json::json!(map)),
        ],
    );
    (numbers, rest).prop_map(
        |((small, regular, big, single, double, amount, flag, initial), (label, payload, instant, id, note, document))| {
            AllTypes {
                small,
                regular,
                big,
                single,
                double,
                amount,
                flag,
                initial,
                label,
                payload,
                day: instant.date_naive(),
                clock: instant.time(),
                stamp: instant.naive_utc(),
                instant,
                id,
                note,
                document,
            }
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_result_mapper_round_trips_all_primitives(record in arb_all_types()) {
        let registries = MapperRegistries::new();
        registries.results().register::<AllTypes, _>(AllTypesResultMapper);

        let decoded: AllTypes = decode_first(&[encode(&record)], &registries).unwrap();
        prop_assert_eq!(decoded, record);
    }
}

#[test]
fn partial_projection_leaves_defaults() {
    let registries = MapperRegistries::new();
    registries.results().register::<AllTypes, _>(AllTypesResultMapper);

    let row = DataRow::from_pairs([
        ("label", SqlValue::Text("only".into())),
        ("big", SqlValue::Null(SqlNullType::I64)),
    ]);
    let decoded: AllTypes = decode_first(&[row], &registries).unwrap();
    assert_eq!(decoded.label, "only");
    assert_eq!(decoded.big, 0);
    assert_eq!(decoded.note, None);
}

#[test]
fn empty_rows_decode_to_default_but_still_require_a_mapper() {
    let registries = MapperRegistries::new();
    assert!(decode_first::<AllTypes>(&[], &registries).is_err());

    registries.results().register::<AllTypes, _>(AllTypesResultMapper);
    assert_eq!(decode_first::<AllTypes>(&[], &registries).unwrap(), AllTypes::default());
}
