//! Property-Based Tests for the Cursor Handoff Protocol
//!
//! Property: whatever names the server hands out, the engine fetches every
//! cursor exactly once, in the order the names were returned, with the name
//! quoted as an identifier, and decodes each slot from its own cursor.

use procwire_engine::{quote_ident, AmbientTransaction, ExecutorConfig, ProcedureExecutor};
use procwire_test_utils::fixtures::*;
use procwire_test_utils::generators::{arb_cursor_names, arb_order_header};
use procwire_test_utils::{cursor_rows, FakeConnection};
use proptest::prelude::*;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cursors_fetched_in_returned_order(
        names in arb_cursor_names(2),
        header in arb_order_header(),
        count in any::<i32>(),
    ) {
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut connection = FakeConnection::new()
            .reply_rows(cursor_rows(&name_refs))
            .reply_rows(vec![header_row(&header.name)])
            .reply_rows(vec![count_row(count)]);
        let executor = ProcedureExecutor::new(fixture_registries(), ExecutorConfig::default());
        let ambient = AmbientTransaction::default();

        let (decoded_header, decoded_count) = block_on(executor.execute::<GetOrderSummary, _>(
            &mut connection,
            Some(&ambient),
            &OrderIdParameters { id: 1 },
        ))
        .unwrap();

        let expected: Vec<String> = names
            .iter()
            .map(|name| format!("FETCH ALL FROM {}", quote_ident(name)))
            .collect();
        prop_assert_eq!(connection.statements(), expected);
        prop_assert_eq!(decoded_header, header);
        prop_assert_eq!(decoded_count.count, count);
    }
}
