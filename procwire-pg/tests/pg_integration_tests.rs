#![cfg(feature = "db-tests")]
//! DB-backed tests for the PostgreSQL backend.
//!
//! Run against a scratch database configured through `PROCWIRE_DB_*`:
//! `cargo test -p procwire-pg --features db-tests`.

use procwire_engine::{AmbientTransaction, Connection, ExecutorConfig, ProcError, ProcedureExecutor, UnitOfWork};
use procwire_pg::{DbConfig, PgConnection};
use procwire_test_utils::fixtures::*;

const SCHEMA: &str = r#"
CREATE SCHEMA IF NOT EXISTS sales;

CREATE OR REPLACE FUNCTION sales.get_order_summary(id int)
RETURNS SETOF refcursor LANGUAGE plpgsql AS $$
DECLARE
    header refcursor := 'cur_a';
    lines refcursor := 'cur_b';
BEGIN
    OPEN header FOR SELECT 'order ' || id AS name;
    RETURN NEXT header;
    OPEN lines FOR SELECT 3 AS count WHERE id > 0;
    RETURN NEXT lines;
END $$;

CREATE OR REPLACE FUNCTION get_order_header(id int)
RETURNS TABLE(name text) LANGUAGE sql AS $$
    SELECT 'order ' || id
$$;

CREATE OR REPLACE FUNCTION list_order_headers()
RETURNS TABLE(name text) LANGUAGE sql AS $$
    SELECT 'order ' || n FROM generate_series(1, 3) AS n
$$;

CREATE TABLE IF NOT EXISTS procwire_order_lines (order_id int, sku text, quantity int);

CREATE OR REPLACE PROCEDURE replace_order_lines(order_id int, lines jsonb)
LANGUAGE plpgsql AS $$
BEGIN
    DELETE FROM procwire_order_lines AS l WHERE l.order_id = replace_order_lines.order_id;
    INSERT INTO procwire_order_lines
    SELECT replace_order_lines.order_id, x.sku, x.quantity
    FROM jsonb_to_recordset(lines) AS x(sku text, quantity int);
END $$;
"#;

async fn connection() -> PgConnection {
    let connection = PgConnection::from_config(&DbConfig::from_env()).expect("pool");
    let client = connection.pool().get().await.expect("client");
    client.batch_execute(SCHEMA).await.expect("schema");
    connection
}

fn executor() -> ProcedureExecutor {
    ProcedureExecutor::new(fixture_registries(), ExecutorConfig::default())
}

#[tokio::test]
async fn multi_result_in_local_transaction() {
    let mut connection = connection().await;
    let ambient = AmbientTransaction::default();

    let (header, count) = executor()
        .execute::<GetOrderSummary, _>(&mut connection, Some(&ambient), &OrderIdParameters { id: 42 })
        .await
        .unwrap();

    assert_eq!(header.name, "order 42");
    assert_eq!(count.count, 3);
    assert!(!connection.is_open());
}

#[tokio::test]
async fn empty_cursor_decodes_to_default() {
    let mut connection = connection().await;
    let ambient = AmbientTransaction::default();

    let (_, count) = executor()
        .execute::<GetOrderSummary, _>(&mut connection, Some(&ambient), &OrderIdParameters { id: 0 })
        .await
        .unwrap();

    assert_eq!(count, LineCountView::default());
}

#[tokio::test]
async fn multi_result_in_unit_of_work_closes_cursors() {
    let executor = executor();
    let mut uow = UnitOfWork::new(connection().await);

    uow.begin().await.unwrap();
    for id in 1..=2 {
        // Named cursors would collide on the second call if left open.
        let (header, _) = uow
            .call::<GetOrderSummary>(&executor, &OrderIdParameters { id })
            .await
            .unwrap();
        assert_eq!(header.name, format!("order {}", id));
    }
    uow.commit().await.unwrap();
    assert!(!uow.connection().is_open());
}

#[tokio::test]
async fn single_result_and_list() {
    let executor = executor();
    let mut connection = connection().await;

    let header = executor
        .execute::<GetOrderHeader, _>(&mut connection, None, &OrderIdParameters { id: 7 })
        .await
        .unwrap();
    assert_eq!(header.name, "order 7");

    let headers = executor
        .execute::<ListOrderHeaders, _>(&mut connection, None, &())
        .await
        .unwrap();
    assert_eq!(headers.len(), 3);
}

#[tokio::test]
async fn procedure_with_table_parameter() {
    let executor = executor();
    let mut connection = connection().await;
    let parameters = ReplaceLinesParameters {
        order_id: 9001,
        lines: vec![
            OrderLine { sku: "ABC-0001".into(), quantity: 2 },
            OrderLine { sku: "ABC-0002".into(), quantity: 5 },
        ],
    };

    executor
        .execute::<ReplaceOrderLines, _>(&mut connection, None, &parameters)
        .await
        .unwrap();

    let client = connection.pool().get().await.unwrap();
    let row = client
        .query_one(
            "SELECT count(*)::int8, sum(quantity)::int8 FROM procwire_order_lines WHERE order_id = 9001",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(row.get::<_, i64>(0), 2);
    assert_eq!(row.get::<_, i64>(1), 7);
}

#[tokio::test]
async fn server_errors_keep_their_sqlstate() {
    struct Missing;

    impl procwire_core::StoredProcedure for Missing {
        const NAME: &'static str = "procwire_no_such_function";
        type Parameters = ();
        type Results = ();
    }

    let mut connection = connection().await;
    let err = executor()
        .execute::<Missing, _>(&mut connection, None, &())
        .await
        .unwrap_err();

    match err {
        ProcError::Database(db) => assert_eq!(db.sqlstate(), Some("42883")),
        other => panic!("expected database error, got {other:?}"),
    }
    assert!(!connection.is_open());
}
