//! Live MySQL integration tests.
//!
//! These run only when `DATABASE_URL` points at a MySQL server the tests may
//! write to; otherwise every test skips with a note on stderr. The fixture
//! tables are created and dropped per test run.
//!
//! ```sh
//! DATABASE_URL=mysql://root:pw@localhost:3306/relay_test cargo test --test live_mysql
//! ```

use db_relay::db::Parameter;
use db_relay::error::RelayError;
use db_relay::format::OutputOptions;
use db_relay::query::{Payload, QueryInput, QueryOptions, QueryTask};
use tokio_util::sync::CancellationToken;

fn database_url() -> Option<String> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping live test: DATABASE_URL not set");
            None
        }
    }
}

async fn run_sql(task: &QueryTask, url: &str, sql: &str) {
    let input = QueryInput::new(url, sql);
    task.execute_query(&input, &QueryOptions::default(), &CancellationToken::new())
        .await
        .unwrap();
}

/// Creates the fixture tables and procedure used by the assertions below.
async fn setup(task: &QueryTask, url: &str) {
    run_sql(task, url, "DROP TABLE IF EXISTS HodorTest").await;
    run_sql(task, url, "DROP TABLE IF EXISTS DecimalTest").await;
    run_sql(task, url, "DROP PROCEDURE IF EXISTS GetAllFromHodorTest").await;
    run_sql(
        task,
        url,
        "CREATE TABLE HodorTest (name varchar(15), value int(10))",
    )
    .await;
    run_sql(
        task,
        url,
        "INSERT INTO HodorTest (name, value) VALUES ('hodor', 123), ('jon', 321)",
    )
    .await;
    run_sql(
        task,
        url,
        "CREATE TABLE DecimalTest (DecimalValue decimal(38,30))",
    )
    .await;
    run_sql(
        task,
        url,
        "INSERT INTO DecimalTest (DecimalValue) VALUES (1.123456789123456789123456789123)",
    )
    .await;
    run_sql(
        task,
        url,
        "CREATE PROCEDURE GetAllFromHodorTest() BEGIN SELECT * FROM HodorTest; END",
    )
    .await;
}

async fn teardown(task: &QueryTask, url: &str) {
    run_sql(task, url, "DROP TABLE IF EXISTS HodorTest").await;
    run_sql(task, url, "DROP TABLE IF EXISTS DecimalTest").await;
    run_sql(task, url, "DROP PROCEDURE IF EXISTS GetAllFromHodorTest").await;
}

#[tokio::test]
async fn select_returns_expected_json_document() {
    let Some(url) = database_url() else { return };
    let task = QueryTask::new();
    setup(&task, &url).await;

    let outcome = task
        .query(
            &QueryInput::new(&url, "SELECT * FROM HodorTest"),
            &OutputOptions::json(),
            &QueryOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let Some(Payload::Document(doc)) = outcome.payload else {
        panic!("expected an inline document");
    };
    assert_eq!(
        doc,
        "[\n  {\n    \"name\": \"hodor\",\n    \"value\": 123\n  },\n  {\n    \"name\": \"jon\",\n    \"value\": 321\n  }\n]"
    );

    teardown(&task, &url).await;
}

#[tokio::test]
async fn decimal_precision_survives_the_round_trip() {
    let Some(url) = database_url() else { return };
    let task = QueryTask::new();
    setup(&task, &url).await;

    let outcome = task
        .query(
            &QueryInput::new(&url, "SELECT DecimalValue FROM DecimalTest"),
            &OutputOptions::json(),
            &QueryOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let Some(Payload::Document(doc)) = outcome.payload else {
        panic!("expected an inline document");
    };
    assert!(
        doc.contains("1.123456789123456789123456789"),
        "precision lost: {doc}"
    );

    teardown(&task, &url).await;
}

#[tokio::test]
async fn parameterized_select_filters_rows() {
    let Some(url) = database_url() else { return };
    let task = QueryTask::new();
    setup(&task, &url).await;

    let input = QueryInput::new(&url, "SELECT value FROM HodorTest WHERE name = @name")
        .with_parameters(vec![Parameter::new("name", "jon")]);
    let outcome = task
        .execute_query(&input, &QueryOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome.payload,
        Some(Payload::Rows(serde_json::json!([{"value": 321}])))
    );

    teardown(&task, &url).await;
}

#[tokio::test]
async fn insert_reports_affected_rows_and_is_committed() {
    let Some(url) = database_url() else { return };
    let task = QueryTask::new();
    setup(&task, &url).await;

    let input = QueryInput::new(
        &url,
        "INSERT INTO HodorTest (name, value) VALUES ('bran', 7)",
    );
    let outcome = task
        .execute_query(&input, &QueryOptions::default(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.payload, Some(Payload::RowCount(1)));

    let check = task
        .execute_query(
            &QueryInput::new(&url, "SELECT count(*) AS n FROM HodorTest"),
            &QueryOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(
        check.payload,
        Some(Payload::Rows(serde_json::json!([{"n": 3}])))
    );

    teardown(&task, &url).await;
}

#[tokio::test]
async fn stored_procedure_returns_rows() {
    let Some(url) = database_url() else { return };
    let task = QueryTask::new();
    setup(&task, &url).await;

    let outcome = task
        .execute_procedure(
            &QueryInput::new(&url, "GetAllFromHodorTest"),
            &QueryOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.payload,
        Some(Payload::Rows(serde_json::json!([
            {"name": "hodor", "value": 123},
            {"name": "jon", "value": 321}
        ])))
    );

    teardown(&task, &url).await;
}

#[tokio::test]
async fn unknown_table_fails_with_query_prefix_and_rolls_back() {
    let Some(url) = database_url() else { return };
    let task = QueryTask::new();
    setup(&task, &url).await;

    let err = task
        .execute_query(
            &QueryInput::new(&url, "SELECT * FROM NoSuchTableHere"),
            &QueryOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Execution(_)));
    assert!(err.to_string().starts_with("Query failed "));

    teardown(&task, &url).await;
}

#[tokio::test]
async fn bad_credentials_fail_as_connection_error() {
    let Some(url) = database_url() else { return };
    // Same host, wrong password.
    let mut bad = url::Url::parse(&url).unwrap();
    bad.set_password(Some("definitely-wrong-password")).unwrap();

    let task = QueryTask::new();
    let err = task
        .execute_query(
            &QueryInput::new(bad.as_str(), "SELECT 1"),
            &QueryOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Connection(_)));
}
