//! Integration tests running a test context against an in-memory DuckDB.
//!
//! A table macro is rebuilt against an empty copy of the table it reads,
//! exercised, compared, and torn down again.

use sf_core::naming::is_generated_name;
use sf_core::{NameGenerator, ObjectKind, Parameter, SqlValue, TabularResult};
use sf_db::{DuckDbBackend, Executor, TableDefinitionOptions};
use sf_harness::{compare, ComparisonOptions, TestContext};
use std::sync::Arc;

// ── Helpers ─────────────────────────────────────────────────────────────

fn seeded_db() -> Arc<DuckDbBackend> {
    let db = DuckDbBackend::in_memory().unwrap();
    db.create_object(
        "CREATE TABLE Orders (id INTEGER NOT NULL, customer VARCHAR);
         INSERT INTO Orders VALUES (1, 'ada'), (2, 'bob'), (3, 'cy');
         CREATE MACRO orders_report(min_id) AS TABLE
             SELECT id, customer FROM Orders WHERE id >= min_id ORDER BY id;",
    )
    .unwrap();
    Arc::new(db)
}

fn generated_objects(db: &DuckDbBackend) -> Vec<String> {
    db.object_names("main")
        .unwrap()
        .into_iter()
        .filter(|name| is_generated_name(name))
        .collect()
}

fn context(db: &Arc<DuckDbBackend>) -> TestContext {
    TestContext::new(db.clone()).with_name_generator(NameGenerator::sequential())
}

// ── Tests ───────────────────────────────────────────────────────────────

#[test]
fn test_report_reads_the_fake_table() {
    let db = seeded_db();
    {
        let mut ctx = context(&db);
        ctx.for_routine("orders_report")
            .unwrap()
            .mock_table("Orders", TableDefinitionOptions::default())
            .unwrap()
            .build()
            .unwrap();

        let fake = ctx.fake_name(ObjectKind::Table, "Orders").unwrap().to_string();
        assert!(is_generated_name(&fake), "{fake}");
        ctx.execute_non_query(&format!(
            "INSERT INTO \"main\".\"{fake}\" VALUES (10, 'dee'), (20, 'eve')"
        ))
        .unwrap();

        let result = ctx
            .execute_with_result(&[Parameter::input("min_id", 15)])
            .unwrap();
        assert_eq!(result.return_code(), None);

        let expected = TabularResult::from_names(
            &["id", "customer"],
            vec![vec![SqlValue::Int(20), SqlValue::from("eve")]],
        )
        .unwrap();
        let outcome = compare(
            &expected,
            result.first_result_set().unwrap(),
            &ComparisonOptions::default(),
        );
        assert!(outcome.is_equal, "{}", outcome.message);

        assert_eq!(generated_objects(&db).len(), 2);
    }

    // Dropping the context removed the fake and the renamed macro
    assert!(generated_objects(&db).is_empty());
    let real = db.object_names("main").unwrap();
    assert!(real.iter().any(|n| n.eq_ignore_ascii_case("Orders")));
    assert!(real.iter().any(|n| n.eq_ignore_ascii_case("orders_report")));
    let count = db.query("SELECT count(*) FROM Orders").unwrap();
    assert_eq!(count.value(0, 0), Some(&SqlValue::Int(3)));
}

#[test]
fn test_empty_fake_yields_empty_result_set() {
    let db = seeded_db();
    let mut ctx = context(&db);
    ctx.for_routine("orders_report")
        .unwrap()
        .mock_table("Orders", TableDefinitionOptions::default())
        .unwrap()
        .build()
        .unwrap();

    let result = ctx.execute_with_result(&[Parameter::input("min_id", 0)]).unwrap();
    assert_eq!(result.result_sets().len(), 1);
    assert_eq!(result.first_result_set().unwrap().row_count(), 0);

    ctx.cleanup();
    assert!(generated_objects(&db).is_empty());
    // Cleanup is idempotent; drop runs it again
    ctx.cleanup();
}

#[test]
fn test_unmocked_routine_reads_real_data() {
    let db = seeded_db();
    let mut ctx = context(&db);
    ctx.for_routine("orders_report").unwrap().build().unwrap();

    let result = ctx.execute_with_result(&[Parameter::input("min_id", 2)]).unwrap();
    let ids = result.map_rows(0, |row| row.get::<i64>("id")).unwrap();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_spy_is_rejected_on_duckdb() {
    let db = seeded_db();
    let mut ctx = context(&db);
    ctx.for_routine("orders_report")
        .unwrap()
        .mock_routine("orders_report", None)
        .unwrap();
    assert!(ctx.build().is_err());
    ctx.cleanup();
    assert!(generated_objects(&db).is_empty());
}
