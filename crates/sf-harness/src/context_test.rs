use super::*;
use sf_core::{SqlValue, TabularResult};
use sf_db::{MemoryBackend, ScriptedInvocation, TableDefinitionOptions};
use sf_sql::FakeRoutineTemplate;

const PLAY_GAME: &str = "CREATE PROCEDURE [dbo].[PlayGame] @Board NVARCHAR(9), @Winner CHAR(1) OUTPUT
AS
BEGIN
    SET @Winner = dbo.GetWinner(@Board);
    SELECT * FROM Moves;
    EXEC dbo.LogMove @Board;
END";

fn template() -> FakeRoutineTemplate {
    FakeRoutineTemplate {
        parameter_list: "@Board NVARCHAR(9)".to_string(),
        logging_columns: "[Board] NVARCHAR(9) NULL".to_string(),
        insert_column_list: "[Board]".to_string(),
        insert_select_list: "@Board".to_string(),
    }
}

fn catalog() -> Arc<MemoryBackend> {
    Arc::new(
        MemoryBackend::new(Dialect::SqlServer)
            .with_object("dbo.PlayGame", PLAY_GAME)
            .with_object(
                "dbo.GetWinner",
                "CREATE FUNCTION dbo.GetWinner(@b NVARCHAR(9)) RETURNS CHAR(1) AS BEGIN RETURN NULL END",
            )
            .with_object("dbo.Moves", "CREATE TABLE [dbo].[Moves] ([Cell] INT, [Mark] CHAR(1))")
            .with_object("dbo.Seed", "CREATE PROCEDURE dbo.Seed AS SELECT 1")
            .with_routine_template(
                "dbo.LogMove",
                "CREATE PROCEDURE dbo.LogMove @Board NVARCHAR(9) AS RETURN 0",
                template(),
            ),
    )
}

fn context(db: &Arc<MemoryBackend>) -> TestContext {
    TestContext::new(db.clone()).with_name_generator(NameGenerator::sequential())
}

const FAKE_WINNER: &str = "CREATE FUNCTION dbo.GetWinner(@b NVARCHAR(9)) RETURNS CHAR(1) AS BEGIN RETURN 'X' END";

fn built(db: &Arc<MemoryBackend>) -> TestContext {
    let mut ctx = context(db);
    ctx.for_routine("PlayGame")
        .unwrap()
        .mock_function("GetWinner", FAKE_WINNER)
        .unwrap()
        .mock_table("Moves", TableDefinitionOptions::default())
        .unwrap()
        .mock_routine("dbo.LogMove", None)
        .unwrap()
        .build()
        .unwrap();
    ctx
}

#[test]
fn test_build_redirects_every_reference() {
    let db = catalog();
    let ctx = built(&db);
    assert_eq!(ctx.state(), ContextState::Built);

    let func = ctx.fake_name(ObjectKind::Function, "GetWinner").unwrap().to_string();
    let table = ctx.fake_name(ObjectKind::Table, "[dbo].[Moves]").unwrap().to_string();
    let spy = ctx.fake_name(ObjectKind::Routine, "LogMove").unwrap().to_string();
    let tested = ctx.tested_routine_name().unwrap().to_string();
    assert!(func.starts_with("TestFunc_GetWinner_"));
    assert!(table.starts_with("TestTable_Moves_"));
    assert!(spy.starts_with("TestProc_LogMove_"));
    assert!(tested.starts_with("TestProc_PlayGame_"));

    let scripts = db.created_scripts();
    assert_eq!(scripts.len(), 5, "{scripts:#?}");
    let routine = scripts.last().unwrap();
    assert!(routine.starts_with(&format!("CREATE PROCEDURE [dbo].[{tested}]")), "{routine}");
    assert!(routine.contains(&format!("[dbo].[{func}](@Board)")), "{routine}");
    assert!(routine.contains(&format!("FROM [dbo].[{table}];")), "{routine}");
    assert!(routine.contains(&format!("EXEC [dbo].[{spy}] @Board")), "{routine}");
    assert!(!routine.contains("PlayGame]"), "{routine}");
}

#[test]
fn test_fakes_declare_themselves_under_generated_names() {
    let db = catalog();
    let ctx = built(&db);
    let scripts = db.created_scripts();

    let func = ctx.fake_name(ObjectKind::Function, "GetWinner").unwrap();
    assert!(scripts[0].starts_with(&format!("CREATE FUNCTION [dbo].[{func}](@b")), "{}", scripts[0]);
    assert!(scripts[0].contains("RETURN 'X'"));

    let table = ctx.fake_name(ObjectKind::Table, "Moves").unwrap();
    assert_eq!(
        scripts[1],
        format!("CREATE TABLE [dbo].[{table}] ([Cell] INT, [Mark] CHAR(1))")
    );

    // Spy log table comes before the spy routine that writes to it
    let log = ctx.fakes()[2].spy_log.as_ref().unwrap();
    assert!(log.table.name().starts_with("TestTable_LogMove_SpyProcedureLog_"));
    assert!(scripts[2].starts_with(&format!("CREATE TABLE [dbo].[{}]", log.table.name())));
    let spy = ctx.fake_name(ObjectKind::Routine, "LogMove").unwrap();
    assert!(scripts[3].starts_with(&format!("CREATE PROCEDURE [dbo].[{spy}]")), "{}", scripts[3]);
    assert!(scripts[3].contains(&format!("INSERT INTO [dbo].[{}]", log.table.name())));
}

#[test]
fn test_last_registration_wins() {
    let db = catalog();
    let mut ctx = context(&db);
    ctx.for_routine("PlayGame")
        .unwrap()
        .mock_function("GetWinner", "CREATE FUNCTION dbo.GetWinner() RETURNS INT AS BEGIN RETURN 1 END")
        .unwrap()
        .mock_function("[dbo].[getwinner]", FAKE_WINNER)
        .unwrap()
        .build()
        .unwrap();

    assert!(ctx.fakes()[0].generated.is_none());
    assert!(ctx.fakes()[0].rewritten_definition.is_none());
    let survivor = ctx.fakes()[1].generated.as_ref().unwrap().name().to_string();

    // Lookup by either spelling finds the survivor
    assert_eq!(ctx.fake_name(ObjectKind::Function, "GetWinner").unwrap(), survivor);
    assert_eq!(ctx.fake_name(ObjectKind::Function, "dbo.GetWinner").unwrap(), survivor);

    let scripts = db.created_scripts();
    assert_eq!(scripts.len(), 2);
    assert!(scripts[0].contains("RETURN 'X'"));
    assert!(scripts[1].contains(&format!("[dbo].[{survivor}]")));
}

#[test]
fn test_build_state_errors() {
    let db = catalog();
    let mut ctx = context(&db);
    assert!(matches!(ctx.build(), Err(HarnessError::InvalidState(_))));

    let mut ctx = context(&db);
    ctx.for_routine("PlayGame").unwrap().build().unwrap();
    assert!(matches!(ctx.build(), Err(HarnessError::InvalidState(_))));
    assert!(matches!(
        ctx.mock_view("v", "CREATE VIEW v AS SELECT 1"),
        Err(HarnessError::InvalidState(_))
    ));
    assert!(matches!(ctx.for_routine("Other"), Err(HarnessError::InvalidState(_))));
}

#[test]
fn test_build_not_found() {
    let db = catalog();
    let mut ctx = context(&db);
    ctx.for_routine("Missing").unwrap();
    let err = ctx.build().unwrap_err();
    assert!(matches!(err, HarnessError::NotFound { kind: "Routine", ref name } if name == "Missing"));
    assert!(db.created_scripts().is_empty());
    // A failed build still counts as the one allowed build
    assert!(matches!(ctx.build(), Err(HarnessError::InvalidState(_))));

    let mut ctx = context(&db);
    ctx.for_routine("PlayGame")
        .unwrap()
        .mock_view("NoSuchView", "CREATE VIEW NoSuchView AS SELECT 1")
        .unwrap();
    let err = ctx.build().unwrap_err();
    assert!(matches!(err, HarnessError::NotFound { kind: "View", .. }));
    assert!(err.to_string().contains("NoSuchView"));
    assert!(db.created_scripts().is_empty());
}

#[test]
fn test_registration_validates_without_io() {
    let db = catalog();
    let mut ctx = context(&db);
    assert!(matches!(ctx.for_routine("  "), Err(HarnessError::InvalidArgument(_))));
    assert!(matches!(ctx.for_routine("a.b.c"), Err(HarnessError::Core(_))));
    assert!(matches!(ctx.mock_function("f", ""), Err(HarnessError::InvalidArgument(_))));
    assert!(matches!(ctx.setup_sql(""), Err(HarnessError::InvalidArgument(_))));

    ctx.mock_view("NoSuchView", "CREATE VIEW NoSuchView AS SELECT 1")
        .unwrap()
        .setup_routine("NoSuchRoutine")
        .unwrap();
    assert!(db.created_scripts().is_empty());
    assert!(db.statements().is_empty());
}

#[test]
fn test_setup_runs_before_every_invocation() {
    let db = catalog();
    let mut ctx = built(&db);
    ctx.setup_sql("DELETE FROM Moves").unwrap().setup_routine("seed").unwrap();

    ctx.execute(&[Parameter::input("Board", "X--")]).unwrap();
    ctx.execute_with_result(&[Parameter::input("Board", "X--")]).unwrap();

    assert_eq!(
        db.statements(),
        vec!["DELETE FROM Moves", "EXEC [dbo].[Seed];", "DELETE FROM Moves", "EXEC [dbo].[Seed];"]
    );
    let calls = db.invocations();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].routine.name(), ctx.tested_routine_name().unwrap());
    assert!(!calls[0].with_return_code);
    assert!(calls[1].with_return_code);
}

#[test]
fn test_execute_with_result_captures_everything() {
    let db = catalog();
    let ctx = built(&db);
    let board = TabularResult::from_names(&["Cell"], vec![vec![SqlValue::Int(1)]]).unwrap();
    db.script_invocation(ScriptedInvocation {
        result_sets: vec![board.clone(), TabularResult::default()],
        return_code: Some(5),
        output_values: vec![("Winner".to_string(), SqlValue::from("X"))],
    });

    let result = ctx
        .execute_with_result(&[Parameter::input("Board", "X--"), Parameter::output("@Winner")])
        .unwrap();
    assert_eq!(result.return_code(), Some(5));
    assert_eq!(result.result_sets().len(), 2);
    assert_eq!(result.result_set(0).unwrap(), &board);
    assert!(result.result_set(1).unwrap().is_empty());
    assert_eq!(result.output_parameter::<String>("Winner").unwrap(), "X");
}

#[test]
fn test_zero_result_sets_and_unset_outputs() {
    let db = catalog();
    let ctx = built(&db);
    let result = ctx
        .execute_with_result(&[Parameter::output("Winner")])
        .unwrap();
    assert!(result.result_sets().is_empty());
    assert!(result.first_result_set().is_none());
    assert_eq!(result.return_code(), Some(0));
    assert_eq!(result.output_parameter::<String>("Winner").unwrap(), "");
}

#[test]
fn test_execute_requires_build() {
    let db = catalog();
    let mut ctx = context(&db);
    ctx.for_routine("PlayGame").unwrap();
    assert!(matches!(ctx.execute(&[]), Err(HarnessError::InvalidState(_))));
    assert!(matches!(ctx.execute_with_result(&[]), Err(HarnessError::InvalidState(_))));
    assert!(matches!(ctx.tested_routine_name(), Err(HarnessError::InvalidState(_))));
    assert!(matches!(
        ctx.fake_name(ObjectKind::Table, "Moves"),
        Err(HarnessError::InvalidState(_))
    ));
    assert!(db.invocations().is_empty());
}

#[test]
fn test_fake_name_unknown() {
    let db = catalog();
    let ctx = built(&db);
    assert!(matches!(
        ctx.fake_name(ObjectKind::View, "Moves"),
        Err(HarnessError::NotFound { kind: "View", .. })
    ));
}

#[test]
fn test_spy_log_query() {
    let db = catalog();
    let ctx = built(&db);
    let log_table = ctx.fakes()[2].spy_log.as_ref().unwrap().table.clone();
    let logged = TabularResult::from_names(
        &["_id_", "Board"],
        vec![vec![SqlValue::Int(1), SqlValue::from("X--")]],
    )
    .unwrap();
    db.script_query(
        &format!("SELECT * FROM [dbo].[{}] ORDER BY [_id_]", log_table.name()),
        logged.clone(),
    );

    assert_eq!(ctx.spy_log("LogMove").unwrap(), logged);
    assert!(matches!(ctx.spy_log("GetWinner"), Err(HarnessError::NotFound { .. })));
}

#[test]
fn test_mock_table_passes_options() {
    let db = catalog();
    let mut ctx = context(&db);
    ctx.for_routine("PlayGame")
        .unwrap()
        .mock_table("Moves", TableDefinitionOptions::maximum())
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(db.table_options(), vec![TableDefinitionOptions::maximum()]);
}

#[test]
fn test_cleanup_drops_everything_once() {
    let db = catalog();
    let mut ctx = built(&db);
    assert_eq!(db.live_objects().len(), 5);

    ctx.cleanup();
    assert!(db.live_objects().is_empty());
    assert_eq!(db.dropped().len(), 5);
    // Routine under test goes first
    assert_eq!(db.dropped()[0].0, ObjectKind::Routine);
    assert!(db.dropped()[0].1.name().starts_with("TestProc_PlayGame_"));

    ctx.cleanup();
    drop(ctx);
    assert_eq!(db.dropped().len(), 5);
}

#[test]
fn test_cleanup_continues_past_failures() {
    let db = catalog();
    let mut ctx = built(&db);
    let table = ctx.fake_name(ObjectKind::Table, "Moves").unwrap().to_string();
    db.fail_drop(&table);

    ctx.cleanup();
    let live = db.live_objects();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].name(), table);
    assert_eq!(db.dropped().len(), 4);
}

#[test]
fn test_drop_cleans_up() {
    let db = catalog();
    {
        let ctx = built(&db);
        assert_eq!(ctx.state(), ContextState::Built);
        assert!(!db.live_objects().is_empty());
    }
    assert!(db.live_objects().is_empty());
}

#[test]
fn test_failed_build_is_cleaned_up() {
    let db = catalog();
    db.fail_create_containing("CREATE TABLE");
    {
        let mut ctx = context(&db);
        ctx.for_routine("PlayGame")
            .unwrap()
            .mock_function("GetWinner", FAKE_WINNER)
            .unwrap()
            .mock_table("Moves", TableDefinitionOptions::default())
            .unwrap();
        assert!(matches!(ctx.build(), Err(HarnessError::Db(_))));
        assert_eq!(ctx.state(), ContextState::Unbuilt);
        assert_eq!(db.live_objects().len(), 1);
    }
    assert!(db.live_objects().is_empty());
}

#[test]
fn test_spy_unsupported_on_duckdb() {
    let db = Arc::new(
        MemoryBackend::new(Dialect::DuckDb)
            .with_object("play", "CREATE MACRO play(b) AS TABLE SELECT b")
            .with_routine_template("log_move", "CREATE MACRO log_move(b) AS TABLE SELECT b", template()),
    );
    let mut ctx = TestContext::new(db.clone());
    ctx.for_routine("play").unwrap().mock_routine("log_move", None).unwrap();
    assert!(matches!(ctx.build(), Err(HarnessError::Sql(_))));
}

#[test]
fn test_with_config() {
    let db = catalog();
    let mut config = Config::default();
    config.naming.seed = Some(7);

    let mut first = TestContext::with_config(db.clone(), &config).unwrap();
    first.for_routine("PlayGame").unwrap().build().unwrap();
    let mut second = TestContext::with_config(db.clone(), &config).unwrap();
    second.for_routine("PlayGame").unwrap().build().unwrap();
    assert_eq!(
        first.tested_routine_name().unwrap(),
        second.tested_routine_name().unwrap()
    );

    config.dialect = Dialect::DuckDb;
    assert!(matches!(
        TestContext::with_config(db.clone(), &config),
        Err(HarnessError::InvalidArgument(_))
    ));
}

#[test]
fn test_pass_through_queries() {
    let db = catalog();
    let ctx = context(&db);
    let table = TabularResult::from_names(&["n"], vec![vec![SqlValue::Int(3)]]).unwrap();
    db.script_query("SELECT COUNT(*) AS n FROM Moves", table.clone());
    assert_eq!(ctx.query("SELECT COUNT(*) AS n FROM Moves").unwrap(), table);
    assert_eq!(ctx.execute_non_query("UPDATE Moves SET Mark = 'O'").unwrap(), 0);
    assert!(matches!(ctx.query(" "), Err(HarnessError::InvalidArgument(_))));
}
