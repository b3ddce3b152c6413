//! Spy routine synthesis.
//!
//! A spy fake replaces a routine with one that records each call's
//! arguments into a log table and then runs optional custom SQL. The
//! pieces that depend on the routine's signature come from the metadata
//! provider as a [`FakeRoutineTemplate`].

use crate::error::{SqlError, SqlResult};
use minijinja::{context, Environment};
use sf_core::{Dialect, ObjectReference};

/// Identity column every spy log table starts with; log rows are read back
/// ordered by it.
pub const SPY_ID_COLUMN: &str = "_id_";

/// Signature-dependent fragments used to synthesize a spy routine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeRoutineTemplate {
    /// Parameter declarations for `CREATE PROCEDURE` (e.g. `@a INT, @b NVARCHAR(10) OUTPUT`)
    pub parameter_list: String,
    /// Column definitions of the log table, one per parameter
    pub logging_columns: String,
    /// Target column list for the log insert
    pub insert_column_list: String,
    /// Select expressions matching `insert_column_list`
    pub insert_select_list: String,
}

impl FakeRoutineTemplate {
    fn logs_arguments(&self) -> bool {
        !self.insert_column_list.trim().is_empty() && !self.insert_select_list.trim().is_empty()
    }
}

const LOG_TABLE_TEMPLATE: &str = "\
CREATE TABLE {{ log_table }}
(
    {{ id_column }} INT IDENTITY(1,1) PRIMARY KEY CLUSTERED
{%- if logging_columns %},
    {{ logging_columns }}
{%- endif %}
);";

const SPY_ROUTINE_TEMPLATE: &str = "\
CREATE PROCEDURE {{ routine }}
{%- if parameter_list %}
    {{ parameter_list }}
{%- endif %}
AS
BEGIN
    SET NOCOUNT ON;
{%- if logs_arguments %}
    INSERT INTO {{ log_table }} ({{ insert_column_list }})
    SELECT {{ insert_select_list }};
{%- else %}
    INSERT INTO {{ log_table }} DEFAULT VALUES;
{%- endif %}
{%- if custom_sql %}

{{ custom_sql }}
{%- endif %}
END;";

/// `CREATE TABLE` for the spy log table.
pub fn render_log_table(
    dialect: Dialect,
    log_table: &ObjectReference,
    template: &FakeRoutineTemplate,
) -> SqlResult<String> {
    require_sqlserver(dialect, "spy log table")?;
    let env = Environment::new();
    let sql = env.render_str(
        LOG_TABLE_TEMPLATE,
        context! {
            log_table => log_table.quoted(dialect),
            id_column => dialect.quote_ident(SPY_ID_COLUMN),
            logging_columns => template.logging_columns.trim(),
        },
    )?;
    Ok(sql)
}

/// `CREATE PROCEDURE` for a spy routine declared under `routine`.
///
/// The routine is declared under its original name; the build step renames
/// it like any other fake definition.
pub fn render_spy_routine(
    dialect: Dialect,
    routine: &ObjectReference,
    log_table: &ObjectReference,
    template: &FakeRoutineTemplate,
    custom_sql: Option<&str>,
) -> SqlResult<String> {
    require_sqlserver(dialect, "spy routine")?;
    let env = Environment::new();
    let sql = env.render_str(
        SPY_ROUTINE_TEMPLATE,
        context! {
            routine => routine.quoted(dialect),
            log_table => log_table.quoted(dialect),
            parameter_list => template.parameter_list.trim(),
            logs_arguments => template.logs_arguments(),
            insert_column_list => template.insert_column_list.trim(),
            insert_select_list => template.insert_select_list.trim(),
            custom_sql => custom_sql.map(str::trim).unwrap_or_default(),
        },
    )?;
    Ok(sql)
}

fn require_sqlserver(dialect: Dialect, what: &'static str) -> SqlResult<()> {
    match dialect {
        Dialect::SqlServer => Ok(()),
        Dialect::DuckDb => Err(SqlError::Unsupported { what, dialect }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> FakeRoutineTemplate {
        FakeRoutineTemplate {
            parameter_list: "@CategoryID INT, @Name NVARCHAR(50)".to_string(),
            logging_columns: "[CategoryID] INT NULL, [Name] NVARCHAR(50) NULL".to_string(),
            insert_column_list: "[CategoryID], [Name]".to_string(),
            insert_select_list: "@CategoryID, @Name".to_string(),
        }
    }

    fn reference(input: &str) -> ObjectReference {
        ObjectReference::parse(input, "dbo").unwrap()
    }

    #[test]
    fn test_log_table_starts_with_identity() {
        let sql = render_log_table(
            Dialect::SqlServer,
            &reference("TestTable_Gen_SpyProcedureLog_000001"),
            &template(),
        )
        .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE [dbo].[TestTable_Gen_SpyProcedureLog_000001]\n(\n    [_id_] INT IDENTITY(1,1) PRIMARY KEY CLUSTERED,\n    [CategoryID] INT NULL, [Name] NVARCHAR(50) NULL\n);"
        );
    }

    #[test]
    fn test_log_table_without_parameters() {
        let sql = render_log_table(
            Dialect::SqlServer,
            &reference("Log"),
            &FakeRoutineTemplate::default(),
        )
        .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE [dbo].[Log]\n(\n    [_id_] INT IDENTITY(1,1) PRIMARY KEY CLUSTERED\n);"
        );
    }

    #[test]
    fn test_spy_routine_logs_arguments() {
        let sql = render_spy_routine(
            Dialect::SqlServer,
            &reference("dbo.GenerateRandomData"),
            &reference("Log"),
            &template(),
            None,
        )
        .unwrap();
        assert!(sql.starts_with("CREATE PROCEDURE [dbo].[GenerateRandomData]\n    @CategoryID INT, @Name NVARCHAR(50)\nAS\nBEGIN"));
        assert!(sql.contains("INSERT INTO [dbo].[Log] ([CategoryID], [Name])\n    SELECT @CategoryID, @Name;"));
        assert!(sql.ends_with("END;"));
        assert!(!sql.contains("DEFAULT VALUES"));
    }

    #[test]
    fn test_spy_routine_without_parameters_inserts_defaults() {
        let sql = render_spy_routine(
            Dialect::SqlServer,
            &reference("Ping"),
            &reference("Log"),
            &FakeRoutineTemplate::default(),
            Some("SELECT 1 AS Pong;"),
        )
        .unwrap();
        assert!(sql.starts_with("CREATE PROCEDURE [dbo].[Ping]\nAS"));
        assert!(sql.contains("INSERT INTO [dbo].[Log] DEFAULT VALUES;"));
        assert!(sql.contains("\n\nSELECT 1 AS Pong;\nEND;"));
    }

    #[test]
    fn test_duckdb_is_unsupported() {
        let err = render_spy_routine(
            Dialect::DuckDb,
            &reference("Ping"),
            &reference("Log"),
            &FakeRoutineTemplate::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SqlError::Unsupported { .. }));
        assert!(err.to_string().contains("[R002]"));
    }
}
