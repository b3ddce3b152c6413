//! DuckDB database backend implementation
//!
//! DuckDB has no stored procedures, so routines map onto table macros and
//! functions onto scalar macros. Invocations pass input values as
//! literals, produce exactly one result set, have no return code, and
//! report every output-direction parameter as NULL.

use crate::error::{DbError, DbResult};
use crate::traits::{
    BufferedResults, Executor, InvocationOutputs, MetadataProvider, ResultStream,
    TableDefinitionOptions,
};
use duckdb::arrow::datatypes::DataType;
use duckdb::types::Value;
use duckdb::{Connection, Statement};
use sf_core::{
    Column, DatabaseConfig, Dialect, ObjectKind, ObjectReference, Parameter, SqlValue,
    TabularResult,
};
use sf_sql::{render, FakeRoutineTemplate};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const RESOLVE_SQL: &str = "\
SELECT schema_name, object_name FROM (
    SELECT database_name, schema_name, table_name AS object_name, internal FROM duckdb_tables()
    UNION ALL
    SELECT database_name, schema_name, view_name, internal FROM duckdb_views()
    UNION ALL
    SELECT database_name, schema_name, function_name, internal FROM duckdb_functions()
    WHERE function_type IN ('macro', 'table_macro')
)
WHERE database_name = current_database()
  AND NOT internal
  AND lower(schema_name) = lower(?)
  AND lower(object_name) = lower(?)
LIMIT 1";

const TABLE_SQL: &str = "\
SELECT sql FROM duckdb_tables()
WHERE database_name = current_database()
  AND lower(schema_name) = lower(?) AND lower(table_name) = lower(?)";

const VIEW_SQL: &str = "\
SELECT sql FROM duckdb_views()
WHERE database_name = current_database() AND NOT internal
  AND lower(schema_name) = lower(?) AND lower(view_name) = lower(?)";

const MACRO_SQL: &str = "\
SELECT function_type, parameters, macro_definition FROM duckdb_functions()
WHERE database_name = current_database()
  AND function_type IN ('macro', 'table_macro')
  AND lower(schema_name) = lower(?) AND lower(function_name) = lower(?)
LIMIT 1";

const COLUMNS_SQL: &str = "\
SELECT column_name, data_type, is_nullable, column_default FROM duckdb_columns()
WHERE database_name = current_database()
  AND lower(schema_name) = lower(?) AND lower(table_name) = lower(?)
ORDER BY column_index";

const CONSTRAINTS_SQL: &str = "\
SELECT constraint_type, constraint_text FROM duckdb_constraints()
WHERE database_name = current_database()
  AND lower(schema_name) = lower(?) AND lower(table_name) = lower(?)
  AND constraint_type IN ('PRIMARY KEY', 'UNIQUE', 'CHECK', 'FOREIGN KEY')
ORDER BY constraint_index";

const OBJECT_NAMES_SQL: &str = "\
SELECT DISTINCT object_name FROM (
    SELECT database_name, schema_name, table_name AS object_name, internal FROM duckdb_tables()
    UNION ALL
    SELECT database_name, schema_name, view_name, internal FROM duckdb_views()
    UNION ALL
    SELECT database_name, schema_name, function_name, internal FROM duckdb_functions()
    WHERE function_type IN ('macro', 'table_macro')
)
WHERE database_name = current_database()
  AND NOT internal
  AND lower(schema_name) = lower(?)
ORDER BY object_name";

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Open the database named by the `database` config section
    pub fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        Self::new(&config.path)
    }

    /// Names of every table, view and macro in `schema`, sorted.
    pub fn object_names(&self, schema: &str) -> DbResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(OBJECT_NAMES_SQL)?;
        let names = stmt
            .query_map(duckdb::params![schema], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// First column of the first row of a `(schema, name)` lookup.
    fn lookup_text(&self, sql: &str, reference: &ObjectReference) -> DbResult<Option<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut values = stmt
            .query_map(duckdb::params![reference.schema(), reference.name()], |row| {
                row.get::<_, Option<String>>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(if values.is_empty() {
            None
        } else {
            values.swap_remove(0)
        })
    }

    fn macro_definition(&self, reference: &ObjectReference) -> DbResult<Option<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(MACRO_SQL)?;
        let rows = stmt
            .query_map(duckdb::params![reference.schema(), reference.name()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Value>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let Some((function_type, parameters, Some(body))) = rows.into_iter().next() else {
            return Ok(None);
        };
        let parameters = match parameters {
            Value::List(items) => items
                .into_iter()
                .map(|item| to_sql_value(item).to_string())
                .collect::<Vec<_>>()
                .join(", "),
            _ => String::new(),
        };
        let table = if function_type == "table_macro" { "TABLE " } else { "" };
        Ok(Some(format!(
            "CREATE MACRO {}({}) AS {}{};",
            reference.quoted(Dialect::DuckDb),
            parameters,
            table,
            body
        )))
    }
}

impl MetadataProvider for DuckDbBackend {
    fn resolve_canonical_name(&self, reference: &ObjectReference) -> DbResult<Option<ObjectReference>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(RESOLVE_SQL)?;
        let rows = stmt
            .query_map(duckdb::params![reference.schema(), reference.name()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        match rows.into_iter().next() {
            Some((schema, name)) => Ok(Some(ObjectReference::new(schema, name)?)),
            None => Ok(None),
        }
    }

    fn get_definition(&self, reference: &ObjectReference) -> DbResult<Option<String>> {
        if let Some(sql) = self.lookup_text(TABLE_SQL, reference)? {
            return Ok(Some(sql));
        }
        if let Some(sql) = self.lookup_text(VIEW_SQL, reference)? {
            return Ok(Some(sql));
        }
        self.macro_definition(reference)
    }

    fn get_table_definition(
        &self,
        reference: &ObjectReference,
        options: &TableDefinitionOptions,
    ) -> DbResult<Option<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(COLUMNS_SQL)?;
        let columns = stmt
            .query_map(duckdb::params![reference.schema(), reference.name()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        if columns.is_empty() {
            return Ok(None);
        }

        let mut lines: Vec<String> = columns
            .into_iter()
            .map(|(name, data_type, nullable, default)| {
                let mut line = format!("{} {}", Dialect::DuckDb.quote_ident(&name), data_type);
                if options.include_not_null && !nullable {
                    line.push_str(" NOT NULL");
                }
                if let Some(default) = default.filter(|_| options.include_defaults) {
                    line.push_str(" DEFAULT ");
                    line.push_str(&default);
                }
                line
            })
            .collect();

        let mut stmt = conn.prepare(CONSTRAINTS_SQL)?;
        let constraints = stmt
            .query_map(duckdb::params![reference.schema(), reference.name()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (constraint_type, text) in constraints {
            let wanted = match constraint_type.as_str() {
                "PRIMARY KEY" => options.include_primary_key,
                "UNIQUE" => options.include_unique_constraints,
                "CHECK" => options.include_check_constraints,
                "FOREIGN KEY" => options.include_foreign_keys,
                _ => false,
            };
            if wanted {
                lines.push(text);
            }
        }

        if options.include_computed_columns || options.include_identity {
            log::debug!("DuckDB tables have no computed or identity columns to copy");
        }

        Ok(Some(format!(
            "CREATE TABLE {} (\n    {}\n);",
            reference.quoted(Dialect::DuckDb),
            lines.join(",\n    ")
        )))
    }

    fn get_fake_routine_template(&self, _reference: &ObjectReference) -> DbResult<Option<FakeRoutineTemplate>> {
        Err(DbError::NotSupported {
            backend: self.db_type().to_string(),
            feature: "spy routines (table macros cannot write to a log table)".to_string(),
        })
    }
}

impl Executor for DuckDbBackend {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn create_object(&self, script: &str) -> DbResult<()> {
        log::debug!("Creating object: {}", script);
        let conn = self.lock()?;
        conn.execute_batch(script)
            .map_err(|e| DbError::ExecutionError(format!("{e}: {script}")))
    }

    fn drop_object_if_exists(&self, kind: ObjectKind, reference: &ObjectReference) -> DbResult<()> {
        let Some(sql) = render::drop_if_exists(Dialect::DuckDb, kind, reference) else {
            log::debug!("DuckDB has no {} objects; skipping drop of {}", kind, reference);
            return Ok(());
        };
        let conn = self.lock()?;
        conn.execute_batch(&sql)
            .map_err(|e| DbError::ExecutionError(format!("{e}: {sql}")))
    }

    fn invoke(
        &self,
        routine: &ObjectReference,
        params: &[Parameter],
        with_return_code: bool,
    ) -> DbResult<Box<dyn ResultStream>> {
        let sql = render::invocation(Dialect::DuckDb, routine, params, with_return_code);
        log::debug!("Invoking: {}", sql);
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let table = collect_table(&mut stmt)?;

        let outputs = InvocationOutputs {
            return_code: None,
            output_values: params
                .iter()
                .filter(|p| p.direction().is_output())
                .map(|p| (p.name().to_string(), SqlValue::Null))
                .collect(),
        };
        Ok(Box::new(BufferedResults::new(vec![table], outputs)))
    }

    fn run_statement(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{e}: {sql}")))
    }

    fn query(&self, sql: &str) -> DbResult<TabularResult> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        collect_table(&mut stmt)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// Execute a prepared statement and collect its rows.
///
/// Column metadata is read after the rows, once the statement has run.
fn collect_table(stmt: &mut Statement<'_>) -> DbResult<TabularResult> {
    let rows: Vec<Vec<SqlValue>> = stmt
        .query_map([], |row| {
            let col_count = row.as_ref().column_count();
            (0..col_count)
                .map(|i| row.get::<_, Value>(i).map(to_sql_value))
                .collect::<duckdb::Result<Vec<SqlValue>>>()
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let columns = (0..stmt.column_count())
        .map(|i| {
            Column::new(
                stmt.column_name(i)
                    .map_or("?".to_string(), |v| v.to_string()),
                sql_type_name(&stmt.column_type(i)),
            )
        })
        .collect();

    Ok(TabularResult::from_rows(columns, rows)?)
}

/// DuckDB type name for an Arrow result column type
fn sql_type_name(data_type: &DataType) -> String {
    match data_type {
        DataType::Null => "NULL".to_string(),
        DataType::Boolean => "BOOLEAN".to_string(),
        DataType::Int8 => "TINYINT".to_string(),
        DataType::Int16 => "SMALLINT".to_string(),
        DataType::Int32 => "INTEGER".to_string(),
        DataType::Int64 => "BIGINT".to_string(),
        DataType::UInt8 => "UTINYINT".to_string(),
        DataType::UInt16 => "USMALLINT".to_string(),
        DataType::UInt32 => "UINTEGER".to_string(),
        DataType::UInt64 => "UBIGINT".to_string(),
        DataType::Float16 | DataType::Float32 => "FLOAT".to_string(),
        DataType::Float64 => "DOUBLE".to_string(),
        DataType::Decimal128(38, 0) => "HUGEINT".to_string(),
        DataType::Decimal128(p, s) | DataType::Decimal256(p, s) => format!("DECIMAL({p},{s})"),
        DataType::Utf8 | DataType::LargeUtf8 => "VARCHAR".to_string(),
        DataType::Binary | DataType::LargeBinary | DataType::FixedSizeBinary(_) => {
            "BLOB".to_string()
        }
        DataType::Date32 | DataType::Date64 => "DATE".to_string(),
        DataType::Time32(_) | DataType::Time64(_) => "TIME".to_string(),
        DataType::Timestamp(_, _) => "TIMESTAMP".to_string(),
        DataType::Interval(_) => "INTERVAL".to_string(),
        other => other.to_string(),
    }
}

fn to_sql_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Bool(b),
        Value::TinyInt(n) => SqlValue::Int(n.into()),
        Value::SmallInt(n) => SqlValue::Int(n.into()),
        Value::Int(n) => SqlValue::Int(n.into()),
        Value::BigInt(n) => SqlValue::Int(n),
        Value::UTinyInt(n) => SqlValue::Int(n.into()),
        Value::USmallInt(n) => SqlValue::Int(n.into()),
        Value::UInt(n) => SqlValue::Int(n.into()),
        Value::UBigInt(n) => i64::try_from(n).map_or_else(|_| SqlValue::Decimal(n.to_string()), SqlValue::Int),
        Value::HugeInt(n) => i64::try_from(n).map_or_else(|_| SqlValue::Decimal(n.to_string()), SqlValue::Int),
        Value::Float(x) => SqlValue::Float(x.into()),
        Value::Double(x) => SqlValue::Float(x),
        Value::Decimal(d) => SqlValue::Decimal(d.to_string()),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Bytes(b),
        other => SqlValue::Text(format!("{other:?}")),
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
