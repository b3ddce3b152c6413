//! Statement text for the database collaborators.

use sf_core::{Dialect, ObjectKind, ObjectReference, Parameter, ParameterDirection, SqlValue};

/// Name of the implicit return-code slot on SQL Server invocations.
pub const RETURN_VALUE_PARAM: &str = "RETURN_VALUE";

/// `DROP <kind> IF EXISTS <name>`, or `None` when the dialect has no such
/// object kind.
pub fn drop_if_exists(dialect: Dialect, kind: ObjectKind, reference: &ObjectReference) -> Option<String> {
    dialect
        .drop_keyword(kind)
        .map(|keyword| format!("DROP {} IF EXISTS {}", keyword, reference.quoted(dialect)))
}

/// Invocation of a routine with named parameters.
///
/// SQL Server binds each parameter by name (`@p = @p`), marks
/// output-direction parameters with `OUTPUT`, and captures the status code
/// into `@RETURN_VALUE` when `with_return_code` is set. DuckDB routines are
/// table macros: input values are inlined as literals, in declaration
/// order, and there is no return code.
///
/// # Examples
/// ```
/// use sf_core::{Dialect, ObjectReference, Parameter};
/// use sf_sql::render::invocation;
///
/// let routine = ObjectReference::parse("dbo.Play", "dbo").unwrap();
/// let params = [Parameter::input("Board", "X--"), Parameter::output("Winner")];
/// assert_eq!(
///     invocation(Dialect::SqlServer, &routine, &params, true),
///     "EXEC @RETURN_VALUE = [dbo].[Play] @Board = @Board, @Winner = @Winner OUTPUT"
/// );
/// ```
pub fn invocation(
    dialect: Dialect,
    routine: &ObjectReference,
    params: &[Parameter],
    with_return_code: bool,
) -> String {
    match dialect {
        Dialect::SqlServer => {
            let mut sql = String::from("EXEC ");
            if with_return_code {
                sql.push_str(&format!("@{} = ", RETURN_VALUE_PARAM));
            }
            sql.push_str(&routine.quoted(dialect));
            let bindings: Vec<String> = params
                .iter()
                .map(|p| {
                    let mut binding = format!("@{0} = @{0}", p.name());
                    if p.direction() != ParameterDirection::Input {
                        binding.push_str(" OUTPUT");
                    }
                    binding
                })
                .collect();
            if !bindings.is_empty() {
                sql.push(' ');
                sql.push_str(&bindings.join(", "));
            }
            sql
        }
        Dialect::DuckDb => {
            let arguments: Vec<String> = params
                .iter()
                .filter(|p| p.direction().is_input())
                .map(|p| literal(p.value()))
                .collect();
            format!(
                "SELECT * FROM {}({})",
                routine.quoted(dialect),
                arguments.join(", ")
            )
        }
    }
}

/// SQL literal for a value.
///
/// # Examples
/// ```
/// use sf_core::SqlValue;
/// use sf_sql::render::literal;
/// assert_eq!(literal(&SqlValue::Text("O'Brien".into())), "'O''Brien'");
/// assert_eq!(literal(&SqlValue::Float(2.0)), "2.0");
/// assert_eq!(literal(&SqlValue::Null), "NULL");
/// ```
pub fn literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(true) => "TRUE".to_string(),
        SqlValue::Bool(false) => "FALSE".to_string(),
        SqlValue::Int(n) => n.to_string(),
        SqlValue::Float(x) => format!("{x:?}"),
        SqlValue::Decimal(d) => d.clone(),
        SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        SqlValue::Bytes(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("\\x{b:02X}")).collect();
            format!("'{hex}'::BLOB")
        }
    }
}

/// Parameterless invocation used as a setup statement.
pub fn setup_invocation(dialect: Dialect, routine: &ObjectReference) -> String {
    match dialect {
        Dialect::SqlServer => format!("EXEC {};", routine.quoted(dialect)),
        Dialect::DuckDb => format!("SELECT * FROM {}();", routine.quoted(dialect)),
    }
}

/// `SELECT *` from a table ordered by one column.
pub fn select_ordered(dialect: Dialect, table: &ObjectReference, order_column: &str) -> String {
    format!(
        "SELECT * FROM {} ORDER BY {}",
        table.quoted(dialect),
        dialect.quote_ident(order_column)
    )
}
