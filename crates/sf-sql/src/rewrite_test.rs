use super::*;

fn reference(input: &str) -> ObjectReference {
    ObjectReference::parse(input, "dbo").unwrap()
}

fn rewrite(script: &str, old: &str, new: &str) -> String {
    ScriptRewriter::new(Dialect::SqlServer).rewrite(script, &reference(old), &reference(new))
}

#[test]
fn test_replaces_qualified_forms() {
    assert_eq!(rewrite("SELECT * FROM dbo.Foo", "dbo.Foo", "dbo.Bar"), "SELECT * FROM [dbo].[Bar]");
    assert_eq!(rewrite("SELECT * FROM [dbo].[Foo]", "dbo.Foo", "dbo.Bar"), "SELECT * FROM [dbo].[Bar]");
    assert_eq!(rewrite("SELECT * FROM \"dbo\".\"Foo\"", "dbo.Foo", "dbo.Bar"), "SELECT * FROM [dbo].[Bar]");
    assert_eq!(rewrite("SELECT * FROM dbo.[Foo]", "dbo.Foo", "dbo.Bar"), "SELECT * FROM [dbo].[Bar]");
}

#[test]
fn test_replaces_bare_name_in_default_schema() {
    assert_eq!(rewrite("EXEC Foo @x = 1", "dbo.Foo", "dbo.Bar"), "EXEC [dbo].[Bar] @x = 1");
    assert_eq!(rewrite("EXEC [Foo]", "dbo.Foo", "dbo.Bar"), "EXEC [dbo].[Bar]");
}

#[test]
fn test_matching_is_case_insensitive() {
    assert_eq!(rewrite("select * from DBO.FOO", "dbo.Foo", "dbo.Bar"), "select * from [dbo].[Bar]");
    assert_eq!(rewrite("select * from foo", "dbo.Foo", "dbo.Bar"), "select * from [dbo].[Bar]");
}

#[test]
fn test_partial_tokens_untouched() {
    let script = "SELECT * FROM dbo.Foo2 JOIN MyFoo ON 1 = 1 JOIN [dbo].[Foobar] fb ON 1 = 1";
    assert_eq!(rewrite(script, "dbo.Foo", "dbo.Bar"), script);
}

#[test]
fn test_boundary_property_mixed_script() {
    let script = "dbo.Foo2 MyFoo [dbo].[Foobar] dbo.Foo [dbo].[Foo] Foo";
    assert_eq!(
        rewrite(script, "dbo.Foo", "dbo.Bar"),
        "dbo.Foo2 MyFoo [dbo].[Foobar] [dbo].[Bar] [dbo].[Bar] [dbo].[Bar]"
    );
}

#[test]
fn test_other_schema_not_matched_by_bare_name() {
    let script = "SELECT * FROM sales.Foo";
    assert_eq!(rewrite(script, "dbo.Foo", "dbo.Bar"), script);
    assert_eq!(rewrite("SELECT * FROM [sales].[Foo]", "dbo.Foo", "dbo.Bar"), "SELECT * FROM [sales].[Foo]");
}

#[test]
fn test_non_default_schema_requires_qualification() {
    let script = "SELECT * FROM Foo JOIN sales.Foo s ON 1 = 1";
    assert_eq!(
        rewrite(script, "sales.Foo", "dbo.Bar"),
        "SELECT * FROM Foo JOIN [dbo].[Bar] s ON 1 = 1"
    );
}

#[test]
fn test_variables_and_member_access_untouched() {
    let script = "DECLARE @Foo INT; SELECT Foo.Id, #Foo.x FROM x";
    assert_eq!(rewrite(script, "dbo.Foo", "dbo.Bar"), script);
}

#[test]
fn test_rewriting_twice_is_stable() {
    let once = rewrite("EXEC dbo.Foo; EXEC Foo;", "dbo.Foo", "dbo.TestProc_Foo_abc123");
    assert_eq!(once, "EXEC [dbo].[TestProc_Foo_abc123]; EXEC [dbo].[TestProc_Foo_abc123];");
    let twice = rewrite(&once, "dbo.Foo", "dbo.TestProc_Foo_abc123");
    assert_eq!(twice, once);
}

#[test]
fn test_self_reference_in_definition() {
    let script = "CREATE PROCEDURE dbo.GetOrders\nAS\nBEGIN\n    SELECT * FROM dbo.Orders;\nEND";
    assert_eq!(
        rewrite(script, "dbo.GetOrders", "dbo.TestProc_GetOrders_000001"),
        "CREATE PROCEDURE [dbo].[TestProc_GetOrders_000001]\nAS\nBEGIN\n    SELECT * FROM dbo.Orders;\nEND"
    );
}

#[test]
fn test_counts_replacements() {
    let rewriter = ScriptRewriter::new(Dialect::SqlServer);
    let (_, count) = rewriter.rewrite_counted(
        "Foo; dbo.Foo; [dbo].[Foo]; Foo2",
        &reference("Foo"),
        &reference("Bar"),
    );
    assert_eq!(count, 3);
}

#[test]
fn test_unicode_identifiers() {
    assert_eq!(
        rewrite("SELECT * FROM dbo.Заказы, dbo.Заказы2", "dbo.заказы", "dbo.Bar"),
        "SELECT * FROM [dbo].[Bar], dbo.Заказы2"
    );
}

#[test]
fn test_match_at_script_edges() {
    assert_eq!(rewrite("Foo", "dbo.Foo", "dbo.Bar"), "[dbo].[Bar]");
    assert_eq!(rewrite("", "dbo.Foo", "dbo.Bar"), "");
}

#[test]
fn test_duckdb_dialect_quotes_replacement() {
    let rewriter = ScriptRewriter::new(Dialect::DuckDb);
    let old = ObjectReference::parse("orders", "main").unwrap();
    let new = ObjectReference::parse("TestTable_orders_000001", "main").unwrap();
    assert_eq!(
        rewriter.rewrite("SELECT count(*) FROM orders o JOIN main.orders_archive a USING (id)", &old, &new),
        "SELECT count(*) FROM \"main\".\"TestTable_orders_000001\" o JOIN main.orders_archive a USING (id)"
    );
}

#[test]
fn test_custom_default_schema() {
    let rewriter = ScriptRewriter::new(Dialect::SqlServer).with_default_schema("app");
    let old = ObjectReference::parse("app.Foo", "app").unwrap();
    let new = ObjectReference::parse("app.Bar", "app").unwrap();
    assert_eq!(rewriter.rewrite("EXEC Foo", &old, &new), "EXEC [app].[Bar]");
    assert_eq!(rewriter.default_schema(), "app");

    let dbo_rewriter = ScriptRewriter::new(Dialect::SqlServer);
    assert_eq!(dbo_rewriter.rewrite("EXEC Foo", &old, &new), "EXEC Foo");
}
