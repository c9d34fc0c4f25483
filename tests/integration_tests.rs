//! Integration tests for the Vesna compiler façade

use vesna::compile;

#[test]
fn hello_world_compiles() {
    let result = compile(r#"import io; func main() : Null { io.print("Hello world!\n"); };"#);
    assert!(result.is_ok(), "diagnostic: {:?}", result.diagnostic());
    assert!(result.root().is_some());
    assert!(result.info().is_some());
    assert!(result.diagnostic().is_none());
}

#[test]
fn first_exposes_the_leading_statement() {
    let result = compile("import io; let a = 5;");
    assert_eq!(result.first().unwrap().node.to_string(), "Import(io)");
}

#[test]
fn semantic_failure_yields_a_positioned_diagnostic_and_no_tree() {
    let result = compile("x;");
    assert!(result.root().is_none());
    assert!(result.first().is_none());
    assert!(result.info().is_none());
    assert_eq!(
        result.diagnostic(),
        Some("Error at 1:1: Identifier 'x' is not found\n")
    );
}

#[test]
fn syntax_failure_yields_a_diagnostic_and_no_tree() {
    let result = compile("let;");
    assert!(result.root().is_none());
    let diagnostic = result.diagnostic().unwrap();
    assert!(
        diagnostic.starts_with("Error at 1:"),
        "unexpected diagnostic: {}",
        diagnostic
    );
    assert!(diagnostic.ends_with('\n'));
}

#[test]
fn diagnostic_positions_count_lines() {
    let result = compile("let a = 5;\nlet a = 6;\n");
    assert_eq!(
        result.diagnostic(),
        Some("Error at 2:5: Identifier 'a' is already in symtab\n")
    );
}

#[test]
fn consecutive_compiles_do_not_share_state() {
    assert!(compile("import io;").is_ok());
    // Still only one `io` binding per compile.
    assert!(compile("import io;").is_ok());
    assert!(!compile("import io; import io;").is_ok());
}

#[test]
fn tree_rendering_is_deterministic() {
    let source = "class C { let i = 0; }; func f() : Null { let c: C; c.i; };";
    let first = compile(source).root().map(|r| r.node.to_string());
    let second = compile(source).root().map(|r| r.node.to_string());
    assert_eq!(first, second);
    assert!(first.is_some());
}
