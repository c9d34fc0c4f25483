use crate::frontend::diagnostics::{CompileError, ErrorKind};
use crate::frontend::symbols::Type;
use crate::frontend::{lexer, parser};

use super::AnalysisInfo;

fn analyze(source: &str) -> Result<AnalysisInfo, CompileError> {
    let tokens = lexer::lex(source)?;
    let module = parser::parse(&tokens)?;
    super::check(&module)
}

fn check_ok(source: &str) -> AnalysisInfo {
    match analyze(source) {
        Ok(info) => info,
        Err(error) => panic!("expected {:?} to check, got: {}", source, error.message),
    }
}

fn check_err(source: &str, expected: &str) {
    match analyze(source) {
        Ok(_) => panic!("expected {:?} to fail with: {}", source, expected),
        Err(error) => assert_eq!(error.message, expected),
    }
}

fn check_fails(source: &str) {
    assert!(
        analyze(source).is_err(),
        "expected {:?} to fail",
        source
    );
}

// ============================================================================
// Identifier resolution and scoping
// ============================================================================

#[test]
fn local_variable_resolves() {
    check_ok("func f() : Null { let a = 5; a; };");
}

#[test]
fn unknown_identifier_is_reported() {
    check_err("func f() : Null { a; };", "Identifier 'a' is not found");
}

#[test]
fn local_let_is_not_visible_to_its_own_initializer() {
    check_err(
        "func f() : Null { let a = a; };",
        "Identifier 'a' is not found",
    );
}

#[test]
fn local_let_shadows_module_binding() {
    check_ok("let a = 5; func f() : Null { let a = 5; };");
    check_ok("func f() : Null { let a = 5; }; let a = 5;");
}

#[test]
fn redeclaration_in_module_scope_is_reported() {
    check_err(
        "let a = 5; let a = 6;",
        "Identifier 'a' is already in symtab",
    );
}

#[test]
fn redeclaration_in_function_scope_is_reported() {
    check_err(
        "func f() : Null { let a = 5; let a = 6; };",
        "Identifier 'a' is already in symtab",
    );
}

#[test]
fn anonymous_blocks_open_fresh_scopes() {
    check_ok("{let a=5;}; {let a=5;};");
    check_ok("func f():Null{ {let a=5;}; {let a=5;}; };");
}

#[test]
fn block_local_is_not_visible_after_the_block() {
    check_err(
        "func f() : Null { {let a=5;}; a; };",
        "Identifier 'a' is not found",
    );
}

// ============================================================================
// Hoisting and forward references
// ============================================================================

#[test]
fn function_may_call_one_declared_later() {
    check_ok(
        r#"import io;
        func say_hello() : Null {
            let h = get_hello();
        };
        func get_hello() : String {
            return "Hello, World!\n";
        };
        "#,
    );
}

#[test]
fn class_may_be_used_before_its_definition() {
    check_ok("let a : A; class A { };");
}

#[test]
fn call_to_undeclared_function_is_reported() {
    check_err(
        "func say_hello() : Null { let h = get_hello(); };",
        "Identifier 'get_hello' is not found",
    );
}

#[test]
fn hoisted_let_with_call_initializer_has_no_type_until_reached() {
    // `a` is hoisted, but its type comes from `g()` and is unknown until
    // the resolution pass reaches the `let` itself.
    check_err(
        "func f() : Null { a; }; let a = g(); func g() : Integer64 { return 1; };",
        "Identifier 'a' is used before its type is known",
    );
    // Once the `let` has been passed, later functions see the type.
    check_ok("let a = g(); func g() : Integer64 { return 1; }; func f() : Null { a + 1; };");
}

#[test]
fn local_lets_are_not_hoisted_within_a_body() {
    check_err(
        "func f() : Null { a; let a = 5; };",
        "Identifier 'a' is not found",
    );
}

// ============================================================================
// Functions: signatures and arguments
// ============================================================================

#[test]
fn unknown_return_type_is_reported_before_the_body() {
    check_err(
        "func f() : R { let a = 5; return a + b; };",
        "Return type 'R' of function 'f' is not found",
    );
}

#[test]
fn unknown_parameter_type_is_reported() {
    check_err(
        "func f(a: A) : Null { };",
        "Identifier 'A' in type of argument 'a' in function 'f' is not found",
    );
}

#[test]
fn duplicate_parameter_is_reported() {
    check_err(
        "func f(a: Integer64, a: Integer64) : Null { };",
        "Identifier 'a' in argument list of function 'f' is already in symtab",
    );
}

#[test]
fn parameter_shadowing_the_function_name_is_reported() {
    check_err(
        "func f(f: Integer64) : Null { };",
        "Identifier 'f' in argument list of function 'f' is already in symtab",
    );
}

#[test]
fn sibling_functions_may_reuse_parameter_names() {
    check_ok("func f(a: Integer64) : Null { }; func g(a: Integer64) : Null { };");
}

#[test]
fn function_and_class_may_not_share_a_name() {
    check_err(
        "class A { }; func A() :Null {};",
        "Identifier 'A' is already in symtab",
    );
    check_err(
        "func C() :Null {}; class C { };",
        "Identifier 'C' is already in symtab",
    );
}

// ============================================================================
// Classes
// ============================================================================

#[test]
fn class_field_declares_into_the_member_scope() {
    check_ok("class A { let a = 5; };");
}

#[test]
fn class_member_names_are_unique() {
    check_err(
        "class A { let a = 5; let a = 5; };",
        "Identifier 'a' is already in symtab",
    );
    check_err(
        "class A { let a = 5; func a() : Null {}; };",
        "Identifier 'a' is already in symtab",
    );
}

#[test]
fn class_member_may_not_reuse_the_class_name() {
    check_err(
        "class A { let A: Integer64; };",
        "Identifier 'A' is already in symtab",
    );
    check_err(
        "class A { func A() :Null {}; };",
        "Identifier 'A' is already in symtab",
    );
}

#[test]
fn lowercase_class_name_is_rejected() {
    check_err(
        "class f {};",
        "Class name 'f' can not start with an lowercase letter",
    );
}

#[test]
fn method_body_sees_class_members() {
    check_ok("class A { let a = 5; func f() : Null { a; }; };");
}

#[test]
fn method_local_may_shadow_a_class_member() {
    check_ok("class A { let a = 5; func f() : Null { let a = 5; }; };");
}

#[test]
fn this_types_to_the_enclosing_class() {
    check_ok("class C { let i = 0; func f() : C { i = i + 1; return this; };};");
}

#[test]
fn this_outside_a_class_is_reported() {
    check_err(
        "func f() : Null { this; };",
        "Identifier 'this' is not found",
    );
}

#[test]
fn this_return_type_mismatch_is_reported() {
    check_err(
        "class C { func f() : Integer64 { return this; };};",
        "Return statement type 'C' does not match function return type 'Integer64'",
    );
}

// ============================================================================
// Member access
// ============================================================================

#[test]
fn member_of_class_typed_variable_resolves() {
    check_ok("class C { let i = 0; }; func f() : Null { let c: C; c.i;};");
}

#[test]
fn missing_member_reports_the_compound_path() {
    check_err(
        "class C { let i = 0; }; func f():Null{ let c: C; c.j;};",
        "Identifier 'c.j' is not found",
    );
}

#[test]
fn member_of_an_empty_class_reports_no_subsymbol() {
    check_err(
        "class A{}; func f():Null{let a:A; a.Integer64;};",
        "Identifier 'a' has no subsymbol 'Integer64'",
    );
}

#[test]
fn member_of_a_primitive_reports_no_subsymbol() {
    check_err(
        "func f():Null{let a = 5; a.b;};",
        "Identifier 'a' has no subsymbol 'b'",
    );
}

#[test]
fn member_lookup_does_not_walk_outer_scopes() {
    check_err(
        "let i = 0; class C { }; func f() : Null { let c: C; c.i; };",
        "Identifier 'c' has no subsymbol 'i'",
    );
}

// ============================================================================
// Modules and overloads
// ============================================================================

#[test]
fn hello_world_checks() {
    check_ok(r#"import io; func main() : Null { io.print("Hello world!\n"); };"#);
}

#[test]
fn unimported_module_is_reported() {
    check_err(
        "func f() : Null { io.foo.bar();\n };",
        "Identifier 'io' is not found",
    );
}

#[test]
fn unknown_module_is_reported() {
    check_err("import net;", "Imported module 'net' is not found");
}

#[test]
fn missing_module_member_is_reported() {
    check_err(
        "import io; func f() : Null { io.missing(); };",
        "Identifier 'io.missing' is not found",
    );
}

#[test]
fn print_accepts_each_overloaded_type() {
    check_ok("import io; func f() : Null { io.print(42); };");
    check_ok("import io; func f() : Null { io.print(true); };");
    check_ok(r#"import io; func f() : Null { io.print("s"); };"#);
}

#[test]
fn print_with_no_arguments_is_an_arity_error() {
    check_err(
        "import io; func f() : Null { io.print(); };",
        "Call to function 'io.print' has wrong number of arguments",
    );
}

#[test]
fn print_has_no_overload_for_class_types() {
    check_err(
        "import io; class C {}; func f() : Null { let c: C; io.print(c); };",
        "No matching overload of function 'io.print' for argument type 'C'",
    );
}

// ============================================================================
// Calls
// ============================================================================

#[test]
fn call_argument_type_mismatch_is_reported() {
    check_err(
        "func g(s: String): Null{ }; func f() : Null { g(42); };",
        "Argument 1 in call to function 'g' has type 'Integer64' which does not match definition type 'String'",
    );
}

#[test]
fn call_arity_mismatch_is_reported() {
    check_err(
        "func g(s: String): Null{ }; func f() : Null { g(); };",
        "Call to function 'g' has wrong number of arguments",
    );
}

#[test]
fn calling_a_variable_is_reported() {
    check_err(
        "func f() : Null { let a = 5; a(); };",
        "Called symbol 'a' is not a function",
    );
}

#[test]
fn call_result_feeds_the_surrounding_expression() {
    check_ok("func g() : Integer64 { return 1; }; func f() : Null { let a = g() + 1; };");
}

// ============================================================================
// Builtins
// ============================================================================

#[test]
fn boolean_builtins_check_and_type_to_boolean() {
    check_ok("func m() : Null { and(true, true); };");
    check_ok("func m() : Null { or(false, false); };");
    check_ok("func m() : Null { not(true); };");
    check_ok("func m() : Boolean { return and(true, not(false)); };");
}

#[test]
fn boolean_builtins_require_boolean_arguments() {
    check_err(
        "func m() : Null { and(1, true); };",
        "Argument 1 in call to function 'and' has type 'Integer64' which does not match definition type 'Boolean'",
    );
}

#[test]
fn overriding_a_builtin_is_reported() {
    check_err(
        "func m() : Null { and = or; };",
        "Overriding builtin 'and' is not allowed",
    );
    check_err(
        "func m() : Null { or = and; };",
        "Overriding builtin 'or' is not allowed",
    );
    check_err(
        "func m() : Null { not = not; };",
        "Overriding builtin 'not' is not allowed",
    );
}

#[test]
fn declaring_over_a_builtin_is_reported() {
    check_err("let and = 5;", "Identifier 'and' is already in symtab");
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn assignment_type_mismatch_is_reported() {
    check_err(
        r#"func f() : Null { let h : Integer64; h = "string"; };"#,
        "Left type 'Integer64' of assignment does not match the right type 'String'",
    );
}

#[test]
fn assignment_from_call_checks_the_return_type() {
    check_err(
        r#"
        func f() : Null {
            let h : Integer64;
            h = g();
        };
        func g() : String { return "s"; };
        "#,
        "Left type 'Integer64' of assignment does not match the right type 'String'",
    );
}

#[test]
fn assigning_over_an_imported_module_is_reported() {
    check_err(
        "import io; func m() : Null { io=io; };",
        "Overriding imported module 'io' is not allowed",
    );
    check_err(
        "import io; func m() : Null { io=5; };",
        "Left type 'Module' of assignment does not match the right type 'Integer64'",
    );
    check_err(
        r#"import io; func m() : Null { io="5"; };"#,
        "Left type 'Module' of assignment does not match the right type 'String'",
    );
}

#[test]
fn literals_are_not_assignable() {
    check_fails("func m() : Null { true = true; };");
    check_fails("func m() : Null { 5 = 6; };");
}

#[test]
fn functions_and_classes_are_not_assignable() {
    check_err(
        "class A {}; func f() : Null { A = A; };",
        "Left side of assignment is not assignable",
    );
}

// ============================================================================
// Initializers
// ============================================================================

#[test]
fn initializer_must_match_the_explicit_type() {
    check_err(
        r#"func f() : Null { let h : Integer64 = "string"; };"#,
        "Initializer type 'String' does not match explicit type 'Integer64'",
    );
    check_err(
        r#"
        func f() : Null {
            let h : Integer64 = g();
        };
        func g() : String { return "s"; };
        "#,
        "Initializer type 'String' does not match explicit type 'Integer64'",
    );
}

#[test]
fn unknown_explicit_type_is_reported() {
    check_err(
        "func f() : Null { let h : Missing = 5; };",
        "Type 'Missing' of variable 'h' is not found",
    );
}

#[test]
fn module_let_with_matching_initializer_checks() {
    check_ok("let a : Integer64 = 5;");
    check_err(
        r#"let a : Integer64 = "5";"#,
        "Initializer type 'String' does not match explicit type 'Integer64'",
    );
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn integer_arithmetic_checks() {
    check_ok("func f() : Null { let a = 5; let b = 10; let c = a + b; };");
    check_ok("func f() : Null { let a = 5; let b = 10; let c = a - b; };");
    check_ok("func f() : Null { let a = 5; let b = 10; let c = a * b; };");
    check_ok("func f() : Null { let a = 5; let b = 10; let c = a / b; };");
}

#[test]
fn string_concatenation_checks() {
    check_ok(r#"func f() : Null { let a = "5"; let b = "10"; let c = a + b; };"#);
}

#[test]
fn mixed_operand_types_are_reported() {
    check_err(
        r#"func f() : Null { let a = 5; let b = "10"; let c = a + b; };"#,
        "Operator '+' not defined for types 'Integer64' and 'String'",
    );
    check_err(
        r#"func f() : Null { let c = "5" - "10"; };"#,
        "Operator '-' not defined for types 'String' and 'String'",
    );
}

#[test]
fn comparisons_yield_boolean() {
    check_ok("func f() : Null { let a = 5; let b = a < 6; };");
    check_err(
        r#"func f() : Null { let c = "a" < "b"; };"#,
        "Operator '<' not defined for types 'String' and 'String'",
    );
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn if_and_while_require_boolean_tests() {
    check_ok("func f():Null{if(true) {};};");
    check_ok("func f():Null{if(false){} else {};};");
    check_ok("func f() : Null {while(true) {};};");
    check_err(
        "func f():Null{if(1) {};};",
        "If only accepts tests of type 'Boolean'",
    );
    check_err(
        "func f() : Null {while(1) {};};",
        "While only accepts tests of type 'Boolean'",
    );
    check_err(
        r#"func f() : Null {while("1") {};};"#,
        "While only accepts tests of type 'Boolean'",
    );
}

#[test]
fn loops_over_class_members_check() {
    check_ok("class A{ let i = 0; func f():Null { while(i<5) {i = i + 1;}; };};");
    check_ok("class A{ let i = 0; func f():Null { if(i<5) {i = i + 1;} else {}; }; };");
    check_ok("class A{ let i = 0; func f():Null { if(and(i>5, i<10)) {i = i + 1;} else {}; }; };");
}

// ============================================================================
// Returns
// ============================================================================

#[test]
fn return_type_must_match_the_signature() {
    check_ok("func f() : Integer64 { return 0; };");
    check_ok("func m() : Boolean { return true; };");
    check_ok(r#"func m() : String { return "s"; };"#);
    check_err(
        r#"func f() : Integer64 { return "0"; };"#,
        "Return statement type 'String' does not match function return type 'Integer64'",
    );
}

#[test]
fn non_null_function_must_return() {
    check_err(
        "func f() : Integer64 {};",
        "Function is missing return value",
    );
}

#[test]
fn return_in_both_branches_satisfies_the_check() {
    check_ok("func f(a: Boolean) : Integer64 { if(a) { return 1; } else { return 2; }; };");
    check_err(
        "func f(a: Boolean) : Integer64 { if(a) { return 1; }; };",
        "Function is missing return value",
    );
}

#[test]
fn a_loop_does_not_guarantee_a_return() {
    check_err(
        "func f() : Integer64 { while(true) { return 1; }; };",
        "Function is missing return value",
    );
}

#[test]
fn bare_return_types_as_null() {
    check_ok("func f() : Null { return; };");
    check_err(
        "func f() : Integer64 { return; };",
        "Return statement type 'Null' does not match function return type 'Integer64'",
    );
}

// ============================================================================
// Statement placement
// ============================================================================

#[test]
fn control_flow_is_rejected_outside_function_bodies() {
    check_fails("return a;");
    check_fails("while(true) {};");
    check_fails("if(true) {};");
    check_fails("class A{return a;};");
    check_fails("class A{ while(true) {}; };");
    check_fails("class A{if(true) {};};");
}

#[test]
fn assignment_and_operators_are_rejected_at_module_level() {
    check_fails("let a=5; {a=6;};");
    check_fails("let a=5; {a/6;};");
    check_fails("let a=5; {a*6;};");
    check_fails("let a=5; {a+6;};");
    check_fails("let a=5; {a-6;};");
    check_fails("let a=5; {a<6;};");
    check_fails("let a=5; {a<=6;};");
    check_fails("let a=5; {a>6;};");
    check_fails("let a=5; {a>=6;};");
}

#[test]
fn class_bodies_accept_only_declarations() {
    check_fails("let a=5; class A{a=6;};");
    check_fails("let a=5; class A{a+6;};");
    check_fails("let a=5; class A{a>=6;};");
    check_fails("class A{ {}; };");
}

#[test]
fn import_is_rejected_inside_a_function() {
    check_err(
        "func f() : Null { import io; };",
        "Statement 'import' is only allowed at module scope",
    );
}

#[test]
fn double_import_is_reported() {
    check_err(
        "import io; import io;",
        "Identifier 'io' is already in symtab",
    );
}

#[test]
fn analyzer_errors_are_semantic_not_syntax() {
    let error = analyze("x;").unwrap_err();
    assert_eq!(error.kind, ErrorKind::Semantic);
    let error = analyze("let;").unwrap_err();
    assert_eq!(error.kind, ErrorKind::Syntax);
}

// ============================================================================
// Recorded analysis info
// ============================================================================

#[test]
fn expression_types_are_recorded_by_span() {
    let source = "let a = 5;";
    let tokens = lexer::lex(source).unwrap();
    let module = parser::parse(&tokens).unwrap();
    let info = super::check(&module).unwrap();

    // The initializer literal `5` sits at bytes 8..9.
    let stmt = &module.node.stmts[0];
    let crate::frontend::ast::Stmt::Let(decl) = &stmt.node else {
        panic!("expected a let statement");
    };
    let init = decl.init.as_ref().unwrap();
    assert_eq!(info.expr_type(init.span), Some(&Type::Integer64));
}
