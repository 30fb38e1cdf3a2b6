//! Scenario-style integration tests driving the public `Lox` API over
//! inline source strings, asserting on captured stdout and on the
//! diagnostics a `CollectingReporter` gathers.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use loxrs::error::{CollectingReporter, Reporter};
use loxrs::Lox;

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("interpreter only ever writes UTF-8")
    }
}

/// Runs `source` and returns (captured stdout, reporter). `reporter` lets
/// a test assert that a run was clean, or inspect diagnostic text.
fn run(source: &str) -> (String, CollectingReporter) {
    let buffer = SharedBuffer::default();
    let mut lox = Lox::new(Box::new(buffer.clone()));
    let reporter = CollectingReporter::default();
    lox.run(source, &reporter);
    (buffer.contents(), reporter)
}

fn lines(output: &str) -> Vec<&str> {
    output.lines().collect()
}

#[test]
fn arithmetic_precedence() {
    let (output, reporter) = run("print 1 + 2 * 3;");
    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(lines(&output), vec!["7"]);
}

#[test]
fn string_concatenation() {
    let (output, reporter) = run(r#"var a = "hi"; var b = " there"; print a + b;"#);
    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(lines(&output), vec!["hi there"]);
}

#[test]
fn block_scoping_shadows_then_restores() {
    let (output, reporter) = run("var a = 1; { var a = 2; print a; } print a;");
    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(lines(&output), vec!["2", "1"]);
}

#[test]
fn closures_share_captured_mutable_state() {
    let source = "fun make() { var i = 0; fun tick() { i = i + 1; print i; } return tick; } \
                  var t = make(); t(); t(); t();";
    let (output, reporter) = run(source);
    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(lines(&output), vec!["1", "2", "3"]);
}

#[test]
fn inheritance_and_super_call_chain() {
    let source = r#"
        class A { greet() { print "A"; } }
        class B < A { greet() { super.greet(); print "B"; } }
        B().greet();
    "#;
    let (output, reporter) = run(source);
    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(lines(&output), vec!["A", "B"]);
}

#[test]
fn for_loop_desugars_correctly() {
    let (output, reporter) = run("for (var i = 0; i < 3; i = i + 1) print i;");
    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(lines(&output), vec!["0", "1", "2"]);
}

#[test]
fn initializer_sets_fields_and_returns_the_instance() {
    let (output, reporter) = run("class P { init(x) { this.x = x; } } print P(7).x;");
    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(lines(&output), vec!["7"]);
}

#[test]
fn bare_return_from_init_still_yields_the_instance() {
    let source = r#"
        class P { init(x) { this.x = x; return; } }
        print P(9).x;
    "#;
    let (output, reporter) = run(source);
    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(lines(&output), vec!["9"]);
}

#[test]
fn or_short_circuits_and_skips_the_right_operand() {
    let source = r#"fun side() { print "evaluated"; return true; } print true or side();"#;
    let (output, reporter) = run(source);
    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(lines(&output), vec!["true"]);
}

#[test]
fn and_short_circuits_and_skips_the_right_operand() {
    let source = r#"fun side() { print "evaluated"; return true; } print false and side();"#;
    let (output, reporter) = run(source);
    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(lines(&output), vec!["false"]);
}

#[test]
fn equality_follows_the_nil_and_cross_type_rules() {
    let source = r#"
        print nil == nil;
        print nil == 0;
        print 0 == "0";
    "#;
    let (output, reporter) = run(source);
    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(lines(&output), vec!["true", "false", "false"]);
}

#[test]
fn reading_local_variable_in_its_own_initializer_is_a_resolve_error() {
    let (_output, reporter) = run("var a = 1; { var a = a; }");
    assert!(reporter.had_error());
    assert!(reporter
        .messages()
        .iter()
        .any(|m| m.contains("Cannot read local variable in its own initializer.")));
}

#[test]
fn top_level_return_is_a_resolve_error() {
    let (_output, reporter) = run("return 1;");
    assert!(reporter.had_error());
    assert!(reporter.messages().iter().any(|m| m.contains("Cannot return from top-level code.")));
}

#[test]
fn class_inheriting_from_itself_is_a_resolve_error() {
    let (_output, reporter) = run("class X < X {}");
    assert!(reporter.had_error());
    assert!(reporter.messages().iter().any(|m| m.contains("A class cannot inherit from itself.")));
}

#[test]
fn adding_a_number_and_a_string_is_a_runtime_error() {
    let (_output, reporter) = run(r#"print 1 + "a";"#);
    assert!(reporter.had_runtime_error());
    assert!(reporter.messages().iter().any(|m| m.contains("Operands must be")));
}

#[test]
fn unterminated_string_is_a_scan_error() {
    let (_output, reporter) = run("\"abc");
    assert!(reporter.had_error());
    assert!(reporter.messages().iter().any(|m| m.contains("Unterminated string.")));
}

#[test]
fn repl_mode_auto_prints_bare_expressions_but_not_assignments_or_calls() {
    let buffer = SharedBuffer::default();
    let mut lox = Lox::new(Box::new(buffer.clone()));
    lox.set_repl_mode(true);
    let reporter = CollectingReporter::default();

    lox.run("var a = 1;", &reporter);
    lox.run("a;", &reporter);
    lox.run("a = 2;", &reporter);
    lox.run("clock();", &reporter);

    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(lines(&buffer.contents()), vec!["1"]);
}
