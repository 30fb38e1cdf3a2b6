use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::error::{Diagnostic, Reporter};
use crate::token::Token;

/// Whether a name's declaration has finished being defined yet. Lets the
/// resolver catch `var a = a;`: while resolving the initializer, `a` is
/// `Declared` but not `Defined`.
#[derive(Clone, Copy, PartialEq)]
enum VarState {
    Declared,
    Defined,
}

#[derive(Clone, Copy, PartialEq)]
enum FunctionKind {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

/// A single static pass over the parsed statements that annotates every
/// resolvable variable use (`Variable`, `Assign`, `This`, `Super`) with its
/// lexical hop-distance, via `locals`. Expressions never entered into
/// `locals` are treated as global references at evaluation time.
pub struct Resolver<'r> {
    reporter: &'r dyn Reporter,
    scopes: Vec<HashMap<String, VarState>>,
    locals: HashMap<u64, usize>,
    current_function: FunctionKind,
    current_class: ClassKind,
}

impl<'r> Resolver<'r> {
    pub fn new(reporter: &'r dyn Reporter) -> Self {
        Resolver {
            reporter,
            scopes: Vec::new(),
            locals: HashMap::new(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
        }
    }

    /// Consumes the resolver and hands back the id -> hop-distance table
    /// the interpreter needs.
    pub fn resolve(mut self, statements: &[Stmt]) -> HashMap<u64, usize> {
        self.resolve_stmts(statements);
        self.locals
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.reporter.diagnostic(Diagnostic::at_token(
                    name,
                    "Variable with this name already declared in this scope.",
                ));
            }
            scope.insert(name.lexeme.clone(), VarState::Declared);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), VarState::Defined);
        }
    }

    fn define_named(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), VarState::Defined);
        }
    }

    /// Walks the scope stack from innermost outward; the first scope that
    /// holds `name` gives the hop-distance. If no scope holds it, it's left
    /// unresolved and treated as a global at evaluation time.
    fn resolve_local(&mut self, id: u64, name: &Token) {
        for (i, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.locals.insert(id, i);
                return;
            }
        }
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionKind) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&decl.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block { statements } => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }
            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(init) = initializer {
                    self.resolve_expr(init);
                }
                self.define(name);
            }
            Stmt::Function(decl) => {
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionKind::Function);
            }
            Stmt::Expression { expression } => self.resolve_expr(expression),
            Stmt::Print { expression } => self.resolve_expr(expression),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_stmt) = else_branch {
                    self.resolve_stmt(else_stmt);
                }
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    self.reporter
                        .diagnostic(Diagnostic::at_token(keyword, "Cannot return from top-level code."));
                }
                if let Some(return_value) = value {
                    if self.current_function == FunctionKind::Initializer {
                        self.reporter.diagnostic(Diagnostic::at_token(
                            keyword,
                            "Cannot return a value from an initializer.",
                        ));
                    }
                    self.resolve_expr(return_value);
                }
            }
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass, methods),
        }
    }

    fn resolve_class(&mut self, name: &Token, superclass: &Option<Expr>, methods: &[Rc<FunctionDecl>]) {
        let enclosing_class = self.current_class;
        self.current_class = ClassKind::Class;

        self.declare(name);
        self.define(name);

        if let Some(Expr::Variable { name: super_name, .. }) = superclass {
            if super_name.lexeme == name.lexeme {
                self.reporter
                    .diagnostic(Diagnostic::at_token(super_name, "A class cannot inherit from itself."));
            }
        }

        if let Some(sup) = superclass {
            self.current_class = ClassKind::Subclass;
            self.resolve_expr(sup);
            self.begin_scope();
            self.define_named("super");
        }

        self.begin_scope();
        self.define_named("this");

        for method in methods {
            let kind = if method.name.lexeme == "init" {
                FunctionKind::Initializer
            } else {
                FunctionKind::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { .. } => {}
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&VarState::Declared) {
                        self.reporter.diagnostic(Diagnostic::at_token(
                            name,
                            "Cannot read local variable in its own initializer.",
                        ));
                    }
                }
                self.resolve_local(*id, name);
            }
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Grouping { expression } => self.resolve_expr(expression),
            Expr::Call { callee, arguments, .. } => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::This { id, keyword } => {
                if self.current_class == ClassKind::None {
                    self.reporter
                        .diagnostic(Diagnostic::at_token(keyword, "Cannot use 'this' outside of a class."));
                } else {
                    self.resolve_local(*id, keyword);
                }
            }
            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassKind::None => self
                        .reporter
                        .diagnostic(Diagnostic::at_token(keyword, "Cannot use 'super' outside of a class.")),
                    ClassKind::Class => self.reporter.diagnostic(Diagnostic::at_token(
                        keyword,
                        "Cannot use 'super' in a class with no superclass.",
                    )),
                    ClassKind::Subclass => self.resolve_local(*id, keyword),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectingReporter;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve(source: &str) -> (HashMap<u64, usize>, CollectingReporter) {
        let reporter = CollectingReporter::default();
        let tokens = Scanner::new(source, &reporter).scan_tokens();
        let statements = Parser::new(&tokens, &reporter).parse();
        let locals = Resolver::new(&reporter).resolve(&statements);
        (locals, reporter)
    }

    #[test]
    fn a_variable_read_one_block_out_resolves_to_distance_one() {
        let (locals, reporter) = resolve("var a = 1; { a; }");
        assert!(!reporter.had_error());
        assert_eq!(locals.len(), 1);
        assert_eq!(*locals.values().next().unwrap(), 1);
    }

    #[test]
    fn shadowing_resolves_to_the_nearest_declaration() {
        let source = "var a = 1; { var a = 2; { a; } }";
        let (locals, reporter) = resolve(source);
        assert!(!reporter.had_error());
        // the innermost `a;` is one scope out from its own block, not two.
        assert_eq!(*locals.values().next().unwrap(), 1);
    }

    #[test]
    fn global_references_are_left_out_of_the_locals_table() {
        let (locals, reporter) = resolve("var a = 1; a;");
        assert!(!reporter.had_error());
        assert!(locals.is_empty());
    }

    #[test]
    fn redeclaring_a_name_in_the_same_block_is_an_error() {
        let (_locals, reporter) = resolve("{ var a = 1; var a = 2; }");
        assert!(reporter.had_error());
        assert!(reporter
            .messages()
            .iter()
            .any(|m| m.contains("Variable with this name already declared in this scope.")));
    }

    #[test]
    fn this_outside_a_class_is_an_error() {
        let (_locals, reporter) = resolve("print this;");
        assert!(reporter.had_error());
        assert!(reporter.messages().iter().any(|m| m.contains("Cannot use 'this' outside of a class.")));
    }

    #[test]
    fn super_without_a_superclass_is_an_error() {
        let (_locals, reporter) = resolve("class A { greet() { super.greet(); } }");
        assert!(reporter.had_error());
        assert!(reporter
            .messages()
            .iter()
            .any(|m| m.contains("Cannot use 'super' in a class with no superclass.")));
    }

    #[test]
    fn return_with_a_value_from_an_initializer_is_an_error() {
        let source = "class P { init() { return 1; } }";
        let (_locals, reporter) = resolve(source);
        assert!(reporter.had_error());
        assert!(reporter
            .messages()
            .iter()
            .any(|m| m.contains("Cannot return a value from an initializer.")));
    }

    #[test]
    fn function_parameters_are_resolved_like_locals() {
        let (locals, reporter) = resolve("fun f(a) { a; }");
        assert!(!reporter.had_error());
        assert_eq!(*locals.values().next().unwrap(), 0);
    }
}
