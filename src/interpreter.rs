use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::ast::{Expr, FunctionDecl, LiteralValue, Stmt};
use crate::class::LoxClass;
use crate::environment::Environment;
use crate::error::{Reporter, RuntimeError, Unwind};
use crate::function::{self, LoxFunction, NativeFunction};
use crate::object::{Callable, Object};
use crate::token::{Token, TokenType};

/// Walks the AST and evaluates it. Holds the global scope, the resolver's
/// hop-distance table, and the sink `print`/auto-printed REPL expressions
/// write to — injectable so tests can assert on captured output instead of
/// a subprocess's stdout.
pub struct Interpreter {
    pub globals: Rc<Environment>,
    environment: Rc<Environment>,
    locals: HashMap<u64, usize>,
    stdout: Box<dyn Write>,
    pub repl_mode: bool,
}

impl Interpreter {
    pub fn new(stdout: Box<dyn Write>) -> Self {
        let globals = Environment::new();
        define_natives(&globals);
        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            stdout,
            repl_mode: false,
        }
    }

    /// Installs the hop-distance table the resolver computed for this run.
    pub fn load_locals(&mut self, locals: HashMap<u64, usize>) {
        self.locals = locals;
    }

    pub fn interpret(&mut self, statements: &[Stmt], reporter: &dyn Reporter) {
        for statement in statements {
            if let Err(Unwind::Error(e)) = self.execute(statement) {
                reporter.runtime_error(e);
                return;
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Unwind> {
        match stmt {
            Stmt::Expression { expression } => {
                let value = self.evaluate(expression)?;
                if self.repl_mode && !matches!(expression, Expr::Assign { .. } | Expr::Set { .. } | Expr::Call { .. })
                {
                    writeln!(self.stdout, "{}", value.stringify()).ok();
                }
                Ok(())
            }
            Stmt::Print { expression } => {
                let value = self.evaluate(expression)?;
                writeln!(self.stdout, "{}", value.stringify()).ok();
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::Nil,
                };
                self.environment.define(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::Block { statements } => {
                let block_env = Environment::with_enclosing(&self.environment);
                self.execute_block(statements, block_env)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(())
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }
            Stmt::Function(decl) => {
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment.define(
                    decl.name.lexeme.clone(),
                    Object::Callable(Callable::Function(Rc::new(function))),
                );
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::Nil,
                };
                Err(Unwind::Return(value))
            }
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass, methods),
        }
    }

    /// Runs `statements` in `environment`, restoring the caller's current
    /// environment afterward on every exit path, including an error or a
    /// `Return` unwind.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Rc<Environment>) -> Result<(), Unwind> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = (|| {
            for statement in statements {
                self.execute(statement)?;
            }
            Ok(())
        })();
        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass_expr: &Option<Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<(), Unwind> {
        let superclass = match superclass_expr {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Object::Callable(Callable::Class(class)) => Some(class),
                    _ => {
                        return Err(RuntimeError::new(
                            superclass_token(expr),
                            "Superclass must be a class.",
                        )
                        .into())
                    }
                }
            }
            None => None,
        };

        self.environment.define(name.lexeme.clone(), Object::Nil);

        let previous_env = if let Some(sup) = &superclass {
            let env = Environment::with_enclosing(&self.environment);
            env.define("super".to_string(), Object::Callable(Callable::Class(Rc::clone(sup))));
            Some(std::mem::replace(&mut self.environment, env))
        } else {
            None
        };

        let mut method_table = HashMap::new();
        for method in methods {
            let is_initializer = method.name.lexeme == "init";
            let function = LoxFunction::new(Rc::clone(method), Rc::clone(&self.environment), is_initializer);
            method_table.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        let class = LoxClass::new(name.lexeme.clone(), superclass, method_table);

        if let Some(previous) = previous_env {
            self.environment = previous;
        }

        self.environment
            .assign(name, Object::Callable(Callable::Class(Rc::new(class))))
            .expect("class name was just defined in this scope");
        Ok(())
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Object, Unwind> {
        match expr {
            Expr::Literal { value } => Ok(literal_to_object(value)),
            Expr::Grouping { expression } => self.evaluate(expression),
            Expr::Variable { id, name } => self.lookup_variable(*id, name),
            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                match self.locals.get(id) {
                    Some(&distance) => self.environment.assign_at(distance, name, value.clone()),
                    None => self.globals.assign(name, value.clone())?,
                };
                Ok(value)
            }
            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),
            Expr::Binary { left, operator, right } => self.evaluate_binary(left, operator, right),
            Expr::Logical { left, operator, right } => self.evaluate_logical(left, operator, right),
            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),
            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;
                match &object {
                    Object::Instance(instance) => Ok(instance.borrow().get(name, &object)?),
                    _ => Err(RuntimeError::new(name.clone(), "Only instances have properties.").into()),
                }
            }
            Expr::Set { object, name, value } => {
                let object = self.evaluate(object)?;
                match object {
                    Object::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.borrow_mut().set(name, value.clone());
                        Ok(value)
                    }
                    _ => Err(RuntimeError::new(name.clone(), "Only instances have fields.").into()),
                }
            }
            Expr::Super { id, keyword, method } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn lookup_variable(&self, id: u64, name: &Token) -> Result<Object, Unwind> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(self.environment.get_at(distance, &name.lexeme)),
            None => Ok(self.globals.get(name)?),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Object, Unwind> {
        let right = self.evaluate(right)?;
        match operator.token_type {
            TokenType::Minus => match right {
                Object::Number(n) => Ok(Object::Number(-n)),
                _ => Err(RuntimeError::new(operator.clone(), "Operand must be a number.").into()),
            },
            TokenType::Bang => Ok(Object::Boolean(!right.is_truthy())),
            _ => unreachable!("parser only produces ! and - as unary operators"),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Object, Unwind> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        macro_rules! numeric {
            ($op:tt) => {
                match (&left, &right) {
                    (Object::Number(a), Object::Number(b)) => Ok(Object::Number(a $op b)),
                    _ => Err(RuntimeError::new(operator.clone(), "Operands must be numbers.").into()),
                }
            };
        }
        macro_rules! comparison {
            ($op:tt) => {
                match (&left, &right) {
                    (Object::Number(a), Object::Number(b)) => Ok(Object::Boolean(a $op b)),
                    _ => Err(RuntimeError::new(operator.clone(), "Operands must be numbers.").into()),
                }
            };
        }

        match operator.token_type {
            TokenType::Minus => numeric!(-),
            TokenType::Slash => numeric!(/),
            TokenType::Star => numeric!(*),
            TokenType::Plus => match (&left, &right) {
                (Object::Number(a), Object::Number(b)) => Ok(Object::Number(a + b)),
                (Object::String(a), Object::Number(_) | Object::String(_) | Object::Boolean(_)) => {
                    Ok(Object::String(format!("{a}{}", right.stringify())))
                }
                _ => Err(RuntimeError::new(
                    operator.clone(),
                    "Operands must be either two numbers or a string and a literal value.",
                )
                .into()),
            },
            TokenType::Greater => comparison!(>),
            TokenType::GreaterEqual => comparison!(>=),
            TokenType::Less => comparison!(<),
            TokenType::LessEqual => comparison!(<=),
            TokenType::BangEqual => Ok(Object::Boolean(!left.is_equal(&right))),
            TokenType::EqualEqual => Ok(Object::Boolean(left.is_equal(&right))),
            _ => unreachable!("parser only produces arithmetic/comparison/equality as binary operators"),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Object, Unwind> {
        let left = self.evaluate(left)?;
        match operator.token_type {
            TokenType::Or if left.is_truthy() => Ok(left),
            TokenType::And if !left.is_truthy() => Ok(left),
            _ => self.evaluate(right),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Object, Unwind> {
        let callee = self.evaluate(callee)?;
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        let callable = match callee {
            Object::Callable(c) => c,
            _ => return Err(RuntimeError::new(paren.clone(), "Can only call functions and classes.").into()),
        };

        let expected = function::arity(&callable);
        if args.len() != expected {
            return Err(RuntimeError::new(
                paren.clone(),
                format!("Expected {expected} arguments but got {}.", args.len()),
            )
            .into());
        }

        function::call(&callable, self, args)
    }

    fn evaluate_super(&mut self, id: u64, keyword: &Token, method: &Token) -> Result<Object, Unwind> {
        let distance = *self
            .locals
            .get(&id)
            .expect("resolver always resolves a valid 'super' use to a distance");
        let superclass = match self.environment.get_at(distance, "super") {
            Object::Callable(Callable::Class(class)) => class,
            _ => unreachable!("resolver only binds 'super' to a class"),
        };
        let instance = self.environment.get_at(distance - 1, "this");

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Object::Callable(Callable::Function(Rc::new(found.bind(instance))))),
            None => {
                Err(RuntimeError::new(keyword.clone(), format!("Undefined property '{}'.", method.lexeme)).into())
            }
        }
    }
}

fn literal_to_object(value: &LiteralValue) -> Object {
    match value {
        LiteralValue::Bool(b) => Object::Boolean(*b),
        LiteralValue::Nil => Object::Nil,
        LiteralValue::Number(n) => Object::Number(*n),
        LiteralValue::Str(s) => Object::String(s.clone()),
    }
}

/// The `Get`/`Set` runtime-error tokens need a `Token` even when the object
/// expression being evaluated isn't itself a single token (e.g. a call
/// result); superclass resolution errors are reported against the
/// superclass's own name token.
fn superclass_token(expr: &Expr) -> Token {
    match expr {
        Expr::Variable { name, .. } => name.clone(),
        _ => Token::synthetic("superclass"),
    }
}

fn define_natives(globals: &Rc<Environment>) {
    globals.define(
        "clock".to_string(),
        Object::Callable(Callable::Native(Rc::new(NativeFunction {
            name: "clock",
            arity: 0,
            func: Box::new(|_args| {
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default();
                Object::Number(now.as_secs_f64())
            }),
        }))),
    );
}
