//! Tree-walking evaluator.
//!
//! Holds one persistent global environment, a "current environment" cursor
//! that tracks lexical nesting during execution, and the binding-distance
//! table the resolver filled in. Statement execution returns a [`Flow`] so
//! `return` travels on the ordinary result channel — structurally separate
//! from runtime errors, which use `Err` and abort the current `interpret`
//! call.
//!
//! The scope nesting the resolver computed must exactly mirror the
//! environment nesting created here: one fresh frame per block, per
//! function call, and per bound method — nothing else.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::object::{LoxClass, LoxFunction, LoxInstance};
use crate::parser::{Expr, LiteralValue, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished: fell through normally, or hit `return`.
///
/// `Return` propagates up through exactly as many statement frames as
/// needed to reach the nearest function invocation, which converts it into
/// that call's result. It is not an error and never uses the `Err` channel.
#[derive(Debug)]
pub enum Flow<'a> {
    Normal,
    Return(Value<'a>),
}

/// Identity key for an expression node, for the binding-distance table.
///
/// Valid as long as the AST the resolver walked is the AST being executed
/// and it stays at a stable address for the interpreter's lifetime.
#[inline(always)]
fn expr_key(expr: &Expr<'_>) -> usize {
    expr as *const Expr<'_> as usize
}

pub struct Interpreter<'a> {
    globals: Rc<RefCell<Environment<'a>>>,
    environment: Rc<RefCell<Environment<'a>>>,
    /// Binding distances recorded by the resolver, keyed by node identity.
    /// Absence of an entry means "resolve dynamically against globals".
    locals: HashMap<usize, usize>,
    out: Box<dyn Write>,
}

impl<'a> Interpreter<'a> {
    /// Interpreter printing to stdout, with native functions registered.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter printing to an arbitrary sink (tests use an in-memory
    /// buffer).
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: 0,
                func: |_args: &[Value<'_>]| {
                    let seconds: f64 = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;

                    Ok(Value::Number(seconds))
                },
            },
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Resolver callback: record that `expr` binds `depth` environments up
    /// from its point of use.
    pub fn resolve(&mut self, expr: &Expr<'a>, depth: usize) {
        self.locals.insert(expr_key(expr), depth);
    }

    /// Execute a full program. Stops at the first runtime error; effects
    /// already performed (output, global mutations) remain.
    pub fn interpret(&mut self, statements: &'a [Stmt<'a>]) -> Result<()> {
        debug!("Interpreting {} statement(s)", statements.len());

        for statement in statements {
            if let Flow::Return(_) = self.execute(statement)? {
                // Top-level `return` is rejected by the resolver.
                break;
            }
        }

        info!("Interpretation completed");

        Ok(())
    }

    // ─────────────────────────── statement execution ──────────────────────

    pub fn execute(&mut self, stmt: &'a Stmt<'a>) -> Result<Flow<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value<'a> = self.evaluate(expr)?;

                writeln!(self.out, "{}", value)?;

                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value<'a> = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(name.lexeme, value);

                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment: Environment<'a> =
                    Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(statements, Rc::new(RefCell::new(environment)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function { name, params, body } => {
                debug!("Declaring function '{}'", name.lexeme);

                // The closure is the environment active at declaration.
                let function: LoxFunction<'a> = LoxFunction::new(
                    name,
                    params.clone(),
                    body,
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(name.lexeme, Value::Function(function));

                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value<'a> = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }

            Stmt::Class { name, methods } => {
                debug!("Declaring class '{}'", name.lexeme);

                // Nil placeholder first, so method closures can see the
                // class name for self-reference.
                self.environment.borrow_mut().define(name.lexeme, Value::Nil);

                let mut method_table: HashMap<String, LoxFunction<'a>> = HashMap::new();

                for method in methods {
                    if let Stmt::Function {
                        name: method_name,
                        params,
                        body,
                    } = method
                    {
                        let function: LoxFunction<'a> = LoxFunction::new(
                            method_name,
                            params.clone(),
                            body,
                            Rc::clone(&self.environment),
                            method_name.lexeme == "init",
                        );

                        method_table.insert(method_name.lexeme.to_string(), function);
                    }
                }

                let class: LoxClass<'a> = LoxClass::new(name, method_table);

                self.environment
                    .borrow_mut()
                    .assign(name.lexeme, Value::Class(class), name.line)?;

                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` with `environment` as the current frame, restoring
    /// the previous frame on every exit path. Both function calls and bare
    /// blocks go through here.
    pub fn execute_block(
        &mut self,
        statements: &'a [Stmt<'a>],
        environment: Rc<RefCell<Environment<'a>>>,
    ) -> Result<Flow<'a>> {
        let previous: Rc<RefCell<Environment<'a>>> =
            std::mem::replace(&mut self.environment, environment);

        let mut flow: Result<Flow<'a>> = Ok(Flow::Normal);

        for statement in statements {
            match self.execute(statement) {
                Ok(Flow::Normal) => continue,

                other => {
                    flow = other;
                    break;
                }
            }
        }

        self.environment = previous;

        flow
    }

    // ─────────────────────────── expression evaluation ────────────────────

    pub fn evaluate(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                // Short-circuit: the result is whichever operand value was
                // taken, not necessarily a boolean.
                let left: Value<'a> = self.evaluate(left)?;

                if operator.token_type == TokenType::OR {
                    if is_truthy(&left) {
                        return Ok(left);
                    }
                } else if !is_truthy(&left) {
                    return Ok(left);
                }

                self.evaluate(right)
            }

            Expr::Variable(name) => self.look_up_variable(name, expr),

            Expr::Assign { name, value } => {
                let value: Value<'a> = self.evaluate(value)?;

                match self.locals.get(&expr_key(expr)) {
                    Some(&distance) => self
                        .environment
                        .borrow_mut()
                        .assign_at(distance, name.lexeme, value.clone())
                        .ok_or_else(|| {
                            LoxError::runtime(
                                name.line,
                                format!("Undefined variable '{}'.", name.lexeme),
                            )
                        })?,

                    None => self.globals.borrow_mut().assign(
                        name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value<'a> = self.evaluate(callee)?;

                let mut args: Vec<Value<'a>> = Vec::with_capacity(arguments.len());

                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.invoke_callable(callee, paren, &args)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name.lexeme).ok_or_else(|| {
                    LoxError::runtime(
                        name.line,
                        format!("Undefined property '{}'.", name.lexeme),
                    )
                }),

                _ => Err(LoxError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value<'a> = self.evaluate(object)?;

                let Value::Instance(instance) = object else {
                    return Err(LoxError::runtime(name.line, "Only instances have fields."));
                };

                let value: Value<'a> = self.evaluate(value)?;

                instance.set(name.lexeme, value.clone());

                Ok(value)
            }

            Expr::This(keyword) => self.look_up_variable(keyword, expr),
        }
    }

    fn evaluate_unary(&mut self, operator: &'a Token<'a>, right: &'a Expr<'a>) -> Result<Value<'a>> {
        let right: Value<'a> = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator.line, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right))),

            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &'a Expr<'a>,
        operator: &'a Token<'a>,
        right: &'a Expr<'a>,
    ) -> Result<Value<'a>> {
        let left: Value<'a> = self.evaluate(left)?;
        let right: Value<'a> = self.evaluate(right)?;

        match operator.token_type {
            // `+` doubles as string concatenation; no implicit coercion.
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            // Equality is defined for every pair of values and never errors.
            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left, &right))),
            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left, &right))),

            _ => {
                let (a, b) = match (left, right) {
                    (Value::Number(a), Value::Number(b)) => (a, b),
                    _ => {
                        return Err(LoxError::runtime(
                            operator.line,
                            "Operands must be numbers.",
                        ));
                    }
                };

                match operator.token_type {
                    TokenType::MINUS => Ok(Value::Number(a - b)),
                    TokenType::STAR => Ok(Value::Number(a * b)),
                    TokenType::SLASH => Ok(Value::Number(a / b)),
                    TokenType::GREATER => Ok(Value::Bool(a > b)),
                    TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
                    TokenType::LESS => Ok(Value::Bool(a < b)),
                    TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
                    _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.")),
                }
            }
        }
    }

    /// Distance-table lookup for Variable/Assign/This nodes: an annotated
    /// node reads at its exact distance from the current environment; an
    /// unannotated one resolves dynamically against globals.
    fn look_up_variable(&self, name: &'a Token<'a>, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        match self.locals.get(&expr_key(expr)) {
            Some(&distance) => self
                .environment
                .borrow()
                .get_at(distance, name.lexeme)
                .ok_or_else(|| {
                    LoxError::runtime(
                        name.line,
                        format!("Undefined variable '{}'.", name.lexeme),
                    )
                }),

            None => self.globals.borrow().get(name.lexeme, name.line),
        }
    }

    /// Invoke any callable value; arity is checked before anything runs.
    fn invoke_callable(
        &mut self,
        callee: Value<'a>,
        paren: &'a Token<'a>,
        arguments: &[Value<'a>],
    ) -> Result<Value<'a>> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                check_arity(arity, arguments.len(), paren)?;

                func(arguments).map_err(|message| LoxError::runtime(paren.line, message))
            }

            Value::Function(function) => {
                check_arity(function.arity(), arguments.len(), paren)?;

                function.call(self, arguments)
            }

            Value::Class(class) => {
                debug!("Instantiating class '{}'", class.name());

                check_arity(class.arity(), arguments.len(), paren)?;

                let instance: LoxInstance<'a> = LoxInstance::new(class.clone());

                if let Some(initializer) = class.find_method("init") {
                    initializer.bind(instance.clone()).call(self, arguments)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }
}

impl<'a> Default for Interpreter<'a> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_arity(expected: usize, actual: usize, paren: &Token<'_>) -> Result<()> {
    if actual != expected {
        return Err(LoxError::runtime(
            paren.line,
            format!("Expected {} arguments but got {}.", expected, actual),
        ));
    }

    Ok(())
}

/// nil and false are falsy; every other value (including 0 and "") is
/// truthy.
fn is_truthy(value: &Value<'_>) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}

/// Value equality without type coercion. Objects compare by identity.
fn is_equal<'a>(left: &Value<'a>, right: &Value<'a>) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Function(a), Value::Function(b)) => a == b,
        (Value::Class(a), Value::Class(b)) => a == b,
        (Value::Instance(a), Value::Instance(b)) => a == b,
        _ => false,
    }
}
