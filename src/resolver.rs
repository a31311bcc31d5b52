//! Static variable resolution.
//!
//! A single post-parse pass that walks the AST, simulates the block scopes
//! the interpreter will create, and tells the interpreter — per variable
//! reference — how many environment frames up its binding lives. Globals
//! get no annotation and stay dynamically resolved, which keeps late-bound
//! global recursion working.
//!
//! The same pass rejects the static errors the grammar cannot express:
//! reading a variable inside its own initializer, re-declaring a name in
//! the same local scope, `return` outside a function, returning a value
//! from `init`, and `this` outside a class. All errors are reported through
//! the [`Reporter`]; the walk never stops early, so one pass surfaces every
//! static error.

use std::collections::HashMap;

use log::{debug, info};

use crate::error::{LoxError, Reporter};
use crate::interpreter::Interpreter;
use crate::parser::{Expr, Stmt};
use crate::token::Token;

/// What kind of function body the resolver is currently inside, for
/// `return` checking.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// Whether the resolver is currently inside a class body, for `this`
/// checking.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
}

pub struct Resolver<'a, 'i, 'r> {
    interpreter: &'i mut Interpreter<'a>,
    reporter: &'r mut Reporter,

    /// Stack of local scopes, innermost last. The boolean tracks the
    /// declared-vs-defined distinction: `false` between `declare` and
    /// `define`, i.e. while the initializer is being resolved.
    scopes: Vec<HashMap<&'a str, bool>>,

    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a, 'i, 'r> Resolver<'a, 'i, 'r> {
    pub fn new(interpreter: &'i mut Interpreter<'a>, reporter: &'r mut Reporter) -> Self {
        Self {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Resolve a whole program. Errors accumulate in the [`Reporter`];
    /// callers check `reporter.had_error()` before executing.
    pub fn resolve(&mut self, statements: &'a [Stmt<'a>]) {
        info!("Beginning resolution phase");

        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, stmt: &'a Stmt<'a>) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::Var { name, initializer } => {
                self.declare(name);

                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }

                self.define(name);
            }

            Stmt::Block(statements) => {
                self.begin_scope();

                for statement in statements {
                    self.resolve_stmt(statement);
                }

                self.end_scope();
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                // Static analysis resolves both branches; only execution is
                // conditional.
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Function { name, params, body } => {
                // Defined before its body resolves, so a function can
                // recursively refer to itself.
                self.declare(name);
                self.define(name);

                self.resolve_function(params, body, FunctionType::Function);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Cannot return from top-level code.");
                }

                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Cannot return a value from an initializer.");
                    }

                    self.resolve_expr(value);
                }
            }

            Stmt::Class { name, methods } => {
                let enclosing_class: ClassType = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                // One scope for `this`, shared by every method body.
                self.begin_scope();

                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert("this", true);
                }

                for method in methods {
                    if let Stmt::Function {
                        name: method_name,
                        params,
                        body,
                    } = method
                    {
                        let declaration: FunctionType = if method_name.lexeme == "init" {
                            FunctionType::Initializer
                        } else {
                            FunctionType::Method
                        };

                        self.resolve_function(params, body, declaration);
                    }
                }

                self.end_scope();

                self.current_class = enclosing_class;
            }
        }
    }

    fn resolve_expr(&mut self, expr: &'a Expr<'a>) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable(name) => {
                // Declared-but-not-defined means we are inside this very
                // variable's initializer.
                let in_own_initializer: bool = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(name.lexeme) == Some(&false));

                if in_own_initializer {
                    self.error(name, "Cannot read local variable in its own initializer.");
                }

                self.resolve_local(expr, name);
            }

            Expr::Assign { name, value } => {
                self.resolve_expr(value);
                self.resolve_local(expr, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            // Property names are looked up dynamically at runtime; only the
            // object expression resolves statically.
            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This(keyword) => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Cannot use 'this' outside of a class.");

                    return;
                }

                self.resolve_local(expr, keyword);
            }
        }
    }

    /// Resolve a function body in a fresh scope with its parameters bound,
    /// saving and restoring the enclosing function type.
    fn resolve_function(
        &mut self,
        params: &'a [&'a Token<'a>],
        body: &'a [Stmt<'a>],
        function_type: FunctionType,
    ) {
        let enclosing_function: FunctionType = self.current_function;
        self.current_function = function_type;

        self.begin_scope();

        for param in params {
            self.declare(param);
            self.define(param);
        }

        for statement in body {
            self.resolve_stmt(statement);
        }

        self.end_scope();

        self.current_function = enclosing_function;
    }

    /// Walk the scope stack innermost-out; on a hit, record the hop count
    /// in the interpreter's binding-distance table. A miss means global.
    fn resolve_local(&mut self, expr: &'a Expr<'a>, name: &'a Token<'a>) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme) {
                debug!("Resolved '{}' at distance {}", name.lexeme, depth);

                self.interpreter.resolve(expr, depth);

                return;
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Reserve `name` in the innermost scope, marked not-yet-defined.
    /// Re-declaring in the same local scope is a static error; the global
    /// scope (empty stack) allows it.
    fn declare(&mut self, name: &'a Token<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(name.lexeme) {
                let err = LoxError::resolve(
                    name.line,
                    format!(
                        "at '{}': Variable with this name already declared in this scope.",
                        name.lexeme
                    ),
                );
                self.reporter.report(&err);
            }

            scope.insert(name.lexeme, false);
        }
    }

    /// Mark `name` fully initialized and usable.
    fn define(&mut self, name: &'a Token<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme, true);
        }
    }

    fn error(&mut self, token: &Token<'_>, message: &str) {
        let err = LoxError::resolve(token.line, format!("at '{}': {}", token.lexeme, message));
        self.reporter.report(&err);
    }
}
