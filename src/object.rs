//! Runtime object model: user functions (closures), classes, and instances.
//!
//! All three are cheap-to-clone handles around `Rc`-shared state, and all
//! three compare by identity (`Rc::ptr_eq`) — binding a method produces a
//! *new* function value, distinct from the one in the class's method table.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::parser::Stmt;
use crate::token::Token;
use crate::value::Value;

/// A user-declared function paired with the environment that was active at
/// its declaration (its closure).
///
/// The declaration itself — name/parameter tokens and body statements — is
/// *borrowed* from the resolved AST, never cloned: the interpreter's
/// binding-distance table is keyed by node identity, and a copied body
/// would silently lose its annotations.
#[derive(Clone)]
pub struct LoxFunction<'a> {
    inner: Rc<FunctionInner<'a>>,
}

struct FunctionInner<'a> {
    name: &'a Token<'a>,
    params: Vec<&'a Token<'a>>,
    body: &'a [Stmt<'a>],
    closure: Rc<RefCell<Environment<'a>>>,
    is_initializer: bool,
}

impl<'a> LoxFunction<'a> {
    pub fn new(
        name: &'a Token<'a>,
        params: Vec<&'a Token<'a>>,
        body: &'a [Stmt<'a>],
        closure: Rc<RefCell<Environment<'a>>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            inner: Rc::new(FunctionInner {
                name,
                params,
                body,
                closure,
                is_initializer,
            }),
        }
    }

    pub fn name(&self) -> &'a str {
        self.inner.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.inner.params.len()
    }

    /// Invoke the function: fresh environment parented at the closure,
    /// parameters bound positionally, body run through the interpreter's
    /// block path. A `Flow::Return` from the body becomes the call's
    /// result; falling off the end yields nil — except for initializers,
    /// which always yield `this`.
    pub fn call(
        &self,
        interpreter: &mut Interpreter<'a>,
        arguments: &[Value<'a>],
    ) -> Result<Value<'a>> {
        debug!("Calling <fn {}>", self.name());

        let mut environment: Environment<'a> =
            Environment::with_enclosing(Rc::clone(&self.inner.closure));

        for (param, argument) in self.inner.params.iter().zip(arguments) {
            environment.define(param.lexeme, argument.clone());
        }

        let flow: Flow<'a> =
            interpreter.execute_block(self.inner.body, Rc::new(RefCell::new(environment)))?;

        if self.inner.is_initializer {
            // `init` yields the instance even on a bare `return;`.
            return self.closure_this();
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }

    /// Rebuild this function with a one-frame closure that defines `this`
    /// as `instance`, parented at the original closure.
    pub fn bind(&self, instance: LoxInstance<'a>) -> LoxFunction<'a> {
        let mut environment: Environment<'a> =
            Environment::with_enclosing(Rc::clone(&self.inner.closure));

        environment.define("this", Value::Instance(instance));

        LoxFunction {
            inner: Rc::new(FunctionInner {
                name: self.inner.name,
                params: self.inner.params.clone(),
                body: self.inner.body,
                closure: Rc::new(RefCell::new(environment)),
                is_initializer: self.inner.is_initializer,
            }),
        }
    }

    /// `this` at distance 0 in the closure — present for every bound
    /// method, and `init` is only ever invoked bound.
    fn closure_this(&self) -> Result<Value<'a>> {
        self.inner.closure.borrow().get_at(0, "this").ok_or_else(|| {
            LoxError::runtime(self.inner.name.line, "Undefined variable 'this'.")
        })
    }
}

impl<'a> PartialEq for LoxFunction<'a> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<'a> fmt::Debug for LoxFunction<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// A class: a name and a method table. Classes store behavior; instances
/// store state.
#[derive(Clone)]
pub struct LoxClass<'a> {
    inner: Rc<ClassInner<'a>>,
}

struct ClassInner<'a> {
    name: &'a Token<'a>,
    methods: HashMap<String, LoxFunction<'a>>,
}

impl<'a> LoxClass<'a> {
    pub fn new(name: &'a Token<'a>, methods: HashMap<String, LoxFunction<'a>>) -> Self {
        LoxClass {
            inner: Rc::new(ClassInner { name, methods }),
        }
    }

    pub fn name(&self) -> &'a str {
        self.inner.name.lexeme
    }

    pub fn find_method(&self, name: &str) -> Option<&LoxFunction<'a>> {
        self.inner.methods.get(name)
    }

    /// A class's arity is its initializer's arity, or 0 without one.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, LoxFunction::arity)
    }
}

impl<'a> PartialEq for LoxClass<'a> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<'a> fmt::Debug for LoxClass<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An instance: a class reference plus a mutable field table that grows on
/// first assignment to a new field name.
#[derive(Clone)]
pub struct LoxInstance<'a> {
    inner: Rc<RefCell<InstanceInner<'a>>>,
}

struct InstanceInner<'a> {
    class: LoxClass<'a>,
    fields: HashMap<String, Value<'a>>,
}

impl<'a> LoxInstance<'a> {
    pub fn new(class: LoxClass<'a>) -> Self {
        LoxInstance {
            inner: Rc::new(RefCell::new(InstanceInner {
                class,
                fields: HashMap::new(),
            })),
        }
    }

    pub fn class_name(&self) -> &'a str {
        self.inner.borrow().class.name()
    }

    /// Property lookup: own field first (fields shadow methods), else a
    /// method on the class, bound to this instance. `None` means undefined
    /// property.
    pub fn get(&self, name: &str) -> Option<Value<'a>> {
        if let Some(value) = self.inner.borrow().fields.get(name) {
            return Some(value.clone());
        }

        let class: LoxClass<'a> = self.inner.borrow().class.clone();

        class
            .find_method(name)
            .map(|method| Value::Function(method.bind(self.clone())))
    }

    /// Field write. Always succeeds — fields are freely creatable.
    pub fn set(&self, name: &str, value: Value<'a>) {
        self.inner.borrow_mut().fields.insert(name.to_string(), value);
    }
}

impl<'a> PartialEq for LoxInstance<'a> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<'a> fmt::Debug for LoxInstance<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class_name())
    }
}
