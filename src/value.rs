use std::fmt;

use crate::object::{LoxClass, LoxFunction, LoxInstance};

/// A runtime value: nil, boolean, number (double-precision), string, or one
/// of the callable/object kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),

    /// Host-provided function registered into the global environment.
    NativeFunction {
        name: &'static str,
        arity: usize,
        func: fn(&[Value<'a>]) -> Result<Value<'a>, String>,
    },

    /// User-declared function or bound method.
    Function(LoxFunction<'a>),

    Class(LoxClass<'a>),

    Instance(LoxInstance<'a>),
}

impl<'a> fmt::Display for Value<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            // Integral quantities print without a trailing ".0".
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction { name, .. } => write!(f, "<fn {}>", name),

            Value::Function(function) => write!(f, "<fn {}>", function.name()),

            Value::Class(class) => write!(f, "{}", class.name()),

            Value::Instance(instance) => write!(f, "{} instance", instance.class_name()),
        }
    }
}
