//! Parenthesised prefix rendering of expression trees, used by the `parse`
//! subcommand and as a structural oracle in tests.

use std::fmt::Write;

use crate::parser::{Expr, LiteralValue};

pub struct AstPrinter;

impl AstPrinter {
    /// Render `expr` in prefix form, e.g. `-123 * (45.67)` becomes
    /// `(* (- 123) (group 45.67))`.
    pub fn print(expr: &Expr<'_>) -> String {
        let mut out: String = String::new();

        Self::write_expr(&mut out, expr);

        out
    }

    fn write_expr(out: &mut String, expr: &Expr<'_>) {
        match expr {
            Expr::Literal(literal) => Self::write_literal(out, literal),

            Expr::Unary { operator, right } => {
                Self::parenthesize(out, operator.lexeme, &[right.as_ref()]);
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => {
                Self::parenthesize(out, operator.lexeme, &[left.as_ref(), right.as_ref()]);
            }

            Expr::Grouping(inner) => {
                Self::parenthesize(out, "group", &[inner.as_ref()]);
            }

            Expr::Variable(name) => out.push_str(name.lexeme),

            Expr::Assign { name, value } => {
                out.push_str("(= ");
                out.push_str(name.lexeme);
                out.push(' ');
                Self::write_expr(out, value);
                out.push(')');
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                out.push_str("(call ");
                Self::write_expr(out, callee);

                for argument in arguments {
                    out.push(' ');
                    Self::write_expr(out, argument);
                }

                out.push(')');
            }

            Expr::Get { object, name } => {
                out.push_str("(. ");
                Self::write_expr(out, object);
                out.push(' ');
                out.push_str(name.lexeme);
                out.push(')');
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                out.push_str("(= (. ");
                Self::write_expr(out, object);
                out.push(' ');
                out.push_str(name.lexeme);
                out.push_str(") ");
                Self::write_expr(out, value);
                out.push(')');
            }

            Expr::This(_) => out.push_str("this"),
        }
    }

    fn write_literal(out: &mut String, literal: &LiteralValue) {
        match literal {
            // Integral literals render with a trailing ".0" so that the
            // printed tree is unambiguous about the operand's type.
            LiteralValue::Number(n) => {
                if n.fract() == 0.0 {
                    let _ = write!(out, "{:.1}", n);
                } else {
                    let _ = write!(out, "{}", n);
                }
            }

            LiteralValue::Str(s) => out.push_str(s),

            LiteralValue::True => out.push_str("true"),
            LiteralValue::False => out.push_str("false"),
            LiteralValue::Nil => out.push_str("nil"),
        }
    }

    fn parenthesize(out: &mut String, name: &str, exprs: &[&Expr<'_>]) {
        out.push('(');
        out.push_str(name);

        for expr in exprs {
            out.push(' ');
            Self::write_expr(out, expr);
        }

        out.push(')');
    }
}
