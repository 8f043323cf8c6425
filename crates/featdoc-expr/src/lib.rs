//! featdoc Expression Engine
//!
//! Formulas bound to property paths, evaluated during recompute.
//!
//! # Core Concepts
//!
//! - [`Expression`]: parsed formula with its source text
//! - [`Scope`] / [`EvalContext`]: the document as seen by resolution and evaluation
//! - [`Target`]: an object name plus a [`featdoc_property::PropertyPath`]
//! - [`ExpressionEngine`]: the bindings owned by one object
//! - [`check_cycle`]: path-level cycle detection across a document
//!
//! # Example
//!
//! ```rust
//! use featdoc_expr::Expression;
//!
//! let expr = Expression::parse("2 * (5 % 3)").unwrap();
//! assert_eq!(expr.source(), "2 * (5 % 3)");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod ast;
mod engine;
mod error;
mod expression;
mod parser;
mod target;

pub use ast::{BinaryOp, Expr, Function, Identifier, UnaryOp};
pub use engine::{check_cycle, Binding, ExpressionEngine};
pub use error::ExpressionError;
pub use expression::{EvalContext, Expression, Scope};
pub use parser::parse;
pub use target::Target;
