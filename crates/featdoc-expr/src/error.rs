//! Expression errors

use thiserror::Error;

use crate::target::Target;

/// Errors raised while parsing, binding or evaluating expressions
#[derive(Debug, Error)]
pub enum ExpressionError {
    /// Formula text is malformed
    #[error("cannot parse '{source_text}': {message}")]
    Parse {
        source_text: String,
        message: String,
    },

    /// Identifier names neither an object nor a property
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    /// Function called with the wrong number of arguments
    #[error("{function}() takes {expected} argument(s), got {found}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        found: usize,
    },

    /// Operand has the wrong type for the operator
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Division or modulo by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Result outside the function domain
    #[error("{0}")]
    Domain(String),

    /// Referenced value is not available
    #[error("cannot read '{0}'")]
    Unresolved(Target),

    /// Binding would make the target depend on itself
    #[error("binding '{target}' would create a dependency cycle through '{through}'")]
    Cycle { target: Target, through: Target },
}
