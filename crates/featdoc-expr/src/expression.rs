//! Parsed formulas, reference resolution and evaluation

use std::fmt::{self, Display, Formatter};

use featdoc_property::{PropertyPath, Scalar};

use crate::ast::{BinaryOp, Expr, Function, Identifier, UnaryOp};
use crate::error::ExpressionError;
use crate::parser;
use crate::target::Target;

/// What a formula can see while it is being bound
pub trait Scope {
    /// Name of the object owning the binding
    fn owner(&self) -> &str;

    /// True if an object with this name exists
    fn has_object(&self, name: &str) -> bool;

    /// Name of the object carrying this label
    fn object_by_label(&self, label: &str) -> Option<String>;

    /// True if the object has a property with this name
    fn has_property(&self, object: &str, property: &str) -> bool;
}

/// What a formula can read while it is being evaluated
pub trait EvalContext: Scope {
    /// Scalar at a resolved target
    fn read(&self, target: &Target) -> Option<Scalar>;
}

/// Parsed formula together with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    /// Parse formula text
    ///
    /// # Errors
    /// [`ExpressionError::Parse`] for malformed text.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        Ok(Self {
            source: source.trim().to_string(),
            ast: parser::parse(source)?,
        })
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    #[must_use]
    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Resolve every reference to an object/property target
    ///
    /// A leading dot always means the owner. Otherwise a first segment naming
    /// an object that has the next segment as property selects that object;
    /// failing that, the path is read on the owner.
    ///
    /// # Errors
    /// [`ExpressionError::UnknownIdentifier`] for references that resolve to
    /// nothing.
    pub fn resolve(&self, scope: &dyn Scope) -> Result<Vec<Target>, ExpressionError> {
        let mut targets: Vec<Target> = Vec::new();
        for id in self.ast.identifiers() {
            let target = resolve_identifier(id, scope)?;
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        Ok(targets)
    }

    /// Evaluate against live values
    ///
    /// # Errors
    /// Resolution, type, domain and division errors.
    pub fn evaluate(&self, ctx: &dyn EvalContext) -> Result<Scalar, ExpressionError> {
        eval(&self.ast, ctx)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn resolve_identifier<S: Scope + ?Sized>(
    id: &Identifier,
    scope: &S,
) -> Result<Target, ExpressionError> {
    let unknown = || ExpressionError::UnknownIdentifier(id.to_text());
    let (object, segments) = if let Some(label) = &id.label {
        let object = scope.object_by_label(label).ok_or_else(unknown)?;
        (object, id.segments.clone())
    } else if id.relative {
        (scope.owner().to_string(), id.segments.clone())
    } else {
        match id.segments.as_slice() {
            [first, second, rest @ ..]
                if scope.has_object(first) && scope.has_property(first, second) =>
            {
                let mut segments = vec![second.clone()];
                segments.extend(rest.iter().cloned());
                (first.clone(), segments)
            }
            _ => (scope.owner().to_string(), id.segments.clone()),
        }
    };
    let property = segments.first().ok_or_else(unknown)?;
    if !scope.has_property(&object, property) {
        return Err(unknown());
    }
    Ok(Target::new(object, PropertyPath::new(segments)))
}

fn number(value: &Scalar, what: &str) -> Result<f64, ExpressionError> {
    value
        .as_f64()
        .ok_or_else(|| ExpressionError::TypeMismatch(format!("{what} needs a number")))
}

fn eval<C: EvalContext + ?Sized>(expr: &Expr, ctx: &C) -> Result<Scalar, ExpressionError> {
    match expr {
        Expr::Number(n) => Ok(Scalar::Number(*n)),
        Expr::Text(t) => Ok(Scalar::Text(t.clone())),
        Expr::Ident(id) => {
            let target = resolve_identifier(id, ctx)?;
            ctx.read(&target)
                .ok_or(ExpressionError::Unresolved(target))
        }
        Expr::Unary(UnaryOp::Neg, e) => {
            let v = eval(e, ctx)?;
            Ok(Scalar::Number(-number(&v, "negation")?))
        }
        Expr::Binary(op, l, r) => binary(*op, eval(l, ctx)?, eval(r, ctx)?),
        Expr::Call(f, args) => {
            let values = args
                .iter()
                .map(|a| eval(a, ctx).and_then(|v| number(&v, f.name())))
                .collect::<Result<Vec<f64>, _>>()?;
            call(*f, &values).map(Scalar::Number)
        }
    }
}

fn binary(op: BinaryOp, l: Scalar, r: Scalar) -> Result<Scalar, ExpressionError> {
    if let (Scalar::Text(a), Scalar::Text(b)) = (&l, &r) {
        return match op {
            BinaryOp::Add => Ok(Scalar::Text(format!("{a}{b}"))),
            BinaryOp::Eq => Ok(Scalar::Bool(a == b)),
            BinaryOp::Ne => Ok(Scalar::Bool(a != b)),
            _ => Err(ExpressionError::TypeMismatch(format!(
                "{op:?} is not defined for strings"
            ))),
        };
    }
    let a = number(&l, "arithmetic")?;
    let b = number(&r, "arithmetic")?;
    Ok(match op {
        BinaryOp::Add => Scalar::Number(a + b),
        BinaryOp::Sub => Scalar::Number(a - b),
        BinaryOp::Mul => Scalar::Number(a * b),
        BinaryOp::Div if b == 0.0 => return Err(ExpressionError::DivisionByZero),
        BinaryOp::Div => Scalar::Number(a / b),
        BinaryOp::Mod if b == 0.0 => return Err(ExpressionError::DivisionByZero),
        BinaryOp::Mod => Scalar::Number(a % b),
        BinaryOp::Pow => Scalar::Number(a.powf(b)),
        BinaryOp::Eq => Scalar::Bool((a - b).abs() < f64::EPSILON),
        BinaryOp::Ne => Scalar::Bool((a - b).abs() >= f64::EPSILON),
        BinaryOp::Lt => Scalar::Bool(a < b),
        BinaryOp::Le => Scalar::Bool(a <= b),
        BinaryOp::Gt => Scalar::Bool(a > b),
        BinaryOp::Ge => Scalar::Bool(a >= b),
    })
}

fn call(f: Function, args: &[f64]) -> Result<f64, ExpressionError> {
    let arity = |expected: &'static str| ExpressionError::Arity {
        function: f.name(),
        expected,
        found: args.len(),
    };
    let domain = |what: &str| ExpressionError::Domain(format!("{}(): {what}", f.name()));

    let one = || match args {
        [x] => Ok(*x),
        _ => Err(arity("1")),
    };
    let two = || match args {
        [x, y] => Ok((*x, *y)),
        _ => Err(arity("2")),
    };

    Ok(match f {
        Function::Abs => one()?.abs(),
        Function::Sqrt => {
            let x = one()?;
            if x < 0.0 {
                return Err(domain("negative argument"));
            }
            x.sqrt()
        }
        Function::Sin => one()?.to_radians().sin(),
        Function::Cos => one()?.to_radians().cos(),
        Function::Tan => one()?.to_radians().tan(),
        Function::Asin | Function::Acos => {
            let x = one()?;
            if !(-1.0..=1.0).contains(&x) {
                return Err(domain("argument outside [-1, 1]"));
            }
            if f == Function::Asin {
                x.asin().to_degrees()
            } else {
                x.acos().to_degrees()
            }
        }
        Function::Atan => one()?.atan().to_degrees(),
        Function::Atan2 => {
            let (y, x) = two()?;
            y.atan2(x).to_degrees()
        }
        Function::Exp => one()?.exp(),
        Function::Log | Function::Log10 => {
            let x = one()?;
            if x <= 0.0 {
                return Err(domain("non-positive argument"));
            }
            if f == Function::Log {
                x.ln()
            } else {
                x.log10()
            }
        }
        Function::Pow => {
            let (x, y) = two()?;
            x.powf(y)
        }
        Function::Min | Function::Max => {
            if args.is_empty() {
                return Err(arity("1 or more"));
            }
            let fold = if f == Function::Min { f64::min } else { f64::max };
            args.iter().copied().reduce(fold).unwrap_or_default()
        }
        Function::Floor => one()?.floor(),
        Function::Ceil => one()?.ceil(),
        Function::Round => one()?.round(),
        Function::Trunc => one()?.trunc(),
        Function::Mod => {
            let (x, y) = two()?;
            if y == 0.0 {
                return Err(ExpressionError::DivisionByZero);
            }
            x % y
        }
        Function::Hypot => {
            let (x, y) = two()?;
            x.hypot(y)
        }
    })
}
