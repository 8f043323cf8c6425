//! Formula grammar
//!
//! Numbers may carry a unit suffix (`10mm`, `2.5in`, `90deg`, `45°`), which is
//! folded into the literal: lengths become millimetres, angles degrees.
//! References are dotted paths (`Box.Placement.Base.x`), owner-relative paths
//! with a leading dot (`.Placement.Base.y`) or label references
//! (`<<My Box>>.Length`). `<<text>>` without a path is a string literal.

use std::f64::consts::{E, PI};

use chumsky::{pratt::*, prelude::*};

use crate::ast::{BinaryOp, Expr, Function, Identifier, UnaryOp};
use crate::error::ExpressionError;

type ParseError<'src> = Rich<'src, char>;

fn unit_factor(unit: &str) -> Option<f64> {
    Some(match unit {
        "mm" | "deg" => 1.0,
        "um" => 1.0e-3,
        "cm" => 10.0,
        "dm" => 100.0,
        "m" => 1000.0,
        "km" => 1.0e6,
        "in" => 25.4,
        "ft" => 304.8,
        "rad" => 180.0 / PI,
        _ => return None,
    })
}

fn parser<'src>() -> impl Parser<'src, &'src str, Expr, extra::Err<ParseError<'src>>> {
    recursive(|expr| {
        let exponent = one_of("eE")
            .then(one_of("+-").or_not())
            .then(text::digits(10));
        let number = text::int(10)
            .then(just('.').then(text::digits(10)).or_not())
            .then(exponent.or_not())
            .to_slice()
            .try_map(|s: &str, span| {
                s.parse::<f64>()
                    .map_err(|e| Rich::custom(span, e.to_string()))
            });
        let unit = choice((
            just('°').to(1.0),
            text::ident().try_map(|u: &str, span| {
                unit_factor(u).ok_or_else(|| Rich::custom(span, format!("unknown unit '{u}'")))
            }),
        ));
        let quantity = number
            .then(unit.or_not())
            .map(|(value, factor)| Expr::Number(value * factor.unwrap_or(1.0)));

        let quoted = just('"')
            .ignore_then(none_of('"').repeated().to_slice())
            .then_ignore(just('"'))
            .map(|s: &str| Expr::Text(s.to_string()));

        let segments = text::ident()
            .map(|s: &str| s.to_string())
            .separated_by(just('.'))
            .at_least(1)
            .collect::<Vec<_>>();

        let labelled = just("<<")
            .ignore_then(any().and_is(just(">>").not()).repeated().to_slice())
            .then_ignore(just(">>"))
            .then(just('.').ignore_then(segments.clone()).or_not())
            .map(|(label, segments): (&str, Option<Vec<String>>)| match segments {
                Some(segments) => Expr::Ident(Identifier {
                    relative: false,
                    label: Some(label.to_string()),
                    segments,
                }),
                None => Expr::Text(label.to_string()),
            });

        let call = text::ident()
            .try_map(|name: &str, span| {
                Function::from_name(name)
                    .ok_or_else(|| Rich::custom(span, format!("unknown function '{name}'")))
            })
            .then(
                expr.clone()
                    .separated_by(just(','))
                    .collect::<Vec<_>>()
                    .delimited_by(just('('), just(')')),
            )
            .map(|(function, args)| Expr::Call(function, args));

        let path = just('.')
            .or_not()
            .then(segments)
            .map(|(dot, segments): (Option<char>, Vec<String>)| {
                if dot.is_none() && segments.len() == 1 {
                    match segments[0].as_str() {
                        "pi" => return Expr::Number(PI),
                        "e" => return Expr::Number(E),
                        _ => {}
                    }
                }
                Expr::Ident(Identifier {
                    relative: dot.is_some(),
                    label: None,
                    segments,
                })
            });

        let parens = expr.delimited_by(just('('), just(')'));

        let atom = choice((quantity, quoted, labelled, call, path, parens)).padded();

        let product = choice((
            just('*').to(BinaryOp::Mul),
            just('/').to(BinaryOp::Div),
            just('%').to(BinaryOp::Mod),
        ))
        .padded();
        let sum = choice((just('+').to(BinaryOp::Add), just('-').to(BinaryOp::Sub))).padded();
        let compare = choice((
            just("==").to(BinaryOp::Eq),
            just("!=").to(BinaryOp::Ne),
            just("<=").to(BinaryOp::Le),
            just(">=").to(BinaryOp::Ge),
            just('<').to(BinaryOp::Lt),
            just('>').to(BinaryOp::Gt),
        ))
        .padded();

        atom.pratt((
            infix(right(9), just('^').padded(), |l, _, r, _| {
                Expr::binary(BinaryOp::Pow, l, r)
            }),
            prefix(8, just('-').padded(), |_, r, _| {
                Expr::Unary(UnaryOp::Neg, Box::new(r))
            }),
            prefix(8, just('+').padded(), |_, r, _| r),
            infix(left(7), product, |l, op, r, _| Expr::binary(op, l, r)),
            infix(left(5), sum, |l, op, r, _| Expr::binary(op, l, r)),
            infix(left(3), compare, |l, op, r, _| Expr::binary(op, l, r)),
        ))
    })
}

/// Parse formula text
///
/// # Errors
/// [`ExpressionError::Parse`] with every diagnostic joined.
pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
    parser()
        .then_ignore(end())
        .parse(source)
        .into_result()
        .map_err(|errors| ExpressionError::Parse {
            source_text: source.to_string(),
            message: errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f64) -> Expr {
        Expr::Number(v)
    }

    #[test]
    fn precedence() {
        let e = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            e,
            Expr::binary(
                BinaryOp::Add,
                num(1.0),
                Expr::binary(BinaryOp::Mul, num(2.0), num(3.0))
            )
        );
    }

    #[test]
    fn modulo_in_parentheses() {
        let e = parse("2*(5%3)").unwrap();
        assert_eq!(
            e,
            Expr::binary(
                BinaryOp::Mul,
                num(2.0),
                Expr::binary(BinaryOp::Mod, num(5.0), num(3.0))
            )
        );
    }

    #[test]
    fn power_is_right_associative_and_binds_tighter_than_negation() {
        let e = parse("-2^3^2").unwrap();
        let inner = Expr::binary(BinaryOp::Pow, num(3.0), num(2.0));
        assert_eq!(
            e,
            Expr::Unary(
                UnaryOp::Neg,
                Box::new(Expr::binary(BinaryOp::Pow, num(2.0), inner))
            )
        );
    }

    #[test]
    fn units_fold_into_literals() {
        assert_eq!(parse("2cm").unwrap(), num(20.0));
        assert_eq!(parse("1in").unwrap(), num(25.4));
        assert_eq!(parse("45°").unwrap(), num(45.0));
        assert!(parse("3parsec").is_err());
    }

    #[test]
    fn identifiers() {
        let e = parse("Obj1.Placement.Rotation.Angle").unwrap();
        let Expr::Ident(id) = e else {
            panic!("expected identifier")
        };
        assert!(!id.relative);
        assert_eq!(id.segments, vec!["Obj1", "Placement", "Rotation", "Angle"]);

        let Expr::Ident(id) = parse(".Placement.Base.x").unwrap() else {
            panic!("expected identifier")
        };
        assert!(id.relative);
        assert_eq!(id.to_text(), ".Placement.Base.x");
    }

    #[test]
    fn labels_and_strings() {
        let Expr::Ident(id) = parse("<<My Box>>.Length").unwrap() else {
            panic!("expected identifier")
        };
        assert_eq!(id.label.as_deref(), Some("My Box"));
        assert_eq!(parse("<<hello>>").unwrap(), Expr::Text("hello".into()));
        assert_eq!(parse("\"hi\"").unwrap(), Expr::Text("hi".into()));
    }

    #[test]
    fn calls_and_constants() {
        assert_eq!(
            parse("max(1, 2, 3)").unwrap(),
            Expr::Call(Function::Max, vec![num(1.0), num(2.0), num(3.0)])
        );
        assert_eq!(parse("pi").unwrap(), num(PI));
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(parse("1 +"), Err(ExpressionError::Parse { .. })));
        assert!(parse("(1").is_err());
        assert!(parse("").is_err());
    }
}
