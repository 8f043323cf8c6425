//! Expression syntax tree

/// Reference as written in a formula, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// Written with a leading `.`, always relative to the owner
    pub relative: bool,
    /// Written as `<<Label>>.Path`
    pub label: Option<String>,
    pub segments: Vec<String>,
}

impl Identifier {
    /// Text form, as it would be written
    #[must_use]
    pub fn to_text(&self) -> String {
        let path = self.segments.join(".");
        match (&self.label, self.relative) {
            (Some(label), _) => format!("<<{label}>>.{path}"),
            (None, true) => format!(".{path}"),
            (None, false) => path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Built-in functions; trigonometry works in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Exp,
    Log,
    Log10,
    Pow,
    Min,
    Max,
    Floor,
    Ceil,
    Round,
    Trunc,
    Mod,
    Hypot,
}

impl Function {
    const NAMES: [(&'static str, Function); 21] = [
        ("abs", Function::Abs),
        ("sqrt", Function::Sqrt),
        ("sin", Function::Sin),
        ("cos", Function::Cos),
        ("tan", Function::Tan),
        ("asin", Function::Asin),
        ("acos", Function::Acos),
        ("atan", Function::Atan),
        ("atan2", Function::Atan2),
        ("exp", Function::Exp),
        ("log", Function::Log),
        ("log10", Function::Log10),
        ("pow", Function::Pow),
        ("min", Function::Min),
        ("max", Function::Max),
        ("floor", Function::Floor),
        ("ceil", Function::Ceil),
        ("round", Function::Round),
        ("trunc", Function::Trunc),
        ("mod", Function::Mod),
        ("hypot", Function::Hypot),
    ];

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, f)| *f == self)
            .map_or("?", |(n, _)| n)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Ident(Identifier),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

impl Expr {
    pub(crate) fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// Every identifier in evaluation order
    #[must_use]
    pub fn identifiers(&self) -> Vec<&Identifier> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a Identifier>) {
        match self {
            Self::Ident(id) => out.push(id),
            Self::Unary(_, e) => e.collect_identifiers(out),
            Self::Binary(_, l, r) => {
                l.collect_identifiers(out);
                r.collect_identifiers(out);
            }
            Self::Call(_, args) => {
                for a in args {
                    a.collect_identifiers(out);
                }
            }
            Self::Number(_) | Self::Text(_) => {}
        }
    }
}
