//! Expression AST nodes for the DSL.
//!
//! Provides nodes for every expression the generator lowers:
//! - Literals (numbers, strings, booleans) and identifiers
//! - Binary, logical and unary operations
//! - Ternary conditionals
//! - Calls, with named arguments bundled into a trailing object
//! - Member access, both `x.y` and computed `x[k]`
//!
//! # Expression Precedence
//!
//! The parser uses Pratt parsing with the following precedence levels:
//! 1. Ternary (?:) - right associative
//! 2. Logical OR (or)
//! 3. Logical AND (and)
//! 4. Logical NOT (not)
//! 5. Equality (==, !=)
//! 6. Relational (<, <=, >, >=)
//! 7. Additive (+, -)
//! 8. Multiplicative (*, /, %)
//! 9. Prefix unary (-, +)
//! 10. Postfix (call, index, member)

use std::fmt;

use pinegen_core::{Span, quote, render_plain};

use super::ops::{BinaryOp, LogicalOp, UnaryOp};

/// An identifier with its source location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ident<'ast> {
    /// The identifier text.
    pub name: &'ast str,
    /// Source location.
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    /// Create a new identifier.
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Literal value
    Literal(LiteralExpr<'ast>),
    /// Identifier reference
    Ident(Ident<'ast>),
    /// Arithmetic or comparison
    Binary(&'ast BinaryExpr<'ast>),
    /// `and` / `or`
    Logical(&'ast LogicalExpr<'ast>),
    /// Prefix operation
    Unary(&'ast UnaryExpr<'ast>),
    /// Ternary conditional (? :)
    Conditional(&'ast ConditionalExpr<'ast>),
    /// Function call
    Call(&'ast CallExpr<'ast>),
    /// Member access (`x.y`) or series subscript (`x[k]`)
    Member(&'ast MemberExpr<'ast>),
    /// Named-argument bundle
    Object(&'ast ObjectExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Ident(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Logical(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Conditional(e) => e.span,
            Self::Call(e) => e.span,
            Self::Member(e) => e.span,
            Self::Object(e) => e.span,
        }
    }

    /// The identifier name, if this is a bare identifier.
    pub fn as_ident(&self) -> Option<&'ast str> {
        match self {
            Self::Ident(ident) => Some(ident.name),
            _ => None,
        }
    }

    /// The number, if this is a numeric literal.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Literal(LiteralExpr {
                kind: LiteralKind::Number(n),
                ..
            }) => Some(*n),
            _ => None,
        }
    }

    /// The string contents, if this is a string literal.
    pub fn as_string(&self) -> Option<&'ast str> {
        match self {
            Self::Literal(LiteralExpr {
                kind: LiteralKind::String(s),
                ..
            }) => Some(s),
            _ => None,
        }
    }

    /// The dotted path of an identifier or chain of named members
    /// (`syminfo.tickerid`, `ta.sma`).
    pub fn qualified_name(&self) -> Option<String> {
        match self {
            Self::Ident(ident) => Some(ident.name.to_string()),
            Self::Member(member) => match member.property {
                MemberProperty::Field(field) => {
                    let object = member.object.qualified_name()?;
                    Some(format!("{object}.{}", field.name))
                }
                MemberProperty::Index(_) => None,
            },
            _ => None,
        }
    }

    /// Precedence used when rendering this expression back to source.
    fn precedence(&self) -> u8 {
        match self {
            Self::Conditional(_) => 1,
            Self::Logical(e) => e.op.binding_power().0,
            Self::Unary(e) if e.op == UnaryOp::Not => UnaryOp::Not.binding_power(),
            Self::Binary(e) => e.op.binding_power().0,
            Self::Unary(_) => UnaryOp::Neg.binding_power(),
            _ => u8::MAX,
        }
    }
}

/// Write `child`, parenthesized when it binds looser than `min`.
fn write_operand(f: &mut fmt::Formatter<'_>, child: &Expr<'_>, min: u8) -> fmt::Result {
    if child.precedence() < min {
        write!(f, "({child})")
    } else {
        write!(f, "{child}")
    }
}

/// Renders the expression as normalized DSL text.
///
/// The rendering is the textual identity used by call-site fingerprints:
/// grouping parentheses appear only where precedence requires them.
impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => match lit.kind {
                LiteralKind::Number(n) => f.write_str(&render_plain(n)),
                LiteralKind::Bool(b) => write!(f, "{b}"),
                LiteralKind::String(s) => f.write_str(&quote(s)),
            },
            Self::Ident(ident) => f.write_str(ident.name),
            Self::Binary(bin) => {
                let prec = bin.op.binding_power().0;
                write_operand(f, bin.left, prec)?;
                write!(f, " {} ", bin.op)?;
                write_operand(f, bin.right, prec + 1)
            }
            Self::Logical(log) => {
                let prec = log.op.binding_power().0;
                write_operand(f, log.left, prec)?;
                write!(f, " {} ", log.op)?;
                write_operand(f, log.right, prec + 1)
            }
            Self::Unary(un) => {
                write!(f, "{}", un.op)?;
                write_operand(f, un.argument, self.precedence())
            }
            Self::Conditional(cond) => {
                write_operand(f, cond.test, 2)?;
                write!(f, " ? ")?;
                write_operand(f, cond.consequent, 2)?;
                write!(f, " : {}", cond.alternate)
            }
            Self::Call(call) => {
                write!(f, "{}(", call.callee)?;
                for (i, arg) in call.arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Member(member) => {
                write_operand(f, member.object, u8::MAX)?;
                match member.property {
                    MemberProperty::Field(field) => write!(f, ".{}", field.name),
                    MemberProperty::Index(index) => write!(f, "[{index}]"),
                }
            }
            Self::Object(obj) => {
                for (i, prop) in obj.properties.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", prop.key.name, prop.value)?;
                }
                Ok(())
            }
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    /// The literal kind
    pub kind: LiteralKind<'ast>,
    /// Source location
    pub span: Span,
}

/// The kind of literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    /// Numeric literal; the DSL does not distinguish int from float
    Number(f64),
    /// Boolean literal
    Bool(bool),
    /// String literal with escapes resolved
    String(&'ast str),
}

/// A binary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinaryOp,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

/// A logical `and` / `or`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicalExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: LogicalOp,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

/// A prefix unary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub argument: &'ast Expr<'ast>,
    pub span: Span,
}

/// A ternary conditional `test ? consequent : alternate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionalExpr<'ast> {
    pub test: &'ast Expr<'ast>,
    pub consequent: &'ast Expr<'ast>,
    pub alternate: &'ast Expr<'ast>,
    pub span: Span,
}

/// A function call.
///
/// Named arguments (`title="x"`) are collected, in source order, into a
/// single [`ObjectExpr`] appended after the positional arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: &'ast Expr<'ast>,
    pub arguments: &'ast [Expr<'ast>],
    pub span: Span,
}

impl<'ast> CallExpr<'ast> {
    /// The dotted callee name (`ta.sma`, `plot`), if the callee is a name.
    pub fn callee_name(&self) -> Option<String> {
        self.callee.qualified_name()
    }

    /// Positional arguments (everything before the named-argument bundle).
    pub fn positional(&self) -> &'ast [Expr<'ast>] {
        let args = self.arguments;
        match args.last() {
            Some(Expr::Object(_)) => &args[..args.len() - 1],
            _ => args,
        }
    }

    /// The named-argument bundle, if any.
    pub fn named(&self) -> Option<&'ast ObjectExpr<'ast>> {
        match self.arguments.last() {
            Some(Expr::Object(obj)) => Some(*obj),
            _ => None,
        }
    }

    /// Look up a named argument by key.
    pub fn named_arg(&self, key: &str) -> Option<&'ast Expr<'ast>> {
        self.named().and_then(|obj| obj.get(key))
    }

    /// Positional argument `index`, falling back to the named argument `key`.
    pub fn arg(&self, index: usize, key: &str) -> Option<&'ast Expr<'ast>> {
        self.positional().get(index).or_else(|| self.named_arg(key))
    }
}

/// The property side of a member expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemberProperty<'ast> {
    /// `object.field`
    Field(Ident<'ast>),
    /// `object[index]`
    Index(&'ast Expr<'ast>),
}

/// Member access or series subscript.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub property: MemberProperty<'ast>,
    pub span: Span,
}

impl<'ast> MemberExpr<'ast> {
    /// Whether this is a computed access (`x[k]`).
    pub fn is_computed(&self) -> bool {
        matches!(self.property, MemberProperty::Index(_))
    }
}

/// One `key=value` entry of a named-argument bundle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Property<'ast> {
    pub key: Ident<'ast>,
    pub value: Expr<'ast>,
}

/// A bundle of named arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectExpr<'ast> {
    pub properties: &'ast [Property<'ast>],
    pub span: Span,
}

impl<'ast> ObjectExpr<'ast> {
    /// Look up a property value by key.
    pub fn get(&self, key: &str) -> Option<&'ast Expr<'ast>> {
        self.properties
            .iter()
            .find(|p| p.key.name == key)
            .map(|p| &p.value)
    }
}
