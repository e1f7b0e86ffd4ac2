//! Operator definitions for DSL expressions.
//!
//! Provides enums for binary, logical, unary, and assignment operators along
//! with precedence information for the Pratt parser.

use std::fmt;

use crate::lexer::TokenKind;

/// Binding power of the ternary `?:` operator.
pub const TERNARY_BP: u8 = 2;
/// Binding power of postfix `.name`, `(args)` and `[index]`.
pub const POSTFIX_BP: u8 = 19;

/// Arithmetic and comparison operators.
///
/// Organized by precedence from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Equality
    /// `==`
    Equal,
    /// `!=`
    NotEqual,

    // Relational
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,

    // Additive
    /// `+`
    Add,
    /// `-`
    Sub,

    // Multiplicative
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
}

impl BinaryOp {
    /// Get the binding power (precedence) for this operator.
    ///
    /// Higher values bind more tightly. Returns (left_bp, right_bp); every
    /// binary operator is left-associative.
    pub fn binding_power(&self) -> (u8, u8) {
        use BinaryOp::*;
        match self {
            Equal | NotEqual => (9, 10),
            Less | LessEqual | Greater | GreaterEqual => (11, 12),
            Add | Sub => (13, 14),
            Mul | Div | Mod => (15, 16),
        }
    }

    /// Try to convert a token kind to a binary operator.
    pub fn from_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            EqualEqual => BinaryOp::Equal,
            NotEqual => BinaryOp::NotEqual,
            Less => BinaryOp::Less,
            LessEqual => BinaryOp::LessEqual,
            Greater => BinaryOp::Greater,
            GreaterEqual => BinaryOp::GreaterEqual,
            Plus => BinaryOp::Add,
            Minus => BinaryOp::Sub,
            Star => BinaryOp::Mul,
            Slash => BinaryOp::Div,
            Percent => BinaryOp::Mod,
            _ => return None,
        })
    }

    /// Check if this operator yields a boolean.
    pub fn is_comparison(&self) -> bool {
        use BinaryOp::*;
        matches!(
            self,
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual
        )
    }

    /// The operator's spelling, identical in the DSL and the host language.
    pub fn as_str(&self) -> &'static str {
        use BinaryOp::*;
        match self {
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short-circuit logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    /// `or`
    Or,
    /// `and`
    And,
}

impl LogicalOp {
    /// Get the binding power (precedence) for this operator.
    pub fn binding_power(&self) -> (u8, u8) {
        match self {
            LogicalOp::Or => (3, 4),
            LogicalOp::And => (5, 6),
        }
    }

    /// Try to convert a token kind to a logical operator.
    pub fn from_token(token: TokenKind) -> Option<Self> {
        match token {
            TokenKind::Or => Some(LogicalOp::Or),
            TokenKind::And => Some(LogicalOp::And),
            _ => None,
        }
    }

    /// The DSL keyword for this operator.
    pub fn keyword(&self) -> &'static str {
        match self {
            LogicalOp::Or => "or",
            LogicalOp::And => "and",
        }
    }

    /// The host-language spelling for this operator.
    pub fn host_op(&self) -> &'static str {
        match self {
            LogicalOp::Or => "||",
            LogicalOp::And => "&&",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Prefix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `not x`
    Not,
}

impl UnaryOp {
    /// Get the binding power used to parse the operand.
    ///
    /// `not` binds looser than comparisons so `not a > b` negates the whole
    /// comparison.
    pub fn binding_power(&self) -> u8 {
        match self {
            UnaryOp::Not => 8,
            UnaryOp::Neg | UnaryOp::Plus => 17,
        }
    }

    /// Try to convert a token kind to a unary operator.
    pub fn from_token(token: TokenKind) -> Option<Self> {
        match token {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Not => Some(UnaryOp::Not),
            _ => None,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "not ",
        })
    }
}

/// Compound assignment operators, desugared by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
}

impl AssignOp {
    /// Try to convert a token kind to a compound assignment operator.
    pub fn from_token(token: TokenKind) -> Option<Self> {
        match token {
            TokenKind::PlusAssign => Some(AssignOp::Add),
            TokenKind::MinusAssign => Some(AssignOp::Sub),
            TokenKind::StarAssign => Some(AssignOp::Mul),
            TokenKind::SlashAssign => Some(AssignOp::Div),
            _ => None,
        }
    }

    /// The binary operator applied by this assignment.
    pub fn binary_op(&self) -> BinaryOp {
        match self {
            AssignOp::Add => BinaryOp::Add,
            AssignOp::Sub => BinaryOp::Sub,
            AssignOp::Mul => BinaryOp::Mul,
            AssignOp::Div => BinaryOp::Div,
        }
    }
}
