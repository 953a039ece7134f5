//! Attribute base expressions.
//!
//! A small arithmetic language over fixed-point numbers and `$id` variables:
//! `+ - * /`, unary minus, parentheses and the functions `floor`, `ceil`,
//! `round`, `min`, `max` and `abs`. Expressions persist as text and are parsed
//! once on load.

use core::fmt;
use core::str::FromStr;

use crate::error::{CalcResult, ErrorSeverity, SheetError};
use crate::fxp::{Fixed6, ParseFixedError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Function {
    Floor,
    Ceil,
    Round,
    Min,
    Max,
    Abs,
}

impl Function {
    const fn arity(self) -> usize {
        match self {
            Self::Min | Self::Max => 2,
            Self::Floor | Self::Ceil | Self::Round | Self::Abs => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    const fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
        }
    }

    const fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
        }
    }
}

/// Parsed attribute base expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Formula {
    Constant(Fixed6),
    /// `$id`, `$id.current` or `$id.maximum`.
    Variable(String),
    Negate(Box<Formula>),
    Binary(BinaryOp, Box<Formula>, Box<Formula>),
    Call(Function, Vec<Formula>),
}

impl Formula {
    pub fn constant(value: i64) -> Self {
        Self::Constant(Fixed6::from_int(value))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Variable names referenced anywhere in this expression.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Constant(_) => {}
            Self::Variable(name) => out.push(name),
            Self::Negate(inner) => inner.collect_variables(out),
            Self::Binary(_, lhs, rhs) => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Self::Call(_, args) => args.iter().for_each(|arg| arg.collect_variables(out)),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Binary(op, _, _) => op.precedence(),
            _ => 3,
        }
    }
}

impl Default for Formula {
    fn default() -> Self {
        Self::Constant(Fixed6::ZERO)
    }
}

/// Supplies variable values during evaluation.
pub trait VariableResolver {
    /// Value of `$name`. Unknown names resolve to zero.
    fn resolve(&mut self, name: &str) -> CalcResult<Fixed6>;
}

/// Evaluates `formula`, failing only on arithmetic errors.
pub fn evaluate(formula: &Formula, resolver: &mut dyn VariableResolver) -> CalcResult<Fixed6> {
    match formula {
        Formula::Constant(value) => Ok(*value),
        Formula::Variable(name) => resolver.resolve(name),
        Formula::Negate(inner) => Ok(-evaluate(inner, resolver)?),
        Formula::Binary(op, lhs, rhs) => {
            let lhs = evaluate(lhs, resolver)?;
            let rhs = evaluate(rhs, resolver)?;
            match op {
                BinaryOp::Add => lhs.checked_add(rhs),
                BinaryOp::Sub => lhs.checked_sub(rhs),
                BinaryOp::Mul => lhs.checked_mul(rhs),
                BinaryOp::Div => lhs.checked_div(rhs),
            }
        }
        Formula::Call(function, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(arg, resolver)?);
            }
            let first = values.first().copied().unwrap_or(Fixed6::ZERO);
            let second = values.get(1).copied().unwrap_or(Fixed6::ZERO);
            Ok(match function {
                Function::Floor => first.floor(),
                Function::Ceil => first.ceil(),
                Function::Round => first.round(),
                Function::Abs => first.abs(),
                Function::Min => first.min(second),
                Function::Max => first.max(second),
            })
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseExprError {
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected `{found}` at offset {offset}")]
    Unexpected { found: char, offset: usize },

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("`{function}` takes {expected} argument(s), found {found}")]
    Arity {
        function: Function,
        expected: usize,
        found: usize,
    },

    #[error("invalid number: {0}")]
    Number(#[from] ParseFixedError),
}

impl SheetError for ParseExprError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnexpectedEnd => "EXPR_UNEXPECTED_END",
            Self::Unexpected { .. } => "EXPR_UNEXPECTED_CHAR",
            Self::UnknownFunction(_) => "EXPR_UNKNOWN_FUNCTION",
            Self::Arity { .. } => "EXPR_ARITY",
            Self::Number(_) => "EXPR_INVALID_NUMBER",
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.src[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, wanted: char) -> Result<(), ParseExprError> {
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            Some(found) => Err(ParseExprError::Unexpected {
                found,
                offset: self.pos - found.len_utf8(),
            }),
            None => Err(ParseExprError::UnexpectedEnd),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let src: &'a str = self.src;
        let rest = &src[self.pos..];
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn expression(&mut self) -> Result<Formula, ParseExprError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.peek().and_then(|c| match c {
            '+' => Some(BinaryOp::Add),
            '-' => Some(BinaryOp::Sub),
            _ => None,
        }) {
            self.bump();
            let rhs = self.term()?;
            lhs = Formula::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Formula, ParseExprError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek().and_then(|c| match c {
            '*' => Some(BinaryOp::Mul),
            '/' => Some(BinaryOp::Div),
            _ => None,
        }) {
            self.bump();
            let rhs = self.unary()?;
            lhs = Formula::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Formula, ParseExprError> {
        match self.peek() {
            Some('-') => {
                self.bump();
                Ok(Formula::Negate(Box::new(self.unary()?)))
            }
            Some('+') => {
                self.bump();
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Formula, ParseExprError> {
        match self.peek() {
            None => Err(ParseExprError::UnexpectedEnd),
            Some('(') => {
                self.bump();
                let inner = self.expression()?;
                self.expect(')')?;
                Ok(inner)
            }
            Some('$') => {
                self.bump();
                let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                if name.is_empty() {
                    return Err(self.unexpected_or_end());
                }
                Ok(Formula::Variable(name.to_lowercase()))
            }
            Some(c) if c.is_ascii_digit() || c == '.' => {
                let digits = self.take_while(|c| c.is_ascii_digit() || c == '.');
                Ok(Formula::Constant(digits.parse()?))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                let function: Function = name
                    .parse()
                    .map_err(|_| ParseExprError::UnknownFunction(name.to_string()))?;
                self.expect('(')?;
                let mut args = vec![self.expression()?];
                while self.peek() == Some(',') {
                    self.bump();
                    args.push(self.expression()?);
                }
                self.expect(')')?;
                if args.len() != function.arity() {
                    return Err(ParseExprError::Arity {
                        function,
                        expected: function.arity(),
                        found: args.len(),
                    });
                }
                Ok(Formula::Call(function, args))
            }
            Some(found) => Err(ParseExprError::Unexpected {
                found,
                offset: self.pos,
            }),
        }
    }

    fn unexpected_or_end(&mut self) -> ParseExprError {
        let offset = self.pos;
        match self.peek() {
            Some(found) => ParseExprError::Unexpected { found, offset },
            None => ParseExprError::UnexpectedEnd,
        }
    }
}

impl FromStr for Formula {
    type Err = ParseExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { src: s, pos: 0 };
        let formula = parser.expression()?;
        match parser.peek() {
            None => Ok(formula),
            Some(found) => Err(ParseExprError::Unexpected {
                found,
                offset: parser.pos,
            }),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Formula, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({operand})")
    } else {
        write!(f, "{operand}")
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "{value}"),
            Self::Variable(name) => write!(f, "${name}"),
            Self::Negate(inner) => {
                f.write_str("-")?;
                write_operand(f, inner, inner.precedence() < 3)
            }
            Self::Binary(op, lhs, rhs) => {
                let precedence = op.precedence();
                write_operand(f, lhs, lhs.precedence() < precedence)?;
                write!(f, " {} ", op.symbol())?;
                // Right operands of equal precedence keep their grouping.
                write_operand(f, rhs, rhs.precedence() <= precedence && rhs.precedence() < 3)
            }
            Self::Call(function, args) => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

serde_via_str!(Formula);

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::error::ArithmeticError;

    struct Vars(BTreeMap<&'static str, Fixed6>);

    impl VariableResolver for Vars {
        fn resolve(&mut self, name: &str) -> CalcResult<Fixed6> {
            Ok(self.0.get(name).copied().unwrap_or(Fixed6::ZERO))
        }
    }

    fn vars() -> Vars {
        Vars(BTreeMap::from([
            ("dx", Fixed6::from_int(12)),
            ("ht", Fixed6::from_int(11)),
            ("hp.current", Fixed6::from_int(4)),
        ]))
    }

    fn eval(text: &str) -> Fixed6 {
        evaluate(&text.parse().unwrap(), &mut vars()).unwrap()
    }

    #[test]
    fn basic_speed_expression() {
        assert_eq!(eval("($dx+$ht)/4"), Fixed6::from_decimal(575, 2));
        assert_eq!(eval("floor(($dx + $ht) / 4)"), Fixed6::from_int(5));
    }

    #[test]
    fn precedence_and_unary_minus() {
        assert_eq!(eval("2 + 3 * 4"), Fixed6::from_int(14));
        assert_eq!(eval("-(2 + 3) * 2"), Fixed6::from_int(-10));
        assert_eq!(eval("10 - 4 - 3"), Fixed6::from_int(3));
        assert_eq!(eval("max($hp.current, 10) + min(1, abs(-3))"), Fixed6::from_int(11));
        assert_eq!(eval("round(2.5) + ceil(0.1)"), Fixed6::from_int(4));
    }

    #[test]
    fn unknown_variables_resolve_to_zero() {
        assert_eq!(eval("$luck + 1"), Fixed6::ONE);
    }

    #[test]
    fn display_reparses_to_the_same_tree() {
        for text in ["($dx + $ht) / 4", "10 - (4 - 3)", "-($dx * 2)", "max($st, 10) / 2"] {
            let formula: Formula = text.parse().unwrap();
            assert_eq!(formula.to_string(), text);
            assert_eq!(formula.to_string().parse::<Formula>().unwrap(), formula);
        }
    }

    #[test]
    fn parse_errors() {
        assert_eq!("".parse::<Formula>(), Err(ParseExprError::UnexpectedEnd));
        assert_eq!("(1 + 2".parse::<Formula>(), Err(ParseExprError::UnexpectedEnd));
        assert!(matches!("sqrt(4)".parse::<Formula>(), Err(ParseExprError::UnknownFunction(_))));
        assert!(matches!("min(1)".parse::<Formula>(), Err(ParseExprError::Arity { .. })));
        assert!(matches!("1 # 2".parse::<Formula>(), Err(ParseExprError::Unexpected { found: '#', .. })));
    }

    #[test]
    fn division_by_zero_propagates() {
        let formula: Formula = "$dx / ($ht - 11)".parse().unwrap();
        assert_eq!(evaluate(&formula, &mut vars()), Err(ArithmeticError::DivisionByZero));
    }

    #[test]
    fn collects_variables() {
        let formula: Formula = "($dx + $ht) / 4".parse().unwrap();
        assert_eq!(formula.variables(), ["dx", "ht"]);
    }
}
