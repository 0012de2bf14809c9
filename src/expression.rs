//! Expression parsing and compilation
//!
//! Rate laws, assignment rules and compartment sizes are written as plain
//! algebraic formulas (`f_gly * GPI_Vmax * (glc6p - fru6p/GPI_keq)`). This module
//! parses them with `meval` into an RPN token stream and compiles that stream into
//! a small stack program whose variables are resolved to slot indices once, at
//! network construction. Evaluating a compiled expression is then a linear pass
//! over the program reading from a flat binding slice.
//!
//! Evaluation never fails: domain errors produce IEEE infinities or NaNs which
//! are detected later by the integrator.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

use meval::tokenizer::{Operation, Token};
use meval::Expr;
use thiserror::Error;

/// Errors raised while parsing or compiling an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Could not parse '{expression}': {message}")]
    Parse { expression: String, message: String },
    #[error("Unresolved symbol '{0}'")]
    UnresolvedSymbol(String),
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
    #[error("Function '{name}' does not accept {given} argument(s)")]
    Arity { name: String, given: usize },
    #[error("Unsupported operator '{0}'")]
    UnsupportedOperator(String),
    #[error("Malformed expression '{0}'")]
    Malformed(String),
}

/// A parsed, not yet compiled, expression.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    rpn: Expr,
}

impl Expression {
    /// Parses an expression string.
    ///
    /// # Arguments
    ///
    /// * `source` - The formula, e.g. `"k1 * A - k2 * B"`
    ///
    /// # Returns
    ///
    /// The parsed expression or an [`ExpressionError::Parse`] error.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let rpn: Expr = source.parse().map_err(|e: meval::Error| ExpressionError::Parse {
            expression: source.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            source: source.to_string(),
            rpn,
        })
    }

    /// The original formula text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Extracts the symbols referenced by the expression.
    ///
    /// Symbols are returned once each, in order of first appearance in the RPN
    /// stream. Function names are not symbols.
    pub fn symbols(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rpn
            .iter()
            .filter_map(|token| match token {
                Token::Var(v) if seen.insert(v.clone()) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    /// Names of all functions called by the expression.
    pub fn functions(&self) -> Vec<String> {
        self.rpn
            .iter()
            .filter_map(|token| match token {
                Token::Func(name, _) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Compiles the expression into a slot-indexed program.
    ///
    /// `resolve` maps each symbol to its slot in the binding vector. Symbols that
    /// do not resolve fall back to the built-in constants `pi` and `e`; anything
    /// else is an [`ExpressionError::UnresolvedSymbol`].
    pub fn compile<F>(&self, resolve: F) -> Result<CompiledExpression, ExpressionError>
    where
        F: Fn(&str) -> Option<usize>,
    {
        let mut program = Vec::with_capacity(self.rpn.len());
        let mut depth: usize = 0;
        let mut max_depth: usize = 0;

        for token in self.rpn.iter() {
            let (instruction, pops, pushes) = match token {
                Token::Number(v) => (Instruction::Const(*v), 0, 1),
                Token::Var(name) => match resolve(name) {
                    Some(slot) => (Instruction::Load(slot), 0, 1),
                    None => match builtin_constant(name) {
                        Some(v) => (Instruction::Const(v), 0, 1),
                        None => return Err(ExpressionError::UnresolvedSymbol(name.clone())),
                    },
                },
                Token::Binary(op) => (Instruction::Binary(BinaryOp::from(*op)), 2, 1),
                Token::Unary(Operation::Minus) => (Instruction::Negate, 1, 1),
                Token::Unary(Operation::Plus) => continue,
                Token::Unary(op) => {
                    return Err(ExpressionError::UnsupportedOperator(format!("{op:?}")))
                }
                Token::Func(name, Some(n)) => {
                    let function = Function::from_name(name)
                        .ok_or_else(|| ExpressionError::UnknownFunction(name.clone()))?;
                    if !function.accepts(*n) {
                        return Err(ExpressionError::Arity {
                            name: name.clone(),
                            given: *n,
                        });
                    }
                    (Instruction::Call(function, *n), *n, 1)
                }
                _ => return Err(ExpressionError::Malformed(self.source.clone())),
            };

            if depth < pops {
                return Err(ExpressionError::Malformed(self.source.clone()));
            }
            depth = depth - pops + pushes;
            max_depth = max_depth.max(depth);
            program.push(instruction);
        }

        if depth != 1 {
            return Err(ExpressionError::Malformed(self.source.clone()));
        }

        Ok(CompiledExpression {
            program,
            stack_depth: max_depth,
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Returns the value of a built-in constant, if `name` is one.
pub fn builtin_constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl From<Operation> for BinaryOp {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Plus => BinaryOp::Add,
            Operation::Minus => BinaryOp::Sub,
            Operation::Times => BinaryOp::Mul,
            Operation::Div => BinaryOp::Div,
            Operation::Rem => BinaryOp::Rem,
            Operation::Pow => BinaryOp::Pow,
        }
    }
}

impl BinaryOp {
    #[inline]
    fn apply(self, l: f64, r: f64) -> f64 {
        match self {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => l / r,
            BinaryOp::Rem => l % r,
            BinaryOp::Pow => l.powf(r),
        }
    }
}

/// Functions callable from formulas.
///
/// `log` with one argument is the natural logarithm; with two arguments it is
/// `log(base, x)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Function {
    Exp,
    Ln,
    Log,
    Log10,
    Log2,
    Sqrt,
    Abs,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Floor,
    Ceil,
    Pow,
    Max,
    Min,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let f = match name {
            "exp" => Function::Exp,
            "ln" => Function::Ln,
            "log" => Function::Log,
            "log10" => Function::Log10,
            "log2" => Function::Log2,
            "sqrt" => Function::Sqrt,
            "abs" => Function::Abs,
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "asin" => Function::Asin,
            "acos" => Function::Acos,
            "atan" => Function::Atan,
            "sinh" => Function::Sinh,
            "cosh" => Function::Cosh,
            "tanh" => Function::Tanh,
            "floor" => Function::Floor,
            "ceil" => Function::Ceil,
            "pow" => Function::Pow,
            "max" => Function::Max,
            "min" => Function::Min,
            _ => return None,
        };
        Some(f)
    }

    fn accepts(self, n: usize) -> bool {
        match self {
            Function::Max | Function::Min => n >= 1,
            Function::Pow => n == 2,
            Function::Log => n == 1 || n == 2,
            _ => n == 1,
        }
    }

    #[inline]
    fn apply(self, args: &[f64]) -> f64 {
        match self {
            Function::Exp => args[0].exp(),
            Function::Ln => args[0].ln(),
            Function::Log if args.len() == 2 => args[1].log(args[0]),
            Function::Log => args[0].ln(),
            Function::Log10 => args[0].log10(),
            Function::Log2 => args[0].log2(),
            Function::Sqrt => args[0].sqrt(),
            Function::Abs => args[0].abs(),
            Function::Sin => args[0].sin(),
            Function::Cos => args[0].cos(),
            Function::Tan => args[0].tan(),
            Function::Asin => args[0].asin(),
            Function::Acos => args[0].acos(),
            Function::Atan => args[0].atan(),
            Function::Sinh => args[0].sinh(),
            Function::Cosh => args[0].cosh(),
            Function::Tanh => args[0].tanh(),
            Function::Floor => args[0].floor(),
            Function::Ceil => args[0].ceil(),
            Function::Pow => args[0].powf(args[1]),
            // NaN arguments poison the result instead of being skipped by f64::max
            Function::Max => args.iter().copied().fold(f64::NEG_INFINITY, |acc, x| {
                if acc.is_nan() || x.is_nan() {
                    f64::NAN
                } else {
                    acc.max(x)
                }
            }),
            Function::Min => args.iter().copied().fold(f64::INFINITY, |acc, x| {
                if acc.is_nan() || x.is_nan() {
                    f64::NAN
                } else {
                    acc.min(x)
                }
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Instruction {
    Const(f64),
    Load(usize),
    Negate,
    Binary(BinaryOp),
    Call(Function, usize),
}

/// An expression compiled against a fixed slot layout.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    program: Vec<Instruction>,
    stack_depth: usize,
}

impl CompiledExpression {
    /// Evaluates the program against `bindings`.
    ///
    /// The caller guarantees that every slot referenced at compile time is in
    /// bounds of `bindings`.
    pub fn eval(&self, bindings: &[f64]) -> f64 {
        // Thread-local scratch stack, reused across calls to avoid allocating in the
        // derivative loop.
        thread_local! {
            static STACK: RefCell<Vec<f64>> = const { RefCell::new(Vec::new()) };
        }

        STACK.with(|buffer| {
            let mut stack = buffer.borrow_mut();
            stack.clear();
            if stack.capacity() < self.stack_depth {
                stack.reserve(self.stack_depth);
            }

            for instruction in &self.program {
                match *instruction {
                    Instruction::Const(v) => stack.push(v),
                    Instruction::Load(slot) => stack.push(bindings[slot]),
                    Instruction::Negate => {
                        if let Some(top) = stack.last_mut() {
                            *top = -*top;
                        }
                    }
                    Instruction::Binary(op) => {
                        let r = stack.pop().unwrap_or(f64::NAN);
                        if let Some(l) = stack.last_mut() {
                            *l = op.apply(*l, r);
                        }
                    }
                    Instruction::Call(function, n) => {
                        let start = stack.len().saturating_sub(n);
                        let value = function.apply(&stack[start..]);
                        stack.truncate(start);
                        stack.push(value);
                    }
                }
            }

            stack.pop().unwrap_or(f64::NAN)
        })
    }

    /// Slots read by this program.
    pub fn slots(&self) -> Vec<usize> {
        let mut slots: Vec<usize> = self
            .program
            .iter()
            .filter_map(|i| match i {
                Instruction::Load(s) => Some(*s),
                _ => None,
            })
            .collect();
        slots.sort_unstable();
        slots.dedup();
        slots
    }

    /// A program returning a constant.
    pub fn constant(value: f64) -> Self {
        Self {
            program: vec![Instruction::Const(value)],
            stack_depth: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn compile_with(source: &str, names: &[&str]) -> CompiledExpression {
        let slots: HashMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), i))
            .collect();
        Expression::parse(source)
            .unwrap()
            .compile(|s| slots.get(s).copied())
            .unwrap()
    }

    #[test]
    fn test_symbol_extraction() {
        let expr = Expression::parse("f_gly * (GLUT2_Vmax/GLUT2_k_glc) * (glc_ext - glc)").unwrap();
        assert_eq!(
            expr.symbols(),
            vec!["f_gly", "GLUT2_Vmax", "GLUT2_k_glc", "glc_ext", "glc"]
        );
    }

    #[test]
    fn test_symbols_are_unique() {
        let expr = Expression::parse("adp*adp/AK_keq + adp").unwrap();
        assert_eq!(expr.symbols(), vec!["adp", "AK_keq"]);
    }

    #[test]
    fn test_mass_action() {
        let program = compile_with("k1 * A - k2 * B", &["k1", "A", "k2", "B"]);
        assert_relative_eq!(program.eval(&[2.0, 3.0, 0.5, 4.0]), 4.0);
    }

    #[test]
    fn test_binary_operators() {
        let program = compile_with("a % b + b ^ 3 - a / b * 2", &["a", "b"]);
        // 7 % 2 + 8 - 7
        assert_relative_eq!(program.eval(&[7.0, 2.0]), 2.0);
    }

    #[test]
    fn test_hill_and_functions() {
        let program = compile_with("x^n / (x^n + k^n) * exp(-ln(2)/k * x)", &["x", "n", "k"]);
        let x: f64 = 5.0;
        let expected = 0.5 * (-(2f64.ln()) / 5.0 * x).exp();
        assert_relative_eq!(program.eval(&[x, 4.2, 5.0]), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_max_min_and_unary_minus() {
        let program = compile_with("max(0.0, ins - x) + min(a, b, -c)", &["ins", "x", "a", "b", "c"]);
        assert_relative_eq!(program.eval(&[1.0, 3.0, 5.0, 2.0, 1.0]), -1.0);
        assert_relative_eq!(program.eval(&[4.0, 3.0, 5.0, 2.0, -7.0]), 3.0);
    }

    #[test]
    fn test_two_argument_log() {
        let program = compile_with("log(10, x) + log(x)", &["x"]);
        assert_relative_eq!(program.eval(&[100.0]), 2.0 + 100f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_builtin_constants() {
        let program = compile_with("2 * pi * r", &["r"]);
        assert_relative_eq!(program.eval(&[1.0]), 2.0 * std::f64::consts::PI);
    }

    #[test]
    fn test_non_finite_values_propagate() {
        let program = compile_with("x^n / y", &["x", "n", "y"]);
        assert!(program.eval(&[0.0, -1.0, 1.0]).is_infinite());
        assert!(program.eval(&[-1.0, 0.5, 1.0]).is_nan());
        assert!(program.eval(&[1.0, 1.0, 0.0]).is_infinite());
    }

    #[test]
    fn test_unresolved_symbol() {
        let err = Expression::parse("k1 * missing")
            .unwrap()
            .compile(|s| if s == "k1" { Some(0) } else { None })
            .unwrap_err();
        assert_eq!(err, ExpressionError::UnresolvedSymbol("missing".to_string()));
    }

    #[test]
    fn test_unknown_function() {
        let err = Expression::parse("foo(x)")
            .unwrap()
            .compile(|_| Some(0))
            .unwrap_err();
        assert_eq!(err, ExpressionError::UnknownFunction("foo".to_string()));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Expression::parse("k1 * (A"),
            Err(ExpressionError::Parse { .. })
        ));
    }

    #[test]
    fn test_slots() {
        let program = compile_with("b * a + b", &["a", "b"]);
        assert_eq!(program.slots(), vec![0, 1]);
    }
}
