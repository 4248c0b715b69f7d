//! Calculator with variables
//!
//! Expressions are parsed by a small recursive-descent evaluator; nothing is
//! handed to an interpreter. Variables persist for the life of the tool.

use crate::errors::Result;
use crate::tools::implementations::text::format_general;
use crate::tools::types::{Tool, ToolCategory};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock};
use thiserror::Error;

const FUNCTIONS: &[&str] = &[
    "abs", "round", "min", "max", "sum", "pow", "sqrt", "cbrt", "exp", "log", "log10", "log2",
    "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "sinh", "cosh", "tanh", "degrees",
    "radians", "factorial", "gcd", "ceil", "floor", "trunc",
];

const CONSTANTS: &[(&str, f64)] = &[
    ("pi", std::f64::consts::PI),
    ("e", std::f64::consts::E),
    ("tau", std::f64::consts::TAU),
    ("inf", f64::INFINITY),
];

const HELP: &str = "Calculator Help:

BASIC MATH:
  2 + 2, 10 * 5, 100 / 4, 2 ** 10, 17 % 5

MATH FUNCTIONS:
  sqrt(16), cbrt(27), abs(-5), round(3.7)
  sin(x), cos(x), tan(x), asin(x), acos(x), atan(x)
  log(x), log10(x), log2(x), exp(x)
  factorial(5), gcd(12, 8), ceil(3.2), floor(3.8)
  degrees(pi), radians(180)
  min(1,2,3), max(1,2,3), sum([1,2,3])

CONSTANTS:
  pi = 3.14159..., e = 2.71828..., tau = 6.28318...

VARIABLES:
  x = 10        (store a value)
  x * 2         (use stored value)
  variables     (list all variables)
  clear         (clear all variables)

For unit conversions, use the 'unit_converter' tool.
For solving equations, use the 'equation_solver' tool.";

/// Evaluation failures, rendered as `Error: ...`
#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("Empty expression")]
    Empty,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid syntax in expression")]
    Syntax,

    #[error("Unknown variable or function - '{0}'")]
    UnknownName(String),

    #[error("math domain error")]
    Domain,

    #[error("{0}")]
    Arguments(String),

    #[error("'{0}' is a reserved function name.")]
    Reserved(String),
}

type CalcResult<T> = std::result::Result<T, CalcError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

fn tokenize(input: &str) -> CalcResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent only when digits follow
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(text.parse().map_err(|_| CalcError::Syntax)?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            _ => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' | '×' => Token::Star,
                    '/' | '÷' => Token::Slash,
                    '%' => Token::Percent,
                    '^' => Token::Pow,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    ',' => Token::Comma,
                    _ => return Err(CalcError::Syntax),
                });
                i += 1;
            }
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone)]
enum Value {
    Num(f64),
    List(Vec<f64>),
}

impl Value {
    fn num(self) -> CalcResult<f64> {
        match self {
            Value::Num(n) => Ok(n),
            Value::List(_) => Err(CalcError::Arguments(
                "lists are only allowed as function arguments".to_string(),
            )),
        }
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    variables: &'a BTreeMap<String, f64>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, token: Token) -> CalcResult<()> {
        if self.next() == Some(token) {
            Ok(())
        } else {
            Err(CalcError::Syntax)
        }
    }

    fn expression(&mut self) -> CalcResult<f64> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> CalcResult<f64> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value /= rhs;
                }
                Some(Token::Percent) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    // Sign follows the divisor
                    value = value - rhs * (value / rhs).floor();
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> CalcResult<f64> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> CalcResult<f64> {
        let base = self.primary()?.num()?;
        if self.peek() == Some(&Token::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            let result = base.powf(exponent);
            if result.is_nan() {
                return Err(CalcError::Domain);
            }
            return Ok(result);
        }
        Ok(base)
    }

    fn primary(&mut self) -> CalcResult<Value> {
        match self.next() {
            Some(Token::Num(n)) => Ok(Value::Num(n)),
            Some(Token::LParen) => {
                let value = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(Value::Num(value))
            }
            Some(Token::LBracket) => {
                let items = self.list(Token::RBracket)?;
                Ok(Value::List(items))
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.arguments()?;
                    return call_function(&name, &args).map(Value::Num);
                }
                if let Some(v) = self.variables.get(&name) {
                    return Ok(Value::Num(*v));
                }
                CONSTANTS
                    .iter()
                    .find(|(c, _)| *c == name)
                    .map(|(_, v)| Value::Num(*v))
                    .ok_or(CalcError::UnknownName(name))
            }
            _ => Err(CalcError::Syntax),
        }
    }

    /// Comma-separated numbers up to `close`
    fn list(&mut self, close: Token) -> CalcResult<Vec<f64>> {
        let mut items = Vec::new();
        if self.peek() == Some(&close) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(t) if t == close => return Ok(items),
                _ => return Err(CalcError::Syntax),
            }
        }
    }

    /// Function arguments; a list literal argument is spread
    fn arguments(&mut self) -> CalcResult<Vec<Value>> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            if self.peek() == Some(&Token::LBracket) {
                self.pos += 1;
                args.push(Value::List(self.list(Token::RBracket)?));
            } else {
                args.push(Value::Num(self.expression()?));
            }
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                _ => return Err(CalcError::Syntax),
            }
        }
    }
}

fn spread(args: &[Value]) -> Vec<f64> {
    args.iter()
        .flat_map(|a| match a {
            Value::Num(n) => vec![*n],
            Value::List(items) => items.clone(),
        })
        .collect()
}

fn numbers(name: &str, args: &[Value], count: usize) -> CalcResult<Vec<f64>> {
    let values: Vec<f64> = args
        .iter()
        .cloned()
        .map(Value::num)
        .collect::<CalcResult<_>>()?;
    if values.len() != count {
        return Err(CalcError::Arguments(format!(
            "{}() takes {} argument(s) ({} given)",
            name,
            count,
            values.len()
        )));
    }
    Ok(values)
}

fn as_integer(name: &str, x: f64) -> CalcResult<i128> {
    if x.fract() != 0.0 || !x.is_finite() {
        return Err(CalcError::Arguments(format!(
            "{}() only accepts integral values",
            name
        )));
    }
    Ok(x as i128)
}

fn domain(x: f64) -> CalcResult<f64> {
    if x.is_nan() {
        Err(CalcError::Domain)
    } else {
        Ok(x)
    }
}

fn call_function(name: &str, args: &[Value]) -> CalcResult<f64> {
    let one = |f: fn(f64) -> f64| -> CalcResult<f64> { domain(f(numbers(name, args, 1)?[0])) };

    match name {
        "sqrt" => {
            let x = numbers(name, args, 1)?[0];
            if x < 0.0 {
                return Err(CalcError::Domain);
            }
            Ok(x.sqrt())
        }
        "cbrt" => one(f64::cbrt),
        "abs" => one(f64::abs),
        "exp" => one(f64::exp),
        "log10" | "log2" => {
            let x = numbers(name, args, 1)?[0];
            if x <= 0.0 {
                return Err(CalcError::Domain);
            }
            Ok(if name == "log10" { x.log10() } else { x.log2() })
        }
        "log" => {
            let values = spread(args);
            match values.as_slice() {
                [x] if *x > 0.0 => Ok(x.ln()),
                [x, base] if *x > 0.0 && *base > 0.0 && *base != 1.0 => Ok(x.ln() / base.ln()),
                [_] | [_, _] => Err(CalcError::Domain),
                _ => Err(CalcError::Arguments("log() takes 1 or 2 arguments".to_string())),
            }
        }
        "sin" => one(f64::sin),
        "cos" => one(f64::cos),
        "tan" => one(f64::tan),
        "asin" => one(f64::asin),
        "acos" => one(f64::acos),
        "atan" => one(f64::atan),
        "sinh" => one(f64::sinh),
        "cosh" => one(f64::cosh),
        "tanh" => one(f64::tanh),
        "degrees" => one(f64::to_degrees),
        "radians" => one(f64::to_radians),
        "ceil" => one(f64::ceil),
        "floor" => one(f64::floor),
        "trunc" => one(f64::trunc),
        "atan2" => {
            let v = numbers(name, args, 2)?;
            Ok(v[0].atan2(v[1]))
        }
        "pow" => {
            let v = numbers(name, args, 2)?;
            domain(v[0].powf(v[1]))
        }
        "round" => {
            let values = spread(args);
            match values.as_slice() {
                [x] => Ok(x.round()),
                [x, digits] => {
                    let factor = 10f64.powi(as_integer(name, *digits)? as i32);
                    Ok((x * factor).round() / factor)
                }
                _ => Err(CalcError::Arguments("round() takes 1 or 2 arguments".to_string())),
            }
        }
        "factorial" => {
            let n = as_integer(name, numbers(name, args, 1)?[0])?;
            if n < 0 {
                return Err(CalcError::Arguments(
                    "factorial() not defined for negative values".to_string(),
                ));
            }
            if n > 170 {
                return Ok(f64::INFINITY);
            }
            Ok((1..=n).map(|k| k as f64).product())
        }
        "gcd" => {
            let mut acc: i128 = 0;
            for v in spread(args) {
                let mut a = acc.abs();
                let mut b = as_integer(name, v)?.abs();
                while b != 0 {
                    let t = a % b;
                    a = b;
                    b = t;
                }
                acc = a;
            }
            Ok(acc as f64)
        }
        "min" | "max" | "sum" => {
            let values = spread(args);
            if values.is_empty() && name != "sum" {
                return Err(CalcError::Arguments(format!("{}() arg is an empty sequence", name)));
            }
            Ok(match name {
                "min" => values.iter().cloned().fold(f64::INFINITY, f64::min),
                "max" => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                _ => values.iter().sum(),
            })
        }
        _ => Err(CalcError::UnknownName(name.to_string())),
    }
}

/// Evaluate `expression` against `variables`
pub fn evaluate(expression: &str, variables: &BTreeMap<String, f64>) -> CalcResult<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        variables,
    };
    let value = parser.expression()?;
    if parser.pos != tokens.len() {
        return Err(CalcError::Syntax);
    }
    Ok(value)
}

/// Integers print without a fraction; others with 10 significant digits
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }

    format_general(value, 10)
}

fn is_reserved(name: &str) -> bool {
    let lower = name.to_lowercase();
    FUNCTIONS.contains(&lower.as_str()) || CONSTANTS.iter().any(|(c, _)| *c == lower)
}

/// Calculator tool; variables persist across calls
#[derive(Debug, Default)]
pub struct CalculatorTool {
    variables: Mutex<BTreeMap<String, f64>>,
}

impl CalculatorTool {
    pub fn new() -> Self {
        Self::default()
    }

    fn variables(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, f64>> {
        self.variables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn list_variables(&self) -> String {
        let variables = self.variables();
        if variables.is_empty() {
            return "No variables stored.".to_string();
        }
        let mut lines = vec!["Stored variables:".to_string()];
        for (name, value) in variables.iter() {
            lines.push(format!("  {} = {}", name, format_number(*value)));
        }
        lines.join("\n")
    }

    fn assign(&self, name: &str, expression: &str) -> CalcResult<String> {
        if is_reserved(name) {
            return Err(CalcError::Reserved(name.to_string()));
        }
        let value = evaluate(expression, &self.variables())?;
        self.variables().insert(name.to_string(), value);
        Ok(format!("Stored: {} = {}", name, format_number(value)))
    }

    /// Process one calculator request
    pub fn calculate(&self, input: &str) -> String {
        static ASSIGNMENT: OnceLock<Option<Regex>> = OnceLock::new();

        let input = input.trim();
        let lower = input.to_lowercase();

        match lower.as_str() {
            "" => return format!("Error: {}", CalcError::Empty),
            "variables" | "vars" | "list" => return self.list_variables(),
            "clear" | "clear variables" | "clear vars" => {
                self.variables().clear();
                return "All variables cleared.".to_string();
            }
            "help" | "?" => return HELP.to_string(),
            _ => {}
        }

        let assignment = ASSIGNMENT
            .get_or_init(|| Regex::new(r"^(?:set\s+)?([a-zA-Z_][a-zA-Z0-9_]*)\s*=\s*(.+)$").ok())
            .as_ref()
            .and_then(|re| re.captures(input));

        let result = match assignment {
            Some(caps) => self.assign(&caps[1], &caps[2]),
            None => evaluate(input, &self.variables()).map(format_number),
        };

        result.unwrap_or_else(|e| format!("Error: {}", e))
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Perform mathematical calculations with variables.\n\n\
         BASIC MATH: '2 + 2', '100 * 0.15', '2 ** 10' (power), '17 % 5' (modulo)\n\n\
         MATH FUNCTIONS: sqrt(16), sin(x), cos(x), tan(x), log(x), log10(x), exp(x), \
         factorial(5), abs(-5), round(3.7), ceil(x), floor(x), min(1,2,3), max(1,2,3), \
         gcd(12,8), degrees(pi), radians(180)\n\n\
         CONSTANTS: pi, e, tau\n\n\
         VARIABLES: 'x = 10' to store, then 'x * 2' to use, 'variables' to list, 'clear' to reset\n\n\
         NOTE: For unit conversions use 'unit_converter'. For solving equations use 'equation_solver'."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::MathComputation
    }

    async fn call(&self, query: &str) -> Result<String> {
        Ok(self.calculate(query))
    }
}
