//! Linear and quadratic equation solving in one variable
//!
//! Both sides are parsed into polynomials with real coefficients; their
//! difference is solved in closed form.

use crate::errors::Result;
use crate::tools::implementations::text::format_general;
use crate::tools::types::{Tool, ToolCategory};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const FUNCTIONS: &[&str] = &["sqrt", "sin", "cos", "tan", "log", "exp", "abs"];
const EPSILON: f64 = 1e-9;

const HELP: &str = "Equation Solver Help:

BASIC USAGE:
  x + 2 = 5           -> x = 3
  2x + 3 = 11         -> x = 4
  x^2 - 4 = 0         -> x = -2, 2
  x^2 + 2x + 1 = 0    -> x = -1

WITH 'SOLVE' PREFIX:
  solve x + 2 = 5
  solve 3x - 9 = 0

IMPLICIT ZERO:
  x^2 - 9             -> solves x^2 - 9 = 0

CHOOSING THE VARIABLE:
  solve for t: 3t - 6 = 0

SUPPORTED OPERATIONS:
  + - * / ^           (power: x^2 or x**2)
  sqrt(), sin(), cos(), tan(), log(), exp() on constants

EXAMPLES:
  x/2 + 3 = 7         -> x = 8
  x^2 + 5x + 6 = 0    -> x = -3, -2
  x^2 + 1 = 0         -> x = -i, i";

/// Polynomial in the unknown; `coefficients[i]` multiplies `x^i`
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn constant(value: f64) -> Self {
        Self {
            coefficients: vec![value],
        }
    }

    pub fn variable() -> Self {
        Self {
            coefficients: vec![0.0, 1.0],
        }
    }

    pub fn coefficient(&self, power: usize) -> f64 {
        self.coefficients.get(power).copied().unwrap_or(0.0)
    }

    /// Highest power with a non-negligible coefficient
    pub fn degree(&self) -> usize {
        self.coefficients
            .iter()
            .rposition(|c| c.abs() > EPSILON)
            .unwrap_or(0)
    }

    fn as_constant(&self) -> Option<f64> {
        (self.degree() == 0).then(|| self.coefficient(0))
    }

    fn add(&self, other: &Self, sign: f64) -> Self {
        let len = self.coefficients.len().max(other.coefficients.len());
        Self {
            coefficients: (0..len)
                .map(|i| self.coefficient(i) + sign * other.coefficient(i))
                .collect(),
        }
    }

    fn mul(&self, other: &Self) -> Self {
        let mut coefficients = vec![0.0; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            for (j, b) in other.coefficients.iter().enumerate() {
                coefficients[i + j] += a * b;
            }
        }
        Self { coefficients }
    }

    fn scale(&self, factor: f64) -> Self {
        Self {
            coefficients: self.coefficients.iter().map(|c| c * factor).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Var(char),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    Pow,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .parse()
                .map_err(|_| format!("invalid number '{}'", text))?;
            tokens.push(Token::Num(value));
        } else if c.is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if FUNCTIONS.contains(&word.as_str()) || word == "pi" {
                tokens.push(Token::Name(word));
            } else {
                // Adjacent letters multiply: "xy" is x*y
                tokens.extend(word.chars().map(Token::Var));
            }
        } else if c == '*' && chars.get(i + 1) == Some(&'*') {
            tokens.push(Token::Pow);
            i += 2;
        } else {
            tokens.push(match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '^' => Token::Pow,
                '(' => Token::LParen,
                ')' => Token::RParen,
                other => return Err(format!("unexpected character '{}'", other)),
            });
            i += 1;
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    unknown: char,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expression(&mut self) -> std::result::Result<Polynomial, String> {
        let mut value = self.term()?;
        loop {
            let sign = match self.peek() {
                Some(Token::Plus) => 1.0,
                Some(Token::Minus) => -1.0,
                _ => return Ok(value),
            };
            self.pos += 1;
            value = value.add(&self.term()?, sign);
        }
    }

    fn term(&mut self) -> std::result::Result<Polynomial, String> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value = value.mul(&self.unary()?);
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    match divisor.as_constant() {
                        Some(d) if d.abs() > EPSILON => value = value.scale(1.0 / d),
                        Some(_) => return Err("division by zero".to_string()),
                        None => {
                            return Err(format!(
                                "division by an expression containing {} is not supported",
                                self.unknown
                            ))
                        }
                    }
                }
                // Implicit multiplication: 2x, 3(x + 1), (x + 1)(x - 1)
                Some(Token::Num(_)) | Some(Token::Var(_)) | Some(Token::Name(_))
                | Some(Token::LParen) => {
                    value = value.mul(&self.power()?);
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> std::result::Result<Polynomial, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(self.unary()?.scale(-1.0))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> std::result::Result<Polynomial, String> {
        let base = self.atom()?;
        if self.peek() != Some(&Token::Pow) {
            return Ok(base);
        }
        self.pos += 1;

        let exponent = self.unary()?.as_constant().ok_or_else(|| {
            format!("exponents containing {} are not supported", self.unknown)
        })?;

        if let Some(b) = base.as_constant() {
            return Ok(Polynomial::constant(b.powf(exponent)));
        }
        if exponent < 0.0 || exponent.fract() != 0.0 || exponent > 8.0 {
            return Err(format!(
                "{} may only be raised to a small non-negative integer power",
                self.unknown
            ));
        }

        let mut result = Polynomial::constant(1.0);
        for _ in 0..exponent as usize {
            result = result.mul(&base);
        }
        Ok(result)
    }

    fn atom(&mut self) -> std::result::Result<Polynomial, String> {
        match self.advance() {
            Some(Token::Num(n)) => Ok(Polynomial::constant(n)),
            Some(Token::Var('e')) if self.unknown != 'e' => {
                Ok(Polynomial::constant(std::f64::consts::E))
            }
            Some(Token::Var(_)) => Ok(Polynomial::variable()),
            Some(Token::Name(name)) if name == "pi" => {
                Ok(Polynomial::constant(std::f64::consts::PI))
            }
            Some(Token::Name(name)) => {
                if self.advance() != Some(Token::LParen) {
                    return Err(format!("{}() requires parentheses", name));
                }
                let argument = self.expression()?;
                if self.advance() != Some(Token::RParen) {
                    return Err("unbalanced parentheses".to_string());
                }
                let x = argument.as_constant().ok_or_else(|| {
                    format!(
                        "{}() of an expression containing {} is not supported",
                        name, self.unknown
                    )
                })?;
                Ok(Polynomial::constant(apply(&name, x)))
            }
            Some(Token::LParen) => {
                let inner = self.expression()?;
                if self.advance() != Some(Token::RParen) {
                    return Err("unbalanced parentheses".to_string());
                }
                Ok(inner)
            }
            Some(other) => Err(format!("unexpected token {:?}", other)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

fn apply(name: &str, x: f64) -> f64 {
    match name {
        "sqrt" => x.sqrt(),
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "log" => x.ln(),
        "exp" => x.exp(),
        _ => x.abs(),
    }
}

fn parse_side(tokens: &[Token], unknown: char) -> std::result::Result<Polynomial, String> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        unknown,
    };
    let value = parser.expression()?;
    if parser.pos != tokens.len() {
        return Err("unexpected trailing input".to_string());
    }
    Ok(value)
}

fn format_root(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < EPSILON {
        // Avoid "-0"
        format!("{}", rounded as i64)
    } else {
        format_general(value, 6)
    }
}

fn format_imaginary(value: f64) -> String {
    if (value.abs() - 1.0).abs() < EPSILON {
        String::new()
    } else {
        format_root(value.abs())
    }
}

/// Roots of `polynomial = 0`, formatted as `x = ...`
pub fn solve_polynomial(polynomial: &Polynomial, unknown: char) -> String {
    let c = polynomial.coefficient(0);
    let b = polynomial.coefficient(1);
    let a = polynomial.coefficient(2);

    match polynomial.degree() {
        0 if c.abs() <= EPSILON => format!(
            "Every value of {} satisfies the equation (it is an identity)",
            unknown
        ),
        0 => format!("No solution found for {}", unknown),
        1 => format!("{} = {}", unknown, format_root(-c / b)),
        2 => {
            let discriminant = b * b - 4.0 * a * c;
            if discriminant.abs() <= EPSILON {
                format!("{} = {}", unknown, format_root(-b / (2.0 * a)))
            } else if discriminant > 0.0 {
                let root = discriminant.sqrt();
                let mut roots = [(-b - root) / (2.0 * a), (-b + root) / (2.0 * a)];
                roots.sort_by(|x, y| x.total_cmp(y));
                format!(
                    "{} = {}, {}",
                    unknown,
                    format_root(roots[0]),
                    format_root(roots[1])
                )
            } else {
                let real = -b / (2.0 * a);
                let imaginary = (-discriminant).sqrt() / (2.0 * a).abs();
                let magnitude = format_imaginary(imaginary);
                if real.abs() <= EPSILON {
                    format!("{} = -{}i, {}i", unknown, magnitude, magnitude)
                } else {
                    let real = format_root(real);
                    format!(
                        "{} = {} - {}i, {} + {}i",
                        unknown, real, magnitude, real, magnitude
                    )
                }
            }
        }
        degree => format!(
            "Error solving equation: only linear and quadratic equations are supported (degree {})",
            degree
        ),
    }
}

/// Parse and solve an equation request
pub fn solve_equation(input: &str) -> String {
    static FOR_VARIABLE: OnceLock<Option<Regex>> = OnceLock::new();

    let mut input = input.trim();
    if input.is_empty() {
        return "Error: Empty equation".to_string();
    }
    if matches!(input.to_lowercase().as_str(), "help" | "?") {
        return HELP.to_string();
    }

    if input.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("solve")) {
        input = input[5..].trim();
    }

    let mut target = None;
    let owned;
    if let Some(caps) = FOR_VARIABLE
        .get_or_init(|| Regex::new(r"(?i)^for\s+([a-zA-Z])\s*:\s*(.+)$").ok())
        .as_ref()
        .and_then(|re| re.captures(input))
    {
        target = caps[1].chars().next();
        owned = caps[2].to_string();
        input = &owned;
    }

    let equation = if input.contains('=') {
        input.to_string()
    } else {
        format!("{} = 0", input)
    };

    let sides: Vec<&str> = equation.split('=').collect();
    let [left, right] = sides.as_slice() else {
        return "Error: Equation must have exactly one '=' sign".to_string();
    };

    let (left, right) = match (tokenize(left), tokenize(right)) {
        (Ok(l), Ok(r)) => (l, r),
        (Err(e), _) | (_, Err(e)) => return format!("Error parsing equation: {}", e),
    };

    let mut variables: BTreeSet<char> = left
        .iter()
        .chain(right.iter())
        .filter_map(|t| match t {
            Token::Var(v) => Some(*v),
            _ => None,
        })
        .collect();
    // A lone "e" is Euler's number unless it is the requested unknown
    if target != Some('e') && variables.len() > 1 {
        variables.remove(&'e');
    }

    let unknown = match (target, variables.len()) {
        (_, 0) => return "Error: No variables found in equation".to_string(),
        (Some(t), 1) if variables.contains(&t) => t,
        (None, 1) => variables.iter().next().copied().unwrap_or('x'),
        _ => {
            let found: Vec<String> = variables.iter().map(|v| v.to_string()).collect();
            return format!(
                "Error: Only single-variable equations are supported (found {})",
                found.join(", ")
            );
        }
    };

    match (parse_side(&left, unknown), parse_side(&right, unknown)) {
        (Ok(l), Ok(r)) => solve_polynomial(&l.add(&r, -1.0), unknown),
        (Err(e), _) | (_, Err(e)) => format!("Error solving equation: {}", e),
    }
}

/// Equation solver tool
#[derive(Debug, Clone, Default)]
pub struct EquationSolverTool;

impl EquationSolverTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for EquationSolverTool {
    fn name(&self) -> &str {
        "equation_solver"
    }

    fn description(&self) -> &str {
        "Solve mathematical equations for unknown variables.\n\n\
         EXAMPLES:\n\
         - 'x + 2 = 5' -> x = 3\n\
         - '2x + 3 = 11' -> x = 4\n\
         - 'x^2 - 4 = 0' -> x = -2, 2\n\
         - 'x^2 + 2x + 1 = 0' -> x = -1\n\n\
         Supports linear and quadratic equations in one variable. \
         Use ^ or ** for powers. Implicit multiplication works (2x = 2*x)."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::MathComputation
    }

    async fn call(&self, query: &str) -> Result<String> {
        Ok(solve_equation(query))
    }
}
