//! Calculator handler.
//!
//! Evaluates plain arithmetic. The expression is checked against a fixed
//! character set before any parsing happens, so letters and other syntax
//! never reach the evaluator.

use async_trait::async_trait;

use switchboard_core::Capability;

use crate::error::ToolError;
use crate::handler::{wrong_args, ToolHandler};
use crate::types::{ToolArgs, ToolOutput};

const MAX_DEPTH: usize = 64;

/// Characters an expression may contain.
pub fn is_allowed_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/' | '.' | '(' | ')' | ' ')
}

/// Containment check followed by evaluation.
pub fn evaluate(expression: &str) -> Result<f64, ToolError> {
    if let Some(bad) = expression.chars().find(|c| !is_allowed_char(*c)) {
        return Err(ToolError::ForbiddenExpression(bad.to_string()));
    }
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ToolError::InvalidExpression("empty expression".to_string()));
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos != tokens.len() {
        return Err(ToolError::InvalidExpression(format!(
            "unexpected '{}'",
            tokens[parser.pos]
        )));
    }
    if !value.is_finite() {
        return Err(ToolError::InvalidExpression("result is not finite".to_string()));
    }
    Ok(value)
}

/// Integral values print without a fraction.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{}", n),
            Token::Op(c) => write!(f, "{}", c),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ToolError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == ' ' {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let literal: String = chars[start..i].iter().collect();
            let n = literal
                .parse::<f64>()
                .map_err(|_| ToolError::InvalidExpression(format!("bad number '{}'", literal)))?;
            tokens.push(Token::Num(n));
        } else {
            tokens.push(Token::Op(c));
            i += 1;
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, ToolError> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<f64, ToolError> {
        let mut value = self.factor()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == '*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(ToolError::DivisionByZero);
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    // factor := ('-' | '+') factor | number | '(' expr ')'
    fn factor(&mut self) -> Result<f64, ToolError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ToolError::InvalidExpression("expression nested too deeply".to_string()));
        }
        let result = match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                self.factor().map(|v| -v)
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.factor()
            }
            Some(Token::Num(n)) => {
                self.pos += 1;
                Ok(n)
            }
            Some(Token::Op('(')) => {
                self.pos += 1;
                let value = self.expr()?;
                match self.peek() {
                    Some(Token::Op(')')) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    _ => Err(ToolError::InvalidExpression("missing ')'".to_string())),
                }
            }
            Some(tok) => Err(ToolError::InvalidExpression(format!("unexpected '{}'", tok))),
            None => Err(ToolError::InvalidExpression("unexpected end of input".to_string())),
        };
        self.depth -= 1;
        result
    }
}

/// Handler for arithmetic requests.
pub struct CalculatorHandler;

#[async_trait]
impl ToolHandler for CalculatorHandler {
    fn capability(&self) -> Capability {
        Capability::Calculator
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let ToolArgs::Calculator { expression } = args else {
            return Err(wrong_args(self.capability(), args));
        };
        let expression = expression.trim();
        let value = evaluate(expression)?;
        tracing::debug!(expression = %expression, "evaluated expression");
        Ok(ToolOutput::text(format!(
            "Calculation: {} = {}",
            expression,
            format_number(value)
        )))
    }

    fn describe(&self, args: &ToolArgs) -> String {
        match args {
            ToolArgs::Calculator { expression } => format!("Calculate: {}", expression),
            _ => "Calculate".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(expression: &str) -> ToolArgs {
        ToolArgs::Calculator {
            expression: expression.to_string(),
        }
    }

    // =========================================================================
    // Evaluator
    // =========================================================================

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("100 / 10 / 2").unwrap(), 5.0);
    }

    #[test]
    fn test_unary_and_decimals() {
        assert_eq!(evaluate("-5 + 2").unwrap(), -3.0);
        assert_eq!(evaluate("-(2 + 3)").unwrap(), -5.0);
        assert_eq!(evaluate("1.5 * 2").unwrap(), 3.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(evaluate("5 / 0"), Err(ToolError::DivisionByZero)));
        assert!(matches!(evaluate("5 / (2 - 2)"), Err(ToolError::DivisionByZero)));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(evaluate("2 +"), Err(ToolError::InvalidExpression(_))));
        assert!(matches!(evaluate("(2 + 3"), Err(ToolError::InvalidExpression(_))));
        assert!(matches!(evaluate("2 3"), Err(ToolError::InvalidExpression(_))));
        assert!(matches!(evaluate("1..2"), Err(ToolError::InvalidExpression(_))));
        assert!(matches!(evaluate("   "), Err(ToolError::InvalidExpression(_))));
        assert!(matches!(evaluate(")"), Err(ToolError::InvalidExpression(_))));
    }

    #[test]
    fn test_letters_rejected_before_parsing() {
        for expr in ["2 + x", "__import__", "1e5", "abs(3)", "2 ** 3 if 1 else 0"] {
            assert!(
                matches!(evaluate(expr), Err(ToolError::ForbiddenExpression(_))),
                "{expr} should be rejected"
            );
        }
        assert!(matches!(evaluate("2 % 3"), Err(ToolError::ForbiddenExpression(_))));
        assert!(matches!(evaluate("2\t+3"), Err(ToolError::ForbiddenExpression(_))));
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let expr = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert!(matches!(evaluate(&expr), Err(ToolError::InvalidExpression(_))));
        let expr = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(evaluate(&expr).unwrap(), 1.0);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(300.0), "300");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(2.5), "2.5");
    }

    // =========================================================================
    // Handler
    // =========================================================================

    #[tokio::test]
    async fn test_handler_output() {
        let out = CalculatorHandler.execute(&calc(" 15 * 20 ")).await.unwrap();
        assert_eq!(out.text, "Calculation: 15 * 20 = 300");
        assert!(out.fallback.is_none());
    }

    #[tokio::test]
    async fn test_handler_fraction() {
        let out = CalculatorHandler.execute(&calc("7 / 2")).await.unwrap();
        assert_eq!(out.text, "Calculation: 7 / 2 = 3.5");
    }

    #[tokio::test]
    async fn test_handler_rejects_other_args() {
        let args = ToolArgs::Time {
            location: "local".into(),
        };
        let err = CalculatorHandler.execute(&args).await.unwrap_err();
        assert!(matches!(err, ToolError::WrongArgs { .. }));
    }

    #[tokio::test]
    async fn test_handler_passes_raw_text_to_failure() {
        let err = CalculatorHandler
            .execute(&calc("what is love"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ForbiddenExpression(_)));
    }
}
