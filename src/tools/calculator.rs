//! Arithmetic expression tool.

use async_trait::async_trait;

use super::Tool;

/// Evaluate a mathematical expression.
///
/// Supports `+ - * / % ^`, parentheses and unary minus over f64. Evaluation
/// errors are returned as ordinary output text, matching the other tools'
/// conversational posture.
pub struct Calculate;

#[async_trait]
impl Tool for Calculate {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate mathematical expressions, e.g. '2 + 2 * 3' or '(1 + 2) ^ 4'"
    }

    fn parameter(&self) -> &str {
        "expression"
    }

    async fn invoke(&self, argument: &str) -> anyhow::Result<String> {
        match evaluate(argument) {
            Ok(value) => Ok(format!("Result of '{}' = {}", argument, format_number(value))),
            Err(reason) => Ok(format!("Error calculating: {}", reason)),
        }
    }
}

/// Render integral results without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn evaluate(expression: &str) -> Result<f64, String> {
    let mut parser = Parser { input: expression.as_bytes(), pos: 0 };
    parser.skip_whitespace();
    if parser.at_end() {
        return Err("empty expression".to_string());
    }
    let value = parser.parse_expression()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(format!("unexpected character '{}'", parser.current_char()));
    }
    Ok(value)
}

/// Recursive-descent parser over the expression grammar:
///
/// expression := term (('+' | '-') term)*
/// term       := factor (('*' | '/' | '%') factor)*
/// factor     := '-' factor | power
/// power      := atom ('^' factor)?          (right-associative)
/// atom       := number | '(' expression ')'
struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn parse_expression(&mut self) -> Result<f64, String> {
        let mut value = self.parse_term()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    value += self.parse_term()?;
                }
                Some(b'-') => {
                    self.pos += 1;
                    value -= self.parse_term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn parse_term(&mut self) -> Result<f64, String> {
        let mut value = self.parse_factor()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    value *= self.parse_factor()?;
                }
                Some(b'/') => {
                    self.pos += 1;
                    let divisor = self.parse_factor()?;
                    if divisor == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value /= divisor;
                }
                Some(b'%') => {
                    self.pos += 1;
                    let divisor = self.parse_factor()?;
                    if divisor == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value %= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn parse_factor(&mut self) -> Result<f64, String> {
        self.skip_whitespace();
        if self.peek() == Some(b'-') {
            self.pos += 1;
            return Ok(-self.parse_factor()?);
        }
        let base = self.parse_atom()?;
        self.skip_whitespace();
        if self.peek() == Some(b'^') {
            self.pos += 1;
            let exponent = self.parse_factor()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<f64, String> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let value = self.parse_expression()?;
                self.skip_whitespace();
                if self.peek() != Some(b')') {
                    return Err("missing closing parenthesis".to_string());
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.parse_number(),
            Some(_) => Err(format!("unexpected character '{}'", self.current_char())),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn parse_number(&mut self) -> Result<f64, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or("");
        text.parse::<f64>()
            .map_err(|_| format!("invalid number '{}'", text))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> char {
        std::str::from_utf8(&self.input[self.pos..])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or('?')
    }
}
