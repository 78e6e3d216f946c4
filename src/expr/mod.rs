//! Arithmetic expression evaluator for the cash/days/repeat fields of a
//! node definition.
//!
//! Grammar (precedence low to high):
//!
//! ```text
//! expr   := term  (('+' | '-') term)*
//! term   := factor (('*' | '/' | '%') factor)*
//! factor := ('+' | '-') factor | power
//! power  := atom ('^' factor)?            // right-associative
//! atom   := number | '(' expr ')'
//! ```
//!
//! Evaluation is to `f64`. Division by zero yields the IEEE result rather
//! than an error, consistent with how degenerate values propagate through
//! the valuation engine. Whether a result is an acceptable integer (the
//! `repeat` field) is the caller's concern.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("trailing input at offset {offset}")]
    TrailingInput { offset: usize },
    #[error("bad number literal at offset {offset}")]
    BadNumber { offset: usize },
}

/// Evaluates an arithmetic expression to a float.
pub fn eval(input: &str) -> Result<f64, ExprError> {
    let mut p = Parser {
        bytes: input.as_bytes(),
        pos: 0,
    };
    let value = p.expr()?;
    p.skip_ws();
    if p.pos < p.bytes.len() {
        return Err(ExprError::TrailingInput { offset: p.pos });
    }
    Ok(value)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Peeks at the next non-whitespace byte without consuming it.
    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    fn expr(&mut self) -> Result<f64, ExprError> {
        let mut acc = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                b'+' => {
                    self.pos += 1;
                    acc += self.term()?;
                }
                b'-' => {
                    self.pos += 1;
                    acc -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<f64, ExprError> {
        let mut acc = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                b'*' => {
                    self.pos += 1;
                    acc *= self.factor()?;
                }
                b'/' => {
                    self.pos += 1;
                    acc /= self.factor()?;
                }
                b'%' => {
                    self.pos += 1;
                    acc %= self.factor()?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn factor(&mut self) -> Result<f64, ExprError> {
        match self.peek() {
            Some(b'+') => {
                self.pos += 1;
                self.factor()
            }
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, ExprError> {
        let base = self.atom()?;
        if self.peek() == Some(b'^') {
            self.pos += 1;
            let exp = self.factor()?;
            return Ok(base.powf(exp));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, ExprError> {
        match self.peek() {
            None => Err(ExprError::UnexpectedEnd),
            Some(b'(') => {
                self.pos += 1;
                let inner = self.expr()?;
                match self.peek() {
                    Some(b')') => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    Some(ch) => Err(ExprError::UnexpectedChar {
                        ch: ch as char,
                        offset: self.pos,
                    }),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some(b) if b.is_ascii_digit() || b == b'.' => self.number(),
            Some(b) => Err(ExprError::UnexpectedChar {
                ch: b as char,
                offset: self.pos,
            }),
        }
    }

    fn number(&mut self) -> Result<f64, ExprError> {
        let start = self.pos;
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_digit() || self.bytes[self.pos] == b'.')
        {
            self.pos += 1;
        }
        // Optional exponent suffix: 1e3, 2.5e-4
        if matches!(self.bytes.get(self.pos), Some(b'e') | Some(b'E')) {
            let mut exp_end = self.pos + 1;
            if matches!(self.bytes.get(exp_end), Some(b'+') | Some(b'-')) {
                exp_end += 1;
            }
            if self.bytes.get(exp_end).is_some_and(|b| b.is_ascii_digit()) {
                while exp_end < self.bytes.len() && self.bytes[exp_end].is_ascii_digit() {
                    exp_end += 1;
                }
                self.pos = exp_end;
            }
        }
        // The scanned range is ASCII digits, dots, and exponent marks.
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| ExprError::BadNumber { offset: start })?;
        text.parse::<f64>()
            .map_err(|_| ExprError::BadNumber { offset: start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("42", 42.0)]
    #[case("  42  ", 42.0)]
    #[case("1 + 2 * 3", 7.0)]
    #[case("(1 + 2) * 3", 9.0)]
    #[case("10 - 4 - 3", 3.0)] // left-associative
    #[case("100 / 4 / 5", 5.0)]
    #[case("-5 + 3", -2.0)]
    #[case("--5", 5.0)]
    #[case("2 ^ 10", 1024.0)]
    #[case("2 ^ 3 ^ 2", 512.0)] // right-associative
    #[case("-2 ^ 2", -4.0)] // unary minus binds looser than '^'
    #[case("10 % 3", 1.0)]
    #[case("365.2425 / 12", 365.2425 / 12.0)]
    #[case("1e3", 1000.0)]
    #[case("2.5e-1", 0.25)]
    #[case("1500 * 12 * 4", 72000.0)]
    fn eval_cases(#[case] input: &str, #[case] expected: f64) {
        assert_eq!(eval(input).unwrap(), expected);
    }

    #[test]
    fn division_by_zero_is_infinite() {
        assert!(eval("1 / 0").unwrap().is_infinite());
        assert!(eval("0 / 0").unwrap().is_nan());
    }

    #[rstest]
    #[case("", ExprError::UnexpectedEnd)]
    #[case("1 +", ExprError::UnexpectedEnd)]
    #[case("(1 + 2", ExprError::UnexpectedEnd)]
    #[case("1 2", ExprError::TrailingInput { offset: 2 })]
    #[case("a + 1", ExprError::UnexpectedChar { ch: 'a', offset: 0 })]
    #[case("1 + $", ExprError::UnexpectedChar { ch: '$', offset: 4 })]
    fn eval_errors(#[case] input: &str, #[case] expected: ExprError) {
        assert_eq!(eval(input).unwrap_err(), expected);
    }

    #[test]
    fn bad_number_with_two_dots() {
        assert!(matches!(
            eval("1.2.3"),
            Err(ExprError::BadNumber { offset: 0 })
        ));
    }
}
