//! A tiny checked arithmetic expression evaluator, for the simulation
//! config's "string values may be evaluated as simple arithmetic
//! expressions for numeric fields" rule. The original Python
//! (`config.py::_update_from_yaml`) uses a bare `eval()` over trusted input;
//! Rust has no safe equivalent, so this parses and evaluates only
//! `+ - * / ( )` and numeric literals, rejecting anything else.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{0}' in expression")]
    UnexpectedChar(char),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expected closing parenthesis")]
    MissingCloseParen,
    #[error("division by zero")]
    DivisionByZero,
    #[error("trailing input after expression: {0}")]
    TrailingInput(String),
}

/// Evaluates a simple arithmetic expression, e.g. `"60 * 60"` or
/// `"1024 / 2 + 1"`. Standard precedence: `*`/`/` bind tighter than `+`/`-`;
/// parentheses override.
pub fn eval(input: &str) -> Result<f64, ExprError> {
    let tokens = tokenize(input)?;
    let mut pos = 0;
    let value = parse_expr(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(ExprError::TrailingInput(format!("{:?}", &tokens[pos..])));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let lit: String = chars[start..i].iter().collect();
                let n: f64 = lit.parse().map_err(|_| ExprError::UnexpectedChar(c))?;
                tokens.push(Token::Number(n));
            }
            c => return Err(ExprError::UnexpectedChar(c)),
        }
    }
    Ok(tokens)
}

fn parse_expr(tokens: &[Token], pos: &mut usize) -> Result<f64, ExprError> {
    let mut value = parse_term(tokens, pos)?;
    loop {
        match tokens.get(*pos) {
            Some(Token::Plus) => {
                *pos += 1;
                value += parse_term(tokens, pos)?;
            }
            Some(Token::Minus) => {
                *pos += 1;
                value -= parse_term(tokens, pos)?;
            }
            _ => break,
        }
    }
    Ok(value)
}

fn parse_term(tokens: &[Token], pos: &mut usize) -> Result<f64, ExprError> {
    let mut value = parse_factor(tokens, pos)?;
    loop {
        match tokens.get(*pos) {
            Some(Token::Star) => {
                *pos += 1;
                value *= parse_factor(tokens, pos)?;
            }
            Some(Token::Slash) => {
                *pos += 1;
                let rhs = parse_factor(tokens, pos)?;
                if rhs == 0.0 {
                    return Err(ExprError::DivisionByZero);
                }
                value /= rhs;
            }
            _ => break,
        }
    }
    Ok(value)
}

fn parse_factor(tokens: &[Token], pos: &mut usize) -> Result<f64, ExprError> {
    match tokens.get(*pos) {
        Some(Token::Number(n)) => {
            *pos += 1;
            Ok(*n)
        }
        Some(Token::Minus) => {
            *pos += 1;
            Ok(-parse_factor(tokens, pos)?)
        }
        Some(Token::LParen) => {
            *pos += 1;
            let value = parse_expr(tokens, pos)?;
            match tokens.get(*pos) {
                Some(Token::RParen) => {
                    *pos += 1;
                    Ok(value)
                }
                _ => Err(ExprError::MissingCloseParen),
            }
        }
        Some(_) => Err(ExprError::UnexpectedChar('?')),
        None => Err(ExprError::UnexpectedEnd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_plain_number() {
        assert_eq!(eval("42").unwrap(), 42.0);
    }

    #[test]
    fn evaluates_tick_freq_style_expression() {
        assert_eq!(eval("60 * 60").unwrap(), 3600.0);
    }

    #[test]
    fn respects_operator_precedence() {
        assert_eq!(eval("2 + 3 * 4").unwrap(), 14.0);
    }

    #[test]
    fn respects_parentheses() {
        assert_eq!(eval("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn handles_unary_minus() {
        assert_eq!(eval("-5 + 2").unwrap(), -3.0);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(eval("1 / 0").unwrap_err(), ExprError::DivisionByZero);
    }

    #[test]
    fn unknown_character_is_rejected() {
        assert!(matches!(eval("2 + x"), Err(ExprError::UnexpectedChar('x'))));
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(eval("2 + 2 3").is_err());
    }

    #[test]
    fn unmatched_paren_is_rejected() {
        assert!(eval("(2 + 3").is_err());
    }
}
