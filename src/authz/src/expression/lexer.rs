//! Tokenizer for attribute expressions

use super::ast::CompareOp;
use super::error::{MatcherError, Result};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Dot,
    String(String),
    Number(f64),
    Bool(bool),
    Compare(CompareOp),
    And,
    Or,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{}", name),
            Token::Dot => write!(f, "."),
            Token::String(s) => write!(f, "{:?}", s),
            Token::Number(n) => write!(f, "{}", n),
            Token::Bool(b) => write!(f, "{}", b),
            Token::Compare(op) => write!(f, "{}", op.as_str()),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

/// Token with its character offset in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Split an expression into tokens. Whitespace is consumed but not emitted.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let token = match c {
            '.' => {
                i += 1;
                Token::Dot
            }
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            '&' | '|' => {
                if chars.get(i + 1) != Some(&c) {
                    return Err(MatcherError::UnexpectedCharacter { ch: c, position: i });
                }
                i += 2;
                if c == '&' {
                    Token::And
                } else {
                    Token::Or
                }
            }
            '=' | '!' | '<' | '>' => {
                let followed_by_eq = chars.get(i + 1) == Some(&'=');
                let op = match (c, followed_by_eq) {
                    ('=', true) => CompareOp::Eq,
                    ('!', true) => CompareOp::Ne,
                    ('<', true) => CompareOp::Le,
                    ('>', true) => CompareOp::Ge,
                    ('<', false) => CompareOp::Lt,
                    ('>', false) => CompareOp::Gt,
                    _ => return Err(MatcherError::UnexpectedCharacter { ch: c, position: i }),
                };
                i += if followed_by_eq { 2 } else { 1 };
                Token::Compare(op)
            }
            '"' | '\'' => {
                let (literal, next) = read_string(&chars, i)?;
                i = next;
                Token::String(literal)
            }
            c if c.is_ascii_digit() => {
                let (number, next) = read_number(&chars, i)?;
                i = next;
                Token::Number(number)
            }
            '-' if chars.get(i + 1).map_or(false, |n| n.is_ascii_digit()) => {
                let (number, next) = read_number(&chars, i + 1)?;
                i = next;
                Token::Number(-number)
            }
            c if c.is_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.as_str() {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    _ => Token::Ident(word),
                }
            }
            other => {
                return Err(MatcherError::UnexpectedCharacter {
                    ch: other,
                    position: i,
                })
            }
        };

        tokens.push(Spanned {
            token,
            position: start,
        });
    }

    Ok(tokens)
}

fn read_string(chars: &[char], start: usize) -> Result<(String, usize)> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or(MatcherError::UnterminatedString { position: start })?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => *other,
                });
                i += 2;
            }
            c if c == quote => return Ok((value, i + 1)),
            c => {
                value.push(c);
                i += 1;
            }
        }
    }

    Err(MatcherError::UnterminatedString { position: start })
}

fn read_number(chars: &[char], start: usize) -> Result<(f64, usize)> {
    let mut i = start;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    // A fraction needs at least one digit after the dot
    if chars.get(i) == Some(&'.') && chars.get(i + 1).map_or(false, |c| c.is_ascii_digit()) {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }

    let text: String = chars[start..i].iter().collect();
    let number = text
        .parse::<f64>()
        .map_err(|_| MatcherError::InvalidNumber(text.clone()))?;
    Ok((number, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_path_and_comparison() {
        assert_eq!(
            kinds("resource.owner_id == subject.id"),
            vec![
                Token::Ident("resource".into()),
                Token::Dot,
                Token::Ident("owner_id".into()),
                Token::Compare(CompareOp::Eq),
                Token::Ident("subject".into()),
                Token::Dot,
                Token::Ident("id".into()),
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds(r#"'it\'s' "two" 42 -3.5 true false"#),
            vec![
                Token::String("it's".into()),
                Token::String("two".into()),
                Token::Number(42.0),
                Token::Number(-3.5),
                Token::Bool(true),
                Token::Bool(false),
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a>=1&&b<2||c!=3"),
            vec![
                Token::Ident("a".into()),
                Token::Compare(CompareOp::Ge),
                Token::Number(1.0),
                Token::And,
                Token::Ident("b".into()),
                Token::Compare(CompareOp::Lt),
                Token::Number(2.0),
                Token::Or,
                Token::Ident("c".into()),
                Token::Compare(CompareOp::Ne),
                Token::Number(3.0),
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("  subject.id").unwrap();
        assert_eq!(tokens[0].position, 2);
        assert_eq!(tokens[1].position, 9);
    }

    #[test]
    fn test_rejects_single_ampersand_and_assignment() {
        assert_eq!(
            tokenize("a & b"),
            Err(MatcherError::UnexpectedCharacter { ch: '&', position: 2 })
        );
        assert_eq!(
            tokenize("a = b"),
            Err(MatcherError::UnexpectedCharacter { ch: '=', position: 2 })
        );
        assert!(matches!(tokenize("a @ b"), Err(MatcherError::UnexpectedCharacter { ch: '@', .. })));
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokenize("subject.name == 'bob"),
            Err(MatcherError::UnterminatedString { position: 16 })
        );
    }
}
