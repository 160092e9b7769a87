//! Recursive-descent parser for attribute expressions
//!
//! ```text
//! expr       := or_expr
//! or_expr    := and_expr ("||" and_expr)*
//! and_expr   := comparison ("&&" comparison)*
//! comparison := operand (("=="|"!="|">="|"<="|">"|"<") operand)?
//! operand    := path | literal | "(" expr ")"
//! path       := ("subject"|"resource"|"domain") "." identifier ("." identifier)*
//! literal    := string | number | boolean
//! ```

use super::ast::{Expr, Literal, LogicalOp, Operand, Path, Root};
use super::error::{MatcherError, Result};
use super::lexer::{tokenize, Spanned, Token};

/// Deepest nesting accepted before parsing gives up. Every group and every
/// chained `&&`/`||` adds a level to the tree.
pub const MAX_NESTING: usize = 128;

pub struct ExpressionParser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl ExpressionParser {
    /// Parse an expression string into a syntax tree
    pub fn parse(input: &str) -> Result<Expr> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(MatcherError::EmptyExpression);
        }

        let mut parser = Self {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_or()?;

        if let Some(extra) = parser.peek() {
            return Err(MatcherError::UnexpectedToken {
                found: extra.token.to_string(),
                position: extra.position,
            });
        }

        Ok(expr)
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self, expected: &'static str) -> Result<Spanned> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(MatcherError::UnexpectedEnd { expected })?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek().map(|s| &s.token) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(MatcherError::TooDeep { limit: MAX_NESTING });
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut result = self.parse_and()?;
        while self.eat(&Token::Or) {
            self.descend()?;
            let right = self.parse_and()?;
            result = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(result),
                right: Box::new(right),
            };
        }
        self.depth = entry;
        Ok(result)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut result = self.parse_comparison()?;
        while self.eat(&Token::And) {
            self.descend()?;
            let right = self.parse_comparison()?;
            result = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(result),
                right: Box::new(right),
            };
        }
        self.depth = entry;
        Ok(result)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_operand()?;

        let op = match self.peek() {
            Some(Spanned {
                token: Token::Compare(op),
                ..
            }) => *op,
            _ => return Ok(Expr::Operand(left)),
        };
        self.pos += 1;

        let right = self.parse_operand()?;
        Ok(Expr::Compare { left, op, right })
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        let Spanned { token, position } = self.next("an attribute path or literal")?;

        match token {
            Token::String(s) => Ok(Operand::Literal(Literal::String(s))),
            Token::Number(n) => Ok(Operand::Literal(Literal::Number(n))),
            Token::Bool(b) => Ok(Operand::Literal(Literal::Bool(b))),
            Token::LParen => {
                self.descend()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                let close = self.next("')'")?;
                if close.token != Token::RParen {
                    return Err(MatcherError::UnexpectedToken {
                        found: close.token.to_string(),
                        position: close.position,
                    });
                }
                Ok(Operand::Group(Box::new(inner)))
            }
            Token::Ident(word) => {
                let root = Root::from_keyword(&word).ok_or(MatcherError::UnknownRoot(word))?;
                self.parse_path(root).map(Operand::Path)
            }
            other => Err(MatcherError::UnexpectedToken {
                found: other.to_string(),
                position,
            }),
        }
    }

    fn parse_path(&mut self, root: Root) -> Result<Path> {
        let mut segments = Vec::new();

        while self.eat(&Token::Dot) {
            let Spanned { token, position } = self.next("an attribute name")?;
            match token {
                Token::Ident(name) => segments.push(name),
                other => {
                    return Err(MatcherError::UnexpectedToken {
                        found: other.to_string(),
                        position,
                    })
                }
            }
        }

        if segments.is_empty() {
            return Err(MatcherError::IncompletePath(root.as_str().to_string()));
        }

        Ok(Path { root, segments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ast::CompareOp;

    #[test]
    fn test_simple_comparison() {
        let expr = ExpressionParser::parse("resource.author_id == subject.id").unwrap();
        assert!(matches!(expr, Expr::Compare { op: CompareOp::Eq, .. }));
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = ExpressionParser::parse(
            "subject.admin || subject.level >= 3 && resource.public == true",
        )
        .unwrap();

        match expr {
            Expr::Logical {
                op: LogicalOp::Or,
                right,
                ..
            } => assert!(matches!(*right, Expr::Logical { op: LogicalOp::And, .. })),
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn test_nested_path() {
        let expr = ExpressionParser::parse("domain.settings.tier == 'gold'").unwrap();
        match expr {
            Expr::Compare {
                left: Operand::Path(path),
                ..
            } => {
                assert_eq!(path.root, Root::Domain);
                assert_eq!(path.segments, vec!["settings", "tier"]);
            }
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn test_display_round_trip() {
        let source = "(subject.age >= 18 || subject.guardian == true) && resource.rating != \"adult\"";
        let expr = ExpressionParser::parse(source).unwrap();
        let printed = expr.to_string();

        assert_eq!(ExpressionParser::parse(&printed).unwrap(), expr);
    }

    #[test]
    fn test_display_round_trip_escapes_strings() {
        let expr = Expr::Compare {
            left: Operand::Path(Path {
                root: Root::Resource,
                segments: vec!["title".to_string()],
            }),
            op: CompareOp::Eq,
            right: Operand::Literal(Literal::String("say \"hi\"\\\n\t\u{1}'".to_string())),
        };
        let printed = expr.to_string();

        assert_eq!(printed, "resource.title == \"say \\\"hi\\\"\\\\\\n\\t\u{1}'\"");
        assert_eq!(ExpressionParser::parse(&printed).unwrap(), expr);
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |levels: usize| {
            format!("{}subject.id == 1{}", "(".repeat(levels), ")".repeat(levels))
        };

        assert!(ExpressionParser::parse(&nested(MAX_NESTING)).is_ok());
        assert_eq!(
            ExpressionParser::parse(&nested(MAX_NESTING + 1)),
            Err(MatcherError::TooDeep { limit: MAX_NESTING })
        );
        assert_eq!(
            ExpressionParser::parse(&"(".repeat(200_000)),
            Err(MatcherError::TooDeep { limit: MAX_NESTING })
        );

        let long_chain = vec!["subject.a == 1"; 100_000].join(" || ");
        assert_eq!(
            ExpressionParser::parse(&long_chain),
            Err(MatcherError::TooDeep { limit: MAX_NESTING })
        );
        let short_chain = vec!["subject.a == 1"; 16].join(" && ");
        assert!(ExpressionParser::parse(&short_chain).is_ok());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ExpressionParser::parse("   "), Err(MatcherError::EmptyExpression));
        assert_eq!(
            ExpressionParser::parse("user.id == 1"),
            Err(MatcherError::UnknownRoot("user".to_string()))
        );
        assert_eq!(
            ExpressionParser::parse("subject == 1"),
            Err(MatcherError::IncompletePath("subject".to_string()))
        );
        assert!(matches!(
            ExpressionParser::parse("subject.id =="),
            Err(MatcherError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            ExpressionParser::parse("subject.id == 1 2"),
            Err(MatcherError::UnexpectedToken { position: 16, .. })
        ));
        assert!(matches!(
            ExpressionParser::parse("(subject.id == 1"),
            Err(MatcherError::UnexpectedEnd { expected: "')'" })
        ));
        assert!(matches!(
            ExpressionParser::parse("subject.id == 1 == 2"),
            Err(MatcherError::UnexpectedToken { .. })
        ));
    }
}
