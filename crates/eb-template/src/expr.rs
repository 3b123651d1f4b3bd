//! Expression parser for the body of a `<%= ... %>` tag.
//!
//! Grammar:
//!
//! ```text
//! expr    := term ('+' term)*
//! term    := primary ('.' ident)*
//! primary := string | number | 'nil' | 'true' | 'false'
//!          | 'ENV' '[' expr ']'
//!          | 'ENV' '.' 'fetch' '(' expr (',' expr)? ')'
//!          | '(' expr ')'
//! ```

use crate::TemplateError;
use std::fmt;

/// A runtime value produced by an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
        }
    }
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// `ENV['NAME']`, nil when unset
    EnvIndex(Box<Expr>),
    /// `ENV.fetch('NAME'[, default])`
    EnvFetch {
        name: Box<Expr>,
        default: Option<Box<Expr>>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
    },
    Add(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Int(i64),
    Float(f64),
    Ident(String),
    LBracket,
    RBracket,
    LParen,
    RParen,
    Dot,
    Comma,
    Plus,
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, TemplateError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '[' | ']' | '(' | ')' | '.' | ',' | '+' => {
                let token = match c {
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '.' => Token::Dot,
                    ',' => Token::Comma,
                    _ => Token::Plus,
                };
                tokens.push((offset, token));
                i += 1;
            }
            '\'' | '"' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    let Some(&(_, ch)) = chars.get(i) else {
                        return Err(TemplateError::syntax(offset, "unterminated string literal"));
                    };
                    i += 1;
                    if ch == quote {
                        break;
                    }
                    if ch != '\\' {
                        text.push(ch);
                        continue;
                    }
                    let Some(&(_, escaped)) = chars.get(i) else {
                        return Err(TemplateError::syntax(offset, "unterminated string literal"));
                    };
                    i += 1;
                    match (quote, escaped) {
                        (_, '\\') => text.push('\\'),
                        (q, e) if q == e => text.push(e),
                        ('"', 'n') => text.push('\n'),
                        ('"', 't') => text.push('\t'),
                        // Single-quoted strings keep unknown escapes verbatim
                        (_, e) => {
                            text.push('\\');
                            text.push(e);
                        }
                    }
                }
                tokens.push((offset, Token::Str(text)));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                let mut is_float = false;
                while let Some(&(_, ch)) = chars.get(i) {
                    let next_is_digit = chars
                        .get(i + 1)
                        .map(|&(_, n)| n.is_ascii_digit())
                        .unwrap_or(false);
                    if ch.is_ascii_digit() || ch == '_' {
                        i += 1;
                    } else if ch == '.' && !is_float && next_is_digit {
                        is_float = true;
                        i += 1;
                    } else {
                        break;
                    }
                }
                let literal: String = chars[start..i]
                    .iter()
                    .map(|&(_, ch)| ch)
                    .filter(|ch| *ch != '_')
                    .collect();
                let token = if is_float {
                    literal
                        .parse::<f64>()
                        .map(Token::Float)
                        .map_err(|e| TemplateError::syntax(offset, e.to_string()))?
                } else {
                    literal
                        .parse::<i64>()
                        .map(Token::Int)
                        .map_err(|e| TemplateError::syntax(offset, e.to_string()))?
                };
                tokens.push((offset, token));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while let Some(&(_, ch)) = chars.get(i) {
                    if ch.is_alphanumeric() || ch == '_' || ch == '?' || ch == '!' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let ident: String = chars[start..i].iter().map(|&(_, ch)| ch).collect();
                tokens.push((offset, Token::Ident(ident)));
            }
            other => {
                return Err(TemplateError::syntax(
                    offset,
                    format!("unexpected character '{}'", other),
                ));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(o, _)| *o)
            .unwrap_or(self.end)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), TemplateError> {
        let offset = self.offset();
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            _ => Err(TemplateError::syntax(offset, format!("expected {}", what))),
        }
    }

    fn expr(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.term()?;
        while self.peek() == Some(&Token::Plus) {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, TemplateError> {
        let mut receiver = self.primary()?;
        while self.peek() == Some(&Token::Dot) {
            self.pos += 1;
            let offset = self.offset();
            match self.next() {
                Some(Token::Ident(method)) => {
                    receiver = Expr::MethodCall {
                        receiver: Box::new(receiver),
                        method,
                    };
                }
                _ => return Err(TemplateError::syntax(offset, "expected method name")),
            }
        }
        Ok(receiver)
    }

    fn primary(&mut self) -> Result<Expr, TemplateError> {
        let offset = self.offset();
        match self.next() {
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::Int(i)) => Ok(Expr::Literal(Value::Int(i))),
            Some(Token::Float(x)) => Ok(Expr::Literal(Value::Float(x))),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(ident)) => match ident.as_str() {
                "nil" => Ok(Expr::Literal(Value::Nil)),
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "ENV" => self.env_access(),
                _ => Err(TemplateError::UnknownIdentifier(ident.clone())),
            },
            Some(_) => Err(TemplateError::syntax(offset, "unexpected token")),
            None => Err(TemplateError::syntax(offset, "unexpected end of expression")),
        }
    }

    fn env_access(&mut self) -> Result<Expr, TemplateError> {
        let offset = self.offset();
        match self.next() {
            Some(Token::LBracket) => {
                let name = self.expr()?;
                self.expect(Token::RBracket, "']'")?;
                Ok(Expr::EnvIndex(Box::new(name)))
            }
            Some(Token::Dot) => {
                let method_offset = self.offset();
                match self.next() {
                    Some(Token::Ident(m)) if m == "fetch" => {}
                    Some(Token::Ident(m)) => {
                        return Err(TemplateError::UnknownMethod {
                            method: m,
                            receiver: "ENV".to_string(),
                        })
                    }
                    _ => return Err(TemplateError::syntax(method_offset, "expected method name")),
                }
                self.expect(Token::LParen, "'('")?;
                let name = self.expr()?;
                let default = if self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                    Some(Box::new(self.expr()?))
                } else {
                    None
                };
                self.expect(Token::RParen, "')'")?;
                Ok(Expr::EnvFetch {
                    name: Box::new(name),
                    default,
                })
            }
            _ => Err(TemplateError::syntax(offset, "expected '[' or '.fetch' after ENV")),
        }
    }
}

/// Parse the body of an output tag into an expression tree.
pub fn parse_expression(source: &str) -> Result<Expr, TemplateError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
    };
    let expr = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(TemplateError::syntax(parser.offset(), "unexpected trailing input"));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Str(s.to_string())))
    }

    #[test]
    fn test_parse_string_literals() {
        assert_eq!(parse_expression("'abc'").unwrap(), *lit("abc"));
        assert_eq!(parse_expression(r#""a\"b""#).unwrap(), *lit("a\"b"));
        assert_eq!(parse_expression(r"'it\'s'").unwrap(), *lit("it's"));
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(
            parse_expression("8_080").unwrap(),
            Expr::Literal(Value::Int(8080))
        );
        assert_eq!(
            parse_expression("1.5").unwrap(),
            Expr::Literal(Value::Float(1.5))
        );
    }

    #[test]
    fn test_parse_integer_method_call() {
        assert_eq!(
            parse_expression("1.to_s").unwrap(),
            Expr::MethodCall {
                receiver: Box::new(Expr::Literal(Value::Int(1))),
                method: "to_s".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_env_forms() {
        assert_eq!(
            parse_expression("ENV['HOME']").unwrap(),
            Expr::EnvIndex(lit("HOME"))
        );
        assert_eq!(
            parse_expression("ENV.fetch('PORT', '80')").unwrap(),
            Expr::EnvFetch {
                name: lit("PORT"),
                default: Some(lit("80")),
            }
        );
    }

    #[test]
    fn test_parse_concatenation_is_left_associative() {
        assert_eq!(
            parse_expression("'a' + 'b' + 'c'").unwrap(),
            Expr::Add(Box::new(Expr::Add(lit("a"), lit("b"))), lit("c"))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_expression("'open"),
            Err(TemplateError::Syntax { .. })
        ));
        assert!(matches!(
            parse_expression("Time.now"),
            Err(TemplateError::UnknownIdentifier(ref name)) if name == "Time"
        ));
        assert!(matches!(
            parse_expression("'a' 'b'"),
            Err(TemplateError::Syntax { .. })
        ));
        assert!(matches!(
            parse_expression(""),
            Err(TemplateError::Syntax { .. })
        ));
        assert!(matches!(
            parse_expression("ENV.keys"),
            Err(TemplateError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_float_display() {
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Nil.to_string(), "");
    }
}
