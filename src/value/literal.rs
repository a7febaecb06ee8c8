//! Literal-expression evaluation for the text-fallback editor.
//!
//! When no widget matches a type, the resolver falls back to a line editor
//! whose text is parsed as a literal expression *when the value is read*,
//! not while the user types. The grammar covers exactly what [`Value`] can
//! hold: booleans, `None`, integers, floats, quoted strings, lists, and
//! tuples. Tokenized with logos, parsed by recursive descent.

use logos::Logos;

use crate::value::Value;

/// Errors from evaluating literal-editor text. Raised lazily, only when the
/// widget's value is accessed.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("empty literal expression")]
    Empty,
    #[error("unrecognized token at byte {offset}: {text:?}")]
    UnrecognizedToken { offset: usize, text: String },
    #[error("unexpected token at position {position}: {message}")]
    UnexpectedToken { position: usize, message: String },
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
    #[error("trailing input after literal: {0:?}")]
    TrailingInput(String),
    #[error("malformed number: {0:?}")]
    MalformedNumber(String),
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum Token {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token("-")]
    Minus,
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    NoneWord,
    // Float before Int: the int regex would otherwise claim "1" out of "1.5".
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?|\.[0-9]+([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+")]
    Float,
    #[regex(r"[0-9]+")]
    Int,
    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuoted,
    #[regex(r#"'([^'\\]|\\.)*'"#)]
    SingleQuoted,
}

/// A token with its source text, for value extraction and error reporting.
#[derive(Debug, Clone)]
struct PToken {
    token: Token,
    text: String,
    pos: usize,
}

fn tokenize(input: &str) -> Result<Vec<PToken>, EvaluationError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(input);
    let mut idx = 0;
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => {
                tokens.push(PToken {
                    token,
                    text: lexer.slice().to_owned(),
                    pos: idx,
                });
                idx += 1;
            }
            Err(()) => {
                return Err(EvaluationError::UnrecognizedToken {
                    offset: lexer.span().start,
                    text: lexer.slice().to_owned(),
                })
            }
        }
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Evaluate `text` as a literal expression.
pub fn evaluate_literal(text: &str) -> Result<Value, EvaluationError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(EvaluationError::Empty);
    }
    let mut parser = Parser { tokens, cursor: 0 };
    let value = parser.parse_value()?;
    if let Some(extra) = parser.peek() {
        return Err(EvaluationError::TrailingInput(extra.text.clone()));
    }
    Ok(value)
}

struct Parser {
    tokens: Vec<PToken>,
    cursor: usize,
}

impl Parser {
    fn peek(&self) -> Option<&PToken> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<PToken> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn parse_value(&mut self) -> Result<Value, EvaluationError> {
        let tok = self
            .advance()
            .ok_or_else(|| EvaluationError::UnexpectedEof("expected a literal".into()))?;
        match tok.token {
            Token::True => Ok(Value::Bool(true)),
            Token::False => Ok(Value::Bool(false)),
            Token::NoneWord => Ok(Value::Null),
            Token::Int => self.number(&tok.text, false),
            Token::Float => self.float(&tok.text, false),
            Token::Minus => {
                let next = self.advance().ok_or_else(|| {
                    EvaluationError::UnexpectedEof("expected a number after '-'".into())
                })?;
                match next.token {
                    Token::Int => self.number(&next.text, true),
                    Token::Float => self.float(&next.text, true),
                    _ => Err(EvaluationError::UnexpectedToken {
                        position: next.pos,
                        message: format!("expected a number after '-', found {:?}", next.text),
                    }),
                }
            }
            Token::DoubleQuoted | Token::SingleQuoted => Ok(Value::Str(unescape(&tok.text))),
            Token::LBracket => self.sequence(Token::RBracket, "]").map(Value::List),
            Token::LParen => self.tuple(),
            _ => Err(EvaluationError::UnexpectedToken {
                position: tok.pos,
                message: format!("unexpected {:?}", tok.text),
            }),
        }
    }

    fn number(&self, text: &str, negative: bool) -> Result<Value, EvaluationError> {
        let n: i64 = text
            .parse()
            .map_err(|_| EvaluationError::MalformedNumber(text.to_owned()))?;
        Ok(Value::Int(if negative { -n } else { n }))
    }

    fn float(&self, text: &str, negative: bool) -> Result<Value, EvaluationError> {
        let f: f64 = text
            .parse()
            .map_err(|_| EvaluationError::MalformedNumber(text.to_owned()))?;
        Ok(Value::Float(if negative { -f } else { f }))
    }

    /// Parse comma-separated values up to (and consuming) `close`.
    fn sequence(&mut self, close: Token, close_text: &str) -> Result<Vec<Value>, EvaluationError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(tok) if tok.token == close => {
                    self.advance();
                    return Ok(items);
                }
                Some(_) => {}
                None => {
                    return Err(EvaluationError::UnexpectedEof(format!(
                        "expected {close_text:?}"
                    )))
                }
            }
            items.push(self.parse_value()?);
            match self.peek() {
                Some(tok) if tok.token == Token::Comma => {
                    self.advance();
                }
                Some(tok) if tok.token == close => {}
                Some(tok) => {
                    return Err(EvaluationError::UnexpectedToken {
                        position: tok.pos,
                        message: format!("expected ',' or {close_text:?}, found {:?}", tok.text),
                    })
                }
                None => {
                    return Err(EvaluationError::UnexpectedEof(format!(
                        "expected {close_text:?}"
                    )))
                }
            }
        }
    }

    /// Parentheses follow the usual literal convention: `(x)` is just `x`,
    /// `(x,)` and longer are tuples, `()` is the empty tuple.
    fn tuple(&mut self) -> Result<Value, EvaluationError> {
        if let Some(tok) = self.peek() {
            if tok.token == Token::RParen {
                self.advance();
                return Ok(Value::Tuple(Vec::new()));
            }
        }
        let first = self.parse_value()?;
        match self.advance() {
            Some(tok) if tok.token == Token::RParen => Ok(first),
            Some(tok) if tok.token == Token::Comma => {
                let mut items = vec![first];
                items.extend(self.sequence(Token::RParen, ")")?);
                Ok(Value::Tuple(items))
            }
            Some(tok) => Err(EvaluationError::UnexpectedToken {
                position: tok.pos,
                message: format!("expected ',' or ')', found {:?}", tok.text),
            }),
            None => Err(EvaluationError::UnexpectedEof("expected ')'".into())),
        }
    }
}

/// Strip surrounding quotes and process escape sequences.
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

// ===========================================================================
// Tests
// ===========================================================================
