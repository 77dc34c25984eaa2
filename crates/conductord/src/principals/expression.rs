//! Evaluator for `.mvel` principal directories.
//!
//! Only the map-literal subset used by principal files is understood:
//!
//! ```text
//! import org.jbpm.task.User;
//! [ "john" : new User("john"), "mary" : new User('mary') ]
//! ```
//!
//! `[:]` denotes an empty map. Line (`//`) and block (`/* */`) comments are
//! skipped. Evaluation binds no variables, so any other construct is an
//! error.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use super::model::{Principal, PrincipalKind};

/// Syntax or evaluation failure with the position where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ExpressionError {
    /// One-based line number.
    pub line: usize,
    /// One-based column number.
    pub column: usize,
    /// Description of the failure.
    pub message: String,
}

/// Evaluates a principal map literal into `(key, principal)` entries in
/// source order.
pub(crate) fn evaluate(source: &str) -> Result<Vec<(String, Principal)>, ExpressionError> {
    let mut cursor = Cursor::new(source);
    cursor.skip_imports()?;
    cursor.expect('[')?;
    cursor.skip_trivia()?;

    let mut entries = Vec::new();
    if cursor.eat(':') {
        cursor.skip_trivia()?;
        cursor.expect(']')?;
    } else if !cursor.eat(']') {
        loop {
            entries.push(cursor.entry()?);
            cursor.skip_trivia()?;
            if cursor.eat(',') {
                cursor.skip_trivia()?;
                if cursor.eat(']') {
                    break;
                }
                continue;
            }
            cursor.expect(']')?;
            break;
        }
    }

    cursor.skip_trivia()?;
    cursor.eat(';');
    cursor.skip_trivia()?;
    match cursor.peek() {
        Some(ch) => Err(cursor.error(format!("unexpected trailing input '{ch}'"))),
        None => Ok(entries),
    }
}

struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> ExpressionError {
        ExpressionError {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ExpressionError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump();
                Ok(())
            }
            Some(ch) => Err(self.error(format!("expected '{expected}', found '{ch}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ExpressionError> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(ch), _) if ch.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(ch) = self.bump() {
                        if ch == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ExpressionError> {
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(self.error("unterminated block comment")),
            }
        }
    }

    fn skip_imports(&mut self) -> Result<(), ExpressionError> {
        loop {
            self.skip_trivia()?;
            if !self.peek().is_some_and(is_identifier_start) {
                return Ok(());
            }
            let keyword = self.identifier()?;
            if keyword != "import" {
                return Err(self.error(format!("unexpected identifier '{keyword}'")));
            }
            self.skip_trivia()?;
            self.identifier()?;
            self.skip_trivia()?;
            self.eat(';');
        }
    }

    fn identifier(&mut self) -> Result<String, ExpressionError> {
        if !self.peek().is_some_and(is_identifier_start) {
            return Err(self.error("expected identifier"));
        }
        let mut ident = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' || ch == '*' {
                ident.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        Ok(ident)
    }

    fn string(&mut self) -> Result<String, ExpressionError> {
        let quote = match self.peek() {
            Some(ch @ ('"' | '\'')) => ch,
            _ => return Err(self.error("expected string literal")),
        };
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(ch) if ch == quote => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(other) => value.push(other),
                    None => return Err(self.error("unterminated string literal")),
                },
                Some(ch) => value.push(ch),
                None => return Err(self.error("unterminated string literal")),
            }
        }
    }

    fn entry(&mut self) -> Result<(String, Principal), ExpressionError> {
        let key = self.string()?;
        self.skip_trivia()?;
        self.expect(':')?;
        self.skip_trivia()?;
        let principal = self.constructor()?;
        Ok((key, principal))
    }

    fn constructor(&mut self) -> Result<Principal, ExpressionError> {
        let keyword = self.identifier()?;
        if keyword != "new" {
            return Err(self.error(format!("expected 'new', found '{keyword}'")));
        }
        self.skip_trivia()?;
        let type_name = self.identifier()?;
        let simple_name = type_name.rsplit('.').next().unwrap_or(type_name.as_str());
        let kind = match simple_name {
            "User" => PrincipalKind::User,
            "Group" => PrincipalKind::Group,
            other => return Err(self.error(format!("unknown principal type '{other}'"))),
        };
        self.skip_trivia()?;
        self.expect('(')?;
        self.skip_trivia()?;
        let id = self.string()?;
        self.skip_trivia()?;
        self.expect(')')?;
        Ok(Principal::new(kind, id))
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}
