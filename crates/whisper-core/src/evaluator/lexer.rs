//! Tokenizer for the embedded arithmetic/boolean expression grammar.

use super::{errors::EvalError, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    /// A value spliced in by identifier resolution
    Value(Value),
    True,
    False,
    None,
    And,
    Or,
    Not,
    In,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

impl Token {
    /// The word this token was spelled with, for identifier-like tokens.
    ///
    /// Name matching during resolution works on words, so a keyword spelled
    /// the same as part of a variable or property name still matches.
    pub fn word(&self) -> Option<&str> {
        match self {
            Token::Ident(name) => Some(name),
            Token::True => Some("True"),
            Token::False => Some("False"),
            Token::None => Some("None"),
            Token::And => Some("and"),
            Token::Or => Some("or"),
            Token::Not => Some("not"),
            Token::In => Some("in"),
            _ => None,
        }
    }

    /// True for string literals, whether written or substituted
    pub fn is_string(&self) -> bool {
        matches!(self, Token::Str(_) | Token::Value(Value::String(_)))
    }

    /// Comparison and logical operators, which switch off implicit string
    /// concatenation.
    pub fn is_comparison_or_logical(&self) -> bool {
        matches!(
            self,
            Token::EqEq
                | Token::NotEq
                | Token::Lt
                | Token::LtEq
                | Token::Gt
                | Token::GtEq
                | Token::And
                | Token::Or
                | Token::Not
                | Token::In
        )
    }
}

/// A token with the byte range it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, EvalError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.source.len(), |&(i, _)| i)
    }

    fn run(mut self) -> Result<Vec<Spanned>, EvalError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }
            let start = self.offset();
            let token = match c {
                '"' | '\'' => self.string(c)?,
                c if c.is_ascii_digit() => self.number()?,
                '.' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.number()?,
                c if c.is_alphabetic() || c == '_' => self.word(),
                _ => self.operator(c)?,
            };
            tokens.push(Spanned {
                token,
                start,
                end: self.offset(),
            });
        }
        Ok(tokens)
    }

    fn string(&mut self, quote: char) -> Result<Token, EvalError> {
        self.pos += 1;
        let mut text = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(EvalError::syntax("unterminated string literal"));
            };
            self.pos += 1;
            match c {
                '\\' => {
                    let Some(escaped) = self.peek() else {
                        return Err(EvalError::syntax("unterminated string literal"));
                    };
                    self.pos += 1;
                    match escaped {
                        'n' => text.push('\n'),
                        't' => text.push('\t'),
                        'r' => text.push('\r'),
                        '0' => text.push('\0'),
                        '\\' | '"' | '\'' => text.push(escaped),
                        other => {
                            text.push('\\');
                            text.push(other);
                        }
                    }
                }
                c if c == quote => return Ok(Token::Str(text)),
                c => text.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Token, EvalError> {
        let start = self.offset();
        let mut is_float = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.pos += 1;
        }
        if self.peek() == Some('.') {
            is_float = true;
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some('+' | '-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.pos += 1 + sign;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }
        if let Some(c) = self.peek().filter(|c| c.is_alphabetic() || *c == '_') {
            let end = self.offset() + c.len_utf8();
            return Err(EvalError::syntax(format!(
                "invalid number literal '{}'",
                &self.source[start..end]
            )));
        }
        let literal = self.source[start..self.offset()].replace('_', "");
        if !is_float {
            if let Ok(i) = literal.parse::<i64>() {
                return Ok(Token::Int(i));
            }
        }
        literal
            .parse::<f64>()
            .map(Token::Float)
            .map_err(|_| EvalError::syntax(format!("invalid number literal '{literal}'")))
    }

    fn word(&mut self) -> Token {
        let start = self.offset();
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        match &self.source[start..self.offset()] {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "in" => Token::In,
            "True" | "true" => Token::True,
            "False" | "false" => Token::False,
            "None" => Token::None,
            name => Token::Ident(name.to_string()),
        }
    }

    fn operator(&mut self, c: char) -> Result<Token, EvalError> {
        let next = self.peek_at(1);
        let (token, width) = match (c, next) {
            ('*', Some('*')) => (Token::StarStar, 2),
            ('/', Some('/')) => (Token::SlashSlash, 2),
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('<', Some('=')) => (Token::LtEq, 2),
            ('>', Some('=')) => (Token::GtEq, 2),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (',', _) => (Token::Comma, 1),
            (other, _) => {
                return Err(EvalError::syntax(format!("unexpected character '{other}'")));
            }
        };
        self.pos += width;
        Ok(token)
    }
}
