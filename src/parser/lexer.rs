//! Lexer (tokenizer) for Forge source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! `#` starts a comment that runs to the end of the line. Identifiers are
//! promoted to keyword tokens or to [`Token::TypeName`] while scanning, so the
//! parser never has to compare identifier text against reserved words.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// Names promoted to [`Token::TypeName`].
pub const TYPE_NAMES: &[&str] = &[
    "int",
    "str",
    "bool",
    "any",
    "list",
    "StringList",
    "float",
    "arr",
    "pointer",
];

/// One Forge token, tagged with where it starts.
///
/// Fixed spellings for keywords and symbols live in [`KEYWORDS`] and
/// [`SYMBOLS`].
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    IntLiteral(i64, SourceLocation),
    FloatLiteral(f64, SourceLocation),
    StringLiteral(String, SourceLocation),

    // Identifiers and type names
    Ident(String, SourceLocation),
    TypeName(String, SourceLocation),

    // Keywords
    Let(SourceLocation),
    Fn(SourceLocation),
    Return(SourceLocation),
    If(SourceLocation),
    Else(SourceLocation),
    Elif(SourceLocation),
    While(SourceLocation),
    For(SourceLocation),
    Break(SourceLocation),
    Continue(SourceLocation),
    Match(SourceLocation),
    Default(SourceLocation),
    True(SourceLocation),
    False(SourceLocation),
    Null(SourceLocation),
    Struct(SourceLocation),
    Attempt(SourceLocation),
    Rescue(SourceLocation),
    Read(SourceLocation),
    Write(SourceLocation),
    Addto(SourceLocation),
    Load(SourceLocation),

    // Operators
    Plus(SourceLocation),
    Minus(SourceLocation),
    Star(SourceLocation),
    Slash(SourceLocation),
    Percent(SourceLocation),
    Caret(SourceLocation),

    EqEq(SourceLocation),
    NotEq(SourceLocation),
    Lt(SourceLocation),
    Le(SourceLocation),
    Gt(SourceLocation),
    Ge(SourceLocation),

    AndAnd(SourceLocation),
    OrOr(SourceLocation),
    Bang(SourceLocation),

    Amp(SourceLocation),
    Eq(SourceLocation),
    At(SourceLocation),

    PlusPlus(SourceLocation),
    MinusMinus(SourceLocation),

    Arrow(SourceLocation),
    FatArrow(SourceLocation),

    Dot(SourceLocation),
    Colon(SourceLocation),
    LParen(SourceLocation),
    RParen(SourceLocation),
    LBrace(SourceLocation),
    RBrace(SourceLocation),
    LBracket(SourceLocation),
    RBracket(SourceLocation),
    Semicolon(SourceLocation),
    Comma(SourceLocation),

    Eof(SourceLocation),
}

impl Token {
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::IntLiteral(_, loc)
            | Token::FloatLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::TypeName(_, loc)
            | Token::Let(loc)
            | Token::Fn(loc)
            | Token::Return(loc)
            | Token::If(loc)
            | Token::Else(loc)
            | Token::Elif(loc)
            | Token::While(loc)
            | Token::For(loc)
            | Token::Break(loc)
            | Token::Continue(loc)
            | Token::Match(loc)
            | Token::Default(loc)
            | Token::True(loc)
            | Token::False(loc)
            | Token::Null(loc)
            | Token::Struct(loc)
            | Token::Attempt(loc)
            | Token::Rescue(loc)
            | Token::Read(loc)
            | Token::Write(loc)
            | Token::Addto(loc)
            | Token::Load(loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::Slash(loc)
            | Token::Percent(loc)
            | Token::Caret(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::Lt(loc)
            | Token::Le(loc)
            | Token::Gt(loc)
            | Token::Ge(loc)
            | Token::AndAnd(loc)
            | Token::OrOr(loc)
            | Token::Bang(loc)
            | Token::Amp(loc)
            | Token::Eq(loc)
            | Token::At(loc)
            | Token::PlusPlus(loc)
            | Token::MinusMinus(loc)
            | Token::Arrow(loc)
            | Token::FatArrow(loc)
            | Token::Dot(loc)
            | Token::Colon(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::Semicolon(loc)
            | Token::Comma(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

/// Keywords, matched against whole identifiers.
pub const KEYWORDS: &[(&str, fn(SourceLocation) -> Token)] = &[
    ("let", Token::Let),
    ("fn", Token::Fn),
    ("return", Token::Return),
    ("if", Token::If),
    ("else", Token::Else),
    ("elif", Token::Elif),
    ("while", Token::While),
    ("for", Token::For),
    ("break", Token::Break),
    ("continue", Token::Continue),
    ("match", Token::Match),
    ("default", Token::Default),
    ("true", Token::True),
    ("false", Token::False),
    ("null", Token::Null),
    ("struct", Token::Struct),
    ("attempt", Token::Attempt),
    ("rescue", Token::Rescue),
    ("read", Token::Read),
    ("write", Token::Write),
    ("addto", Token::Addto),
    ("load", Token::Load),
];

/// Operators and punctuation, longest first so `=>` wins over `=`.
pub const SYMBOLS: &[(&str, fn(SourceLocation) -> Token)] = &[
    ("=>", Token::FatArrow),
    ("->", Token::Arrow),
    ("++", Token::PlusPlus),
    ("--", Token::MinusMinus),
    ("==", Token::EqEq),
    ("!=", Token::NotEq),
    ("<=", Token::Le),
    (">=", Token::Ge),
    ("&&", Token::AndAnd),
    ("||", Token::OrOr),
    ("+", Token::Plus),
    ("-", Token::Minus),
    ("*", Token::Star),
    ("/", Token::Slash),
    ("%", Token::Percent),
    ("^", Token::Caret),
    ("<", Token::Lt),
    (">", Token::Gt),
    ("!", Token::Bang),
    ("&", Token::Amp),
    ("=", Token::Eq),
    ("@", Token::At),
    (".", Token::Dot),
    (":", Token::Colon),
    ("(", Token::LParen),
    (")", Token::RParen),
    ("{", Token::LBrace),
    ("}", Token::RBrace),
    ("[", Token::LBracket),
    ("]", Token::RBracket),
    (";", Token::Semicolon),
    (",", Token::Comma),
];

impl Token {
    /// Source spelling of a keyword or symbol token.
    pub fn spelling(&self) -> Option<&'static str> {
        let loc = self.location();
        KEYWORDS
            .iter()
            .chain(SYMBOLS)
            .find(|(_, make)| make(loc) == *self)
            .map(|(text, _)| *text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _) => write!(f, "int literal {}", n),
            Token::FloatLiteral(n, _) => write!(f, "float literal {}", n),
            Token::StringLiteral(s, _) => write!(f, "string literal \"{}\"", s.escape_default()),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::TypeName(s, _) => write!(f, "type '{}'", s),
            Token::Eof(_) => write!(f, "end of file"),
            other => match other.spelling() {
                Some(text) => write!(f, "'{}'", text),
                None => write!(f, "{:?}", other),
            },
        }
    }
}

/// A character sequence that is not Forge
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lexer error at {location}: {message}")]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input. The returned stream always ends with
    /// [`Token::Eof`].
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                tokens.push(Token::Eof(self.current_location()));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.peek().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        match ch {
            '"' => {
                self.advance();
                self.string_literal(loc)
            }
            '0'..='9' => {
                self.advance();
                self.number_literal(ch, loc)
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                self.advance();
                Ok(self.identifier_or_keyword(ch, loc))
            }
            _ => self.symbol(loc).ok_or_else(|| LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Longest entry of [`SYMBOLS`] at the cursor, consumed.
    fn symbol(&mut self, loc: SourceLocation) -> Option<Token> {
        let rest = &self.input[self.position..];
        let (text, make) = SYMBOLS.iter().find(|(text, _)| {
            text.chars().count() <= rest.len() && text.chars().zip(rest).all(|(a, b)| a == *b)
        })?;
        for _ in text.chars() {
            self.advance();
        }
        Some(make(loc))
    }

    /// Body of a `"..."` literal; the opening quote is already consumed.
    fn string_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            if ch == '"' {
                self.advance();
                return Ok(Token::StringLiteral(string, loc));
            }

            if ch == '\\' {
                self.advance();
                let escaped = self.advance().ok_or_else(|| LexError {
                    message: "Unexpected end of file in string literal".to_string(),
                    location: self.current_location(),
                })?;

                let unescaped = match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '\\' => '\\',
                    '"' => '"',
                    '\'' => '\'',
                    '0' => '\0',
                    _ => {
                        return Err(LexError {
                            message: format!("Unknown escape sequence: \\{}", escaped),
                            location: self.current_location(),
                        });
                    }
                };
                string.push(unescaped);
            } else {
                string.push(ch);
                self.advance();
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// `123` or `1.5`
    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut num_str = String::new();
        num_str.push(first_digit);
        self.take_digits(&mut num_str);

        // A '.' only continues the number when a digit follows it, so that
        // `xs.0` style member chains never swallow the dot.
        let is_float = self.peek() == Some('.')
            && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit());

        if is_float {
            num_str.push('.');
            self.advance();
            self.take_digits(&mut num_str);
            let value = num_str.parse::<f64>().map_err(|_| LexError {
                message: format!("Invalid float literal: {}", num_str),
                location: loc,
            })?;
            return Ok(Token::FloatLiteral(value, loc));
        }

        let value = num_str.parse::<i64>().map_err(|_| LexError {
            message: format!("Invalid integer literal: {}", num_str),
            location: loc,
        })?;

        Ok(Token::IntLiteral(value, loc))
    }

    fn take_digits(&mut self, out: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                out.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if let Some((_, make)) = KEYWORDS.iter().find(|(word, _)| *word == ident) {
            make(loc)
        } else if TYPE_NAMES.contains(&ident.as_str()) {
            Token::TypeName(ident, loc)
        } else {
            Token::Ident(ident, loc)
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '#' => {
                    while let Some(c) = self.advance() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Consume one character, keeping line and column current.
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// Tokenize `source` in one call.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tokens() {
        let tokens = tokenize("let x = 5;").unwrap();

        assert!(matches!(tokens[0], Token::Let(_)));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[2], Token::Eq(_)));
        assert!(matches!(tokens[3], Token::IntLiteral(5, _)));
        assert!(matches!(tokens[4], Token::Semicolon(_)));
        assert!(matches!(tokens[5], Token::Eof(_)));
    }

    #[test]
    fn test_multi_char_operators_win() {
        let tokens = tokenize("=> -> ++ -- == != <= >= && ||").unwrap();

        assert!(matches!(tokens[0], Token::FatArrow(_)));
        assert!(matches!(tokens[1], Token::Arrow(_)));
        assert!(matches!(tokens[2], Token::PlusPlus(_)));
        assert!(matches!(tokens[3], Token::MinusMinus(_)));
        assert!(matches!(tokens[4], Token::EqEq(_)));
        assert!(matches!(tokens[5], Token::NotEq(_)));
        assert!(matches!(tokens[6], Token::Le(_)));
        assert!(matches!(tokens[7], Token::Ge(_)));
        assert!(matches!(tokens[8], Token::AndAnd(_)));
        assert!(matches!(tokens[9], Token::OrOr(_)));
    }

    #[test]
    fn test_type_names_and_keywords_are_promoted() {
        let tokens = tokenize("fn float StringList attempt rescue name").unwrap();

        assert!(matches!(tokens[0], Token::Fn(_)));
        assert!(matches!(tokens[1], Token::TypeName(ref s, _) if s == "float"));
        assert!(matches!(tokens[2], Token::TypeName(ref s, _) if s == "StringList"));
        assert!(matches!(tokens[3], Token::Attempt(_)));
        assert!(matches!(tokens[4], Token::Rescue(_)));
        assert!(matches!(tokens[5], Token::Ident(ref s, _) if s == "name"));
    }

    #[test]
    fn test_display_spells_fixed_tokens() {
        let tokens = tokenize("=> rescue { x").unwrap();
        assert_eq!(tokens[0].to_string(), "'=>'");
        assert_eq!(tokens[1].to_string(), "'rescue'");
        assert_eq!(tokens[2].to_string(), "'{'");
        assert_eq!(tokens[3].to_string(), "identifier 'x'");
        assert_eq!(tokens[4].spelling(), None);
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("42 3.25 7.x").unwrap();

        assert!(matches!(tokens[0], Token::IntLiteral(42, _)));
        assert!(matches!(tokens[1], Token::FloatLiteral(v, _) if v == 3.25));
        assert!(matches!(tokens[2], Token::IntLiteral(7, _)));
        assert!(matches!(tokens[3], Token::Dot(_)));
    }

    #[test]
    fn test_comments_and_locations() {
        let tokens = tokenize("# header\nlet y = 1 # trailing\n").unwrap();

        assert!(matches!(tokens[0], Token::Let(_)));
        assert_eq!(tokens[0].location(), SourceLocation::new(2, 1));
        assert_eq!(tokens[1].location(), SourceLocation::new(2, 5));
        assert!(matches!(tokens[4], Token::Eof(_)));
    }

    #[test]
    fn test_string_literal_escapes() {
        let tokens = tokenize(r#""hello\n\"world\"""#).unwrap();

        match &tokens[0] {
            Token::StringLiteral(s, _) => assert_eq!(s, "hello\n\"world\""),
            other => panic!("Expected string literal, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("\"open").unwrap_err();
        assert!(err.message.contains("Unterminated"));
        assert_eq!(err.location, SourceLocation::new(1, 1));
    }

    #[test]
    fn test_unknown_character() {
        let err = tokenize("let a = $").unwrap_err();
        assert!(err.message.contains('$'));
        assert_eq!(err.location.column, 9);
    }
}
