//! The token source: a pull tokenizer over JSON text.
//!
//! [`Reader`] turns text into a stream of [`Token`]s. It validates structure as it goes (balanced
//! brackets, `key: value` pairs, separators) so consumers only ever see well formed sequences of
//! tokens. Lexing of literals is done with `nom`, numeric conversion with `lexical-core`.
//!
//! # Example
//! ```rust
//! # use jsonmap::*;
//! let mut reader = Reader::new(r#"{ "a": [1, 2.5] } // trailing comment"#);
//!
//! let mut tokens = Vec::new();
//! loop {
//!     let t = reader.next_token().unwrap();
//!     if t == Token::End {
//!         break;
//!     }
//!     tokens.push(t);
//! }
//!
//! assert_eq!(
//!     tokens,
//!     vec![
//!         Token::ObjectStart,
//!         Token::PropertyName("a".into()),
//!         Token::ArrayStart,
//!         Token::Int(1),
//!         Token::Double(2.5),
//!         Token::ArrayEnd,
//!         Token::ObjectEnd,
//!     ]
//! );
//! ```
mod err;
mod lex;

pub use self::err::ParseError;

/// A lexical unit of JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `{`
    ObjectStart,
    /// An object key, including its `:` separator.
    PropertyName(String),
    /// `}`
    ObjectEnd,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// An integer which fits an `i32`.
    Int(i32),
    /// An integer which fits an `i64` but not an `i32`.
    Long(i64),
    /// A positive integer which only fits a `u64`.
    ULong(u64),
    /// Any other number.
    Double(f64),
    /// A string value.
    String(String),
    /// `true` or `false`.
    Boolean(bool),
    /// `null`.
    Null,
    /// No more input.
    End,
}

impl Token {
    /// Is the token a number, string, or boolean.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Token::Int(_)
                | Token::Long(_)
                | Token::ULong(_)
                | Token::Double(_)
                | Token::String(_)
                | Token::Boolean(_)
        )
    }
}

/// Switches for the [`Reader`].
///
/// Use struct update syntax to change a subset:
/// ```rust
/// # use jsonmap::*;
/// let config = ReaderConfig {
///     skip_non_members: false,
///     ..Default::default()
/// };
/// assert!(config.allow_comments);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Accept `// line` and `/* block */` comments wherever whitespace is allowed.
    pub allow_comments: bool,
    /// Accept strings and keys delimited with `'`.
    pub allow_single_quotes: bool,
    /// Skip object keys which match no member of the decoded type, rather than failing.
    pub skip_non_members: bool,
    /// Interpret type-hint envelopes while decoding.
    pub type_hinting: bool,
    /// The envelope key holding the concrete type name.
    pub hint_type_name: String,
    /// The envelope key holding the wrapped value.
    pub hint_value_name: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            allow_comments: true,
            allow_single_quotes: true,
            skip_non_members: true,
            type_hinting: false,
            hint_type_name: String::from("__type__"),
            hint_value_name: String::from("__value__"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ctx {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    /// A value, or end of input at the top level.
    Value,
    /// A value or `]`.
    FirstElem,
    /// A key or `}`.
    FirstKey,
    /// A separator or a closing bracket.
    After,
}

/// Pull tokenizer over a JSON text.
///
/// Several consecutive top-level texts may be read from one reader; once the input is exhausted
/// [`Token::End`] is returned repeatedly.
pub struct Reader<'a> {
    src: &'a str,
    rest: &'a str,
    config: ReaderConfig,
    stack: Vec<Ctx>,
    state: State,
}

impl<'a> Reader<'a> {
    /// A reader with the default configuration.
    pub fn new(src: &'a str) -> Self {
        Reader::with_config(src, ReaderConfig::default())
    }

    /// A reader with the given configuration.
    pub fn with_config(src: &'a str, config: ReaderConfig) -> Self {
        Reader {
            src,
            rest: src,
            config,
            stack: Vec::new(),
            state: State::Value,
        }
    }

    /// The reader's configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Mutable access to the configuration, which may be changed between tokens.
    pub fn config_mut(&mut self) -> &mut ReaderConfig {
        &mut self.config
    }

    /// Are type-hint envelopes interpreted.
    pub fn type_hinting(&self) -> bool {
        self.config.type_hinting
    }

    /// Are unknown object keys skipped.
    pub fn skip_non_members(&self) -> bool {
        self.config.skip_non_members
    }

    /// Byte offset of the next unread character.
    pub fn offset(&self) -> usize {
        self.src.len() - self.rest.len()
    }

    /// Current nesting depth of open objects and arrays.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// An error positioned at the current offset.
    pub(crate) fn error(&self, msg: &str) -> ParseError {
        ParseError::at(self.src, self.offset(), msg.to_string())
    }

    /// Read the next token.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;

        match self.state {
            State::Value => {
                if self.rest.is_empty() {
                    if self.stack.is_empty() {
                        Ok(Token::End)
                    } else {
                        Err(self.error("unexpected end of input"))
                    }
                } else {
                    self.value()
                }
            }
            State::FirstElem => {
                if self.eat(']') {
                    Ok(self.close())
                } else {
                    self.value()
                }
            }
            State::FirstKey => {
                if self.eat('}') {
                    Ok(self.close())
                } else {
                    self.key()
                }
            }
            State::After => match self.stack.last() {
                None => {
                    self.state = State::Value;
                    self.next_token()
                }
                Some(Ctx::Array) => {
                    if self.eat(',') {
                        self.state = State::Value;
                        self.next_token()
                    } else if self.eat(']') {
                        Ok(self.close())
                    } else {
                        Err(self.error("expected ',' or ']'"))
                    }
                }
                Some(Ctx::Object) => {
                    if self.eat(',') {
                        self.skip_trivia()?;
                        self.key()
                    } else if self.eat('}') {
                        Ok(self.close())
                    } else {
                        Err(self.error("expected ',' or '}'"))
                    }
                }
            },
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        let (rest, _) = lex::trivia(self.config.allow_comments)(self.rest)
            .map_err(|e| self.nom_err(e))?;
        self.rest = rest;
        Ok(())
    }

    fn eat(&mut self, c: char) -> bool {
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn close(&mut self) -> Token {
        self.state = State::After;
        match self.stack.pop() {
            Some(Ctx::Object) => Token::ObjectEnd,
            _ => Token::ArrayEnd,
        }
    }

    fn nom_err(&self, e: nom::Err<nom::error::VerboseError<&'a str>>) -> ParseError {
        match e {
            nom::Err::Error(e) | nom::Err::Failure(e) => ParseError::from_nom(self.src, e),
            nom::Err::Incomplete(_) => self.error("unexpected end of input"),
        }
    }

    fn string(&mut self) -> Result<String, ParseError> {
        let quote = match self.rest.chars().next() {
            Some('"') => '"',
            Some('\'') if self.config.allow_single_quotes => '\'',
            Some('\'') => return Err(self.error("single quoted strings are not allowed")),
            _ => return Err(self.error("expected a string")),
        };
        let (rest, s) = lex::string(quote)(self.rest).map_err(|e| self.nom_err(e))?;
        self.rest = rest;
        Ok(s)
    }

    fn key(&mut self) -> Result<Token, ParseError> {
        let name = self.string()?;
        self.skip_trivia()?;
        if !self.eat(':') {
            return Err(self.error("expected ':'"));
        }
        self.state = State::Value;
        Ok(Token::PropertyName(name))
    }

    fn value(&mut self) -> Result<Token, ParseError> {
        let token = match self.rest.chars().next() {
            Some('{') => {
                self.rest = &self.rest[1..];
                self.stack.push(Ctx::Object);
                self.state = State::FirstKey;
                return Ok(Token::ObjectStart);
            }
            Some('[') => {
                self.rest = &self.rest[1..];
                self.stack.push(Ctx::Array);
                self.state = State::FirstElem;
                return Ok(Token::ArrayStart);
            }
            Some('"') | Some('\'') => Token::String(self.string()?),
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let (rest, lit) = lex::number(self.rest).map_err(|e| self.nom_err(e))?;
                let token = classify(lit).ok_or_else(|| self.error("invalid number"))?;
                self.rest = rest;
                token
            }
            Some('/') if !self.config.allow_comments => {
                return Err(self.error("comments are not allowed"))
            }
            Some(_) => {
                let (rest, kw) = lex::keyword(self.rest).map_err(|e| self.nom_err(e))?;
                self.rest = rest;
                kw.map(Token::Boolean).unwrap_or(Token::Null)
            }
            None => return Err(self.error("unexpected end of input")),
        };

        self.state = State::After;
        Ok(token)
    }
}

/// Integers go to the narrowest of `i32`, `i64`, `u64`; anything else is a double.
fn classify(lit: &str) -> Option<Token> {
    let bytes = lit.as_bytes();
    if lit.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        return lexical_core::parse::<f64>(bytes).ok().map(Token::Double);
    }

    if let Ok(x) = lexical_core::parse::<i32>(bytes) {
        Some(Token::Int(x))
    } else if let Ok(x) = lexical_core::parse::<i64>(bytes) {
        Some(Token::Long(x))
    } else if let Ok(x) = lexical_core::parse::<u64>(bytes) {
        Some(Token::ULong(x))
    } else {
        lexical_core::parse::<f64>(bytes).ok().map(Token::Double)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str, config: ReaderConfig) -> Result<Vec<Token>, ParseError> {
        let mut reader = Reader::with_config(src, config);
        let mut v = Vec::new();
        loop {
            match reader.next_token()? {
                Token::End => return Ok(v),
                t => v.push(t),
            }
        }
    }

    #[test]
    fn number_classification() {
        assert_eq!(classify("12"), Some(Token::Int(12)));
        assert_eq!(classify("-2147483648"), Some(Token::Int(i32::MIN)));
        assert_eq!(classify("2147483648"), Some(Token::Long(2147483648)));
        assert_eq!(
            classify("18446744073709551615"),
            Some(Token::ULong(u64::MAX))
        );
        assert_eq!(
            classify("18446744073709551616"),
            Some(Token::Double(18446744073709551616.0))
        );
        assert_eq!(classify("1.0"), Some(Token::Double(1.0)));
        assert_eq!(classify("1e3"), Some(Token::Double(1000.0)));
    }

    #[test]
    fn nested_structure() {
        let t = tokens(r#"[{"a":[]},{}, null]"#, Default::default()).unwrap();
        use Token::*;
        assert_eq!(
            t,
            vec![
                ArrayStart,
                ObjectStart,
                PropertyName("a".into()),
                ArrayStart,
                ArrayEnd,
                ObjectEnd,
                ObjectStart,
                ObjectEnd,
                Null,
                ArrayEnd
            ]
        );
    }

    #[test]
    fn multiple_texts() {
        let t = tokens("1 true 'x'", Default::default()).unwrap();
        assert_eq!(
            t,
            vec![Token::Int(1), Token::Boolean(true), Token::String("x".into())]
        );
    }

    #[test]
    fn config_switches() {
        let strict = ReaderConfig {
            allow_comments: false,
            allow_single_quotes: false,
            ..Default::default()
        };
        assert!(tokens("[1] // c", strict.clone()).is_err());
        assert!(tokens("['x']", strict.clone()).is_err());
        assert!(tokens("{'k': 1}", strict).is_err());
        assert!(tokens("{'k': /* c */ 1}", Default::default()).is_ok());
    }

    #[test]
    fn malformed() {
        let e = tokens("[1 2]", Default::default()).unwrap_err();
        assert_eq!((e.line, e.col), (1, 4));
        assert_eq!(e.msg, "expected ',' or ']'");

        assert!(tokens("[1,]", Default::default()).is_err());
        assert!(tokens("{\"a\" 1}", Default::default()).is_err());
        assert!(tokens("{\"a\":1", Default::default()).is_err());
        assert!(tokens("{1:1}", Default::default()).is_err());
        assert!(tokens("nope", Default::default()).is_err());
    }
}
