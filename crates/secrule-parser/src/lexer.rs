//! Character-level tokenizer for SecRule configuration text.
//!
//! The lexer is a small state machine. Each call to [`Lexer::next`] runs the
//! machine just far enough to produce one token, so the parser can pull tokens
//! lazily, although [`tokenize`] drains the whole input up front.
//!
//! States:
//!
//! | State          | Enters on                        | Leaves on                               |
//! |----------------|----------------------------------|-----------------------------------------|
//! | line start     | start of input, newline          | `#`, a letter, end of input             |
//! | comment        | `#` at line start                | newline                                 |
//! | directive name | a letter at line start           | whitespace, newline                     |
//! | argument       | whitespace after a directive     | `"`, any other character, newline       |
//! | unquoted       | a non-quote argument character   | whitespace, newline, end of input       |
//! | quoted         | `"`                              | the closing `"`                         |
//!
//! Inside an argument, identifier runs are split by single-character
//! punctuation (`& : | @ , . ' = ; % { } + - ! /`). A backslash escapes the
//! next character: `\` + newline is a line continuation, `\"` inside quotes is
//! a literal quote, and any other pair is kept verbatim so regular expressions
//! such as `\d` or `\/` survive untouched.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Result, SecRuleError};
use crate::position::{LineIndex, Position};

// =============================================================================
// Tokens
// =============================================================================

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Eof,
    CommentStart,
    Comment,
    Directive,
    ArgumentStart,
    ArgumentStop,
    Ident,
    /// A whitespace run inside a quoted argument.
    Whitespace,
    At,
    Ampersand,
    Colon,
    Pipe,
    Comma,
    Equals,
    Semicolon,
    SingleQuote,
    Percent,
    CurlyOpen,
    CurlyClose,
    Dot,
    Plus,
    Minus,
    Exclamation,
    ForwardSlash,
}

impl TokenKind {
    /// The punctuation kind for `c`, if `c` splits identifiers.
    pub fn punctuation(c: char) -> Option<TokenKind> {
        match c {
            '@' => Some(TokenKind::At),
            '&' => Some(TokenKind::Ampersand),
            ':' => Some(TokenKind::Colon),
            '|' => Some(TokenKind::Pipe),
            ',' => Some(TokenKind::Comma),
            '=' => Some(TokenKind::Equals),
            ';' => Some(TokenKind::Semicolon),
            '\'' => Some(TokenKind::SingleQuote),
            '%' => Some(TokenKind::Percent),
            '{' => Some(TokenKind::CurlyOpen),
            '}' => Some(TokenKind::CurlyClose),
            '.' => Some(TokenKind::Dot),
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '!' => Some(TokenKind::Exclamation),
            '/' => Some(TokenKind::ForwardSlash),
            _ => None,
        }
    }

    /// Short human-readable description used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Eof => "end of input",
            TokenKind::CommentStart => "comment",
            TokenKind::Comment => "comment text",
            TokenKind::Directive => "directive",
            TokenKind::ArgumentStart => "start of argument",
            TokenKind::ArgumentStop => "end of argument",
            TokenKind::Ident => "identifier",
            TokenKind::Whitespace => "whitespace",
            TokenKind::At => "'@'",
            TokenKind::Ampersand => "'&'",
            TokenKind::Colon => "':'",
            TokenKind::Pipe => "'|'",
            TokenKind::Comma => "','",
            TokenKind::Equals => "'='",
            TokenKind::Semicolon => "';'",
            TokenKind::SingleQuote => "single quote",
            TokenKind::Percent => "'%'",
            TokenKind::CurlyOpen => "'{'",
            TokenKind::CurlyClose => "'}'",
            TokenKind::Dot => "'.'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Exclamation => "'!'",
            TokenKind::ForwardSlash => "'/'",
        }
    }
}

/// A positioned token. `value` holds the source text the token stands for,
/// with escapes and line continuations already applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub position: Position,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Description for "expected X, found Y" diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Ident | TokenKind::Directive => {
                format!("{} {:?}", self.kind.describe(), self.value)
            }
            kind => kind.describe().to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} {:?}", self.position, self.kind, self.value)
    }
}

/// Whitespace as understood by the lexer. Newline is not whitespace: it
/// terminates directives.
pub fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\u{0B}' | '\u{0C}' | '\r' | ' ' | '\u{85}' | '\u{A0}'
    )
}

// =============================================================================
// Lexer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    LineStart,
    Comment,
    DirectiveName,
    Argument,
    Unquoted,
    Quoted,
    Done,
}

/// Pull-based SecRule tokenizer.
///
/// Yields `Ok(token)` until the final [`TokenKind::Eof`], or a single `Err`
/// on the first malformed character sequence. No recovery is attempted.
pub struct Lexer<'a> {
    input: &'a str,
    index: LineIndex,
    pos: usize,
    state: State,
    pending: VecDeque<Token>,
    ident: String,
    ident_start: Option<usize>,
    quote_start: usize,
    failed_in_directive: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input`. `name` labels positions (usually the file
    /// path); pass an empty string for anonymous input.
    pub fn new(name: &str, input: &'a str) -> Self {
        let file = (!name.is_empty()).then(|| Arc::<str>::from(name));
        Lexer {
            input,
            index: LineIndex::new(file, input),
            pos: 0,
            state: State::LineStart,
            pending: VecDeque::new(),
            ident: String::new(),
            ident_start: None,
            quote_start: 0,
            failed_in_directive: false,
        }
    }

    /// Whether the error this lexer returned interrupted a directive whose
    /// name token was already yielded.
    pub(crate) fn failed_in_directive(&self) -> bool {
        self.failed_in_directive
    }

    fn step(&mut self) -> Result<State> {
        match self.state {
            State::LineStart => self.lex_line_start(),
            State::Comment => self.lex_comment(),
            State::DirectiveName => self.lex_directive_name(),
            State::Argument => self.lex_argument(),
            State::Unquoted => self.lex_argument_body(false),
            State::Quoted => self.lex_argument_body(true),
            State::Done => Ok(State::Done),
        }
    }

    fn lex_line_start(&mut self) -> Result<State> {
        loop {
            let offset = self.pos;
            match self.bump() {
                None => {
                    self.emit(TokenKind::Eof, "", offset);
                    return Ok(State::Done);
                }
                Some('#') => {
                    self.emit(TokenKind::CommentStart, "#", offset);
                    return Ok(State::Comment);
                }
                Some('\n') => {}
                Some(c) if is_whitespace(c) => {}
                Some(c) if c.is_alphabetic() => {
                    self.pos = offset;
                    return Ok(State::DirectiveName);
                }
                Some(c) => {
                    return Err(SecRuleError::lex(
                        format!("expected comment, whitespace or directive, found {c:?}"),
                        self.position_at(offset),
                    ));
                }
            }
        }
    }

    fn lex_comment(&mut self) -> Result<State> {
        let input = self.input;
        let start = self.pos;
        let rest = &input[start..];
        let len = rest.find('\n').unwrap_or(rest.len());
        let line = &rest[..len];
        let text = line.strip_suffix('\r').unwrap_or(line);
        if !text.is_empty() {
            self.emit(TokenKind::Comment, text, start);
        }
        self.pos = start + len;
        if self.pos < input.len() {
            self.pos += 1;
        }
        Ok(State::LineStart)
    }

    fn lex_directive_name(&mut self) -> Result<State> {
        let input = self.input;
        let start = self.pos;
        let rest = &input[start..];
        let len = rest
            .find(|c: char| !c.is_alphabetic())
            .unwrap_or(rest.len());
        self.pos = start + len;

        let offset = self.pos;
        let next = match self.bump() {
            None => State::Done,
            Some('\n') => State::LineStart,
            Some('\\') if self.eat_newline() => State::Argument,
            Some(c) if is_whitespace(c) => State::Argument,
            Some(c) => {
                return Err(SecRuleError::lex(
                    format!("directive names may only contain letters, found {c:?}"),
                    self.position_at(offset),
                ));
            }
        };

        self.emit(TokenKind::Directive, &input[start..start + len], start);
        if next == State::Done {
            self.emit(TokenKind::Eof, "", offset);
        }
        Ok(next)
    }

    fn lex_argument(&mut self) -> Result<State> {
        loop {
            let offset = self.pos;
            match self.bump() {
                None => {
                    self.emit(TokenKind::Eof, "", offset);
                    return Ok(State::Done);
                }
                Some('\n') => return Ok(State::LineStart),
                Some('\\') => {
                    if self.eat_newline() {
                        continue;
                    }
                    let message = if self.peek().is_none() {
                        "unterminated escape"
                    } else {
                        "backslash outside of an argument must be a line continuation"
                    };
                    return Err(SecRuleError::lex(message, self.position_at(offset)));
                }
                Some('"') => {
                    self.quote_start = offset;
                    self.emit(TokenKind::ArgumentStart, "\"", offset);
                    return Ok(State::Quoted);
                }
                Some(c) if is_whitespace(c) => {}
                Some(_) => {
                    self.pos = offset;
                    self.emit(TokenKind::ArgumentStart, "", offset);
                    return Ok(State::Unquoted);
                }
            }
        }
    }

    fn lex_argument_body(&mut self, quoted: bool) -> Result<State> {
        let input = self.input;
        let here = if quoted {
            State::Quoted
        } else {
            State::Unquoted
        };

        loop {
            let offset = self.pos;
            let Some(c) = self.bump() else {
                if quoted {
                    return Err(self.unterminated_quote());
                }
                self.flush_ident();
                self.emit(TokenKind::ArgumentStop, "", offset);
                self.emit(TokenKind::Eof, "", offset);
                return Ok(State::Done);
            };

            match c {
                '\\' => {
                    if self.eat_newline() {
                        continue;
                    }
                    match self.bump() {
                        None => {
                            return Err(SecRuleError::lex(
                                "unterminated escape",
                                self.position_at(offset),
                            ));
                        }
                        Some('"') if quoted => self.push_ident(offset, "\""),
                        Some(_) => self.push_ident(offset, &input[offset..self.pos]),
                    }
                }
                '"' if quoted => {
                    self.flush_ident();
                    self.emit(TokenKind::ArgumentStop, "\"", offset);
                    return Ok(State::Argument);
                }
                '\n' => {
                    if quoted {
                        return Err(self.unterminated_quote());
                    }
                    self.flush_ident();
                    self.emit(TokenKind::ArgumentStop, "", offset);
                    return Ok(State::LineStart);
                }
                c if is_whitespace(c) => {
                    self.flush_ident();
                    if !quoted {
                        self.emit(TokenKind::ArgumentStop, "", offset);
                        return Ok(State::Argument);
                    }
                    let rest = &input[self.pos..];
                    self.pos += rest
                        .find(|c: char| !is_whitespace(c))
                        .unwrap_or(rest.len());
                    self.emit(TokenKind::Whitespace, &input[offset..self.pos], offset);
                    return Ok(here);
                }
                c => match TokenKind::punctuation(c) {
                    Some(kind) => {
                        self.flush_ident();
                        self.emit(kind, &input[offset..self.pos], offset);
                        return Ok(here);
                    }
                    None => self.push_ident(offset, &input[offset..self.pos]),
                },
            }
        }
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume `\n` or `\r\n` if it comes next.
    fn eat_newline(&mut self) -> bool {
        let rest = &self.input[self.pos..];
        if rest.starts_with('\n') {
            self.pos += 1;
            true
        } else if rest.starts_with("\r\n") {
            self.pos += 2;
            true
        } else {
            false
        }
    }

    fn position_at(&self, offset: usize) -> Position {
        self.index.position_of(self.input, offset)
    }

    fn emit(&mut self, kind: TokenKind, value: &str, offset: usize) {
        let position = self.position_at(offset);
        self.pending.push_back(Token {
            kind,
            value: value.to_string(),
            position,
        });
    }

    fn push_ident(&mut self, offset: usize, text: &str) {
        self.ident_start.get_or_insert(offset);
        self.ident.push_str(text);
    }

    fn flush_ident(&mut self) {
        if let Some(start) = self.ident_start.take() {
            let value = std::mem::take(&mut self.ident);
            let position = self.position_at(start);
            self.pending.push_back(Token {
                kind: TokenKind::Ident,
                value,
                position,
            });
        }
    }

    fn unterminated_quote(&self) -> SecRuleError {
        SecRuleError::lex(
            "unterminated quoted argument",
            self.position_at(self.quote_start),
        )
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(Ok(token));
            }
            if self.state == State::Done {
                return None;
            }
            match self.step() {
                Ok(next) => self.state = next,
                Err(e) => {
                    self.failed_in_directive = matches!(
                        self.state,
                        State::Argument | State::Unquoted | State::Quoted
                    );
                    self.state = State::Done;
                    self.pending.clear();
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Drain the lexer over `input` into a token vector ending with exactly one
/// [`TokenKind::Eof`].
pub fn tokenize(name: &str, input: &str) -> Result<Vec<Token>> {
    Lexer::new(name, input).collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize("", input).unwrap().iter().map(|t| t.kind).collect()
    }

    fn values(input: &str, kind: TokenKind) -> Vec<String> {
        tokenize("", input)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn comment_line() {
        let tokens = tokenize("", "# hello world\n").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, CommentStart);
        assert_eq!(tokens[1].kind, Comment);
        assert_eq!(tokens[1].value, " hello world");
        assert_eq!(tokens[2].kind, Eof);
    }

    #[test]
    fn empty_comment_has_no_text_token() {
        assert_eq!(kinds("#\n#\r\n"), vec![CommentStart, CommentStart, Eof]);
    }

    #[test]
    fn empty_input() {
        assert_eq!(kinds(""), vec![Eof]);
        assert_eq!(kinds("\n\n  \n"), vec![Eof]);
    }

    #[test]
    fn secrule_token_stream() {
        let input = r#"SecRule ARGS "@rx attack" "id:1,deny""#;
        assert_eq!(
            kinds(input),
            vec![
                Directive,
                ArgumentStart,
                Ident,
                ArgumentStop,
                ArgumentStart,
                At,
                Ident,
                Whitespace,
                Ident,
                ArgumentStop,
                ArgumentStart,
                Ident,
                Colon,
                Ident,
                Comma,
                Ident,
                ArgumentStop,
                Eof,
            ]
        );
    }

    #[test]
    fn directive_without_arguments() {
        assert_eq!(kinds("SecRuleEngine\n"), vec![Directive, Eof]);
        assert_eq!(kinds("SecRuleEngine"), vec![Directive, Eof]);
    }

    #[test]
    fn unquoted_arguments_are_closed_at_end_of_line() {
        assert_eq!(
            kinds("SecRuleEngine On\nSecMarker END"),
            vec![
                Directive,
                ArgumentStart,
                Ident,
                ArgumentStop,
                Directive,
                ArgumentStart,
                Ident,
                ArgumentStop,
                Eof,
            ]
        );
    }

    #[test]
    fn every_argument_start_has_a_stop() {
        let input = "SecRule REQUEST_HEADERS:User-Agent \"@pm curl wget\" \\\n    \"id:10,\\\n    phase:1,t:none,t:lowercase,block\"\nSecMarker END\n";
        let tokens = tokenize("", input).unwrap();
        let starts = tokens.iter().filter(|t| t.is(ArgumentStart)).count();
        let stops = tokens.iter().filter(|t| t.is(ArgumentStop)).count();
        assert_eq!(starts, 4);
        assert_eq!(starts, stops);
        assert_eq!(tokens.iter().filter(|t| t.is(Eof)).count(), 1);
        assert!(tokens.last().unwrap().is(Eof));
    }

    #[test]
    fn quoted_whitespace_runs_become_tokens() {
        assert_eq!(
            values("SecRule ARGS \"@pm a  b\tc\"", Whitespace),
            vec![" ", "  ", "\t"]
        );
    }

    #[test]
    fn escaped_quote_joins_identifier() {
        assert_eq!(values(r#"SecMarker "a\"b""#, Ident), vec!["a\"b"]);
    }

    #[test]
    fn regex_escapes_are_kept_verbatim() {
        assert_eq!(
            values(r#"SecRule ARGS "@rx ^\d\/x$""#, Ident),
            vec!["ARGS", "rx", r"^\d\/x$"]
        );
    }

    #[test]
    fn line_continuation_between_arguments() {
        let tokens = tokenize("", "SecAction \\\n  \"id:1\"\n").unwrap();
        assert_eq!(tokens[0].kind, Directive);
        assert_eq!(tokens[1].kind, ArgumentStart);
        assert_eq!(tokens[1].position.line, 2);
        assert_eq!(tokens[1].position.column, 3);
    }

    #[test]
    fn line_continuation_with_crlf() {
        assert_eq!(
            kinds("SecAction \\\r\n \"pass\"\r\n"),
            vec![Directive, ArgumentStart, Ident, ArgumentStop, Eof]
        );
    }

    #[test]
    fn indented_comment() {
        assert_eq!(values("  # note\n", Comment), vec![" note"]);
    }

    #[test]
    fn punctuation_tokens() {
        let input = "SecAction &:|@,=;'%{}.+-!/";
        let tokens = tokenize("", input).unwrap();
        let punct: Vec<TokenKind> = tokens[2..tokens.len() - 2].iter().map(|t| t.kind).collect();
        assert_eq!(
            punct,
            vec![
                Ampersand,
                Colon,
                Pipe,
                At,
                Comma,
                Equals,
                Semicolon,
                SingleQuote,
                Percent,
                CurlyOpen,
                CurlyClose,
                Dot,
                Plus,
                Minus,
                Exclamation,
                ForwardSlash,
            ]
        );
    }

    #[test]
    fn token_positions() {
        let tokens = tokenize("a.conf", "\nSecMarker  foo").unwrap();
        assert_eq!(tokens[0].position.to_string(), "a.conf:2:1");
        assert_eq!(tokens[2].value, "foo");
        assert_eq!(tokens[2].position.to_string(), "a.conf:2:12");
    }

    #[test]
    fn bad_line_start_is_lex_error() {
        let err = tokenize("", "SecMarker A\n=foo\n").unwrap_err();
        match err {
            SecRuleError::Lex { position, .. } => {
                assert_eq!((position.line, position.column), (2, 1));
            }
            other => panic!("expected lex error, got {other}"),
        }
    }

    #[test]
    fn non_letter_in_directive_name() {
        let err = tokenize("", "Sec1Rule").unwrap_err();
        assert!(matches!(err, SecRuleError::Lex { .. }));
        assert_eq!(err.position().unwrap().column, 4);
    }

    #[test]
    fn unterminated_escape() {
        let err = tokenize("", "SecMarker abc\\").unwrap_err();
        assert!(err.to_string().contains("unterminated escape"));
    }

    #[test]
    fn stray_backslash_between_arguments() {
        let err = tokenize("", "SecMarker \\x").unwrap_err();
        assert!(matches!(err, SecRuleError::Lex { .. }));
        assert_eq!(err.position().unwrap().column, 11);
    }

    #[test]
    fn unterminated_quote_points_at_opening_quote() {
        let err = tokenize("", "SecRule ARGS \"@rx abc\nSecMarker x").unwrap_err();
        assert!(err.to_string().contains("unterminated quoted argument"));
        assert_eq!(err.position().unwrap().line, 1);
        assert_eq!(err.position().unwrap().column, 14);
    }

    #[test]
    fn lexer_stops_after_error() {
        let mut lexer = Lexer::new("", "}");
        assert!(matches!(lexer.next(), Some(Err(_))));
        assert!(lexer.next().is_none());
    }
}
