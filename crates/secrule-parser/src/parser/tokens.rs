//! Token windows threaded through the parse functions.

use crate::error::{Result, SecRuleError};
use crate::lexer::{Token, TokenKind};
use crate::position::Position;

/// A copyable view of the remaining tokens.
///
/// `end` is the token that closes the window: the final `Eof` at document
/// level, the `ArgumentStop` of an argument, or the delimiter a sub-window was
/// split at. Looking past the window yields `end`, so "unexpected end" errors
/// point at a meaningful position without any bounds checks.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tokens<'t> {
    items: &'t [Token],
    end: &'t Token,
}

impl<'t> Tokens<'t> {
    pub(crate) fn new(items: &'t [Token], end: &'t Token) -> Self {
        Tokens { items, end }
    }

    pub(crate) fn first(&self) -> &'t Token {
        self.items.first().unwrap_or(self.end)
    }

    pub(crate) fn nth(&self, n: usize) -> &'t Token {
        self.items.get(n).unwrap_or(self.end)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'t, Token> {
        self.items.iter()
    }

    /// True when the window is non-empty and starts with `kind`.
    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.items.first().is_some_and(|t| t.is(kind))
    }

    /// Position of the first token, or of the closing token when empty.
    pub(crate) fn position(&self) -> Position {
        self.first().position.clone()
    }

    pub(crate) fn skip(self, n: usize) -> Tokens<'t> {
        Tokens {
            items: &self.items[n.min(self.items.len())..],
            end: self.end,
        }
    }

    /// Drop leading whitespace tokens.
    pub(crate) fn skip_whitespace(self) -> Tokens<'t> {
        let n = self
            .items
            .iter()
            .take_while(|t| t.is(TokenKind::Whitespace))
            .count();
        self.skip(n)
    }

    /// Drop trailing whitespace tokens.
    pub(crate) fn trim_end(self) -> Tokens<'t> {
        let n = self
            .items
            .iter()
            .rev()
            .take_while(|t| t.is(TokenKind::Whitespace))
            .count();
        let len = self.items.len() - n;
        Tokens {
            items: &self.items[..len],
            end: self.items.get(len).unwrap_or(self.end),
        }
    }

    /// Split before index `n`. The left window is closed by the token at `n`.
    pub(crate) fn split_at(self, n: usize) -> (Tokens<'t>, Tokens<'t>) {
        let n = n.min(self.items.len());
        let (left, right) = self.items.split_at(n);
        (
            Tokens {
                items: left,
                end: right.first().unwrap_or(self.end),
            },
            Tokens {
                items: right,
                end: self.end,
            },
        )
    }

    pub(crate) fn find(&self, kind: TokenKind) -> Option<usize> {
        self.items.iter().position(|t| t.is(kind))
    }

    /// Like [`Tokens::find`], but ignores tokens inside `%{...}` macros.
    pub(crate) fn find_outside_macros(&self, kind: TokenKind) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = 0;
        while i < self.items.len() {
            let token = &self.items[i];
            let opens_macro = token.is(TokenKind::Percent)
                && self
                    .items
                    .get(i + 1)
                    .is_some_and(|t| t.is(TokenKind::CurlyOpen));
            if opens_macro {
                depth += 1;
                i += 2;
                continue;
            }
            if depth > 0 && token.is(TokenKind::CurlyClose) {
                depth -= 1;
            } else if depth == 0 && token.is(kind) {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    /// Concatenated source text of the window.
    pub(crate) fn text(&self) -> String {
        self.items.iter().map(|t| t.value.as_str()).collect()
    }

    /// Consume one token of `kind`, or fail with "expected {what}".
    pub(crate) fn expect(self, kind: TokenKind, what: &str) -> Result<(&'t Token, Tokens<'t>)> {
        if self.at(kind) {
            Ok((self.first(), self.skip(1)))
        } else {
            Err(unexpected(what, self.first()))
        }
    }

    /// The window must hold exactly one identifier.
    pub(crate) fn single_ident(self, what: &str) -> Result<&'t Token> {
        let (token, rest) = self.expect(TokenKind::Ident, what)?;
        if !rest.is_empty() {
            return Err(unexpected(&format!("end of {what}"), rest.first()));
        }
        Ok(token)
    }

    /// Fail unless the window has been fully consumed.
    pub(crate) fn finish(self, what: &str) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(unexpected(&format!("end of {what}"), self.first()))
        }
    }
}

/// "expected X, found Y" at the position of the offending token.
pub(crate) fn unexpected(what: &str, found: &Token) -> SecRuleError {
    SecRuleError::syntax(
        format!("expected {what}, found {}", found.describe()),
        found.position.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    /// Tokens of the single argument of `SecAction "<arg>"`.
    fn with_argument<R>(arg: &str, f: impl FnOnce(Tokens<'_>) -> R) -> R {
        let tokens = tokenize("", &format!("SecAction \"{arg}\"")).unwrap();
        let stop = tokens.iter().position(|t| t.is(TokenKind::ArgumentStop)).unwrap();
        f(Tokens::new(&tokens[2..stop], &tokens[stop]))
    }

    #[test]
    fn looking_past_the_window_yields_the_closing_token() {
        with_argument("a", |tokens| {
            assert_eq!(tokens.first().value, "a");
            assert!(tokens.nth(1).is(TokenKind::ArgumentStop));
            assert!(tokens.skip(5).is_empty());
            assert!(tokens.skip(5).first().is(TokenKind::ArgumentStop));
        });
    }

    #[test]
    fn split_at_closes_left_with_delimiter() {
        with_argument("a=b", |tokens| {
            let (left, right) = tokens.split_at(tokens.find(TokenKind::Equals).unwrap());
            assert_eq!(left.text(), "a");
            assert!(left.first().is(TokenKind::Ident));
            assert!(left.skip(1).first().is(TokenKind::Equals));
            assert_eq!(right.text(), "=b");
        });
    }

    #[test]
    fn macros_hide_delimiters() {
        with_argument("tx.%{rule.id}.x=1", |tokens| {
            assert_eq!(tokens.find_outside_macros(TokenKind::Dot), Some(1));
            let rest = tokens.skip(2);
            let dot = rest.find_outside_macros(TokenKind::Dot).unwrap();
            assert_eq!(dot, 6);
            assert_eq!(rest.nth(dot).position.column, 25);
            assert_eq!(tokens.find_outside_macros(TokenKind::Equals), Some(10));
        });
    }

    #[test]
    fn trim_end_drops_whitespace() {
        with_argument("a b  ", |tokens| {
            let trimmed = tokens.trim_end();
            assert_eq!(trimmed.text(), "a b");
            assert!(trimmed.skip(3).first().is(TokenKind::Whitespace));
        });
    }
}
