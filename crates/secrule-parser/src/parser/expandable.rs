//! `%{...}` macro-aware string parsing.

use crate::error::{Result, SecRuleError};
use crate::lexer::TokenKind;
use crate::value::{ExpandableString, Macro, StringPart};

use super::tokens::Tokens;

/// Parse a whole window as an [`ExpandableString`].
///
/// `%{NAME}` and `%{COLLECTION.KEY}` become macro parts; everything else,
/// including a `%` that does not open a macro, is literal text. A `%{` that is
/// not closed by `}` or does not name a variable is an error.
pub(crate) fn parse_expandable(tokens: Tokens<'_>) -> Result<ExpandableString> {
    let mut string = ExpandableString::new();
    let mut rest = tokens;
    while !rest.is_empty() {
        if rest.at(TokenKind::Percent) && rest.len() > 1 && rest.nth(1).is(TokenKind::CurlyOpen) {
            let (m, after) = parse_macro(rest)?;
            string.push_macro(m);
            rest = after;
        } else {
            string.push_literal(&rest.first().value);
            rest = rest.skip(1);
        }
    }
    Ok(string)
}

/// Parse an action value: [`parse_expandable`] with `\'` read as `'`.
pub(crate) fn parse_action_string(tokens: Tokens<'_>) -> Result<ExpandableString> {
    let mut string = parse_expandable(tokens)?;
    for part in &mut string.parts {
        if let StringPart::Literal(text) = part {
            *text = unescape_quotes(text);
        }
    }
    Ok(string)
}

/// Replace each escaped single quote `\'` with `'`.
pub(crate) fn unescape_quotes(text: &str) -> String {
    text.replace("\\'", "'")
}

/// Parse `%{...}` at the start of `tokens`.
fn parse_macro(tokens: Tokens<'_>) -> Result<(Macro, Tokens<'_>)> {
    let open = tokens.first();
    let (name, rest) = tokens.skip(2).expect(TokenKind::Ident, "macro variable name")?;

    if !rest.at(TokenKind::Dot) {
        let (_, rest) = rest.expect(TokenKind::CurlyClose, "'}' to close macro")?;
        return Ok((Macro::new(None, name.value.as_str()), rest));
    }

    let body = rest.skip(1);
    let Some(close) = body.find(TokenKind::CurlyClose) else {
        return Err(SecRuleError::syntax(
            "missing '}' to close macro",
            open.position.clone(),
        ));
    };
    let (key, rest) = body.split_at(close);
    if key.is_empty() {
        return Err(SecRuleError::syntax(
            format!("macro %{{{}.}} has an empty key", name.value),
            key.position(),
        ));
    }
    if let Some(bad) = key.iter().find(|t| {
        matches!(
            t.kind,
            TokenKind::Whitespace | TokenKind::Percent | TokenKind::CurlyOpen
        )
    }) {
        return Err(SecRuleError::syntax(
            format!("unexpected {} in macro key", bad.describe()),
            bad.position.clone(),
        ));
    }

    Ok((
        Macro::new(Some(&name.value), key.text()),
        rest.skip(1),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Token, tokenize};

    fn argument_tokens(arg: &str) -> Vec<Token> {
        tokenize("", &format!("SecAction \"{arg}\"")).unwrap()
    }

    fn expand(arg: &str) -> Result<ExpandableString> {
        let tokens = argument_tokens(arg);
        let stop = tokens.len() - 2;
        parse_expandable(Tokens::new(&tokens[2..stop], &tokens[stop]))
    }

    #[test]
    fn literal_and_macro_parts() {
        let s = expand("Value is %{TX.score}").unwrap();
        assert_eq!(
            s.parts,
            vec![
                StringPart::Literal("Value is ".to_string()),
                StringPart::Macro(Macro::new(Some("TX"), "score")),
            ]
        );
        assert_eq!(s.to_string(), "Value is %{TX.score}");
    }

    #[test]
    fn single_name_macro() {
        let s = expand("%{MATCHED_VAR}").unwrap();
        assert_eq!(s.parts, vec![StringPart::Macro(Macro::new(None, "MATCHED_VAR"))]);
    }

    #[test]
    fn macro_keys_keep_punctuation() {
        let s = expand("%{tx.%{rule.id}-x}");
        // nested macros are not supported
        assert!(s.is_err());

        let s = expand("%{REQUEST_HEADERS.User-Agent}/%{rule.id}").unwrap();
        assert_eq!(s.macros().count(), 2);
        assert_eq!(s.to_string(), "%{REQUEST_HEADERS.User-Agent}/%{rule.id}");
    }

    #[test]
    fn lone_percent_is_literal() {
        let s = expand("100% %00").unwrap();
        assert_eq!(s.as_literal(), Some("100% %00"));
    }

    #[test]
    fn unterminated_macro() {
        let err = expand("x %{tx.score").unwrap_err();
        assert!(err.to_string().contains("missing '}'"));
        assert_eq!(err.position().unwrap().column, 14);

        assert!(expand("%{}").is_err());
        assert!(expand("%{tx.}").is_err());
    }

    #[test]
    fn escaped_quotes_in_action_strings() {
        let tokens = argument_tokens(r"it\'s %{tx.user}\'s");
        let stop = tokens.len() - 2;
        let s = parse_action_string(Tokens::new(&tokens[2..stop], &tokens[stop])).unwrap();
        assert_eq!(s.to_string(), "it's %{tx.user}'s");
        assert_eq!(s.macros().count(), 1);

        // plain expandable strings keep the escape
        assert_eq!(expand(r"it\'s").unwrap().as_literal(), Some(r"it\'s"));
    }
}
