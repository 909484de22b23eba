//! Variable lists: `ARGS|!ARGS:id|&TX:/^score_/|REQUEST_HEADERS:'User-Agent'`.

use crate::ast::{CollectionSelector, SelectionOperation, Variable, VariableList, VariableSelector};
use crate::error::{Result, SecRuleError};
use crate::lexer::TokenKind;

use super::tokens::{Tokens, unexpected};

/// Parse the first argument of `SecRule`.
pub(crate) fn parse_variable_list(tokens: Tokens<'_>) -> Result<VariableList> {
    let mut list = VariableList::default();
    let mut rest = tokens.skip_whitespace();
    loop {
        let (selector, after) = parse_variable_selector(rest)?;
        list.add_selector(selector);
        rest = after.skip_whitespace();
        if rest.is_empty() {
            return Ok(list);
        }
        let (_, after) = rest.expect(TokenKind::Pipe, "'|' between variables")?;
        rest = after.skip_whitespace();
    }
}

/// Parse one selector and return the tokens after it. Also used for `ctl`
/// targets.
pub(crate) fn parse_variable_selector(
    tokens: Tokens<'_>,
) -> Result<(VariableSelector, Tokens<'_>)> {
    let position = tokens.position();
    let (operation, rest) = parse_selection_operation(tokens)?;

    let (name, rest) = rest.expect(TokenKind::Ident, "variable name")?;
    let mut selector = VariableSelector::new(Variable::from_name(&name.value), position);
    selector.operation = operation;

    if !rest.at(TokenKind::Colon) {
        return Ok((selector, rest));
    }
    if !selector.variable.is_collection() {
        return Err(SecRuleError::syntax(
            format!("{} is not a collection and takes no selector", selector.variable),
            rest.position(),
        ));
    }
    let (member, rest) = if selector.variable == Variable::Xml {
        parse_xpath_selector(rest.skip(1))?
    } else {
        parse_collection_selector(rest.skip(1))?
    };
    selector.selector = Some(member);
    Ok((selector, rest))
}

fn parse_selection_operation(tokens: Tokens<'_>) -> Result<(SelectionOperation, Tokens<'_>)> {
    let operation = match tokens.first().kind {
        TokenKind::Exclamation => SelectionOperation::Remove,
        TokenKind::Ampersand => SelectionOperation::Count,
        _ => return Ok((SelectionOperation::Add, tokens)),
    };
    let rest = tokens.skip(1);
    if rest.at(TokenKind::Exclamation) || rest.at(TokenKind::Ampersand) {
        return Err(SecRuleError::syntax(
            "a variable takes at most one of '!' and '&'",
            rest.position(),
        ));
    }
    Ok((operation, rest))
}

/// Parse what follows `COLLECTION:`.
fn parse_collection_selector(tokens: Tokens<'_>) -> Result<(CollectionSelector, Tokens<'_>)> {
    if tokens.at(TokenKind::SingleQuote) {
        let open = tokens.first();
        let body = tokens.skip(1);
        let Some(close) = body.find(TokenKind::SingleQuote) else {
            return Err(SecRuleError::syntax(
                "missing closing quote in collection selector",
                open.position.clone(),
            ));
        };
        let (inner, rest) = body.split_at(close);
        let selector = if inner.at(TokenKind::ForwardSlash) {
            let (regex, inner) = parse_regex_selector(inner)?;
            inner.finish("quoted regular expression")?;
            regex
        } else {
            key_selector(inner)?
        };
        return Ok((selector, rest.skip(1)));
    }

    if tokens.at(TokenKind::ForwardSlash) {
        return parse_regex_selector(tokens);
    }

    split_key(tokens)
}

/// `XML:/*`, `XML://@name`: an XPath expression, kept as a key.
fn parse_xpath_selector(tokens: Tokens<'_>) -> Result<(CollectionSelector, Tokens<'_>)> {
    if tokens.at(TokenKind::SingleQuote) {
        return parse_collection_selector(tokens);
    }
    split_key(tokens)
}

fn split_key(tokens: Tokens<'_>) -> Result<(CollectionSelector, Tokens<'_>)> {
    let len = tokens
        .iter()
        .take_while(|t| !matches!(t.kind, TokenKind::Pipe | TokenKind::Whitespace))
        .count();
    let (key, rest) = tokens.split_at(len);
    Ok((key_selector(key)?, rest))
}

fn key_selector(key: Tokens<'_>) -> Result<CollectionSelector> {
    if key.is_empty() {
        return Err(unexpected("collection key", key.first()));
    }
    Ok(CollectionSelector::Key(key.text()))
}

/// `/pattern/`. The closing slash is the first one followed by the end of
/// the selector, so patterns may contain unescaped `/` and `|`.
fn parse_regex_selector(tokens: Tokens<'_>) -> Result<(CollectionSelector, Tokens<'_>)> {
    let open = tokens.first();
    let body = tokens.skip(1);
    let close = (0..body.len()).find(|&i| {
        body.nth(i).is(TokenKind::ForwardSlash)
            && (i + 1 == body.len()
                || matches!(body.nth(i + 1).kind, TokenKind::Pipe | TokenKind::Whitespace))
    });
    let Some(close) = close else {
        return Err(SecRuleError::syntax(
            "missing closing '/' in regular expression selector",
            open.position.clone(),
        ));
    };
    let (pattern, rest) = body.split_at(close);
    if pattern.is_empty() {
        return Err(SecRuleError::syntax(
            "empty regular expression selector",
            open.position.clone(),
        ));
    }
    Ok((CollectionSelector::Regex(pattern.text()), rest.skip(1)))
}
