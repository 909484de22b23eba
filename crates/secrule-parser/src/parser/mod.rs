//! Recursive-descent parser from tokens to a [`Document`].
//!
//! Every parse step takes a [`Tokens`] window and returns the node it built
//! plus the remaining window. Directives are dispatched through a keyword
//! table; each argument of a directive is handed to its sub-parser as a
//! window closed by the argument's `ArgumentStop`.
//!
//! Parsing is fail-fast: the first error aborts the whole input.

mod actions;
mod expandable;
mod operator;
mod tokens;
mod variables;

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::ast::{
    AuditEngineMode, AuditLogPart, Comment, Directive, Document, DocumentItem, RuleEngineMode,
    SecAction, SecRule,
};
use crate::error::{Result, SecRuleError};
use crate::lexer::{Lexer, Token, TokenKind, tokenize};
use crate::position::Position;

use actions::parse_action_list;
use operator::parse_operator;
use tokens::{Tokens, unexpected};
use variables::parse_variable_list;

// =============================================================================
// Public API
// =============================================================================

/// Parse SecRule configuration text. `name` labels positions and the
/// resulting document, usually with the file path.
pub fn parse(name: &str, input: &str) -> Result<Document> {
    let tokens = tokenize(name, input)?;
    let mut document = Document::new(name);
    parse_tokens(&tokens, &mut document)?;
    log::debug!(
        "parsed {name}: {} directives, {} comments",
        document.directives().count(),
        document.comments().count()
    );
    Ok(document)
}

/// Like [`parse`], but also returns the items parsed before the first error.
///
/// A document returned together with an error is incomplete and must not be
/// used as a rule set. A lexical error inside a directive drops that
/// directive; one between directives keeps everything before it.
pub fn parse_partial(name: &str, input: &str) -> (Document, Option<SecRuleError>) {
    let mut lexer = Lexer::new(name, input);
    let mut tokens = Vec::new();
    let mut lex_error = None;
    for token in lexer.by_ref() {
        match token {
            Ok(token) => tokens.push(token),
            Err(e) => {
                lex_error = Some(e);
                break;
            }
        }
    }

    if let Some(e) = &lex_error {
        if lexer.failed_in_directive() {
            let keep = tokens
                .iter()
                .rposition(|t| t.is(TokenKind::Directive))
                .unwrap_or(0);
            tokens.truncate(keep);
        }
        tokens.push(Token {
            kind: TokenKind::Eof,
            value: String::new(),
            position: e
                .position()
                .cloned()
                .unwrap_or_else(|| Position::new(None, 1, 1)),
        });
    }

    let mut document = Document::new(name);
    let parse_error = parse_tokens(&tokens, &mut document).err();
    (document, lex_error.or(parse_error))
}

/// Read and parse one configuration file. The path labels every position.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    parse(&path.display().to_string(), &content)
}

/// The regular `*.conf` files directly inside `dir`, sorted by file name.
pub fn conf_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("conf") {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Parse every [`conf_files`] entry of `dir` into one document labelled with
/// the directory.
///
/// Comments are dropped; directives keep the positions of their own files.
/// The first file that fails to parse aborts the batch.
pub fn parse_directory(dir: impl AsRef<Path>) -> Result<Document> {
    let dir = dir.as_ref();
    let paths = conf_files(dir)?;

    let mut document = Document::new(dir.display().to_string());
    for path in &paths {
        let file = parse_file(path)?;
        document.items.extend(
            file.items
                .into_iter()
                .filter(|item| matches!(item, DocumentItem::Directive(_))),
        );
    }
    log::debug!(
        "loaded {} files from {}: {} directives",
        paths.len(),
        dir.display(),
        document.len()
    );
    Ok(document)
}

// =============================================================================
// Document
// =============================================================================

fn parse_tokens(tokens: &[Token], document: &mut Document) -> Result<()> {
    let Some((eof, items)) = tokens.split_last() else {
        return Ok(());
    };
    let mut rest = Tokens::new(items, eof);
    while !rest.is_empty() {
        let token = rest.first();
        rest = match token.kind {
            TokenKind::CommentStart => {
                let (comment, rest) = parse_comment(rest);
                document.add_child(DocumentItem::Comment(comment));
                rest
            }
            TokenKind::Directive => {
                let (directive, rest) = parse_directive(rest)?;
                log::trace!("{} {}", directive.position(), directive.keyword());
                document.add_child(DocumentItem::Directive(directive));
                rest
            }
            _ => return Err(unexpected("comment or directive", token)),
        };
    }
    Ok(())
}

fn parse_comment(tokens: Tokens<'_>) -> (Comment, Tokens<'_>) {
    let position = tokens.position();
    let rest = tokens.skip(1);
    if rest.at(TokenKind::Comment) {
        let text = rest.first().value.clone();
        (Comment { text, position }, rest.skip(1))
    } else {
        (
            Comment {
                text: String::new(),
                position,
            },
            rest,
        )
    }
}

// =============================================================================
// Directives
// =============================================================================

/// One `ArgumentStart ... ArgumentStop` group.
struct Argument<'t> {
    start: &'t Token,
    tokens: Tokens<'t>,
}

type DirectiveParser = fn(&Token, &[Argument<'_>]) -> Result<Directive>;

struct DirectiveDef {
    keyword: &'static str,
    arity: RangeInclusive<usize>,
    parse: DirectiveParser,
}

const DIRECTIVES: &[DirectiveDef] = &[
    DirectiveDef {
        keyword: "SecRule",
        arity: 2..=3,
        parse: parse_sec_rule,
    },
    DirectiveDef {
        keyword: "SecAction",
        arity: 1..=1,
        parse: parse_sec_action,
    },
    DirectiveDef {
        keyword: "SecDefaultAction",
        arity: 1..=1,
        parse: parse_sec_default_action,
    },
    DirectiveDef {
        keyword: "SecMarker",
        arity: 1..=1,
        parse: parse_sec_marker,
    },
    DirectiveDef {
        keyword: "SecComponentSignature",
        arity: 1..=1,
        parse: parse_sec_component_signature,
    },
    DirectiveDef {
        keyword: "SecRuleEngine",
        arity: 1..=1,
        parse: parse_sec_rule_engine,
    },
    DirectiveDef {
        keyword: "SecAuditEngine",
        arity: 1..=1,
        parse: parse_sec_audit_engine,
    },
    DirectiveDef {
        keyword: "SecAuditLogParts",
        arity: 1..=1,
        parse: parse_sec_audit_log_parts,
    },
    DirectiveDef {
        keyword: "SecRequestBodyAccess",
        arity: 1..=1,
        parse: parse_sec_request_body_access,
    },
    DirectiveDef {
        keyword: "SecResponseBodyAccess",
        arity: 1..=1,
        parse: parse_sec_response_body_access,
    },
];

fn parse_directive(tokens: Tokens<'_>) -> Result<(Directive, Tokens<'_>)> {
    let (keyword, rest) = tokens.expect(TokenKind::Directive, "directive")?;
    let Some(def) = DIRECTIVES
        .iter()
        .find(|d| d.keyword.eq_ignore_ascii_case(&keyword.value))
    else {
        return Err(SecRuleError::syntax(
            format!("unknown directive {:?}", keyword.value),
            keyword.position.clone(),
        ));
    };

    let (args, rest) = take_arguments(rest)?;
    if !def.arity.contains(&args.len()) {
        let expected = if def.arity.start() == def.arity.end() {
            format!("{} argument", def.arity.start())
        } else {
            format!("{} or {} arguments", def.arity.start(), def.arity.end())
        };
        let position = args
            .get(*def.arity.end())
            .map(|arg| arg.start.position.clone())
            .unwrap_or_else(|| keyword.position.clone());
        return Err(SecRuleError::syntax(
            format!("{} expects {expected}, found {}", def.keyword, args.len()),
            position,
        ));
    }

    Ok(((def.parse)(keyword, &args)?, rest))
}

fn take_arguments(tokens: Tokens<'_>) -> Result<(Vec<Argument<'_>>, Tokens<'_>)> {
    let mut args = Vec::new();
    let mut rest = tokens;
    while rest.at(TokenKind::ArgumentStart) {
        let start = rest.first();
        let body = rest.skip(1);
        let Some(stop) = body.find(TokenKind::ArgumentStop) else {
            return Err(unexpected("end of argument", body.skip(body.len()).first()));
        };
        let (inner, after) = body.split_at(stop);
        args.push(Argument {
            start,
            tokens: inner,
        });
        rest = after.skip(1);
    }
    Ok((args, rest))
}

fn parse_sec_rule(keyword: &Token, args: &[Argument<'_>]) -> Result<Directive> {
    let variables = parse_variable_list(args[0].tokens)?;
    let operator = parse_operator(args[1].tokens)?;
    let mut rule = SecRule::new(variables, operator, keyword.position.clone());
    if let Some(actions) = args.get(2) {
        for action in parse_action_list(actions.tokens)? {
            rule.add_action(action);
        }
    }
    Ok(Directive::SecRule(rule))
}

fn action_list(keyword: &Token, arg: &Argument<'_>) -> Result<SecAction> {
    let mut directive = SecAction::new(keyword.position.clone());
    for action in parse_action_list(arg.tokens)? {
        directive.add_action(action);
    }
    Ok(directive)
}

fn parse_sec_action(keyword: &Token, args: &[Argument<'_>]) -> Result<Directive> {
    Ok(Directive::SecAction(action_list(keyword, &args[0])?))
}

fn parse_sec_default_action(keyword: &Token, args: &[Argument<'_>]) -> Result<Directive> {
    Ok(Directive::SecDefaultAction(action_list(keyword, &args[0])?))
}

fn parse_sec_marker(keyword: &Token, args: &[Argument<'_>]) -> Result<Directive> {
    Ok(Directive::SecMarker {
        name: non_empty_text(&args[0], "marker name")?,
        position: keyword.position.clone(),
    })
}

fn parse_sec_component_signature(keyword: &Token, args: &[Argument<'_>]) -> Result<Directive> {
    Ok(Directive::SecComponentSignature {
        signature: non_empty_text(&args[0], "component signature")?,
        position: keyword.position.clone(),
    })
}

fn parse_sec_rule_engine(keyword: &Token, args: &[Argument<'_>]) -> Result<Directive> {
    Ok(Directive::SecRuleEngine {
        mode: parse_rule_engine_mode(args[0].tokens)?,
        position: keyword.position.clone(),
    })
}

fn parse_sec_audit_engine(keyword: &Token, args: &[Argument<'_>]) -> Result<Directive> {
    Ok(Directive::SecAuditEngine {
        mode: parse_audit_engine_mode(args[0].tokens)?,
        position: keyword.position.clone(),
    })
}

fn parse_sec_audit_log_parts(keyword: &Token, args: &[Argument<'_>]) -> Result<Directive> {
    Ok(Directive::SecAuditLogParts {
        parts: parse_audit_log_parts(args[0].tokens)?,
        position: keyword.position.clone(),
    })
}

fn parse_sec_request_body_access(keyword: &Token, args: &[Argument<'_>]) -> Result<Directive> {
    Ok(Directive::SecRequestBodyAccess {
        enabled: parse_on_off(args[0].tokens, "SecRequestBodyAccess")?,
        position: keyword.position.clone(),
    })
}

fn parse_sec_response_body_access(keyword: &Token, args: &[Argument<'_>]) -> Result<Directive> {
    Ok(Directive::SecResponseBodyAccess {
        enabled: parse_on_off(args[0].tokens, "SecResponseBodyAccess")?,
        position: keyword.position.clone(),
    })
}

fn non_empty_text(arg: &Argument<'_>, what: &str) -> Result<String> {
    let text = arg.tokens.text();
    if text.trim().is_empty() {
        return Err(SecRuleError::syntax(
            format!("expected {what}"),
            arg.start.position.clone(),
        ));
    }
    Ok(text)
}

// =============================================================================
// Directive values (shared with ctl)
// =============================================================================

/// A single keyword looked up with `from`.
fn keyword_value<T>(
    tokens: Tokens<'_>,
    what: &str,
    from: impl Fn(&str) -> Option<T>,
) -> Result<T> {
    let token = tokens.skip_whitespace().trim_end().single_ident(what)?;
    from(&token.value).ok_or_else(|| {
        SecRuleError::syntax(
            format!("invalid {what} {:?}", token.value),
            token.position.clone(),
        )
    })
}

/// `On`, `Off` or `DetectionOnly`.
pub(crate) fn parse_rule_engine_mode(tokens: Tokens<'_>) -> Result<RuleEngineMode> {
    keyword_value(tokens, "rule engine mode", RuleEngineMode::from_str)
}

/// `On`, `Off` or `RelevantOnly`.
pub(crate) fn parse_audit_engine_mode(tokens: Tokens<'_>) -> Result<AuditEngineMode> {
    keyword_value(tokens, "audit engine mode", AuditEngineMode::from_str)
}

pub(crate) fn parse_on_off(tokens: Tokens<'_>, what: &str) -> Result<bool> {
    keyword_value(tokens, &format!("{what} value"), |s| {
        match s.to_ascii_lowercase().as_str() {
            "on" => Some(true),
            "off" => Some(false),
            _ => None,
        }
    })
}

/// Audit log part letters such as `ABIJDEFHZ`.
pub(crate) fn parse_audit_log_parts(tokens: Tokens<'_>) -> Result<Vec<AuditLogPart>> {
    let token = tokens
        .skip_whitespace()
        .trim_end()
        .single_ident("audit log parts")?;
    token
        .value
        .chars()
        .map(|c| {
            AuditLogPart::from_char(c).ok_or_else(|| {
                SecRuleError::syntax(
                    format!("invalid audit log part {c:?}"),
                    token.position.clone(),
                )
            })
        })
        .collect()
}
