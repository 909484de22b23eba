//! Action lists: `"id:1001,phase:2,t:none,deny,msg:'blocked',setvar:tx.score=+5"`.
//!
//! Each action is `name` or `name:value`. A value is either single-quoted
//! (up to the closing quote, `\'` standing for a quote) or unquoted. An
//! unquoted value of a single-word action ends at a comma or whitespace; the
//! free-text ones (`msg`, `logdata`, `tag`, `setvar`...) run to the next comma.
//! Keyword dispatch is case-insensitive, and every valued action validates its
//! own value shape.

use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::ast::{
    Action, CtlOption, ExpireVar, IdRange, InitCol, PartsOp, RequestBodyProcessor, SetVar,
    SetVarOp, Severity, Transform, VariableSelector,
};
use crate::error::{Result, SecRuleError};
use crate::lexer::{Token, TokenKind};
use crate::position::Positioned;
use crate::value::ExpandableString;

use super::expandable::{parse_action_string, unescape_quotes};
use super::tokens::{Tokens, unexpected};
use super::variables::parse_variable_selector;
use super::{parse_audit_engine_mode, parse_audit_log_parts, parse_on_off, parse_rule_engine_mode};

/// Parse a comma/whitespace separated action list.
pub(crate) fn parse_action_list(tokens: Tokens<'_>) -> Result<Vec<Positioned<Action>>> {
    let mut actions = Vec::new();
    let mut rest = skip_separators(tokens);
    while !rest.is_empty() {
        let (action, after) = parse_action(rest)?;
        actions.push(action);
        if !after.is_empty() && !after.at(TokenKind::Comma) && !after.at(TokenKind::Whitespace) {
            return Err(unexpected("',' between actions", after.first()));
        }
        rest = skip_separators(after);
    }
    Ok(actions)
}

fn skip_separators(tokens: Tokens<'_>) -> Tokens<'_> {
    let n = tokens
        .iter()
        .take_while(|t| matches!(t.kind, TokenKind::Comma | TokenKind::Whitespace))
        .count();
    tokens.skip(n)
}

fn parse_action(tokens: Tokens<'_>) -> Result<(Positioned<Action>, Tokens<'_>)> {
    let (name, rest) = tokens.expect(TokenKind::Ident, "action name")?;
    let keyword = name.value.to_ascii_lowercase();
    let (value, rest) = take_value(rest, is_single_word(&keyword))?;
    let value = ActionValue { name, tokens: value };

    let action = match keyword.as_str() {
        // disruptive
        "allow" => value.flag(Action::Allow)?,
        "block" => value.flag(Action::Block)?,
        "deny" => value.flag(Action::Deny)?,
        "drop" => value.flag(Action::Drop)?,
        "pass" => value.flag(Action::Pass)?,
        "redirect" => Action::Redirect(value.expandable()?),

        // non-disruptive
        "append" => Action::Append(value.expandable()?),
        "auditlog" => value.flag(Action::AuditLog)?,
        "capture" => value.flag(Action::Capture)?,
        "ctl" => Action::Ctl(parse_ctl(value.required()?)?),
        "expirevar" => Action::ExpireVar(parse_expirevar(value.required()?)?),
        "initcol" => Action::InitCol(parse_initcol(value.required()?)?),
        "log" => value.flag(Action::Log)?,
        "logdata" => Action::LogData(value.expandable()?),
        "multimatch" => value.flag(Action::MultiMatch)?,
        "noauditlog" => value.flag(Action::NoAuditLog)?,
        "nolog" => value.flag(Action::NoLog)?,
        "setvar" => Action::SetVar(parse_setvar(value.required()?)?),
        "t" => Action::Transform(parse_transform(value.required()?)?),

        // flow
        "chain" => value.flag(Action::Chain)?,
        "skip" => Action::Skip(value.numeral(1..=u32::MAX)?),
        "skipafter" => Action::SkipAfter(value.expandable()?),

        // metadata
        "accuracy" => Action::Accuracy(value.numeral(0..=9)?),
        "id" => Action::Id(value.numeral(1..=u32::MAX)?),
        "maturity" => Action::Maturity(value.numeral(0..=9)?),
        "msg" => Action::Msg(value.expandable()?),
        "phase" => Action::Phase(value.phase()?),
        "rev" => Action::Rev(unescape_quotes(&value.required()?.text())),
        "severity" => Action::Severity(value.severity()?),
        "tag" => Action::Tag(value.expandable()?),
        "ver" => Action::Ver(unescape_quotes(&value.required()?.text())),

        // data
        "status" => Action::Status(value.numeral(100..=599)?),

        _ => {
            return Err(SecRuleError::syntax(
                format!("unknown action {:?}", name.value),
                name.position.clone(),
            ));
        }
    };

    Ok((Positioned::new(action, name.position.clone()), rest))
}

/// Actions whose unquoted value is one word, so that `id:1 deny` is two actions.
fn is_single_word(keyword: &str) -> bool {
    matches!(
        keyword,
        "accuracy"
            | "ctl"
            | "id"
            | "maturity"
            | "phase"
            | "rev"
            | "severity"
            | "skip"
            | "status"
            | "t"
            | "ver"
    )
}

/// Split off the value after `:`, if any.
fn take_value(
    tokens: Tokens<'_>,
    single_word: bool,
) -> Result<(Option<Tokens<'_>>, Tokens<'_>)> {
    if !tokens.at(TokenKind::Colon) {
        return Ok((None, tokens));
    }
    let rest = tokens.skip(1).skip_whitespace();

    if rest.at(TokenKind::SingleQuote) {
        let open = rest.first();
        let body = rest.skip(1);
        let Some(close) = body.find(TokenKind::SingleQuote) else {
            return Err(SecRuleError::syntax(
                "missing closing quote in action value",
                open.position.clone(),
            ));
        };
        let (value, rest) = body.split_at(close);
        return Ok((Some(value), rest.skip(1)));
    }

    let len = rest
        .iter()
        .position(|t| t.is(TokenKind::Comma) || (single_word && t.is(TokenKind::Whitespace)))
        .unwrap_or(rest.len());
    let (value, rest) = rest.split_at(len);
    Ok((Some(value.trim_end()), rest))
}

/// The value of one action together with its keyword, for diagnostics.
struct ActionValue<'t> {
    name: &'t Token,
    tokens: Option<Tokens<'t>>,
}

impl<'t> ActionValue<'t> {
    fn flag(&self, action: Action) -> Result<Action> {
        match self.tokens {
            None => Ok(action),
            Some(tokens) => Err(SecRuleError::syntax(
                format!("{} takes no value", self.name.value),
                tokens.position(),
            )),
        }
    }

    fn required(&self) -> Result<Tokens<'t>> {
        self.tokens.ok_or_else(|| {
            SecRuleError::syntax(
                format!("{} requires a value", self.name.value),
                self.name.position.clone(),
            )
        })
    }

    fn expandable(&self) -> Result<ExpandableString> {
        parse_action_string(self.required()?)
    }

    /// A decimal numeral within `range`.
    fn numeral<T>(&self, range: RangeInclusive<T>) -> Result<T>
    where
        T: FromStr + PartialOrd + Display,
    {
        let tokens = self.required()?;
        let text = tokens.text();
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SecRuleError::syntax(
                format!("{} requires a numeral, found {text:?}", self.name.value),
                tokens.position(),
            ));
        }
        match text.parse::<T>() {
            Ok(n) if range.contains(&n) => Ok(n),
            _ => Err(SecRuleError::syntax(
                format!(
                    "{} must be between {} and {}, found {text}",
                    self.name.value,
                    range.start(),
                    range.end()
                ),
                tokens.position(),
            )),
        }
    }

    /// `1`-`5`, or `request` (2), `response` (4), `logging` (5).
    fn phase(&self) -> Result<u8> {
        let text = self.required()?.text();
        match text.to_ascii_lowercase().as_str() {
            "request" => Ok(2),
            "response" => Ok(4),
            "logging" => Ok(5),
            _ => self.numeral(1..=5),
        }
    }

    /// A severity name or `0`-`7`.
    fn severity(&self) -> Result<Severity> {
        let text = self.required()?.text();
        if let Some(severity) = Severity::from_str(&text) {
            return Ok(severity);
        }
        let value = self.numeral(0..=7)?;
        Severity::from_value(value).ok_or_else(|| {
            SecRuleError::syntax(
                format!("invalid severity {value}"),
                self.name.position.clone(),
            )
        })
    }
}

fn parse_transform(tokens: Tokens<'_>) -> Result<Transform> {
    let name = tokens.single_ident("transformation name")?;
    Transform::from_str(&name.value).ok_or_else(|| {
        SecRuleError::syntax(
            format!("unknown transformation {:?}", name.value),
            name.position.clone(),
        )
    })
}

// =============================================================================
// Collection actions
// =============================================================================

/// `[!]collection.variable[=[+|-]value]`
fn parse_setvar(tokens: Tokens<'_>) -> Result<SetVar> {
    let delete = tokens.at(TokenKind::Exclamation);
    let tokens = if delete { tokens.skip(1) } else { tokens };

    let (target, assignment) = match tokens.find_outside_macros(TokenKind::Equals) {
        Some(eq) => {
            let (target, assignment) = tokens.split_at(eq);
            (target, Some(assignment))
        }
        None => (tokens, None),
    };
    let (collection, variable) = split_variable(target, "setvar")?;

    let Some(assignment) = assignment else {
        let op = if delete {
            SetVarOp::Delete
        } else {
            SetVarOp::SetToOne
        };
        return Ok(SetVar {
            op,
            collection,
            variable,
            modifier: None,
        });
    };

    if delete {
        return Err(SecRuleError::syntax(
            "setvar: a deleted variable takes no value",
            assignment.position(),
        ));
    }
    let value = assignment.skip(1);
    let (op, value) = match value.first().kind {
        TokenKind::Plus if !value.is_empty() => (SetVarOp::Add, value.skip(1)),
        TokenKind::Minus if !value.is_empty() => (SetVarOp::Subtract, value.skip(1)),
        _ => (SetVarOp::Set, value),
    };
    if op != SetVarOp::Set && value.is_empty() {
        return Err(unexpected("setvar operand", value.first()));
    }

    Ok(SetVar {
        op,
        collection,
        variable,
        modifier: Some(parse_action_string(value)?),
    })
}

/// `collection.variable=seconds`
fn parse_expirevar(tokens: Tokens<'_>) -> Result<ExpireVar> {
    let Some(eq) = tokens.find_outside_macros(TokenKind::Equals) else {
        return Err(SecRuleError::syntax(
            "expirevar requires collection.variable=seconds",
            tokens.position(),
        ));
    };
    let (target, seconds) = tokens.split_at(eq);
    let (collection, variable) = split_variable(target, "expirevar")?;
    let seconds = seconds.skip(1);
    if seconds.is_empty() {
        return Err(unexpected("expiry in seconds", seconds.first()));
    }
    Ok(ExpireVar {
        collection,
        variable,
        seconds: parse_action_string(seconds)?,
    })
}

/// `collection=key`
fn parse_initcol(tokens: Tokens<'_>) -> Result<InitCol> {
    let Some(eq) = tokens.find(TokenKind::Equals) else {
        return Err(SecRuleError::syntax(
            "initcol requires collection=key",
            tokens.position(),
        ));
    };
    let (collection, key) = tokens.split_at(eq);
    let collection = collection.single_ident("collection name")?;
    let key = key.skip(1);
    if key.is_empty() {
        return Err(unexpected("collection key", key.first()));
    }
    Ok(InitCol {
        collection: collection.value.clone(),
        key: parse_action_string(key)?,
    })
}

/// Split `collection.variable` at the first dot outside a macro.
fn split_variable(
    tokens: Tokens<'_>,
    action: &str,
) -> Result<(ExpandableString, ExpandableString)> {
    let Some(dot) = tokens.find_outside_macros(TokenKind::Dot) else {
        return Err(SecRuleError::syntax(
            format!("{action} requires collection.variable"),
            tokens.position(),
        ));
    };
    let (collection, variable) = tokens.split_at(dot);
    let variable = variable.skip(1);
    if collection.is_empty() {
        return Err(unexpected("collection name", collection.first()));
    }
    if variable.is_empty() {
        return Err(unexpected("variable name", variable.first()));
    }
    Ok((parse_action_string(collection)?, parse_action_string(variable)?))
}

// =============================================================================
// ctl
// =============================================================================

fn parse_ctl(tokens: Tokens<'_>) -> Result<CtlOption> {
    let (name, rest) = tokens.expect(TokenKind::Ident, "ctl option")?;
    let (_, value) = rest.expect(TokenKind::Equals, "'=' after ctl option")?;

    let option = match name.value.to_ascii_lowercase().as_str() {
        "auditengine" => CtlOption::AuditEngine(parse_audit_engine_mode(value)?),
        "auditlogparts" => {
            let (op, parts) = match value.first().kind {
                TokenKind::Plus => (PartsOp::Add, value.skip(1)),
                TokenKind::Minus => (PartsOp::Remove, value.skip(1)),
                _ => (PartsOp::Set, value),
            };
            CtlOption::AuditLogParts {
                op,
                parts: parse_audit_log_parts(parts)?,
            }
        }
        "forcerequestbodyvariable" => {
            CtlOption::ForceRequestBodyVariable(parse_on_off(value, "forceRequestBodyVariable")?)
        }
        "requestbodyaccess" => {
            CtlOption::RequestBodyAccess(parse_on_off(value, "requestBodyAccess")?)
        }
        "requestbodyprocessor" => {
            let processor = value.single_ident("request body processor")?;
            CtlOption::RequestBodyProcessor(
                RequestBodyProcessor::from_str(&processor.value).ok_or_else(|| {
                    SecRuleError::syntax(
                        format!("unknown request body processor {:?}", processor.value),
                        processor.position.clone(),
                    )
                })?,
            )
        }
        "ruleengine" => CtlOption::RuleEngine(parse_rule_engine_mode(value)?),
        "ruleremovebyid" => CtlOption::RuleRemoveById(parse_id_range(value)?),
        "ruleremovebytag" => CtlOption::RuleRemoveByTag(parse_tag(value)?),
        "ruleremovetargetbyid" => {
            let (ids, target) = split_target(value)?;
            CtlOption::RuleRemoveTargetById {
                ids: parse_id_range(ids)?,
                target: parse_target(target)?,
            }
        }
        "ruleremovetargetbytag" => {
            let (tag, target) = split_target(value)?;
            CtlOption::RuleRemoveTargetByTag {
                tag: parse_tag(tag)?,
                target: parse_target(target)?,
            }
        }
        _ => {
            return Err(SecRuleError::syntax(
                format!("unknown ctl option {:?}", name.value),
                name.position.clone(),
            ));
        }
    };
    Ok(option)
}

/// `N` or `N-M` with `1 <= N <= M`.
fn parse_id_range(tokens: Tokens<'_>) -> Result<IdRange> {
    let text = tokens.text();
    let (start, end) = text.split_once('-').unwrap_or((text.as_str(), text.as_str()));
    let range = match (start.parse::<u32>(), end.parse::<u32>()) {
        (Ok(start), Ok(end)) if start >= 1 && start <= end => Some(IdRange { start, end }),
        _ => None,
    };
    range.ok_or_else(|| {
        SecRuleError::syntax(
            format!("invalid rule id or id range {text:?}"),
            tokens.position(),
        )
    })
}

fn parse_tag(tokens: Tokens<'_>) -> Result<String> {
    if tokens.is_empty() {
        return Err(unexpected("tag", tokens.first()));
    }
    Ok(tokens.text())
}

/// `ids;TARGET` / `tag;TARGET`
fn split_target(tokens: Tokens<'_>) -> Result<(Tokens<'_>, Tokens<'_>)> {
    let Some(semicolon) = tokens.find(TokenKind::Semicolon) else {
        return Err(SecRuleError::syntax(
            "expected ';' followed by the target to remove",
            tokens.position(),
        ));
    };
    let (left, right) = tokens.split_at(semicolon);
    Ok((left, right.skip(1)))
}

fn parse_target(tokens: Tokens<'_>) -> Result<VariableSelector> {
    let (target, rest) = parse_variable_selector(tokens)?;
    rest.finish("ctl target")?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AuditEngineMode, AuditLogPart, RuleEngineMode, Variable};
    use crate::lexer::tokenize;
    use crate::value::{Macro, StringPart};

    fn actions(text: &str) -> Result<Vec<Action>> {
        let tokens = tokenize("", &format!("SecAction \"{text}\"")).unwrap();
        let stop = tokens.len() - 2;
        let list = parse_action_list(Tokens::new(&tokens[2..stop], &tokens[stop]))?;
        Ok(list.into_iter().map(|a| a.node).collect())
    }

    fn lit(text: &str) -> ExpandableString {
        ExpandableString::literal(text)
    }

    fn action(text: &str) -> Action {
        let mut list = actions(text).unwrap();
        assert_eq!(list.len(), 1, "{text}");
        list.remove(0)
    }

    fn error(text: &str) -> SecRuleError {
        match actions(text) {
            Ok(list) => panic!("{text} parsed as {list:?}"),
            Err(e) => e,
        }
    }

    #[test]
    fn mixed_action_list() {
        let list = actions("id:1,phase:1,deny,msg:'blocked'").unwrap();
        assert_eq!(
            list,
            vec![
                Action::Id(1),
                Action::Phase(1),
                Action::Deny,
                Action::Msg("blocked".into()),
            ]
        );
    }

    #[test]
    fn whitespace_separates_flags() {
        let list = actions("deny, log\tnoauditlog ,  id:5").unwrap();
        assert_eq!(
            list,
            vec![Action::Deny, Action::Log, Action::NoAuditLog, Action::Id(5)]
        );
    }

    #[test]
    fn whitespace_ends_single_word_values() {
        assert_eq!(actions("id:1 deny").unwrap(), vec![Action::Id(1), Action::Deny]);
        assert_eq!(
            actions("phase:2 t:none").unwrap(),
            vec![Action::Phase(2), Action::Transform(Transform::None)]
        );
        assert_eq!(
            actions("t:none t:lowercase\tstatus:403  severity:2 rev:3 ver:x pass").unwrap(),
            vec![
                Action::Transform(Transform::None),
                Action::Transform(Transform::Lowercase),
                Action::Status(403),
                Action::Severity(Severity::Critical),
                Action::Rev("3".to_string()),
                Action::Ver("x".to_string()),
                Action::Pass,
            ]
        );
        assert_eq!(
            actions("ctl:ruleEngine=Off nolog").unwrap(),
            vec![Action::Ctl(CtlOption::RuleEngine(RuleEngineMode::Off)), Action::NoLog]
        );
        assert_eq!(actions("id:1,deny").unwrap(), vec![Action::Id(1), Action::Deny]);
    }

    #[test]
    fn escaped_quotes_in_quoted_values() {
        assert_eq!(action(r"msg:'it\'s'"), Action::Msg(lit("it's")));
        assert_eq!(action(r"ver:'a\'b'"), Action::Ver("a'b".to_string()));

        let Action::SetVar(setvar) = action(r"setvar:'tx.note=don\'t'") else {
            panic!("expected setvar");
        };
        assert_eq!(setvar.modifier, Some(lit("don't")));
    }

    #[test]
    fn action_positions() {
        let tokens = tokenize("", "SecAction \"id:1,  deny\"").unwrap();
        let stop = tokens.len() - 2;
        let list = parse_action_list(Tokens::new(&tokens[2..stop], &tokens[stop])).unwrap();
        assert_eq!(list[1].position.column, 19);
    }

    #[test]
    fn messages_expand_macros() {
        let Action::Msg(msg) = action("msg:'Value is %{TX.score}'") else {
            panic!("expected msg");
        };
        assert_eq!(
            msg.parts,
            vec![
                StringPart::Literal("Value is ".to_string()),
                StringPart::Macro(Macro::new(Some("TX"), "score")),
            ]
        );
    }

    #[test]
    fn unquoted_values_run_to_comma() {
        assert_eq!(
            actions("tag:attack-sqli ,logdata:x y").unwrap(),
            vec![Action::Tag("attack-sqli".into()), Action::LogData("x y".into())]
        );
        assert_eq!(action("ver:'OWASP_CRS/4.0.0'"), Action::Ver("OWASP_CRS/4.0.0".to_string()));
        assert_eq!(action("rev:2"), Action::Rev("2".to_string()));
    }

    #[test]
    fn numeric_actions_are_range_checked() {
        for phase in 1..=5u8 {
            assert_eq!(action(&format!("phase:{phase}")), Action::Phase(phase));
        }
        for severity in 0..=7u8 {
            let expected = Severity::from_value(severity).unwrap();
            assert_eq!(action(&format!("severity:{severity}")), Action::Severity(expected));
        }
        for bad in [
            "phase:0",
            "phase:6",
            "severity:8",
            "status:99",
            "status:600",
            "accuracy:10",
            "maturity:12",
            "skip:0",
            "id:0",
            "id:4294967296",
        ] {
            assert!(matches!(error(bad), SecRuleError::Syntax { .. }), "{bad}");
        }
        assert_eq!(action("status:403"), Action::Status(403));
        assert_eq!(action("id:4294967295"), Action::Id(u32::MAX));
        assert_eq!(action("accuracy:'8'"), Action::Accuracy(8));
    }

    #[test]
    fn id_requires_numeral() {
        let err = error("id:abc");
        assert!(err.message().starts_with("id requires a numeral"));
        let position = err.position().unwrap();
        assert_eq!((position.line, position.column), (1, 15));
    }

    #[test]
    fn phase_and_severity_aliases() {
        assert_eq!(action("phase:request"), Action::Phase(2));
        assert_eq!(action("phase:'response'"), Action::Phase(4));
        assert_eq!(action("phase:LOGGING"), Action::Phase(5));
        assert_eq!(action("severity:'CRITICAL'"), Action::Severity(Severity::Critical));
        assert_eq!(action("severity:notice"), Action::Severity(Severity::Notice));
        assert!(actions("phase:body").is_err());
        assert!(actions("severity:loud").is_err());
    }

    #[test]
    fn flags_reject_values() {
        let err = error("deny:403");
        assert_eq!(err.message(), "deny takes no value");
        assert!(actions("id").is_err());
        assert!(actions("msg:'unterminated").is_err());
        assert!(actions("msg:'a'b").is_err());
        assert!(actions("explode").is_err());
    }

    #[test]
    fn setvar_forms() {
        let setvar = |text: &str| match action(text) {
            Action::SetVar(setvar) => setvar,
            other => panic!("expected setvar, got {other:?}"),
        };

        let add = setvar("setvar:tx.counter=+1");
        assert_eq!(add.op, SetVarOp::Add);
        assert_eq!(add.collection, lit("tx"));
        assert_eq!(add.variable, lit("counter"));
        assert_eq!(add.modifier, Some(lit("1")));

        assert_eq!(setvar("setvar:tx.x=-%{tx.y}").op, SetVarOp::Subtract);
        assert_eq!(setvar("setvar:'tx.msg=%{rule.msg}'").op, SetVarOp::Set);

        let one = setvar("setvar:tx.flag");
        assert_eq!(one.op, SetVarOp::SetToOne);
        assert_eq!(one.modifier, None);

        let delete = setvar("setvar:!tx.flag");
        assert_eq!(delete.op, SetVarOp::Delete);

        let empty = setvar("setvar:tx.value=");
        assert_eq!(empty.op, SetVarOp::Set);
        assert_eq!(empty.modifier, Some(ExpandableString::new()));
    }

    #[test]
    fn setvar_names_may_be_macros() {
        let Action::SetVar(setvar) = action("setvar:'tx.%{rule.id}-%{MATCHED_VAR_NAME}=%{MATCHED_VAR}'")
        else {
            panic!("expected setvar");
        };
        assert_eq!(setvar.collection, lit("tx"));
        assert_eq!(setvar.variable.to_string(), "%{rule.id}-%{MATCHED_VAR_NAME}");
        assert_eq!(setvar.modifier.unwrap().to_string(), "%{MATCHED_VAR}");
    }

    #[test]
    fn setvar_errors() {
        assert!(actions("setvar:!tx.a=1").is_err());
        assert!(actions("setvar:counter=1").is_err());
        assert!(actions("setvar:.a=1").is_err());
        assert!(actions("setvar:tx.=1").is_err());
        assert!(actions("setvar:tx.a=+").is_err());
    }

    #[test]
    fn expirevar_and_initcol() {
        let Action::ExpireVar(expire) = action("expirevar:ip.blocked=3600") else {
            panic!("expected expirevar");
        };
        assert_eq!(expire.collection, lit("ip"));
        assert_eq!(expire.variable, lit("blocked"));
        assert_eq!(expire.seconds, lit("3600"));

        let Action::InitCol(initcol) = action("initcol:ip=%{REMOTE_ADDR}_%{tx.ua_hash}") else {
            panic!("expected initcol");
        };
        assert_eq!(initcol.collection, "ip");
        assert_eq!(initcol.key.macros().count(), 2);

        assert!(actions("expirevar:ip.blocked").is_err());
        assert!(actions("initcol:ip").is_err());
        assert!(actions("initcol:a.b=c").is_err());
    }

    #[test]
    fn transformations() {
        assert_eq!(
            actions("t:none,t:urlDecodeUni,t:'lowercase'").unwrap(),
            vec![
                Action::Transform(Transform::None),
                Action::Transform(Transform::UrlDecodeUni),
                Action::Transform(Transform::Lowercase),
            ]
        );
        assert!(actions("t:rot13").is_err());
    }

    #[test]
    fn ctl_options() {
        let ctl = |text: &str| match action(text) {
            Action::Ctl(option) => option,
            other => panic!("expected ctl, got {other:?}"),
        };

        assert_eq!(
            ctl("ctl:ruleEngine=DetectionOnly"),
            CtlOption::RuleEngine(RuleEngineMode::DetectionOnly)
        );
        assert_eq!(
            ctl("ctl:auditEngine=RelevantOnly"),
            CtlOption::AuditEngine(AuditEngineMode::RelevantOnly)
        );
        assert_eq!(ctl("ctl:requestBodyAccess=Off"), CtlOption::RequestBodyAccess(false));
        assert_eq!(
            ctl("ctl:forceRequestBodyVariable=On"),
            CtlOption::ForceRequestBodyVariable(true)
        );
        assert_eq!(
            ctl("ctl:requestBodyProcessor=JSON"),
            CtlOption::RequestBodyProcessor(RequestBodyProcessor::Json)
        );
        assert_eq!(
            ctl("ctl:auditLogParts=+E"),
            CtlOption::AuditLogParts {
                op: PartsOp::Add,
                parts: vec![AuditLogPart::IntermediaryResponseBody],
            }
        );
        assert_eq!(
            ctl("ctl:ruleRemoveById=920000-920999"),
            CtlOption::RuleRemoveById(IdRange {
                start: 920000,
                end: 920999
            })
        );
        assert_eq!(
            ctl("ctl:ruleRemoveByTag=attack-sqli"),
            CtlOption::RuleRemoveByTag("attack-sqli".to_string())
        );

        let CtlOption::RuleRemoveTargetById { ids, target } =
            ctl("ctl:ruleRemoveTargetById=942100;ARGS:password")
        else {
            panic!("expected ruleRemoveTargetById");
        };
        assert_eq!(ids, IdRange { start: 942100, end: 942100 });
        assert_eq!(target.variable, Variable::Args);
        assert_eq!(target.to_string(), "ARGS:password");

        let CtlOption::RuleRemoveTargetByTag { tag, target } =
            ctl("ctl:ruleRemoveTargetByTag=OWASP_CRS;REQUEST_COOKIES:/^_ga/")
        else {
            panic!("expected ruleRemoveTargetByTag");
        };
        assert_eq!(tag, "OWASP_CRS");
        assert_eq!(target.to_string(), "REQUEST_COOKIES:/^_ga/");
    }

    #[test]
    fn ctl_errors() {
        for bad in [
            "ctl:ruleEngine=Maybe",
            "ctl:ruleEngine",
            "ctl:requestBodyProcessor=YAML",
            "ctl:ruleRemoveById=abc",
            "ctl:ruleRemoveById=10-5",
            "ctl:ruleRemoveTargetById=1",
            "ctl:ruleRemoveTargetById=1;REQUEST_METHOD:x",
            "ctl:auditLogParts=+X",
            "ctl:debugLogLevel=9",
        ] {
            assert!(actions(bad).is_err(), "{bad}");
        }
    }
}
