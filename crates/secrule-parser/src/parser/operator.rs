//! The operator argument of `SecRule`: `[!]@name argument`, or a bare regex.

use crate::ast::{ByteRange, IpRange, Operator, OperatorKind};
use crate::error::{Result, SecRuleError};
use crate::lexer::{Token, TokenKind};
use crate::value::{ExpandableString, StringPart};

use super::expandable::parse_expandable;
use super::tokens::{Tokens, unexpected};

pub(crate) fn parse_operator(tokens: Tokens<'_>) -> Result<Operator> {
    let position = tokens.position();
    let mut rest = tokens;
    let negated = rest.at(TokenKind::Exclamation);
    if negated {
        rest = rest.skip(1);
    }

    if !rest.at(TokenKind::At) {
        return Ok(Operator {
            kind: OperatorKind::Regex(rest.text()),
            negated,
            position,
        });
    }

    let (name, rest) = rest.skip(1).expect(TokenKind::Ident, "operator name")?;
    let argument = OperatorArgument::new(name, rest)?;
    let kind = match name.value.to_ascii_lowercase().as_str() {
        "rx" => OperatorKind::Regex(argument.verbatim()?),
        "beginswith" => OperatorKind::BeginsWith(argument.expandable()?),
        "contains" => OperatorKind::Contains(argument.expandable()?),
        "containsword" => OperatorKind::ContainsWord(argument.expandable()?),
        "endswith" => OperatorKind::EndsWith(argument.expandable()?),
        "streq" => OperatorKind::Streq(argument.expandable()?),
        "within" => OperatorKind::Within(argument.expandable()?),
        "eq" => OperatorKind::Eq(argument.expandable()?),
        "ge" => OperatorKind::Ge(argument.expandable()?),
        "gt" => OperatorKind::Gt(argument.expandable()?),
        "le" => OperatorKind::Le(argument.expandable()?),
        "lt" => OperatorKind::Lt(argument.expandable()?),
        "pm" => OperatorKind::Pm(words(argument.required()?)),
        "pmfromfile" | "pmf" => OperatorKind::PmFromFile(words(argument.required()?)),
        "ipmatch" => {
            OperatorKind::IpMatch(argument.list("IP address or network", IpRange::parse)?)
        }
        "ipmatchfromfile" | "ipmatchf" => {
            OperatorKind::IpMatchFromFile(argument.required()?.text())
        }
        "rbl" => OperatorKind::Rbl(argument.required()?.text()),
        "geolookup" => argument.none(OperatorKind::GeoLookup)?,
        "validatebyterange" => {
            OperatorKind::ValidateByteRange(argument.list("byte range", ByteRange::parse)?)
        }
        "validateurlencoding" => argument.none(OperatorKind::ValidateUrlEncoding)?,
        "validateutf8encoding" => argument.none(OperatorKind::ValidateUtf8Encoding)?,
        "detectsqli" => argument.none(OperatorKind::DetectSqli)?,
        "detectxss" => argument.none(OperatorKind::DetectXss)?,
        "unconditionalmatch" => argument.none(OperatorKind::UnconditionalMatch)?,
        "nomatch" => argument.none(OperatorKind::NoMatch)?,
        _ => {
            return Err(SecRuleError::syntax(
                format!("unknown operator @{}", name.value),
                name.position.clone(),
            ));
        }
    };

    Ok(Operator {
        kind,
        negated,
        position,
    })
}

/// Whatever follows `@name` and the one whitespace character separating them.
struct OperatorArgument<'t> {
    name: &'t Token,
    /// The rest of the separating whitespace run, which belongs to the argument.
    leading: &'t str,
    tokens: Tokens<'t>,
}

impl<'t> OperatorArgument<'t> {
    fn new(name: &'t Token, rest: Tokens<'t>) -> Result<Self> {
        if rest.is_empty() {
            return Ok(OperatorArgument {
                name,
                leading: "",
                tokens: rest,
            });
        }
        if !rest.at(TokenKind::Whitespace) {
            return Err(unexpected(
                &format!("whitespace after @{}", name.value),
                rest.first(),
            ));
        }
        let separator = rest.first().value.as_str();
        let leading = separator
            .char_indices()
            .nth(1)
            .map_or("", |(i, _)| &separator[i..]);
        Ok(OperatorArgument {
            name,
            leading,
            tokens: rest.skip(1),
        })
    }

    fn missing(&self) -> SecRuleError {
        SecRuleError::syntax(
            format!("@{} requires an argument", self.name.value),
            self.name.position.clone(),
        )
    }

    /// The argument without trailing whitespace, for word and list operands.
    fn required(&self) -> Result<Tokens<'t>> {
        let tokens = self.tokens.trim_end();
        if tokens.is_empty() {
            return Err(self.missing());
        }
        Ok(tokens)
    }

    /// The argument text exactly as written.
    fn verbatim(&self) -> Result<String> {
        let text = format!("{}{}", self.leading, self.tokens.text());
        if text.is_empty() {
            return Err(self.missing());
        }
        Ok(text)
    }

    fn expandable(&self) -> Result<ExpandableString> {
        if self.leading.is_empty() && self.tokens.is_empty() {
            return Err(self.missing());
        }
        let mut string = ExpandableString::literal(self.leading);
        for part in parse_expandable(self.tokens)?.parts {
            match part {
                StringPart::Literal(text) => string.push_literal(&text),
                StringPart::Macro(m) => string.push_macro(m),
            }
        }
        Ok(string)
    }

    /// Comma-separated items, each validated by `parse`.
    fn list<T>(&self, what: &str, parse: impl Fn(&str) -> Option<T>) -> Result<Vec<T>> {
        let tokens = self.required()?;
        tokens
            .text()
            .split(',')
            .map(|item| {
                let item = item.trim();
                parse(item).ok_or_else(|| {
                    SecRuleError::syntax(
                        format!("@{}: invalid {what} {item:?}", self.name.value),
                        tokens.position(),
                    )
                })
            })
            .collect()
    }

    fn none(&self, kind: OperatorKind) -> Result<OperatorKind> {
        let tokens = self.tokens.trim_end();
        if tokens.is_empty() {
            return Ok(kind);
        }
        Err(SecRuleError::syntax(
            format!("@{} takes no argument", self.name.value),
            tokens.position(),
        ))
    }
}

/// Split on whitespace tokens.
fn words(tokens: Tokens<'_>) -> Vec<String> {
    let mut words = Vec::new();
    let mut rest = tokens;
    while !rest.is_empty() {
        let len = rest.find(TokenKind::Whitespace).unwrap_or(rest.len());
        let (word, after) = rest.split_at(len);
        words.push(word.text());
        rest = after.skip_whitespace();
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Macro;
    use std::net::IpAddr;

    fn operator(text: &str) -> Result<Operator> {
        let tokens = crate::lexer::tokenize("", &format!("SecRule ARGS {text}")).unwrap();
        let start = tokens.iter().rposition(|t| t.is(TokenKind::ArgumentStart)).unwrap();
        let stop = tokens.len() - 2;
        parse_operator(Tokens::new(&tokens[start + 1..stop], &tokens[stop]))
    }

    #[test]
    fn implicit_regex() {
        let op = operator(r#""^(?:GET|HEAD)$""#).unwrap();
        assert_eq!(op.kind, OperatorKind::Regex("^(?:GET|HEAD)$".to_string()));
        assert!(!op.negated);

        let op = operator(r#""!^\d+$""#).unwrap();
        assert!(op.negated);
        assert_eq!(op.kind, OperatorKind::Regex(r"^\d+$".to_string()));
    }

    #[test]
    fn explicit_regex_keeps_whitespace() {
        let op = operator(r#""@rx a b  c""#).unwrap();
        assert_eq!(op.kind, OperatorKind::Regex("a b  c".to_string()));
        assert_eq!(op.position.column, 15);
    }

    #[test]
    fn argument_whitespace_is_kept_after_the_separator() {
        let op = operator(r#""@rx a ""#).unwrap();
        assert_eq!(op.kind, OperatorKind::Regex("a ".to_string()));

        let op = operator(r#""@rx   x""#).unwrap();
        assert_eq!(op.kind, OperatorKind::Regex("  x".to_string()));

        let op = operator(r#""@streq  ""#).unwrap();
        assert_eq!(op.kind, OperatorKind::Streq(" ".into()));

        let op = operator(r#""@contains %{tx.a} ""#).unwrap();
        let OperatorKind::Contains(arg) = op.kind else {
            panic!("expected @contains");
        };
        assert_eq!(arg.to_string(), "%{tx.a} ");

        let op = operator(r#""@pm a b ""#).unwrap();
        assert_eq!(op.kind, OperatorKind::Pm(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn negation_flag_tracks_leading_bang() {
        assert!(operator(r#""!@streq x""#).unwrap().negated);
        assert!(!operator(r#""@streq x""#).unwrap().negated);
    }

    #[test]
    fn names_are_case_insensitive() {
        let op = operator(r#""@BeginsWith /admin""#).unwrap();
        assert_eq!(op.kind, OperatorKind::BeginsWith("/admin".into()));
        assert_eq!(op.kind.name(), "beginsWith");
    }

    #[test]
    fn comparison_arguments_expand_macros() {
        let op = operator(r#""@gt %{tx.inbound_anomaly_score_threshold}""#).unwrap();
        let OperatorKind::Gt(arg) = op.kind else {
            panic!("expected @gt");
        };
        assert_eq!(
            arg.parts,
            vec![StringPart::Macro(Macro::new(
                Some("tx"),
                "inbound_anomaly_score_threshold"
            ))]
        );
    }

    #[test]
    fn phrase_lists() {
        let op = operator(r#""@pm select union  insert""#).unwrap();
        assert_eq!(
            op.kind,
            OperatorKind::Pm(vec!["select".into(), "union".into(), "insert".into()])
        );

        let op = operator(r#""@pmf php-errors.data other.data""#).unwrap();
        assert_eq!(
            op.kind,
            OperatorKind::PmFromFile(vec!["php-errors.data".into(), "other.data".into()])
        );
    }

    #[test]
    fn ip_match_validates_addresses() {
        let op = operator(r#""@ipMatch 127.0.0.1,10.0.0.0/8, ::1""#).unwrap();
        let OperatorKind::IpMatch(ranges) = op.kind else {
            panic!("expected @ipMatch");
        };
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[1].prefix(), 8);
        assert_eq!(ranges[2].address(), "::1".parse::<IpAddr>().unwrap());

        assert!(operator(r#""@ipMatch 300.1.1.1""#).is_err());
        assert!(operator(r#""@ipMatch 10.0.0.0/33""#).is_err());
    }

    #[test]
    fn byte_ranges() {
        let op = operator(r#""@validateByteRange 1-255, 9""#).unwrap();
        assert_eq!(
            op.kind,
            OperatorKind::ValidateByteRange(vec![
                ByteRange { start: 1, end: 255 },
                ByteRange { start: 9, end: 9 },
            ])
        );
        assert!(operator(r#""@validateByteRange 10-5""#).is_err());
        assert!(operator(r#""@validateByteRange 256""#).is_err());
    }

    #[test]
    fn argumentless_operators() {
        assert_eq!(operator("@detectSQLi").unwrap().kind, OperatorKind::DetectSqli);
        assert_eq!(
            operator(r#""@unconditionalMatch ""#).unwrap().kind,
            OperatorKind::UnconditionalMatch
        );
        let err = operator(r#""@detectXSS now""#).unwrap_err();
        assert!(err.message().contains("takes no argument"));
    }

    #[test]
    fn operator_errors() {
        let err = operator(r#""@rx""#).unwrap_err();
        assert!(err.message().contains("requires an argument"));

        let err = operator(r#""@bogus x""#).unwrap_err();
        assert_eq!(err.message(), "unknown operator @bogus");
        assert_eq!(err.position().unwrap().column, 16);

        assert!(operator(r#""@""#).is_err());
        assert!(operator(r#""@pm:x""#).is_err());
    }
}
