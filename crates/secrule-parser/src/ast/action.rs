//! Rule actions: the third argument of `SecRule` and the only argument of
//! `SecAction` / `SecDefaultAction`.
//!
//! Reference: ModSecurity v2 reference manual, "Actions"

use std::fmt;

use serde::Serialize;

use super::transform::Transform;
use super::variable::VariableSelector;
use super::{AuditEngineMode, AuditLogPart, RuleEngineMode};
use crate::value::ExpandableString;

/// Action families. Every action keyword belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionType {
    /// Decides the fate of the transaction (`deny`, `pass`, ...).
    Disruptive,
    /// Side effects that do not stop processing (`setvar`, `log`, ...).
    NonDisruptive,
    /// Changes rule flow (`chain`, `skipAfter`).
    Flow,
    /// Describes the rule (`id`, `msg`, `phase`, ...).
    MetaData,
    /// Carries data for other actions (`status`).
    Data,
}

/// A parsed action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    // Disruptive
    Allow,
    Block,
    Deny,
    Drop,
    Pass,
    Redirect(ExpandableString),

    // Non-disruptive
    Append(ExpandableString),
    AuditLog,
    Capture,
    Ctl(CtlOption),
    ExpireVar(ExpireVar),
    InitCol(InitCol),
    Log,
    LogData(ExpandableString),
    MultiMatch,
    NoAuditLog,
    NoLog,
    SetVar(SetVar),
    #[serde(rename = "t")]
    Transform(Transform),

    // Flow
    Chain,
    Skip(u32),
    SkipAfter(ExpandableString),

    // Metadata
    Accuracy(u8),
    Id(u32),
    Maturity(u8),
    Msg(ExpandableString),
    Phase(u8),
    Rev(String),
    Severity(Severity),
    Tag(ExpandableString),
    Ver(String),

    // Data
    Status(u16),
}

impl Action {
    /// The action keyword as written in rules.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Block => "block",
            Action::Deny => "deny",
            Action::Drop => "drop",
            Action::Pass => "pass",
            Action::Redirect(_) => "redirect",
            Action::Append(_) => "append",
            Action::AuditLog => "auditlog",
            Action::Capture => "capture",
            Action::Ctl(_) => "ctl",
            Action::ExpireVar(_) => "expirevar",
            Action::InitCol(_) => "initcol",
            Action::Log => "log",
            Action::LogData(_) => "logdata",
            Action::MultiMatch => "multiMatch",
            Action::NoAuditLog => "noauditlog",
            Action::NoLog => "nolog",
            Action::SetVar(_) => "setvar",
            Action::Transform(_) => "t",
            Action::Chain => "chain",
            Action::Skip(_) => "skip",
            Action::SkipAfter(_) => "skipAfter",
            Action::Accuracy(_) => "accuracy",
            Action::Id(_) => "id",
            Action::Maturity(_) => "maturity",
            Action::Msg(_) => "msg",
            Action::Phase(_) => "phase",
            Action::Rev(_) => "rev",
            Action::Severity(_) => "severity",
            Action::Tag(_) => "tag",
            Action::Ver(_) => "ver",
            Action::Status(_) => "status",
        }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Action::Allow
            | Action::Block
            | Action::Deny
            | Action::Drop
            | Action::Pass
            | Action::Redirect(_) => ActionType::Disruptive,
            Action::Append(_)
            | Action::AuditLog
            | Action::Capture
            | Action::Ctl(_)
            | Action::ExpireVar(_)
            | Action::InitCol(_)
            | Action::Log
            | Action::LogData(_)
            | Action::MultiMatch
            | Action::NoAuditLog
            | Action::NoLog
            | Action::SetVar(_)
            | Action::Transform(_) => ActionType::NonDisruptive,
            Action::Chain | Action::Skip(_) | Action::SkipAfter(_) => ActionType::Flow,
            Action::Accuracy(_)
            | Action::Id(_)
            | Action::Maturity(_)
            | Action::Msg(_)
            | Action::Phase(_)
            | Action::Rev(_)
            | Action::Severity(_)
            | Action::Tag(_)
            | Action::Ver(_) => ActionType::MetaData,
            Action::Status(_) => ActionType::Data,
        }
    }

    pub fn is_disruptive(&self) -> bool {
        self.action_type() == ActionType::Disruptive
    }

    /// Expandable strings carried by the action, in source order.
    pub fn strings(&self) -> Vec<&ExpandableString> {
        match self {
            Action::Redirect(s)
            | Action::Append(s)
            | Action::LogData(s)
            | Action::SkipAfter(s)
            | Action::Msg(s)
            | Action::Tag(s) => vec![s],
            Action::SetVar(setvar) => {
                let mut strings = vec![&setvar.collection, &setvar.variable];
                strings.extend(setvar.modifier.as_ref());
                strings
            }
            Action::ExpireVar(expire) => {
                vec![&expire.collection, &expire.variable, &expire.seconds]
            }
            Action::InitCol(initcol) => vec![&initcol.key],
            _ => Vec::new(),
        }
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Rule severity, `0` (emergency) to `7` (debug).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Severity {
    /// Case-insensitive lookup of the severity names.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "EMERGENCY" => Some(Severity::Emergency),
            "ALERT" => Some(Severity::Alert),
            "CRITICAL" => Some(Severity::Critical),
            "ERROR" => Some(Severity::Error),
            "WARNING" => Some(Severity::Warning),
            "NOTICE" => Some(Severity::Notice),
            "INFO" => Some(Severity::Info),
            "DEBUG" => Some(Severity::Debug),
            _ => None,
        }
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Severity::Emergency),
            1 => Some(Severity::Alert),
            2 => Some(Severity::Critical),
            3 => Some(Severity::Error),
            4 => Some(Severity::Warning),
            5 => Some(Severity::Notice),
            6 => Some(Severity::Info),
            7 => Some(Severity::Debug),
            _ => None,
        }
    }

    pub fn value(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Emergency => "EMERGENCY",
            Severity::Alert => "ALERT",
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Notice => "NOTICE",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Collection actions
// =============================================================================

/// The operation performed by `setvar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SetVarOp {
    /// `setvar:tx.a=value`
    Set,
    /// `setvar:tx.a` creates the variable with the value `1`.
    SetToOne,
    /// `setvar:tx.a=+value`
    Add,
    /// `setvar:tx.a=-value`
    Subtract,
    /// `setvar:!tx.a`
    Delete,
}

/// `setvar:[!]collection.variable[=[+|-]modifier]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetVar {
    pub op: SetVarOp,
    pub collection: ExpandableString,
    pub variable: ExpandableString,
    /// Present for `Set`, `Add` and `Subtract`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<ExpandableString>,
}

/// `expirevar:collection.variable=seconds`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpireVar {
    pub collection: ExpandableString,
    pub variable: ExpandableString,
    pub seconds: ExpandableString,
}

/// `initcol:collection=key`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitCol {
    pub collection: String,
    pub key: ExpandableString,
}

// =============================================================================
// ctl
// =============================================================================

/// An inclusive rule id range used by `ctl:ruleRemoveById`; a single id has
/// `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IdRange {
    pub start: u32,
    pub end: u32,
}

impl IdRange {
    pub fn contains(&self, id: u32) -> bool {
        (self.start..=self.end).contains(&id)
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Body parser selected by `ctl:requestBodyProcessor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestBodyProcessor {
    UrlEncoded,
    Multipart,
    Json,
    Xml,
}

impl RequestBodyProcessor {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "URLENCODED" => Some(RequestBodyProcessor::UrlEncoded),
            "MULTIPART" => Some(RequestBodyProcessor::Multipart),
            "JSON" => Some(RequestBodyProcessor::Json),
            "XML" => Some(RequestBodyProcessor::Xml),
            _ => None,
        }
    }
}

/// How `ctl:auditLogParts` changes the configured part list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PartsOp {
    Set,
    Add,
    Remove,
}

/// Per-transaction configuration change made by `ctl`.
///
/// Values that also exist as directives (`ruleEngine`, `auditEngine`,
/// `requestBodyAccess`) share the directive value types.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CtlOption {
    AuditEngine(AuditEngineMode),
    AuditLogParts {
        op: PartsOp,
        parts: Vec<AuditLogPart>,
    },
    ForceRequestBodyVariable(bool),
    RequestBodyAccess(bool),
    RequestBodyProcessor(RequestBodyProcessor),
    RuleEngine(RuleEngineMode),
    RuleRemoveById(IdRange),
    RuleRemoveByTag(String),
    RuleRemoveTargetById {
        ids: IdRange,
        target: VariableSelector,
    },
    RuleRemoveTargetByTag {
        tag: String,
        target: VariableSelector,
    },
}

impl CtlOption {
    pub fn name(&self) -> &'static str {
        match self {
            CtlOption::AuditEngine(_) => "auditEngine",
            CtlOption::AuditLogParts { .. } => "auditLogParts",
            CtlOption::ForceRequestBodyVariable(_) => "forceRequestBodyVariable",
            CtlOption::RequestBodyAccess(_) => "requestBodyAccess",
            CtlOption::RequestBodyProcessor(_) => "requestBodyProcessor",
            CtlOption::RuleEngine(_) => "ruleEngine",
            CtlOption::RuleRemoveById(_) => "ruleRemoveById",
            CtlOption::RuleRemoveByTag(_) => "ruleRemoveByTag",
            CtlOption::RuleRemoveTargetById { .. } => "ruleRemoveTargetById",
            CtlOption::RuleRemoveTargetByTag { .. } => "ruleRemoveTargetByTag",
        }
    }

    pub fn target(&self) -> Option<&VariableSelector> {
        match self {
            CtlOption::RuleRemoveTargetById { target, .. }
            | CtlOption::RuleRemoveTargetByTag { target, .. } => Some(target),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_classification() {
        assert_eq!(Action::Deny.action_type(), ActionType::Disruptive);
        assert_eq!(Action::Chain.action_type(), ActionType::Flow);
        assert_eq!(Action::Id(1).action_type(), ActionType::MetaData);
        assert_eq!(Action::Status(403).action_type(), ActionType::Data);
        assert_eq!(
            Action::Transform(Transform::None).action_type(),
            ActionType::NonDisruptive
        );
        assert!(Action::Block.is_disruptive());
        assert!(!Action::Log.is_disruptive());
    }

    #[test]
    fn severity_values() {
        assert_eq!(Severity::from_str("critical"), Some(Severity::Critical));
        assert_eq!(Severity::Critical.value(), 2);
        assert_eq!(Severity::from_value(7), Some(Severity::Debug));
        assert_eq!(Severity::from_value(8), None);
        assert_eq!(Severity::Warning.to_string(), "WARNING");
    }

    #[test]
    fn id_range() {
        let range = IdRange {
            start: 920100,
            end: 920199,
        };
        assert!(range.contains(920150));
        assert!(!range.contains(920200));
        assert_eq!(range.to_string(), "920100-920199");
    }
}
