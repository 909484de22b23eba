//! AST types for SecRule configuration files: documents, directives,
//! variables, operators, actions and transformations.
//!
//! Every node type derives `Serialize`, so a parsed [`Document`] can be dumped
//! as JSON. Parent links are not stored in the owned tree; use
//! `Document::tree` (see [`crate::tree::Tree`]) for a navigable view.
//!
//! Reference: ModSecurity v2 reference manual, "Configuration Directives"

mod action;
mod operator;
mod transform;
mod variable;

use std::fmt;

use serde::Serialize;

use crate::position::{Position, Positioned};

pub use action::{
    Action, ActionType, CtlOption, ExpireVar, IdRange, InitCol, PartsOp, RequestBodyProcessor,
    SetVar, SetVarOp, Severity,
};
pub use operator::{ByteRange, IpRange, Operator, OperatorKind};
pub use transform::Transform;
pub use variable::{
    CollectionSelector, SelectionOperation, Variable, VariableList, VariableSelector,
};

// =============================================================================
// Document
// =============================================================================

/// A parsed configuration file (or a batch of files).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    /// Source label, usually the file path.
    pub name: String,
    pub items: Vec<DocumentItem>,
}

/// A top-level entry of a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DocumentItem {
    Comment(Comment),
    Directive(Directive),
}

/// A `#` comment line. `text` excludes the `#`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub text: String,
    pub position: Position,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Document {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn add_child(&mut self, item: DocumentItem) {
        self.items.push(item);
    }

    /// Directives in source order, comments skipped.
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.items.iter().filter_map(|item| match item {
            DocumentItem::Directive(d) => Some(d),
            DocumentItem::Comment(_) => None,
        })
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.items.iter().filter_map(|item| match item {
            DocumentItem::Comment(c) => Some(c),
            DocumentItem::Directive(_) => None,
        })
    }

    pub fn rules(&self) -> impl Iterator<Item = &SecRule> {
        self.directives().filter_map(Directive::as_rule)
    }

    /// Find a rule (or `SecAction`) by its `id` action.
    pub fn find_by_id(&self, id: u32) -> Option<&Directive> {
        self.directives().find(|d| action_id(d.actions()) == Some(id))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Directives
// =============================================================================

/// A configuration directive. Every variant records the position of its
/// keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Directive {
    SecRule(SecRule),
    SecAction(SecAction),
    /// Actions inherited by subsequent rules of the same phase.
    SecDefaultAction(SecAction),
    SecMarker {
        name: String,
        position: Position,
    },
    SecComponentSignature {
        signature: String,
        position: Position,
    },
    SecRuleEngine {
        mode: RuleEngineMode,
        position: Position,
    },
    SecAuditEngine {
        mode: AuditEngineMode,
        position: Position,
    },
    SecAuditLogParts {
        parts: Vec<AuditLogPart>,
        position: Position,
    },
    SecRequestBodyAccess {
        enabled: bool,
        position: Position,
    },
    SecResponseBodyAccess {
        enabled: bool,
        position: Position,
    },
}

impl Directive {
    /// The directive keyword in canonical spelling.
    pub fn keyword(&self) -> &'static str {
        match self {
            Directive::SecRule(_) => "SecRule",
            Directive::SecAction(_) => "SecAction",
            Directive::SecDefaultAction(_) => "SecDefaultAction",
            Directive::SecMarker { .. } => "SecMarker",
            Directive::SecComponentSignature { .. } => "SecComponentSignature",
            Directive::SecRuleEngine { .. } => "SecRuleEngine",
            Directive::SecAuditEngine { .. } => "SecAuditEngine",
            Directive::SecAuditLogParts { .. } => "SecAuditLogParts",
            Directive::SecRequestBodyAccess { .. } => "SecRequestBodyAccess",
            Directive::SecResponseBodyAccess { .. } => "SecResponseBodyAccess",
        }
    }

    pub fn position(&self) -> &Position {
        match self {
            Directive::SecRule(rule) => &rule.position,
            Directive::SecAction(action) | Directive::SecDefaultAction(action) => &action.position,
            Directive::SecMarker { position, .. }
            | Directive::SecComponentSignature { position, .. }
            | Directive::SecRuleEngine { position, .. }
            | Directive::SecAuditEngine { position, .. }
            | Directive::SecAuditLogParts { position, .. }
            | Directive::SecRequestBodyAccess { position, .. }
            | Directive::SecResponseBodyAccess { position, .. } => position,
        }
    }

    /// Actions of `SecRule`, `SecAction` and `SecDefaultAction`; empty for
    /// every other directive.
    pub fn actions(&self) -> &[Positioned<Action>] {
        match self {
            Directive::SecRule(rule) => &rule.actions,
            Directive::SecAction(action) | Directive::SecDefaultAction(action) => &action.actions,
            _ => &[],
        }
    }

    pub fn as_rule(&self) -> Option<&SecRule> {
        match self {
            Directive::SecRule(rule) => Some(rule),
            _ => None,
        }
    }
}

/// `SecRule VARIABLES OPERATOR [ACTIONS]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecRule {
    pub variables: VariableList,
    pub operator: Operator,
    pub actions: Vec<Positioned<Action>>,
    pub position: Position,
}

impl SecRule {
    pub fn new(variables: VariableList, operator: Operator, position: Position) -> Self {
        SecRule {
            variables,
            operator,
            actions: Vec::new(),
            position,
        }
    }

    pub fn add_action(&mut self, action: Positioned<Action>) {
        self.actions.push(action);
    }

    pub fn id(&self) -> Option<u32> {
        action_id(&self.actions)
    }

    pub fn phase(&self) -> Option<u8> {
        self.actions.iter().find_map(|a| match a.node {
            Action::Phase(phase) => Some(phase),
            _ => None,
        })
    }

    pub fn severity(&self) -> Option<Severity> {
        self.actions.iter().find_map(|a| match a.node {
            Action::Severity(severity) => Some(severity),
            _ => None,
        })
    }

    /// Whether the next rule is part of this rule's chain.
    pub fn is_chained(&self) -> bool {
        self.actions.iter().any(|a| a.node == Action::Chain)
    }

    /// `t:` transformations in source order, `t:none` included. See
    /// [`Transform::None`] for how consumers treat the reset.
    pub fn transforms(&self) -> impl Iterator<Item = Transform> + '_ {
        self.actions.iter().filter_map(|a| match a.node {
            Action::Transform(t) => Some(t),
            _ => None,
        })
    }

    pub fn disruptive_action(&self) -> Option<&Action> {
        self.actions
            .iter()
            .map(|a| &a.node)
            .find(|a| a.is_disruptive())
    }
}

/// `SecAction ACTIONS` (also used for `SecDefaultAction`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecAction {
    pub actions: Vec<Positioned<Action>>,
    pub position: Position,
}

impl SecAction {
    pub fn new(position: Position) -> Self {
        SecAction {
            actions: Vec::new(),
            position,
        }
    }

    pub fn add_action(&mut self, action: Positioned<Action>) {
        self.actions.push(action);
    }

    pub fn id(&self) -> Option<u32> {
        action_id(&self.actions)
    }
}

fn action_id(actions: &[Positioned<Action>]) -> Option<u32> {
    actions.iter().find_map(|a| match a.node {
        Action::Id(id) => Some(id),
        _ => None,
    })
}

// =============================================================================
// Directive values
// =============================================================================

/// `SecRuleEngine` / `ctl:ruleEngine`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleEngineMode {
    On,
    Off,
    DetectionOnly,
}

impl RuleEngineMode {
    /// Case-insensitive; any other value is rejected.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Some(RuleEngineMode::On),
            "off" => Some(RuleEngineMode::Off),
            "detectiononly" => Some(RuleEngineMode::DetectionOnly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleEngineMode::On => "On",
            RuleEngineMode::Off => "Off",
            RuleEngineMode::DetectionOnly => "DetectionOnly",
        }
    }
}

impl fmt::Display for RuleEngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `SecAuditEngine` / `ctl:auditEngine`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AuditEngineMode {
    On,
    Off,
    RelevantOnly,
}

impl AuditEngineMode {
    /// Case-insensitive; any other value is rejected.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Some(AuditEngineMode::On),
            "off" => Some(AuditEngineMode::Off),
            "relevantonly" => Some(AuditEngineMode::RelevantOnly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEngineMode::On => "On",
            AuditEngineMode::Off => "Off",
            AuditEngineMode::RelevantOnly => "RelevantOnly",
        }
    }
}

impl fmt::Display for AuditEngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A section of the audit log, selected by letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AuditLogPart {
    /// A: audit log header (mandatory)
    Header,
    /// B: request headers
    RequestHeaders,
    /// C: request body
    RequestBody,
    /// D: reserved
    IntendedResponseHeaders,
    /// E: intermediary response body
    IntermediaryResponseBody,
    /// F: final response headers
    ResponseHeaders,
    /// G: reserved
    ActualResponseBody,
    /// H: audit log trailer
    Trailer,
    /// I: compact request body alternative to C
    ReducedMultipartRequestBody,
    /// J: uploaded files information
    MultipartFilesInformation,
    /// K: every rule that matched
    MatchedRules,
    /// Z: final boundary (mandatory)
    EndMarker,
}

impl AuditLogPart {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(AuditLogPart::Header),
            'B' => Some(AuditLogPart::RequestHeaders),
            'C' => Some(AuditLogPart::RequestBody),
            'D' => Some(AuditLogPart::IntendedResponseHeaders),
            'E' => Some(AuditLogPart::IntermediaryResponseBody),
            'F' => Some(AuditLogPart::ResponseHeaders),
            'G' => Some(AuditLogPart::ActualResponseBody),
            'H' => Some(AuditLogPart::Trailer),
            'I' => Some(AuditLogPart::ReducedMultipartRequestBody),
            'J' => Some(AuditLogPart::MultipartFilesInformation),
            'K' => Some(AuditLogPart::MatchedRules),
            'Z' => Some(AuditLogPart::EndMarker),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            AuditLogPart::Header => 'A',
            AuditLogPart::RequestHeaders => 'B',
            AuditLogPart::RequestBody => 'C',
            AuditLogPart::IntendedResponseHeaders => 'D',
            AuditLogPart::IntermediaryResponseBody => 'E',
            AuditLogPart::ResponseHeaders => 'F',
            AuditLogPart::ActualResponseBody => 'G',
            AuditLogPart::Trailer => 'H',
            AuditLogPart::ReducedMultipartRequestBody => 'I',
            AuditLogPart::MultipartFilesInformation => 'J',
            AuditLogPart::MatchedRules => 'K',
            AuditLogPart::EndMarker => 'Z',
        }
    }
}
