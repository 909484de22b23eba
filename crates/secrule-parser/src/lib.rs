//! # secrule-parser
//!
//! A front end for ModSecurity-style `SecRule` configuration files.
//!
//! This crate turns WAF configuration text into a strongly-typed AST, handling:
//!
//! - **Directives**: `SecRule`, `SecAction`, `SecDefaultAction`, `SecMarker`,
//!   `SecComponentSignature`, `SecRuleEngine`, `SecAuditEngine`,
//!   `SecAuditLogParts`, `SecRequestBodyAccess`, `SecResponseBodyAccess`
//! - **Variables**: built-in variables and collections, `!` exclusion, `&` count,
//!   key and `/regex/` member selectors
//! - **Operators**: `@rx`, string and numeric comparisons, `@pm`, `@ipMatch`,
//!   `@validateByteRange`, detectors, with `!` negation
//! - **Actions**: disruptive, flow, metadata and data actions, `setvar`,
//!   `expirevar`, `initcol`, `ctl` and `t:` transformations
//! - **Macros**: `%{TX.score}` expansion points inside strings, kept unresolved
//! - **Positions**: every directive, action, selector and error carries
//!   `file:line:column`
//!
//! ## Architecture
//!
//! - **Lexer** ([`lexer`]): a state machine yielding tokens one at a time
//! - **Parser** ([`parser`]): recursive descent over token windows, fail-fast
//! - **Tree view** ([`tree`]): parent-aware navigation over a parsed document
//!
//! ## Quick Start
//!
//! ```rust
//! use secrule_parser::{Action, parse};
//!
//! let conf = r#"
//! SecRule REQUEST_HEADERS:User-Agent "@pm sqlmap nikto" \
//!     "id:913100,phase:1,t:none,t:lowercase,block,msg:'Scanner %{MATCHED_VAR}'"
//! "#;
//!
//! let document = parse("scanners.conf", conf).unwrap();
//! let rule = document.rules().next().unwrap();
//! assert_eq!(rule.id(), Some(913100));
//! assert_eq!(rule.disruptive_action(), Some(&Action::Block));
//! assert_eq!(rule.transforms().count(), 2);
//! ```
//!
//! ## Errors
//!
//! ```rust
//! use secrule_parser::parse;
//!
//! let err = parse("bad.conf", r#"SecRule ARGS "@rx foo" "id:abc""#).unwrap_err();
//! assert_eq!(err.to_string(), "bad.conf:1:28: syntax error: id requires a numeral, found \"abc\"");
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod tree;
pub mod value;

// Re-export the most commonly used types and functions at crate root
pub use ast::{
    Action, ActionType, AuditEngineMode, AuditLogPart, ByteRange, CollectionSelector, Comment,
    CtlOption, Directive, Document, DocumentItem, ExpireVar, IdRange, InitCol, IpRange, Operator,
    OperatorKind, PartsOp, RequestBodyProcessor, RuleEngineMode, SecAction, SecRule,
    SelectionOperation, SetVar, SetVarOp, Severity, Transform, Variable, VariableList,
    VariableSelector,
};
pub use error::{Result, SecRuleError};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::{conf_files, parse, parse_directory, parse_file, parse_partial};
pub use position::{Position, Positioned};
pub use tree::{Node, NodeId, NodeRef, Tree};
pub use value::{ExpandableString, Macro, StringPart};
