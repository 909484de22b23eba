use thiserror::Error;

use crate::position::Position;

/// Errors that can occur while tokenizing or parsing SecRule sources.
#[derive(Debug, Error)]
pub enum SecRuleError {
    /// Malformed character sequence (bad line start, unterminated escape,
    /// unterminated quoted argument, ...).
    #[error("{position}: lex error: {message}")]
    Lex { message: String, position: Position },

    /// Structural violation at token level.
    #[error("{position}: syntax error: {message}")]
    Syntax { message: String, position: Position },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SecRuleError {
    pub(crate) fn lex(message: impl Into<String>, position: Position) -> Self {
        SecRuleError::Lex {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn syntax(message: impl Into<String>, position: Position) -> Self {
        SecRuleError::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Source position of a lex or syntax error.
    pub fn position(&self) -> Option<&Position> {
        match self {
            SecRuleError::Lex { position, .. } | SecRuleError::Syntax { position, .. } => {
                Some(position)
            }
            SecRuleError::Io(_) => None,
        }
    }

    /// The error message without its position prefix.
    pub fn message(&self) -> String {
        match self {
            SecRuleError::Lex { message, .. } | SecRuleError::Syntax { message, .. } => {
                message.clone()
            }
            SecRuleError::Io(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SecRuleError>;
