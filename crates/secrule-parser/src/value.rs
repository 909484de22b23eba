use std::fmt;

use serde::Serialize;

// =============================================================================
// ExpandableString — text with %{...} macro references
// =============================================================================
//
// Action arguments such as `msg`, `logdata` and the value side of `setvar` may
// reference run-time variables with `%{COLLECTION.KEY}` or `%{VARIABLE}`. The
// parser records the references in order and never resolves them.

/// A macro reference inside an [`ExpandableString`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Macro {
    /// `TX` in `%{TX.score}`. `None` for single-name macros like
    /// `%{MATCHED_VAR}`.
    pub collection: Option<String>,
    pub variable: String,
}

impl Macro {
    pub fn new(collection: Option<&str>, variable: impl Into<String>) -> Self {
        Macro {
            collection: collection.map(str::to_string),
            variable: variable.into(),
        }
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.collection {
            Some(collection) => write!(f, "%{{{collection}.{}}}", self.variable),
            None => write!(f, "%{{{}}}", self.variable),
        }
    }
}

/// A part of an [`ExpandableString`]: literal text or a macro reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StringPart {
    Literal(String),
    Macro(Macro),
}

impl fmt::Display for StringPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringPart::Literal(text) => f.write_str(text),
            StringPart::Macro(m) => write!(f, "{m}"),
        }
    }
}

/// An ordered sequence of literal and macro parts.
///
/// Adjacent literal text is merged into a single [`StringPart::Literal`], so
/// `'Value is %{TX.score}'` holds exactly two parts. `Display` re-serializes
/// the parts in order, which reproduces the source text up to escapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpandableString {
    pub parts: Vec<StringPart>,
}

impl ExpandableString {
    pub fn new() -> Self {
        ExpandableString::default()
    }

    /// A string with a single literal part (no parts when `text` is empty).
    pub fn literal(text: impl Into<String>) -> Self {
        let mut s = ExpandableString::new();
        s.push_literal(&text.into());
        s
    }

    /// Append literal text, merging with a trailing literal part.
    pub fn push_literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.parts.last_mut() {
            Some(StringPart::Literal(last)) => last.push_str(text),
            _ => self.parts.push(StringPart::Literal(text.to_string())),
        }
    }

    pub fn push_macro(&mut self, m: Macro) {
        self.parts.push(StringPart::Macro(m));
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The text when the string has no macros.
    pub fn as_literal(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [] => Some(""),
            [StringPart::Literal(text)] => Some(text),
            _ => None,
        }
    }

    pub fn has_macros(&self) -> bool {
        self.macros().next().is_some()
    }

    pub fn macros(&self) -> impl Iterator<Item = &Macro> {
        self.parts.iter().filter_map(|p| match p {
            StringPart::Macro(m) => Some(m),
            StringPart::Literal(_) => None,
        })
    }
}

impl fmt::Display for ExpandableString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl From<&str> for ExpandableString {
    fn from(text: &str) -> Self {
        ExpandableString::literal(text)
    }
}
