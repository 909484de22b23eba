//! Rule operators: the second argument of `SecRule`.
//!
//! Reference: ModSecurity v2 reference manual, "Operators"

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;
use serde::Serialize;

use crate::position::Position;
use crate::value::ExpandableString;

/// The match operator of a rule, e.g. `!@rx ^GET$`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operator {
    pub kind: OperatorKind,
    /// A leading `!` inverts the match result.
    pub negated: bool,
    pub position: Position,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("!")?;
        }
        write!(f, "@{}", self.kind.name())?;
        match &self.kind {
            OperatorKind::Regex(s)
            | OperatorKind::IpMatchFromFile(s)
            | OperatorKind::Rbl(s) => write!(f, " {s}"),
            OperatorKind::Pm(words) | OperatorKind::PmFromFile(words) => {
                write!(f, " {}", words.join(" "))
            }
            OperatorKind::IpMatch(ranges) => {
                let ranges: Vec<String> = ranges.iter().map(ToString::to_string).collect();
                write!(f, " {}", ranges.join(","))
            }
            OperatorKind::ValidateByteRange(ranges) => {
                let ranges: Vec<String> = ranges.iter().map(ToString::to_string).collect();
                write!(f, " {}", ranges.join(","))
            }
            kind => match kind.argument() {
                Some(arg) => write!(f, " {arg}"),
                None => Ok(()),
            },
        }
    }
}

/// Operator families and their parsed arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum OperatorKind {
    /// `@rx`, and the implicit operator when no `@name` is given. The pattern
    /// is kept verbatim and not compiled.
    Regex(String),
    BeginsWith(ExpandableString),
    Contains(ExpandableString),
    ContainsWord(ExpandableString),
    EndsWith(ExpandableString),
    Streq(ExpandableString),
    Within(ExpandableString),
    Eq(ExpandableString),
    Ge(ExpandableString),
    Gt(ExpandableString),
    Le(ExpandableString),
    Lt(ExpandableString),
    /// Whitespace-separated phrases.
    Pm(Vec<String>),
    /// Whitespace-separated phrase files (`@pmFromFile`, `@pmf`).
    PmFromFile(Vec<String>),
    IpMatch(Vec<IpRange>),
    /// `@ipMatchFromFile`, `@ipMatchF`
    IpMatchFromFile(String),
    Rbl(String),
    GeoLookup,
    ValidateByteRange(Vec<ByteRange>),
    ValidateUrlEncoding,
    ValidateUtf8Encoding,
    DetectSqli,
    DetectXss,
    UnconditionalMatch,
    NoMatch,
}

impl OperatorKind {
    /// The operator name as written after `@`.
    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::Regex(_) => "rx",
            OperatorKind::BeginsWith(_) => "beginsWith",
            OperatorKind::Contains(_) => "contains",
            OperatorKind::ContainsWord(_) => "containsWord",
            OperatorKind::EndsWith(_) => "endsWith",
            OperatorKind::Streq(_) => "streq",
            OperatorKind::Within(_) => "within",
            OperatorKind::Eq(_) => "eq",
            OperatorKind::Ge(_) => "ge",
            OperatorKind::Gt(_) => "gt",
            OperatorKind::Le(_) => "le",
            OperatorKind::Lt(_) => "lt",
            OperatorKind::Pm(_) => "pm",
            OperatorKind::PmFromFile(_) => "pmFromFile",
            OperatorKind::IpMatch(_) => "ipMatch",
            OperatorKind::IpMatchFromFile(_) => "ipMatchFromFile",
            OperatorKind::Rbl(_) => "rbl",
            OperatorKind::GeoLookup => "geoLookup",
            OperatorKind::ValidateByteRange(_) => "validateByteRange",
            OperatorKind::ValidateUrlEncoding => "validateUrlEncoding",
            OperatorKind::ValidateUtf8Encoding => "validateUtf8Encoding",
            OperatorKind::DetectSqli => "detectSQLi",
            OperatorKind::DetectXss => "detectXSS",
            OperatorKind::UnconditionalMatch => "unconditionalMatch",
            OperatorKind::NoMatch => "noMatch",
        }
    }

    /// The expandable argument of string and numeric comparison operators.
    pub fn argument(&self) -> Option<&ExpandableString> {
        match self {
            OperatorKind::BeginsWith(s)
            | OperatorKind::Contains(s)
            | OperatorKind::ContainsWord(s)
            | OperatorKind::EndsWith(s)
            | OperatorKind::Streq(s)
            | OperatorKind::Within(s)
            | OperatorKind::Eq(s)
            | OperatorKind::Ge(s)
            | OperatorKind::Gt(s)
            | OperatorKind::Le(s)
            | OperatorKind::Lt(s) => Some(s),
            _ => None,
        }
    }
}

/// An address or network for `@ipMatch`, e.g. `10.0.0.0/8` or `::1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IpRange {
    pub network: IpNet,
}

impl IpRange {
    /// Parse `addr` or `addr/prefix`. Returns `None` for malformed input or
    /// a prefix longer than the address.
    pub fn parse(s: &str) -> Option<Self> {
        let network = match s.parse::<IpNet>() {
            Ok(network) => network,
            Err(_) => IpNet::from(s.parse::<IpAddr>().ok()?),
        };
        Some(IpRange { network })
    }

    pub fn address(&self) -> IpAddr {
        self.network.addr()
    }

    /// Prefix length; 32 or 128 for a single host.
    pub fn prefix(&self) -> u8 {
        self.network.prefix_len()
    }

    pub fn is_host(&self) -> bool {
        self.network.prefix_len() == self.network.max_prefix_len()
    }

    pub fn contains(&self, address: &IpAddr) -> bool {
        self.network.contains(address)
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_host() {
            write!(f, "{}", self.address())
        } else {
            write!(f, "{}", self.network)
        }
    }
}

/// An inclusive byte range for `@validateByteRange`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ByteRange {
    pub start: u8,
    pub end: u8,
}

impl ByteRange {
    /// Parse `N` or `N-M` with `0 <= N <= M <= 255`.
    pub fn parse(s: &str) -> Option<Self> {
        let (start, end) = match s.split_once('-') {
            Some((start, end)) => (start.trim(), end.trim()),
            None => (s.trim(), s.trim()),
        };
        let start: u8 = start.parse().ok()?;
        let end: u8 = end.parse().ok()?;
        (start <= end).then_some(ByteRange { start, end })
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}
