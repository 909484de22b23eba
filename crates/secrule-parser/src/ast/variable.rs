//! Rule targets: the first argument of `SecRule`.
//!
//! Reference: ModSecurity v2 reference manual, "Variables"

use std::fmt;

use serde::Serialize;

use crate::position::Position;

/// How a selector contributes to the target list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum SelectionOperation {
    /// Plain selector: inspect the variable.
    #[default]
    Add,
    /// `!VAR`: exclude the variable (or collection member) from the list.
    Remove,
    /// `&VAR`: inspect the number of members instead of their values.
    Count,
}

/// Narrows a collection to the members whose key matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CollectionSelector {
    /// `ARGS:id`
    Key(String),
    /// `ARGS:/^id_/`
    Regex(String),
}

impl fmt::Display for CollectionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionSelector::Key(key) => f.write_str(key),
            CollectionSelector::Regex(re) => write!(f, "/{re}/"),
        }
    }
}

/// One `|`-separated entry of a variable list, e.g. `!REQUEST_HEADERS:Referer`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSelector {
    pub operation: SelectionOperation,
    pub variable: Variable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<CollectionSelector>,
    pub position: Position,
}

impl VariableSelector {
    pub fn new(variable: Variable, position: Position) -> Self {
        VariableSelector {
            operation: SelectionOperation::Add,
            variable,
            selector: None,
            position,
        }
    }
}

impl fmt::Display for VariableSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            SelectionOperation::Add => {}
            SelectionOperation::Remove => f.write_str("!")?,
            SelectionOperation::Count => f.write_str("&")?,
        }
        f.write_str(self.variable.name())?;
        if let Some(selector) = &self.selector {
            write!(f, ":{selector}")?;
        }
        Ok(())
    }
}

/// The ordered target list of a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariableList {
    pub selectors: Vec<VariableSelector>,
}

impl VariableList {
    pub fn add_selector(&mut self, selector: VariableSelector) {
        self.selectors.push(selector);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariableSelector> {
        self.selectors.iter()
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl fmt::Display for VariableList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Variables
// =============================================================================

/// Built-in variables and collections.
///
/// Names are matched case-insensitively. Any identifier that is not a
/// built-in becomes [`Variable::Collection`], a user collection created at
/// run time with `initcol`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Variable {
    Args,
    ArgsCombinedSize,
    ArgsGet,
    ArgsGetNames,
    ArgsNames,
    ArgsPost,
    ArgsPostNames,
    AuthType,
    Duration,
    Env,
    Files,
    FilesCombinedSize,
    FilesNames,
    FilesSizes,
    FilesTmpnames,
    FullRequest,
    FullRequestLength,
    Geo,
    Global,
    HighestSeverity,
    InboundDataError,
    Ip,
    MatchedVar,
    MatchedVarName,
    MatchedVars,
    MatchedVarsNames,
    MultipartBoundaryQuoted,
    MultipartStrictError,
    MultipartUnmatchedBoundary,
    OutboundDataError,
    PathInfo,
    QueryString,
    RemoteAddr,
    RemoteHost,
    RemotePort,
    RemoteUser,
    ReqbodyError,
    ReqbodyErrorMsg,
    ReqbodyProcessor,
    RequestBasename,
    RequestBody,
    RequestBodyLength,
    RequestCookies,
    RequestCookiesNames,
    RequestFilename,
    RequestHeaders,
    RequestHeadersNames,
    RequestLine,
    RequestMethod,
    RequestProtocol,
    RequestUri,
    RequestUriRaw,
    Resource,
    ResponseBody,
    ResponseContentLength,
    ResponseContentType,
    ResponseHeaders,
    ResponseHeadersNames,
    ResponseProtocol,
    ResponseStatus,
    Rule,
    ServerAddr,
    ServerName,
    ServerPort,
    Session,
    Sessionid,
    StatusLine,
    Time,
    TimeEpoch,
    Tx,
    UniqueId,
    UrlencodedError,
    User,
    Userid,
    Webappid,
    Xml,
    /// A user-defined collection.
    #[serde(untagged)]
    Collection(String),
}

impl Variable {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "ARGS" => Variable::Args,
            "ARGS_COMBINED_SIZE" => Variable::ArgsCombinedSize,
            "ARGS_GET" => Variable::ArgsGet,
            "ARGS_GET_NAMES" => Variable::ArgsGetNames,
            "ARGS_NAMES" => Variable::ArgsNames,
            "ARGS_POST" => Variable::ArgsPost,
            "ARGS_POST_NAMES" => Variable::ArgsPostNames,
            "AUTH_TYPE" => Variable::AuthType,
            "DURATION" => Variable::Duration,
            "ENV" => Variable::Env,
            "FILES" => Variable::Files,
            "FILES_COMBINED_SIZE" => Variable::FilesCombinedSize,
            "FILES_NAMES" => Variable::FilesNames,
            "FILES_SIZES" => Variable::FilesSizes,
            "FILES_TMPNAMES" => Variable::FilesTmpnames,
            "FULL_REQUEST" => Variable::FullRequest,
            "FULL_REQUEST_LENGTH" => Variable::FullRequestLength,
            "GEO" => Variable::Geo,
            "GLOBAL" => Variable::Global,
            "HIGHEST_SEVERITY" => Variable::HighestSeverity,
            "INBOUND_DATA_ERROR" => Variable::InboundDataError,
            "IP" => Variable::Ip,
            "MATCHED_VAR" => Variable::MatchedVar,
            "MATCHED_VAR_NAME" => Variable::MatchedVarName,
            "MATCHED_VARS" => Variable::MatchedVars,
            "MATCHED_VARS_NAMES" => Variable::MatchedVarsNames,
            "MULTIPART_BOUNDARY_QUOTED" => Variable::MultipartBoundaryQuoted,
            "MULTIPART_STRICT_ERROR" => Variable::MultipartStrictError,
            "MULTIPART_UNMATCHED_BOUNDARY" => Variable::MultipartUnmatchedBoundary,
            "OUTBOUND_DATA_ERROR" => Variable::OutboundDataError,
            "PATH_INFO" => Variable::PathInfo,
            "QUERY_STRING" => Variable::QueryString,
            "REMOTE_ADDR" => Variable::RemoteAddr,
            "REMOTE_HOST" => Variable::RemoteHost,
            "REMOTE_PORT" => Variable::RemotePort,
            "REMOTE_USER" => Variable::RemoteUser,
            "REQBODY_ERROR" => Variable::ReqbodyError,
            "REQBODY_ERROR_MSG" => Variable::ReqbodyErrorMsg,
            "REQBODY_PROCESSOR" => Variable::ReqbodyProcessor,
            "REQUEST_BASENAME" => Variable::RequestBasename,
            "REQUEST_BODY" => Variable::RequestBody,
            "REQUEST_BODY_LENGTH" => Variable::RequestBodyLength,
            "REQUEST_COOKIES" => Variable::RequestCookies,
            "REQUEST_COOKIES_NAMES" => Variable::RequestCookiesNames,
            "REQUEST_FILENAME" => Variable::RequestFilename,
            "REQUEST_HEADERS" => Variable::RequestHeaders,
            "REQUEST_HEADERS_NAMES" => Variable::RequestHeadersNames,
            "REQUEST_LINE" => Variable::RequestLine,
            "REQUEST_METHOD" => Variable::RequestMethod,
            "REQUEST_PROTOCOL" => Variable::RequestProtocol,
            "REQUEST_URI" => Variable::RequestUri,
            "REQUEST_URI_RAW" => Variable::RequestUriRaw,
            "RESOURCE" => Variable::Resource,
            "RESPONSE_BODY" => Variable::ResponseBody,
            "RESPONSE_CONTENT_LENGTH" => Variable::ResponseContentLength,
            "RESPONSE_CONTENT_TYPE" => Variable::ResponseContentType,
            "RESPONSE_HEADERS" => Variable::ResponseHeaders,
            "RESPONSE_HEADERS_NAMES" => Variable::ResponseHeadersNames,
            "RESPONSE_PROTOCOL" => Variable::ResponseProtocol,
            "RESPONSE_STATUS" => Variable::ResponseStatus,
            "RULE" => Variable::Rule,
            "SERVER_ADDR" => Variable::ServerAddr,
            "SERVER_NAME" => Variable::ServerName,
            "SERVER_PORT" => Variable::ServerPort,
            "SESSION" => Variable::Session,
            "SESSIONID" => Variable::Sessionid,
            "STATUS_LINE" => Variable::StatusLine,
            "TIME" => Variable::Time,
            "TIME_EPOCH" => Variable::TimeEpoch,
            "TX" => Variable::Tx,
            "UNIQUE_ID" => Variable::UniqueId,
            "URLENCODED_ERROR" => Variable::UrlencodedError,
            "USER" => Variable::User,
            "USERID" => Variable::Userid,
            "WEBAPPID" => Variable::Webappid,
            "XML" => Variable::Xml,
            _ => Variable::Collection(name.to_string()),
        }
    }

    /// Canonical (upper-case) name. User collections keep their source
    /// spelling.
    pub fn name(&self) -> &str {
        match self {
            Variable::Args => "ARGS",
            Variable::ArgsCombinedSize => "ARGS_COMBINED_SIZE",
            Variable::ArgsGet => "ARGS_GET",
            Variable::ArgsGetNames => "ARGS_GET_NAMES",
            Variable::ArgsNames => "ARGS_NAMES",
            Variable::ArgsPost => "ARGS_POST",
            Variable::ArgsPostNames => "ARGS_POST_NAMES",
            Variable::AuthType => "AUTH_TYPE",
            Variable::Duration => "DURATION",
            Variable::Env => "ENV",
            Variable::Files => "FILES",
            Variable::FilesCombinedSize => "FILES_COMBINED_SIZE",
            Variable::FilesNames => "FILES_NAMES",
            Variable::FilesSizes => "FILES_SIZES",
            Variable::FilesTmpnames => "FILES_TMPNAMES",
            Variable::FullRequest => "FULL_REQUEST",
            Variable::FullRequestLength => "FULL_REQUEST_LENGTH",
            Variable::Geo => "GEO",
            Variable::Global => "GLOBAL",
            Variable::HighestSeverity => "HIGHEST_SEVERITY",
            Variable::InboundDataError => "INBOUND_DATA_ERROR",
            Variable::Ip => "IP",
            Variable::MatchedVar => "MATCHED_VAR",
            Variable::MatchedVarName => "MATCHED_VAR_NAME",
            Variable::MatchedVars => "MATCHED_VARS",
            Variable::MatchedVarsNames => "MATCHED_VARS_NAMES",
            Variable::MultipartBoundaryQuoted => "MULTIPART_BOUNDARY_QUOTED",
            Variable::MultipartStrictError => "MULTIPART_STRICT_ERROR",
            Variable::MultipartUnmatchedBoundary => "MULTIPART_UNMATCHED_BOUNDARY",
            Variable::OutboundDataError => "OUTBOUND_DATA_ERROR",
            Variable::PathInfo => "PATH_INFO",
            Variable::QueryString => "QUERY_STRING",
            Variable::RemoteAddr => "REMOTE_ADDR",
            Variable::RemoteHost => "REMOTE_HOST",
            Variable::RemotePort => "REMOTE_PORT",
            Variable::RemoteUser => "REMOTE_USER",
            Variable::ReqbodyError => "REQBODY_ERROR",
            Variable::ReqbodyErrorMsg => "REQBODY_ERROR_MSG",
            Variable::ReqbodyProcessor => "REQBODY_PROCESSOR",
            Variable::RequestBasename => "REQUEST_BASENAME",
            Variable::RequestBody => "REQUEST_BODY",
            Variable::RequestBodyLength => "REQUEST_BODY_LENGTH",
            Variable::RequestCookies => "REQUEST_COOKIES",
            Variable::RequestCookiesNames => "REQUEST_COOKIES_NAMES",
            Variable::RequestFilename => "REQUEST_FILENAME",
            Variable::RequestHeaders => "REQUEST_HEADERS",
            Variable::RequestHeadersNames => "REQUEST_HEADERS_NAMES",
            Variable::RequestLine => "REQUEST_LINE",
            Variable::RequestMethod => "REQUEST_METHOD",
            Variable::RequestProtocol => "REQUEST_PROTOCOL",
            Variable::RequestUri => "REQUEST_URI",
            Variable::RequestUriRaw => "REQUEST_URI_RAW",
            Variable::Resource => "RESOURCE",
            Variable::ResponseBody => "RESPONSE_BODY",
            Variable::ResponseContentLength => "RESPONSE_CONTENT_LENGTH",
            Variable::ResponseContentType => "RESPONSE_CONTENT_TYPE",
            Variable::ResponseHeaders => "RESPONSE_HEADERS",
            Variable::ResponseHeadersNames => "RESPONSE_HEADERS_NAMES",
            Variable::ResponseProtocol => "RESPONSE_PROTOCOL",
            Variable::ResponseStatus => "RESPONSE_STATUS",
            Variable::Rule => "RULE",
            Variable::ServerAddr => "SERVER_ADDR",
            Variable::ServerName => "SERVER_NAME",
            Variable::ServerPort => "SERVER_PORT",
            Variable::Session => "SESSION",
            Variable::Sessionid => "SESSIONID",
            Variable::StatusLine => "STATUS_LINE",
            Variable::Time => "TIME",
            Variable::TimeEpoch => "TIME_EPOCH",
            Variable::Tx => "TX",
            Variable::UniqueId => "UNIQUE_ID",
            Variable::UrlencodedError => "URLENCODED_ERROR",
            Variable::User => "USER",
            Variable::Userid => "USERID",
            Variable::Webappid => "WEBAPPID",
            Variable::Xml => "XML",
            Variable::Collection(name) => name,
        }
    }

    /// Whether the variable holds key/value members and therefore accepts a
    /// `:key` or `:/regex/` selector.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Variable::Args
                | Variable::ArgsGet
                | Variable::ArgsGetNames
                | Variable::ArgsNames
                | Variable::ArgsPost
                | Variable::ArgsPostNames
                | Variable::Env
                | Variable::Files
                | Variable::FilesNames
                | Variable::FilesSizes
                | Variable::FilesTmpnames
                | Variable::Geo
                | Variable::Global
                | Variable::Ip
                | Variable::MatchedVars
                | Variable::MatchedVarsNames
                | Variable::RequestCookies
                | Variable::RequestCookiesNames
                | Variable::RequestHeaders
                | Variable::RequestHeadersNames
                | Variable::Resource
                | Variable::ResponseHeaders
                | Variable::ResponseHeadersNames
                | Variable::Rule
                | Variable::Session
                | Variable::Tx
                | Variable::User
                | Variable::Xml
                | Variable::Collection(_)
        )
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
