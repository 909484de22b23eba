//! Transformation functions named by the `t:` action.
//!
//! Reference: ModSecurity v2 reference manual, "Transformation functions"

use std::fmt;

use serde::Serialize;

/// A stateless transformation tag.
///
/// Transforms are recorded in source order and never applied by the parser.
/// [`Transform::None`] is a pipeline reset: a consumer building the effective
/// transformation chain of a rule must drop every transform that precedes it
/// (including those inherited from `SecDefaultAction`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Transform {
    Base64Decode,
    Base64DecodeExt,
    Base64Encode,
    CmdLine,
    CompressWhitespace,
    CssDecode,
    EscapeSeqDecode,
    HexDecode,
    HexEncode,
    HtmlEntityDecode,
    JsDecode,
    Length,
    Lowercase,
    Md5,
    None,
    NormalizePath,
    NormalizePathWin,
    RemoveComments,
    RemoveCommentsChar,
    RemoveNulls,
    RemoveWhitespace,
    ReplaceComments,
    ReplaceNulls,
    Sha1,
    SqlHexDecode,
    Trim,
    TrimLeft,
    TrimRight,
    Uppercase,
    UrlDecode,
    UrlDecodeUni,
    UrlEncode,
    #[serde(rename = "utf8toUnicode")]
    Utf8ToUnicode,
}

impl Transform {
    /// Case-insensitive lookup; accepts the British `normalise*` spellings.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "base64decode" => Some(Transform::Base64Decode),
            "base64decodeext" => Some(Transform::Base64DecodeExt),
            "base64encode" => Some(Transform::Base64Encode),
            "cmdline" => Some(Transform::CmdLine),
            "compresswhitespace" => Some(Transform::CompressWhitespace),
            "cssdecode" => Some(Transform::CssDecode),
            "escapeseqdecode" => Some(Transform::EscapeSeqDecode),
            "hexdecode" => Some(Transform::HexDecode),
            "hexencode" => Some(Transform::HexEncode),
            "htmlentitydecode" => Some(Transform::HtmlEntityDecode),
            "jsdecode" => Some(Transform::JsDecode),
            "length" => Some(Transform::Length),
            "lowercase" => Some(Transform::Lowercase),
            "md5" => Some(Transform::Md5),
            "none" => Some(Transform::None),
            "normalizepath" | "normalisepath" => Some(Transform::NormalizePath),
            "normalizepathwin" | "normalisepathwin" => Some(Transform::NormalizePathWin),
            "removecomments" => Some(Transform::RemoveComments),
            "removecommentschar" => Some(Transform::RemoveCommentsChar),
            "removenulls" => Some(Transform::RemoveNulls),
            "removewhitespace" => Some(Transform::RemoveWhitespace),
            "replacecomments" => Some(Transform::ReplaceComments),
            "replacenulls" => Some(Transform::ReplaceNulls),
            "sha1" => Some(Transform::Sha1),
            "sqlhexdecode" => Some(Transform::SqlHexDecode),
            "trim" => Some(Transform::Trim),
            "trimleft" => Some(Transform::TrimLeft),
            "trimright" => Some(Transform::TrimRight),
            "uppercase" => Some(Transform::Uppercase),
            "urldecode" => Some(Transform::UrlDecode),
            "urldecodeuni" => Some(Transform::UrlDecodeUni),
            "urlencode" => Some(Transform::UrlEncode),
            "utf8tounicode" => Some(Transform::Utf8ToUnicode),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transform::Base64Decode => "base64Decode",
            Transform::Base64DecodeExt => "base64DecodeExt",
            Transform::Base64Encode => "base64Encode",
            Transform::CmdLine => "cmdLine",
            Transform::CompressWhitespace => "compressWhitespace",
            Transform::CssDecode => "cssDecode",
            Transform::EscapeSeqDecode => "escapeSeqDecode",
            Transform::HexDecode => "hexDecode",
            Transform::HexEncode => "hexEncode",
            Transform::HtmlEntityDecode => "htmlEntityDecode",
            Transform::JsDecode => "jsDecode",
            Transform::Length => "length",
            Transform::Lowercase => "lowercase",
            Transform::Md5 => "md5",
            Transform::None => "none",
            Transform::NormalizePath => "normalizePath",
            Transform::NormalizePathWin => "normalizePathWin",
            Transform::RemoveComments => "removeComments",
            Transform::RemoveCommentsChar => "removeCommentsChar",
            Transform::RemoveNulls => "removeNulls",
            Transform::RemoveWhitespace => "removeWhitespace",
            Transform::ReplaceComments => "replaceComments",
            Transform::ReplaceNulls => "replaceNulls",
            Transform::Sha1 => "sha1",
            Transform::SqlHexDecode => "sqlHexDecode",
            Transform::Trim => "trim",
            Transform::TrimLeft => "trimLeft",
            Transform::TrimRight => "trimRight",
            Transform::Uppercase => "uppercase",
            Transform::UrlDecode => "urlDecode",
            Transform::UrlDecodeUni => "urlDecodeUni",
            Transform::UrlEncode => "urlEncode",
            Transform::Utf8ToUnicode => "utf8toUnicode",
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
