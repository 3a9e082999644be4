//! The `MediaType` value type and quality-value parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Wildcard used for both the type and the subtype.
pub const WILDCARD: &str = "*";
/// Client quality parameter name.
pub const QUALITY_PARAMETER: &str = "q";
/// Server quality-of-source parameter name.
pub const QUALITY_SOURCE_PARAMETER: &str = "qs";
/// Quality scale maximum (`q=1`).
pub const DEFAULT_QUALITY: u16 = 1000;
/// Quality scale minimum (`q=0`, "not acceptable").
pub const MINIMUM_QUALITY: u16 = 0;

/// Errors raised while parsing media types, quality values and header lists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaTypeParseError {
    #[error("empty media type")]
    Empty,
    #[error("media type '{0}' is missing a '/' separator")]
    MissingSubtype(String),
    #[error("invalid token '{token}' in media type '{input}'")]
    InvalidToken { input: String, token: String },
    #[error("wildcard type with concrete subtype is not allowed: '{0}'")]
    WildcardTypeWithSubtype(String),
    #[error("invalid parameter '{parameter}' in '{input}'")]
    InvalidParameter { input: String, parameter: String },
    #[error("invalid quality value '{0}'")]
    InvalidQuality(String),
}

/// An immutable `type/subtype;param=value` value.
///
/// Type, subtype and parameter names are stored lower-case; parameter values
/// keep their case. Parameters keep their declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    main_type: String,
    subtype: String,
    parameters: Vec<(String, String)>,
}

impl MediaType {
    /// Build a media type without parameters.
    pub fn new(main_type: &str, subtype: &str) -> Self {
        Self {
            main_type: main_type.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters: Vec::new(),
        }
    }

    /// `*/*`
    pub fn wildcard() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        self.parameters.retain(|(n, _)| *n != name);
        self.parameters.push((name, value.to_string()));
        self
    }

    pub fn main_type(&self) -> &str {
        &self.main_type
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_wildcard_type(&self) -> bool {
        self.main_type == WILDCARD
    }

    pub fn is_wildcard_subtype(&self) -> bool {
        self.subtype == WILDCARD
    }

    /// Neither the type nor the subtype is a wildcard.
    pub fn is_concrete(&self) -> bool {
        !self.is_wildcard_type() && !self.is_wildcard_subtype()
    }

    /// JAX-RS compatibility: a wildcard type on either side is compatible,
    /// otherwise the types must match and the subtypes must match or one of
    /// them must be a wildcard. Parameters are ignored.
    pub fn is_compatible(&self, other: &MediaType) -> bool {
        if self.is_wildcard_type() || other.is_wildcard_type() {
            return true;
        }
        self.main_type == other.main_type
            && (self.subtype == other.subtype
                || self.is_wildcard_subtype()
                || other.is_wildcard_subtype())
    }

    /// Type and subtype equality, ignoring parameters.
    pub fn same_type(&self, other: &MediaType) -> bool {
        self.main_type == other.main_type && self.subtype == other.subtype
    }

    /// Number of wildcard components: 0 for `text/html`, 1 for `text/*`, 2 for `*/*`.
    pub fn wildcard_rank(&self) -> u8 {
        self.is_wildcard_type() as u8 + self.is_wildcard_subtype() as u8
    }

    /// Copy without the `q` and `qs` parameters.
    pub fn strip_quality_params(&self) -> MediaType {
        MediaType {
            main_type: self.main_type.clone(),
            subtype: self.subtype.clone(),
            parameters: self
                .parameters
                .iter()
                .filter(|(n, _)| n != QUALITY_PARAMETER && n != QUALITY_SOURCE_PARAMETER)
                .cloned()
                .collect(),
        }
    }

    /// Read a quality parameter (`q` or `qs`) on the 0..=1000 scale.
    ///
    /// # Returns
    ///
    /// [`DEFAULT_QUALITY`] when the parameter is absent, an error when it is
    /// present but malformed.
    pub fn quality(&self, parameter: &str) -> Result<u16, MediaTypeParseError> {
        match self.parameter(parameter) {
            Some(value) => parse_quality(value),
            None => Ok(DEFAULT_QUALITY),
        }
    }
}

impl Default for MediaType {
    fn default() -> Self {
        Self::wildcard()
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.subtype)?;
        for (name, value) in &self.parameters {
            if value.is_empty() || value.chars().any(|c| !is_token_char(c)) {
                write!(f, ";{}=\"{}\"", name, value.replace('"', "\\\""))?;
            } else {
                write!(f, ";{}={}", name, value)?;
            }
        }
        Ok(())
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(MediaTypeParseError::Empty);
        }
        let params = split_unquoted(input, ';');
        let mut params = params.into_iter();
        let full_type = params.next().unwrap_or_default().trim();
        let (main_type, subtype) = full_type
            .split_once('/')
            .ok_or_else(|| MediaTypeParseError::MissingSubtype(input.to_string()))?;
        let (main_type, subtype) = (main_type.trim(), subtype.trim());
        for token in [main_type, subtype] {
            if token.is_empty() || !token.chars().all(is_token_char) {
                return Err(MediaTypeParseError::InvalidToken {
                    input: input.to_string(),
                    token: token.to_string(),
                });
            }
        }
        if main_type == WILDCARD && subtype != WILDCARD {
            return Err(MediaTypeParseError::WildcardTypeWithSubtype(input.to_string()));
        }

        let mut media_type = MediaType::new(main_type, subtype);
        for param in params {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (name, value) = param.split_once('=').ok_or_else(|| {
                MediaTypeParseError::InvalidParameter {
                    input: input.to_string(),
                    parameter: param.to_string(),
                }
            })?;
            let name = name.trim();
            if name.is_empty() || !name.chars().all(is_token_char) {
                return Err(MediaTypeParseError::InvalidParameter {
                    input: input.to_string(),
                    parameter: param.to_string(),
                });
            }
            media_type = media_type.with_parameter(name, &unquote(value.trim()));
        }
        Ok(media_type)
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<MediaType>().map_err(serde::de::Error::custom)
    }
}

/// Parse an HTTP quality value (`0`, `0.5`, `0.125`, `1`, `1.000`) onto the
/// 0..=1000 integer scale.
pub fn parse_quality(value: &str) -> Result<u16, MediaTypeParseError> {
    let invalid = || MediaTypeParseError::InvalidQuality(value.to_string());
    let value = value.trim();
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value, ""),
    };
    if whole.len() != 1 || fraction.len() > 3 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let mut scaled: u16 = match whole {
        "0" => 0,
        "1" => 1000,
        _ => return Err(invalid()),
    };
    let mut weight = 100;
    for digit in fraction.bytes() {
        scaled += u16::from(digit - b'0') * weight;
        weight /= 10;
    }
    if scaled > DEFAULT_QUALITY {
        return Err(invalid());
    }
    Ok(scaled)
}

/// Format a 0..=1000 quality as a decimal string (`500` → `"0.5"`).
pub fn format_quality(quality: u16) -> String {
    if quality >= DEFAULT_QUALITY {
        return "1".to_string();
    }
    let s = format!("0.{:03}", quality);
    let s = s.trim_end_matches('0');
    if s == "0." {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// Split on `separator` outside of double quotes.
pub(crate) fn split_unquoted(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == separator && !in_quotes => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn unquote(value: &str) -> String {
    match value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\\\"", "\""),
        None => value.to_string(),
    }
}
