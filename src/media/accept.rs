//! `Accept` and token-list (`Accept-Encoding`, `Accept-Charset`) header parsing.

use std::fmt;

use super::combined::AcceptableMediaType;
use super::core::{parse_quality, split_unquoted, MediaTypeParseError, DEFAULT_QUALITY, MINIMUM_QUALITY, WILDCARD};

/// Parse an `Accept` header value into media ranges, best first.
///
/// Ranges are ordered by `q` (descending) and then by specificity
/// (`text/html` before `text/*` before `*/*`); the sort is stable so
/// header order breaks remaining ties. An empty or missing header accepts
/// `*/*`.
///
/// # Arguments
///
/// * `header` - The raw header value, possibly absent
///
/// # Returns
///
/// The sorted ranges, or the first parse error (surfaced as 400 Bad Request
/// by the router).
pub fn parse_accept(header: Option<&str>) -> Result<Vec<AcceptableMediaType>, MediaTypeParseError> {
    let header = header.map(str::trim).unwrap_or_default();
    if header.is_empty() {
        return Ok(vec![AcceptableMediaType::wildcard()]);
    }
    let mut ranges = split_unquoted(header, ',')
        .into_iter()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::parse::<AcceptableMediaType>)
        .collect::<Result<Vec<_>, _>>()?;
    if ranges.is_empty() {
        ranges.push(AcceptableMediaType::wildcard());
    }
    ranges.sort_by(|a, b| {
        b.quality()
            .cmp(&a.quality())
            .then_with(|| a.media_type().wildcard_rank().cmp(&b.media_type().wildcard_rank()))
    });
    Ok(ranges)
}

/// One entry of a token list header such as `Accept-Encoding: gzip;q=0.8, *;q=0.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AcceptableToken {
    token: String,
    quality: u16,
}

impl AcceptableToken {
    pub fn new(token: &str, quality: u16) -> Self {
        Self {
            token: token.trim().to_ascii_lowercase(),
            quality: quality.min(DEFAULT_QUALITY),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn quality(&self) -> u16 {
        self.quality
    }

    pub fn is_wildcard(&self) -> bool {
        self.token == WILDCARD
    }
}

impl fmt::Display for AcceptableToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quality == DEFAULT_QUALITY {
            f.write_str(&self.token)
        } else {
            write!(f, "{};q={}", self.token, super::core::format_quality(self.quality))
        }
    }
}

/// Parse a token list header, best first (stable on equal `q`).
pub fn parse_accept_tokens(header: Option<&str>) -> Result<Vec<AcceptableToken>, MediaTypeParseError> {
    let header = header.map(str::trim).unwrap_or_default();
    if header.is_empty() {
        return Ok(vec![AcceptableToken::new(WILDCARD, DEFAULT_QUALITY)]);
    }
    let mut tokens = Vec::new();
    for entry in header.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = entry.split(';');
        let token = parts.next().unwrap_or_default().trim();
        let mut quality = DEFAULT_QUALITY;
        for param in parts {
            if let Some((name, value)) = param.split_once('=') {
                if name.trim().eq_ignore_ascii_case("q") {
                    quality = parse_quality(value)?;
                }
            }
        }
        tokens.push(AcceptableToken::new(token, quality));
    }
    tokens.sort_by(|a, b| b.quality().cmp(&a.quality()));
    Ok(tokens)
}

/// Pick the best of the `available` tokens for an accepted token list.
///
/// An explicit entry overrides the `*` wildcard for that token; anything
/// listed with `q=0` (or covered only by `*;q=0`) is excluded. Among equally acceptable tokens the
/// server's `available` order wins.
pub fn negotiate_token<'a>(accepted: &[AcceptableToken], available: &[&'a str]) -> Option<&'a str> {
    let wildcard = accepted.iter().find(|t| t.is_wildcard()).map(|t| t.quality());
    available
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let explicit = accepted
                .iter()
                .find(|t| t.token().eq_ignore_ascii_case(candidate))
                .map(|t| t.quality());
            let quality = explicit.or(wildcard)?;
            (quality > MINIMUM_QUALITY).then_some((quality, index, *candidate))
        })
        .max_by(|(qa, ia, _), (qb, ib, _)| qa.cmp(qb).then_with(|| ib.cmp(ia)))
        .map(|(_, _, candidate)| candidate)
}
