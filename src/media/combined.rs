//! Combination of a client-acceptable media type with a server-declared one.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::core::{
    format_quality, MediaType, MediaTypeParseError, DEFAULT_QUALITY, QUALITY_PARAMETER,
    QUALITY_SOURCE_PARAMETER,
};

/// A client media range with its `q` value (0..=1000).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AcceptableMediaType {
    media_type: MediaType,
    quality: u16,
}

impl AcceptableMediaType {
    /// Split the `q` parameter off `media_type`.
    pub fn new(media_type: MediaType) -> Result<Self, MediaTypeParseError> {
        let quality = media_type.quality(QUALITY_PARAMETER)?;
        Ok(Self {
            media_type: media_type.strip_quality_params(),
            quality,
        })
    }

    pub fn with_quality(media_type: MediaType, quality: u16) -> Self {
        Self {
            media_type: media_type.strip_quality_params(),
            quality: quality.min(DEFAULT_QUALITY),
        }
    }

    /// `*/*` with full quality, the implicit value of a missing `Accept` header.
    pub fn wildcard() -> Self {
        Self::with_quality(MediaType::wildcard(), DEFAULT_QUALITY)
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn quality(&self) -> u16 {
        self.quality
    }
}

impl FromStr for AcceptableMediaType {
    type Err = MediaTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.parse()?)
    }
}

impl From<MediaType> for AcceptableMediaType {
    /// Lenient conversion: an unparsable `q` counts as full quality.
    fn from(media_type: MediaType) -> Self {
        let quality = media_type
            .quality(QUALITY_PARAMETER)
            .unwrap_or(DEFAULT_QUALITY);
        Self::with_quality(media_type, quality)
    }
}

impl fmt::Display for AcceptableMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quality == DEFAULT_QUALITY {
            write!(f, "{}", self.media_type)
        } else {
            write!(f, "{};q={}", self.media_type, format_quality(self.quality))
        }
    }
}

/// A server-declared (`@Produces` / `@Consumes`) media type with its `qs`
/// weight.
///
/// `declared` is false when the method declared nothing and the type was
/// defaulted to `*/*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EffectiveMediaType {
    media_type: MediaType,
    quality_source: u16,
    declared: bool,
}

impl EffectiveMediaType {
    /// An explicitly declared media type; a `qs` parameter is split off.
    pub fn new(media_type: MediaType) -> Result<Self, MediaTypeParseError> {
        let quality_source = media_type.quality(QUALITY_SOURCE_PARAMETER)?;
        Ok(Self {
            media_type: media_type.strip_quality_params(),
            quality_source,
            declared: true,
        })
    }

    /// The implicit `*/*` used when nothing was declared.
    pub fn wildcard_default() -> Self {
        Self {
            media_type: MediaType::wildcard(),
            quality_source: DEFAULT_QUALITY,
            declared: false,
        }
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn quality_source(&self) -> u16 {
        self.quality_source
    }

    pub fn is_declared(&self) -> bool {
        self.declared
    }
}

impl FromStr for EffectiveMediaType {
    type Err = MediaTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.parse()?)
    }
}

impl fmt::Display for EffectiveMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quality_source == DEFAULT_QUALITY {
            write!(f, "{}", self.media_type)
        } else {
            write!(f, "{};qs={}", self.media_type, format_quality(self.quality_source))
        }
    }
}

/// Result of reconciling a client media range with a server media type.
///
/// `distance` counts the wildcard reconciliations that were needed: one for
/// the subtype when exactly one side has a wildcard subtype, one for the type
/// when exactly one side has a wildcard type. It is therefore 0, 1 or 2.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombinedMediaType {
    combined_type: MediaType,
    q: u16,
    qs: u16,
    distance: u8,
}

impl CombinedMediaType {
    /// Combine a client media range with a server media type.
    ///
    /// # Returns
    ///
    /// `None` when the two types are incompatible; callers drop such pairs
    /// and only fail once no candidate is left.
    pub fn combine(client: &AcceptableMediaType, server: &EffectiveMediaType) -> Option<Self> {
        let client_type = client.media_type();
        let server_type = server.media_type();
        if !client_type.is_compatible(server_type) {
            return None;
        }

        let combined_type = most_specific(client_type, server_type);
        let distance = u8::from(client_type.is_wildcard_subtype() != server_type.is_wildcard_subtype())
            + u8::from(client_type.is_wildcard_type() != server_type.is_wildcard_type());

        Some(Self {
            combined_type,
            q: client.quality(),
            qs: server.quality_source(),
            distance,
        })
    }

    pub fn combined_type(&self) -> &MediaType {
        &self.combined_type
    }

    pub fn q(&self) -> u16 {
        self.q
    }

    pub fn qs(&self) -> u16 {
        self.qs
    }

    pub fn distance(&self) -> u8 {
        self.distance
    }

    /// `q * qs` as an integer product.
    pub fn weight(&self) -> u32 {
        u32::from(self.q) * u32::from(self.qs)
    }

    /// Candidate ordering: lower distance first, then higher `q * qs`.
    ///
    /// `Ordering::Less` means `self` is the better candidate. Equal keys
    /// compare equal so a stable sort keeps enumeration order.
    pub fn compare(&self, other: &Self) -> Ordering {
        super::comparator::compare(self, other)
    }

    /// Alternative ordering: concrete combined types first, then `q`, then
    /// `qs`, then distance.
    pub fn compare_specificity_first(&self, other: &Self) -> Ordering {
        super::comparator::compare_specificity_first(self, other)
    }
}

impl fmt::Display for CombinedMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};q={};qs={};d={}",
            self.combined_type, self.q, self.qs, self.distance
        )
    }
}

/// Pick each component from whichever side is concrete; parameters come from
/// the side supplying the subtype.
fn most_specific(client: &MediaType, server: &MediaType) -> MediaType {
    let main_type = if client.is_wildcard_type() {
        server.main_type()
    } else {
        client.main_type()
    };
    let (subtype_source, other) = if client.is_wildcard_subtype() && !server.is_wildcard_subtype() {
        (server, client)
    } else {
        (client, server)
    };
    let parameters = if subtype_source.parameters().is_empty() {
        other.parameters()
    } else {
        subtype_source.parameters()
    };
    parameters.iter().fold(
        MediaType::new(main_type, subtype_source.subtype()),
        |mt, (name, value)| mt.with_parameter(name, value),
    )
}
