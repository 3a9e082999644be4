//! # Media Module
//!
//! Media types and content negotiation.
//!
//! ## Combination
//!
//! A client media range (`Accept: text/*;q=0.5`) and a server-declared type
//! (`@Produces("text/html;qs=0.8")`) combine into a [`CombinedMediaType`]:
//!
//! | client            | server           | combined    | q    | qs   | distance |
//! |-------------------|------------------|-------------|------|------|----------|
//! | `text/html;q=1`   | `text/html;qs=1` | `text/html` | 1000 | 1000 | 0        |
//! | `text/*;q=0.5`    | `text/html;qs=0.8` | `text/html` | 500 | 800 | 1       |
//! | `*/*;q=0.2`       | `text/*;qs=0.8`  | `text/*`    | 200  | 800  | 1        |
//! | `text/html;q=0.2` | `*/*;qs=0.8`     | `text/html` | 200  | 800  | 2        |
//!
//! Incompatible pairs produce no candidate at all.
//!
//! ## Ranking
//!
//! [`comparator::compare`] orders candidates by distance and then by `q * qs`;
//! [`comparator::compare_specificity_first`] is the alternative ordering
//! selectable through [`NegotiationOrder`].

mod accept;
mod combined;
pub mod comparator;
mod core;


pub use accept::{negotiate_token, parse_accept, parse_accept_tokens, AcceptableToken};
pub use combined::{AcceptableMediaType, CombinedMediaType, EffectiveMediaType};
pub use comparator::{sort_candidates, NegotiationOrder};
pub use self::core::{
    format_quality, parse_quality, MediaType, MediaTypeParseError, DEFAULT_QUALITY,
    MINIMUM_QUALITY, QUALITY_PARAMETER, QUALITY_SOURCE_PARAMETER, WILDCARD,
};
