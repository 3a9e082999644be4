//! # Routing Configuration
//!
//! Router behaviour is driven by an opaque property map, the same way the
//! rest of the application is configured. Properties can come from a plain
//! `HashMap`, a TOML document or the process environment.
//!
//! ## Properties
//!
//! | Property | Default |
//! |---|---|
//! | `jersey.config.server.subresource.cache.size` | `64` |
//! | `jersey.config.server.subresource.cache.age` | unset (no aging) |
//! | `jersey.config.server.subresource.cache.jersey.resource.enabled` | `false` |
//! | `jersey.config.server.resource.validation.disable` | `false` |
//! | `jersey.config.server.resource.validation.ignoreErrors` | `false` |
//! | `jersey.config.server.routing.negotiation.order` | `distance` |
//! | `jersey.config.server.routing.siblingConflict` | `first-wins` |
//!
//! Invalid values never fail configuration loading. They are logged and the
//! default is used; a non-numeric cache age disables caching of locator
//! instances and models.
//!
//! ## Environment
//!
//! [`RoutingConfig::from_env`] reads every property from an upper-snake-cased
//! variable: `jersey.config.server.subresource.cache.age` becomes
//! `JERSEY_CONFIG_SERVER_SUBRESOURCE_CACHE_AGE`, and
//! `...validation.ignoreErrors` becomes `..._VALIDATION_IGNORE_ERRORS`.
//!
//! ## Example
//!
//! ```rust
//! use jersey_router::config::RoutingConfig;
//!
//! let config = RoutingConfig::from_toml_str(r#"
//!     [jersey.config.server.subresource.cache]
//!     size = 16
//!     age = 30
//! "#).unwrap();
//! assert_eq!(config.locator_cache.max_size, 16);
//! ```

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::media::comparator::NegotiationOrder;

pub const SUBRESOURCE_LOCATOR_CACHE_SIZE: &str = "jersey.config.server.subresource.cache.size";
pub const SUBRESOURCE_LOCATOR_CACHE_AGE: &str = "jersey.config.server.subresource.cache.age";
pub const SUBRESOURCE_LOCATOR_CACHE_JERSEY_RESOURCE_ENABLED: &str =
    "jersey.config.server.subresource.cache.jersey.resource.enabled";
pub const RESOURCE_VALIDATION_DISABLE: &str = "jersey.config.server.resource.validation.disable";
pub const RESOURCE_VALIDATION_IGNORE_ERRORS: &str =
    "jersey.config.server.resource.validation.ignoreErrors";
pub const NEGOTIATION_ORDER: &str = "jersey.config.server.routing.negotiation.order";
pub const SIBLING_CONFLICT: &str = "jersey.config.server.routing.siblingConflict";

pub const DEFAULT_LOCATOR_CACHE_SIZE: usize = 64;

const ALL_PROPERTIES: [&str; 7] = [
    SUBRESOURCE_LOCATOR_CACHE_SIZE,
    SUBRESOURCE_LOCATOR_CACHE_AGE,
    SUBRESOURCE_LOCATOR_CACHE_JERSEY_RESOURCE_ENABLED,
    RESOURCE_VALIDATION_DISABLE,
    RESOURCE_VALIDATION_IGNORE_ERRORS,
    NEGOTIATION_ORDER,
    SIBLING_CONFLICT,
];

/// What to do when two sibling resources declare the same path template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SiblingConflictPolicy {
    /// Keep the first registered sibling; later ones are unreachable and
    /// reported as a warning.
    #[default]
    FirstWins,
    /// Merge the methods, child resources and locator of all siblings into
    /// one node; the first registered wins on duplicate methods.
    Merge,
    /// Fatal model issue.
    Reject,
}

impl SiblingConflictPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "first-wins" | "firstwins" => Some(SiblingConflictPolicy::FirstWins),
            "merge" => Some(SiblingConflictPolicy::Merge),
            "reject" => Some(SiblingConflictPolicy::Reject),
            _ => None,
        }
    }
}

/// Sub-resource locator cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorCacheConfig {
    /// Maximum number of cached subtrees.
    pub max_size: usize,
    /// Entries older than this are rebuilt on the next resolution.
    pub age: Option<Duration>,
    /// Cache subtrees for locator-returned instances and `Resource` models
    /// by identity.
    pub resource_caching_enabled: bool,
}

impl LocatorCacheConfig {
    /// Whether instance and model targets are cached at all. Class targets
    /// are always cached.
    pub fn caches_identities(&self) -> bool {
        self.resource_caching_enabled || self.age.is_some()
    }
}

impl Default for LocatorCacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_LOCATOR_CACHE_SIZE,
            age: None,
            resource_caching_enabled: false,
        }
    }
}

/// Complete router configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingConfig {
    pub locator_cache: LocatorCacheConfig,
    /// Skip resource-model validation.
    pub validation_disabled: bool,
    /// Build the router even when validation found fatal issues.
    pub ignore_validation_errors: bool,
    pub negotiation_order: NegotiationOrder,
    pub sibling_conflict: SiblingConflictPolicy,
}

impl RoutingConfig {
    /// Build a configuration from a property map. Unknown keys are ignored.
    pub fn from_properties(properties: &HashMap<String, String>) -> Self {
        let get = |key: &str| properties.get(key).map(|v| v.trim());

        let max_size = match get(SUBRESOURCE_LOCATOR_CACHE_SIZE) {
            None => DEFAULT_LOCATOR_CACHE_SIZE,
            Some(value) => match value.parse::<i64>() {
                Ok(size) if size > 0 => usize::try_from(size).unwrap_or(DEFAULT_LOCATOR_CACHE_SIZE),
                _ => {
                    warn!(
                        property = SUBRESOURCE_LOCATOR_CACHE_SIZE,
                        value = %value,
                        default = DEFAULT_LOCATOR_CACHE_SIZE,
                        "Invalid locator cache size, using default"
                    );
                    DEFAULT_LOCATOR_CACHE_SIZE
                }
            },
        };

        let age = match get(SUBRESOURCE_LOCATOR_CACHE_AGE) {
            None => None,
            Some(value) => match value.parse::<i64>() {
                Ok(seconds) if seconds > 0 => Some(Duration::from_secs(seconds.unsigned_abs())),
                Ok(seconds) => {
                    debug!(
                        property = SUBRESOURCE_LOCATOR_CACHE_AGE,
                        seconds = seconds,
                        "Non-positive locator cache age, aging disabled"
                    );
                    None
                }
                Err(_) => {
                    warn!(
                        property = SUBRESOURCE_LOCATOR_CACHE_AGE,
                        value = %value,
                        "Invalid locator cache age, locator instance caching disabled"
                    );
                    None
                }
            },
        };

        let negotiation_order = match get(NEGOTIATION_ORDER) {
            None => NegotiationOrder::default(),
            Some(value) => NegotiationOrder::parse(value).unwrap_or_else(|| {
                warn!(
                    property = NEGOTIATION_ORDER,
                    value = %value,
                    "Unknown negotiation order, using distance"
                );
                NegotiationOrder::default()
            }),
        };

        let sibling_conflict = match get(SIBLING_CONFLICT) {
            None => SiblingConflictPolicy::default(),
            Some(value) => SiblingConflictPolicy::parse(value).unwrap_or_else(|| {
                warn!(
                    property = SIBLING_CONFLICT,
                    value = %value,
                    "Unknown sibling conflict policy, using first-wins"
                );
                SiblingConflictPolicy::default()
            }),
        };

        Self {
            locator_cache: LocatorCacheConfig {
                max_size,
                age,
                resource_caching_enabled: parse_bool(
                    get(SUBRESOURCE_LOCATOR_CACHE_JERSEY_RESOURCE_ENABLED),
                    SUBRESOURCE_LOCATOR_CACHE_JERSEY_RESOURCE_ENABLED,
                ),
            },
            validation_disabled: parse_bool(get(RESOURCE_VALIDATION_DISABLE), RESOURCE_VALIDATION_DISABLE),
            ignore_validation_errors: parse_bool(
                get(RESOURCE_VALIDATION_IGNORE_ERRORS),
                RESOURCE_VALIDATION_IGNORE_ERRORS,
            ),
            negotiation_order,
            sibling_conflict,
        }
    }

    /// Build a configuration from a TOML document.
    ///
    /// Nested tables are flattened into dotted property names, so both
    /// `"jersey.config.server.subresource.cache.size" = 10` and a
    /// `[jersey.config.server.subresource.cache]` table with `size = 10` work.
    /// Scalars are converted to their string form; arrays are ignored.
    pub fn from_toml_str(document: &str) -> Result<Self> {
        let table: toml::Table =
            toml::from_str(document).context("Failed to parse routing configuration TOML")?;
        let mut properties = HashMap::new();
        flatten_toml("", &table, &mut properties);
        Ok(Self::from_properties(&properties))
    }

    /// Load configuration from `JERSEY_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`RoutingConfig::from_env`] with a custom variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let properties = ALL_PROPERTIES
            .iter()
            .filter_map(|property| lookup(&env_key(property)).map(|v| (property.to_string(), v)))
            .collect();
        Self::from_properties(&properties)
    }
}

/// `jersey.config.server.resource.validation.ignoreErrors` →
/// `JERSEY_CONFIG_SERVER_RESOURCE_VALIDATION_IGNORE_ERRORS`
pub fn env_key(property: &str) -> String {
    let mut key = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        match c {
            '.' | '-' => key.push('_'),
            c if c.is_ascii_uppercase() => {
                key.push('_');
                key.push(c);
            }
            c => key.push(c.to_ascii_uppercase()),
        }
    }
    key
}

fn parse_bool(value: Option<&str>, property: &str) -> bool {
    match value {
        None => false,
        Some(v) if v.eq_ignore_ascii_case("true") => true,
        Some(v) if v.eq_ignore_ascii_case("false") => false,
        Some(v) => {
            warn!(property = property, value = %v, "Invalid boolean property value, using false");
            false
        }
    }
}

fn flatten_toml(prefix: &str, table: &toml::Table, out: &mut HashMap<String, String>) {
    for (key, value) in table {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::Table(nested) => flatten_toml(&name, nested, out),
            toml::Value::String(s) => {
                out.insert(name, s.clone());
            }
            toml::Value::Integer(i) => {
                out.insert(name, i.to_string());
            }
            toml::Value::Float(f) => {
                out.insert(name, f.to_string());
            }
            toml::Value::Boolean(b) => {
                out.insert(name, b.to_string());
            }
            other => {
                debug!(property = %name, kind = other.type_str(), "Ignoring non-scalar property");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = RoutingConfig::from_properties(&HashMap::new());
        assert_eq!(config, RoutingConfig::default());
        assert_eq!(config.locator_cache.max_size, 64);
        assert_eq!(config.locator_cache.age, None);
        assert!(!config.locator_cache.caches_identities());
        assert_eq!(config.negotiation_order, NegotiationOrder::Distance);
        assert_eq!(config.sibling_conflict, SiblingConflictPolicy::FirstWins);
    }

    #[test]
    fn test_from_properties() {
        let config = RoutingConfig::from_properties(&props(&[
            (SUBRESOURCE_LOCATOR_CACHE_SIZE, "10"),
            (SUBRESOURCE_LOCATOR_CACHE_AGE, " 5 "),
            (SUBRESOURCE_LOCATOR_CACHE_JERSEY_RESOURCE_ENABLED, "TRUE"),
            (RESOURCE_VALIDATION_DISABLE, "true"),
            (RESOURCE_VALIDATION_IGNORE_ERRORS, "false"),
            (NEGOTIATION_ORDER, "specificity"),
            (SIBLING_CONFLICT, "merge"),
        ]));
        assert_eq!(config.locator_cache.max_size, 10);
        assert_eq!(config.locator_cache.age, Some(Duration::from_secs(5)));
        assert!(config.locator_cache.resource_caching_enabled);
        assert!(config.validation_disabled);
        assert!(!config.ignore_validation_errors);
        assert_eq!(config.negotiation_order, NegotiationOrder::Specificity);
        assert_eq!(config.sibling_conflict, SiblingConflictPolicy::Merge);
    }

    #[test]
    #[traced_test]
    fn test_invalid_age_disables_identity_caching() {
        let config = RoutingConfig::from_properties(&props(&[(SUBRESOURCE_LOCATOR_CACHE_AGE, "ten")]));
        assert_eq!(config.locator_cache.age, None);
        assert!(!config.locator_cache.caches_identities());
        assert!(logs_contain("Invalid locator cache age"));
    }

    #[test]
    #[traced_test]
    fn test_invalid_size_falls_back() {
        for value in ["0", "-3", "lots"] {
            let config = RoutingConfig::from_properties(&props(&[(SUBRESOURCE_LOCATOR_CACHE_SIZE, value)]));
            assert_eq!(config.locator_cache.max_size, DEFAULT_LOCATOR_CACHE_SIZE);
        }
        assert!(logs_contain("Invalid locator cache size"));
    }

    #[test]
    fn test_non_positive_age_is_no_aging() {
        let config = RoutingConfig::from_properties(&props(&[(SUBRESOURCE_LOCATOR_CACHE_AGE, "-1")]));
        assert_eq!(config.locator_cache.age, None);
    }

    #[test]
    #[traced_test]
    fn test_invalid_enums_and_bools_fall_back() {
        let config = RoutingConfig::from_properties(&props(&[
            (NEGOTIATION_ORDER, "random"),
            (SIBLING_CONFLICT, "explode"),
            (RESOURCE_VALIDATION_DISABLE, "yes"),
        ]));
        assert_eq!(config.negotiation_order, NegotiationOrder::Distance);
        assert_eq!(config.sibling_conflict, SiblingConflictPolicy::FirstWins);
        assert!(!config.validation_disabled);
        assert!(logs_contain("Invalid boolean property value"));
    }

    #[test]
    fn test_from_toml_str() {
        let config = RoutingConfig::from_toml_str(
            r#"
            "jersey.config.server.routing.siblingConflict" = "reject"

            [jersey.config.server.subresource.cache]
            size = 8
            age = "12"
            jersey.resource.enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(config.locator_cache.max_size, 8);
        assert_eq!(config.locator_cache.age, Some(Duration::from_secs(12)));
        assert!(config.locator_cache.resource_caching_enabled);
        assert_eq!(config.sibling_conflict, SiblingConflictPolicy::Reject);
    }

    #[test]
    fn test_from_toml_str_rejects_malformed_documents() {
        assert!(RoutingConfig::from_toml_str("size = = 3").is_err());
    }

    #[test]
    fn test_env_key() {
        assert_eq!(
            env_key(SUBRESOURCE_LOCATOR_CACHE_AGE),
            "JERSEY_CONFIG_SERVER_SUBRESOURCE_CACHE_AGE"
        );
        assert_eq!(
            env_key(RESOURCE_VALIDATION_IGNORE_ERRORS),
            "JERSEY_CONFIG_SERVER_RESOURCE_VALIDATION_IGNORE_ERRORS"
        );
        assert_eq!(env_key(SIBLING_CONFLICT), "JERSEY_CONFIG_SERVER_ROUTING_SIBLING_CONFLICT");
    }

    #[test]
    fn test_from_lookup() {
        let vars = props(&[
            ("JERSEY_CONFIG_SERVER_SUBRESOURCE_CACHE_SIZE", "3"),
            ("JERSEY_CONFIG_SERVER_RESOURCE_VALIDATION_IGNORE_ERRORS", "true"),
        ]);
        let config = RoutingConfig::from_lookup(|key| vars.get(key).cloned());
        assert_eq!(config.locator_cache.max_size, 3);
        assert!(config.ignore_validation_errors);
    }

    #[test]
    fn test_sibling_policy_parse() {
        assert_eq!(SiblingConflictPolicy::parse("FIRST_WINS"), Some(SiblingConflictPolicy::FirstWins));
        assert_eq!(SiblingConflictPolicy::parse("reject"), Some(SiblingConflictPolicy::Reject));
        assert_eq!(SiblingConflictPolicy::parse("nope"), None);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Negotiated {
        order: NegotiationOrder,
        siblings: SiblingConflictPolicy,
        produces: Vec<crate::media::MediaType>,
    }

    #[test]
    fn test_serde_round_trip_through_toml() {
        let parsed: Negotiated = toml::from_str(
            r#"
            order = "specificity"
            siblings = "first-wins"
            produces = ["Application/JSON", "text/html;qs=0.5"]
            "#,
        )
        .unwrap();
        assert_eq!(parsed.order, NegotiationOrder::Specificity);
        assert_eq!(parsed.siblings, SiblingConflictPolicy::FirstWins);
        assert_eq!(parsed.produces[0].to_string(), "application/json");
        assert_eq!(parsed.produces[1].parameter("qs"), Some("0.5"));

        let rendered = toml::to_string(&parsed).unwrap();
        assert!(rendered.contains(r#"order = "specificity""#), "{rendered}");
        assert!(rendered.contains(r#"siblings = "first-wins""#), "{rendered}");
        assert_eq!(toml::from_str::<Negotiated>(&rendered).unwrap(), parsed);

        assert!(toml::from_str::<Negotiated>(r#"order = "random"
siblings = "merge"
produces = []"#)
        .is_err());
        assert!(toml::from_str::<Negotiated>(r#"order = "distance"
siblings = "merge"
produces = ["*/json"]"#)
        .is_err());
    }
}
