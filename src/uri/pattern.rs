//! Path patterns: a compiled [`UriTemplate`] followed by a right-hand-path group.
//!
//! A pattern is matched against the *remaining* request path. The final
//! capturing group is the right-hand path handed to the children of the
//! matching router node:
//!
//! | template | right-hand path | regex           | `/a/b/c` matches | remainder |
//! |----------|-----------------|-----------------|------------------|-----------|
//! | `a`      | zero or more    | `^/a(/.*)?$`    | yes              | `/b/c`    |
//! | `c`      | end of path     | `^/c(/)?$`      | no               |           |
//! | *(empty)*| end of path     | `^(/)?$`        | `""` or `"/"`    | `""`      |

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;

use super::template::{TemplateError, UriTemplate};

/// Capture groups kept inline for the common case of a handful of variables.
pub const MAX_INLINE_GROUPS: usize = 4;

/// How much of the path a pattern leaves to its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RightHandPath {
    /// `(/.*)?` - anything after the template is passed on.
    CapturingZeroOrMoreSegments,
    /// `(/)?` - the template must consume the whole path (optional trailing slash).
    CapturingZeroSegments,
}

impl RightHandPath {
    fn regex(self) -> &'static str {
        match self {
            RightHandPath::CapturingZeroOrMoreSegments => "(/.*)?",
            RightHandPath::CapturingZeroSegments => "(/)?",
        }
    }
}

static END_OF_PATH: Lazy<PathPattern> = Lazy::new(|| {
    PathPattern::compile(UriTemplate::empty(), RightHandPath::CapturingZeroSegments)
        .expect("end-of-path regex is a valid constant")
});

/// A compiled, anchored path pattern.
#[derive(Clone)]
pub struct PathPattern {
    template: UriTemplate,
    right_hand_path: RightHandPath,
    regex: Regex,
}

impl PathPattern {
    /// Compile `template` with a right-hand path capturing zero or more segments.
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        Self::with_right_hand_path(template, RightHandPath::CapturingZeroOrMoreSegments)
    }

    pub fn with_right_hand_path(
        template: &str,
        right_hand_path: RightHandPath,
    ) -> Result<Self, TemplateError> {
        Self::compile(UriTemplate::new(template)?, right_hand_path)
    }

    pub fn from_template(
        template: UriTemplate,
        right_hand_path: RightHandPath,
    ) -> Result<Self, TemplateError> {
        Self::compile(template, right_hand_path)
    }

    fn compile(template: UriTemplate, right_hand_path: RightHandPath) -> Result<Self, TemplateError> {
        let source = format!("^{}{}$", template.regex_source(), right_hand_path.regex());
        let regex = Regex::new(&source).map_err(|e| TemplateError::InvalidRegex {
            name: template.template().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            template,
            right_hand_path,
            regex,
        })
    }

    /// The empty pattern that only matches the end of a path (`""` or `"/"`).
    pub fn end_of_path() -> Self {
        END_OF_PATH.clone()
    }

    pub fn template(&self) -> &UriTemplate {
        &self.template
    }

    pub fn right_hand_path(&self) -> RightHandPath {
        self.right_hand_path
    }

    pub fn is_end_of_path(&self) -> bool {
        self.template.is_empty() && self.right_hand_path == RightHandPath::CapturingZeroSegments
    }

    /// Match the pattern against a remaining path.
    ///
    /// # Returns
    ///
    /// `Some(MatchResult)` with the template variable groups and the
    /// right-hand path, or `None` when the pattern does not match.
    pub fn match_path(&self, path: &str) -> Option<MatchResult> {
        let captures = self.regex.captures(path)?;
        let group_count = captures.len() - 1;
        let groups = (1..group_count)
            .map(|i| captures.get(i).map(|m| m.as_str().to_string()))
            .collect();
        let right_hand_path = match self.right_hand_path {
            RightHandPath::CapturingZeroOrMoreSegments => captures
                .get(group_count)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            // A trailing slash is consumed by the pattern itself.
            RightHandPath::CapturingZeroSegments => String::new(),
        };
        Some(MatchResult {
            matched: path.to_string(),
            groups,
            right_hand_path,
            variables: self.template.variables().iter().map(|v| Arc::from(v.as_str())).collect(),
        })
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern")
            .field("template", &self.template.template())
            .field("right_hand_path", &self.right_hand_path)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.regex.as_str())
    }
}

/// Result of one successful [`PathPattern::match_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    matched: String,
    groups: SmallVec<[Option<String>; MAX_INLINE_GROUPS]>,
    right_hand_path: String,
    variables: SmallVec<[Arc<str>; MAX_INLINE_GROUPS]>,
}

impl MatchResult {
    /// The whole input the pattern was matched against.
    pub fn matched(&self) -> &str {
        &self.matched
    }

    /// Template variable groups in declaration order.
    pub fn groups(&self) -> &[Option<String>] {
        &self.groups
    }

    /// Value captured for a template variable (last declaration wins).
    pub fn group(&self, variable: &str) -> Option<&str> {
        self.variables
            .iter()
            .rposition(|v| v.as_ref() == variable)
            .and_then(|i| self.groups.get(i))
            .and_then(|g| g.as_deref())
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.as_ref())
    }

    /// Unmatched tail passed on to child nodes (`""` when fully consumed).
    pub fn right_hand_path(&self) -> &str {
        &self.right_hand_path
    }

    /// The part of the input consumed by the template, without the leading slash.
    pub fn consumed(&self) -> &str {
        let end = self.matched.len() - self.right_hand_path.len();
        let consumed = &self.matched[..end];
        let consumed = consumed.strip_prefix('/').unwrap_or(consumed);
        consumed.strip_suffix('/').unwrap_or(consumed)
    }

    /// True when nothing but an optional trailing slash is left.
    pub fn is_end_of_path(&self) -> bool {
        is_end_of_path(&self.right_hand_path)
    }
}

/// True for `""` and `"/"`.
pub fn is_end_of_path(path: &str) -> bool {
    path.is_empty() || path == "/"
}
