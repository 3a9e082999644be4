//! URI templates (`/items/{id}`, `/files/{path: .+}`) compiled to regex source.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// Default regex for a template variable without an explicit pattern.
pub const TEMPLATE_VALUE_PATTERN: &str = "[^/]+";

/// Errors raised while parsing a URI template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed template variable in '{template}'")]
    UnclosedVariable { template: String },
    #[error("empty template variable name in '{template}'")]
    EmptyVariableName { template: String },
    #[error("invalid template variable name '{name}' in '{template}'")]
    InvalidVariableName { template: String, name: String },
    #[error("invalid regular expression for variable '{name}': {reason}")]
    InvalidRegex { name: String, reason: String },
}

/// A parsed, normalized URI template.
///
/// Normalization adds a leading `/` and strips a trailing `/`, so `"items"`,
/// `"/items"` and `"/items/"` are the same template. The empty template
/// (`""` or `"/"`) matches only an empty path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    template: String,
    regex: String,
    variables: Vec<String>,
    explicit_characters: usize,
    explicit_regexes: usize,
}

impl UriTemplate {
    /// Parse a template.
    ///
    /// # Arguments
    ///
    /// * `template` - Template text, e.g. `/users/{id}/posts/{post: \d+}`
    ///
    /// # Returns
    ///
    /// The normalized template or a [`TemplateError`] for malformed variables
    /// and invalid explicit regexes.
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        let normalized = normalize(template);
        let mut regex = String::with_capacity(normalized.len() + 8);
        let mut variables = Vec::new();
        let mut explicit_characters = 0;
        let mut explicit_regexes = 0;

        let mut chars = normalized.char_indices().peekable();
        while let Some((start, c)) = chars.next() {
            if c != '{' {
                explicit_characters += 1;
                let mut buf = [0u8; 4];
                regex.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                continue;
            }

            // Find the matching '}' honouring nested braces inside regexes ({n: \d{2}}).
            let mut depth = 1;
            let mut end = None;
            for (i, c) in chars.by_ref() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            end = Some(i);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            let end = end.ok_or_else(|| TemplateError::UnclosedVariable {
                template: template.to_string(),
            })?;
            let body = &normalized[start + 1..end];
            let (name, pattern) = match body.split_once(':') {
                Some((name, pattern)) => (name.trim(), Some(pattern.trim())),
                None => (body.trim(), None),
            };
            if name.is_empty() {
                return Err(TemplateError::EmptyVariableName {
                    template: template.to_string(),
                });
            }
            if !name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
            {
                return Err(TemplateError::InvalidVariableName {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }

            let pattern = match pattern.filter(|p| !p.is_empty()) {
                Some(p) => {
                    explicit_regexes += 1;
                    let p = non_capturing(p);
                    regex::Regex::new(&p).map_err(|e| TemplateError::InvalidRegex {
                        name: name.to_string(),
                        reason: e.to_string(),
                    })?;
                    p
                }
                None => TEMPLATE_VALUE_PATTERN.to_string(),
            };
            regex.push('(');
            regex.push_str(&pattern);
            regex.push(')');
            variables.push(name.to_string());
        }

        Ok(Self {
            template: normalized,
            regex,
            variables,
            explicit_characters,
            explicit_regexes,
        })
    }

    /// The empty template.
    pub fn empty() -> Self {
        Self {
            template: String::new(),
            regex: String::new(),
            variables: Vec::new(),
            explicit_characters: 0,
            explicit_regexes: 0,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Regex source for the template portion only (no anchors, no right-hand path).
    pub fn regex_source(&self) -> &str {
        &self.regex
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn number_of_explicit_characters(&self) -> usize {
        self.explicit_characters
    }

    pub fn number_of_template_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn number_of_explicit_regexes(&self) -> usize {
        self.explicit_regexes
    }

    pub fn is_empty(&self) -> bool {
        self.template.is_empty()
    }

    /// Orders templates most specific first.
    ///
    /// More literal characters win, then more template variables, then more
    /// explicit regexes; remaining ties fall back to the template text so the
    /// order is total. The empty template always sorts last.
    pub fn specificity_cmp(&self, other: &Self) -> Ordering {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => {}
        }
        other
            .explicit_characters
            .cmp(&self.explicit_characters)
            .then_with(|| other.variables.len().cmp(&self.variables.len()))
            .then_with(|| other.explicit_regexes.cmp(&self.explicit_regexes))
            .then_with(|| self.template.cmp(&other.template))
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn normalize(template: &str) -> String {
    let trimmed = template.trim();
    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Turn capturing groups of a user regex into non-capturing ones so template
/// variables keep stable group indices.
fn non_capturing(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            '(' if !in_class && chars.peek() != Some(&'?') => out.push_str("(?:"),
            _ => out.push(c),
        }
    }
    out
}
