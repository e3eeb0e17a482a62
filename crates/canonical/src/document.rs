//! Input and output types of the normalizer.
//!
//! A [`SourceUnit`] goes in, a [`CanonicalText`] (or the richer
//! [`Normalized`]) comes out.
//!
//! # Examples
//!
//! ```rust
//! use canonical::{normalize, NormalizerConfig, SourceUnit};
//!
//! let unit = SourceUnit::new("total = price * qty  # compute\n", "python");
//! let text = normalize(&unit, &NormalizerConfig::default()).unwrap();
//! assert_eq!(text.as_str(), "_VARIABLE_0 = _VARIABLE_1 * _VARIABLE_2\n");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::token::RoleSpan;

/// A fragment of source code together with its language tag.
///
/// The tag is resolved when the unit is normalized, so a unit may carry a tag
/// the normalizer does not know; that surfaces as
/// [`CanonicalError::UnsupportedLanguage`](crate::CanonicalError::UnsupportedLanguage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    text: String,
    language: String,
}

impl SourceUnit {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

/// Identifier-blind rewrite of a source unit.
///
/// Has exactly as many lines as the input, with trailing whitespace removed
/// from each line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalText(String);

impl CanonicalText {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn line_count(&self) -> usize {
        self.0.split('\n').count()
    }
}

impl AsRef<str> for CanonicalText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the placeholder table built during a normalization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderAssignment {
    pub role: Role,
    pub original: String,
    pub placeholder: String,
}

/// Canonical text plus the diagnostics gathered while producing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalized {
    pub text: CanonicalText,
    /// Claimed identifier spans in source order.
    pub spans: Vec<RoleSpan>,
    /// Placeholder table in order of first assignment.
    pub placeholders: Vec<PlaceholderAssignment>,
    /// The parse tree contained error or missing nodes.
    pub had_syntax_errors: bool,
}
