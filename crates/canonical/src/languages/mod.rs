//! Per-language grammar tables.
//!
//! Every supported language is one [`LanguageProfile`]: a grammar plus an
//! ordered list of [`RoleRule`]s. Adding a language means adding a row here,
//! the extraction and rewrite code never branches on the language.

mod javascript;
mod python;
mod rust;

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::error::CanonicalError;
use crate::extract::CompiledQueries;
use crate::role::Role;

/// Closed set of languages the normalizer has grammars for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Rust,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::JavaScript, Language::Rust];

    /// Resolves a language tag, accepting the common aliases
    /// (`py`, `js`, `jsx`, `rs`). Matching is case-insensitive.
    pub fn from_tag(tag: &str) -> Option<Language> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "javascript" | "js" | "jsx" => Some(Language::JavaScript),
            "rust" | "rs" => Some(Language::Rust),
            _ => None,
        }
    }

    /// Canonical tag, as stored on code fingerprints.
    pub fn tag(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Rust => "rust",
        }
    }

    pub fn profile(self) -> &'static LanguageProfile {
        match self {
            Language::Python => &python::PROFILE,
            Language::JavaScript => &javascript::PROFILE,
            Language::Rust => &rust::PROFILE,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Decides whether a captured name node really plays the rule's role.
pub type KeepFn = fn(Node<'_>, &str) -> bool;

/// One query that claims identifier spans for a role.
///
/// The query must capture the identifier node as `@name`.
pub struct RoleRule {
    pub role: Role,
    pub query: &'static str,
    pub keep: KeepFn,
}

/// Grammar and role table for a language.
pub struct LanguageProfile {
    pub language: Language,
    pub grammar: fn() -> tree_sitter::Language,
    pub rules: &'static [RoleRule],
    /// Query whose `@comment` captures are blanked from the output.
    pub comment_query: &'static str,
    pub(crate) compiled: OnceLock<Result<CompiledQueries, CanonicalError>>,
}

impl LanguageProfile {
    /// Rules for `role`, in table order.
    pub fn rules_for(&self, role: Role) -> impl Iterator<Item = &RoleRule> {
        self.rules.iter().filter(move |rule| rule.role == role)
    }
}

pub(crate) fn always(_: Node<'_>, _: &str) -> bool {
    true
}

/// `true` when `node` is the callee of the call expression it sits in.
pub(crate) fn is_callee(node: Node<'_>) -> bool {
    node.parent()
        .and_then(|parent| parent.child_by_field_name("function"))
        .is_some_and(|callee| callee.id() == node.id())
}

/// `true` when the name node's parent (an attribute or member access) is
/// itself being called.
pub(crate) fn parent_is_callee(node: Node<'_>) -> bool {
    node.parent().is_some_and(is_callee)
}
