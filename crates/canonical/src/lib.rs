//! Canonical form for source code.
//!
//! This crate rewrites a code fragment into an identifier-blind form so that
//! renaming variables, functions or classes and rewording comments does not
//! change what downstream fingerprinting sees.
//!
//! ## What we do
//!
//! - Parse with a per-language tree-sitter grammar
//! - Classify every identifier into one of six roles (class, method,
//!   property, function, call, variable) with a fixed precedence
//! - Replace each distinct name with a per-role placeholder (`_VARIABLE_0`,
//!   `_CALL_1`, ...) numbered in source order
//! - Blank out comments, keep line structure, trim trailing whitespace
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no shared mutable state. The placeholder table
//! lives only for the duration of one [`normalize`] call, so the same unit and
//! config always produce the same text.
//!
//! ## Invariants worth knowing
//!
//! - The output has exactly as many lines as the input
//! - Within a pass, two different names of one role never share a placeholder
//! - Python dunder names and the JavaScript `constructor` are left as written
//! - Trees with syntax errors are still rewritten best-effort

mod config;
mod document;
mod error;
mod extract;
mod languages;
mod pipeline;
mod role;
mod token;

pub use crate::config::NormalizerConfig;
pub use crate::document::{CanonicalText, Normalized, PlaceholderAssignment, SourceUnit};
pub use crate::error::CanonicalError;
pub use crate::extract::{Extraction, RoleExtractor};
pub use crate::languages::{KeepFn, Language, LanguageProfile, RoleRule};
pub use crate::pipeline::{normalize, normalize_detailed, NormalizationState};
pub use crate::role::Role;
pub use crate::token::{PositionSpan, RoleSpan};
