//! Role extraction over a parse tree.

use std::collections::BTreeMap;

use tracing::{debug, trace};
use tree_sitter::{Query, QueryCursor, Tree};

use crate::error::CanonicalError;
use crate::languages::{KeepFn, LanguageProfile};
use crate::role::Role;
use crate::token::{PositionSpan, RoleSpan};

/// Everything the rewrite step needs from a parse tree.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Claimed identifier spans, ordered by start byte.
    pub spans: Vec<RoleSpan>,
    pub comments: Vec<PositionSpan>,
    pub had_syntax_errors: bool,
}

/// Classifies identifier occurrences of a parsed unit into roles.
pub trait RoleExtractor {
    fn extract_roles(&self, tree: &Tree, source: &str) -> Result<Extraction, CanonicalError>;
}

/// A rule's query, compiled once per language.
struct CompiledRule {
    role: Role,
    keep: KeepFn,
    query: Query,
    name_index: u32,
}

/// Compiled queries of a [`LanguageProfile`], rules in precedence order.
pub(crate) struct CompiledQueries {
    rules: Vec<CompiledRule>,
    comments: Query,
}

impl LanguageProfile {
    /// The profile's queries, compiled on first use and shared afterwards.
    pub(crate) fn queries(&self) -> Result<&CompiledQueries, CanonicalError> {
        self.compiled
            .get_or_init(|| self.compile_queries())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn compile_queries(&self) -> Result<CompiledQueries, CanonicalError> {
        let grammar = (self.grammar)();
        let mut rules = Vec::with_capacity(self.rules.len());
        for role in Role::PRECEDENCE {
            for rule in self.rules_for(role) {
                let query = compile(&grammar, rule.query, self, Some(role))?;
                let Some(name_index) = query.capture_index_for_name("name") else {
                    return Err(CanonicalError::Query {
                        language: self.language.tag().to_string(),
                        role,
                        message: "query has no @name capture".into(),
                    });
                };
                rules.push(CompiledRule {
                    role,
                    keep: rule.keep,
                    query,
                    name_index,
                });
            }
        }
        let comments = compile(&grammar, self.comment_query, self, None)?;
        debug!(language = %self.language, rules = rules.len(), "compiled role queries");
        Ok(CompiledQueries { rules, comments })
    }
}

impl RoleExtractor for LanguageProfile {
    fn extract_roles(&self, tree: &Tree, source: &str) -> Result<Extraction, CanonicalError> {
        let queries = self.queries()?;
        let root = tree.root_node();
        let bytes = source.as_bytes();
        let mut cursor = QueryCursor::new();
        let mut claims: BTreeMap<usize, RoleSpan> = BTreeMap::new();

        for rule in &queries.rules {
            let role = rule.role;
            for m in cursor.matches(&rule.query, root, bytes) {
                for capture in m.captures.iter().filter(|c| c.index == rule.name_index) {
                    let node = capture.node;
                    let Ok(text) = node.utf8_text(bytes) else {
                        continue;
                    };
                    if !(rule.keep)(node, text) {
                        continue;
                    }
                    let (start_byte, end_byte) = (node.start_byte(), node.end_byte());
                    let taken = claims
                        .range(..end_byte)
                        .next_back()
                        .is_some_and(|(_, prior)| prior.overlaps(start_byte, end_byte));
                    if taken {
                        continue;
                    }
                    trace!(role = ?role, name = text, start_byte, "claimed span");
                    claims.insert(
                        start_byte,
                        RoleSpan {
                            role,
                            span: PositionSpan::of(&node),
                            start_byte,
                            end_byte,
                            text: text.to_string(),
                        },
                    );
                }
            }
        }

        let mut comments = Vec::new();
        for m in cursor.matches(&queries.comments, root, bytes) {
            comments.extend(m.captures.iter().map(|c| PositionSpan::of(&c.node)));
        }
        comments.sort();
        comments.dedup();

        Ok(Extraction {
            spans: claims.into_values().collect(),
            comments,
            had_syntax_errors: root.has_error(),
        })
    }
}

fn compile(
    grammar: &tree_sitter::Language,
    source: &str,
    profile: &LanguageProfile,
    role: Option<Role>,
) -> Result<Query, CanonicalError> {
    Query::new(grammar, source).map_err(|err| match role {
        Some(role) => CanonicalError::Query {
            language: profile.language.tag().to_string(),
            role,
            message: err.to_string(),
        },
        None => CanonicalError::Grammar {
            language: profile.language.tag().to_string(),
            message: format!("comment query: {err}"),
        },
    })
}
