use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use tree_sitter::Parser;

use crate::config::NormalizerConfig;
use crate::document::{CanonicalText, Normalized, PlaceholderAssignment, SourceUnit};
use crate::error::CanonicalError;
use crate::extract::RoleExtractor;
use crate::languages::Language;
use crate::role::Role;
use crate::token::{PositionSpan, RoleSpan};

/// Main entry point. Rewrites a source unit into its canonical form.
pub fn normalize(
    source: &SourceUnit,
    cfg: &NormalizerConfig,
) -> Result<CanonicalText, CanonicalError> {
    normalize_detailed(source, cfg).map(|normalized| normalized.text)
}

/// Like [`normalize`], but also returns the claimed spans and the placeholder
/// table.
#[tracing::instrument(level = "debug", skip_all, fields(language = source.language(), bytes = source.text().len()))]
pub fn normalize_detailed(
    source: &SourceUnit,
    cfg: &NormalizerConfig,
) -> Result<Normalized, CanonicalError> {
    cfg.validate()?;

    let language = Language::from_tag(source.language())
        .filter(|language| cfg.is_enabled(*language))
        .ok_or_else(|| CanonicalError::UnsupportedLanguage(source.language().to_string()))?;

    let text = source.text();
    if text.len() > cfg.max_source_bytes {
        return Err(CanonicalError::InputTooLarge {
            bytes: text.len(),
            limit: cfg.max_source_bytes,
        });
    }

    let profile = language.profile();
    let mut parser = Parser::new();
    parser
        .set_language(&(profile.grammar)())
        .map_err(|err| CanonicalError::Grammar {
            language: language.tag().to_string(),
            message: err.to_string(),
        })?;
    if cfg.parse_timeout_micros > 0 {
        parser.set_timeout_micros(cfg.parse_timeout_micros);
    }

    let tree = parser
        .parse(text, None)
        .ok_or_else(|| CanonicalError::ParseFailure {
            language: language.tag().to_string(),
            reason: "parser produced no tree (timed out or cancelled)".into(),
        })?;

    let extraction = profile.extract_roles(&tree, text)?;
    if extraction.had_syntax_errors {
        debug!(language = %language, "syntax errors in source, normalizing best-effort");
    }

    let mut state = NormalizationState::new();
    let edits: Vec<(&RoleSpan, String)> = extraction
        .spans
        .iter()
        .map(|span| (span, state.assign(span.role, &span.text).to_string()))
        .collect();

    let canonical = rewrite(text, &edits, &extraction.comments);
    debug!(
        spans = extraction.spans.len(),
        comments = extraction.comments.len(),
        "normalized unit"
    );

    Ok(Normalized {
        text: CanonicalText::new(canonical),
        spans: extraction.spans,
        placeholders: state.into_assignments(),
        had_syntax_errors: extraction.had_syntax_errors,
    })
}

/// Placeholder table for one normalization pass.
///
/// Each role keeps its own counter; the first occurrence of a name fixes its
/// placeholder for the rest of the pass.
#[derive(Debug, Default)]
pub struct NormalizationState {
    counters: HashMap<Role, usize>,
    table: HashMap<(Role, String), String>,
    order: Vec<(Role, String)>,
}

impl NormalizationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder for `name` in `role`, allocating the next one if unseen.
    pub fn assign(&mut self, role: Role, name: &str) -> &str {
        let key = (role, name.to_string());
        if !self.table.contains_key(&key) {
            let counter = self.counters.entry(role).or_insert(0);
            let placeholder = role.placeholder(*counter);
            *counter += 1;
            self.order.push(key.clone());
            self.table.insert(key.clone(), placeholder);
        }
        self.table.get(&key).map(String::as_str).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn into_assignments(mut self) -> Vec<PlaceholderAssignment> {
        self.order
            .into_iter()
            .filter_map(|(role, original)| {
                let placeholder = self.table.remove(&(role, original.clone()))?;
                Some(PlaceholderAssignment {
                    role,
                    original,
                    placeholder,
                })
            })
            .collect()
    }
}

enum Edit<'a> {
    Replace { end_col: usize, with: &'a str },
    BlankToEnd,
}

fn rewrite(source: &str, spans: &[(&RoleSpan, String)], comments: &[PositionSpan]) -> String {
    let mut per_row: BTreeMap<usize, Vec<(usize, Edit<'_>)>> = BTreeMap::new();
    let mut blank_rows: Vec<usize> = Vec::new();

    for (span, placeholder) in spans {
        if !span.span.is_single_line() {
            continue;
        }
        per_row.entry(span.span.start_row).or_default().push((
            span.span.start_col,
            Edit::Replace {
                end_col: span.span.end_col,
                with: placeholder.as_str(),
            },
        ));
    }
    for comment in comments {
        per_row
            .entry(comment.start_row)
            .or_default()
            .push((comment.start_col, Edit::BlankToEnd));
        blank_rows.extend(comment.start_row + 1..=comment.last_covered_row());
    }
    blank_rows.sort_unstable();
    blank_rows.dedup();

    let lines: Vec<String> = source
        .split('\n')
        .enumerate()
        .map(|(row, line)| {
            if blank_rows.binary_search(&row).is_ok() {
                return String::new();
            }
            match per_row.get_mut(&row) {
                Some(edits) => {
                    edits.sort_by_key(|(col, _)| *col);
                    apply_edits(line, edits).trim_end().to_string()
                }
                None => line.trim_end().to_string(),
            }
        })
        .collect();

    lines.join("\n")
}

fn apply_edits(line: &str, edits: &[(usize, Edit<'_>)]) -> String {
    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    for (start, edit) in edits {
        let start = *start;
        if start < cursor {
            continue;
        }
        let Some(prefix) = line.get(cursor..start) else {
            continue;
        };
        match edit {
            Edit::Replace { end_col, with } => {
                if line.get(start..*end_col).is_none() {
                    continue;
                }
                out.push_str(prefix);
                out.push_str(with);
                cursor = *end_col;
            }
            Edit::BlankToEnd => {
                out.push_str(prefix);
                return out;
            }
        }
    }
    out.push_str(line.get(cursor..).unwrap_or_default());
    out
}
