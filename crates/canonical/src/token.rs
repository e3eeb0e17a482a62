use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::role::Role;

/// Location of a token in the original buffer.
///
/// Rows are zero-based line numbers, columns are zero-based byte offsets
/// within the row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionSpan {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl PositionSpan {
    pub fn of(node: &Node<'_>) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_row: start.row,
            start_col: start.column,
            end_row: end.row,
            end_col: end.column,
        }
    }

    pub fn is_single_line(&self) -> bool {
        self.start_row == self.end_row
    }

    /// Last row that actually holds characters of the span.
    ///
    /// Some grammars end a comment token at column 0 of the following row
    /// when the newline belongs to the token; that row is not covered.
    pub fn last_covered_row(&self) -> usize {
        if self.end_row > self.start_row && self.end_col == 0 {
            self.end_row - 1
        } else {
            self.end_row
        }
    }
}

/// An identifier occurrence resolved to a role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleSpan {
    pub role: Role,
    pub span: PositionSpan,
    /// Byte offset (inclusive) in the original buffer.
    pub start_byte: usize,
    /// Byte offset (exclusive) in the original buffer.
    pub end_byte: usize,
    /// Original identifier text.
    pub text: String,
}

impl RoleSpan {
    pub fn overlaps(&self, start_byte: usize, end_byte: usize) -> bool {
        self.start_byte < end_byte && start_byte < self.end_byte
    }
}
