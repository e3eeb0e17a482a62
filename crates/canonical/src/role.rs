use serde::{Deserialize, Serialize};

/// Structural role of an identifier occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Class,
    Method,
    Property,
    Function,
    Call,
    Variable,
}

impl Role {
    /// Resolution order: a span claimed by an earlier role is never
    /// reclassified by a later one.
    pub const PRECEDENCE: [Role; 6] = [
        Role::Class,
        Role::Method,
        Role::Property,
        Role::Function,
        Role::Call,
        Role::Variable,
    ];

    /// Upper-case label used inside placeholders.
    pub fn label(self) -> &'static str {
        match self {
            Role::Class => "CLASS",
            Role::Method => "METHOD",
            Role::Property => "PROPERTY",
            Role::Function => "FUNCTION",
            Role::Call => "CALL",
            Role::Variable => "VARIABLE",
        }
    }

    /// Placeholder for the `n`-th distinct name of this role, e.g. `_CALL_2`.
    pub fn placeholder(self, n: usize) -> String {
        format!("_{}_{}", self.label(), n)
    }
}
