use std::sync::OnceLock;

use tree_sitter::Node;

use super::{always, parent_is_callee, Language, LanguageProfile, RoleRule};
use crate::role::Role;

pub(super) static PROFILE: LanguageProfile = LanguageProfile {
    language: Language::Python,
    grammar,
    rules: &RULES,
    comment_query: "(comment) @comment",
    compiled: OnceLock::new(),
};

static RULES: [RoleRule; 7] = [
    RoleRule {
        role: Role::Class,
        query: "(class_definition name: (identifier) @name)",
        keep: always,
    },
    RoleRule {
        role: Role::Method,
        query: "(function_definition name: (identifier) @name)",
        keep: is_method,
    },
    RoleRule {
        role: Role::Property,
        query: "(attribute attribute: (identifier) @name)",
        keep: is_plain_attribute,
    },
    RoleRule {
        role: Role::Function,
        query: "(function_definition name: (identifier) @name)",
        keep: not_dunder,
    },
    RoleRule {
        role: Role::Call,
        query: "(call function: (identifier) @name)",
        keep: not_dunder,
    },
    RoleRule {
        role: Role::Call,
        query: "(call function: (attribute attribute: (identifier) @name))",
        keep: not_dunder,
    },
    RoleRule {
        role: Role::Variable,
        query: "(identifier) @name",
        keep: not_dunder,
    },
];

fn grammar() -> tree_sitter::Language {
    tree_sitter_python::LANGUAGE.into()
}

/// `__init__`, `__name__` and friends carry protocol meaning and stay as is.
fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

fn not_dunder(_: Node<'_>, name: &str) -> bool {
    !is_dunder(name)
}

fn is_plain_attribute(node: Node<'_>, name: &str) -> bool {
    !is_dunder(name) && !parent_is_callee(node)
}

/// A `def` whose enclosing block is a class body, possibly via a decorator.
fn is_method(node: Node<'_>, name: &str) -> bool {
    if is_dunder(name) {
        return false;
    }
    let Some(mut def) = node.parent() else {
        return false;
    };
    if let Some(decorated) = def.parent().filter(|p| p.kind() == "decorated_definition") {
        def = decorated;
    }
    def.parent()
        .filter(|block| block.kind() == "block")
        .and_then(|block| block.parent())
        .is_some_and(|owner| owner.kind() == "class_definition")
}
