use std::sync::OnceLock;

use tree_sitter::Node;

use super::{always, parent_is_callee, Language, LanguageProfile, RoleRule};
use crate::role::Role;

pub(super) static PROFILE: LanguageProfile = LanguageProfile {
    language: Language::JavaScript,
    grammar,
    rules: &RULES,
    comment_query: "(comment) @comment",
    compiled: OnceLock::new(),
};

static RULES: [RoleRule; 8] = [
    RoleRule {
        role: Role::Class,
        query: "(class_declaration name: (identifier) @name)",
        keep: always,
    },
    RoleRule {
        role: Role::Method,
        query: "(method_definition name: (property_identifier) @name)",
        keep: not_constructor,
    },
    RoleRule {
        role: Role::Property,
        query: "(member_expression property: (property_identifier) @name)",
        keep: not_called,
    },
    RoleRule {
        role: Role::Function,
        query: "(function_declaration name: (identifier) @name)",
        keep: always,
    },
    RoleRule {
        role: Role::Function,
        query: "(generator_function_declaration name: (identifier) @name)",
        keep: always,
    },
    RoleRule {
        role: Role::Call,
        query: "(call_expression function: (identifier) @name)",
        keep: always,
    },
    RoleRule {
        role: Role::Call,
        query: "(call_expression function: (member_expression property: (property_identifier) @name))",
        keep: always,
    },
    RoleRule {
        role: Role::Variable,
        query: "(identifier) @name",
        keep: always,
    },
];

fn grammar() -> tree_sitter::Language {
    tree_sitter_javascript::LANGUAGE.into()
}

fn not_constructor(_: Node<'_>, name: &str) -> bool {
    name != "constructor"
}

fn not_called(node: Node<'_>, _: &str) -> bool {
    !parent_is_callee(node)
}
