use std::sync::OnceLock;

use tree_sitter::Node;

use super::{always, parent_is_callee, Language, LanguageProfile, RoleRule};
use crate::role::Role;

pub(super) static PROFILE: LanguageProfile = LanguageProfile {
    language: Language::Rust,
    grammar,
    rules: &RULES,
    comment_query: "[(line_comment) (block_comment)] @comment",
    compiled: OnceLock::new(),
};

static RULES: [RoleRule; 11] = [
    RoleRule {
        role: Role::Class,
        query: "(type_identifier) @name",
        keep: always,
    },
    RoleRule {
        role: Role::Method,
        query: "(function_item name: (identifier) @name)",
        keep: in_impl_or_trait,
    },
    RoleRule {
        role: Role::Method,
        query: "(function_signature_item name: (identifier) @name)",
        keep: in_impl_or_trait,
    },
    RoleRule {
        role: Role::Property,
        query: "(field_declaration name: (field_identifier) @name)",
        keep: always,
    },
    RoleRule {
        role: Role::Property,
        query: "(field_initializer field: (field_identifier) @name)",
        keep: always,
    },
    RoleRule {
        role: Role::Property,
        query: "(field_expression field: (field_identifier) @name)",
        keep: not_called,
    },
    RoleRule {
        role: Role::Function,
        query: "(function_item name: (identifier) @name)",
        keep: always,
    },
    RoleRule {
        role: Role::Call,
        query: "(call_expression function: (identifier) @name)",
        keep: always,
    },
    RoleRule {
        role: Role::Call,
        query: "(call_expression function: (field_expression field: (field_identifier) @name))",
        keep: always,
    },
    RoleRule {
        role: Role::Call,
        query: "(call_expression function: (scoped_identifier name: (identifier) @name))",
        keep: always,
    },
    RoleRule {
        role: Role::Variable,
        query: "(identifier) @name",
        keep: always,
    },
];

fn grammar() -> tree_sitter::Language {
    tree_sitter_rust::LANGUAGE.into()
}

fn not_called(node: Node<'_>, _: &str) -> bool {
    !parent_is_callee(node)
}

/// `fn` items declared directly inside an `impl` or `trait` body.
fn in_impl_or_trait(node: Node<'_>, _: &str) -> bool {
    node.parent()
        .and_then(|item| item.parent())
        .filter(|body| body.kind() == "declaration_list")
        .and_then(|body| body.parent())
        .is_some_and(|owner| matches!(owner.kind(), "impl_item" | "trait_item"))
}
