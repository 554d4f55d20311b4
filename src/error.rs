//! Error types with fix suggestions
//!
//! Only malformed configuration is fatal. Resolution misses and kind
//! mismatches are reported as diagnostics, and binder failures are caught
//! at the [`Binder`](crate::binder::Binder) boundary as [`BindError`].

use thiserror::Error;

use crate::model::ValueKind;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Caller-visible errors.
#[derive(Error, Debug)]
pub enum WireError {
    // ─────────────────────────────────────────────────────────────
    // Configuration errors (AW-010 to AW-013)
    // ─────────────────────────────────────────────────────────────
    #[error("AW-010: Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("AW-011: '{set}' is set but '{missing}' is empty (both are required together)")]
    JointlyRequired { set: String, missing: String },

    #[error("AW-012: '{first}' and '{second}' are mutually exclusive")]
    MutuallyExclusive { first: String, second: String },

    #[error("AW-013: All instance resolution strategies are disabled")]
    NoStrategyEnabled,

    // ─────────────────────────────────────────────────────────────
    // Explicit binding errors (AW-020 to AW-022)
    // ─────────────────────────────────────────────────────────────
    #[error("AW-020: Explicit binding for '{ui_member}' sets both MethodName and PropertyName")]
    BothSourcesSet { ui_member: String },

    #[error("AW-021: Explicit binding for '{ui_member}' sets neither MethodName nor PropertyName")]
    NoSourceSet { ui_member: String },

    #[error("AW-022: Explicit binding failed for '{ui_member}': {reason}")]
    ExplicitBinding { ui_member: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Scene file errors (AW-030 to AW-034)
    // ─────────────────────────────────────────────────────────────
    #[error("AW-030: Scene parse error: {0}")]
    SceneParse(#[from] serde_yaml::Error),

    #[error("AW-031: Scene references unknown type '{name}'")]
    UnknownType { name: String },

    #[error("AW-032: Invalid event reference '{reference}' (expected Node.Event)")]
    InvalidEventReference { reference: String },

    #[error("AW-033: Node '{node}' not found in scene")]
    NodeNotFound { node: String },

    #[error("AW-034: Invalid scene schema: expected '{expected}', got '{found}'")]
    InvalidSchema { expected: String, found: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FixSuggestion for WireError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            WireError::Configuration { .. } => Some("Check the resolver options set before the pass"),
            WireError::JointlyRequired { .. } => {
                Some("Set both the token and its replacement, or leave both empty")
            }
            WireError::MutuallyExclusive { .. } => Some("Keep only one of the two options"),
            WireError::NoStrategyEnabled => {
                Some("Enable at least one of use_container, use_resources, use_default_construction")
            }
            WireError::BothSourcesSet { .. } => Some("Remove either method_name or property_name"),
            WireError::NoSourceSet { .. } => Some("Set method_name or property_name"),
            WireError::ExplicitBinding { .. } => {
                Some("Verify the member exists on both the node and the bound object")
            }
            WireError::SceneParse(_) => Some("Check YAML syntax: indentation and quoting"),
            WireError::UnknownType { .. } => Some("Declare the type under types: in the scene"),
            WireError::InvalidEventReference { .. } => Some("Use the form NodeName.EventName"),
            WireError::NodeNotFound { .. } => Some("Check the node name declared in the scene tree"),
            WireError::InvalidSchema { .. } => Some("Start the scene with: schema: autowire/scene@0.1"),
            WireError::Io(_) => Some("Check file path and permissions"),
        }
    }
}

/// Failures inside the binder. Logged and skipped, never propagated out of a pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    #[error("value of kind {actual} is not assignable to '{member}' ({expected})")]
    TypeMismatch {
        member: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("'{member}' is read-only")]
    ReadOnly { member: String },

    #[error("'{member}' does not support {operation}")]
    Unsupported { member: String, operation: String },

    #[error("invocation of '{member}' failed: {reason}")]
    Invocation { member: String, reason: String },
}

pub type Result<T> = std::result::Result<T, WireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_in_messages() {
        let err = WireError::BothSourcesSet { ui_member: "Command".into() };
        assert!(err.to_string().starts_with("AW-020"));

        let err = WireError::NoStrategyEnabled;
        assert!(err.to_string().contains("AW-013"));
    }

    #[test]
    fn every_error_has_a_suggestion() {
        let errors = vec![
            WireError::Configuration { reason: "x".into() },
            WireError::JointlyRequired { set: "a".into(), missing: "b".into() },
            WireError::MutuallyExclusive { first: "a".into(), second: "b".into() },
            WireError::NoSourceSet { ui_member: "Click".into() },
            WireError::UnknownType { name: "MainViewModel".into() },
        ];
        for err in errors {
            assert!(err.fix_suggestion().is_some(), "missing suggestion for {err}");
        }
    }

    #[test]
    fn bind_error_display() {
        let err = BindError::TypeMismatch {
            member: "IsEnabled".into(),
            expected: ValueKind::Bool,
            actual: ValueKind::Text,
        };
        assert_eq!(
            err.to_string(),
            "value of kind text is not assignable to 'IsEnabled' (bool)"
        );
    }
}
