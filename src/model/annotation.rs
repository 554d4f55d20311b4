//! Declarative member annotations
//!
//! Annotations are input metadata attached to target-object members. They
//! never carry behavior; the candidate collector interprets them.

use serde::{Deserialize, Serialize};

use crate::binder::BindingMode;

/// One declarative annotation on a target-object member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    /// Explicit UI-side member names the member binds to under its own name.
    Targets { targets: Vec<String> },

    /// Independent candidate matching `name` and binding to `targets`.
    Alias {
        name: String,
        targets: Vec<String>,
        #[serde(default)]
        mode: Option<BindingMode>,
        #[serde(default)]
        handled_events_too: bool,
    },

    /// Field receives the node named `node`.
    NodeReference { node: String },

    /// Field receives the value of `target` on the node named `node`.
    NodeTarget { node: String, target: String },

    /// Property holds a sub-object whose members join the candidate pool.
    Append,
}

impl Annotation {
    pub fn targets(targets: &[&str]) -> Self {
        Annotation::Targets {
            targets: targets.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn alias(name: &str, targets: &[&str]) -> Self {
        Annotation::Alias {
            name: name.to_string(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
            mode: None,
            handled_events_too: false,
        }
    }

    pub fn is_append(&self) -> bool {
        matches!(self, Annotation::Append)
    }
}
