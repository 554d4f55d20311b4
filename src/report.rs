//! Pass report: bindings performed and diagnostics collected
//!
//! Resolution misses never raise errors; they land here and in the log.

use std::fmt;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::binder::BindingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Declared name of the node (or type name during discovery)
    pub node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    pub message: String,
}

/// How a pairing was bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingKind {
    Copy,
    Sync { mode: BindingMode },
    Event { handled_events_too: bool },
    Command,
    CompositeCommand,
    Field,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Copy => write!(f, "copy"),
            BindingKind::Sync { mode } => write!(f, "sync ({mode})"),
            BindingKind::Event { handled_events_too: true } => write!(f, "event (handled too)"),
            BindingKind::Event { .. } => write!(f, "event"),
            BindingKind::Command => write!(f, "command"),
            BindingKind::CompositeCommand => write!(f, "composite command"),
            BindingKind::Field => write!(f, "field"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingRecord {
    pub node: String,
    /// UI-side member (or `this` for node references)
    pub ui_member: String,
    /// Target-side member(s); composite commands list both halves
    pub target_members: Vec<String>,
    pub binding: BindingKind,
}

impl fmt::Display for BindingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} <- {} [{}]",
            self.node,
            self.ui_member,
            self.target_members.join(" + "),
            self.binding
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WiringReport {
    pub bindings: Vec<BindingRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl WiringReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bound(&mut self, record: BindingRecord) {
        debug!(binding = %record, "bound");
        self.bindings.push(record);
    }

    pub fn diagnose(
        &mut self,
        severity: Severity,
        node: &str,
        member: Option<&str>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        match severity {
            Severity::Info => debug!(node, member, "{}", message),
            Severity::Warning => warn!(node, member, "{}", message),
            Severity::Error => error!(node, member, "{}", message),
        }
        self.diagnostics.push(Diagnostic {
            severity,
            node: node.to_string(),
            member: member.map(str::to_string),
            message,
        });
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Bindings made on the node with this declared name.
    pub fn bindings_for<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a BindingRecord> + 'a {
        self.bindings.iter().filter(move |b| b.node == node)
    }

    pub fn merge(&mut self, other: WiringReport) {
        self.bindings.extend(other.bindings);
        self.diagnostics.extend(other.diagnostics);
    }
}
