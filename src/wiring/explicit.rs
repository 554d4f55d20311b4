//! Explicit bindings: one UI member bound to a named method or property

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{probe_link, AutoWire, BindFailure};
use crate::binder::{Binder, BindingMode};
use crate::candidate::TargetCandidate;
use crate::error::{Result, WireError};
use crate::model::{MemberDescriptor, NodeRef, ObjectRef};
use crate::naming;
use crate::report::BindingRecord;

/// One explicit binding declared on a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplicitBinding {
    /// Node member receiving the binding (`Click`, `Text`, `Command`, ...)
    pub ui_member: String,
    pub method_name: Option<String>,
    pub property_name: Option<String>,
    pub mode: Option<BindingMode>,
    pub handled_events_too: bool,
}

impl ExplicitBinding {
    pub fn method(ui_member: &str, method_name: &str) -> Self {
        Self {
            ui_member: ui_member.to_string(),
            method_name: Some(method_name.to_string()),
            ..Self::default()
        }
    }

    pub fn property(ui_member: &str, property_name: &str) -> Self {
        Self {
            ui_member: ui_member.to_string(),
            property_name: Some(property_name.to_string()),
            ..Self::default()
        }
    }

    /// Exactly one of `method_name` and `property_name` must be set.
    pub fn validate(&self) -> Result<&str> {
        fn set(name: &Option<String>) -> Option<&str> {
            name.as_deref().filter(|n| !n.is_empty())
        }
        match (set(&self.method_name), set(&self.property_name)) {
            (Some(_), Some(_)) => Err(WireError::BothSourcesSet {
                ui_member: self.ui_member.clone(),
            }),
            (None, None) => Err(WireError::NoSourceSet {
                ui_member: self.ui_member.clone(),
            }),
            (Some(name), None) | (None, Some(name)) => Ok(name),
        }
    }
}

impl<B: Binder> AutoWire<B> {
    /// Bind `binding` on `node` against `object`.
    ///
    /// Unlike convention wiring, every failure is returned to the caller.
    pub fn bind_explicit(&self, node: &NodeRef, object: &ObjectRef, binding: &ExplicitBinding) -> Result<BindingRecord> {
        let source_name = binding.validate()?;
        let fail = |reason: String| WireError::ExplicitBinding {
            ui_member: binding.ui_member.clone(),
            reason,
        };

        let wants_method = binding.method_name.as_deref() == Some(source_name);
        let observable = object.property_changed().is_some();
        let member = object
            .members()
            .into_iter()
            .find(|m| {
                m.name() == source_name
                    && matches!(
                        (m, wants_method),
                        (MemberDescriptor::Method(_), true) | (MemberDescriptor::Property(_), false)
                    )
            })
            .ok_or_else(|| fail(format!("{} has no member '{source_name}'", object.type_info().name)))?;

        let target = probe_link(node, &binding.ui_member)
            .ok_or_else(|| fail(format!("{} has no member '{}'", node.type_info().name, binding.ui_member)))?;

        let declared = super::describe_node(node);
        let copy_only = match &member {
            MemberDescriptor::Property(p) => {
                binding.mode == Some(BindingMode::OneTime) || (!p.is_writable() && !observable)
            }
            _ => false,
        };
        let candidate = TargetCandidate {
            member_name: source_name.to_string(),
            match_name: declared.clone(),
            split_name: naming::split(&declared),
            kind: member.kind(),
            owner: std::rc::Rc::clone(object),
            member,
            target_links: vec![binding.ui_member.clone()],
            copy_only,
            mode: binding.mode,
            handled_events_too: binding.handled_events_too,
        };
        let ui = crate::candidate::UiCandidate::for_node(declared, node);

        debug!(node = %ui.declared_name, ui_member = %binding.ui_member, source = source_name, "explicit binding");
        let result = match &target {
            super::ResolvedTarget::Node => Err(BindFailure::KindMismatch {
                target: candidate.kind,
                ui: target.describe(),
            }),
            _ => self.bind_member(&ui, &candidate, target.clone(), None, &mut Vec::new()),
        };

        match result {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(fail(format!("{source_name} is already subscribed"))),
            Err(failure) => Err(fail(failure.to_string())),
        }
    }
}
