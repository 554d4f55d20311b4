//! Probing a UI node for the member behind a target-link name

use std::fmt;

use crate::candidate::link;
use crate::model::{EventDescriptor, MemberDescriptor, NodeRef, PropertyDescriptor};

/// What a target-link name resolved to on the node.
#[derive(Clone)]
pub enum ResolvedTarget {
    Property(PropertyDescriptor),
    Event(EventDescriptor),
    /// The node's command property, taking a full command provider
    Command(PropertyDescriptor),
    /// The node's command property, taking one half of a composite command
    CommandRole {
        property: PropertyDescriptor,
        role: &'static str,
    },
    /// The node itself
    Node,
}

impl ResolvedTarget {
    /// UI-side member name, as recorded in reports.
    pub fn ui_member(&self) -> &str {
        match self {
            ResolvedTarget::Property(p) | ResolvedTarget::Command(p) => &p.name,
            ResolvedTarget::CommandRole { property, .. } => &property.name,
            ResolvedTarget::Event(e) => &e.name,
            ResolvedTarget::Node => link::NODE_SELF,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ResolvedTarget::Property(_) => "property",
            ResolvedTarget::Event(_) => "event",
            ResolvedTarget::Command(_) | ResolvedTarget::CommandRole { .. } => "command property",
            ResolvedTarget::Node => "node reference",
        }
    }
}

impl fmt::Debug for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.describe(), self.ui_member())
    }
}

/// Resolve the first target-link name the node offers, in declaration order.
pub fn probe(node: &NodeRef, links: &[String]) -> Option<(String, ResolvedTarget)> {
    links
        .iter()
        .find_map(|l| probe_link(node, l).map(|target| (l.clone(), target)))
}

pub fn probe_link(node: &NodeRef, name: &str) -> Option<ResolvedTarget> {
    match name {
        link::NODE_SELF => Some(ResolvedTarget::Node),
        link::COMMAND => command_property(node).map(ResolvedTarget::Command),
        link::COMMAND_EXECUTE => command_property(node).map(|property| ResolvedTarget::CommandRole {
            property,
            role: link::COMMAND_EXECUTE,
        }),
        link::COMMAND_CAN_EXECUTE => command_property(node).map(|property| ResolvedTarget::CommandRole {
            property,
            role: link::COMMAND_CAN_EXECUTE,
        }),
        _ => {
            // Attached members are declared as `Type.Member`.
            let member = node
                .member(name)
                .or_else(|| node.member(&format!("{}.{}", node.type_info().name, name)))?;
            match member {
                MemberDescriptor::Property(p) => Some(ResolvedTarget::Property(p)),
                MemberDescriptor::Event(e) => Some(ResolvedTarget::Event(e)),
                _ => None,
            }
        }
    }
}

fn command_property(node: &NodeRef) -> Option<PropertyDescriptor> {
    match node.member(link::COMMAND)? {
        MemberDescriptor::Property(p) => Some(p),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryNode;
    use crate::model::ValueKind;

    fn button() -> NodeRef {
        MemoryNode::builder("Controls", "Button")
            .name("Save")
            .property("Content", ValueKind::Any, "Save")
            .property("Command", ValueKind::Command, crate::model::Value::Null)
            .property("Button.Tooltip", ValueKind::Text, "hint")
            .event("Click")
            .build()
    }

    #[test]
    fn probes_in_declaration_order() {
        let links = vec!["Missing".to_string(), "Click".to_string(), "Content".to_string()];
        let (l, target) = probe(&button(), &links).unwrap();
        assert_eq!(l, "Click");
        assert!(matches!(target, ResolvedTarget::Event(_)));
    }

    #[test]
    fn command_roles_resolve_to_command_property() {
        let node = button();
        let target = probe_link(&node, link::COMMAND_CAN_EXECUTE).unwrap();
        assert_eq!(target.ui_member(), "Command");
        assert!(matches!(
            target,
            ResolvedTarget::CommandRole { role: link::COMMAND_CAN_EXECUTE, .. }
        ));
    }

    #[test]
    fn type_qualified_fallback() {
        let target = probe_link(&button(), "Tooltip").unwrap();
        assert_eq!(target.ui_member(), "Button.Tooltip");
    }

    #[test]
    fn nothing_found() {
        assert!(probe(&button(), &["Text".to_string()]).is_none());
        assert!(matches!(probe_link(&button(), link::NODE_SELF), Some(ResolvedTarget::Node)));
    }
}
