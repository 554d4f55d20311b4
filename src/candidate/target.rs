//! Target-side candidates: members of the bound object and its appended
//! sub-objects
//!
//! Two rules produce candidates from one member:
//! - convention: `Save_Click` matches `Save` and links to `Click`
//! - annotations: `Targets` binds the full name to declared targets, each
//!   `Alias` adds an independent candidate under the alias name
//!
//! A bare single-token name without annotations never targets anything.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::binder::BindingMode;
use crate::model::{object_key, Annotation, MemberDescriptor, MemberKind, ObjectRef, Value};
use crate::naming::{self, SplitName};

/// Reserved UI-side member names.
pub mod link {
    /// Full command-interface provider
    pub const COMMAND: &str = "Command";
    /// Execute half of a composite command
    pub const COMMAND_EXECUTE: &str = "Command.Execute";
    /// Can-execute half of a composite command
    pub const COMMAND_CAN_EXECUTE: &str = "Command.CanExecute";
    /// The node itself (source-reference wiring)
    pub const NODE_SELF: &str = "this";

    /// Role of a composite command link, with its counterpart.
    pub fn opposite_role(link: &str) -> Option<&'static str> {
        match link {
            COMMAND_EXECUTE => Some(COMMAND_CAN_EXECUTE),
            COMMAND_CAN_EXECUTE => Some(COMMAND_EXECUTE),
            _ => None,
        }
    }
}

/// One way a target member offers itself for binding.
#[derive(Clone)]
pub struct TargetCandidate {
    pub member_name: String,
    /// Name matched against node names (member prefix or alias)
    pub match_name: String,
    pub split_name: SplitName,
    pub kind: MemberKind,
    pub owner: ObjectRef,
    pub member: MemberDescriptor,
    /// UI-side member names, probed in order
    pub target_links: Vec<String>,
    /// Bind by one-time copy instead of synchronization
    pub copy_only: bool,
    pub mode: Option<BindingMode>,
    pub handled_events_too: bool,
}

impl TargetCandidate {
    pub fn rank(&self) -> usize {
        self.split_name.len()
    }

    pub fn links_to(&self, link: &str) -> bool {
        self.target_links.iter().any(|l| l == link)
    }
}

impl fmt::Debug for TargetCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetCandidate")
            .field("member", &self.member_name)
            .field("match_name", &self.match_name)
            .field("kind", &self.kind)
            .field("links", &self.target_links)
            .finish()
    }
}

/// Collect candidates from `root` and every object reachable through
/// `Append`-annotated properties.
///
/// Appended objects are walked with a work queue; an object reachable twice
/// is visited once.
pub fn collect_target_candidates(root: &ObjectRef) -> Vec<TargetCandidate> {
    let mut candidates = Vec::new();
    let mut visited: FxHashSet<usize> = FxHashSet::default();
    let mut queue: Vec<ObjectRef> = vec![Rc::clone(root)];

    while let Some(object) = queue.pop() {
        if !visited.insert(object_key(&object)) {
            continue;
        }
        let observable = object.property_changed().is_some();

        for member in object.members() {
            if let MemberDescriptor::Property(property) = &member {
                if property.annotations.iter().any(Annotation::is_append) {
                    match property.get() {
                        Value::Object(appended) => queue.push(appended),
                        other => debug!(
                            property = %property.name,
                            value = ?other,
                            "append annotation on a property without an object"
                        ),
                    }
                }
            }
            candidates_for_member(&object, &member, observable, &mut candidates);
        }
    }

    candidates
}

fn candidates_for_member(
    owner: &ObjectRef,
    member: &MemberDescriptor,
    observable: bool,
    out: &mut Vec<TargetCandidate>,
) {
    let kind = member.kind();
    if kind == MemberKind::Event {
        return;
    }

    let copy_only = match member {
        MemberDescriptor::Property(p) => !p.is_writable() && !observable,
        _ => false,
    };

    let new_candidate = |match_name: String, split_name: SplitName, target_links: Vec<String>| TargetCandidate {
        member_name: member.name().to_string(),
        match_name,
        split_name,
        kind,
        owner: Rc::clone(owner),
        member: member.clone(),
        target_links,
        copy_only,
        mode: None,
        handled_events_too: false,
    };

    let split = naming::split(member.name());

    // Convention: trailing tokens name the UI-side member.
    if split.len() > 1 {
        let (prefix, link) = convention_link(&split);
        if !prefix.is_empty() {
            out.push(new_candidate(naming::join(&prefix), prefix, vec![link]));
        }
    }

    for annotation in member.annotations() {
        match annotation {
            Annotation::Targets { targets } if !split.is_empty() && !targets.is_empty() => {
                out.push(new_candidate(member.name().to_string(), split.clone(), dedup(targets)));
            }
            Annotation::Alias {
                name,
                targets,
                mode,
                handled_events_too,
            } => {
                let alias_split = naming::split(name);
                if alias_split.is_empty() || targets.is_empty() {
                    continue;
                }
                let mut candidate = new_candidate(name.clone(), alias_split, dedup(targets));
                candidate.mode = *mode;
                candidate.copy_only = copy_only || *mode == Some(BindingMode::OneTime);
                candidate.handled_events_too = *handled_events_too;
                out.push(candidate);
            }
            Annotation::NodeReference { node } if kind == MemberKind::Field => {
                let node_split = naming::split(node);
                if !node_split.is_empty() {
                    out.push(new_candidate(node.clone(), node_split, vec![link::NODE_SELF.to_string()]));
                }
            }
            Annotation::NodeTarget { node, target } if kind == MemberKind::Field => {
                let node_split = naming::split(node);
                if !node_split.is_empty() {
                    out.push(new_candidate(node.clone(), node_split, vec![target.clone()]));
                }
            }
            _ => {}
        }
    }
}

/// Split a name of two or more tokens into its match prefix and implied link.
///
/// `…Can Execute` and `…Execute` tails name the composite command roles.
fn convention_link(split: &SplitName) -> (SplitName, String) {
    let n = split.len();
    let last = split[n - 1].as_str();

    if last.eq_ignore_ascii_case("Execute") {
        if n >= 3 && split[n - 2].eq_ignore_ascii_case("Can") {
            return (
                split[..n - 2].iter().cloned().collect(),
                link::COMMAND_CAN_EXECUTE.to_string(),
            );
        }
        return (
            split[..n - 1].iter().cloned().collect(),
            link::COMMAND_EXECUTE.to_string(),
        );
    }

    (split[..n - 1].iter().cloned().collect(), last.to_string())
}

fn dedup(targets: &[String]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    targets
        .iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}
