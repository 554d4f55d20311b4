//! UI-side candidates: named nodes of a subtree

use std::fmt;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::WiringConfig;
use crate::model::{node_key, same_node, NodeRef, TypeInfo};
use crate::naming::{self, NodeName, SplitName};
use crate::report::{Severity, WiringReport};

#[derive(Clone)]
pub struct UiCandidate {
    pub declared_name: String,
    /// Base name and trailing sub-names (informational)
    pub name: NodeName,
    pub split_name: SplitName,
    pub node_type: TypeInfo,
    pub node: NodeRef,
}

impl UiCandidate {
    fn new(declared_name: String, name: NodeName, node: &NodeRef) -> Self {
        Self {
            split_name: naming::split(&declared_name),
            declared_name,
            name,
            node_type: node.type_info(),
            node: Rc::clone(node),
        }
    }

    /// Candidate for a node addressed directly rather than collected.
    pub(crate) fn for_node(declared_name: String, node: &NodeRef) -> Self {
        let name = NodeName::parse(&declared_name).unwrap_or_else(|| NodeName {
            base: declared_name.clone(),
            sub_names: Vec::new(),
        });
        Self::new(declared_name, name, node)
    }

    pub fn rank(&self) -> usize {
        self.split_name.len()
    }
}

impl fmt::Debug for UiCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiCandidate")
            .field("declared_name", &self.declared_name)
            .field("split_name", &self.split_name)
            .field("node_type", &self.node_type.name)
            .finish()
    }
}

/// Walk the subtree under `root` with an explicit stack and collect every
/// named node.
///
/// Names that are empty or start with `_` are skipped, but their children
/// are still visited. On duplicate names the last visited node wins.
pub fn collect_ui_candidates(
    root: &NodeRef,
    config: &WiringConfig,
    report: &mut WiringReport,
) -> Vec<UiCandidate> {
    let mut candidates: Vec<UiCandidate> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut visited: FxHashSet<usize> = FxHashSet::default();
    let mut stack: Vec<NodeRef> = vec![Rc::clone(root)];

    while let Some(node) = stack.pop() {
        if !visited.insert(node_key(&node)) {
            continue;
        }

        let is_root = same_node(&node, root);
        if !is_root || config.include_root {
            if let Some(declared) = node.declared_name() {
                record(&mut candidates, &mut index, declared, &node, report);
            }
        }

        if config.include_scope_names {
            for (name, entry) in node.scope_names() {
                record(&mut candidates, &mut index, name, &entry, report);
            }
        }

        // Pushed in reverse so that visual children pop first, in order.
        if config.include_logical_children {
            stack.extend(node.logical_children().into_iter().rev());
        }
        if config.include_visual_children {
            stack.extend(node.visual_children().into_iter().rev());
        }
    }

    candidates
}

fn record(
    candidates: &mut Vec<UiCandidate>,
    index: &mut FxHashMap<String, usize>,
    declared: String,
    node: &NodeRef,
    report: &mut WiringReport,
) {
    let Some(name) = NodeName::parse(&declared) else {
        return;
    };

    match index.get(&declared) {
        Some(&i) => {
            if !same_node(&candidates[i].node, node) {
                report.diagnose(
                    Severity::Warning,
                    &declared,
                    None,
                    format!(
                        "duplicate identifier: {} replaces {}",
                        node.type_info().name,
                        candidates[i].node_type.name
                    ),
                );
            }
            candidates[i] = UiCandidate::new(declared, name, node);
        }
        None => {
            index.insert(declared.clone(), candidates.len());
            candidates.push(UiCandidate::new(declared, name, node));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryNode;

    fn names(candidates: &[UiCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.declared_name.as_str()).collect()
    }

    #[test]
    fn collects_named_descendants_in_order() {
        let root = MemoryNode::builder("Views", "MainPage")
            .name("Root")
            .child(MemoryNode::builder("Controls", "Button").name("SaveButton"))
            .child(
                MemoryNode::builder("Controls", "Panel")
                    .child(MemoryNode::builder("Controls", "TextBox").name("Title_Text")),
            )
            .build();

        let mut report = WiringReport::new();
        let candidates = collect_ui_candidates(&root, &WiringConfig::default(), &mut report);

        assert_eq!(names(&candidates), ["Root", "SaveButton", "Title_Text"]);
        assert_eq!(candidates[2].split_name.as_slice(), ["Title", "Text"]);
        assert_eq!(candidates[2].name.base, "Title");
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn underscore_names_are_invisible_but_children_are_not() {
        let root = MemoryNode::builder("Views", "MainPage")
            .child(
                MemoryNode::builder("Controls", "Panel")
                    .name("_private")
                    .child(MemoryNode::builder("Controls", "Button").name("Inner")),
            )
            .build();

        let candidates = collect_ui_candidates(&root, &WiringConfig::default(), &mut WiringReport::new());
        assert_eq!(names(&candidates), ["Inner"]);
    }

    #[test]
    fn last_duplicate_wins_with_warning() {
        let root = MemoryNode::builder("Views", "MainPage")
            .child(MemoryNode::builder("Controls", "Button").name("Action"))
            .child(MemoryNode::builder("Controls", "Label").name("Action"))
            .build();

        let mut report = WiringReport::new();
        let candidates = collect_ui_candidates(&root, &WiringConfig::default(), &mut report);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].node_type.name, "Label");
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn child_sets_are_independently_configurable() {
        let root = MemoryNode::builder("Views", "MainPage")
            .child(MemoryNode::builder("Controls", "Button").name("Visual"))
            .logical_child(MemoryNode::builder("Controls", "Popup").name("Logical"))
            .build();

        let visual_only = WiringConfig {
            include_logical_children: false,
            ..WiringConfig::default()
        };
        let logical_only = WiringConfig {
            include_visual_children: false,
            ..WiringConfig::default()
        };

        let mut report = WiringReport::new();
        assert_eq!(names(&collect_ui_candidates(&root, &visual_only, &mut report)), ["Visual"]);
        assert_eq!(names(&collect_ui_candidates(&root, &logical_only, &mut report)), ["Logical"]);
        assert_eq!(
            names(&collect_ui_candidates(&root, &WiringConfig::default(), &mut report)),
            ["Visual", "Logical"]
        );
    }

    #[test]
    fn node_reachable_twice_is_visited_once() {
        let shared = MemoryNode::builder("Controls", "Button").name("Shared").build_rc();
        let root = MemoryNode::builder("Views", "MainPage")
            .child_node(shared.clone())
            .logical_child_node(shared)
            .build();

        let mut report = WiringReport::new();
        let candidates = collect_ui_candidates(&root, &WiringConfig::default(), &mut report);
        assert_eq!(names(&candidates), ["Shared"]);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn scope_names_are_opt_in() {
        let root = MemoryNode::builder("Views", "MainPage")
            .scope_name("Template_Part", MemoryNode::builder("Controls", "Border"))
            .build();

        let mut report = WiringReport::new();
        assert!(collect_ui_candidates(&root, &WiringConfig::default(), &mut report).is_empty());

        let config = WiringConfig {
            include_scope_names: true,
            ..WiringConfig::default()
        };
        assert_eq!(names(&collect_ui_candidates(&root, &config, &mut report)), ["Template_Part"]);
    }

    #[test]
    fn root_can_be_excluded() {
        let root = MemoryNode::builder("Views", "MainPage").name("Window").build();
        let config = WiringConfig {
            include_root: false,
            ..WiringConfig::default()
        };
        assert!(collect_ui_candidates(&root, &config, &mut WiringReport::new()).is_empty());
    }
}
