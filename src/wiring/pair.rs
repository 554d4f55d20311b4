//! Per-node working lists of matching pairs

use crate::candidate::{TargetCandidate, UiCandidate};
use crate::model::MemberKind;
use crate::naming::{self, MatchQuality};

/// A target candidate paired with one UI node.
#[derive(Debug, Clone)]
pub struct MatchingPair {
    pub candidate: TargetCandidate,
    pub rank: usize,
    pub quality: MatchQuality,
}

impl MatchingPair {
    /// Pair a candidate with a node. Returns `None` unless the node name is
    /// fully covered by the candidate name.
    pub fn new(ui: &UiCandidate, candidate: &TargetCandidate) -> Option<Self> {
        let rank = naming::matching_rank(ui.split_name.as_slice(), candidate.split_name.as_slice());
        let quality = MatchQuality::classify(rank, ui.rank(), candidate.rank())?;
        Some(Self {
            candidate: candidate.clone(),
            rank,
            quality,
        })
    }
}

/// Unresolved pairs of one member kind, in encounter order.
#[derive(Debug, Default)]
pub struct PairList {
    pairs: Vec<MatchingPair>,
}

impl PairList {
    pub fn push(&mut self, pair: MatchingPair) {
        self.pairs.push(pair);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Index of the best pair: highest rank among exact matches, then (when
    /// allowed) among sub-matches. Ties go to the first encountered.
    /// With `link`, only pairs targeting that link are considered.
    pub fn best(&self, allow_sub_match: bool, link: Option<&str>) -> Option<usize> {
        let qualities: &[MatchQuality] = if allow_sub_match {
            &[MatchQuality::Exact, MatchQuality::Sub]
        } else {
            &[MatchQuality::Exact]
        };

        qualities.iter().find_map(|&quality| {
            let mut best: Option<(usize, usize)> = None;
            for (i, pair) in self.pairs.iter().enumerate() {
                if pair.quality != quality || link.is_some_and(|l| !pair.candidate.links_to(l)) {
                    continue;
                }
                if best.map_or(true, |(_, rank)| pair.rank > rank) {
                    best = Some((i, pair.rank));
                }
            }
            best.map(|(i, _)| i)
        })
    }

    /// Remove and return the best pair.
    pub fn take_best(&mut self, allow_sub_match: bool, link: Option<&str>) -> Option<MatchingPair> {
        self.best(allow_sub_match, link).map(|i| self.pairs.remove(i))
    }
}

/// The three working lists of one UI node.
#[derive(Debug, Default)]
pub struct PairLists {
    pub fields: PairList,
    pub properties: PairList,
    pub methods: PairList,
}

impl PairLists {
    pub fn build(ui: &UiCandidate, targets: &[TargetCandidate]) -> Self {
        let mut lists = Self::default();
        for pair in targets.iter().filter_map(|c| MatchingPair::new(ui, c)) {
            match pair.candidate.kind {
                MemberKind::Field => lists.fields.push(pair),
                MemberKind::Property => lists.properties.push(pair),
                MemberKind::Method => lists.methods.push(pair),
                MemberKind::Event => {}
            }
        }
        lists
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.properties.is_empty() && self.methods.is_empty()
    }

    pub fn list_mut(&mut self, kind: MemberKind) -> Option<&mut PairList> {
        match kind {
            MemberKind::Field => Some(&mut self.fields),
            MemberKind::Property => Some(&mut self.properties),
            MemberKind::Method => Some(&mut self.methods),
            MemberKind::Event => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{collect_target_candidates, collect_ui_candidates, link};
    use crate::config::WiringConfig;
    use crate::host::{MemoryNode, MemoryObject};
    use crate::model::Annotation;
    use crate::report::WiringReport;
    use serde_json::json;

    fn ui(name: &str) -> UiCandidate {
        let root = MemoryNode::builder("Controls", "Button").name(name).build();
        collect_ui_candidates(&root, &WiringConfig::default(), &mut WiringReport::new()).remove(0)
    }

    #[test]
    fn partial_prefix_does_not_pair() {
        let object = MemoryObject::builder("App", "Vm").method("Save_All_Click", 0).build();
        let targets = collect_target_candidates(&object);

        assert!(PairLists::build(&ui("Save_Button"), &targets).is_empty());
        let lists = PairLists::build(&ui("Save"), &targets);
        assert_eq!(lists.methods.len(), 1);
    }

    #[test]
    fn exact_beats_earlier_sub_match() {
        let object = MemoryObject::builder("App", "Vm")
            .method("Save_All_Click", 0)
            .method("Save_Click", 0)
            .build();
        let targets = collect_target_candidates(&object);
        let mut lists = PairLists::build(&ui("Save"), &targets);

        let first = lists.methods.take_best(true, None).unwrap();
        assert_eq!(first.candidate.member_name, "Save_Click");
        assert_eq!(first.quality, MatchQuality::Exact);

        let second = lists.methods.take_best(true, None).unwrap();
        assert_eq!(second.quality, MatchQuality::Sub);
        assert!(lists.methods.is_empty());
    }

    #[test]
    fn sub_match_can_be_disabled() {
        let object = MemoryObject::builder("App", "Vm").method("Save_All_Click", 0).build();
        let targets = collect_target_candidates(&object);
        let mut lists = PairLists::build(&ui("Save"), &targets);
        assert!(lists.methods.take_best(false, None).is_none());
        assert_eq!(lists.methods.len(), 1);
    }

    #[test]
    fn ties_go_to_first_encountered() {
        let object = MemoryObject::builder("App", "Vm")
            .property_with("First", json!(1), vec![Annotation::alias("Total", &["Text"])])
            .property_with("Second", json!(2), vec![Annotation::alias("Total", &["Text"])])
            .build();
        let targets = collect_target_candidates(&object);
        let mut lists = PairLists::build(&ui("Total"), &targets);
        assert_eq!(lists.properties.take_best(true, None).unwrap().candidate.member_name, "First");
    }

    #[test]
    fn link_filter_restricts_selection() {
        let object = MemoryObject::builder("App", "Vm")
            .method("Save_Execute", 0)
            .method("Save_CanExecute", 0)
            .build();
        let targets = collect_target_candidates(&object);
        let lists = PairLists::build(&ui("Save"), &targets);

        let i = lists.methods.best(true, Some(link::COMMAND_CAN_EXECUTE)).unwrap();
        assert_eq!(i, 1);
    }
}
