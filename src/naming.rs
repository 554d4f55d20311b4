//! Identifier tokenizing and matching rank
//!
//! Both resolution algorithms compare names through the same primitive:
//! the length of the longest common ordered token prefix.
//!
//! ```text
//! "exampleName_Ver1"  → ["example", "Name", "Ver1"]
//! "Example_Name_"     → ["Example", "Name"]
//! rank(["Save","Button"], ["Save","Button","Click"]) = 2
//! ```

use smallvec::SmallVec;

/// Identifiers starting with this marker are invisible to node collection.
pub const EXCLUSION_MARKER: char = '_';

/// Case-or-underscore delimited tokens of one identifier.
///
/// Most identifiers split into a handful of tokens, so they stay inline.
pub type SplitName = SmallVec<[String; 4]>;

/// Split an identifier at every uppercase letter and every `_`.
///
/// The `_` itself never lands in a token. Empty input yields an empty name.
pub fn split(identifier: &str) -> SplitName {
    let mut tokens = SplitName::new();
    let mut current = String::new();

    for ch in identifier.chars() {
        if ch == '_' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_uppercase() && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Length of the longest common ordered prefix, compared case-insensitively.
#[inline]
pub fn matching_rank<A, B>(a: &[A], b: &[B]) -> usize
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    a.iter()
        .zip(b.iter())
        .take_while(|(x, y)| tokens_match(x.as_ref(), y.as_ref()))
        .count()
}

/// Unicode case-insensitive token equality, using the same case model as
/// [`split`].
#[inline]
fn tokens_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.chars().flat_map(char::to_lowercase).eq(b.chars().flat_map(char::to_lowercase))
}

/// How well a match-side name covers a reference name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchQuality {
    /// Reference name is a strict prefix of the candidate name
    Sub,
    /// Both names have exactly the matching tokens
    Exact,
}

impl MatchQuality {
    /// Classify a rank between a reference name (the UI node, or the expected
    /// type name) and a candidate name.
    pub fn classify(rank: usize, reference_len: usize, candidate_len: usize) -> Option<Self> {
        if rank == 0 || rank != reference_len {
            return None;
        }
        if rank == candidate_len {
            Some(MatchQuality::Exact)
        } else if rank < candidate_len {
            Some(MatchQuality::Sub)
        } else {
            None
        }
    }
}

/// Node identifier broken into its base name and trailing sub-names.
///
/// Sub-names are informational only: the ranker always works on the full
/// split of the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeName {
    pub base: String,
    pub sub_names: Vec<String>,
}

impl NodeName {
    /// Returns `None` for empty identifiers and identifiers carrying the
    /// exclusion marker.
    pub fn parse(identifier: &str) -> Option<Self> {
        if identifier.is_empty() || identifier.starts_with(EXCLUSION_MARKER) {
            return None;
        }
        let mut parts = identifier.split('_').filter(|p| !p.is_empty());
        let base = parts.next()?.to_string();
        Some(Self {
            base,
            sub_names: parts.map(str::to_string).collect(),
        })
    }
}

/// Join a split name back with `_`.
pub fn join(name: &[String]) -> String {
    name.join("_")
}
