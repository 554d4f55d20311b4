//! Candidate collection for one resolution pass
//!
//! - `target`: members of the bound object graph, with the UI-side member
//!   names each wants to bind to
//! - `ui`: named nodes of the UI subtree
//!
//! Candidates live for one pass and are rebuilt from scratch every time.

mod target;
mod ui;

pub use target::{collect_target_candidates, link, TargetCandidate};
pub use ui::{collect_ui_candidates, UiCandidate};
