//! Reference in-memory host
//!
//! Used by the scene loader, the CLI and the tests. Real UI frameworks
//! implement [`UiNode`](crate::model::UiNode) and
//! [`BindableObject`](crate::model::BindableObject) over their own trees.

mod backends;
mod node;
mod object;

pub use backends::{MemoryContainer, MemoryResources};
pub use node::{
    MemoryNode, MemoryNodeBuilder, AUTO_WIRED_PROPERTY, CONTEXT_CHANGED_EVENT, CONTEXT_PROPERTY,
    LOADED_EVENT,
};
pub use object::{Call, MemoryObject, MemoryObjectBuilder, MethodBody};
