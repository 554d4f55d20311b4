//! Autowire - convention-based wiring of UI nodes to view-model members

pub mod binder;
pub mod candidate;
pub mod command;
pub mod config;
pub mod deferred;
pub mod discovery;
pub mod error;
pub mod host;
pub mod model;
pub mod naming;
pub mod report;
pub mod scene;
pub mod wiring;

pub use binder::{Binder, BindingMode, DescriptorBinder};
pub use command::{Command, CompositeCommand, RelayCommand};
pub use config::{AutoWireConfig, DiscoveryConfig, WiringConfig};
pub use deferred::{Attachment, PendingResolution};
pub use discovery::{DiscoveryContext, DiscoveryOutcome, Discoverer, TypeRegistry};
pub use error::{BindError, FixSuggestion, WireError};
pub use model::{Annotation, BindableObject, NodeRef, ObjectRef, TypeInfo, UiNode, Value, ValueKind};
pub use naming::{matching_rank, split, SplitName};
pub use report::{BindingKind, BindingRecord, Diagnostic, Severity, WiringReport};
pub use scene::{LoadedScene, Scene};
pub use wiring::{AutoWire, ExplicitBinding};
