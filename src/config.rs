//! Resolver configuration
//!
//! Configuration is in-process: options are set on the resolvers before a
//! pass. Scene files carry the same structures under their `config:` key;
//! every missing key falls back to its default.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WireError};

/// Options of the wiring resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiringConfig {
    /// Accept sub-matches when no exact match exists for a node
    pub allow_sub_match: bool,
    /// Descend into structural children
    pub include_visual_children: bool,
    /// Descend into auxiliary children
    pub include_logical_children: bool,
    /// Collect scope-local named entries
    pub include_scope_names: bool,
    /// Treat the root node itself as a candidate
    pub include_root: bool,
    /// Node member holding the bound object
    pub context_member: String,
    /// Node event raised when the bound object changes
    pub context_changed_event: String,
    /// Lifecycle event that triggers the pass; handlers bound to it are
    /// invoked once after the pass
    pub ready_event: String,
}

impl Default for WiringConfig {
    fn default() -> Self {
        Self {
            allow_sub_match: true,
            include_visual_children: true,
            include_logical_children: true,
            include_scope_names: false,
            include_root: true,
            context_member: "DataContext".to_string(),
            context_changed_event: "DataContextChanged".to_string(),
            ready_event: "Loaded".to_string(),
        }
    }
}

impl WiringConfig {
    pub fn validate(&self) -> Result<()> {
        if self.context_member.is_empty() {
            return Err(WireError::Configuration {
                reason: "context_member cannot be empty".to_string(),
            });
        }
        if !self.include_visual_children && !self.include_logical_children && !self.include_root {
            return Err(WireError::Configuration {
                reason: "traversal excludes the root and every child set".to_string(),
            });
        }
        Ok(())
    }
}

/// Options of the object discovery resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Namespace segment token replaced to find the view-model namespace
    pub namespace_token: String,
    pub namespace_replacement: String,
    /// Type name token replaced to find the view-model name
    pub name_token: String,
    pub name_replacement: String,
    /// Expected namespace, skipping derivation
    pub namespace_override: Option<String>,
    /// Expected name, skipping derivation
    pub name_override: Option<String>,
    /// Full type name resolved directly, skipping the search
    pub type_override: Option<String>,
    pub allow_sub_match: bool,
    pub use_container: bool,
    pub use_resources: bool,
    pub use_default_construction: bool,
    /// Node member receiving the discovered instance
    pub target_member: String,
    /// Node member receiving the informational auto-wired copy
    pub auto_wired_member: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            namespace_token: "Views".to_string(),
            namespace_replacement: "ViewModels".to_string(),
            name_token: "View".to_string(),
            name_replacement: "ViewModel".to_string(),
            namespace_override: None,
            name_override: None,
            type_override: None,
            allow_sub_match: true,
            use_container: true,
            use_resources: true,
            use_default_construction: true,
            target_member: "DataContext".to_string(),
            auto_wired_member: "AutoWiredObject".to_string(),
        }
    }
}

impl DiscoveryConfig {
    /// Reject jointly-required pairs with one side empty, mutually exclusive
    /// overrides and a fully disabled strategy list.
    pub fn validate(&self) -> Result<()> {
        jointly_required(
            ("namespace_token", &self.namespace_token),
            ("namespace_replacement", &self.namespace_replacement),
        )?;
        jointly_required(
            ("name_token", &self.name_token),
            ("name_replacement", &self.name_replacement),
        )?;

        if self.type_override.is_some() && self.name_override.is_some() {
            return Err(WireError::MutuallyExclusive {
                first: "type_override".to_string(),
                second: "name_override".to_string(),
            });
        }
        if self.type_override.is_some() && self.namespace_override.is_some() {
            return Err(WireError::MutuallyExclusive {
                first: "type_override".to_string(),
                second: "namespace_override".to_string(),
            });
        }

        if !self.use_container && !self.use_resources && !self.use_default_construction {
            return Err(WireError::NoStrategyEnabled);
        }

        if self.target_member.is_empty() {
            return Err(WireError::Configuration {
                reason: "target_member cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn jointly_required(a: (&str, &str), b: (&str, &str)) -> Result<()> {
    match (a.1.is_empty(), b.1.is_empty()) {
        (false, true) => Err(WireError::JointlyRequired {
            set: a.0.to_string(),
            missing: b.0.to_string(),
        }),
        (true, false) => Err(WireError::JointlyRequired {
            set: b.0.to_string(),
            missing: a.0.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Both resolver configurations, as found in a scene file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoWireConfig {
    pub wiring: WiringConfig,
    pub discovery: DiscoveryConfig,
}

impl AutoWireConfig {
    pub fn validate(&self) -> Result<()> {
        self.wiring.validate()?;
        self.discovery.validate()
    }
}
