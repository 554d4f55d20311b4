//! Object discovery: find and instantiate the view-model of a UI node
//!
//! ```text
//! Trade.SuperUI.Views.MainPage
//!   namespace  Trade.SuperUI.Views → Trade.SuperUI.ViewModels
//!   name       MainPage            → MainPageViewModel
//!   candidates types in Trade.SuperUI.ViewModels, one per name alias
//!   instance   container → resources → default construction
//! ```

mod backend;

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::DiscoveryConfig;
use crate::error::{Result, WireError};
use crate::model::{MemberDescriptor, NodeRef, ObjectRef, TypeInfo, Value};
use crate::naming::{self, MatchQuality, SplitName};

pub use backend::{
    DiscoveryContext, Factory, InstanceResolver, ResourceKey, ResourceLookup, TypeEntry,
    TypeRegistry,
};

/// Which expected name a candidate satisfied, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Type named directly by configuration
    Override,
    ExactFromIdentifier,
    ExactFromType,
    SubFromIdentifier,
    SubFromType,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchTier::Override => "override",
            MatchTier::ExactFromIdentifier => "exact match from identifier",
            MatchTier::ExactFromType => "exact match from type name",
            MatchTier::SubFromIdentifier => "sub-match from identifier",
            MatchTier::SubFromType => "sub-match from type name",
        };
        f.write_str(name)
    }
}

/// Strategy that produced the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", content = "key", rename_all = "snake_case")]
pub enum Strategy {
    Container,
    Resource(ResourceKey),
    DefaultConstruction,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Container => write!(f, "container"),
            Strategy::Resource(key) => write!(f, "resource {key}"),
            Strategy::DefaultConstruction => write!(f, "default construction"),
        }
    }
}

/// The winning candidate type of the ranking step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMatch {
    pub type_info: TypeInfo,
    /// Type name or alias that matched
    pub matched_name: String,
    pub tier: MatchTier,
}

pub struct DiscoveryOutcome {
    pub instance: ObjectRef,
    pub type_info: TypeInfo,
    pub matched_name: String,
    pub tier: MatchTier,
    pub strategy: Strategy,
    /// Whether the instance landed in the node's target member
    pub assigned: bool,
}

impl fmt::Debug for DiscoveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryOutcome")
            .field("type_info", &self.type_info.full_name())
            .field("matched_name", &self.matched_name)
            .field("tier", &self.tier)
            .field("strategy", &self.strategy)
            .field("assigned", &self.assigned)
            .finish()
    }
}

/// Namespace expected to hold the view-model of a UI type.
///
/// The token is replaced inside the second-to-last segment of the full type
/// name. Shorter names get the replacement inserted before the type name.
pub fn expected_namespace(ui_type: &TypeInfo, config: &DiscoveryConfig) -> String {
    if let Some(namespace) = &config.namespace_override {
        return namespace.clone();
    }
    if config.namespace_token.is_empty() {
        return ui_type.namespace.clone();
    }

    let full_name = ui_type.full_name();
    let mut segments: Vec<String> = full_name
        .split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if segments.len() < 3 {
        let at = segments.len().saturating_sub(1);
        segments.insert(at, config.namespace_replacement.clone());
    } else {
        let at = segments.len() - 2;
        segments[at] = segments[at].replace(&config.namespace_token, &config.namespace_replacement);
    }

    segments.pop();
    segments.join(".")
}

/// View-model name expected for a type name or declared identifier.
///
/// Names already carrying the replacement are kept; otherwise the token is
/// replaced, or the replacement appended when the token is absent.
pub fn expected_name(source: &str, config: &DiscoveryConfig) -> String {
    if let Some(name) = &config.name_override {
        return name.clone();
    }
    let (token, replacement) = (&config.name_token, &config.name_replacement);
    if token.is_empty() || source.contains(replacement.as_str()) {
        return source.to_string();
    }
    if source.contains(token.as_str()) {
        source.replace(token.as_str(), replacement)
    } else {
        format!("{source}{replacement}")
    }
}

/// Discovery resolver. Configuration is validated once at construction.
#[derive(Debug, Clone)]
pub struct Discoverer {
    config: DiscoveryConfig,
}

impl Discoverer {
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Pick the view-model type for a UI type and optional identifier.
    pub fn resolve_type(
        &self,
        ui_type: &TypeInfo,
        declared_name: Option<&str>,
        registry: &TypeRegistry,
    ) -> Result<Option<TypeMatch>> {
        if let Some(full_name) = &self.config.type_override {
            let entry = registry.get(full_name).ok_or_else(|| WireError::UnknownType {
                name: full_name.clone(),
            })?;
            return Ok(Some(TypeMatch {
                type_info: entry.info.clone(),
                matched_name: entry.info.name.clone(),
                tier: MatchTier::Override,
            }));
        }

        let namespace = expected_namespace(ui_type, &self.config);
        let from_type = naming::split(&expected_name(&ui_type.name, &self.config));
        let from_identifier: Option<SplitName> = declared_name
            .filter(|n| !n.is_empty())
            .map(|n| naming::split(&expected_name(n, &self.config)));
        debug!(%namespace, ?from_identifier, ?from_type, "expected view-model");

        let candidates: Vec<(&TypeEntry, String, SplitName)> = registry
            .types_in(&namespace)
            .flat_map(|entry| {
                std::iter::once(entry.info.name.clone())
                    .chain(entry.info.aliases.iter().cloned())
                    .map(move |name| {
                        let split = naming::split(&name);
                        (entry, name, split)
                    })
            })
            .collect();

        if candidates.is_empty() {
            debug!(%namespace, "no candidate types in namespace");
            return Ok(None);
        }

        let mut tiers: Vec<(MatchTier, &SplitName, MatchQuality)> = Vec::with_capacity(4);
        if let Some(expected) = &from_identifier {
            tiers.push((MatchTier::ExactFromIdentifier, expected, MatchQuality::Exact));
        }
        tiers.push((MatchTier::ExactFromType, &from_type, MatchQuality::Exact));
        if self.config.allow_sub_match {
            if let Some(expected) = &from_identifier {
                tiers.push((MatchTier::SubFromIdentifier, expected, MatchQuality::Sub));
            }
            tiers.push((MatchTier::SubFromType, &from_type, MatchQuality::Sub));
        }

        for (tier, expected, wanted) in tiers {
            let hit = candidates.iter().find(|(_, _, split)| {
                let rank = naming::matching_rank(expected.as_slice(), split.as_slice());
                MatchQuality::classify(rank, expected.len(), split.len()) == Some(wanted)
            });
            if let Some((entry, name, _)) = hit {
                return Ok(Some(TypeMatch {
                    type_info: entry.info.clone(),
                    matched_name: name.clone(),
                    tier,
                }));
            }
        }

        debug!(%namespace, "no candidate type matched");
        Ok(None)
    }

    /// Produce an instance of `type_info`, trying every enabled strategy in
    /// order until one yields an object.
    pub fn instantiate(
        &self,
        node: &NodeRef,
        type_info: &TypeInfo,
        ctx: &DiscoveryContext<'_>,
    ) -> Option<(ObjectRef, Strategy)> {
        let declared = node.declared_name();

        if self.config.use_container {
            if let Some(container) = ctx.container {
                if let Some(instance) = container.resolve(type_info, declared.as_deref()) {
                    return Some((instance, Strategy::Container));
                }
            }
        }

        if self.config.use_resources {
            if let Some(resources) = ctx.resources {
                let keys = declared
                    .iter()
                    .map(|n| ResourceKey::Name(n.clone()))
                    .chain([
                        ResourceKey::Name(type_info.name.clone()),
                        ResourceKey::Name(type_info.full_name()),
                        ResourceKey::Type(type_info.clone()),
                    ]);
                for key in keys {
                    if let Some(instance) = find_resource(resources, node, &key) {
                        return Some((instance, Strategy::Resource(key)));
                    }
                }
            }
        }

        if self.config.use_default_construction {
            if let Some(instance) = ctx.registry.get(&type_info.full_name()).and_then(TypeEntry::construct) {
                return Some((instance, Strategy::DefaultConstruction));
            }
        }

        None
    }

    /// Resolve, instantiate and assign the view-model of `node`.
    ///
    /// A miss at any step is a normal outcome (`Ok(None)`). Only an override
    /// naming an unknown type is an error.
    #[instrument(skip(self, node, ctx), fields(node_type = %node.type_info()))]
    pub fn discover(&self, node: &NodeRef, ctx: &DiscoveryContext<'_>) -> Result<Option<DiscoveryOutcome>> {
        let declared = node.declared_name();
        let Some(found) = self.resolve_type(&node.type_info(), declared.as_deref(), ctx.registry)? else {
            return Ok(None);
        };

        let Some((instance, strategy)) = self.instantiate(node, &found.type_info, ctx) else {
            warn!(view_model = %found.type_info, "no strategy produced an instance");
            return Ok(None);
        };

        let assigned = assign(node, &self.config.target_member, &instance);
        if !self.config.auto_wired_member.is_empty() && self.config.auto_wired_member != self.config.target_member {
            assign(node, &self.config.auto_wired_member, &instance);
        }

        info!(
            view_model = %found.type_info,
            tier = %found.tier,
            %strategy,
            assigned,
            "discovered view-model"
        );

        Ok(Some(DiscoveryOutcome {
            instance,
            type_info: found.type_info,
            matched_name: found.matched_name,
            tier: found.tier,
            strategy,
            assigned,
        }))
    }
}

/// Walk `node` and its ancestors, then the global dictionary.
fn find_resource(resources: &dyn ResourceLookup, node: &NodeRef, key: &ResourceKey) -> Option<ObjectRef> {
    let mut scope = Some(Rc::clone(node));
    while let Some(current) = scope {
        if let Some(Value::Object(instance)) = resources.lookup(&current, key) {
            return Some(instance);
        }
        scope = current.parent();
    }
    match resources.lookup_global(key) {
        Some(Value::Object(instance)) => Some(instance),
        _ => None,
    }
}

fn assign(node: &NodeRef, member: &str, instance: &ObjectRef) -> bool {
    match node.member(member) {
        Some(MemberDescriptor::Property(property)) => match property.set(Value::Object(Rc::clone(instance))) {
            Ok(()) => true,
            Err(e) => {
                warn!(member, error = %e, "could not assign discovered instance");
                false
            }
        },
        _ => {
            debug!(member, "node has no property to receive the instance");
            false
        }
    }
}
