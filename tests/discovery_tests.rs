//! # Object Discovery Tests
//!
//! Type resolution tiers, instantiation strategies and the write-back of the
//! discovered instance, over in-memory registries and back ends.

use std::rc::Rc;

use autowire::discovery::{MatchTier, ResourceKey, Strategy};
use autowire::host::{MemoryContainer, MemoryNode, MemoryObject, MemoryResources};
use autowire::model::{same_object, NodeRef, ObjectRef, TypeInfo};
use autowire::{DiscoveryConfig, DiscoveryContext, Discoverer, TypeRegistry, Value, WireError};
use pretty_assertions::assert_eq;

// ============================================================================
// TEST HELPERS
// ============================================================================

fn register(registry: &mut TypeRegistry, full_name: &str, aliases: &[&str]) {
    let info = TypeInfo::parse(full_name).with_aliases(aliases);
    let (namespace, name) = (info.namespace.clone(), info.name.clone());
    registry.register(info, move || MemoryObject::builder(&namespace, &name).build());
}

fn main_page(name: Option<&str>) -> Rc<MemoryNode> {
    let builder = MemoryNode::builder("Trade.SuperUI.Views", "MainPage");
    match name {
        Some(name) => builder.name(name).build_rc(),
        None => builder.build_rc(),
    }
}

fn discoverer() -> Discoverer {
    Discoverer::new(DiscoveryConfig::default()).unwrap()
}

// ============================================================================
// TYPE RESOLUTION
// ============================================================================

#[test]
fn test_view_namespace_maps_to_view_model_namespace() {
    let mut registry = TypeRegistry::new();
    register(&mut registry, "Trade.SuperUI.Views.MainPageViewModel", &[]);
    register(&mut registry, "Trade.SuperUI.ViewModels.OrdersViewModel", &[]);
    register(&mut registry, "Trade.SuperUI.ViewModels.MainPageViewModel", &[]);

    let found = discoverer()
        .resolve_type(&TypeInfo::parse("Trade.SuperUI.Views.MainPage"), None, &registry)
        .unwrap()
        .unwrap();

    assert_eq!(found.type_info.full_name(), "Trade.SuperUI.ViewModels.MainPageViewModel");
    assert_eq!(found.tier, MatchTier::ExactFromType);
}

#[test]
fn test_alias_expands_candidate_names() {
    let mut registry = TypeRegistry::new();
    register(&mut registry, "Trade.SuperUI.ViewModels.DashboardState", &["MainPageViewModel"]);

    let found = discoverer()
        .resolve_type(&TypeInfo::parse("Trade.SuperUI.Views.MainPage"), None, &registry)
        .unwrap()
        .unwrap();

    assert_eq!(found.type_info.name, "DashboardState");
    assert_eq!(found.matched_name, "MainPageViewModel");
}

#[test]
fn test_identifier_tier_beats_type_tier() {
    let mut registry = TypeRegistry::new();
    register(&mut registry, "Trade.SuperUI.ViewModels.MainPageViewModel", &[]);
    register(&mut registry, "Trade.SuperUI.ViewModels.OrdersViewModel", &[]);

    let found = discoverer()
        .resolve_type(&TypeInfo::parse("Trade.SuperUI.Views.MainPage"), Some("Orders"), &registry)
        .unwrap()
        .unwrap();

    assert_eq!(found.type_info.name, "OrdersViewModel");
    assert_eq!(found.tier, MatchTier::ExactFromIdentifier);
}

#[test]
fn test_sub_match_used_only_without_exact() {
    let mut registry = TypeRegistry::new();
    register(&mut registry, "Trade.SuperUI.ViewModels.MainPageViewModelV2", &[]);

    let ui_type = TypeInfo::parse("Trade.SuperUI.Views.MainPage");
    let found = discoverer().resolve_type(&ui_type, None, &registry).unwrap().unwrap();
    assert_eq!(found.tier, MatchTier::SubFromType);

    let strict = Discoverer::new(DiscoveryConfig {
        allow_sub_match: false,
        ..DiscoveryConfig::default()
    })
    .unwrap();
    assert!(strict.resolve_type(&ui_type, None, &registry).unwrap().is_none());
}

#[test]
fn test_empty_namespace_is_a_silent_miss() {
    let registry = TypeRegistry::new();
    let page = main_page(None);
    let node: NodeRef = page.clone();
    let ctx = DiscoveryContext::new(&registry);

    assert!(discoverer().discover(&node, &ctx).unwrap().is_none());
    assert_eq!(page.property("DataContext"), Value::Null);
}

#[test]
fn test_type_override_skips_the_search() {
    let mut registry = TypeRegistry::new();
    register(&mut registry, "Elsewhere.Shell", &[]);

    let config = DiscoveryConfig {
        type_override: Some("Elsewhere.Shell".into()),
        ..DiscoveryConfig::default()
    };
    let found = Discoverer::new(config)
        .unwrap()
        .resolve_type(&TypeInfo::parse("Trade.SuperUI.Views.MainPage"), None, &registry)
        .unwrap()
        .unwrap();
    assert_eq!(found.tier, MatchTier::Override);

    let missing = DiscoveryConfig {
        type_override: Some("Elsewhere.Missing".into()),
        ..DiscoveryConfig::default()
    };
    let err = Discoverer::new(missing)
        .unwrap()
        .resolve_type(&TypeInfo::parse("Trade.SuperUI.Views.MainPage"), None, &registry)
        .unwrap_err();
    assert!(matches!(err, WireError::UnknownType { .. }));
}

#[test]
fn test_invalid_configuration_is_rejected_up_front() {
    let config = DiscoveryConfig {
        namespace_replacement: String::new(),
        ..DiscoveryConfig::default()
    };
    assert!(matches!(
        Discoverer::new(config),
        Err(WireError::JointlyRequired { .. })
    ));
}

// ============================================================================
// INSTANTIATION STRATEGIES
// ============================================================================

#[test]
fn test_default_construction_assigns_both_members() {
    let mut registry = TypeRegistry::new();
    register(&mut registry, "Trade.SuperUI.ViewModels.MainPageViewModel", &[]);
    let page = main_page(None);
    let node: NodeRef = page.clone();

    let outcome = discoverer()
        .discover(&node, &DiscoveryContext::new(&registry))
        .unwrap()
        .unwrap();

    assert_eq!(outcome.strategy, Strategy::DefaultConstruction);
    assert!(outcome.assigned);
    assert_eq!(page.property("DataContext"), Value::Object(Rc::clone(&outcome.instance)));
    assert_eq!(page.property("AutoWiredObject"), Value::Object(outcome.instance));
}

#[test]
fn test_container_is_tried_first() {
    let mut registry = TypeRegistry::new();
    register(&mut registry, "Trade.SuperUI.ViewModels.MainPageViewModel", &[]);
    let info = TypeInfo::parse("Trade.SuperUI.ViewModels.MainPageViewModel");
    let shared: ObjectRef = MemoryObject::builder(&info.namespace, &info.name).build();

    let mut container = MemoryContainer::new();
    container.insert(&info, Rc::clone(&shared));
    let node: NodeRef = main_page(None);
    let ctx = DiscoveryContext::new(&registry).with_container(&container);

    let outcome = discoverer().discover(&node, &ctx).unwrap().unwrap();

    assert_eq!(outcome.strategy, Strategy::Container);
    assert!(same_object(&outcome.instance, &shared));
}

#[test]
fn test_resources_keyed_by_declared_name_in_ancestor_scope() {
    let mut registry = TypeRegistry::new();
    register(&mut registry, "Trade.SuperUI.ViewModels.MainPageViewModel", &[]);
    let info = TypeInfo::parse("Trade.SuperUI.ViewModels.MainPageViewModel");

    let page = main_page(Some("Main"));
    let shell = MemoryNode::builder("Trade.SuperUI.Views", "Shell")
        .child_node(Rc::clone(&page))
        .build_rc();
    let from_shell: ObjectRef = MemoryObject::builder(&info.namespace, &info.name).build();
    let global: ObjectRef = MemoryObject::builder(&info.namespace, &info.name).build();

    let mut resources = MemoryResources::new();
    resources
        .insert_scoped(
            &(Rc::clone(&shell) as NodeRef),
            ResourceKey::Name("Main".into()),
            Value::Object(Rc::clone(&from_shell)),
        )
        .insert_global(ResourceKey::Type(info.clone()), Value::Object(global));

    let node: NodeRef = page;
    let ctx = DiscoveryContext::new(&registry).with_resources(&resources);
    let outcome = discoverer().discover(&node, &ctx).unwrap().unwrap();

    assert_eq!(outcome.strategy, Strategy::Resource(ResourceKey::Name("Main".into())));
    assert!(same_object(&outcome.instance, &from_shell));
}

#[test]
fn test_global_resource_by_type() {
    let mut registry = TypeRegistry::new();
    registry.register_abstract(TypeInfo::parse("Trade.SuperUI.ViewModels.MainPageViewModel"));
    let info = TypeInfo::parse("Trade.SuperUI.ViewModels.MainPageViewModel");
    let global: ObjectRef = MemoryObject::builder(&info.namespace, &info.name).build();

    let mut resources = MemoryResources::new();
    resources.insert_global(ResourceKey::Type(info.clone()), Value::Object(Rc::clone(&global)));

    let node: NodeRef = main_page(None);
    let ctx = DiscoveryContext::new(&registry).with_resources(&resources);
    let outcome = discoverer().discover(&node, &ctx).unwrap().unwrap();

    assert_eq!(outcome.strategy, Strategy::Resource(ResourceKey::Type(info)));
    assert!(same_object(&outcome.instance, &global));
}

#[test]
fn test_empty_strategies_fall_through() {
    let mut registry = TypeRegistry::new();
    register(&mut registry, "Trade.SuperUI.ViewModels.MainPageViewModel", &[]);
    let container = MemoryContainer::new();
    let resources = MemoryResources::new();

    let node: NodeRef = main_page(None);
    let ctx = DiscoveryContext::new(&registry)
        .with_container(&container)
        .with_resources(&resources);
    let outcome = discoverer().discover(&node, &ctx).unwrap().unwrap();

    assert_eq!(outcome.strategy, Strategy::DefaultConstruction);
}

#[test]
fn test_disabled_strategy_is_skipped() {
    let mut registry = TypeRegistry::new();
    register(&mut registry, "Trade.SuperUI.ViewModels.MainPageViewModel", &[]);
    let info = TypeInfo::parse("Trade.SuperUI.ViewModels.MainPageViewModel");
    let mut container = MemoryContainer::new();
    container.insert(&info, MemoryObject::builder(&info.namespace, &info.name).build());

    let config = DiscoveryConfig {
        use_container: false,
        ..DiscoveryConfig::default()
    };
    let node: NodeRef = main_page(None);
    let ctx = DiscoveryContext::new(&registry).with_container(&container);
    let outcome = Discoverer::new(config).unwrap().discover(&node, &ctx).unwrap().unwrap();

    assert_eq!(outcome.strategy, Strategy::DefaultConstruction);
}

#[test]
fn test_abstract_type_without_instances_is_a_miss() {
    let mut registry = TypeRegistry::new();
    registry.register_abstract(TypeInfo::parse("Trade.SuperUI.ViewModels.MainPageViewModel"));

    let page = main_page(None);
    let node: NodeRef = page.clone();
    let outcome = discoverer().discover(&node, &DiscoveryContext::new(&registry)).unwrap();

    assert!(outcome.is_none());
    assert_eq!(page.property("DataContext"), Value::Null);
}
