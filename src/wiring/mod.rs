//! Wiring resolver
//!
//! One pass pairs every named node of a subtree with members of the bound
//! object graph and hands each pairing to the [`Binder`]:
//!
//! ```text
//! for each named node:
//!   pairs ← target candidates fully covering the node name
//!   fields      best-first, bound as source references
//!   properties  best-first ┐ probe links in order, bind or discard;
//!   methods     best-first ┘ command roles pull their counterpart
//! after the pass: invoke handlers bound to the ready event once
//! ```
//!
//! Misses are diagnostics. Kind mismatches and binder failures are error
//! diagnostics and skip only the pairing at hand.

mod explicit;
mod pair;
mod probe;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, info, instrument};

use crate::binder::{method_handler, Binder, BindingMode, DescriptorBinder};
use crate::candidate::{collect_target_candidates, collect_ui_candidates, link, TargetCandidate, UiCandidate};
use crate::command::{CommandPart, CompositeCommand};
use crate::config::WiringConfig;
use crate::error::{BindError, Result};
use crate::model::{
    node_key, object_key, EventDescriptor, Handler, MemberDescriptor, MemberKind, NodeRef, ObjectRef,
    PropertyDescriptor, SubscriptionId, UiNode, Value,
};
use crate::report::{BindingKind, BindingRecord, Severity, WiringReport};

pub use explicit::ExplicitBinding;
pub use pair::{MatchingPair, PairList, PairLists};
pub use probe::{probe, probe_link, ResolvedTarget};

/// Why a resolved pairing was not bound.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BindFailure {
    KindMismatch {
        target: MemberKind,
        ui: &'static str,
    },
    Binder(BindError),
}

impl fmt::Display for BindFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindFailure::KindMismatch { target, ui } => {
                write!(f, "kind mismatch: target {target} cannot bind to UI {ui}")
            }
            BindFailure::Binder(e) => write!(f, "binder failed: {e}"),
        }
    }
}

impl From<BindError> for BindFailure {
    fn from(e: BindError) -> Self {
        BindFailure::Binder(e)
    }
}

/// Event subscription made by the engine, for deduplication and release.
///
/// Entries whose node has been dropped are pruned before every pass.
struct Subscription {
    node: usize,
    alive: Weak<dyn UiNode>,
    event: EventDescriptor,
    owner: usize,
    method: String,
    id: SubscriptionId,
}

/// Handler bound to the ready event, invoked once after the pass.
struct ReadyInvocation {
    handler: Handler,
    sender: Value,
}

/// Auto-wiring engine.
pub struct AutoWire<B: Binder = DescriptorBinder> {
    config: WiringConfig,
    binder: B,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl AutoWire<DescriptorBinder> {
    pub fn new(config: WiringConfig) -> Result<Self> {
        Self::with_binder(config, DescriptorBinder)
    }
}

impl<B: Binder> AutoWire<B> {
    pub fn with_binder(config: WiringConfig, binder: B) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            binder,
            subscriptions: RefCell::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &WiringConfig {
        &self.config
    }

    /// Object currently held by the node's context member.
    pub fn context_object(&self, node: &NodeRef) -> Option<ObjectRef> {
        match node.member(&self.config.context_member)? {
            MemberDescriptor::Property(p) => match p.get() {
                Value::Object(object) => Some(object),
                _ => None,
            },
            _ => None,
        }
    }

    /// Wire `root` against the object in its context member.
    pub fn wire(&self, root: &NodeRef) -> WiringReport {
        match self.context_object(root) {
            Some(object) => self.wire_object(root, &object),
            None => {
                let mut report = WiringReport::new();
                report.diagnose(
                    Severity::Info,
                    &describe_node(root),
                    Some(self.config.context_member.as_str()),
                    "no bound object, nothing to wire",
                );
                report
            }
        }
    }

    /// Run one resolution pass of `root`'s subtree against `object`.
    #[instrument(skip_all, fields(root = %describe_node(root), object = %object.type_info()))]
    pub fn wire_object(&self, root: &NodeRef, object: &ObjectRef) -> WiringReport {
        self.prune_subscriptions();
        let mut report = WiringReport::new();
        let targets = collect_target_candidates(object);
        let nodes = collect_ui_candidates(root, &self.config, &mut report);
        debug!(targets = targets.len(), nodes = nodes.len(), "collected candidates");

        let mut ready = Vec::new();
        for ui in &nodes {
            self.wire_node(ui, &targets, &mut report, &mut ready);
        }

        for invocation in ready {
            debug!(event = %self.config.ready_event, "invoking ready handler");
            (invocation.handler)(&invocation.sender, &Value::Null);
        }

        info!(
            bindings = report.bindings.len(),
            errors = report.errors().count(),
            "wiring pass complete"
        );
        report
    }

    /// Unsubscribe every event handler this engine attached.
    pub fn release(&self) -> usize {
        self.prune_subscriptions();
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        subscriptions
            .into_iter()
            .filter(|s| s.event.unsubscribe(s.id))
            .count()
    }

    /// Number of live event subscriptions held for deduplication and release.
    pub fn subscription_count(&self) -> usize {
        self.prune_subscriptions();
        self.subscriptions.borrow().len()
    }

    /// Drop entries for nodes that no longer exist. A dead node's address may
    /// be reused, so stale entries would also suppress valid subscriptions.
    fn prune_subscriptions(&self) {
        self.subscriptions.borrow_mut().retain(|s| s.alive.strong_count() > 0);
    }

    fn wire_node(
        &self,
        ui: &UiCandidate,
        targets: &[TargetCandidate],
        report: &mut WiringReport,
        ready: &mut Vec<ReadyInvocation>,
    ) {
        let mut lists = PairLists::build(ui, targets);
        if lists.is_empty() {
            return;
        }
        let allow_sub = self.config.allow_sub_match;

        while let Some(pair) = lists.fields.take_best(allow_sub, None) {
            let candidate = &pair.candidate;
            let Some((_, target)) = probe(&ui.node, &candidate.target_links) else {
                self.miss(ui, candidate, report);
                continue;
            };
            match self.bind_field(ui, candidate, &target) {
                Ok(record) => report.bound(record),
                Err(failure) => self.fail(ui, candidate, failure, report),
            }
        }

        for kind in [MemberKind::Property, MemberKind::Method] {
            loop {
                let Some(pair) = lists.list_mut(kind).and_then(|l| l.take_best(allow_sub, None)) else {
                    break;
                };
                let candidate = pair.candidate;
                let Some((resolved_link, target)) = probe(&ui.node, &candidate.target_links) else {
                    self.miss(ui, &candidate, report);
                    continue;
                };

                let counterpart = match &target {
                    ResolvedTarget::CommandRole { role, .. } => link::opposite_role(role).and_then(|opposite| {
                        lists
                            .properties
                            .take_best(allow_sub, Some(opposite))
                            .or_else(|| lists.methods.take_best(allow_sub, Some(opposite)))
                            .map(|p| p.candidate)
                    }),
                    _ => None,
                };

                match self.bind_member(ui, &candidate, target, counterpart.as_ref(), ready) {
                    Ok(Some(record)) => report.bound(record),
                    Ok(None) => report.diagnose(
                        Severity::Info,
                        &ui.declared_name,
                        Some(resolved_link.as_str()),
                        format!("{} already subscribed", candidate.member_name),
                    ),
                    Err(failure) => self.fail(ui, &candidate, failure, report),
                }
            }
        }
    }

    fn miss(&self, ui: &UiCandidate, candidate: &TargetCandidate, report: &mut WiringReport) {
        report.diagnose(
            Severity::Info,
            &ui.declared_name,
            None,
            format!(
                "{} {} matched but none of [{}] exists on {}",
                candidate.kind,
                candidate.member_name,
                candidate.target_links.join(", "),
                ui.node_type.name
            ),
        );
    }

    fn fail(&self, ui: &UiCandidate, candidate: &TargetCandidate, failure: BindFailure, report: &mut WiringReport) {
        report.diagnose(
            Severity::Error,
            &ui.declared_name,
            Some(candidate.member_name.as_str()),
            failure.to_string(),
        );
    }

    /// Source-reference wiring: the target field receives the node or one
    /// of its property values.
    fn bind_field(
        &self,
        ui: &UiCandidate,
        candidate: &TargetCandidate,
        target: &ResolvedTarget,
    ) -> std::result::Result<BindingRecord, BindFailure> {
        let MemberDescriptor::Field(field) = &candidate.member else {
            return Err(BindFailure::KindMismatch {
                target: candidate.kind,
                ui: target.describe(),
            });
        };
        let value = match target {
            ResolvedTarget::Node => Value::Node(Rc::clone(&ui.node)),
            ResolvedTarget::Property(p) | ResolvedTarget::Command(p) => p.get(),
            ResolvedTarget::CommandRole { property, .. } => property.get(),
            ResolvedTarget::Event(_) => {
                return Err(BindFailure::KindMismatch {
                    target: MemberKind::Field,
                    ui: target.describe(),
                })
            }
        };
        self.binder.bind_field(field, value)?;
        Ok(record(ui, target, vec![candidate.member_name.clone()], BindingKind::Field))
    }

    /// Bind a property or method candidate to its resolved UI member.
    ///
    /// Returns `Ok(None)` when the same handler is already subscribed to the
    /// same event.
    fn bind_member(
        &self,
        ui: &UiCandidate,
        candidate: &TargetCandidate,
        target: ResolvedTarget,
        counterpart: Option<&TargetCandidate>,
        ready: &mut Vec<ReadyInvocation>,
    ) -> std::result::Result<Option<BindingRecord>, BindFailure> {
        let mismatch = |target: &ResolvedTarget| BindFailure::KindMismatch {
            target: candidate.kind,
            ui: target.describe(),
        };

        match (&candidate.member, &target) {
            (MemberDescriptor::Property(source), ResolvedTarget::Property(ui_property)) => {
                let kind = self.bind_value(ui_property, &candidate.owner, source, candidate)?;
                Ok(Some(record(ui, &target, vec![candidate.member_name.clone()], kind)))
            }

            (MemberDescriptor::Property(source), ResolvedTarget::Command(ui_property)) => {
                let kind = match source.get() {
                    Value::Command(command) => {
                        self.binder.bind_command(ui_property, command)?;
                        BindingKind::Command
                    }
                    _ => self.bind_value(ui_property, &candidate.owner, source, candidate)?,
                };
                Ok(Some(record(ui, &target, vec![candidate.member_name.clone()], kind)))
            }

            (MemberDescriptor::Method(method), ResolvedTarget::Event(event)) => {
                let node = node_key(&ui.node);
                let owner = object_key(&candidate.owner);
                let already = self.subscriptions.borrow().iter().any(|s| {
                    s.node == node && s.owner == owner && s.method == method.name && s.event.name == event.name
                });
                if already {
                    return Ok(None);
                }

                let handler = method_handler(method);
                let id = self
                    .binder
                    .bind_event(event, Rc::clone(&handler), candidate.handled_events_too)?;
                self.subscriptions.borrow_mut().push(Subscription {
                    node,
                    alive: Rc::downgrade(&ui.node),
                    event: event.clone(),
                    owner,
                    method: method.name.clone(),
                    id,
                });
                if event.name == self.config.ready_event {
                    ready.push(ReadyInvocation {
                        handler,
                        sender: Value::Node(Rc::clone(&ui.node)),
                    });
                }
                let kind = BindingKind::Event {
                    handled_events_too: candidate.handled_events_too,
                };
                Ok(Some(record(ui, &target, vec![candidate.member_name.clone()], kind)))
            }

            (
                MemberDescriptor::Property(_) | MemberDescriptor::Method(_),
                ResolvedTarget::CommandRole { property, role },
            ) => {
                let (execute, can_execute) = if *role == link::COMMAND_EXECUTE {
                    (Some(candidate), counterpart)
                } else {
                    (counterpart, Some(candidate))
                };
                let members: Vec<String> = execute
                    .iter()
                    .chain(can_execute.iter())
                    .map(|c| c.member_name.clone())
                    .collect();
                let command = CompositeCommand::new(
                    execute.and_then(command_part),
                    can_execute.and_then(command_part),
                );
                debug!(node = %ui.declared_name, ?command, "assembled composite command");
                self.binder.bind_command(property, Rc::new(command))?;
                Ok(Some(record(ui, &target, members, BindingKind::CompositeCommand)))
            }

            _ => Err(mismatch(&target)),
        }
    }

    /// Copy or synchronize a source property into a UI property.
    fn bind_value(
        &self,
        ui_property: &PropertyDescriptor,
        owner: &ObjectRef,
        source: &PropertyDescriptor,
        candidate: &TargetCandidate,
    ) -> std::result::Result<BindingKind, BindError> {
        if candidate.copy_only {
            self.binder.bind_property_copy(ui_property, source.get())?;
            return Ok(BindingKind::Copy);
        }
        let mode = BindingMode::resolve(candidate.mode, source.is_writable());
        self.binder.bind_property_sync(ui_property, owner, source, mode)?;
        Ok(match mode {
            BindingMode::OneTime => BindingKind::Copy,
            mode => BindingKind::Sync { mode },
        })
    }
}

impl<B: Binder> fmt::Debug for AutoWire<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoWire")
            .field("config", &self.config)
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

fn command_part(candidate: &TargetCandidate) -> Option<CommandPart> {
    match &candidate.member {
        MemberDescriptor::Method(method) => Some(CommandPart::Method(method.clone())),
        MemberDescriptor::Property(property) => Some(CommandPart::Property {
            owner: Rc::clone(&candidate.owner),
            property: property.clone(),
        }),
        _ => None,
    }
}

fn record(ui: &UiCandidate, target: &ResolvedTarget, target_members: Vec<String>, binding: BindingKind) -> BindingRecord {
    BindingRecord {
        node: ui.declared_name.clone(),
        ui_member: target.ui_member().to_string(),
        target_members,
        binding,
    }
}

pub(crate) fn describe_node(node: &NodeRef) -> String {
    node.declared_name().unwrap_or_else(|| node.type_info().name)
}
