//! Autowire CLI - wire scene files and inspect naming decisions

use std::rc::Rc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;

use autowire::deferred::Attachment;
use autowire::error::{FixSuggestion, WireError};
use autowire::model::{BindableObject, Value};
use autowire::naming;
use autowire::report::{Severity, WiringReport};
use autowire::scene::{LoadedScene, Scene};
use autowire::{AutoWire, DiscoveryContext, DiscoveryOutcome, Discoverer};

#[derive(Parser)]
#[command(name = "autowire")]
#[command(about = "Autowire - convention-based UI to view-model wiring")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tokens of an identifier
    Split {
        identifier: String,
    },

    /// Print the matching rank of two identifiers
    Rank {
        a: String,
        b: String,
    },

    /// Wire a scene file and print the report
    Wire {
        /// Path to the scene YAML file
        file: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Raise a node event after wiring (Node.Event), repeatable
        #[arg(long, value_name = "NODE.EVENT")]
        raise: Vec<String>,
    },

    /// Validate a scene file (parse and configuration only)
    Validate {
        /// Path to the scene YAML file
        file: String,
    },
}

fn main() {
    // Logs go to stderr at WARN unless RUST_LOG says otherwise, so that
    // --json output stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Split { identifier } => split_identifier(&identifier),
        Commands::Rank { a, b } => {
            println!("{}", naming::matching_rank(naming::split(&a).as_slice(), naming::split(&b).as_slice()));
            Ok(())
        }
        Commands::Wire { file, json, raise } => wire_scene(&file, json, &raise),
        Commands::Validate { file } => validate_scene(&file),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.downcast_ref::<WireError>().and_then(|w| w.fix_suggestion()) {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn split_identifier(identifier: &str) -> anyhow::Result<()> {
    let tokens = naming::split(identifier);
    println!("{}", serde_json::to_string(tokens.as_slice())?);
    Ok(())
}

/// `Node.Event` → (`Node`, `Event`)
fn parse_event_reference(reference: &str) -> Result<(String, String), WireError> {
    match reference.rsplit_once('.') {
        Some((node, event)) if !node.is_empty() && !event.is_empty() => Ok((node.to_string(), event.to_string())),
        _ => Err(WireError::InvalidEventReference {
            reference: reference.to_string(),
        }),
    }
}

fn wire_scene(file: &str, as_json: bool, raise: &[String]) -> anyhow::Result<()> {
    let scene = Scene::load(file)?;
    let raises = raise
        .iter()
        .map(|r| parse_event_reference(r))
        .collect::<Result<Vec<_>, _>>()?;

    let loaded = scene.instantiate()?;
    let root = loaded.root_ref();

    let discovery = match &scene.bound {
        Some(type_name) => {
            let object = loaded.construct(type_name)?;
            loaded
                .root
                .set_property(&scene.config.wiring.context_member, Value::Object(object))?;
            None
        }
        None => {
            let discoverer = Discoverer::new(scene.config.discovery.clone())?;
            let ctx = DiscoveryContext::new(&loaded.registry)
                .with_container(&loaded.container)
                .with_resources(&loaded.resources);
            discoverer.discover(&root, &ctx)?
        }
    };

    let engine = Rc::new(AutoWire::new(scene.config.wiring.clone())?);
    let mut report = match engine.attach(&root)? {
        Attachment::Wired(report) => report,
        Attachment::Pending(_) => {
            let mut report = WiringReport::new();
            report.diagnose(
                Severity::Warning,
                loaded.root.name().unwrap_or("root"),
                Some(scene.config.wiring.context_member.as_str()),
                "no bound object, wiring deferred until one is set",
            );
            report
        }
    };

    if !loaded.bindings.is_empty() {
        match engine.context_object(&root) {
            Some(object) => {
                for (node, binding) in &loaded.bindings {
                    let node_ref: autowire::NodeRef = Rc::clone(node) as autowire::NodeRef;
                    // A failed explicit binding is reported; the rest of the report stands
                    match engine.bind_explicit(&node_ref, &object, binding) {
                        Ok(record) => report.bindings.push(record),
                        Err(e @ WireError::ExplicitBinding { .. }) => report.diagnose(
                            Severity::Error,
                            node.name().unwrap_or("?"),
                            Some(binding.ui_member.as_str()),
                            e.to_string(),
                        ),
                        Err(e) => return Err(e.into()),
                    }
                }
            }
            None => tracing::warn!(count = loaded.bindings.len(), "explicit bindings skipped: no bound object"),
        }
    }

    let mut raised = Vec::new();
    for (node_name, event) in &raises {
        let node = loaded.node(node_name)?;
        let handlers = node.raise(event, &Value::Null);
        raised.push((format!("{node_name}.{event}"), handlers));
    }

    if as_json {
        print_json(&report, discovery.as_ref(), &raised, &loaded)?;
    } else {
        print_text(file, &report, discovery.as_ref(), &raised, &loaded);
    }
    Ok(())
}

fn calls_of(loaded: &LoadedScene) -> Vec<(String, String, Vec<serde_json::Value>)> {
    loaded
        .instances
        .borrow()
        .iter()
        .flat_map(|object| {
            let owner = object.type_info().name;
            object
                .calls()
                .into_iter()
                .map(move |call| (owner.clone(), call.method, call.args.iter().map(Value::to_json).collect()))
        })
        .collect()
}

fn print_json(
    report: &WiringReport,
    discovery: Option<&DiscoveryOutcome>,
    raised: &[(String, usize)],
    loaded: &LoadedScene,
) -> anyhow::Result<()> {
    let discovery = discovery.map(|d| {
        json!({
            "type": d.type_info.full_name(),
            "matched_name": d.matched_name,
            "tier": d.tier,
            "strategy": d.strategy,
            "assigned": d.assigned,
        })
    });
    let raised: Vec<_> = raised
        .iter()
        .map(|(event, handlers)| json!({ "event": event, "handlers": handlers }))
        .collect();
    let calls: Vec<_> = calls_of(loaded)
        .into_iter()
        .map(|(object, method, args)| json!({ "object": object, "method": method, "args": args }))
        .collect();

    let output = json!({
        "discovery": discovery,
        "bindings": report.bindings,
        "diagnostics": report.diagnostics,
        "raised": raised,
        "calls": calls,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text(
    file: &str,
    report: &WiringReport,
    discovery: Option<&DiscoveryOutcome>,
    raised: &[(String, usize)],
    loaded: &LoadedScene,
) {
    println!("{} Scene: {}", "→".cyan(), file.cyan().bold());
    if let Some(d) = discovery {
        println!(
            "{} Discovered {} ({}, via {})",
            "→".cyan(),
            d.type_info.full_name().cyan().bold(),
            d.tier,
            d.strategy
        );
    }

    println!("{} {} binding(s)", "✓".green(), report.bindings.len());
    for binding in &report.bindings {
        println!("  {binding}");
    }

    for diagnostic in &report.diagnostics {
        let tag = match diagnostic.severity {
            Severity::Info => "info".dimmed(),
            Severity::Warning => "warning".yellow(),
            Severity::Error => "error".red().bold(),
        };
        let member = diagnostic.member.as_deref().map(|m| format!(".{m}")).unwrap_or_default();
        println!("  {tag} {}{member}: {}", diagnostic.node, diagnostic.message);
    }

    for (event, handlers) in raised {
        println!("{} Raised {} ({} handler(s))", "→".cyan(), event.bold(), handlers);
    }

    let calls = calls_of(loaded);
    if !calls.is_empty() {
        println!("{}", "Calls:".cyan().bold());
        for (object, method, args) in calls {
            let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
            println!("  {object}.{method}({})", args.join(", "));
        }
    }
}

fn validate_scene(file: &str) -> anyhow::Result<()> {
    let scene = Scene::load(file)?;
    scene.validate()?;

    println!("{} Scene '{}' is valid", "✓".green(), file);
    println!("  Types: {}", scene.type_count());
    println!("  Nodes: {}", scene.node_count());
    match &scene.bound {
        Some(bound) => println!("  Bound: {bound}"),
        None => println!("  Bound: (discovery)"),
    }
    Ok(())
}
