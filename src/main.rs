// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! servicegraph - operator tool for the service graph client.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use uuid::Uuid;

use servicegraph::config::{self, ClientConfig};
use servicegraph::telemetry::{init_logging, LogConfig};
use servicegraph::{codec, identity, Client, ExportOutcome, NodeId};

/// servicegraph version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name the connectivity check reports itself under.
const CHECK_SERVICE: &str = "servicegraph-check";

/// servicegraph - inspect node ids, context headers and collector connectivity.
#[derive(Parser)]
#[command(name = "servicegraph")]
#[command(author, version, about = "Service graph client tool", long_about = None)]
struct Cli {
    /// Config file to load instead of searching the working directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Collector host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Collector port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Project id
    #[arg(long, global = true)]
    project_id: Option<u64>,

    /// Service namespace (UUID)
    #[arg(long, global = true)]
    service_ns: Option<Uuid>,

    /// Show debug output
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for servicegraph.
#[derive(Subcommand)]
enum Commands {
    /// Print the id a node would be reported under
    Id {
        #[command(subcommand)]
        kind: IdKind,
    },

    /// Print the nodes carried by a servicegraph-context header
    Decode {
        /// Header value, e.g. "service-node=<id> transaction-node=<id>"
        header: String,
    },

    /// Send a one-node batch to the collector and report the outcome
    Check,

    /// Show the resolved configuration
    Config,

    /// Show version information
    Version,
}

/// Node kinds for `id`.
#[derive(Subcommand)]
enum IdKind {
    /// A service
    Service { name: String },
    /// A transaction within a service
    Transaction { service: String, name: String },
    /// An uninstrumented host
    External { host: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.debug {
        LogConfig::debug()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config)?;

    match &cli.command {
        Commands::Id { kind } => {
            let config = resolve_config(&cli)?;
            print_id(&config, kind);
        }
        Commands::Decode { header } => print_decoded(header),
        Commands::Check => {
            let config = resolve_config(&cli)?;
            run_check(config).await?;
        }
        Commands::Config => {
            let config = resolve_config(&cli)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Version => {
            println!("servicegraph {}", VERSION);
        }
    }
    Ok(())
}

/// Defaults < file < environment < flags.
fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let config = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config_from_dir(&std::env::current_dir()?)?,
    };
    let mut config = config::apply_env_overrides(config, |key| std::env::var(key).ok())?;

    if let Some(host) = &cli.host {
        config.collector_host = host.clone();
    }
    if let Some(port) = cli.port {
        config.collector_port = port;
    }
    if let Some(project_id) = cli.project_id {
        config.project_id = project_id;
    }
    if let Some(namespace) = cli.service_ns {
        config.service_namespace = namespace;
    }

    config.validate()?;
    Ok(config)
}

fn print_id(config: &ClientConfig, kind: &IdKind) {
    let ns = config.service_namespace;
    match kind {
        IdKind::Service { name } => {
            print_node("service", name, identity::service_id(ns, name));
        }
        IdKind::Transaction { service, name } => {
            let parent = identity::service_id(ns, service);
            print_node("service", service, parent);
            print_node("transaction", name, identity::transaction_id(parent, name));
        }
        IdKind::External { host } => {
            let name = identity::external_node_name(host);
            print_node("external", &name, identity::external_id(ns, host));
        }
    }
}

fn print_node(kind: &str, name: &str, id: NodeId) {
    println!("{:<12} {} {}", kind.cyan(), id.to_string().bold(), name.dimmed());
}

fn print_decoded(header: &str) {
    let decoded = codec::decode(header);
    if decoded.is_empty() {
        println!("{}", "No recognized nodes in header".yellow());
        return;
    }
    if let Some(service) = decoded.service {
        println!("{:<18} {}", codec::SERVICE_NODE_KEY.cyan(), service);
    }
    if let Some(transaction) = decoded.transaction {
        println!("{:<18} {}", codec::TRANSACTION_NODE_KEY.cyan(), transaction);
    }
}

async fn run_check(config: ClientConfig) -> anyhow::Result<()> {
    println!(
        "{} Checking collector at {}",
        "→".cyan(),
        config.submit_url().bold()
    );

    let client = Client::new(config)?;
    client.report_self(CHECK_SERVICE, None);
    let outcome = client.flush().await;

    let result = match &outcome {
        ExportOutcome::Sent { nodes, edges } => {
            println!(
                "{} Collector accepted {} nodes, {} edges",
                "✓".green(),
                nodes,
                edges
            );
            Ok(())
        }
        ExportOutcome::Skipped => {
            println!("{}", "Nothing to send".yellow());
            Ok(())
        }
        ExportOutcome::Dropped { error, .. } => {
            eprintln!("{} {}", "✗ Batch dropped:".red(), error);
            Err(anyhow::anyhow!("collector check failed"))
        }
    };

    println!("\n{}", client.metrics().format_report().dimmed());
    result
}
