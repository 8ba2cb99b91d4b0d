//! Simple Sync ACL control tool
//!
//! Operates on a durable event log through the write gate:
//! - check permissions and explain the deciding rule
//! - list projected rules and logged events
//! - grant or deny access, or submit raw event drafts from a JSON file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use simplesync_authz::{AuthzConfig, RuleSubmission, WriteGate};
use simplesync_core::{EventDraft, EventQuery};
use std::path::PathBuf;
use tracing::{debug, info};

/// Simple Sync ACL CLI
#[derive(Parser)]
#[command(name = "aclctl")]
#[command(about = "Inspect and update an event-sourced access control log")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "SIMPLESYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Event log path (overrides config)
    #[arg(long, env = "SIMPLESYNC_LOG")]
    log: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decide whether a subject may perform an action on a resource
    Check {
        subject: String,
        resource: String,
        action: String,

        /// Print the full decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the projected rules in log order
    Rules,

    /// List logged events
    Events {
        /// Only events at or after this timestamp
        #[arg(long)]
        from: Option<u64>,

        /// Only events at or before this timestamp
        #[arg(long)]
        to: Option<u64>,
    },

    /// Append an allow rule
    Grant {
        subject: String,
        resource: String,
        action: String,

        /// Submitting identity (defaults to the root subject)
        #[arg(long = "as")]
        caller: Option<String>,
    },

    /// Append a deny rule
    #[command(alias = "revoke")]
    Deny {
        subject: String,
        resource: String,
        action: String,

        /// Submitting identity (defaults to the root subject)
        #[arg(long = "as")]
        caller: Option<String>,
    },

    /// Submit a JSON array of event drafts
    Submit {
        /// File holding the drafts
        file: PathBuf,

        /// Submitting identity
        #[arg(long = "as")]
        caller: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},simplesync_authz={}", log_level, log_level).into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => AuthzConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => AuthzConfig::default(),
    };
    if let Some(log) = cli.log {
        config.log_path = Some(log);
    }
    if config.log_path.is_none() {
        bail!("no event log configured; pass --log or set log_path in the configuration file");
    }
    debug!(?config, "Loaded configuration");

    let gate = WriteGate::open(config).await.context("failed to open event log")?;
    let root = gate.config().root_subject.clone();

    match cli.command {
        Command::Check {
            subject,
            resource,
            action,
            json,
        } => {
            let decision = gate.check(&subject, &resource, &action).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else {
                let verdict = if decision.allowed { "ALLOW" } else { "DENY" };
                println!("{verdict}: {}", decision.reason);
            }
        }
        Command::Rules => {
            for rule in gate.projector().rules().await {
                println!("#{:<6} {}", rule.sequence, rule);
            }
        }
        Command::Events { from, to } => {
            let query = EventQuery {
                from_timestamp: from,
                to_timestamp: to,
            };
            for event in gate.list_events(query).await? {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
        Command::Grant {
            subject,
            resource,
            action,
            caller,
        } => {
            let caller = caller.unwrap_or_else(|| root.clone());
            let rule = RuleSubmission::allow(&subject, &resource, &action);
            report(gate.submit_rules(&caller, vec![rule]).await)?;
        }
        Command::Deny {
            subject,
            resource,
            action,
            caller,
        } => {
            let caller = caller.unwrap_or_else(|| root.clone());
            let rule = RuleSubmission::deny(&subject, &resource, &action);
            report(gate.submit_rules(&caller, vec![rule]).await)?;
        }
        Command::Submit { file, caller } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let drafts: Vec<EventDraft> =
                serde_json::from_str(&contents).context("drafts must be a JSON array of events")?;
            info!(count = drafts.len(), caller = %caller, "Submitting drafts");
            report(gate.submit(&caller, drafts).await)?;
        }
    }

    Ok(())
}

/// Print per-draft outcomes; fail if any draft was rejected
fn report(results: Vec<simplesync_authz::SubmitResult>) -> Result<()> {
    let mut rejected = 0;
    for result in &results {
        match result {
            Ok(event) => println!("accepted {}", event.id),
            Err(e) => {
                rejected += 1;
                println!("rejected [{}] {}", e.kind(), e);
            }
        }
    }

    if rejected > 0 {
        bail!("{} of {} drafts rejected", rejected, results.len());
    }
    Ok(())
}
