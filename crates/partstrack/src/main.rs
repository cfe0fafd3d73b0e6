//! `partstrack` - CLI for tracking restoration part shipments
//!
//! This binary stores parts in the local database and talks to the
//! configured carrier-tracking API.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;

use partstrack::cli::{Cli, ClassifyCommand, Command, ConfigCommand, PartCommand};
use partstrack::status::PromptResponse;
use partstrack::{
    init_logging, CarrierResolver, Config, HttpTrackingApi, NewPart, Part, PartId, PartViewer,
    RefreshOutcome, Storage, Timeline, TrackingPrompt, TransitionSource,
};

type Viewer = PartViewer<Storage, HttpTrackingApi>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Config subcommands report load errors themselves
    if let Command::Config(config_cmd) = cli.command {
        return handle_config(cli.config, config_cmd);
    }

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Classify(cmd) => handle_classify(&cmd),
        Command::Part(part_cmd) => handle_part(&config, part_cmd).await,
        Command::Refresh(cmd) => handle_refresh(&config, cmd.id).await,
        Command::Config(_) => Ok(()),
    }
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening database {}", path.display()))
}

/// Viewer that refreshes on open according to the configured policy.
fn auto_viewer(config: &Config) -> Result<Viewer> {
    Ok(PartViewer::new(
        open_storage(config)?,
        HttpTrackingApi::from_config(&config.tracking),
    )
    .with_policy(config.refresh_policy())
    .with_visible_checkpoints(config.timeline.visible_checkpoints))
}

/// Viewer for commands that sync explicitly.
fn manual_viewer(config: &Config) -> Result<Viewer> {
    Ok(PartViewer::new(
        open_storage(config)?,
        HttpTrackingApi::from_config(&config.tracking),
    )
    .with_policy(config.refresh_policy().with_enabled(false))
    .with_visible_checkpoints(config.timeline.visible_checkpoints))
}

fn handle_classify(cmd: &ClassifyCommand) -> Result<()> {
    let classification = CarrierResolver::new().classify(&cmd.tracking);
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
    } else {
        println!(
            "Carrier:    {}",
            classification.carrier.as_deref().unwrap_or("-")
        );
        println!("Link:       {}", classification.url.as_deref().unwrap_or("-"));
        println!(
            "Trackable:  {}",
            if classification.trackable { "yes" } else { "no" }
        );
    }
    Ok(())
}

async fn handle_part(config: &Config, cmd: PartCommand) -> Result<()> {
    match cmd {
        PartCommand::Add {
            name,
            tracking,
            status,
        } => {
            let part = open_storage(config)?.insert(&NewPart {
                name,
                tracking: tracking.unwrap_or_default(),
                status: status.into(),
            })?;
            println!("Added part {} ({})", part.id, part.name);
        }
        PartCommand::List { json } => {
            let parts = open_storage(config)?.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&parts)?);
            } else if parts.is_empty() {
                println!("No parts recorded.");
            } else {
                println!("{:>5}  {:<10} {:<20} NAME", "ID", "STATUS", "TRACKING");
                for part in &parts {
                    let tracking = part
                        .tracking_status
                        .as_ref()
                        .map_or("-", |phase| phase.label());
                    println!(
                        "{:>5}  {:<10} {:<20} {}",
                        part.id, part.status, tracking, part.name
                    );
                }
            }
        }
        PartCommand::Show { id, json, all } => {
            let viewer = auto_viewer(config)?;
            let outcome = viewer.open(id).await?;
            show_part(&viewer, &outcome, json, all)?;
        }
        PartCommand::SetTracking { id, tracking } => {
            let viewer = manual_viewer(config)?;
            viewer.open(id).await?;
            match viewer.save_tracking(&tracking).await? {
                Some(outcome) => report(&viewer, &outcome),
                None => println!("Tracking saved."),
            }
        }
        PartCommand::SetStatus {
            id,
            status,
            tracking,
            skip_tracking,
        } => {
            let viewer = manual_viewer(config)?;
            viewer.open(id).await?;
            let mut prompt = match (tracking, skip_tracking) {
                (Some(tracking), _) => CliPrompt::Fixed(PromptResponse::Provided(tracking)),
                (None, true) => CliPrompt::Fixed(PromptResponse::Skipped),
                (None, false) => CliPrompt::Stdin,
            };
            let (change, outcome) = viewer
                .set_status(status.into(), TransitionSource::Dropdown, &mut prompt)
                .await?;
            println!("Part {id}: {} -> {}", change.previous, change.current);
            if let Some(outcome) = outcome {
                report(&viewer, &outcome);
            }
        }
    }
    Ok(())
}

async fn handle_refresh(config: &Config, id: PartId) -> Result<()> {
    let viewer = manual_viewer(config)?;
    viewer.open(id).await?;
    let outcome = viewer.refresh().await?;
    report(&viewer, &outcome);
    if outcome.is_applied() {
        if let (Some(part), Some(timeline)) = (viewer.current(), viewer.timeline()) {
            print_tracking(&part, &timeline);
        }
    }
    Ok(())
}

fn report(viewer: &Viewer, outcome: &RefreshOutcome) {
    match viewer.notice() {
        Some(notice) => eprintln!("{:?}: {}", notice.level, notice.message),
        None => println!("{outcome}"),
    }
}

fn show_part(viewer: &Viewer, outcome: &RefreshOutcome, json: bool, all: bool) -> Result<()> {
    let part = viewer.current().context("part disappeared from view")?;
    let mut timeline = viewer.timeline().context("part disappeared from view")?;
    if all {
        timeline.expand();
    } else {
        timeline.collapse();
    }
    let classification = CarrierResolver::new().classify(&part.tracking);

    if json {
        let value = serde_json::json!({
            "part": part,
            "classification": classification,
            "progress": timeline.progress(),
            "checkpoints": timeline.visible(),
            "remaining_checkpoints": timeline.remaining_count(),
            "notice": viewer.notice(),
            "refresh": outcome.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} (#{})", part.name, part.id);
    println!("Status:     {}", part.status);
    if part.has_tracking() {
        println!("Tracking:   {}", part.tracking);
        if let Some(carrier) = &classification.carrier {
            println!("Carrier:    {carrier}");
        }
        if let Some(url) = &classification.url {
            println!("Link:       {url}");
        }
    }
    if let Some(notice) = viewer.notice() {
        println!("{:?}: {}", notice.level, notice.message);
    }
    print_tracking(&part, &timeline);
    Ok(())
}

fn print_tracking(part: &Part, timeline: &Timeline) {
    if let Some(phase) = timeline.status() {
        println!("Shipment:   {} ({}%)", phase.label(), timeline.progress());
    }
    if let Some(updated_at) = part.tracking_updated_at {
        println!("Updated:    {}", updated_at.format("%Y-%m-%d %H:%M UTC"));
    }
    if timeline.is_empty() {
        return;
    }
    println!();
    for checkpoint in timeline.visible() {
        let when = checkpoint
            .checkpoint_time
            .map_or_else(|| "unknown time".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        let message = checkpoint
            .subtag_message
            .as_deref()
            .unwrap_or_else(|| checkpoint.tag.label());
        match &checkpoint.location {
            Some(location) => println!("  {when}  {message} ({location})"),
            None => println!("  {when}  {message}"),
        }
    }
    if timeline.remaining_count() > 0 {
        println!("  ... {} more (use --all)", timeline.remaining_count());
    }
}

/// Answers the shipped-without-tracking prompt from flags or stdin.
#[derive(Debug)]
enum CliPrompt {
    Fixed(PromptResponse),
    Stdin,
}

impl TrackingPrompt for CliPrompt {
    fn request_tracking(&mut self, part: &Part) -> PromptResponse {
        match self {
            Self::Fixed(response) => response.clone(),
            Self::Stdin => {
                print!(
                    "Tracking number for '{}' (leave blank to skip): ",
                    part.name
                );
                if let Err(err) = io::stdout().flush() {
                    tracing::debug!(error = %err, "Failed to flush tracking prompt");
                }
                let mut line = String::new();
                match io::stdin().lock().read_line(&mut line) {
                    Ok(_) if !line.trim().is_empty() => {
                        PromptResponse::Provided(line.trim().to_string())
                    }
                    _ => PromptResponse::Skipped,
                }
            }
        }
    }
}

fn handle_config(config_path: Option<std::path::PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path).context("loading configuration")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:       {}", config.database_path().display());
                println!();
                println!("[Tracking]");
                println!("  API base URL:        {}", config.tracking.api_base_url);
                println!(
                    "  Auth token:          {}",
                    if config.tracking.auth_token.is_some() {
                        "set"
                    } else {
                        "not set"
                    }
                );
                println!("  Staleness (hours):   {}", config.tracking.staleness_hours);
                println!("  Auto refresh:        {}", config.tracking.auto_refresh);
                println!();
                println!("[Timeline]");
                println!(
                    "  Visible checkpoints: {}",
                    config.timeline.visible_checkpoints
                );
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                config_path
                    .unwrap_or_else(Config::default_config_path)
                    .display()
            );
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
