use std::path::Path;

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use serde_json::{json, Value};

use wf_diff::diff_units;
use wf_merge::{apply_resolutions, into_units, merge_units};
use wf_server::{hash_api_key, ServerConfig, WorldForkServer};
use wf_types::{DiffChange, MergeConflict, Resolution, UnitId, UnitValues};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Diff(args) => cmd_diff(args, format),
        Command::Merge(args) => cmd_merge(args, format),
        Command::HashKey(args) => cmd_hash_key(args, format),
        Command::NewKey(args) => cmd_new_key(args, format),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    let mut config = config.with_env_overrides();
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(data_file) = args.data_file {
        config.data_file = Some(data_file);
    }

    let server = WorldForkServer::new(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let from = load_units(&args.from)?;
    let to = load_units(&args.to)?;
    let diff = diff_units(&from, &to);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
        OutputFormat::Text if diff.is_empty() => println!("No changes."),
        OutputFormat::Text => {
            for change in &diff.changes {
                println!("  {}", describe_change(change));
            }
            println!(
                "\n{} changes in {} units ({} added, {} removed, {} modified)",
                diff.len().to_string().bold(),
                diff.units_touched(),
                diff.additions().to_string().green(),
                diff.removals().to_string().red(),
                diff.modifications().to_string().yellow(),
            );
        }
    }
    Ok(())
}

fn cmd_merge(args: MergeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let base = load_units(&args.base)?;
    let ours = load_units(&args.ours)?;
    let theirs = load_units(&args.theirs)?;
    let outcome = merge_units(&base, &ours, &theirs);

    let Some(path) = &args.resolutions else {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
            OutputFormat::Text => {
                if outcome.is_clean() {
                    println!("{} Clean merge of {} units", "✓".green().bold(), outcome.merged.len());
                } else {
                    println!("{} {} conflicts:", "!".red().bold(), outcome.conflicts.len());
                    for conflict in &outcome.conflicts {
                        println!("  {}", describe_conflict(conflict));
                    }
                    println!("\nMerged units (conflicts take ours):");
                }
                println!("{}", serde_json::to_string_pretty(&outcome.merged)?);
            }
        }
        return Ok(());
    };

    let resolutions: Vec<Resolution> = serde_json::from_str(&read(path)?)
        .with_context(|| format!("parsing resolutions from {}", path.display()))?;
    let resolved = apply_resolutions(outcome.merged, &ours, &theirs, &resolutions)?;
    let units = into_units(resolved)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&units)?),
        OutputFormat::Text => {
            println!(
                "{} Applied {} resolutions to {} conflicts",
                "✓".green().bold(),
                resolutions.len(),
                outcome.conflicts.len()
            );
            println!("{}", serde_json::to_string_pretty(&units)?);
        }
    }
    Ok(())
}

fn cmd_hash_key(args: HashKeyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let hash = hash_api_key(&args.key);
    match format {
        OutputFormat::Json => println!("{}", json!({ "keyHash": hash })),
        OutputFormat::Text => println!("{hash}"),
    }
    Ok(())
}

fn cmd_new_key(args: NewKeyArgs, format: OutputFormat) -> anyhow::Result<()> {
    if args.tenant.is_empty() {
        bail!("tenant must not be empty");
    }
    let key = generate_key();
    let hash = hash_api_key(&key);
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "tenant": args.tenant, "apiKey": key, "keyHash": hash })
        ),
        OutputFormat::Text => {
            println!("{} Created API key for tenant {}", "✓".green().bold(), args.tenant.bold());
            println!("  Key: {}", key.yellow());
            println!("\nAdd to the server configuration:\n");
            println!("[[api_keys]]");
            println!("key_hash = \"{hash}\"");
            println!("tenant = \"{}\"", args.tenant);
        }
    }
    Ok(())
}

fn generate_key() -> String {
    format!("wf_live_{}", uuid::Uuid::new_v4().simple())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_units(path: &Path) -> anyhow::Result<UnitValues> {
    let value: Value = serde_json::from_str(&read(path)?)
        .with_context(|| format!("parsing {}", path.display()))?;
    parse_units(value).with_context(|| format!("loading units from {}", path.display()))
}

/// Accepts a map of unit id to unit, or an array of units carrying `id`.
fn parse_units(value: Value) -> anyhow::Result<UnitValues> {
    match value {
        Value::Object(map) => Ok(map.into_iter().map(|(id, unit)| (UnitId::new(id), unit)).collect()),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, unit)| {
                let id = unit
                    .get("id")
                    .and_then(Value::as_str)
                    .map(UnitId::new)
                    .ok_or_else(|| anyhow!("unit at index {index} has no string id"))?;
                Ok((id, unit))
            })
            .collect(),
        _ => bail!("expected a unit map or an array of units"),
    }
}

fn show(value: Option<&Value>) -> String {
    value.map_or_else(|| "(absent)".to_string(), Value::to_string)
}

fn describe_change(change: &DiffChange) -> String {
    let marker = match (&change.from, &change.to) {
        (None, _) => "+".green(),
        (_, None) => "-".red(),
        _ => "~".yellow(),
    };
    format!(
        "{marker} {} {}: {} -> {}",
        change.unit_id.as_str().bold(),
        change.path,
        show(change.from.as_ref()),
        show(change.to.as_ref())
    )
}

fn describe_conflict(conflict: &MergeConflict) -> String {
    format!(
        "{} {}  base: {}  ours: {}  theirs: {}",
        conflict.unit_id.as_str().bold(),
        conflict.path.cyan(),
        show(conflict.base.as_ref()),
        show(conflict.ours.as_ref()),
        show(conflict.theirs.as_ref())
    )
}
