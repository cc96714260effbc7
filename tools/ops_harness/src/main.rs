use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use ops_core::{
    load_resolver_constants_from_env, ActionBoard, ActionKind, ActionResolver, AgentProfile,
    DeskSnapshot, EntityRegistry, Organization, OrganizationMetadata, Reviver, SaveGame,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde_json::{json, Value as JsonValue};

#[derive(Parser, Debug)]
#[command(author, version, about = "Operations Desk action harness", long_about = None)]
struct Args {
    /// Path to the action catalog JSON
    #[arg(long)]
    catalog: PathBuf,

    /// Desk snapshot JSON (multipliers, city, stamina, team size)
    #[arg(long)]
    desk: Option<PathBuf>,

    /// Agent profile JSON (stat levels, success chance multiplier)
    #[arg(long)]
    agent: Option<PathBuf>,

    /// Organization metadata JSON array to seed the registry with
    #[arg(long)]
    organizations: Option<PathBuf>,

    /// Seed for catalog perturbation and simulated attempts
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Only report actions of this kind (general, contract, operation, black_op)
    #[arg(long)]
    kind: Option<String>,

    /// Simulated attempts per action
    #[arg(long, default_value_t = 0)]
    attempts: u32,

    /// Write the resulting save string here and verify it reloads unchanged
    #[arg(long)]
    save_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let kind_filter = args
        .kind
        .as_deref()
        .map(|key| {
            ActionKind::from_key(key).ok_or_else(|| anyhow::anyhow!("Unknown action kind '{key}'"))
        })
        .transpose()?;

    let (constants, metadata) = load_resolver_constants_from_env();
    if let Some(path) = metadata.path() {
        tracing::info!(path = %path.display(), "harness.constants_override");
    }
    let resolver = ActionResolver::new(constants);

    let catalog_json = read(&args.catalog, "action catalog")?;
    let mut board = ActionBoard::from_catalog_str(&catalog_json, args.seed).with_context(|| {
        format!("Failed to build action board from {}", args.catalog.display())
    })?;

    let desk = match &args.desk {
        Some(path) => DeskSnapshot::from_json_str(&read(path, "desk snapshot")?)
            .with_context(|| format!("Failed to parse desk snapshot at {}", path.display()))?,
        None => DeskSnapshot::default(),
    };
    let agent = match &args.agent {
        Some(path) => AgentProfile::from_json_str(&read(path, "agent profile")?)
            .with_context(|| format!("Failed to parse agent profile at {}", path.display()))?,
        None => AgentProfile::default(),
    };

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let mut report = Vec::new();
    let keys: Vec<(ActionKind, String)> = board
        .iter()
        .filter(|action| kind_filter.map_or(true, |kind| action.kind == kind))
        .map(|action| (action.kind, action.name.clone()))
        .collect();

    for (kind, name) in keys {
        let Some(action) = board.get_mut(kind, &name) else {
            continue;
        };
        let (low, high) = resolver
            .est_success_chance(action, &desk, &agent)
            .with_context(|| format!("Failed to estimate '{name}'"))?;
        let time = resolver
            .action_time(action, &desk, &agent)
            .with_context(|| format!("Failed to time '{name}'"))?;

        let mut successes = 0u32;
        for _ in 0..args.attempts {
            let outcome = resolver
                .resolve_attempt(action, &desk, &agent, &mut rng)
                .with_context(|| format!("Attempt at '{name}' failed"))?;
            if outcome.success {
                successes += 1;
            }
        }

        report.push(json!({
            "kind": kind.key(),
            "name": name,
            "difficulty": action.difficulty()?,
            "estimate": [low, high],
            "ticks": time,
            "attempts": args.attempts,
            "successes": successes,
            "level": action.level,
            "max_level": action.max_level,
            "reward_multiplier": action.reward_multiplier(),
        }));
    }

    println!("=== actions ===");
    println!("{}", serde_json::to_string_pretty(&JsonValue::Array(report))?);

    if let Some(path) = &args.save_out {
        let mut organizations = EntityRegistry::<Organization>::new();
        if let Some(org_path) = &args.organizations {
            let records =
                OrganizationMetadata::list_from_json_str(&read(org_path, "organizations")?)
                    .with_context(|| {
                        format!("Failed to parse organizations at {}", org_path.display())
                    })?;
            organizations.rebuild_all(records);
        }

        let game = SaveGame {
            board,
            organizations,
            tasks: Vec::new(),
        };
        let save = game.to_save_string().context("Failed to write save")?;
        let reloaded = SaveGame::load(&save, &Reviver::builtin())
            .context("Failed to reload save")?
            .to_save_string()
            .context("Failed to rewrite reloaded save")?;
        if reloaded != save {
            anyhow::bail!("Save changed after reload");
        }
        fs::write(path, &save)
            .with_context(|| format!("Failed to write save to {}", path.display()))?;
        println!("=== save ===");
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "path": path.display().to_string(),
                "bytes": save.len(),
                "actions": game.board.len(),
                "organizations": game
                    .organizations
                    .iter()
                    .map(|(key, _)| key)
                    .collect::<Vec<_>>(),
            }))?
        );
    }

    Ok(())
}

fn read(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {what} at {}", path.display()))
}
