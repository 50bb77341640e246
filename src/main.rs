use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use db_router::{RouteSpec, RouterSettings, ShardConfig, ShardRouter, StatementRewriter};
use std::path::{Path, PathBuf};

const CLI_CALL_ID: &str = "cli.route";

#[derive(Parser)]
#[command(name = "db-router")]
#[command(about = "Inspect shard routing decisions and statement rewrites")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show which database and table a routing value maps to
    Route {
        key: String,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        db_count: Option<u32>,
        #[arg(long)]
        tb_count: Option<u32>,
    },
    /// Append a table suffix to a statement's table
    Rewrite {
        sql: String,
        #[arg(long)]
        suffix: String,
    },
    /// Validate a settings file
    Check {
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Route {
            key,
            config,
            db_count,
            tb_count,
        } => route(&key, config.as_deref(), db_count, tb_count).await,
        Command::Rewrite { sql, suffix } => rewrite(&sql, &suffix),
        Command::Check { config } => check(&config),
    }
}

fn load_settings(path: &Path) -> Result<RouterSettings> {
    RouterSettings::from_file(path).with_context(|| format!("loading {}", path.display()))
}

async fn route(
    key: &str,
    config: Option<&Path>,
    db_count: Option<u32>,
    tb_count: Option<u32>,
) -> Result<()> {
    let mut router = match (config, db_count, tb_count) {
        (Some(path), None, None) => ShardRouter::from_settings(&load_settings(path)?)?,
        (None, Some(db), Some(tb)) => ShardRouter::new(ShardConfig::new(db, tb, "")?),
        _ => return Err(anyhow!("pass either --config or both --db-count and --tb-count")),
    };
    router.register(CLI_CALL_ID, RouteSpec::key("key"));

    let tb_count = router.config().tb_count();
    let shared = &router;
    let (source, decision) = router
        .call(CLI_CALL_ID, &[&key], move || async move {
            let decision = db_router::context::current().and_then(|ctx| ctx.decision());
            Ok((shared.current_source_key(), decision))
        })
        .await?;
    let decision = decision.ok_or_else(|| anyhow!("no routing decision for '{}'", key))?;

    println!("key:    {}", key);
    println!("source: {}", source.unwrap_or_default());
    println!("table:  {}", decision.tb_key());
    println!("index:  {}", decision.flat_index(tb_count));
    Ok(())
}

fn rewrite(sql: &str, suffix: &str) -> Result<()> {
    let rewritten = StatementRewriter::new().rewrite(sql, suffix)?;
    println!("{}", rewritten);
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let settings = load_settings(path)?;
    println!(
        "ok: {} databases x {} tables, default source {}",
        settings.db_count, settings.tb_count, settings.default
    );
    for name in &settings.list {
        if let Some(source) = settings.data_source(name) {
            println!("  {} -> {}", name, source);
        }
    }
    Ok(())
}
