// command-use - command history that remembers where each command's output was
//
// Entry point. Parses CLI args and dispatches to handlers.

use anyhow::{Context, Result};
use command_use_lib::{
    core::{recorder::normalize_command, Recorder, Restorer},
    CommandHistory, Config, Database, MarkRegistry, MarkState, ScreenMark,
};
use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().collect();
    let verbose = take_flag(&mut args, "--verbose");
    init_logging(verbose);

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = args[1].clone();
    let rest = &args[2..];

    match command.as_str() {
        "record" => handle_record(rest).await,
        "uses" => handle_uses(rest).await,
        "export" => handle_export(rest).await,
        "resolve" => handle_resolve(rest).await,
        "recent" => handle_recent(rest).await,
        "status" => handle_status().await,
        "version" | "-v" | "--version" => {
            println!("command-use v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "command_use=debug,command_use_lib=debug"
    } else {
        "command_use=info,command_use_lib=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

async fn handle_record(args: &[String]) -> Result<()> {
    let mut command_parts = Vec::new();
    let mut cwd_override: Option<String> = None;
    let mut mark_guid: Option<String> = None;
    let mut line: usize = 0;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--cwd" => {
                i += 1;
                cwd_override = args.get(i).cloned();
            }
            "--mark-guid" => {
                i += 1;
                mark_guid = args.get(i).cloned();
            }
            "--line" => {
                i += 1;
                line = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .context("--line expects a non-negative number")?;
            }
            arg => command_parts.push(arg.to_string()),
        }
        i += 1;
    }

    if command_parts.is_empty() {
        // Shell hooks sometimes fire with nothing to record
        return Ok(());
    }

    let directory = match cwd_override {
        Some(dir) => Some(dir),
        None => env::current_dir().ok().map(|p| p.display().to_string()),
    };
    let mark = Arc::new(match mark_guid {
        Some(guid) => ScreenMark::with_guid(guid, line),
        None => ScreenMark::new(line),
    });

    let config = Config::load()?;
    let db = Arc::new(open_database(&config).await?);
    let recorder = Recorder::new(Arc::clone(&db), &config);
    let mut history = CommandHistory::new();

    match recorder
        .record(&mut history, &command_parts.join(" "), directory, Some(&mark))
        .await
    {
        Ok(_) => println!("{}", mark.guid()),
        Err(e) => eprintln!("Not recorded: {}", e.user_message()),
    }

    Ok(())
}

async fn handle_uses(args: &[String]) -> Result<()> {
    if args.is_empty() {
        eprintln!("Error: No command provided");
        return Ok(());
    }

    // Same key the recorder stored under
    let command = normalize_command(&args.join(" "));
    let config = Config::load()?;
    let restorer = Restorer::new(Arc::new(open_database(&config).await?));
    let report = restorer.restore(Some(&command)).await?;

    let Some(entry) = report.history.entry(&command) else {
        println!("No uses recorded for '{}'", command);
        return Ok(());
    };

    println!("\n{} ({} uses)", entry.command(), entry.use_count());
    println!("{}", "=".repeat(60));
    for use_ in entry.uses() {
        let when = use_
            .timestamp()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "?".to_string());
        let state = match use_.state() {
            MarkState::Resolved => "resolved",
            MarkState::Unresolved => "unresolved",
        };
        println!(
            "  {}  {:<30} {:<38} {}",
            when,
            use_.directory().unwrap_or("-"),
            use_.mark_guid().unwrap_or("-"),
            state
        );
    }
    println!("{}", "=".repeat(60));

    if report.skipped > 0 {
        println!("({} unreadable entries skipped)", report.skipped);
    }

    Ok(())
}

async fn handle_export(args: &[String]) -> Result<()> {
    let command = Some(normalize_command(&args.join(" "))).filter(|c| !c.is_empty());
    let config = Config::load()?;
    let restorer = Restorer::new(Arc::new(open_database(&config).await?));
    let report = restorer.restore(command.as_deref()).await?;

    for entry in report.history.entries() {
        for use_ in entry.uses() {
            println!("{}\t{}", entry.command(), serde_json::to_string(use_)?);
        }
    }

    Ok(())
}

async fn handle_resolve(args: &[String]) -> Result<()> {
    let mut guids: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        if args[i] == "--marks" {
            i += 1;
            if let Some(list) = args.get(i) {
                guids.extend(
                    list.split(',')
                        .map(str::trim)
                        .filter(|g| !g.is_empty())
                        .map(str::to_string),
                );
            }
        }
        i += 1;
    }

    let registry = MarkRegistry::from_marks(
        guids
            .into_iter()
            .map(|guid| Arc::new(ScreenMark::with_guid(guid, 0))),
    );

    let config = Config::load()?;
    let restorer = Restorer::new(Arc::new(open_database(&config).await?));
    let (report, summary) = restorer.restore_and_resolve(None, &registry).await?;

    println!("Commands:   {}", report.history.len());
    println!("Resolved:   {}", summary.resolved);
    println!("Unresolved: {}", summary.unresolved);
    println!("Skipped:    {}", report.skipped);

    Ok(())
}

async fn handle_recent(args: &[String]) -> Result<()> {
    let limit = args
        .first()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(10);

    let config = Config::load()?;
    let db = open_database(&config).await?;
    let commands = db.get_recent_commands(limit).await?;

    if commands.is_empty() {
        println!("No commands found.");
        return Ok(());
    }

    println!("\nRecent commands:");
    println!("{}", "=".repeat(60));
    for (i, cmd) in commands.iter().enumerate() {
        println!(
            "{:3}. {} (used {} times, last {})",
            i + 1,
            cmd.command,
            cmd.use_count,
            cmd.last_recorded
        );
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn handle_status() -> Result<()> {
    let config = Config::load()?;
    let db = open_database(&config).await?;
    let stats = db.stats().await?;

    println!("\ncommand-use Status");
    println!("{}", "=".repeat(60));
    println!("  Database:          {}", db.path().display());
    println!("  Command uses:      {}", stats.total_uses);
    println!("  Distinct commands: {}", stats.distinct_commands);
    println!("  Uses kept per cmd: {}", config.max_uses_per_command);
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn open_database(config: &Config) -> Result<Database> {
    Database::new(&config.db_path)
        .await
        .with_context(|| format!("opening {}", config.db_path.display()))
}

fn print_usage() {
    println!(
        r#"command-use v{} - command history that remembers where the output was

USAGE:
    command-use <COMMAND> [OPTIONS] [--verbose]

COMMANDS:
    record <command>       Record a use (--cwd DIR, --mark-guid GUID, --line N)
    uses <command>         List recorded uses of a command
    export [command]       Print uses as command<TAB>[time,directory,guid]
    resolve --marks a,b    Restore history and bind uses to the given mark guids
    recent [limit]         Show recently used commands (default: 10)
    status                 Show database stats
    version                Show version
    help                   Show this help

ENVIRONMENT:
    COMMAND_USE_DB         Database path (default: ~/.command-use/history.db)
    COMMAND_USE_MAX_USES   Uses kept per command (default: 100)
    RUST_LOG               Log filter
"#,
        env!("CARGO_PKG_VERSION")
    );
}
