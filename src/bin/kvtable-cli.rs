//! kvtable interactive shell
//!
//! ```bash
//! # Start the REPL on an empty in-memory store
//! kvtable-cli
//!
//! # Keep data between sessions and raise the scan limit
//! kvtable-cli --snapshot tables.kvtb --max-scan-limit 500000
//!
//! # Run one command and exit
//! kvtable-cli -c "NAMESPACE.VIEW"
//! ```

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kvtable::{CommandHandler, EngineConfig, KvStore, MemoryStore, TableEngine};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Tables on a key-value store, from the command line
#[derive(Parser, Debug)]
#[command(name = "kvtable-cli", version, about = "Interactive shell for kvtable")]
struct Args {
    /// Maximum rows a single filter pass may examine (1000..=10000000)
    #[arg(long, value_name = "N")]
    max_scan_limit: Option<i64>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Snapshot file: loaded at start if present, written on .save and exit
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Execute a single command and exit
    #[arg(short = 'c', long)]
    command: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(limit) = args.max_scan_limit {
        config.apply_max_scan_limit(limit);
    }

    let store = Arc::new(open_store(args.snapshot.as_deref())?);
    let engine = Arc::new(TableEngine::new(store.clone() as Arc<dyn KvStore>, config));
    let handler = CommandHandler::new(engine);

    if let Some(command) = &args.command {
        execute(&handler, command);
    } else {
        interactive_mode(&handler, &store, args.snapshot.as_deref())?;
    }

    if let Some(path) = &args.snapshot {
        save(&store, path)?;
    }
    Ok(())
}

fn open_store(snapshot: Option<&Path>) -> Result<MemoryStore> {
    match snapshot {
        Some(path) if path.exists() => MemoryStore::load_snapshot(path)
            .with_context(|| format!("loading snapshot {}", path.display())),
        _ => Ok(MemoryStore::new()),
    }
}

fn save(store: &MemoryStore, path: &Path) -> Result<()> {
    store
        .save_snapshot(path)
        .with_context(|| format!("saving snapshot {}", path.display()))
}

fn execute(handler: &CommandHandler, line: &str) {
    match handler.execute_line(line) {
        Ok(reply) => println!("{}", reply),
        Err(e) => println!("(error) ERR {}", e),
    }
}

fn interactive_mode(
    handler: &CommandHandler,
    store: &MemoryStore,
    snapshot: Option<&Path>,
) -> Result<()> {
    println!("kvtable v{}", kvtable::VERSION);
    println!("Type '.help' for help, '.exit' to quit\n");

    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("kvtable> ");
        io::stdout().flush()?;

        buffer.clear();
        if stdin.lock().read_line(&mut buffer)? == 0 {
            break;
        }

        let input = buffer.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('.') {
            match input {
                ".exit" | ".quit" => break,
                ".help" => print_interactive_help(),
                ".save" => match snapshot {
                    Some(path) => {
                        if let Err(e) = save(store, path) {
                            eprintln!("{e:#}");
                        }
                    }
                    None => warn!("no --snapshot file given, nothing saved"),
                },
                _ => {
                    eprintln!("Unknown command: {}", input);
                    println!("Type '.help' for available commands");
                }
            }
            continue;
        }

        execute(handler, input);
    }

    Ok(())
}

fn print_interactive_help() {
    println!(
        r#"
Shell commands:
  .help     Show this help
  .save     Write the snapshot file (requires --snapshot)
  .exit     Quit (the snapshot is also written on exit)

Table commands (the TABLE. prefix is optional; use double quotes for values with spaces):
"#
    );
    for line in kvtable::command::HELP_LINES {
        println!("  {}", line);
    }
    println!();
}
