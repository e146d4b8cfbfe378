//! lructl - drive an LRU cache by hand or from a replay script

mod handler;
mod script;

use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lrucache::LruCache;
use tracing::{debug, info, warn};

use crate::handler::{CommandHandler, Reply};
use crate::script::Script;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an operation script and print one JSON result per step
    Replay {
        /// Script file, or '-' for stdin
        script: PathBuf,

        /// Print this integer instead of null when a get misses
        #[arg(long, allow_negative_numbers = true)]
        missing: Option<i64>,
    },

    /// Read commands line by line (PUT k v, GET k, PEEK k, DEL k.., KEYS, STATS, QUIT)
    Repl {
        /// Cache capacity (number of items)
        #[arg(short, long, default_value_t = 16)]
        capacity: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match args.command {
        Command::Replay { script, missing } => replay(&script, missing),
        Command::Repl { capacity } => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            repl(capacity, stdin.lock(), stdout.lock())
        }
    }
}

fn replay(path: &Path, missing: Option<i64>) -> Result<()> {
    let input = load_script(path)?;
    let script = Script::parse(&input)
        .with_context(|| format!("Failed to parse script {}", path.display()))?;
    debug!(steps = script.steps(), "parsed script");

    let output = script
        .run(missing)
        .with_context(|| format!("Failed to run script {}", path.display()))?;

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn load_script(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read script from stdin")?;
        return Ok(input);
    }

    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn repl<R: BufRead, W: Write>(capacity: usize, input: R, mut output: W) -> Result<()> {
    let cache = LruCache::new(capacity).context("Failed to create cache")?;
    let mut handler = CommandHandler::new(cache);
    info!("Cache capacity: {}", capacity);

    for line in input.lines() {
        let line = line.context("Failed to read command")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let reply = handler.handle(line);
        if let Reply::Error(msg) = &reply {
            warn!("Command failed: {}", msg);
        }
        writeln!(output, "{}", reply)?;
        output.flush()?;
    }

    Ok(())
}
