// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! CLI tool for interacting with flat hash table files

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use hasharr::{Config, Entry, FlatHashTable};
use humansize::{format_size, BINARY};
use memmap2::MmapMut;
use rustyline::DefaultEditor;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    prelude::*,
    registry::Registry,
};

macro_rules! die {
    ($fmt:literal, $($arg:tt)*) => {{
        eprintln!($fmt, $($arg)*);
        std::process::exit(1);
    }};

    ($msg:literal) => {{
        eprintln!($msg);
        std::process::exit(1);
    }};
}

#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

pub fn init_tracing(quiet: bool, verbose: u8) -> (bool, LevelFilter) {
    let is_verbose = !quiet && verbose > 0;

    let level_filter = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    // Bridge log crate macros to tracing (the library logs through `log`)
    if tracing_log::LogTracer::init().is_err() {
        die!("INTERNAL ERROR: setting log tracer failed");
    }

    let registry = Registry::default();

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("HASHARR_LOG")
        .from_env_lossy();

    let env_filter = match "rustyline=warn".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let subscriber = registry.with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .compact(),
    );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        die!("INTERNAL ERROR: setting default tracing::subscriber failed");
    }

    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing_panic::panic_hook(info);
        prev_hook(info); // daisy-chain to old panic hook
    }));

    (is_verbose, level_filter)
}

fn parse_size_as_usize(s: &str) -> Result<usize, String> {
    let cfg = parse_size::Config::new().with_binary();
    cfg.parse_size(s)
        .map_err(|e| e.to_string())
        .and_then(|size| usize::try_from(size).map_err(|e| e.to_string()))
}

/// CLI tool for interacting with flat hash table files
#[derive(Parser, Debug)]
#[command(name = "hasharr")]
#[command(about = "CLI tool for interacting with flat hash table files")]
struct ToolArgs {
    /// Suppress all output except for errors. This overrides the -v flag.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Turn on verbose output. Supply -v multiple times to increase verbosity.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the table file (will be created if it doesn't exist)
    table_path: PathBuf,

    /// Number of slots of a new table file
    #[arg(short = 'n', long, value_name = "SLOTS", conflicts_with = "size")]
    slots: Option<usize>,

    /// Size of a new table file (e.g., "64KiB", "4096")
    #[arg(short, long, value_parser = parse_size_as_usize, value_name = "SIZE")]
    size: Option<usize>,

    /// Command to run (if omitted, starts interactive shell)
    #[command(subcommand)]
    command: Option<ToolCommand>,
}

#[derive(Subcommand, Debug, Clone)]
enum ToolCommand {
    /// Get the value for a key
    Get {
        /// The key to look up
        key: String,
    },
    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,
        /// The value to store
        value: String,
    },
    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },
    /// List all keys, optionally filtered by prefix
    #[command(visible_alias = "list", visible_alias = "ls")]
    Scan {
        /// Optional prefix to filter keys
        prefix: Option<String>,
    },
    /// Count the number of items
    Count,
    /// Show table statistics
    Info,
    /// Print every entry
    Dump,
    /// Print every non-empty slot
    Slots,
    /// Check the slot structure for consistency
    Verify,
    /// Remove all entries
    Clear,
}

// Internal shell commands, include all external tool commands
#[derive(Parser, Debug)]
#[command(name = "")]
#[command(no_binary_name = true)]
#[command(disable_version_flag = true)]
#[command(help_template = "
{version}

Available Commands:

{subcommands}

Use `help COMMAND` or `COMMAND --help` for more details.

")]
struct ShellArgs {
    #[command(subcommand)]
    command: ShellCommand,
}

// Shell commands (including ones not available from CLI)
#[derive(Subcommand, Debug, Clone)]
enum ShellCommand {
    #[command(flatten)]
    ToolCmd(ToolCommand),

    /// Exit the current shell
    #[command(visible_alias = "quit")]
    Exit,
}

struct Session {
    table: FlatHashTable<MmapMut>,
    path: PathBuf,
}

impl Session {
    fn open(path: PathBuf, config: &Config) -> hasharr::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let is_new = file.metadata()?.len() == 0;

        let table = if is_new {
            // NOTE: An empty file is treated as new on the next run,
            // so nothing may be left behind if creation fails
            let size = config.memory_size()?;

            info!("creating table with {} slots in {}", config.slot_count(), path.display());
            file.set_len(size as u64)?;

            match map_file(&file)
                .map_err(hasharr::Error::from)
                .and_then(FlatHashTable::create)
            {
                Ok(table) => {
                    table.get_ref().flush()?;
                    table
                }
                Err(e) => {
                    file.set_len(0)?;
                    return Err(e);
                }
            }
        } else {
            let mmap = map_file(&file)?;
            debug!("opening table {}", path.display());
            FlatHashTable::open(mmap)?
        };

        Ok(Self { table, path })
    }

    fn flush(&self) -> io::Result<()> {
        self.table.get_ref().flush()
    }
}

fn map_file(file: &File) -> io::Result<MmapMut> {
    // SAFETY: The table validates every index it reads from the block,
    // concurrent writers must be coordinated by the caller
    #[allow(unsafe_code)]
    unsafe {
        MmapMut::map_mut(file)
    }
}

fn display_value(value: &[u8]) -> String {
    let value = value.strip_suffix(&[0]).unwrap_or(value);

    match std::str::from_utf8(value) {
        Ok(s) => s.to_string(),
        Err(_) => format!("{value:?}"),
    }
}

fn display_key(entry: &Entry) -> String {
    let key = String::from_utf8_lossy(&entry.key);

    if entry.is_truncated() {
        format!("{key}...({})", entry.key_len)
    } else {
        key.into_owned()
    }
}

fn matches_prefix(entry: &Entry, prefix: &[u8]) -> bool {
    entry.key.starts_with(prefix) || (entry.is_truncated() && prefix.starts_with(&entry.key))
}

fn print_info(session: &Session) {
    let size = session.table.size();

    println!("Path: {}", session.path.display());
    println!(
        "Block size: {}",
        format_size(session.table.as_bytes().len(), BINARY)
    );
    println!("Entries: {}", size.entries);
    println!("Slots: {}/{} used", size.used_slots, size.capacity);
    println!("Load factor: {:.2}", size.load_factor());
}

fn handle_get(session: &Session, key: &str) {
    match session.table.get(key) {
        Ok(value) => println!("{}", display_value(&value)),
        Err(hasharr::Error::NotFound) => println!("(not found)"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn handle_set(session: &mut Session, key: &str, value: &str) {
    if let Err(e) = session.table.put_str(key, value) {
        eprintln!("Error: {e}");
        return;
    }

    if let Err(e) = session.flush() {
        eprintln!("Error flushing: {e}");
        return;
    }
    println!("OK");
}

fn handle_del(session: &mut Session, key: &str) {
    match session.table.remove(key) {
        Ok(()) => {}
        Err(hasharr::Error::NotFound) => {
            println!("(not found)");
            return;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    }

    if let Err(e) = session.flush() {
        eprintln!("Error flushing: {e}");
        return;
    }
    println!("OK");
}

fn handle_scan(session: &Session, prefix: Option<&str>) {
    let mut count = 0;

    for item in &session.table {
        match item {
            Ok(entry) => {
                if let Some(p) = prefix {
                    if !matches_prefix(&entry, p.as_bytes()) {
                        continue;
                    }
                }

                println!("{} = {}", display_key(&entry), display_value(&entry.value));
                count += 1;
            }
            Err(e) => {
                eprintln!("Error reading item: {e}");
            }
        }
    }
    println!("({count} items)");
}

fn handle_count(session: &Session) {
    println!("{}", session.table.len());
}

fn handle_dump(session: &Session) {
    let mut stdout = io::stdout().lock();

    if let Err(e) = session.table.debug(&mut stdout) {
        eprintln!("Error: {e}");
    }
}

fn handle_slots(session: &Session) {
    let mut stdout = io::stdout().lock();

    if let Err(e) = session.table.debug_slots(&mut stdout) {
        eprintln!("Error: {e}");
    }
}

fn handle_verify(session: &Session) {
    match session.table.verify() {
        Ok(()) => println!("OK"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn handle_clear(session: &mut Session) {
    session.table.clear();

    match session.flush() {
        Ok(()) => println!("OK"),
        Err(e) => eprintln!("Error flushing: {e}"),
    }
}

/// Result of executing a command
enum CommandResult {
    Continue,
    Exit,
}

/// Execute a parsed command
fn execute_command(session: &mut Session, cmd: ToolCommand) -> CommandResult {
    match cmd {
        ToolCommand::Get { key } => handle_get(session, &key),
        ToolCommand::Set { key, value } => handle_set(session, &key, &value),
        ToolCommand::Del { key } => handle_del(session, &key),
        ToolCommand::Scan { prefix } => handle_scan(session, prefix.as_deref()),
        ToolCommand::Count => handle_count(session),
        ToolCommand::Info => print_info(session),
        ToolCommand::Dump => handle_dump(session),
        ToolCommand::Slots => handle_slots(session),
        ToolCommand::Verify => handle_verify(session),
        ToolCommand::Clear => handle_clear(session),
    }
    CommandResult::Continue
}

/// Parse and run a shell command line
fn run_shell_command(session: &mut Session, line: &str) -> CommandResult {
    let line = line.trim();
    if line.is_empty() {
        return CommandResult::Continue;
    }

    let tokens = match shlex::split(line) {
        Some(t) if !t.is_empty() => t,
        Some(_) => return CommandResult::Continue,
        None => {
            eprintln!("error: unclosed quote");
            return CommandResult::Continue;
        }
    };

    match ShellArgs::try_parse_from(&tokens) {
        Ok(args) => match args.command {
            ShellCommand::ToolCmd(cmd) => execute_command(session, cmd),
            ShellCommand::Exit => CommandResult::Exit,
        },
        Err(e) => {
            // Print clap's error message
            eprintln!("{e}");
            CommandResult::Continue
        }
    }
}

fn run_shell(session: &mut Session) {
    if io::stdin().is_terminal() {
        run_shell_interactive(session);
    } else {
        run_shell_non_interactive(session);
    }
}

fn run_shell_interactive(session: &mut Session) {
    println!("Welcome to the hasharr shell");
    println!("Type 'help' for available commands, 'exit' to quit.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Error initializing line editor: {e}");
            return;
        }
    };

    loop {
        match rl.readline("hasharr> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                if let CommandResult::Exit = run_shell_command(session, &line) {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                // Ignore Ctrl+C, just show a new prompt
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        }
    }
}

fn run_shell_non_interactive(session: &mut Session) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if stdout.flush().is_err() {
            die!("can't flush stdout");
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                // EOF
                break;
            }
            Ok(_) => {
                if let CommandResult::Exit = run_shell_command(session, &line) {
                    break;
                }
            }
            Err(e) => {
                die!("Error reading input: {}", e);
            }
        }
    }
}

fn table_config(slots: Option<usize>, size: Option<usize>) -> Config {
    match (slots, size) {
        (Some(slots), _) => Config::new(slots),
        (None, Some(size)) => Config::from_memory_size(size),
        (None, None) => Config::default(),
    }
}

fn main() {
    let args = ToolArgs::parse();
    let (verbose, level_filter) = init_tracing(args.quiet, args.verbose);

    let cmd = ToolArgs::command();

    info!(
        "starting {} ({} {}), log level: {level_filter}",
        cmd.get_name(),
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = table_config(args.slots, args.size);

    let mut session = match Session::open(args.table_path, &config) {
        Ok(s) => s,
        Err(e) => {
            let note = if verbose {
                ""
            } else {
                ". Note: Use -v (one or multiple times) for more information"
            };
            die!("Error opening table: {}{}", e, note);
        }
    };

    match args.command {
        Some(cmd) => {
            execute_command(&mut session, cmd);
        }
        None => run_shell(&mut session),
    }
}
