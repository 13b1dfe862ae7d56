//! rfidscan-tool: configure SpringCard Prox'N'Roll RFID scanners.
//!
//! Lists attached scanners, drives their LEDs and buzzer, and reads or
//! writes their configuration registers.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{ArgAction, Parser};

mod cli;

/// Set by `--quiet` (and `--json`) to silence informational output.
pub static QUIET: AtomicBool = AtomicBool::new(false);

#[derive(Parser)]
#[command(
    name = "rfidscan-tool",
    version,
    about = "Configure SpringCard Prox'N'Roll USB RFID scanners"
)]
struct Args {
    /// Output as JSON (for list, version, read, dump, config)
    #[arg(long, global = true)]
    json: bool,

    /// Scanners to work on: "all", or ids / serial numbers separated by
    /// commas or spaces (as shown by `list`)
    #[arg(short = 'i', long = "id", global = true, value_name = "IDS")]
    id: Option<String>,

    /// Password of a protected scanner (4 hex digits)
    #[arg(short = 'p', long, global = true)]
    password: Option<String>,

    /// Apply the new configuration once the command succeeded
    #[arg(short = 'r', long, global = true)]
    reset: bool,

    /// Use this config file instead of the default one
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print results and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    let args = Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match args.verbose {
        0 => {}
        1 => {
            logger.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            logger.filter_level(log::LevelFilter::Trace);
        }
    }
    logger.format_timestamp(None).format_target(false).init();

    QUIET.store(args.quiet || args.json, Ordering::Relaxed);

    let globals = cli::Globals {
        json: args.json,
        ids: args.id,
        password: args.password,
        reset: args.reset,
        config_path: args.config,
    };

    if let Err(e) = cli::run(args.command, &globals) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
