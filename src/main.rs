//! Shakeball CLI
//!
//! Usage:
//!   shakeball                                # Interactive mode (tap / shake / hold)
//!   shakeball --replay session.jsonl         # Replay recorded sensor input
//!   shakeball --serve                        # HTTP API server
//!   shakeball --replay s.jsonl --json        # JSON output

use clap::Parser;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use shakeball::core::{
    run_server, AnswerSelector, OracleHandle, OracleRuntime, Script, VolumeSource,
};
use shakeball::types::{AnswerMode, OracleConfig, OracleStatus, RawVolumeEvent, VolumeDirection};
use shakeball::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "shakeball",
    version = VERSION,
    about = "Shakeball - ask a question, shake for an answer",
    long_about = "Shakeball turns noisy input into a single reveal.\n\n\
                  Triggers:\n  \
                  shake        3 consecutive accelerometer deltas > 3.0\n  \
                  volume hold  volume-down held for 500ms (Yes/No answer)\n  \
                  tap          manual request\n\n\
                  Only one reveal runs at a time; triggers during a reveal are dropped."
)]
struct Args {
    /// Replay a JSON-lines input script
    #[arg(short, long)]
    replay: Option<String>,

    /// Interactive mode - read commands from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// JSON config file overriding thresholds
    #[arg(short, long)]
    config: Option<String>,

    /// Seed for deterministic answers
    #[arg(long)]
    seed: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match &args.config {
        Some(path) => match OracleConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Config error: {}", e);
                std::process::exit(1);
            }
        },
        None => OracleConfig::default(),
    };

    if args.serve {
        run_serve(&args, config).await;
    } else if let Some(ref path) = args.replay {
        run_replay(path, &args, config).await;
    } else if args.interactive {
        run_interactive(&args, config).await;
    } else {
        // Default to interactive if no mode specified
        run_interactive(&args, config).await;
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "shakeball=debug" } else { "shakeball=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// How status lines are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Parseable,
    Terminal,
}

impl OutputFormat {
    fn from_args(args: &Args) -> Self {
        if args.json {
            OutputFormat::Json
        } else if args.no_color {
            OutputFormat::Parseable
        } else {
            OutputFormat::Terminal
        }
    }
}

fn selector(args: &Args) -> AnswerSelector {
    match args.seed {
        Some(seed) => AnswerSelector::seeded(seed),
        None => AnswerSelector::from_entropy(),
    }
}

/// Replay a recorded session through the full event loop
async fn run_replay(path: &str, args: &Args, config: OracleConfig) {
    let script = match Script::load(path) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Replay error: {}", e);
            std::process::exit(1);
        }
    };

    let interval = config.shake.sample_interval();
    let settle = config.reveal.binary_display();
    let volume = script
        .volume_source()
        .map(|source| Box::new(source) as Box<dyn VolumeSource>);

    let runtime = OracleRuntime::builder(config)
        .selector(selector(args))
        .motion_source(script.motion_source())
        .volume_source(volume)
        .spawn();
    let handle = runtime.handle();

    let printer = spawn_printer(&handle, OutputFormat::from_args(args));

    for at in script.taps.iter().copied() {
        let tap_handle = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(at).await;
            let _ = tap_handle.tap();
        });
    }

    // Let every scripted input land, then let any reveal and mode reset finish
    tokio::time::sleep(script.duration(interval)).await;
    let _ = handle.wait_until_idle().await;
    tokio::time::sleep(settle).await;
    let _ = handle.wait_until_idle().await;

    let last = runtime.shutdown().await;
    printer.abort();
    if !args.json {
        println!();
        println!("Replay finished. Reveals: {}", last.reveal_count);
    }
}

/// Run interactive mode
async fn run_interactive(args: &Args, config: OracleConfig) {
    let runtime = OracleRuntime::builder(config).selector(selector(args)).spawn();
    let handle = runtime.handle();

    print_header("Interactive Mode", args.no_color);
    println!("Commands: tap | shake | hold | release | status | quit");
    println!("Ask your question, then shake (or tap).");
    println!();
    let format = OutputFormat::from_args(args);
    print_status(&handle.status(), format);

    let printer = spawn_printer(&handle, format);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };
        let command = line.trim().to_ascii_lowercase();
        let result = match command.as_str() {
            "" => Ok(()),
            "quit" | "exit" => break,
            "tap" => handle.tap(),
            "shake" => {
                spawn_shake(handle.clone());
                Ok(())
            }
            "hold" => {
                let press = RawVolumeEvent::new(0.4, Some(VolumeDirection::Down));
                handle
                    .push_volume(RawVolumeEvent::new(0.5, None))
                    .and_then(|_| handle.push_volume(press))
            }
            "release" => handle.push_volume(RawVolumeEvent::new(0.5, Some(VolumeDirection::Up))),
            "status" => {
                print_status(&handle.status(), format);
                Ok(())
            }
            other => {
                println!("Unknown command '{}'", other);
                Ok(())
            }
        };
        if let Err(e) = result {
            eprintln!("Error: {}", e);
            break;
        }
    }

    let last = runtime.shutdown().await;
    printer.abort();
    println!("\nSession ended. Reveals: {}", last.reveal_count);
}

/// Synthetic shake: alternating magnitudes 50ms apart
fn spawn_shake(handle: OracleHandle) {
    tokio::spawn(async move {
        for i in 0..6 {
            let z = if i % 2 == 0 { 9.8 } else { 14.0 };
            if handle.push_sample(0.0, 0.0, z).is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    });
}

/// Print every status change until the loop closes
fn spawn_printer(handle: &OracleHandle, format: OutputFormat) -> tokio::task::JoinHandle<()> {
    let mut rx = handle.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(status) => print_status(&status, format),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn print_status(status: &OracleStatus, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(status).unwrap_or_default());
        }
        OutputFormat::Parseable => println!("{}", status.to_parseable_string()),
        OutputFormat::Terminal => {
            println!("{}", status.to_terminal_string());
            if !status.is_revealing && status.mode == AnswerMode::Binary {
                println!("  (yes/no mode)");
            }
        }
    }
}

/// Print header
fn print_header(mode: &str, no_color: bool) {
    if no_color {
        println!("========================================");
        println!("  Shakeball v{} - {}", VERSION, mode);
        println!("========================================");
    } else {
        println!("\x1b[1m╔════════════════════════════════════════╗\x1b[0m");
        println!("\x1b[1m║  🔮 Shakeball v{} - {}\x1b[0m", VERSION, mode);
        println!("\x1b[1m╚════════════════════════════════════════╝\x1b[0m");
    }
    println!();
}

/// Run HTTP API server
async fn run_serve(args: &Args, config: OracleConfig) {
    let runtime = OracleRuntime::builder(config).selector(selector(args)).spawn();

    if let Err(e) = run_server(&args.addr, runtime.handle()).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
    runtime.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_color_prints_parseable_status() {
        let args = Args::parse_from(["shakeball", "--no-color"]);
        assert_eq!(OutputFormat::from_args(&args), OutputFormat::Parseable);

        let args = Args::parse_from(["shakeball", "--no-color", "--json"]);
        assert_eq!(OutputFormat::from_args(&args), OutputFormat::Json);

        let args = Args::parse_from(["shakeball"]);
        assert_eq!(OutputFormat::from_args(&args), OutputFormat::Terminal);
    }
}
