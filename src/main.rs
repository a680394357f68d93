//! # Chordal - keyboard command engine
//!
//! Replays a keystroke script against a text buffer and prints the
//! result.
//!
//! ## Quick Start
//!
//! ```bash
//! # Type, pause, type, undo the second burst
//! echo 'h i @wait=3000 t h e r e cmd+z' | cargo run
//!
//! # Start from existing text and dump the history as JSON
//! cargo run -- script.keys --text "draft" --dump-history
//! ```
//!
//! A script is whitespace-separated tokens:
//! - a shortcut: `h`, `ctrl+z`, `backspace`, `enter`, `space`
//!   (a chord is two tokens: `ctrl+x u`)
//! - `@wait=<ms>`: advance the clock used for timestamps
//! - `text:<chars>`: insert the characters as one command
//!
//! Lines starting with `#` are comments.

use anyhow::Context;
use chordal_buffer::TextRange;
use chordal_core::{
    CommandReader, Config, Document, EditorEvent, EventHandler, HistoryRecords, InputHandle,
    Shortcut,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Chordal - replay keystrokes through chord tables and grouped undo
#[derive(Parser, Debug)]
#[command(name = "chordal")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Script file to replay (reads stdin if omitted or "-")
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Initial buffer contents; the cursor starts at its end
    #[arg(short, long, value_name = "TEXT", default_value = "")]
    text: String,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the undo/redo stacks as JSON after the buffer
    #[arg(long)]
    dump_history: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// One parsed script token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Key(Shortcut),
    Wait(Duration),
    Text(String),
}

/// Parses a keystroke script.
fn parse_script(script: &str) -> anyhow::Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (line_no, line) in script.lines().enumerate() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        for token in line.split_whitespace() {
            let step = if let Some(ms) = token.strip_prefix("@wait=") {
                let ms: u64 = ms
                    .parse()
                    .with_context(|| format!("line {}: bad wait {:?}", line_no + 1, token))?;
                Step::Wait(Duration::from_millis(ms))
            } else if let Some(text) = token.strip_prefix("text:") {
                Step::Text(text.to_string())
            } else {
                let shortcut = Shortcut::parse(token).with_context(|| {
                    format!("line {}: unknown key {:?}", line_no + 1, token)
                })?;
                Step::Key(shortcut)
            };
            steps.push(step);
        }
    }
    Ok(steps)
}

/// Queues one step, stamping keys with the script clock.
///
/// Returns false for steps that only move the clock.
fn feed(input: &InputHandle, step: &Step, clock: &mut Instant) -> anyhow::Result<bool> {
    match step {
        Step::Wait(delta) => {
            *clock += *delta;
            return Ok(false);
        }
        Step::Key(shortcut) => input.key_at(*shortcut, *clock)?,
        Step::Text(text) => input.insert(text.clone(), Some(*clock))?,
    }
    Ok(true)
}

/// Moves every queued beep into `beeps`.
fn collect_beeps(events: &mut EventHandler, beeps: &mut Vec<String>) {
    while let Some(event) = events.try_next() {
        if let EditorEvent::Beep { reason } = event {
            beeps.push(reason);
        }
    }
}

/// Result of replaying a script.
#[derive(Debug)]
struct Outcome {
    text: String,
    beeps: Vec<String>,
    history: HistoryRecords,
}

/// Replays `steps` against a fresh buffer holding `initial`.
///
/// Events are collected after every step so the bounded event bus
/// never overwrites a beep, however long the script.
async fn replay(config: &Config, initial: &str, steps: &[Step]) -> anyhow::Result<Outcome> {
    let (mut reader, input) = CommandReader::new(config)?;
    let mut events = EventHandler::new(reader.subscribe());

    let document = Document::from_text("script", initial);
    document
        .buffer()
        .borrow_mut()
        .set_selections(vec![TextRange::cursor(initial.chars().count())])?;
    reader.bind_document(document.clone())?;

    let mut beeps = Vec::new();
    let mut clock = Instant::now();
    for step in steps {
        if feed(&input, step, &mut clock)? {
            reader.process_pending();
            collect_beeps(&mut events, &mut beeps);
        }
    }
    drop(input);
    reader.run().await;
    collect_beeps(&mut events, &mut beeps);

    Ok(Outcome {
        text: document.text()?,
        beeps,
        history: reader.history().records(),
    })
}

fn read_script(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display())),
        _ => std::io::read_to_string(std::io::stdin()).context("reading script from stdin"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting chordal v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load(),
    };

    let script = read_script(args.script.as_ref())?;
    let steps = parse_script(&script)?;
    tracing::debug!(steps = steps.len(), "Script parsed");

    let outcome = replay(&config, &args.text, &steps).await?;

    for reason in &outcome.beeps {
        eprintln!("beep: {}", reason);
    }
    print!("{}", outcome.text);
    if !outcome.text.ends_with('\n') {
        println!();
    }
    if args.dump_history {
        println!("{}", serde_json::to_string_pretty(&outcome.history)?);
    }

    Ok(())
}
