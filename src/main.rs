// =============================================================================
// main.rs - Interface en ligne de commande
// main.rs - Command-line front-end
// =============================================================================

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use colorprobe::config::Settings;
use colorprobe::{
    palette, picker, BackendKind, CaptureOutcome, ColorModelSet, HistoryEntry, PixelSampler, Rgb,
    SamplerStatus, SamplingHandle, SamplingService, Snapshot, TimedSampler,
};

/// Pipette d'écran : lit la couleur sous le pointeur dans tous les modèles
/// Screen color probe: reads the color under the pointer in every model
#[derive(Parser, Debug)]
#[command(name = "colorprobe", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Settings file (defaults to <config dir>/colorprobe/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Force a sampling backend
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendKind>,

    /// Interval between samples, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    tick_ms: Option<u64>,

    /// Maximum duration of one sampler call, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Number of captured colors to keep
    #[arg(long, global = true, value_name = "N")]
    history_capacity: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the live reading and accept commands on stdin
    Watch {
        /// Load this palette into history at startup
        #[arg(long, value_name = "FILE")]
        load: Option<PathBuf>,

        /// Save history to this palette on exit
        #[arg(long, value_name = "FILE")]
        palette: Option<PathBuf>,
    },
    /// Print the color under the pointer once
    Sample {
        #[arg(long)]
        json: bool,
    },
    /// Convert a color given as #RRGGBB or as three channels R G B
    Convert {
        #[arg(required = true, num_args = 1..=3, allow_hyphen_values = true)]
        color: Vec<String>,

        #[arg(long)]
        json: bool,
    },
    /// Check that the platform can be sampled
    Doctor,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let settings = resolve_settings(&cli)?;
    match &cli.command {
        Commands::Watch { load, palette } => watch(&settings, load.as_deref(), palette.as_deref()),
        Commands::Sample { json } => sample(&settings, *json),
        Commands::Convert { color, json } => convert(color, *json),
        Commands::Doctor => doctor(&settings),
    }
}

// =============================================================================
// INITIALISATION
// STARTUP
// =============================================================================

/// Les logs vont sur stderr pour ne pas casser la ligne de lecture
/// Logs go to stderr so the reading line stays intact
fn init_logging(debug: bool) {
    let default_level = if debug { "colorprobe=debug" } else { "colorprobe=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(io::stderr),
        )
        .init();
}

/// Fichier de configuration, puis options de la ligne de commande
/// Settings file first, then command-line flags
fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::load().context("Failed to load settings")?,
    };

    if let Some(backend) = cli.backend {
        settings.backend = Some(backend);
    }
    if let Some(tick_ms) = cli.tick_ms {
        settings.tick_ms = tick_ms;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        settings.sampler_timeout_ms = timeout_ms;
    }
    if let Some(capacity) = cli.history_capacity {
        settings.history_capacity = capacity;
    }
    settings.validate().context("Invalid command-line option")?;
    Ok(settings)
}

fn open_sampler(settings: &Settings) -> Result<TimedSampler> {
    let kind = settings
        .backend_kind()
        .context("No sampling backend exists for this platform")?;
    let timeout = settings.sampler_timeout();
    let backend = picker::open(kind, timeout)
        .with_context(|| format!("Cannot open the {kind} backend (try `colorprobe doctor`)"))?;
    tracing::info!(backend = %kind, timeout_ms = settings.sampler_timeout_ms, "Backend selected");
    Ok(TimedSampler::spawn(backend, timeout))
}

// =============================================================================
// COMMANDES
// COMMANDS
// =============================================================================

const WATCH_HELP: &str =
    "Commands: f = freeze/unfreeze, c = capture, h = history, d N = delete entry N, x = clear history, q = quit";

fn watch(settings: &Settings, load: Option<&Path>, palette_path: Option<&Path>) -> Result<()> {
    let sampler = open_sampler(settings)?;
    let handle = SamplingService::spawn(sampler, settings.tick(), settings.history_capacity)
        .context("Failed to start sampling")?;

    if let Some(path) = load {
        let colors = palette::load(path)
            .with_context(|| format!("Failed to load palette {}", path.display()))?;
        handle.replace_history(colors)?;
    }

    let lines = spawn_stdin_reader();
    eprintln!("{WATCH_HELP}");

    let mut stdout = io::stdout();
    loop {
        print_status_line(&mut stdout, &handle.snapshot())?;

        let line = match lines.recv_timeout(settings.tick()) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            // stdin fermé : même effet que `q` / stdin closed: same as `q`
            Err(RecvTimeoutError::Disconnected) => break,
        };

        // Termine la ligne de lecture avant toute autre sortie
        // End the reading line before any other output
        writeln!(stdout)?;
        if !run_watch_command(&handle, line.trim())? {
            break;
        }
    }
    writeln!(stdout)?;

    if let Some(path) = palette_path {
        let history = handle.history()?;
        palette::save(path, &history)
            .with_context(|| format!("Failed to save palette {}", path.display()))?;
        println!("Saved {} colors to {}", history.len(), path.display());
    }
    handle.shutdown();
    Ok(())
}

/// Returns `false` when the user asked to quit.
fn run_watch_command(handle: &SamplingHandle, command: &str) -> Result<bool> {
    let mut words = command.split_whitespace();
    match (words.next(), words.next()) {
        (None, _) => {}
        (Some("q"), _) => return Ok(false),
        (Some("f"), _) => {
            let state = handle.toggle_freeze()?;
            println!("Sampling {state}");
        }
        (Some("c"), _) => match handle.capture()? {
            CaptureOutcome::Appended(entry) => println!("Captured {}", entry.colors.hex()),
            CaptureOutcome::Evicted { entry, evicted } => println!(
                "Captured {} (history full, dropped {})",
                entry.colors.hex(),
                evicted.colors.hex()
            ),
            CaptureOutcome::Duplicate(entry) => {
                println!("{} is already the last captured color", entry.colors.hex())
            }
        },
        (Some("h"), _) => print_history(&handle.history()?),
        (Some("x"), _) => {
            handle.clear_history()?;
            println!("History cleared");
        }
        (Some("d"), Some(number)) => match number.parse::<usize>() {
            // Numérotation affichée à partir de 1 / Displayed numbering starts at 1
            Ok(n) if n >= 1 => match handle.remove_history(n - 1)? {
                Some(entry) => println!("Deleted {}", entry.colors.hex()),
                None => println!("No history entry {n}"),
            },
            _ => println!("Usage: d N (N from the `h` listing)"),
        },
        _ => println!("{WATCH_HELP}"),
    }
    Ok(true)
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn sample(settings: &Settings, json: bool) -> Result<()> {
    let mut sampler = open_sampler(settings)?;
    let sample = sampler.sample().context("Sampling failed")?;
    let colors = ColorModelSet::from(sample.rgb);

    if json {
        let output = serde_json::json!({
            "position": sample.position,
            "hex": colors.hex(),
            "values": palette::PaletteEntry::from(&colors).values,
            "colors": colors,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} at {}", swatch(sample.rgb), sample.position);
        print_values(&colors);
    }
    Ok(())
}

fn convert(args: &[String], json: bool) -> Result<()> {
    let rgb = parse_color_args(args)?;
    let colors = ColorModelSet::from(rgb);
    if json {
        println!("{}", serde_json::to_string_pretty(&palette::PaletteEntry::from(&colors))?);
    } else {
        println!("{}", swatch(rgb));
        print_values(&colors);
    }
    Ok(())
}

fn doctor(settings: &Settings) -> Result<()> {
    let Some(kind) = settings.backend_kind() else {
        bail!("No sampling backend exists for this platform");
    };
    let problems = picker::missing_requirements(kind);
    if problems.is_empty() {
        println!("The {kind} backend is ready");
        return Ok(());
    }
    println!("The {kind} backend cannot sample yet:");
    for problem in &problems {
        println!("  - {problem}");
    }
    bail!("{} requirement(s) missing", problems.len())
}

/// `#RRGGBB` ou trois canaux / `#RRGGBB` or three channels
fn parse_color_args(args: &[String]) -> Result<Rgb> {
    match args {
        [hex] => Ok(hex.parse::<Rgb>()?),
        [r, g, b] => {
            let channel = |text: &String| {
                text.trim()
                    .parse::<i64>()
                    .with_context(|| format!("{text:?} is not an integer channel"))
            };
            Ok(Rgb::from_channels(channel(r)?, channel(g)?, channel(b)?)?)
        }
        _ => bail!("Expected #RRGGBB or three channels R G B"),
    }
}

// =============================================================================
// AFFICHAGE
// DISPLAY
// =============================================================================

/// Pastille colorée ANSI avec le code hex lisible dessus
/// ANSI color swatch with the hex code readable on it
fn swatch(rgb: Rgb) -> String {
    let (fr, fg, fb) = if rgb.prefers_dark_text() { (0, 0, 0) } else { (255, 255, 255) };
    format!(
        "\x1b[48;2;{};{};{}m\x1b[38;2;{fr};{fg};{fb}m {} \x1b[0m",
        rgb.r,
        rgb.g,
        rgb.b,
        rgb.to_hex()
    )
}

fn print_values(colors: &ColorModelSet) {
    for (label, text) in colors.labeled_values() {
        println!("  {label:<9} {text}");
    }
}

fn print_status_line(out: &mut impl Write, snapshot: &Snapshot) -> io::Result<()> {
    let reading = &snapshot.reading;
    let position = reading
        .position
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    let status = match &snapshot.status {
        SamplerStatus::Pending => "waiting".to_string(),
        SamplerStatus::Ok => "ok".to_string(),
        SamplerStatus::Failing { error, streak } => format!("{error} (x{streak})"),
    };
    let colors = &reading.colors;
    write!(
        out,
        "\r\x1b[2K{} {} {} {} | {} | {}",
        swatch(colors.rgb),
        colors.rgb,
        colors.hsl,
        position,
        snapshot.state,
        status
    )?;
    out.flush()
}

fn print_history(history: &[HistoryEntry]) {
    if history.is_empty() {
        println!("History is empty");
        return;
    }
    for (i, entry) in history.iter().enumerate() {
        println!("{:>3}. {} {} {}", i + 1, swatch(entry.rgb()), entry.colors.rgb, entry.colors.hsl);
    }
}
