//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use roster_core::{BatchSummary, EnrichmentProgress, build_orchestrator};
use roster_extract::TextFieldExtractor;
use roster_shared::{AppConfig, EnrichConfig, EntityRecord, init_config, load_config};
use roster_storage::{
    CheckpointStore, FileCheckpointStore, JsonRosterSource, RosterSource, write_roster,
};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Cardinal roster: enrich a roster of cardinals from secondary web sources.
#[derive(Parser)]
#[command(
    name = "roster",
    version,
    about = "Enrich a cardinal roster with encyclopedia, news and web search data.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich every entity in a seed roster.
    Enrich {
        /// JSON array of seed entities.
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for checkpoints and the enriched roster
        /// (defaults to `defaults.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Continue from the latest checkpoint in the output directory.
        #[arg(long)]
        resume: bool,

        /// Write a checkpoint after this many entities.
        #[arg(long)]
        checkpoint_every: Option<usize>,

        /// Minimum milliseconds between entities.
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Print the search variants derived from a raw name.
    Normalize {
        /// Raw roster name, e.g. "Card. LUIS ANTONIO G. TAGLE, S.I.".
        name: String,
    },

    /// Run the biography rules over a text file and print the result as JSON.
    ExtractBio {
        /// Plain-text biography.
        file: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "roster=info",
        1 => "roster=debug",
        _ => "roster=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Enrich {
            input,
            out,
            resume,
            checkpoint_every,
            delay_ms,
        } => cmd_enrich(&input, out.as_deref(), resume, checkpoint_every, delay_ms).await,
        Command::Normalize { name } => cmd_normalize(&name),
        Command::ExtractBio { file } => cmd_extract_bio(&file),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_enrich(
    input: &Path,
    out: Option<&Path>,
    resume: bool,
    checkpoint_every: Option<usize>,
    delay_ms: Option<u64>,
) -> Result<()> {
    let config = load_config()?;
    let enrich = enrich_config(&config, checkpoint_every, delay_ms);
    let out_dir = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));

    let seeds = JsonRosterSource::new(input).seeds()?;
    if seeds.is_empty() {
        return Err(eyre!("roster {} contains no entities", input.display()));
    }

    let checkpoints = Arc::new(FileCheckpointStore::new(&out_dir));
    let resume_from = if resume {
        let latest = checkpoints.read_latest()?;
        if latest.is_none() {
            warn!(dir = %out_dir.display(), "no checkpoint to resume from, starting fresh");
        }
        latest
    } else {
        None
    };

    info!(
        input = %input.display(),
        out = %out_dir.display(),
        entities = seeds.len(),
        resume = resume_from.is_some(),
        "enriching roster"
    );

    let orchestrator = build_orchestrator(&config, &enrich, checkpoints)?;
    let reporter = CliProgress::new(seeds.len());
    let batch = orchestrator.run(seeds, resume_from, &reporter).await?;
    let path = write_roster(&out_dir, batch.records())?;

    let summary = batch.summary;
    println!();
    println!("  Roster enriched.");
    println!("  Batch:    {}", batch.snapshot.batch_id);
    println!("  Enriched: {}", summary.enriched);
    println!("  Partial:  {}", summary.partial);
    println!("  Skipped:  {}", summary.skipped);
    println!("  Resumed:  {}", summary.resumed);
    println!("  Output:   {}", path.display());
    println!();

    Ok(())
}

/// Runtime config from file values, overridden by CLI flags.
fn enrich_config(
    config: &AppConfig,
    checkpoint_every: Option<usize>,
    delay_ms: Option<u64>,
) -> EnrichConfig {
    let mut enrich = EnrichConfig::from(config);
    if let Some(every) = checkpoint_every {
        enrich.checkpoint_every = every;
    }
    if let Some(ms) = delay_ms {
        enrich.politeness = Duration::from_millis(ms);
    }
    enrich
}

fn cmd_normalize(name: &str) -> Result<()> {
    let variants = roster_resolver::normalize(name);
    println!("full:        {}", variants.full);
    println!("simple:      {}", variants.simple);
    println!("distinctive: {}", variants.distinctive);
    Ok(())
}

fn cmd_extract_bio(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read {}: {e}", file.display()))?;
    let bio = TextFieldExtractor::new().extract(&text);
    println!("{}", serde_json::to_string_pretty(&bio)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Progress bar over the roster, one tick per entity.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl EnrichmentProgress for CliProgress {
    fn started(&self, _total: usize, resumed: usize) {
        self.bar.set_position(resumed as u64);
    }

    fn entity_started(&self, identity: &str, _position: usize, _total: usize) {
        self.bar.set_message(identity.to_string());
    }

    fn entity_finished(&self, _record: &EntityRecord) {
        self.bar.inc(1);
    }

    fn checkpoint_written(&self, records: usize) {
        self.bar.println(format!("  checkpoint: {records} records"));
    }

    fn finished(&self, _summary: &BatchSummary) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrich_flags_parse() {
        let cli = Cli::try_parse_from([
            "roster",
            "enrich",
            "--input",
            "seeds.json",
            "--resume",
            "--checkpoint-every",
            "5",
            "--delay-ms",
            "0",
        ])
        .unwrap();

        match cli.command {
            Command::Enrich {
                input,
                resume,
                checkpoint_every,
                delay_ms,
                out,
            } => {
                assert_eq!(input, PathBuf::from("seeds.json"));
                assert!(resume);
                assert_eq!(checkpoint_every, Some(5));
                assert_eq!(delay_ms, Some(0));
                assert!(out.is_none());
            }
            _ => panic!("expected enrich"),
        }
    }

    #[test]
    fn verbosity_and_log_format_are_global() {
        let cli = Cli::try_parse_from(["roster", "normalize", "Card. TAGLE", "-vv", "--log-format", "json"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
    }

    #[test]
    fn flags_override_config() {
        let config = AppConfig::default();
        let enrich = enrich_config(&config, Some(3), Some(0));
        assert_eq!(enrich.checkpoint_every, 3);
        assert!(enrich.politeness.is_zero());

        let enrich = enrich_config(&config, None, None);
        assert_eq!(enrich.checkpoint_every, 10);
        assert_eq!(enrich.politeness, Duration::from_millis(2000));
    }
}
