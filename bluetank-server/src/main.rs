use anyhow::{Context, Result};
use bluetank_server::sim::{SimulationConfig, SimulationReport, run_simulation};
use bluetank_server::{Aquarium, ChannelNotifier, ManualClock, MemoryStore, ServerConfig};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    Console,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "bluetank-server", version)]
#[command(about = "Headless Blue Tank simulation: scripted keepers against the real tick path")]
struct Args {
    /// JSON config file; defaults apply to missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the kingfisher streams (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated minutes to run
    #[arg(long, default_value_t = 120)]
    minutes: u32,

    /// Number of scripted owners, cycling through keeper styles
    #[arg(long, default_value_t = 3)]
    owners: usize,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(&args)?;

    if matches!(args.report, ReportFormat::Console) {
        announce_banner();
    }

    let start_time = Instant::now();
    let clock = ManualClock::new(Utc::now());
    let aquarium = Arc::new(Aquarium::new(
        MemoryStore::new(),
        ChannelNotifier::new(),
        Arc::new(clock.clone()),
        config,
    ));
    let sim = SimulationConfig {
        minutes: args.minutes,
        owners: args.owners,
    };
    let report = run_simulation(aquarium, &clock, sim)
        .await
        .context("simulation aborted")?;

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut output_target, &report)?;
            writeln!(&mut output_target)?;
        }
        ReportFormat::Console => {
            write_console_report(&mut output_target, &report)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

fn load_config(args: &Args) -> Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            ServerConfig::from_json(&raw)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => ServerConfig::default(),
    };
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }
    Ok(config)
}

fn announce_banner() {
    println!("{}", "🐟 Blue Tank Simulation".bright_cyan().bold());
    println!("{}", "=======================".cyan());
}

fn write_console_report(out: &mut dyn Write, report: &SimulationReport) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "Minutes simulated: {}", report.minutes)?;
    writeln!(out, "Seed: {}", report.seed)?;
    writeln!(
        out,
        "Tank ticks: {} processed, {} skipped, {} failed",
        report.ticks.processed,
        report.ticks.skipped,
        report.ticks.failed.to_string().red()
    )?;
    writeln!(out, "Stage advances: {}", report.ticks.stage_advances)?;
    writeln!(out)?;

    for owner in &report.owners {
        writeln!(
            out,
            "{} {} ({})",
            "🐠".bold(),
            owner.owner.as_str().bold(),
            owner.keeper
        )?;
        writeln!(
            out,
            "   Oxygen {:.1}  Cleanliness {:.1}",
            owner.oxygen_level, owner.cleanliness
        )?;
        writeln!(
            out,
            "   Fish alive {}  sold {}  lost {}",
            owner.fish_alive,
            owner.fish_sold.to_string().green(),
            owner.fish_lost.to_string().red()
        )?;
        writeln!(
            out,
            "   Kingfisher attacks {}  repelled {}",
            owner.attacks, owner.repelled
        )?;
        writeln!(out, "   Coins {}", owner.coins.to_string().yellow())?;
    }
    writeln!(out)?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
