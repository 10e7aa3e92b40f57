use clap::Parser;
use lanesync::app::{tick_budget, Driver, LogSink, Session};
use lanesync::config::{self, EngineConfig};
use lanesync::game::autoplay::Autoplay;
use lanesync::game::chart::Chart;
use log::{error, info, warn, LevelFilter};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lanesync", about = "Play a lane chart headless with the autoplay bot and report the score")]
struct Args {
    /// Chart JSON (list of {position, appearance_time, speed}); the built-in pattern when omitted
    chart: Option<PathBuf>,

    /// Engine config INI
    #[arg(long, env = "LANESYNC_CONFIG", default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Autoplay RNG seed
    #[arg(long, default_value_t = config::AUTOPLAY_DEFAULT_SEED)]
    seed: u64,

    /// Autoplay timing jitter, in track units either side of the line
    #[arg(long, default_value_t = 0.0)]
    jitter: f64,

    /// Chance the bot skips a note, 0..=1
    #[arg(long = "skip", default_value_t = 0.0)]
    skip_rate: f64,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Write the default config to --config and use it
    #[arg(long)]
    write_config: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .filter_module("lanesync::game::gameplay", LevelFilter::Info)
        .filter_module("lanesync::app", LevelFilter::Info)
        .init();

    let args = Args::parse();

    let engine_config = if args.write_config {
        let defaults = EngineConfig::default();
        defaults.write(&args.config)?;
        defaults
    } else {
        EngineConfig::load_or_default(&args.config)
    };

    let chart = match &args.chart {
        Some(path) => match Chart::load_json(path) {
            Ok(chart) => chart,
            Err(e) => {
                error!("Failed to load chart '{}': {}", path.display(), e);
                return Err(e.into());
            }
        },
        None => {
            info!("No chart given, using the built-in metronome pattern.");
            Chart::builtin()
        }
    };
    if let Err(e) = chart.ensure_playable() {
        warn!("{}; nothing will spawn.", e);
    }

    let budget = tick_budget(&chart, &engine_config);
    let bot = Autoplay::new(args.seed, args.jitter, args.skip_rate);
    let mut session = Session::new(chart, engine_config, Driver::Autoplay(bot), LogSink::default());
    let summary = session.run(budget);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Score: {}  Max Combo: {}  Perfect: {}  Great: {}  Miss: {} ({} expired)  Accuracy: {:.2}%{}",
            summary.score.total_score,
            summary.score.max_combo,
            summary.score.perfects,
            summary.score.greats,
            summary.score.misses,
            summary.score.expired,
            summary.accuracy * 100.0,
            if summary.full_combo { "  FULL COMBO" } else { "" }
        );
    }

    info!("Session exited gracefully.");
    Ok(())
}
