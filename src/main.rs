use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use lander_gnc::dynamics::TargetSite;
use lander_gnc::gnc::{ActionTriple, ConstantPolicy, DescentAutopilot, Policy, RewardShaper, ThrusterLayout};
use lander_gnc::io::{read_trajectory_file, write_summary_file, write_tick_log_file, EpisodeSummary};
use lander_gnc::perception::{TelemetryChannel, TelemetryLink};
use lander_gnc::sim::{run_episode, EpisodeLog, FlightLoop, FlightStateMachine, Spawn, Spawner, TrajectoryReplay};
use lander_gnc::{GncConfig, Profile};

#[derive(Parser, Debug)]
#[command(name = "lander-gnc", version, about = "Lander descent guidance/control core")]
struct Cli {
    /// JSON config file; missing keys use the `--profile` preset.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Preset the config starts from.
    #[arg(long, value_enum, global = true, default_value_t = Profile::Precision)]
    profile: Profile,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the telemetry receiver and report hazard maps as they arrive.
    Listen {
        #[arg(long, default_value_t = 10)]
        seconds: u64,
        #[arg(long)]
        rx_port: Option<u16>,
        #[arg(long)]
        remote_host: Option<String>,
        #[arg(long)]
        remote_port: Option<u16>,
    },
    /// Feed a recorded trajectory through the tick pipeline.
    Replay {
        trajectory: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        target_x: f64,
        #[arg(long, allow_hyphen_values = true)]
        target_z: f64,
        #[arg(long, value_enum, default_value_t = PolicyKind::Autopilot)]
        policy: PolicyKind,
        /// Open the UDP telemetry channel during the replay.
        #[arg(long)]
        telemetry: bool,
        /// Per-tick CSV log.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Episode summary JSON.
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Sample randomized episode starts as JSON.
    Spawn {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyKind {
    Autopilot,
    Idle,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => GncConfig::load(path, cli.profile)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => GncConfig::preset(cli.profile),
    };
    config.apply_env_overrides();

    match cli.command {
        Command::Listen {
            seconds,
            rx_port,
            remote_host,
            remote_port,
        } => {
            if let Some(p) = rx_port {
                config.telemetry.rx_port = p;
            }
            if let Some(h) = remote_host {
                config.telemetry.remote_host = h;
            }
            if let Some(p) = remote_port {
                config.telemetry.remote_port = p;
            }
            listen(&config, Duration::from_secs(seconds))
        }
        Command::Replay {
            trajectory,
            target_x,
            target_z,
            policy,
            telemetry,
            log,
            summary,
        } => {
            let target = TargetSite::new(target_x, target_z);
            replay(&config, &trajectory, target, policy, telemetry, log, summary)
        }
        Command::Spawn { seed, count } => {
            let mut spawner = Spawner::new(config.spawn, seed);
            let spawns: Vec<Spawn> = (0..count).map(|_| spawner.sample()).collect();
            println!("{}", serde_json::to_string_pretty(&spawns)?);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// listen
// ---------------------------------------------------------------------------

fn listen(config: &GncConfig, duration: Duration) -> Result<()> {
    let mut channel = TelemetryChannel::open(&config.telemetry).context("failed to open telemetry channel")?;
    info!(
        local = %channel.local_addr()?,
        remote = %channel.remote(),
        seconds = duration.as_secs(),
        "listening for hazard maps"
    );

    let start = Instant::now();
    let mut last_sequence = 0;
    while start.elapsed() < duration {
        if let Some(snap) = channel.latest() {
            if snap.sequence != last_sequence {
                last_sequence = snap.sequence;
                let c = snap.hazard.centroid();
                info!(
                    sequence = snap.sequence,
                    safe_cells = snap.hazard.safe_cell_count(),
                    centroid_local = ?c.local,
                    centroid_global = ?c.global,
                    "hazard map"
                );
            }
        }
        thread::sleep(Duration::from_millis(50));
    }

    channel.shutdown();
    let stats = channel.stats();
    println!(
        "received {}  rejected {}  receive errors {}",
        stats.received, stats.rejected, stats.receive_errors
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// replay
// ---------------------------------------------------------------------------

fn replay(
    config: &GncConfig,
    trajectory: &Path,
    target: TargetSite,
    kind: PolicyKind,
    telemetry: bool,
    log_path: Option<PathBuf>,
    summary_path: Option<PathBuf>,
) -> Result<()> {
    let rows = read_trajectory_file(trajectory)
        .with_context(|| format!("failed to read {}", trajectory.display()))?;
    let mut provider = TrajectoryReplay::new(rows);
    let Some(first) = provider.first_state().cloned() else {
        bail!("{} has no data rows", trajectory.display());
    };
    let spawn = Spawn { state: first, target };

    let channel = if telemetry {
        Some(TelemetryChannel::open(&config.telemetry).context("failed to open telemetry channel")?)
    } else {
        None
    };

    let machine = FlightStateMachine::new(
        config.flight,
        RewardShaper::new(config.reward.clone()),
        config.hazard,
        target,
    );
    let mut flight = FlightLoop::new(machine, ThrusterLayout::default());
    if let Some(ch) = &channel {
        flight = flight.with_link(ch);
    }

    let mut policy: Box<dyn Policy> = match kind {
        PolicyKind::Autopilot => Box::new(DescentAutopilot::new(
            config.reward.descent,
            config.tick_seconds,
        )),
        PolicyKind::Idle => Box::new(ConstantPolicy(ActionTriple::default())),
    };

    let log = run_episode(&mut flight, &mut provider, policy.as_mut(), &spawn, config.max_ticks);
    let summary = EpisodeSummary::from_log(&log, channel.as_ref().map(|c| c.stats()));

    if let Some(path) = &log_path {
        write_tick_log_file(path, &log.records)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &summary_path {
        write_summary_file(path, &summary)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    print_report(&log, &summary, policy.name());
    Ok(())
}

fn print_report(log: &EpisodeLog, summary: &EpisodeSummary, policy: &str) {
    println!();
    println!("====================================================================");
    println!("  DESCENT REPLAY: {}", policy);
    println!("====================================================================");
    println!();
    println!(
        "  Outcome:       {:>18}    Ticks:        {:>8}",
        log.outcome.to_string(),
        summary.ticks
    );
    println!(
        "  Total reward:  {:>18.3}    Truncated:    {:>8}",
        summary.total_reward, summary.truncated
    );
    println!(
        "  Target:        {:>8.1}, {:>8.1}    Deviation:    {:>8}",
        summary.target.x,
        summary.target.z,
        summary
            .target_deviation
            .map(|d| format!("{d:.2}"))
            .unwrap_or_else(|| "-".into())
    );
    println!(
        "  Contacts:      {:>18}    Max closing:  {:>8.2}",
        summary.contacts, summary.max_closing_speed
    );
    println!(
        "  Telemetry:     {:>18}",
        if summary.telemetry_present { "present" } else { "absent" }
    );
    println!();
}
