//! Focus Agent Daemon and CLI

use clap::{Parser, Subcommand};
use focus_agent::daemon::Agent;
use focus_core::FocusConfig;
use focus_core::config::ConfigError;
use focus_core::host::format_remaining;

#[derive(Parser)]
#[command(name = "focus-agent")]
#[command(about = "Block distracting apps for a while", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the foreground and enforce the running session
    Run,

    /// Start a focus session
    Start {
        /// Session length in minutes
        #[arg(short, long, conflicts_with = "seconds")]
        minutes: Option<i64>,

        /// Session length in seconds
        #[arg(short, long)]
        seconds: Option<i64>,

        /// Bundle IDs to block; the saved selection when omitted
        apps: Vec<String>,
    },

    /// Stop the running session
    Stop,

    /// Show whether a session is running
    Status,

    /// Save the apps to block by default, or show them
    Select {
        apps: Vec<String>,
    },

    /// Show blocked-attempt statistics
    Stats {
        /// How many apps to list
        #[arg(long, default_value_t = 5)]
        limit: usize,

        /// Forget all statistics
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match FocusConfig::load() {
        Ok(c) => c,
        Err(ConfigError::NotFound(_)) => FocusConfig::default(),
        Err(e) => {
            tracing::warn!("Failed to load config: {}. Using defaults.", e);
            FocusConfig::default()
        }
    };
    let agent = Agent::new(config);

    match cli.command {
        Commands::Run => agent.run().await?,
        Commands::Start {
            minutes,
            seconds,
            apps,
        } => cmd_start(&agent, minutes, seconds, apps)?,
        Commands::Stop => {
            agent.controller().stop_blocking();
            println!("Focus session stopped.");
        }
        Commands::Status => cmd_status(&agent),
        Commands::Select { apps } => cmd_select(&agent, apps)?,
        Commands::Stats { limit, reset } => cmd_stats(&agent, limit, reset),
    }

    Ok(())
}

fn cmd_start(
    agent: &Agent,
    minutes: Option<i64>,
    seconds: Option<i64>,
    apps: Vec<String>,
) -> color_eyre::eyre::Result<()> {
    let duration = seconds
        .or_else(|| minutes.map(|m| m.saturating_mul(60)))
        .unwrap_or(i64::from(agent.config().default_minutes) * 60);

    let controller = agent.controller();
    let session = if apps.is_empty() {
        controller.start_with_selection(duration)?
    } else {
        controller.start_blocking(duration, apps)?
    };

    println!(
        "Blocking {} app(s) for {}.",
        session.blocked.len(),
        format_remaining(controller.remaining_time())
    );
    for app in &session.blocked {
        println!("  - {}", app);
    }
    Ok(())
}

fn cmd_status(agent: &Agent) {
    let controller = agent.controller();

    match controller.session() {
        Some(session) => {
            println!("Blocking:  ACTIVE");
            println!("Time left: {}", format_remaining(controller.remaining_time()));
            println!("Blocked apps: {}", session.blocked.len());
            for app in &session.blocked {
                println!("  - {}", app);
            }
        }
        None => println!("Blocking:  INACTIVE"),
    }
}

fn cmd_select(agent: &Agent, apps: Vec<String>) -> color_eyre::eyre::Result<()> {
    let controller = agent.controller();

    if !apps.is_empty() {
        controller.save_selected_apps(apps)?;
    }

    let selection = controller.selected_apps()?;
    if selection.is_empty() {
        println!("No apps selected.");
    } else {
        println!("Selected apps:");
        for app in &selection {
            println!("  - {}", app);
        }
    }
    Ok(())
}

fn cmd_stats(agent: &Agent, limit: usize, reset: bool) {
    if reset {
        agent.stats.reset();
        println!("Statistics reset.");
        return;
    }

    let stats = agent.stats.snapshot();
    let now = agent.sessions.now();

    println!("This week: {}", stats.week_blocks(now));
    println!("All time:  {}", stats.total_blocks);
    if let Some(last) = stats.last_blocked {
        println!(
            "Last:      {}",
            last.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
        );
    }

    let top = stats.most_blocked(now, limit);
    if !top.is_empty() {
        println!("\nMost blocked this week:");
        for (app, count) in top {
            println!("  {:>4}  {}", count, app);
        }
    }
}
