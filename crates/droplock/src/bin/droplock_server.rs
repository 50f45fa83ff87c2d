//! # DROPLOCK Server
//!
//! Headless map-server harness. Loads the databases, brings the drop-lock
//! plugin online and reads @commands from stdin.
//!
//! ```bash
//! ./droplock_server --config data/droplock.toml
//! > @reloadlockeddrops
//! Locked Drops have been reloaded (4 entries).
//! > @shutdown
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use droplock::{
    Databases, DropLock, DropLockConfig, EventBus, EventSender, HostEvent, MapServer,
    ServerResult,
};
use droplock_rules::FileRuleSource;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// DROPLOCK server CLI
#[derive(Parser)]
#[command(name = "droplock_server")]
#[command(about = "Map-server harness for item drop locks", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "DROPLOCK_CONFIG", default_value = "data/droplock.toml")]
    config: PathBuf,

    /// Log level (overrides the config file)
    #[arg(long, env = "DROPLOCK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "DROPLOCK_LOG_JSON")]
    json: bool,
}

/// Events in flight between stdin and the server loop.
const EVENT_CAPACITY: usize = 64;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match DropLockConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("droplock_server: {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = cli
        .log_level
        .unwrap_or_else(|| config.logging.level.clone());
    init_tracing(&level, cli.json || config.logging.json);

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("droplock_server: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn run(config: DropLockConfig) -> ServerResult<()> {
    info!(
        "Loading databases from {} and {}",
        config.database.item_db.display(),
        config.database.mob_db.display()
    );
    let dbs = Databases::load(&config.database)?;
    info!("{} items, {} monsters", dbs.items.len(), dbs.mobs.len());

    let mut server = MapServer::new(dbs).with_paths(config.database.clone());
    let rules = FileRuleSource::new(config.rules.path);
    server.register(Box::new(DropLock::new(rules)))?;

    let bus = EventBus::new(EVENT_CAPACITY);
    let events = bus.receiver();
    let sender = bus.sender();
    sender.send_blocking(HostEvent::ServerOnline);
    spawn_console(sender);
    // Only the console thread holds a sender now.
    drop(bus);

    while let Some(event) = events.recv() {
        let stopping = event == HostEvent::Shutdown;
        if let Some(reply) = server.handle(event) {
            println!("{reply}");
        }
        if stopping {
            break;
        }
    }
    Ok(())
}

/// Reads operator lines until `@shutdown` or end of input.
fn spawn_console(sender: EventSender) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("@shutdown") {
                break;
            }
            let event = HostEvent::Command {
                requester: "console".to_string(),
                line,
            };
            if !sender.send_blocking(event) {
                return;
            }
        }
        sender.send_blocking(HostEvent::Shutdown);
    });
}
