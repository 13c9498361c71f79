//! `mediactl`: runs the pin trigger controller described by a configuration
//! file until interrupted.

use anyhow::Context;
use clap::Parser;
use mediactl_config::{ConfigStore, default_config_path};
use mediactl_core::constants::{CONFIG_PATH_ENV, DEFAULT_REMOTE_TIMEOUT_MS};
use mediactl_engine::{Controller, ControllerHandle, EngineTiming, TokioSpawner};
use mediactl_hardware::mock::MockGpio;
use mediactl_hardware::sysfs::SysfsGpio;
use mediactl_hardware::{AnyGpio, GpioDriver};
use mediactl_network::mock::MockProjector;
use mediactl_network::{AnyConnector, PjlinkConfig, PjlinkConnector};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "mediactl",
    about = "Pin trigger controller for media installations",
    version
)]
struct Cli {
    /// Configuration file, created when missing
    #[arg(long, short, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Use the in-memory GPIO backend instead of sysfs
    #[arg(long)]
    mock_gpio: bool,

    /// Record projector commands instead of sending them
    #[arg(long)]
    mock_remote: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write a timestamped copy of the applied configuration next to it
    #[arg(long)]
    snapshot: bool,

    /// Timeout of each projector operation in milliseconds
    #[arg(long, default_value_t = DEFAULT_REMOTE_TIMEOUT_MS)]
    remote_timeout_ms: u64,

    /// Input sensing interval in milliseconds
    #[arg(long)]
    sense_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let path = match cli.config.clone() {
        Some(path) => path,
        None => default_config_path().context("failed to locate configuration file")?,
    };
    let store = ConfigStore::open(&path)
        .with_context(|| format!("failed to open configuration {}", path.display()))?;
    let config = store
        .load()
        .with_context(|| format!("failed to load configuration {}", path.display()))?;

    let gpio = select_gpio(cli.mock_gpio).await?;
    let connector = select_connector(&cli);

    let mut timing = EngineTiming::default();
    if let Some(ms) = cli.sense_interval_ms {
        timing.sense_interval = Duration::from_millis(ms.max(1));
    }

    let controller = Controller::from_config(gpio, connector, &config)
        .await
        .context("failed to apply configuration")?
        .with_timing(timing);

    if cli.snapshot {
        let snapshot = store
            .save_snapshot(&controller.registry().to_config())
            .context("failed to write configuration snapshot")?;
        info!(path = %snapshot.display(), "Configuration snapshot written");
    }

    let mut handle = controller.start(TokioSpawner);
    run_until_interrupted(&mut handle).await;

    handle.shutdown().await;
    handle
        .release_hardware()
        .await
        .context("failed to release GPIO lines")?;
    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

async fn select_gpio(mock: bool) -> anyhow::Result<AnyGpio> {
    let gpio: AnyGpio = if mock {
        MockGpio::default().into()
    } else {
        SysfsGpio::new().into()
    };

    let info = gpio.get_info().await.context("GPIO backend unavailable")?;
    info!(backend = %info.name, model = %info.model, "GPIO backend selected");
    Ok(gpio)
}

fn select_connector(cli: &Cli) -> AnyConnector {
    if cli.mock_remote {
        return MockProjector::default().into();
    }

    PjlinkConnector::new(PjlinkConfig {
        timeout: Duration::from_millis(cli.remote_timeout_ms),
        ..PjlinkConfig::default()
    })
    .into()
}

async fn run_until_interrupted(handle: &mut ControllerHandle) {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, stopping");
                return;
            }
            event = handle.recv() => match event {
                Some(event) => debug!(pin = %event.pin(), ?event, "Pin event"),
                None => return,
            },
        }
    }
}
