// Main entry point - Dependency injection and CLI routing
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use gas_monitor::application::live_subscription::{LiveSubscription, ReconnectPolicy};
use gas_monitor::application::live_transport::TransportKind;
use gas_monitor::application::sensor_service::{LoadState, SensorService};
use gas_monitor::domain::live::{ConnectionState, LiveSnapshot};
use gas_monitor::infrastructure::config::{load_dashboard_config, DashboardConfig};
use gas_monitor::infrastructure::http_repository::HttpSensorRepository;
use gas_monitor::infrastructure::live_transport;
use gas_monitor::presentation::shell::{render_shell, Page, CLEAR_SCREEN};
use gas_monitor::presentation::views::{
    render_sensor_detail, render_sensor_history, render_sensor_list,
};

#[derive(Parser)]
#[command(name = "gas-monitor")]
#[command(about = "Terminal dashboard for gas sensor readings")]
#[command(version)]
struct Args {
    /// Path to configuration file (defaults to config/dashboard.* when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level, used when RUST_LOG is not set
    #[arg(short, long, default_value = "warn")]
    log_level: tracing::Level,

    /// Live update transport (overrides config file)
    #[arg(long, value_enum)]
    transport: Option<TransportKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all sensors
    List,
    /// Follow the live reading of one sensor until Ctrl-C
    Show { sensor_id: String },
    /// Show the recorded readings of one sensor
    History { sensor_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Initialize tracing on stderr so views keep stdout to themselves
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let mut config = load_dashboard_config(args.config.as_deref())?;
    if let Some(transport) = args.transport {
        config.live.transport = transport;
    }
    tracing::debug!("Using API at {}", config.api.base_url);

    // Create repository and service
    let repository = Arc::new(HttpSensorRepository::new(&config.api)?);
    let service = SensorService::new(repository);

    let loaded = match args.command {
        Command::List => {
            let state = service.load_sensor_list().await;
            print!("{}", render_shell(Page::SensorList, &render_sensor_list(&state)));
            state.is_ready()
        }
        Command::History { sensor_id } => {
            let state = service.load_sensor_history(&sensor_id).await;
            print!(
                "{}",
                render_shell(Page::SensorHistory, &render_sensor_history(&state, &sensor_id))
            );
            state.is_ready()
        }
        Command::Show { sensor_id } => follow_sensor(&service, &config, &sensor_id).await?,
    };

    Ok(if loaded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Detail view: one-shot sensor fetch plus a live subscription, re-rendered on
/// every update until Ctrl-C or until the subscription closes for good.
async fn follow_sensor(
    service: &SensorService,
    config: &DashboardConfig,
    sensor_id: &str,
) -> anyhow::Result<bool> {
    let policy = ReconnectPolicy::from(&config.live.reconnect);
    if policy.is_enabled() {
        tracing::debug!("Reconnecting up to {} times", policy.max_attempts);
    }

    let mut subscription = LiveSubscription::new(live_transport(config)?).with_reconnect(policy);
    subscription.subscribe(Some(sensor_id)).await;
    let mut updates = WatchStream::new(subscription.watch());

    let load = service.load_sensor_detail(sensor_id);
    tokio::pin!(load);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let threshold = config.live.alert_threshold;
    let mut sensor = LoadState::Pending;
    let mut live = LiveSnapshot::idle();

    loop {
        tokio::select! {
            state = &mut load, if matches!(sensor, LoadState::Pending) => sensor = state,
            snapshot = updates.next() => match snapshot {
                Some(snapshot) => live = snapshot,
                None => break,
            },
            _ = &mut ctrl_c => break,
        }

        print!(
            "{}{}",
            CLEAR_SCREEN,
            render_shell(Page::SensorDetail, &render_sensor_detail(&sensor, &live, threshold))
        );

        let settled = !matches!(sensor, LoadState::Pending);
        if matches!(sensor, LoadState::Failed(_))
            || (settled && live.state == ConnectionState::Closed)
        {
            break;
        }
    }

    subscription.dispose().await;
    Ok(sensor.is_ready())
}
