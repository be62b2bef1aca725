use clap::{ArgAction, Parser, Subcommand};
use siglocate::app::{App, AppHandle, AppSettings, StatusKind, Submission};
use siglocate::config::{Config, Locale};
use siglocate::location::{GoogleGeolocation, LocationResolver, LocationSource};
use siglocate::logging;
use siglocate::sensors::iw::IwWifi;
use siglocate::sensors::snapshot::SensorSnapshot;
use siglocate::sensors::{DesktopPermissions, NoFusedProvider, NoModem, PermissionGate};
use siglocate::server;
use std::path::PathBuf;
use std::sync::Arc;

/// siglocate: approximate location from fused fixes, Wi-Fi or LTE cells
///
/// Examples:
///   siglocate wifi
///   siglocate --snapshot phone.json cell
///   siglocate --lang en --iface wlp3s0 wifi
///   siglocate serve --port 8080
#[derive(Parser)]
#[command(name = "siglocate", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.siglocate/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read sensors and permissions from a recorded JSON snapshot.
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Geolocation API key (overrides config and build-time key).
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Geolocate endpoint URL.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Status language: ja or en.
    #[arg(long, global = true)]
    lang: Option<Locale>,

    /// Wi-Fi interface queried with `iw`.
    #[arg(long, global = true)]
    iface: Option<String>,

    /// More diagnostics on stderr (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Last cached fused location (no network).
    Fused,
    /// Geolocate the associated Wi-Fi access point.
    Wifi,
    /// Geolocate the visible LTE cells.
    Cell,
    /// Serve the status page and JSON API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, short = 'p', default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = load_config(&cli);
    let (resolver, gate) = build_platform(&cli, &config);

    let settings = AppSettings {
        workers: config.workers,
        timeout: config.timeout(),
        locale: config.locale,
    };
    let (app, handle) = App::new(Arc::new(resolver), gate, settings);
    let app_task = tokio::spawn(app.run());

    if handle.start().await.is_err() {
        eprintln!("Error: application loop stopped unexpectedly");
        std::process::exit(1);
    }

    let code = match cli.command {
        Cmd::Fused => one_shot(&handle, LocationSource::Fused).await,
        Cmd::Wifi => one_shot(&handle, LocationSource::Wifi).await,
        Cmd::Cell => one_shot(&handle, LocationSource::Cell).await,
        Cmd::Serve { host, port } => match server::start(&host, port, handle.clone()).await {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: Cannot serve on {}:{}: {}", host, port, e);
                1
            }
        },
    };

    handle.shutdown().await;
    let _ = app_task.await;
    std::process::exit(code);
}

fn load_config(cli: &Cli) -> Config {
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if let Some(ref key) = cli.api_key {
        config.api_key = key.clone();
    }
    if let Some(ref endpoint) = cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(lang) = cli.lang {
        config.locale = lang;
    }
    if let Some(ref iface) = cli.iface {
        config.wifi_interface = iface.clone();
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    config
}

fn build_platform(cli: &Cli, config: &Config) -> (LocationResolver, Arc<dyn PermissionGate>) {
    let service = Arc::new(GoogleGeolocation::new(&config.endpoint, &config.api_key, config.timeout()));
    tracing::info!(endpoint = service.endpoint(), keyed = !config.api_key.is_empty(), "geolocation service");

    match &cli.snapshot {
        Some(path) => {
            let snapshot = SensorSnapshot::load(path).unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });
            let gate: Arc<dyn PermissionGate> = Arc::new(snapshot.permission_gate());
            let snapshot = Arc::new(snapshot);
            let resolver = LocationResolver::new(snapshot.clone(), snapshot.clone(), snapshot, service);
            (resolver, gate)
        }
        None => {
            let resolver = LocationResolver::new(
                Arc::new(NoFusedProvider),
                Arc::new(IwWifi::new(&config.wifi_interface)),
                Arc::new(NoModem),
                service,
            );
            let gate: Arc<dyn PermissionGate> = Arc::new(DesktopPermissions);
            (resolver, gate)
        }
    }
}

/// Run one pipeline to completion. Status text to stderr, JSON to stdout.
async fn one_shot(handle: &AppHandle, source: LocationSource) -> i32 {
    let view = match handle.locate(source).await {
        Ok(Submission::Dispatched(_)) => handle.settled().await,
        Ok(Submission::Denied) => Ok(handle.status()),
        Err(e) => Err(e),
    };

    let view = match view {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    eprintln!("{}", view.text);
    match serde_json::to_string_pretty(&view) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: {}", e),
    }

    if view.state == StatusKind::Resolved {
        0
    } else {
        1
    }
}
