use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use std::sync::Arc;

use crate::{
    api::{DeviceClient, ScanSource},
    config::ScanViewConfig,
    core::{table::KnownAps, PollEvent, ScanPoller},
    pages::{PagesMap, WifiSetupPage, WIFI_SETUP_PAGE},
    render::{render_table_body, FileTarget, MultiTarget, RenderTarget, SharedTarget, StdoutTarget},
    serve::{run_view_server, ViewState},
};

pub fn build_command() -> Command {
    Command::new("scanview")
        .about("Watch the WiFi networks a device can see")
        .arg(
            Arg::new("api-base")
                .long("api-base")
                .short('a')
                .help("Base URL of the device API (default: http://192.168.168.1/)")
                .value_name("URL"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Read settings from a JSON file; flags override it")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("interval-ms")
                .long("interval-ms")
                .help("Delay between the end of one scan and the start of the next")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .help("Per-request timeout")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .short('1')
                .help("Scan once, print the table body and exit")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with_all(["output", "serve"]),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .short('j')
                .help("With --once, print the access points as JSON instead of HTML")
                .requires("once")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Rewrite this HTML file after every scan (default: print to stdout)")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("serve")
                .long("serve")
                .short('s')
                .help("Also serve the view on http://127.0.0.1:PORT/setup")
                .value_name("PORT")
                .value_parser(clap::value_parser!(u16)),
        )
}

/// Parse command line arguments and return ArgMatches.
pub fn parse_args() -> ArgMatches {
    build_command().get_matches()
}

/// Load the config file if given, then apply flag overrides.
pub fn resolve_config(matches: &ArgMatches) -> Result<ScanViewConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ScanViewConfig::from_file(path)?,
        None => ScanViewConfig::default(),
    };
    if let Some(base) = matches.get_one::<String>("api-base") {
        config.api_base = base.clone();
    }
    if let Some(interval) = matches.get_one::<u64>("interval-ms") {
        config.interval_ms = *interval;
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout-ms") {
        config.timeout_ms = *timeout;
    }
    if config.interval_ms == 0 {
        return Err(anyhow!("--interval-ms must be greater than zero"));
    }
    // Fail on a bad URL now rather than on the first scan.
    config.api_base_url()?;
    Ok(config)
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config = resolve_config(matches)?;
    let client = DeviceClient::new(&config)?;
    log::info!("Using device API at {}", client.base());

    if matches.get_flag("once") {
        return run_once(&client, matches.get_flag("json")).await;
    }
    run_watch(
        &config,
        client,
        matches.get_one::<String>("output").cloned(),
        matches.get_one::<u16>("serve").copied(),
    )
    .await
}

async fn run_once(client: &DeviceClient, json: bool) -> Result<()> {
    let access_points = client.scan().await?;
    if json {
        let out = serde_json::to_string_pretty(&access_points)
            .map_err(|err| anyhow!("Failed to encode access points: {err}"))?;
        println!("{out}");
        return Ok(());
    }
    let mut known = KnownAps::new();
    known.upsert_all(access_points);
    println!("{}", render_table_body(&known));
    Ok(())
}

async fn run_watch(
    config: &ScanViewConfig,
    client: DeviceClient,
    output: Option<String>,
    serve_port: Option<u16>,
) -> Result<()> {
    let refresh_secs = config.interval().as_secs().max(1);
    let shared = SharedTarget::new();
    let mut targets: Vec<Arc<dyn RenderTarget>> = vec![Arc::new(shared.clone())];
    match &output {
        Some(path) => targets.push(Arc::new(FileTarget::new(path, Some(refresh_secs)))),
        None if serve_port.is_none() => targets.push(Arc::new(StdoutTarget)),
        None => {}
    }

    let poller = ScanPoller::from_config(
        config,
        Arc::new(client.clone()),
        Arc::new(MultiTarget::new(targets)),
    );
    let monitor = poller.monitor();
    let events = monitor.subscribe();

    let mut pages = PagesMap::new();
    pages.register(WIFI_SETUP_PAGE, Box::new(WifiSetupPage::new(poller)));
    pages.navigate(WIFI_SETUP_PAGE)?;

    match client.fetch_config().await {
        Ok(device_config) => {
            if let Err(err) = pages.apply_config(&device_config) {
                log::warn!("{err}");
            }
        }
        Err(err) => log::warn!("Could not load device config: {err}"),
    }

    let (shutdown_tx, shutdown_rx) = flume::bounded::<()>(1);
    let server = serve_port.map(|port| {
        let state = ViewState {
            target: shared.clone(),
            monitor: monitor.clone(),
            refresh_secs,
        };
        tokio::spawn(run_view_server(port, state, async move {
            let _ = shutdown_rx.recv_async().await;
        }))
    });

    let reporter = tokio::spawn(async move {
        while let Ok(event) = events.recv_async().await {
            match event {
                PollEvent::Rendered { networks, added, .. } if added > 0 => {
                    log::info!("{added} new network(s), {networks} known");
                }
                PollEvent::Failed { cycle, .. } if cycle == 1 => {
                    log::warn!("First scan failed; will keep retrying");
                }
                _ => {}
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .map_err(|err| anyhow!("Failed to listen for Ctrl-C: {err}"))?;
    log::info!("Received Ctrl-C, shutting down");

    pages.leave();
    reporter.abort();
    let _ = shutdown_tx.send(());
    if let Some(server) = server {
        server
            .await
            .map_err(|err| anyhow!("View server task failed: {err}"))??;
    }

    let stats = monitor.stats();
    log::info!(
        "Finished after {} scans ({} failed), {} networks seen",
        stats.cycles,
        stats.failures,
        monitor.known().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config_defaults() {
        let matches = build_command()
            .try_get_matches_from([
                "scanview",
                "--api-base",
                "http://10.0.0.9:8080",
                "--interval-ms",
                "250",
            ])
            .unwrap();
        let config = resolve_config(&matches).unwrap();
        assert_eq!(config.api_base, "http://10.0.0.9:8080");
        assert_eq!(config.interval_ms, 250);
        assert_eq!(config.timeout_ms, 3000);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let matches = build_command()
            .try_get_matches_from(["scanview", "--interval-ms", "0"])
            .unwrap();
        assert!(resolve_config(&matches).is_err());
    }

    #[test]
    fn test_once_conflicts_with_serve() {
        assert!(build_command()
            .try_get_matches_from(["scanview", "--once", "--serve", "8080"])
            .is_err());
        assert!(build_command()
            .try_get_matches_from(["scanview", "--json"])
            .is_err());
    }
}
