use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use departure_board::board::{BoardContext, Supervisor};
use departure_board::config::{BoardConfig, parse_trip_args};
use departure_board::display::{ConsoleLcd, Displays, StdoutTerminal};
use departure_board::store::JsonLinesStore;
use departure_board::transit::{
    ConnectionSource, HttpConnectionSource, MockConnectionSource, TransitConfig,
};

/// Where observed departures go when `BOARD_STORE_DIR` is unset.
const DEFAULT_STORE_DIR: &str = "departures";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let trips = match parse_trip_args(&args) {
        Ok(trips) => trips,
        Err(e) => {
            error!(error = %e, "invalid trip arguments");
            return ExitCode::from(2);
        }
    };

    let config = match BoardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::from(2);
        }
    };

    let source: Arc<dyn ConnectionSource> = match std::env::var("BOARD_MOCK_DATA") {
        Ok(path) => match MockConnectionSource::from_file(&path) {
            Ok(mock) => {
                info!(%path, routes = mock.routes().len(), "using mock connection data");
                Arc::new(mock)
            }
            Err(e) => {
                error!(%path, error = %e, "failed to load mock connection data");
                return ExitCode::FAILURE;
            }
        },
        Err(_) => {
            let mut transit = TransitConfig::default().with_timeout(config.fetch_timeout_secs);
            match std::env::var("TRANSIT_API_URL") {
                Ok(url) => transit.base_url = url,
                Err(_) => warn!(url = %transit.base_url, "TRANSIT_API_URL not set, using default"),
            }
            if let Ok(key) = std::env::var("TRANSIT_API_KEY") {
                transit = transit.with_api_key(key);
            }
            if let Ok(value) = std::env::var("TRANSIT_MAX_CONCURRENT") {
                match value.trim().parse::<usize>() {
                    Ok(n) if n > 0 => transit = transit.with_max_concurrent(n),
                    _ => {
                        error!(%value, "invalid TRANSIT_MAX_CONCURRENT");
                        return ExitCode::from(2);
                    }
                }
            }

            match HttpConnectionSource::new(transit) {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    error!(error = %e, "failed to create transit client");
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let store_dir =
        std::env::var("BOARD_STORE_DIR").unwrap_or_else(|_| DEFAULT_STORE_DIR.to_string());
    let store = Arc::new(JsonLinesStore::new(&store_dir));

    for trip in &trips {
        info!(start = %trip.start, goal = %trip.goal, prefix = %trip.prefix, only_direct = trip.only_direct, "monitoring trip");
    }
    info!(
        refresh_secs = config.refresh_secs,
        lookahead_mins = config.lookahead_mins,
        store_dir = %store_dir,
        "departure board starting"
    );

    let ctx = Arc::new(BoardContext::new(trips, source, store, config));
    let displays = Displays::new(Arc::new(ConsoleLcd::new()), Arc::new(StdoutTerminal::new()));

    let mut supervisor = Supervisor::new(ctx, displays);
    match supervisor.run().await {}
}
