use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bus_arrivals::api::{BusApiClient, MockBusApi};
use bus_arrivals::config::ClientConfig;
use bus_arrivals::coordinator::{ResultCoordinator, SearchOutcome, StationBackend};
use bus_arrivals::geo::{LocationProvider, ManualLocation};
use bus_arrivals::polling::{BoardState, PollPhase};

/// How many board refreshes to print before exiting.
const BOARD_UPDATES: usize = 3;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bus_arrivals=info")),
        )
        .init();

    let Some(keyword) = std::env::args().nth(1) else {
        eprintln!("Usage: bus-arrivals <station name>");
        return ExitCode::FAILURE;
    };

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match &config.mock_dir {
        Some(dir) => match MockBusApi::load(dir) {
            Ok(mock) => {
                info!(dir = %dir.display(), "using mock backend");
                run(Arc::new(mock), &config, &keyword).await
            }
            Err(e) => {
                error!(error = %e, "failed to load mock data");
                ExitCode::FAILURE
            }
        },
        None => match BusApiClient::new(config.api.clone()) {
            Ok(client) => {
                info!(base_url = %client.base_url(), "using backend");
                run(Arc::new(client), &config, &keyword).await
            }
            Err(e) => {
                error!(error = %e, "failed to create backend client");
                ExitCode::FAILURE
            }
        },
    }
}

async fn run<B: StationBackend>(backend: Arc<B>, config: &ClientConfig, keyword: &str) -> ExitCode {
    let mut coordinator = ResultCoordinator::new(backend, config.poll_interval);

    coordinator.start().await;
    let favorites = coordinator.favorites().state();
    match (&favorites.data, &favorites.error) {
        (Some(saved), _) => println!("{} saved stations", saved.len()),
        (None, Some(e)) => warn!(error = %e, "could not load saved stations"),
        (None, None) => {}
    }

    let location = config
        .observer
        .map_or_else(ManualLocation::new, ManualLocation::at);
    let observer = match location.current().await {
        Ok(position) => Some(position),
        Err(e) => {
            info!(reason = %e, "no position, keeping catalog order");
            None
        }
    };

    let results = match coordinator.search(keyword, observer).await {
        Ok(SearchOutcome::Found(results)) => results,
        Ok(_) => {
            println!("No stations match {keyword:?}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            error!(error = %e, "search failed");
            return ExitCode::FAILURE;
        }
    };

    for (i, result) in results.iter().enumerate() {
        let distance = result
            .distance_meters
            .map(|m| format!("{m:.0} m"))
            .unwrap_or_default();
        println!(
            "{:>2}. {} ({}) {}",
            i + 1,
            result.station_name,
            result.ars_id,
            distance
        );
    }

    let first = &results[0];
    println!();
    println!("Arrivals at {} ({}):", first.station_name, first.ars_id);
    coordinator.select(first);

    let mut board = coordinator.detail().subscribe();
    let mut shown = 0;
    while shown < BOARD_UPDATES && board.changed().await.is_ok() {
        let state = board.borrow_and_update().clone();
        if matches!(state.phase, PollPhase::Ready | PollPhase::Failed) {
            print_board(&state);
            shown += 1;
        }
    }

    coordinator.close_detail();
    ExitCode::SUCCESS
}

fn print_board(state: &BoardState) {
    let updated = state
        .last_updated_label()
        .unwrap_or_else(|| "-".to_string());
    if let Some(failure) = &state.error {
        println!("[{updated}] refresh failed: {}", failure.message);
        return;
    }
    if let Some(extra) = &state.extra {
        println!(
            "[{updated}] towards {}, next stop {}",
            extra.direction, extra.next_stop
        );
    }
    for record in &state.records {
        println!(
            "  {:<6} {:<4} {} / {} ({})",
            record.route_name,
            record.route_type.label(),
            record.first_message,
            record.second_message,
            record.crowding.label()
        );
    }
}
