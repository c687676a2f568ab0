use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use transit_server::cache::CacheConfig;
use transit_server::clock::SystemClock;
use transit_server::fares::{FareConfig, FareData, FareEngine, FareTable};
use transit_server::network::{NetworkConfig, NetworkRegistry};
use transit_server::planner::{Planner, PlannerConfig};
use transit_server::service::TransitService;
use transit_server::snapshot::{load_fares, load_network};
use transit_server::tickets::{
    FileJournal, MemoryJournal, QrSigner, TicketConfig, TicketJournal, TicketManager,
};
use transit_server::web::{AppState, create_router};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(message) = run().await {
        error!("{message}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let network_path = std::env::var("TRANSIT_NETWORK_PATH")
        .map_err(|_| "TRANSIT_NETWORK_PATH must point at a network snapshot".to_string())?;
    let snapshot = load_network(&network_path).map_err(|e| e.to_string())?;
    let registry = NetworkRegistry::new(snapshot, NetworkConfig::default())
        .map_err(|e| format!("Network snapshot rejected: {e}"))?;
    info!(summary = ?registry.current().summary(), "Loaded network");

    let fares = match std::env::var("TRANSIT_FARES_PATH") {
        Ok(path) => load_fares(&path).map_err(|e| e.to_string())?,
        Err(_) => {
            warn!("TRANSIT_FARES_PATH not set; every ride will be unpriced");
            FareData::default()
        }
    };
    let fare_table = FareTable::build(fares).map_err(|e| format!("Fare data rejected: {e}"))?;
    info!(rules = fare_table.len(), "Loaded fares");

    let key = std::env::var("TRANSIT_SIGNING_KEY")
        .map_err(|_| "TRANSIT_SIGNING_KEY must be set".to_string())?;
    let signer = QrSigner::new(key.as_bytes()).map_err(|e| e.to_string())?;

    let config = TicketConfig::default();
    let tickets = match std::env::var("TRANSIT_JOURNAL_PATH") {
        Ok(path) => {
            let events = FileJournal::replay(&path).map_err(|e| e.to_string())?;
            let journal: Arc<dyn TicketJournal> =
                Arc::new(FileJournal::open(&path).map_err(|e| e.to_string())?);
            TicketManager::restore(config, signer, journal, events).map_err(|e| e.to_string())?
        }
        Err(_) => {
            warn!("TRANSIT_JOURNAL_PATH not set; tickets will not survive a restart");
            TicketManager::new(config, signer, Arc::new(MemoryJournal::new()))
        }
    };

    let service = TransitService::new(
        registry,
        Planner::new(PlannerConfig::default()),
        FareEngine::new(FareConfig::default()),
        fare_table,
        tickets,
        Arc::new(SystemClock),
    );
    let app = create_router(AppState::new(service, &CacheConfig::default()));

    let addr: SocketAddr = std::env::var("TRANSIT_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .map_err(|e| format!("Invalid TRANSIT_ADDR: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;
    info!(%addr, "Transit server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {e}"))
}
