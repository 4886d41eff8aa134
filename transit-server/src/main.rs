use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use transit_server::engine::Engine;
use transit_server::schedule::ScheduleSnapshot;
use transit_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Schedule snapshot path: first argument, or TRANSIT_SNAPSHOT.
    let path: PathBuf = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TRANSIT_SNAPSHOT").ok())
        .expect("usage: transit-server <snapshot.json> (or set TRANSIT_SNAPSHOT)")
        .into();

    let snapshot = ScheduleSnapshot::load(&path).expect("failed to load schedule snapshot");
    let engine = Engine::new(snapshot.into_repository());
    let graph = engine.build_graph();
    info!(
        stops = graph.stop_count(),
        edges = graph.edge_count(),
        "schedule loaded"
    );

    let state = AppState::new(engine);
    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    info!(%addr, "transit planner listening");
    axum::serve(listener, app).await.expect("server error");
}
