use alert_engine::{Engine, EngineSnapshot, PlaceCategory, PlaceRecord, ProvidersHealth, RegionCode};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

pub fn router(engine: Engine) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/snapshot", get(snapshot))
        .route("/categories", put(set_categories))
        .route("/regions/{code}", post(select_region))
        .route("/places/{id}/select", post(select_place))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(engine)
}

pub async fn run_server(
    engine: Engine,
    bind_addr: String,
    shutdown: CancellationToken,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(name: "server.started", %bind_addr, "starting axum server");
    axum::serve(listener, router(engine))
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await?;
    Ok(())
}

async fn health_check(State(engine): State<Engine>) -> (StatusCode, Json<ProvidersHealth>) {
    let health = engine.health();
    let status = if health.is_failing() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(health))
}

async fn snapshot(State(engine): State<Engine>) -> Json<EngineSnapshot> {
    Json(engine.snapshot())
}

async fn set_categories(
    State(engine): State<Engine>,
    Json(categories): Json<Vec<PlaceCategory>>,
) -> Json<Vec<PlaceCategory>> {
    engine.set_enabled_categories(categories);
    Json(engine.snapshot().enabled_categories)
}

async fn select_region(
    State(engine): State<Engine>,
    Path(code): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let region = RegionCode::parse(&code)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("unknown region: {code}")))?;
    // Detached; progress is visible through /snapshot.
    drop(engine.select_region(region));
    Ok(StatusCode::ACCEPTED)
}

async fn select_place(
    State(engine): State<Engine>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlaceRecord>, StatusCode> {
    engine.select_place(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}
