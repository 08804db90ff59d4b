use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use bunker::domain::{FetchRequest, Generation};
use bunker::ports::CacheStorage;
use bunker::Worker;
use net_fetch::HttpFetcher;
use shared::config::Config;
use std::sync::Arc;
use storage_engine::{MokaStorage, SledStorage};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use url::Url;

#[derive(Clone)]
struct AppState {
    worker: Arc<Worker>,
    origin: Url,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting Bunker Server");

    // Load environment variables
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let config = Config::from_env();

    // ============================================
    // STEP 1: Initialize cache storage
    // ============================================
    let storage_path = std::path::Path::new(&config.data_dir).join("bunker.sled");
    let storage: Arc<dyn CacheStorage> = match SledStorage::new(&storage_path) {
        Ok(storage) => {
            info!("Cache storage persisted at {}", storage_path.display());
            Arc::new(storage)
        }
        Err(e) => {
            warn!(
                "Failed to open persistent storage: {}. Running in-memory mode.",
                e
            );
            Arc::new(MokaStorage::new())
        }
    };

    // ============================================
    // STEP 2: Build and install the worker
    // ============================================
    let generation = Generation::new(config.namespace.clone(), config.version.clone());
    info!(
        "Current cache generation: '{}'",
        generation.partition_name()
    );

    let worker = Arc::new(Worker::new(
        storage,
        Arc::new(HttpFetcher::new()),
        generation,
        config.origin.clone(),
        config.offline_url(),
        config.seed_urls(),
        config.same_origin_only,
    ));

    let report = worker.install().await?;
    info!(
        "Install complete: {} seed(s) in '{}'",
        report.seeded.len(),
        report.partition
    );

    let sweep = worker.activate().await?;
    info!(
        "Activation complete: swept {} stale partition(s)",
        sweep.deleted.len()
    );

    // ============================================
    // STEP 3: Serve the intercepting front
    // ============================================
    let state = AppState {
        worker,
        origin: config.origin.clone(),
    };
    let app = Router::new()
        .fallback(proxy_request)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    info!(
        "Bunker listening on http://{}:{}, fronting {}",
        config.host, config.port, config.origin
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Bunker server shutting down");
    Ok(())
}

/// Funnel every incoming request through the worker's fetch handler.
async fn proxy_request(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let target = match resolve_target(&state.origin, parts.uri.path(), parts.uri.query()) {
        Some(url) => url,
        None => return status_response(axum::http::StatusCode::BAD_REQUEST),
    };

    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return status_response(axum::http::StatusCode::BAD_REQUEST),
    };

    let mut fetch_request = FetchRequest::new(parts.method, target).with_body(body);
    fetch_request.headers = parts.headers;

    match state.worker.handle_fetch(fetch_request).await {
        Ok(Some(fetched)) => {
            let mut response = Response::new(Body::from(fetched.body));
            *response.status_mut() = fetched.status;
            *response.headers_mut() = fetched.headers;
            response
        }
        // The handler yielded nothing; there is no content to serve.
        Ok(None) => status_response(axum::http::StatusCode::NO_CONTENT),
        Err(e) => {
            warn!("Fetch handler failed: {}", e);
            status_response(axum::http::StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

fn resolve_target(origin: &Url, path: &str, query: Option<&str>) -> Option<Url> {
    let mut url = origin.join(path).ok()?;
    url.set_query(query);
    Some(url)
}

fn status_response(status: axum::http::StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
