use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

mod backend;
mod demo;

pub const TEST_TOKEN: &str = "test-token";
pub const TEST_API_KEY: &str = "test-api-key";

pub const PATH_LIVE: &str = "/ws/live";

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    in_flight: Arc<AtomicU64>,
    max_in_flight: Arc<AtomicU64>,
    paths: Arc<Mutex<Vec<String>>>,
    search_queries: Arc<Mutex<Vec<String>>>,
}

impl TestServerStats {
    fn begin(&self, path: String) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.paths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path);
    }

    fn end(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn push_search_query(&self, q: String) {
        self.search_queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(q);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Highest number of requests observed in flight at the same time.
    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Raw path-and-query of every request, in arrival order.
    pub fn paths(&self) -> Vec<String> {
        self.paths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Decoded `q` values seen by `/api/search`, in arrival order.
    pub fn search_queries(&self) -> Vec<String> {
        self.search_queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[derive(Debug, Clone)]
struct AppState {
    stats: TestServerStats,
    shop: demo::SharedShop,
    backend: Arc<backend::Backend>,
}

async fn track(State(stats): State<TestServerStats>, req: Request, next: Next) -> Response {
    let path = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path().to_string(), |pq| pq.as_str().to_string());
    stats.begin(path);
    let res = next.run(req).await;
    stats.end();
    res
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(demo::home))
        .route("/api/products", get(demo::list_products))
        .route("/api/products/{id}", get(demo::get_product))
        .route("/api/users", get(demo::list_users))
        .route("/api/users/{id}", get(demo::get_user))
        .route("/api/orders", get(demo::list_orders).post(demo::create_order))
        .route("/api/search", get(demo::search))
        .route("/api/admin/reset", post(demo::admin_reset))
        .route("/api/ingest", post(backend::ingest))
        .route("/api/ingest/test", get(backend::ingest_test))
        .route("/api/metrics", post(backend::metrics))
        .route("/api/alerts", get(backend::alerts))
        .route(PATH_LIVE, get(backend::live))
        .fallback(demo::fallback)
        .layer(middleware::from_fn_with_state(state.stats.clone(), track))
        .with_state(state)
}

/// Demo target API and fake backend served from one listener.
pub fn router(stats: TestServerStats) -> Router {
    app(AppState {
        stats,
        shop: Arc::default(),
        backend: Arc::new(backend::Backend::new(TEST_TOKEN, TEST_API_KEY)),
    })
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    stats: TestServerStats,
    backend: Arc<backend::Backend>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();
        let backend = Arc::new(backend::Backend::new(TEST_TOKEN, TEST_API_KEY));

        let app = app(AppState {
            stats: stats.clone(),
            shop: Arc::default(),
            backend: backend.clone(),
        });

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        Ok(Self {
            addr,
            base_url: format!("http://{addr}"),
            stats,
            backend,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn live_url(&self) -> String {
        format!("ws://{}{PATH_LIVE}", self.addr)
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    /// Number of records accepted by `/api/ingest`.
    pub fn ingested(&self) -> usize {
        self.backend.ingested()
    }

    /// Sends `text` verbatim to every connected `/ws/live` client.
    pub fn broadcast_raw(&self, text: impl Into<String>) -> usize {
        self.backend.events.send(text.into()).unwrap_or(0)
    }

    /// Number of `/ws/live` clients currently subscribed.
    pub fn live_clients(&self) -> usize {
        self.backend.events.receiver_count()
    }

    /// Sends a close frame to every connected `/ws/live` client.
    pub fn close_live_streams(&self) {
        self.backend.closing.send_replace(true);
    }

    pub async fn shutdown(mut self) {
        self.close_live_streams();

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
