pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("http error: {0}")]
    Http(#[from] boing_http::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid url `{0}`")]
    InvalidUrl(String),

    #[error("backend answered {status} for {path}")]
    Backend { path: String, status: u16 },

    #[error("backend not ready after {attempts} attempts")]
    BackendNotReady { attempts: u32 },

    #[error("feed capacity must be a positive integer")]
    InvalidCapacity,
}
