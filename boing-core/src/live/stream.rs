use futures_util::{SinkExt as _, StreamExt as _};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::{Error, Result};
use crate::monitor::BoundedFeed;

use super::{LiveEvent, decode_message};

/// Why a live stream stopped. The consumer never reconnects on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    Closed,
    TransportError(String),
}

/// Derives the backend's live feed URL (`/ws/live`) from its HTTP base URL.
pub fn stream_url_for_backend(backend: &str) -> Result<String> {
    let mut url = url::Url::parse(backend).map_err(|_| Error::InvalidUrl(backend.to_string()))?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        "ws" | "wss" => return Ok(url.to_string()),
        _ => return Err(Error::InvalidUrl(backend.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| Error::InvalidUrl(backend.to_string()))?;
    url.set_path("/ws/live");
    Ok(url.to_string())
}

#[derive(Debug)]
pub struct LiveStream {
    url: String,
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl LiveStream {
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _resp) = tokio_tungstenite::connect_async(url).await?;
        tracing::info!(%url, "live stream connected");
        Ok(Self {
            url: url.to_string(),
            ws,
        })
    }

    /// Pushes every decoded request-log event into `feed` until the stream ends.
    pub async fn run<F>(mut self, feed: &BoundedFeed<LiveEvent>, mut on_event: F) -> StreamEnd
    where
        F: FnMut(&LiveEvent),
    {
        while let Some(incoming) = self.ws.next().await {
            let msg = match incoming {
                Ok(msg) => msg,
                Err(err) => {
                    tracing::warn!(url = %self.url, error = %err, "live stream failed");
                    return StreamEnd::TransportError(err.to_string());
                }
            };

            let text = match msg {
                Message::Text(text) => text.as_str().to_owned(),
                Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                    Ok(s) => s.to_string(),
                    Err(_) => {
                        tracing::debug!("dropping non-utf8 binary frame");
                        continue;
                    }
                },
                Message::Ping(payload) => {
                    if let Err(err) = self.ws.send(Message::Pong(payload)).await {
                        tracing::warn!(url = %self.url, error = %err, "live stream failed");
                        return StreamEnd::TransportError(err.to_string());
                    }
                    continue;
                }
                Message::Close(_) => break,
                Message::Pong(_) | Message::Frame(_) => continue,
            };

            match decode_message(&text) {
                Ok(Some(event)) => {
                    on_event(&event);
                    feed.push(event);
                }
                Ok(None) => {}
                Err(err) => tracing::debug!(error = %err, "dropping undecodable stream message"),
            }
        }

        tracing::info!(url = %self.url, "live stream closed");
        StreamEnd::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_stream_url_from_backend() {
        assert_eq!(
            stream_url_for_backend("http://localhost:8000").ok().as_deref(),
            Some("ws://localhost:8000/ws/live")
        );
        assert_eq!(
            stream_url_for_backend("https://boing.example/api").ok().as_deref(),
            Some("wss://boing.example/ws/live")
        );
        assert_eq!(
            stream_url_for_backend("ws://h:1/custom").ok().as_deref(),
            Some("ws://h:1/custom")
        );
        assert!(stream_url_for_backend("ftp://x").is_err());
    }
}
