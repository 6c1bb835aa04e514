//! Firebase Realtime Database client using the REST streaming API.
//!
//! Each subscription opens `GET {database_url}/{path}.json` with
//! `Accept: text/event-stream` and keeps a local copy of the value at the
//! path, updated by `put`/`patch` events. After every change the full copy
//! is delivered as a [`Snapshot`].
//!
//! ## Example
//!
//! ```no_run
//! use rtc_monitor::{Database, DbPath, FirebaseDatabase};
//!
//! # tokio_test::block_on(async {
//! let db = FirebaseDatabase::builder()
//!     .database_url("https://example-default-rtdb.firebaseio.com")
//!     .build()?;
//!
//! let mut subscription = db.subscribe(&DbPath::parse("realtime/temperature"));
//! if let Some(snapshot) = subscription.poll() {
//!     println!("temperature: {:?}", snapshot.val());
//! }
//! # Ok::<(), rtc_monitor::DatabaseError>(())
//! # }).unwrap();
//! ```

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::sse::StreamEvent;
use super::tree::{set_at, update_at};
use super::{Database, DbPath, ErrorSlot, Snapshot, Subscription, SubscriptionHandle};
use crate::config::DatabaseConfig;
use crate::error::DatabaseError;

/// A realtime database reached over HTTPS.
///
/// Streaming tasks run on the tokio runtime captured at build time, so
/// [`Database::subscribe`] can be called from the synchronous UI loop.
#[derive(Debug, Clone)]
pub struct FirebaseDatabase {
    client: Client,
    database_url: String,
    auth_token: Option<String>,
    runtime: Handle,
    description: String,
}

impl FirebaseDatabase {
    /// Create a new builder for configuring the client.
    pub fn builder() -> FirebaseDatabaseBuilder {
        FirebaseDatabaseBuilder::default()
    }

    /// Build a client from loaded configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let mut builder = Self::builder()
            .database_url(&config.database_url)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(token) = &config.auth_token {
            builder = builder.auth_token(token);
        }
        builder.build()
    }

    /// The REST URL streamed for `path`.
    ///
    /// The auth token is not part of it; it is sent as the `auth` query
    /// parameter when the stream is opened.
    pub fn stream_url(&self, path: &DbPath) -> String {
        format!("{}/{}.json", self.database_url, path)
    }
}

impl Database for FirebaseDatabase {
    fn subscribe(&self, path: &DbPath) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let last_error = ErrorSlot::default();

        info!(path = %path, "Opening stream");
        let task = self.runtime.spawn(stream_path(
            self.client.clone(),
            self.stream_url(path),
            self.auth_token.clone(),
            path.clone(),
            tx,
            last_error.clone(),
        ));

        let released = path.clone();
        let handle = SubscriptionHandle::new(move || {
            task.abort();
            info!(path = %released, "Closed stream");
        });

        Subscription::new(path.clone(), rx, last_error, handle)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for [`FirebaseDatabase`].
#[derive(Debug, Default)]
pub struct FirebaseDatabaseBuilder {
    database_url: Option<String>,
    auth_token: Option<String>,
    connect_timeout: Option<Duration>,
    client: Option<Client>,
    runtime: Option<Handle>,
}

impl FirebaseDatabaseBuilder {
    /// Set the database URL (e.g., "https://project-default-rtdb.firebaseio.com").
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Authenticate reads with a database secret or ID token.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the timeout for opening a stream (default: 10 seconds).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Use a preconfigured HTTP client. `connect_timeout` is then ignored.
    pub fn http_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Run streaming tasks on this runtime instead of the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<FirebaseDatabase, DatabaseError> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current()
                .map_err(|e| DatabaseError::Connection(format!("No tokio runtime: {}", e)))?,
        };

        // No overall timeout: streams stay open indefinitely.
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .connect_timeout(self.connect_timeout.unwrap_or(Duration::from_secs(10)))
                .build()?,
        };

        let database_url = self
            .database_url
            .unwrap_or_else(|| DatabaseConfig::default().database_url)
            .trim_end_matches('/')
            .to_string();

        Ok(FirebaseDatabase {
            client,
            description: format!("firebase: {}", database_url),
            database_url,
            auth_token: self.auth_token,
            runtime,
        })
    }
}

/// Background task for one subscription.
async fn stream_path(
    client: Client,
    url: String,
    auth_token: Option<String>,
    path: DbPath,
    tx: mpsc::UnboundedSender<Snapshot>,
    last_error: ErrorSlot,
) {
    let mut request = client.get(&url).header(ACCEPT, "text/event-stream");
    if let Some(token) = &auth_token {
        request = request.query(&[("auth", token)]);
    }

    match run_stream(request, &path, &tx, &last_error).await {
        Ok(()) => debug!(path = %path, "Receiver dropped, stopping stream"),
        Err(e) => {
            warn!(path = %path, error = %e, "Stream ended");
            *last_error.lock() = Some(e);
        }
    }
}

async fn run_stream(
    request: RequestBuilder,
    path: &DbPath,
    tx: &mpsc::UnboundedSender<Snapshot>,
    last_error: &ErrorSlot,
) -> Result<(), DatabaseError> {
    let response = request.send().await?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err(DatabaseError::Http("Unauthorized".to_string()));
    }
    if !response.status().is_success() {
        return Err(DatabaseError::Http(format!(
            "Server returned status {}",
            response.status()
        )));
    }

    let mut events = response.bytes_stream().eventsource();
    let mut cache = Value::Null;

    while let Some(raw) = events.next().await {
        let raw = raw?;
        let event = match StreamEvent::parse(&raw.event, &raw.data) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!(path = %path, error = %e, "Skipping malformed event");
                *last_error.lock() = Some(e);
                continue;
            }
        };
        if !apply_event(&mut cache, event)? {
            continue;
        }
        *last_error.lock() = None;
        if tx.send(Snapshot::new(path.clone(), cache.clone())).is_err() {
            return Ok(());
        }
    }

    Err(DatabaseError::Closed)
}

/// Apply a stream event to the cached value.
///
/// Returns `Ok(true)` when the cache changed and should be delivered, and an
/// error when the server ended the stream.
fn apply_event(cache: &mut Value, event: StreamEvent) -> Result<bool, DatabaseError> {
    match event {
        StreamEvent::Put { path, data } => {
            set_at(cache, &path, data);
            Ok(true)
        }
        StreamEvent::Patch { path, data } => match data {
            Value::Object(children) => {
                update_at(cache, &path, children);
                Ok(true)
            }
            other => {
                warn!(path = %path, "Ignoring patch with non-object data: {}", other);
                Ok(false)
            }
        },
        StreamEvent::KeepAlive => Ok(false),
        StreamEvent::Cancel(reason) => Err(DatabaseError::Cancelled(reason)),
        StreamEvent::AuthRevoked => Err(DatabaseError::AuthRevoked),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_builder_defaults() {
        let db = FirebaseDatabase::builder().build().unwrap();
        assert_eq!(db.database_url, DatabaseConfig::default().database_url);
        assert!(db.auth_token.is_none());
        assert!(db.description().starts_with("firebase: https://"));
    }

    #[tokio::test]
    async fn test_stream_url() {
        let db = FirebaseDatabase::builder()
            .database_url("https://example.firebaseio.com/")
            .build()
            .unwrap();
        assert_eq!(
            db.stream_url(&DbPath::parse("data/2025/03")),
            "https://example.firebaseio.com/data/2025/03.json"
        );

        let db = FirebaseDatabase::builder()
            .database_url("https://example.firebaseio.com")
            .auth_token("secret")
            .build()
            .unwrap();
        // The token travels as a query parameter, not in the URL itself
        assert_eq!(
            db.stream_url(&DbPath::parse("realtime/humidity")),
            "https://example.firebaseio.com/realtime/humidity.json"
        );
    }

    #[test]
    fn test_build_without_runtime_fails() {
        let result = FirebaseDatabase::builder().build();
        assert!(matches!(result, Err(DatabaseError::Connection(_))));
    }

    #[test]
    fn test_apply_put_and_patch() {
        let mut cache = Value::Null;

        let initial = StreamEvent::Put {
            path: DbPath::root(),
            data: json!({"08:00": {"temperature": 20, "humidity": 50}}),
        };
        assert!(apply_event(&mut cache, initial).unwrap());

        let added = StreamEvent::Put {
            path: DbPath::parse("09:00"),
            data: json!({"temperature": 21, "humidity": 55}),
        };
        assert!(apply_event(&mut cache, added).unwrap());

        let patched = StreamEvent::Patch {
            path: DbPath::parse("08:00"),
            data: json!({"temperature": 19}),
        };
        assert!(apply_event(&mut cache, patched).unwrap());

        assert_eq!(
            cache,
            json!({
                "08:00": {"temperature": 19, "humidity": 50},
                "09:00": {"temperature": 21, "humidity": 55}
            })
        );
    }

    #[test]
    fn test_apply_null_put_clears_value() {
        let mut cache = json!(21.5);
        let event = StreamEvent::Put {
            path: DbPath::root(),
            data: Value::Null,
        };
        assert!(apply_event(&mut cache, event).unwrap());
        assert!(cache.is_null());
    }

    #[test]
    fn test_apply_control_events() {
        let mut cache = json!(1);
        assert!(!apply_event(&mut cache, StreamEvent::KeepAlive).unwrap());
        assert!(matches!(
            apply_event(&mut cache, StreamEvent::Cancel("denied".to_string())),
            Err(DatabaseError::Cancelled(reason)) if reason == "denied"
        ));
        assert!(matches!(
            apply_event(&mut cache, StreamEvent::AuthRevoked),
            Err(DatabaseError::AuthRevoked)
        ));
    }

    /// Serve one canned HTTP response on a local port.
    ///
    /// Returns the base URL and the raw request head the client sent.
    async fn serve_once(response: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (request_tx, request_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let _ = request_tx.send(String::from_utf8_lossy(&head).into_owned());
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (format!("http://{}", addr), request_rx)
    }

    async fn wait_for_error(subscription: &Subscription) -> DatabaseError {
        for _ in 0..500 {
            if let Some(err) = subscription.error() {
                return err;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("stream never reported an error");
    }

    fn local_builder(url: &str) -> FirebaseDatabaseBuilder {
        let client = Client::builder().no_proxy().build().unwrap();
        FirebaseDatabase::builder().database_url(url).http_client(client)
    }

    fn local_db(url: &str) -> FirebaseDatabase {
        local_builder(url).build().unwrap()
    }

    const EVENT_STREAM_HEAD: &str =
        "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n";

    #[tokio::test]
    async fn test_stream_delivers_merged_snapshot_then_closes() {
        const RESPONSE: &str = concat!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n",
            "event: put\n",
            "data: {\"path\":\"/\",\"data\":{\"08:00\":{\"temperature\":20,\"humidity\":50}}}\n\n",
            ": comment\n",
            "event: keep-alive\n",
            "data: null\n\n",
            "event: patch\r\n",
            "data: {\"path\":\"/08:00\",\"data\":{\"temperature\":19}}\r\n\r\n",
            "event: put\n",
            "data: {\"path\":\"/09:00\",\"data\":{\"temperature\":21,\"humidity\":55}}\n\n",
        );
        let (url, request) = serve_once(RESPONSE).await;
        let db = local_db(&url);
        let path = DbPath::parse("data/2025/03/05");
        let mut subscription = db.subscribe(&path);

        // The server hangs up after the last event: recorded, not retried
        assert!(matches!(wait_for_error(&subscription).await, DatabaseError::Closed));

        let snapshot = subscription.poll().unwrap();
        assert_eq!(snapshot.path, path);
        assert_eq!(
            snapshot.value,
            json!({
                "08:00": {"temperature": 19, "humidity": 50},
                "09:00": {"temperature": 21, "humidity": 55}
            })
        );
        assert!(subscription.poll().is_none());

        let head = request.await.unwrap();
        assert!(head.starts_with("GET /data/2025/03/05.json HTTP/1.1"));
        assert!(head.to_ascii_lowercase().contains("accept: text/event-stream"));
    }

    #[tokio::test]
    async fn test_stream_cancel_records_error() {
        const RESPONSE: &str = concat!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n",
            "event: put\n",
            "data: {\"path\":\"/\",\"data\":21.5}\n\n",
            "event: cancel\n",
            "data: \"Permission denied\"\n\n",
        );
        let (url, _request) = serve_once(RESPONSE).await;
        let db = local_db(&url);
        let mut subscription = db.subscribe(&DbPath::parse("realtime/temperature"));

        let err = wait_for_error(&subscription).await;
        assert!(matches!(err, DatabaseError::Cancelled(ref reason) if reason == "Permission denied"));
        assert_eq!(subscription.poll().unwrap().value, json!(21.5));
    }

    #[tokio::test]
    async fn test_stream_auth_revoked_records_error() {
        const RESPONSE: &str = concat!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n",
            "event: auth_revoked\n",
            "data: \"credential is no longer valid\"\n\n",
        );
        let (url, _request) = serve_once(RESPONSE).await;
        let db = local_db(&url);
        let mut subscription = db.subscribe(&DbPath::parse("realtime/humidity"));

        assert!(matches!(wait_for_error(&subscription).await, DatabaseError::AuthRevoked));
        assert!(subscription.poll().is_none());
    }

    #[tokio::test]
    async fn test_stream_error_status_is_http_error() {
        let (url, _request) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let db = local_db(&url);
        let subscription = db.subscribe(&DbPath::parse("realtime/temperature"));

        let err = wait_for_error(&subscription).await;
        assert!(matches!(err, DatabaseError::Http(ref msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_stream_sends_encoded_auth_query() {
        let (url, request) = serve_once(EVENT_STREAM_HEAD).await;
        let db = local_builder(&url).auth_token("a&b=c").build().unwrap();
        let subscription = db.subscribe(&DbPath::parse("realtime/temperature"));

        let head = request.await.unwrap();
        assert!(head.starts_with("GET /realtime/temperature.json?auth=a%26b%3Dc HTTP/1.1"));
        assert!(matches!(wait_for_error(&subscription).await, DatabaseError::Closed));
    }
}
