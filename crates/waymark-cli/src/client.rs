//! Client for connecting to an application's bridge socket.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::time::timeout;
use tracing::debug;

use waymark_core::bridge::paths;
use waymark_core::protocol::{Request, Response};

/// Default time to wait for a single response.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one application's bridge.
#[derive(Debug)]
pub struct BridgeClient {
    stream: UnixStream,
}

impl BridgeClient {
    /// Connect to the bridge of the given app (default app when `None`).
    ///
    /// There is nothing to auto-start: the bridge lives inside the target
    /// application, so a missing socket means the app isn't running (or
    /// isn't serving waymark).
    pub async fn connect(app: Option<&str>) -> Result<Self> {
        let socket_path = paths::get_socket_path(app);
        Self::connect_to(&socket_path).await
    }

    /// Connect to an explicit socket path.
    pub async fn connect_to(socket_path: &Path) -> Result<Self> {
        match UnixStream::connect(socket_path).await {
            Ok(stream) => {
                debug!("Connected to bridge at {:?}", socket_path);
                Ok(Self { stream })
            }
            Err(e) => bail!(
                "Cannot reach bridge at {:?}: {}. Is the application running with its \
                 waymark bridge enabled? (set WAYMARK_APP or pass --app to pick a \
                 different application)",
                socket_path,
                e
            ),
        }
    }

    /// Send a request and wait for its response.
    pub async fn request(&mut self, request: Request) -> Result<Response> {
        self.request_with_timeout(request, REQUEST_TIMEOUT).await
    }

    /// Send a request with a custom response deadline.
    ///
    /// Wait commands block server-side until the element appears, so their
    /// deadline must exceed the wait budget itself.
    pub async fn request_with_timeout(
        &mut self,
        request: Request,
        timeout_duration: Duration,
    ) -> Result<Response> {
        let request_json = serde_json::to_string(&request).context("Failed to serialize request")?;
        debug!("Sending: {}", request_json);

        self.stream
            .write_all(request_json.as_bytes())
            .await
            .context("Failed to write request")?;
        self.stream
            .write_all(b"\n")
            .await
            .context("Failed to write newline")?;
        self.stream.flush().await.context("Failed to flush")?;

        let (reader, _writer) = self.stream.split();
        let mut reader = BufReader::new(reader);
        let mut response_line = String::new();

        let bytes_read = timeout(timeout_duration, reader.read_line(&mut response_line))
            .await
            .context("Request timed out")?
            .context("Failed to read response")?;

        if bytes_read == 0 {
            bail!("Bridge closed connection unexpectedly");
        }

        debug!("Received: {}", response_line.trim());

        let response: Response =
            serde_json::from_str(&response_line).context("Failed to parse response")?;
        Ok(response)
    }
}
