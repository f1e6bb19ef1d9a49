//! Unix socket server exposing the facade to agents.
//!
//! One JSON request per line in, one JSON response per line out. The server
//! is owned by the embedding application and serves that application's
//! facade. There is no daemon lifecycle to manage: when the app exits, the
//! socket goes with it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::bridge::paths;
use crate::facade::Automation;
use crate::geometry::{Point, Rect};
use crate::protocol::{Command, Request, Response, ResponseData, WireError};

/// Maximum concurrent agent connections.
const MAX_CONNECTIONS: usize = 64;

/// Maximum request size in bytes; one line should never come close.
const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Default wait budget when an agent omits `timeout_ms`.
const DEFAULT_WAIT_MS: u64 = 30_000;

/// How long to wait for in-flight connections during shutdown.
const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Bridge server bound to a per-app Unix socket.
pub struct AutomationServer {
    listener: UnixListener,
    socket_path: PathBuf,
    facade: Automation,
    connection_semaphore: Arc<Semaphore>,
    shutdown: Arc<Notify>,
}

impl AutomationServer {
    /// Bind to the default per-app socket path.
    pub async fn bind(facade: Automation) -> io::Result<Self> {
        paths::ensure_socket_dir()?;
        Self::bind_to(paths::get_socket_path(None), facade).await
    }

    /// Bind to an explicit socket path.
    ///
    /// If the path is already bound, a connect probe decides whether a live
    /// server owns it (error) or it is a stale socket from a crashed
    /// process (remove and rebind).
    pub async fn bind_to(socket_path: PathBuf, facade: Automation) -> io::Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = match UnixListener::bind(&socket_path) {
            Ok(l) => l,
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                if UnixStream::connect(&socket_path).await.is_ok() {
                    return Err(io::Error::new(
                        io::ErrorKind::AddrInUse,
                        format!("another bridge is already serving {:?}", socket_path),
                    ));
                }
                remove_stale_socket(&socket_path)?;
                UnixListener::bind(&socket_path)?
            }
            Err(e) => return Err(e),
        };

        info!("Bridge listening on {:?}", socket_path);

        Ok(Self {
            listener,
            socket_path,
            facade,
            connection_semaphore: Arc::new(Semaphore::new(MAX_CONNECTIONS)),
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// The socket path this server is bound to.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Signal the accept loop to stop; `run` then drains in-flight
    /// connections and returns.
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }

    /// Accept and serve connections until shutdown is signaled.
    ///
    /// Each connection gets its own task, bounded by the connection
    /// semaphore; excess connections are refused outright rather than
    /// queued, so a stuck agent cannot starve the rest.
    pub async fn run(&self) -> io::Result<()> {
        let mut connection_tasks: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, _addr)) => {
                            let permit = match self.connection_semaphore.clone().try_acquire_owned() {
                                Ok(permit) => permit,
                                Err(_) => {
                                    warn!(
                                        "Connection limit ({}) reached, rejecting new connection",
                                        MAX_CONNECTIONS
                                    );
                                    drop(stream);
                                    continue;
                                }
                            };

                            debug!("Agent connected");
                            let facade = self.facade.clone();
                            connection_tasks.spawn(async move {
                                let _permit = permit;
                                if let Err(e) = handle_connection(stream, facade).await {
                                    error!("Connection error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                Some(_) = connection_tasks.join_next(), if !connection_tasks.is_empty() => {
                    // Reap finished handlers; errors were logged in the task.
                }
                _ = self.shutdown.notified() => {
                    info!("Shutdown signaled, draining in-flight connections");
                    break;
                }
            }
        }

        if !connection_tasks.is_empty() {
            let drained = tokio::time::timeout(GRACEFUL_SHUTDOWN_TIMEOUT, async {
                while connection_tasks.join_next().await.is_some() {}
            })
            .await;
            if drained.is_err() {
                warn!(
                    "Graceful shutdown timed out after {:?}, aborting {} connection(s)",
                    GRACEFUL_SHUTDOWN_TIMEOUT,
                    connection_tasks.len()
                );
                connection_tasks.abort_all();
            }
        }

        Ok(())
    }
}

impl Drop for AutomationServer {
    fn drop(&mut self) {
        if self.socket_path.exists() && std::fs::remove_file(&self.socket_path).is_err() {
            warn!("Failed to remove socket on shutdown");
        }
    }
}

/// Remove a socket file left behind by a dead process.
///
/// Refuses symlinks and non-socket files: the path is derived from env
/// configuration, so never delete anything we didn't plausibly create.
fn remove_stale_socket(socket_path: &Path) -> io::Result<()> {
    let metadata = std::fs::symlink_metadata(socket_path)?;

    if metadata.file_type().is_symlink() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("socket path {:?} is a symlink, refusing to delete", socket_path),
        ));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if !metadata.file_type().is_socket() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path {:?} exists but is not a socket file", socket_path),
            ));
        }
    }

    info!("Removing stale socket from dead process");
    std::fs::remove_file(socket_path)
}

/// Read a line with a size limit, so a malformed agent cannot balloon
/// memory. Returns bytes read (0 means EOF).
async fn read_line_bounded<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut String,
    max_size: usize,
) -> io::Result<usize> {
    let mut raw = Vec::new();

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            break;
        }

        let newline = available.iter().position(|&b| b == b'\n');
        let take = newline.map_or(available.len(), |p| p + 1);

        if raw.len() + take > max_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("request exceeds {max_size} byte limit"),
            ));
        }

        raw.extend_from_slice(&available[..take]);
        reader.consume(take);

        if newline.is_some() {
            break;
        }
    }

    let text = std::str::from_utf8(&raw)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "request is not valid UTF-8"))?;
    buf.push_str(text);
    Ok(raw.len())
}

/// Serve one agent connection until it disconnects.
async fn handle_connection(stream: UnixStream, facade: Automation) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = read_line_bounded(&mut reader, &mut line, MAX_REQUEST_SIZE).await?;
        if bytes_read == 0 {
            debug!("Agent disconnected");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(trimmed) {
            Ok(request) => handle_request(request, &facade).await,
            Err(e) => Response::error(
                "unknown",
                WireError::invalid_request(format!("Invalid JSON request: {}", e)),
            ),
        };

        let response_json = serde_json::to_string(&response).map_err(io::Error::other)?;
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Execute one request against the facade.
///
/// `ElementNotFound` and `Timeout` outcomes are successful responses
/// carrying the outcome payload, since they are ordinary control flow for
/// agents. `error` is reserved for malformed requests and invalid patterns.
async fn handle_request(request: Request, facade: &Automation) -> Response {
    debug!("Handling command: {:?}", request.command);

    match request.command {
        Command::Elements => Response::success(
            request.id,
            ResponseData::Elements {
                elements: facade.all_elements(),
            },
        ),

        Command::Find { pattern } => match facade.try_find_elements(&pattern) {
            Ok(identifiers) => {
                Response::success(request.id, ResponseData::Identifiers { identifiers })
            }
            Err(err) => Response::error(request.id, WireError::from(&err)),
        },

        Command::InRegion {
            x,
            y,
            width,
            height,
        } => Response::success(
            request.id,
            ResponseData::Elements {
                elements: facade.registry().in_region(Rect::new(x, y, width, height)),
            },
        ),

        Command::Tap { identifier } => Response::success(
            request.id,
            ResponseData::Outcome {
                outcome: facade.tap_element(&identifier),
            },
        ),

        Command::TypeText { identifier, text } => Response::success(
            request.id,
            ResponseData::Outcome {
                outcome: facade.type_text(&identifier, &text),
            },
        ),

        Command::Swipe {
            from_x,
            from_y,
            to_x,
            to_y,
        } => Response::success(
            request.id,
            ResponseData::Outcome {
                outcome: facade.swipe(Point::new(from_x, from_y), Point::new(to_x, to_y)),
            },
        ),

        Command::WaitFor {
            identifier,
            timeout_ms,
        } => {
            let timeout = Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_WAIT_MS));
            let outcome = facade.wait_for_element(&identifier, timeout).await;
            Response::success(request.id, ResponseData::Outcome { outcome })
        }

        Command::Context => Response::success(
            request.id,
            ResponseData::Context {
                view: facade.current_context(),
            },
        ),

        Command::Snapshot => Response::success(
            request.id,
            ResponseData::Snapshot {
                snapshot: facade.snapshot(),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tokio::io::AsyncBufReadExt;

    use super::*;
    use crate::facade::ActionOutcome;
    use crate::registry::ElementRegistry;

    fn test_facade() -> Automation {
        let registry = Arc::new(ElementRegistry::new());
        registry
            .upsert(
                "button_primary_save",
                Rect::new(10.0, 20.0, 100.0, 50.0),
                HashMap::new(),
            )
            .unwrap();
        registry
            .upsert(
                "textfield_email",
                Rect::new(10.0, 100.0, 200.0, 30.0),
                HashMap::new(),
            )
            .unwrap();
        Automation::new(registry)
    }

    #[tokio::test]
    async fn missing_element_is_a_successful_response_with_outcome() {
        let request = Request {
            id: "t1".into(),
            command: Command::Tap {
                identifier: "missing_id".into(),
            },
        };
        let response = handle_request(request, &test_facade()).await;
        assert!(response.success);
        assert_eq!(
            response.data,
            Some(ResponseData::Outcome {
                outcome: ActionOutcome::ElementNotFound {
                    identifier: "missing_id".into()
                }
            })
        );
    }

    #[tokio::test]
    async fn invalid_pattern_is_a_protocol_error() {
        let request = Request {
            id: "t2".into(),
            command: Command::Find {
                pattern: "button_(".into(),
            },
        };
        let response = handle_request(request, &test_facade()).await;
        assert!(!response.success);
        assert_eq!(
            response.error.map(|e| e.kind),
            Some("pattern_error".to_string())
        );
    }

    #[tokio::test]
    async fn in_region_dispatches_to_query() {
        let request = Request {
            id: "t3".into(),
            command: Command::InRegion {
                x: 0.0,
                y: 0.0,
                width: 150.0,
                height: 80.0,
            },
        };
        let response = handle_request(request, &test_facade()).await;
        match response.data {
            Some(ResponseData::Elements { elements }) => {
                assert_eq!(elements.len(), 1);
                assert_eq!(elements[0].identifier, "button_primary_save");
            }
            other => panic!("Expected Elements, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn serves_json_lines_over_a_socket() {
        let socket_path = std::env::temp_dir().join(format!(
            "waymark-server-test-{}.sock",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&socket_path);

        let server = AutomationServer::bind_to(socket_path.clone(), test_facade())
            .await
            .expect("Failed to bind server");
        let server_handle = tokio::spawn(async move {
            let _ = tokio::time::timeout(Duration::from_secs(2), server.run()).await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let stream = UnixStream::connect(&socket_path)
            .await
            .expect("Failed to connect");
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        // Well-formed request.
        writer
            .write_all(b"{\"id\":\"s1\",\"command\":{\"action\":\"find\",\"pattern\":\"button_.*\"}}\n")
            .await
            .unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        let response: Response = serde_json::from_str(&line).unwrap();
        assert!(response.success);
        assert_eq!(
            response.data,
            Some(ResponseData::Identifiers {
                identifiers: vec!["button_primary_save".into()]
            })
        );

        // Malformed JSON gets an error response, not a dropped connection.
        writer.write_all(b"this is not json\n").await.unwrap();
        line.clear();
        reader.read_line(&mut line).await.unwrap();
        let response: Response = serde_json::from_str(&line).unwrap();
        assert!(!response.success);
        assert_eq!(
            response.error.map(|e| e.kind),
            Some("invalid_request".to_string())
        );

        server_handle.abort();
        let _ = std::fs::remove_file(&socket_path);
    }

    #[tokio::test]
    async fn oversized_request_closes_the_connection() {
        let socket_path = std::env::temp_dir().join(format!(
            "waymark-server-big-{}.sock",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&socket_path);

        let server = AutomationServer::bind_to(socket_path.clone(), test_facade())
            .await
            .expect("Failed to bind server");
        let server_handle = tokio::spawn(async move {
            let _ = tokio::time::timeout(Duration::from_secs(5), server.run()).await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut stream = UnixStream::connect(&socket_path).await.unwrap();
        let oversized = vec![b'x'; MAX_REQUEST_SIZE + 16];
        // The server may hang up mid-write; either way no response arrives.
        let _ = stream.write_all(&oversized).await;
        let _ = stream.write_all(b"\n").await;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let read = tokio::time::timeout(Duration::from_secs(2), reader.read_line(&mut line))
            .await
            .expect("server should close the connection");
        assert_eq!(read.unwrap_or(0), 0);

        server_handle.abort();
        let _ = std::fs::remove_file(&socket_path);
    }
}
