//! HTTP listener exposing the `/update` endpoint

use crate::command::UpdateHandler;
use anyhow::Result;
use salt_update_shared::codec::{self, CodecError, Request, RequestDecoder, Response, Status};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Path of the only route
pub const UPDATE_PATH: &str = "/update";

/// Methods accepted on the update route
const ALLOWED_METHODS: &str = "GET, POST";

/// Time a client has to deliver a complete request. Command execution
/// afterwards is not bounded.
pub const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Accepts connections and serves one request per connection
pub struct HttpServer {
    listener: TcpListener,
    handler: UpdateHandler,
}

impl HttpServer {
    /// Bind the listener
    pub async fn bind(addr: &str, handler: UpdateHandler) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, handler })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves.
    ///
    /// Each connection runs in its own task. Requests are independent:
    /// overlapping requests each run the full command list.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Listening on {}", self.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("Accept error: {}", e);
                            continue;
                        }
                    };
                    debug!("Connection from: {}", addr);

                    let handler = self.handler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, &handler).await {
                            warn!("Connection error from {}: {}", addr, e);
                        }
                    });
                }
            }
        }
    }
}

/// What the client sent before the connection was answered
enum ReadOutcome {
    Request(Request),
    Invalid(CodecError),
    Closed { buffered: usize },
}

/// Read one request, answer it, and close the connection
async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    handler: &UpdateHandler,
) -> Result<()> {
    let response = match timeout(REQUEST_READ_TIMEOUT, read_request(&mut stream)).await {
        Ok(outcome) => match outcome? {
            ReadOutcome::Request(request) => {
                info!(
                    "{} {} from {} ({})",
                    request.method,
                    request.target,
                    addr,
                    request.header("user-agent").unwrap_or("-")
                );
                route(&request, handler).await
            }
            ReadOutcome::Invalid(e) => {
                warn!("Bad request from {}: {}", addr, e);
                Response::text(Status::BadRequest, format!("Bad Request: {}", e))
            }
            ReadOutcome::Closed { buffered } => {
                debug!(
                    "Client {} disconnected before sending a full request ({} bytes buffered)",
                    addr, buffered
                );
                return Ok(());
            }
        },
        Err(_) => {
            warn!(
                "Client {} did not send a full request within {:?}",
                addr, REQUEST_READ_TIMEOUT
            );
            Response::text(Status::RequestTimeout, "Request Timeout")
        }
    };

    stream.write_all(&codec::encode(&response)).await?;
    stream.shutdown().await?;
    Ok(())
}

async fn read_request(stream: &mut TcpStream) -> Result<ReadOutcome> {
    let mut decoder = RequestDecoder::new();
    let mut buf = vec![0u8; 4096];

    loop {
        match decoder.decode_next() {
            Ok(Some(request)) => return Ok(ReadOutcome::Request(request)),
            Ok(None) => {}
            Err(e) => return Ok(ReadOutcome::Invalid(e)),
        }

        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(ReadOutcome::Closed {
                buffered: decoder.buffer_len(),
            });
        }
        decoder.extend(&buf[..n]);
    }
}

/// Map a request to its response
pub async fn route(request: &Request, handler: &UpdateHandler) -> Response {
    if request.path() != UPDATE_PATH {
        return Response::text(Status::NotFound, "Not Found");
    }

    match request.method.as_str() {
        "GET" | "POST" => {
            let report = handler.handle().await;
            // Command failures are reported in the body only
            Response::text(Status::Ok, report.body())
        }
        _ => Response::text(Status::MethodNotAllowed, "Method Not Allowed")
            .with_header("Allow", ALLOWED_METHODS),
    }
}
