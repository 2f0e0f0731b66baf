use std::{
    convert::Infallible,
    io,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use http_body_util::Full;
use hyper::{
    body::{self, Bytes},
    header::CONTENT_TYPE,
    server::conn::http1,
    service::service_fn,
    Method, Request, Response, StatusCode, Uri,
};
use hyper_util::rt::TokioIo;
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    sync::watch,
    time::Instant,
};
use tracing::{debug, error, info, warn};

use crate::{registry::handler_id, ContentBody, Error, Registry};

/// The port the mock responder listens on when run as a binary.
pub const DEFAULT_PORT: u16 = 45454;

/// Pause after a failed `accept` before trying again.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Source of inbound connections for the accept loop.
#[async_trait]
trait Accept: Send + Sync + 'static {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
}

#[async_trait]
impl Accept for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}

/// Listens on a TCP port, dispatching each GET request to the handler in the
/// [Registry] named after the request path and answering with its JSON
/// result.
///
/// See the crate documentation for an example.
#[derive(Debug, Clone)]
pub struct Server {
    close_tx: Arc<watch::Sender<u8>>,
    addr: SocketAddr,
    req_count: Arc<Mutex<u64>>,
}

impl Server {
    /// Creates a new server on a random localhost port. Intended for tests
    /// that need their own responder.
    pub async fn new(registry: Registry) -> Result<Self, Error> {
        Self::bind(([127, 0, 0, 1], 0).into(), registry).await
    }

    /// Starts answering requests from `registry` on `addr`. Every accepted
    /// connection gets its own task; handlers never share state through the
    /// server, so concurrent clients all see their own responses.
    ///
    /// Clones share the same listener. Dropping the last clone shuts the
    /// responder down in the background, cutting off any connections that
    /// are still open.
    pub async fn bind(addr: SocketAddr, registry: Registry) -> Result<Self, Error> {
        let tcp_listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Listen { addr, source })?;
        let addr = tcp_listener.local_addr().map_err(Error::ListenerAddr)?;

        Ok(Self::serve(tcp_listener, addr, registry))
    }

    fn serve<L: Accept>(listener: L, addr: SocketAddr, registry: Registry) -> Self {
        let (close_tx, close_rx) = watch::channel::<u8>(0);
        let req_count = Arc::new(Mutex::new(0));

        {
            let registry = Arc::new(registry);
            let req_count = req_count.clone();

            tokio::spawn(async move {
                let mut close_rx = close_rx.clone();

                loop {
                    let res = select! {
                        _ = close_rx.changed() => {
                            debug!(%addr, "listener closed");
                            return;
                        }
                        res = listener.accept() => res,
                    };
                    let (tcp_stream, peer) = match res {
                        Ok(res) => res,
                        Err(err) => {
                            // EMFILE, ECONNABORTED and friends clear up on their own.
                            warn!(%addr, %err, "error while accepting TCP connection");
                            tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                            continue;
                        }
                    };

                    let registry = registry.clone();
                    let mut close_rx = close_rx.clone();
                    let req_count = req_count.clone();
                    tokio::spawn(async move {
                        let registry = &registry;
                        let req_count = &req_count;

                        let service = service_fn(|req: Request<body::Incoming>| async move {
                            let res = respond(registry, req).await;
                            *req_count.lock().expect("lock poisoned") += 1;
                            res
                        });

                        let res = select! {
                            _ = close_rx.changed() => {
                                return;
                            }
                            res = http1::Builder::new()
                                .keep_alive(true)
                                .serve_connection(TokioIo::new(tcp_stream), service) => res,
                        };

                        if let Err(http_err) = res {
                            error!(%peer, err = %http_err, "error while serving HTTP connection");
                        }
                    });
                }
            });
        };

        Self {
            close_tx: Arc::new(close_tx),
            addr,
            req_count,
        }
    }

    /// The bound listener address. When created with [Server::new] this is
    /// where the random port shows up.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Builds an `http://` URI pointing at this responder, e.g.
    /// `server.url("/api/user/token")`.
    pub fn url(&self, path_and_query: &str) -> Uri {
        Uri::builder()
            .scheme("http")
            .authority(self.addr.to_string().as_str())
            .path_and_query(path_and_query)
            .build()
            .expect("should be a valid URL")
    }

    /// Returns the number of requests answered by the server, whether they
    /// succeeded or not. This value is incremented after the response has
    /// been built, but before it has been sent.
    pub fn req_count(&self) -> u64 {
        *self.req_count.lock().expect("lock poisoned")
    }

    /// Waits until exactly `target_count` requests have been answered,
    /// checking every 10ms. Gives up with [Error::RequestCountTimeout] once
    /// `timeout` has passed.
    pub async fn await_req_count(
        &self,
        target_count: u64,
        timeout: Duration,
    ) -> Result<(), Error> {
        let start = Instant::now();
        loop {
            let current_count = self.req_count();
            if current_count == target_count {
                return Ok(());
            }

            if start.elapsed() > timeout {
                return Err(Error::RequestCountTimeout {
                    current_count,
                    target_count,
                    timeout,
                });
            }

            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Stops the responder: the listener is released and open connections
    /// are dropped mid-request. Returns immediately.
    pub fn close(&self) {
        // Fails only once every receiver is gone, i.e. the server already stopped.
        let _ = self.close_tx.send(1);
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        // Other clones keep the responder alive.
        if Arc::strong_count(&self.close_tx) == 1 {
            self.close();
        }
    }
}

/// The request-target as sent on the request line, query string included.
fn request_target(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|target| target.as_str())
        .unwrap_or_else(|| uri.path())
        .to_string()
}

async fn respond(
    registry: &Registry,
    req: Request<body::Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let target = request_target(req.uri());
    debug!(%method, path = %target, "handling request");

    let resp = match dispatch(registry, req).await {
        Ok(resp) => resp,
        Err(Error::UnsupportedMethod(_)) => {
            plain_response(StatusCode::NOT_IMPLEMENTED, "Unsupported method")
        }
        Err(err) => {
            error!(%method, path = %target, %err, "error while handling request");
            plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    };

    info!(
        %method,
        path = %target,
        status = resp.status().as_u16(),
        "answered request"
    );
    Ok(resp)
}

async fn dispatch(
    registry: &Registry,
    req: Request<body::Incoming>,
) -> Result<Response<Full<Bytes>>, Error> {
    if req.method() != Method::GET {
        return Err(Error::UnsupportedMethod(req.method().clone()));
    }

    let target = request_target(req.uri());
    let body = req.content_body().await?;

    let handler = registry.resolve(&target)?;
    let value = handler.handle(body).await.map_err(|cause| Error::Handler {
        id: handler_id(&target),
        cause,
    })?;
    let encoded = serde_json::to_vec(&value).map_err(Error::EncodeResponse)?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(encoded)))
        .expect("should be a valid response"))
}

fn plain_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .expect("should be a valid response")
}
