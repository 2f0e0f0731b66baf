use std::{io, net::SocketAddr, time::Duration};

use hyper::Method;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("listen on {addr}: {source}")]
    Listen { addr: SocketAddr, source: io::Error },
    #[error("read bound listener address: {0}")]
    ListenerAddr(io::Error),
    #[error("expected {target_count} answered requests within {timeout:?}, saw {current_count}")]
    RequestCountTimeout {
        current_count: u64,
        target_count: u64,
        timeout: Duration,
    },
    #[error("unsupported method ({0})")]
    UnsupportedMethod(Method),
    #[error("no handler registered for {id:?}")]
    HandlerNotFound { id: String },
    #[error("invalid Content-Length header: {value:?}")]
    InvalidContentLength { value: String },
    #[error("read request body: {0}")]
    ReadBody(Box<dyn std::error::Error + Send + Sync>),
    #[error("request body was {actual} bytes but Content-Length declared {expected}")]
    BodyLengthMismatch { expected: usize, actual: usize },
    #[error("handler {id:?} failed: {cause:#}")]
    Handler { id: String, cause: anyhow::Error },
    #[error("encode JSON response: {0}")]
    EncodeResponse(serde_json::Error),
}
