//! A mock HTTP responder for client test fixtures. It answers GET requests by
//! dispatching on the URL path to a handler in a fixed [Registry] and writing
//! the handler's result back as JSON.
//!
//! The path is turned into a handler identifier by stripping leading and
//! trailing slashes and replacing the rest with underscores, so
//! `GET /api/user/token` is answered by the `api_user_token` handler. Paths
//! without a handler, and handlers that fail, are answered with a 500.
//!
//! Currently only supports HTTP/1.1 and does not support TLS. Only supports the
//! Tokio async runtime.
//!
//! ## Example
//!
//! ```
//! use mock_responder::{json_ok, hyper::body::Bytes, Registry, Server, TOKEN};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut registry = Registry::with_defaults();
//! registry.route("/api/part/category/", |_: Option<Bytes>| async move {
//!     json_ok(vec!["Resistors", "Capacitors"])
//! });
//! let server = Server::new(registry).await.expect("create server");
//!
//! let client = reqwest::Client::new();
//! let res = client
//!     .get(server.url("/api/user/token").to_string())
//!     .send()
//!     .await
//!     .expect("send request");
//!
//! assert_eq!(res.status(), 200);
//! assert_eq!(
//!     res.text().await.expect("read response"),
//!     format!("{{\"token\":\"{}\"}}", TOKEN)
//! );
//!
//! assert_eq!(server.req_count(), 1);
//! # });
//! ```
//!
//! The `mock-responder` binary serves [Registry::with_defaults] on
//! `0.0.0.0:45454` until interrupted.

mod body;
mod error;
mod handler;
pub mod handlers;
mod logging;
mod registry;
mod server;

pub use body::*;
pub use error::*;
pub use handler::*;
pub use handlers::{TokenResponse, TOKEN};
pub use logging::*;
pub use registry::*;
pub use server::*;

pub use hyper;
