use std::future::Future;

use async_trait::async_trait;
use hyper::body::Bytes;
use serde::Serialize;
use serde_json::Value;

/// A handler that can be registered in a [Registry](crate::Registry). The
/// handler receives the request body (if the request carried a
/// `Content-Length` header) and returns the value to encode as the JSON
/// response body. If the handler returns an error, the error will be logged
/// and a 500 response will be returned to the client.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, body: Option<Bytes>) -> Result<Value, anyhow::Error>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Option<Bytes>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, anyhow::Error>> + Send + 'static,
{
    async fn handle(&self, body: Option<Bytes>) -> Result<Value, anyhow::Error> {
        self(body).await
    }
}

/// Converts any serializable value into a handler result.
///
/// Useful for closures where you can't specify the return type and want to
/// return a plain struct or map.
pub fn json_ok<T: Serialize>(val: T) -> Result<Value, anyhow::Error> {
    Ok(serde_json::to_value(val)?)
}
