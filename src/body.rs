use async_trait::async_trait;
use http_body_util::BodyExt;
use hyper::{
    body::{Body, Bytes},
    header::CONTENT_LENGTH,
    Request,
};

use crate::Error;

/// An extension to [hyper::Request](hyper::Request) that reads the request
/// body as directed by its `Content-Length` header.
#[async_trait]
pub trait ContentBody {
    /// Returns `None` if the request has no `Content-Length` header (or an
    /// empty one). Otherwise reads the body and checks that it is exactly as
    /// long as the header says.
    async fn content_body(self) -> Result<Option<Bytes>, Error>;
}

#[async_trait]
impl<B> ContentBody for Request<B>
where
    B: Body<Data = Bytes> + Send + 'static,
    <B as Body>::Error: std::error::Error + Send + Sync + 'static,
{
    async fn content_body(self) -> Result<Option<Bytes>, Error> {
        let expected = match self.headers().get(CONTENT_LENGTH) {
            None => return Ok(None),
            Some(value) => {
                let value = value.to_str().map_err(|_| Error::InvalidContentLength {
                    value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
                })?;
                let value = value.trim();
                if value.is_empty() {
                    return Ok(None);
                }
                value
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidContentLength {
                        value: value.to_string(),
                    })?
            }
        };

        let body = self
            .into_body()
            .collect()
            .await
            .map_err(|err| Error::ReadBody(Box::new(err)))?
            .to_bytes();
        if body.len() != expected {
            return Err(Error::BodyLengthMismatch {
                expected,
                actual: body.len(),
            });
        }

        Ok(Some(body))
    }
}
