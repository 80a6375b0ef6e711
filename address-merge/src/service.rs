use crate::config::Config;
use crate::errors::{AddressMergeError, EnvelopeError};
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS};
use crate::processor;
use crate::protocol::{ErrorBody, HandlerBody, json_response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::header::{ALLOW, HeaderValue};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Serves the address merge skill on a single `POST` path.
pub struct AddressMergeService {
    path: Arc<str>,
    max_body_bytes: usize,
}

impl AddressMergeService {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.path.as_str().into(),
            max_body_bytes: config.max_body_bytes,
        }
    }
}

impl Service<Request<Incoming>> for AddressMergeService {
    type Response = Response<HandlerBody>;
    type Error = AddressMergeError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let path = self.path.clone();
        let max_body_bytes = self.max_body_bytes;

        Box::pin(async move {
            let start = Instant::now();
            let response = handle(&path, max_body_bytes, req).await?;

            let status = response.status().as_u16().to_string();
            shared::counter!(REQUESTS, "status" => status.clone()).increment(1);
            shared::histogram!(REQUEST_DURATION, "status" => status)
                .record(start.elapsed().as_secs_f64());

            Ok(response)
        })
    }
}

async fn handle<B>(
    path: &str,
    max_body_bytes: usize,
    req: Request<B>,
) -> Result<Response<HandlerBody>, AddressMergeError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if req.uri().path() != path {
        return error_response(StatusCode::NOT_FOUND);
    }

    if req.method() != Method::POST {
        let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED)?;
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("POST"));
        return Ok(response);
    }

    let body = match Limited::new(req.into_body(), max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::warn!(limit = max_body_bytes, "Request body too large");
            return error_response(StatusCode::PAYLOAD_TOO_LARGE);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read request body");
            let error = EnvelopeError::MalformedRequest;
            return json_response(StatusCode::BAD_REQUEST, &ErrorBody::from(&error));
        }
    };

    match processor::process(&body) {
        Ok(envelope) => json_response(StatusCode::OK, &envelope),
        Err(e) => json_response(StatusCode::BAD_REQUEST, &ErrorBody::from(&e)),
    }
}

/// `{"error": <canonical reason>}` for failures outside the skill protocol.
fn error_response(status: StatusCode) -> Result<Response<HandlerBody>, AddressMergeError> {
    json_response(status, &ErrorBody::from(status))
}
