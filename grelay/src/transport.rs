//! Transport trait and reqwest-based streaming HTTP implementation.

use std::future::Future;
use std::pin::Pin;

use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};

use crate::wire::{build_api_request, extract_error_message};
use crate::{RelayConfig, RelayError, RelayRequest};

pub type RelayFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Raw response body bytes as they arrive off the wire, with no event
/// framing applied.
pub type BodyByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, RelayError>> + Send>>;

/// Opens one streaming completion request against the upstream provider.
///
/// Implementations either reject before any byte is produced or hand back
/// the live body stream; they never buffer the response.
pub trait CompletionTransport: Send + Sync + std::fmt::Debug {
    fn open<'a>(
        &'a self,
        request: RelayRequest,
    ) -> RelayFuture<'a, Result<BodyByteStream, RelayError>>;
}

#[derive(Debug)]
pub struct HttpCompletionTransport {
    client: Client,
    config: RelayConfig,
}

impl HttpCompletionTransport {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url())
    }

    async fn parse_error(response: Response) -> RelayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify_rejection(status, &body)
    }
}

/// Maps a connect-time rejection to an error kind, surfacing the provider's
/// own error body as the message.
pub(crate) fn classify_rejection(status: StatusCode, body: &str) -> RelayError {
    let message = extract_error_message(body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            format!("upstream request failed with status {status}")
        } else {
            body.to_string()
        }
    });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RelayError::authentication(message),
        StatusCode::TOO_MANY_REQUESTS => RelayError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RelayError::timeout(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            RelayError::invalid_request(message)
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            RelayError::unavailable(message)
        }
        _ => RelayError::upstream_rejected(message),
    }
}

impl CompletionTransport for HttpCompletionTransport {
    fn open<'a>(
        &'a self,
        request: RelayRequest,
    ) -> RelayFuture<'a, Result<BodyByteStream, RelayError>> {
        Box::pin(async move {
            let api_request = build_api_request(&request);
            let response = self
                .client
                .post(self.endpoint())
                .bearer_auth(self.config.api_key().expose())
                .json(&api_request)
                .send()
                .await
                .map_err(|err| {
                    if err.is_timeout() {
                        RelayError::timeout(err.to_string())
                    } else {
                        RelayError::upstream_rejected(err.to_string())
                    }
                })?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            let bytes = response.bytes_stream().map(|item| {
                item.map(|chunk| chunk.to_vec())
                    .map_err(|err| RelayError::stream(err.to_string()))
            });

            Ok(Box::pin(bytes) as BodyByteStream)
        })
    }
}
