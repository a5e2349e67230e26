//! The streaming completion relay.
//!
//! One upstream request in; a live text stream and a deferred aggregate
//! out. The caller pipes the stream into its own response while the relay
//! reconstructs the full assistant text and token usage for persistence.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::sse::SseDecoder;
use crate::wire::{ApiStreamChunk, ApiUsage};
use crate::{
    CompletionResult, CompletionTransport, CompletionUsage, HttpCompletionTransport, RelayConfig,
    RelayError, RelayRequest,
};

/// Terminal sentinel the wire protocol emits instead of a normal event.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Live assistant text, one delta per item, in upstream order. Finite and
/// not restartable: once consumed or cancelled it cannot be replayed.
pub type TextChunkStream = Pin<Box<dyn Stream<Item = Result<String, RelayError>> + Send>>;

pub struct RelayHandle {
    pub stream: TextChunkStream,
    pub result: DeferredResult,
}

impl std::fmt::Debug for RelayHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayHandle").finish_non_exhaustive()
    }
}

/// Receiving end of the relay's one-shot completion channel.
///
/// The producing stream completes the channel on every path: terminal
/// sentinel, mid-stream error, or cancellation. If the caller drops the
/// output stream without consuming it to completion, `wait` reports a
/// cancellation instead of hanging.
pub struct DeferredResult {
    receiver: oneshot::Receiver<Result<CompletionResult, RelayError>>,
}

impl DeferredResult {
    pub async fn wait(self) -> Result<CompletionResult, RelayError> {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(RelayError::cancelled(
                "relay stream dropped before completion",
            )),
        }
    }
}

#[derive(Clone)]
pub struct StreamRelay {
    transport: Arc<dyn CompletionTransport>,
    provider: String,
}

impl StreamRelay {
    pub fn new(transport: Arc<dyn CompletionTransport>, provider: impl Into<String>) -> Self {
        Self {
            transport,
            provider: provider.into(),
        }
    }

    /// Builds a relay over the reqwest transport for `config`.
    pub fn over_http(config: RelayConfig) -> Self {
        let provider = config.provider_label().to_string();
        Self::new(Arc::new(HttpCompletionTransport::new(config)), provider)
    }

    /// Opens one streaming completion request.
    ///
    /// Rejects before producing any stream if the upstream refuses the
    /// connection or answers with a non-success status. Otherwise returns
    /// the live delta stream and the deferred aggregate; triggering
    /// `cancel` aborts the upstream connection, ends the stream without an
    /// error, and resolves the aggregate with the content received so far,
    /// marked estimated.
    pub async fn relay(
        &self,
        request: RelayRequest,
        cancel: CancellationToken,
    ) -> Result<RelayHandle, RelayError> {
        request.validate()?;

        let mut body = self.transport.open(request.clone()).await?;
        let (sender, receiver) = oneshot::channel();
        let mut state = RelayState::new(request, self.provider.clone());

        let stream = stream! {
            let mut decoder = SseDecoder::new();
            let mut sender = Some(sender);

            loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => {
                        // Dropping `body` aborts the upstream connection.
                        tracing::debug!("relay cancelled by caller, resolving partial aggregate");
                        complete(&mut sender, Ok(state.into_partial_result()));
                        return;
                    }
                    next = body.next() => next,
                };

                let chunk = match next {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(error)) => {
                        complete(&mut sender, Err(error.clone()));
                        yield Err(error);
                        return;
                    }
                    None => {
                        let error =
                            RelayError::stream("upstream closed before end of stream");
                        complete(&mut sender, Err(error.clone()));
                        yield Err(error);
                        return;
                    }
                };

                let payloads = match decoder.feed(&chunk) {
                    Ok(payloads) => payloads,
                    Err(error) => {
                        complete(&mut sender, Err(error.clone()));
                        yield Err(error);
                        return;
                    }
                };

                for payload in payloads {
                    if payload == DONE_SENTINEL {
                        complete(&mut sender, Ok(state.into_final_result()));
                        return;
                    }

                    let event: ApiStreamChunk = match serde_json::from_str(&payload) {
                        Ok(event) => event,
                        Err(error) => {
                            let error = RelayError::stream(error.to_string());
                            complete(&mut sender, Err(error.clone()));
                            yield Err(error);
                            return;
                        }
                    };

                    if let Some(model) = event.model {
                        state.record_model(model);
                    }

                    if let Some(usage) = event.usage {
                        state.record_usage(usage);
                    }

                    let delta = event
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.delta.content)
                        .filter(|delta| !delta.is_empty());
                    if let Some(delta) = delta {
                        // Accumulate before forwarding so the aggregate can
                        // never fall behind the stream.
                        state.push_delta(&delta);
                        yield Ok(delta);
                    }
                }
            }
        };

        Ok(RelayHandle {
            stream: Box::pin(stream),
            result: DeferredResult { receiver },
        })
    }
}

fn complete(
    sender: &mut Option<oneshot::Sender<Result<CompletionResult, RelayError>>>,
    outcome: Result<CompletionResult, RelayError>,
) {
    if let Some(sender) = sender.take() {
        let _ = sender.send(outcome);
    }
}

/// Aggregation state for one relay, owned by the stream task.
struct RelayState {
    request: RelayRequest,
    provider: String,
    served_model: String,
    content: String,
    usage: Option<ApiUsage>,
}

impl RelayState {
    fn new(request: RelayRequest, provider: String) -> Self {
        let served_model = request.model.clone();
        Self {
            request,
            provider,
            served_model,
            content: String::new(),
            usage: None,
        }
    }

    fn push_delta(&mut self, delta: &str) {
        self.content.push_str(delta);
    }

    /// Providers may silently substitute a model; the served one goes into
    /// the final usage record.
    fn record_model(&mut self, model: String) {
        if model != self.served_model {
            tracing::debug!(requested = %self.served_model, served = %model, "upstream substituted model");
        }

        self.served_model = model;
    }

    // Last-write-wins; providers emit usage before or after the final text.
    fn record_usage(&mut self, usage: ApiUsage) {
        self.usage = Some(usage);
    }

    fn into_final_result(mut self) -> CompletionResult {
        match self.usage.take() {
            Some(usage) => CompletionResult {
                usage: CompletionUsage {
                    prompt_tokens: usage.prompt_tokens,
                    completion_tokens: usage.completion_tokens,
                    total_tokens: usage.total_tokens,
                    model: self.served_model,
                    provider: self.provider,
                    estimated: false,
                },
                content: self.content,
            },
            None => {
                tracing::debug!("no in-band usage report, counting tokens locally");
                self.into_estimated_result(false)
            }
        }
    }

    /// Cancellation aggregate: content so far with locally counted usage.
    /// Any in-band usage record is discarded because it cannot describe the
    /// truncated content.
    fn into_partial_result(self) -> CompletionResult {
        self.into_estimated_result(true)
    }

    fn into_estimated_result(self, force_estimated: bool) -> CompletionResult {
        let prompt = gtokens::count_transcript(
            self.request
                .messages
                .iter()
                .map(|message| (message.role.as_str(), message.content.as_str())),
            &self.request.model,
        );
        let completion = gtokens::count_text(&self.content, &self.request.model);

        CompletionResult {
            usage: CompletionUsage {
                prompt_tokens: prompt.tokens,
                completion_tokens: completion.tokens,
                total_tokens: prompt.tokens + completion.tokens,
                model: self.served_model,
                provider: self.provider,
                estimated: force_estimated || prompt.estimated || completion.estimated,
            },
            content: self.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RelayErrorKind;
    use futures_util::stream;

    #[test]
    fn relay_handle_debug_does_not_expose_stream_state() {
        let (_sender, receiver) = oneshot::channel();
        let handle = RelayHandle {
            stream: Box::pin(stream::empty()),
            result: DeferredResult { receiver },
        };

        assert_eq!(format!("{handle:?}"), "RelayHandle { .. }");
    }

    #[tokio::test]
    async fn deferred_result_reports_cancellation_when_sender_is_dropped() {
        let (sender, receiver) = oneshot::channel::<Result<CompletionResult, RelayError>>();
        drop(sender);

        let error = DeferredResult { receiver }
            .wait()
            .await
            .expect_err("dropped sender should surface as cancellation");
        assert_eq!(error.kind, RelayErrorKind::Cancelled);
    }
}
