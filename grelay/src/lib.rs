//! Streaming chat-completion relay over OpenAI-compatible providers.
//!
//! The relay opens one upstream streaming request, decodes the event
//! stream incrementally, forwards text deltas to the caller as they
//! arrive, and resolves a deferred aggregate (full text plus token usage)
//! once the stream ends or is cancelled.

mod config;
mod error;
mod model;
mod relay;
mod sse;
mod transport;
mod wire;

pub mod prelude {
    pub use crate::{
        CompletionResult, CompletionTransport, CompletionUsage, DeferredResult,
        HttpCompletionTransport, Message, RelayConfig, RelayError, RelayErrorKind, RelayHandle,
        RelayRequest, Role, SecretString, StreamRelay, TextChunkStream,
    };
    pub use tokio_util::sync::CancellationToken;
}

pub use config::{DEFAULT_BASE_URL, RelayConfig, SecretString};
pub use error::{RelayError, RelayErrorKind};
pub use model::{CompletionResult, CompletionUsage, Message, RelayRequest, Role};
pub use relay::{DONE_SENTINEL, DeferredResult, RelayHandle, StreamRelay, TextChunkStream};
pub use sse::SseDecoder;
pub use transport::{BodyByteStream, CompletionTransport, HttpCompletionTransport, RelayFuture};
