//! Relay request, usage, and completion result types.
//!
//! ```rust
//! use grelay::{Message, RelayErrorKind, RelayRequest, Role};
//!
//! let ok = RelayRequest::new(
//!     "gpt-4o-mini",
//!     vec![
//!         Message::new(Role::System, "You are terse"),
//!         Message::new(Role::User, "Hi"),
//!     ],
//! );
//! assert!(ok.validate().is_ok());
//!
//! let err = RelayRequest::new("", vec![Message::new(Role::User, "hi")])
//!     .validate()
//!     .expect_err("empty model should fail");
//! assert_eq!(err.kind, RelayErrorKind::InvalidRequest);
//! ```

use crate::RelayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One role-tagged segment of the prompt sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A full chat turn plus sampling parameters, passed through verbatim to
/// the upstream provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: Option<u32>,
}

impl RelayRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 1.0,
            top_p: 1.0,
            max_output_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.model.trim().is_empty() {
            return Err(RelayError::invalid_request("model must not be empty"));
        }

        if self.messages.is_empty() {
            return Err(RelayError::invalid_request(
                "at least one message is required",
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RelayError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(RelayError::invalid_request(
                "top_p must be in the inclusive range 0.0..=1.0",
            ));
        }

        if let Some(max_output_tokens) = self.max_output_tokens
            && max_output_tokens == 0
        {
            return Err(RelayError::invalid_request(
                "max_output_tokens must be greater than zero",
            ));
        }

        Ok(())
    }
}

/// Token usage of one completed (or cancelled) relay.
///
/// `estimated` is false only when the numbers came from the provider's own
/// in-band usage report. `model` is the model the provider actually served,
/// which may differ from the requested one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub model: String,
    pub provider: String,
    pub estimated: bool,
}

/// The final aggregate of one relay, resolved exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub content: String,
    pub usage: CompletionUsage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RelayErrorKind;

    fn request() -> RelayRequest {
        RelayRequest::new(
            "gpt-4o-mini",
            vec![
                Message::new(Role::System, "You are terse"),
                Message::new(Role::User, "Hi"),
            ],
        )
    }

    #[test]
    fn validate_accepts_parameter_ranges() {
        let valid = request()
            .with_temperature(0.4)
            .with_top_p(0.9)
            .with_max_output_tokens(256);
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_model_and_messages() {
        let empty_model = RelayRequest::new("  ", vec![Message::new(Role::User, "hi")]);
        let err = empty_model.validate().expect_err("empty model must fail");
        assert_eq!(err.kind, RelayErrorKind::InvalidRequest);

        let empty_messages = RelayRequest::new("gpt-4o-mini", Vec::new());
        let err = empty_messages
            .validate()
            .expect_err("empty messages must fail");
        assert_eq!(err.kind, RelayErrorKind::InvalidRequest);
    }

    #[test]
    fn validate_rejects_out_of_range_sampling() {
        let err = request()
            .with_temperature(2.5)
            .validate()
            .expect_err("temperature outside range must fail");
        assert_eq!(err.kind, RelayErrorKind::InvalidRequest);

        let err = request()
            .with_top_p(1.5)
            .validate()
            .expect_err("top_p outside range must fail");
        assert_eq!(err.kind, RelayErrorKind::InvalidRequest);

        let err = request()
            .with_max_output_tokens(0)
            .validate()
            .expect_err("max_output_tokens=0 must fail");
        assert_eq!(err.kind, RelayErrorKind::InvalidRequest);
    }
}
