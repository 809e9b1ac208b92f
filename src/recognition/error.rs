use serde_json::Value;
use thiserror::Error;

/// Failures surfaced by the recognition client.
///
/// Unparseable answers are not errors; the client reports them as "no card".
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("API Key is missing")]
    MissingCredential,

    #[error("Invalid API Key. Please check your settings.")]
    InvalidCredential,

    #[error("API Quota Exceeded. Try again later.")]
    QuotaExceeded,

    #[error("Blocked by Safety Filters. Try a different angle.")]
    Blocked,

    /// Connection, TLS or body decoding failure from the HTTP client.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Any other non-success answer from the service.
    #[error("recognition service returned {status}: {message}")]
    Upstream { status: u16, message: String },
}

/// Coarse classification used to build user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Credential,
    Quota,
    Safety,
    Unknown,
}

impl RecognitionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecognitionError::MissingCredential | RecognitionError::InvalidCredential => {
                ErrorKind::Credential
            }
            RecognitionError::QuotaExceeded => ErrorKind::Quota,
            RecognitionError::Blocked => ErrorKind::Safety,
            RecognitionError::Transport(_) | RecognitionError::Upstream { .. } => {
                ErrorKind::Unknown
            }
        }
    }
}

const MAX_MESSAGE_CHARS: usize = 300;

/// Maps a non-success HTTP answer onto the error taxonomy.
pub fn classify_http_failure(status: u16, body: &str) -> RecognitionError {
    let lowered = body.to_ascii_lowercase();

    if status == 401
        || status == 403
        || lowered.contains("api key")
        || body.contains("API_KEY_INVALID")
    {
        return RecognitionError::InvalidCredential;
    }
    if status == 429 || lowered.contains("quota") || body.contains("RESOURCE_EXHAUSTED") {
        return RecognitionError::QuotaExceeded;
    }
    if body.contains("SAFETY") {
        return RecognitionError::Blocked;
    }

    RecognitionError::Upstream {
        status,
        message: error_message(body),
    }
}

/// Pulls `error.message` out of a Google API error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    if message.chars().count() > MAX_MESSAGE_CHARS {
        let truncated: String = message.chars().take(MAX_MESSAGE_CHARS).collect();
        format!("{truncated}...")
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_key_is_recognized_from_status_or_body() {
        assert!(matches!(
            classify_http_failure(401, ""),
            RecognitionError::InvalidCredential
        ));
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let err = classify_http_failure(400, body);
        assert_eq!(err.kind(), ErrorKind::Credential);
    }

    #[test]
    fn quota_and_safety_are_classified() {
        assert_eq!(classify_http_failure(429, "").kind(), ErrorKind::Quota);
        let body = r#"{"error":{"code":400,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(classify_http_failure(400, body).kind(), ErrorKind::Quota);
        assert_eq!(
            classify_http_failure(400, "finishReason: SAFETY").kind(),
            ErrorKind::Safety
        );
    }

    #[test]
    fn other_failures_keep_the_service_message() {
        let body = r#"{"error":{"code":500,"message":"Internal error encountered.","status":"INTERNAL"}}"#;
        match classify_http_failure(500, body) {
            RecognitionError::Upstream { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal error encountered.");
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn display_messages_match_the_settings_hints() {
        assert_eq!(
            RecognitionError::QuotaExceeded.to_string(),
            "API Quota Exceeded. Try again later."
        );
        assert_eq!(RecognitionError::MissingCredential.to_string(), "API Key is missing");
    }
}
