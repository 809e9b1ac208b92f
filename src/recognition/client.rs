use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::RecognitionConfig;

use super::{
    error::{classify_http_failure, RecognitionError},
    parse::{parse_card_response, RecognizedCard},
    prompt::CARD_PROMPT,
    CardRecognizer,
};

const JPEG_MIME: &str = "image/jpeg";
const FINISHED: &str = "STOP";
/// Policy rejections reported without a `SAFETY` marker in the reason.
const POLICY_REASONS: [&str; 3] = ["PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Client for the Gemini `generateContent` endpoint.
///
/// Stateless between calls: every `identify` sends exactly one request.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 2],
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    Image { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &RecognitionConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Identifies the card in a JPEG frame.
    pub async fn identify(
        &self,
        credential: &str,
        jpeg: &[u8],
    ) -> Result<Option<RecognizedCard>, RecognitionError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg);
        self.identify_base64(credential, &encoded).await
    }

    /// Identifies the card in a base64 JPEG, with or without a `data:` URL header.
    pub async fn identify_base64(
        &self,
        credential: &str,
        image_base64: &str,
    ) -> Result<Option<RecognizedCard>, RecognitionError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(RecognitionError::MissingCredential);
        }

        let request = GenerateContentRequest {
            contents: [RequestContent {
                parts: [
                    RequestPart::Text { text: CARD_PROMPT },
                    RequestPart::Image {
                        inline_data: InlineData {
                            mime_type: JPEG_MIME,
                            data: strip_data_url_header(image_base64),
                        },
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", credential)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = classify_http_failure(status.as_u16(), &body);
            warn!("Recognition request failed ({status}): {err}");
            return Err(err);
        }

        let text = response_text(status.as_u16(), &body)?;
        debug!("Recognition answer: {text}");
        Ok(parse_card_response(&text))
    }
}

impl CardRecognizer for GeminiClient {
    async fn recognize(
        &self,
        credential: &str,
        jpeg: &[u8],
    ) -> Result<Option<RecognizedCard>, RecognitionError> {
        self.identify(credential, jpeg).await
    }
}

/// Drops a `data:image/...;base64,` prefix if present.
pub fn strip_data_url_header(image: &str) -> &str {
    match image.split_once(',') {
        Some((header, data)) if header.starts_with("data:") => data,
        _ => image,
    }
}

/// Concatenates the text parts of the first candidate.
fn response_text(status: u16, body: &str) -> Result<String, RecognitionError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|err| RecognitionError::Upstream {
            status,
            message: format!("unreadable response body: {err}"),
        })?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        if is_safety_block(reason) {
            return Err(RecognitionError::Blocked);
        }
        return Err(RecognitionError::Upstream {
            status,
            message: format!("prompt blocked: {reason}"),
        });
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(String::new());
    };

    let finish_reason = candidate.finish_reason.as_deref();
    if finish_reason.is_some_and(is_safety_block) {
        return Err(RecognitionError::Blocked);
    }

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    // An empty answer is only "no card" when the model actually finished.
    match finish_reason {
        Some(reason) if text.is_empty() && reason != FINISHED => {
            Err(RecognitionError::Upstream {
                status,
                message: format!("generation stopped: {reason}"),
            })
        }
        _ => Ok(text),
    }
}

fn is_safety_block(reason: &str) -> bool {
    reason.contains("SAFETY") || POLICY_REASONS.contains(&reason)
}
