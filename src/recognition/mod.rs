mod client;
mod error;
mod parse;
mod prompt;

use std::future::Future;

pub use client::{strip_data_url_header, GeminiClient};
pub use error::{classify_http_failure, ErrorKind, RecognitionError};
pub use parse::{extract_json, parse_card_response, RecognizedCard};
pub use prompt::CARD_PROMPT;

/// Anything that can turn a JPEG frame into card fields.
///
/// `Ok(None)` means the frame held no readable card.
pub trait CardRecognizer: Send + Sync + 'static {
    fn recognize(
        &self,
        credential: &str,
        jpeg: &[u8],
    ) -> impl Future<Output = Result<Option<RecognizedCard>, RecognitionError>> + Send;
}
