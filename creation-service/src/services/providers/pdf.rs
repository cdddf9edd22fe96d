//! PDF text extraction.

use super::{DocumentParser, ProviderError};
use async_trait::async_trait;
use std::time::Duration;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extracts plain text from PDF bytes with `pdf-extract`.
///
/// Parsing is CPU-bound and runs on the blocking pool under a deadline.
/// Parser failures, including panics inside the parser, surface as
/// [`ProviderError::InvalidInput`]; an expired deadline as
/// [`ProviderError::Timeout`].
#[derive(Debug, Clone, Copy)]
pub struct PdfTextExtractor {
    timeout: Duration,
}

impl PdfTextExtractor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `parse` on the blocking pool, giving up after the deadline.
    ///
    /// A parse that outlives the deadline keeps its blocking thread until it
    /// returns; only the caller stops waiting.
    async fn parse_blocking<F>(&self, size: usize, parse: F) -> Result<String, ProviderError>
    where
        F: FnOnce() -> Result<String, String> + Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(parse);

        let joined = tokio::time::timeout(self.timeout, handle)
            .await
            .map_err(|_| {
                tracing::warn!(
                    size,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "PDF parse timed out"
                );
                ProviderError::Timeout
            })?;

        joined
            .map_err(|e| {
                tracing::warn!(error = %e, size, "PDF parser aborted");
                ProviderError::InvalidInput("Failed to parse PDF document".to_string())
            })?
            .map_err(|e| ProviderError::InvalidInput(format!("Failed to parse PDF: {}", e)))
    }
}

#[async_trait]
impl DocumentParser for PdfTextExtractor {
    async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, ProviderError> {
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(ProviderError::InvalidInput(
                "Uploaded file is not a PDF document".to_string(),
            ));
        }

        let size = bytes.len();
        let text = self
            .parse_blocking(size, move || {
                pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
            })
            .await?;

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ProviderError::InvalidInput(
                "No text could be extracted from the PDF".to_string(),
            ));
        }

        tracing::debug!(size, text_len = text.len(), "Extracted text from PDF");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> PdfTextExtractor {
        PdfTextExtractor::new(Duration::from_secs(30))
    }

    #[tokio::test]
    async fn rejects_non_pdf_bytes() {
        let err = extractor()
            .extract_text(b"hello, not a pdf".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput(_)));
        assert_eq!(err.to_string(), "Uploaded file is not a PDF document");
    }

    #[tokio::test]
    async fn corrupt_pdf_is_an_input_error() {
        let err = extractor()
            .extract_text(b"%PDF-1.4\n%%garbage without objects or xref".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn hung_parse_times_out() {
        let extractor = PdfTextExtractor::new(Duration::from_millis(20));

        let err = extractor
            .parse_blocking(8, || {
                std::thread::sleep(Duration::from_millis(500));
                Ok("too late".to_string())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Timeout));
    }

    #[tokio::test]
    async fn parse_within_deadline_returns_text() {
        let text = extractor()
            .parse_blocking(8, || Ok("Jane Doe".to_string()))
            .await
            .unwrap();
        assert_eq!(text, "Jane Doe");
    }

    #[tokio::test]
    async fn parser_panic_is_an_input_error() {
        let err = extractor()
            .parse_blocking(8, || panic!("malformed xref"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput(_)));
    }
}
