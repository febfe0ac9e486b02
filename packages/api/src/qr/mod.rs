//! # QR encoding seam
//!
//! Share links can be handed to a [`QrEncoder`], which turns the URL into an
//! image file and returns the path the file is served under. The vault only
//! ever stores that path; how the image is drawn is up to the encoder.
//!
//! Server builds ship [`PngQrEncoder`], which writes PNG files into a directory.

use std::sync::Arc;

use thiserror::Error;

#[cfg(feature = "server")]
mod png;
#[cfg(feature = "server")]
pub use png::PngQrEncoder;

/// Reed–Solomon error-correction level of the symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorCorrection {
    /// Recovers ~7% of codewords. Used for share links.
    #[default]
    Low,
    Medium,
    Quartile,
    High,
}

#[derive(Debug, Error)]
pub enum QrError {
    #[error("failed to encode QR code: {0}")]
    Encode(String),
    #[error("failed to write QR image: {0}")]
    Io(#[from] std::io::Error),
    #[error("QR worker failed: {0}")]
    Task(String),
}

/// Renders a string into a stored QR image.
pub trait QrEncoder: Send + Sync {
    /// Encode `content` into `file_name` and return the stored path.
    fn encode(
        &self,
        content: &str,
        level: ErrorCorrection,
        file_name: &str,
    ) -> Result<String, QrError>;

    /// Remove an image previously returned by [`QrEncoder::encode`].
    /// Removing an image that is already gone is not an error.
    fn discard(&self, path: &str) -> Result<(), QrError>;
}

/// Run [`QrEncoder::encode`] on the blocking thread pool; rendering and the
/// file write must stay off the async workers.
pub(crate) async fn encode_blocking(
    encoder: Arc<dyn QrEncoder>,
    content: String,
    level: ErrorCorrection,
    file_name: String,
) -> Result<String, QrError> {
    tokio::task::spawn_blocking(move || encoder.encode(&content, level, &file_name))
        .await
        .map_err(|e| QrError::Task(e.to_string()))?
}

/// Run [`QrEncoder::discard`] on the blocking thread pool.
pub(crate) async fn discard_blocking(
    encoder: Arc<dyn QrEncoder>,
    path: String,
) -> Result<(), QrError> {
    tokio::task::spawn_blocking(move || encoder.discard(&path))
        .await
        .map_err(|e| QrError::Task(e.to_string()))?
}

/// File name used for a secret's QR image.
pub fn qr_file_name(unique_id: &str) -> String {
    format!("qr_{unique_id}.png")
}
