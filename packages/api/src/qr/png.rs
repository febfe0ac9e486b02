use std::path::{Path, PathBuf};

use image::Luma;
use qrcode::{EcLevel, QrCode};

use super::{ErrorCorrection, QrEncoder, QrError};

/// Pixels per QR module.
const MODULE_SIZE: u32 = 10;

/// Writes PNG QR codes into a directory on disk.
#[derive(Debug, Clone)]
pub struct PngQrEncoder {
    directory: PathBuf,
    /// Prefix of the returned path, e.g. `"qrcodes"`.
    public_prefix: String,
}

impl PngQrEncoder {
    pub fn new(directory: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            public_prefix: public_prefix.into(),
        }
    }
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::Low => EcLevel::L,
            ErrorCorrection::Medium => EcLevel::M,
            ErrorCorrection::Quartile => EcLevel::Q,
            ErrorCorrection::High => EcLevel::H,
        }
    }
}

impl QrEncoder for PngQrEncoder {
    fn encode(
        &self,
        content: &str,
        level: ErrorCorrection,
        file_name: &str,
    ) -> Result<String, QrError> {
        let code = QrCode::with_error_correction_level(content.as_bytes(), level.into())
            .map_err(|e| QrError::Encode(e.to_string()))?;
        // Default quiet zone is four modules.
        let image = code
            .render::<Luma<u8>>()
            .module_dimensions(MODULE_SIZE, MODULE_SIZE)
            .quiet_zone(true)
            .build();

        std::fs::create_dir_all(&self.directory)?;
        image
            .save(self.directory.join(file_name))
            .map_err(|e| QrError::Encode(e.to_string()))?;

        Ok(format!("{}/{}", self.public_prefix, file_name))
    }

    fn discard(&self, path: &str) -> Result<(), QrError> {
        let Some(file_name) = Path::new(path).file_name() else {
            return Ok(());
        };
        match std::fs::remove_file(self.directory.join(file_name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::qr_file_name;

    #[test]
    fn test_encode_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = PngQrEncoder::new(dir.path().join("qrcodes"), "qrcodes");

        let file_name = qr_file_name("sec_aB3dE6gH9j");
        let path = encoder
            .encode(
                "http://localhost:5000/view/sec_aB3dE6gH9j",
                ErrorCorrection::Low,
                &file_name,
            )
            .unwrap();
        assert_eq!(path, "qrcodes/qr_sec_aB3dE6gH9j.png");

        let bytes = std::fs::read(dir.path().join("qrcodes").join(&file_name)).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_discard_removes_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = PngQrEncoder::new(dir.path(), "qrcodes");

        let path = encoder
            .encode("hello", ErrorCorrection::High, "qr_test.png")
            .unwrap();
        assert!(dir.path().join("qr_test.png").exists());

        encoder.discard(&path).unwrap();
        assert!(!dir.path().join("qr_test.png").exists());
        encoder.discard(&path).unwrap();
    }
}
