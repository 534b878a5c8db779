/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use atelier_core::ImageSource;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::UploadError;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const ALLOWED_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/webp", "image/gif"];

pub trait UploadService {
    /// Stores the bytes and returns a permanent URL.
    fn upload(&mut self, bytes: &[u8], mime: &str) -> Result<String, UploadError>;
}

impl<T: UploadService + ?Sized> UploadService for Box<T> {
    fn upload(&mut self, bytes: &[u8], mime: &str) -> Result<String, UploadError> {
        (**self).upload(bytes, mime)
    }
}

pub fn validate(bytes: &[u8], mime: &str) -> Result<(), UploadError> {
    if !ALLOWED_TYPES.contains(&mime) {
        return Err(UploadError::UnsupportedType(mime.to_string()));
    }
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size: bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Session-local object URL for bytes that could not be uploaded.
pub fn ephemeral_url() -> String {
    format!("blob:atelier/{}", Uuid::new_v4())
}

/// Validates, then uploads. Only validation errors are returned; a failed
/// upload yields an ephemeral source that lives for this session only.
pub fn upload_or_fallback(service: &mut dyn UploadService, bytes: &[u8], mime: &str) -> Result<ImageSource, UploadError> {
    validate(bytes, mime)?;
    match service.upload(bytes, mime) {
        Ok(url) => {
            info!(%url, size = bytes.len(), "image uploaded");
            Ok(ImageSource::Permanent(url))
        }
        Err(e) => {
            let url = ephemeral_url();
            warn!(error = %e, %url, "upload failed, using a session-local source");
            Ok(ImageSource::Ephemeral(url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl UploadService for Failing {
        fn upload(&mut self, _: &[u8], _: &str) -> Result<String, UploadError> {
            Err(UploadError::Failed("503".into()))
        }
    }

    struct Cdn;

    impl UploadService for Cdn {
        fn upload(&mut self, bytes: &[u8], _: &str) -> Result<String, UploadError> {
            Ok(format!("https://cdn.example/{}", bytes.len()))
        }
    }

    #[test]
    fn rejects_bad_input_before_uploading() {
        assert_eq!(validate(b"x", "image/svg+xml"), Err(UploadError::UnsupportedType("image/svg+xml".into())));
        assert_eq!(validate(b"", "image/png"), Err(UploadError::Empty));
        let big = vec![0u8; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(upload_or_fallback(&mut Cdn, &big, "image/png"), Err(UploadError::TooLarge { .. })));
    }

    #[test]
    fn successful_upload_is_permanent() {
        let source = upload_or_fallback(&mut Cdn, b"abc", "image/jpeg").unwrap();
        assert_eq!(source, ImageSource::Permanent("https://cdn.example/3".into()));
    }

    #[test]
    fn failed_upload_falls_back_to_ephemeral() {
        let source = upload_or_fallback(&mut Failing, b"abc", "image/webp").unwrap();
        assert!(source.is_ephemeral());
        assert!(source.url().starts_with("blob:"));
    }
}
