//! Upload validation.
//!
//! Checks run cheapest first and stop at the first failure:
//! 1. file extension
//! 2. declared MIME type
//! 3. size (non-empty, at most [`MAX_FILE_BYTES`])
//! 4. magic number matching the declared type
//!
//! [`read_validated`] then reads the content with a bounded read, and
//! [`encode_validated`] applies a second, independent size gate on the base64
//! form that is actually transmitted. [`encode_upload`] chains the two.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::{debug, warn};

use super::sniffer::{self, ImageFormat};
use super::source::UploadSource;
use crate::core::models::{FileValidationResult, UploadedImage, ValidatedUpload};
use crate::errors::AppError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// 10 MiB
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// 15 MiB, measured as the decoded size implied by the base64 length.
pub const MAX_BASE64_DECODED_BYTES: u64 = 15 * 1024 * 1024;

pub const ERR_EXTENSION: &str =
    "Invalid file extension. Only PNG, JPG, GIF, and WebP are allowed.";
pub const ERR_MIME: &str = "Invalid file type. Only image files are allowed.";
pub const ERR_EMPTY: &str = "File is empty.";
pub const ERR_TOO_LARGE: &str = "File is too large. Maximum size is 10MB.";
pub const ERR_SIGNATURE: &str =
    "Invalid file format. The file may be corrupted or not a valid image.";
pub const ERR_READ: &str = "Failed to read file. Please try again.";
pub const ERR_PROCESS: &str = "Failed to process the image.";
pub const ERR_ENCODED_TOO_LARGE: &str =
    "Processed image is too large. Please use a smaller image.";

/// Lower-cased suffix after the last `.`, if there is one.
#[must_use]
pub fn file_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// Post-encoding gate: `(len * 3) / 4` must not exceed
/// [`MAX_BASE64_DECODED_BYTES`].
#[must_use]
pub fn validate_base64_size(base64: &str) -> bool {
    let implied = (base64.len() as u64).saturating_mul(3) / 4;
    implied <= MAX_BASE64_DECODED_BYTES
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileValidator;

impl FileValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub async fn validate(&self, file: &dyn UploadSource) -> FileValidationResult {
        let name = file.file_name();

        let ext_ok = file_extension(name)
            .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
        if !ext_ok {
            debug!("Rejected upload {:?}: extension", name);
            return FileValidationResult::Invalid(ERR_EXTENSION.to_string());
        }

        let Some(format) = ImageFormat::from_mime(file.declared_mime()) else {
            debug!(
                "Rejected upload {:?}: declared type {:?}",
                name,
                file.declared_mime()
            );
            return FileValidationResult::Invalid(ERR_MIME.to_string());
        };

        let size = file.size();
        if size == 0 {
            return FileValidationResult::Invalid(ERR_EMPTY.to_string());
        }
        if size > MAX_FILE_BYTES {
            debug!("Rejected upload {:?}: {} bytes", name, size);
            return FileValidationResult::Invalid(ERR_TOO_LARGE.to_string());
        }

        match sniffer::read_signature(file).await {
            Ok(head) if sniffer::matches_format(&head, format) => FileValidationResult::Valid,
            Ok(head) => {
                debug!(
                    "Rejected upload {:?}: magic {} does not match {}",
                    name,
                    sniffer::magic_hex(&head),
                    format.mime()
                );
                FileValidationResult::Invalid(ERR_SIGNATURE.to_string())
            }
            Err(e) => {
                warn!("Failed to read signature of {:?}: {}", name, e);
                FileValidationResult::Invalid(ERR_READ.to_string())
            }
        }
    }
}

/// Validates `file`, then reads its content.
///
/// The read stops one byte past [`MAX_BASE64_DECODED_BYTES`], so content that
/// grew after validation is never loaded in full and still trips the
/// post-encoding gate.
///
/// # Errors
///
/// Returns a `VALIDATION_ERROR` if validation fails or the content cannot be
/// read.
pub async fn read_validated(
    validator: &FileValidator,
    file: &dyn UploadSource,
) -> Result<ValidatedUpload, AppError> {
    validator.validate(file).await.into_result()?;

    let bytes = file
        .read_all(MAX_BASE64_DECODED_BYTES + 1)
        .await
        .map_err(|e| {
            warn!("Failed to read upload {:?}: {}", file.file_name(), e);
            AppError::validation(ERR_PROCESS)
        })?;

    if bytes.len() as u64 != file.size() {
        warn!(
            "Upload {:?} changed after validation: {} bytes declared, {} read",
            file.file_name(),
            file.size(),
            bytes.len()
        );
    }

    Ok(ValidatedUpload::new(bytes, file.declared_mime().to_string()))
}

/// Base64-encodes validated content for transport.
///
/// # Errors
///
/// Returns a `VALIDATION_ERROR` if the encoded payload exceeds the transport
/// limit.
pub fn encode_validated(upload: &ValidatedUpload) -> Result<UploadedImage, AppError> {
    let data = STANDARD.encode(upload.bytes());
    if !validate_base64_size(&data) {
        return Err(AppError::validation(ERR_ENCODED_TOO_LARGE));
    }

    Ok(UploadedImage::new(data, upload.mime_type().to_string()))
}

/// [`read_validated`] followed by [`encode_validated`].
///
/// # Errors
///
/// Returns a `VALIDATION_ERROR` if validation fails, the content cannot be
/// read, or the encoded payload exceeds the transport limit.
pub async fn encode_upload(
    validator: &FileValidator,
    file: &dyn UploadSource,
) -> Result<UploadedImage, AppError> {
    let upload = read_validated(validator, file).await?;
    encode_validated(&upload)
}
