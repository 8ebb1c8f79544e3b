//! Binary type detection from leading bytes (magic numbers).
//!
//! Filenames and declared MIME types are attacker-controlled; the leading
//! bytes are the only signal that reflects what the file actually is.

use std::io;

use super::source::UploadSource;

/// Number of leading bytes inspected.
pub const SIGNATURE_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 4] = [
        ImageFormat::Png,
        ImageFormat::Jpeg,
        ImageFormat::Gif,
        ImageFormat::Webp,
    ];

    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
        }
    }

    /// Exact match against the supported MIME types. Anything else is `None`.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.mime() == mime)
    }

    /// Accepted hex prefixes, lower-case.
    #[must_use]
    pub fn signatures(self) -> &'static [&'static str] {
        match self {
            ImageFormat::Png => &["89504e47"],
            ImageFormat::Jpeg => &["ffd8ffe0", "ffd8ffe1", "ffd8ffe2", "ffd8ffe3", "ffd8ffe8"],
            ImageFormat::Gif => &["47494638"],
            // RIFF container
            ImageFormat::Webp => &["52494646"],
        }
    }

    fn matches_hex(self, magic: &str) -> bool {
        let magic = magic.to_ascii_lowercase();
        self.signatures().iter().any(|sig| magic.starts_with(sig))
    }
}

/// Hex form of the first [`SIGNATURE_LEN`] bytes, or of all of them if fewer.
#[must_use]
pub fn magic_hex(head: &[u8]) -> String {
    hex::encode(&head[..head.len().min(SIGNATURE_LEN)])
}

/// Returns the format whose signature prefixes `head`, or `None` when no
/// signature matches.
#[must_use]
pub fn sniff(head: &[u8]) -> Option<ImageFormat> {
    if head.len() < SIGNATURE_LEN {
        return None;
    }
    let magic = magic_hex(head);
    ImageFormat::ALL.into_iter().find(|f| f.matches_hex(&magic))
}

/// Whether `head` carries one of the signatures registered for `format`.
#[must_use]
pub fn matches_format(head: &[u8], format: ImageFormat) -> bool {
    head.len() >= SIGNATURE_LEN && format.matches_hex(&magic_hex(head))
}

/// Reads exactly the leading signature bytes of `source`.
///
/// # Errors
///
/// A short read is reported as `UnexpectedEof` rather than treated as an
/// unknown format.
pub async fn read_signature(source: &dyn UploadSource) -> io::Result<[u8; SIGNATURE_LEN]> {
    let head = source.read_head(SIGNATURE_LEN).await?;
    if head.len() < SIGNATURE_LEN {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "read {} of {} signature bytes from {}",
                head.len(),
                SIGNATURE_LEN,
                source.file_name()
            ),
        ));
    }
    let mut out = [0u8; SIGNATURE_LEN];
    out.copy_from_slice(&head[..SIGNATURE_LEN]);
    Ok(out)
}
